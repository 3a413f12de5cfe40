//! Utility functions for terminal output formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_date, format_money, format_optional, truncate_string};
