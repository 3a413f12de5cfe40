use serde::{Deserialize, Serialize};

use super::{de_opt_decimal, Asset};

/// A service record, with the serviced asset nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Maintenance {
    pub id: i64,
    pub date: String,
    pub details: String,
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub cost: Option<f64>,
    pub asset: Asset,
}

impl Maintenance {
    pub fn cost_display(&self) -> String {
        match self.cost {
            Some(cost) => format!("{:.2}", cost),
            None => "-".to_string(),
        }
    }

    /// Date portion of the timestamp, e.g. "2024-03-09".
    pub fn day(&self) -> &str {
        self.date.get(..10).unwrap_or(&self.date)
    }
}

/// Create/update payload; `asset` is the asset id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewMaintenance {
    pub date: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub asset: i64,
}
