//! Offices and the divisions that belong to them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Office {
    pub id: i64,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewOffice {
    pub name: String,
    pub location: String,
}

/// A division as returned by the backend, with its office nested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Division {
    pub id: i64,
    pub name: String,
    pub head_of_division: String,
    pub office: Office,
}

impl Division {
    /// "Finance (HQ)" style label for lists.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.office.name)
    }

    /// Short code used in generated asset numbers: initials of the first
    /// three words, or the first two letters of a single-word name.
    pub fn code(&self) -> String {
        if self.name.contains(' ') {
            self.name
                .split_whitespace()
                .take(3)
                .filter_map(|w| w.chars().next())
                .flat_map(char::to_uppercase)
                .collect()
        } else {
            self.name.chars().take(2).flat_map(char::to_uppercase).collect()
        }
    }
}

/// Division create/update payload; `office` is the office id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewDivision {
    pub name: String,
    pub head_of_division: String,
    pub office: i64,
}
