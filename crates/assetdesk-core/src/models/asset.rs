//! Asset records and their category/status codes.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{de_decimal, Division};

/// Average year length used for depreciation.
const DAYS_PER_YEAR: f64 = 365.25;

/// Useful life the backend assigns when none is given.
pub const DEFAULT_USEFUL_LIFE_YEARS: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum AssetCategory {
    #[serde(rename = "COMP")]
    Computer,
    #[serde(rename = "LAPT")]
    Laptop,
    #[serde(rename = "SERV")]
    Server,
    #[serde(rename = "UPS")]
    Ups,
    #[serde(rename = "PROJ")]
    Projector,
    #[serde(rename = "ACP")]
    AccessPoint,
    #[serde(rename = "BMD")]
    BiometricDevice,
    #[serde(rename = "PRIN")]
    Printer,
    #[serde(rename = "PHOTO")]
    Photocopier,
    #[serde(rename = "MEZA")]
    Table,
    #[serde(rename = "KAB")]
    Cabinet,
    #[serde(rename = "KIT")]
    Chair,
    #[serde(rename = "SOF")]
    Sofa,
    #[serde(rename = "OTHERS")]
    Other,
    #[serde(other)]
    Unknown,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 14] = [
        AssetCategory::Computer,
        AssetCategory::Laptop,
        AssetCategory::Server,
        AssetCategory::Ups,
        AssetCategory::Projector,
        AssetCategory::AccessPoint,
        AssetCategory::BiometricDevice,
        AssetCategory::Printer,
        AssetCategory::Photocopier,
        AssetCategory::Table,
        AssetCategory::Cabinet,
        AssetCategory::Chair,
        AssetCategory::Sofa,
        AssetCategory::Other,
    ];

    /// Wire code, e.g. "LAPT".
    pub fn code(&self) -> &'static str {
        match self {
            AssetCategory::Computer => "COMP",
            AssetCategory::Laptop => "LAPT",
            AssetCategory::Server => "SERV",
            AssetCategory::Ups => "UPS",
            AssetCategory::Projector => "PROJ",
            AssetCategory::AccessPoint => "ACP",
            AssetCategory::BiometricDevice => "BMD",
            AssetCategory::Printer => "PRIN",
            AssetCategory::Photocopier => "PHOTO",
            AssetCategory::Table => "MEZA",
            AssetCategory::Cabinet => "KAB",
            AssetCategory::Chair => "KIT",
            AssetCategory::Sofa => "SOF",
            AssetCategory::Other => "OTHERS",
            AssetCategory::Unknown => "?",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetCategory::Computer => "Computer",
            AssetCategory::Laptop => "Laptop",
            AssetCategory::Server => "Server",
            AssetCategory::Ups => "UPS",
            AssetCategory::Projector => "Projector",
            AssetCategory::AccessPoint => "Access Point",
            AssetCategory::BiometricDevice => "Biometric Device",
            AssetCategory::Printer => "Printer",
            AssetCategory::Photocopier => "Photocopy Machine",
            AssetCategory::Table => "Meza",
            AssetCategory::Cabinet => "Kabati",
            AssetCategory::Chair => "Kiti",
            AssetCategory::Sofa => "Sofa",
            AssetCategory::Other => "Other Accessories",
            AssetCategory::Unknown => "Unknown",
        }
    }

    pub fn from_code(code: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(code.trim()))
            .unwrap_or(AssetCategory::Unknown)
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum AssetStatus {
    #[default]
    #[serde(rename = "A")]
    Active,
    #[serde(rename = "B")]
    NeedsTroubleshooting,
    #[serde(rename = "C")]
    Inactive,
}

impl AssetStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AssetStatus::Active => "Active",
            AssetStatus::NeedsTroubleshooting => "Need Troubleshoot",
            AssetStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An asset as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Asset {
    pub id: i64,
    pub name: String,
    #[serde(rename = "Manufactured_date", default)]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub manufactured_date: Option<NaiveDate>,
    pub cost: u64,
    #[serde(default)]
    pub invoice: String,
    pub category: AssetCategory,
    #[serde(default)]
    pub specification: Option<String>,
    #[serde(default)]
    pub model_number: Option<String>,
    /// Timestamp as rendered by the backend; see `received_on`.
    #[serde(rename = "Received_date", default)]
    pub received_date: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Name of the division the asset is issued to.
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub asset_number: String,
    #[serde(default)]
    pub asset_status: AssetStatus,
    #[serde(default, deserialize_with = "de_decimal")]
    pub depreciation: f64,
    #[serde(default = "default_useful_life")]
    pub useful_life: i32,
    #[serde(default)]
    pub is_pending: bool,
    #[serde(default)]
    pub is_updated: bool,
    #[serde(rename = "pendingAndUpdated_desc", default)]
    pub pending_and_updated_desc: Option<String>,
}

fn default_useful_life() -> i32 {
    DEFAULT_USEFUL_LIFE_YEARS
}

impl Asset {
    /// Calendar day the asset was received, parsed from the backend timestamp.
    pub fn received_on(&self) -> Option<NaiveDate> {
        let raw = self.received_date.as_deref()?;
        raw.get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
    }

    /// Straight-line depreciation from the received date to `today`,
    /// rounded to cents and capped at the purchase cost.
    pub fn depreciation_as_of(&self, today: NaiveDate) -> f64 {
        let Some(received) = self.received_on() else {
            return 0.0;
        };
        if self.useful_life <= 0 {
            return 0.0;
        }

        let years_in_use = (today - received).num_days() as f64 / DAYS_PER_YEAR;
        let annual = self.cost as f64 / self.useful_life as f64;
        let total = ((annual * years_in_use) * 100.0).round() / 100.0;
        total.clamp(0.0, self.cost as f64)
    }

    pub fn current_value_as_of(&self, today: NaiveDate) -> f64 {
        self.cost as f64 - self.depreciation_as_of(today)
    }

    /// Waiting on an admin decision (update or delete request).
    pub fn awaiting_approval(&self) -> bool {
        self.is_pending || self.is_updated
    }

    /// `MKS/U/<category>/<division>/<seq>` numbering used by the backend
    /// when an asset is first issued.
    pub fn number_for(category: AssetCategory, division: &Division, sequence: u32) -> String {
        let category_code: String = category.code().chars().take(4).collect();
        format!("MKS/U/{}/{}/{}", category_code, division.code(), sequence)
    }
}

/// Asset create/update payload; `issue` is the division id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewAsset {
    pub name: String,
    #[serde(rename = "Manufactured_date", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub manufactured_date: Option<NaiveDate>,
    pub cost: u64,
    pub invoice: String,
    pub category: AssetCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<i64>,
    pub asset_status: AssetStatus,
    pub useful_life: i32,
}
