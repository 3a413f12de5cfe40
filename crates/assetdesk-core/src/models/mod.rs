//! Data models for the asset management backend.
//!
//! These mirror the JSON produced by the backend's REST serializers:
//!
//! - `Office`, `Division`: organizational structure
//! - `Asset` with `AssetCategory` / `AssetStatus`, plus depreciation helpers
//! - `Maintenance`: service records against an asset
//! - `User`: backend accounts
//! - `PendingAction`: update/delete requests awaiting an admin
//! - `TokenPair`, `RefreshResponse`: login and refresh payloads
//! - `DashboardSummary`, `AssetStats`, `CategoryCount`: dashboard aggregates
//!
//! Write payloads (`NewAsset`, `NewDivision`, ...) carry foreign keys as ids,
//! while read models embed the related object the way the backend nests them.

pub mod asset;
pub mod maintenance;
pub mod organization;
pub mod pending;
pub mod session;
pub mod stats;
pub mod user;

pub use asset::{Asset, AssetCategory, AssetStatus, NewAsset};
pub use maintenance::{Maintenance, NewMaintenance};
pub use organization::{Division, NewDivision, NewOffice, Office};
pub use pending::{PendingAction, PendingActionKind};
pub use session::{RefreshResponse, TokenPair};
pub use stats::{AssetStats, CategoryCount, DashboardSummary};
pub use user::{NewUser, User};

use serde::{Deserialize, Deserializer};

/// The backend renders decimal fields as strings ("12.50"); accept numbers too.
#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Number(f64),
    Text(String),
}

impl DecimalRepr {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            DecimalRepr::Number(n) => Ok(n),
            DecimalRepr::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid decimal: {}", s))),
        }
    }
}

pub(crate) fn de_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    DecimalRepr::deserialize(deserializer)?.into_f64()
}

/// Lookups that answer with either a single object or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

pub(crate) fn de_opt_decimal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    Option::<DecimalRepr>::deserialize(deserializer)?
        .map(DecimalRepr::into_f64)
        .transpose()
}
