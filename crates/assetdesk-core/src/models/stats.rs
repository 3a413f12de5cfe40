//! Aggregates shown on the dashboard.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One slice of the category distribution chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AssetStats {
    #[serde(default)]
    pub total_assets: u64,
    #[serde(default)]
    pub updated_assets: u64,
    #[serde(default)]
    pub pending_approval_assets: u64,
}

/// Everything the home dashboard shows, fetched in one go.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct DashboardSummary {
    pub total_assets: usize,
    pub inactive_assets: usize,
    pub need_troubleshooting: usize,
    pub divisions: usize,
    pub maintenance_records: usize,
    pub category_distribution: Vec<CategoryCount>,
    pub asset_stats: AssetStats,
}

impl DashboardSummary {
    /// Category counts merged by category name, largest first.
    pub fn categories_by_count(&self) -> Vec<(String, u64)> {
        let mut merged: BTreeMap<&str, u64> = BTreeMap::new();
        for slice in &self.category_distribution {
            *merged.entry(slice.category.as_str()).or_default() += slice.count;
        }
        let mut sorted: Vec<(String, u64)> = merged
            .into_iter()
            .map(|(name, count)| (name.to_string(), count))
            .collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }

    /// Assets neither inactive nor flagged for troubleshooting.
    pub fn healthy_assets(&self) -> usize {
        self.total_assets
            .saturating_sub(self.inactive_assets)
            .saturating_sub(self.need_troubleshooting)
    }
}
