use serde::{Deserialize, Serialize};

/// What a staff member asked an admin to do with an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum PendingActionKind {
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "DELETE")]
    Delete,
    #[serde(other)]
    Unknown,
}

impl PendingActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            PendingActionKind::Update => "Update",
            PendingActionKind::Delete => "Delete",
            PendingActionKind::Unknown => "Unknown",
        }
    }
}

/// A change request waiting for (or settled by) an admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct PendingAction {
    pub id: i64,
    /// Id of the asset the request is about.
    pub asset: i64,
    pub action: PendingActionKind,
    /// Proposed field values for an update.
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "unknown"))]
    pub request_data: Option<serde_json::Value>,
    #[serde(default)]
    pub requested_by: Option<i64>,
    /// "Pending", "Approved" or "Rejected".
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub admin_action_at: Option<String>,
}

fn default_status() -> String {
    "Pending".to_string()
}

impl PendingAction {
    /// Still waiting for an admin.
    pub fn is_open(&self) -> bool {
        self.status.eq_ignore_ascii_case("pending") && self.admin_action_at.is_none()
    }
}
