use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A table's call for staff attention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequest {
    pub id: i64,
    pub table_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub request_time: DateTime<Utc>,
    #[serde(default, rename = "isUrgent")]
    pub urgent: bool,
}

/// Creation body for `POST /api/help-requests`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHelpRequest {
    pub table_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
