use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::ScheduledEmail;
use super::services::SweepResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    /// RFC 3339 timestamp with offset, e.g. `2026-03-01T09:30:00-05:00`.
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_for: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledResponse {
    pub message: String,
    pub id: uuid::Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_for: OffsetDateTime,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledListResponse {
    pub scheduled_emails: Vec<ScheduledEmail>,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<SweepResult>,
}

impl From<Vec<SweepResult>> for SweepResponse {
    fn from(results: Vec<SweepResult>) -> Self {
        let message = if results.is_empty() {
            "No scheduled emails to process".to_string()
        } else {
            format!("Processed {} scheduled emails", results.len())
        };
        Self {
            success: true,
            message,
            results,
        }
    }
}
