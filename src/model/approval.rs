use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Audit record for a decision. One per request, written inside the decision
/// transaction, never updated afterwards.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Approval {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub time_off_request_id: u64,
    #[schema(example = 7)]
    pub approver_id: u64,
    #[schema(example = "Enjoy!", nullable = true)]
    pub comments: Option<String>,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}
