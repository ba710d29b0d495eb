use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// pending -> approved | rejected, decided exactly once. Stored lowercase.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_pending(&self) -> bool {
        *self == RequestStatus::Pending
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeOffRequest {
    pub id: u64,
    pub user_id: u64,
    pub time_off_type_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: RequestStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl TimeOffRequest {
    /// Inclusive of both endpoints; a single-day request is 1 day.
    pub fn duration_in_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: NaiveDate, end: NaiveDate) -> TimeOffRequest {
        TimeOffRequest {
            id: 1,
            user_id: 1,
            time_off_type_id: 1,
            start_date: start,
            end_date: end,
            reason: "Family vacation".into(),
            status: RequestStatus::Pending,
            created_at: None,
        }
    }

    #[test]
    fn status_round_trips_as_lowercase_strings() {
        assert_eq!(RequestStatus::Pending.to_string(), "pending");
        assert_eq!(RequestStatus::Approved.to_string(), "approved");
        assert_eq!("rejected".parse::<RequestStatus>().unwrap(), RequestStatus::Rejected);
        assert!("cancelled".parse::<RequestStatus>().is_err());
    }

    #[test]
    fn duration_counts_both_endpoints() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(request(day, day).duration_in_days(), 1);
        assert_eq!(request(day, day + chrono::Duration::days(4)).duration_in_days(), 5);
    }
}
