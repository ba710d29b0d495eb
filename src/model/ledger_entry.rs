use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Accruals carry positive amounts, usages negative; the balance is a plain
/// SUM over the column.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EntryType {
    Accrual,
    Usage,
}

/// What produced a ledger entry. The set of source kinds is closed: periodic
/// accrual points back at the user, usage points at the request that consumed
/// the days.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LedgerSource {
    Accrual { user_id: u64 },
    Usage { request_id: u64 },
}

impl LedgerSource {
    pub fn into_columns(self) -> (&'static str, u64) {
        match self {
            LedgerSource::Accrual { user_id } => ("user", user_id),
            LedgerSource::Usage { request_id } => ("time_off_request", request_id),
        }
    }

    pub fn from_columns(source_type: &str, source_id: u64) -> Option<Self> {
        match source_type {
            "user" => Some(LedgerSource::Accrual { user_id: source_id }),
            "time_off_request" => Some(LedgerSource::Usage { request_id: source_id }),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LedgerEntry {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "accrual")]
    pub entry_type: EntryType,
    #[schema(example = "1.00", value_type = String)]
    pub amount: Decimal,
    #[schema(example = "2026-01-01", format = "date", value_type = String, nullable = true)]
    pub effective_date: Option<NaiveDate>,
    #[schema(example = "Monthly PTO accrual for January 2026", nullable = true)]
    pub notes: Option<String>,
    #[schema(example = "user")]
    pub source_type: String,
    #[schema(example = 42)]
    pub source_id: u64,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    pub fn source(&self) -> Option<LedgerSource> {
        LedgerSource::from_columns(&self.source_type, self.source_id)
    }
}

/// What the balance endpoint reports: partial accruals count as a full day in
/// the user's favor. The validator compares against the RAW sum, not this.
pub fn rounded_balance(raw: Decimal) -> Decimal {
    raw.ceil()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn source_kinds_are_closed() {
        let accrual = LedgerSource::Accrual { user_id: 3 };
        assert_eq!(accrual.into_columns(), ("user", 3));
        assert_eq!(
            LedgerSource::from_columns("time_off_request", 9),
            Some(LedgerSource::Usage { request_id: 9 })
        );
        assert_eq!(LedgerSource::from_columns("payroll", 1), None);
    }

    #[test]
    fn entries_resolve_their_tagged_source() {
        let entry = LedgerEntry {
            id: 1,
            user_id: 3,
            entry_type: EntryType::Usage,
            amount: Decimal::from(-5),
            effective_date: None,
            notes: None,
            source_type: "time_off_request".into(),
            source_id: 9,
            created_at: None,
        };
        assert_eq!(entry.source(), Some(LedgerSource::Usage { request_id: 9 }));
    }

    #[test]
    fn balance_rounds_up_to_whole_days() {
        assert_eq!(rounded_balance(Decimal::from_str("5.25").unwrap()), Decimal::from(6));
        assert_eq!(rounded_balance(Decimal::from(4)), Decimal::from(4));
        assert_eq!(rounded_balance(Decimal::from_str("-0.5").unwrap()), Decimal::ZERO);
    }
}
