use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::time_off_type::TypePolicy;

/// One failed rule, tagged with the field it belongs to so the client can
/// render field-level feedback. Cross-field rules use the `base` tag.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Violation {
    #[schema(example = "start_date")]
    pub field: &'static str,
    #[schema(example = "cannot be in the past")]
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Violation {
            field,
            message: message.into(),
        }
    }
}

/// A request as submitted, before anything is persisted. `id` is set when
/// re-validating an update so the overlap scan can exclude the record itself.
#[derive(Debug, Default, Clone)]
pub struct CandidateRequest {
    pub id: Option<u64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

/// Minimal projection of the user's other requests, enough for overlap checks.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ExistingRequest {
    pub id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Inclusive of both endpoints; a single-day request is 1 day.
pub fn duration_in_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Evaluate a candidate request against the user's other requests, the PTO
/// ledger balance and the type's policy. Pure: reads everything, mutates
/// nothing; the caller decides what to do with the violations.
///
/// `existing` must already be scoped to the candidate's owner — overlap is a
/// per-user rule and two users may freely take the same days off.
pub fn validate(
    candidate: &CandidateRequest,
    existing: &[ExistingRequest],
    balance: Decimal,
    type_name: &str,
    policy: &TypePolicy,
    today: NaiveDate,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if candidate.start_date.is_none() {
        violations.push(Violation::new("start_date", "can't be blank"));
    }
    if candidate.end_date.is_none() {
        violations.push(Violation::new("end_date", "can't be blank"));
    }
    if candidate.reason.as_deref().map_or(true, |r| r.trim().is_empty()) {
        violations.push(Violation::new("reason", "can't be blank"));
    }

    if let Some(start) = candidate.start_date {
        if start < today {
            violations.push(Violation::new("start_date", "cannot be in the past"));
        }

        let notice = (start - today).num_days();
        if notice < policy.advance_notice_days {
            violations.push(Violation::new(
                "start_date",
                format!(
                    "requires {} days advance notice for {}",
                    policy.advance_notice_days, type_name
                ),
            ));
        }
    }

    let (Some(start), Some(end)) = (candidate.start_date, candidate.end_date) else {
        return violations;
    };

    if end < start {
        violations.push(Violation::new("end_date", "must be after start date"));
        // The window is inverted; none of the range rules below are meaningful.
        return violations;
    }

    let overlapping: Vec<&ExistingRequest> = existing
        .iter()
        .filter(|other| Some(other.id) != candidate.id)
        .filter(|other| other.start_date <= end && other.end_date >= start)
        .collect();

    if !overlapping.is_empty() {
        let conflicts = overlapping
            .iter()
            .map(|other| format!("#{} ({} to {})", other.id, other.start_date, other.end_date))
            .collect::<Vec<_>>()
            .join(", ");
        violations.push(Violation::new(
            "base",
            format!("{} overlapping requests found: {}", overlapping.len(), conflicts),
        ));
    }

    let duration = duration_in_days(start, end);

    if duration > policy.max_consecutive_days {
        violations.push(Violation::new(
            "base",
            format!(
                "cannot exceed {} consecutive days for {}",
                policy.max_consecutive_days, type_name
            ),
        ));
    }

    if policy.requires_pto_balance && balance < Decimal::from(duration) {
        violations.push(Violation::new(
            "base",
            format!(
                "You do not have enough PTO available. Requested {} days but current balance is {} days",
                duration, balance
            ),
        ));
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::time_off_type::policy_for;
    use std::str::FromStr;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn date(offset: i64) -> NaiveDate {
        today() + chrono::Duration::days(offset)
    }

    fn candidate(start: i64, end: i64) -> CandidateRequest {
        CandidateRequest {
            id: None,
            start_date: Some(date(start)),
            end_date: Some(date(end)),
            reason: Some("Family vacation".into()),
        }
    }

    fn fields(violations: &[Violation]) -> Vec<&'static str> {
        violations.iter().map(|v| v.field).collect()
    }

    #[test]
    fn duration_is_inclusive_of_both_ends() {
        assert_eq!(duration_in_days(date(0), date(0)), 1);
        assert_eq!(duration_in_days(date(0), date(4)), 5);
    }

    #[test]
    fn valid_vacation_request_has_no_violations() {
        let violations = validate(
            &candidate(15, 20),
            &[],
            Decimal::from(20),
            "Vacation",
            &policy_for("Vacation"),
            today(),
        );
        assert!(violations.is_empty(), "unexpected: {:?}", violations);
    }

    #[test]
    fn missing_fields_are_presence_violations() {
        let violations = validate(
            &CandidateRequest::default(),
            &[],
            Decimal::ZERO,
            "Vacation",
            &policy_for("Vacation"),
            today(),
        );
        assert_eq!(fields(&violations), vec!["start_date", "end_date", "reason"]);
        assert!(violations.iter().all(|v| v.message == "can't be blank"));
    }

    #[test]
    fn whitespace_reason_is_blank() {
        let mut c = candidate(15, 16);
        c.reason = Some("   ".into());
        let violations = validate(&c, &[], Decimal::from(20), "Vacation", &policy_for("Vacation"), today());
        assert_eq!(fields(&violations), vec!["reason"]);
    }

    #[test]
    fn end_before_start_is_an_ordering_violation() {
        let violations = validate(
            &candidate(20, 18),
            &[],
            Decimal::from(20),
            "Vacation",
            &policy_for("Vacation"),
            today(),
        );
        assert_eq!(fields(&violations), vec!["end_date"]);
        assert_eq!(violations[0].message, "must be after start date");
    }

    #[test]
    fn start_in_the_past_is_rejected_at_validation_time() {
        let violations = validate(
            &candidate(-1, 2),
            &[],
            Decimal::from(20),
            "Sick Leave",
            &policy_for("Sick Leave"),
            today(),
        );
        assert!(violations.iter().any(|v| v.field == "start_date" && v.message == "cannot be in the past"));
    }

    #[test]
    fn start_today_is_allowed() {
        let violations = validate(
            &candidate(0, 1),
            &[],
            Decimal::ZERO,
            "Sick Leave",
            &policy_for("Sick Leave"),
            today(),
        );
        assert!(violations.is_empty(), "unexpected: {:?}", violations);
    }

    #[test]
    fn overlap_is_symmetric_and_enumerates_conflicts() {
        let existing = vec![ExistingRequest {
            id: 7,
            start_date: date(10),
            end_date: date(15),
        }];
        // Starts inside, ends inside, and spans over the existing range.
        for (start, end) in [(12, 17), (8, 12), (8, 17)] {
            let violations = validate(
                &candidate(start, end),
                &existing,
                Decimal::from(30),
                "Personal Day",
                &policy_for("Personal Day"),
                today(),
            );
            let overlap = violations
                .iter()
                .find(|v| v.message.contains("overlapping requests found"))
                .unwrap_or_else(|| panic!("no overlap violation for ({start}, {end})"));
            assert!(overlap.message.starts_with("1 overlapping requests found"));
            assert!(overlap.message.contains("#7"));
            assert!(overlap.message.contains(&date(10).to_string()));
        }
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        let existing = vec![ExistingRequest {
            id: 7,
            start_date: date(10),
            end_date: date(15),
        }];
        let violations = validate(
            &candidate(16, 18),
            &existing,
            Decimal::from(30),
            "Personal Day",
            &policy_for("Personal Day"),
            today(),
        );
        assert!(violations.is_empty(), "unexpected: {:?}", violations);
    }

    #[test]
    fn updating_a_request_does_not_conflict_with_itself() {
        let existing = vec![ExistingRequest {
            id: 7,
            start_date: date(15),
            end_date: date(20),
        }];
        let mut c = candidate(15, 20);
        c.id = Some(7);
        let violations = validate(&c, &existing, Decimal::from(30), "Vacation", &policy_for("Vacation"), today());
        assert!(violations.is_empty(), "unexpected: {:?}", violations);
    }

    #[test]
    fn vacation_needs_two_weeks_notice() {
        // 15 days out is fine, 10 days out is not.
        let ok = validate(
            &candidate(15, 20),
            &[],
            Decimal::from(6),
            "Vacation",
            &policy_for("Vacation"),
            today(),
        );
        assert!(ok.is_empty(), "unexpected: {:?}", ok);

        let violations = validate(
            &candidate(10, 15),
            &[],
            Decimal::from(6),
            "Vacation",
            &policy_for("Vacation"),
            today(),
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "start_date");
        assert!(violations[0].message.contains("14 days advance notice for Vacation"));
    }

    #[test]
    fn max_consecutive_days_is_enforced_per_type() {
        let violations = validate(
            &candidate(5, 11), // 7 days
            &[],
            Decimal::from(30),
            "Personal Day",
            &policy_for("Personal Day"),
            today(),
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("cannot exceed 5 consecutive days for Personal Day"));
    }

    #[test]
    fn balance_boundary_is_exact() {
        // 6-day vacation against a balance of exactly 6: fine.
        let ok = validate(
            &candidate(15, 20),
            &[],
            Decimal::from(6),
            "Vacation",
            &policy_for("Vacation"),
            today(),
        );
        assert!(ok.is_empty(), "unexpected: {:?}", ok);

        // A hair under 6 is not.
        let violations = validate(
            &candidate(15, 20),
            &[],
            Decimal::from_str("5.99").unwrap(),
            "Vacation",
            &policy_for("Vacation"),
            today(),
        );
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("You do not have enough PTO"));
        assert!(violations[0].message.contains("5.99"));
    }

    #[test]
    fn balance_is_ignored_for_types_that_do_not_draw_it_down() {
        let violations = validate(
            &candidate(5, 10),
            &[],
            Decimal::ZERO,
            "Sick Leave",
            &policy_for("Sick Leave"),
            today(),
        );
        assert!(violations.is_empty(), "unexpected: {:?}", violations);
    }
}
