use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeOffType {
    pub id: u64,
    pub name: String,
}

/// Business rules attached to a time-off type, keyed by type NAME (not id) so
/// renaming a row in the DB is what changes its policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypePolicy {
    pub advance_notice_days: i64,
    pub max_consecutive_days: i64,
    pub requires_manager_approval: bool,
    /// Only vacation draws down the PTO ledger.
    pub requires_pto_balance: bool,
}

/// Fallback for any type name not in the table below.
pub const DEFAULT_POLICY: TypePolicy = TypePolicy {
    advance_notice_days: 7,
    max_consecutive_days: 14,
    requires_manager_approval: true,
    requires_pto_balance: false,
};

static POLICY_TABLE: Lazy<Vec<(&'static str, TypePolicy)>> = Lazy::new(|| {
    vec![
        (
            "Vacation",
            TypePolicy {
                advance_notice_days: 14,
                max_consecutive_days: 30,
                requires_manager_approval: true,
                requires_pto_balance: true,
            },
        ),
        (
            // Sick leave is auto-approved and needs no notice.
            "Sick Leave",
            TypePolicy {
                advance_notice_days: 0,
                max_consecutive_days: 90,
                requires_manager_approval: false,
                requires_pto_balance: false,
            },
        ),
        (
            "Personal Day",
            TypePolicy {
                advance_notice_days: 3,
                max_consecutive_days: 5,
                requires_manager_approval: true,
                requires_pto_balance: false,
            },
        ),
    ]
});

pub fn policy_for(type_name: &str) -> TypePolicy {
    POLICY_TABLE
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, policy)| *policy)
        .unwrap_or(DEFAULT_POLICY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vacation_policy() {
        let p = policy_for("Vacation");
        assert_eq!(p.advance_notice_days, 14);
        assert_eq!(p.max_consecutive_days, 30);
        assert!(p.requires_manager_approval);
        assert!(p.requires_pto_balance);
    }

    #[test]
    fn sick_leave_needs_no_notice_or_approval() {
        let p = policy_for("Sick Leave");
        assert_eq!(p.advance_notice_days, 0);
        assert_eq!(p.max_consecutive_days, 90);
        assert!(!p.requires_manager_approval);
        assert!(!p.requires_pto_balance);
    }

    #[test]
    fn personal_day_policy() {
        let p = policy_for("Personal Day");
        assert_eq!(p.advance_notice_days, 3);
        assert_eq!(p.max_consecutive_days, 5);
    }

    #[test]
    fn unknown_types_get_defaults() {
        let p = policy_for("Jury Duty");
        assert_eq!(p, DEFAULT_POLICY);
        assert_eq!(p.advance_notice_days, 7);
        assert_eq!(p.max_consecutive_days, 14);
        assert!(p.requires_manager_approval);
        assert!(!p.requires_pto_balance);
    }
}
