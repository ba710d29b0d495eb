use std::collections::{HashMap, HashSet};

use derive_more::Display;
use futures_util::StreamExt;
use sqlx::MySqlPool;

/// A reporting chain that loops is corrupt configuration, not a traversal to
/// retry. Writes are supposed to make this unrepresentable via
/// `would_create_cycle`.
#[derive(Debug, Display, PartialEq)]
pub enum HierarchyError {
    #[display(fmt = "management chain for user {} loops back on itself", _0)]
    ChainLoop(u64),
}

impl std::error::Error for HierarchyError {}

/// In-memory snapshot of the manager graph, loaded once per evaluation.
#[derive(Debug, Default, Clone)]
pub struct OrgChart {
    users: Vec<u64>,
    manager_of: HashMap<u64, u64>,
    reports_of: HashMap<u64, Vec<u64>>,
}

impl OrgChart {
    pub fn from_rows(rows: impl IntoIterator<Item = (u64, Option<u64>)>) -> Self {
        let mut chart = OrgChart::default();
        for (user_id, manager_id) in rows {
            chart.users.push(user_id);
            if let Some(manager_id) = manager_id {
                chart.manager_of.insert(user_id, manager_id);
                chart.reports_of.entry(manager_id).or_default().push(user_id);
            }
        }
        chart
    }

    pub async fn load(pool: &MySqlPool) -> Result<Self, sqlx::Error> {
        let mut stream =
            sqlx::query_as::<_, (u64, Option<u64>)>("SELECT id, manager_id FROM users").fetch(pool);

        let mut rows = Vec::new();
        while let Some(row) = stream.next().await {
            rows.push(row?);
        }

        Ok(Self::from_rows(rows))
    }

    pub fn user_ids(&self) -> &[u64] {
        &self.users
    }

    pub fn manager_of(&self, user_id: u64) -> Option<u64> {
        self.manager_of.get(&user_id).copied()
    }

    /// Direct reports only — one hop down.
    pub fn direct_reports(&self, user_id: u64) -> &[u64] {
        self.reports_of.get(&user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The user's own manager, then that manager's manager, and so on up to a
    /// user with nobody above them. Iteration is bounded by the number of
    /// users; revisiting any node means the stored graph is cyclic.
    pub fn management_chain(&self, user_id: u64) -> Result<Vec<u64>, HierarchyError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([user_id]);
        let mut current = user_id;

        while let Some(manager_id) = self.manager_of(current) {
            if !seen.insert(manager_id) {
                return Err(HierarchyError::ChainLoop(user_id));
            }
            chain.push(manager_id);
            current = manager_id;
        }

        Ok(chain)
    }

    /// True when assigning `candidate_manager` above `user_id` would let the
    /// manager relation reach back to `user_id`. Self-assignment counts.
    pub fn would_create_cycle(&self, user_id: u64, candidate_manager: u64) -> bool {
        if candidate_manager == user_id {
            return true;
        }

        let mut seen = HashSet::from([candidate_manager]);
        let mut current = candidate_manager;
        while let Some(manager_id) = self.manager_of(current) {
            if manager_id == user_id {
                return true;
            }
            if !seen.insert(manager_id) {
                // Pre-existing loop above the candidate; refuse the write.
                return true;
            }
            current = manager_id;
        }

        false
    }

    /// Who shows up on the aggregate dashboard. Managers see their direct
    /// reports; the admin view widens to exactly two levels, never the full
    /// transitive closure.
    pub fn visible_subordinates(&self, user_id: u64, two_level: bool) -> Vec<u64> {
        let mut seen = HashSet::new();
        let mut visible = Vec::new();

        for &report in self.direct_reports(user_id) {
            if seen.insert(report) {
                visible.push(report);
            }
        }

        if two_level {
            for &report in self.direct_reports(user_id) {
                for &second in self.direct_reports(report) {
                    if seen.insert(second) {
                        visible.push(second);
                    }
                }
            }
        }

        visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // admin(1) <- manager(2) <- employees 3, 4; employee 5 reports to admin;
    // employee 6 reports to 3 (third level from the admin).
    fn chart() -> OrgChart {
        OrgChart::from_rows([
            (1, None),
            (2, Some(1)),
            (3, Some(2)),
            (4, Some(2)),
            (5, Some(1)),
            (6, Some(3)),
        ])
    }

    #[test]
    fn direct_reports_are_one_hop() {
        let chart = chart();
        assert_eq!(chart.direct_reports(2), &[3, 4]);
        assert_eq!(chart.direct_reports(1), &[2, 5]);
        assert!(chart.direct_reports(4).is_empty());
    }

    #[test]
    fn management_chain_walks_to_the_top() {
        let chart = chart();
        assert_eq!(chart.management_chain(6).unwrap(), vec![3, 2, 1]);
        assert_eq!(chart.management_chain(1).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn looping_chain_is_a_configuration_error() {
        let chart = OrgChart::from_rows([(1, Some(2)), (2, Some(1))]);
        assert_eq!(chart.management_chain(1), Err(HierarchyError::ChainLoop(1)));
    }

    #[test]
    fn self_management_is_a_cycle() {
        assert!(chart().would_create_cycle(3, 3));
    }

    #[test]
    fn direct_cycle_is_detected() {
        // 3 reports to 2; making 2 report to 3 closes the loop.
        assert!(chart().would_create_cycle(2, 3));
    }

    #[test]
    fn transitive_cycle_is_detected() {
        // 6 -> 3 -> 2 -> 1; making 1 report to 6 closes a long loop.
        assert!(chart().would_create_cycle(1, 6));
    }

    #[test]
    fn reassignment_without_a_loop_is_allowed() {
        // Moving 4 under 5 is fine.
        assert!(!chart().would_create_cycle(4, 5));
    }

    #[test]
    fn managers_see_one_level() {
        assert_eq!(chart().visible_subordinates(2, false), vec![3, 4]);
    }

    #[test]
    fn admins_see_exactly_two_levels() {
        let visible = chart().visible_subordinates(1, true);
        assert_eq!(visible, vec![2, 5, 3, 4]);
        // 6 is a third-level descendant and stays out of the expanded view.
        assert!(!visible.contains(&6));
    }
}
