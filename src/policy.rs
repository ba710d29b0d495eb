use crate::model::role::Role;

/// Who is asking. Built from the JWT claims by the `AuthUser` extractor.
#[derive(Debug, Copy, Clone)]
pub struct Actor {
    pub user_id: u64,
    pub role: Role,
}

/// View authority climbs the whole chain: any manager above the owner,
/// however many hops up, may open the record. Contrast with
/// `can_approve_or_deny`, which stops at one hop.
pub fn can_view(actor: &Actor, owner_id: u64, owner_ancestors: &[u64]) -> bool {
    actor.role.is_admin() || actor.user_id == owner_id || owner_ancestors.contains(&actor.user_id)
}

/// Anyone may file a request; it is always attributed to themselves.
pub fn can_create(_actor: &Actor) -> bool {
    true
}

pub fn can_update(actor: &Actor, owner_id: u64) -> bool {
    actor.role.is_admin() || actor.user_id == owner_id
}

/// One hop only. A grand-manager can see a request but not decide it.
pub fn can_approve_or_deny(actor: &Actor, owner_manager_id: Option<u64>) -> bool {
    actor.role.is_admin() || owner_manager_id == Some(actor.user_id)
}

/// Role-level gate for the aggregate manager/admin views.
pub fn can_manage_dashboard(actor: &Actor) -> bool {
    actor.role.is_admin() || actor.role.is_manager()
}

/// How list endpoints are scoped. Narrower than `can_view` on purpose: the
/// index only ever shows your own requests unless you are an admin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ListScope {
    All,
    OwnedBy(u64),
}

pub fn list_scope(actor: &Actor) -> ListScope {
    if actor.role.is_admin() {
        ListScope::All
    } else {
        ListScope::OwnedBy(actor.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(user_id: u64, role: Role) -> Actor {
        Actor { user_id, role }
    }

    #[test]
    fn owners_and_admins_can_view() {
        assert!(can_view(&actor(3, Role::Employee), 3, &[]));
        assert!(can_view(&actor(9, Role::Admin), 3, &[]));
        assert!(!can_view(&actor(4, Role::Employee), 3, &[]));
    }

    #[test]
    fn view_authority_is_transitive_up_the_chain() {
        // owner 6 reports to 3, who reports to 2, who reports to 1
        let ancestors = [3, 2, 1];
        assert!(can_view(&actor(2, Role::Manager), 6, &ancestors));
        assert!(can_view(&actor(1, Role::Manager), 6, &ancestors));
        assert!(!can_view(&actor(5, Role::Manager), 6, &ancestors));
    }

    #[test]
    fn approval_authority_is_one_hop_only() {
        // owner's direct manager is 3
        assert!(can_approve_or_deny(&actor(3, Role::Manager), Some(3)));
        // grand-manager 2 may view but not decide
        assert!(!can_approve_or_deny(&actor(2, Role::Manager), Some(3)));
        assert!(can_approve_or_deny(&actor(9, Role::Admin), Some(3)));
        assert!(!can_approve_or_deny(&actor(4, Role::Employee), None));
    }

    #[test]
    fn update_is_owner_or_admin() {
        assert!(can_update(&actor(3, Role::Employee), 3));
        assert!(can_update(&actor(9, Role::Admin), 3));
        assert!(!can_update(&actor(3, Role::Manager), 4));
    }

    #[test]
    fn dashboard_gate_is_role_level() {
        assert!(can_manage_dashboard(&actor(1, Role::Admin)));
        assert!(can_manage_dashboard(&actor(2, Role::Manager)));
        assert!(!can_manage_dashboard(&actor(3, Role::Employee)));
    }

    #[test]
    fn list_scope_is_own_unless_admin() {
        assert_eq!(list_scope(&actor(1, Role::Admin)), ListScope::All);
        // Managers do NOT get a widened index; the dashboard is their
        // aggregate view.
        assert_eq!(list_scope(&actor(2, Role::Manager)), ListScope::OwnedBy(2));
        assert_eq!(list_scope(&actor(3, Role::Employee)), ListScope::OwnedBy(3));
    }

    #[test]
    fn anyone_may_create() {
        assert!(can_create(&actor(3, Role::Employee)));
    }
}
