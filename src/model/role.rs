#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Employee = 0,
    Manager = 1,
    Admin = 2,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Role::Employee),
            1 => Some(Role::Manager),
            2 => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        *self == Role::Admin
    }

    pub fn is_manager(&self) -> bool {
        *self == Role::Manager
    }
}
