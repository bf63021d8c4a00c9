use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    Manager = 4,
    SuperAdmin = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::Manager),
            5 => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    /// Approve/reject leave, adjust balances, reconcile a month.
    pub fn can_manage_leave(self) -> bool {
        match self {
            Role::Admin | Role::Hr | Role::SuperAdmin => true,
            Role::Employee | Role::Manager => false,
        }
    }

    /// Run and finalize payroll, edit leave policy.
    pub fn can_administer(self) -> bool {
        match self {
            Role::Admin | Role::SuperAdmin => true,
            Role::Hr | Role::Employee | Role::Manager => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_id_is_rejected() {
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(6), None);
        assert_eq!(Role::from_id(2), Some(Role::Hr));
    }

    #[test]
    fn hr_manages_leave_but_does_not_run_payroll() {
        assert!(Role::Hr.can_manage_leave());
        assert!(!Role::Hr.can_administer());
        assert!(!Role::Manager.can_manage_leave());
        assert!(Role::SuperAdmin.can_administer());
    }
}
