use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

use crate::error::{AppError, AppResult};
use crate::model::leave_request::LeaveScope;
use crate::model::role::Role;

/// Caller identity, verified once by `auth_middleware` and stored in the
/// request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Missing token")),
        )
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> AppResult<()> {
        if self.role.can_administer() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin only".into()))
        }
    }

    pub fn require_hr_or_admin(&self) -> AppResult<()> {
        if self.role.can_manage_leave() {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR/Admin only".into()))
        }
    }

    /// The caller's employee id, for operations on their own records.
    pub fn require_employee_profile(&self) -> AppResult<u64> {
        self.employee_id
            .ok_or_else(|| AppError::Forbidden("No employee profile".into()))
    }

    /// Employees see their own records; HR and admins see everyone's.
    pub fn can_view_employee(&self, employee_id: u64) -> bool {
        self.role.can_manage_leave() || self.employee_id == Some(employee_id)
    }

    /// Leaves this caller may list: all for HR and admins, the team for a
    /// manager, otherwise their own.
    pub fn leave_scope(&self) -> AppResult<LeaveScope> {
        if self.role.can_manage_leave() {
            return Ok(LeaveScope::All);
        }
        let employee_id = self.require_employee_profile()?;
        Ok(match self.role {
            Role::Manager => LeaveScope::Team(employee_id),
            _ => LeaveScope::Own(employee_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "someone".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn employee_sees_only_own_records() {
        let me = user(Role::Employee, Some(1000));
        assert!(me.can_view_employee(1000));
        assert!(!me.can_view_employee(1001));
        assert!(user(Role::Hr, None).can_view_employee(1001));
    }

    #[test]
    fn leave_scope_follows_role() {
        assert_eq!(user(Role::Hr, None).leave_scope().unwrap(), LeaveScope::All);
        assert_eq!(
            user(Role::Manager, Some(7)).leave_scope().unwrap(),
            LeaveScope::Team(7)
        );
        assert_eq!(
            user(Role::Employee, Some(1000)).leave_scope().unwrap(),
            LeaveScope::Own(1000)
        );
        assert!(user(Role::Employee, None).leave_scope().is_err());
    }

    #[test]
    fn role_gates() {
        assert!(user(Role::Hr, None).require_hr_or_admin().is_ok());
        assert_eq!(
            user(Role::Hr, None).require_admin().unwrap_err().kind(),
            "forbidden"
        );
        assert!(user(Role::Employee, Some(1)).require_hr_or_admin().is_err());
        assert!(user(Role::Admin, None).require_employee_profile().is_err());
    }
}
