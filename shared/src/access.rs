//! Role-based access rules
//!
//! Two roles exist. Admins run the workshop day to day (parts, transactions,
//! reference data); Owners read the monthly reports and the audit log.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Role assigned to a user profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "owner" => Ok(Role::Owner),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// An authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

/// Operations guarded by the access gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ManageParts,
    ManageSales,
    ManageRestock,
    ManageService,
    ManageCatalog,
    ViewReports,
    ViewAuditLog,
    ViewProfile(Uuid),
    UpdateProfile(Uuid),
    Logout,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("forbidden")]
    Forbidden,
}

/// Decide whether `caller` may perform `op`.
pub fn authorize(caller: Option<&Caller>, op: Operation) -> Result<(), AccessError> {
    let caller = caller.ok_or(AccessError::NotLoggedIn)?;

    let allowed = match op {
        Operation::ManageParts
        | Operation::ManageSales
        | Operation::ManageRestock
        | Operation::ManageService
        | Operation::ManageCatalog => caller.role == Role::Admin,
        Operation::ViewReports | Operation::ViewAuditLog => caller.role == Role::Owner,
        Operation::ViewProfile(owner) | Operation::UpdateProfile(owner) => {
            caller.user_id == owner || caller.role == Role::Admin
        }
        Operation::Logout => true,
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> Caller {
        Caller {
            user_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn test_anonymous_is_not_logged_in() {
        assert_eq!(
            authorize(None, Operation::ManageSales),
            Err(AccessError::NotLoggedIn)
        );
        assert_eq!(authorize(None, Operation::Logout), Err(AccessError::NotLoggedIn));
    }

    #[test]
    fn test_admin_operational_crud() {
        let admin = caller(Role::Admin);
        for op in [
            Operation::ManageParts,
            Operation::ManageSales,
            Operation::ManageRestock,
            Operation::ManageService,
            Operation::ManageCatalog,
        ] {
            assert_eq!(authorize(Some(&admin), op), Ok(()));
        }
        assert_eq!(
            authorize(Some(&admin), Operation::ViewReports),
            Err(AccessError::Forbidden)
        );
        assert_eq!(
            authorize(Some(&admin), Operation::ViewAuditLog),
            Err(AccessError::Forbidden)
        );
    }

    #[test]
    fn test_owner_reads_reports_only() {
        let owner = caller(Role::Owner);
        assert_eq!(authorize(Some(&owner), Operation::ViewReports), Ok(()));
        assert_eq!(authorize(Some(&owner), Operation::ViewAuditLog), Ok(()));
        assert_eq!(
            authorize(Some(&owner), Operation::ManageSales),
            Err(AccessError::Forbidden)
        );
    }

    #[test]
    fn test_profile_self_or_admin() {
        let owner = caller(Role::Owner);
        let other = caller(Role::Owner);
        let admin = caller(Role::Admin);

        assert_eq!(
            authorize(Some(&owner), Operation::ViewProfile(owner.user_id)),
            Ok(())
        );
        assert_eq!(
            authorize(Some(&other), Operation::UpdateProfile(owner.user_id)),
            Err(AccessError::Forbidden)
        );
        assert_eq!(
            authorize(Some(&admin), Operation::UpdateProfile(owner.user_id)),
            Ok(())
        );
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("owner".parse::<Role>(), Ok(Role::Owner));
        assert!("mechanic".parse::<Role>().is_err());
    }
}
