//! # Access Module
//!
//! Roles, portals and the access policy that gates every API route.
//!
//! ## Portal Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Role → Portal                                   │
//! │                                                                         │
//! │  developer ──► Developer portal   (all schools, credits top-up)        │
//! │  admin     ──► Admin portal       (everything inside one school)       │
//! │  teacher   ──► Teacher portal     (students read, documents, library)  │
//! │  student   ──► Student portal     (own profile, admit cards, fees)     │
//! │  parent    ──► Parent portal      (children, notifications)            │
//! │                                                                         │
//! │  Tenant rule: everyone except developer is pinned to user.school_id    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Role
// =============================================================================

/// The role a portal user holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform operator; not bound to a school.
    Developer,
    /// School administrator.
    Admin,
    Teacher,
    Student,
    Parent,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Developer,
        Role::Admin,
        Role::Teacher,
        Role::Student,
        Role::Parent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Parent => "parent",
        }
    }

    /// The front-end portal this role lands in after login.
    pub fn portal(&self) -> Portal {
        match self {
            Role::Developer => Portal::Developer,
            Role::Admin => Portal::Admin,
            Role::Teacher => Portal::Teacher,
            Role::Student => Portal::Student,
            Role::Parent => Portal::Parent,
        }
    }

    /// Whether users with this role must belong to a school.
    pub fn requires_school(&self) -> bool {
        !matches!(self, Role::Developer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Portal
// =============================================================================

/// A role-scoped front-end area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Portal {
    Developer,
    Admin,
    Teacher,
    Student,
    Parent,
}

impl Portal {
    /// Landing path in the React router.
    pub fn home_path(&self) -> &'static str {
        match self {
            Portal::Developer => "/developer",
            Portal::Admin => "/admin",
            Portal::Teacher => "/teacher",
            Portal::Student => "/student",
            Portal::Parent => "/parent",
        }
    }
}

// =============================================================================
// Resource & Action
// =============================================================================

/// Something an API route reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Schools,
    Users,
    Students,
    Teachers,
    Templates,
    Documents,
    Credits,
    AdmitCards,
    Fees,
    Notifications,
    Library,
    Inventory,
    Transport,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
    /// Privileged operations (credit top-up, school onboarding).
    Manage,
}

/// Returns true if `role` may perform `action` on `resource`.
///
/// ## Policy
/// ```text
/// resource        developer  admin      teacher    student  parent
/// ─────────────   ─────────  ─────────  ─────────  ───────  ──────
/// schools         all        read/upd   -          -        -
/// users           all        all        -          -        -
/// students        all        all        read       -        -
/// teachers        all        all        read       -        -
/// templates       all        all        read       -        -
/// documents       all        all        read/crt   -        -
/// credits         all        read/crt   -          -        -
/// admit cards     all        all        read       -        -
/// fees            all        all        -          -        -
/// notifications   all        all        read/crt   read     read
/// library         all        all        all        -        -
/// inventory       all        all        -          -        -
/// transport       all        all        read       -        -
/// dashboard       all        read       -          -        -
/// ```
///
/// Student and parent self-service goes through the portal routes, which
/// filter by the caller's own user id instead of this table.
pub fn can(role: Role, resource: Resource, action: Action) -> bool {
    use Action::*;
    use Resource::*;

    match role {
        Role::Developer => true,
        Role::Admin => match resource {
            Schools => matches!(action, Read | Update),
            Credits => matches!(action, Read | Create),
            Dashboard => action == Read,
            _ => action != Manage,
        },
        Role::Teacher => match resource {
            Students | Teachers | Templates | AdmitCards | Transport => action == Read,
            Documents | Notifications => matches!(action, Read | Create),
            Library => action != Manage,
            _ => false,
        },
        Role::Student | Role::Parent => resource == Notifications && action == Read,
    }
}

/// Like [`can`], but returns `CoreError::Forbidden` when denied.
pub fn ensure(role: Role, resource: Resource, action: Action) -> CoreResult<()> {
    if can(role, resource, action) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "{} may not {:?} {:?}",
            role, action, resource
        )))
    }
}

// =============================================================================
// Tenant Scoping
// =============================================================================

/// The authenticated caller, as far as core rules are concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
    pub school_id: Option<String>,
}

/// Resolves which school a request operates on.
///
/// ## Rules
/// - Developer: must name a school (`requested`), any school allowed
/// - Everyone else: their own school; naming another school is forbidden
pub fn resolve_school(principal: &Principal, requested: Option<&str>) -> CoreResult<String> {
    match (principal.role, principal.school_id.as_deref(), requested) {
        (Role::Developer, _, Some(school)) => Ok(school.to_string()),
        (Role::Developer, _, None) => Err(ValidationError::required("school_id").into()),
        (_, Some(own), None) => Ok(own.to_string()),
        (_, Some(own), Some(req)) if own == req => Ok(own.to_string()),
        (_, Some(_), Some(_)) => Err(CoreError::Forbidden(
            "cannot access another school's data".to_string(),
        )),
        (_, None, _) => Err(CoreError::Forbidden(
            "user is not attached to a school".to_string(),
        )),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role, school: Option<&str>) -> Principal {
        Principal {
            user_id: "u-1".to_string(),
            role,
            school_id: school.map(str::to_string),
        }
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Teacher ".parse::<Role>().unwrap(), Role::Teacher);
        assert!("principal".parse::<Role>().is_err());
        assert_eq!(Role::Parent.to_string(), "parent");
    }

    #[test]
    fn test_portals() {
        assert_eq!(Role::Admin.portal(), Portal::Admin);
        assert_eq!(Role::Parent.portal().home_path(), "/parent");
        assert!(!Role::Developer.requires_school());
        assert!(Role::Student.requires_school());
    }

    #[test]
    fn test_policy_admin() {
        assert!(can(Role::Admin, Resource::Students, Action::Delete));
        assert!(can(Role::Admin, Resource::Credits, Action::Read));
        assert!(can(Role::Admin, Resource::Credits, Action::Create));
        assert!(!can(Role::Admin, Resource::Credits, Action::Manage));
        assert!(!can(Role::Admin, Resource::Schools, Action::Create));
    }

    #[test]
    fn test_policy_teacher() {
        assert!(can(Role::Teacher, Resource::Students, Action::Read));
        assert!(!can(Role::Teacher, Resource::Students, Action::Update));
        assert!(can(Role::Teacher, Resource::Documents, Action::Create));
        assert!(can(Role::Teacher, Resource::Library, Action::Create));
        assert!(!can(Role::Teacher, Resource::Fees, Action::Read));
        assert!(!can(Role::Teacher, Resource::Credits, Action::Read));
    }

    #[test]
    fn test_policy_student_and_parent() {
        for role in [Role::Student, Role::Parent] {
            assert!(can(role, Resource::Notifications, Action::Read));
            assert!(!can(role, Resource::Notifications, Action::Create));
            assert!(!can(role, Resource::Students, Action::Read));
        }
        assert!(ensure(Role::Parent, Resource::Fees, Action::Read).is_err());
    }

    #[test]
    fn test_resolve_school() {
        let admin = principal(Role::Admin, Some("s-1"));
        assert_eq!(resolve_school(&admin, None).unwrap(), "s-1");
        assert_eq!(resolve_school(&admin, Some("s-1")).unwrap(), "s-1");
        assert!(matches!(
            resolve_school(&admin, Some("s-2")),
            Err(CoreError::Forbidden(_))
        ));

        let dev = principal(Role::Developer, None);
        assert_eq!(resolve_school(&dev, Some("s-9")).unwrap(), "s-9");
        assert!(matches!(
            resolve_school(&dev, None),
            Err(CoreError::Validation(_))
        ));

        let orphan = principal(Role::Teacher, None);
        assert!(resolve_school(&orphan, None).is_err());
    }
}
