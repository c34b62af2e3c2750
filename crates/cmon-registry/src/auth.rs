//! # Authorization
//!
//! Each mutating operation declares the roles allowed to call it, and
//! [`authorize`] is the single predicate the registry evaluates before any
//! state is touched. There are no ad hoc caller comparisons elsewhere.
//!
//! | Operation                  | Admin | Inspector | Property owner |
//! |----------------------------|:-----:|:---------:|:--------------:|
//! | add-inspector              |   ✓   |           |                |
//! | remove-inspector           |   ✓   |           |                |
//! | set-property-details       |   ✓   |           |                |
//! | register-occupancy         |   ✓   |           |       ✓        |
//! | perform-compliance-check   |       |     ✓     |                |
//! | end-occupancy              |   ✓   |     ✓     |                |
//! | transfer-admin             |   ✓   |           |                |
//!
//! `initialize` is not role-gated; it succeeds exactly once.

use serde::{Deserialize, Serialize};

use cmon_core::Address;

use crate::error::RegistryError;

/// A role a caller can hold with respect to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Admin,
    Inspector,
    /// Owner of the property the operation targets.
    PropertyOwner,
}

/// A role-gated registry operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    AddInspector,
    RemoveInspector,
    SetPropertyDetails,
    RegisterOccupancy,
    PerformComplianceCheck,
    EndOccupancy,
    TransferAdmin,
}

impl Operation {
    /// Contract function name of the operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddInspector => "add-inspector",
            Self::RemoveInspector => "remove-inspector",
            Self::SetPropertyDetails => "set-property-details",
            Self::RegisterOccupancy => "register-occupancy",
            Self::PerformComplianceCheck => "perform-compliance-check",
            Self::EndOccupancy => "end-occupancy",
            Self::TransferAdmin => "transfer-admin",
        }
    }

    /// Roles permitted to call this operation.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Self::AddInspector
            | Self::RemoveInspector
            | Self::SetPropertyDetails
            | Self::TransferAdmin => &[Role::Admin],
            Self::RegisterOccupancy => &[Role::Admin, Role::PropertyOwner],
            Self::PerformComplianceCheck => &[Role::Inspector],
            Self::EndOccupancy => &[Role::Admin, Role::Inspector],
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The roles a specific caller holds for a specific call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallerRoles {
    pub admin: bool,
    pub inspector: bool,
    pub property_owner: bool,
}

impl CallerRoles {
    pub fn has(&self, role: Role) -> bool {
        match role {
            Role::Admin => self.admin,
            Role::Inspector => self.inspector,
            Role::PropertyOwner => self.property_owner,
        }
    }
}

/// Authorize `caller` holding `roles` to perform `operation`.
///
/// # Errors
///
/// Returns [`RegistryError::Unauthorized`] if the caller holds none of the
/// operation's allowed roles.
pub fn authorize(
    operation: Operation,
    caller: &Address,
    roles: CallerRoles,
) -> Result<(), RegistryError> {
    if operation.allowed_roles().iter().any(|r| roles.has(*r)) {
        return Ok(());
    }
    tracing::warn!(
        caller = %caller,
        operation = %operation,
        "authorization rejected"
    );
    Err(RegistryError::Unauthorized {
        caller: caller.clone(),
        operation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OPERATIONS: [Operation; 7] = [
        Operation::AddInspector,
        Operation::RemoveInspector,
        Operation::SetPropertyDetails,
        Operation::RegisterOccupancy,
        Operation::PerformComplianceCheck,
        Operation::EndOccupancy,
        Operation::TransferAdmin,
    ];

    fn caller() -> Address {
        Address::new("ST3NBRSFKX28FQ2ZJ1MAKX58HKHSDGNV5N7R21XCP").unwrap()
    }

    #[test]
    fn test_no_roles_rejected_everywhere() {
        for op in ALL_OPERATIONS {
            let err = authorize(op, &caller(), CallerRoles::default()).unwrap_err();
            assert!(matches!(err, RegistryError::Unauthorized { operation, .. } if operation == op));
        }
    }

    #[test]
    fn test_admin_cannot_perform_compliance_check() {
        let roles = CallerRoles { admin: true, ..Default::default() };
        assert!(authorize(Operation::PerformComplianceCheck, &caller(), roles).is_err());
        for op in ALL_OPERATIONS {
            if op != Operation::PerformComplianceCheck {
                assert!(authorize(op, &caller(), roles).is_ok(), "admin rejected for {op}");
            }
        }
    }

    #[test]
    fn test_inspector_permissions() {
        let roles = CallerRoles { inspector: true, ..Default::default() };
        assert!(authorize(Operation::PerformComplianceCheck, &caller(), roles).is_ok());
        assert!(authorize(Operation::EndOccupancy, &caller(), roles).is_ok());
        assert!(authorize(Operation::AddInspector, &caller(), roles).is_err());
        assert!(authorize(Operation::RegisterOccupancy, &caller(), roles).is_err());
        assert!(authorize(Operation::TransferAdmin, &caller(), roles).is_err());
    }

    #[test]
    fn test_property_owner_may_only_register() {
        let roles = CallerRoles { property_owner: true, ..Default::default() };
        for op in ALL_OPERATIONS {
            let allowed = authorize(op, &caller(), roles).is_ok();
            assert_eq!(allowed, op == Operation::RegisterOccupancy, "{op}");
        }
    }

    #[test]
    fn test_operation_names_match_contract() {
        let names: Vec<&str> = ALL_OPERATIONS.iter().map(Operation::as_str).collect();
        assert_eq!(
            names,
            [
                "add-inspector",
                "remove-inspector",
                "set-property-details",
                "register-occupancy",
                "perform-compliance-check",
                "end-occupancy",
                "transfer-admin",
            ]
        );
    }
}
