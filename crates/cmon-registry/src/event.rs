//! # Registry Event Log
//!
//! Every successful state-changing call appends exactly one event.
//! Idempotent no-ops (adding a present inspector, removing an absent one)
//! and failed calls append nothing.

use serde::{Deserialize, Serialize};

use cmon_core::{Address, BlockHeight, ComplianceStatus, PropertyId};

/// One entry of the append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryEvent {
    /// Position in the log, starting at zero.
    pub sequence: u64,
    pub block_height: BlockHeight,
    pub caller: Address,
    pub kind: RegistryEventKind,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "kebab-case")]
pub enum RegistryEventKind {
    Initialized,
    InspectorAdded {
        inspector: Address,
    },
    InspectorRemoved {
        inspector: Address,
    },
    PropertyDetailsSet {
        property_id: PropertyId,
        owner: Address,
        rent_amount: u64,
    },
    OccupancyRegistered {
        property_id: PropertyId,
        resident: Address,
        lease_expiry: BlockHeight,
    },
    ComplianceChecked {
        property_id: PropertyId,
        resident: Address,
        status: ComplianceStatus,
        violation_flag: bool,
        /// Violation count after this check.
        violations: u64,
    },
    OccupancyEnded {
        property_id: PropertyId,
        resident: Address,
    },
    AdminTransferred {
        from: Address,
        to: Address,
    },
}

impl RegistryEventKind {
    /// Short name used in logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::InspectorAdded { .. } => "inspector-added",
            Self::InspectorRemoved { .. } => "inspector-removed",
            Self::PropertyDetailsSet { .. } => "property-details-set",
            Self::OccupancyRegistered { .. } => "occupancy-registered",
            Self::ComplianceChecked { .. } => "compliance-checked",
            Self::OccupancyEnded { .. } => "occupancy-ended",
            Self::AdminTransferred { .. } => "admin-transferred",
        }
    }
}

impl std::fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} @{} {} by {}",
            self.sequence,
            self.block_height,
            self.kind.name(),
            self.caller
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_is_tagged() {
        let event = RegistryEvent {
            sequence: 3,
            block_height: BlockHeight::new(12345),
            caller: Address::new("ST3NBRSFKX28FQ2ZJ1MAKX58HKHSDGNV5N7R21XCP").unwrap(),
            kind: RegistryEventKind::ComplianceChecked {
                property_id: PropertyId::new(1).unwrap(),
                resident: Address::new("ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG").unwrap(),
                status: ComplianceStatus::NonCompliant,
                violation_flag: true,
                violations: 1,
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"]["type"], "compliance-checked");
        assert_eq!(value["kind"]["status"], "non-compliant");
        assert_eq!(value["block-height"], 12345);

        let parsed: RegistryEvent = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_display() {
        let event = RegistryEvent {
            sequence: 0,
            block_height: BlockHeight::new(1),
            caller: Address::new("ST1").unwrap(),
            kind: RegistryEventKind::Initialized,
        };
        assert_eq!(event.to_string(), "#0 @1 initialized by ST1");
    }
}
