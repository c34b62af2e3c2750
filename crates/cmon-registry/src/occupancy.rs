//! # Occupancy Records
//!
//! `PropertyDetails` and the `Occupancy` record for a resident at a
//! property. Field names serialize in the contract's kebab-case tuple form
//! (`move-in-date`, `lease-expiry`, ...).
//!
//! ## Invariants
//!
//! - `lease_expiry` is strictly after `move_in_date` and never changes.
//! - `violations` only ever increases while the occupancy is active.
//! - `last_compliance_check` starts at `move_in_date`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cmon_core::{Address, BlockHeight, ComplianceStatus, PropertyId};

/// Owner and rent of a property. Overwritten wholesale by each
/// `set-property-details` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PropertyDetails {
    pub owner: Address,
    pub rent_amount: u64,
}

/// Key of an occupancy: one resident at one property.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OccupancyKey {
    pub property_id: PropertyId,
    pub resident: Address,
}

impl OccupancyKey {
    pub fn new(property_id: PropertyId, resident: Address) -> Self {
        Self {
            property_id,
            resident,
        }
    }
}

impl std::fmt::Display for OccupancyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.property_id, self.resident)
    }
}

/// The active lease and compliance record for a resident at a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Occupancy {
    /// Block height at registration.
    pub move_in_date: BlockHeight,
    /// Block height after which the lease is expired.
    pub lease_expiry: BlockHeight,
    /// Rent copied from the property at registration.
    pub rent_amount: u64,
    /// Block height of the most recent compliance check.
    pub last_compliance_check: BlockHeight,
    pub compliance_status: ComplianceStatus,
    /// Number of checks that flagged a violation.
    pub violations: u64,
}

impl Occupancy {
    /// A fresh occupancy moving in at `now`. The caller has already checked
    /// that `lease_expiry` is after `now`.
    pub(crate) fn move_in(now: BlockHeight, lease_expiry: BlockHeight, rent_amount: u64) -> Self {
        Self {
            move_in_date: now,
            lease_expiry,
            rent_amount,
            last_compliance_check: now,
            compliance_status: ComplianceStatus::Compliant,
            violations: 0,
        }
    }

    /// Apply a compliance check outcome observed at `now`.
    ///
    /// The violation counter saturates instead of wrapping.
    pub(crate) fn record_check(
        &mut self,
        now: BlockHeight,
        status: ComplianceStatus,
        violation_flag: bool,
    ) {
        self.compliance_status = status;
        self.last_compliance_check = now;
        if violation_flag {
            self.violations = self.violations.saturating_add(1);
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.compliance_status.is_compliant()
    }

    /// Whether the lease has expired as of `now` (strictly after expiry).
    pub fn is_lease_expired(&self, now: BlockHeight) -> bool {
        now.is_after(self.lease_expiry)
    }
}

/// Serializes the occupancy map as a list of entries, since JSON object
/// keys cannot be composite.
pub(crate) mod entries {
    use super::*;
    use serde::{Deserializer, Serializer};

    #[derive(Serialize)]
    struct EntryRef<'a> {
        #[serde(rename = "property-id")]
        property_id: PropertyId,
        resident: &'a Address,
        occupancy: &'a Occupancy,
    }

    #[derive(Deserialize)]
    struct Entry {
        #[serde(rename = "property-id")]
        property_id: PropertyId,
        resident: Address,
        occupancy: Occupancy,
    }

    pub fn serialize<S>(
        map: &BTreeMap<OccupancyKey, Occupancy>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(map.iter().map(|(key, occupancy)| EntryRef {
            property_id: key.property_id,
            resident: &key.resident,
            occupancy,
        }))
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<OccupancyKey, Occupancy>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        let mut map = BTreeMap::new();
        for entry in entries {
            let key = OccupancyKey::new(entry.property_id, entry.resident);
            if map.insert(key.clone(), entry.occupancy).is_some() {
                return Err(serde::de::Error::custom(format!(
                    "duplicate occupancy entry for {key}"
                )));
            }
        }
        Ok(map)
    }
}
