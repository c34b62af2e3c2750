//! # Compliance Registry
//!
//! The ledger of properties, occupancies, and roles. Every mutating call
//! follows the same three steps:
//!
//! 1. **Authorize** the caller via [`authorize`] against the operation's
//!    allowed roles.
//! 2. **Validate** preconditions against current state.
//! 3. **Apply** the transition and append one [`RegistryEvent`].
//!
//! Nothing is written before step 3, so a failed call has no side effects.
//!
//! The registry is an explicitly owned value: tests, the CLI, and any host
//! each hold their own instance. Callers supply the transaction context
//! (caller address and current block height) on every call.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use cmon_core::{
    sha256_digest, Address, BlockHeight, CanonicalBytes, CmonError, ComplianceStatus, PropertyId,
    StateDigest,
};

use crate::auth::{authorize, CallerRoles, Operation};
use crate::error::RegistryError;
use crate::event::{RegistryEvent, RegistryEventKind};
use crate::occupancy::{Occupancy, OccupancyKey, PropertyDetails};

/// Who is calling and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    pub caller: Address,
    pub block_height: BlockHeight,
}

impl TxContext {
    pub fn new(caller: Address, block_height: BlockHeight) -> Self {
        Self {
            caller,
            block_height,
        }
    }
}

/// The compliance monitoring registry.
///
/// Serializes deterministically (sorted maps), so [`state_digest`] is a
/// stable fingerprint of the full state.
///
/// [`state_digest`]: ComplianceRegistry::state_digest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComplianceRegistry {
    admin: Option<Address>,
    inspectors: BTreeSet<Address>,
    properties: BTreeMap<PropertyId, PropertyDetails>,
    #[serde(with = "crate::occupancy::entries")]
    occupancies: BTreeMap<OccupancyKey, Occupancy>,
    events: Vec<RegistryEvent>,
}

impl ComplianceRegistry {
    /// An uninitialized registry. Every role-gated call fails until
    /// [`initialize`](Self::initialize) installs an admin.
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Role management ────────────────────────────────────────────

    /// One-time setup: the caller becomes admin and the inspector set is
    /// emptied.
    pub fn initialize(&mut self, ctx: &TxContext) -> Result<(), RegistryError> {
        if let Some(admin) = &self.admin {
            return Err(RegistryError::AlreadyInitialized {
                admin: admin.clone(),
            });
        }
        self.admin = Some(ctx.caller.clone());
        self.inspectors.clear();
        tracing::info!(admin = %ctx.caller, height = %ctx.block_height, "registry initialized");
        self.emit(ctx, RegistryEventKind::Initialized);
        Ok(())
    }

    /// Add an inspector. Returns `false` if the address was already an
    /// inspector, in which case nothing changes.
    pub fn add_inspector(
        &mut self,
        ctx: &TxContext,
        inspector: Address,
    ) -> Result<bool, RegistryError> {
        authorize(Operation::AddInspector, &ctx.caller, self.roles_of(&ctx.caller, None))?;
        if !self.inspectors.insert(inspector.clone()) {
            tracing::debug!(inspector = %inspector, "inspector already present");
            return Ok(false);
        }
        tracing::debug!(inspector = %inspector, "inspector added");
        self.emit(ctx, RegistryEventKind::InspectorAdded { inspector });
        Ok(true)
    }

    /// Remove an inspector. Returns `false` if the address was not an
    /// inspector, in which case nothing changes.
    pub fn remove_inspector(
        &mut self,
        ctx: &TxContext,
        inspector: &Address,
    ) -> Result<bool, RegistryError> {
        authorize(Operation::RemoveInspector, &ctx.caller, self.roles_of(&ctx.caller, None))?;
        if !self.inspectors.remove(inspector) {
            tracing::debug!(inspector = %inspector, "inspector already absent");
            return Ok(false);
        }
        tracing::debug!(inspector = %inspector, "inspector removed");
        self.emit(
            ctx,
            RegistryEventKind::InspectorRemoved {
                inspector: inspector.clone(),
            },
        );
        Ok(true)
    }

    /// Replace the admin. The previous admin loses admin rights at once.
    pub fn transfer_admin(
        &mut self,
        ctx: &TxContext,
        new_admin: Address,
    ) -> Result<(), RegistryError> {
        authorize(Operation::TransferAdmin, &ctx.caller, self.roles_of(&ctx.caller, None))?;
        let from = ctx.caller.clone();
        self.admin = Some(new_admin.clone());
        tracing::info!(from = %from, to = %new_admin, "admin transferred");
        self.emit(
            ctx,
            RegistryEventKind::AdminTransferred {
                from,
                to: new_admin,
            },
        );
        Ok(())
    }

    // ─── Properties ─────────────────────────────────────────────────

    /// Create or overwrite the details of a property.
    pub fn set_property_details(
        &mut self,
        ctx: &TxContext,
        property_id: PropertyId,
        owner: Address,
        rent_amount: u64,
    ) -> Result<(), RegistryError> {
        authorize(
            Operation::SetPropertyDetails,
            &ctx.caller,
            self.roles_of(&ctx.caller, None),
        )?;
        let details = PropertyDetails {
            owner: owner.clone(),
            rent_amount,
        };
        if let Some(previous) = self.properties.insert(property_id, details) {
            tracing::debug!(
                property = %property_id,
                previous_owner = %previous.owner,
                previous_rent = previous.rent_amount,
                "property details overwritten"
            );
        }
        self.emit(
            ctx,
            RegistryEventKind::PropertyDetailsSet {
                property_id,
                owner,
                rent_amount,
            },
        );
        Ok(())
    }

    // ─── Occupancy lifecycle ────────────────────────────────────────

    /// Register a resident at a property (NonExistent → Active).
    ///
    /// Callable by the admin or the property's owner. The rent is copied
    /// from the property's current details; later changes to the property
    /// do not affect this occupancy.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the caller is neither admin nor owner. A
    ///   non-admin caller targeting an unknown property owns nothing and is
    ///   rejected here.
    /// - `PropertyNotFound` if no details are set for the property.
    /// - `OccupancyAlreadyExists` if the pair is already active.
    /// - `InvalidLeaseExpiry` if `lease_expiry` is not after the current height.
    pub fn register_occupancy(
        &mut self,
        ctx: &TxContext,
        property_id: PropertyId,
        resident: Address,
        lease_expiry: BlockHeight,
    ) -> Result<(), RegistryError> {
        authorize(
            Operation::RegisterOccupancy,
            &ctx.caller,
            self.roles_of(&ctx.caller, Some(property_id)),
        )?;
        let rent_amount = self
            .properties
            .get(&property_id)
            .map(|p| p.rent_amount)
            .ok_or(RegistryError::PropertyNotFound(property_id))?;
        let key = OccupancyKey::new(property_id, resident);
        if self.occupancies.contains_key(&key) {
            return Err(RegistryError::OccupancyAlreadyExists {
                property_id,
                resident: key.resident,
            });
        }
        if !lease_expiry.is_after(ctx.block_height) {
            return Err(RegistryError::InvalidLeaseExpiry {
                lease_expiry,
                current: ctx.block_height,
            });
        }

        let occupancy = Occupancy::move_in(ctx.block_height, lease_expiry, rent_amount);
        tracing::debug!(
            occupancy = %key,
            move_in = %ctx.block_height,
            lease_expiry = %lease_expiry,
            rent_amount,
            "occupancy registered"
        );
        let resident = key.resident.clone();
        self.occupancies.insert(key, occupancy);
        self.emit(
            ctx,
            RegistryEventKind::OccupancyRegistered {
                property_id,
                resident,
                lease_expiry,
            },
        );
        Ok(())
    }

    /// Record an inspector's compliance check (Active → Active).
    ///
    /// The violation counter increments iff `violation_flag` is set; the
    /// status argument alone never changes it. Returns the updated record.
    pub fn perform_compliance_check(
        &mut self,
        ctx: &TxContext,
        property_id: PropertyId,
        resident: &Address,
        status: ComplianceStatus,
        violation_flag: bool,
    ) -> Result<Occupancy, RegistryError> {
        authorize(
            Operation::PerformComplianceCheck,
            &ctx.caller,
            self.roles_of(&ctx.caller, None),
        )?;
        let key = OccupancyKey::new(property_id, resident.clone());
        let occupancy = self.occupancies.get_mut(&key).ok_or_else(|| {
            RegistryError::OccupancyNotFound {
                property_id,
                resident: resident.clone(),
            }
        })?;
        occupancy.record_check(ctx.block_height, status, violation_flag);
        let updated = occupancy.clone();
        tracing::debug!(
            occupancy = %key,
            inspector = %ctx.caller,
            status = %status,
            violation_flag,
            violations = updated.violations,
            "compliance check recorded"
        );
        self.emit(
            ctx,
            RegistryEventKind::ComplianceChecked {
                property_id,
                resident: resident.clone(),
                status,
                violation_flag,
                violations: updated.violations,
            },
        );
        Ok(updated)
    }

    /// End an occupancy (Active → NonExistent). Returns the removed record.
    pub fn end_occupancy(
        &mut self,
        ctx: &TxContext,
        property_id: PropertyId,
        resident: &Address,
    ) -> Result<Occupancy, RegistryError> {
        authorize(Operation::EndOccupancy, &ctx.caller, self.roles_of(&ctx.caller, None))?;
        let key = OccupancyKey::new(property_id, resident.clone());
        let removed = self.occupancies.remove(&key).ok_or_else(|| {
            RegistryError::OccupancyNotFound {
                property_id,
                resident: resident.clone(),
            }
        })?;
        tracing::debug!(occupancy = %key, violations = removed.violations, "occupancy ended");
        self.emit(
            ctx,
            RegistryEventKind::OccupancyEnded {
                property_id,
                resident: resident.clone(),
            },
        );
        Ok(removed)
    }

    // ─── Queries ────────────────────────────────────────────────────

    /// The occupancy record for a pair.
    pub fn get_occupancy(
        &self,
        property_id: PropertyId,
        resident: &Address,
    ) -> Result<&Occupancy, RegistryError> {
        self.occupancies
            .get(&OccupancyKey::new(property_id, resident.clone()))
            .ok_or_else(|| RegistryError::OccupancyNotFound {
                property_id,
                resident: resident.clone(),
            })
    }

    /// Whether the pair has an occupancy whose status is compliant.
    /// An absent occupancy is not compliant.
    pub fn is_compliant(&self, property_id: PropertyId, resident: &Address) -> bool {
        self.get_occupancy(property_id, resident)
            .map(Occupancy::is_compliant)
            .unwrap_or(false)
    }

    /// Whether the pair has an occupancy whose lease expired before `now`.
    /// An absent occupancy is not expired.
    pub fn is_lease_expired(
        &self,
        property_id: PropertyId,
        resident: &Address,
        now: BlockHeight,
    ) -> bool {
        self.get_occupancy(property_id, resident)
            .map(|o| o.is_lease_expired(now))
            .unwrap_or(false)
    }

    pub fn admin(&self) -> Option<&Address> {
        self.admin.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.admin.is_some()
    }

    pub fn is_admin(&self, address: &Address) -> bool {
        self.admin.as_ref() == Some(address)
    }

    pub fn is_inspector(&self, address: &Address) -> bool {
        self.inspectors.contains(address)
    }

    /// Inspectors in address order.
    pub fn inspectors(&self) -> impl Iterator<Item = &Address> {
        self.inspectors.iter()
    }

    pub fn get_property_details(&self, property_id: PropertyId) -> Option<&PropertyDetails> {
        self.properties.get(&property_id)
    }

    pub fn properties(&self) -> impl Iterator<Item = (PropertyId, &PropertyDetails)> {
        self.properties.iter().map(|(id, d)| (*id, d))
    }

    /// All active occupancies, ordered by property then resident.
    pub fn occupancies(&self) -> impl Iterator<Item = (&OccupancyKey, &Occupancy)> {
        self.occupancies.iter()
    }

    /// Active occupancies at one property, ordered by resident.
    pub fn occupancies_for_property(
        &self,
        property_id: PropertyId,
    ) -> impl Iterator<Item = (&Address, &Occupancy)> {
        self.occupancies
            .iter()
            .filter(move |(key, _)| key.property_id == property_id)
            .map(|(key, occ)| (&key.resident, occ))
    }

    /// The append-only event log.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// SHA-256 over the canonical JSON of the full registry state.
    pub fn state_digest(&self) -> Result<StateDigest, CmonError> {
        let bytes = CanonicalBytes::new(self)?;
        Ok(sha256_digest(&bytes))
    }

    /// Check the invariants every reachable state satisfies. Used on state
    /// read from outside, where deserialization alone proves nothing.
    pub fn validate(&self) -> Result<(), CmonError> {
        if self.admin.is_none()
            && !(self.inspectors.is_empty()
                && self.properties.is_empty()
                && self.occupancies.is_empty()
                && self.events.is_empty())
        {
            return Err(CmonError::Integrity(
                "uninitialized registry holds state".into(),
            ));
        }
        for (key, occ) in &self.occupancies {
            if !self.properties.contains_key(&key.property_id) {
                return Err(CmonError::Integrity(format!(
                    "occupancy {key} refers to a property without details"
                )));
            }
            if !occ.lease_expiry.is_after(occ.move_in_date) {
                return Err(CmonError::Integrity(format!(
                    "occupancy {key}: lease expiry {} not after move-in {}",
                    occ.lease_expiry, occ.move_in_date
                )));
            }
            if occ.last_compliance_check < occ.move_in_date {
                return Err(CmonError::Integrity(format!(
                    "occupancy {key}: last check {} before move-in {}",
                    occ.last_compliance_check, occ.move_in_date
                )));
            }
        }
        let mut height = BlockHeight::GENESIS;
        for (index, event) in self.events.iter().enumerate() {
            if event.sequence != index as u64 {
                return Err(CmonError::Integrity(format!(
                    "event at position {index} has sequence {}",
                    event.sequence
                )));
            }
            if event.block_height < height {
                return Err(CmonError::Integrity(format!(
                    "event #{} at height {} precedes height {height}",
                    event.sequence, event.block_height
                )));
            }
            height = event.block_height;
        }
        Ok(())
    }

    // ─── Internals ──────────────────────────────────────────────────

    /// Roles `caller` holds, optionally with respect to one property.
    fn roles_of(&self, caller: &Address, property: Option<PropertyId>) -> CallerRoles {
        CallerRoles {
            admin: self.is_admin(caller),
            inspector: self.is_inspector(caller),
            property_owner: property
                .and_then(|id| self.properties.get(&id))
                .is_some_and(|p| &p.owner == caller),
        }
    }

    fn emit(&mut self, ctx: &TxContext, kind: RegistryEventKind) {
        let event = RegistryEvent {
            sequence: self.events.len() as u64,
            block_height: ctx.block_height,
            caller: ctx.caller.clone(),
            kind,
        };
        tracing::trace!(event = %event, "event appended");
        self.events.push(event);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
