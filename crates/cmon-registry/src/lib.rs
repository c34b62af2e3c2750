//! # cmon-registry — Compliance Monitoring Registry
//!
//! A closed, single-owner ledger of property occupancies and their
//! compliance history, with role-gated state transitions.
//!
//! ## Roles
//!
//! - **Admin** — exactly one after `initialize`; manages inspectors and
//!   property details, registers and ends occupancies, transfers admin.
//! - **Inspector** — performs compliance checks and ends occupancies.
//! - **Property owner** — registers occupancies on their own property.
//!
//! ## Occupancy Lifecycle
//!
//! ```text
//! NonExistent ──register──▶ Active ──end──▶ NonExistent
//!                            │  ▲
//!                            └──┘ compliance check
//! ```
//!
//! Every operation authorizes the caller, validates preconditions against
//! current state, and only then mutates. A failed call leaves the registry
//! untouched, event log included.
//!
//! ## Modules
//!
//! - `auth` — roles, operations, and the single authorization predicate.
//! - `occupancy` — `Occupancy` and `PropertyDetails` records.
//! - `event` — the append-only event log.
//! - `registry` — `ComplianceRegistry` and `TxContext`.
//! - `shared` — `SharedRegistry`, a serialized handle for multi-threaded hosts.

pub mod auth;
pub mod error;
pub mod event;
pub mod occupancy;
pub mod registry;
pub mod shared;

pub use auth::{authorize, CallerRoles, Operation, Role};
pub use error::{ErrorKind, RegistryError};
pub use event::{RegistryEvent, RegistryEventKind};
pub use occupancy::{Occupancy, OccupancyKey, PropertyDetails};
pub use registry::{ComplianceRegistry, TxContext};
pub use shared::SharedRegistry;
