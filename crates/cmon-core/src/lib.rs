//! # cmon-core — Foundational Types for the Compliance Registry
//!
//! The leaf of the workspace dependency graph. Defines the validated
//! primitives every other crate builds on, so that an unvalidated string
//! never reaches the registry as an address and a zero never reaches it as
//! a property identifier.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `Address`, `PropertyId`,
//!    `BlockHeight`; all newtypes with validated constructors.
//!
//! 2. **Single `ComplianceStatus` enum.** The string form (`"compliant"`,
//!    `"non-compliant"`) is parsed once at the boundary.
//!
//! 3. **Block-height clock.** Dates and expiries are block heights, never
//!    wall-clock time, so every comparison is deterministic.
//!
//! 4. **`sha256_digest()` accepts only `&CanonicalBytes`.** Ledger integrity
//!    digests are computed over sorted-key JSON only.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cmon-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod status;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, StateDigest};
pub use error::{CanonicalizationError, CmonError};
pub use identity::{Address, PropertyId};
pub use status::ComplianceStatus;
pub use temporal::BlockHeight;
