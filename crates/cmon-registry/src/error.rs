//! # Registry Errors
//!
//! Every failure is returned as a value, never a panic. Each error carries
//! an [`ErrorKind`] so calling tooling can branch on the category, and a
//! stable numeric code in the contract's `(err u1xx)` style.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cmon_core::{Address, BlockHeight, CmonError, PropertyId};

use crate::auth::Operation;

/// Coarse error category for callers that only need to branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Caller lacks the required role.
    Unauthorized,
    /// Property or occupancy absent.
    NotFound,
    /// Duplicate registration.
    AlreadyExists,
    /// Malformed numeric, date, or status input.
    InvalidArgument,
    /// `initialize` called on an initialized registry.
    AlreadyInitialized,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not-found",
            Self::AlreadyExists => "already-exists",
            Self::InvalidArgument => "invalid-argument",
            Self::AlreadyInitialized => "already-initialized",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Caller is not permitted to perform the operation.
    #[error("unauthorized: {caller} may not call {operation}")]
    Unauthorized {
        /// The rejected caller.
        caller: Address,
        /// The attempted operation.
        operation: Operation,
    },

    /// The registry already has an admin.
    #[error("registry already initialized with admin {admin}")]
    AlreadyInitialized {
        /// The current admin.
        admin: Address,
    },

    /// No details have been set for the property.
    #[error("{0} not found")]
    PropertyNotFound(PropertyId),

    /// No active occupancy for the pair.
    #[error("no active occupancy for {resident} at {property_id}")]
    OccupancyNotFound {
        property_id: PropertyId,
        resident: Address,
    },

    /// An active occupancy already exists for the pair.
    #[error("occupancy for {resident} at {property_id} already exists")]
    OccupancyAlreadyExists {
        property_id: PropertyId,
        resident: Address,
    },

    /// The lease would already be expired at registration.
    #[error("lease expiry {lease_expiry} must be after current block height {current}")]
    InvalidLeaseExpiry {
        lease_expiry: BlockHeight,
        current: BlockHeight,
    },

    /// Any other malformed input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RegistryError {
    /// The coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::AlreadyInitialized { .. } => ErrorKind::AlreadyInitialized,
            Self::PropertyNotFound(_) | Self::OccupancyNotFound { .. } => ErrorKind::NotFound,
            Self::OccupancyAlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::InvalidLeaseExpiry { .. } | Self::InvalidArgument(_) => {
                ErrorKind::InvalidArgument
            }
        }
    }

    /// Stable numeric error code.
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized { .. } => 100,
            Self::AlreadyInitialized { .. } => 101,
            Self::PropertyNotFound(_) => 102,
            Self::OccupancyNotFound { .. } => 103,
            Self::OccupancyAlreadyExists { .. } => 104,
            Self::InvalidLeaseExpiry { .. } => 105,
            Self::InvalidArgument(_) => 106,
        }
    }
}

impl From<CmonError> for RegistryError {
    fn from(err: CmonError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
