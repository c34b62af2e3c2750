//! # Temporal Types — Block-Height Clock
//!
//! Defines `BlockHeight`, the only clock the registry knows about. Move-in
//! dates, lease expiries, and compliance-check times are all block heights.
//!
//! ## Invariant
//!
//! Heights only move forward. Arithmetic is checked: advancing past
//! `u64::MAX` is an error rather than a wrap to zero, which would make
//! every lease look unexpired again.

use serde::{Deserialize, Serialize};

use crate::error::CmonError;

/// A block height. Monotonically increasing ledger clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// The genesis height.
    pub const GENESIS: Self = Self(0);

    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    /// The raw height value.
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// The height of the following block.
    pub fn next(&self) -> Result<Self, CmonError> {
        self.advance(1)
    }

    /// The height `blocks` blocks after this one.
    ///
    /// # Errors
    ///
    /// Returns [`CmonError::Validation`] on overflow.
    pub fn advance(&self, blocks: u64) -> Result<Self, CmonError> {
        self.0
            .checked_add(blocks)
            .map(Self)
            .ok_or_else(|| {
                CmonError::Validation(format!(
                    "block height overflow: {} + {blocks}",
                    self.0
                ))
            })
    }

    /// Whether this height is strictly after `other`.
    pub fn is_after(&self, other: BlockHeight) -> bool {
        self.0 > other.0
    }
}

impl From<u64> for BlockHeight {
    fn from(height: u64) -> Self {
        Self(height)
    }
}

impl std::str::FromStr for BlockHeight {
    type Err = CmonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| CmonError::Validation(format!("invalid block height {s:?}: {e}")))
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
