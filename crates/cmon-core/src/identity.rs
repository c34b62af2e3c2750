//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the identifiers the registry is keyed by. You
//! cannot pass a resident `Address` where a `PropertyId` is expected, and
//! neither can be constructed without validation.
//!
//! ## Address Format
//!
//! Principals follow the Stacks convention: a standard principal such as
//! `ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM`, or a contract principal
//! `ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM.compliance-monitoring`.
//! Validation is structural only (charset and length); checksums are the
//! wallet layer's concern.

use serde::{Deserialize, Serialize};

use crate::error::CmonError;

/// Maximum accepted length of a principal string.
pub const MAX_ADDRESS_LEN: usize = 128;

/// A principal address (caller, resident, owner, inspector, or admin).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Create a validated address.
    ///
    /// # Errors
    ///
    /// Returns [`CmonError::Validation`] if the string is empty, longer than
    /// [`MAX_ADDRESS_LEN`], or contains characters other than ASCII
    /// alphanumerics, `.`, `-`, and `_`.
    pub fn new(s: impl Into<String>) -> Result<Self, CmonError> {
        let s = s.into();
        if s.is_empty() {
            return Err(CmonError::Validation("address must not be empty".into()));
        }
        if s.len() > MAX_ADDRESS_LEN {
            return Err(CmonError::Validation(format!(
                "address exceeds {MAX_ADDRESS_LEN} characters: {} given",
                s.len()
            )));
        }
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(CmonError::Validation(format!(
                "address contains invalid character {bad:?}: {s:?}"
            )));
        }
        Ok(Self(s))
    }

    /// Access the principal string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Address {
    type Error = CmonError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl std::str::FromStr for Address {
    type Err = CmonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a registered property. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct PropertyId(u64);

impl PropertyId {
    /// Create a property identifier, rejecting zero.
    pub fn new(id: u64) -> Result<Self, CmonError> {
        if id == 0 {
            return Err(CmonError::Validation(
                "property id must be a positive integer".into(),
            ));
        }
        Ok(Self(id))
    }

    /// The raw integer value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for PropertyId {
    type Error = CmonError;

    fn try_from(id: u64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<PropertyId> for u64 {
    fn from(id: PropertyId) -> Self {
        id.0
    }
}

impl std::str::FromStr for PropertyId {
    type Err = CmonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id: u64 = s
            .trim()
            .parse()
            .map_err(|e| CmonError::Validation(format!("invalid property id {s:?}: {e}")))?;
        Self::new(id)
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "property:{}", self.0)
    }
}
