//! # Compliance Status
//!
//! The outcome recorded by an inspector's compliance check. The wire form
//! is the lowercase kebab-case string used by the contract interface.

use serde::{Deserialize, Serialize};

use crate::error::CmonError;

/// Compliance status of an occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplianceStatus {
    /// The occupancy meets all requirements. Initial state at registration.
    #[default]
    Compliant,
    /// The most recent check found the occupancy out of compliance.
    NonCompliant,
}

impl ComplianceStatus {
    /// Returns the wire string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliant => "compliant",
            Self::NonCompliant => "non-compliant",
        }
    }

    pub fn is_compliant(&self) -> bool {
        matches!(self, Self::Compliant)
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplianceStatus {
    type Err = CmonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compliant" => Ok(Self::Compliant),
            "non-compliant" => Ok(Self::NonCompliant),
            other => Err(CmonError::Validation(format!(
                "unknown compliance status {other:?}; expected \"compliant\" or \"non-compliant\""
            ))),
        }
    }
}
