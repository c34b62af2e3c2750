//! # Ledger File
//!
//! A ledger is the registry plus the block-height clock, persisted as
//! pretty JSON:
//!
//! ```json
//! {
//!   "block-height": 12345,
//!   "registry": { "admin": "ST1...", "inspectors": [], ... },
//!   "digest": "sha256:…",
//!   "saved-at": "2026-01-15T12:00:00Z"
//! }
//! ```
//!
//! The digest covers `block-height` and `registry`. On load it is
//! recomputed and the registry's record invariants are re-checked; either
//! failure refuses the file with [`CmonError::Integrity`].
//!
//! Every read-modify-write holds an exclusive lock on `<ledger>.lock` from
//! load through save, so concurrent invocations serialize instead of
//! overwriting each other. Saves write a fresh temp file in the ledger's
//! directory and rename it over the ledger.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use cmon_core::{
    sha256_digest, Address, BlockHeight, CanonicalBytes, CmonError, PropertyId, StateDigest,
};
use cmon_registry::{ComplianceRegistry, RegistryError, TxContext};

use crate::config::Settings;

/// Exit code for a call the registry rejected.
pub const EXIT_REJECTED: u8 = 2;

/// The registry and its clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ledger {
    pub block_height: BlockHeight,
    pub registry: ComplianceRegistry,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct LedgerFileRef<'a> {
    #[serde(flatten)]
    ledger: &'a Ledger,
    digest: StateDigest,
    saved_at: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct LedgerFile {
    block_height: BlockHeight,
    registry: ComplianceRegistry,
    digest: StateDigest,
    #[allow(dead_code)]
    saved_at: Option<String>,
}

impl Ledger {
    /// An empty, uninitialized registry at `height`.
    pub fn genesis(height: BlockHeight) -> Self {
        Self {
            block_height: height,
            registry: ComplianceRegistry::new(),
        }
    }

    /// Digest over the canonical JSON of height and registry.
    pub fn digest(&self) -> Result<StateDigest> {
        let bytes = CanonicalBytes::new(self).context("failed to canonicalize ledger")?;
        Ok(sha256_digest(&bytes))
    }

    /// Registry invariants, plus no event recorded after the ledger's clock.
    pub fn validate(&self) -> Result<(), CmonError> {
        self.registry.validate()?;
        if let Some(last) = self.registry.events().last() {
            if last.block_height > self.block_height {
                return Err(CmonError::Integrity(format!(
                    "event #{} at height {} is after ledger height {}",
                    last.sequence, last.block_height, self.block_height
                )));
            }
        }
        Ok(())
    }

    /// Load and verify a ledger file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read ledger: {}", path.display()))?;
        let file: LedgerFile = serde_json::from_str(&content)
            .with_context(|| format!("ledger is not valid: {}", path.display()))?;
        let ledger = Self {
            block_height: file.block_height,
            registry: file.registry,
        };
        let actual = ledger.digest()?;
        if actual != file.digest {
            return Err(CmonError::Integrity(format!(
                "ledger digest mismatch in {}: recorded {}, computed {}",
                path.display(),
                file.digest,
                actual
            ))
            .into());
        }
        ledger
            .validate()
            .with_context(|| format!("ledger failed validation: {}", path.display()))?;
        tracing::debug!(path = %path.display(), height = %ledger.block_height, digest = %actual, "ledger loaded");
        Ok(ledger)
    }

    /// Load `path`, or start a fresh ledger at `genesis` if it does not exist.
    pub fn load_or_genesis(path: &Path, genesis: BlockHeight) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), height = %genesis, "no ledger found; starting at genesis");
            Ok(Self::genesis(genesis))
        }
    }

    /// Persist atomically. Returns the recorded digest.
    pub fn save(&self, path: &Path) -> Result<StateDigest> {
        let dir = ledger_dir(path)?;
        let digest = self.digest()?;
        let now: DateTime<Utc> = Utc::now();
        let file = LedgerFileRef {
            ledger: self,
            digest,
            saved_at: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
        tmp.write_all(json.as_bytes())
            .with_context(|| format!("failed to write ledger: {}", tmp.path().display()))?;
        tmp.persist(path)
            .with_context(|| format!("failed to replace ledger: {}", path.display()))?;
        tracing::debug!(path = %path.display(), digest = %digest, "ledger saved");
        Ok(digest)
    }

    /// Transaction context for `caller` at the current height.
    pub fn tx(&self, caller: &Address) -> TxContext {
        TxContext::new(caller.clone(), self.block_height)
    }

    /// Advance the clock by `blocks`. Returns the new height.
    pub fn mine(&mut self, blocks: u64) -> Result<BlockHeight> {
        self.block_height = self.block_height.advance(blocks)?;
        Ok(self.block_height)
    }
}

/// Directory holding the ledger, created if missing.
fn ledger_dir(path: &Path) -> Result<PathBuf> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create ledger directory: {}", dir.display()))?;
    Ok(dir)
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "ledger.json".into());
    name.push(".lock");
    path.with_file_name(name)
}

/// Run `f` while holding the ledger's exclusive lock. Blocks until the
/// lock is free.
fn with_lock<T>(ledger_path: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
    ledger_dir(ledger_path)?;
    let lock_file = lock_path(ledger_path);
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&lock_file)
        .with_context(|| format!("failed to open ledger lock: {}", lock_file.display()))?;
    let mut lock = fd_lock::RwLock::new(file);
    let _guard = lock
        .write()
        .with_context(|| format!("failed to lock ledger: {}", lock_file.display()))?;
    tracing::trace!(lock = %lock_file.display(), "ledger lock held");
    f()
}

/// Run one registry transaction against the configured ledger.
///
/// The ledger is saved only when `f` succeeds. The outer `Result` carries
/// operational failures; the inner one carries the registry's verdict.
pub fn transact<T>(
    settings: &Settings,
    f: impl FnOnce(&mut ComplianceRegistry, &TxContext) -> Result<T, RegistryError>,
) -> Result<Result<T, RegistryError>> {
    let caller = settings.require_caller()?;
    with_lock(&settings.ledger_path, || {
        let mut ledger = Ledger::load_or_genesis(&settings.ledger_path, settings.genesis_height)?;
        let tx = ledger.tx(caller);
        match f(&mut ledger.registry, &tx) {
            Ok(value) => {
                ledger.save(&settings.ledger_path)?;
                Ok(Ok(value))
            }
            Err(err) => Ok(Err(err)),
        }
    })
}

/// Advance the configured ledger's clock. Returns the heights before and after.
pub fn advance(settings: &Settings, blocks: u64) -> Result<(BlockHeight, BlockHeight)> {
    with_lock(&settings.ledger_path, || {
        let mut ledger = Ledger::load_or_genesis(&settings.ledger_path, settings.genesis_height)?;
        let from = ledger.block_height;
        let to = ledger.mine(blocks)?;
        ledger.save(&settings.ledger_path)?;
        Ok((from, to))
    })
}

/// Load the configured ledger for a read-only command.
pub fn read(settings: &Settings) -> Result<Ledger> {
    Ledger::load_or_genesis(&settings.ledger_path, settings.genesis_height)
}

/// Property id from a raw command-line integer. Zero is not a property.
pub fn property_id(raw: u64) -> Result<PropertyId, RegistryError> {
    Ok(PropertyId::new(raw)?)
}

/// Report a rejected registry call and return its exit code.
pub fn rejected(err: &RegistryError) -> u8 {
    tracing::debug!(kind = %err.kind(), code = err.code(), "registry call rejected");
    eprintln!("ERR [{} u{}]: {err}", err.kind(), err.code());
    EXIT_REJECTED
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmon_core::ComplianceStatus;
    use cmon_registry::ErrorKind;

    const SENDER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
    const RESIDENT: &str = "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG";
    const INSPECTOR: &str = "ST3NBRSFKX28FQ2ZJ1MAKX58HKHSDGNV5N7R21XCP";

    fn settings(dir: &Path) -> Settings {
        settings_as(dir, SENDER)
    }

    fn settings_as(dir: &Path, caller: &str) -> Settings {
        Settings {
            ledger_path: dir.join("ledger.json"),
            caller: Some(Address::new(caller).unwrap()),
            genesis_height: BlockHeight::new(12345),
        }
    }

    /// Ledger with admin, one inspector, and an active occupancy at property 1.
    fn occupied(dir: &Path) -> Settings {
        let admin = settings(dir);
        let mut ledger = Ledger::genesis(admin.genesis_height);
        let tx = ledger.tx(admin.caller.as_ref().unwrap());
        let pid = PropertyId::new(1).unwrap();
        ledger.registry.initialize(&tx).unwrap();
        ledger
            .registry
            .add_inspector(&tx, Address::new(INSPECTOR).unwrap())
            .unwrap();
        ledger
            .registry
            .set_property_details(&tx, pid, tx.caller.clone(), 1000)
            .unwrap();
        ledger
            .registry
            .register_occupancy(&tx, pid, Address::new(RESIDENT).unwrap(), BlockHeight::new(22345))
            .unwrap();
        ledger.save(&admin.ledger_path).unwrap();
        admin
    }

    /// Rewrite the ledger file through `edit` and record a matching digest.
    fn rewrite_with_fresh_digest(path: &Path, edit: impl FnOnce(&mut serde_json::Value)) {
        let content = std::fs::read_to_string(path).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&content).unwrap();
        edit(&mut value);
        let ledger = Ledger {
            block_height: serde_json::from_value(value["block-height"].clone()).unwrap(),
            registry: serde_json::from_value(value["registry"].clone()).unwrap(),
        };
        value["digest"] = serde_json::json!(ledger.digest().unwrap().to_string());
        std::fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
    }

    fn is_integrity(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<CmonError>(), Some(CmonError::Integrity(_)))
    }

    #[test]
    fn genesis_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Ledger::load_or_genesis(&dir.path().join("none.json"), BlockHeight::new(5)).unwrap();
        assert_eq!(ledger.block_height, BlockHeight::new(5));
        assert!(!ledger.registry.is_initialized());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("ledger.json");
        let mut ledger = Ledger::genesis(BlockHeight::new(12345));
        let caller = Address::new(SENDER).unwrap();
        ledger.registry.initialize(&ledger.tx(&caller)).unwrap();
        let digest = ledger.save(&path).unwrap();

        let loaded = Ledger::load(&path).unwrap();
        assert_eq!(loaded, ledger);
        assert_eq!(loaded.digest().unwrap(), digest);
        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, [std::ffi::OsString::from("ledger.json")]);
    }

    #[test]
    fn tampered_ledger_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        Ledger::genesis(BlockHeight::new(100)).save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&content).unwrap();
        value["block-height"] = serde_json::json!(99);
        std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

        let err = Ledger::load(&path).unwrap_err();
        assert!(is_integrity(&err));
        assert!(err.to_string().contains("digest mismatch"));
    }

    #[test]
    fn edited_occupancy_with_recomputed_digest_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = occupied(dir.path());
        rewrite_with_fresh_digest(&settings.ledger_path, |v| {
            v["registry"]["occupancies"][0]["occupancy"]["lease-expiry"] = serde_json::json!(1);
        });
        let err = Ledger::load(&settings.ledger_path).unwrap_err();
        assert!(is_integrity(&err), "{err:#}");
    }

    #[test]
    fn edited_event_log_with_recomputed_digest_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = occupied(dir.path());
        rewrite_with_fresh_digest(&settings.ledger_path, |v| {
            v["registry"]["events"][2]["sequence"] = serde_json::json!(9);
        });
        assert!(is_integrity(&Ledger::load(&settings.ledger_path).unwrap_err()));
    }

    #[test]
    fn rewound_clock_with_recomputed_digest_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let settings = occupied(dir.path());
        rewrite_with_fresh_digest(&settings.ledger_path, |v| {
            v["block-height"] = serde_json::json!(100);
        });
        assert!(is_integrity(&Ledger::load(&settings.ledger_path).unwrap_err()));
    }

    #[test]
    fn mine_advances_clock() {
        let mut ledger = Ledger::genesis(BlockHeight::new(10));
        assert_eq!(ledger.mine(5).unwrap(), BlockHeight::new(15));
        let mut top = Ledger::genesis(BlockHeight::new(u64::MAX));
        assert!(top.mine(1).is_err());
    }

    #[test]
    fn advance_persists() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let (from, to) = advance(&settings, 3).unwrap();
        assert_eq!((from.get(), to.get()), (12345, 12348));
        assert_eq!(Ledger::load(&settings.ledger_path).unwrap().block_height, to);
    }

    #[test]
    fn transact_saves_only_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());

        let result = transact(&settings, |reg, tx| reg.initialize(tx)).unwrap();
        assert!(result.is_ok());
        let after_init = std::fs::read_to_string(&settings.ledger_path).unwrap();

        let result = transact(&settings, |reg, tx| reg.initialize(tx)).unwrap();
        assert!(result.is_err());
        let after_reject = std::fs::read_to_string(&settings.ledger_path).unwrap();
        assert_eq!(after_init, after_reject);
    }

    #[test]
    fn transact_requires_caller() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.caller = None;
        assert!(transact(&settings, |reg, tx| reg.initialize(tx)).is_err());
        assert!(!settings.ledger_path.exists());
    }

    #[test]
    fn concurrent_transactions_all_persist() {
        const THREADS: usize = 8;
        const CHECKS: usize = 10;

        let dir = tempfile::tempdir().unwrap();
        occupied(dir.path());
        let inspector = settings_as(dir.path(), INSPECTOR);
        let pid = PropertyId::new(1).unwrap();
        let resident = Address::new(RESIDENT).unwrap();

        std::thread::scope(|scope| {
            for _ in 0..THREADS {
                scope.spawn(|| {
                    for _ in 0..CHECKS {
                        transact(&inspector, |reg, tx| {
                            reg.perform_compliance_check(
                                tx,
                                pid,
                                &resident,
                                ComplianceStatus::NonCompliant,
                                true,
                            )
                        })
                        .unwrap()
                        .unwrap();
                    }
                });
            }
        });

        let ledger = Ledger::load(&inspector.ledger_path).unwrap();
        let occ = ledger.registry.get_occupancy(pid, &resident).unwrap();
        assert_eq!(occ.violations, (THREADS * CHECKS) as u64);
        assert_eq!(ledger.registry.events().len(), 4 + THREADS * CHECKS);
    }

    #[test]
    fn property_zero_is_invalid_argument() {
        let err = property_id(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.code(), 106);
        assert_eq!(property_id(7).unwrap().get(), 7);
    }

    #[test]
    fn rejected_exit_code() {
        let err = RegistryError::InvalidArgument("x".into());
        assert_eq!(rejected(&err), EXIT_REJECTED);
    }
}
