//! # Configuration
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults (`.cmon/ledger.json`, genesis height 1, no caller).
//! 2. A YAML config file: `--config <path>`, or `cmon.yaml` in the working
//!    directory when present.
//! 3. Environment: `CMON_LEDGER`, `CMON_CALLER`.
//! 4. Command-line flags: `--ledger`, `--caller`.
//!
//! ```yaml
//! ledger: ./devnet/ledger.json
//! caller: ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM
//! genesis_height: 12345
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use cmon_core::{Address, BlockHeight};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "cmon.yaml";

/// Ledger location when nothing else is configured.
pub const DEFAULT_LEDGER_PATH: &str = ".cmon/ledger.json";

/// Height of a freshly created ledger.
pub const DEFAULT_GENESIS_HEIGHT: u64 = 1;

pub const ENV_LEDGER: &str = "CMON_LEDGER";
pub const ENV_CALLER: &str = "CMON_CALLER";

/// Contents of a `cmon.yaml` file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Path of the ledger file.
    pub ledger: Option<PathBuf>,
    /// Default caller principal for mutating commands.
    pub caller: Option<String>,
    /// Block height of a new ledger.
    pub genesis_height: Option<u64>,
}

impl CliConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Load `explicit` if given (it must exist), else `cmon.yaml` in `cwd`
    /// if present, else defaults.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!(path = %candidate.display(), "using config file from working directory");
            return Self::load(&candidate);
        }
        Ok(Self::default())
    }

    /// Overlay environment variables, looked up through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ledger) = lookup(ENV_LEDGER).filter(|v| !v.is_empty()) {
            self.ledger = Some(PathBuf::from(ledger));
        }
        if let Some(caller) = lookup(ENV_CALLER).filter(|v| !v.is_empty()) {
            self.caller = Some(caller);
        }
        self
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub ledger_path: PathBuf,
    pub caller: Option<Address>,
    pub genesis_height: BlockHeight,
}

impl Settings {
    /// Apply command-line overrides on top of a loaded config.
    pub fn resolve(
        config: CliConfig,
        ledger_flag: Option<PathBuf>,
        caller_flag: Option<Address>,
    ) -> Result<Self> {
        let caller = match caller_flag {
            Some(addr) => Some(addr),
            None => config
                .caller
                .map(|s| Address::new(s).context("invalid caller in configuration"))
                .transpose()?,
        };
        Ok(Self {
            ledger_path: ledger_flag
                .or(config.ledger)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH)),
            caller,
            genesis_height: BlockHeight::new(
                config.genesis_height.unwrap_or(DEFAULT_GENESIS_HEIGHT),
            ),
        })
    }

    /// The caller, or an error telling the operator how to set one.
    pub fn require_caller(&self) -> Result<&Address> {
        match &self.caller {
            Some(addr) => Ok(addr),
            None => bail!("no caller configured; pass --caller, set {ENV_CALLER}, or add `caller:` to {DEFAULT_CONFIG_FILE}"),
        }
    }
}
