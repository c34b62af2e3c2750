//! # Inspector Subcommand
//!
//! - `add <PRINCIPAL>` — grant inspector rights (admin only).
//! - `remove <PRINCIPAL>` — revoke inspector rights (admin only).
//! - `list` — show the inspector set.
//!
//! Adding an existing inspector or removing an absent one succeeds
//! without changing the ledger.

use anyhow::Result;
use clap::{Args, Subcommand};

use cmon_core::Address;

use crate::config::Settings;
use crate::ledger::{self, rejected, transact};

/// Arguments for `cmon inspector`.
#[derive(Args, Debug)]
pub struct InspectorArgs {
    #[command(subcommand)]
    pub command: InspectorCommand,
}

#[derive(Subcommand, Debug)]
pub enum InspectorCommand {
    /// Grant inspector rights to a principal.
    Add {
        /// Principal to add.
        inspector: Address,
    },
    /// Revoke inspector rights from a principal.
    Remove {
        /// Principal to remove.
        inspector: Address,
    },
    /// List current inspectors.
    List,
}

pub fn run_inspector(args: &InspectorArgs, settings: &Settings) -> Result<u8> {
    match &args.command {
        InspectorCommand::Add { inspector } => {
            let who = inspector.clone();
            match transact(settings, |reg, tx| reg.add_inspector(tx, who))? {
                Ok(true) => println!("OK: {inspector} is now an inspector"),
                Ok(false) => println!("OK: {inspector} was already an inspector"),
                Err(e) => return Ok(rejected(&e)),
            }
            Ok(0)
        }
        InspectorCommand::Remove { inspector } => {
            match transact(settings, |reg, tx| reg.remove_inspector(tx, inspector))? {
                Ok(true) => println!("OK: {inspector} is no longer an inspector"),
                Ok(false) => println!("OK: {inspector} was not an inspector"),
                Err(e) => return Ok(rejected(&e)),
            }
            Ok(0)
        }
        InspectorCommand::List => {
            let ledger = ledger::read(settings)?;
            let mut any = false;
            for inspector in ledger.registry.inspectors() {
                println!("{inspector}");
                any = true;
            }
            if !any {
                println!("(no inspectors)");
            }
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use cmon_core::BlockHeight;

    const SENDER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
    const INSPECTOR: &str = "ST3NBRSFKX28FQ2ZJ1MAKX58HKHSDGNV5N7R21XCP";

    fn setup() -> (tempfile::TempDir, Settings) {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            ledger_path: dir.path().join("ledger.json"),
            caller: Some(Address::new(SENDER).unwrap()),
            genesis_height: BlockHeight::new(12345),
        };
        crate::admin::run_init(&settings).unwrap();
        (dir, settings)
    }

    fn add(who: &str) -> InspectorArgs {
        InspectorArgs {
            command: InspectorCommand::Add {
                inspector: Address::new(who).unwrap(),
            },
        }
    }

    #[test]
    fn add_and_remove() {
        let (_dir, settings) = setup();
        assert_eq!(run_inspector(&add(INSPECTOR), &settings).unwrap(), 0);
        let ledger = Ledger::load(&settings.ledger_path).unwrap();
        assert!(ledger.registry.is_inspector(&Address::new(INSPECTOR).unwrap()));

        let remove = InspectorArgs {
            command: InspectorCommand::Remove {
                inspector: Address::new(INSPECTOR).unwrap(),
            },
        };
        assert_eq!(run_inspector(&remove, &settings).unwrap(), 0);
        let ledger = Ledger::load(&settings.ledger_path).unwrap();
        assert!(!ledger.registry.is_inspector(&Address::new(INSPECTOR).unwrap()));
    }

    #[test]
    fn repeat_add_leaves_event_log_alone() {
        let (_dir, settings) = setup();
        run_inspector(&add(INSPECTOR), &settings).unwrap();
        let before = Ledger::load(&settings.ledger_path).unwrap();
        run_inspector(&add(INSPECTOR), &settings).unwrap();
        let after = Ledger::load(&settings.ledger_path).unwrap();
        assert_eq!(before.registry.events().len(), after.registry.events().len());
    }

    #[test]
    fn non_admin_cannot_add() {
        let (_dir, mut settings) = setup();
        settings.caller = Some(Address::new(INSPECTOR).unwrap());
        assert_eq!(
            run_inspector(&add(INSPECTOR), &settings).unwrap(),
            ledger::EXIT_REJECTED
        );
    }

    #[test]
    fn list_on_empty_registry() {
        let (_dir, settings) = setup();
        let args = InspectorArgs {
            command: InspectorCommand::List,
        };
        assert_eq!(run_inspector(&args, &settings).unwrap(), 0);
    }
}
