//! # Property Subcommand
//!
//! Property details are keyed by a positive integer id and overwritten
//! wholesale by `set`. Occupancies copy the rent at registration, so a
//! later `set` does not change existing leases.
//!
//! Id `0` and unknown ids are registry rejections (exit code 2).

use anyhow::Result;
use clap::{Args, Subcommand};

use cmon_core::Address;
use cmon_registry::RegistryError;

use crate::config::Settings;
use crate::ledger::{self, property_id, rejected, transact};

/// Arguments for `cmon property`.
#[derive(Args, Debug)]
pub struct PropertyArgs {
    #[command(subcommand)]
    pub command: PropertyCommand,
}

#[derive(Subcommand, Debug)]
pub enum PropertyCommand {
    /// Create or overwrite a property's owner and rent (admin only).
    Set {
        /// Property id (positive integer).
        property_id: u64,
        /// Owner principal.
        #[arg(long)]
        owner: Address,
        /// Rent amount.
        #[arg(long)]
        rent: u64,
    },
    /// Show one property as JSON.
    Show {
        /// Property id.
        property_id: u64,
    },
    /// List all properties.
    List,
}

pub fn run_property(args: &PropertyArgs, settings: &Settings) -> Result<u8> {
    match &args.command {
        PropertyCommand::Set {
            property_id: raw,
            owner,
            rent,
        } => {
            let (raw, who, rent) = (*raw, owner.clone(), *rent);
            match transact(settings, |reg, tx| {
                let id = property_id(raw)?;
                reg.set_property_details(tx, id, who, rent).map(|()| id)
            })? {
                Ok(id) => {
                    println!("OK: {id} owned by {owner}, rent {rent}");
                    Ok(0)
                }
                Err(e) => Ok(rejected(&e)),
            }
        }
        PropertyCommand::Show { property_id: raw } => {
            let id = match property_id(*raw) {
                Ok(id) => id,
                Err(e) => return Ok(rejected(&e)),
            };
            let ledger = ledger::read(settings)?;
            match ledger.registry.get_property_details(id) {
                Some(details) => {
                    println!("{}", serde_json::to_string_pretty(details)?);
                    Ok(0)
                }
                None => Ok(rejected(&RegistryError::PropertyNotFound(id))),
            }
        }
        PropertyCommand::List => {
            let ledger = ledger::read(settings)?;
            for (id, details) in ledger.registry.properties() {
                let occupants = ledger.registry.occupancies_for_property(id).count();
                println!(
                    "{id}  owner={}  rent={}  occupancies={occupants}",
                    details.owner, details.rent_amount
                );
            }
            Ok(0)
        }
    }
}
