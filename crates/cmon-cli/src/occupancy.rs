//! # Occupancy Subcommand
//!
//! Occupancy lifecycle plus the two boolean queries.
//!
//! - `register <ID> <RESIDENT> --lease-expiry <H>` — admin or property owner.
//! - `check <ID> <RESIDENT> --status <S> [--violation]` — inspectors only.
//! - `end <ID> <RESIDENT>` — admin or inspector.
//! - `show <ID> <RESIDENT>` — the record as JSON.
//! - `list [--property <ID>]` — active occupancies.
//!
//! `cmon compliant` and `cmon expired` print `true` or `false`. Both print
//! `false` when no occupancy exists for the pair. Property id `0` is
//! rejected as an invalid argument everywhere.

use anyhow::Result;
use clap::{Args, Subcommand};

use cmon_core::{Address, BlockHeight, ComplianceStatus, PropertyId};

use crate::config::Settings;
use crate::ledger::{self, property_id, rejected, transact};

/// Arguments for `cmon occupancy`.
#[derive(Args, Debug)]
pub struct OccupancyArgs {
    #[command(subcommand)]
    pub command: OccupancyCommand,
}

#[derive(Subcommand, Debug)]
pub enum OccupancyCommand {
    /// Register a resident at a property, copying its current rent.
    Register {
        property_id: u64,
        resident: Address,
        /// Block height after which the lease is expired.
        #[arg(long)]
        lease_expiry: BlockHeight,
    },
    /// Record a compliance check on an occupancy.
    Check {
        property_id: u64,
        resident: Address,
        /// `compliant` or `non-compliant`.
        #[arg(long)]
        status: ComplianceStatus,
        /// Count this check as a violation.
        #[arg(long)]
        violation: bool,
    },
    /// End an occupancy, deleting its record.
    End {
        property_id: u64,
        resident: Address,
    },
    /// Show an occupancy record as JSON.
    Show {
        property_id: u64,
        resident: Address,
    },
    /// List active occupancies.
    List {
        /// Only occupancies at this property.
        #[arg(long)]
        property: Option<PropertyId>,
    },
}

/// Arguments for `cmon compliant`.
#[derive(Args, Debug)]
pub struct CompliantArgs {
    pub property_id: u64,
    pub resident: Address,
}

/// Arguments for `cmon expired`.
#[derive(Args, Debug)]
pub struct ExpiredArgs {
    pub property_id: u64,
    pub resident: Address,
    /// Height to evaluate at. Defaults to the ledger's current height.
    #[arg(long)]
    pub at: Option<BlockHeight>,
}

pub fn run_occupancy(args: &OccupancyArgs, settings: &Settings) -> Result<u8> {
    match &args.command {
        OccupancyCommand::Register {
            property_id: raw,
            resident,
            lease_expiry,
        } => {
            let (raw, who, expiry) = (*raw, resident.clone(), *lease_expiry);
            match transact(settings, |reg, tx| {
                let id = property_id(raw)?;
                reg.register_occupancy(tx, id, who, expiry).map(|()| id)
            })? {
                Ok(id) => {
                    println!("OK: {resident} registered at {id} until block {lease_expiry}");
                    Ok(0)
                }
                Err(e) => Ok(rejected(&e)),
            }
        }
        OccupancyCommand::Check {
            property_id: raw,
            resident,
            status,
            violation,
        } => {
            let raw = *raw;
            match transact(settings, |reg, tx| {
                let id = property_id(raw)?;
                reg.perform_compliance_check(tx, id, resident, *status, *violation)
            })? {
                Ok(occ) => {
                    println!(
                        "OK: {resident} at property:{raw} is {}; violations {}",
                        occ.compliance_status, occ.violations
                    );
                    Ok(0)
                }
                Err(e) => Ok(rejected(&e)),
            }
        }
        OccupancyCommand::End {
            property_id: raw,
            resident,
        } => {
            let raw = *raw;
            match transact(settings, |reg, tx| {
                reg.end_occupancy(tx, property_id(raw)?, resident)
            })? {
                Ok(ended) => {
                    println!(
                        "OK: occupancy of {resident} at property:{raw} ended ({} violations)",
                        ended.violations
                    );
                    Ok(0)
                }
                Err(e) => Ok(rejected(&e)),
            }
        }
        OccupancyCommand::Show {
            property_id: raw,
            resident,
        } => {
            let id = match property_id(*raw) {
                Ok(id) => id,
                Err(e) => return Ok(rejected(&e)),
            };
            let ledger = ledger::read(settings)?;
            match ledger.registry.get_occupancy(id, resident) {
                Ok(occ) => {
                    println!("{}", serde_json::to_string_pretty(occ)?);
                    Ok(0)
                }
                Err(e) => Ok(rejected(&e)),
            }
        }
        OccupancyCommand::List { property } => {
            let ledger = ledger::read(settings)?;
            for (key, occ) in ledger.registry.occupancies() {
                if property.is_some_and(|p| p != key.property_id) {
                    continue;
                }
                let expired = if occ.is_lease_expired(ledger.block_height) {
                    "  EXPIRED"
                } else {
                    ""
                };
                println!(
                    "{key}  {}  violations={}  lease-expiry={}{expired}",
                    occ.compliance_status, occ.violations, occ.lease_expiry
                );
            }
            Ok(0)
        }
    }
}

pub fn run_compliant(args: &CompliantArgs, settings: &Settings) -> Result<u8> {
    let id = match property_id(args.property_id) {
        Ok(id) => id,
        Err(e) => return Ok(rejected(&e)),
    };
    let ledger = ledger::read(settings)?;
    println!("{}", ledger.registry.is_compliant(id, &args.resident));
    Ok(0)
}

pub fn run_expired(args: &ExpiredArgs, settings: &Settings) -> Result<u8> {
    let id = match property_id(args.property_id) {
        Ok(id) => id,
        Err(e) => return Ok(rejected(&e)),
    };
    let ledger = ledger::read(settings)?;
    let at = args.at.unwrap_or(ledger.block_height);
    println!(
        "{}",
        ledger.registry.is_lease_expired(id, &args.resident, at)
    );
    Ok(0)
}
