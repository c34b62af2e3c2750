//! # Registry Administration
//!
//! `init`, `transfer-admin`, `mine`, `status`, and `events`. The first two
//! are registry calls; `mine` advances the ledger clock, which is the only
//! way block height moves between invocations.

use anyhow::Result;
use clap::Args;

use cmon_core::Address;

use crate::config::Settings;
use crate::ledger::{self, rejected, transact, Ledger};

/// Arguments for `cmon transfer-admin`.
#[derive(Args, Debug)]
pub struct TransferAdminArgs {
    /// Principal that becomes admin.
    pub new_admin: Address,
}

/// Arguments for `cmon mine`.
#[derive(Args, Debug)]
pub struct MineArgs {
    /// Number of blocks to advance.
    #[arg(long, default_value_t = 1)]
    pub blocks: u64,
}

/// Arguments for `cmon events`.
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Show only the most recent N events.
    #[arg(long)]
    pub limit: Option<usize>,
    /// Print events as JSON lines.
    #[arg(long)]
    pub json: bool,
}

pub fn run_init(settings: &Settings) -> Result<u8> {
    match transact(settings, |reg, tx| reg.initialize(tx))? {
        Ok(()) => {
            println!(
                "OK: registry initialized; admin is {}",
                settings.require_caller()?
            );
            Ok(0)
        }
        Err(e) => Ok(rejected(&e)),
    }
}

pub fn run_transfer_admin(args: &TransferAdminArgs, settings: &Settings) -> Result<u8> {
    let to = args.new_admin.clone();
    match transact(settings, |reg, tx| reg.transfer_admin(tx, to))? {
        Ok(()) => {
            println!("OK: admin transferred to {}", args.new_admin);
            Ok(0)
        }
        Err(e) => Ok(rejected(&e)),
    }
}

pub fn run_mine(args: &MineArgs, settings: &Settings) -> Result<u8> {
    let (from, to) = ledger::advance(settings, args.blocks)?;
    tracing::info!(%from, %to, "mined blocks");
    println!("OK: block height {from} -> {to}");
    Ok(0)
}

pub fn run_status(settings: &Settings) -> Result<u8> {
    let ledger = ledger::read(settings)?;
    print!("{}", render_status(&ledger)?);
    Ok(0)
}

fn render_status(ledger: &Ledger) -> Result<String> {
    let reg = &ledger.registry;
    let admin = reg
        .admin()
        .map(ToString::to_string)
        .unwrap_or_else(|| "(uninitialized)".into());
    Ok(format!(
        "block height: {}\nadmin:        {}\ninspectors:   {}\nproperties:   {}\noccupancies:  {}\nevents:       {}\ndigest:       {}\n",
        ledger.block_height,
        admin,
        reg.inspectors().count(),
        reg.properties().count(),
        reg.occupancies().count(),
        reg.events().len(),
        ledger.digest()?,
    ))
}

pub fn run_events(args: &EventsArgs, settings: &Settings) -> Result<u8> {
    let ledger = ledger::read(settings)?;
    let events = ledger.registry.events();
    let skip = args
        .limit
        .map(|n| events.len().saturating_sub(n))
        .unwrap_or(0);
    for event in &events[skip..] {
        if args.json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("{event}");
        }
    }
    Ok(0)
}
