//! # cmon CLI entry point
//!
//! Parses command-line arguments, resolves layered settings, and dispatches
//! to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmon_cli::admin::{
    run_events, run_init, run_mine, run_status, run_transfer_admin, EventsArgs, MineArgs,
    TransferAdminArgs,
};
use cmon_cli::config::{CliConfig, Settings};
use cmon_cli::inspector::{run_inspector, InspectorArgs};
use cmon_cli::occupancy::{
    run_compliant, run_expired, run_occupancy, CompliantArgs, ExpiredArgs, OccupancyArgs,
};
use cmon_cli::property::{run_property, PropertyArgs};
use cmon_core::Address;

/// Property occupancy compliance registry.
///
/// Tracks property details, resident occupancies, inspector compliance
/// checks, and violation counts in a local ledger file.
#[derive(Parser, Debug)]
#[command(name = "cmon", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the ledger file.
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Principal making the call.
    #[arg(long, global = true)]
    caller: Option<Address>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Initialize the registry; the caller becomes admin.
    Init,

    /// Grant, revoke, or list inspectors.
    Inspector(InspectorArgs),

    /// Set, show, or list property details.
    Property(PropertyArgs),

    /// Occupancy lifecycle (register, check, end, show, list).
    Occupancy(OccupancyArgs),

    /// Whether an occupancy is currently compliant.
    Compliant(CompliantArgs),

    /// Whether an occupancy's lease has expired.
    Expired(ExpiredArgs),

    /// Hand admin rights to another principal.
    TransferAdmin(TransferAdminArgs),

    /// Advance the ledger's block height.
    Mine(MineArgs),

    /// Summarize the ledger.
    Status,

    /// Print the registry event log.
    Events(EventsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("cmon CLI starting");

    ExitCode::from(exit_status(run(cli)))
}

/// Exit status for a command result. Operational failures are reported
/// once, through tracing, and exit with 1.
fn exit_status(result: Result<u8>) -> u8 {
    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            1
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config =
        CliConfig::discover(cli.config.as_deref(), &cwd)?.with_env(|k| std::env::var(k).ok());
    let settings = Settings::resolve(config, cli.ledger, cli.caller)?;

    tracing::debug!(ledger = %settings.ledger_path.display(), "resolved settings");

    match cli.command {
        Commands::Init => run_init(&settings),
        Commands::Inspector(args) => run_inspector(&args, &settings),
        Commands::Property(args) => run_property(&args, &settings),
        Commands::Occupancy(args) => run_occupancy(&args, &settings),
        Commands::Compliant(args) => run_compliant(&args, &settings),
        Commands::Expired(args) => run_expired(&args, &settings),
        Commands::TransferAdmin(args) => run_transfer_admin(&args, &settings),
        Commands::Mine(args) => run_mine(&args, &settings),
        Commands::Status => run_status(&settings),
        Commands::Events(args) => run_events(&args, &settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmon_cli::inspector::InspectorCommand;
    use cmon_cli::occupancy::OccupancyCommand;

    const SENDER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

    #[test]
    fn cli_parse_init_with_globals() {
        let cli = Cli::try_parse_from([
            "cmon", "-vv", "--ledger", "l.json", "--caller", SENDER, "init",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.ledger, Some(PathBuf::from("l.json")));
        assert_eq!(cli.caller.unwrap().as_str(), SENDER);
        assert!(matches!(cli.command, Commands::Init));
    }

    #[test]
    fn cli_parse_globals_after_subcommand() {
        let cli = Cli::try_parse_from(["cmon", "status", "--ledger", "x.json"]).unwrap();
        assert_eq!(cli.ledger, Some(PathBuf::from("x.json")));
    }

    #[test]
    fn cli_parse_invalid_caller() {
        assert!(Cli::try_parse_from(["cmon", "--caller", "bad principal", "init"]).is_err());
    }

    #[test]
    fn cli_parse_inspector_add() {
        let cli = Cli::try_parse_from(["cmon", "inspector", "add", SENDER]).unwrap();
        if let Commands::Inspector(args) = cli.command {
            assert!(matches!(args.command, InspectorCommand::Add { .. }));
        } else {
            panic!("expected inspector");
        }
    }

    #[test]
    fn cli_parse_occupancy_register() {
        let cli = Cli::try_parse_from([
            "cmon",
            "occupancy",
            "register",
            "1",
            SENDER,
            "--lease-expiry",
            "22345",
        ])
        .unwrap();
        if let Commands::Occupancy(args) = cli.command {
            match args.command {
                OccupancyCommand::Register { lease_expiry, .. } => {
                    assert_eq!(lease_expiry.get(), 22345);
                }
                other => panic!("unexpected {other:?}"),
            }
        } else {
            panic!("expected occupancy");
        }
    }

    #[test]
    fn cli_parse_expired_at() {
        let cli = Cli::try_parse_from(["cmon", "expired", "1", SENDER, "--at", "99"]).unwrap();
        if let Commands::Expired(args) = cli.command {
            assert_eq!(args.at.unwrap().get(), 99);
        } else {
            panic!("expected expired");
        }
    }

    #[test]
    fn cli_parse_mine_default() {
        let cli = Cli::try_parse_from(["cmon", "mine"]).unwrap();
        if let Commands::Mine(args) = cli.command {
            assert_eq!(args.blocks, 1);
        }
    }

    #[test]
    fn cli_parse_transfer_admin() {
        let cli = Cli::try_parse_from(["cmon", "transfer-admin", SENDER]).unwrap();
        assert!(matches!(cli.command, Commands::TransferAdmin(_)));
    }

    #[test]
    fn exit_status_maps_results() {
        assert_eq!(exit_status(Ok(0)), 0);
        assert_eq!(exit_status(Ok(cmon_cli::ledger::EXIT_REJECTED)), 2);
        assert_eq!(exit_status(Err(anyhow::anyhow!("ledger unreadable"))), 1);
    }

    #[test]
    fn cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["cmon"]).is_err());
    }
}
