//! # cmon-cli — Compliance Registry Command-Line Interface
//!
//! Drives a `ComplianceRegistry` held in a local JSON ledger file, one
//! registry call per invocation. The ledger also carries the block-height
//! clock, which only moves when `cmon mine` is run.
//!
//! ## Subcommands
//!
//! - `init`, `transfer-admin`, `mine`, `status`, `events` — registry admin and ledger
//! - `inspector add|remove|list` — inspector set
//! - `property set|show|list` — property details
//! - `occupancy register|check|end|show|list` — occupancy lifecycle
//! - `compliant`, `expired` — read-only queries
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; registry semantics live in `cmon-registry`.
//! - A rejected registry call exits with code 2 and prints its error kind;
//!   operational failures (I/O, corrupt ledger, bad config) exit with 1.

pub mod admin;
pub mod config;
pub mod inspector;
pub mod ledger;
pub mod occupancy;
pub mod property;
