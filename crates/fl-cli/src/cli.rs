//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::reconcile::ReconcileArgs;

/// Vehicle trip reconciliation.
///
/// Rebuilds trips from a log of departures and arrivals and reports the
/// records that do not pair up.
#[derive(Debug, Parser)]
#[command(name = "fl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rebuild trips from a movement log.
    Reconcile(ReconcileArgs),

    /// Validate every row of a movement log without pairing.
    Check {
        /// Movement log (JSONL). Reads stdin when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}
