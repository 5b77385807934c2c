//! CLI subcommand implementations.

pub mod check;
pub mod reconcile;
pub mod util;
