//! Check command: validate a movement log without pairing.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use fl_core::{MalformedPolicy, normalize};

use super::reconcile::{RejectedRow, unreadable_row};
use crate::Config;

/// Row counts from a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckSummary {
    pub valid: usize,
    pub malformed: usize,
}

impl CheckSummary {
    pub const fn total(self) -> usize {
        self.valid + self.malformed
    }

    pub const fn is_clean(self) -> bool {
        self.malformed == 0
    }
}

/// Reports every row that would be rejected, then a one-line summary.
pub fn run<W: Write>(writer: &mut W, input: Option<&Path>, config: &Config) -> Result<CheckSummary> {
    let source = config.source_config(input, MalformedPolicy::Skip);
    let batch = fl_source::load(&source).context("failed to read movement log")?;
    let options = config.reconcile_options().normalize;

    let mut failures: Vec<RejectedRow> = batch.unreadable.iter().map(unreadable_row).collect();
    let mut summary = CheckSummary::default();

    for (index, raw) in batch.events.iter().cloned().enumerate() {
        match normalize(raw, index, &options) {
            Ok(_) => summary.valid += 1,
            Err(record) => {
                let line = batch.line_of(index).unwrap_or(index + 1);
                failures.push(RejectedRow {
                    line,
                    reason: record.reason.to_string(),
                });
            }
        }
    }
    failures.sort_by_key(|row| row.line);
    summary.malformed = failures.len();

    for row in &failures {
        writeln!(writer, "line {}: {}", row.line, row.reason)?;
    }
    writeln!(
        writer,
        "Checked {} rows: {} valid, {} malformed",
        summary.total(),
        summary.valid,
        summary.malformed
    )?;
    Ok(summary)
}
