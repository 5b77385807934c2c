//! Reconcile command: rebuild trips from a movement log.
//!
//! Prints either a plain-text report (trips, anomalies, warnings) or a single
//! JSON document with the same content.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use fl_core::{
    AnomalyCounts, MalformedPolicy, OrphanArrival, Reconciliation, SupersededDeparture, Trip,
    TripFilter, TripStatus, reconcile_with,
};
use fl_source::{Batch, SourceError};
use serde::Serialize;

use super::util::{DISPLAY_FORMAT, parse_date};
use crate::Config;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Movement log (JSONL). Falls back to `input_path`, then stdin.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output JSON instead of a text report.
    #[arg(long)]
    pub json: bool,

    /// Skip malformed rows instead of failing.
    #[arg(long)]
    pub skip_malformed: bool,

    /// Only trips departing on or after this date (e.g. 2025-03-10, "7 days ago").
    #[arg(long)]
    pub since: Option<String>,

    /// Only trips departing on or before this date.
    #[arg(long)]
    pub until: Option<String>,

    /// Only trips by this driver. Repeatable.
    #[arg(long = "driver")]
    pub drivers: Vec<String>,

    /// Only trips with this status. Repeatable.
    #[arg(long = "status", value_enum)]
    pub statuses: Vec<StatusArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Complete,
    Open,
}

impl From<StatusArg> for TripStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Complete => Self::Complete,
            StatusArg::Open => Self::Open,
        }
    }
}

impl ReconcileArgs {
    pub const fn policy(&self, config: &Config) -> MalformedPolicy {
        if self.skip_malformed {
            MalformedPolicy::Skip
        } else {
            config.malformed
        }
    }

    pub fn filter(&self) -> Result<TripFilter> {
        let departed_on_or_after = self
            .since
            .as_deref()
            .map(parse_date)
            .transpose()
            .context("invalid --since")?;
        let departed_on_or_before = self
            .until
            .as_deref()
            .map(parse_date)
            .transpose()
            .context("invalid --until")?;

        Ok(TripFilter {
            drivers: (!self.drivers.is_empty()).then(|| self.drivers.iter().cloned().collect()),
            statuses: (!self.statuses.is_empty())
                .then(|| self.statuses.iter().copied().map(TripStatus::from).collect::<BTreeSet<_>>()),
            departed_on_or_after,
            departed_on_or_before,
        })
    }
}

/// A row that did not make it into reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: String,
}

/// Everything the report shows.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub trips: Vec<Trip>,
    pub orphans: Vec<OrphanArrival>,
    pub superseded: Vec<SupersededDeparture>,
    pub rejected: Vec<RejectedRow>,
    /// Counted over the whole batch, before filtering.
    pub anomalies: AnomalyCounts,
}

impl ReportView {
    /// Applies `filter` to trips and attaches source line numbers.
    pub fn build(
        result: Reconciliation,
        lines: &[usize],
        unreadable: &[SourceError],
        filter: &TripFilter,
    ) -> Self {
        let mut anomalies = result.anomalies();
        anomalies.rejected_records += unreadable.len();

        let mut rejected: Vec<RejectedRow> = result
            .rejected
            .iter()
            .map(|r| RejectedRow {
                line: lines.get(r.index).copied().unwrap_or(r.index + 1),
                reason: r.reason.to_string(),
            })
            .chain(unreadable.iter().map(unreadable_row))
            .collect();
        rejected.sort_by_key(|r| r.line);

        Self {
            trips: filter.apply(&result.trips),
            orphans: result.orphans,
            superseded: result.superseded,
            rejected,
            anomalies,
        }
    }
}

pub(crate) fn unreadable_row(err: &SourceError) -> RejectedRow {
    match err {
        SourceError::Json { line, source } => RejectedRow {
            line: *line,
            reason: source.to_string(),
        },
        other => RejectedRow {
            line: 0,
            reason: other.to_string(),
        },
    }
}

/// Runs the reconcile command, writing the report to `writer`.
pub fn run<W: Write>(writer: &mut W, args: &ReconcileArgs, config: &Config) -> Result<()> {
    let policy = args.policy(config);
    let filter = args.filter()?;
    let source = config.source_config(args.input.as_deref(), policy);

    let Batch {
        events,
        lines,
        unreadable,
    } = fl_source::load(&source).context("failed to read movement log")?;
    tracing::debug!(rows = events.len(), ?policy, "reconciling");

    let result = reconcile_with(events, &config.reconcile_options(), policy).map_err(|e| {
        let line = lines.get(e.index).copied().unwrap_or(e.index + 1);
        anyhow::anyhow!("malformed row on line {line}: {}", e.reason)
    })?;

    let view = ReportView::build(result, &lines, &unreadable, &filter);
    if args.json {
        serde_json::to_writer_pretty(&mut *writer, &view)?;
        writeln!(writer)?;
    } else {
        write!(writer, "{}", format_report(&view))?;
    }
    Ok(())
}

fn vehicle(driver: &str, plate: &str, model: &str) -> String {
    format!("{driver} / {plate} ({model})")
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "rounded trip minutes are far below i64::MAX"
)]
fn format_trip(trip: &Trip) -> String {
    let mut line = format!(
        "  [{}] {}  {} -> ",
        trip.status,
        vehicle(
            trip.driver.as_str(),
            trip.vehicle_plate.as_str(),
            &trip.vehicle_model
        ),
        trip.departure_time.format(DISPLAY_FORMAT),
    );
    match (trip.arrival_time, trip.distance, trip.duration_minutes) {
        (Some(arrival), Some(distance), Some(minutes)) => {
            let _ = write!(
                line,
                "{}  {distance} km  {} min",
                arrival.format(DISPLAY_FORMAT),
                minutes.round() as i64
            );
        }
        _ => line.push('-'),
    }
    if let Some(purpose) = &trip.purpose {
        let _ = write!(line, "  {purpose}");
    }
    line
}

/// Formats the plain-text report.
pub fn format_report(view: &ReportView) -> String {
    let mut out = String::new();

    if view.trips.is_empty() {
        let _ = writeln!(out, "No trips match the selected filters.");
    } else {
        let _ = writeln!(out, "Trips: {}", view.trips.len());
        for trip in &view.trips {
            let _ = writeln!(out, "{}", format_trip(trip));
        }
    }

    if !view.orphans.is_empty() {
        let _ = writeln!(out, "\nOrphan arrivals: {}", view.orphans.len());
        for orphan in &view.orphans {
            let _ = writeln!(
                out,
                "  {}  arrived {}  odometer {}",
                vehicle(
                    orphan.driver.as_str(),
                    orphan.vehicle_plate.as_str(),
                    &orphan.vehicle_model
                ),
                orphan.arrival_time.format(DISPLAY_FORMAT),
                orphan.odometer
            );
        }
    }

    if !view.superseded.is_empty() {
        let _ = writeln!(out, "\nSuperseded departures: {}", view.superseded.len());
        for departure in &view.superseded {
            let _ = writeln!(
                out,
                "  {}  departed {}  odometer {}  replaced at {}",
                vehicle(
                    departure.driver.as_str(),
                    departure.vehicle_plate.as_str(),
                    &departure.vehicle_model
                ),
                departure.departure_time.format(DISPLAY_FORMAT),
                departure.odometer,
                departure.superseded_by.format(DISPLAY_FORMAT)
            );
        }
    }

    if !view.rejected.is_empty() {
        let _ = writeln!(out, "\nRejected rows: {}", view.rejected.len());
        for row in &view.rejected {
            let _ = writeln!(out, "  line {}: {}", row.line, row.reason);
        }
    }

    let anomalies = &view.anomalies;
    if anomalies.total() > 0 {
        out.push('\n');
        if anomalies.open_trips > 0 {
            let _ = writeln!(
                out,
                "Warning: {} trip(s) without an arrival record.",
                anomalies.open_trips
            );
        }
        if anomalies.orphan_arrivals > 0 {
            let _ = writeln!(
                out,
                "Warning: {} arrival(s) without a matching departure.",
                anomalies.orphan_arrivals
            );
        }
        if anomalies.superseded_departures > 0 {
            let _ = writeln!(
                out,
                "Warning: {} departure(s) replaced before any arrival.",
                anomalies.superseded_departures
            );
        }
        if anomalies.rejected_records > 0 {
            let _ = writeln!(
                out,
                "Warning: {} row(s) rejected.",
                anomalies.rejected_records
            );
        }
    }

    out
}
