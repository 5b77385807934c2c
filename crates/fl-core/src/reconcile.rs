//! Batch reconciliation: normalize, partition, pair, and merge.
//!
//! Output order is fully determined by the input: groups are merged in
//! [`GroupKey`](crate::GroupKey) order and each group's records keep the
//! order the state machine emitted them, whether or not groups were paired
//! in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::event::{NormalizedEvent, RawEvent};
use crate::normalize::{MalformedRecord, NormalizeOptions, normalize};
use crate::pairing::{GroupOutcome, pair_group};
use crate::partition::Partition;
use crate::trip::{OrphanArrival, SupersededDeparture, Trip, TripStatus};

/// Batches at least this large are paired on the rayon pool by default.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// What to do with a record the normalizer rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Fail the whole batch on the first malformed record.
    #[default]
    Abort,
    /// Reconcile the valid records and report the rest.
    Skip,
}

/// Options for a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    pub normalize: NormalizeOptions,
    /// Minimum batch size for parallel pairing. `usize::MAX` disables it.
    pub parallel_threshold: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            normalize: NormalizeOptions::default(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

/// Merged result of one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Complete and open trips.
    pub trips: Vec<Trip>,
    pub orphans: Vec<OrphanArrival>,
    pub superseded: Vec<SupersededDeparture>,
    /// Records skipped under [`MalformedPolicy::Skip`]; empty otherwise.
    pub rejected: Vec<MalformedRecord>,
}

/// Counts of records that point at gaps in the movement log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnomalyCounts {
    pub open_trips: usize,
    pub orphan_arrivals: usize,
    pub superseded_departures: usize,
    pub rejected_records: usize,
}

impl AnomalyCounts {
    pub const fn total(&self) -> usize {
        self.open_trips + self.orphan_arrivals + self.superseded_departures + self.rejected_records
    }
}

impl Reconciliation {
    pub fn anomalies(&self) -> AnomalyCounts {
        AnomalyCounts {
            open_trips: self
                .trips
                .iter()
                .filter(|t| t.status == TripStatus::Open)
                .count(),
            orphan_arrivals: self.orphans.len(),
            superseded_departures: self.superseded.len(),
            rejected_records: self.rejected.len(),
        }
    }

    fn absorb(&mut self, outcome: GroupOutcome) {
        self.trips.extend(outcome.trips);
        self.orphans.extend(outcome.orphans);
        self.superseded.extend(outcome.superseded);
    }
}

/// Pairs already-normalized events. `events` must be in input order.
pub fn reconcile_normalized(
    events: Vec<NormalizedEvent>,
    options: &ReconcileOptions,
) -> Reconciliation {
    let partition = Partition::new(events);

    let outcomes: Vec<GroupOutcome> = if partition.event_count() >= options.parallel_threshold {
        tracing::debug!(
            group_count = partition.group_count(),
            "pairing groups in parallel"
        );
        let groups: Vec<_> = partition.groups().collect();
        // Indexed collect: results come back in group order.
        groups.par_iter().map(|g| pair_group(g.events())).collect()
    } else {
        partition.groups().map(|g| pair_group(g.events())).collect()
    };

    let mut result = Reconciliation::default();
    for outcome in outcomes {
        result.absorb(outcome);
    }
    result
}

/// Reconciles a batch, failing on the first malformed record.
pub fn reconcile(
    raw: impl IntoIterator<Item = RawEvent>,
    options: &ReconcileOptions,
) -> Result<Reconciliation, MalformedRecord> {
    let events = raw
        .into_iter()
        .enumerate()
        .map(|(index, event)| normalize(event, index, &options.normalize))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reconcile_normalized(events, options))
}

/// Reconciles the valid records of a batch and reports the malformed ones.
pub fn reconcile_lenient(
    raw: impl IntoIterator<Item = RawEvent>,
    options: &ReconcileOptions,
) -> Reconciliation {
    let mut events = Vec::new();
    let mut rejected = Vec::new();
    for (index, event) in raw.into_iter().enumerate() {
        match normalize(event, index, &options.normalize) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::warn!(index = e.index, reason = %e.reason, "skipping malformed record");
                rejected.push(e);
            }
        }
    }

    let mut result = reconcile_normalized(events, options);
    result.rejected = rejected;
    result
}

/// Reconciles under the given policy.
pub fn reconcile_with(
    raw: impl IntoIterator<Item = RawEvent>,
    options: &ReconcileOptions,
    policy: MalformedPolicy,
) -> Result<Reconciliation, MalformedRecord> {
    match policy {
        MalformedPolicy::Abort => reconcile(raw, options),
        MalformedPolicy::Skip => Ok(reconcile_lenient(raw, options)),
    }
}
