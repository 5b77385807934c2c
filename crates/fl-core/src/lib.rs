//! Core domain logic for fleetlog.
//!
//! This crate reconstructs vehicle trips from a flat movement log:
//! - Normalization: validating raw records into typed events
//! - Partitioning: grouping events by (driver, vehicle) in time order
//! - Pairing: matching departures with arrivals inside each group
//! - Reconciliation: merging per-group results deterministically

pub mod event;
pub mod filter;
pub mod normalize;
pub mod pairing;
pub mod partition;
mod reconcile;
pub mod trip;
pub mod types;

pub use event::{EventKind, KindLabels, NormalizedEvent, OdometerValue, RawEvent};
pub use filter::TripFilter;
pub use normalize::{DEFAULT_TIMESTAMP_FORMATS, MalformedReason, MalformedRecord, NormalizeOptions, normalize};
pub use partition::{Group, GroupKey, Partition};
pub use reconcile::{
    AnomalyCounts, DEFAULT_PARALLEL_THRESHOLD, MalformedPolicy, ReconcileOptions, Reconciliation,
    reconcile, reconcile_lenient, reconcile_normalized, reconcile_with,
};
pub use trip::{OrphanArrival, SupersededDeparture, Trip, TripStatus};
pub use types::{Driver, Plate, ValidationError};
