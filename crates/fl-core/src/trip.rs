//! Reconciled outputs: trips and movement anomalies.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::event::NormalizedEvent;
use crate::types::{Driver, Plate};

/// Whether a trip has been closed by an arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Complete,
    Open,
}

impl TripStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Open => "open",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "complete" => Ok(Self::Complete),
            "open" => Ok(Self::Open),
            _ => Err(format!("invalid trip status: {s}")),
        }
    }
}

/// A departure and, when one was matched, its arrival.
///
/// Built only through [`Trip::complete`] and [`Trip::open`], which keep the
/// arrival-side fields all present or all absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub driver: Driver,
    pub vehicle_plate: Plate,
    /// Model recorded on the departure.
    pub vehicle_model: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: Option<NaiveDateTime>,
    pub start_odometer: u64,
    pub end_odometer: Option<u64>,
    /// Kilometres driven; a decreasing odometer counts as zero.
    pub distance: Option<u64>,
    /// Minutes between departure and arrival, unclamped.
    pub duration_minutes: Option<f64>,
    pub purpose: Option<String>,
    pub status: TripStatus,
}

impl Trip {
    /// Closes `departure` with `arrival`.
    #[expect(
        clippy::cast_precision_loss,
        reason = "millisecond counts for real trips fit well within f64 precision"
    )]
    pub fn complete(departure: &NormalizedEvent, arrival: &NormalizedEvent) -> Self {
        let distance = arrival.odometer.saturating_sub(departure.odometer);
        let elapsed = arrival.timestamp - departure.timestamp;
        let duration_minutes = elapsed.num_milliseconds() as f64 / 60_000.0;

        Self {
            arrival_time: Some(arrival.timestamp),
            end_odometer: Some(arrival.odometer),
            distance: Some(distance),
            duration_minutes: Some(duration_minutes),
            status: TripStatus::Complete,
            ..Self::open(departure)
        }
    }

    /// A departure with no matching arrival.
    pub fn open(departure: &NormalizedEvent) -> Self {
        Self {
            driver: departure.driver.clone(),
            vehicle_plate: departure.vehicle_plate.clone(),
            vehicle_model: departure.vehicle_model.clone(),
            departure_time: departure.timestamp,
            arrival_time: None,
            start_odometer: departure.odometer,
            end_odometer: None,
            distance: None,
            duration_minutes: None,
            purpose: departure.purpose.clone(),
            status: TripStatus::Open,
        }
    }

    /// True when the arrival-side fields agree with `status`.
    pub const fn is_consistent(&self) -> bool {
        let present = [
            self.arrival_time.is_some(),
            self.end_odometer.is_some(),
            self.distance.is_some(),
            self.duration_minutes.is_some(),
        ];
        match self.status {
            TripStatus::Complete => present[0] && present[1] && present[2] && present[3],
            TripStatus::Open => !(present[0] || present[1] || present[2] || present[3]),
        }
    }
}

/// An arrival seen while no departure was pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename = "orphan_arrival")]
pub struct OrphanArrival {
    pub driver: Driver,
    pub vehicle_plate: Plate,
    pub vehicle_model: String,
    pub arrival_time: NaiveDateTime,
    pub odometer: u64,
}

impl OrphanArrival {
    pub fn from_event(arrival: &NormalizedEvent) -> Self {
        Self {
            driver: arrival.driver.clone(),
            vehicle_plate: arrival.vehicle_plate.clone(),
            vehicle_model: arrival.vehicle_model.clone(),
            arrival_time: arrival.timestamp,
            odometer: arrival.odometer,
        }
    }
}

/// A pending departure replaced by a later departure before any arrival.
///
/// It contributes no trip; this record only makes the replacement visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename = "superseded_departure")]
pub struct SupersededDeparture {
    pub driver: Driver,
    pub vehicle_plate: Plate,
    pub vehicle_model: String,
    pub departure_time: NaiveDateTime,
    pub odometer: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Timestamp of the departure that replaced this one.
    pub superseded_by: NaiveDateTime,
}

impl SupersededDeparture {
    pub fn new(discarded: &NormalizedEvent, replacement: &NormalizedEvent) -> Self {
        Self {
            driver: discarded.driver.clone(),
            vehicle_plate: discarded.vehicle_plate.clone(),
            vehicle_model: discarded.vehicle_model.clone(),
            departure_time: discarded.timestamp,
            odometer: discarded.odometer,
            purpose: discarded.purpose.clone(),
            superseded_by: replacement.timestamp,
        }
    }
}
