//! Vehicle movement events, raw and normalized.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::{Driver, Plate};

/// One movement record as supplied by a data source.
///
/// Every field is optional here; shape problems are reported by the
/// normalizer as [`MalformedRecord`](crate::MalformedRecord) instead of
/// failing while reading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub vehicle_plate: Option<String>,
    #[serde(default)]
    pub vehicle_model: Option<String>,
    /// Event kind label, matched exactly against [`KindLabels`].
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub odometer: Option<OdometerValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

/// An odometer cell as exported.
///
/// Spreadsheet exports often write whole readings as floats (`100.0`), and
/// hand-edited cells may hold text. The normalizer decides which are usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OdometerValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Flag(bool),
}

impl OdometerValue {
    /// The reading as a whole number, if it is one.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "range and fraction are checked before the cast"
    )]
    pub fn as_integer(&self) -> Option<i64> {
        const LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53
        match self {
            Self::Integer(n) => Some(*n),
            Self::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() <= LIMIT => {
                Some(*f as i64)
            }
            _ => None,
        }
    }
}

impl From<i64> for OdometerValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl fmt::Display for OdometerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Flag(b) => write!(f, "{b}"),
        }
    }
}

/// The two recognized movement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The vehicle left; starts a trip.
    Departure,
    /// The vehicle came back; ends a trip.
    Arrival,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Departure => "departure",
            Self::Arrival => "arrival",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The exact strings a data source uses for each [`EventKind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindLabels {
    pub departure: String,
    pub arrival: String,
}

impl Default for KindLabels {
    fn default() -> Self {
        Self {
            departure: "Saída".to_string(),
            arrival: "Chegada".to_string(),
        }
    }
}

impl KindLabels {
    /// Classifies a label. Matching is exact: no trimming, no case folding.
    #[must_use]
    pub fn classify(&self, label: &str) -> Option<EventKind> {
        if label == self.departure {
            Some(EventKind::Departure)
        } else if label == self.arrival {
            Some(EventKind::Arrival)
        } else {
            None
        }
    }
}

/// A validated movement event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Position of the record in its input batch.
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub driver: Driver,
    pub vehicle_plate: Plate,
    pub vehicle_model: String,
    pub kind: EventKind,
    pub odometer: u64,
    /// Only ever set on departures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}
