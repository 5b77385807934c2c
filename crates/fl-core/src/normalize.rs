//! Record validation: [`RawEvent`] to [`NormalizedEvent`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{EventKind, KindLabels, NormalizedEvent, RawEvent};
use crate::types::{Driver, Plate};

/// Timestamp layouts accepted when none are configured.
///
/// The first entry is the layout of the exported movement sheet.
pub const DEFAULT_TIMESTAMP_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Why a record could not be normalized.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MalformedReason {
    #[error("missing required field `{field}`")]
    MissingField { field: String },
    #[error("unparseable timestamp `{value}`")]
    UnparseableTimestamp { value: String },
    #[error("unrecognized event kind `{value}`")]
    UnknownKind { value: String },
    #[error("invalid odometer reading {value}")]
    InvalidOdometer { value: String },
    #[error("negative odometer reading {value}")]
    NegativeOdometer { value: i64 },
}

/// A record rejected by the normalizer.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("malformed record {index}: {reason}")]
pub struct MalformedRecord {
    /// Position of the record in its input batch.
    pub index: usize,
    #[serde(flatten)]
    pub reason: MalformedReason,
}

/// Parsing rules for raw records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// `chrono` format strings, tried in order.
    pub timestamp_formats: Vec<String>,
    pub labels: KindLabels,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            timestamp_formats: DEFAULT_TIMESTAMP_FORMATS
                .iter()
                .map(ToString::to_string)
                .collect(),
            labels: KindLabels::default(),
        }
    }
}

impl NormalizeOptions {
    fn parse_timestamp(&self, value: &str) -> Option<NaiveDateTime> {
        self.timestamp_formats
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    }
}

/// Validates one record.
///
/// Checks run in a fixed order (timestamp, kind, identities, odometer) so a
/// record with several defects always reports the same one.
pub fn normalize(
    raw: RawEvent,
    index: usize,
    options: &NormalizeOptions,
) -> Result<NormalizedEvent, MalformedRecord> {
    let malformed = |reason| MalformedRecord { index, reason };
    let missing = |field: &str| {
        malformed(MalformedReason::MissingField {
            field: field.to_string(),
        })
    };

    let timestamp_str = raw.timestamp.ok_or_else(|| missing("timestamp"))?;
    let timestamp = options.parse_timestamp(&timestamp_str).ok_or_else(|| {
        malformed(MalformedReason::UnparseableTimestamp {
            value: timestamp_str.clone(),
        })
    })?;

    let label = raw.kind.ok_or_else(|| missing("kind"))?;
    let kind = options
        .labels
        .classify(&label)
        .ok_or_else(|| malformed(MalformedReason::UnknownKind { value: label.clone() }))?;

    let driver = raw
        .driver
        .and_then(|d| Driver::new(d).ok())
        .ok_or_else(|| missing("driver"))?;
    let vehicle_plate = raw
        .vehicle_plate
        .and_then(|p| Plate::new(p).ok())
        .ok_or_else(|| missing("vehicle_plate"))?;
    let vehicle_model = raw.vehicle_model.ok_or_else(|| missing("vehicle_model"))?;

    let cell = raw.odometer.ok_or_else(|| missing("odometer"))?;
    let reading = cell.as_integer().ok_or_else(|| {
        malformed(MalformedReason::InvalidOdometer {
            value: cell.to_string(),
        })
    })?;
    let odometer = u64::try_from(reading)
        .map_err(|_| malformed(MalformedReason::NegativeOdometer { value: reading }))?;

    let purpose = match kind {
        EventKind::Departure => raw.purpose,
        EventKind::Arrival => {
            if raw.purpose.is_some() {
                tracing::debug!(index, "dropping purpose on arrival record");
            }
            None
        }
    };

    Ok(NormalizedEvent {
        index,
        timestamp,
        driver,
        vehicle_plate,
        vehicle_model,
        kind,
        odometer,
        purpose,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::OdometerValue;

    fn departure() -> RawEvent {
        RawEvent {
            timestamp: Some("10/03/2025 08:00".to_string()),
            driver: Some("Ana".to_string()),
            vehicle_plate: Some("ABC123".to_string()),
            vehicle_model: Some("Strada".to_string()),
            kind: Some("Saída".to_string()),
            odometer: Some(OdometerValue::Integer(100)),
            purpose: Some("Client visit".to_string()),
        }
    }

    fn reason(raw: RawEvent) -> MalformedReason {
        normalize(raw, 7, &NormalizeOptions::default())
            .unwrap_err()
            .reason
    }

    #[test]
    fn normalizes_sheet_departure() {
        let event = normalize(departure(), 0, &NormalizeOptions::default()).unwrap();
        assert_eq!(event.kind, EventKind::Departure);
        assert_eq!(event.driver.as_str(), "Ana");
        assert_eq!(event.odometer, 100);
        assert_eq!(event.purpose.as_deref(), Some("Client visit"));
        assert_eq!(
            event.timestamp,
            NaiveDateTime::parse_from_str("2025-03-10 08:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
        );
    }

    #[test]
    fn accepts_iso_timestamps() {
        let raw = RawEvent {
            timestamp: Some("2025-03-10T08:00:30".to_string()),
            ..departure()
        };
        let event = normalize(raw, 0, &NormalizeOptions::default()).unwrap();
        assert_eq!(event.timestamp.format("%H:%M:%S").to_string(), "08:00:30");
    }

    #[test]
    fn arrival_drops_purpose() {
        let raw = RawEvent {
            kind: Some("Chegada".to_string()),
            ..departure()
        };
        let event = normalize(raw, 0, &NormalizeOptions::default()).unwrap();
        assert_eq!(event.kind, EventKind::Arrival);
        assert!(event.purpose.is_none());
    }

    #[test]
    fn rejects_unparseable_timestamp() {
        let raw = RawEvent {
            timestamp: Some("yesterday".to_string()),
            ..departure()
        };
        assert_eq!(
            reason(raw),
            MalformedReason::UnparseableTimestamp {
                value: "yesterday".to_string()
            }
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        let raw = RawEvent {
            kind: Some("Parada".to_string()),
            ..departure()
        };
        assert_eq!(
            reason(raw),
            MalformedReason::UnknownKind {
                value: "Parada".to_string()
            }
        );
    }

    #[test]
    fn rejects_missing_and_empty_identities() {
        let raw = RawEvent {
            driver: None,
            ..departure()
        };
        assert_eq!(
            reason(raw),
            MalformedReason::MissingField {
                field: "driver".to_string()
            }
        );

        let raw = RawEvent {
            vehicle_plate: Some(String::new()),
            ..departure()
        };
        assert_eq!(
            reason(raw),
            MalformedReason::MissingField {
                field: "vehicle_plate".to_string()
            }
        );
    }

    #[test]
    fn rejects_missing_odometer() {
        let raw = RawEvent {
            odometer: None,
            ..departure()
        };
        assert_eq!(
            reason(raw),
            MalformedReason::MissingField {
                field: "odometer".to_string()
            }
        );
    }

    #[test]
    fn rejects_negative_odometer() {
        let raw = RawEvent {
            odometer: Some(OdometerValue::Integer(-5)),
            ..departure()
        };
        assert_eq!(reason(raw), MalformedReason::NegativeOdometer { value: -5 });
    }

    #[test]
    fn accepts_whole_float_odometer() {
        let raw = RawEvent {
            odometer: Some(OdometerValue::Float(100.0)),
            ..departure()
        };
        let event = normalize(raw, 0, &NormalizeOptions::default()).unwrap();
        assert_eq!(event.odometer, 100);

        let raw = RawEvent {
            odometer: Some(OdometerValue::Float(-2.0)),
            ..departure()
        };
        assert_eq!(reason(raw), MalformedReason::NegativeOdometer { value: -2 });
    }

    #[test]
    fn rejects_non_numeric_odometer() {
        let raw = RawEvent {
            odometer: Some(OdometerValue::Text("cem".to_string())),
            ..departure()
        };
        let err = normalize(raw, 4, &NormalizeOptions::default()).unwrap_err();
        assert_eq!(err.index, 4);
        assert_eq!(
            err.reason,
            MalformedReason::InvalidOdometer {
                value: "\"cem\"".to_string()
            }
        );
        assert_eq!(err.reason.to_string(), r#"invalid odometer reading "cem""#);

        let raw = RawEvent {
            odometer: Some(OdometerValue::Float(150.5)),
            ..departure()
        };
        assert_eq!(
            reason(raw),
            MalformedReason::InvalidOdometer {
                value: "150.5".to_string()
            }
        );
    }

    #[test]
    fn timestamp_is_checked_before_kind() {
        let raw = RawEvent {
            timestamp: None,
            kind: Some("bogus".to_string()),
            ..departure()
        };
        assert_eq!(
            reason(raw),
            MalformedReason::MissingField {
                field: "timestamp".to_string()
            }
        );
    }

    #[test]
    fn error_message_carries_index() {
        let raw = RawEvent {
            kind: None,
            ..departure()
        };
        let err = normalize(raw, 3, &NormalizeOptions::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed record 3: missing required field `kind`"
        );
    }

    #[test]
    fn custom_labels_replace_defaults() {
        let options = NormalizeOptions {
            labels: KindLabels {
                departure: "out".to_string(),
                arrival: "in".to_string(),
            },
            ..NormalizeOptions::default()
        };
        assert!(normalize(departure(), 0, &options).is_err());

        let raw = RawEvent {
            kind: Some("in".to_string()),
            ..departure()
        };
        assert_eq!(
            normalize(raw, 0, &options).unwrap().kind,
            EventKind::Arrival
        );
    }
}
