//! Row schemas accepted from movement log exports.

use fl_core::{EventKind, KindLabels, OdometerValue, RawEvent};
use serde::Deserialize;
use serde_json::{Map, Value};

/// One row of the movement sheet.
///
/// The sheet keeps start and end odometer readings in separate columns;
/// which one applies depends on the row's kind. Columns not listed here,
/// such as the submitter address, are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetRow {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub plate: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub odometer_start: Option<OdometerValue>,
    #[serde(default)]
    pub odometer_end: Option<OdometerValue>,
    #[serde(default)]
    pub purpose: Option<String>,
}

impl SheetRow {
    /// Maps the row onto the event schema.
    ///
    /// Rows whose kind matches neither label keep the label and get no
    /// odometer, so the normalizer rejects them by kind.
    pub fn into_raw(self, labels: &KindLabels) -> RawEvent {
        let classified = self.kind.as_deref().and_then(|k| labels.classify(k));
        let (odometer, purpose) = match classified {
            Some(EventKind::Departure) => (self.odometer_start, self.purpose),
            Some(EventKind::Arrival) => (self.odometer_end, None),
            None => (None, None),
        };

        RawEvent {
            timestamp: self.timestamp,
            driver: self.driver,
            vehicle_plate: self.plate,
            vehicle_model: self.model,
            kind: self.kind,
            odometer,
            purpose,
        }
    }
}

/// Keys that only appear in rows already in event shape.
const EVENT_SHAPE_KEYS: &[&str] = &["vehicle_plate", "vehicle_model", "odometer"];

/// Decodes one JSON object in either sheet or event shape.
pub fn decode_row(object: Map<String, Value>, labels: &KindLabels) -> serde_json::Result<RawEvent> {
    let event_shaped = EVENT_SHAPE_KEYS.iter().any(|k| object.contains_key(*k));
    let value = Value::Object(object);
    if event_shaped {
        RawEvent::deserialize(value)
    } else {
        SheetRow::deserialize(value).map(|row| row.into_raw(labels))
    }
}
