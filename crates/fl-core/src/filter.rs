//! Trip selection by driver, status and departure date.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::trip::{Trip, TripStatus};

/// Criteria a trip must meet to be kept. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripFilter {
    pub drivers: Option<BTreeSet<String>>,
    pub statuses: Option<BTreeSet<TripStatus>>,
    /// Inclusive lower bound on the departure date.
    pub departed_on_or_after: Option<NaiveDate>,
    /// Inclusive upper bound on the departure date.
    pub departed_on_or_before: Option<NaiveDate>,
}

impl TripFilter {
    pub fn matches(&self, trip: &Trip) -> bool {
        let date = trip.departure_time.date();
        self.drivers
            .as_ref()
            .is_none_or(|d| d.contains(trip.driver.as_str()))
            && self.statuses.as_ref().is_none_or(|s| s.contains(&trip.status))
            && self.departed_on_or_after.is_none_or(|from| date >= from)
            && self.departed_on_or_before.is_none_or(|to| date <= to)
    }

    /// Keeps matching trips in their original order.
    pub fn apply(&self, trips: &[Trip]) -> Vec<Trip> {
        trips.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}
