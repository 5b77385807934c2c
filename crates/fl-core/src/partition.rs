//! Grouping of normalized events by (driver, vehicle).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::NormalizedEvent;
use crate::types::{Driver, Plate};

/// Identity of a group. Ordered by driver, then plate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub driver: Driver,
    pub vehicle_plate: Plate,
}

impl GroupKey {
    fn of(event: &NormalizedEvent) -> Self {
        Self {
            driver: event.driver.clone(),
            vehicle_plate: event.vehicle_plate.clone(),
        }
    }
}

/// A batch of events split into time-ordered groups.
///
/// Events live in a single arena; groups hold indices into it.
#[derive(Debug, Clone)]
pub struct Partition {
    events: Vec<NormalizedEvent>,
    groups: BTreeMap<GroupKey, Vec<usize>>,
}

/// One group's events in processing order.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    pub key: &'a GroupKey,
    events: &'a [NormalizedEvent],
    order: &'a [usize],
}

impl<'a> Group<'a> {
    /// Iterates events by ascending timestamp; equal timestamps keep input order.
    pub fn events(&self) -> impl ExactSizeIterator<Item = &'a NormalizedEvent> + 'a {
        let events = self.events;
        self.order.iter().map(move |&i| &events[i])
    }

    pub const fn len(&self) -> usize {
        self.order.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Partition {
    /// Builds the partition. `events` must be in input order.
    pub fn new(events: Vec<NormalizedEvent>) -> Self {
        let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
        for (slot, event) in events.iter().enumerate() {
            groups.entry(GroupKey::of(event)).or_default().push(slot);
        }
        // Stable sort: same-instant events stay in arrival order.
        for order in groups.values_mut() {
            order.sort_by_key(|&slot| events[slot].timestamp);
        }
        tracing::debug!(
            event_count = events.len(),
            group_count = groups.len(),
            "partitioned events"
        );
        Self { events, groups }
    }

    /// Groups in key order.
    pub fn groups(&self) -> impl ExactSizeIterator<Item = Group<'_>> {
        self.groups.iter().map(|(key, order)| Group {
            key,
            events: &self.events,
            order,
        })
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}
