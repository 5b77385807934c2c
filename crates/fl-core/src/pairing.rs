//! Departure/arrival pairing for one (driver, vehicle) group.
//!
//! # State machine
//!
//! | state             | event     | next              | output                 |
//! |-------------------|-----------|-------------------|------------------------|
//! | `Idle`            | departure | `AwaitingArrival` | none                   |
//! | `AwaitingArrival` | departure | `AwaitingArrival` | superseded departure   |
//! | `AwaitingArrival` | arrival   | `Idle`            | complete trip          |
//! | `Idle`            | arrival   | `Idle`            | orphan arrival         |
//!
//! A group that ends in `AwaitingArrival` yields an open trip.
//!
//! A superseded departure never becomes a trip or an orphan; the
//! [`SupersededDeparture`] record is the only trace it leaves.

use crate::event::{EventKind, NormalizedEvent};
use crate::trip::{OrphanArrival, SupersededDeparture, Trip};

/// Everything one group produced, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupOutcome {
    pub trips: Vec<Trip>,
    pub orphans: Vec<OrphanArrival>,
    pub superseded: Vec<SupersededDeparture>,
}

#[derive(Debug, Clone, Copy)]
enum PairingState<'a> {
    Idle,
    AwaitingArrival { pending: &'a NormalizedEvent },
}

/// Folds one group's events, which must already be in processing order.
pub fn pair_group<'a, I>(events: I) -> GroupOutcome
where
    I: IntoIterator<Item = &'a NormalizedEvent>,
{
    let mut outcome = GroupOutcome::default();
    let mut state = PairingState::Idle;

    for event in events {
        state = match (state, event.kind) {
            (PairingState::Idle, EventKind::Departure) => {
                PairingState::AwaitingArrival { pending: event }
            }
            (PairingState::AwaitingArrival { pending }, EventKind::Departure) => {
                tracing::debug!(
                    driver = %pending.driver,
                    plate = %pending.vehicle_plate,
                    departure = %pending.timestamp,
                    replaced_by = %event.timestamp,
                    "pending departure superseded"
                );
                outcome
                    .superseded
                    .push(SupersededDeparture::new(pending, event));
                PairingState::AwaitingArrival { pending: event }
            }
            (PairingState::AwaitingArrival { pending }, EventKind::Arrival) => {
                outcome.trips.push(Trip::complete(pending, event));
                PairingState::Idle
            }
            (PairingState::Idle, EventKind::Arrival) => {
                outcome.orphans.push(OrphanArrival::from_event(event));
                PairingState::Idle
            }
        };
    }

    if let PairingState::AwaitingArrival { pending } = state {
        outcome.trips.push(Trip::open(pending));
    }

    outcome
}
