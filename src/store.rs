//! In-memory stand-in for the event store: the "given" history of one
//! aggregate instance.
//!
//! Deliberately a dumb container. It performs no validation and no
//! persistence -- it exists so the replayer has a single, ordered source of
//! prior events and so scenarios can swap histories without touching any
//! real infrastructure.

use crate::aggregate::Aggregate;

/// Ordered prior events for a single aggregate instance.
#[derive(Debug)]
pub struct EventStoreStub<A: Aggregate> {
    events: Vec<A::Event>,
}

impl<A: Aggregate> EventStoreStub<A> {
    /// Create an empty history: no instance exists yet.
    pub fn empty() -> Self {
        EventStoreStub { events: Vec::new() }
    }

    /// Create a history from the given ordered events.
    pub fn with_events(events: impl IntoIterator<Item = A::Event>) -> Self {
        EventStoreStub {
            events: events.into_iter().collect(),
        }
    }

    /// The ordered given events, ready for replay.
    pub fn events(&self) -> &[A::Event] {
        &self.events
    }

    /// `true` when no prior activity was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<A: Aggregate> Default for EventStoreStub<A> {
    fn default() -> Self {
        Self::empty()
    }
}
