//! State reconstruction: folding the given events into an aggregate
//! instance, or concluding that no instance exists.

use crate::aggregate::{Aggregate, EventMessage};
use crate::error::FixtureError;
use crate::registry::HandlerRegistry;

/// Rebuild the current state from the ordered given events.
///
/// An empty history means no instance exists yet (`None`). Otherwise a blank
/// instance is constructed and every event is routed through its registered
/// event-sourcing handler, in order; the fully mutated instance becomes the
/// current-state input for creation-policy resolution.
///
/// # Errors
///
/// [`FixtureError::MissingEventSourcingHandler`] when an event has no
/// registered handler. This is broken wiring, not a scenario outcome.
pub fn replay<A: Aggregate>(
    registry: &HandlerRegistry<A>,
    given: &[A::Event],
) -> Result<Option<A>, FixtureError> {
    if given.is_empty() {
        return Ok(None);
    }

    let mut state = A::default();
    for event in given {
        tracing::debug!(event_type = event.event_type(), "replaying given event");
        registry.source(&mut state, event)?;
    }
    Ok(Some(state))
}
