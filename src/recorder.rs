//! Passive record of everything one dispatch produced.
//!
//! Filled by the dispatcher, immutable afterwards: the ordered produced
//! events, the final result (or failure), and the post-dispatch state for
//! state assertions.

use serde_json::Value;

use crate::aggregate::Aggregate;
use crate::error::DispatchFailure;

/// Final result of one dispatched command.
///
/// The three success shapes stay distinguishable: a handler with no declared
/// return value (`NoResult`), one returning explicit null
/// (`Payload(Value::Null)`), and one returning a value (`Payload(..)`).
#[derive(Debug)]
pub enum OutcomeResult {
    /// The handler declared no return value and no default applies.
    NoResult,
    /// The handler returned a payload, possibly explicit null, or the
    /// aggregate identifier surfaced as the default creation result.
    Payload(Value),
    /// Dispatch ended in a runtime failure.
    Failure(DispatchFailure),
}

/// Everything recorded during one scenario's dispatch.
#[derive(Debug)]
pub struct ExecutionOutcome<A: Aggregate> {
    events: Vec<A::Event>,
    result: OutcomeResult,
    state: Option<A>,
}

impl<A: Aggregate> ExecutionOutcome<A> {
    /// Record a completed dispatch. `state` is `None` only when resolution
    /// failed before any instance existed.
    pub(crate) fn new(events: Vec<A::Event>, result: OutcomeResult, state: Option<A>) -> Self {
        ExecutionOutcome {
            events,
            result,
            state,
        }
    }

    /// The pre-dispatch `AggregateNotFound` outcome: no instance, no events.
    pub(crate) fn aggregate_not_found() -> Self {
        ExecutionOutcome {
            events: Vec::new(),
            result: OutcomeResult::Failure(DispatchFailure::AggregateNotFound),
            state: None,
        }
    }

    /// Events produced during dispatch, in apply order.
    ///
    /// On failure this still holds every event applied before the failure --
    /// partial effects are visible by design.
    pub fn produced_events(&self) -> &[A::Event] {
        &self.events
    }

    /// The final result of the dispatch.
    pub fn result(&self) -> &OutcomeResult {
        &self.result
    }

    /// The captured failure, if the outcome is one.
    pub fn failure(&self) -> Option<&DispatchFailure> {
        match &self.result {
            OutcomeResult::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Post-dispatch aggregate state, when an instance existed.
    pub fn state(&self) -> Option<&A> {
        self.state.as_ref()
    }
}
