//! Command dispatch: interceptors, handler invocation, and the apply sink
//! that enforces record-then-source ordering.
//!
//! The dispatcher owns the resolved target instance for the duration of one
//! invocation, wrapped in an [`AggregateContext`]. Handlers emit events
//! exclusively through [`AggregateContext::apply`], which appends the event
//! to the produced-events record and immediately routes it through the
//! matching event-sourcing handler -- before control returns to the handler
//! body. A handler that applies an event and then reads state therefore
//! observes the post-mutation value within the same invocation.
//!
//! Everything here is synchronous and single-threaded by design; no
//! suspension point can reorder the record-then-source step.

use std::cell::{Cell, RefCell};

use crate::aggregate::{Aggregate, CommandMessage, EventMessage};
use crate::error::{DispatchFailure, DomainError, FixtureError, HandlerError};
use crate::policy::ResolvedTarget;
use crate::recorder::{ExecutionOutcome, OutcomeResult};
use crate::registry::{CommandHandlerDef, HandlerOutput, HandlerRegistry};

/// Explicit side channel for cross-cutting signals set by interceptors.
///
/// Replaces process-wide mutable state with a per-fixture object that the
/// dispatcher resets at the start of every scenario, so nothing leaks
/// between runs. Interior mutability is deliberately non-`Sync`: scenarios
/// run one at a time on one thread.
#[derive(Debug, Default)]
pub struct ScenarioHooks {
    intercepted: Cell<bool>,
    notes: RefCell<Vec<String>>,
}

impl ScenarioHooks {
    /// Clear all signals. Called at the start of every `when`.
    pub(crate) fn reset(&self) {
        self.intercepted.set(false);
        self.notes.borrow_mut().clear();
    }

    /// Mark that an interceptor observed the command.
    pub fn mark_intercepted(&self) {
        self.intercepted.set(true);
    }

    /// Whether any interceptor marked the current scenario.
    pub fn was_intercepted(&self) -> bool {
        self.intercepted.get()
    }

    /// Append a free-form note for later assertion.
    pub fn note(&self, note: impl Into<String>) {
        self.notes.borrow_mut().push(note.into());
    }

    /// Notes recorded during the current scenario, in order.
    pub fn notes(&self) -> Vec<String> {
        self.notes.borrow().clone()
    }
}

/// An interceptor invoked before the command handler, in registration order.
///
/// Receives the command and the scenario's [`ScenarioHooks`]. Returning an
/// error aborts dispatch before the handler runs; the error becomes the
/// failure outcome.
pub type CommandInterceptor<A> =
    Box<dyn Fn(&<A as Aggregate>::Command, &ScenarioHooks) -> Result<(), DomainError>>;

/// The apply sink handed to command handlers.
///
/// Owns the resolved target instance during one invocation. State is read
/// through [`state`](AggregateContext::state) and mutated exclusively by
/// [`apply`](AggregateContext::apply).
pub struct AggregateContext<'r, A: Aggregate> {
    registry: &'r HandlerRegistry<A>,
    state: A,
    produced: Vec<A::Event>,
}

impl<'r, A: Aggregate> AggregateContext<'r, A> {
    pub(crate) fn new(registry: &'r HandlerRegistry<A>, state: A) -> Self {
        AggregateContext {
            registry,
            state,
            produced: Vec::new(),
        }
    }

    /// Current aggregate state, including mutations from every event applied
    /// so far in this invocation.
    pub fn state(&self) -> &A {
        &self.state
    }

    /// Emit an event: record it, then immediately source it into the state.
    ///
    /// The event is appended to the produced-events record first and routed
    /// through its event-sourcing handler second, synchronously; both happen
    /// before this call returns. An event recorded stays recorded even if
    /// the handler fails later -- there is no rollback.
    ///
    /// # Errors
    ///
    /// [`FixtureError::MissingEventSourcingHandler`] when the event has no
    /// registered handler. Propagate it with `?`; it aborts the scenario.
    pub fn apply(&mut self, event: A::Event) -> Result<(), FixtureError> {
        tracing::debug!(event_type = event.event_type(), "applying event");
        self.produced.push(event.clone());
        self.registry.source(&mut self.state, &event)
    }

    /// Events applied so far in this invocation, in order.
    pub fn produced(&self) -> &[A::Event] {
        &self.produced
    }

    fn finish(self) -> (A, Vec<A::Event>) {
        (self.state, self.produced)
    }
}

/// Run interceptors and the resolved handler, recording everything produced.
///
/// Returns `Err` only for configuration-class errors (broken wiring).
/// Runtime failures -- interceptor or handler errors -- are captured in the
/// returned outcome, with every event applied before the failure still
/// recorded and still applied to the instance.
pub(crate) fn dispatch<A: Aggregate>(
    registry: &HandlerRegistry<A>,
    def: &CommandHandlerDef<A>,
    target: ResolvedTarget<A>,
    command: &A::Command,
    interceptors: &[CommandInterceptor<A>],
    hooks: &ScenarioHooks,
) -> Result<ExecutionOutcome<A>, FixtureError> {
    let _span =
        tracing::info_span!("dispatch", command_type = command.command_type()).entered();

    let fresh = target.is_fresh();
    let mut ctx = AggregateContext::new(registry, target.into_state());

    for interceptor in interceptors {
        if let Err(err) = interceptor(command, hooks) {
            tracing::debug!(error = %err, "interceptor aborted dispatch");
            let (state, events) = ctx.finish();
            return Ok(ExecutionOutcome::new(
                events,
                OutcomeResult::Failure(DispatchFailure::HandlerExecution(err)),
                Some(state),
            ));
        }
    }

    match def.run(command, &mut ctx) {
        Ok(HandlerOutput::Return(value)) => {
            let (state, events) = ctx.finish();
            Ok(ExecutionOutcome::new(
                events,
                OutcomeResult::Payload(value),
                Some(state),
            ))
        }
        Ok(HandlerOutput::Void) => {
            // Reference-behavior convention: a creation handler with no
            // declared return value surfaces the aggregate identifier.
            let result = if fresh {
                OutcomeResult::Payload(serde_json::to_value(command.target())?)
            } else {
                OutcomeResult::NoResult
            };
            let (state, events) = ctx.finish();
            Ok(ExecutionOutcome::new(events, result, Some(state)))
        }
        Err(HandlerError::Fixture(err)) => Err(err),
        Err(HandlerError::Domain(err)) => {
            tracing::debug!(error = %err, "handler raised a domain failure");
            let (state, events) = ctx.finish();
            Ok(ExecutionOutcome::new(
                events,
                OutcomeResult::Failure(DispatchFailure::HandlerExecution(err)),
                Some(state),
            ))
        }
    }
}
