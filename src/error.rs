//! Crate-level error types for scenario configuration and command dispatch.
//!
//! The taxonomy splits in two:
//!
//! - [`FixtureError`]: configuration-class errors. A scenario that hits one of
//!   these is broken wiring (a handler that was never registered, an
//!   instantiating handler resolved against live state). They abort the
//!   scenario immediately and are never subject to expectation matching.
//! - [`DispatchFailure`]: runtime-class failures. These are the intended
//!   subject of `expect_exception` / `expect_successful_handler_execution`
//!   checks and become part of the recorded [`ExecutionOutcome`].
//!
//! [`ExecutionOutcome`]: crate::recorder::ExecutionOutcome

/// A boxed domain error raised by handler or interceptor logic.
pub type DomainError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Configuration-class error: the scenario wiring itself is broken.
///
/// Raised before or during dispatch, but never recorded as an outcome --
/// the fluent layer aborts the scenario (panics) with the error display.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    /// No command handler metadata matches the command's type and the
    /// current-state presence.
    #[error("no command handler resolves for command type `{command_type}`")]
    NoHandlerForCommand {
        /// Discriminant of the command that could not be routed.
        command_type: &'static str,
    },

    /// An instantiating (constructor-style) handler with no creation policy
    /// was resolved against a present instance. Re-creation is not allowed.
    #[error(
        "an aggregate instance already exists; instantiating handler for \
         command type `{command_type}` cannot create another"
    )]
    InstanceAlreadyExists {
        /// Discriminant of the offending command.
        command_type: &'static str,
    },

    /// An event was applied (during replay or dispatch) for which no
    /// event-sourcing handler is registered. Fails fast, never swallowed.
    #[error("no event sourcing handler registered for event type `{event_type}`")]
    MissingEventSourcingHandler {
        /// Discriminant of the event that could not be sourced.
        event_type: &'static str,
    },

    /// The aggregate identifier could not be encoded as the default result
    /// payload of a handler without a declared return value.
    #[error("failed to encode the aggregate identifier as a result payload: {0}")]
    ResultEncoding(#[from] serde_json::Error),
}

/// Runtime-class failure recorded as the scenario's outcome.
#[derive(Debug, thiserror::Error)]
pub enum DispatchFailure {
    /// A `NEVER` creation policy was resolved against absent state: the
    /// command may only act on an existing instance, and none exists.
    #[error("aggregate not found: the handler never creates instances and no prior events exist")]
    AggregateNotFound,

    /// An interceptor or the command handler itself raised a failure.
    ///
    /// Events applied before the failure remain applied and recorded --
    /// partial effects are visible, mirroring in-process event sourcing.
    #[error("handler execution failed: {0}")]
    HandlerExecution(DomainError),
}

/// Error type returned by command handler closures.
///
/// Domain failures become the scenario's failure outcome; fixture errors
/// (raised by [`AggregateContext::apply`]) propagate as configuration errors
/// and abort the scenario. The `From` impls let handler bodies use `?` on
/// both kinds.
///
/// [`AggregateContext::apply`]: crate::dispatch::AggregateContext::apply
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// Command rejected or failed by domain logic.
    #[error("{0}")]
    Domain(DomainError),

    /// Configuration error surfaced from inside the handler (e.g. an apply
    /// with no matching event-sourcing handler).
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

impl HandlerError {
    /// Wrap any error as a domain failure.
    pub fn domain(err: impl Into<DomainError>) -> Self {
        HandlerError::Domain(err.into())
    }
}
