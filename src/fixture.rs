//! Fluent given/when/then scenario API.
//!
//! A scenario is one prior-event baseline, one command, and a set of
//! expectations about produced effects:
//!
//! ```text
//! fixture.given([Created(id)])
//!        .when(CreateOrUpdate(id))
//!        .expect_events([CreatedOrUpdated(id)])
//!        .expect_successful_handler_execution();
//! ```
//!
//! `when` replays the given events, resolves the creation policy, and
//! dispatches immediately; the returned [`ResultValidator`] holds the
//! recorded outcome. Expectation methods panic with a mismatch report, so a
//! failed expectation fails the surrounding test the ordinary way.
//!
//! Configuration-class errors (unroutable commands, missing event-sourcing
//! handlers, policy conflicts) also panic -- they indicate broken wiring,
//! not an outcome a scenario could legitimately expect.

use serde::Serialize;

use crate::aggregate::{Aggregate, CommandMessage};
use crate::dispatch::{dispatch, AggregateContext, CommandInterceptor, ScenarioHooks};
use crate::error::{DispatchFailure, DomainError, FixtureError, HandlerError};
use crate::policy::{resolve, CreationPolicy, HandlerKind, ResolveError};
use crate::recorder::ExecutionOutcome;
use crate::registry::{HandlerOutput, HandlerRegistry};
use crate::replay::replay;
use crate::store::EventStoreStub;
use crate::verifier;

/// Test fixture for one aggregate type.
///
/// Built once with all handler registrations, then reused across any number
/// of scenarios; the [`ScenarioHooks`] side channel is reset at the start of
/// every `when`, so nothing leaks between runs.
pub struct AggregateTestFixture<A: Aggregate> {
    registry: HandlerRegistry<A>,
    interceptors: Vec<CommandInterceptor<A>>,
    hooks: ScenarioHooks,
}

impl<A: Aggregate> AggregateTestFixture<A> {
    /// Create a fixture with no registrations.
    pub fn new() -> Self {
        AggregateTestFixture {
            registry: HandlerRegistry::new(),
            interceptors: Vec::new(),
            hooks: ScenarioHooks::default(),
        }
    }

    /// Register an event-sourcing handler for one event type.
    pub fn register_sourcing_handler(
        mut self,
        event_type: &'static str,
        handler: impl Fn(&mut A, &A::Event) + 'static,
    ) -> Self {
        self.registry.register_sourcing_handler(event_type, handler);
        self
    }

    /// Register a command handler with its kind and optional creation policy.
    pub fn register_command_handler(
        mut self,
        command_type: &'static str,
        kind: HandlerKind,
        policy: Option<CreationPolicy>,
        run: impl Fn(&A::Command, &mut AggregateContext<'_, A>) -> Result<HandlerOutput, HandlerError>
            + 'static,
    ) -> Self {
        self.registry
            .register_command_handler(command_type, kind, policy, run);
        self
    }

    /// Register an interceptor, run before the handler in registration order.
    pub fn register_command_handler_interceptor(
        mut self,
        interceptor: impl Fn(&A::Command, &ScenarioHooks) -> Result<(), DomainError> + 'static,
    ) -> Self {
        self.interceptors.push(Box::new(interceptor));
        self
    }

    /// The per-scenario side channel, queryable after a scenario completes.
    pub fn hooks(&self) -> &ScenarioHooks {
        &self.hooks
    }

    /// Start a scenario with no prior activity. Equivalent to `given([])`.
    pub fn given_no_prior_activity(&self) -> TestExecutor<'_, A> {
        self.given([])
    }

    /// Start a scenario from an ordered prior-event baseline.
    pub fn given(&self, events: impl IntoIterator<Item = A::Event>) -> TestExecutor<'_, A> {
        TestExecutor {
            fixture: self,
            store: EventStoreStub::with_events(events),
        }
    }
}

impl<A: Aggregate> Default for AggregateTestFixture<A> {
    fn default() -> Self {
        Self::new()
    }
}

/// A scenario with its baseline set, waiting for its command.
pub struct TestExecutor<'f, A: Aggregate> {
    fixture: &'f AggregateTestFixture<A>,
    store: EventStoreStub<A>,
}

impl<A: Aggregate> TestExecutor<'_, A> {
    /// Replay, resolve the creation policy, and dispatch the command.
    ///
    /// Runtime failures (`AggregateNotFound`, handler errors) become part of
    /// the returned outcome and are checked with `expect_exception` /
    /// `expect_successful_handler_execution`.
    ///
    /// # Panics
    ///
    /// On configuration-class errors: an unroutable command, an
    /// instantiating handler resolved against existing state, or an event
    /// with no event-sourcing handler.
    pub fn when(self, command: A::Command) -> ResultValidator<A> {
        self.fixture.hooks.reset();

        let current = match replay(&self.fixture.registry, self.store.events()) {
            Ok(current) => current,
            Err(err) => fail_configuration(err),
        };

        let command_type = command.command_type();
        let Some(def) = self.fixture.registry.command_handler(command_type) else {
            fail_configuration(FixtureError::NoHandlerForCommand { command_type });
        };

        let target = match resolve(current, def.kind(), def.policy(), command_type) {
            Ok(target) => target,
            Err(ResolveError::AggregateNotFound) => {
                return ResultValidator {
                    outcome: ExecutionOutcome::aggregate_not_found(),
                };
            }
            Err(ResolveError::Configuration(err)) => fail_configuration(err),
        };

        let outcome = match dispatch(
            &self.fixture.registry,
            def,
            target,
            &command,
            &self.fixture.interceptors,
            &self.fixture.hooks,
        ) {
            Ok(outcome) => outcome,
            Err(err) => fail_configuration(err),
        };

        ResultValidator { outcome }
    }
}

/// Abort the scenario on broken wiring.
fn fail_configuration(err: FixtureError) -> ! {
    tracing::error!(error = %err, "scenario configuration error");
    panic!("scenario configuration error: {err}");
}

/// Holds the recorded outcome and checks expectations against it.
///
/// All `expect_*` methods return `self` for chaining and panic with a
/// mismatch report when the expectation does not hold.
pub struct ResultValidator<A: Aggregate> {
    outcome: ExecutionOutcome<A>,
}

impl<A: Aggregate> ResultValidator<A> {
    /// Expect exactly these events, in this order, structurally equal.
    #[track_caller]
    pub fn expect_events(self, expected: impl IntoIterator<Item = A::Event>) -> Self {
        let expected: Vec<A::Event> = expected.into_iter().collect();
        if let Err(mismatch) = verifier::verify_events(self.outcome.produced_events(), &expected)
        {
            panic!("expectation not met: {mismatch}");
        }
        self
    }

    /// Expect that no events were produced.
    #[track_caller]
    pub fn expect_no_events(self) -> Self {
        self.expect_events([])
    }

    /// Expect the result payload to structurally equal `expected`.
    ///
    /// Pass `serde_json::Value::Null` to expect an explicit null result;
    /// this is distinct from [`expect_no_result`](Self::expect_no_result).
    #[track_caller]
    pub fn expect_result_message_payload(self, expected: impl Serialize) -> Self {
        let expected = match serde_json::to_value(expected) {
            Ok(value) => value,
            Err(err) => panic!("failed to encode expected result payload: {err}"),
        };
        if let Err(mismatch) = verifier::verify_result_payload(self.outcome.result(), &expected) {
            panic!("expectation not met: {mismatch}");
        }
        self
    }

    /// Expect that the handler declared no return value at all.
    #[track_caller]
    pub fn expect_no_result(self) -> Self {
        if let Err(mismatch) = verifier::verify_no_result(self.outcome.result()) {
            panic!("expectation not met: {mismatch}");
        }
        self
    }

    /// Expect the outcome not to be a failure.
    #[track_caller]
    pub fn expect_successful_handler_execution(self) -> Self {
        if let Err(mismatch) = verifier::verify_success(self.outcome.result()) {
            panic!("expectation not met: {mismatch}");
        }
        self
    }

    /// Expect a failure outcome matching the given predicate.
    #[track_caller]
    pub fn expect_exception(self, predicate: impl FnOnce(&DispatchFailure) -> bool) -> Self {
        match self.outcome.failure() {
            None => panic!(
                "expectation not met: {}",
                verifier::Mismatch::UnexpectedSuccess
            ),
            Some(failure) => {
                if !predicate(failure) {
                    panic!(
                        "expectation not met: {}",
                        verifier::Mismatch::FailureMismatch {
                            error: failure.to_string(),
                        }
                    );
                }
            }
        }
        self
    }

    /// Run an assertion against the post-dispatch aggregate state.
    ///
    /// # Panics
    ///
    /// When no instance exists after dispatch (e.g. an `AggregateNotFound`
    /// outcome), or when the assertion itself panics.
    #[track_caller]
    pub fn expect_state(self, assertion: impl FnOnce(&A)) -> Self {
        match self.outcome.state() {
            Some(state) => assertion(state),
            None => panic!("expectation not met: no aggregate instance exists after dispatch"),
        }
        self
    }

    /// The full recorded outcome, for assertions beyond the fluent surface.
    pub fn outcome(&self) -> &ExecutionOutcome<A> {
        &self.outcome
    }
}
