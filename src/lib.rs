//! Deterministic given/when/then test fixture for event-sourced aggregates.
//!
//! Reproduces production dispatch semantics -- creation-policy resolution
//! and apply-then-source ordering -- with no real infrastructure: no
//! network, no persisted event store, no message bus. A scenario replays a
//! prior-event baseline, dispatches one command, records every event the
//! handler applies, and checks the recorded outcome against expectations.
//!
//! Everything is synchronous and single-threaded by design, so scenario
//! outcomes are reproducible and the record-then-source step needs no
//! synchronization.

mod aggregate;
pub use aggregate::{Aggregate, CommandMessage, EventMessage};
mod dispatch;
pub use dispatch::{AggregateContext, CommandInterceptor, ScenarioHooks};
mod error;
pub use error::{DispatchFailure, DomainError, FixtureError, HandlerError};
mod fixture;
pub use fixture::{AggregateTestFixture, ResultValidator, TestExecutor};
mod policy;
pub use policy::{resolve, CreationPolicy, HandlerKind, ResolveError, ResolvedTarget};
mod recorder;
pub use recorder::{ExecutionOutcome, OutcomeResult};
mod registry;
pub use registry::{CommandHandlerDef, HandlerOutput, HandlerRegistry};
mod replay;
pub use replay::replay;
mod store;
pub use store::EventStoreStub;
mod verifier;
pub use verifier::{
    verify_events, verify_no_result, verify_result_payload, verify_success, Mismatch,
};
