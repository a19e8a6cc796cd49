//! Explicit registration tables mapping message discriminants to handlers.
//!
//! Stands in for annotation-driven handler discovery: the registry is built
//! at fixture setup from explicit calls, so the core never performs any
//! scanning or reflection. Command handlers carry their creation-policy
//! metadata; event-sourcing handlers are pure state mutators keyed by event
//! type.

use std::collections::HashMap;

use crate::aggregate::{Aggregate, EventMessage};
use crate::dispatch::AggregateContext;
use crate::error::{FixtureError, HandlerError};
use crate::policy::{CreationPolicy, HandlerKind};

/// Pure state-mutation function invoked once per event, in event order.
pub type SourcingHandler<A> = Box<dyn Fn(&mut A, &<A as Aggregate>::Event)>;

/// Command handler body: receives the command and the apply sink.
pub type HandlerFn<A> = Box<
    dyn Fn(
        &<A as Aggregate>::Command,
        &mut AggregateContext<'_, A>,
    ) -> Result<HandlerOutput, HandlerError>,
>;

/// What a command handler hands back when it completes without failure.
///
/// `Void` models a handler with no declared return value at all; it is
/// distinct from `Return(Value::Null)`, a handler that explicitly returns
/// null. The dispatcher never collapses the two.
pub enum HandlerOutput {
    /// No declared return value.
    Void,
    /// An explicit return payload, including explicit null.
    Return(serde_json::Value),
}

impl HandlerOutput {
    /// Explicit null return, kept distinguishable from [`HandlerOutput::Void`].
    pub fn null() -> Self {
        HandlerOutput::Return(serde_json::Value::Null)
    }
}

/// Association of one command type with its handler and creation metadata.
pub struct CommandHandlerDef<A: Aggregate> {
    kind: HandlerKind,
    policy: Option<CreationPolicy>,
    run: HandlerFn<A>,
}

impl<A: Aggregate> CommandHandlerDef<A> {
    /// Shape of the handler (constructor-style vs instance-scoped).
    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    /// Declared creation policy, if any.
    pub fn policy(&self) -> Option<CreationPolicy> {
        self.policy
    }

    /// Invoke the handler body.
    pub(crate) fn run(
        &self,
        command: &A::Command,
        ctx: &mut AggregateContext<'_, A>,
    ) -> Result<HandlerOutput, HandlerError> {
        (self.run)(command, ctx)
    }
}

/// Registration tables for one aggregate type.
///
/// Later registrations for the same discriminant replace earlier ones, so
/// tests can override a single handler on an otherwise shared setup.
pub struct HandlerRegistry<A: Aggregate> {
    commands: HashMap<&'static str, CommandHandlerDef<A>>,
    sourcing: HashMap<&'static str, SourcingHandler<A>>,
}

impl<A: Aggregate> HandlerRegistry<A> {
    /// Create an empty registry.
    pub fn new() -> Self {
        HandlerRegistry {
            commands: HashMap::new(),
            sourcing: HashMap::new(),
        }
    }

    /// Register an event-sourcing handler for one event type.
    pub fn register_sourcing_handler(
        &mut self,
        event_type: &'static str,
        handler: impl Fn(&mut A, &A::Event) + 'static,
    ) {
        self.sourcing.insert(event_type, Box::new(handler));
    }

    /// Register a command handler with its creation metadata.
    pub fn register_command_handler(
        &mut self,
        command_type: &'static str,
        kind: HandlerKind,
        policy: Option<CreationPolicy>,
        run: impl Fn(&A::Command, &mut AggregateContext<'_, A>) -> Result<HandlerOutput, HandlerError>
            + 'static,
    ) {
        self.commands.insert(
            command_type,
            CommandHandlerDef {
                kind,
                policy,
                run: Box::new(run),
            },
        );
    }

    /// Look up the handler definition for a command type.
    pub fn command_handler(&self, command_type: &str) -> Option<&CommandHandlerDef<A>> {
        self.commands.get(command_type)
    }

    /// Route one event through its event-sourcing handler, mutating `state`.
    ///
    /// # Errors
    ///
    /// [`FixtureError::MissingEventSourcingHandler`] when no handler is
    /// registered for the event's type. Never silently ignored.
    pub fn source(&self, state: &mut A, event: &A::Event) -> Result<(), FixtureError> {
        let event_type = event.event_type();
        let handler = self.sourcing.get(event_type).ok_or(
            FixtureError::MissingEventSourcingHandler { event_type },
        )?;
        handler(state, event);
        Ok(())
    }
}

impl<A: Aggregate> Default for HandlerRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}
