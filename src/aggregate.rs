//! Core traits describing the aggregate under test and its messages.
//!
//! The harness never inspects message payloads itself: commands and events
//! expose a static discriminant string used for handler lookup, and commands
//! additionally expose the identifier of the instance they target. This keeps
//! the core free of reflection -- routing is driven entirely by explicit
//! registration tables built at fixture setup.

use std::fmt;

use serde::Serialize;

/// An event-sourced aggregate whose state is rebuilt from event history.
///
/// The implementing type is the aggregate's in-memory state. A scenario owns
/// exactly one instance of it for the duration of one replay/dispatch cycle;
/// `Default` provides the blank container that replay and the creation-policy
/// resolver construct new instances from.
///
/// # Contract
///
/// - State is reachable only through registered event-sourcing handlers;
///   command handlers read it via [`AggregateContext::state`] and mutate it
///   exclusively by applying events.
/// - The identifier must be value-comparable and serializable: it surfaces as
///   the default result payload when a creation handler declares no return
///   value.
///
/// [`AggregateContext::state`]: crate::dispatch::AggregateContext::state
pub trait Aggregate: Default + 'static {
    /// Opaque key identifying one aggregate instance. May be a composite
    /// value object; equality and serialized form are the only operations
    /// the harness requires.
    type Id: Clone + PartialEq + fmt::Debug + Serialize;

    /// The set of commands routable to this aggregate.
    type Command: CommandMessage<Id = Self::Id>;

    /// The set of events this aggregate produces and applies.
    type Event: EventMessage;
}

/// A command targeting exactly one aggregate instance.
pub trait CommandMessage {
    /// Identifier type of the targeted aggregate.
    type Id;

    /// Static discriminant used to look up the registered command handler.
    fn command_type(&self) -> &'static str;

    /// Extract the identifier of the targeted instance.
    ///
    /// Stands in for the externally supplied identifier-extraction function:
    /// the harness consumes it fully resolved and performs no inspection of
    /// the payload itself.
    fn target(&self) -> Self::Id;
}

/// An immutable event value with structural equality.
///
/// Equality is used both for expectation comparison (order-sensitive,
/// element-wise) and never for state application -- application goes through
/// the event-sourcing handler registered for [`event_type`].
///
/// [`event_type`]: EventMessage::event_type
pub trait EventMessage: Clone + PartialEq + fmt::Debug {
    /// Static discriminant used to look up the event-sourcing handler.
    fn event_type(&self) -> &'static str;
}
