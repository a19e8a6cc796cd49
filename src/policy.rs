//! Creation-policy resolution: deciding whether a command reuses the
//! existing instance, constructs a new one, or fails.
//!
//! The decision is a pure function of (current state present/absent) x
//! (handler's declared policy, or its kind when no policy is declared).
//! It runs after replay and before dispatch; its two configuration-class
//! failures abort the scenario, while `AggregateNotFound` becomes a regular
//! failure outcome.

use crate::aggregate::Aggregate;
use crate::error::FixtureError;

/// Declared rule governing whether a command handler may or must construct
/// a new aggregate instance based on current existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationPolicy {
    /// The command always starts a fresh lifecycle episode. Any existing
    /// instance is discarded; prior state must not leak into the new one.
    Always,
    /// Create lazily: construct a blank instance when none exists, act on
    /// the existing one otherwise.
    CreateIfMissing,
    /// The command only acts on an existing instance. Absent state is a
    /// failure, never an invitation to invent one.
    Never,
}

/// Shape of a command handler, relevant when no policy is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Constructor-style: creates a brand-new instance unconditionally.
    Instantiating,
    /// Acts on an already-existing instance.
    InstanceScoped,
}

/// The concrete dispatch target decided by [`resolve`].
///
/// `Fresh` marks a newly constructed instance; the distinction also drives
/// the identifier-as-default-result convention for handlers without a
/// declared return value.
#[derive(Debug)]
pub enum ResolvedTarget<A> {
    /// Route the command to the replayed instance.
    Existing(A),
    /// Route the command to a newly constructed blank instance.
    Fresh(A),
}

impl<A> ResolvedTarget<A> {
    /// `true` when resolution constructed a new instance.
    pub fn is_fresh(&self) -> bool {
        matches!(self, ResolvedTarget::Fresh(_))
    }

    /// Surrender the target state to the dispatcher.
    pub fn into_state(self) -> A {
        match self {
            ResolvedTarget::Existing(state) | ResolvedTarget::Fresh(state) => state,
        }
    }
}

/// Why resolution did not produce a target.
#[derive(Debug)]
pub enum ResolveError {
    /// Broken wiring; aborts the scenario before dispatch starts.
    Configuration(FixtureError),
    /// `NEVER` policy against absent state; becomes the failure outcome.
    AggregateNotFound,
}

/// Decide the concrete dispatch action for a command.
///
/// Implements the full decision table:
///
/// | current | policy                      | outcome                       |
/// |---------|-----------------------------|-------------------------------|
/// | absent  | none, instantiating         | fresh instance                |
/// | absent  | none, instance-scoped       | `NoHandlerForCommand`         |
/// | absent  | `CreateIfMissing` / `Always`| fresh instance                |
/// | absent  | `Never`                     | `AggregateNotFound`           |
/// | present | none, instantiating         | `InstanceAlreadyExists`       |
/// | present | none, instance-scoped       | existing instance             |
/// | present | `CreateIfMissing` / `Never` | existing instance             |
/// | present | `Always`                    | discard, fresh instance       |
///
/// # Errors
///
/// [`ResolveError::Configuration`] for the two wiring failures,
/// [`ResolveError::AggregateNotFound`] for the runtime one.
pub fn resolve<A: Aggregate>(
    current: Option<A>,
    kind: HandlerKind,
    policy: Option<CreationPolicy>,
    command_type: &'static str,
) -> Result<ResolvedTarget<A>, ResolveError> {
    let resolved = match (current, policy) {
        (None, None) => match kind {
            HandlerKind::Instantiating => ResolvedTarget::Fresh(A::default()),
            HandlerKind::InstanceScoped => {
                return Err(ResolveError::Configuration(
                    FixtureError::NoHandlerForCommand { command_type },
                ));
            }
        },
        (None, Some(CreationPolicy::Always | CreationPolicy::CreateIfMissing)) => {
            ResolvedTarget::Fresh(A::default())
        }
        (None, Some(CreationPolicy::Never)) => return Err(ResolveError::AggregateNotFound),
        (Some(_), None) if kind == HandlerKind::Instantiating => {
            return Err(ResolveError::Configuration(
                FixtureError::InstanceAlreadyExists { command_type },
            ));
        }
        // ALWAYS discards the replayed instance: the fresh one, not the old,
        // is what subsequent applies mutate and post-execution reads observe.
        (Some(_), Some(CreationPolicy::Always)) => {
            tracing::debug!(command_type, "discarding existing instance for ALWAYS policy");
            ResolvedTarget::Fresh(A::default())
        }
        (Some(state), _) => ResolvedTarget::Existing(state),
    };
    Ok(resolved)
}
