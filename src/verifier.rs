//! Structural comparison of a recorded outcome against expectations.
//!
//! Pure functions returning `Result<(), Mismatch>`; the fluent layer turns a
//! `Mismatch` into a panic. Keeping the comparison logic free of assertions
//! makes the reports themselves testable.

use serde_json::Value;

use crate::aggregate::EventMessage;
use crate::recorder::OutcomeResult;

/// A failed expectation, with enough context to pinpoint the difference.
#[derive(Debug, thiserror::Error)]
pub enum Mismatch {
    /// The produced-event sequence has the wrong length. `divergence`
    /// additionally reports the first differing index within the common
    /// prefix, when there is one.
    #[error("expected {expected} event(s), got {actual}{divergence}")]
    EventCount {
        expected: usize,
        actual: usize,
        divergence: String,
    },

    /// Sequences have equal length but differ at `index`.
    #[error("event at index {index} differs: expected {expected}, got {actual}")]
    EventAt {
        index: usize,
        expected: String,
        actual: String,
    },

    /// The result payload does not match the expected one.
    #[error("result payload differs: expected {expected}, got {actual}")]
    Result { expected: String, actual: String },

    /// A success was expected but the outcome is a failure.
    #[error("expected successful handler execution, but it failed: {error}")]
    UnexpectedFailure { error: String },

    /// A failure was expected but the outcome is a success.
    #[error("expected a failure outcome, but handler execution succeeded")]
    UnexpectedSuccess,

    /// A failure was captured but the caller's predicate rejected it.
    #[error("captured failure did not match the expectation: {error}")]
    FailureMismatch { error: String },
}

/// Order-sensitive, element-wise structural comparison of produced events.
pub fn verify_events<E: EventMessage>(actual: &[E], expected: &[E]) -> Result<(), Mismatch> {
    let first_diff = actual
        .iter()
        .zip(expected)
        .position(|(a, e)| a != e);

    if actual.len() != expected.len() {
        let divergence = match first_diff {
            Some(index) => format!(" (sequences first differ at index {index})"),
            None => String::new(),
        };
        return Err(Mismatch::EventCount {
            expected: expected.len(),
            actual: actual.len(),
            divergence,
        });
    }

    if let Some(index) = first_diff {
        return Err(Mismatch::EventAt {
            index,
            expected: format!("{:?}", expected[index]),
            actual: format!("{:?}", actual[index]),
        });
    }

    Ok(())
}

/// Compare the outcome's result payload against an expected value.
///
/// Explicit null (`Value::Null`) is a real payload here: a handler that
/// returned nothing at all fails this check even against an expected null.
pub fn verify_result_payload(result: &OutcomeResult, expected: &Value) -> Result<(), Mismatch> {
    match result {
        OutcomeResult::Payload(actual) if actual == expected => Ok(()),
        OutcomeResult::Payload(actual) => Err(Mismatch::Result {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
        OutcomeResult::NoResult => Err(Mismatch::Result {
            expected: expected.to_string(),
            actual: "<no result>".to_owned(),
        }),
        OutcomeResult::Failure(failure) => Err(Mismatch::UnexpectedFailure {
            error: failure.to_string(),
        }),
    }
}

/// Assert the handler declared no return value at all.
pub fn verify_no_result(result: &OutcomeResult) -> Result<(), Mismatch> {
    match result {
        OutcomeResult::NoResult => Ok(()),
        OutcomeResult::Payload(actual) => Err(Mismatch::Result {
            expected: "<no result>".to_owned(),
            actual: actual.to_string(),
        }),
        OutcomeResult::Failure(failure) => Err(Mismatch::UnexpectedFailure {
            error: failure.to_string(),
        }),
    }
}

/// Assert the outcome is not a failure.
pub fn verify_success(result: &OutcomeResult) -> Result<(), Mismatch> {
    match result {
        OutcomeResult::Failure(failure) => Err(Mismatch::UnexpectedFailure {
            error: failure.to_string(),
        }),
        _ => Ok(()),
    }
}
