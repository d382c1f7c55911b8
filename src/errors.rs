//! Structured error types for the planner core.
//!
//! Every fallible boundary in this crate returns one of these variants rather
//! than a bare `String` or `Box<dyn Error>`, so callers can match on error
//! kind and render the [`crate::ScheduleStatus`] reasonability payload
//! without string inspection.

use thiserror::Error;

/// Top-level planner error. See spec section 7 for the policy governing
/// which variants are recovered locally vs. always surfaced.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error("no lodging place found among the supplied places")]
    NoLodging,

    #[error("too many places ({attractions}) for {days} day(s); recommended maximum is 8 per day")]
    CapacityViolation { attractions: usize, days: u32 },

    #[error("internal failure: {0}")]
    InternalFailure(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised while clustering places into day buckets.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("cannot cluster into {0} day buckets: day count must be at least 1")]
    InvalidDayCount(u32),
}

impl From<ClusterError> for PlannerError {
    fn from(err: ClusterError) -> Self {
        PlannerError::InternalFailure(Box::new(err))
    }
}

/// Errors raised by the evaluation harness.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("planner failed for scenario {scenario}: {source}")]
    PlannerFailed {
        scenario: String,
        source: PlannerError,
    },
}
