use rolegate_core::AppError;
use rolegate_domain::PolicyViolation;
use thiserror::Error;

/// Failure of a lifecycle transition attempt.
///
/// Policy violations block the transition with no partial state change and
/// are never retried automatically; application errors cover everything else
/// (missing entities, illegal state, persistence failures) and likewise leave
/// prior state untouched.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// A policy constraint rejected the transition.
    #[error(transparent)]
    Policy(#[from] PolicyViolation),

    /// The transition aborted on an application or persistence failure.
    #[error(transparent)]
    App(#[from] AppError),
}

/// Result type for lifecycle transitions.
pub type TransitionResult<T> = Result<T, TransitionError>;
