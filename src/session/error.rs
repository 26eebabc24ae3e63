//! Error types for the session controller.

use thiserror::Error;

use super::Phase;

/// Errors returned by [`super::SessionController`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Routine has no exercises.
    #[error("routine has no exercises")]
    EmptyRoutine,

    /// An exercise asks for zero sets.
    #[error("exercise '{0}' has no target sets")]
    ZeroTargetSets(String),

    /// `start` called twice.
    #[error("session already started")]
    AlreadyStarted,

    /// Set action outside the exercising phase.
    #[error("not exercising (phase: {0:?})")]
    NotExercising(Phase),

    /// Rest action outside the resting phase.
    #[error("not resting (phase: {0:?})")]
    NotResting(Phase),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
