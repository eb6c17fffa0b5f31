use thiserror::Error;

/// Malformed input to the mastery engine.
///
/// These are rejected instead of clamped: a clamped count would let the stored
/// mastery drift away from a replay of the attempt log without anyone noticing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeCount { field: &'static str, value: i64 },

    #[error("correct count {correct} exceeds attempts count {attempts}")]
    CorrectExceedsAttempts { attempts: i64, correct: i64 },

    #[error("attempts count {attempts} cannot take another attempt")]
    AttemptsOverflow { attempts: i64 },
}

/// A referenced record does not exist. Carried inside `anyhow::Error` by the
/// store so the HTTP layer can map it to 404.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} not found: {id}")]
pub struct NotFound {
    pub kind: &'static str,
    pub id: String,
}

impl NotFound {
    pub fn new(kind: &'static str, id: impl Into<String>) -> Self {
        Self { kind, id: id.into() }
    }
}
