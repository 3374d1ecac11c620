//! Configuration errors and internal failure types.

use thiserror::Error;

/// Invalid gate configuration, reported when the gate is built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateConfigError {
    #[error("Invalid status code: {0} (expected 100..=999)")]
    InvalidStatus(u16),

    #[error("error_json must be a JSON object, got {0}")]
    ErrorJsonNotObject(&'static str),

    #[error("error_message must not be empty")]
    EmptyErrorMessage,

    #[error("Default message must not be empty")]
    EmptyDefaultMessage,
}

/// A predicate panicked while being evaluated.
#[derive(Debug, Error)]
#[error("{0}")]
pub(crate) struct PredicatePanic(pub(crate) String);
