//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Raised when a value handed to the domain layer breaks one of its rules.
/// None of these are wire-level errors: the framing protocol itself never
/// fails, it only discards noise.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("System prompt cannot be empty")]
    EmptySystemPrompt,

    #[error("max_tokens must be greater than 0")]
    ZeroMaxTokens,

    #[error("Invalid sampling value for {name}: {value}")]
    InvalidSampling { name: &'static str, value: f32 },
}
