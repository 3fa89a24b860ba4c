//! Error types for agent commands and data loading.

use thiserror::Error;

use super::components::AgentId;

/// Errors returned by registry commands.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AiError {
    /// The command named an agent that is not (or no longer) registered.
    #[error("No agent with id {0}")]
    UnknownAgent(AgentId),
}

/// Errors that can occur when loading archetype or tuning data.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// File could not be found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// File could not be read.
    #[error("Failed to read file '{path}': {details}")]
    ReadError { path: String, details: String },

    /// RON parsing failed.
    #[error("Parse error in '{path}': {details}")]
    ParseError { path: String, details: String },

    /// File name does not match any archetype.
    #[error("Unknown archetype '{0}'")]
    UnknownArchetype(String),

    /// A value parsed fine but is out of range.
    #[error("Invalid '{field}' in {context}: {reason}")]
    InvalidValue {
        context: String,
        field: &'static str,
        reason: String,
    },
}
