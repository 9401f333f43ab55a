//! Error types for the dilemma workflow

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Workflow phase an error originated from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Precondition checks before any ledger call
    Validate,
    /// Building the unsigned envelope
    Build,
    /// Waiting for the signer
    Sign,
    /// Submitting the signed envelope
    Submit,
    /// Reading the contract's return value
    Decode,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Validate => "validate",
            Phase::Build => "build",
            Phase::Sign => "sign",
            Phase::Submit => "submit",
            Phase::Decode => "decode",
        };
        f.write_str(name)
    }
}

/// Main error type for the game workflow
///
/// Ledger-phase errors (everything but `InvalidInput`) put the session in
/// `Failed`; none of them are retried by the workflow.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Build failed for {operation}: {message}")]
    Build { operation: &'static str, message: String },

    #[error("Signing failed for {operation}: {message}")]
    Sign { operation: &'static str, message: String },

    #[error("Submit failed for {operation}: {message}")]
    Submit { operation: &'static str, message: String },

    #[error("Decode failed for {operation}: {source}")]
    Decode {
        operation: &'static str,
        source: DecodeError,
    },
}

impl WorkflowError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        WorkflowError::InvalidInput { message: message.into() }
    }

    /// Phase the error originated from
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowError::InvalidInput { .. } => Phase::Validate,
            WorkflowError::Build { .. } => Phase::Build,
            WorkflowError::Sign { .. } => Phase::Sign,
            WorkflowError::Submit { .. } => Phase::Submit,
            WorkflowError::Decode { .. } => Phase::Decode,
        }
    }

    /// Ledger operation the error is attached to, if any
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            WorkflowError::InvalidInput { .. } => None,
            WorkflowError::Build { operation, .. }
            | WorkflowError::Sign { operation, .. }
            | WorkflowError::Submit { operation, .. }
            | WorkflowError::Decode { operation, .. } => Some(operation),
        }
    }

    /// Whether the failure happened after the ledger round-trip began.
    /// Such sessions cannot be trusted and must be restarted.
    pub fn requires_restart(&self) -> bool {
        !matches!(self, WorkflowError::InvalidInput { .. })
    }
}

/// Error recorded on a session: the phase plus the verbatim message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionError {
    pub phase: Phase,
    pub message: String,
}

impl From<&WorkflowError> for SessionError {
    fn from(error: &WorkflowError) -> Self {
        Self {
            phase: error.phase(),
            message: error.to_string(),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.phase, self.message)
    }
}

/// A contract return value that matched no known response shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing field `{field}`")]
    MissingField { field: String },

    #[error("field `{field}`: expected {expected}, found {found}")]
    InvalidField {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("field `{field}` is neither a direct nor a boxed value: {found}")]
    UnexpectedShape { field: String, found: String },
}

impl DecodeError {
    /// Field path the decoder was looking at
    pub fn field(&self) -> &str {
        match self {
            DecodeError::MissingField { field }
            | DecodeError::InvalidField { field, .. }
            | DecodeError::UnexpectedShape { field, .. } => field,
        }
    }
}

/// Failure reported by the external ledger client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LedgerError {
    pub message: String,
}

impl LedgerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Failure reported by the signer (rejection, wallet error, ...)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SignerError {
    pub message: String,
}

impl SignerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Advice source failures; always swallowed by the opponent service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdviceError {
    #[error("Advice source unavailable")]
    Unavailable,

    #[error("Advice request failed: {0}")]
    Failed(String),
}

/// Configuration load or validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Configuration error in {field}: {message}")]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases() {
        assert_eq!(WorkflowError::invalid_input("x").phase(), Phase::Validate);
        let err = WorkflowError::Sign { operation: "create_game", message: "User declined".into() };
        assert_eq!(err.phase(), Phase::Sign);
        assert_eq!(err.operation(), Some("create_game"));
        assert!(err.requires_restart());
        assert!(!WorkflowError::invalid_input("x").requires_restart());
    }

    #[test]
    fn test_session_error_keeps_message() {
        let err = WorkflowError::Submit {
            operation: "join_game",
            message: "Transaction submission failed: tx_failed - op_underfunded".into(),
        };
        let recorded = SessionError::from(&err);
        assert_eq!(recorded.phase, Phase::Submit);
        assert!(recorded.message.contains("op_underfunded"));
        assert_eq!(
            recorded.to_string(),
            "[submit] Submit failed for join_game: Transaction submission failed: tx_failed - op_underfunded"
        );
    }

    #[test]
    fn test_decode_error_names_field() {
        let err = WorkflowError::Decode {
            operation: "resolve_game",
            source: DecodeError::MissingField { field: "result.retval[1]".into() },
        };
        assert_eq!(err.to_string(), "Decode failed for resolve_game: missing field `result.retval[1]`");
    }
}
