#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use thiserror::Error;

use super::RunStatus;

pub type AgentResult<T> = std::result::Result<T, AgentError>;

/// Every failure the conversation core can surface. Variants map one to one
/// with how the interactive loop reacts to them, see
/// [`AgentError::is_turn_scoped`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// Network failure, or the agent service is unavailable.
    #[error("Unable to reach the agent service: {0}")]
    Connectivity(String),

    /// Credentials were rejected.
    #[error("The agent service rejected the provided credentials: {0}")]
    Auth(String),

    /// Malformed request, or a response that could not be understood.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Unknown agent, session or run.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Attachment is too large: {0}")]
    SizeLimit(String),

    /// The run reached a terminal status other than completed.
    #[error("{message}")]
    RunFailed { status: RunStatus, message: String },

    #[error("Run {run_id} did not finish within {seconds} seconds")]
    RunTimeout { run_id: String, seconds: u64 },

    #[error("Cancelled")]
    Cancelled,
}

impl AgentError {
    /// Errors that only fail the current turn. The session stays usable and
    /// the user may submit another turn right away.
    pub fn is_turn_scoped(&self) -> bool {
        return !matches!(self, AgentError::Auth(_) | AgentError::Cancelled);
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Connectivity(_) => return "connectivity",
            AgentError::Auth(_) => return "auth",
            AgentError::Validation(_) => return "validation",
            AgentError::NotFound(_) => return "not_found",
            AgentError::SizeLimit(_) => return "size_limit",
            AgentError::RunFailed { .. } => return "run_failed",
            AgentError::RunTimeout { .. } => return "run_timeout",
            AgentError::Cancelled => return "cancelled",
        }
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> AgentError {
        if err.is_decode() {
            return AgentError::Validation(format!("Unable to decode response: {err}"));
        }
        if err.is_builder() {
            return AgentError::Validation(err.to_string());
        }

        return AgentError::Connectivity(err.to_string());
    }
}
