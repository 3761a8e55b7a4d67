#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;

use tokio_util::sync::CancellationToken;

use super::orchestrator::SessionOrchestrator;
use crate::domain::models::AgentResult;
use crate::domain::models::Command;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct CommandService {}

impl CommandService {
    /// Classifies `line` and routes it to the orchestrator. Only errors that
    /// should end the interactive loop are returned.
    pub async fn dispatch(
        line: &str,
        orchestrator: &mut SessionOrchestrator,
        token: &CancellationToken,
    ) -> AgentResult<Flow> {
        match Command::parse(line) {
            Command::Quit => {
                return Ok(Flow::Quit);
            }
            Command::Noop => {}
            Command::Upload(path) => {
                tracing::debug!(path = %path, "Upload requested");
                orchestrator.upload(&path, token).await?;
            }
            Command::Chat(text) => {
                orchestrator.chat(&text, token).await?;
            }
        }

        return Ok(Flow::Continue);
    }
}
