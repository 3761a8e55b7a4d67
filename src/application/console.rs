#[cfg(test)]
#[path = "console_test.rs"]
mod tests;

use anyhow::Result;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use yansi::Paint;

use crate::domain::models::AgentError;
use crate::domain::models::DisplayEvent;
use crate::domain::services::commands::CommandService;
use crate::domain::services::commands::Flow;
use crate::domain::services::events::EventEmitter;
use crate::domain::services::orchestrator::SessionOrchestrator;

/// Turns display events into terminal output. Progress ticks are drawn as
/// dots on the "thinking" line, which gets closed by whatever comes next.
#[derive(Default)]
pub struct Renderer {
    ticking: bool,
}

impl Renderer {
    fn end_ticks(&mut self) -> &'static str {
        if self.ticking {
            self.ticking = false;
            return "\n";
        }

        return "";
    }

    pub fn render(&mut self, event: &DisplayEvent) -> String {
        match event {
            DisplayEvent::SessionStarted(session_id) => {
                return format!(
                    "Connected to session {session_id}.\nType a message, 'upload <path>' to share a file, or 'quit' to leave.\n"
                );
            }
            DisplayEvent::TurnStarted() => {
                let prefix = self.end_ticks();
                self.ticking = true;
                return format!("{prefix}{}", Paint::new("Agent is thinking").dimmed());
            }
            DisplayEvent::ProgressTick(_) => {
                if !self.ticking {
                    return "".to_string();
                }
                return Paint::new(".").dimmed().to_string();
            }
            DisplayEvent::AgentReplyText(text) => {
                return format!(
                    "{}{} {text}\n",
                    self.end_ticks(),
                    Paint::cyan("Agent:").bold()
                );
            }
            DisplayEvent::AgentReplyImageRef(file_id) => {
                return format!(
                    "{}{} [image {file_id}]\n",
                    self.end_ticks(),
                    Paint::cyan("Agent:").bold()
                );
            }
            DisplayEvent::AttachmentUploaded {
                file_name,
                byte_size,
                file_id,
            } => {
                return format!(
                    "{}Uploaded {file_name} ({byte_size} bytes) as {file_id}.\n",
                    self.end_ticks()
                );
            }
            DisplayEvent::TurnFailed(message) => {
                return format!(
                    "{}{}\n",
                    self.end_ticks(),
                    Paint::red(format!("Error: {message}"))
                );
            }
            DisplayEvent::AwaitingInput() => {
                return format!("{}{} ", self.end_ticks(), Paint::green(">").bold());
            }
        }
    }
}

/// Owns stdout for the lifetime of the session. Finishes once every
/// [`EventEmitter`] has been dropped.
pub async fn render_events(mut rx: mpsc::UnboundedReceiver<DisplayEvent>) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut renderer = Renderer::default();

    while let Some(event) = rx.recv().await {
        let out = renderer.render(&event);
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    return Ok(());
}

/// Reads one line at a time and hands it to the command service until the
/// user quits or input ends. The prompt is sent through the event channel so
/// it always lands after the previous turn's output.
pub async fn run_loop<R: AsyncBufRead + Unpin>(
    input: R,
    orchestrator: &mut SessionOrchestrator,
    events: &EventEmitter,
    token: &CancellationToken,
) -> Result<()> {
    let mut lines = input.lines();

    loop {
        events.emit(DisplayEvent::AwaitingInput());

        let line = tokio::select! {
            biased;
            _ = token.cancelled() => {
                return Err(AgentError::Cancelled.into());
            }
            line = lines.next_line() => line?
        };

        let line = match line {
            Some(line) => line,
            None => {
                tracing::info!("Input closed, ending session");
                return Ok(());
            }
        };

        if CommandService::dispatch(&line, orchestrator, token).await? == Flow::Quit {
            tracing::info!(session_id = %orchestrator.session().id, "Quit requested");
            return Ok(());
        }
    }
}
