#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;

use tokio_util::sync::CancellationToken;

use super::cancellation::cancellable;
use super::events::EventEmitter;
use super::run_poller::RunPoller;
use crate::domain::models::AgentError;
use crate::domain::models::AgentResult;
use crate::domain::models::Attachment;
use crate::domain::models::ContentPart;
use crate::domain::models::DisplayEvent;
use crate::domain::models::GatewayBox;
use crate::domain::models::ListOrder;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::Run;
use crate::domain::models::Session;

/// Owns the single live session and runs turns against it one at a time.
/// A run that was never seen reaching a terminal status is kept as pending
/// and settled before the next turn posts anything, so runs never overlap.
pub struct SessionOrchestrator {
    gateway: GatewayBox,
    session: Session,
    agent_id: String,
    poller: RunPoller,
    events: EventEmitter,
    pending_run: Option<Run>,
}

impl SessionOrchestrator {
    pub fn new(
        gateway: GatewayBox,
        session: Session,
        agent_id: &str,
        poller: RunPoller,
        events: EventEmitter,
    ) -> SessionOrchestrator {
        return SessionOrchestrator {
            gateway,
            session,
            agent_id: agent_id.to_string(),
            poller,
            events,
            pending_run: None,
        };
    }

    /// Creates the remote session and wraps it. Failing here is fatal for the
    /// caller, there is nothing to fall back to.
    pub async fn start(
        gateway: GatewayBox,
        agent_id: &str,
        poller: RunPoller,
        events: EventEmitter,
        token: &CancellationToken,
    ) -> AgentResult<SessionOrchestrator> {
        let session = cancellable(token, gateway.create_session()).await?;
        tracing::info!(session_id = %session.id, agent_id, "Session created");
        events.emit(DisplayEvent::SessionStarted(session.id.to_string()));

        return Ok(SessionOrchestrator::new(
            gateway, session, agent_id, poller, events,
        ));
    }

    pub fn session(&self) -> &Session {
        return &self.session;
    }

    /// Runs one turn end to end and returns the agent's reply, if the service
    /// recorded one. The user message is kept even when later steps fail.
    pub async fn submit_turn(
        &mut self,
        content: &str,
        token: &CancellationToken,
    ) -> AgentResult<Option<Message>> {
        self.settle_pending(token).await?;

        let posted = cancellable(
            token,
            self.gateway.post_message(&self.session, Role::User, content),
        )
        .await?;
        tracing::debug!(message_id = %posted.id, "Posted user message");

        let run = cancellable(
            token,
            self.gateway.start_run(&self.session, &self.agent_id),
        )
        .await?;
        tracing::debug!(run_id = %run.id, status = %run.status, "Started run");
        self.pending_run = Some(run.clone());

        let res = self
            .poller
            .wait_for_terminal(&self.gateway, &self.session, run.clone(), token, &self.events)
            .await;

        match &res {
            Ok(_) | Err(AgentError::RunFailed { .. }) => {
                self.pending_run = None;
            }
            Err(AgentError::RunTimeout { .. }) => {
                self.abandon_run(&run.id, token).await?;
            }
            Err(_) => {}
        }
        let _completed = res?;

        let messages = cancellable(
            token,
            self.gateway
                .list_messages(&self.session, ListOrder::Descending),
        )
        .await?;

        let reply = latest_agent_reply(messages, &posted.id);
        match &reply {
            Some(message) => {
                tracing::info!(
                    run_id = %run.id,
                    message_id = %message.id,
                    text_len = message.text().len(),
                    images = message.image_references().len(),
                    "Agent replied"
                );
            }
            None => {
                tracing::warn!(
                    session_id = %self.session.id,
                    run_id = %run.id,
                    "Run completed without an agent message"
                );
            }
        }

        return Ok(reply);
    }

    /// Chat turn as seen by the interactive loop. Turn scoped failures are
    /// reported as display events and swallowed, everything else propagates.
    pub async fn chat(&mut self, text: &str, token: &CancellationToken) -> AgentResult<()> {
        self.events.emit(DisplayEvent::TurnStarted());

        match self.submit_turn(text, token).await {
            Ok(Some(message)) => {
                for part in message.content {
                    match part {
                        ContentPart::Text(text) => {
                            self.events.emit(DisplayEvent::AgentReplyText(text));
                        }
                        ContentPart::ImageReference(file_id) => {
                            self.events.emit(DisplayEvent::AgentReplyImageRef(file_id));
                        }
                    }
                }
            }
            Ok(None) => {
                self.events.emit(DisplayEvent::TurnFailed(
                    "The agent finished without replying.".to_string(),
                ));
            }
            Err(err) => {
                self.report(err)?;
            }
        }

        return Ok(());
    }

    /// Uploads a local file and announces it to the agent through a regular
    /// chat turn.
    pub async fn upload(&mut self, path: &str, token: &CancellationToken) -> AgentResult<()> {
        let (mut attachment, bytes) = match Attachment::read(path).await {
            Ok(res) => res,
            Err(err) => {
                return self.report(err);
            }
        };

        let upload = cancellable(
            token,
            self.gateway
                .upload_attachment(bytes, &attachment.file_name),
        )
        .await;
        let file_id = match upload {
            Ok(file_id) => file_id,
            Err(err) => {
                return self.report(err);
            }
        };

        tracing::info!(
            local_path = %attachment.local_path.display(),
            file_name = %attachment.file_name,
            byte_size = attachment.byte_size,
            file_id = %file_id,
            "Uploaded attachment"
        );
        self.events.emit(DisplayEvent::AttachmentUploaded {
            file_name: attachment.file_name.to_string(),
            byte_size: attachment.byte_size,
            file_id: file_id.to_string(),
        });
        attachment.remote_file_id = Some(file_id);

        return self.chat(&attachment.notice(), token).await;
    }

    /// Requests cancellation of a run that outlived the polling ceiling, then
    /// waits for it to settle. When either step fails the run stays pending
    /// and the next turn settles it first.
    async fn abandon_run(&mut self, run_id: &str, token: &CancellationToken) -> AgentResult<()> {
        match cancellable(token, self.gateway.cancel_run(&self.session, run_id)).await {
            Ok(run) => {
                self.pending_run = Some(run);
            }
            Err(AgentError::Cancelled) => return Err(AgentError::Cancelled),
            Err(err) => {
                tracing::error!(run_id, error = ?err, "Failed to cancel run");
            }
        }

        match self.settle_pending(token).await {
            Ok(()) => return Ok(()),
            Err(AgentError::Cancelled) => return Err(AgentError::Cancelled),
            Err(err) => {
                tracing::error!(run_id, error = ?err, "Abandoned run did not settle");
                return Ok(());
            }
        }
    }

    /// Polls the pending run, if any, until it is terminal. On failure the run
    /// stays pending.
    async fn settle_pending(&mut self, token: &CancellationToken) -> AgentResult<()> {
        let run = match self.pending_run.take() {
            Some(run) => run,
            None => return Ok(()),
        };
        tracing::debug!(run_id = %run.id, status = %run.status, "Settling pending run");

        let res = self
            .poller
            .settle(&self.gateway, &self.session, run.clone(), token, &self.events)
            .await;
        match res {
            Ok(settled) => {
                tracing::info!(run_id = %settled.id, status = %settled.status, "Pending run settled");
                return Ok(());
            }
            Err(err) => {
                self.pending_run = Some(run);
                return Err(err);
            }
        }
    }

    fn report(&self, err: AgentError) -> AgentResult<()> {
        if !err.is_turn_scoped() {
            return Err(err);
        }

        tracing::error!(
            session_id = %self.session.id,
            kind = err.kind(),
            error = %err,
            "Turn failed"
        );
        self.events.emit(DisplayEvent::TurnFailed(err.to_string()));

        return Ok(());
    }
}

/// Newest agent message recorded after `user_message_id`, given messages in
/// descending order.
fn latest_agent_reply(messages: Vec<Message>, user_message_id: &str) -> Option<Message> {
    for message in messages {
        if message.id == user_message_id {
            return None;
        }
        if message.role == Role::Agent {
            return Some(message);
        }
    }

    return None;
}
