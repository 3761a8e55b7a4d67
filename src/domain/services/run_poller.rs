#[cfg(test)]
#[path = "run_poller_test.rs"]
mod tests;

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::cancellation;
use super::cancellation::cancellable;
use super::events::EventEmitter;
use crate::domain::models::AgentError;
use crate::domain::models::AgentResult;
use crate::domain::models::DisplayEvent;
use crate::domain::models::GatewayBox;
use crate::domain::models::Run;
use crate::domain::models::RunStatus;
use crate::domain::models::Session;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Drives a single run to a terminal status by reading it at a fixed
/// interval. The cancellation token is checked before every read and raced
/// against every sleep, so cancelling takes effect within one interval.
pub struct RunPoller {
    interval: Duration,
    ceiling: Option<Duration>,
}

impl Default for RunPoller {
    fn default() -> RunPoller {
        return RunPoller::new(DEFAULT_POLL_INTERVAL, None);
    }
}

impl RunPoller {
    /// `ceiling` bounds how long a single run may be polled. `None` polls until
    /// the run ends or the token is cancelled.
    pub fn new(interval: Duration, ceiling: Option<Duration>) -> RunPoller {
        return RunPoller { interval, ceiling };
    }

    /// Resolves to the run once it has `Completed`. Any other terminal status
    /// becomes `AgentError::RunFailed`.
    pub async fn wait_for_terminal(
        &self,
        gateway: &GatewayBox,
        session: &Session,
        run: Run,
        token: &CancellationToken,
        events: &EventEmitter,
    ) -> AgentResult<Run> {
        let deadline = self.ceiling.map(|ceiling| return Instant::now() + ceiling);
        let run = self
            .poll(gateway, session, run, token, events, deadline)
            .await?;

        if run.status == RunStatus::Completed {
            return Ok(run);
        }

        tracing::warn!(
            run_id = %run.id,
            status = %run.status,
            error = ?run.error,
            "Run ended without completing"
        );

        return Err(AgentError::RunFailed {
            status: run.status,
            message: run.failure_message(),
        });
    }

    /// Polls without a ceiling and returns whatever terminal status the run
    /// settles on.
    pub async fn settle(
        &self,
        gateway: &GatewayBox,
        session: &Session,
        run: Run,
        token: &CancellationToken,
        events: &EventEmitter,
    ) -> AgentResult<Run> {
        return self.poll(gateway, session, run, token, events, None).await;
    }

    async fn poll(
        &self,
        gateway: &GatewayBox,
        session: &Session,
        run: Run,
        token: &CancellationToken,
        events: &EventEmitter,
        deadline: Option<Instant>,
    ) -> AgentResult<Run> {
        let mut current = run;
        if current.status.is_terminal() {
            return Ok(current);
        }

        loop {
            if token.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Err(self.timeout(&current));
                }
            }

            let fetched = cancellable(token, gateway.get_run(session, &current.id)).await?;
            if fetched.status.rank() < current.status.rank() {
                tracing::warn!(
                    run_id = %current.id,
                    observed = %fetched.status,
                    current = %current.status,
                    "Ignoring run status that moved backwards"
                );
            } else {
                current = fetched;
            }

            tracing::debug!(run_id = %current.id, status = %current.status, "Polled run");
            events.emit(DisplayEvent::ProgressTick(current.status));

            if current.status.is_terminal() {
                return Ok(current);
            }

            let mut wait = self.interval;
            if let Some(deadline) = deadline {
                wait = wait.min(deadline.saturating_duration_since(Instant::now()));
            }
            cancellation::sleep(token, wait).await?;
        }
    }

    fn timeout(&self, run: &Run) -> AgentError {
        let seconds = self
            .ceiling
            .map(|ceiling| return ceiling.as_secs())
            .unwrap_or_default();

        tracing::warn!(run_id = %run.id, seconds, "Run exceeded polling ceiling");

        return AgentError::RunTimeout {
            run_id: run.id.to_string(),
            seconds,
        };
    }
}
