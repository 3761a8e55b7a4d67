#[cfg(test)]
#[path = "cancellation_test.rs"]
mod tests;

use std::future::Future;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::domain::models::AgentError;
use crate::domain::models::AgentResult;

/// Races `fut` against `token`. A cancelled token wins even when both are
/// ready, and the dropped future never resumes.
pub async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> AgentResult<T>
where
    F: Future<Output = AgentResult<T>>,
{
    if token.is_cancelled() {
        return Err(AgentError::Cancelled);
    }

    let res = tokio::select! {
        biased;
        _ = token.cancelled() => Err(AgentError::Cancelled),
        res = fut => res,
    };

    return res;
}

/// Sleeps for `duration` unless `token` is cancelled first.
pub async fn sleep(token: &CancellationToken, duration: Duration) -> AgentResult<()> {
    return cancellable(token, async {
        time::sleep(duration).await;
        return Ok(());
    })
    .await;
}
