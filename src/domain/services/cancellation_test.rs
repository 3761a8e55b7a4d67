use std::future;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::cancellable;
use super::sleep;
use crate::domain::models::AgentError;
use crate::domain::models::AgentResult;

#[tokio::test]
async fn it_returns_the_future_result() {
    let token = CancellationToken::new();
    let res = cancellable(&token, async {
        return Ok::<_, AgentError>(42);
    })
    .await;

    assert_eq!(res, Ok(42));
}

#[tokio::test]
async fn it_skips_the_future_once_cancelled() {
    let token = CancellationToken::new();
    token.cancel();

    let polled = AtomicBool::new(false);
    let res = cancellable(&token, async {
        polled.store(true, Ordering::SeqCst);
        return Ok::<(), AgentError>(());
    })
    .await;

    assert_eq!(res, Err(AgentError::Cancelled));
    assert!(!polled.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn it_aborts_a_pending_future() {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        child.cancel();
    });

    let res: AgentResult<()> = cancellable(&token, future::pending()).await;
    assert_eq!(res, Err(AgentError::Cancelled));
}

#[tokio::test(start_paused = true)]
async fn it_cuts_sleep_short() {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        child.cancel();
    });

    let started = Instant::now();
    let res = sleep(&token, Duration::from_secs(10)).await;

    assert_eq!(res, Err(AgentError::Cancelled));
    assert!(started.elapsed() < Duration::from_millis(500));
}
