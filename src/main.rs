#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::process;

use anyhow::Error;
use anyhow::Result;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use yansi::Paint;

use crate::application::cli;
use crate::application::console;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::AgentError;
use crate::domain::models::DisplayEvent;
use crate::domain::services::events::EventEmitter;
use crate::domain::services::orchestrator::SessionOrchestrator;
use crate::domain::services::run_poller::RunPoller;
use crate::infrastructure::gateways::azure_agents::AzureAgents;

fn handle_error(err: Error) {
    if let Some(agent_err) = err.downcast_ref::<AgentError>() {
        if agent_err == &AgentError::Cancelled {
            eprintln!("\n{}", Paint::yellow("Cancelled."));
        } else {
            eprintln!("\n{}", Paint::red(format!("{agent_err}")));
        }
        process::exit(1);
    }

    eprintln!(
        "{}",
        Paint::red(format!(
            "agentchat has failed with the following app version and error.\n\nVersion: {}\nCommit: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            env!("VERGEN_GIT_DESCRIBE"),
            err
        ))
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

async fn start(token: CancellationToken) -> Result<()> {
    let poller = RunPoller::new(Config::poll_interval()?, Config::run_timeout()?);
    let agent_id = Config::get(ConfigKey::AgentId);

    let (event_tx, event_rx) = mpsc::unbounded_channel::<DisplayEvent>();
    let events = EventEmitter::new(event_tx);
    let renderer = tokio::spawn(console::render_events(event_rx));

    let res: Result<()> = async {
        let mut orchestrator = SessionOrchestrator::start(
            Box::<AzureAgents>::default(),
            &agent_id,
            poller,
            events.clone(),
            &token,
        )
        .await?;

        let input = BufReader::new(tokio::io::stdin());
        return console::run_loop(input, &mut orchestrator, &events, &token).await;
    }
    .await;

    // Closing the last emitter lets the renderer drain and finish.
    drop(events);
    renderer.await??;

    return res;
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let mut _guard = None;
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("agentchat")
    {
        let file_appender = tracing_appender::rolling::never(cli::log_dir(), "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
        _guard = Some(guard);
    }

    let ready = match cli::parse().await {
        Ok(ready) => ready,
        Err(err) => {
            handle_error(err);
            return;
        }
    };
    if !ready {
        process::exit(0);
    }

    if let Err(err) = Config::validate() {
        handle_error(err);
        return;
    }

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling");
            ctrl_c_token.cancel();
        }
    });

    if let Err(err) = start(token).await {
        tracing::error!(error = %err, "Session ended with an error");
        handle_error(err);
        return;
    }

    // Stdin is read on a blocking thread that never returns on its own.
    process::exit(0);
}
