pub mod cancellation;
pub mod commands;
pub mod events;
pub mod orchestrator;
pub mod run_poller;
