use async_trait::async_trait;

use super::AgentResult;
use super::ListOrder;
use super::Message;
use super::Role;
use super::Run;
use super::Session;

/// The primitives exposed by a remote agent service. Implementations hold no
/// conversation state and never retry, callers decide what to do on failure.
///
/// Calls are not cancellation aware themselves. Callers race them against a
/// cancellation token, see `domain::services::cancellation::cancellable`.
#[async_trait]
pub trait AgentGateway {
    /// Creates the conversation all following turns are recorded in.
    async fn create_session(&self) -> AgentResult<Session>;

    /// Appends a message to the session.
    async fn post_message(&self, session: &Session, role: Role, content: &str)
        -> AgentResult<Message>;

    /// Asks the agent to process the session's pending messages.
    async fn start_run(&self, session: &Session, agent_id: &str) -> AgentResult<Run>;

    async fn get_run(&self, session: &Session, run_id: &str) -> AgentResult<Run>;

    /// Requests cancellation of a run. The run settles asynchronously, poll it
    /// with `get_run` to observe the terminal status.
    async fn cancel_run(&self, session: &Session, run_id: &str) -> AgentResult<Run>;

    async fn list_messages(&self, session: &Session, order: ListOrder)
        -> AgentResult<Vec<Message>>;

    /// Uploads a file for agent use and returns its remote id.
    async fn upload_attachment(&self, bytes: Vec<u8>, file_name: &str) -> AgentResult<String>;
}

pub type GatewayBox = Box<dyn AgentGateway + Send + Sync>;
