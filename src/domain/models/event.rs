use super::RunStatus;

/// Structured display events emitted by the conversation core. The console
/// renderer owns all formatting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayEvent {
    SessionStarted(String),
    TurnStarted(),
    ProgressTick(RunStatus),
    AgentReplyText(String),
    AgentReplyImageRef(String),
    AttachmentUploaded {
        file_name: String,
        byte_size: u64,
        file_id: String,
    },
    TurnFailed(String),
    AwaitingInput(),
}
