use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::models::AgentError;
use crate::domain::models::AgentGateway;
use crate::domain::models::AgentResult;
use crate::domain::models::ContentPart;
use crate::domain::models::ListOrder;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::Run;
use crate::domain::models::RunStatus;
use crate::domain::models::Session;

struct ScriptedRun {
    run: Run,
    statuses: VecDeque<(RunStatus, Option<String>)>,
    reply: Option<Vec<ContentPart>>,
}

#[derive(Default)]
struct State {
    next_id: usize,
    messages: Vec<Message>,
    runs: HashMap<String, ScriptedRun>,
    run_scripts: VecDeque<Vec<(RunStatus, Option<String>)>>,
    replies: VecDeque<Option<Vec<ContentPart>>>,
    failures: HashMap<String, VecDeque<AgentError>>,
    calls: Vec<String>,
    uploads: Vec<(String, usize)>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        return format!("{prefix}_{}", self.next_id);
    }

    fn record(&mut self, call: &str) -> AgentResult<()> {
        self.calls.push(call.to_string());
        if let Some(errors) = self.failures.get_mut(call) {
            if let Some(err) = errors.pop_front() {
                return Err(err);
            }
        }

        return Ok(());
    }
}

/// In-memory agent service for tests. Runs follow scripted status sequences
/// and append scripted replies once they complete.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    state: Arc<Mutex<State>>,
}

impl ScriptedGateway {
    /// Statuses returned by successive `get_run` calls of the next started
    /// run. The last status repeats once the script runs out.
    pub fn push_run(&self, statuses: Vec<RunStatus>) {
        let script = statuses
            .into_iter()
            .map(|status| return (status, None))
            .collect();
        self.state.lock().unwrap().run_scripts.push_back(script);
    }

    /// Like `push_run`, then ends in `status` with `error` as the failure
    /// reason.
    pub fn push_failed_run(&self, statuses: Vec<RunStatus>, status: RunStatus, error: &str) {
        let mut script: Vec<(RunStatus, Option<String>)> = statuses
            .into_iter()
            .map(|status| return (status, None))
            .collect();
        script.push((status, Some(error.to_string())));
        self.state.lock().unwrap().run_scripts.push_back(script);
    }

    /// Agent reply appended when the next started run completes.
    pub fn push_reply(&self, text: &str) {
        self.push_reply_parts(vec![ContentPart::Text(text.to_string())]);
    }

    pub fn push_reply_parts(&self, parts: Vec<ContentPart>) {
        self.state.lock().unwrap().replies.push_back(Some(parts));
    }

    /// The next started run completes without appending an agent message.
    pub fn push_no_reply(&self) {
        self.state.lock().unwrap().replies.push_back(None);
    }

    /// Fails the next call of `call` with `err`.
    pub fn fail_next(&self, call: &str, err: AgentError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(call.to_string())
            .or_default()
            .push_back(err);
    }

    pub fn calls(&self) -> Vec<String> {
        return self.state.lock().unwrap().calls.clone();
    }

    pub fn count(&self, call: &str) -> usize {
        return self
            .state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|e| return e.as_str() == call)
            .count();
    }

    /// Messages in the order they were recorded.
    pub fn messages(&self) -> Vec<Message> {
        return self.state.lock().unwrap().messages.clone();
    }

    pub fn uploads(&self) -> Vec<(String, usize)> {
        return self.state.lock().unwrap().uploads.clone();
    }
}

#[async_trait]
impl AgentGateway for ScriptedGateway {
    #[allow(clippy::implicit_return)]
    async fn create_session(&self) -> AgentResult<Session> {
        let mut state = self.state.lock().unwrap();
        state.record("create_session")?;
        let id = state.next_id("thread");

        return Ok(Session::new(&id));
    }

    #[allow(clippy::implicit_return)]
    async fn post_message(
        &self,
        _session: &Session,
        role: Role,
        content: &str,
    ) -> AgentResult<Message> {
        let mut state = self.state.lock().unwrap();
        state.record("post_message")?;
        let id = state.next_id("msg");
        let message = Message::new(&id, role, vec![ContentPart::Text(content.to_string())]);
        state.messages.push(message.clone());

        return Ok(message);
    }

    #[allow(clippy::implicit_return)]
    async fn start_run(&self, session: &Session, _agent_id: &str) -> AgentResult<Run> {
        let mut state = self.state.lock().unwrap();
        state.record("start_run")?;
        let id = state.next_id("run");
        let statuses = state
            .run_scripts
            .pop_front()
            .unwrap_or_else(|| return vec![(RunStatus::Completed, None)]);
        let reply = state.replies.pop_front().unwrap_or_default();

        let run = Run::new(&id, &session.id, RunStatus::Queued);
        state.runs.insert(
            id,
            ScriptedRun {
                run: run.clone(),
                statuses: statuses.into(),
                reply,
            },
        );

        return Ok(run);
    }

    #[allow(clippy::implicit_return)]
    async fn get_run(&self, _session: &Session, run_id: &str) -> AgentResult<Run> {
        let mut state = self.state.lock().unwrap();
        state.record("get_run")?;
        let next_id = state.next_id("msg");

        let scripted = match state.runs.get_mut(run_id) {
            Some(scripted) => scripted,
            None => return Err(AgentError::NotFound(format!("run {run_id}"))),
        };

        let (status, error) = if scripted.statuses.len() > 1 {
            scripted.statuses.pop_front().unwrap()
        } else {
            scripted
                .statuses
                .front()
                .cloned()
                .unwrap_or((RunStatus::Completed, None))
        };
        scripted.run.status = status;
        scripted.run.error = error;

        let run = scripted.run.clone();
        let mut reply = None;
        if status == RunStatus::Completed {
            reply = scripted.reply.take();
        }

        if let Some(parts) = reply {
            state.messages.push(Message::new(&next_id, Role::Agent, parts));
        }

        return Ok(run);
    }

    #[allow(clippy::implicit_return)]
    async fn cancel_run(&self, _session: &Session, run_id: &str) -> AgentResult<Run> {
        let mut state = self.state.lock().unwrap();
        state.record("cancel_run")?;

        let scripted = match state.runs.get_mut(run_id) {
            Some(scripted) => scripted,
            None => return Err(AgentError::NotFound(format!("run {run_id}"))),
        };
        scripted.statuses = VecDeque::from(vec![(RunStatus::Cancelled, None)]);
        scripted.reply = None;

        return Ok(scripted.run.clone());
    }

    #[allow(clippy::implicit_return)]
    async fn list_messages(&self, _session: &Session, order: ListOrder) -> AgentResult<Vec<Message>> {
        let mut state = self.state.lock().unwrap();
        state.record("list_messages")?;

        let mut messages = state.messages.clone();
        if order == ListOrder::Descending {
            messages.reverse();
        }

        return Ok(messages);
    }

    #[allow(clippy::implicit_return)]
    async fn upload_attachment(&self, bytes: Vec<u8>, file_name: &str) -> AgentResult<String> {
        let mut state = self.state.lock().unwrap();
        state.record("upload_attachment")?;
        state.uploads.push((file_name.to_string(), bytes.len()));

        return Ok(state.next_id("assistant-file"));
    }
}
