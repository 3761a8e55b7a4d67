#[cfg(test)]
#[path = "azure_agents_test.rs"]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Method;
use reqwest::RequestBuilder;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
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

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ThreadResponse {
    id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TextContent {
    value: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ImageFileContent {
    file_id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ContentResponse {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<TextContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_file: Option<ImageFileContent>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageResponse {
    id: String,
    role: String,
    #[serde(default)]
    content: Vec<ContentResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageListResponse {
    data: Vec<MessageResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RunRequest {
    assistant_id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RunErrorResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RunResponse {
    id: String,
    thread_id: String,
    status: String,
    #[serde(default)]
    last_error: Option<RunErrorResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct FileResponse {
    id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

fn role_to_wire(role: Role) -> &'static str {
    match role {
        Role::User => return "user",
        Role::Agent => return "assistant",
    }
}

fn role_from_wire(role: &str) -> Role {
    if role == "user" {
        return Role::User;
    }

    return Role::Agent;
}

fn status_from_wire(status: &str) -> RunStatus {
    match status {
        "queued" => return RunStatus::Queued,
        "in_progress" | "requires_action" | "cancelling" => return RunStatus::InProgress,
        "completed" => return RunStatus::Completed,
        "failed" => return RunStatus::Failed,
        "cancelled" => return RunStatus::Cancelled,
        "expired" => return RunStatus::Expired,
        _ => {
            tracing::warn!(status, "Unknown run status, treating it as in progress");
            return RunStatus::InProgress;
        }
    }
}

impl From<RunResponse> for Run {
    fn from(res: RunResponse) -> Run {
        return Run {
            status: status_from_wire(&res.status),
            error: res.last_error.and_then(|err| return err.message.or(err.code)),
            id: res.id,
            session_id: res.thread_id,
        };
    }
}

impl From<MessageResponse> for Message {
    fn from(res: MessageResponse) -> Message {
        let content = res
            .content
            .into_iter()
            .filter_map(|part| {
                if let Some(text) = part.text {
                    return Some(ContentPart::Text(text.value));
                }
                if let Some(image) = part.image_file {
                    return Some(ContentPart::ImageReference(image.file_id));
                }

                tracing::debug!(content_type = %part._type, "Skipping unsupported content part");
                return None;
            })
            .collect();

        return Message {
            id: res.id,
            role: role_from_wire(&res.role),
            content,
        };
    }
}

/// Maps a failed response onto the error taxonomy.
fn classify(status: StatusCode, context: &str, body: &str) -> AgentError {
    let detail = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(res) if !res.error.message.is_empty() => res.error.message,
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => status.to_string(),
    };
    let msg = format!("{context} ({}): {detail}", status.as_u16());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return AgentError::Auth(msg),
        StatusCode::NOT_FOUND => return AgentError::NotFound(msg),
        StatusCode::PAYLOAD_TOO_LARGE => return AgentError::SizeLimit(msg),
        _ if status.is_client_error() => return AgentError::Validation(msg),
        _ => return AgentError::Connectivity(msg),
    }
}

/// Gateway for Azure AI Foundry agents, talking to a project endpoint's
/// threads, runs and files APIs.
pub struct AzureAgents {
    url: String,
    token: String,
    api_version: String,
    timeout: Duration,
}

impl Default for AzureAgents {
    fn default() -> AzureAgents {
        let timeout = Config::get(ConfigKey::RequestTimeout)
            .parse::<u64>()
            .unwrap_or(30000);

        return AzureAgents {
            url: Config::get(ConfigKey::ProjectEndpoint),
            token: Config::get(ConfigKey::AccessToken),
            api_version: Config::get(ConfigKey::ApiVersion),
            timeout: Duration::from_millis(timeout),
        };
    }
}

impl AzureAgents {
    fn endpoint(&self, path: &str) -> String {
        return format!(
            "{url}/{path}?api-version={version}",
            url = self.url.trim_end_matches('/'),
            version = self.api_version
        );
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        let mut req = reqwest::Client::new()
            .request(method, url)
            .timeout(self.timeout);
        if !self.token.is_empty() {
            req = req.bearer_auth(&self.token);
        }

        return req;
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, context: &str) -> AgentResult<T> {
        let res = req.send().await.map_err(|err| {
            tracing::error!(error = ?err, context, "Agent service is not reachable");
            return AgentError::from(err);
        })?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                context,
                body = %body,
                "Agent service request failed"
            );
            return Err(classify(status, context, &body));
        }

        let body = res.json::<T>().await?;
        return Ok(body);
    }
}

#[async_trait]
impl AgentGateway for AzureAgents {
    #[allow(clippy::implicit_return)]
    async fn create_session(&self) -> AgentResult<Session> {
        let req = self
            .request(Method::POST, self.endpoint("threads"))
            .json(&serde_json::json!({}));
        let res: ThreadResponse = self.send(req, "create thread").await?;

        return Ok(Session::new(&res.id));
    }

    #[allow(clippy::implicit_return)]
    async fn post_message(
        &self,
        session: &Session,
        role: Role,
        content: &str,
    ) -> AgentResult<Message> {
        let body = MessageRequest {
            role: role_to_wire(role).to_string(),
            content: content.to_string(),
        };
        let req = self
            .request(
                Method::POST,
                self.endpoint(&format!("threads/{}/messages", session.id)),
            )
            .json(&body);
        let res: MessageResponse = self.send(req, "post message").await?;

        return Ok(res.into());
    }

    #[allow(clippy::implicit_return)]
    async fn start_run(&self, session: &Session, agent_id: &str) -> AgentResult<Run> {
        let body = RunRequest {
            assistant_id: agent_id.to_string(),
        };
        let req = self
            .request(
                Method::POST,
                self.endpoint(&format!("threads/{}/runs", session.id)),
            )
            .json(&body);
        let res: RunResponse = self.send(req, "start run").await?;

        return Ok(res.into());
    }

    #[allow(clippy::implicit_return)]
    async fn get_run(&self, session: &Session, run_id: &str) -> AgentResult<Run> {
        let req = self.request(
            Method::GET,
            self.endpoint(&format!("threads/{}/runs/{run_id}", session.id)),
        );
        let res: RunResponse = self.send(req, "get run").await?;
        tracing::debug!(body = ?res, "Run response");

        return Ok(res.into());
    }

    #[allow(clippy::implicit_return)]
    async fn cancel_run(&self, session: &Session, run_id: &str) -> AgentResult<Run> {
        let req = self.request(
            Method::POST,
            self.endpoint(&format!("threads/{}/runs/{run_id}/cancel", session.id)),
        );
        let res: RunResponse = self.send(req, "cancel run").await?;

        return Ok(res.into());
    }

    #[allow(clippy::implicit_return)]
    async fn list_messages(&self, session: &Session, order: ListOrder) -> AgentResult<Vec<Message>> {
        let url = format!(
            "{}&order={order}",
            self.endpoint(&format!("threads/{}/messages", session.id))
        );
        let res: MessageListResponse = self
            .send(self.request(Method::GET, url), "list messages")
            .await?;

        return Ok(res.data.into_iter().map(Message::from).collect());
    }

    #[allow(clippy::implicit_return)]
    async fn upload_attachment(&self, bytes: Vec<u8>, file_name: &str) -> AgentResult<String> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        let req = self
            .request(Method::POST, self.endpoint("files"))
            .multipart(form);
        let res: FileResponse = self.send(req, "upload file").await?;

        return Ok(res.id);
    }
}
