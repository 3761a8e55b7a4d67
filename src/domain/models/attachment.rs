#[cfg(test)]
#[path = "attachment_test.rs"]
mod tests;

use std::path;

use tokio::fs;

use super::AgentError;
use super::AgentResult;

/// A local file shared with the agent. It never shows up as its own entity in
/// the conversation, it is folded into the next user message as a notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    pub local_path: path::PathBuf,
    pub file_name: String,
    pub byte_size: u64,
    pub remote_file_id: Option<String>,
}

impl Attachment {
    /// Reads the file at `path`, rejecting anything that is missing, not a
    /// regular file, or empty. No remote call is made.
    pub async fn read(path: &str) -> AgentResult<(Attachment, Vec<u8>)> {
        let local_path = path::PathBuf::from(path);
        let metadata = match fs::metadata(&local_path).await {
            Ok(metadata) => metadata,
            Err(_) => {
                return Err(AgentError::Validation(format!("No file found at {path}")));
            }
        };

        if !metadata.is_file() {
            return Err(AgentError::Validation(format!("{path} is not a file")));
        }
        if metadata.len() == 0 {
            return Err(AgentError::Validation(format!("{path} is empty")));
        }

        let bytes = fs::read(&local_path)
            .await
            .map_err(|err| return AgentError::Validation(format!("Unable to read {path}: {err}")))?;

        let file_name = local_path
            .file_name()
            .map(|name| return name.to_string_lossy().to_string())
            .unwrap_or_else(|| return path.to_string());

        let attachment = Attachment {
            local_path,
            file_name,
            byte_size: bytes.len() as u64,
            remote_file_id: None,
        };

        return Ok((attachment, bytes));
    }

    /// User content announcing the upload to the agent.
    pub fn notice(&self) -> String {
        let mut text = format!(
            "I've uploaded a file named '{}' ({} bytes).",
            self.file_name, self.byte_size
        );
        if let Some(file_id) = &self.remote_file_id {
            text += &format!(" Its file id is {file_id}.");
        }
        text += " Please take it into account when answering my next questions.";

        return text;
    }
}
