#[cfg(test)]
#[path = "run_test.rs"]
mod tests;

use strum::EnumIter;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        return matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        );
    }

    /// Position in the run lifecycle. Statuses only ever move to an equal or
    /// higher rank.
    pub fn rank(&self) -> u8 {
        match self {
            RunStatus::Queued => return 0,
            RunStatus::InProgress => return 1,
            _ => return 2,
        }
    }
}

/// A server side unit of work processing one turn's user message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub id: String,
    pub session_id: String,
    pub status: RunStatus,
    pub error: Option<String>,
}

impl Run {
    pub fn new(id: &str, session_id: &str, status: RunStatus) -> Run {
        return Run {
            id: id.to_string(),
            session_id: session_id.to_string(),
            status,
            error: None,
        };
    }

    /// Reason reported when a run ends in anything but `Completed`. Falls back
    /// to describing the status when the service gave no reason.
    pub fn failure_message(&self) -> String {
        if let Some(err) = &self.error {
            if !err.trim().is_empty() {
                return err.to_string();
            }
        }

        return format!("Run {} ended with status {}", self.id, self.status);
    }
}
