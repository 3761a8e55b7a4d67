#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use super::Role;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    ImageReference(String),
}

/// A message as recorded by the agent service. Messages are never edited
/// locally, new ones only arrive through new turns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl Message {
    pub fn new(id: &str, role: Role, content: Vec<ContentPart>) -> Message {
        return Message {
            id: id.to_string(),
            role,
            content,
        };
    }

    /// All text parts joined by newlines. Image references are left out.
    pub fn text(&self) -> String {
        return self
            .content
            .iter()
            .filter_map(|part| {
                if let ContentPart::Text(text) = part {
                    return Some(text.as_str());
                }
                return None;
            })
            .collect::<Vec<&str>>()
            .join("\n");
    }

    pub fn image_references(&self) -> Vec<String> {
        return self
            .content
            .iter()
            .filter_map(|part| {
                if let ContentPart::ImageReference(file_id) = part {
                    return Some(file_id.to_string());
                }
                return None;
            })
            .collect();
    }
}
