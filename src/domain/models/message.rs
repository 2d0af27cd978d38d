#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::create_id;
use super::now_millis;
use super::Attachment;
use super::Role;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileText {
    pub name: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_data_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_texts: Vec<FileText>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_file_names: Vec<String>,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Message {
        return Message {
            id: create_id(),
            role,
            content: content.to_string(),
            timestamp: now_millis(),
            image_data_urls: vec![],
            file_texts: vec![],
            other_file_names: vec![],
        };
    }

    /// Builds a user message, folding attachments into inline images,
    /// extracted file texts, or bare file names.
    pub fn user(content: &str, attachments: &[Attachment]) -> Message {
        let mut message = Message::new(Role::User, content);

        for attachment in attachments {
            if let Some(data_url) = &attachment.data_url {
                message.image_data_urls.push(data_url.to_string());
            } else if let Some(text) = &attachment.text_content {
                message.file_texts.push(FileText {
                    name: attachment.name.to_string(),
                    text: text.to_string(),
                });
            } else {
                message.other_file_names.push(attachment.name.to_string());
            }
        }

        return message;
    }

    pub fn append(&mut self, text: &str) {
        self.content += text;
    }

    pub fn has_attachments(&self) -> bool {
        return !self.image_data_urls.is_empty()
            || !self.file_texts.is_empty()
            || !self.other_file_names.is_empty();
    }
}
