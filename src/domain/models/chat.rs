#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::create_id;
use super::now_millis;
use super::Message;
use super::Role;

pub const TITLE_PLACEHOLDER: &str = "New chat";
pub const TITLE_MAX_CHARS: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Chat {
    pub fn new(project_id: &str) -> Chat {
        let now = now_millis();
        return Chat {
            id: create_id(),
            project_id: project_id.to_string(),
            title: TITLE_PLACEHOLDER.to_string(),
            messages: vec![],
            created_at: now,
            updated_at: now,
        };
    }

    pub fn has_placeholder_title(&self) -> bool {
        return self.title == TITLE_PLACEHOLDER;
    }

    /// Sets the title from the first user message, once. Later turns never
    /// overwrite a title that has already been derived or renamed.
    pub fn assign_title(&mut self) {
        if !self.has_placeholder_title() {
            return;
        }

        if let Some(first) = self.messages.iter().find(|e| return e.role == Role::User) {
            self.title = derive_title(&first.content);
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at);
    }

    /// True when no two neighbouring messages share a role.
    #[cfg(test)]
    pub fn alternates(&self) -> bool {
        return self
            .messages
            .windows(2)
            .all(|pair| return pair[0].role != pair[1].role);
    }
}

pub fn derive_title(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<&str>>().join(" ");
    if collapsed.is_empty() {
        return TITLE_PLACEHOLDER.to_string();
    }

    return collapsed.chars().take(TITLE_MAX_CHARS).collect::<String>();
}
