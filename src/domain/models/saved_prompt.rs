use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::create_id;

/// A reusable input snippet, independent of projects and chats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPrompt {
    pub id: String,
    pub name: String,
    pub text: String,
}

impl SavedPrompt {
    pub fn new(name: &str, text: &str) -> SavedPrompt {
        return SavedPrompt {
            id: create_id(),
            name: name.to_string(),
            text: text.to_string(),
        };
    }
}
