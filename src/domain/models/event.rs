use super::Chat;
use super::EngineError;
use super::Message;
use super::Project;
use super::SavedPrompt;
use super::TurnOutcome;
use super::TurnState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatSummary {
    pub id: String,
    pub title: String,
    pub updated_at: i64,
}

impl From<&Chat> for ChatSummary {
    fn from(chat: &Chat) -> ChatSummary {
        return ChatSummary {
            id: chat.id.to_string(),
            title: chat.title.to_string(),
            updated_at: chat.updated_at,
        };
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    TurnState(String, TurnState),
    Fragment(String, String),
    TurnFinished(String, TurnOutcome),
    /// Full message list of the active chat, `None` when no chat is open.
    Messages(Option<String>, Vec<Message>),
    Projects(Vec<Project>, Option<String>),
    Chats(Vec<ChatSummary>, Option<String>),
    Prompts(Vec<SavedPrompt>),
    Error(EngineError),
}
