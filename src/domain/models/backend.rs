use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// The text portion of the content, ignoring image parts.
    #[cfg(test)]
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => return text.to_string(),
            MessageContent::Parts(parts) => {
                return parts
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { text } => return Some(text.as_str()),
                        ContentPart::ImageUrl { .. } => return None,
                    })
                    .collect::<Vec<&str>>()
                    .join("");
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: ProviderRole,
    pub content: MessageContent,
}

impl ProviderMessage {
    pub fn text(role: ProviderRole, text: &str) -> ProviderMessage {
        return ProviderMessage {
            role,
            content: MessageContent::Text(text.to_string()),
        };
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ProviderMessage>,
    pub max_tokens: u32,
    pub stream: bool,
}

/// Incremental reply fragments for one turn. Lazy, finite, and consumed once.
pub type CompletionStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait Backend {
    /// Verifies the settings needed to talk to the completion service are
    /// present. Called before every send so a missing key blocks the turn.
    fn check_config(&self) -> Result<()>;

    /// Starts a completion request and hands back the fragment stream once the
    /// service has accepted it. Errors returned here happen before any reply
    /// bytes arrived; errors inside the stream are transport failures
    /// mid-reply.
    async fn get_completion(&self, request: CompletionRequest) -> Result<CompletionStream>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
