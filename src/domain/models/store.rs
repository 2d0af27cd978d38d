use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::Chat;
use super::EngineError;
use super::ErrorKind;
use super::Project;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{operation} returned HTTP {status}")]
    Status { operation: String, status: u16 },

    #[error("{0} was not found")]
    NotFound(String),

    #[error("stored data is invalid: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage IO failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> EngineError {
        let kind = match err {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Persistence,
        };

        return EngineError::new(kind, &err.to_string());
    }
}

/// Durable home of projects, chats, and the current selection. The session
/// engine only ever caches what an implementation returns.
///
/// The `try_` listings tell a store that has nothing apart from one that
/// could not be read. Their lenient counterparts read any failure as empty
/// and only suit display paths. Every write reports its failure.
#[async_trait]
pub trait ChatStore {
    /// All projects. An empty collection means the store confirmed there
    /// are none.
    async fn try_list_projects(&self) -> StoreResult<Vec<Project>>;

    /// Chats of one project, most recently updated first.
    async fn try_list_chats_for_project(&self, project_id: &str) -> StoreResult<Vec<Chat>>;

    #[allow(clippy::implicit_return)]
    async fn list_projects(&self) -> Vec<Project> {
        match self.try_list_projects().await {
            Ok(projects) => return projects,
            Err(err) => {
                tracing::warn!(error = ?err, "Listing projects failed, reading as empty");
                return vec![];
            }
        }
    }

    /// Replaces the whole project collection.
    async fn save_projects(&self, projects: &[Project]) -> StoreResult<()>;

    #[allow(clippy::implicit_return)]
    async fn list_chats_for_project(&self, project_id: &str) -> Vec<Chat> {
        match self.try_list_chats_for_project(project_id).await {
            Ok(chats) => return chats,
            Err(err) => {
                tracing::warn!(error = ?err, project_id = project_id, "Listing chats failed, reading as empty");
                return vec![];
            }
        }
    }

    /// Inserts or replaces the chat with the same id.
    async fn save_chat(&self, chat: &Chat) -> StoreResult<()>;

    async fn delete_chat(&self, chat_id: &str) -> StoreResult<()>;

    async fn current_project_id(&self) -> Option<String>;

    async fn set_current_project_id(&self, id: Option<&str>) -> StoreResult<()>;

    async fn current_chat_id(&self) -> Option<String>;

    async fn set_current_chat_id(&self, id: Option<&str>) -> StoreResult<()>;
}

pub type StoreBox = Arc<dyn ChatStore + Send + Sync>;
