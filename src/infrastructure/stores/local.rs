#[cfg(test)]
#[path = "local_test.rs"]
mod tests;

use async_trait::async_trait;

use super::key_value::read_collection;
use super::key_value::set_scalar;
use super::key_value::write_collection;
use super::KeyValueBox;
use crate::domain::models::Chat;
use crate::domain::models::ChatStore;
use crate::domain::models::Project;
use crate::domain::models::StoreResult;

pub const PROJECTS_KEY: &str = "chatdesk.projects";
pub const CHATS_KEY: &str = "chatdesk.chats";
pub const CURRENT_PROJECT_KEY: &str = "chatdesk.currentProjectId";
pub const CURRENT_CHAT_KEY: &str = "chatdesk.currentChatId";

/// Keeps every project and every chat under a handful of fixed slots of a
/// key-value substrate.
pub struct LocalStore {
    kv: KeyValueBox,
}

impl LocalStore {
    pub fn new(kv: KeyValueBox) -> LocalStore {
        return LocalStore { kv };
    }
}

#[async_trait]
impl ChatStore for LocalStore {
    async fn try_list_projects(&self) -> StoreResult<Vec<Project>> {
        return Ok(read_collection(&self.kv, PROJECTS_KEY));
    }

    async fn save_projects(&self, projects: &[Project]) -> StoreResult<()> {
        return write_collection(&self.kv, PROJECTS_KEY, projects);
    }

    async fn try_list_chats_for_project(&self, project_id: &str) -> StoreResult<Vec<Chat>> {
        let mut chats = read_collection::<Chat>(&self.kv, CHATS_KEY)
            .into_iter()
            .filter(|e| return e.project_id == project_id)
            .collect::<Vec<Chat>>();
        chats.sort_by(|a, b| return b.updated_at.cmp(&a.updated_at));

        return Ok(chats);
    }

    async fn save_chat(&self, chat: &Chat) -> StoreResult<()> {
        let mut chats = read_collection::<Chat>(&self.kv, CHATS_KEY);
        match chats.iter_mut().find(|e| return e.id == chat.id) {
            Some(existing) => *existing = chat.clone(),
            None => chats.push(chat.clone()),
        }

        return write_collection(&self.kv, CHATS_KEY, &chats);
    }

    async fn delete_chat(&self, chat_id: &str) -> StoreResult<()> {
        let mut chats = read_collection::<Chat>(&self.kv, CHATS_KEY);
        chats.retain(|e| return e.id != chat_id);

        return write_collection(&self.kv, CHATS_KEY, &chats);
    }

    async fn current_project_id(&self) -> Option<String> {
        return self.kv.get(CURRENT_PROJECT_KEY);
    }

    async fn set_current_project_id(&self, id: Option<&str>) -> StoreResult<()> {
        return set_scalar(&self.kv, CURRENT_PROJECT_KEY, id);
    }

    async fn current_chat_id(&self) -> Option<String> {
        return self.kv.get(CURRENT_CHAT_KEY);
    }

    async fn set_current_chat_id(&self, id: Option<&str>) -> StoreResult<()> {
        return set_scalar(&self.kv, CURRENT_CHAT_KEY, id);
    }
}
