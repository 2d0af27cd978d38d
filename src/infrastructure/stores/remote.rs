#[cfg(test)]
#[path = "remote_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use futures::future;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use tokio::sync::OnceCell;

use super::key_value::set_scalar;
use super::KeyValueBox;
use super::CURRENT_CHAT_KEY;
use super::CURRENT_PROJECT_KEY;
use crate::domain::models::Chat;
use crate::domain::models::ChatStore;
use crate::domain::models::HostContext;
use crate::domain::models::Project;
use crate::domain::models::StoreError;
use crate::domain::models::StoreResult;

pub const PROJECTS_FILE_PREFIX: &str = "projects_";
pub const CHAT_FILE_PREFIX: &str = "chat_";
pub const FILE_EXTENSION: &str = ".json";

#[derive(Debug, Deserialize)]
struct CurrentUser {
    #[serde(rename = "Id")]
    id: i64,
}

#[derive(Debug, Deserialize)]
struct RootFolder {
    #[serde(rename = "ServerRelativeUrl")]
    server_relative_url: String,
}

#[derive(Debug, Deserialize)]
struct LibraryItem {
    #[serde(rename = "FileLeafRef", default)]
    name: String,
    #[serde(rename = "FileRef", default)]
    path: String,
}

#[derive(Debug, Deserialize)]
struct LibraryItems {
    value: Vec<LibraryItem>,
}

fn odata_quote(value: &str) -> String {
    return value.replace('\'', "''");
}

pub fn projects_file_name(user_id: i64) -> String {
    return format!("{PROJECTS_FILE_PREFIX}{user_id}{FILE_EXTENSION}");
}

pub fn chat_file_name(chat_id: &str) -> String {
    return format!("{CHAT_FILE_PREFIX}{chat_id}{FILE_EXTENSION}");
}

/// Keeps one JSON file per chat, plus one project list per user, in a site
/// document library. Only files authored by the current caller are listed.
/// The selection scalars are per-browser preferences and stay in the local
/// key-value substrate.
pub struct RemoteStore {
    site_url: String,
    library: String,
    client: reqwest::Client,
    user_id: OnceCell<i64>,
    folder: OnceCell<String>,
    selection: KeyValueBox,
}

impl RemoteStore {
    pub fn new(host: &HostContext, library: &str, selection: KeyValueBox) -> Result<RemoteStore> {
        return Ok(RemoteStore {
            site_url: host.site_url().to_string(),
            library: library.to_string(),
            client: host.http_client()?,
            user_id: OnceCell::new(),
            folder: OnceCell::new(),
            selection,
        });
    }

    fn list_url(&self) -> String {
        return format!(
            "{site}/_api/web/lists/getbytitle('{library}')",
            site = self.site_url,
            library = odata_quote(&self.library)
        );
    }

    fn file_url(&self, path: &str) -> String {
        return format!(
            "{site}/_api/web/GetFileByServerRelativeUrl('{path}')",
            site = self.site_url,
            path = odata_quote(path)
        );
    }

    async fn check(operation: &str, res: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(operation.to_string()));
        }
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), operation = operation, "Remote store request failed");
            return Err(StoreError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
            });
        }

        return Ok(res);
    }

    async fn get_text(&self, operation: &str, req: reqwest::RequestBuilder) -> StoreResult<String> {
        let res = RemoteStore::check(operation, req.send().await?).await?;
        return Ok(res.text().await?);
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        req: reqwest::RequestBuilder,
    ) -> StoreResult<T> {
        let payload = self.get_text(operation, req).await?;
        return Ok(serde_json::from_str::<T>(&payload)?);
    }

    /// Numeric id of the caller, looked up once per session.
    pub async fn user_id(&self) -> StoreResult<i64> {
        let id = self
            .user_id
            .get_or_try_init(|| async {
                let url = format!("{}/_api/web/currentuser", self.site_url);
                let user: CurrentUser = self.get_json("current user", self.client.get(url)).await?;
                tracing::debug!(user_id = user.id, "Resolved current user");
                return Ok::<i64, StoreError>(user.id);
            })
            .await?;

        return Ok(*id);
    }

    async fn folder(&self) -> StoreResult<String> {
        let folder = self
            .folder
            .get_or_try_init(|| async {
                let url = format!("{}/rootfolder", self.list_url());
                let root: RootFolder = self.get_json("library folder", self.client.get(url)).await?;
                return Ok::<String, StoreError>(root.server_relative_url);
            })
            .await?;

        return Ok(folder.trim_end_matches('/').to_string());
    }

    async fn list_files(&self) -> StoreResult<Vec<LibraryItem>> {
        let user_id = self.user_id().await?;
        let req = self.client.get(format!("{}/items", self.list_url())).query(&[
            ("$select", "FileLeafRef,FileRef".to_string()),
            ("$filter", format!("AuthorId eq {user_id}")),
            ("$top", "5000".to_string()),
        ]);
        let items: LibraryItems = self.get_json("library items", req).await?;

        return Ok(items.value);
    }

    async fn read_file(&self, path: &str) -> StoreResult<String> {
        let url = format!("{}/$value", self.file_url(path));
        return self.get_text(path, self.client.get(url)).await;
    }

    async fn write_file(&self, name: &str, content: String) -> StoreResult<()> {
        let folder = self.folder().await?;
        let url = format!(
            "{site}/_api/web/GetFolderByServerRelativeUrl('{folder}')/Files/add(url='{name}',overwrite=true)",
            site = self.site_url,
            folder = odata_quote(&folder),
            name = odata_quote(name)
        );
        let res = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(content)
            .send()
            .await?;
        RemoteStore::check(name, res).await?;

        return Ok(());
    }

    async fn delete_file(&self, name: &str) -> StoreResult<()> {
        let folder = self.folder().await?;
        let path = format!("{folder}/{name}");
        let res = self.client.delete(self.file_url(&path)).send().await?;
        RemoteStore::check(name, res).await?;

        return Ok(());
    }

    /// Reads every chat file of the caller and keeps those of one project.
    /// Files that do not parse are never a chat and are skipped. A file that
    /// could not be fetched fails the listing unless `skip_failed_reads` is
    /// set, since its project is unknown.
    async fn read_chats(&self, project_id: &str, skip_failed_reads: bool) -> StoreResult<Vec<Chat>> {
        let paths = self
            .list_files()
            .await?
            .into_iter()
            .filter(|e| {
                return e.name.starts_with(CHAT_FILE_PREFIX) && e.name.ends_with(FILE_EXTENSION);
            })
            .map(|e| return e.path)
            .collect::<Vec<String>>();

        let reads = paths.iter().map(|path| return self.read_file(path));
        let mut chats: Vec<Chat> = vec![];
        for (path, res) in paths.iter().zip(future::join_all(reads).await) {
            let payload = match res {
                Ok(payload) => payload,
                Err(err) if skip_failed_reads => {
                    tracing::warn!(path = %path, error = ?err, "Skipping chat file that failed to load");
                    continue;
                }
                Err(err) => return Err(err),
            };
            match serde_json::from_str::<Chat>(&payload) {
                Ok(chat) => {
                    if chat.project_id == project_id {
                        chats.push(chat);
                    }
                }
                Err(err) => {
                    tracing::warn!(path = %path, error = ?err, "Skipping unreadable chat file");
                }
            }
        }
        chats.sort_by(|a, b| return b.updated_at.cmp(&a.updated_at));

        return Ok(chats);
    }
}

#[async_trait]
impl ChatStore for RemoteStore {
    async fn try_list_projects(&self) -> StoreResult<Vec<Project>> {
        let user_id = self.user_id().await?;
        let folder = self.folder().await?;
        let path = format!("{folder}/{}", projects_file_name(user_id));

        match self.read_file(&path).await {
            Ok(payload) => return Ok(serde_json::from_str::<Vec<Project>>(&payload)?),
            Err(StoreError::NotFound(_)) => return Ok(vec![]),
            Err(err) => return Err(err),
        }
    }

    async fn try_list_chats_for_project(&self, project_id: &str) -> StoreResult<Vec<Chat>> {
        return self.read_chats(project_id, false).await;
    }

    async fn list_chats_for_project(&self, project_id: &str) -> Vec<Chat> {
        match self.read_chats(project_id, true).await {
            Ok(chats) => return chats,
            Err(err) => {
                tracing::warn!(error = ?err, project_id = project_id, "Listing chats failed, reading as empty");
                return vec![];
            }
        }
    }

    async fn save_projects(&self, projects: &[Project]) -> StoreResult<()> {
        let user_id = self.user_id().await?;
        let payload = serde_json::to_string(projects)?;
        return self.write_file(&projects_file_name(user_id), payload).await;
    }

    async fn save_chat(&self, chat: &Chat) -> StoreResult<()> {
        let payload = serde_json::to_string(chat)?;
        return self.write_file(&chat_file_name(&chat.id), payload).await;
    }

    async fn delete_chat(&self, chat_id: &str) -> StoreResult<()> {
        return self.delete_file(&chat_file_name(chat_id)).await;
    }

    async fn current_project_id(&self) -> Option<String> {
        return self.selection.get(CURRENT_PROJECT_KEY);
    }

    async fn set_current_project_id(&self, id: Option<&str>) -> StoreResult<()> {
        return set_scalar(&self.selection, CURRENT_PROJECT_KEY, id);
    }

    async fn current_chat_id(&self) -> Option<String> {
        return self.selection.get(CURRENT_CHAT_KEY);
    }

    async fn set_current_chat_id(&self, id: Option<&str>) -> StoreResult<()> {
        return set_scalar(&self.selection, CURRENT_CHAT_KEY, id);
    }
}
