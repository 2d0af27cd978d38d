#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;

use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::attachments::extraction_errors;
use super::attachments::AttachmentExtractor;
use super::prompt_builder::build_request;
use super::prompt_builder::split_for_regenerate;
use crate::domain::models::AttachmentFile;
use crate::domain::models::BackendBox;
use crate::domain::models::Chat;
use crate::domain::models::ChatSummary;
use crate::domain::models::CompletionRequest;
use crate::domain::models::EngineError;
use crate::domain::models::ErrorKind;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Project;
use crate::domain::models::Role;
use crate::domain::models::StoreBox;
use crate::domain::models::StoreError;
use crate::domain::models::TurnOutcome;
use crate::domain::models::TurnState;
use crate::domain::models::DEFAULT_PROJECT_NAME;

pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Per-session settings handed to the engine by whoever builds it. The engine
/// never reads process-wide configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub model: String,
    pub max_tokens: u32,
    pub stream_idle_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        return EngineConfig {
            model: "gpt-4o".to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            stream_idle_timeout: DEFAULT_STREAM_IDLE_TIMEOUT,
        };
    }
}

/// Owns the in-memory view of one UI session: the project list, the chats of
/// the selected project, and the open chat. Everything here is a cache of
/// what the store returns.
///
/// Operations that fail validation return an error and change nothing.
/// Operations whose store write fails keep their in-memory change and return
/// the persistence error.
pub struct SessionEngine {
    config: EngineConfig,
    backend: BackendBox,
    store: StoreBox,
    extractor: AttachmentExtractor,
    tx: mpsc::UnboundedSender<Event>,
    state: TurnState,
    projects: Vec<Project>,
    current_project_id: Option<String>,
    chats: Vec<Chat>,
    current_chat: Option<Chat>,
}

impl SessionEngine {
    pub fn new(
        config: EngineConfig,
        backend: BackendBox,
        store: StoreBox,
        extractor: AttachmentExtractor,
        tx: mpsc::UnboundedSender<Event>,
    ) -> SessionEngine {
        return SessionEngine {
            config,
            backend,
            store,
            extractor,
            tx,
            state: TurnState::Idle,
            projects: vec![],
            current_project_id: None,
            chats: vec![],
            current_chat: None,
        };
    }

    pub fn state(&self) -> TurnState {
        return self.state;
    }

    pub fn projects(&self) -> &[Project] {
        return &self.projects;
    }

    pub fn current_project_id(&self) -> Option<&str> {
        return self.current_project_id.as_deref();
    }

    /// Chats of the selected project, most recently updated first.
    pub fn chats(&self) -> &[Chat] {
        return &self.chats;
    }

    pub fn chat_summaries(&self) -> Vec<ChatSummary> {
        return self.chats.iter().map(ChatSummary::from).collect();
    }

    pub fn current_chat(&self) -> Option<&Chat> {
        return self.current_chat.as_ref();
    }

    pub fn current_chat_id(&self) -> Option<&str> {
        return self.current_chat.as_ref().map(|chat| return chat.id.as_str());
    }

    pub fn messages(&self) -> Vec<Message> {
        match &self.current_chat {
            Some(chat) => return chat.messages.clone(),
            None => return vec![],
        }
    }

    fn emit(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Event receiver dropped");
        }
    }

    fn set_state(&mut self, chat_id: &str, state: TurnState) {
        self.state = state;
        self.emit(Event::TurnState(chat_id.to_string(), state));
    }

    /// Reads projects and the saved selection from the store. A store that
    /// confirms it has no projects gets the default project. A store that
    /// cannot be read is left untouched.
    pub async fn load(&mut self) -> Result<(), EngineError> {
        let mut projects = match self.store.try_list_projects().await {
            Ok(projects) => projects,
            Err(err) => {
                tracing::error!(error = ?err, "Listing projects failed");
                return Err(EngineError::new(
                    ErrorKind::Persistence,
                    &format!("Could not read projects: {err}"),
                ));
            }
        };
        let mut created = false;
        if projects.is_empty() {
            projects.push(Project::new(DEFAULT_PROJECT_NAME));
            created = true;
        }
        self.projects = projects;
        let saved = if created {
            self.store.save_projects(&self.projects).await
        } else {
            Ok(())
        };

        let stored_project = self
            .store
            .current_project_id()
            .await
            .filter(|id| return self.has_project(id));
        let project_id = match stored_project.or_else(|| return self.first_project_id()) {
            Some(id) => id,
            None => return Ok(saved?),
        };
        self.current_project_id = Some(project_id.to_string());
        self.chats = self.store.list_chats_for_project(&project_id).await;

        let stored_chat = self.store.current_chat_id().await;
        self.current_chat = stored_chat
            .and_then(|id| return self.chats.iter().find(|chat| return chat.id == id).cloned());

        tracing::info!(
            projects = self.projects.len(),
            chats = self.chats.len(),
            project_id = %project_id,
            "Session loaded"
        );

        return Ok(saved?);
    }

    fn has_project(&self, id: &str) -> bool {
        return self.projects.iter().any(|project| return project.id == id);
    }

    fn first_project_id(&self) -> Option<String> {
        return self.projects.first().map(|project| return project.id.to_string());
    }

    async fn select_project(&mut self, project_id: &str) -> Result<(), EngineError> {
        self.current_project_id = Some(project_id.to_string());
        self.chats = self.store.list_chats_for_project(project_id).await;
        self.current_chat = None;

        self.store.set_current_project_id(Some(project_id)).await?;
        self.store.set_current_chat_id(None).await?;

        return Ok(());
    }

    /// Starts a fresh conversation. The chat is created by its first send.
    pub async fn new_chat(&mut self) -> Result<(), EngineError> {
        self.current_chat = None;
        self.store.set_current_chat_id(None).await?;

        return Ok(());
    }

    pub async fn switch_chat(&mut self, chat_id: &str) -> Result<(), EngineError> {
        let chat = match self.chats.iter().find(|chat| return chat.id == chat_id) {
            Some(chat) => chat.clone(),
            None => return Err(EngineError::not_found(&format!("Chat {chat_id}"))),
        };
        self.current_chat = Some(chat);
        self.store.set_current_chat_id(Some(chat_id)).await?;

        return Ok(());
    }

    pub async fn switch_project(&mut self, project_id: &str) -> Result<(), EngineError> {
        if !self.has_project(project_id) {
            return Err(EngineError::not_found(&format!("Project {project_id}")));
        }

        return self.select_project(project_id).await;
    }

    /// Adds a project and selects it.
    pub async fn create_project(&mut self, name: &str) -> Result<Project, EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::validation("A project needs a name"));
        }

        let project = Project::new(name);
        self.projects.push(project.clone());
        self.store.save_projects(&self.projects).await?;
        self.select_project(&project.id).await?;

        return Ok(project);
    }

    pub async fn rename_project(&mut self, project_id: &str, name: &str) -> Result<(), EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::validation("A project needs a name"));
        }

        match self
            .projects
            .iter_mut()
            .find(|project| return project.id == project_id)
        {
            Some(project) => project.name = name.trim().to_string(),
            None => return Err(EngineError::not_found(&format!("Project {project_id}"))),
        }
        self.store.save_projects(&self.projects).await?;

        return Ok(());
    }

    /// Deletes a project together with every chat that belongs to it. The
    /// project itself is only removed once all of its chats are gone, so a
    /// listing that fails keeps it. Removing the last project brings back the
    /// default one.
    pub async fn delete_project(&mut self, project_id: &str) -> Result<(), EngineError> {
        if !self.has_project(project_id) {
            return Err(EngineError::not_found(&format!("Project {project_id}")));
        }

        let chats = match self.store.try_list_chats_for_project(project_id).await {
            Ok(chats) => chats,
            Err(err) => {
                tracing::error!(project_id = project_id, error = ?err, "Listing project chats failed");
                return Err(EngineError::new(
                    ErrorKind::Persistence,
                    &format!("Could not list the chats of project {project_id}: {err}"),
                ));
            }
        };
        for chat in chats.iter() {
            self.delete_chat_record(&chat.id).await?;
        }
        tracing::info!(project_id = project_id, chats = chats.len(), "Deleted project chats");

        self.projects.retain(|project| return project.id != project_id);
        if self.projects.is_empty() {
            self.projects.push(Project::new(DEFAULT_PROJECT_NAME));
        }
        self.store.save_projects(&self.projects).await?;

        if self.current_project_id.as_deref() == Some(project_id) {
            if let Some(next) = self.first_project_id() {
                self.select_project(&next).await?;
            }
        }

        return Ok(());
    }

    pub async fn rename_chat(&mut self, chat_id: &str, title: &str) -> Result<(), EngineError> {
        if title.trim().is_empty() {
            return Err(EngineError::validation("A chat title cannot be empty"));
        }

        let chat = match self.chats.iter_mut().find(|chat| return chat.id == chat_id) {
            Some(chat) => chat,
            None => return Err(EngineError::not_found(&format!("Chat {chat_id}"))),
        };
        chat.title = title.trim().to_string();
        chat.touch();
        let renamed = chat.clone();

        if let Some(current) = self.current_chat.as_mut() {
            if current.id == chat_id {
                *current = renamed.clone();
            }
        }
        self.cache_chat(&renamed);
        self.store.save_chat(&renamed).await?;

        return Ok(());
    }

    pub async fn delete_chat(&mut self, chat_id: &str) -> Result<(), EngineError> {
        if !self.chats.iter().any(|chat| return chat.id == chat_id) {
            return Err(EngineError::not_found(&format!("Chat {chat_id}")));
        }

        self.delete_chat_record(chat_id).await?;
        self.chats.retain(|chat| return chat.id != chat_id);
        if self.current_chat_id() == Some(chat_id) {
            self.current_chat = None;
            self.store.set_current_chat_id(None).await?;
        }

        return Ok(());
    }

    /// A record that is already gone counts as deleted.
    async fn delete_chat_record(&self, chat_id: &str) -> Result<(), EngineError> {
        match self.store.delete_chat(chat_id).await {
            Ok(()) => return Ok(()),
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(chat_id = chat_id, "Chat was already deleted");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    }

    fn cache_chat(&mut self, chat: &Chat) {
        if self.current_project_id.as_deref() != Some(chat.project_id.as_str()) {
            return;
        }

        match self.chats.iter_mut().find(|e| return e.id == chat.id) {
            Some(existing) => *existing = chat.clone(),
            None => self.chats.push(chat.clone()),
        }
        self.chats
            .sort_by(|a, b| return b.updated_at.cmp(&a.updated_at));
    }

    /// Sends one user turn and streams the reply into the open chat, creating
    /// the chat when none is open. Errors are returned only when the turn
    /// never started. Once it starts, failures end up in the reply and in
    /// `Event::Error`, and the returned outcome says how it ended.
    pub async fn send(
        &mut self,
        text: &str,
        files: Vec<AttachmentFile>,
        model: Option<String>,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, EngineError> {
        if text.trim().is_empty() && files.is_empty() {
            return Err(EngineError::validation(
                "Type a message or attach a file before sending",
            ));
        }
        self.check_backend()?;
        let project_id = match &self.current_project_id {
            Some(id) => id.to_string(),
            None => return Err(EngineError::validation("No project is selected")),
        };

        let attachments = self.extractor.prepare(files).await;
        for err in extraction_errors(&attachments) {
            self.emit(Event::Error(err));
        }
        if text.trim().is_empty() && attachments.is_empty() {
            return Err(EngineError::validation(
                "None of the attached files could be included",
            ));
        }

        let mut chat = match self.current_chat.take() {
            Some(chat) => chat,
            None => Chat::new(&project_id),
        };
        chat.messages.push(Message::user(text.trim(), &attachments));

        let model = model.unwrap_or_else(|| return self.config.model.to_string());
        return Ok(self.run_turn(chat, &model, &cancel).await);
    }

    /// Replaces the last assistant reply with a new one for the same user
    /// message. The chat keeps its length once the new reply lands.
    pub async fn regenerate(
        &mut self,
        model: Option<String>,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, EngineError> {
        self.check_backend()?;

        let user = self
            .current_chat
            .as_ref()
            .and_then(|chat| return split_for_regenerate(&chat.messages))
            .map(|(_, user)| return user.clone());
        let (mut chat, user) = match (self.current_chat.take(), user) {
            (Some(chat), Some(user)) => (chat, user),
            (chat, _) => {
                self.current_chat = chat;
                return Err(EngineError::validation("There is no reply to regenerate"));
            }
        };

        chat.messages.truncate(chat.messages.len() - 2);
        chat.messages.push(user);

        let model = model.unwrap_or_else(|| return self.config.model.to_string());
        return Ok(self.run_turn(chat, &model, &cancel).await);
    }

    /// Reports a backend that cannot serve turns as a configuration error.
    pub fn check_backend(&self) -> Result<(), EngineError> {
        if let Err(err) = self.backend.check_config() {
            return Err(EngineError::configuration(&err.to_string()));
        }

        return Ok(());
    }

    async fn run_turn(&mut self, mut chat: Chat, model: &str, cancel: &CancellationToken) -> TurnOutcome {
        let chat_id = chat.id.to_string();
        self.set_state(&chat_id, TurnState::Sending);

        let request = build_request(model, self.config.max_tokens, &chat.messages);
        tracing::info!(
            chat_id = %chat_id,
            model = model,
            messages = request.messages.len(),
            "Turn started"
        );

        chat.messages.push(Message::new(Role::Assistant, ""));
        self.emit(Event::Messages(Some(chat_id.to_string()), chat.messages.clone()));

        let outcome = self.stream_reply(&mut chat, request, cancel).await;
        self.finish_turn(chat, &outcome).await;

        return outcome;
    }

    /// Applies reply fragments to the last message of `chat` in arrival
    /// order until the stream ends, fails, stalls, or is cancelled.
    async fn stream_reply(
        &mut self,
        chat: &mut Chat,
        request: CompletionRequest,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        let chat_id = chat.id.to_string();
        let idle_timeout = self.config.stream_idle_timeout;
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return TurnOutcome::Aborted,
            res = time::timeout(idle_timeout, self.backend.get_completion(request)) => res,
        };
        let mut stream = match opened {
            Err(_) => {
                return TurnOutcome::Failed(format!(
                    "The completion service did not answer within {idle_timeout:?}"
                ));
            }
            Ok(Err(err)) => return TurnOutcome::Failed(err.to_string()),
            Ok(Ok(stream)) => stream,
        };
        self.set_state(&chat_id, TurnState::Streaming);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return TurnOutcome::Aborted,
                next = time::timeout(idle_timeout, stream.next()) => next,
            };

            match next {
                Err(_) => {
                    return TurnOutcome::Failed(format!(
                        "The completion service sent nothing for {idle_timeout:?}"
                    ));
                }
                Ok(None) => return TurnOutcome::Completed,
                Ok(Some(Err(err))) => return TurnOutcome::Failed(err.to_string()),
                Ok(Some(Ok(fragment))) => {
                    if let Some(reply) = chat.messages.last_mut() {
                        reply.append(&fragment);
                    }
                    self.emit(Event::Fragment(chat_id.to_string(), fragment));
                }
            }
        }
    }

    /// Writes the outcome into the chat and persists it, once per turn.
    async fn finish_turn(&mut self, mut chat: Chat, outcome: &TurnOutcome) {
        match outcome {
            TurnOutcome::Completed => chat.assign_title(),
            TurnOutcome::Aborted => {}
            TurnOutcome::Failed(message) => {
                if let Some(reply) = chat.messages.last_mut() {
                    reply.content = format!("Error: {message}");
                }
                tracing::error!(chat_id = %chat.id, error = %message, "Turn failed");
                self.emit(Event::Error(EngineError::transport(message)));
            }
        }
        chat.touch();

        let chat_id = chat.id.to_string();
        if let Err(err) = self.store.save_chat(&chat).await {
            tracing::error!(chat_id = %chat_id, error = ?err, "Saving chat failed");
            self.emit(Event::Error(err.into()));
        }
        if let Err(err) = self.store.set_current_chat_id(Some(&chat_id)).await {
            tracing::warn!(chat_id = %chat_id, error = ?err, "Saving chat selection failed");
        }

        self.cache_chat(&chat);
        self.emit(Event::Messages(Some(chat_id.to_string()), chat.messages.clone()));
        self.current_chat = Some(chat);

        tracing::info!(chat_id = %chat_id, outcome = ?outcome, "Turn finished");
        self.emit(Event::TurnFinished(chat_id.to_string(), outcome.clone()));
        let final_state = outcome.final_state();
        if final_state != TurnState::Idle {
            self.set_state(&chat_id, final_state);
        }
        self.set_state(&chat_id, TurnState::Idle);
    }
}
