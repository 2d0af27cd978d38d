#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::collections::VecDeque;
use std::future::Future;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::engine::SessionEngine;
use super::saved_prompts::SavedPromptsService;
use crate::domain::models::Action;
use crate::domain::models::EngineError;
use crate::domain::models::Event;
use crate::domain::models::SavedPrompt;
use crate::domain::models::TurnOutcome;

/// Waits for a turn while still reading actions. `Cancel` trips the token.
/// Anything else is held back until the turn has been persisted, and cancels
/// the turn first when it would change the open chat.
async fn drive_turn<F>(
    turn: F,
    cancel: &CancellationToken,
    rx: &mut mpsc::UnboundedReceiver<Action>,
    queued: &mut VecDeque<Action>,
) -> Result<TurnOutcome, EngineError>
where
    F: Future<Output = Result<TurnOutcome, EngineError>>,
{
    tokio::pin!(turn);
    let mut closed = false;

    loop {
        tokio::select! {
            res = &mut turn => return res,
            action = rx.recv(), if !closed => {
                match action {
                    Some(Action::Cancel()) => {
                        tracing::debug!("Cancelling turn");
                        cancel.cancel();
                    }
                    Some(action) => {
                        if action.interrupts_turn() {
                            cancel.cancel();
                        }
                        queued.push_back(action);
                    }
                    None => {
                        closed = true;
                        cancel.cancel();
                    }
                }
            }
        }
    }
}

/// Runs the session on behalf of the presentation layer: one action at a
/// time, with every result reported back as events.
pub struct ActionsService {
    engine: SessionEngine,
    prompts: SavedPromptsService,
    tx: mpsc::UnboundedSender<Event>,
    queued: VecDeque<Action>,
}

impl ActionsService {
    pub fn new(
        engine: SessionEngine,
        prompts: SavedPromptsService,
        tx: mpsc::UnboundedSender<Event>,
    ) -> ActionsService {
        return ActionsService {
            engine,
            prompts,
            tx,
            queued: VecDeque::new(),
        };
    }

    pub async fn start(&mut self, rx: &mut mpsc::UnboundedReceiver<Action>) -> Result<()> {
        if let Err(err) = self.engine.load().await {
            self.tx.send(Event::Error(err))?;
        }
        self.publish_session()?;
        if let Err(err) = self.engine.check_backend() {
            tracing::warn!(error = %err.message, "Completion backend is not configured");
            self.tx.send(Event::Error(err))?;
        }

        loop {
            let action = match self.queued.pop_front() {
                Some(action) => action,
                None => {
                    match rx.recv().await {
                        Some(action) => action,
                        None => return Ok(()),
                    }
                }
            };

            if let Err(err) = self.handle(action, rx).await? {
                tracing::warn!(kind = %err.kind, error = %err.message, "Action failed");
                self.tx.send(Event::Error(err))?;
            }
        }
    }

    fn publish_projects(&self) -> Result<()> {
        self.tx.send(Event::Projects(
            self.engine.projects().to_vec(),
            self.engine.current_project_id().map(str::to_string),
        ))?;
        return Ok(());
    }

    fn publish_chats(&self) -> Result<()> {
        self.tx.send(Event::Chats(
            self.engine.chat_summaries(),
            self.engine.current_chat_id().map(str::to_string),
        ))?;
        return Ok(());
    }

    fn publish_messages(&self) -> Result<()> {
        self.tx.send(Event::Messages(
            self.engine.current_chat_id().map(str::to_string),
            self.engine.messages(),
        ))?;
        return Ok(());
    }

    fn publish_prompts(&self) -> Result<()> {
        self.tx.send(Event::Prompts(self.prompts.list()))?;
        return Ok(());
    }

    fn publish_session(&self) -> Result<()> {
        self.publish_projects()?;
        self.publish_chats()?;
        self.publish_messages()?;
        return Ok(());
    }

    /// The outer result is a closed event channel. The inner one is the
    /// action's own failure, reported as a banner.
    async fn handle(
        &mut self,
        action: Action,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<Result<(), EngineError>> {
        match action {
            Action::Send(text, files, model) => {
                let cancel = CancellationToken::new();
                let turn = self.engine.send(&text, files, model, cancel.clone());
                let res = drive_turn(turn, &cancel, rx, &mut self.queued).await;
                self.publish_chats()?;
                return Ok(res.map(|_| return ()));
            }
            Action::Regenerate(model) => {
                let cancel = CancellationToken::new();
                let turn = self.engine.regenerate(model, cancel.clone());
                let res = drive_turn(turn, &cancel, rx, &mut self.queued).await;
                self.publish_chats()?;
                return Ok(res.map(|_| return ()));
            }
            Action::Cancel() => {
                // Nothing is streaming outside of `drive_turn`.
                return Ok(Ok(()));
            }
            Action::NewChat() => {
                let res = self.engine.new_chat().await;
                self.publish_chats()?;
                self.publish_messages()?;
                return Ok(res);
            }
            Action::SwitchChat(chat_id) => {
                let res = self.engine.switch_chat(&chat_id).await;
                self.publish_chats()?;
                self.publish_messages()?;
                return Ok(res);
            }
            Action::SwitchProject(project_id) => {
                let res = self.engine.switch_project(&project_id).await;
                self.publish_session()?;
                return Ok(res);
            }
            Action::CreateProject(name) => {
                let res = self.engine.create_project(&name).await;
                self.publish_session()?;
                return Ok(res.map(|_| return ()));
            }
            Action::RenameProject(project_id, name) => {
                let res = self.engine.rename_project(&project_id, &name).await;
                self.publish_projects()?;
                return Ok(res);
            }
            Action::DeleteProject(project_id) => {
                let res = self.engine.delete_project(&project_id).await;
                self.publish_session()?;
                return Ok(res);
            }
            Action::RenameChat(chat_id, title) => {
                let res = self.engine.rename_chat(&chat_id, &title).await;
                self.publish_chats()?;
                return Ok(res);
            }
            Action::DeleteChat(chat_id) => {
                let res = self.engine.delete_chat(&chat_id).await;
                self.publish_chats()?;
                self.publish_messages()?;
                return Ok(res);
            }
            Action::ListProjects() => {
                self.publish_projects()?;
                return Ok(Ok(()));
            }
            Action::ListChats() => {
                self.publish_chats()?;
                return Ok(Ok(()));
            }
            Action::ListPrompts() => {
                self.publish_prompts()?;
                return Ok(Ok(()));
            }
            Action::SavePrompt(name, text) => {
                let res = self.prompts.save(SavedPrompt::new(&name, &text));
                self.publish_prompts()?;
                return Ok(res);
            }
            Action::DeletePrompt(prompt_id) => {
                let res = self.prompts.delete(&prompt_id);
                self.publish_prompts()?;
                return Ok(res);
            }
        }
    }
}
