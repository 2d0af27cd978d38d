use super::AttachmentFile;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Text, raw files, and an optional model override for this turn.
    Send(String, Vec<AttachmentFile>, Option<String>),
    Regenerate(Option<String>),
    Cancel(),
    NewChat(),
    SwitchChat(String),
    SwitchProject(String),
    CreateProject(String),
    RenameProject(String, String),
    DeleteProject(String),
    RenameChat(String, String),
    DeleteChat(String),
    ListProjects(),
    ListChats(),
    ListPrompts(),
    SavePrompt(String, String),
    DeletePrompt(String),
}

impl Action {
    /// Actions that change what the open chat shows. They cancel a streaming
    /// reply before they run.
    pub fn interrupts_turn(&self) -> bool {
        return matches!(
            self,
            Action::Send(..)
                | Action::Regenerate(..)
                | Action::NewChat()
                | Action::SwitchChat(..)
                | Action::SwitchProject(..)
                | Action::CreateProject(..)
                | Action::DeleteProject(..)
                | Action::DeleteChat(..)
        );
    }
}
