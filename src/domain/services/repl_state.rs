#[cfg(test)]
#[path = "repl_state_test.rs"]
mod tests;

use super::model_hint;
use super::model_hint::ModelTier;
use crate::configuration::AUTO_MODEL;
use crate::domain::models::Action;
use crate::domain::models::AttachmentFile;
use crate::domain::models::ChatSummary;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Project;
use crate::domain::models::Role;
use crate::domain::models::SavedPrompt;
use crate::domain::models::SlashCommand;
use crate::domain::models::TurnOutcome;
use crate::domain::models::TurnState;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Start a new chat. It is saved once the first message is sent.
- /chats - List the chats of the current project.
- /chat [N] - Open chat N from the last listing.
- /rename [TITLE] - Rename the open chat.
- /delete [N] - Delete chat N, or the open chat when N is omitted.
- /projects - List projects.
- /project [N] (/p) - Switch to project N.
- /project new [NAME] - Create a project and switch to it.
- /project rename [N] [NAME] - Rename project N.
- /project delete [N] - Delete project N and all of its chats.
- /attach [PATH] (/a) - Attach a file to the next message.
- /detach - Drop all pending attachments.
- /regenerate (/r, /regen) - Ask for a new answer to the last message.
- /model [NAME|auto] (/m) - Pick the model. auto chooses per message.
- /prompts - List saved prompts.
- /prompt save [NAME] [TEXT] - Save a prompt.
- /prompt use [N] - Send saved prompt N.
- /prompt delete [N] - Delete saved prompt N.
- /help (/h) - Show this help.
- /quit /exit (/q) - Exit.

HOTKEYS:
- CTRL+C - Stop the reply being streamed. Exits when nothing is streaming.
    "#;

    return text.trim().to_string();
}

/// Something the terminal should show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    /// Reply text, printed as is with no trailing newline.
    Fragment(String),
    Line(String),
    Notice(String),
    Error(String),
}

/// What the terminal loop should do for one line of input.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplCommand {
    Quit,
    Show(Output),
    Dispatch(Action),
    /// Read the file at the path, then hand it back through `attach`.
    Attach(String),
}

fn show(output: Output) -> ReplCommand {
    return ReplCommand::Show(output);
}

fn notice(text: &str) -> ReplCommand {
    return show(Output::Notice(text.to_string()));
}

fn error(text: &str) -> ReplCommand {
    return show(Output::Error(text.to_string()));
}

fn render_message(message: &Message) -> String {
    let author = match message.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };

    let mut names = message
        .file_texts
        .iter()
        .map(|file| return file.name.to_string())
        .collect::<Vec<String>>();
    names.extend(message.other_file_names.iter().cloned());
    if !message.image_data_urls.is_empty() {
        names.push(format!("{} image(s)", message.image_data_urls.len()));
    }

    let mut res = format!("{author}: {}", message.content);
    if !names.is_empty() {
        res = format!("{res}\n  [attached: {}]", names.join(", "));
    }

    return res;
}

fn numbered<T, F>(items: &[T], current: Option<&str>, describe: F) -> String
where
    F: Fn(&T) -> (String, String),
{
    return items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let (id, label) = describe(item);
            let marker = if current == Some(id.as_str()) { "*" } else { " " };
            return format!("{marker} {}. {label}", idx + 1);
        })
        .collect::<Vec<String>>()
        .join("\n");
}

/// Everything the terminal needs to turn typed lines into actions and events
/// into text, kept apart from stdin and stdout.
pub struct ReplState {
    model: String,
    model_simple: String,
    model_complex: String,
    projects: Vec<Project>,
    current_project: Option<String>,
    chats: Vec<ChatSummary>,
    current_chat: Option<String>,
    messages: Vec<Message>,
    prompts: Vec<SavedPrompt>,
    pending: Vec<AttachmentFile>,
    in_turn: bool,
    list_chats: bool,
    list_projects: bool,
}

impl ReplState {
    pub fn new(model: &str, model_simple: &str, model_complex: &str) -> ReplState {
        return ReplState {
            model: model.to_string(),
            model_simple: model_simple.to_string(),
            model_complex: model_complex.to_string(),
            projects: vec![],
            current_project: None,
            chats: vec![],
            current_chat: None,
            messages: vec![],
            prompts: vec![],
            pending: vec![],
            in_turn: false,
            list_chats: false,
            list_projects: false,
        };
    }

    pub fn in_turn(&self) -> bool {
        return self.in_turn;
    }

    #[cfg(test)]
    pub fn pending(&self) -> &[AttachmentFile] {
        return &self.pending;
    }

    pub fn attach(&mut self, file: AttachmentFile) -> Output {
        let text = format!(
            "Attached {} ({} bytes). {} file(s) will go with the next message.",
            file.name,
            file.size(),
            self.pending.len() + 1
        );
        self.pending.push(file);
        return Output::Notice(text);
    }

    /// Picks the model for a turn. In auto mode the input decides between the
    /// simple and complex models.
    pub fn resolve_model(&self, text: &str, has_attachments: bool) -> (String, Option<ModelTier>) {
        if self.model != AUTO_MODEL {
            return (self.model.to_string(), None);
        }

        let tier = model_hint::suggest(text, has_attachments);
        let model = match tier {
            ModelTier::Simple => self.model_simple.to_string(),
            ModelTier::Complex => self.model_complex.to_string(),
        };

        return (model, Some(tier));
    }

    fn model_notice(&self, text: &str, has_attachments: bool) -> (String, ReplCommand) {
        let (model, tier) = self.resolve_model(text, has_attachments);
        let line = match tier {
            Some(tier) => format!("[{model}, picked for a {tier} request]"),
            None => format!("[{model}]"),
        };

        return (model, notice(&line));
    }

    fn send(&mut self, text: &str) -> Vec<ReplCommand> {
        if text.trim().is_empty() && self.pending.is_empty() {
            return vec![];
        }

        let files = std::mem::take(&mut self.pending);
        let (model, model_notice) = self.model_notice(text, !files.is_empty());

        return vec![
            model_notice,
            ReplCommand::Dispatch(Action::Send(text.to_string(), files, Some(model))),
        ];
    }

    fn regenerate(&self) -> Vec<ReplCommand> {
        let last_user = self
            .messages
            .iter()
            .rev()
            .find(|message| return message.role == Role::User);

        let (text, has_attachments) = match last_user {
            Some(message) => (message.content.to_string(), message.has_attachments()),
            None => ("".to_string(), false),
        };
        let (model, model_notice) = self.model_notice(&text, has_attachments);

        return vec![
            model_notice,
            ReplCommand::Dispatch(Action::Regenerate(Some(model))),
        ];
    }

    fn chat_at(&self, command: &SlashCommand, n: usize) -> Option<String> {
        let idx = command.index_arg(n)?;
        return self.chats.get(idx).map(|chat| return chat.id.to_string());
    }

    fn project_at(&self, command: &SlashCommand, n: usize) -> Option<String> {
        let idx = command.index_arg(n)?;
        return self
            .projects
            .get(idx)
            .map(|project| return project.id.to_string());
    }

    fn prompt_at(&self, command: &SlashCommand, n: usize) -> Option<SavedPrompt> {
        let idx = command.index_arg(n)?;
        return self.prompts.get(idx).cloned();
    }

    fn project_command(&self, command: &SlashCommand) -> Vec<ReplCommand> {
        match command.subcommand() {
            "new" => {
                let name = command.rest(1);
                if name.is_empty() {
                    return vec![error("Usage: /project new NAME")];
                }
                return vec![ReplCommand::Dispatch(Action::CreateProject(name))];
            }
            "rename" => {
                let name = command.rest(2);
                match self.project_at(command, 1) {
                    Some(id) if !name.is_empty() => {
                        return vec![ReplCommand::Dispatch(Action::RenameProject(id, name))];
                    }
                    _ => return vec![error("Usage: /project rename N NAME")],
                }
            }
            "delete" => match self.project_at(command, 1) {
                Some(id) => return vec![ReplCommand::Dispatch(Action::DeleteProject(id))],
                None => return vec![error("Usage: /project delete N")],
            },
            _ => match self.project_at(command, 0) {
                Some(id) => return vec![ReplCommand::Dispatch(Action::SwitchProject(id))],
                None => return vec![error("No such project. Run /projects to list them.")],
            },
        }
    }

    fn prompt_command(&mut self, command: &SlashCommand) -> Vec<ReplCommand> {
        match command.subcommand() {
            "save" => {
                let name = command.args.get(1).cloned().unwrap_or_default();
                let text = command.rest(2);
                if name.is_empty() || text.is_empty() {
                    return vec![error("Usage: /prompt save NAME TEXT")];
                }
                return vec![ReplCommand::Dispatch(Action::SavePrompt(name, text))];
            }
            "use" => match self.prompt_at(command, 1) {
                Some(prompt) => {
                    let mut res = vec![show(Output::Line(format!("You: {}", prompt.text)))];
                    res.extend(self.send(&prompt.text));
                    return res;
                }
                None => return vec![error("No such prompt. Run /prompts to list them.")],
            },
            "delete" => match self.prompt_at(command, 1) {
                Some(prompt) => return vec![ReplCommand::Dispatch(Action::DeletePrompt(prompt.id))],
                None => return vec![error("No such prompt. Run /prompts to list them.")],
            },
            _ => return vec![error("Usage: /prompt save|use|delete ...")],
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Vec<ReplCommand> {
        let command = match SlashCommand::parse(line) {
            Some(command) => command,
            None => return self.send(line),
        };

        if command.is_quit() {
            return vec![ReplCommand::Quit];
        }
        if command.is_help() {
            return vec![show(Output::Line(help_text()))];
        }
        if command.is_new_chat() {
            return vec![ReplCommand::Dispatch(Action::NewChat())];
        }
        if command.is_chat_list() {
            self.list_chats = true;
            return vec![ReplCommand::Dispatch(Action::ListChats())];
        }
        if command.is_chat_switch() {
            match self.chat_at(&command, 0) {
                Some(id) => return vec![ReplCommand::Dispatch(Action::SwitchChat(id))],
                None => return vec![error("No such chat. Run /chats to list them.")],
            }
        }
        if command.is_chat_rename() {
            match &self.current_chat {
                Some(id) => {
                    return vec![ReplCommand::Dispatch(Action::RenameChat(
                        id.to_string(),
                        command.rest(0),
                    ))]
                }
                None => return vec![error("There is no open chat to rename.")],
            }
        }
        if command.is_chat_delete() {
            let id = if command.args.is_empty() {
                self.current_chat.clone()
            } else {
                self.chat_at(&command, 0)
            };
            match id {
                Some(id) => return vec![ReplCommand::Dispatch(Action::DeleteChat(id))],
                None => return vec![error("No such chat. Run /chats to list them.")],
            }
        }
        if command.is_project_list() {
            self.list_projects = true;
            return vec![ReplCommand::Dispatch(Action::ListProjects())];
        }
        if command.is_project() {
            return self.project_command(&command);
        }
        if command.is_attach() {
            return vec![ReplCommand::Attach(command.rest(0))];
        }
        if command.is_detach() {
            let count = self.pending.len();
            self.pending.clear();
            return vec![notice(&format!("Removed {count} pending attachment(s)."))];
        }
        if command.is_regenerate() {
            return self.regenerate();
        }
        if command.is_model_set() {
            self.model = command.rest(0);
            if self.model == AUTO_MODEL {
                return vec![notice(&format!(
                    "Model picked per message: {} or {}.",
                    self.model_simple, self.model_complex
                ))];
            }
            return vec![notice(&format!("Using {}.", self.model))];
        }
        if command.is_prompt_list() {
            return vec![ReplCommand::Dispatch(Action::ListPrompts())];
        }
        if command.is_prompt() {
            return self.prompt_command(&command);
        }

        return self.send(line);
    }

    fn render_chats(&self, current: Option<&str>) -> Output {
        if self.chats.is_empty() {
            return Output::Notice("No chats in this project yet.".to_string());
        }

        let text = numbered(&self.chats, current, |chat| {
            return (chat.id.to_string(), chat.title.to_string());
        });
        return Output::Line(text);
    }

    fn render_projects(&self) -> Output {
        let text = numbered(&self.projects, self.current_project.as_deref(), |project| {
            return (project.id.to_string(), project.name.to_string());
        });
        return Output::Line(text);
    }

    fn render_prompts(&self) -> Output {
        if self.prompts.is_empty() {
            return Output::Notice("No saved prompts.".to_string());
        }

        let text = numbered(&self.prompts, None, |prompt| {
            return (prompt.id.to_string(), format!("{}: {}", prompt.name, prompt.text));
        });
        return Output::Line(text);
    }

    pub fn apply_event(&mut self, event: Event) -> Vec<Output> {
        match event {
            Event::TurnState(_, state) => {
                match state {
                    TurnState::Sending => self.in_turn = true,
                    TurnState::Idle => self.in_turn = false,
                    _ => (),
                }
                return vec![];
            }
            Event::Fragment(_, text) => {
                return vec![Output::Fragment(text)];
            }
            Event::TurnFinished(_, outcome) => match outcome {
                TurnOutcome::Completed => return vec![Output::Fragment("\n".to_string())],
                TurnOutcome::Aborted => {
                    return vec![
                        Output::Fragment("\n".to_string()),
                        Output::Notice("[stopped]".to_string()),
                    ]
                }
                TurnOutcome::Failed(_) => return vec![Output::Fragment("\n".to_string())],
            },
            Event::Messages(chat_id, messages) => {
                let opened = chat_id != self.current_chat;
                self.current_chat = chat_id;
                self.messages = messages;
                if self.in_turn || !opened {
                    return vec![];
                }

                if self.current_chat.is_none() {
                    return vec![Output::Notice("New chat.".to_string())];
                }
                let transcript = self
                    .messages
                    .iter()
                    .map(render_message)
                    .collect::<Vec<String>>()
                    .join("\n\n");
                return vec![Output::Line(transcript)];
            }
            Event::Projects(projects, current) => {
                let switched = current != self.current_project;
                self.projects = projects;
                self.current_project = current;

                let mut res = vec![];
                if self.list_projects {
                    self.list_projects = false;
                    res.push(self.render_projects());
                }
                if switched {
                    let name = self
                        .projects
                        .iter()
                        .find(|project| return Some(&project.id) == self.current_project.as_ref())
                        .map(|project| return project.name.to_string())
                        .unwrap_or_default();
                    res.push(Output::Notice(format!("Project: {name}")));
                    self.list_chats = true;
                }
                return res;
            }
            Event::Chats(chats, current) => {
                self.chats = chats;
                if !self.list_chats {
                    return vec![];
                }

                self.list_chats = false;
                return vec![self.render_chats(current.as_deref())];
            }
            Event::Prompts(prompts) => {
                self.prompts = prompts;
                return vec![self.render_prompts()];
            }
            Event::Error(err) => {
                return vec![Output::Error(err.to_string())];
            }
        }
    }
}
