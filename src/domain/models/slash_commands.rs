#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_new_chat()
            || cmd.is_chat_list()
            || cmd.is_chat_switch()
            || cmd.is_chat_rename()
            || cmd.is_chat_delete()
            || cmd.is_project_list()
            || cmd.is_project()
            || cmd.is_attach()
            || cmd.is_detach()
            || cmd.is_regenerate()
            || cmd.is_model_set()
            || cmd.is_prompt_list()
            || cmd.is_prompt()
        {
            return Some(cmd);
        }

        return None;
    }

    fn is(&self, names: &[&str]) -> bool {
        return names.contains(&self.command.as_str());
    }

    /// Everything after the first `skip` arguments, joined back with spaces.
    pub fn rest(&self, skip: usize) -> String {
        return self
            .args
            .iter()
            .skip(skip)
            .map(|e| return e.as_str())
            .collect::<Vec<&str>>()
            .join(" ");
    }

    /// The nth argument as a one-based list index, converted to zero-based.
    pub fn index_arg(&self, n: usize) -> Option<usize> {
        let idx = self.args.get(n)?.parse::<usize>().ok()?;
        if idx == 0 {
            return None;
        }

        return Some(idx - 1);
    }

    pub fn subcommand(&self) -> &str {
        return self.args.first().map(|e| return e.as_str()).unwrap_or("");
    }

    pub fn is_quit(&self) -> bool {
        return self.is(&["/q", "/quit", "/exit"]);
    }

    pub fn is_help(&self) -> bool {
        return self.is(&["/h", "/help"]);
    }

    pub fn is_new_chat(&self) -> bool {
        return self.is(&["/n", "/new"]);
    }

    pub fn is_chat_list(&self) -> bool {
        return self.is(&["/chats"]);
    }

    pub fn is_chat_switch(&self) -> bool {
        return self.is(&["/chat"]) && !self.args.is_empty();
    }

    pub fn is_chat_rename(&self) -> bool {
        return self.is(&["/rename"]) && !self.args.is_empty();
    }

    pub fn is_chat_delete(&self) -> bool {
        return self.is(&["/delete"]);
    }

    pub fn is_project_list(&self) -> bool {
        return self.is(&["/projects"]);
    }

    pub fn is_project(&self) -> bool {
        return self.is(&["/p", "/project"]) && !self.args.is_empty();
    }

    pub fn is_attach(&self) -> bool {
        return self.is(&["/a", "/attach"]) && !self.args.is_empty();
    }

    pub fn is_detach(&self) -> bool {
        return self.is(&["/detach"]);
    }

    pub fn is_regenerate(&self) -> bool {
        return self.is(&["/r", "/regen", "/regenerate"]);
    }

    pub fn is_model_set(&self) -> bool {
        return self.is(&["/m", "/model"]) && !self.args.is_empty();
    }

    pub fn is_prompt_list(&self) -> bool {
        return self.is(&["/prompts"]);
    }

    pub fn is_prompt(&self) -> bool {
        return self.is(&["/prompt"]) && !self.args.is_empty();
    }
}
