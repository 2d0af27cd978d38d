use std::io::Write;
use std::path;

use anyhow::Result;
use owo_colors::OwoColorize;
use tokio::fs;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::signal;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::AttachmentFile;
use crate::domain::models::Event;
use crate::domain::services::repl_state::Output;
use crate::domain::services::repl_state::ReplCommand;
use crate::domain::services::repl_state::ReplState;

async fn read_attachment(file_path: &str) -> Result<AttachmentFile> {
    let file_path = path::PathBuf::from(file_path);
    let bytes = fs::read(&file_path).await?;
    let name = file_path
        .file_name()
        .map(|name| return name.to_string_lossy().to_string())
        .unwrap_or_else(|| return file_path.to_string_lossy().to_string());
    let content_type = mime_guess::from_path(&file_path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    return Ok(AttachmentFile::new(&name, content_type, bytes));
}

fn render(output: Output) -> Result<()> {
    match output {
        Output::Fragment(text) => {
            print!("{text}");
            std::io::stdout().flush()?;
        }
        Output::Line(text) => println!("{text}"),
        Output::Notice(text) => println!("{}", text.dimmed()),
        Output::Error(text) => eprintln!("{}", text.red()),
    }

    return Ok(());
}

/// Returns false once the user asked to quit.
async fn run_line(
    state: &mut ReplState,
    tx: &mpsc::UnboundedSender<Action>,
    line: &str,
) -> Result<bool> {
    for command in state.handle_line(line) {
        match command {
            ReplCommand::Quit => return Ok(false),
            ReplCommand::Show(output) => render(output)?,
            ReplCommand::Dispatch(action) => tx.send(action)?,
            ReplCommand::Attach(file_path) => match read_attachment(&file_path).await {
                Ok(file) => render(state.attach(file))?,
                Err(err) => {
                    tracing::warn!(path = file_path, error = ?err, "Failed to read attachment");
                    render(Output::Error(format!("Could not read {file_path}: {err}")))?;
                }
            },
        }
    }

    return Ok(true);
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    mut rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut state = ReplState::new(
        &Config::get(ConfigKey::Model),
        &Config::get(ConfigKey::ModelSimple),
        &Config::get(ConfigKey::ModelComplex),
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "{}",
        format!(
            "Hey {}! Type a message, or /help for commands.",
            Config::get(ConfigKey::Username)
        )
        .bold()
    );

    loop {
        tokio::select! {
            event = rx.recv() => {
                let event = match event {
                    Some(event) => event,
                    None => return Ok(()),
                };
                for output in state.apply_event(event) {
                    render(output)?;
                }
            }
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => return Ok(()),
                };
                if !run_line(&mut state, &tx, &line).await? {
                    return Ok(());
                }
            }
            res = signal::ctrl_c() => {
                res?;
                if !state.in_turn() {
                    return Ok(());
                }
                tx.send(Action::Cancel())?;
            }
        }
    }
}
