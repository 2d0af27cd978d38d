#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use owo_colors::OwoColorize;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::services::repl_state::help_text;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

pub fn log_dir() -> Result<path::PathBuf> {
    if let Ok(dir) = std::env::var("CHATDESK_LOG_DIR") {
        return Ok(path::PathBuf::from(dir));
    }

    match dirs::cache_dir() {
        Some(dir) => return Ok(dir.join("chatdesk")),
        None => bail!("Could not resolve a cache directory for logs"),
    }
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Chatdesk")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Chatdesk with environment variable RUST_LOG=chatdesk")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn arg(key: ConfigKey, env: &'static str, help: &str) -> Arg {
    let mut help = help.to_string();
    let default = Config::default(key);
    if !default.is_empty() {
        help = format!("{help} [default: {default}]");
    }

    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("HOTKEYS:") {
                return format!("CHAT {line}").underline().bold().to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("chatdesk")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            arg(ConfigKey::ConfigFile, "CHATDESK_CONFIG_FILE", "Path to configuration file")
                .short('c'),
        )
        .arg(arg(
            ConfigKey::ApiKey,
            "CHATDESK_API_KEY",
            "API key sent as a bearer token to the completion endpoint.",
        ))
        .arg(arg(
            ConfigKey::CompletionURL,
            "CHATDESK_COMPLETION_URL",
            "Chat completions endpoint. Can be swapped to a compatible proxy.",
        ))
        .arg(
            arg(
                ConfigKey::Model,
                "CHATDESK_MODEL",
                "Model to chat with. 'auto' picks the simple or complex model per message.",
            )
            .short('m'),
        )
        .arg(arg(
            ConfigKey::ModelSimple,
            "CHATDESK_MODEL_SIMPLE",
            "Model used for short, simple messages in auto mode.",
        ))
        .arg(arg(
            ConfigKey::ModelComplex,
            "CHATDESK_MODEL_COMPLEX",
            "Model used for long messages, attachments, and analysis in auto mode.",
        ))
        .arg(arg(
            ConfigKey::MaxTokens,
            "CHATDESK_MAX_TOKENS",
            "Upper bound on the length of each reply, in tokens.",
        ))
        .arg(arg(
            ConfigKey::StreamIdleTimeout,
            "CHATDESK_STREAM_IDLE_TIMEOUT",
            "Seconds to wait for the next piece of a streamed reply before giving up.",
        ))
        .arg(arg(
            ConfigKey::DataDir,
            "CHATDESK_DATA_DIR",
            "Directory holding locally stored projects, chats, and saved prompts.",
        ))
        .arg(arg(
            ConfigKey::SiteURL,
            "CHATDESK_SITE_URL",
            "Base URL of the site whose document library keeps chat history.",
        ))
        .arg(arg(
            ConfigKey::SiteToken,
            "CHATDESK_SITE_TOKEN",
            "Bearer token used to call the site as the signed in user.",
        ))
        .arg(arg(
            ConfigKey::RemoteLibrary,
            "CHATDESK_REMOTE_LIBRARY",
            "Document library title. When set together with the site URL, chat history is kept there instead of locally.",
        ))
        .arg(
            arg(
                ConfigKey::Username,
                "CHATDESK_USERNAME",
                "Your name, shown in the greeting.",
            )
            .short('u'),
        );
}

/// Handles one-shot subcommands. Returns true when the chat should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = log_dir()?.join("debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(false);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(vec![&matches]).await?;
        }
    }

    return Ok(true);
}
