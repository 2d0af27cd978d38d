#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::env;
use std::path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use anyhow::Result;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;
use tokio::task;

use crate::application::cli;
use crate::application::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::configuration::AUTO_MODEL;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::HostContext;
use crate::domain::models::StoreBox;
use crate::domain::services::actions::ActionsService;
use crate::domain::services::attachments::AttachmentExtractor;
use crate::domain::services::engine::EngineConfig;
use crate::domain::services::engine::SessionEngine;
use crate::domain::services::saved_prompts::SavedPromptsService;
use crate::infrastructure::backends::openai::OpenAI;
use crate::infrastructure::stores::FileKeyValueStore;
use crate::infrastructure::stores::KeyValueBox;
use crate::infrastructure::stores::LocalStore;
use crate::infrastructure::stores::RemoteStore;

fn handle_error(err: Error) {
    eprintln!(
        "{}",
        format!(
            "Oh no! Chatdesk has failed with the following app version and error.\n\nVersion: {}\nError: {}",
            env!("CARGO_PKG_VERSION"),
            err
        )
        .red()
    );

    let backtrace = err.backtrace();
    if backtrace.to_string() == "disabled backtrace" {
        let args = env::args().collect::<Vec<String>>().join(" ");
        eprintln!("\nRunning the following can help explain further what the issue is:");
        eprintln!("\nRUST_BACKTRACE=1 {args}");
    } else {
        eprintln!("\n{}", backtrace);
    }

    process::exit(1);
}

fn engine_config() -> Result<EngineConfig> {
    let mut model = Config::get(ConfigKey::Model);
    if model == AUTO_MODEL {
        model = Config::get(ConfigKey::ModelComplex);
    }

    return Ok(EngineConfig {
        model,
        max_tokens: Config::parse::<u32>(ConfigKey::MaxTokens)?,
        stream_idle_timeout: Duration::from_secs(Config::parse::<u64>(
            ConfigKey::StreamIdleTimeout,
        )?),
    });
}

fn chat_store(kv: KeyValueBox) -> Result<StoreBox> {
    if !Config::uses_remote_store() {
        return Ok(Arc::new(LocalStore::new(kv)));
    }

    let token = Config::get(ConfigKey::SiteToken);
    let host = HostContext {
        site_url: Config::get(ConfigKey::SiteURL),
        access_token: if token.is_empty() { None } else { Some(token) },
    };
    let store = RemoteStore::new(&host, &Config::get(ConfigKey::RemoteLibrary), kv)?;
    tracing::info!(site_url = host.site_url, "Keeping chat history in the document library");

    return Ok(Arc::new(store));
}

async fn run() -> Result<()> {
    let data_dir = path::PathBuf::from(Config::get(ConfigKey::DataDir));
    let kv: KeyValueBox = Arc::new(FileKeyValueStore::open(data_dir.join("storage.json")));

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let engine = SessionEngine::new(
        engine_config()?,
        Box::<OpenAI>::default(),
        chat_store(kv.clone())?,
        AttachmentExtractor::default(),
        event_tx.clone(),
    );
    let mut actions = ActionsService::new(engine, SavedPromptsService::new(kv), event_tx);

    let mut background_futures = task::JoinSet::new();
    background_futures.spawn(async move {
        return actions.start(&mut action_rx).await;
    });

    let ui_future = ui::start(action_tx, event_rx);

    let res = tokio::select!(
        res = background_futures.join_next() => match res {
            Some(res) => res?,
            None => Ok(()),
        },
        res = ui_future => res,
    );

    return res;
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let debug_log_dir = match cli::log_dir() {
        Ok(dir) => dir,
        Err(err) => {
            handle_error(err);
            return;
        }
    };

    let file_appender = tracing_appender::rolling::never(debug_log_dir, "debug.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    if env::var("RUST_LOG")
        .unwrap_or_else(|_| return "".to_string())
        .contains("chatdesk")
    {
        tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(writer)
            .init();
    }

    match cli::parse().await {
        Ok(true) => (),
        Ok(false) => process::exit(0),
        Err(err) => {
            handle_error(err);
            return;
        }
    }

    if let Err(err) = run().await {
        handle_error(err);
    }

    process::exit(0);
}
