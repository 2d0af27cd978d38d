#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;
use std::str::FromStr;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ApiKey,
    CompletionURL,
    ConfigFile,
    DataDir,
    MaxTokens,
    Model,
    ModelComplex,
    ModelSimple,
    RemoteLibrary,
    SiteToken,
    SiteURL,
    StreamIdleTimeout,
    Username,
}

/// Model value that lets the input decide between the simple and complex
/// models.
pub const AUTO_MODEL: &str = "auto";

fn app_dir(base: Option<path::PathBuf>) -> path::PathBuf {
    return base
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("chatdesk");
}

fn default_username() -> String {
    let user = env::var("USER").unwrap_or_else(|_| return "".to_string());
    if user.is_empty() {
        return "User".to_string();
    }

    return user;
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    /// Parses a numeric setting, naming the key when the value is invalid.
    pub fn parse<T: FromStr>(key: ConfigKey) -> Result<T> {
        let val = Config::get(key);
        match val.trim().parse::<T>() {
            Ok(res) => return Ok(res),
            Err(_) => bail!("Config key '{key}' has an invalid value: {val}"),
        }
    }

    pub fn default(key: ConfigKey) -> String {
        let config_path = app_dir(dirs::config_dir()).join("config.toml");
        let data_dir = app_dir(dirs::data_dir());

        let res = match key {
            ConfigKey::ApiKey => "".to_string(),
            ConfigKey::CompletionURL => "https://api.openai.com/v1/chat/completions".to_string(),
            ConfigKey::MaxTokens => "4096".to_string(),
            ConfigKey::Model => AUTO_MODEL.to_string(),
            ConfigKey::ModelComplex => "gpt-4o".to_string(),
            ConfigKey::ModelSimple => "gpt-4o-mini".to_string(),
            ConfigKey::RemoteLibrary => "".to_string(),
            ConfigKey::SiteToken => "".to_string(),
            ConfigKey::SiteURL => "".to_string(),
            ConfigKey::StreamIdleTimeout => "120".to_string(),

            // Special
            ConfigKey::ConfigFile => config_path.to_string_lossy().to_string(),
            ConfigKey::DataDir => data_dir.to_string_lossy().to_string(),
            ConfigKey::Username => default_username(),
        };

        return res;
    }

    /// True when a document library is configured, which moves chat history
    /// off the local machine.
    pub fn uses_remote_store() -> bool {
        return !Config::get(ConfigKey::RemoteLibrary).trim().is_empty()
            && !Config::get(ConfigKey::SiteURL).trim().is_empty();
    }

    pub async fn load(clap_arg_matches: Vec<&ArgMatches>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let mut config_file = Config::default(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(&config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if key == ConfigKey::ConfigFile {
                    continue;
                }

                let val = match doc.get(&key.to_string()) {
                    Some(val) => val,
                    None => continue,
                };

                if let Some(val_int) = val.as_integer() {
                    Config::set(key, &val_int.to_string());
                } else if let Some(val_str) = val.as_str() {
                    if val_str.is_empty() {
                        continue;
                    }
                    Config::set(key, val_str);
                } else {
                    bail!("config.toml has an invalid value for key '{key}': expected a string or an integer");
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    Config::set(key, val)
                }
            }
        }

        Config::parse::<u32>(ConfigKey::MaxTokens)?;
        Config::parse::<u64>(ConfigKey::StreamIdleTimeout)?;

        tracing::debug!(
            username = Config::get(ConfigKey::Username),
            completion_url = Config::get(ConfigKey::CompletionURL),
            model = Config::get(ConfigKey::Model),
            model_simple = Config::get(ConfigKey::ModelSimple),
            model_complex = Config::get(ConfigKey::ModelComplex),
            remote_library = Config::get(ConfigKey::RemoteLibrary),
            site_url = Config::get(ConfigKey::SiteURL),
            data_dir = Config::get(ConfigKey::DataDir),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                if key == ConfigKey::Username {
                    return Some(
                        "# Your name, shown in the greeting.\n# username = \"\"".to_string(),
                    );
                }

                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key.to_string().as_str()))?;

                let description = arg
                    .get_help()
                    .map(|help| return help.to_string())
                    .unwrap_or_default()
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                let mut val = Config::default(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i64>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
