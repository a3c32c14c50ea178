//! Configuration loader and validator for the homework status bot.
use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use teloxide::types::{ChatId, Recipient};
use thiserror::Error;

use crate::practicum::DEFAULT_ENDPOINT;

pub const ENV_PRACTICUM_TOKEN: &str = "PRACTICUM_TOKEN";
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_PRACTICUM_ENDPOINT: &str = "PRACTICUM_ENDPOINT";
pub const ENV_RETRY_TIME: &str = "RETRY_TIME";
pub const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT";

const DEFAULT_RETRY_SECS: u64 = 600;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration, mirroring the optional YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub app: App,
    pub practicum: Practicum,
    pub telegram: Telegram,
}

/// Loop timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct App {
    pub retry_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for App {
    fn default() -> Self {
        Self {
            retry_secs: DEFAULT_RETRY_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Homework API credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Practicum {
    pub token: String,
    pub endpoint: String,
}

impl Default for Practicum {
    fn default() -> Self {
        Self {
            token: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// Telegram bot settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Telegram {
    pub bot_token: String,
    /// Numeric chat id or `@channelusername`.
    #[serde(deserialize_with = "deserialize_recipient")]
    pub chat_id: Option<Recipient>,
}

/// Integers address a chat by id, anything else is a channel username.
pub fn parse_recipient(raw: &str) -> Recipient {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(raw.to_string()),
    }
}

fn deserialize_recipient<'de, D>(deserializer: D) -> Result<Option<Recipient>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Id(i64),
        Name(String),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Id(id) => Recipient::Id(ChatId(id)),
        Raw::Name(name) => parse_recipient(&name),
    }))
}

impl Config {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.app.retry_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.app.request_timeout_secs)
    }

    /// Overlay values from an environment lookup. Set, non-empty variables win
    /// over whatever the file provided.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(token) = get(ENV_PRACTICUM_TOKEN) {
            self.practicum.token = token;
        }
        if let Some(endpoint) = get(ENV_PRACTICUM_ENDPOINT) {
            self.practicum.endpoint = endpoint;
        }
        if let Some(token) = get(ENV_TELEGRAM_TOKEN) {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = get(ENV_TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = Some(parse_recipient(&chat_id));
        }
        if let Some(secs) = get(ENV_RETRY_TIME) {
            self.app.retry_secs = secs
                .parse()
                .map_err(|_| ConfigError::Invalid("RETRY_TIME must be a number of seconds"))?;
        }
        if let Some(secs) = get(ENV_REQUEST_TIMEOUT) {
            self.app.request_timeout_secs = secs
                .parse()
                .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT must be a number of seconds"))?;
        }
        Ok(())
    }
}

/// Load configuration from an optional YAML file, overlay the process
/// environment, and validate it.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut cfg = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            serde_yaml::from_str(&content)?
        }
        None => Config::default(),
    };
    cfg.apply_env(|key| std::env::var(key).ok())?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance. Required credentials are checked first,
/// in the order they are documented.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.practicum.token.trim().is_empty() {
        return Err(ConfigError::Missing(ENV_PRACTICUM_TOKEN));
    }
    if cfg.telegram.bot_token.trim().is_empty() {
        return Err(ConfigError::Missing(ENV_TELEGRAM_TOKEN));
    }
    match &cfg.telegram.chat_id {
        None => return Err(ConfigError::Missing(ENV_TELEGRAM_CHAT_ID)),
        Some(Recipient::ChannelUsername(name)) if name.trim().is_empty() => {
            return Err(ConfigError::Missing(ENV_TELEGRAM_CHAT_ID))
        }
        Some(_) => {}
    }

    if Url::parse(&cfg.practicum.endpoint).is_err() {
        return Err(ConfigError::Invalid("practicum.endpoint must be a valid URL"));
    }
    if cfg.app.retry_secs == 0 {
        return Err(ConfigError::Invalid("app.retry_secs must be > 0"));
    }
    if cfg.app.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid("app.request_timeout_secs must be > 0"));
    }

    Ok(())
}

/// Example YAML accepted by `--config`.
pub fn example() -> &'static str {
    r#"app:
  retry_secs: 600
  request_timeout_secs: 30

practicum:
  token: "YOUR_PRACTICUM_OAUTH_TOKEN"
  endpoint: "https://practicum.yandex.ru/api/user_api/homework_statuses/"

telegram:
  bot_token: "YOUR_TELEGRAM_BOT_TOKEN"
  chat_id: 123456789
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_PRACTICUM_TOKEN, "practicum"),
            (ENV_TELEGRAM_TOKEN, "telegram"),
            (ENV_TELEGRAM_CHAT_ID, "42"),
        ]
    }

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.telegram.chat_id, Some(Recipient::Id(ChatId(123456789))));
        assert_eq!(cfg.retry_interval(), Duration::from_secs(600));
    }

    #[test]
    fn env_only_config_uses_defaults() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&full_env())).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.practicum.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.app.retry_secs, 600);
        assert_eq!(cfg.telegram.chat_id, Some(Recipient::Id(ChatId(42))));
    }

    #[test]
    fn each_missing_credential_is_reported() {
        for missing in [ENV_PRACTICUM_TOKEN, ENV_TELEGRAM_TOKEN, ENV_TELEGRAM_CHAT_ID] {
            let pairs: Vec<_> = full_env().into_iter().filter(|(k, _)| *k != missing).collect();
            let mut cfg = Config::default();
            cfg.apply_env(env(&pairs)).unwrap();
            match validate(&cfg).unwrap_err() {
                ConfigError::Missing(key) => assert_eq!(key, missing),
                other => panic!("wrong error: {other}"),
            }
        }
    }

    #[test]
    fn empty_values_count_as_missing() {
        let mut pairs = full_env();
        pairs[1] = (ENV_TELEGRAM_TOKEN, "   ");
        let mut cfg = Config::default();
        cfg.apply_env(env(&pairs)).unwrap();
        assert!(matches!(
            validate(&cfg),
            Err(ConfigError::Missing(ENV_TELEGRAM_TOKEN))
        ));
    }

    #[test]
    fn channel_username_chat_id_is_accepted() {
        let mut pairs = full_env();
        pairs[2] = (ENV_TELEGRAM_CHAT_ID, "@my_channel");
        let mut cfg = Config::default();
        cfg.apply_env(env(&pairs)).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(
            cfg.telegram.chat_id,
            Some(Recipient::ChannelUsername("@my_channel".into()))
        );
    }

    #[test]
    fn yaml_chat_id_accepts_numbers_and_names() {
        let cfg: Config = serde_yaml::from_str("telegram:\n  chat_id: \"@news\"\n").unwrap();
        assert_eq!(
            cfg.telegram.chat_id,
            Some(Recipient::ChannelUsername("@news".into()))
        );

        let cfg: Config = serde_yaml::from_str("telegram:\n  chat_id: \"-100\"\n").unwrap();
        assert_eq!(cfg.telegram.chat_id, Some(Recipient::Id(ChatId(-100))));
    }

    #[test]
    fn blank_yaml_chat_id_is_missing() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.telegram.chat_id = Some(Recipient::ChannelUsername(" ".into()));
        assert!(matches!(
            validate(&cfg),
            Err(ConfigError::Missing(ENV_TELEGRAM_CHAT_ID))
        ));
    }

    #[test]
    fn invalid_timing_and_endpoint() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.retry_secs = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.request_timeout_secs = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.practicum.endpoint = "not a url".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("endpoint")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.apply_env(env(&[(ENV_TELEGRAM_CHAT_ID, "-1001"), (ENV_RETRY_TIME, "5")]))
            .unwrap();
        assert_eq!(cfg.telegram.chat_id, Some(Recipient::Id(ChatId(-1001))));
        assert_eq!(cfg.app.retry_secs, 5);
        assert_eq!(cfg.practicum.token, "YOUR_PRACTICUM_OAUTH_TOKEN");
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: Config = serde_yaml::from_str("telegram:\n  chat_id: 7\n").unwrap();
        assert_eq!(cfg.telegram.chat_id, Some(Recipient::Id(ChatId(7))));
        assert_eq!(cfg.app, App::default());
        assert_eq!(cfg.practicum.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert!(!cfg.practicum.token.is_empty());
        assert!(cfg.telegram.chat_id.is_some());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let td = tempdir().unwrap();
        let err = load(Some(&td.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
