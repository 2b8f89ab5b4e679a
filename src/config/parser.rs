use super::ConfigError;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub slack: SlackConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlackConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub bot_token: String,
    #[serde(alias = "channel", default = "default_notify_channel")]
    pub notify_channel: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SheetsConfig {
    #[serde(default = "default_log_table")]
    pub log_table: String,
    #[serde(default = "default_emoji_table")]
    pub emoji_table: String,
    /// Offset used when rendering `updated` as calendar time. Host local
    /// time when unset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            log_table: default_log_table(),
            emoji_table: default_emoji_table(),
            utc_offset_minutes: None,
        }
    }
}

impl SheetsConfig {
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NotifyConfig {
    /// Also announce members seen for the first time.
    #[serde(default)]
    pub on_new_member: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl DatabaseConfig {
    pub fn db_type(&self) -> DbType {
        let url = self.connection_string();
        if url.starts_with("memory://") {
            DbType::Memory
        } else {
            DbType::Sqlite
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(ref url) = self.url {
            url.clone()
        } else if let Some(ref file) = self.filename {
            format!("sqlite://{}", file)
        } else {
            String::new()
        }
    }

    pub fn sqlite_path(&self) -> Option<String> {
        if let DbType::Sqlite = self.db_type() {
            let url = self.connection_string();
            Some(url.strip_prefix("sqlite://").unwrap_or(&url).to_string())
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Sqlite,
    Memory,
}

impl Config {
    /// Parses the file and applies env overrides. Call `validate` once
    /// logging is up so its warnings are not lost.
    pub fn parse_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_from_str(&content)
    }

    pub fn parse_from_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("SLACK_BOT_TOKEN") {
            self.slack.bot_token = value;
        }
        if let Ok(value) = std::env::var("SLACK_NOTIFY_CHANNEL") {
            self.slack.notify_channel = value;
        }
        if let Ok(value) = std::env::var("DATABASE_URL") {
            self.database.url = Some(value);
        }
    }
}

fn default_api_url() -> String {
    "https://slack.com/api/".to_string()
}

fn default_notify_channel() -> String {
    "general".to_string()
}

fn default_page_limit() -> u32 {
    200
}

fn default_log_table() -> String {
    "log".to_string()
}

fn default_emoji_table() -> String {
    "emoji".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
