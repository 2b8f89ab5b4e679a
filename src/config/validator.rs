use thiserror::Error;
use tracing::warn;
use url::Url;

use super::Config;

const MAX_OFFSET_MINUTES: i32 = 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.connection_string().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database connection string cannot be empty".to_string(),
            ));
        }

        if Url::parse(&self.slack.api_url).is_err() {
            return Err(ConfigError::InvalidConfig(format!(
                "slack.api_url is not a valid url: {}",
                self.slack.api_url
            )));
        }

        if self.slack.page_limit == 0 {
            return Err(ConfigError::InvalidConfig(
                "slack.page_limit must be greater than 0".to_string(),
            ));
        }

        let sheets = &self.sheets;
        if sheets.log_table.is_empty() || sheets.emoji_table.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "sheets.log_table and sheets.emoji_table cannot be empty".to_string(),
            ));
        }
        if sheets.log_table == sheets.emoji_table {
            return Err(ConfigError::InvalidConfig(
                "sheets.log_table and sheets.emoji_table must differ".to_string(),
            ));
        }

        if let Some(minutes) = sheets.utc_offset_minutes {
            if minutes.abs() >= MAX_OFFSET_MINUTES {
                return Err(ConfigError::InvalidConfig(format!(
                    "sheets.utc_offset_minutes out of range: {}",
                    minutes
                )));
            }
        }

        for warning in self.warnings() {
            warn!("{}", warning);
        }

        Ok(())
    }

    /// Problems that do not stop a run.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        // Slack rejects an empty token with ok=false; that is reported per request.
        if self.slack.bot_token.is_empty() {
            warnings.push("slack.bot_token is empty, api calls will fail authentication".to_string());
        }
        warnings
    }
}
