//! Environment-driven configuration

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub notion_token: String,
    pub employees_db_id: String,
    pub communication_db_id: String,
    /// Chat for shout-out broadcasts; unset disables them
    pub shoutout_chat_id: Option<i64>,
    pub port: u16,
    pub session_timeout_secs: i64,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            telegram_token: required("TELEGRAM_BOT_TOKEN")?,
            notion_token: required("NOTION_TOKEN")?,
            employees_db_id: required("EMPLOYEES_DB_ID")?,
            communication_db_id: required("COMMUNICATION_DB_ID")?,
            shoutout_chat_id: std::env::var("SHOUTOUT_CHAT_ID")
                .ok()
                .and_then(|value| value.parse().ok()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(8000),
            session_timeout_secs: std::env::var("OPSDESK_SESSION_TIMEOUT_SECS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(crate::state_machine::state::DEFAULT_SESSION_TIMEOUT_SECS),
        })
    }
}
