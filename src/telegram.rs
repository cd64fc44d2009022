//! Telegram Bot API client
//!
//! The messaging gateway and the media resolver in one client: long-poll
//! `getUpdates` drives the dispatch loop, `sendMessage`/`sendPhoto` carry
//! prompts and broadcasts, and `getFile` turns an attachment reference
//! into a fetchable download URL.

pub mod types;

use crate::state_machine::Keyboard;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use thiserror::Error;
use types::{ApiResponse, FileInfo, InlineKeyboardButton, InlineKeyboardMarkup, Update};

/// Long-poll hold time requested from Telegram
const POLL_TIMEOUT_SECS: u64 = 25;
/// Client-side deadline; must exceed the poll hold time
const POLL_DEADLINE_SECS: u64 = 35;
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("telegram api rejected the call: {0}")]
    Api(String),
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl GatewayError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Network(format!("request timeout: {e}"))
        } else if e.is_connect() {
            GatewayError::Network(format!("connection failed: {e}"))
        } else {
            GatewayError::Network(e.to_string())
        }
    }
}

pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    file_base_url: String,
    /// Next `getUpdates` offset (last seen update_id + 1)
    offset: AtomicI64,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: format!("https://api.telegram.org/bot{token}"),
            file_base_url: format!("https://api.telegram.org/file/bot{token}"),
            offset: AtomicI64::new(0),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
        deadline: Duration,
    ) -> Result<T, GatewayError> {
        let response = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .timeout(deadline)
            .json(payload)
            .send()
            .await
            .map_err(GatewayError::from_reqwest)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Network(format!("failed to read response: {e}")))?;

        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                GatewayError::Decode(format!("{method}: {e}"))
            } else {
                GatewayError::Api(format!("{method}: HTTP {status}: {body}"))
            }
        })?;

        if !envelope.ok {
            return Err(GatewayError::Api(format!(
                "{method}: {}",
                envelope.description.unwrap_or_else(|| "no description".to_string())
            )));
        }
        envelope
            .result
            .ok_or_else(|| GatewayError::Decode(format!("{method}: ok response without result")))
    }

    /// Long-poll for the next batch of updates, advancing the offset past
    /// everything returned.
    pub async fn get_updates(&self) -> Result<Vec<Update>, GatewayError> {
        let mut payload = json!({ "timeout": POLL_TIMEOUT_SECS });
        let offset = self.offset.load(Ordering::Relaxed);
        if offset > 0 {
            payload["offset"] = json!(offset);
        }

        let updates: Vec<Update> = self
            .call("getUpdates", &payload, Duration::from_secs(POLL_DEADLINE_SECS))
            .await?;

        if let Some(last) = updates.last() {
            self.offset.store(last.update_id + 1, Ordering::Relaxed);
        }
        Ok(updates)
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), GatewayError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(rows) = keyboard {
            payload["reply_markup"] = serde_json::to_value(markup_from(rows))
                .map_err(|e| GatewayError::Decode(e.to_string()))?;
        }

        // sendMessage returns the sent Message; we only care that it landed
        let _: Value = self
            .call("sendMessage", &payload, Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .await?;
        Ok(())
    }

    pub async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
    ) -> Result<(), GatewayError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "photo": photo_url,
            "parse_mode": "HTML",
        });
        if let Some(caption) = caption {
            payload["caption"] = json!(caption);
        }
        let _: Value = self
            .call("sendPhoto", &payload, Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .await?;
        Ok(())
    }

    pub async fn answer_callback(&self, callback_id: &str) -> Result<(), GatewayError> {
        let payload = json!({ "callback_query_id": callback_id });
        let _: Value = self
            .call(
                "answerCallbackQuery",
                &payload,
                Duration::from_secs(REQUEST_TIMEOUT_SECS),
            )
            .await?;
        Ok(())
    }

    /// Resolve a file id into a durable download URL via `getFile`
    pub async fn resolve_file(&self, file_id: &str) -> Result<String, GatewayError> {
        let payload = json!({ "file_id": file_id });
        let info: FileInfo = self
            .call("getFile", &payload, Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .await?;
        let path = info
            .file_path
            .ok_or_else(|| GatewayError::Decode("getFile result missing file_path".to_string()))?;
        Ok(format!("{}/{path}", self.file_base_url))
    }
}

fn markup_from(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: keyboard
            .iter()
            .map(|row| {
                row.iter()
                    .map(|choice| InlineKeyboardButton {
                        text: choice.label.clone(),
                        callback_data: choice.data.clone(),
                    })
                    .collect()
            })
            .collect(),
    }
}
