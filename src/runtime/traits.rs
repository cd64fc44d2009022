//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the dispatcher with mock implementations.

use crate::notion::{NotionClient, Person, StoreError};
use crate::report::ReportRecord;
use crate::state_machine::Keyboard;
use crate::telegram::{GatewayError, TelegramClient};
use async_trait::async_trait;
use std::sync::Arc;

/// Outbound messaging to the chat surface
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send a text prompt, optionally with an inline keyboard
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), GatewayError>;

    /// Send a photo by URL, optionally captioned
    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
    ) -> Result<(), GatewayError>;

    /// Acknowledge a button press so the client stops its spinner
    async fn answer_callback(&self, callback_id: &str) -> Result<(), GatewayError>;
}

/// Resolution of opaque attachment references into durable URLs
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, file_id: &str) -> Result<String, GatewayError>;
}

/// Durable storage for completed reports
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a record; returns the store-assigned identifier
    async fn create_report(&self, record: &ReportRecord) -> Result<String, StoreError>;
}

/// The selectable-people directory
#[async_trait]
pub trait Directory: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Person>, StoreError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Gateway + ?Sized> Gateway for Arc<T> {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), GatewayError> {
        (**self).send_text(chat_id, text, keyboard).await
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
    ) -> Result<(), GatewayError> {
        (**self).send_photo(chat_id, photo_url, caption).await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), GatewayError> {
        (**self).answer_callback(callback_id).await
    }
}

#[async_trait]
impl<T: MediaResolver + ?Sized> MediaResolver for Arc<T> {
    async fn resolve(&self, file_id: &str) -> Result<String, GatewayError> {
        (**self).resolve(file_id).await
    }
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn create_report(&self, record: &ReportRecord) -> Result<String, StoreError> {
        (**self).create_report(record).await
    }
}

#[async_trait]
impl<T: Directory + ?Sized> Directory for Arc<T> {
    async fn list_active(&self) -> Result<Vec<Person>, StoreError> {
        (**self).list_active().await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl Gateway for TelegramClient {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), GatewayError> {
        self.send_message(chat_id, text, keyboard).await
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
    ) -> Result<(), GatewayError> {
        TelegramClient::send_photo(self, chat_id, photo_url, caption).await
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), GatewayError> {
        TelegramClient::answer_callback(self, callback_id).await
    }
}

#[async_trait]
impl MediaResolver for TelegramClient {
    async fn resolve(&self, file_id: &str) -> Result<String, GatewayError> {
        self.resolve_file(file_id).await
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn create_report(&self, record: &ReportRecord) -> Result<String, StoreError> {
        NotionClient::create_report(self, record).await
    }
}

#[async_trait]
impl Directory for NotionClient {
    async fn list_active(&self) -> Result<Vec<Person>, StoreError> {
        NotionClient::list_active(self).await
    }
}
