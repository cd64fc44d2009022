//! Mock implementations for testing
//!
//! These mocks enable integration testing the dispatch path without real
//! network I/O.

use super::traits::{Directory, Gateway, MediaResolver, RecordStore};
use crate::notion::{Person, StoreError};
use crate::report::ReportRecord;
use crate::state_machine::Keyboard;
use crate::telegram::GatewayError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

// ============================================================================
// Mock Gateway
// ============================================================================

/// Records every outbound message instead of sending it
pub struct MockGateway {
    texts: Mutex<Vec<(i64, String, Option<Keyboard>)>>,
    photos: Mutex<Vec<(i64, String, Option<String>)>>,
    callbacks: Mutex<Vec<String>>,
    photo_failures: Mutex<usize>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            texts: Mutex::new(Vec::new()),
            photos: Mutex::new(Vec::new()),
            callbacks: Mutex::new(Vec::new()),
            photo_failures: Mutex::new(0),
        }
    }

    /// Make the next `count` photo sends fail
    pub fn fail_photo_sends(&self, count: usize) {
        *self.photo_failures.lock().unwrap() = count;
    }

    pub fn sent_texts(&self) -> Vec<(i64, String, Option<Keyboard>)> {
        self.texts.lock().unwrap().clone()
    }

    pub fn sent_photos(&self) -> Vec<(i64, String, Option<String>)> {
        self.photos.lock().unwrap().clone()
    }

    pub fn answered_callbacks(&self) -> Vec<String> {
        self.callbacks.lock().unwrap().clone()
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn send_text(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), GatewayError> {
        self.texts
            .lock()
            .unwrap()
            .push((chat_id, text.to_string(), keyboard.cloned()));
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo_url: &str,
        caption: Option<&str>,
    ) -> Result<(), GatewayError> {
        {
            let mut failures = self.photo_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(GatewayError::Network("photo send failed".to_string()));
            }
        }
        self.photos.lock().unwrap().push((
            chat_id,
            photo_url.to_string(),
            caption.map(str::to_string),
        ));
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<(), GatewayError> {
        self.callbacks.lock().unwrap().push(callback_id.to_string());
        Ok(())
    }
}

// ============================================================================
// Mock Media Resolver
// ============================================================================

/// Resolves only the file ids it was seeded with; everything else errors
pub struct MockResolver {
    files: HashMap<String, String>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    pub fn with_file(mut self, file_id: impl Into<String>, url: impl Into<String>) -> Self {
        self.files.insert(file_id.into(), url.into());
        self
    }
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaResolver for MockResolver {
    async fn resolve(&self, file_id: &str) -> Result<String, GatewayError> {
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api(format!("unknown file id: {file_id}")))
    }
}

// ============================================================================
// Mock Record Store
// ============================================================================

/// Returns queued responses and records every submitted report
pub struct MockRecordStore {
    responses: Mutex<VecDeque<Result<String, StoreError>>>,
    records: Mutex<Vec<ReportRecord>>,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_response(&self, response: Result<String, StoreError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn recorded(&self) -> Vec<ReportRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn create_report(&self, record: &ReportRecord) -> Result<String, StoreError> {
        self.records.lock().unwrap().push(record.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StoreError::Network("no mock response queued".to_string())))
    }
}

// ============================================================================
// Mock Directory
// ============================================================================

pub struct MockDirectory {
    people: Vec<Person>,
    fail: bool,
}

impl MockDirectory {
    pub fn with_people(people: Vec<Person>) -> Self {
        Self {
            people,
            fail: false,
        }
    }

    /// A directory whose every lookup fails
    pub fn failing() -> Self {
        Self {
            people: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl Directory for MockDirectory {
    async fn list_active(&self) -> Result<Vec<Person>, StoreError> {
        if self.fail {
            return Err(StoreError::Network("directory unavailable".to_string()));
        }
        Ok(self.people.clone())
    }
}
