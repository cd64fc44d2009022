//! Notion client
//!
//! Two narrow contracts against one API: the employees database supplies
//! the selectable-people directory, and the communication database is the
//! durable record store for completed reports.

use crate::report::{ReportRecord, SOURCE_TAG};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const NOTION_VERSION: &str = "2022-06-28";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// A selectable person from the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("notion api error: HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

pub struct NotionClient {
    http: reqwest::Client,
    token: String,
    employees_db_id: String,
    reports_db_id: String,
    base_url: String,
}

impl NotionClient {
    pub fn new(token: &str, employees_db_id: &str, reports_db_id: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            token: token.to_string(),
            employees_db_id: employees_db_id.to_string(),
            reports_db_id: reports_db_id.to_string(),
            base_url: "https://api.notion.com/v1".to_string(),
        }
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<Value, StoreError> {
        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StoreError::Network(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    StoreError::Network(format!("connection failed: {e}"))
                } else {
                    StoreError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Query active employees, sorted by name
    pub async fn list_active(&self) -> Result<Vec<Person>, StoreError> {
        let query = json!({
            "filter": { "property": "active", "checkbox": { "equals": true } },
            "sorts": [ { "property": "Name", "direction": "ascending" } ],
        });
        let response = self
            .post(&format!("/databases/{}/query", self.employees_db_id), &query)
            .await?;
        Ok(parse_people(&response))
    }

    /// Persist a completed report; returns the page id Notion assigned
    pub async fn create_report(&self, record: &ReportRecord) -> Result<String, StoreError> {
        let payload = json!({
            "parent": { "database_id": self.reports_db_id },
            "properties": report_properties(record),
        });
        let response = self.post("/pages", &payload).await?;
        response["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| StoreError::Decode("page response missing id".to_string()))
    }
}

/// Pull people out of a database-query response, skipping rows that do not
/// parse rather than failing the whole directory.
fn parse_people(response: &Value) -> Vec<Person> {
    let results = match response["results"].as_array() {
        Some(results) => results,
        None => return Vec::new(),
    };

    results
        .iter()
        .filter_map(|page| {
            let id = page["id"].as_str()?;
            let name = page["properties"]["Name"]["title"][0]["plain_text"].as_str();
            match name {
                Some(name) => Some(Person {
                    id: id.to_string(),
                    name: name.to_string(),
                }),
                None => {
                    tracing::warn!(page_id = %id, "Skipping employee page with no name");
                    None
                }
            }
        })
        .collect()
}

fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [ { "text": { "content": content } } ] })
}

/// Map a record onto the communication database's property set. Optional
/// fields are omitted entirely, not sent empty.
fn report_properties(record: &ReportRecord) -> Value {
    let mut properties = json!({
        "item_title": { "title": [ { "text": { "content": record.title.as_str() } } ] },
        "item_type": rich_text(record.kind.label()),
        "narrative": rich_text(&record.narrative),
        "occurred_at": { "date": { "start": record.occurred_at.format("%Y-%m-%dT%H:%M:%S").to_string() } },
        "submitted_anonymously": { "checkbox": record.anonymous },
        "source": rich_text(SOURCE_TAG),
    });

    if let Some(reporter) = &record.reporter_name {
        properties["reporter"] = rich_text(reporter);
    }
    if let Some(person) = &record.person_name {
        properties["person_of_focus"] = rich_text(person);
    }
    if let Some(area) = &record.area {
        properties["area_or_equipment"] = rich_text(area);
    }
    if !record.photo_urls.is_empty() {
        let files: Vec<Value> = record
            .photo_urls
            .iter()
            .enumerate()
            .map(|(i, url)| {
                json!({
                    "type": "external",
                    "name": format!("Photo {}", i + 1),
                    "external": { "url": url },
                })
            })
            .collect();
        properties["images"] = json!({ "files": files });
    }

    properties
}
