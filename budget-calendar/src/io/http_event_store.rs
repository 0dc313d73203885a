//! HTTP client for the event store.
//!
//! Events are listed with `GET {events_path}`; every change is a
//! `POST {spend_path}` whose JSON body carries an `action` of `add`,
//! `update` or `delete`. The store replies `{"message": ...}` both on
//! success (200) and on failure (any other status).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use shared::{Event, EventFields, SpendAction, SpendRequest, SpendResponse};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::io::event_store::{EventStore, StoreError};

/// Event store reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpEventStore {
    http_client: Client,
    events_url: String,
    spend_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpEventStore {
    pub fn new(config: &AppConfig) -> Result<Self, StoreError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| StoreError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            events_url: config.endpoint(&config.events_path),
            spend_url: config.endpoint(&config.spend_path),
        })
    }

    async fn post_spend(&self, request: SpendRequest) -> Result<SpendResponse, StoreError> {
        let action = request.action;
        info!("POST {} - action: {:?}, event: {:?}", self.spend_url, action, request.event_id);

        let response = self
            .http_client
            .post(&self.spend_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", self.spend_url, e);
                StoreError::Network(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Network(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Operation failed.".to_string());
            warn!("Event store rejected {:?} with {}: {}", action, status, message);
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let mut reply = if body.trim().is_empty() {
            SpendResponse {
                message: String::new(),
                event: None,
            }
        } else {
            serde_json::from_str::<SpendResponse>(&body).map_err(|e| {
                error!("Could not parse /spend reply: {}", e);
                StoreError::Decode(e.to_string())
            })?
        };
        if reply.message.trim().is_empty() {
            reply.message = default_success_message(action).to_string();
        }
        Ok(reply)
    }
}

fn default_success_message(action: SpendAction) -> &'static str {
    match action {
        SpendAction::Add => "Expense added successfully!",
        SpendAction::Update => "Expense updated successfully!",
        SpendAction::Delete => "Expense deleted successfully!",
    }
}

#[async_trait]
impl EventStore for HttpEventStore {
    async fn list(&self) -> Result<Vec<Event>, StoreError> {
        debug!("GET {}", self.events_url);

        let response = self
            .http_client
            .get(&self.events_url)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to fetch events: {}", e);
                StoreError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("Failed to load expenses ({})", status));
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let records: Vec<Value> = response.json().await.map_err(|e| {
            error!("Failed to parse events: {}", e);
            StoreError::Decode(e.to_string())
        })?;

        let total = records.len();
        let events: Vec<Event> = records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Event>(record) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Skipping unreadable event record: {}", e);
                    None
                }
            })
            .collect();
        info!("Fetched {} events ({} skipped)", events.len(), total - events.len());
        Ok(events)
    }

    async fn create(&self, fields: EventFields) -> Result<SpendResponse, StoreError> {
        self.post_spend(SpendRequest::add(fields)).await
    }

    async fn update(&self, event_id: &str, fields: EventFields) -> Result<SpendResponse, StoreError> {
        self.post_spend(SpendRequest::update(event_id, fields)).await
    }

    async fn delete(&self, event_id: &str) -> Result<SpendResponse, StoreError> {
        self.post_spend(SpendRequest::delete(event_id)).await
    }
}
