//! # Event Store Interface
//!
//! The event store is the external service that owns every expense record.
//! The calendar only reads snapshots from it and sends it add, update and
//! delete requests; this trait is the seam between the two, so the
//! controller works the same against the HTTP client or a test double.

use async_trait::async_trait;
use shared::{Event, EventFields, SpendAction, SpendRequest, SpendResponse};

/// Failures reported by the event store, worded for the user
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached at all
    #[error("Network error or server issue.")]
    Network(String),
    /// The store answered with a non-success status
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// The store answered with something that is not the expected JSON
    #[error("Unexpected response from the server.")]
    Decode(String),
    /// The request could not be built, e.g. an update without an id
    #[error("{0}")]
    InvalidRequest(String),
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Snapshot of every stored event
    async fn list(&self) -> Result<Vec<Event>, StoreError>;

    async fn create(&self, fields: EventFields) -> Result<SpendResponse, StoreError>;

    async fn update(&self, event_id: &str, fields: EventFields) -> Result<SpendResponse, StoreError>;

    async fn delete(&self, event_id: &str) -> Result<SpendResponse, StoreError>;

    /// Dispatch a prepared `/spend` request to the matching operation
    async fn submit(&self, request: SpendRequest) -> Result<SpendResponse, StoreError> {
        match (request.action, request.fields, request.event_id) {
            (SpendAction::Add, Some(fields), _) => self.create(fields).await,
            (SpendAction::Update, Some(fields), Some(event_id)) => {
                self.update(&event_id, fields).await
            }
            (SpendAction::Delete, _, Some(event_id)) => self.delete(&event_id).await,
            (action, _, _) => Err(StoreError::InvalidRequest(format!(
                "Incomplete {:?} request",
                action
            ))),
        }
    }
}
