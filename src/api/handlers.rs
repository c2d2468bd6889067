//! HTTP handlers for the Task Tracker API.
//!
//! Every `/items` handler follows the same order: check the store link
//! (503 if unset), validate the request (400), run one store statement, map
//! the row(s) to the wire format.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;

use super::dto::{
    CreateItemRequest, DeleteItemResponse, ItemMutationResponse, ItemResponse, UpdateItemRequest,
};
use super::error::ApiErrorResponse;
use crate::domain::ItemId;
use crate::infrastructure::{ItemRepository, StoreLink};

// =============================================================================
// Application Configuration
// =============================================================================

/// Settings reported by the health and info endpoints.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Service name shown by `GET /` and `GET /info`.
    pub service_name: String,
    /// Message shown by `GET /info`.
    pub banner: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            banner: "Welcome to the task tracker service.".to_string(),
        }
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// The store is reached through a [`StoreLink`] rather than held directly,
/// so the server can accept requests before the database is reachable.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Connection-state holder for the item store.
    pub store: Arc<StoreLink>,
    /// Application configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Creates a new `AppState`.
    #[must_use]
    pub const fn new(store: Arc<StoreLink>, config: AppConfig) -> Self {
        Self { store, config }
    }

    /// Returns the repository, or a 503 response while the link is unset.
    fn repository(&self) -> Result<Arc<dyn ItemRepository + Send + Sync>, ApiErrorResponse> {
        self.store.repository().map_err(ApiErrorResponse::from)
    }
}

/// Parses an id path segment.
///
/// An id that is not an integer cannot match any row, so it is reported
/// as not found.
fn parse_item_id(raw: &str) -> Result<ItemId, ApiErrorResponse> {
    raw.parse()
        .map_err(|_| ApiErrorResponse::not_found(format!("Item {raw} not found")))
}

// =============================================================================
// GET / and GET /info Handlers
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub service: String,
    pub status: &'static str,
    /// `connected` or `disconnected`.
    pub db_status: &'static str,
}

/// Health check endpoint.
///
/// Always answers 200, even while the store link is down.
///
/// ```json
/// {
///   "service": "task-tracker-api",
///   "status": "online",
///   "db_status": "connected"
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        service: state.config.service_name.clone(),
        status: "online",
        db_status: if state.store.is_connected() {
            "connected"
        } else {
            "disconnected"
        },
    })
}

/// Service info response body.
#[derive(Debug, Clone, Serialize)]
pub struct InfoResponse {
    pub service: String,
    pub version: &'static str,
    pub message: String,
}

/// Service info endpoint. Never gated on the store.
pub async fn service_info(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse {
        service: state.config.service_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        message: state.config.banner.clone(),
    })
}

// =============================================================================
// GET /items Handler
// =============================================================================

/// Lists every item, newest first.
///
/// # Errors
///
/// - **503 Service Unavailable**: store link not established
/// - **500 Internal Server Error**: query failed
pub async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<ItemResponse>>, ApiErrorResponse> {
    let repository = state.repository()?;

    let records = repository.list().await?;

    Ok(Json(records.into_iter().map(ItemResponse::from).collect()))
}

// =============================================================================
// GET /items/{id} Handler
// =============================================================================

/// Returns a single item.
///
/// # Errors
///
/// - **404 Not Found**: no item with this id
/// - **503 Service Unavailable**: store link not established
/// - **500 Internal Server Error**: query failed
pub async fn get_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ItemResponse>, ApiErrorResponse> {
    let repository = state.repository()?;
    let id = parse_item_id(&raw_id)?;

    let record = repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiErrorResponse::not_found(format!("Item {id} not found")))?;

    Ok(Json(ItemResponse::from(record)))
}

// =============================================================================
// POST /items Handler
// =============================================================================

/// Creates an item with pending status.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Buy milk",
///   "description": "2%",
///   "due_date": "2025-01-10"
/// }
/// ```
///
/// # Errors
///
/// - **400 Bad Request**: `name` or `description` missing or blank,
///   malformed `due_date`, or a body that is not a JSON object of the
///   expected shape
/// - **503 Service Unavailable**: store link not established
/// - **500 Internal Server Error**: insert failed
pub async fn create_item(
    State(state): State<AppState>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ItemMutationResponse>), ApiErrorResponse> {
    let repository = state.repository()?;
    let Json(request) = payload?;
    let new_item = request.validate()?;

    let record = repository.create(new_item).await?;
    tracing::debug!(id = %record.id, "Item created");

    Ok((
        StatusCode::CREATED,
        Json(ItemMutationResponse {
            item: ItemResponse::from(record),
            message: "Item created successfully".to_string(),
        }),
    ))
}

// =============================================================================
// PUT /items/{id} Handler
// =============================================================================

/// Replaces every mutable field of an item.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Buy milk",
///   "description": "2%",
///   "completed": true,
///   "due_date": "2025-01-10"
/// }
/// ```
///
/// Omitting `due_date` clears the stored date.
///
/// # Errors
///
/// - **400 Bad Request**: missing or blank `name`/`description`, missing or
///   non-boolean `completed`, malformed `due_date`
/// - **404 Not Found**: no item with this id
/// - **503 Service Unavailable**: store link not established
/// - **500 Internal Server Error**: update failed
pub async fn update_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<ItemMutationResponse>, ApiErrorResponse> {
    let repository = state.repository()?;
    let Json(request) = payload?;
    let changes = request.validate()?;
    let id = parse_item_id(&raw_id)?;

    if !repository.update(id, changes.clone()).await? {
        return Err(ApiErrorResponse::not_found(format!(
            "Item {id} not found for update"
        )));
    }
    tracing::debug!(%id, status = %changes.status, "Item updated");

    Ok(Json(ItemMutationResponse {
        item: ItemResponse::from_changes(id, changes),
        message: "Item updated successfully".to_string(),
    }))
}

// =============================================================================
// DELETE /items/{id} Handler
// =============================================================================

/// Deletes an item.
///
/// # Errors
///
/// - **404 Not Found**: no item with this id
/// - **503 Service Unavailable**: store link not established
/// - **500 Internal Server Error**: delete failed
pub async fn delete_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DeleteItemResponse>, ApiErrorResponse> {
    let repository = state.repository()?;
    let id = parse_item_id(&raw_id)?;

    if !repository.delete(id).await? {
        return Err(ApiErrorResponse::not_found(format!(
            "Item {id} not found for deletion"
        )));
    }
    tracing::debug!(%id, "Item deleted");

    Ok(Json(DeleteItemResponse {
        id,
        message: "Item deleted successfully".to_string(),
    }))
}

// =============================================================================
// Tests
// =============================================================================
