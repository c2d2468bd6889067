//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod dto;
pub mod error;
pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use dto::{
    CreateItemRequest, DeleteItemResponse, ItemMutationResponse, ItemResponse, UpdateItemRequest,
};
pub use error::{ApiError, ApiErrorResponse, FieldError, ValidationError};
pub use handlers::{
    AppConfig, AppState, HealthResponse, InfoResponse, create_item, delete_item, get_item,
    health_check, list_items, service_info, update_item,
};

/// Builds the application router.
///
/// CORS is wide open: the browser client is served from another origin.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health_check))
        .route("/info", get(service_info))
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
