//! Common test helpers for integration tests.
//!
//! Builds routers over in-memory or failing stores and drives them with
//! `tower::ServiceExt::oneshot`, so no socket or database is involved.
//!
//! # Note
//!
//! The `#![allow(dead_code)]` attribute is necessary because Rust compiles each
//! integration test file as a separate crate.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use task_tracker_api::api::{AppConfig, AppState, router};
use task_tracker_api::domain::{ItemChanges, ItemId, ItemRecord, NewItem};
use task_tracker_api::infrastructure::{
    InMemoryItemRepository, ItemRepository, RepositoryError, RepositoryFuture, StoreLink,
};

// =============================================================================
// State Helpers
// =============================================================================

/// Router over a connected, empty in-memory store.
pub fn connected_app() -> (Router, InMemoryItemRepository) {
    let repository = InMemoryItemRepository::new();
    let link = StoreLink::connected(Arc::new(repository.clone()));
    let state = AppState::new(Arc::new(link), AppConfig::default());
    (router(state), repository)
}

/// Router whose store link was never established.
pub fn disconnected_app() -> Router {
    router(AppState::new(Arc::new(StoreLink::new()), AppConfig::default()))
}

/// Router over a store whose every statement fails.
pub fn failing_app() -> Router {
    let link = StoreLink::connected(Arc::new(FailingItemRepository));
    router(AppState::new(Arc::new(link), AppConfig::default()))
}

/// Repository that reports a database error for every call.
pub struct FailingItemRepository;

fn failure<T: Send + 'static>() -> RepositoryFuture<T> {
    Box::pin(async {
        Err(RepositoryError::DatabaseError(
            "relation \"items\" does not exist".to_string(),
        ))
    })
}

impl ItemRepository for FailingItemRepository {
    fn list(&self) -> RepositoryFuture<Vec<ItemRecord>> {
        failure()
    }

    fn find_by_id(&self, _id: ItemId) -> RepositoryFuture<Option<ItemRecord>> {
        failure()
    }

    fn create(&self, _item: NewItem) -> RepositoryFuture<ItemRecord> {
        failure()
    }

    fn update(&self, _id: ItemId, _changes: ItemChanges) -> RepositoryFuture<bool> {
        failure()
    }

    fn delete(&self, _id: ItemId) -> RepositoryFuture<bool> {
        failure()
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Sends one request and returns the status with the parsed JSON body
/// (`Value::Null` for an empty body).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// JSON request with a raw body, for malformed payloads.
pub fn raw_json(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn json(method: Method, uri: &str, body: &Value) -> Request<Body> {
    raw_json(method, uri, &body.to_string())
}

/// Creates an item through the API and returns its id.
pub async fn create(app: &Router, name: &str, description: &str) -> i64 {
    let (status, body) = send(
        app,
        json(
            Method::POST,
            "/items",
            &serde_json::json!({ "name": name, "description": description }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["id"].as_i64().unwrap()
}
