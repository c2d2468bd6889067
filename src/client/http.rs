//! HTTP access to the items API.
//!
//! [`ItemsApi`] is the seam the client view talks through; [`HttpItemsApi`]
//! implements it with `reqwest`. One request per call, no retries, no
//! cancellation.

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::dto::{CreateItemRequest, ItemResponse, UpdateItemRequest};
use crate::domain::ItemId;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

// =============================================================================
// Client Error
// =============================================================================

/// Errors that can occur while talking to the API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request could not be sent or the response not read.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The API answered with a non-success status.
    #[error("API responded with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Future returned by API calls.
pub type ClientFuture<T> = BoxFuture<'static, Result<T, ClientError>>;

// =============================================================================
// Items API
// =============================================================================

/// Operations the client view issues against the server.
pub trait ItemsApi: Send + Sync {
    /// `GET /items`
    fn list(&self) -> ClientFuture<Vec<ItemResponse>>;

    /// `POST /items`; returns the created item.
    fn create(&self, request: CreateItemRequest) -> ClientFuture<ItemResponse>;

    /// `PUT /items/{id}`; returns the server's echo of the update.
    fn update(&self, id: ItemId, request: UpdateItemRequest) -> ClientFuture<ItemResponse>;

    /// `DELETE /items/{id}`
    fn delete(&self, id: ItemId) -> ClientFuture<()>;
}

/// `reqwest` implementation of [`ItemsApi`].
#[derive(Debug, Clone)]
pub struct HttpItemsApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpItemsApi {
    /// Creates a client for the API at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the normalised base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn items_url(&self) -> String {
        format!("{}/items", self.base_url)
    }

    fn item_url(&self, id: ItemId) -> String {
        format!("{}/items/{id}", self.base_url)
    }
}

impl Default for HttpItemsApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Turns a non-success status into `ClientError::Status`, keeping the body
/// for the log.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|error| ClientError::Decode(error.to_string()))
}

impl ItemsApi for HttpItemsApi {
    fn list(&self) -> ClientFuture<Vec<ItemResponse>> {
        let request = self.client.get(self.items_url());
        Box::pin(async move { decode(request.send().await?).await })
    }

    fn create(&self, body: CreateItemRequest) -> ClientFuture<ItemResponse> {
        let request = self.client.post(self.items_url()).json(&body);
        Box::pin(async move { decode(request.send().await?).await })
    }

    fn update(&self, id: ItemId, body: UpdateItemRequest) -> ClientFuture<ItemResponse> {
        let request = self.client.put(self.item_url(id)).json(&body);
        Box::pin(async move { decode(request.send().await?).await })
    }

    fn delete(&self, id: ItemId) -> ClientFuture<()> {
        let request = self.client.delete(self.item_url(id));
        Box::pin(async move {
            ensure_success(request.send().await?).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:5000", "http://localhost:5000/items")]
    #[case("http://localhost:5000/", "http://localhost:5000/items")]
    #[case("http://api.local//", "http://api.local/items")]
    fn test_items_url_normalises_trailing_slash(#[case] base: &str, #[case] expected: &str) {
        let api = HttpItemsApi::new(base);
        assert_eq!(api.items_url(), expected);
    }

    #[rstest]
    fn test_item_url() {
        let api = HttpItemsApi::default();
        assert_eq!(api.base_url(), DEFAULT_BASE_URL);
        assert_eq!(api.item_url(ItemId::new(3)), "http://localhost:5000/items/3");
    }

    #[rstest]
    fn test_status_error_message() {
        let error = ClientError::Status {
            status: 503,
            body: "{}".to_string(),
        };
        assert_eq!(error.to_string(), "API responded with status 503: {}");
    }
}
