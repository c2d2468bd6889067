//! Client side of the task tracker.
//!
//! A headless view model ([`board::TaskBoard`]) over an HTTP client
//! ([`http::HttpItemsApi`]). Rendering is left to the embedding UI; the
//! board's `Display` impl gives a plain-text listing.

pub mod board;
pub mod http;

pub use board::{EditSession, TaskBoard, TaskDraft};
pub use http::{ClientError, ClientFuture, DEFAULT_BASE_URL, HttpItemsApi, ItemsApi};
