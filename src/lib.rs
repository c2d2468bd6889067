//! Task Tracker API Library
//!
//! This library provides the REST backend for a personal task tracker
//! (one `items` table exposed through five CRUD endpoints) together with a
//! headless client view that mirrors the server state locally.

pub mod api;
pub mod client;
pub mod domain;
pub mod infrastructure;
