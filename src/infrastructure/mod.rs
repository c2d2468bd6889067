//! Infrastructure module for the item store.
//!
//! This module contains the repository trait, its `PostgreSQL` and in-memory
//! implementations, the connection-state holder, and configuration.

pub mod factory;
pub mod in_memory;
pub mod link;
pub mod postgres;
pub mod repository;

pub use factory::{
    ConfigurationError, DatabaseConfig, StorageMode, StoreConfig, create_connector,
};
pub use in_memory::{InMemoryConnector, InMemoryItemRepository};
pub use link::{
    DEFAULT_RETRY_DELAY, StoreConnector, StoreLink, connect_with_retry, spawn_connect_loop,
};
pub use postgres::{PostgresConnector, PostgresItemRepository};
pub use repository::{ItemRepository, RepositoryError, RepositoryFuture};
