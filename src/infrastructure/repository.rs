//! Repository trait for the items table.
//!
//! Every method returns a boxed `'static` future so implementations can be
//! stored behind `Arc<dyn ItemRepository>` and swapped for fakes in tests.
//! Each call maps to a single store statement; nothing spans a transaction.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{ItemChanges, ItemId, ItemRecord, NewItem};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
///
/// A missing record is not an error: lookups return `Ok(None)` and
/// mutations return `Ok(false)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The store link has not been established yet.
    #[error("Store connection is not established")]
    Unavailable,

    /// A connection attempt failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A statement failed.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Future returned by repository operations.
pub type RepositoryFuture<T> = BoxFuture<'static, Result<T, RepositoryError>>;

// =============================================================================
// Item Repository
// =============================================================================

/// Repository for item records.
pub trait ItemRepository: Send + Sync {
    /// Lists every item, highest id (newest) first.
    fn list(&self) -> RepositoryFuture<Vec<ItemRecord>>;

    /// Finds an item by id.
    ///
    /// Returns `Ok(None)` if no such item exists.
    fn find_by_id(&self, id: ItemId) -> RepositoryFuture<Option<ItemRecord>>;

    /// Inserts a new item with pending status and returns the stored row,
    /// including the assigned id.
    fn create(&self, item: NewItem) -> RepositoryFuture<ItemRecord>;

    /// Rewrites every mutable column of an item.
    ///
    /// Returns `Ok(false)` if no such item exists. Last write wins.
    fn update(&self, id: ItemId, changes: ItemChanges) -> RepositoryFuture<bool>;

    /// Deletes an item.
    ///
    /// Returns `Ok(false)` if no such item exists.
    fn delete(&self, id: ItemId) -> RepositoryFuture<bool>;
}
