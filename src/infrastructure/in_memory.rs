//! In-memory repository implementation.
//!
//! Backs the test suite and `STORAGE_MODE=in_memory` development runs.
//! Ids are handed out from a counter starting at 1, like an auto-increment
//! column.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{ItemChanges, ItemId, ItemRecord, NewItem};
use crate::infrastructure::link::StoreConnector;
use crate::infrastructure::{ItemRepository, RepositoryFuture};

#[derive(Debug)]
struct ItemTable {
    rows: BTreeMap<ItemId, ItemRecord>,
    next_id: i64,
}

impl Default for ItemTable {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

// =============================================================================
// In-Memory Item Repository
// =============================================================================

/// In-memory implementation of `ItemRepository`.
///
/// Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct InMemoryItemRepository {
    table: Arc<RwLock<ItemTable>>,
}

impl InMemoryItemRepository {
    /// Creates a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored rows.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    /// Returns true if no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.table.read().await.rows.is_empty()
    }
}

#[allow(clippy::significant_drop_tightening)]
impl ItemRepository for InMemoryItemRepository {
    fn list(&self) -> RepositoryFuture<Vec<ItemRecord>> {
        let table = Arc::clone(&self.table);
        Box::pin(async move {
            let guard = table.read().await;
            Ok(guard.rows.values().rev().cloned().collect())
        })
    }

    fn find_by_id(&self, id: ItemId) -> RepositoryFuture<Option<ItemRecord>> {
        let table = Arc::clone(&self.table);
        Box::pin(async move {
            let guard = table.read().await;
            Ok(guard.rows.get(&id).cloned())
        })
    }

    fn create(&self, item: NewItem) -> RepositoryFuture<ItemRecord> {
        let table = Arc::clone(&self.table);
        Box::pin(async move {
            let mut guard = table.write().await;
            let id = ItemId::new(guard.next_id);
            guard.next_id += 1;

            let record = ItemRecord::created(id, item, Utc::now());
            guard.rows.insert(id, record.clone());
            Ok(record)
        })
    }

    fn update(&self, id: ItemId, changes: ItemChanges) -> RepositoryFuture<bool> {
        let table = Arc::clone(&self.table);
        Box::pin(async move {
            let mut guard = table.write().await;
            let Some(existing) = guard.rows.remove(&id) else {
                return Ok(false);
            };
            guard.rows.insert(id, existing.replaced(changes));
            Ok(true)
        })
    }

    fn delete(&self, id: ItemId) -> RepositoryFuture<bool> {
        let table = Arc::clone(&self.table);
        Box::pin(async move {
            let mut guard = table.write().await;
            Ok(guard.rows.remove(&id).is_some())
        })
    }
}

// =============================================================================
// In-Memory Connector
// =============================================================================

/// Connector that always succeeds and hands out the wrapped repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    repository: InMemoryItemRepository,
}

impl InMemoryConnector {
    /// Creates a connector handing out `repository`.
    #[must_use]
    pub const fn new(repository: InMemoryItemRepository) -> Self {
        Self { repository }
    }
}

impl StoreConnector for InMemoryConnector {
    fn connect(&self) -> RepositoryFuture<Arc<dyn ItemRepository + Send + Sync>> {
        let repository = self.repository.clone();
        Box::pin(async move {
            tracing::debug!("Using in-memory item store");
            let repository: Arc<dyn ItemRepository + Send + Sync> = Arc::new(repository);
            Ok(repository)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
