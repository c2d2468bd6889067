//! `PostgreSQL` repository implementation.
//!
//! Uses `sqlx` with a pool capped at one connection, so every request
//! shares the same logical link. Each operation is a single statement; no
//! transactions, no version checks.
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TYPE item_status AS ENUM ('pending', 'done');
//!
//! CREATE TABLE items (
//!     id          BIGSERIAL PRIMARY KEY,
//!     name        TEXT NOT NULL,
//!     description TEXT NOT NULL,
//!     status      item_status NOT NULL DEFAULT 'pending',
//!     due_date    DATE NULL,
//!     created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! The same script ships as `db/init.sql` for the database container.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::domain::{ItemChanges, ItemId, ItemRecord, ItemStatus, NewItem};
use crate::infrastructure::link::StoreConnector;
use crate::infrastructure::{ItemRepository, RepositoryError, RepositoryFuture};

// =============================================================================
// Row Mapping
// =============================================================================

/// Database representation of `ItemStatus` (the `item_status` enum type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "item_status", rename_all = "snake_case")]
enum StatusColumn {
    Pending,
    Done,
}

impl From<ItemStatus> for StatusColumn {
    fn from(status: ItemStatus) -> Self {
        match status {
            ItemStatus::Pending => Self::Pending,
            ItemStatus::Done => Self::Done,
        }
    }
}

impl From<StatusColumn> for ItemStatus {
    fn from(column: StatusColumn) -> Self {
        match column {
            StatusColumn::Pending => Self::Pending,
            StatusColumn::Done => Self::Done,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    description: String,
    status: StatusColumn,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for ItemRecord {
    fn from(row: ItemRow) -> Self {
        Self {
            id: ItemId::new(row.id),
            name: row.name,
            description: row.description,
            status: row.status.into(),
            due_date: row.due_date,
            created_at: row.created_at,
        }
    }
}

fn database_error(error: &sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

// =============================================================================
// PostgreSQL Item Repository
// =============================================================================

/// `PostgreSQL` implementation of `ItemRepository`.
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/tasks").await?;
/// let repository = PostgresItemRepository::new(pool);
///
/// let created = repository.create(new_item).await?;
/// let found = repository.find_by_id(created.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresItemRepository {
    pool: PgPool,
}

impl PostgresItemRepository {
    /// Creates a repository over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ItemRepository for PostgresItemRepository {
    fn list(&self) -> RepositoryFuture<Vec<ItemRecord>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let rows: Vec<ItemRow> = sqlx::query_as(
                "SELECT id, name, description, status, due_date, created_at \
                 FROM items ORDER BY id DESC",
            )
            .fetch_all(&pool)
            .await
            .map_err(|error| database_error(&error))?;

            Ok(rows.into_iter().map(ItemRecord::from).collect())
        })
    }

    fn find_by_id(&self, id: ItemId) -> RepositoryFuture<Option<ItemRecord>> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let row: Option<ItemRow> = sqlx::query_as(
                "SELECT id, name, description, status, due_date, created_at \
                 FROM items WHERE id = $1",
            )
            .bind(id.get())
            .fetch_optional(&pool)
            .await
            .map_err(|error| database_error(&error))?;

            Ok(row.map(ItemRecord::from))
        })
    }

    fn create(&self, item: NewItem) -> RepositoryFuture<ItemRecord> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let row: ItemRow = sqlx::query_as(
                "INSERT INTO items (name, description, status, due_date) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id, name, description, status, due_date, created_at",
            )
            .bind(&item.name)
            .bind(&item.description)
            .bind(StatusColumn::from(ItemStatus::Pending))
            .bind(item.due_date)
            .fetch_one(&pool)
            .await
            .map_err(|error| database_error(&error))?;

            Ok(row.into())
        })
    }

    fn update(&self, id: ItemId, changes: ItemChanges) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let result = sqlx::query(
                "UPDATE items SET name = $1, description = $2, status = $3, due_date = $4 \
                 WHERE id = $5",
            )
            .bind(&changes.name)
            .bind(&changes.description)
            .bind(StatusColumn::from(changes.status))
            .bind(changes.due_date)
            .bind(id.get())
            .execute(&pool)
            .await
            .map_err(|error| database_error(&error))?;

            Ok(result.rows_affected() > 0)
        })
    }

    fn delete(&self, id: ItemId) -> RepositoryFuture<bool> {
        let pool = self.pool.clone();
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM items WHERE id = $1")
                .bind(id.get())
                .execute(&pool)
                .await
                .map_err(|error| database_error(&error))?;

            Ok(result.rows_affected() > 0)
        })
    }
}

// =============================================================================
// PostgreSQL Connector
// =============================================================================

/// Connector that opens the single-connection pool.
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    options: PgConnectOptions,
    acquire_timeout: Duration,
}

impl PostgresConnector {
    /// Creates a connector for the given connection options.
    #[must_use]
    pub const fn new(options: PgConnectOptions) -> Self {
        Self {
            options,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl StoreConnector for PostgresConnector {
    fn connect(&self) -> RepositoryFuture<Arc<dyn ItemRepository + Send + Sync>> {
        let options = self.options.clone();
        let acquire_timeout = self.acquire_timeout;
        Box::pin(async move {
            let pool = PgPoolOptions::new()
                .max_connections(1)
                .acquire_timeout(acquire_timeout)
                .connect_with(options)
                .await
                .map_err(|error| RepositoryError::ConnectionFailed(error.to_string()))?;

            let repository: Arc<dyn ItemRepository + Send + Sync> =
                Arc::new(PostgresItemRepository::new(pool));
            Ok(repository)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ItemStatus::Pending, StatusColumn::Pending)]
    #[case(ItemStatus::Done, StatusColumn::Done)]
    fn test_status_column_conversion(#[case] status: ItemStatus, #[case] column: StatusColumn) {
        assert_eq!(StatusColumn::from(status), column);
        assert_eq!(ItemStatus::from(column), status);
    }

    #[rstest]
    fn test_row_into_record() {
        let created_at = Utc::now();
        let row = ItemRow {
            id: 7,
            name: "Buy milk".to_string(),
            description: "2%".to_string(),
            status: StatusColumn::Done,
            due_date: NaiveDate::from_ymd_opt(2025, 1, 10),
            created_at,
        };

        let record = ItemRecord::from(row);

        assert_eq!(record.id, ItemId::new(7));
        assert_eq!(record.status, ItemStatus::Done);
        assert_eq!(record.due_date, NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(record.created_at, created_at);
    }
}
