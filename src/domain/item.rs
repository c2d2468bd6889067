//! Item domain model.
//!
//! An item is a single task as it is persisted: a two-valued status and an
//! optional calendar date. The wire representation (boolean `completed`,
//! `YYYY-MM-DD` string) lives in [`crate::api::dto`]; the only translation
//! between the two worlds is [`ItemStatus::from_completed`] /
//! [`ItemStatus::is_done`].

use std::num::ParseIntError;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Identifier assigned by the store when an item is created.
///
/// Immutable afterwards. Ordering follows creation order, which is what
/// the list endpoint relies on for its newest-first output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(i64);

impl ItemId {
    /// Wraps a raw store identifier.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw store identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse::<i64>().map(Self)
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

// =============================================================================
// Enums
// =============================================================================

/// Persisted status of an item.
///
/// Exactly two states exist; this is what makes the mapping to the boolean
/// `completed` flag a bijection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Not done yet. Every item starts here.
    #[default]
    Pending,
    /// Done.
    Done,
}

impl ItemStatus {
    /// Derives the stored status from the wire `completed` flag.
    #[must_use]
    pub const fn from_completed(completed: bool) -> Self {
        if completed { Self::Done } else { Self::Pending }
    }

    /// Returns the wire `completed` flag for this status.
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns the status label as stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// =============================================================================
// Records
// =============================================================================

/// A stored item row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    pub status: ItemStatus,
    pub due_date: Option<NaiveDate>,
    /// Set once at creation, never mutated.
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating an item.
///
/// The store assigns `id` and `created_at`; status always starts as
/// [`ItemStatus::Pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

/// Validated full-record replacement for an existing item.
///
/// Every mutable column is rewritten; nothing is carried over from the
/// existing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: String,
    pub description: String,
    pub status: ItemStatus,
    pub due_date: Option<NaiveDate>,
}

impl ItemRecord {
    /// Builds the row a store would hold right after inserting `item`.
    #[must_use]
    pub fn created(id: ItemId, item: NewItem, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: item.name,
            description: item.description,
            status: ItemStatus::Pending,
            due_date: item.due_date,
            created_at,
        }
    }

    /// Returns this row with every mutable column replaced by `changes`.
    ///
    /// `id` and `created_at` are preserved.
    #[must_use]
    pub fn replaced(self, changes: ItemChanges) -> Self {
        Self {
            id: self.id,
            name: changes.name,
            description: changes.description,
            status: changes.status,
            due_date: changes.due_date,
            created_at: self.created_at,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
