//! Domain module for task tracking.
//!
//! This module contains the stored-record model for items.

pub mod item;

pub use item::{ItemChanges, ItemId, ItemRecord, ItemStatus, NewItem};
