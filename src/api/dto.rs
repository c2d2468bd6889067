//! Data Transfer Objects for API requests and responses.
//!
//! The wire task ([`ItemResponse`]) differs from the stored record in two
//! places: status becomes a boolean `completed`, and the optional date
//! becomes a `YYYY-MM-DD` string that is empty when no date is set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{FieldError, ValidationError};
use crate::domain::{ItemChanges, ItemId, ItemRecord, ItemStatus, NewItem};

/// Wire format of `due_date`.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Item DTOs
// =============================================================================

/// Request DTO for creating an item.
///
/// Fields are optional at the type level so that a missing field becomes a
/// field-level validation error rather than a body rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `YYYY-MM-DD`; absent, `null` or `""` means no date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Request DTO for replacing an item.
///
/// Every field is rewritten; anything not supplied is rejected, except
/// `due_date`, which is cleared when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Wire representation of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemResponse {
    pub id: ItemId,
    pub name: String,
    pub description: String,
    /// True iff the stored status is done.
    pub completed: bool,
    /// `YYYY-MM-DD`, or empty when the item has no date.
    pub due_date: String,
}

impl From<&ItemRecord> for ItemResponse {
    fn from(record: &ItemRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            completed: record.status.is_done(),
            due_date: format_due_date(record.due_date),
        }
    }
}

impl From<ItemRecord> for ItemResponse {
    fn from(record: ItemRecord) -> Self {
        Self {
            id: record.id,
            completed: record.status.is_done(),
            due_date: format_due_date(record.due_date),
            name: record.name,
            description: record.description,
        }
    }
}

/// Response DTO for create and update: the wire item plus a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMutationResponse {
    #[serde(flatten)]
    pub item: ItemResponse,
    pub message: String,
}

/// Response DTO for delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteItemResponse {
    pub id: ItemId,
    pub message: String,
}

// =============================================================================
// Mapping Helpers
// =============================================================================

/// Formats an optional date for the wire: `YYYY-MM-DD`, or empty.
#[must_use]
pub fn format_due_date(due_date: Option<NaiveDate>) -> String {
    due_date
        .map(|date| date.format(DUE_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parses a wire date. `None` and blank strings mean no date.
///
/// # Errors
///
/// Returns a `FieldError` for `due_date` if the value is not `YYYY-MM-DD`.
pub fn parse_due_date(value: Option<&str>) -> Result<Option<NaiveDate>, FieldError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, DUE_DATE_FORMAT)
            .map(Some)
            .map_err(|_| FieldError::new("due_date", "due_date must be a date in YYYY-MM-DD format")),
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Returns the value of a required text field, or records an error.
fn require_text(field: &str, value: Option<&String>, errors: &mut ValidationError) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text.clone(),
        _ => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            String::new()
        }
    }
}

fn require_due_date(value: Option<&str>, errors: &mut ValidationError) -> Option<NaiveDate> {
    parse_due_date(value).unwrap_or_else(|error| {
        errors.push(error);
        None
    })
}

impl CreateItemRequest {
    /// Validates the request into a `NewItem`.
    ///
    /// # Errors
    ///
    /// Returns every field error found: missing or blank `name` or
    /// `description`, malformed `due_date`.
    pub fn validate(&self) -> Result<NewItem, ValidationError> {
        let mut errors = ValidationError::default();
        let name = require_text("name", self.name.as_ref(), &mut errors);
        let description = require_text("description", self.description.as_ref(), &mut errors);
        let due_date = require_due_date(self.due_date.as_deref(), &mut errors);

        errors.into_result(|| NewItem {
            name,
            description,
            due_date,
        })
    }
}

impl UpdateItemRequest {
    /// Validates the request into a full replacement.
    ///
    /// # Errors
    ///
    /// Returns every field error found: missing or blank `name` or
    /// `description`, missing `completed`, malformed `due_date`.
    pub fn validate(&self) -> Result<ItemChanges, ValidationError> {
        let mut errors = ValidationError::default();
        let name = require_text("name", self.name.as_ref(), &mut errors);
        let description = require_text("description", self.description.as_ref(), &mut errors);
        let completed = self.completed.unwrap_or_else(|| {
            errors.push(FieldError::new("completed", "completed must be a boolean"));
            false
        });
        let due_date = require_due_date(self.due_date.as_deref(), &mut errors);

        errors.into_result(|| ItemChanges {
            name,
            description,
            status: ItemStatus::from_completed(completed),
            due_date,
        })
    }
}

impl ItemResponse {
    /// Builds the echo returned by a successful update.
    #[must_use]
    pub fn from_changes(id: ItemId, changes: ItemChanges) -> Self {
        Self {
            id,
            completed: changes.status.is_done(),
            due_date: format_due_date(changes.due_date),
            name: changes.name,
            description: changes.description,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;
    use rstest::rstest;

    fn record(status: ItemStatus, due_date: Option<NaiveDate>) -> ItemRecord {
        ItemRecord {
            id: ItemId::new(1),
            name: "Buy milk".to_string(),
            description: "2%".to_string(),
            status,
            due_date,
            created_at: Utc::now(),
        }
    }

    fn update_request(completed: Option<bool>) -> UpdateItemRequest {
        UpdateItemRequest {
            name: Some("Buy milk".to_string()),
            description: Some("2%".to_string()),
            completed,
            due_date: Some("2025-01-10".to_string()),
        }
    }

    // -------------------------------------------------------------------------
    // Mapping
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_item_response_from_record() {
        let response =
            ItemResponse::from(&record(ItemStatus::Done, NaiveDate::from_ymd_opt(2025, 1, 10)));

        assert_eq!(response.id, ItemId::new(1));
        assert!(response.completed);
        assert_eq!(response.due_date, "2025-01-10");
    }

    #[rstest]
    fn test_item_response_without_date_is_empty_string() {
        let response = ItemResponse::from(record(ItemStatus::Pending, None));

        assert!(!response.completed);
        assert_eq!(response.due_date, "");
    }

    #[rstest]
    fn test_item_response_serialization() {
        let response =
            ItemResponse::from(record(ItemStatus::Pending, NaiveDate::from_ymd_opt(2025, 1, 10)));

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "name": "Buy milk",
                "description": "2%",
                "completed": false,
                "due_date": "2025-01-10"
            })
        );
    }

    #[rstest]
    fn test_mutation_response_flattens_item() {
        let response = ItemMutationResponse {
            item: ItemResponse::from(record(ItemStatus::Pending, None)),
            message: "Item created".to_string(),
        };

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["completed"], false);
        assert_eq!(json["message"], "Item created");
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some("  "), None)]
    #[case(Some("2025-01-10"), NaiveDate::from_ymd_opt(2025, 1, 10))]
    fn test_parse_due_date_valid(#[case] input: Option<&str>, #[case] expected: Option<NaiveDate>) {
        assert_eq!(parse_due_date(input), Ok(expected));
    }

    #[rstest]
    #[case("2025-13-01")]
    #[case("10/01/2025")]
    #[case("2025-01-10T00:00:00Z")]
    fn test_parse_due_date_invalid(#[case] input: &str) {
        let error = parse_due_date(Some(input)).unwrap_err();
        assert_eq!(error.field, "due_date");
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    #[rstest]
    fn test_create_request_valid() {
        let request = CreateItemRequest {
            name: Some("Buy milk".to_string()),
            description: Some("2%".to_string()),
            due_date: None,
        };

        let item = request.validate().unwrap();

        assert_eq!(item.name, "Buy milk");
        assert!(item.due_date.is_none());
    }

    #[rstest]
    #[case(Some(""), Some("2%"), vec!["name"])]
    #[case(Some("Buy milk"), None, vec!["description"])]
    #[case(None, Some("   "), vec!["name", "description"])]
    fn test_create_request_missing_fields(
        #[case] name: Option<&str>,
        #[case] description: Option<&str>,
        #[case] expected_fields: Vec<&str>,
    ) {
        let request = CreateItemRequest {
            name: name.map(str::to_string),
            description: description.map(str::to_string),
            due_date: None,
        };

        let error = request.validate().unwrap_err();
        let fields: Vec<&str> = error.errors.iter().map(|e| e.field.as_str()).collect();

        assert_eq!(fields, expected_fields);
    }

    #[rstest]
    #[case(true, ItemStatus::Done)]
    #[case(false, ItemStatus::Pending)]
    fn test_update_request_maps_completed(#[case] completed: bool, #[case] expected: ItemStatus) {
        let changes = update_request(Some(completed)).validate().unwrap();

        assert_eq!(changes.status, expected);
        assert_eq!(changes.due_date, NaiveDate::from_ymd_opt(2025, 1, 10));
    }

    #[rstest]
    fn test_update_request_requires_completed() {
        let error = update_request(None).validate().unwrap_err();

        assert_eq!(error.errors.len(), 1);
        assert_eq!(error.errors[0].field, "completed");
    }

    #[rstest]
    fn test_update_request_missing_due_date_clears_it() {
        let request = UpdateItemRequest {
            due_date: None,
            ..update_request(Some(false))
        };

        assert!(request.validate().unwrap().due_date.is_none());
    }

    #[rstest]
    fn test_update_request_rejects_non_boolean_completed() {
        let result = serde_json::from_value::<UpdateItemRequest>(serde_json::json!({
            "name": "a",
            "description": "b",
            "completed": "yes"
        }));

        assert!(result.is_err());
    }

    #[rstest]
    fn test_from_changes_echo() {
        let changes = update_request(Some(true)).validate().unwrap();

        let response = ItemResponse::from_changes(ItemId::new(1), changes);

        assert!(response.completed);
        assert_eq!(response.due_date, "2025-01-10");
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    proptest! {
        #[test]
        fn prop_completed_matches_status(completed in any::<bool>()) {
            let status = ItemStatus::from_completed(completed);
            let response = ItemResponse::from(record(status, None));

            prop_assert_eq!(response.completed, status == ItemStatus::Done);
            prop_assert_eq!(ItemStatus::from_completed(response.completed), status);
        }

        #[test]
        fn prop_due_date_round_trips(days in 0u64..200_000) {
            let date = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap() + chrono::Days::new(days);
            let formatted = format_due_date(Some(date));

            prop_assert_eq!(formatted.len(), 10);
            prop_assert_eq!(parse_due_date(Some(&formatted)), Ok(Some(date)));
        }
    }
}
