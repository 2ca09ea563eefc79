use serde::{Deserialize, Serialize};

use super::Record;

/// Result of an insert attempt.
///
/// Duplicate content is an expected outcome, not an error: the store is left
/// untouched and the existing record is reported back so callers can show
/// what the content collided with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "reason", content = "record")]
pub enum InsertOutcome {
    /// The record was inserted; payload is the stored record.
    Added(Record),
    /// A record with identical content already exists; payload is that
    /// record.
    Duplicate(Record),
}

impl InsertOutcome {
    /// Whether a new row was created.
    pub fn added(&self) -> bool {
        matches!(self, Self::Added(_))
    }

    /// The stored record: the new row, or the pre-existing duplicate.
    pub fn record(&self) -> &Record {
        match self {
            Self::Added(record) | Self::Duplicate(record) => record,
        }
    }
}

/// Result of an update attempt keyed by record content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateOutcome {
    /// The record was found and updated.
    Updated,
    /// No record matched the key; nothing changed.
    NotFound,
}

impl UpdateOutcome {
    /// Whether a row was changed.
    pub fn updated(&self) -> bool {
        matches!(self, Self::Updated)
    }
}

/// Result of a delete attempt keyed by record content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteOutcome {
    /// The record was found and removed.
    Deleted,
    /// No record matched the key; nothing changed.
    NotFound,
}

impl DeleteOutcome {
    /// Whether a row was removed.
    pub fn deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// Fields to change in an update, keyed by the record's current content.
///
/// `None` leaves a field untouched; supplying a tag list replaces the whole
/// list after validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateFields {
    /// Replacement content (the record's new key).
    pub content: Option<String>,
    /// Replacement page title.
    pub title: Option<String>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// Replacement page description.
    pub description: Option<String>,
    /// Replacement page image reference.
    pub image: Option<String>,
}

impl UpdateFields {
    /// Whether the update would change anything at all.
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.title.is_none()
            && self.tags.is_none()
            && self.description.is_none()
            && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordBuilder;

    #[test]
    fn insert_outcome_reports_added_state() {
        let record = RecordBuilder::new().id(1).content("x").build();
        assert!(InsertOutcome::Added(record.clone()).added());
        assert!(!InsertOutcome::Duplicate(record).added());
    }

    #[test]
    fn insert_outcome_exposes_record_for_both_variants() {
        let record = RecordBuilder::new().id(3).content("dup").build();
        let outcome = InsertOutcome::Duplicate(record);
        assert_eq!(outcome.record().content, "dup");
    }

    #[test]
    fn update_and_delete_outcomes_report_success() {
        assert!(UpdateOutcome::Updated.updated());
        assert!(!UpdateOutcome::NotFound.updated());
        assert!(DeleteOutcome::Deleted.deleted());
        assert!(!DeleteOutcome::NotFound.deleted());
    }

    #[test]
    fn empty_update_fields_detected() {
        assert!(UpdateFields::default().is_empty());

        let fields = UpdateFields {
            title: Some("New title".to_string()),
            ..Default::default()
        };
        assert!(!fields.is_empty());
    }
}
