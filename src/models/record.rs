use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::RecordKind;

/// A stored record: a note or a saved URL with its subject tags.
///
/// Records are the unit of capture in the catalog. Each carries freeform
/// content, one or more subject tags, and, for URL records, whatever page
/// metadata the scraper managed to collect. `content` doubles as the
/// duplicate-detection key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier from the store.
    pub id: i64,
    /// When this record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// The record's content: note text, or the URL itself.
    pub content: String,
    /// Subject tags. Set semantics: case-insensitively unique, original
    /// spelling and insertion order preserved.
    pub tags: Vec<String>,
    /// Whether this record is a note or a URL.
    pub kind: RecordKind,
    /// Page title, when scraped.
    pub title: Option<String>,
    /// Page description, when scraped.
    pub description: Option<String>,
    /// Page image or icon reference, when scraped.
    pub image: Option<String>,
}

impl Record {
    /// Whether the record carries `tag`, compared case-insensitively.
    pub fn has_tag(&self, tag: &str) -> bool {
        let needle = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == needle)
    }

    /// Whether the record's only tag is `subject` (case-insensitive): the
    /// condition that routes it to a vine's main node.
    pub fn tagged_solely_with(&self, subject: &str) -> bool {
        self.tags.len() == 1 && self.has_tag(subject)
    }
}

/// Builder for constructing [`Record`] instances with optional fields.
///
/// # Examples
///
/// ```
/// use arcadia::{RecordBuilder, RecordKind};
///
/// let record = RecordBuilder::new()
///     .id(1)
///     .content("https://www.rust-lang.org/")
///     .kind(RecordKind::Url)
///     .tags(vec!["rust".to_string()])
///     .build();
///
/// assert_eq!(record.id, 1);
/// assert_eq!(record.kind, RecordKind::Url);
/// assert!(record.title.is_none());
/// ```
#[derive(Debug, Default)]
pub struct RecordBuilder {
    id: Option<i64>,
    timestamp: Option<OffsetDateTime>,
    content: Option<String>,
    tags: Option<Vec<String>>,
    kind: Option<RecordKind>,
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

impl RecordBuilder {
    /// Creates a new `RecordBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record ID.
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the creation timestamp.
    pub fn timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the record content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the subject tags.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Sets the record kind.
    pub fn kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the scraped page title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the scraped page description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the scraped page image reference.
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Builds the `Record`, using defaults for optional fields.
    ///
    /// # Panics
    ///
    /// Panics if `id` or `content` have not been set.
    pub fn build(self) -> Record {
        Record {
            id: self.id.expect("id is required"),
            timestamp: self.timestamp.unwrap_or_else(OffsetDateTime::now_utc),
            content: self.content.expect("content is required"),
            tags: self.tags.unwrap_or_default(),
            kind: self.kind.unwrap_or(RecordKind::Note),
            title: self.title,
            description: self.description,
            image: self.image,
        }
    }
}
