//! The catalog facade: one type tying together the store, the query
//! layer, the tag hierarchy engine and the metadata scraper.

use std::collections::BTreeMap;

use tracing::{debug, error, info, warn};

use crate::db::{Database, InsertRow, NewRecord, RowPatch};
use crate::error::{Error, Result};
use crate::models::{
    DataView, DeleteOutcome, InsertOutcome, Record, RecordKind, UpdateFields, UpdateOutcome,
};
use crate::scraper::{MetaFetcher, ScrapeError, Scraper};
use crate::search::{self, encode_tags, record_from_row};
use crate::vine::{Summary, Vine};

/// A personal knowledge catalog over one database.
///
/// Expected outcomes (duplicate content, missing keys) come back as
/// tagged variants, never as errors; errors mean the store or a stored
/// row is broken.
pub struct Arcadia {
    db: Database,
    view: DataView,
    fetcher: Box<dyn MetaFetcher>,
}

impl Arcadia {
    /// Builds a catalog using the real page scraper.
    pub fn new(db: Database, view: DataView) -> std::result::Result<Self, ScrapeError> {
        Ok(Self::with_fetcher(db, view, Box::new(Scraper::new()?)))
    }

    /// Builds a catalog with a caller-supplied metadata fetcher.
    ///
    /// Tests use this to keep the network out of the picture.
    pub fn with_fetcher(db: Database, view: DataView, fetcher: Box<dyn MetaFetcher>) -> Self {
        Self { db, view, fetcher }
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Searches for `term` and folds the matches into a summary for the
    /// catalog's view mode.
    pub fn summary(&self, term: &str) -> Result<Summary> {
        let records = log_failure("search", search::search(&self.db, term))?;
        info!(term, matches = records.len(), "summarizing query");
        Ok(Vine::build(term, records).summarize(self.view))
    }

    /// The full tag vocabulary, deduplicated and sorted.
    pub fn subjects(&self) -> Result<Vec<String>> {
        log_failure("subjects", search::vocabulary(&self.db))
    }

    /// The vocabulary bucketed A-Z.
    pub fn grouped_subjects(&self) -> Result<BTreeMap<char, Vec<String>>> {
        log_failure("grouped subjects", search::grouped_vocabulary(&self.db))
    }

    /// Vocabulary entries resembling `term`.
    pub fn similar_subjects(&self, term: &str) -> Result<Vec<String>> {
        log_failure("similar subjects", search::similar(&self.db, term))
    }

    /// Stores a new record.
    ///
    /// The tag list must be non-empty with no blank entries. URL records
    /// get page metadata attached best-effort: a failed scrape is logged
    /// and the record is stored without it.
    pub fn add_record(
        &self,
        content: &str,
        kind: RecordKind,
        tags: &[String],
    ) -> Result<InsertOutcome> {
        validate_tags(tags)?;

        let mut new = NewRecord {
            content: content.to_string(),
            kind,
            tags: encode_tags(tags),
            title: None,
            description: None,
            image: None,
        };

        if kind == RecordKind::Url {
            match self.fetcher.fetch_page_meta(content) {
                Ok(meta) => {
                    new.title = meta.title;
                    new.description = meta.description;
                    new.image = meta.image;
                }
                Err(err) => {
                    warn!(error = %err, url = content, "metadata fetch failed; storing record without it");
                }
            }
        }

        let outcome = log_failure("insert", self.db.insert_record(&new))?;
        match outcome {
            InsertRow::Inserted(row) => {
                info!(id = row.id, "record added");
                Ok(InsertOutcome::Added(record_from_row(row)?))
            }
            InsertRow::DuplicateContent(row) => {
                info!(key = %new.content, "record already present");
                Ok(InsertOutcome::Duplicate(record_from_row(row)?))
            }
        }
    }

    /// Applies a partial update to the record keyed by `key` (its
    /// current content). A supplied tag list is validated like on add.
    pub fn update_record(&self, key: &str, fields: &UpdateFields) -> Result<UpdateOutcome> {
        if let Some(tags) = &fields.tags {
            validate_tags(tags)?;
        }

        let patch = RowPatch {
            content: fields.content.clone(),
            tags: fields.tags.as_deref().map(encode_tags),
            title: fields.title.clone(),
            description: fields.description.clone(),
            image: fields.image.clone(),
        };

        let updated = log_failure("update", self.db.update_record(key, &patch))?;
        if updated {
            info!(key, "record updated");
            Ok(UpdateOutcome::Updated)
        } else {
            debug!(key, "no record to update");
            Ok(UpdateOutcome::NotFound)
        }
    }

    /// Re-scrapes and stores the page metadata of one URL record.
    ///
    /// `NotFound` covers both a missing key and a page that could not be
    /// fetched; in the latter case the stored record is left untouched.
    pub fn refresh_metadata(&self, key: &str) -> Result<UpdateOutcome> {
        let meta = match self.fetcher.fetch_page_meta(key) {
            Ok(meta) => meta,
            Err(err) => {
                warn!(error = %err, url = key, "metadata refresh failed; record unchanged");
                return Ok(UpdateOutcome::NotFound);
            }
        };

        let updated = log_failure(
            "refresh metadata",
            self.db.update_meta(
                key,
                meta.title.as_deref(),
                meta.description.as_deref(),
                meta.image.as_deref(),
            ),
        )?;
        if updated {
            info!(key, "metadata refreshed");
            Ok(UpdateOutcome::Updated)
        } else {
            Ok(UpdateOutcome::NotFound)
        }
    }

    /// Backfills metadata for every URL record that has none stored.
    ///
    /// Per-record scrape failures are logged and skipped. Returns how
    /// many records were actually updated.
    pub fn sync_missing_metadata(&self) -> Result<usize> {
        let rows = log_failure("missing metadata listing", self.db.url_rows_missing_meta())?;
        let attempts = rows.len();
        let mut updated = 0;

        for row in rows {
            match self.fetcher.fetch_page_meta(&row.content) {
                Ok(meta) if !meta.is_empty() => {
                    let changed = log_failure(
                        "metadata backfill",
                        self.db.update_meta(
                            &row.content,
                            meta.title.as_deref(),
                            meta.description.as_deref(),
                            meta.image.as_deref(),
                        ),
                    )?;
                    if changed {
                        updated += 1;
                    }
                }
                Ok(_) => {
                    debug!(url = %row.content, "page exposes no metadata");
                }
                Err(err) => {
                    warn!(error = %err, url = %row.content, "metadata backfill failed for record");
                }
            }
        }

        info!(attempts, updated, "metadata backfill complete");
        Ok(updated)
    }

    /// Deletes the record keyed by `key`.
    pub fn remove_record(&self, key: &str) -> Result<DeleteOutcome> {
        let deleted = log_failure("delete", self.db.delete_record(key))?;
        if deleted {
            info!(key, "record deleted");
            Ok(DeleteOutcome::Deleted)
        } else {
            debug!(key, "no record to delete");
            Ok(DeleteOutcome::NotFound)
        }
    }

    pub fn record_count(&self) -> Result<i64> {
        log_failure("record count", self.db.record_count())
    }

    pub fn url_record_count(&self) -> Result<i64> {
        log_failure("url record count", self.db.url_record_count())
    }

    /// One uniformly random URL record, `None` on an empty catalog.
    pub fn random_url_record(&self) -> Result<Option<Record>> {
        match log_failure("random url", self.db.random_url_row())? {
            Some(row) => Ok(Some(record_from_row(row)?)),
            None => Ok(None),
        }
    }
}

/// Tag lists must be non-empty and free of blank entries, checked before
/// anything reaches the store.
fn validate_tags(tags: &[String]) -> Result<()> {
    if tags.is_empty() || tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(Error::InvalidTag);
    }
    Ok(())
}

/// Store and parse failures get logged once at the facade boundary; the
/// typed error still propagates to the caller.
fn log_failure<T>(operation: &'static str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        error!(operation, error = %err, "catalog operation failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::PageMeta;

    struct StubFetcher {
        meta: PageMeta,
    }

    impl MetaFetcher for StubFetcher {
        fn fetch_page_meta(&self, _url: &str) -> std::result::Result<PageMeta, ScrapeError> {
            Ok(self.meta.clone())
        }
    }

    struct FailingFetcher;

    impl MetaFetcher for FailingFetcher {
        fn fetch_page_meta(&self, url: &str) -> std::result::Result<PageMeta, ScrapeError> {
            Err(ScrapeError::InvalidUrl(url.to_string()))
        }
    }

    fn stub_meta() -> PageMeta {
        PageMeta {
            title: Some("Example Domain".to_string()),
            description: Some("For use in illustrative examples".to_string()),
            image: Some("/icon.png".to_string()),
        }
    }

    fn catalog() -> Arcadia {
        Arcadia::with_fetcher(
            Database::in_memory().unwrap(),
            DataView::Text,
            Box::new(StubFetcher { meta: stub_meta() }),
        )
    }

    fn tag_list(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn add_note_skips_metadata_and_reports_added() {
        let arcadia = catalog();

        let outcome = arcadia
            .add_record("plain thought", RecordKind::Note, &tag_list(&["thinking"]))
            .unwrap();

        match outcome {
            InsertOutcome::Added(record) => {
                assert_eq!(record.content, "plain thought");
                assert_eq!(record.tags, vec!["thinking"]);
                assert_eq!(record.title, None);
            }
            InsertOutcome::Duplicate(_) => panic!("fresh record reported as duplicate"),
        }
    }

    #[test]
    fn add_url_attaches_scraped_metadata() {
        let arcadia = catalog();

        let outcome = arcadia
            .add_record("https://example.com", RecordKind::Url, &tag_list(&["web"]))
            .unwrap();

        match outcome {
            InsertOutcome::Added(record) => {
                assert_eq!(record.title.as_deref(), Some("Example Domain"));
                assert_eq!(
                    record.description.as_deref(),
                    Some("For use in illustrative examples")
                );
                assert_eq!(record.image.as_deref(), Some("/icon.png"));
            }
            InsertOutcome::Duplicate(_) => panic!("fresh record reported as duplicate"),
        }
    }

    #[test]
    fn failed_scrape_still_stores_the_record() {
        let arcadia = Arcadia::with_fetcher(
            Database::in_memory().unwrap(),
            DataView::Text,
            Box::new(FailingFetcher),
        );

        let outcome = arcadia
            .add_record("https://unreachable.example", RecordKind::Url, &tag_list(&["web"]))
            .unwrap();

        assert!(outcome.added());
        assert_eq!(outcome.record().title, None);
        assert_eq!(arcadia.record_count().unwrap(), 1);
    }

    #[test]
    fn duplicate_content_returns_the_original_record() {
        let arcadia = catalog();
        arcadia
            .add_record("same thing", RecordKind::Note, &tag_list(&["first"]))
            .unwrap();

        let outcome = arcadia
            .add_record("same thing", RecordKind::Note, &tag_list(&["second"]))
            .unwrap();

        match outcome {
            InsertOutcome::Duplicate(record) => {
                // The original row is reported back untouched
                assert_eq!(record.tags, vec!["first"]);
            }
            InsertOutcome::Added(_) => panic!("duplicate reported as added"),
        }
        assert_eq!(arcadia.record_count().unwrap(), 1);
    }

    #[test]
    fn blank_tags_are_rejected_before_any_store_access() {
        let arcadia = catalog();

        let err = arcadia
            .add_record("content", RecordKind::Note, &tag_list(&["", "x"]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTag));

        let err = arcadia
            .add_record("content", RecordKind::Note, &[])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTag));

        assert_eq!(arcadia.record_count().unwrap(), 0);
    }

    #[test]
    fn update_encodes_the_new_tag_list() {
        let arcadia = catalog();
        arcadia
            .add_record("note", RecordKind::Note, &tag_list(&["old"]))
            .unwrap();

        let fields = UpdateFields {
            tags: Some(tag_list(&["Fresh", "new"])),
            ..UpdateFields::default()
        };
        let outcome = arcadia.update_record("note", &fields).unwrap();
        assert!(outcome.updated());

        let subjects = arcadia.subjects().unwrap();
        assert_eq!(subjects, vec!["Fresh", "new"]);
    }

    #[test]
    fn update_missing_key_reports_not_found() {
        let arcadia = catalog();

        let fields = UpdateFields {
            title: Some("anything".to_string()),
            ..UpdateFields::default()
        };
        let outcome = arcadia.update_record("nowhere", &fields).unwrap();
        assert!(!outcome.updated());
    }

    #[test]
    fn update_with_blank_tags_is_rejected() {
        let arcadia = catalog();
        arcadia
            .add_record("note", RecordKind::Note, &tag_list(&["keep"]))
            .unwrap();

        let fields = UpdateFields {
            tags: Some(tag_list(&[" "])),
            ..UpdateFields::default()
        };
        let err = arcadia.update_record("note", &fields).unwrap_err();
        assert!(matches!(err, Error::InvalidTag));
        assert_eq!(arcadia.subjects().unwrap(), vec!["keep"]);
    }

    #[test]
    fn remove_record_reports_both_outcomes() {
        let arcadia = catalog();
        arcadia
            .add_record("short lived", RecordKind::Note, &tag_list(&["tmp"]))
            .unwrap();

        assert!(arcadia.remove_record("short lived").unwrap().deleted());
        assert!(!arcadia.remove_record("short lived").unwrap().deleted());
    }

    #[test]
    fn refresh_metadata_overwrites_stored_columns() {
        let arcadia = Arcadia::with_fetcher(
            Database::in_memory().unwrap(),
            DataView::Text,
            Box::new(FailingFetcher),
        );
        arcadia
            .add_record("https://example.com", RecordKind::Url, &tag_list(&["web"]))
            .unwrap();

        // Swap in a working fetcher, as if the site came back up
        let arcadia = Arcadia::with_fetcher(
            take_database(arcadia),
            DataView::Text,
            Box::new(StubFetcher { meta: stub_meta() }),
        );

        let outcome = arcadia.refresh_metadata("https://example.com").unwrap();
        assert!(outcome.updated());

        let row = arcadia
            .database()
            .find_row("https://example.com")
            .unwrap()
            .unwrap();
        assert_eq!(row.title.as_deref(), Some("Example Domain"));
    }

    #[test]
    fn refresh_metadata_missing_key_reports_not_found() {
        let arcadia = catalog();
        let outcome = arcadia.refresh_metadata("https://nowhere.example").unwrap();
        assert!(!outcome.updated());
    }

    #[test]
    fn sync_backfills_only_rows_without_metadata() {
        let arcadia = Arcadia::with_fetcher(
            Database::in_memory().unwrap(),
            DataView::Text,
            Box::new(FailingFetcher),
        );
        // Stored without metadata because the fetcher fails
        arcadia
            .add_record("https://a.example", RecordKind::Url, &tag_list(&["web"]))
            .unwrap();
        arcadia
            .add_record("https://b.example", RecordKind::Url, &tag_list(&["web"]))
            .unwrap();
        arcadia
            .add_record("just a note", RecordKind::Note, &tag_list(&["web"]))
            .unwrap();

        let arcadia = Arcadia::with_fetcher(
            take_database(arcadia),
            DataView::Text,
            Box::new(StubFetcher { meta: stub_meta() }),
        );

        assert_eq!(arcadia.sync_missing_metadata().unwrap(), 2);
        // A second pass finds nothing left to fill
        assert_eq!(arcadia.sync_missing_metadata().unwrap(), 0);
    }

    #[test]
    fn random_url_record_ignores_notes() {
        let arcadia = catalog();
        arcadia
            .add_record("just a note", RecordKind::Note, &tag_list(&["x"]))
            .unwrap();
        assert!(arcadia.random_url_record().unwrap().is_none());

        arcadia
            .add_record("https://example.com", RecordKind::Url, &tag_list(&["x"]))
            .unwrap();
        let record = arcadia.random_url_record().unwrap().unwrap();
        assert_eq!(record.kind, RecordKind::Url);
    }

    #[test]
    fn summary_routes_matched_records() {
        let arcadia = catalog();
        arcadia
            .add_record("practice scales", RecordKind::Note, &tag_list(&["music"]))
            .unwrap();
        arcadia
            .add_record("live set recording", RecordKind::Note, &tag_list(&["music", "live"]))
            .unwrap();

        match arcadia.summary("music").unwrap() {
            Summary::Rendered(text) => {
                assert!(text.starts_with("🌿  Music\n"));
                assert!(text.contains("practice scales"));
                assert!(text.contains("  live:\n"));
            }
            Summary::Root(_) => panic!("text view should render"),
        }
    }

    fn take_database(arcadia: Arcadia) -> Database {
        arcadia.db
    }
}
