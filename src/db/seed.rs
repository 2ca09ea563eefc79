//! Starter data for a brand-new catalog.

use tracing::info;

use crate::db::{Database, InsertRow, NewRecord};
use crate::error::Result;
use crate::models::RecordKind;
use crate::search::encode_tags;

/// The records a fresh catalog starts with, so the first search has
/// something to show. One bookmark with its metadata pre-supplied.
pub fn initial_records() -> Vec<NewRecord> {
    vec![NewRecord {
        content: "https://www.rust-lang.org/".to_string(),
        kind: RecordKind::Url,
        tags: encode_tags(&["rust".to_string()]),
        title: Some("Rust Programming Language".to_string()),
        description: Some(
            "A language empowering everyone to build reliable and efficient software."
                .to_string(),
        ),
        image: Some("https://www.rust-lang.org/static/images/rust-social-wide.jpg".to_string()),
    }]
}

/// Seeds the starter records into an empty store.
///
/// A store that already holds any record is left untouched, so reruns
/// and tests against pre-populated databases are safe. Returns how many
/// records were added.
pub fn ensure_seeded(db: &Database) -> Result<usize> {
    if db.record_count()? > 0 {
        return Ok(0);
    }

    let mut added = 0;
    for record in initial_records() {
        if let InsertRow::Inserted(_) = db.insert_record(&record)? {
            added += 1;
        }
    }
    if added > 0 {
        info!(added, "seeded starter records into empty catalog");
    }
    Ok(added)
}
