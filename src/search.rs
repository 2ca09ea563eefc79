//! Query layer between the store and the tag hierarchy engine.
//!
//! Owns the matching predicate (parameterized LIKE clauses), the persisted
//! tag encoding, and the normalization of raw rows into [`Record`]s. The
//! engine upstream only ever sees decoded records.

use std::collections::{BTreeMap, HashSet};

use time::OffsetDateTime;
use tracing::debug;

use crate::db::{Database, RecordRow};
use crate::error::{Error, Result};
use crate::models::{Record, RecordKind};

/// WHERE clause and its bound LIKE patterns for one search term.
#[derive(Debug)]
pub struct SearchPredicate {
    clause: String,
    patterns: Vec<String>,
}

impl SearchPredicate {
    /// Terms must be longer than this before raw content is matched by
    /// substring. Shorter terms still hit tags and metadata tokens, which
    /// keeps one-letter queries from matching half the store.
    const CONTENT_MATCH_MIN: usize = 3;

    pub fn for_term(term: &str) -> Self {
        let mut clauses = Vec::new();
        let mut patterns = Vec::new();

        if term.len() > Self::CONTENT_MATCH_MIN {
            clauses.push("content LIKE ?");
            patterns.push(format!("%{term}%"));
        }
        // Tag hits apply at any length: exact token, prefix, suffix of a
        // token in the encoded list.
        clauses.push("tags LIKE ?");
        patterns.push(format!("%\"{term}\"%"));
        clauses.push("tags LIKE ?");
        patterns.push(format!("%\"{term}%"));
        clauses.push("tags LIKE ?");
        patterns.push(format!("%{term}\"%"));
        // Title and description match space-bounded tokens only.
        clauses.push("title LIKE ?");
        patterns.push(format!("% {term} %"));
        clauses.push("description LIKE ?");
        patterns.push(format!("% {term} %"));

        Self {
            clause: clauses.join(" OR "),
            patterns,
        }
    }

    pub fn clause(&self) -> &str {
        &self.clause
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// Finds every record matching `term`, newest first.
///
/// A stored row whose tag list does not decode surfaces as
/// [`Error::MalformedRecord`] and aborts the whole call; a partial result
/// would silently misreport the catalog.
pub fn search(db: &Database, term: &str) -> Result<Vec<Record>> {
    let predicate = SearchPredicate::for_term(term);
    let rows = db.search_rows(predicate.clause(), predicate.patterns())?;
    debug!(term, matches = rows.len(), "search complete");
    rows.into_iter().map(record_from_row).collect()
}

/// Distinct union of all tags across all records.
///
/// Case-insensitively deduplicated (the first spelling encountered wins)
/// and sorted ascending case-insensitively.
pub fn vocabulary(db: &Database) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut subjects = Vec::new();
    for (key, encoded) in db.tag_rows()? {
        for tag in decode_tags(&key, &encoded)? {
            if seen.insert(tag.to_lowercase()) {
                subjects.push(tag);
            }
        }
    }
    subjects.sort_by_key(|subject| subject.to_lowercase());
    Ok(subjects)
}

/// The vocabulary bucketed by first letter.
///
/// All 26 buckets `'A'..='Z'` are always present, empty or not. A subject
/// whose first character does not uppercase into that range is listed in
/// no bucket.
pub fn grouped_vocabulary(db: &Database) -> Result<BTreeMap<char, Vec<String>>> {
    let mut groups: BTreeMap<char, Vec<String>> =
        ('A'..='Z').map(|letter| (letter, Vec::new())).collect();

    for subject in vocabulary(db)? {
        let Some(first) = subject.chars().next() else {
            continue;
        };
        let Some(letter) = first.to_uppercase().next() else {
            continue;
        };
        if let Some(bucket) = groups.get_mut(&letter) {
            bucket.push(subject);
        }
    }
    Ok(groups)
}

/// Vocabulary entries containing `term` case-insensitively, excluding an
/// exact (case-insensitive) match of `term` itself.
pub fn similar(db: &Database, term: &str) -> Result<Vec<String>> {
    let needle = term.to_lowercase();
    let matches = vocabulary(db)?
        .into_iter()
        .filter(|subject| {
            let subject = subject.to_lowercase();
            subject.contains(&needle) && subject != needle
        })
        .collect();
    Ok(matches)
}

/// Encodes a tag list into its persisted representation, a JSON array of
/// strings. The inverse of [`decode_tags`].
pub fn encode_tags(tags: &[String]) -> String {
    serde_json::Value::from(tags.to_vec()).to_string()
}

/// Decodes a persisted tag column. `key` identifies the offending record
/// when the stored text is not a JSON string array.
///
/// Decoded lists get set semantics: case-insensitive duplicates collapse
/// onto the first spelling, insertion order preserved.
pub fn decode_tags(key: &str, encoded: &str) -> Result<Vec<String>> {
    let raw: Vec<String> =
        serde_json::from_str(encoded).map_err(|err| Error::malformed(key, err))?;

    let mut seen = HashSet::new();
    let mut tags = Vec::with_capacity(raw.len());
    for tag in raw {
        if seen.insert(tag.to_lowercase()) {
            tags.push(tag);
        }
    }
    Ok(tags)
}

/// Normalizes a raw store row into a [`Record`], decoding the tag list
/// and the stored timestamp.
pub(crate) fn record_from_row(row: RecordRow) -> Result<Record> {
    let tags = decode_tags(&row.content, &row.tags)?;
    let timestamp = OffsetDateTime::from_unix_timestamp(row.created_at)
        .map_err(|err| Error::malformed(&row.content, err))?;

    Ok(Record {
        id: row.id,
        timestamp,
        kind: RecordKind::parse(&row.kind),
        tags,
        content: row.content,
        title: row.title,
        description: row.description,
        image: row.image,
    })
}
