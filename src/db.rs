mod schema;
pub mod seed;

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use time::OffsetDateTime;
use tracing::debug;

use crate::error::Result;
use crate::models::RecordKind;
use schema::INITIAL_SCHEMA;

/// Column list shared by every row-returning query so that
/// [`Database::map_row`] can stay positional.
const RECORD_COLUMNS: &str = "id, content, kind, tags, title, description, image, created_at";

/// Database wrapper providing connection management and schema initialization.
pub struct Database {
    conn: Connection,
}

/// A stored record exactly as persisted: tags still encoded, kind still a
/// plain string. The query layer normalizes rows into `models::Record`.
#[derive(Debug, Clone)]
pub struct RecordRow {
    pub id: i64,
    pub content: String,
    pub kind: String,
    pub tags: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: i64,
}

/// A record that has not been persisted yet. `tags` carries the encoded
/// tag list; the store never interprets it.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub content: String,
    pub kind: RecordKind,
    pub tags: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Row-level result of an insert attempt.
#[derive(Debug)]
pub enum InsertRow {
    Inserted(RecordRow),
    DuplicateContent(RecordRow),
}

/// Column-level partial update. `None` leaves the column untouched.
#[derive(Debug, Default, Clone)]
pub struct RowPatch {
    pub content: Option<String>,
    pub tags: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl RowPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.tags.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.image.is_none()
    }
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically initializes the schema on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        debug!(path = %path.as_ref().display(), "opening catalog database");
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// Every statement uses IF NOT EXISTS, so reopening an existing
    /// database is a no-op.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute("PRAGMA foreign_keys = ON", [])?;
        self.conn.execute_batch(INITIAL_SCHEMA)?;
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    ///
    /// Useful for executing custom queries in tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs a search with a caller-built WHERE clause and its LIKE
    /// patterns, newest rows first.
    pub fn search_rows(&self, where_sql: &str, patterns: &[String]) -> Result<Vec<RecordRow>> {
        let sql =
            format!("SELECT {RECORD_COLUMNS} FROM items WHERE {where_sql} ORDER BY id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(patterns), Self::map_row)?;
        collect_rows(rows)
    }

    /// Returns `(content, tags)` for every stored record. The vocabulary
    /// operations only need the encoded tag column, and content doubles as
    /// the key when a row turns out to be malformed.
    pub fn tag_rows(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self.conn.prepare("SELECT content, tags FROM items")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut pairs = Vec::new();
        for row in rows {
            pairs.push(row?);
        }
        Ok(pairs)
    }

    /// Looks up a single record by its content key.
    pub fn find_row(&self, key: &str) -> Result<Option<RecordRow>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM items WHERE content = ?1");
        let row = self
            .conn
            .query_row(&sql, [key], Self::map_row)
            .optional()?;
        Ok(row)
    }

    pub fn record_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count)
    }

    pub fn url_record_count(&self) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE kind = 'url'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Inserts a record unless one with the same content already exists.
    ///
    /// The duplicate check and the insert run in one transaction so a
    /// duplicate can never slip in between them. An existing row is
    /// reported back as [`InsertRow::DuplicateContent`], never an error.
    pub fn insert_record(&self, new: &NewRecord) -> Result<InsertRow> {
        let conn = &self.conn;
        conn.execute("BEGIN TRANSACTION", [])?;

        let outcome = (|| -> Result<InsertRow> {
            if let Some(existing) = self.find_row(&new.content)? {
                debug!(key = %new.content, "content already stored");
                return Ok(InsertRow::DuplicateContent(existing));
            }

            let created_at = OffsetDateTime::now_utc().unix_timestamp();
            conn.execute(
                "INSERT INTO items (content, kind, tags, title, description, image, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.content,
                    new.kind.as_str(),
                    new.tags,
                    new.title,
                    new.description,
                    new.image,
                    created_at
                ],
            )?;
            let id = conn.last_insert_rowid();

            Ok(InsertRow::Inserted(RecordRow {
                id,
                content: new.content.clone(),
                kind: new.kind.as_str().to_owned(),
                tags: new.tags.clone(),
                title: new.title.clone(),
                description: new.description.clone(),
                image: new.image.clone(),
                created_at,
            }))
        })();

        match outcome {
            Ok(insert) => {
                conn.execute("COMMIT", [])?;
                Ok(insert)
            }
            Err(err) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(err)
            }
        }
    }

    /// Overwrites the scraped metadata columns of one record.
    ///
    /// Returns `false` when no row carries the given content key.
    pub fn update_meta(
        &self,
        key: &str,
        title: Option<&str>,
        description: Option<&str>,
        image: Option<&str>,
    ) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE items SET title = ?1, description = ?2, image = ?3 WHERE content = ?4",
            params![title, description, image, key],
        )?;
        Ok(changed > 0)
    }

    /// Applies a partial update to the record with the given content key.
    ///
    /// Builds the SET clause from the populated patch fields; an empty
    /// patch only checks that the row exists. Returns `false` when no row
    /// matched.
    pub fn update_record(&self, key: &str, patch: &RowPatch) -> Result<bool> {
        if patch.is_empty() {
            return Ok(self.find_row(key)?.is_some());
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<&dyn rusqlite::ToSql> = Vec::new();
        if let Some(content) = &patch.content {
            sets.push("content = ?");
            values.push(content);
        }
        if let Some(tags) = &patch.tags {
            sets.push("tags = ?");
            values.push(tags);
        }
        if let Some(title) = &patch.title {
            sets.push("title = ?");
            values.push(title);
        }
        if let Some(description) = &patch.description {
            sets.push("description = ?");
            values.push(description);
        }
        if let Some(image) = &patch.image {
            sets.push("image = ?");
            values.push(image);
        }

        let sql = format!("UPDATE items SET {} WHERE content = ?", sets.join(", "));
        values.push(&key);
        let changed = self.conn.execute(&sql, values.as_slice())?;
        Ok(changed > 0)
    }

    /// Deletes the record with the given content key.
    ///
    /// Returns `false` when no row matched.
    pub fn delete_record(&self, key: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM items WHERE content = ?1", [key])?;
        Ok(deleted > 0)
    }

    /// Picks one URL record uniformly at random, `None` when the store
    /// holds no URL records.
    pub fn random_url_row(&self) -> Result<Option<RecordRow>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM items WHERE kind = 'url' ORDER BY RANDOM() LIMIT 1"
        );
        let row = self.conn.query_row(&sql, [], Self::map_row).optional()?;
        Ok(row)
    }

    /// Returns every URL record with no scraped metadata at all, newest
    /// first. Input for the metadata backfill.
    pub fn url_rows_missing_meta(&self) -> Result<Vec<RecordRow>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM items
             WHERE kind = 'url' AND title IS NULL AND description IS NULL AND image IS NULL
             ORDER BY id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], Self::map_row)?;
        collect_rows(rows)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RecordRow> {
        Ok(RecordRow {
            id: row.get(0)?,
            content: row.get(1)?,
            kind: row.get(2)?,
            tags: row.get(3)?,
            title: row.get(4)?,
            description: row.get(5)?,
            image: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

fn collect_rows(
    rows: impl Iterator<Item = rusqlite::Result<RecordRow>>,
) -> Result<Vec<RecordRow>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
