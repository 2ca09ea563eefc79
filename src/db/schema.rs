//! SQL schema for the record store.

/// Complete schema, executed as one batch on every open.
///
/// Content is the natural key for records: inserts, updates and deletes
/// all address rows by it, and the UNIQUE constraint backs up the
/// duplicate check done at insert time. Tags are stored as an encoded
/// list in a single TEXT column; the query layer owns that encoding.
pub const INITIAL_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY,
    content TEXT NOT NULL UNIQUE,
    kind TEXT NOT NULL,
    tags TEXT NOT NULL,
    title TEXT,
    description TEXT,
    image TEXT,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_kind ON items(kind);
";
