use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a stored record.
///
/// Distinguishes free-text notes from saved URLs. The store persists the
/// lowercase name; values written by older or foreign tooling that match
/// neither decode as [`RecordKind::Unknown`] so a query can still complete.
/// Unknown-kind records keep contributing their tags to classification but
/// are listed under neither notes nor urls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Free-text note.
    Note,
    /// Saved hyperlink, eligible for page metadata.
    Url,
    /// Persisted kind value this version does not recognize.
    #[serde(other)]
    Unknown,
}

impl RecordKind {
    /// Decodes a persisted kind value. Unrecognized values map to
    /// [`RecordKind::Unknown`] rather than failing the row.
    pub fn parse(value: &str) -> Self {
        match value {
            "note" => Self::Note,
            "url" => Self::Url,
            _ => Self::Unknown,
        }
    }

    /// The persisted form of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Url => "url",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
