use serde::{Deserialize, Serialize};
use std::fmt;

/// Output projection for a query summary.
///
/// Controls only how a built vine is presented, never how the tree is
/// structured: the same records produce the same nodes under every view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataView {
    /// Plain text output.
    #[default]
    Text,
    /// Text output with subjects wrapped in emphasis markers, for consumers
    /// that render lightweight markup.
    #[serde(rename = "enhanced")]
    EnhancedText,
    /// No rendering: the vine root is handed back as a structure.
    Raw,
}

impl DataView {
    /// Parses a view name as supplied on the command line.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            "enhanced" => Some(Self::EnhancedText),
            "raw" => Some(Self::Raw),
            _ => None,
        }
    }
}

impl fmt::Display for DataView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::EnhancedText => "enhanced",
            Self::Raw => "raw",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_views_case_insensitively() {
        assert_eq!(DataView::parse("text"), Some(DataView::Text));
        assert_eq!(DataView::parse("Enhanced"), Some(DataView::EnhancedText));
        assert_eq!(DataView::parse("RAW"), Some(DataView::Raw));
    }

    #[test]
    fn parse_rejects_unknown_views() {
        assert_eq!(DataView::parse("markdown"), None);
        assert_eq!(DataView::parse(""), None);
    }

    #[test]
    fn default_is_plain_text() {
        assert_eq!(DataView::default(), DataView::Text);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for view in [DataView::Text, DataView::EnhancedText, DataView::Raw] {
            assert_eq!(DataView::parse(&view.to_string()), Some(view));
        }
    }
}
