//! Tag hierarchy engine: folds a flat set of matched records into a
//! two-level tree around one query subject.
//!
//! A [`Vine`] is built fresh per query, summarized once, and discarded.
//! Nothing here touches the store; records arrive already decoded and in
//! their final order (newest first), and the engine only routes them.

use std::collections::HashSet;

use serde::Serialize;
use time::macros::format_description;
use tracing::warn;

use crate::models::{DataView, Record, RecordKind};

/// One node of the tree: the records filed under a single subject,
/// partitioned by kind.
#[derive(Debug, Clone, Serialize)]
pub struct VineNode {
    pub subject: String,
    pub notes: Vec<Record>,
    pub urls: Vec<Record>,
}

impl VineNode {
    fn new(subject: String) -> Self {
        Self {
            subject,
            notes: Vec::new(),
            urls: Vec::new(),
        }
    }

    /// Files a record by kind. Unrecognized kinds are kept out of both
    /// lists; their tags have already shaped the tree by this point.
    fn push(&mut self, record: Record) {
        match record.kind {
            RecordKind::Note => self.notes.push(record),
            RecordKind::Url => self.urls.push(record),
            RecordKind::Unknown => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.urls.is_empty()
    }
}

/// The two-level result tree for one query subject.
#[derive(Debug, Clone, Serialize)]
pub struct VineRoot {
    pub subject: String,
    pub main_node: Option<VineNode>,
    pub sub_nodes: Vec<VineNode>,
}

impl VineRoot {
    pub fn is_empty(&self) -> bool {
        self.main_node.is_none() && self.sub_nodes.is_empty()
    }
}

/// A produced summary: rendered text for the text views, the bare tree
/// for programmatic consumption.
#[derive(Debug)]
pub enum Summary {
    Rendered(String),
    Root(VineRoot),
}

/// Builds and renders the tree. See the module docs for the lifecycle.
#[derive(Debug)]
pub struct Vine {
    root: VineRoot,
    matched: usize,
}

impl Vine {
    /// Classifies `records` around `subject`.
    ///
    /// A record lands in the main node iff the query subject is its only
    /// tag (case-insensitive). When any record does, the subject is
    /// absorbed: it never becomes a sub-node subject for this query. When
    /// none does, the subject classifies like any other tag. Every other
    /// distinct tag becomes exactly one sub-node, in case-insensitive
    /// ascending order, and a record appears under every sub-node whose
    /// subject it carries.
    pub fn build(subject: &str, records: Vec<Record>) -> Self {
        let mut root = VineRoot {
            subject: subject.to_string(),
            main_node: None,
            sub_nodes: Vec::new(),
        };
        let matched = records.len();
        if records.is_empty() {
            return Self { root, matched };
        }

        for record in &records {
            if record.kind == RecordKind::Unknown {
                warn!(key = %record.content, "record with unrecognized kind kept out of summary listings");
            }
        }

        let main_claimed = records
            .iter()
            .any(|record| record.tagged_solely_with(subject));

        // Distinct tags, first spelling wins, case-insensitive ascending.
        // This fixes sub-node emission order.
        let mut seen = HashSet::new();
        let mut categories: Vec<String> = Vec::new();
        for record in &records {
            for tag in &record.tags {
                if seen.insert(tag.to_lowercase()) {
                    categories.push(tag.clone());
                }
            }
        }
        categories.sort_by_key(|category| category.to_lowercase());

        for category in categories {
            let category_is_subject = category.to_lowercase() == subject.to_lowercase();

            if main_claimed && category_is_subject {
                let mut node = VineNode::new(category);
                for record in &records {
                    if record.tagged_solely_with(subject) {
                        node.push(record.clone());
                    }
                }
                root.main_node = Some(node);
                continue;
            }

            let mut node = VineNode::new(category.clone());
            for record in &records {
                if record.has_tag(&category) {
                    node.push(record.clone());
                }
            }
            root.sub_nodes.push(node);
        }

        Self { root, matched }
    }

    pub fn root(&self) -> &VineRoot {
        &self.root
    }

    /// Produces the summary for the requested view and consumes the tree.
    pub fn summarize(self, view: DataView) -> Summary {
        match view {
            DataView::Raw => Summary::Root(self.root),
            DataView::Text => Summary::Rendered(self.render(false)),
            DataView::EnhancedText => Summary::Rendered(self.render(true)),
        }
    }

    /// The one canonical tag display format: joined with `,`, no
    /// trailing separator. An empty list renders as an empty string.
    pub fn tag_string(tags: &[String]) -> String {
        tags.join(",")
    }

    fn render(&self, emphasized: bool) -> String {
        let title = capitalize(&self.root.subject);
        let mut out = if emphasized {
            format!("🌿  *{title}*\n")
        } else {
            format!("🌿  {title}\n")
        };

        if self.matched == 0 {
            out.push_str(" No results found\n");
            return out;
        }

        if let Some(main) = &self.root.main_node {
            for record in main.notes.iter().chain(&main.urls) {
                out.push_str("  ");
                push_record_line(&mut out, record);
            }
        }

        if self.root.main_node.is_some() && !self.root.sub_nodes.is_empty() {
            out.push('\n');
        }

        for node in &self.root.sub_nodes {
            if emphasized {
                out.push_str(&format!("  *{}*\n", node.subject));
            } else {
                out.push_str(&format!("  {}:\n", node.subject));
            }
            for record in node.notes.iter().chain(&node.urls) {
                out.push_str("     ");
                push_record_line(&mut out, record);
            }
        }

        out
    }
}

fn push_record_line(out: &mut String, record: &Record) {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let timestamp = record
        .timestamp
        .format(&format)
        .unwrap_or_else(|_| "????-??-?? ??:??:??".to_string());
    out.push_str(&format!(
        "◦ {timestamp} [{}]: {}\n",
        Vine::tag_string(&record.tags),
        record.content
    ));
}

/// First character uppercased, the rest lowered.
fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
