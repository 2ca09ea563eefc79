//! End-to-end summary tests: records go in through the facade, a query
//! term comes back as a rendered tag tree or a raw structure.

use anyhow::Result;
use arcadia::scraper::{MetaFetcher, PageMeta, ScrapeError};
use arcadia::{Arcadia, DataView, Database, RecordKind, Summary};

struct NoMetaFetcher;

impl MetaFetcher for NoMetaFetcher {
    fn fetch_page_meta(&self, _url: &str) -> std::result::Result<PageMeta, ScrapeError> {
        Ok(PageMeta::default())
    }
}

fn catalog(view: DataView) -> Result<Arcadia> {
    Ok(Arcadia::with_fetcher(
        Database::in_memory()?,
        view,
        Box::new(NoMetaFetcher),
    ))
}

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

fn rendered(summary: Summary) -> String {
    match summary {
        Summary::Rendered(text) => text,
        Summary::Root(_) => panic!("expected rendered text"),
    }
}

#[test]
fn solely_tagged_records_fill_the_main_node() -> Result<()> {
    let arcadia = catalog(DataView::Text)?;
    arcadia.add_record("practice scales", RecordKind::Note, &tags(&["music"]))?;
    arcadia.add_record(
        "live set recording",
        RecordKind::Note,
        &tags(&["music", "live"]),
    )?;

    let text = rendered(arcadia.summary("music")?);

    // Main section first, blank line, then the one sub-node; the
    // query subject itself never becomes a sub-node here.
    assert!(text.starts_with("🌿  Music\n"));
    assert!(text.contains("practice scales"));
    assert!(text.contains("\n\n"));
    assert!(text.contains("  live:\n"));
    assert!(!text.contains("  music:\n"));

    Ok(())
}

#[test]
fn without_a_sole_claim_the_subject_is_an_ordinary_sub_node() -> Result<()> {
    let arcadia = catalog(DataView::Text)?;
    arcadia.add_record("generics notes", RecordKind::Note, &tags(&["go", "rust"]))?;

    let text = rendered(arcadia.summary("go")?);

    assert!(text.starts_with("🌿  Go\n"));
    assert!(text.contains("  go:\n"));
    assert!(text.contains("  rust:\n"));
    assert!(!text.contains("\n\n"));

    Ok(())
}

#[test]
fn matching_is_case_insensitive_end_to_end() -> Result<()> {
    let arcadia = catalog(DataView::Text)?;
    arcadia.add_record("practice scales", RecordKind::Note, &tags(&["music"]))?;

    let text = rendered(arcadia.summary("MUSIC")?);

    assert!(text.starts_with("🌿  Music\n"));
    assert!(text.contains("practice scales"));
    assert!(!text.contains("No results found"));

    Ok(())
}

#[test]
fn unmatched_terms_render_no_results() -> Result<()> {
    let arcadia = catalog(DataView::Text)?;
    arcadia.add_record("practice scales", RecordKind::Note, &tags(&["music"]))?;

    let text = rendered(arcadia.summary("gardening")?);
    assert_eq!(text, "🌿  Gardening\n No results found\n");

    Ok(())
}

#[test]
fn enhanced_view_wraps_subjects_in_emphasis() -> Result<()> {
    let arcadia = catalog(DataView::EnhancedText)?;
    arcadia.add_record("practice scales", RecordKind::Note, &tags(&["music"]))?;
    arcadia.add_record(
        "live set recording",
        RecordKind::Note,
        &tags(&["music", "live"]),
    )?;

    let text = rendered(arcadia.summary("music")?);

    assert!(text.starts_with("🌿  *Music*\n"));
    assert!(text.contains("  *live*\n"));
    assert!(!text.contains("live:"));

    Ok(())
}

#[test]
fn raw_view_hands_back_the_tree_as_data() -> Result<()> {
    let arcadia = catalog(DataView::Raw)?;
    arcadia.add_record("practice scales", RecordKind::Note, &tags(&["music"]))?;
    arcadia.add_record(
        "live set recording",
        RecordKind::Note,
        &tags(&["music", "live"]),
    )?;

    let root = match arcadia.summary("music")? {
        Summary::Root(root) => root,
        Summary::Rendered(_) => panic!("raw view should not render"),
    };

    assert_eq!(root.subject, "music");
    let main = root.main_node.as_ref().unwrap();
    assert_eq!(main.notes.len(), 1);
    assert_eq!(main.notes[0].content, "practice scales");
    assert_eq!(root.sub_nodes.len(), 1);
    assert_eq!(root.sub_nodes[0].subject, "live");

    // The tree serializes with stable field names for consumers
    let json = serde_json::to_value(&root)?;
    assert!(json.get("main_node").is_some());
    assert!(json.get("sub_nodes").is_some());

    Ok(())
}

#[test]
fn urls_and_notes_partition_within_a_node() -> Result<()> {
    let arcadia = catalog(DataView::Raw)?;
    arcadia.add_record("practice scales", RecordKind::Note, &tags(&["music"]))?;
    arcadia.add_record("https://venue.example", RecordKind::Url, &tags(&["music"]))?;

    let root = match arcadia.summary("music")? {
        Summary::Root(root) => root,
        Summary::Rendered(_) => panic!("raw view should not render"),
    };

    let main = root.main_node.as_ref().unwrap();
    assert_eq!(main.notes.len(), 1);
    assert_eq!(main.urls.len(), 1);
    assert_eq!(main.urls[0].content, "https://venue.example");

    Ok(())
}
