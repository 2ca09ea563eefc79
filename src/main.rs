use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use arcadia::db::seed;
use arcadia::{
    Arcadia, DataView, Database, DeleteOutcome, InsertOutcome, RecordKind, Summary, UpdateFields,
    UpdateOutcome, Vine, config,
};

/// arcadia - a personal knowledge catalog for notes and links
#[derive(Parser)]
#[command(name = "arcadia")]
#[command(about = "A personal catalog of notes and links, browsed by tag")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Search records by subject and print a tag-tree summary
    Search(SearchCommand),
    /// Add a new record with tags
    Add(AddCommand),
    /// List every subject in the catalog
    Subjects(SubjectsCommand),
    /// List subjects resembling a term
    Similar(SimilarCommand),
    /// Update fields of the record keyed by its content
    Update(UpdateCommand),
    /// Delete the record keyed by its content
    Delete(DeleteCommand),
    /// Show one random URL record
    Random,
    /// Show catalog counters
    Stats,
    /// Backfill page metadata for URL records missing it
    SyncMeta,
}

/// Search the catalog
#[derive(Parser)]
struct SearchCommand {
    /// The subject to search for
    #[arg(value_name = "TERM")]
    term: String,

    /// Output view: text, enhanced or raw
    #[arg(short, long, value_name = "VIEW", default_value = "text")]
    view: String,
}

/// Add a new record
#[derive(Parser)]
struct AddCommand {
    /// The content of the record: a URL, or the body of a note
    #[arg(value_name = "CONTENT")]
    content: String,

    /// Comma-separated tags to attach to the record
    #[arg(short, long, value_name = "TAGS")]
    tags: String,

    /// Record kind: url or note
    #[arg(short, long, value_name = "KIND", default_value = "url")]
    kind: String,
}

/// List subjects
#[derive(Parser)]
struct SubjectsCommand {
    /// Bucket subjects by first letter
    #[arg(short, long)]
    grouped: bool,
}

/// List similar subjects
#[derive(Parser)]
struct SimilarCommand {
    /// The term to compare subjects against
    #[arg(value_name = "TERM")]
    term: String,
}

/// Update a record
#[derive(Parser)]
struct UpdateCommand {
    /// Current content of the record to update
    #[arg(value_name = "KEY")]
    key: String,

    /// Replacement content
    #[arg(long, value_name = "CONTENT")]
    content: Option<String>,

    /// Replacement page title
    #[arg(long, value_name = "TITLE")]
    title: Option<String>,

    /// Replacement comma-separated tag list
    #[arg(long, value_name = "TAGS")]
    tags: Option<String>,

    /// Replacement page description
    #[arg(long, value_name = "DESCRIPTION")]
    description: Option<String>,

    /// Replacement page image reference
    #[arg(long, value_name = "IMAGE")]
    image: Option<String>,
}

/// Delete a record
#[derive(Parser)]
struct DeleteCommand {
    /// Content of the record to delete
    #[arg(value_name = "KEY")]
    key: String,
}

fn main() {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Search(cmd) => handle_search(cmd),
        Commands::Add(cmd) => handle_add(cmd),
        Commands::Subjects(cmd) => handle_subjects(cmd),
        Commands::Similar(cmd) => handle_similar(cmd),
        Commands::Update(cmd) => handle_update(cmd),
        Commands::Delete(cmd) => handle_delete(cmd),
        Commands::Random => handle_random(),
        Commands::Stats => handle_stats(),
        Commands::SyncMeta => handle_sync_meta(),
    };

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e}");
        std::process::exit(exit_code);
    }
}

/// Installs the tracing subscriber, writing to stderr so stdout stays
/// clean for command output. `RUST_LOG` overrides the default filter.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("arcadia=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors include validation failures like empty content or a bad
/// tag list. Internal errors include database failures and I/O errors.
fn is_user_error(error: &anyhow::Error) -> bool {
    if error
        .downcast_ref::<arcadia::Error>()
        .is_some_and(|err| matches!(err, arcadia::Error::InvalidTag))
    {
        return true;
    }

    let message = error.to_string();
    message.contains("cannot be empty")
        || message.contains("unknown view")
        || message.contains("unknown kind")
        || message.contains("nothing to update")
}

/// Opens the configured database, seeding it on first use, and wraps it
/// in a catalog with the real page scraper.
fn open_catalog(view: DataView) -> Result<Arcadia> {
    let db_path = config::database_path()?;
    config::ensure_database_directory(&db_path)?;

    let db = Database::open(&db_path).context("Failed to open database")?;
    seed::ensure_seeded(&db).context("Failed to seed empty catalog")?;

    Arcadia::new(db, view).context("Failed to build HTTP client")
}

/// Handles the search command by summarizing matching records.
fn handle_search(cmd: &SearchCommand) -> Result<()> {
    if cmd.term.trim().is_empty() {
        anyhow::bail!("Search term cannot be empty");
    }
    let view = DataView::parse(&cmd.view).ok_or_else(|| {
        anyhow::anyhow!("unknown view: {} (expected text, enhanced or raw)", cmd.view)
    })?;

    let arcadia = open_catalog(view)?;
    execute_search(&cmd.term, arcadia)
}

/// Executes the search command logic with a provided catalog.
///
/// Separated from `handle_search` to allow testing with in-memory databases.
fn execute_search(term: &str, arcadia: Arcadia) -> Result<()> {
    let related = arcadia.similar_subjects(term)?;
    if !related.is_empty() {
        println!("Related subjects: {}", Vine::tag_string(&related));
    }

    match arcadia.summary(term)? {
        Summary::Rendered(text) => print!("{text}"),
        Summary::Root(root) => {
            let json = serde_json::to_string_pretty(&root).context("Failed to encode summary")?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Handles the add command by storing a new record.
fn handle_add(cmd: &AddCommand) -> Result<()> {
    // Validate content is not empty or whitespace-only
    if cmd.content.trim().is_empty() {
        anyhow::bail!("Record content cannot be empty");
    }
    let kind = parse_kind(&cmd.kind)?;

    let arcadia = open_catalog(DataView::default())?;
    execute_add(&cmd.content, kind, &cmd.tags, arcadia)
}

/// Executes the add command logic with a provided catalog.
fn execute_add(content: &str, kind: RecordKind, tags: &str, arcadia: Arcadia) -> Result<()> {
    let tags = parse_tags(tags);
    let outcome = arcadia.add_record(content, kind, &tags)?;

    match outcome {
        InsertOutcome::Added(record) => {
            println!(
                "Record added (id: {}) with tags: {}",
                record.id,
                Vine::tag_string(&record.tags)
            );
        }
        InsertOutcome::Duplicate(record) => {
            println!("Already in the catalog (id: {}), nothing added", record.id);
        }
    }
    Ok(())
}

/// Handles the subjects command.
fn handle_subjects(cmd: &SubjectsCommand) -> Result<()> {
    let arcadia = open_catalog(DataView::default())?;
    execute_subjects(cmd.grouped, arcadia)
}

/// Executes the subjects command logic with a provided catalog.
fn execute_subjects(grouped: bool, arcadia: Arcadia) -> Result<()> {
    if grouped {
        for (letter, subjects) in arcadia.grouped_subjects()? {
            if subjects.is_empty() {
                continue;
            }
            println!("{letter}: {}", Vine::tag_string(&subjects));
        }
    } else {
        let subjects = arcadia.subjects()?;
        if subjects.is_empty() {
            println!("No subjects yet");
        } else {
            println!("{}", Vine::tag_string(&subjects));
        }
    }
    Ok(())
}

/// Handles the similar command.
fn handle_similar(cmd: &SimilarCommand) -> Result<()> {
    let arcadia = open_catalog(DataView::default())?;
    execute_similar(&cmd.term, arcadia)
}

/// Executes the similar command logic with a provided catalog.
fn execute_similar(term: &str, arcadia: Arcadia) -> Result<()> {
    let similar = arcadia.similar_subjects(term)?;
    if similar.is_empty() {
        println!("No similar subjects");
    } else {
        println!("{}", Vine::tag_string(&similar));
    }
    Ok(())
}

/// Handles the update command.
fn handle_update(cmd: &UpdateCommand) -> Result<()> {
    let fields = UpdateFields {
        content: cmd.content.clone(),
        title: cmd.title.clone(),
        tags: cmd.tags.as_deref().map(parse_tags),
        description: cmd.description.clone(),
        image: cmd.image.clone(),
    };
    if fields.is_empty() {
        anyhow::bail!("nothing to update: supply at least one field");
    }

    let arcadia = open_catalog(DataView::default())?;
    execute_update(&cmd.key, &fields, arcadia)
}

/// Executes the update command logic with a provided catalog.
fn execute_update(key: &str, fields: &UpdateFields, arcadia: Arcadia) -> Result<()> {
    match arcadia.update_record(key, fields)? {
        UpdateOutcome::Updated => println!("Record updated"),
        UpdateOutcome::NotFound => println!("No record found for: {key}"),
    }
    Ok(())
}

/// Handles the delete command.
fn handle_delete(cmd: &DeleteCommand) -> Result<()> {
    let arcadia = open_catalog(DataView::default())?;
    execute_delete(&cmd.key, arcadia)
}

/// Executes the delete command logic with a provided catalog.
fn execute_delete(key: &str, arcadia: Arcadia) -> Result<()> {
    match arcadia.remove_record(key)? {
        DeleteOutcome::Deleted => println!("Record deleted"),
        DeleteOutcome::NotFound => println!("No record found for: {key}"),
    }
    Ok(())
}

/// Handles the random command.
fn handle_random() -> Result<()> {
    let arcadia = open_catalog(DataView::default())?;
    execute_random(arcadia)
}

/// Executes the random command logic with a provided catalog.
fn execute_random(arcadia: Arcadia) -> Result<()> {
    match arcadia.random_url_record()? {
        Some(record) => {
            if let Some(title) = &record.title {
                println!("{title}");
            }
            println!("{}", record.content);
        }
        None => println!("No URL records in the catalog"),
    }
    Ok(())
}

/// Handles the stats command.
fn handle_stats() -> Result<()> {
    let arcadia = open_catalog(DataView::default())?;
    execute_stats(arcadia)
}

/// Executes the stats command logic with a provided catalog.
fn execute_stats(arcadia: Arcadia) -> Result<()> {
    let records = arcadia.record_count()?;
    let urls = arcadia.url_record_count()?;
    println!("Records: {records} ({urls} URLs)");
    Ok(())
}

/// Handles the sync-meta command.
fn handle_sync_meta() -> Result<()> {
    let arcadia = open_catalog(DataView::default())?;
    execute_sync_meta(arcadia)
}

/// Executes the sync-meta command logic with a provided catalog.
fn execute_sync_meta(arcadia: Arcadia) -> Result<()> {
    let updated = arcadia
        .sync_missing_metadata()
        .context("Failed to sync metadata")?;
    println!("Updated metadata for {updated} record(s)");
    Ok(())
}

/// Parses a record kind as supplied on the command line.
fn parse_kind(value: &str) -> Result<RecordKind> {
    match RecordKind::parse(&value.to_lowercase()) {
        RecordKind::Unknown => anyhow::bail!("unknown kind: {value} (expected url or note)"),
        kind => Ok(kind),
    }
}

/// Parses comma-separated tags from a string.
///
/// Splits on commas, trims whitespace from each tag, and filters out empty
/// strings.
fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
