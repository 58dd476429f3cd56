use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use document::{Editor, Record, RecordType};
use overlay::{resolve, Overlay, OverlayConfig, StaticDeck};
use serde::Serialize;
use snapshot::{
    FsFetcher, HttpFetcher, PersistenceCoordinator, SnapshotFetcher, SqliteStorage,
    TimestampedSnapshot,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "inkdeck")]
#[command(about = "Inkdeck CLI - Headless slide drawing overlay operations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the page key of every slide in a deck outline
    Resolve {
        /// Deck outline (JSON)
        deck: PathBuf,
    },

    /// Validate a saved drawings file and summarise its pages
    Inspect {
        /// Snapshot file (.inkdeck)
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a deck's drawings the way the overlay does at startup
    Load {
        /// Deck outline (JSON)
        deck: PathBuf,

        /// Presentation config holding an `inkdeck` block (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Local storage database
        #[arg(long)]
        db: Option<PathBuf>,

        /// Serve remote snapshots from this directory
        #[arg(long, conflicts_with = "base_url")]
        remote_dir: Option<PathBuf>,

        /// Fetch remote snapshots over HTTP relative to this URL
        #[arg(long)]
        base_url: Option<String>,

        /// Path the presentation is served under
        #[arg(long, default_value = "/index.html")]
        page_path: String,
    },

    /// Erase a deck's locally stored drawings
    Clear {
        /// Deck identifier
        deck_id: String,

        /// Local storage database
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Resolve { deck } => resolve_command(deck),
        Commands::Inspect { file, json } => inspect_command(file, json),
        Commands::Load {
            deck,
            config,
            db,
            remote_dir,
            base_url,
            page_path,
        } => load_command(deck, config, db, remote_dir, base_url, page_path).await,
        Commands::Clear { deck_id, db } => clear_command(deck_id, db),
    }
}

fn read_deck(path: &Path) -> Result<StaticDeck> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading deck outline {}", path.display()))?;
    StaticDeck::from_json(&json).with_context(|| format!("parsing deck outline {}", path.display()))
}

fn open_storage(db: Option<PathBuf>) -> Result<SqliteStorage> {
    let path = db.unwrap_or_else(SqliteStorage::default_path);
    info!("Local storage: {:?}", path);
    Ok(SqliteStorage::open_or_create(&path)?)
}

fn resolve_command(deck_path: PathBuf) -> Result<()> {
    let deck = read_deck(&deck_path)?;
    for at in deck.coordinates() {
        println!("{}\t{}", at, resolve(&deck, at));
    }
    Ok(())
}

#[derive(Serialize)]
struct SnapshotSummary {
    timestamp: i64,
    saved_at: Option<String>,
    schema_version: u32,
    current_page: String,
    pages: BTreeMap<String, usize>,
    assets: usize,
}

fn summarize(snapshot: &TimestampedSnapshot) -> SnapshotSummary {
    let records = || snapshot.document.store.values();
    let mut pages: BTreeMap<String, usize> = records()
        .filter_map(Record::as_page)
        .map(|page| (page.name.clone(), 0))
        .collect();
    let names: BTreeMap<_, _> = records()
        .filter_map(Record::as_page)
        .map(|page| (page.id.clone(), page.name.clone()))
        .collect();
    for shape in records().filter_map(Record::as_shape) {
        match names.get(&shape.parent_id) {
            Some(name) => *pages.entry(name.clone()).or_default() += 1,
            None => warn!("Shape {} belongs to missing page {}", shape.id, shape.parent_id),
        }
    }

    SnapshotSummary {
        timestamp: snapshot.timestamp,
        saved_at: chrono::DateTime::<chrono::Utc>::from_timestamp_millis(snapshot.timestamp)
            .map(|t| t.to_rfc3339()),
        schema_version: snapshot.document.schema.schema_version,
        current_page: snapshot.session.current_page_id.to_string(),
        pages,
        assets: records()
            .filter(|r| r.record_type() == RecordType::Asset)
            .count(),
    }
}

fn inspect_command(file: PathBuf, json: bool) -> Result<()> {
    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading snapshot {}", file.display()))?;
    let snapshot = TimestampedSnapshot::parse(&raw)
        .with_context(|| format!("{} is not a valid snapshot", file.display()))?;

    // Loading proves the snapshot is usable, not just well-formed.
    let mut editor = Editor::default();
    snapshot.clone().restore(&mut editor)?;

    let summary = summarize(&snapshot);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Saved at:       {}", summary.saved_at.as_deref().unwrap_or("unknown"));
    println!("Schema version: {}", summary.schema_version);
    println!("Current page:   {}", summary.current_page);
    println!("Assets:         {}", summary.assets);
    println!("Pages:");
    for (name, shapes) in &summary.pages {
        println!("  {:<24} {} shapes", name, shapes);
    }
    Ok(())
}

async fn load_command(
    deck_path: PathBuf,
    config_path: Option<PathBuf>,
    db: Option<PathBuf>,
    remote_dir: Option<PathBuf>,
    base_url: Option<String>,
    page_path: String,
) -> Result<()> {
    let mut deck = read_deck(&deck_path)?;
    let config = match config_path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            OverlayConfig::from_presentation_config(&serde_json::from_str(&raw)?)?
        }
        None => OverlayConfig::default(),
    };

    let fetcher: Option<Box<dyn SnapshotFetcher>> = match (remote_dir, base_url) {
        (Some(dir), _) => Some(Box::new(FsFetcher::new(dir))),
        (None, Some(url)) => Some(Box::new(HttpFetcher::new(Some(&url))?)),
        (None, None) => None,
    };

    let storage = open_storage(db)?;
    let mut overlay = Overlay::new(&mut deck, config, storage);
    let outcome = overlay
        .load(&deck, fetcher.as_deref(), &page_path)
        .await?;

    match outcome.source {
        Some(source) => info!(
            "Loaded {:?} snapshot from {}",
            source,
            outcome
                .timestamp
                .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
                .map(|t| t.to_rfc3339())
                .unwrap_or_default()
        ),
        None => info!("No saved drawings found"),
    }

    let editor = overlay.editor();
    println!("Deck:    {}", overlay.deck_id().unwrap_or("(anonymous)"));
    println!("Source:  {:?}", outcome.source);
    println!("Pages:   {}", editor.page_count());
    println!("Current: {}", editor.current_page_id());
    println!("Shapes on current page: {}", editor.current_page_shapes().len());

    overlay.teardown(&mut deck);
    Ok(())
}

fn clear_command(deck_id: String, db: Option<PathBuf>) -> Result<()> {
    let storage = open_storage(db)?;
    let mut coordinator = PersistenceCoordinator::new(Some(deck_id.clone()), storage, false);
    let mut editor = Editor::default();
    coordinator.clear_local(editor.store_mut())?;
    info!("Cleared local drawings of deck {}", deck_id);
    Ok(())
}
