use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use deckstats_core::{
    AnalysisRun, CardStore, DecklistParser, DecklistSource, MalformedLinePolicy, ReportBundle,
    ReportMeta, analyze,
};
use deckstats_db::{
    CorpusDir, JsonCardStore, ReportFormat, RunConfig, corpus_fingerprint, read_authoritative_csv,
    write_report,
};
use deckstats_sqlite::Migration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_PREFIX: &str = "ds_";

/// CLI-specific report format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliReportFormat {
    Csv,
    Json,
    Markdown,
}

impl From<CliReportFormat> for ReportFormat {
    fn from(fmt: CliReportFormat) -> Self {
        match fmt {
            CliReportFormat::Csv => Self::Csv,
            CliReportFormat::Json => Self::Json,
            CliReportFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliTargetMode {
    Derived,
    Fixed,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliAdjustment {
    ModeSubstitution,
    UnitStep,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "deckstats")]
#[command(about = "Statistical consensus decklists from a corpus of tournament decklists")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze an archetype's decklists and write consensus reports.
    Analyze(AnalyzeArgs),
    /// Merge an authoritative card CSV into the card database.
    ImportCards(ImportCardsArgs),
    /// Parse decklist files (or stdin) and print the observations.
    Parse(ParseArgs),
    /// Copy the JSON card database into a SQLite table.
    SyncSqlite(SyncSqliteArgs),
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Run configuration YAML; command-line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Game format (e.g. premodern).
    #[arg(long)]
    format: Option<String>,
    /// Archetype to analyze.
    #[arg(long)]
    archetype: Option<String>,
    /// Root of the decklist corpus.
    #[arg(long)]
    corpus_dir: Option<PathBuf>,
    /// JSON card database path.
    #[arg(long)]
    card_db: Option<PathBuf>,
    /// Authoritative card CSV merged into the card database before the run.
    #[arg(long)]
    cards_csv: Option<PathBuf>,
    /// Use this SQLite database as card store instead of the JSON file.
    #[arg(long)]
    sqlite: Option<PathBuf>,
    /// Table prefix for --sqlite.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,
    /// Output directory for report files.
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Comma-separated report formats.
    #[arg(long = "report-format", value_enum, value_delimiter = ',')]
    report_formats: Vec<CliReportFormat>,
    /// Where reconciliation targets come from.
    #[arg(long, value_enum)]
    target_mode: Option<CliTargetMode>,
    /// How quantities are adjusted toward the targets.
    #[arg(long, value_enum)]
    adjustment: Option<CliAdjustment>,
    /// Analyze all decklists together instead of per color identity.
    #[arg(long)]
    no_color_partitioning: bool,
    /// Skip the subtype-level table.
    #[arg(long)]
    no_subtypes: bool,
    /// Reconciliation step cap per group.
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Fail on malformed decklist lines instead of skipping them.
    #[arg(long)]
    reject_malformed: bool,
    /// Number of parallel cohort jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(Debug, Args)]
struct ImportCardsArgs {
    /// CSV with columns format,name,type,subtype,color.
    #[arg(long)]
    csv: PathBuf,
    /// JSON card database path.
    #[arg(long, default_value = "cards_db.json")]
    card_db: PathBuf,
    /// Import into this SQLite database instead of the JSON file.
    #[arg(long)]
    sqlite: Option<PathBuf>,
    /// Table prefix for --sqlite.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Decklist files; reads one decklist from stdin when omitted.
    inputs: Vec<PathBuf>,
    /// Fail on malformed lines instead of skipping them.
    #[arg(long)]
    reject_malformed: bool,
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    output: CliOutputFormat,
}

#[derive(Debug, Args)]
struct SyncSqliteArgs {
    /// SQLite database file path.
    #[arg(long)]
    db: PathBuf,
    /// Table prefix.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,
    /// JSON card database path.
    #[arg(long, default_value = "cards_db.json")]
    card_db: PathBuf,
    /// Drop and recreate the table before seeding.
    #[arg(long)]
    refresh: bool,
    /// Also merge the SQLite rows back into the JSON card database.
    #[arg(long)]
    export: bool,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::ImportCards(args) => run_import_cards(args),
        Command::Parse(args) => run_parse(args),
        Command::SyncSqlite(args) => run_sync_sqlite(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,deckstats=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// analyze command
// ---------------------------------------------------------------------------

fn run_analyze(args: AnalyzeArgs) -> Result<(), String> {
    let config = resolve_run_config(&args)?;
    if config.format.trim().is_empty() || config.archetype.trim().is_empty() {
        return Err("format and archetype are required (--format/--archetype or config file)".to_string());
    }

    let blobs = CorpusDir::new(&config.corpus_dir)
        .list_decklist_blobs(&config.format, &config.archetype)
        .map_err(|e| format!("Failed to read decklists: {e}"))?;
    info!(
        format = %config.format,
        archetype = %config.archetype,
        decklists = blobs.len(),
        "starting analysis"
    );

    let run = match &args.sqlite {
        Some(db) => {
            let mut migration = open_migration(db, &args.prefix)?;
            migration
                .up()
                .map_err(|e| format!("Migration up failed: {e}"))?;
            if let Some(csv) = &config.authoritative_cards {
                let rows = read_authoritative_csv(csv).map_err(|e| format!("Failed to read '{}': {e}", csv.display()))?;
                migration
                    .import(rows)
                    .map_err(|e| format!("Card import failed: {e}"))?;
            }
            let mut store = migration
                .store()
                .map_err(|e| format!("Failed to open card store: {e}"))?;
            analyze_with(&blobs, &config, &mut store)?
        }
        None => {
            let mut store = JsonCardStore::open(&config.card_db)
                .map_err(|e| format!("Failed to open card database '{}': {e}", config.card_db.display()))?;
            if let Some(csv) = &config.authoritative_cards {
                store
                    .import_csv(csv)
                    .map_err(|e| format!("Card import failed: {e}"))?;
            }
            analyze_with(&blobs, &config, &mut store)?
        }
    };

    print_run_summary(&run);

    let bundle = ReportBundle::new(
        run,
        ReportMeta {
            generated_at: chrono::Utc::now().to_rfc3339(),
            archetype: config.archetype.clone(),
            corpus_fingerprint: corpus_fingerprint(&blobs),
        },
        config.pipeline.clone(),
    );
    let files = write_report(&bundle, &config.output_dir, &config.report_formats)
        .map_err(|e| format!("Failed to write report: {e}"))?;
    for path in &files {
        println!("  wrote {}", path.display());
    }
    Ok(())
}

fn analyze_with<S>(blobs: &[String], config: &RunConfig, store: &mut S) -> Result<AnalysisRun, String>
where
    S: CardStore,
{
    analyze(blobs, &config.format, store, &config.pipeline).map_err(|e| format!("Analysis failed: {e}"))
}

/// Loads the config file (or defaults) and applies command-line overrides.
fn resolve_run_config(args: &AnalyzeArgs) -> Result<RunConfig, String> {
    let mut config = match &args.config {
        Some(path) => RunConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => RunConfig::default(),
    };

    if let Some(format) = &args.format {
        config.format = format.clone();
    }
    if let Some(archetype) = &args.archetype {
        config.archetype = archetype.clone();
    }
    if let Some(dir) = &args.corpus_dir {
        config.corpus_dir = dir.clone();
    }
    if let Some(path) = &args.card_db {
        config.card_db = path.clone();
    }
    if let Some(path) = &args.cards_csv {
        config.authoritative_cards = Some(path.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if !args.report_formats.is_empty() {
        config.report_formats = args.report_formats.iter().copied().map(ReportFormat::from).collect();
    }

    let pipeline = &mut config.pipeline;
    if let Some(mode) = args.target_mode {
        pipeline.target_mode = match mode {
            CliTargetMode::Derived => deckstats_core::TargetMode::Derived,
            CliTargetMode::Fixed => deckstats_core::TargetMode::Fixed,
        };
    }
    if let Some(adjustment) = args.adjustment {
        pipeline.adjustment = match adjustment {
            CliAdjustment::ModeSubstitution => deckstats_core::Adjustment::ModeSubstitution,
            CliAdjustment::UnitStep => deckstats_core::Adjustment::UnitStep,
        };
    }
    if args.no_color_partitioning {
        pipeline.uses_color_partitioning = false;
    }
    if args.no_subtypes {
        pipeline.uses_subtype_grouping = false;
    }
    if let Some(max) = args.max_iterations {
        pipeline.max_iterations = max;
    }
    if args.reject_malformed {
        pipeline.malformed_lines = MalformedLinePolicy::Reject;
    }
    if args.jobs.is_some() {
        pipeline.jobs = args.jobs;
    }

    Ok(config)
}

fn print_run_summary(run: &AnalysisRun) {
    println!(
        "Analyzed {} decklists ({}): {} partitions, {} failed",
        run.decklists,
        run.format,
        run.partitions.len(),
        run.errors.len()
    );
    for partition in &run.partitions {
        let colors = if partition.deck_colors.is_empty() {
            "colorless"
        } else {
            partition.deck_colors.as_str()
        };
        println!(
            "  {colors}: {} decks, main {} / sideboard {}",
            partition.n_decks,
            partition.final_deck.main_total(),
            partition.final_deck.sideboard_total()
        );
    }
    if !run.unknown_cards.is_empty() {
        println!("  {} cards without metadata", run.unknown_cards.len());
    }
    if !run.malformed.is_empty() {
        println!("  {} malformed lines skipped", run.malformed.len());
    }
    if !run.is_complete() {
        eprintln!("\nFailures:");
        for failure in &run.errors {
            eprintln!("  {}: {}", failure.deck_colors, failure.error);
        }
    }
}

// ---------------------------------------------------------------------------
// import-cards command
// ---------------------------------------------------------------------------

fn run_import_cards(args: ImportCardsArgs) -> Result<(), String> {
    let report = match &args.sqlite {
        Some(db) => {
            let rows = read_authoritative_csv(&args.csv)
                .map_err(|e| format!("Failed to read '{}': {e}", args.csv.display()))?;
            let mut migration = open_migration(db, &args.prefix)?;
            migration
                .up()
                .map_err(|e| format!("Migration up failed: {e}"))?;
            migration
                .import(rows)
                .map_err(|e| format!("Card import failed: {e}"))?
        }
        None => {
            let mut store = JsonCardStore::open(&args.card_db)
                .map_err(|e| format!("Failed to open card database '{}': {e}", args.card_db.display()))?;
            store
                .import_csv(&args.csv)
                .map_err(|e| format!("Card import failed: {e}"))?
        }
    };

    println!("Import complete:");
    println!("  Inserted: {}", report.inserted);
    println!("  Upgraded: {}", report.upgraded);
    println!("  Unchanged: {}", report.unchanged);
    Ok(())
}

// ---------------------------------------------------------------------------
// parse command
// ---------------------------------------------------------------------------

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let blobs = if args.inputs.is_empty() {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|err| format!("Failed to read stdin: {err}"))?;
        vec![text]
    } else {
        args.inputs
            .iter()
            .map(|path| fs::read_to_string(path).map_err(|err| format!("Failed to read '{}': {err}", path.display())))
            .collect::<Result<Vec<_>, _>>()?
    };

    let policy = if args.reject_malformed {
        MalformedLinePolicy::Reject
    } else {
        MalformedLinePolicy::Skip
    };
    let parsed = DecklistParser::new(policy)
        .parse_corpus(&blobs)
        .map_err(|e| format!("Parse failed: {e}"))?;

    let output = match args.output {
        CliOutputFormat::Json => {
            serde_json::to_string_pretty(&parsed).map_err(|e| format!("Failed to serialize output: {e}"))?
        }
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(&parsed).map_err(|e| format!("Failed to serialize output: {e}"))?
        }
    };
    println!("{output}");
    Ok(())
}

// ---------------------------------------------------------------------------
// sync-sqlite command
// ---------------------------------------------------------------------------

fn run_sync_sqlite(args: SyncSqliteArgs) -> Result<(), String> {
    let mut migration = open_migration(&args.db, &args.prefix)?;

    let report = if args.refresh {
        migration
            .refresh(&args.card_db)
            .map_err(|e| format!("Refresh failed: {e}"))?
    } else {
        migration
            .up()
            .map_err(|e| format!("Migration up failed: {e}"))?;
        migration
            .seed(&args.card_db)
            .map_err(|e| format!("Seed failed: {e}"))?
    };
    println!("Sync complete:");
    println!("  Inserted: {}", report.inserted);
    println!("  Upgraded: {}", report.upgraded);
    println!("  Unchanged: {}", report.unchanged);

    if args.export {
        let rows = migration
            .store()
            .and_then(|store| store.rows())
            .map_err(|e| format!("Failed to read SQLite cards: {e}"))?;
        let mut json = JsonCardStore::open(&args.card_db)
            .map_err(|e| format!("Failed to open card database '{}': {e}", args.card_db.display()))?;
        let exported = json
            .bulk_import(rows)
            .and_then(|report| json.persist().map(|()| report))
            .map_err(|e| format!("Export failed: {e}"))?;
        println!(
            "Exported to '{}': {} inserted, {} upgraded",
            args.card_db.display(),
            exported.inserted,
            exported.upgraded
        );
    }

    let status = migration
        .status()
        .map_err(|e| format!("Failed to get migration status: {e}"))?;
    println!("Table status:");
    println!("  Cards: {}", status.card_count);
    println!("  Formats: {}", status.format_count);
    println!("  Unknown: {}", status.unknown_count);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_migration(db: &Path, prefix: &str) -> Result<Migration, String> {
    let conn = rusqlite::Connection::open(db)
        .map_err(|e| format!("Failed to open database '{}': {e}", db.display()))?;
    Migration::new(conn, prefix).map_err(|e| format!("Failed to initialize migration: {e}"))
}
