// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use namekeep::app_config::{LogLevel, ProposerProvider};
use namekeep::file_utils::FileManager;
use namekeep::glossary::ConflictReport;
use namekeep::providers::Provider;
use namekeep::providers::mock::MockProvider;
use namekeep::providers::ollama::Ollama;
use namekeep::{
    Actor, Candidate, Chapter, ChapterPipeline, Config, CorpusScanner, GlossaryStore, LlmNameProposer,
    NameProposer, ResolveOptions, Role, SurnameExtractor, get_language_name,
};

const CONFIG_FILENAME: &str = "namekeep.json";

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List glossary entries
    #[command(alias = "ls")]
    List {
        /// Only show pinned entries
        #[arg(long)]
        pinned: bool,

        /// Print the glossary block used in translation prompts instead
        #[arg(long)]
        prompt: bool,
    },

    /// Pin the translation of a name, overriding any automatic choice
    Pin {
        /// Source-language name
        source: String,

        /// Target-language translation
        target: String,

        /// Who made the change, recorded in the proposal log
        #[arg(long)]
        actor: Option<String>,
    },

    /// Set the role of a name
    Role {
        term: String,

        /// protagonist, antagonist, major, supporting, minor, place, organization
        role: String,
    },

    /// Add an alternative spelling of a name
    Alias { term: String, alias: String },

    /// Delete a name from the glossary
    Remove { term: String },

    /// Show names with disagreeing translation proposals
    Conflicts,

    /// Seed the glossary from crawled chapters
    Seed {
        /// Chapter directory (defaults to the configured one)
        #[arg(long)]
        chapters: Option<PathBuf>,

        /// Only scan the first N chapters
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Resolve the names of each chapter, as the translator would
    Process {
        /// Chapter directory (defaults to the configured one)
        #[arg(long)]
        chapters: Option<PathBuf>,

        /// Only process the first N chapters
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
#[command(name = "namekeep")]
#[command(version = "0.1.0")]
#[command(about = "Character-name glossary for chapter-by-chapter novel translation")]
#[command(long_about = "namekeep keeps character names consistent while a Chinese novel is translated \
to Vietnamese chapter by chapter. The first translation chosen for a name is kept for every later \
chapter until an operator pins a different one.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to ./namekeep.json, else the user data directory)
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Glossary file (overrides the configured path)
    #[arg(short, long)]
    glossary: Option<PathBuf>,

    /// Log level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color,
                now,
                emoji,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "namekeep", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = resolve_config_path(cli.config_path)?;
    let mut config = Config::load_or_create(&config_path)?;
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if let Some(glossary) = cli.glossary {
        config.glossary_path = glossary;
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.to_level_filter());

    let store = Arc::new(
        GlossaryStore::open_file(&config.glossary_path)
            .with_context(|| format!("Failed to open glossary {:?}", config.glossary_path))?,
    );
    info!("Loaded {} glossary entries from {}", store.len(), store.location());

    match cli.command {
        Commands::List { pinned, prompt } => list(&store, &config, pinned, prompt),
        Commands::Pin { source, target, actor } => {
            let actor = actor.map(Actor::Named).unwrap_or_default();
            let entry = store.override_term(&source, &target, actor).await?;
            println!("{} → {} (pinned)", entry.source_term, entry.target_term);
            Ok(())
        }
        Commands::Role { term, role } => {
            let role: Role = role.parse()?;
            let entry = store.set_role(&term, role).await?;
            println!("{}: {}", entry.source_term, entry.role);
            Ok(())
        }
        Commands::Alias { term, alias } => {
            let entry = store.add_alias(&term, &alias).await?;
            println!("{} ← {}", entry.source_term, entry.aliases.join(", "));
            Ok(())
        }
        Commands::Remove { term } => {
            let entry = store.remove(&term).await?;
            println!("Removed {} → {}", entry.source_term, entry.target_term);
            Ok(())
        }
        Commands::Conflicts => {
            conflicts(&store);
            Ok(())
        }
        Commands::Seed { chapters, limit } => {
            let dir = chapters.unwrap_or_else(|| config.chapters_dir.clone());
            seed(&store, &config, dir, limit).await
        }
        Commands::Process { chapters, limit } => {
            let dir = chapters.unwrap_or_else(|| config.chapters_dir.clone());
            process(Arc::clone(&store), &config, dir, limit).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}

/// Explicit path, else ./namekeep.json if present, else the per-user data directory
fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let local = PathBuf::from(CONFIG_FILENAME);
    if FileManager::file_exists(&local) {
        return Ok(local);
    }
    Ok(FileManager::default_data_dir()?.join(CONFIG_FILENAME))
}

fn list(store: &GlossaryStore, config: &Config, pinned_only: bool, prompt: bool) -> Result<()> {
    let snapshot = store.snapshot();

    if prompt {
        let source = get_language_name(&config.source_language)?;
        let target = get_language_name(&config.target_language)?;
        print!(
            "{}",
            namekeep::prompts::render_name_glossary(&snapshot.name_mapping(), &source, &target)
        );
        return Ok(());
    }

    let mut entries: Vec<_> = snapshot.entries().filter(|e| !pinned_only || e.pinned).collect();
    entries.sort_by_key(|e| (e.first_seen_unit.unwrap_or(u64::MAX), e.source_term.clone()));

    for entry in entries {
        let first_seen = entry
            .first_seen_unit
            .map(|unit| format!("chapter {}", unit))
            .unwrap_or_else(|| "unseen".to_string());
        let confidence = snapshot.confidence(&entry.source_term).unwrap_or(1.0);
        println!(
            "{} → {}  [{}, {}{}, confidence {:.2}]",
            entry.source_term,
            entry.target_term,
            entry.role,
            first_seen,
            if entry.pinned { ", pinned" } else { "" },
            confidence
        );
    }
    Ok(())
}

fn conflicts(store: &GlossaryStore) {
    let scan = store.detect_conflicts();
    let mut count = 0;
    for report in &scan {
        count += 1;
        print_conflict(&report);
    }
    if count == 0 {
        info!("No conflicting proposals");
    } else {
        warn!("{} names have conflicting proposals", count);
    }
}

fn print_conflict(report: &ConflictReport) {
    let current = report.current_target.as_deref().unwrap_or("(removed)");
    println!(
        "{}: current {}{}",
        report.source_term,
        current,
        if report.pinned { " (pinned)" } else { "" }
    );
    for proposal in &report.proposals {
        let unit = proposal
            .unit_index
            .map(|u| format!("chapter {}", u))
            .unwrap_or_else(|| "manual".to_string());
        println!(
            "    {} ({:?}, {}, {})",
            proposal.target_term,
            proposal.origin,
            unit,
            proposal.recorded_at.format("%Y-%m-%d %H:%M")
        );
    }
}

/// Build the configured name proposer
async fn build_proposer(config: &Config) -> Result<Arc<dyn NameProposer>> {
    let source = get_language_name(&config.source_language)?;
    let target = get_language_name(&config.target_language)?;

    match config.proposer.provider {
        ProposerProvider::Ollama => {
            let ollama = Ollama::new(
                config.proposer.endpoint.clone(),
                config.proposer.model.clone(),
                config.proposer.temperature,
                config.proposer.timeout(),
            );
            ollama
                .test_connection()
                .await
                .map_err(|e| anyhow!("Cannot reach Ollama at {}: {}", ollama.base_url(), e))?;
            info!("Proposing names with {} model {}", config.proposer.provider.display_name(), ollama.model());
            Ok(Arc::new(LlmNameProposer::new(ollama, &source, &target)))
        }
        ProposerProvider::Mock => {
            warn!("Using the mock proposer; names will be placeholders");
            Ok(Arc::new(LlmNameProposer::new(MockProvider::working(), &source, &target)))
        }
    }
}

fn progress_bar(len: u64, unit: &str) -> ProgressBar {
    let progress_bar = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
            unit
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));
    progress_bar
}

async fn seed(store: &GlossaryStore, config: &Config, dir: PathBuf, limit: Option<usize>) -> Result<()> {
    let chapters = Chapter::load_dir(&dir, limit)?;
    info!("Scanning {} chapters in {:?}", chapters.len(), dir);

    let scanner = CorpusScanner::new(SurnameExtractor::new(config.extraction.to_extraction_config()));
    let found = scanner.scan(&chapters);

    // Resolve each name at the chapter it first appears in
    let mut by_chapter: BTreeMap<u64, Vec<Candidate>> = BTreeMap::new();
    for name in &found {
        by_chapter.entry(name.first_chapter).or_default().push(Candidate::from(name));
    }

    let proposer = build_proposer(config).await?;
    let options = ResolveOptions::new().with_timeout(config.proposer.timeout());
    let progress = progress_bar(found.len() as u64, "names");

    let mut created = 0;
    let mut failed = 0;
    for (chapter, candidates) in by_chapter {
        let count = candidates.len() as u64;
        progress.set_message(format!("chapter {}", chapter));
        let unit = i64::try_from(chapter).context("Chapter number out of range")?;
        let outcome = store.resolve(unit, candidates, proposer.as_ref(), &options).await?;
        created += outcome.created_count();
        for (term, failure) in outcome.failures() {
            failed += 1;
            progress.suspend(|| error!("{}: {}", term, failure));
        }
        progress.inc(count);
    }
    progress.finish_with_message("done");

    info!(
        "Seeded glossary: {} names found, {} added, {} failed, {} total",
        found.len(),
        created,
        failed,
        store.len()
    );
    Ok(())
}

async fn process(store: Arc<GlossaryStore>, config: &Config, dir: PathBuf, limit: Option<usize>) -> Result<()> {
    let chapters = Chapter::load_dir(&dir, limit)?;
    let extractor = Arc::new(SurnameExtractor::new(config.extraction.to_extraction_config()));
    let proposer = build_proposer(config).await?;

    let pipeline = ChapterPipeline::new(store, extractor, proposer, config.pipeline.concurrent_chapters)
        .with_options(ResolveOptions::new().with_timeout(config.proposer.timeout()));

    let progress = progress_bar(chapters.len() as u64, "chapters");
    let glossaries = pipeline
        .process_all(&chapters, |done, _| progress.set_position(done as u64))
        .await?;
    progress.finish_and_clear();

    for glossary in &glossaries {
        let failures = glossary.failures();
        println!(
            "Chapter {}: {} names{}",
            glossary.chapter_number,
            glossary.outcome.len(),
            if failures.is_empty() {
                String::new()
            } else {
                format!(", {} unresolved", failures.len())
            }
        );
        for (term, failure) in failures {
            println!("    {}: {}", term, failure);
        }
    }
    Ok(())
}
