// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{error, warn, info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::{Path, PathBuf};
use std::io::Write;
use std::process::ExitCode;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use compendia::app_config::{self, Config};
use compendia::app_controller::Controller;
use compendia::change_detector;
use compendia::file_utils::FileManager;
use compendia::interchange;
use compendia::json_check;
use compendia::merge::SystemClock;
use compendia::validation::{report, ReportFormat};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for ReportFormat to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliReportFormat {
    Text,
    Json,
    Markdown,
}

impl From<CliReportFormat> for ReportFormat {
    fn from(format: CliReportFormat) -> Self {
        match format {
            CliReportFormat::Text => ReportFormat::Text,
            CliReportFormat::Json => ReportFormat::Json,
            CliReportFormat::Markdown => ReportFormat::Markdown,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report added, modified and deleted entries of every source document
    DetectChanges {
        /// Directory of source documents
        #[arg(value_name = "SOURCE_DIR")]
        source_dir: PathBuf,

        /// Directory holding the previous source revision
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Write the Markdown changelog to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Create empty target documents for sources without one
        #[arg(long, requires = "target")]
        sync_placeholders: bool,

        /// Directory of target documents
        #[arg(long)]
        target: Option<PathBuf>,
    },

    /// Export the translatable segments of a document as CSV rows
    Extract {
        /// Source document
        #[arg(value_name = "DOCUMENT")]
        document: PathBuf,

        /// Existing target; only untranslated or flagged entries are exported
        #[arg(long)]
        target: Option<PathBuf>,

        /// CSV file to write (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write translated CSV rows into a target document
    Inject {
        /// Source document the rows were extracted from
        #[arg(value_name = "SOURCE_DOC")]
        source: PathBuf,

        /// Translated CSV rows
        #[arg(value_name = "ROWS_CSV")]
        rows: PathBuf,

        /// Existing target document
        #[arg(long)]
        target: Option<PathBuf>,

        /// Output document (defaults to the target, then stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge a new source revision into an existing target document
    Merge {
        /// New source revision
        #[arg(value_name = "NEW_SOURCE")]
        new_source: PathBuf,

        /// Target document to update
        #[arg(value_name = "OLD_TARGET")]
        old_target: PathBuf,

        /// Previous source revision
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Output document (defaults to OLD_TARGET)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge every document of a source directory into a target directory
    Update {
        #[arg(value_name = "SOURCE_DIR")]
        source_dir: PathBuf,

        #[arg(value_name = "TARGET_DIR")]
        target_dir: PathBuf,

        /// Directory holding the previous source revision
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Write the Markdown reuse report of the run to this file
        #[arg(long)]
        reuse_report: Option<PathBuf>,
    },

    /// Report entries shared by several source documents
    ReuseReport {
        #[arg(value_name = "SOURCE_DIR")]
        source_dir: PathBuf,

        #[arg(value_name = "TARGET_DIR")]
        target_dir: PathBuf,

        /// Write the Markdown report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that document files are valid JSON with the document shape
    Validate {
        /// Document file or directory
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },

    /// Validate translated documents against their sources
    Check {
        /// Source document or directory
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Target document or directory
        #[arg(value_name = "TARGET")]
        target: PathBuf,

        /// Glossary JSON file
        #[arg(short, long)]
        glossary: Option<PathBuf>,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: CliReportFormat,

        /// Write the report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show translation progress of a target directory
    Progress {
        #[arg(value_name = "SOURCE_DIR")]
        source_dir: PathBuf,

        #[arg(value_name = "TARGET_DIR")]
        target_dir: PathBuf,
    },

    /// Generate shell completions for compendia
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// compendia - incremental translation of structured content packs
///
/// Keeps translated documents in step with their evolving sources.
#[derive(Parser, Debug)]
#[command(name = "compendia")]
#[command(version)]
#[command(about = "Incremental translation pipeline for structured content documents")]
#[command(long_about = "compendia detects source changes, merges them into translated documents,
exchanges translatable segments with translators as CSV and validates the result.

EXAMPLES:
    compendia detect-changes packs/ --snapshot previous/ -o CHANGELOG.md
    compendia extract packs/edges.json -o edges.csv
    compendia inject packs/edges.json edges.csv --target fr/edges.json
    compendia update packs/ fr/ --snapshot previous/ --reuse-report REUSE.md
    compendia validate packs/
    compendia check packs/ fr/ --glossary glossary.json --format markdown
    compendia progress packs/ fr/
    compendia completions bash > compendia.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
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
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // The max level is lowered or raised once the config is known
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: CommandLineOptions) -> Result<ExitCode> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "compendia", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&cli.config, cli.log_level.clone())?;
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::DetectChanges { source_dir, snapshot, output, sync_placeholders, target } => {
            let reports = controller.detect_changes(&source_dir, snapshot.as_deref(), target.as_deref())?;
            let changelog = change_detector::render_changelog(&reports, chrono::Utc::now());
            emit(output.as_deref(), &changelog)?;

            if sync_placeholders {
                let target_dir = target.ok_or_else(|| anyhow!("--sync-placeholders requires --target"))?;
                controller.sync_placeholders(&source_dir, &target_dir)?;
            }
        }
        Commands::Extract { document, target, output } => {
            let rows = controller.extract_file(&document, target.as_deref())?;
            info!("Extracted {} segment(s) from {}", rows.len(), document.display());
            match output {
                Some(path) => interchange::write_rows_to_path(&path, &rows)
                    .with_context(|| format!("Failed to write rows to {:?}", path))?,
                None => interchange::write_rows(std::io::stdout(), &rows)?,
            }
        }
        Commands::Inject { source, rows, target, output } => {
            let (document, report) = controller.inject_file(&source, &rows, target.as_deref(), &SystemClock)?;
            info!("{}: {}", document.id, report.describe());
            match output.or(target) {
                Some(path) => document.save(&path)?,
                None => println!("{}", document.to_json_string()?),
            }
        }
        Commands::Merge { new_source, old_target, snapshot, output } => {
            let outcome = controller.merge_file(&new_source, &old_target, snapshot.as_deref(), &SystemClock)?;
            info!("{}: {}", outcome.document.id, outcome.summary.describe());
            for conflict in &outcome.summary.conflicts {
                warn!("{}/{}: {:?}", conflict.key, conflict.field, conflict.kind);
            }
            let path = output.unwrap_or(old_target);
            outcome.document.save(&path)?;
        }
        Commands::Update { source_dir, target_dir, snapshot, reuse_report } => {
            let summary = controller.update_directory(&source_dir, &target_dir, snapshot.as_deref()).await?;
            println!("{}", summary.describe());
            if let Some(path) = reuse_report {
                emit(Some(&path), &summary.reuse.render_markdown(chrono::Utc::now()))?;
            }
            if summary.errored > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::ReuseReport { source_dir, target_dir, output } => {
            let report = controller.reuse_report(&source_dir, &target_dir)?;
            emit(output.as_deref(), &report.render_markdown(chrono::Utc::now()))?;
        }
        Commands::Validate { path } => {
            let checks = controller.validate_files(&path)?;
            print!("{}", json_check::render_text(&checks));
            if checks.iter().any(|check| !check.is_valid()) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Check { source, target, glossary, format, output } => {
            let reports = controller.check(&source, &target, glossary.as_deref())?;
            emit(output.as_deref(), &report::render(&reports, format.into()))?;

            let strict = controller.config().validation.treat_warnings_as_errors;
            if reports.iter().any(|r| r.is_failure(strict)) {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Progress { source_dir, target_dir } => {
            let report = controller.progress(&source_dir, &target_dir)?;
            print!("{}", report.render_markdown());
        }
        Commands::Completions { .. } => {}
    }

    Ok(ExitCode::SUCCESS)
}

/// Load conf.json, or create it with defaults, then apply CLI overrides
fn load_config(config_path: &str, log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        Config::from_file(config_path)?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        config.save(config_path)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(log_level) = log_level {
        config.log_level = log_level.into();
    }

    config.validate()
        .context("Configuration validation failed")?;
    Ok(config)
}

/// Write to a file, or stdout when no path is given
fn emit(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            FileManager::write_to_file(path, content)?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}
