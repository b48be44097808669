use anyhow::{Result, Context, anyhow};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::change_detector::{self, ChangeReport};
use crate::document::Document;
use crate::errors::DocumentError;
use crate::file_utils::FileManager;
use crate::interchange::{self, InjectReport};
use crate::merge::{Clock, MergeEngine, MergeOutcome, MergeSummary, SystemClock};
use crate::progress::{DocumentProgress, ProgressReport};
use crate::json_check::{self, FileCheck};
use crate::reuse::{self, ReuseCache, ReuseReport};
use crate::validation::{Glossary, QualityReport, QualityValidator};

// @module: Application controller for directory and single-document commands

/// Outcome of one document in a batch
#[derive(Debug)]
pub enum DocumentOutcome {
    /// Merged and written, with what the merge did
    Merged(MergeSummary),
    /// Document could not be parsed or has an invalid shape
    Skipped(String),
    /// Any other failure
    Failed(String),
}

/// Summary of a directory run
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Documents merged successfully
    pub processed: usize,
    /// Documents skipped because of parse or schema errors
    pub skipped: usize,
    /// Documents that failed for other reasons
    pub errored: usize,
    /// Per-document outcomes, sorted by document identifier
    pub outcomes: Vec<(String, DocumentOutcome)>,
    /// Shared content and what the run reused
    pub reuse: ReuseReport,
}

impl BatchSummary {
    fn record(&mut self, document: String, outcome: DocumentOutcome) {
        match &outcome {
            DocumentOutcome::Merged(_) => self.processed += 1,
            DocumentOutcome::Skipped(_) => self.skipped += 1,
            DocumentOutcome::Failed(_) => self.errored += 1,
        }
        self.outcomes.push((document, outcome));
    }

    pub fn describe(&self) -> String {
        format!(
            "{} processed, {} skipped, {} errors",
            self.processed, self.skipped, self.errored
        )
    }
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn max_depth(&self) -> usize {
        self.config.segmenter.max_depth
    }

    fn source_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(anyhow!("Directory does not exist: {:?}", dir));
        }
        FileManager::find_files(dir, &self.config.batch.file_extension)
    }

    /// Compare every source document with its snapshot.
    ///
    /// Without a snapshot directory the hashes recorded in the target
    /// directory are used; without either, every entry counts as added.
    /// Unreadable documents are skipped with a warning.
    pub fn detect_changes(
        &self,
        source_dir: &Path,
        snapshot_dir: Option<&Path>,
        target_dir: Option<&Path>,
    ) -> Result<Vec<ChangeReport>> {
        let mut reports = Vec::new();

        for file in self.source_files(source_dir)? {
            let source = match Document::load(&file, self.max_depth()) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("Skipping {}: {}", file.display(), e);
                    continue;
                }
            };

            let report = match (snapshot_dir, target_dir) {
                (Some(snapshot_dir), _) => {
                    let snapshot_path = FileManager::counterpart(&file, source_dir, snapshot_dir);
                    let snapshot = FileManager::load_or_empty(&snapshot_path, self.max_depth())?;
                    change_detector::compare(&snapshot, &source)
                }
                (None, Some(target_dir)) => {
                    let target_path = FileManager::counterpart(&file, source_dir, target_dir);
                    let target = FileManager::load_or_empty(&target_path, self.max_depth())?;
                    change_detector::compare_with_target(&source, &target)
                }
                (None, None) => change_detector::compare(&Document::empty_like(&source), &source),
            };

            info!("{}", report.summary());
            reports.push(report);
        }

        reports.sort_by(|a, b| a.document.cmp(&b.document));
        Ok(reports)
    }

    /// Create an empty target document for every source without one.
    ///
    /// Existing target files are never touched. Returns the created paths.
    pub fn sync_placeholders(&self, source_dir: &Path, target_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();

        for file in self.source_files(source_dir)? {
            let target_path = FileManager::counterpart(&file, source_dir, target_dir);
            if target_path.exists() {
                continue;
            }

            let source = match Document::load(&file, self.max_depth()) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("Skipping {}: {}", file.display(), e);
                    continue;
                }
            };

            Document::empty_like(&source)
                .save(&target_path)
                .with_context(|| format!("Failed to create placeholder {:?}", target_path))?;
            debug!("Created placeholder {}", target_path.display());
            created.push(target_path);
        }

        info!("Created {} placeholder file(s)", created.len());
        Ok(created)
    }

    /// Merge every source document into its target, in parallel.
    ///
    /// Translated entries of all existing targets are loaded into a run-scoped
    /// reuse cache first, in file order, so new entries can be pre-filled.
    /// The summary carries a reuse report of shared entries and reused keys.
    pub async fn update_directory(
        &self,
        source_dir: &Path,
        target_dir: &Path,
        snapshot_dir: Option<&Path>,
    ) -> Result<BatchSummary> {
        let start_time = std::time::Instant::now();
        let files = self.source_files(source_dir)?;
        FileManager::ensure_dir(target_dir)?;

        let (sources, targets) = self.load_pairs(&files, source_dir, target_dir);
        let mut reuse_report = ReuseReport::new(reuse::detect_shared_content(&sources, &targets));

        let cache = ReuseCache::new(self.config.merge.reuse_translations);
        if cache.is_enabled() {
            for target in &targets {
                cache.populate_from(target);
            }
            debug!("Reuse cache holds {} translation(s)", cache.len());
        }

        let progress_bar = ProgressBar::new(files.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style);

        let max_depth = self.max_depth();
        let create_missing = self.config.merge.create_missing_targets;

        let results = stream::iter(files.into_iter())
            .map(|file| {
                let cache = cache.clone();
                let progress_bar = progress_bar.clone();
                let target_path = FileManager::counterpart(&file, source_dir, target_dir);
                let snapshot_path =
                    snapshot_dir.map(|dir| FileManager::counterpart(&file, source_dir, dir));

                async move {
                    let id = crate::document::document_id(&file);
                    let job = tokio::task::spawn_blocking(move || {
                        update_document(
                            &file,
                            &target_path,
                            snapshot_path.as_deref(),
                            &cache,
                            max_depth,
                            create_missing,
                        )
                    });

                    let outcome = match job.await {
                        Ok(outcome) => outcome,
                        Err(e) => DocumentOutcome::Failed(format!("worker panicked: {}", e)),
                    };
                    progress_bar.inc(1);
                    (id, outcome)
                }
            })
            .buffer_unordered(self.config.batch.concurrent_documents)
            .collect::<Vec<_>>()
            .await;

        progress_bar.finish_and_clear();

        // Sort results by document to keep the output deterministic
        let mut sorted_results = results;
        sorted_results.sort_by(|a, b| a.0.cmp(&b.0));

        let mut summary = BatchSummary::default();
        for (id, outcome) in sorted_results {
            match &outcome {
                DocumentOutcome::Merged(merge) => {
                    debug!("{}: {}", id, merge.describe());
                    reuse_report
                        .reused
                        .extend(merge.reused.iter().map(|key| (id.clone(), key.clone())));
                }
                DocumentOutcome::Skipped(reason) => warn!("Skipped {}: {}", id, reason),
                DocumentOutcome::Failed(reason) => error!("Failed {}: {}", id, reason),
            }
            summary.record(id, outcome);
        }

        let (hits, misses, _) = cache.stats();
        reuse_report.cache_hits = hits;
        reuse_report.cache_misses = misses;
        cache.reset();
        info!("Reuse: {}", reuse_report.describe());
        summary.reuse = reuse_report;

        info!(
            "Update completed in {:.1}s: {}",
            start_time.elapsed().as_secs_f64(),
            summary.describe()
        );
        Ok(summary)
    }

    /// Source and target documents that load, in file order
    fn load_pairs(&self, files: &[PathBuf], source_dir: &Path, target_dir: &Path) -> (Vec<Document>, Vec<Document>) {
        let mut sources = Vec::new();
        let mut targets = Vec::new();
        for file in files {
            if let Ok(source) = Document::load(file, self.max_depth()) {
                sources.push(source);
            }
            let target_path = FileManager::counterpart(file, source_dir, target_dir);
            if let Ok(target) = Document::load(&target_path, self.max_depth()) {
                targets.push(target);
            }
        }
        (sources, targets)
    }

    /// Entries shared across source documents and whether they are translated
    pub fn reuse_report(&self, source_dir: &Path, target_dir: &Path) -> Result<ReuseReport> {
        let files = self.source_files(source_dir)?;
        let (sources, targets) = self.load_pairs(&files, source_dir, target_dir);
        let report = ReuseReport::new(reuse::detect_shared_content(&sources, &targets));
        info!("Reuse: {}", report.describe());
        Ok(report)
    }

    /// Check that document files parse, for a single file or a directory
    pub fn validate_files(&self, path: &Path) -> Result<Vec<FileCheck>> {
        let checks = if path.is_dir() {
            json_check::check_directory(path, &self.config.batch.file_extension, self.max_depth())?
        } else {
            vec![json_check::check_file(path, self.max_depth())]
        };

        for check in checks.iter().filter(|check| !check.is_valid()) {
            warn!("{}", check);
        }
        Ok(checks)
    }

    /// Validate target documents against their sources.
    ///
    /// Accepts two files or two directories. Directories are checked in
    /// file order so glossary findings are reproducible.
    pub fn check(&self, source: &Path, target: &Path, glossary: Option<&Path>) -> Result<Vec<QualityReport>> {
        let mut validator = QualityValidator::new(self.config.validation.clone());
        if let Some(path) = glossary {
            validator = validator.with_glossary(Glossary::load(path)?);
        }

        let pairs: Vec<(PathBuf, PathBuf)> = if source.is_dir() {
            self.source_files(source)?
                .into_iter()
                .map(|file| {
                    let target_path = FileManager::counterpart(&file, source, target);
                    (file, target_path)
                })
                .filter(|(_, target_path)| target_path.exists())
                .collect()
        } else {
            vec![(source.to_path_buf(), target.to_path_buf())]
        };

        let mut reports = Vec::new();
        for (source_path, target_path) in pairs {
            let loaded = Document::load(&source_path, self.max_depth())
                .and_then(|s| Ok((s, Document::load(&target_path, self.max_depth())?)));
            match loaded {
                Ok((source_doc, target_doc)) => reports.push(validator.validate(&source_doc, &target_doc)),
                Err(e) if e.is_recoverable() && source.is_dir() => {
                    warn!("Skipping {}: {}", source_path.display(), e);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(reports)
    }

    /// Progress of every target document against its source
    pub fn progress(&self, source_dir: &Path, target_dir: &Path) -> Result<ProgressReport> {
        let mut documents = Vec::new();

        for file in self.source_files(source_dir)? {
            let target_path = FileManager::counterpart(&file, source_dir, target_dir);
            match (
                Document::load(&file, self.max_depth()),
                FileManager::load_or_empty(&target_path, self.max_depth()),
            ) {
                (Ok(source), Ok(target)) => documents.push(DocumentProgress::compute(&source, &target)),
                (Err(e), _) => warn!("Skipping {}: {}", file.display(), e),
                (_, Err(e)) => warn!("Skipping {}: {}", target_path.display(), e),
            }
        }

        Ok(ProgressReport::new(documents))
    }

    /// Merge one source revision into one target file
    pub fn merge_file(
        &self,
        new_source: &Path,
        old_target: &Path,
        snapshot: Option<&Path>,
        clock: &dyn Clock,
    ) -> Result<MergeOutcome> {
        let source = Document::load(new_source, self.max_depth())?;
        let target = FileManager::load_or_empty(old_target, self.max_depth())?;
        let previous = snapshot
            .map(|path| FileManager::load_or_empty(path, self.max_depth()))
            .transpose()?;

        let report = match &previous {
            Some(previous) => change_detector::compare(previous, &source),
            None => change_detector::compare_with_target(&source, &target),
        };

        let mut engine = MergeEngine::new(clock);
        if let Some(previous) = &previous {
            engine = engine.with_previous_source(previous);
        }
        Ok(engine.merge(&source, &target, &report))
    }

    /// Extract interchange rows of one document
    pub fn extract_file(&self, source: &Path, target: Option<&Path>) -> Result<Vec<interchange::InterchangeRow>> {
        let source_doc = Document::load(source, self.max_depth())?;
        let target_doc = target
            .map(|path| FileManager::load_or_empty(path, self.max_depth()))
            .transpose()?;
        Ok(interchange::extract_rows(&source_doc, target_doc.as_ref()))
    }

    /// Inject translated rows into the target of one document
    pub fn inject_file(
        &self,
        source: &Path,
        rows_path: &Path,
        target: Option<&Path>,
        clock: &dyn Clock,
    ) -> Result<(Document, InjectReport)> {
        let source_doc = Document::load(source, self.max_depth())?;
        let target_doc = match target {
            Some(path) if path.exists() => Document::load(path, self.max_depth())?,
            _ => Document::empty_like(&source_doc),
        };
        let rows = interchange::read_rows_from_path(rows_path)
            .with_context(|| format!("Failed to read rows from {:?}", rows_path))?;

        let (document, report) = interchange::inject_rows(&source_doc, &target_doc, &rows, clock.now());
        for warning in &report.warnings {
            warn!("{}/{}: {}", warning.entry_key, warning.field_name, warning.message);
        }
        Ok((document, report))
    }
}

/// Merge one document of a directory batch
fn update_document(
    source_path: &Path,
    target_path: &Path,
    snapshot_path: Option<&Path>,
    cache: &ReuseCache,
    max_depth: usize,
    create_missing: bool,
) -> DocumentOutcome {
    let failure = |e: DocumentError| {
        if e.is_recoverable() {
            DocumentOutcome::Skipped(e.to_string())
        } else {
            DocumentOutcome::Failed(e.to_string())
        }
    };

    let source = match Document::load(source_path, max_depth) {
        Ok(doc) => doc,
        Err(e) => return failure(e),
    };

    let target_exists = target_path.exists();
    if !target_exists && !create_missing {
        return DocumentOutcome::Skipped("no target document".to_string());
    }
    let target = if target_exists {
        match Document::load(target_path, max_depth) {
            Ok(doc) => doc,
            Err(e) => return failure(e),
        }
    } else {
        Document::empty_like(&source)
    };

    let previous = match snapshot_path {
        Some(path) if path.exists() => match Document::load(path, max_depth) {
            Ok(doc) => Some(doc),
            Err(e) => return failure(e),
        },
        Some(_) => Some(Document::empty_like(&source)),
        None => None,
    };

    let report = match &previous {
        Some(previous) => change_detector::compare(previous, &source),
        None => change_detector::compare_with_target(&source, &target),
    };

    let clock = SystemClock;
    let mut engine = MergeEngine::new(&clock).with_repository(cache);
    if let Some(previous) = &previous {
        engine = engine.with_previous_source(previous);
    }
    let outcome = engine.merge(&source, &target, &report);

    if outcome.summary.has_changes() || !target_exists {
        if let Err(e) = outcome.document.save(target_path) {
            return DocumentOutcome::Failed(e.to_string());
        }
        info!("Updated {}", target_path.display());
    }

    DocumentOutcome::Merged(outcome.summary)
}
