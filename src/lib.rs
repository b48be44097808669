/*!
 * # compendia - incremental translation of structured content packs
 *
 * A Rust library that keeps translated documents in step with their
 * evolving source documents.
 *
 * ## Features
 *
 * - Typed content model for keyed documents with embedded sub-entries
 * - Lossless markup segmentation: tags, entities and host links are protected
 * - Content-hash change detection between source revisions
 * - Incremental merge that preserves existing translations
 * - CSV interchange for translators, with segment alignment checks
 * - Quality validation: placeholders, tag balance, links and glossary terms
 * - Concurrent directory batches with a run-scoped reuse cache and reuse report
 * - File syntax checks with line and column positions
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `document`: Content model, JSON loading and content hashing
 * - `segmenter`: Markup lexer and the skeleton used for extraction and reinjection
 * - `change_detector`: Entry-level change classification and changelogs
 * - `merge`: Incremental merge engine
 * - `reuse`: Translation repository trait and the run-scoped reuse cache
 * - `interchange`: CSV rows exchanged with translators
 * - `json_check`: Syntax and structure checks for document files
 * - `validation`: Quality checks and reports
 * - `progress`: Translation progress dashboard
 * - `app_config`: Configuration management
 * - `app_controller`: Directory and single-document commands
 * - `file_utils`: File system operations
 * - `errors`: Custom error types for the application
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod change_detector;
pub mod document;
pub mod errors;
pub mod file_utils;
pub mod interchange;
pub mod json_check;
pub mod merge;
pub mod progress;
pub mod reuse;
pub mod segmenter;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BatchSummary, Controller, DocumentOutcome};
pub use change_detector::{ChangeKind, ChangeReport};
pub use document::{Document, Entry, EntryKey, EntryStatus, FieldValue};
pub use errors::{DocumentError, GlossaryError, InterchangeError};
pub use merge::{MergeEngine, MergeOutcome, MergeSummary};
pub use reuse::{ReuseCache, ReuseReport, TranslationRepository};
pub use segmenter::Skeleton;
pub use validation::{Glossary, QualityIssue, QualityReport, QualityValidator};
