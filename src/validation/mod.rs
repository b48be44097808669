/*!
 * Quality validation of translated documents.
 *
 * Checks are structural and never modify a document:
 * - `placeholders`: `{0}` and `{{name}}` tokens survive translation
 * - `tags`: tag balance of the translated markup
 * - `links`: host links are carried over exactly
 * - `glossary`: canonical term renderings, tracked across a run
 *
 * `service` orchestrates the checks and `report` aggregates and renders them.
 */

pub mod glossary;
pub mod issues;
pub mod links;
pub mod placeholders;
pub mod report;
pub mod service;
pub mod tags;

// Re-export main types
pub use glossary::{Glossary, GlossaryTracker};
pub use issues::{IssueKind, QualityIssue, Severity};
pub use report::{QualityReport, ReportFormat};
pub use service::{QualityValidator, ValidationConfig, validate};
