/*!
 * Error types for the compendia pipeline.
 *
 * Document-scoped failures (parse and schema problems) are recoverable at the
 * batch level: the offending document is skipped and reported while the rest
 * of the batch keeps going. The controller and the binary wrap these in
 * `anyhow::Error` with context.
 */

use thiserror::Error;

/// Errors raised while loading or saving a single document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file is not valid JSON
    #[error("Failed to parse document '{document}' at line {line}, column {column}: {message}")]
    Parse {
        /// Document identifier or path
        document: String,
        /// 1-based line of the error, 0 when unknown
        line: usize,
        /// 1-based column of the error, 0 when unknown
        column: usize,
        /// Parser message without the position
        message: String,
    },

    /// The JSON is valid but does not have the expected shape
    #[error("Invalid document structure in '{document}': {message}")]
    Schema {
        /// Document identifier or path
        document: String,
        /// Description of the structural problem
        message: String,
    },

    /// Reading or writing the file failed
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path of the file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    /// Create a parse error from a serde_json failure, keeping its position
    pub fn parse(document: &str, error: &serde_json::Error) -> Self {
        let full = error.to_string();
        let suffix = format!(" at line {} column {}", error.line(), error.column());
        let message = full.strip_suffix(&suffix).unwrap_or(&full).to_string();
        Self::Parse {
            document: document.to_string(),
            line: error.line(),
            column: error.column(),
            message,
        }
    }

    /// Create a schema error for a document
    pub fn schema(document: &str, message: impl Into<String>) -> Self {
        Self::Schema {
            document: document.to_string(),
            message: message.into(),
        }
    }

    /// Whether this failure should skip the document rather than abort the run
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Schema { .. })
    }
}

/// Errors raised while reading or writing translator interchange files
#[derive(Error, Debug)]
pub enum InterchangeError {
    /// The CSV could not be read or written
    #[error("Interchange CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row references a column value that cannot be used
    #[error("Invalid interchange row {row}: {message}")]
    InvalidRow {
        /// 1-based data row number
        row: usize,
        /// What is wrong with it
        message: String,
    },
}

/// Errors raised while loading a glossary
#[derive(Error, Debug)]
pub enum GlossaryError {
    /// The glossary file could not be read
    #[error("Failed to read glossary '{path}': {source}")]
    Io {
        /// Path of the glossary file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The glossary is not a JSON object of strings
    #[error("Invalid glossary '{path}': {message}")]
    Format {
        /// Path of the glossary file
        path: String,
        /// Parser or shape message
        message: String,
    },
}
