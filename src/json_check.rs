/*!
 * Syntax and structure checks for document files.
 *
 * Each file is loaded the same way a batch loads it, and the first problem
 * is reported with its line and column so broken files can be fixed before
 * a run skips them.
 */

use std::fmt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::document::Document;
use crate::errors::DocumentError;
use crate::file_utils::FileManager;

/// Category of a file problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemKind {
    /// Not valid JSON
    Syntax,
    /// Valid JSON without the document shape
    Schema,
    /// The file could not be read
    Io,
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProblemKind::Syntax => "syntax",
            ProblemKind::Schema => "schema",
            ProblemKind::Io => "io",
        };
        f.write_str(name)
    }
}

/// First problem found in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileProblem {
    pub kind: ProblemKind,
    /// 1-based, 0 when the problem has no position
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl From<DocumentError> for FileProblem {
    fn from(error: DocumentError) -> Self {
        match error {
            DocumentError::Parse { line, column, message, .. } => Self {
                kind: ProblemKind::Syntax,
                line,
                column,
                message,
            },
            DocumentError::Schema { message, .. } => Self {
                kind: ProblemKind::Schema,
                line: 0,
                column: 0,
                message,
            },
            DocumentError::Io { source, .. } => Self {
                kind: ProblemKind::Io,
                line: 0,
                column: 0,
                message: source.to_string(),
            },
        }
    }
}

/// Check result of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCheck {
    pub path: PathBuf,
    pub problem: Option<FileProblem>,
}

impl FileCheck {
    pub fn is_valid(&self) -> bool {
        self.problem.is_none()
    }
}

impl fmt::Display for FileCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            None => write!(f, "{}: OK", self.path.display()),
            Some(problem) if problem.line > 0 => write!(
                f,
                "{}:{}:{}: {}: {}",
                self.path.display(),
                problem.line,
                problem.column,
                problem.kind,
                problem.message
            ),
            Some(problem) => write!(f, "{}: {}: {}", self.path.display(), problem.kind, problem.message),
        }
    }
}

/// Check a single document file
pub fn check_file(path: &Path, max_depth: usize) -> FileCheck {
    FileCheck {
        path: path.to_path_buf(),
        problem: Document::load(path, max_depth).err().map(FileProblem::from),
    }
}

/// Check every file with the given extension under `dir`, in path order
pub fn check_directory(dir: &Path, extension: &str, max_depth: usize) -> Result<Vec<FileCheck>> {
    Ok(FileManager::find_files(dir, extension)?
        .iter()
        .map(|path| check_file(path, max_depth))
        .collect())
}

/// One line per file followed by a totals line
pub fn render_text(checks: &[FileCheck]) -> String {
    let mut out = String::new();
    for check in checks {
        let _ = writeln!(out, "{}", check);
    }
    let invalid = checks.iter().filter(|check| !check.is_valid()).count();
    let _ = writeln!(out, "{} file(s) checked, {} invalid", checks.len(), invalid);
    out
}
