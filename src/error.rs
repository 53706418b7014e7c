//! Custom error types and result handling for tankobon operations.
//!
//! This module defines the error handling system used throughout the crate.
//! All operations return a [`Result<T>`] which is a type alias for
//! `std::result::Result<T, Error>`.
//!
//! Reconciliation errors ([`Error::MissingChapter`],
//! [`Error::DuplicateChapter`]) aggregate every offending chapter number and
//! filename before reporting, so a single failed run is enough to diagnose a
//! source directory.

use std::path::PathBuf;

use crate::types::ChapterNumber;

/// Type alias for Results with tankobon errors.
pub type Result<T> = std::result::Result<T, Error>;

fn fmt_numbers(numbers: &[ChapterNumber]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn fmt_duplicates(duplicates: &[(u32, Vec<PathBuf>)]) -> String {
    duplicates
        .iter()
        .map(|(base, files)| {
            let names = files
                .iter()
                .map(|f| format!("{:?}", f))
                .collect::<Vec<_>>()
                .join(", ");
            format!("chapter {}: {}", base, names)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Comprehensive error type for all tankobon operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Regular expression parsing errors
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// Async task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Semaphore(#[from] tokio::sync::AcquireError),
    #[error(transparent)]
    ConfigBuilder(#[from] crate::tankobon::TankobonConfigBuilderError),
    /// A custom naming regex is malformed or lacks the required capture groups
    #[error("Invalid naming pattern: {0}")]
    Pattern(String),
    /// A pattern name was requested that the registry does not know
    #[error("Unknown naming pattern '{0}'")]
    UnknownPattern(String),
    /// A chapter-range expression could not be parsed
    #[error("Invalid chapter range: {0}")]
    RangeSyntax(String),
    /// A batch expression is malformed or lists volumes out of order
    #[error("Invalid batch spec: {0}")]
    BatchOrder(String),
    /// Chapters requested by the range with no matching archive
    #[error("Missing chapters: {}", fmt_numbers(.0))]
    MissingChapter(Vec<ChapterNumber>),
    /// More than one archive matched the same main chapter number
    #[error("Multiple archives match {}", fmt_duplicates(.0))]
    DuplicateChapter(Vec<(u32, Vec<PathBuf>)>),
    /// The archive does not embed the required metadata file
    #[error("Missing ComicInfo.xml in {0:?}")]
    MissingMetadata(PathBuf),
    /// The archive's internal layout is not the flat file list we extract
    #[error("Unsupported structure in archive {archive:?}: {detail}")]
    UnsupportedArchiveStructure { archive: PathBuf, detail: String },
    /// The per-source-directory configuration file is unreadable or malformed
    #[error("Invalid {path:?}: {detail}")]
    ConfigParse { path: PathBuf, detail: String },
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// Error for resources that couldn't be found (e.g., source directory)
    #[error("Not found: {0}")]
    NotFound(String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

// Basic From<String> conversion for convenience
impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}
