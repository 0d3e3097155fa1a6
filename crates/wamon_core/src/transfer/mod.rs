//! JSON Lines export/import for journal entries.
//!
//! # Responsibility
//! - Stream store snapshots to JSON Lines files (`export`).
//! - Merge JSON Lines files back into the store (`import`).
//!
//! # Invariants
//! - Import is all-or-nothing: any failing line rolls back the whole file.
//! - Import never overwrites rows; existing ids are skipped.
//! - Export is a best-effort snapshot; mid-stream failures may leave a
//!   partial file behind.

use crate::repo::entry_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod codec;
mod export;
mod import;

pub use codec::{decode_entry, encode_entry, DecodeError, WireRecord};
pub use export::{export_all, export_since};
pub use import::{import_entries, ImportSummary};

pub type TransferResult<T> = Result<T, TransferError>;

/// Errors raised by export and import.
#[derive(Debug)]
pub enum TransferError {
    FileNotFound(PathBuf),
    /// File could not be opened, created, or its directory prepared.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Export stopped mid-stream after `written` lines were handed to the
    /// writer. The count is informational, not a durability guarantee.
    Write {
        path: PathBuf,
        written: usize,
        source: std::io::Error,
    },
    /// Store read failed before anything was written.
    Query(RepoError),
    /// Import transaction could not be opened or committed.
    Transaction(RepoError),
    Decode {
        line: usize,
        source: DecodeError,
    },
    Read {
        line: usize,
        source: std::io::Error,
    },
    Store {
        line: usize,
        source: RepoError,
    },
}

impl TransferError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FileNotFound(_) => "file_not_found",
            Self::Io { .. } => "io_failed",
            Self::Write { .. } => "write_failed",
            Self::Query(_) => "query_failed",
            Self::Transaction(_) => "transaction_failed",
            Self::Decode { .. } => "decode_failed",
            Self::Read { .. } => "read_failed",
            Self::Store { .. } => "store_failed",
        }
    }
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound(path) => write!(f, "file not found: {}", path.display()),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Write {
                path,
                written,
                source,
            } => write!(
                f,
                "{}: write failed after {written} entries: {source}",
                path.display()
            ),
            Self::Query(err) => write!(f, "failed to read entries: {err}"),
            Self::Transaction(err) => write!(f, "import transaction failed: {err}"),
            Self::Decode { line, source } => write!(f, "line {line}: {source}"),
            Self::Read { line, source } => write!(f, "line {line}: read failed: {source}"),
            Self::Store { line, source } => write!(f, "line {line}: {source}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FileNotFound(_) => None,
            Self::Io { source, .. } | Self::Write { source, .. } | Self::Read { source, .. } => {
                Some(source)
            }
            Self::Query(err) | Self::Transaction(err) | Self::Store { source: err, .. } => {
                Some(err)
            }
            Self::Decode { source, .. } => Some(source),
        }
    }
}
