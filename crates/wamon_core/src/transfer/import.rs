//! Transactional JSON Lines import.

use super::codec::decode_entry;
use super::{TransferError, TransferResult};
use crate::repo::entry_repo::{EntryBatch, EntryRepository};
use log::{error, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;
use std::time::Instant;

/// Outcome of a committed import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Lines inserted as new entries.
    pub imported: usize,
    /// Lines whose id already existed (in the store or earlier in the file).
    pub skipped: usize,
}

/// Merges an export file into the store inside one transaction.
///
/// Empty lines are ignored; a whitespace-only line fails to decode. Entries
/// whose id already exists are skipped and left untouched. The first
/// failing line rolls back every insert made by this call, so either the
/// whole file lands or nothing does.
///
/// # Errors
/// - `FileNotFound` / `Io` when `path` cannot be opened.
/// - `Transaction` when the transaction cannot be opened or committed.
/// - `Decode`, `Read` or `Store` with the 1-based line number of the
///   failing line.
pub fn import_entries<R: EntryRepository>(
    repo: &R,
    path: impl AsRef<Path>,
) -> TransferResult<ImportSummary> {
    let started_at = Instant::now();
    let path = path.as_ref();

    let result = open_source(path).and_then(|reader| {
        let batch = repo.begin_batch().map_err(TransferError::Transaction)?;
        match merge_lines(&batch, reader) {
            Ok(summary) => {
                batch.commit().map_err(TransferError::Transaction)?;
                Ok(summary)
            }
            Err(err) => {
                if let Err(rollback_err) = batch.rollback() {
                    warn!(
                        "event=import_rollback module=transfer status=error error={}",
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    });

    match &result {
        Ok(summary) => info!(
            "event=import module=transfer status=ok imported={} skipped={} duration_ms={}",
            summary.imported,
            summary.skipped,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=import module=transfer status=error duration_ms={} error_code={} error={}",
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
    result
}

fn open_source(path: &Path) -> TransferResult<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            TransferError::FileNotFound(path.to_path_buf())
        } else {
            TransferError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

fn merge_lines<B: EntryBatch>(batch: &B, reader: impl BufRead) -> TransferResult<ImportSummary> {
    let mut summary = ImportSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| TransferError::Read {
            line: line_no,
            source,
        })?;
        if line.is_empty() {
            continue;
        }

        let entry = decode_entry(&line).map_err(|source| TransferError::Decode {
            line: line_no,
            source,
        })?;

        let store_error = |source| TransferError::Store {
            line: line_no,
            source,
        };
        if batch.contains(&entry.id).map_err(store_error)? {
            summary.skipped += 1;
            continue;
        }
        batch.insert(&entry).map_err(store_error)?;
        summary.imported += 1;
    }

    Ok(summary)
}
