//! Snapshot export to JSON Lines files.

use super::codec::WireRecord;
use super::{TransferError, TransferResult};
use crate::model::entry::Entry;
use crate::repo::entry_repo::{EntryRepository, RepoResult};
use chrono::{DateTime, Utc};
use log::{error, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

/// Writes every entry, newest first, to `path`.
///
/// Returns the number of lines written. An empty store produces a
/// zero-byte file.
///
/// # Errors
/// - `Query` when the store read fails.
/// - `Io` when the file or its directory cannot be created.
/// - `Write` when writing stops mid-stream; the partial file is left as is.
pub fn export_all<R: EntryRepository>(repo: &R, path: impl AsRef<Path>) -> TransferResult<usize> {
    let path = path.as_ref();
    run_export("all", path, || repo.list_entries())
}

/// Writes entries with `created_at >= since`, newest first, to `path`.
///
/// Same contract as [`export_all`].
pub fn export_since<R: EntryRepository>(
    repo: &R,
    path: impl AsRef<Path>,
    since: DateTime<Utc>,
) -> TransferResult<usize> {
    let path = path.as_ref();
    run_export("since", path, || repo.list_entries_since(since))
}

fn run_export(
    scope: &'static str,
    path: &Path,
    fetch: impl FnOnce() -> RepoResult<Vec<Entry>>,
) -> TransferResult<usize> {
    let started_at = Instant::now();
    let result = fetch()
        .map_err(TransferError::Query)
        .and_then(|entries| write_snapshot(path, &entries));

    match &result {
        Ok(written) => info!(
            "event=export module=transfer status=ok scope={} count={} duration_ms={}",
            scope,
            written,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=export module=transfer status=error scope={} duration_ms={} error_code={} error={}",
            scope,
            started_at.elapsed().as_millis(),
            err.code(),
            err
        ),
    }
    result
}

fn write_snapshot(path: &Path, entries: &[Entry]) -> TransferResult<usize> {
    let io_error = |source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    };

    if entries.is_empty() {
        File::create(path).map_err(io_error)?;
        return Ok(0);
    }

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(io_error)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);

    let mut written = 0;
    for entry in entries {
        write_line(&mut writer, entry).map_err(|source| TransferError::Write {
            path: path.to_path_buf(),
            written,
            source,
        })?;
        written += 1;
    }
    writer.flush().map_err(|source| TransferError::Write {
        path: path.to_path_buf(),
        written,
        source,
    })?;

    Ok(written)
}

fn write_line(writer: &mut impl Write, entry: &Entry) -> std::io::Result<()> {
    serde_json::to_writer(&mut *writer, &WireRecord::from_entry(entry))?;
    writer.write_all(b"\n")
}
