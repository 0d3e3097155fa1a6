//! Core domain logic for the wamon activity journal.
//! This crate is the single source of truth for entry invariants and the
//! JSON Lines export/import format.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transfer;

pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entry::{
    Category, Entry, EntryId, EntryValidationError, DEFAULT_SATISFACTION, MAX_SATISFACTION,
    MIN_SATISFACTION,
};
pub use repo::entry_repo::{
    EntryBatch, EntryRepository, RepoError, RepoResult, SqliteEntryBatch, SqliteEntryRepository,
};
pub use service::entry_service::{EntryPatch, EntryService, NewEntry, WeeklySummary};
pub use transfer::{
    decode_entry, encode_entry, export_all, export_since, import_entries, DecodeError,
    ImportSummary, TransferError, TransferResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
