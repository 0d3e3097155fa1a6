//! Entry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed persistence and time/category queries over `entries`.
//! - Expose a transactional batch handle for multi-row merges.
//! - Keep SQL details inside core persistence boundary.
//!
//! # Invariants
//! - Write paths validate entries before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Every list is ordered `created_at DESC, id ASC`.
//! - `update_entry` never rewrites `created_at`.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::entry::{Category, Entry, EntryId, EntryValidationError};
use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    category,
    research_topic,
    program_title,
    satisfaction,
    created_at
FROM entries";

const ENTRY_ORDER_SQL: &str = "ORDER BY created_at DESC, id ASC";

const REQUIRED_COLUMNS: [&str; 6] = [
    "id",
    "category",
    "research_topic",
    "program_title",
    "satisfaction",
    "created_at",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entry persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(EntryValidationError),
    Db(DbError),
    /// Insert rejected because the id is already stored.
    DuplicateKey(EntryId),
    NotFound(EntryId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateKey(id) => write!(f, "entry already exists: {id}"),
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "entry repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "entry repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "entry repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DuplicateKey(_)
            | Self::NotFound(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<EntryValidationError> for RepoError {
    fn from(value: EntryValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for journal entries.
pub trait EntryRepository {
    /// Transaction handle returned by `begin_batch`.
    type Batch<'a>: EntryBatch
    where
        Self: 'a;

    /// Inserts a new row; `DuplicateKey` when the id exists.
    fn save_entry(&self, entry: &Entry) -> RepoResult<()>;
    /// Replaces mutable fields of the row with the same id; `NotFound` on miss.
    fn update_entry(&self, entry: &Entry) -> RepoResult<()>;
    /// Loads one entry; `NotFound` on miss.
    fn get_entry(&self, id: &str) -> RepoResult<Entry>;
    /// Every entry, newest first.
    fn list_entries(&self) -> RepoResult<Vec<Entry>>;
    /// Entries of exactly one category, newest first.
    fn list_entries_by_category(&self, category: Category) -> RepoResult<Vec<Entry>>;
    /// Entries with `created_at >= since`, newest first.
    fn list_entries_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<Entry>>;
    fn count_entries(&self) -> RepoResult<u64>;
    /// Opens a write transaction for an all-or-nothing merge.
    fn begin_batch(&self) -> RepoResult<Self::Batch<'_>>;
}

/// Write transaction over the entry store.
///
/// Dropping a batch without `commit` discards its writes.
pub trait EntryBatch {
    /// Whether an entry with `id` is visible inside this transaction.
    fn contains(&self, id: &str) -> RepoResult<bool>;
    /// Inserts one entry inside this transaction.
    fn insert(&self, entry: &Entry) -> RepoResult<()>;
    fn commit(self) -> RepoResult<()>;
    fn rollback(self) -> RepoResult<()>;
}

/// SQLite-backed entry repository.
pub struct SqliteEntryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntryRepository<'conn> {
    /// Creates repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_entry_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_entries(
        &self,
        filter_sql: &str,
        bind: &[&dyn rusqlite::ToSql],
    ) -> RepoResult<Vec<Entry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} {filter_sql} {ENTRY_ORDER_SQL};"))?;
        let mut rows = stmt.query(bind)?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }
}

impl EntryRepository for SqliteEntryRepository<'_> {
    type Batch<'a>
        = SqliteEntryBatch<'a>
    where
        Self: 'a;

    fn save_entry(&self, entry: &Entry) -> RepoResult<()> {
        entry.validate()?;
        insert_entry(self.conn, entry)?;
        debug!("event=entry_save module=repo status=ok id={}", entry.id);
        Ok(())
    }

    fn update_entry(&self, entry: &Entry) -> RepoResult<()> {
        entry.validate()?;

        let changed = self.conn.execute(
            "UPDATE entries
             SET
                category = ?1,
                research_topic = ?2,
                program_title = ?3,
                satisfaction = ?4
             WHERE id = ?5;",
            params![
                entry.category.as_tag(),
                entry.research_topic.as_str(),
                entry.program_title.as_str(),
                entry.satisfaction,
                entry.id.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(entry.id.clone()));
        }

        debug!("event=entry_update module=repo status=ok id={}", entry.id);
        Ok(())
    }

    fn get_entry(&self, id: &str) -> RepoResult<Entry> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_entry_row(row),
            None => Err(RepoError::NotFound(id.to_string())),
        }
    }

    fn list_entries(&self) -> RepoResult<Vec<Entry>> {
        self.query_entries("", &[])
    }

    fn list_entries_by_category(&self, category: Category) -> RepoResult<Vec<Entry>> {
        self.query_entries("WHERE category = ?1", &[&category.as_tag()])
    }

    fn list_entries_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<Entry>> {
        self.query_entries("WHERE created_at >= ?1", &[&ceil_millis(since)])
    }

    fn count_entries(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative entry count `{count}`")))
    }

    fn begin_batch(&self) -> RepoResult<Self::Batch<'_>> {
        // Immediate: take the write lock before the first existence check.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        Ok(SqliteEntryBatch { tx })
    }
}

/// SQLite transaction used for batch merges.
pub struct SqliteEntryBatch<'conn> {
    tx: Transaction<'conn>,
}

impl EntryBatch for SqliteEntryBatch<'_> {
    fn contains(&self, id: &str) -> RepoResult<bool> {
        let exists: i64 = self.tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM entries WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert(&self, entry: &Entry) -> RepoResult<()> {
        entry.validate_record()?;
        insert_entry(&self.tx, entry)
    }

    fn commit(self) -> RepoResult<()> {
        self.tx.commit()?;
        Ok(())
    }

    fn rollback(self) -> RepoResult<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

fn insert_entry(conn: &Connection, entry: &Entry) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO entries (
            id,
            category,
            research_topic,
            program_title,
            satisfaction,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            entry.id.as_str(),
            entry.category.as_tag(),
            entry.research_topic.as_str(),
            entry.program_title.as_str(),
            entry.satisfaction,
            entry.created_at.timestamp_millis(),
        ],
    )
    .map_err(|err| map_insert_error(err, entry.id.as_str()))?;
    Ok(())
}

/// Rounds up to whole milliseconds so a sub-millisecond cutoff never
/// admits rows stored before it.
fn ceil_millis(at: DateTime<Utc>) -> i64 {
    let millis = at.timestamp_millis();
    if at.timestamp_subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis + 1
    }
}

fn map_insert_error(err: rusqlite::Error, id: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            RepoError::DuplicateKey(id.to_string())
        }
        _ => err.into(),
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<Entry> {
    let category_text: String = row.get("category")?;
    let category = Category::from_tag(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in entries.category"
        ))
    })?;

    let satisfaction_value: i64 = row.get("satisfaction")?;
    let satisfaction = u8::try_from(satisfaction_value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid satisfaction `{satisfaction_value}` in entries.satisfaction"
        ))
    })?;

    let created_at_ms: i64 = row.get("created_at")?;
    let created_at = DateTime::<Utc>::from_timestamp_millis(created_at_ms).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{created_at_ms}` in entries.created_at"
        ))
    })?;

    let entry = Entry {
        id: row.get("id")?,
        category,
        research_topic: row.get("research_topic")?,
        program_title: row.get("program_title")?,
        satisfaction,
        created_at,
    };
    entry.validate_record()?;
    Ok(entry)
}

fn ensure_entry_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "entries")? {
        return Err(RepoError::MissingRequiredTable("entries"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "entries", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "entries",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
