//! Entry use-case service.
//!
//! # Responsibility
//! - Provide record/edit/list entry points for the CLI.
//! - Build weekly summaries from stored entries.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Edits never touch `id` or `created_at`.

use crate::model::entry::{Category, Entry};
use crate::repo::entry_repo::{EntryRepository, RepoResult};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Length of the window used by weekly reports.
pub const REPORT_WINDOW_DAYS: i64 = 7;

/// Request model for recording a new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub category: Category,
    pub research_topic: String,
    pub program_title: String,
    pub satisfaction: u8,
}

/// Field changes applied by `edit_entry`. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub category: Option<Category>,
    pub research_topic: Option<String>,
    pub program_title: Option<String>,
    pub satisfaction: Option<u8>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.research_topic.is_none()
            && self.program_title.is_none()
            && self.satisfaction.is_none()
    }
}

/// Aggregate over the entries of one reporting window.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySummary {
    pub since: DateTime<Utc>,
    pub total: usize,
    /// Only categories with at least one entry appear.
    pub per_category: BTreeMap<Category, usize>,
    /// `None` when the window is empty.
    pub average_satisfaction: Option<f64>,
    /// Newest first.
    pub entries: Vec<Entry>,
}

/// Use-case service wrapper for entry operations.
pub struct EntryService<R: EntryRepository> {
    repo: R,
}

impl<R: EntryRepository> EntryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Underlying repository, for export/import callers.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Records a new entry stamped with the current time.
    ///
    /// Fields the category does not use are stored empty.
    pub fn record_entry(&self, request: NewEntry) -> RepoResult<Entry> {
        let mut entry = Entry::new(request.category, request.satisfaction);
        if entry.category.has_research_topic() {
            entry.research_topic = request.research_topic.trim().to_string();
        }
        if entry.category.has_program_title() {
            entry.program_title = request.program_title.trim().to_string();
        }
        self.repo.save_entry(&entry)?;
        Ok(entry)
    }

    /// Applies `patch` to a stored entry and persists it.
    ///
    /// Returns repository-level not-found or validation errors unchanged.
    pub fn edit_entry(&self, id: &str, patch: EntryPatch) -> RepoResult<Entry> {
        let mut entry = self.repo.get_entry(id)?;
        if let Some(category) = patch.category {
            entry.category = category;
        }
        if let Some(topic) = patch.research_topic {
            entry.research_topic = topic.trim().to_string();
        }
        if let Some(title) = patch.program_title {
            entry.program_title = title.trim().to_string();
        }
        if let Some(satisfaction) = patch.satisfaction {
            entry.satisfaction = satisfaction;
        }
        if !entry.category.has_research_topic() {
            entry.research_topic.clear();
        }
        if !entry.category.has_program_title() {
            entry.program_title.clear();
        }
        self.repo.update_entry(&entry)?;
        Ok(entry)
    }

    pub fn get_entry(&self, id: &str) -> RepoResult<Entry> {
        self.repo.get_entry(id)
    }

    /// Lists entries newest first, optionally restricted to one category.
    pub fn list_entries(&self, category: Option<Category>) -> RepoResult<Vec<Entry>> {
        match category {
            Some(category) => self.repo.list_entries_by_category(category),
            None => self.repo.list_entries(),
        }
    }

    pub fn count_entries(&self) -> RepoResult<u64> {
        self.repo.count_entries()
    }

    /// Entries from the last seven days relative to `now`.
    pub fn entries_from_last_week(&self, now: DateTime<Utc>) -> RepoResult<Vec<Entry>> {
        self.repo
            .list_entries_since(now - Duration::days(REPORT_WINDOW_DAYS))
    }

    /// Summarizes the last seven days relative to `now`.
    pub fn weekly_summary(&self, now: DateTime<Utc>) -> RepoResult<WeeklySummary> {
        let since = now - Duration::days(REPORT_WINDOW_DAYS);
        let entries = self.entries_from_last_week(now)?;

        let mut per_category = BTreeMap::new();
        for entry in &entries {
            *per_category.entry(entry.category).or_insert(0) += 1;
        }

        let average_satisfaction = if entries.is_empty() {
            None
        } else {
            let sum: u32 = entries.iter().map(|entry| u32::from(entry.satisfaction)).sum();
            Some(f64::from(sum) / entries.len() as f64)
        };

        Ok(WeeklySummary {
            since,
            total: entries.len(),
            per_category,
            average_satisfaction,
            entries,
        })
    }
}
