//! Entry domain model.
//!
//! # Responsibility
//! - Define the canonical journal record and its category tags.
//! - Own the spelling table that maps categories to stored/exported text.
//!
//! # Invariants
//! - `id` is unique and never changes once the entry is persisted.
//! - `created_at` is set at creation and never rewritten by updates/imports.
//! - `satisfaction` is always within `1..=5`.
//!
//! # See also
//! - crates/wamon_core/src/transfer/codec.rs

use chrono::{DateTime, SubsecRound, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque, caller-supplied entry identifier.
///
/// New entries get a timestamp-derived value, but only uniqueness matters.
pub type EntryId = String;

/// Lowest accepted satisfaction rating.
pub const MIN_SATISFACTION: u8 = 1;
/// Highest accepted satisfaction rating.
pub const MAX_SATISFACTION: u8 = 5;
/// Rating assigned to imported entries; the wire format does not carry one.
pub const DEFAULT_SATISFACTION: u8 = 3;

const ENTRY_ID_FORMAT: &str = "%Y%m%d%H%M%S%3f";
const NANOS_PER_MILLI: u32 = 1_000_000;

/// Activity kind recorded by one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    /// Something was looked up or studied.
    Research,
    /// Something was written.
    Programming,
    /// Research that ended in a program.
    ResearchAndProgram,
}

struct CategorySpelling {
    category: Category,
    canonical: &'static str,
    wire_aliases: &'static [&'static str],
    input_aliases: &'static [&'static str],
}

// Canonical tags are what earlier releases stored, so existing exports keep
// importing unchanged.
const CATEGORY_SPELLINGS: &[CategorySpelling] = &[
    CategorySpelling {
        category: Category::Research,
        canonical: "調べ物",
        wire_aliases: &["research"],
        input_aliases: &[],
    },
    CategorySpelling {
        category: Category::Programming,
        canonical: "プログラマ",
        wire_aliases: &["programming"],
        input_aliases: &[],
    },
    CategorySpelling {
        category: Category::ResearchAndProgram,
        canonical: "調べてプログラマ",
        wire_aliases: &["research_and_programming"],
        input_aliases: &["both"],
    },
];

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 3] = [
        Category::Research,
        Category::Programming,
        Category::ResearchAndProgram,
    ];

    /// Canonical tag text used for storage and export.
    pub fn as_tag(self) -> &'static str {
        spelling_of(self).canonical
    }

    /// Resolves a wire/storage spelling (canonical tag or alias), exact match.
    pub fn from_tag(value: &str) -> Option<Self> {
        CATEGORY_SPELLINGS
            .iter()
            .find(|spelling| {
                spelling.canonical == value || spelling.wire_aliases.contains(&value)
            })
            .map(|spelling| spelling.category)
    }

    /// Resolves user-typed category names.
    ///
    /// Accepts everything `from_tag` does plus short aliases such as `both`,
    /// ignoring case and surrounding whitespace.
    pub fn from_user_input(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        Self::from_tag(normalized.as_str()).or_else(|| {
            CATEGORY_SPELLINGS
                .iter()
                .find(|spelling| spelling.input_aliases.contains(&normalized.as_str()))
                .map(|spelling| spelling.category)
        })
    }

    /// Whether entries of this kind carry a research topic.
    pub fn has_research_topic(self) -> bool {
        matches!(self, Self::Research | Self::ResearchAndProgram)
    }

    /// Whether entries of this kind carry a program title.
    pub fn has_program_title(self) -> bool {
        matches!(self, Self::Programming | Self::ResearchAndProgram)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

fn spelling_of(category: Category) -> &'static CategorySpelling {
    match category {
        Category::Research => &CATEGORY_SPELLINGS[0],
        Category::Programming => &CATEGORY_SPELLINGS[1],
        Category::ResearchAndProgram => &CATEGORY_SPELLINGS[2],
    }
}

/// Validation failures for entry invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    EmptyId,
    SatisfactionOutOfRange(u8),
    /// `created_at` carries precision below one millisecond.
    SubMillisecondTimestamp,
    MissingResearchTopic,
    MissingProgramTitle,
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "entry id cannot be empty"),
            Self::SatisfactionOutOfRange(value) => write!(
                f,
                "satisfaction must be between {MIN_SATISFACTION} and {MAX_SATISFACTION}, got {value}"
            ),
            Self::SubMillisecondTimestamp => {
                write!(f, "created_at must not be finer than one millisecond")
            }
            Self::MissingResearchTopic => write!(f, "research topic is required for this category"),
            Self::MissingProgramTitle => write!(f, "program title is required for this category"),
        }
    }
}

impl Error for EntryValidationError {}

/// One journaled activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub category: Category,
    /// Meaningful for `Research` and `ResearchAndProgram`, else empty.
    pub research_topic: String,
    /// Meaningful for `Programming` and `ResearchAndProgram`, else empty.
    pub program_title: String,
    pub satisfaction: u8,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Creates an entry stamped with the current time and a generated id.
    ///
    /// Topic and title start empty; callers fill them before `validate()`.
    pub fn new(category: Category, satisfaction: u8) -> Self {
        let now = Utc::now();
        Self::with_id(now.format(ENTRY_ID_FORMAT).to_string(), category, satisfaction, now)
    }

    /// Creates an entry with a caller-provided id and timestamp.
    ///
    /// Used by import paths where identity already exists externally.
    /// `created_at` is truncated to whole milliseconds, the storage precision.
    pub fn with_id(
        id: impl Into<EntryId>,
        category: Category,
        satisfaction: u8,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            research_topic: String::new(),
            program_title: String::new(),
            satisfaction,
            created_at: created_at.trunc_subsecs(3),
        }
    }

    /// Full validation for entries authored through the application.
    ///
    /// # Errors
    /// - Everything `validate_record` rejects.
    /// - A category field that is required but blank.
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        self.validate_record()?;
        if self.category.has_research_topic() && self.research_topic.trim().is_empty() {
            return Err(EntryValidationError::MissingResearchTopic);
        }
        if self.category.has_program_title() && self.program_title.trim().is_empty() {
            return Err(EntryValidationError::MissingProgramTitle);
        }
        Ok(())
    }

    /// Structural validation shared by reads and imports.
    ///
    /// Rejects sub-millisecond `created_at` values, which storage would
    /// silently truncate.
    ///
    /// Imported `ResearchAndProgram` bodies that cannot be split leave the
    /// program title empty, so content fields are not checked here.
    pub fn validate_record(&self) -> Result<(), EntryValidationError> {
        if self.id.trim().is_empty() {
            return Err(EntryValidationError::EmptyId);
        }
        if !(MIN_SATISFACTION..=MAX_SATISFACTION).contains(&self.satisfaction) {
            return Err(EntryValidationError::SatisfactionOutOfRange(
                self.satisfaction,
            ));
        }
        if self.created_at.timestamp_subsec_nanos() % NANOS_PER_MILLI != 0 {
            return Err(EntryValidationError::SubMillisecondTimestamp);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, Entry, EntryValidationError};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn tags_resolve_canonical_and_alias_spellings() {
        for category in Category::ALL {
            assert_eq!(Category::from_tag(category.as_tag()), Some(category));
        }
        assert_eq!(Category::from_tag("research"), Some(Category::Research));
        assert_eq!(
            Category::from_tag("research_and_programming"),
            Some(Category::ResearchAndProgram)
        );
        assert_eq!(Category::from_tag("Research"), None);
        assert_eq!(Category::from_tag("both"), None);
    }

    #[test]
    fn user_input_accepts_short_aliases_case_insensitively() {
        assert_eq!(
            Category::from_user_input(" BOTH "),
            Some(Category::ResearchAndProgram)
        );
        assert_eq!(
            Category::from_user_input("Programming"),
            Some(Category::Programming)
        );
        assert_eq!(Category::from_user_input("cooking"), None);
    }

    #[test]
    fn new_entry_gets_timestamp_id() {
        let entry = Entry::new(Category::Research, 4);
        assert_eq!(entry.id.len(), 17);
        assert!(entry.id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn validate_requires_category_fields() {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut entry = Entry::with_id("e1", Category::ResearchAndProgram, 3, created_at);
        entry.research_topic = "borrowck".to_string();
        assert_eq!(
            entry.validate(),
            Err(EntryValidationError::MissingProgramTitle)
        );
        assert!(entry.validate_record().is_ok());

        entry.program_title = "lifetimes demo".to_string();
        assert!(entry.validate().is_ok());
    }

    #[test]
    fn with_id_truncates_to_milliseconds() {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let entry = Entry::with_id(
            "e1",
            Category::Research,
            3,
            base + Duration::microseconds(1_500),
        );
        assert_eq!(entry.created_at, base + Duration::milliseconds(1));
        assert!(entry.validate_record().is_ok());
    }

    #[test]
    fn validate_record_rejects_sub_millisecond_timestamp() {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut entry = Entry::with_id("e1", Category::Research, 3, base);
        entry.created_at = base + Duration::microseconds(500);
        assert_eq!(
            entry.validate_record(),
            Err(EntryValidationError::SubMillisecondTimestamp)
        );
    }

    #[test]
    fn validate_record_rejects_bad_rating_and_blank_id() {
        let created_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let entry = Entry::with_id("e1", Category::Research, 6, created_at);
        assert_eq!(
            entry.validate_record(),
            Err(EntryValidationError::SatisfactionOutOfRange(6))
        );

        let entry = Entry::with_id("  ", Category::Research, 3, created_at);
        assert_eq!(entry.validate_record(), Err(EntryValidationError::EmptyId));
    }
}
