use chrono::{DateTime, Duration, TimeZone, Utc};
use wamon_core::db::open_db_in_memory;
use wamon_core::{
    Category, Entry, EntryPatch, EntryRepository, EntryService, EntryValidationError, NewEntry,
    RepoError, SqliteEntryRepository,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 20, 0, 0).unwrap()
}

fn stored(id: &str, category: Category, satisfaction: u8, created_at: DateTime<Utc>) -> Entry {
    let mut entry = Entry::with_id(id, category, satisfaction, created_at);
    entry.research_topic = if category.has_research_topic() {
        format!("topic {id}")
    } else {
        String::new()
    };
    entry.program_title = if category.has_program_title() {
        format!("title {id}")
    } else {
        String::new()
    };
    entry
}

#[test]
fn record_entry_persists_trimmed_fields_for_its_category() {
    let conn = open_db_in_memory().unwrap();
    let service = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());

    let entry = service
        .record_entry(NewEntry {
            category: Category::Research,
            research_topic: "  trait objects ".to_string(),
            program_title: "ignored".to_string(),
            satisfaction: 4,
        })
        .unwrap();

    assert_eq!(entry.research_topic, "trait objects");
    assert!(entry.program_title.is_empty());
    assert_eq!(service.get_entry(&entry.id).unwrap(), entry);
    assert_eq!(service.count_entries().unwrap(), 1);
}

#[test]
fn record_entry_rejects_missing_required_field() {
    let conn = open_db_in_memory().unwrap();
    let service = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());

    let err = service
        .record_entry(NewEntry {
            category: Category::ResearchAndProgram,
            research_topic: "iterators".to_string(),
            program_title: "   ".to_string(),
            satisfaction: 3,
        })
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::Validation(EntryValidationError::MissingProgramTitle)
    ));
    assert_eq!(service.count_entries().unwrap(), 0);
}

#[test]
fn edit_entry_applies_patch_and_clears_unused_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();
    let original = stored("e1", Category::ResearchAndProgram, 2, now());
    repo.save_entry(&original).unwrap();
    let service = EntryService::new(repo);

    let edited = service
        .edit_entry(
            "e1",
            EntryPatch {
                category: Some(Category::Programming),
                satisfaction: Some(5),
                ..EntryPatch::default()
            },
        )
        .unwrap();

    assert_eq!(edited.category, Category::Programming);
    assert!(edited.research_topic.is_empty());
    assert_eq!(edited.program_title, "title e1");
    assert_eq!(edited.satisfaction, 5);
    assert_eq!(edited.created_at, original.created_at);
    assert_eq!(service.get_entry("e1").unwrap(), edited);
}

#[test]
fn edit_entry_into_category_without_required_field_fails() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();
    repo.save_entry(&stored("e1", Category::Programming, 3, now()))
        .unwrap();
    let service = EntryService::new(repo);

    let err = service
        .edit_entry(
            "e1",
            EntryPatch {
                category: Some(Category::ResearchAndProgram),
                ..EntryPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(EntryValidationError::MissingResearchTopic)
    ));
    assert_eq!(
        service.get_entry("e1").unwrap().category,
        Category::Programming
    );
}

#[test]
fn edit_missing_entry_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());

    let err = service
        .edit_entry(
            "ghost",
            EntryPatch {
                satisfaction: Some(1),
                ..EntryPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn list_entries_filters_by_category_when_given() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();
    repo.save_entry(&stored("r1", Category::Research, 3, now() - Duration::hours(2)))
        .unwrap();
    repo.save_entry(&stored("p1", Category::Programming, 3, now() - Duration::hours(1)))
        .unwrap();
    let service = EntryService::new(repo);

    let all = service.list_entries(None).unwrap();
    assert_eq!(
        all.iter().map(|entry| entry.id.as_str()).collect::<Vec<_>>(),
        vec!["p1", "r1"]
    );

    let research = service.list_entries(Some(Category::Research)).unwrap();
    assert_eq!(research.len(), 1);
    assert_eq!(research[0].id, "r1");
}

#[test]
fn weekly_summary_counts_only_the_last_seven_days() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntryRepository::try_new(&conn).unwrap();
    repo.save_entry(&stored("old", Category::Research, 1, now() - Duration::days(8)))
        .unwrap();
    repo.save_entry(&stored("r1", Category::Research, 4, now() - Duration::days(6)))
        .unwrap();
    repo.save_entry(&stored("r2", Category::Research, 2, now() - Duration::days(1)))
        .unwrap();
    repo.save_entry(&stored(
        "c1",
        Category::ResearchAndProgram,
        3,
        now() - Duration::hours(3),
    ))
    .unwrap();
    let service = EntryService::new(repo);

    let summary = service.weekly_summary(now()).unwrap();
    assert_eq!(summary.since, now() - Duration::days(7));
    assert_eq!(summary.total, 3);
    assert_eq!(summary.per_category.get(&Category::Research), Some(&2));
    assert_eq!(
        summary.per_category.get(&Category::ResearchAndProgram),
        Some(&1)
    );
    assert_eq!(summary.per_category.get(&Category::Programming), None);
    assert_eq!(summary.average_satisfaction, Some(3.0));
    assert_eq!(summary.entries[0].id, "c1");

    let recent = service.entries_from_last_week(now()).unwrap();
    assert_eq!(recent.len(), 3);
}

#[test]
fn weekly_summary_of_empty_window_has_no_average() {
    let conn = open_db_in_memory().unwrap();
    let service = EntryService::new(SqliteEntryRepository::try_new(&conn).unwrap());

    let summary = service.weekly_summary(now()).unwrap();
    assert_eq!(summary.total, 0);
    assert!(summary.per_category.is_empty());
    assert_eq!(summary.average_satisfaction, None);
}
