//! Command handlers.

use crate::Commands;
use chrono::{Local, Utc};
use log::warn;
use std::error::Error;
use std::path::{Path, PathBuf};
use wamon_core::config::default_config_path;
use wamon_core::db::open_db;
use wamon_core::{
    export_all, export_since, import_entries, init_logging, AppConfig, Entry, EntryPatch,
    EntryService, NewEntry, SqliteEntryRepository,
};

type CommandResult = Result<(), Box<dyn Error>>;

pub(crate) fn run(command: Commands, db: Option<PathBuf>, config: Option<PathBuf>) -> CommandResult {
    let config_path = config.unwrap_or_else(default_config_path);
    let mut app_config = AppConfig::load(&config_path)?;
    if let Some(db) = db {
        app_config.database_path = db;
    }

    if let Err(err) = init_logging(&app_config.log_level, &app_config.log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }

    let conn = open_db(&app_config.database_path)?;
    let service = EntryService::new(SqliteEntryRepository::try_new(&conn)?);

    match command {
        Commands::Add {
            category,
            topic,
            title,
            satisfaction,
        } => {
            let entry = service.record_entry(NewEntry {
                category,
                research_topic: topic,
                program_title: title,
                satisfaction,
            })?;
            println!("Recorded entry {}", entry.id);
            print_entry(&entry);
            println!("Total entries: {}", service.count_entries()?);
        }
        Commands::Edit {
            id,
            category,
            topic,
            title,
            satisfaction,
        } => {
            let patch = EntryPatch {
                category,
                research_topic: topic,
                program_title: title,
                satisfaction,
            };
            if patch.is_empty() {
                return Err("nothing to change; pass --category, --topic, --title or --satisfaction".into());
            }
            let entry = service.edit_entry(&id, patch)?;
            println!("Updated entry {}", entry.id);
            print_entry(&entry);
        }
        Commands::Show { id } => print_entry(&service.get_entry(&id)?),
        Commands::List { category } => {
            let entries = service.list_entries(category)?;
            if entries.is_empty() {
                println!("No entries.");
                return Ok(());
            }
            for (index, entry) in entries.iter().enumerate() {
                println!("#{}", index + 1);
                print_entry(entry);
            }
            println!("Total: {} entries", entries.len());
        }
        Commands::Count => println!("{}", service.count_entries()?),
        Commands::Export { file, since } => {
            let written = match since {
                Some(window) => export_since(service.repository(), &file, Utc::now() - window)?,
                None => export_all(service.repository(), &file)?,
            };
            println!("Exported {written} entries to {}", display_path(&file));
        }
        Commands::Import { file } => {
            let summary = import_entries(service.repository(), &file)?;
            println!(
                "Imported {} entries ({} already present)",
                summary.imported, summary.skipped
            );
            println!("Total entries: {}", service.count_entries()?);
        }
        Commands::Report => {
            let summary = service.weekly_summary(Utc::now())?;
            if summary.total == 0 {
                println!("No entries in the last 7 days.");
                return Ok(());
            }
            println!(
                "Since {}: {} entries",
                summary.since.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                summary.total
            );
            for (category, count) in &summary.per_category {
                println!("  {category}: {count}");
            }
            if let Some(average) = summary.average_satisfaction {
                println!("Average satisfaction: {average:.1}/5");
            }
        }
        Commands::SetDb => set_db(&app_config, &config_path)?,
    }

    Ok(())
}

fn set_db(app_config: &AppConfig, config_path: &Path) -> CommandResult {
    let mut stored = AppConfig::load_file(config_path)?;
    stored.database_path = app_config.database_path.clone();
    stored.save_to(config_path)?;
    println!(
        "Saved database path {} to {}",
        stored.database_path.display(),
        config_path.display()
    );
    Ok(())
}

fn print_entry(entry: &Entry) {
    println!(
        "[{}] {}",
        entry.id,
        entry.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    println!("  category: {}", entry.category);
    if !entry.research_topic.is_empty() {
        println!("  researched: {}", entry.research_topic);
    }
    if !entry.program_title.is_empty() {
        println!("  programmed: {}", entry.program_title);
    }
    println!("  satisfaction: {}/5", entry.satisfaction);
}

fn display_path(path: &Path) -> String {
    if path.is_absolute() {
        return path.display().to_string();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path).display().to_string(),
        Err(err) => {
            warn!("event=cli_cwd module=cli status=error error={err}");
            path.display().to_string()
        }
    }
}
