use crate::prelude::{println, *};
use crate::store::SessionStore;
use codeprompt_core::session::{GenerationContext, Session};
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, clap::Args)]
pub struct HistoryOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args)]
pub struct SelectOptions {
    /// History index (1 is the most recent) or id prefix
    #[arg(value_name = "ID|INDEX")]
    pub key: String,
}

/// One line of the history listing.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub index: usize,
    pub id: String,
    pub current: bool,
    pub timestamp: String,
    pub language_framework: String,
    pub main_objective: String,
    pub task: String,
    pub media: Vec<String>,
}

pub async fn run(options: HistoryOptions, global: crate::Global) -> Result<()> {
    let session = SessionStore::from_global(&global)?.load()?;
    let entries = history_entries(&session);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No analyses yet. Run {} first.", "codeprompt analyze".cyan());
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "#".bold().cyan(),
        "ID".bold().cyan(),
        "When".bold().cyan(),
        "Stack".bold().cyan(),
        "Objective".bold().cyan(),
        "Media".bold().cyan()
    ]);

    for entry in &entries {
        let marker = if entry.current {
            f!("*{}", entry.index).bright_green().bold()
        } else {
            entry.index.to_string().bright_yellow()
        };
        table.add_row(prettytable::row![
            marker,
            entry.id.bright_black(),
            entry.timestamp,
            entry.language_framework.bright_magenta(),
            truncate(&entry.main_objective, 60),
            entry.media.join(", ")
        ]);
    }

    table.printstd();
    Ok(())
}

pub async fn run_select(options: SelectOptions, global: crate::Global) -> Result<()> {
    let store = SessionStore::from_global(&global)?;
    let context = store.update(|session| Ok(session.select(&options.key)?.clone()))?;

    println!(
        "{} {} {}",
        "Selected".green().bold(),
        context.short_id().bright_black(),
        context.analysis.main_objective
    );
    if !context.task.trim().is_empty() {
        println!("  {}: {}", "Task".green(), context.task);
    }
    Ok(())
}

pub fn history_entries(session: &Session) -> Vec<HistoryEntry> {
    let current = session.current().map(|c| c.id);
    session
        .history()
        .iter()
        .enumerate()
        .map(|(i, context)| HistoryEntry {
            index: i + 1,
            id: context.short_id(),
            current: current == Some(context.id),
            timestamp: context.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            language_framework: context.analysis.language_framework.clone(),
            main_objective: context.analysis.main_objective.clone(),
            task: context.task.clone(),
            media: media_labels(context),
        })
        .collect()
}

fn media_labels(context: &GenerationContext) -> Vec<String> {
    use codeprompt_core::media::MediaKind;

    [MediaKind::Logo, MediaKind::Audio, MediaKind::Video]
        .into_iter()
        .filter(|kind| context.media(*kind).is_some())
        .map(|kind| kind.to_string())
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        f!("{cut}...")
    }
}
