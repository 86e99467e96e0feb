use crate::prelude::{println, *};
use crate::store::SessionStore;
use codeprompt_core::source::{total_bytes, SourceFile};
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, clap::Args)]
pub struct FilesOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FileEntry {
    pub path: String,
    pub bytes: usize,
}

pub async fn run(options: FilesOptions, global: crate::Global) -> Result<()> {
    let session = SessionStore::from_global(&global)?.load()?;
    let entries = file_entries(session.files());

    if options.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No files collected yet.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "#".bold().cyan(),
        "Path".bold().cyan(),
        "Bytes".bold().cyan()
    ]);
    for (index, entry) in entries.iter().enumerate() {
        table.add_row(prettytable::row![
            (index + 1).to_string().bright_yellow(),
            entry.path.bright_white(),
            entry.bytes.to_string()
        ]);
    }
    table.printstd();

    println!(
        "\n{} file(s), {} bytes",
        entries.len(),
        total_bytes(session.files())
    );
    Ok(())
}

pub fn file_entries(files: &[SourceFile]) -> Vec<FileEntry> {
    files
        .iter()
        .map(|file| FileEntry {
            path: file.path.clone(),
            bytes: file.content.len(),
        })
        .collect()
}
