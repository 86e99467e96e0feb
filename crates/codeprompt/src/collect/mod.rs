use crate::prelude::{eprintln, println, *};
use crate::store::SessionStore;
use codeprompt_core::source::{total_bytes, SourceFile};
use colored::Colorize;

pub mod local;
pub mod paste;
pub mod repo;
pub mod url;

// Re-export public data functions
pub use repo::import_repository_data;
pub use url::fetch_urls_data;

#[derive(Debug, clap::Parser)]
#[command(name = "collect")]
#[command(about = "Collect source files into the session")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Read code from stdin as a single file
    #[clap(name = "paste")]
    Paste(paste::PasteOptions),

    /// Collect local files and folders (folders honour .gitignore)
    #[clap(name = "local")]
    Local(local::LocalOptions),

    /// Fetch raw files from URLs
    #[clap(name = "url")]
    Url(url::UrlOptions),

    /// Import a GitHub, GitLab or Bitbucket repository
    #[clap(name = "repo")]
    Repo(repo::RepoOptions),
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let store = SessionStore::from_global(&global)?;

    if global.verbose {
        eprintln!("Session file: {}", store.path().display());
    }

    let files = match app.command {
        Commands::Paste(options) => paste::run(options, &global).await?,
        Commands::Local(options) => local::run(options, &global).await?,
        Commands::Url(options) => url::run(options, &global).await?,
        Commands::Repo(options) => repo::run(options, &global).await?,
    };

    let summary = summarize(&files);
    store.update(|session| {
        session.replace_files(files);
        Ok(())
    })?;

    println!("{} {}", "Collected".green().bold(), summary);
    Ok(())
}

fn summarize(files: &[SourceFile]) -> String {
    let count = files.len();
    f!(
        "{} file{} ({} bytes)",
        count,
        if count == 1 { "" } else { "s" },
        total_bytes(files)
    )
}
