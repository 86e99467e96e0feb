use crate::prelude::*;
use clap::Parser;
use std::path::PathBuf;

mod analyze;
mod collect;
mod config;
mod error;
mod files;
mod gemini;
mod history;
mod mcp;
mod media;
mod prelude;
mod prompt;
mod store;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Collect a code base, analyze it with Gemini and turn it into reusable AI assistant prompts"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Gemini API key (API_KEY is also read when GEMINI_API_KEY is unset)
    #[clap(long, env = "GEMINI_API_KEY", global = true, hide_env_values = true)]
    api_key: Option<String>,

    /// Configuration file (defaults to the user config directory)
    #[clap(long, env = "CODEPROMPT_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Session file (defaults to the user data directory)
    #[clap(long, env = "CODEPROMPT_SESSION", global = true)]
    session: Option<PathBuf>,

    /// Proxy prefix for raw URL and Bitbucket content fetches
    #[clap(long, env = "CODEPROMPT_PROXY", global = true)]
    proxy: Option<String>,

    /// Whether to display additional information.
    #[clap(long, env = "CODEPROMPT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Collect source files (paste, local paths, raw URLs or a repository)
    Collect(crate::collect::App),

    /// List the collected files
    Files(crate::files::FilesOptions),

    /// Analyze the collected files and record a new context
    Analyze(crate::analyze::AnalyzeOptions),

    /// Print the prompt for the current context
    Prompt(crate::prompt::PromptOptions),

    /// List the available prompt styles
    Styles,

    /// Rewrite the displayed prompt following your instructions
    Refine(crate::prompt::RefineOptions),

    /// Drop the refined prompt and go back to the styled one
    Revert,

    /// List previous analyses
    History(crate::history::HistoryOptions),

    /// Make a previous analysis current
    Select(crate::history::SelectOptions),

    /// Generate a logo, an audio summary or a video pitch
    Media(crate::media::App),

    /// Model Context Protocol server
    MCP(crate::mcp::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Collect(sub_app) => crate::collect::run(sub_app, app.global).await,
        SubCommands::Files(options) => crate::files::run(options, app.global).await,
        SubCommands::Analyze(options) => crate::analyze::run(options, app.global).await,
        SubCommands::Prompt(options) => crate::prompt::run(options, app.global).await,
        SubCommands::Styles => crate::prompt::run_styles(app.global).await,
        SubCommands::Refine(options) => crate::prompt::run_refine(options, app.global).await,
        SubCommands::Revert => crate::prompt::run_revert(app.global).await,
        SubCommands::History(options) => crate::history::run(options, app.global).await,
        SubCommands::Select(options) => crate::history::run_select(options, app.global).await,
        SubCommands::Media(sub_app) => crate::media::run(sub_app, app.global).await,
        SubCommands::MCP(sub_app) => crate::mcp::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
