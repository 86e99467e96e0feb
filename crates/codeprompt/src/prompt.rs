use crate::config::Settings;
use crate::gemini::GeminiClient;
use crate::prelude::{eprintln, println, *};
use crate::store::SessionStore;
use codeprompt_core::config::Config;
use codeprompt_core::refine::{build_refine_request, parse_refined};
use codeprompt_core::style::PromptStyle;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, clap::Args)]
pub struct PromptOptions {
    /// Prompt style (run `codeprompt styles` for the list)
    #[arg(short, long, default_value = "technical")]
    pub style: String,

    /// Write the prompt to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct RefineOptions {
    /// How the prompt should change
    #[arg(value_name = "INSTRUCTIONS", required = true)]
    pub instructions: Vec<String>,

    /// Style of the prompt being refined, when no refinement exists yet
    #[arg(short, long, default_value = "technical")]
    pub style: String,
}

pub async fn run(options: PromptOptions, global: crate::Global) -> Result<()> {
    let style: PromptStyle = options.style.parse()?;
    let session = SessionStore::from_global(&global)?.load()?;
    let prompt = session.displayed_prompt(style)?;

    if session.refinement().is_some() {
        eprintln!(
            "{} showing the refined prompt, run {} to go back to the {} style",
            "Note:".yellow().bold(),
            "codeprompt revert".cyan(),
            style
        );
    }

    match options.out {
        Some(path) => {
            std::fs::write(&path, &prompt)
                .with_context(|| f!("Failed to write prompt to {}", path.display()))?;
            println!("{} {}", "Saved".green().bold(), path.display());
        }
        None => println!("{prompt}"),
    }

    Ok(())
}

pub async fn run_styles(_global: crate::Global) -> Result<()> {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Style".bold().cyan(),
        "Description".bold().cyan(),
        "References".bold().cyan()
    ]);

    for style in PromptStyle::ALL {
        table.add_row(prettytable::row![
            style.name().bright_yellow(),
            style.description(),
            if style.supports_references() { "yes" } else { "no" }
        ]);
    }

    table.printstd();
    Ok(())
}

pub async fn run_refine(options: RefineOptions, global: crate::Global) -> Result<()> {
    let style: PromptStyle = options.style.parse()?;
    let instructions = options.instructions.join(" ");
    if instructions.trim().is_empty() {
        return Err(eyre!("Refinement instructions cannot be empty"));
    }

    let settings = Settings::load(&global)?;
    let client = GeminiClient::from_settings(&settings)?;
    let store = SessionStore::from_global(&global)?;

    let session = store.load()?;
    let context_id = session.current_or_err()?.id;
    let current_prompt = session.displayed_prompt(style)?;

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), "Refining prompt...");
    let refined = refine_data(&client, &settings.config, &current_prompt, &instructions).await;
    spinner.finish_and_clear();
    let refined = refined?;

    store.update(|session| {
        if session.current().map(|c| c.id) != Some(context_id) {
            return Err(eyre!(
                "The current context changed while refining, the refinement was discarded"
            ));
        }
        Ok(session.set_refinement(refined.clone())?)
    })?;

    println!("{refined}");
    Ok(())
}

pub async fn run_revert(global: crate::Global) -> Result<()> {
    let store = SessionStore::from_global(&global)?;
    let reverted = store.update(|session| Ok(session.revert_refinement()))?;

    if reverted {
        println!("{}", "Refinement dropped, the styled prompt is shown again.".green());
    } else {
        println!("No refinement to revert.");
    }
    Ok(())
}

/// Ask the text model to rewrite a prompt following the user's instructions.
pub async fn refine_data(
    client: &GeminiClient,
    config: &Config,
    current_prompt: &str,
    instructions: &str,
) -> Result<String> {
    let request = build_refine_request(current_prompt, instructions);
    let response = client.generate_content(&config.models.fast, &request).await?;
    Ok(parse_refined(&response.text())?)
}
