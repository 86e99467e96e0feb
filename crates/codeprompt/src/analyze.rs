use crate::config::Settings;
use crate::gemini::GeminiClient;
use crate::prelude::{eprintln, println, *};
use crate::store::SessionStore;
use codeprompt_core::analysis::{
    build_analysis_request, build_grounding_request, extract_grounding_links, parse_analysis,
    AnalysisResult, GroundingLink,
};
use codeprompt_core::config::Config;
use codeprompt_core::session::{AnalysisTicket, GenerationContext};
use codeprompt_core::source::{build_blob, truncate_blob};
use colored::Colorize;

#[derive(Debug, clap::Args)]
pub struct AnalyzeOptions {
    /// What you want the assistant to do with the code
    #[arg(short, long, default_value = "")]
    pub task: String,

    /// Use the deeper (slower) reasoning model
    #[arg(long)]
    pub deep: bool,

    /// Look up documentation links for the first dependencies
    #[arg(long)]
    pub ground: bool,
}

pub async fn run(options: AnalyzeOptions, global: crate::Global) -> Result<()> {
    let settings = Settings::load(&global)?;
    let client = GeminiClient::from_settings(&settings)?;
    let store = SessionStore::from_global(&global)?;

    if global.verbose {
        let (model, budget) = settings.config.model_profile(options.deep);
        eprintln!("Model: {model} (thinking budget {budget})");
    }

    let (ticket, blob) = begin(&store)?;

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), "Analyzing code...");
    let analysis = analyze_data(&client, &settings.config, &blob, options.deep).await;
    spinner.finish_and_clear();

    let context = finish(&store, ticket, analysis?, blob, options.task)?;
    let mut links = Vec::new();

    if options.ground {
        let spinner = new_spinner();
        set_spinner_msg(Some(&spinner), "Finding documentation links...");
        links = ground_data(&client, &settings.config, &context.analysis.dependencies).await;
        spinner.finish_and_clear();

        let grounded = links.clone();
        store.update(|session| Ok(session.attach_grounding(context.id, grounded)?))?;
    }

    println!("{}", format_analysis(&context, &links));
    Ok(())
}

/// Issue a ticket for a new analysis and snapshot the blob it will cover.
pub fn begin(store: &SessionStore) -> Result<(AnalysisTicket, String)> {
    store.update(|session| {
        if session.files().is_empty() {
            return Err(Error::NoFiles.into());
        }
        let blob = build_blob(session.files());
        Ok((session.begin_analysis(), blob))
    })
}

/// Record the analysis as the new current context, unless a newer analysis started meanwhile.
pub fn finish(
    store: &SessionStore,
    ticket: AnalysisTicket,
    analysis: AnalysisResult,
    code: String,
    task: String,
) -> Result<GenerationContext> {
    store.update(|session| {
        let context =
            session.complete_analysis(ticket, analysis, code, task, chrono::Utc::now())?;
        Ok(context.clone())
    })
}

/// Run the analysis request on a blob, truncated to the configured budget.
pub async fn analyze_data(
    client: &GeminiClient,
    config: &Config,
    blob: &str,
    deep: bool,
) -> Result<AnalysisResult> {
    let blob = truncate_blob(blob, config.limits.max_blob_chars);
    let (model, thinking_budget) = config.model_profile(deep);
    log::debug!("Analyzing {} chars with {model}", blob.len());

    let request = build_analysis_request(&blob, thinking_budget);
    let response = client.generate_content(model, &request).await?;
    Ok(parse_analysis(&response.text())?)
}

/// Documentation links for the first dependencies. Failures yield no links.
pub async fn ground_data(
    client: &GeminiClient,
    config: &Config,
    dependencies: &[String],
) -> Vec<GroundingLink> {
    let Some(request) = build_grounding_request(dependencies) else {
        return Vec::new();
    };

    match client.generate_content(&config.models.fast, &request).await {
        Ok(response) => extract_grounding_links(&response),
        Err(e) => {
            log::warn!("Grounding failed: {e}");
            Vec::new()
        }
    }
}

fn format_analysis(context: &GenerationContext, links: &[GroundingLink]) -> String {
    let analysis = &context.analysis;
    let mut out = String::new();

    out.push_str(&f!(
        "\n{} {}\n",
        "Analysis".bright_cyan().bold(),
        context.short_id().bright_black()
    ));
    out.push_str(&f!("  {}: {}\n", "Role".green(), analysis.role));
    out.push_str(&f!(
        "  {}: {}\n",
        "Stack".green(),
        analysis.language_framework
    ));
    out.push_str(&f!(
        "  {}: {}\n",
        "Objective".green(),
        analysis.main_objective
    ));

    if !analysis.key_features.is_empty() {
        out.push_str(&f!("  {}:\n", "Features".green()));
        for feature in &analysis.key_features {
            out.push_str(&f!("    - {feature}\n"));
        }
    }

    if !analysis.dependencies.is_empty() {
        out.push_str(&f!(
            "  {}: {}\n",
            "Dependencies".green(),
            analysis.dependencies.join(", ")
        ));
    }

    if !links.is_empty() {
        out.push_str(&f!("  {}:\n", "References".green()));
        for link in links {
            out.push_str(&f!("    - {} {}\n", link.title, link.url.cyan().underline()));
        }
    }

    out.push_str(&f!(
        "\n{} {}\n",
        "Next:".bright_white().bold(),
        "codeprompt prompt --style technical".cyan()
    ));
    out
}
