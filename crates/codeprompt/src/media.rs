use crate::config::Settings;
use crate::gemini::GeminiClient;
use crate::prelude::{println, *};
use crate::store::SessionStore;
use codeprompt_core::analysis::AnalysisResult;
use codeprompt_core::config::Config;
use codeprompt_core::gemini::{
    interpret_operation, redact_api_key, with_api_key, GenerateContentRequest, GenerationConfig,
    PollOutcome, PredictRequest,
};
use codeprompt_core::media::{
    audio_data_uri, data_uri, decode_data_uri, logo_prompt, narration_text, video_prompt,
    MediaKind,
};
use codeprompt_core::Error as CoreError;
use colored::Colorize;
use indicatif::ProgressBar;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, clap::Parser)]
#[command(name = "media")]
#[command(about = "Creative media for the current context")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Generate a logo image
    #[clap(name = "logo")]
    Logo,

    /// Generate a spoken project summary
    #[clap(name = "audio")]
    Audio,

    /// Generate a short video pitch (takes a few minutes)
    #[clap(name = "video")]
    Video,

    /// Write generated media to a file
    #[clap(name = "save")]
    Save(SaveOptions),
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum MediaArg {
    Logo,
    Audio,
    Video,
}

impl From<MediaArg> for MediaKind {
    fn from(arg: MediaArg) -> Self {
        match arg {
            MediaArg::Logo => MediaKind::Logo,
            MediaArg::Audio => MediaKind::Audio,
            MediaArg::Video => MediaKind::Video,
        }
    }
}

#[derive(Debug, clap::Args)]
pub struct SaveOptions {
    /// Which media to save
    #[arg(value_enum)]
    pub kind: MediaArg,

    /// Destination file
    #[arg(short, long)]
    pub out: PathBuf,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let kind = match app.command {
        Commands::Logo => MediaKind::Logo,
        Commands::Audio => MediaKind::Audio,
        Commands::Video => MediaKind::Video,
        Commands::Save(options) => return save(options, global).await,
    };

    let settings = Settings::load(&global)?;
    let client = GeminiClient::from_settings(&settings)?;
    let store = SessionStore::from_global(&global)?;

    let session = store.load()?;
    let context = session.current_or_err()?.clone();
    session.ensure_media_unset(context.id, kind)?;

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), f!("Generating {kind}..."));
    let url = generate_media(&client, &settings.config, kind, &context.analysis, Some(&spinner)).await;
    spinner.finish_and_clear();
    let url = url?;

    // Attach by id, the selection may have changed while generating.
    store.update(|session| Ok(session.attach_media(context.id, kind, url.clone())?))?;

    println!(
        "{} {} for {}",
        "Generated".green().bold(),
        kind,
        context.short_id().bright_black()
    );
    if kind == MediaKind::Video {
        println!("  {}", redact_api_key(&url).cyan().underline());
    }
    println!(
        "Run {} to write it to a file.",
        f!("codeprompt media save {} --out <FILE>", kind_arg(kind)).cyan()
    );
    Ok(())
}

fn kind_arg(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Logo => "logo",
        MediaKind::Audio => "audio",
        MediaKind::Video => "video",
    }
}

/// Generate one media item and return the URL to store on the context.
pub async fn generate_media(
    client: &GeminiClient,
    config: &Config,
    kind: MediaKind,
    analysis: &AnalysisResult,
    spinner: Option<&ProgressBar>,
) -> Result<String> {
    match kind {
        MediaKind::Logo => generate_logo(client, config, analysis).await,
        MediaKind::Audio => generate_audio(client, config, analysis).await,
        MediaKind::Video => {
            let interval = Duration::from_secs(config.limits.video_poll_interval_secs);
            generate_video(client, config, analysis, interval, spinner).await
        }
    }
}

async fn generate_logo(
    client: &GeminiClient,
    config: &Config,
    analysis: &AnalysisResult,
) -> Result<String> {
    let request = PredictRequest::image(logo_prompt(analysis));
    let response = client.predict(&config.models.image, &request).await?;

    let prediction = response
        .predictions
        .into_iter()
        .find(|p| p.bytes_base64_encoded.is_some())
        .ok_or(CoreError::EmptyResponse)?;

    let mime = prediction
        .mime_type
        .unwrap_or_else(|| "image/png".to_string());
    let bytes = prediction.bytes_base64_encoded.unwrap_or_default();
    Ok(data_uri(&mime, &bytes))
}

async fn generate_audio(
    client: &GeminiClient,
    config: &Config,
    analysis: &AnalysisResult,
) -> Result<String> {
    let request = GenerateContentRequest::user_text(narration_text(analysis)).with_config(
        GenerationConfig {
            response_modalities: Some(vec!["AUDIO".to_string()]),
            speech_config: Some(serde_json::json!({
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": config.models.voice }
                }
            })),
            ..GenerationConfig::default()
        },
    );

    let response = client.generate_content(&config.models.speech, &request).await?;
    let audio = response.inline_data().ok_or(CoreError::EmptyResponse)?;

    audio_data_uri(&audio.mime_type, &audio.data)
        .map_err(|e| CoreError::ProviderError(e).into())
}

/// Start a video operation and poll it until it finishes.
///
/// The returned URI carries the API key, which the file service requires.
pub async fn generate_video(
    client: &GeminiClient,
    config: &Config,
    analysis: &AnalysisResult,
    interval: Duration,
    spinner: Option<&ProgressBar>,
) -> Result<String> {
    let request = PredictRequest::video(video_prompt(analysis));
    let mut operation = client
        .predict_long_running(&config.models.video, &request)
        .await?;
    log::debug!("Video operation started: {}", operation.name);

    let started = Instant::now();
    loop {
        match interpret_operation(&operation)? {
            PollOutcome::Ready(uri) => return Ok(with_api_key(&uri, client.api_key())),
            PollOutcome::Pending => {
                set_spinner_msg(
                    spinner,
                    f!(
                        "Generating video pitch ({}s elapsed)...",
                        started.elapsed().as_secs()
                    ),
                );
                tokio::time::sleep(interval).await;
                operation = client.get_operation(&operation.name).await?;
            }
        }
    }
}

async fn save(options: SaveOptions, global: crate::Global) -> Result<()> {
    let kind = MediaKind::from(options.kind);
    let session = SessionStore::from_global(&global)?.load()?;
    let context = session.current_or_err()?;
    let url = context
        .media(kind)
        .ok_or_else(|| eyre!("No {kind} has been generated for the current context"))?;

    let bytes = media_bytes(url).await?;
    std::fs::write(&options.out, &bytes)
        .with_context(|| f!("Failed to write {}", options.out.display()))?;

    println!(
        "{} {} ({} bytes)",
        "Saved".green().bold(),
        options.out.display(),
        bytes.len()
    );
    Ok(())
}

/// Bytes behind a stored media URL: decoded for data URIs, downloaded otherwise.
pub async fn media_bytes(url: &str) -> Result<Vec<u8>> {
    if url.starts_with("data:") {
        return decode_data_uri(url)
            .map(|(_, bytes)| bytes)
            .ok_or_else(|| eyre!("Stored media is not a valid data URI"));
    }

    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::Network(f!("failed to download media: {e}")))?;
    if !response.status().is_success() {
        let status = response.status();
        return Err(Error::Network(f!("media download failed [{status}]")).into());
    }

    Ok(response
        .bytes()
        .await
        .map_err(|e| eyre!("Failed to read media: {}", e))?
        .to_vec())
}
