use crate::config::Settings;
use crate::prelude::{eprintln, *};
use codeprompt_core::repo::proxied_url;
use codeprompt_core::source::{is_blocked_path, is_within_size_limit, SourceFile};
use futures::future::join_all;
use serde::Serialize;

#[derive(Debug, clap::Args)]
pub struct UrlOptions {
    /// Raw file URLs to fetch
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,
}

/// Result of a batch of raw URL fetches: every success plus one message per failure.
#[derive(Debug, Serialize)]
pub struct UrlFetchOutput {
    pub files: Vec<SourceFile>,
    pub errors: Vec<String>,
}

pub async fn run(options: UrlOptions, global: &crate::Global) -> Result<Vec<SourceFile>> {
    let settings = Settings::load(global)?;
    let proxy = settings.config.endpoints.proxy.as_deref();

    if global.verbose {
        eprintln!("Fetching {} URL(s)...", options.urls.len());
    }

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), f!("Fetching {} URL(s)...", options.urls.len()));
    let output = fetch_urls_data(&options.urls, proxy).await;
    spinner.finish_and_clear();

    let output = output?;
    if !output.errors.is_empty() {
        eprintln!(
            "Warning: {} of {} URL(s) failed:\n{}",
            output.errors.len(),
            options.urls.len(),
            output.errors.join("\n")
        );
    }

    Ok(output.files)
}

/// Fetch every URL concurrently and wait for all of them.
///
/// Successes keep the input order. The call only fails when no URL succeeded.
pub async fn fetch_urls_data(urls: &[String], proxy: Option<&str>) -> Result<UrlFetchOutput> {
    if urls.is_empty() {
        return Err(eyre!("No URLs given"));
    }

    let client = reqwest::Client::new();
    let results = join_all(urls.iter().map(|url| fetch_one(&client, url, proxy))).await;

    let mut files = Vec::new();
    let mut errors = Vec::new();
    for (url, result) in urls.iter().zip(results) {
        match result {
            Ok(file) => files.push(file),
            Err(e) => {
                log::warn!("Failed to fetch {url}: {e}");
                errors.push(f!("{url}: {e}"));
            }
        }
    }

    if files.is_empty() {
        return Err(eyre!("Failed to fetch any URL:\n{}", errors.join("\n")));
    }

    Ok(UrlFetchOutput { files, errors })
}

/// Name recorded for a fetched URL: its last path segment.
pub fn file_name_for_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                .map(|segment| {
                    urlencoding::decode(segment)
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| segment.to_string())
                })
        })
        .unwrap_or_else(|| url.to_string())
}

async fn fetch_one(client: &reqwest::Client, url: &str, proxy: Option<&str>) -> Result<SourceFile> {
    let name = file_name_for_url(url);
    if is_blocked_path(&name) {
        return Err(eyre!("blocked file type"));
    }

    let response = client
        .get(proxied_url(proxy, url))
        .send()
        .await
        .map_err(|e| Error::Network(f!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Network(f!("HTTP {status}")).into());
    }

    if let Some(length) = response.content_length() {
        if !is_within_size_limit(length) {
            return Err(eyre!("{length} bytes exceeds the per-file limit"));
        }
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| eyre!("failed to read body: {e}"))?;
    if !is_within_size_limit(bytes.len() as u64) {
        return Err(eyre!("{} bytes exceeds the per-file limit", bytes.len()));
    }

    let content = String::from_utf8(bytes.to_vec()).map_err(|_| eyre!("not valid UTF-8"))?;
    Ok(SourceFile::new(name, content))
}
