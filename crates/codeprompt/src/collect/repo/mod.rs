//! Repository import over the GitHub, GitLab and Bitbucket REST APIs.
//!
//! Every provider follows the same steps: resolve the default branch, list
//! candidate files, then download them one at a time with a fixed delay.
//! Files that are too large or fail to download are skipped and logged.

use crate::config::Settings;
use crate::prelude::{eprintln, println, *};
use codeprompt_core::config::Config;
use codeprompt_core::error::classify_host_status;
use codeprompt_core::repo::{parse_repo_url, progress_message, Candidate, Provider};
use codeprompt_core::source::{is_within_size_limit, SourceFile};
use codeprompt_core::Error as CoreError;
use colored::Colorize;
use indicatif::ProgressBar;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

mod bitbucket;
mod github;
mod gitlab;

#[derive(Debug, clap::Args)]
pub struct RepoOptions {
    /// Repository URL (github.com, gitlab.com or bitbucket.org)
    #[arg(value_name = "URL")]
    pub url: String,
}

/// Files imported from a repository, plus what was skipped and why.
#[derive(Debug, Serialize)]
pub struct ImportOutput {
    pub repository: String,
    pub provider: String,
    pub branch: String,
    pub files: Vec<SourceFile>,
    pub skipped: Vec<String>,
}

pub async fn run(options: RepoOptions, global: &crate::Global) -> Result<Vec<SourceFile>> {
    let settings = Settings::load(global)?;

    let spinner = new_spinner();
    set_spinner_msg(Some(&spinner), f!("Resolving {}...", options.url));
    let output = import_repository_data(&options.url, &settings.config, Some(&spinner)).await;
    spinner.finish_and_clear();

    let output = output?;
    println!(
        "{} {} ({})",
        "Imported".green().bold(),
        output.repository.bold(),
        output.branch
    );
    if !output.skipped.is_empty() {
        eprintln!(
            "{} {} file(s) skipped",
            "Warning:".yellow().bold(),
            output.skipped.len()
        );
        if global.verbose {
            for entry in &output.skipped {
                eprintln!("  {entry}");
            }
        }
    }

    Ok(output.files)
}

/// Import a repository by URL. Zero downloaded files is an [`CoreError::EmptyImport`].
pub async fn import_repository_data(
    url: &str,
    config: &Config,
    spinner: Option<&ProgressBar>,
) -> Result<ImportOutput> {
    let locator = parse_repo_url(url)?;
    let host = HostClient::new(config, spinner)?;

    log::info!("Importing {locator}");

    let imported = match locator.provider {
        Provider::GitHub => github::import(&host, &locator).await?,
        Provider::GitLab => gitlab::import(&host, &locator).await?,
        Provider::Bitbucket => bitbucket::import(&host, &locator).await?,
    };

    if imported.files.is_empty() {
        return Err(CoreError::EmptyImport(locator.to_string()).into());
    }

    Ok(ImportOutput {
        repository: locator.full_name(),
        provider: locator.provider.to_string(),
        branch: imported.branch,
        files: imported.files,
        skipped: imported.skipped,
    })
}

/// What a provider importer hands back.
struct Imported {
    branch: String,
    files: Vec<SourceFile>,
    skipped: Vec<String>,
}

/// HTTP access shared by the provider importers.
struct HostClient<'a> {
    client: reqwest::Client,
    config: &'a Config,
    spinner: Option<&'a ProgressBar>,
}

impl<'a> HostClient<'a> {
    fn new(config: &'a Config, spinner: Option<&'a ProgressBar>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("codeprompt/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            config,
            spinner,
        })
    }

    /// GET a URL, classifying non-success statuses. `subject` names the resource in errors.
    async fn get(&self, url: &str, subject: &str) -> Result<reqwest::Response> {
        self.send(url, None, subject).await
    }

    /// GET a raw text body. The real body size is checked against the per-file limit.
    async fn get_text(&self, url: &str, accept: Option<&str>, subject: &str) -> Result<String> {
        let bytes = self
            .send(url, accept, subject)
            .await?
            .bytes()
            .await
            .map_err(|e| eyre!("failed to read body: {e}"))?;
        ensure_size(bytes.len() as u64)?;

        String::from_utf8(bytes.to_vec()).map_err(|_| eyre!("content is not valid UTF-8"))
    }

    async fn send(
        &self,
        url: &str,
        accept: Option<&str>,
        subject: &str,
    ) -> Result<reqwest::Response> {
        log::debug!("GET {url}");

        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }
        let response = request
            .send()
            .await
            .map_err(|e| CoreError::ProviderError(f!("{subject}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_host_status(status.as_u16(), subject, &body).into());
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, subject: &str) -> Result<T> {
        self.get(url, subject)
            .await?
            .json::<T>()
            .await
            .map_err(|e| CoreError::ProviderError(f!("{subject}: unexpected response: {e}")).into())
    }

    /// Download candidates one by one, pausing between requests.
    async fn download_all<F, Fut>(
        &self,
        candidates: Vec<Candidate>,
        fetch: F,
    ) -> (Vec<SourceFile>, Vec<String>)
    where
        F: Fn(Candidate) -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let total = candidates.len();
        let delay = Duration::from_millis(self.config.limits.request_delay_ms);
        let mut files = Vec::new();
        let mut skipped = Vec::new();
        let mut requested = false;

        for (index, candidate) in candidates.into_iter().enumerate() {
            set_spinner_msg(self.spinner, progress_message(index, total, &candidate.path));

            if let Some(size) = candidate.size.filter(|size| !is_within_size_limit(*size)) {
                log::warn!("Skipping {}: {size} bytes exceeds the per-file limit", candidate.path);
                skipped.push(f!("{}: too large ({size} bytes)", candidate.path));
                continue;
            }

            if requested && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            requested = true;

            let path = candidate.path.clone();
            match fetch(candidate).await {
                Ok(content) => files.push(SourceFile::new(path, content)),
                Err(e) => {
                    log::warn!("Skipping {path}: {e}");
                    skipped.push(f!("{path}: {e}"));
                }
            }
        }

        (files, skipped)
    }
}

/// Percent-encode each segment of a repository path, keeping the slashes.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reject content above the per-file limit once its real size is known.
fn ensure_size(size: u64) -> Result<()> {
    if is_within_size_limit(size) {
        Ok(())
    } else {
        Err(eyre!("too large ({size} bytes)"))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Configuration pointing every provider at a mock server, without delays.
    pub(crate) fn mock_config(base: &str) -> Config {
        let mut config = Config::default();
        config.endpoints.github = base.to_string();
        config.endpoints.gitlab = base.to_string();
        config.endpoints.bitbucket = base.to_string();
        config.limits.request_delay_ms = 0;
        config
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("src/main.rs"), "src/main.rs");
        assert_eq!(encode_path("docs/my file.md"), "docs/my%20file.md");
    }

    #[test]
    fn test_ensure_size() {
        assert!(ensure_size(10).is_ok());
        assert!(ensure_size(5 * 1024 * 1024 + 1).is_err());
    }

    #[tokio::test]
    async fn test_unsupported_host_fails_before_any_request() {
        let config = Config::default();
        let err = import_repository_data("https://example.com/o/r", &config, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::UnsupportedProvider(_))
        ));

        let err = import_repository_data("https://github.com/only-owner", &config, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InvalidUrl(_))
        ));
    }
}
