use super::{ensure_size, HostClient, Imported};
use crate::prelude::*;
use codeprompt_core::repo::{
    decode_encoded_file, select_gitlab_candidates, Candidate, EncodedFile, GitLabProject,
    GitLabTreeEntry, RepoLocator,
};
use codeprompt_core::Error as CoreError;

const NEXT_PAGE_HEADER: &str = "x-next-page";

pub(super) async fn import(host: &HostClient<'_>, locator: &RepoLocator) -> Result<Imported> {
    let api = host.config.endpoints.gitlab.trim_end_matches('/');
    let full_name = locator.full_name();
    let project = urlencoding::encode(&full_name).into_owned();
    let subject = f!("GitLab project {full_name}");

    let metadata: GitLabProject = host
        .get_json(&f!("{api}/projects/{project}"), &subject)
        .await?;
    let branch = metadata
        .default_branch
        .ok_or_else(|| CoreError::EmptyImport(locator.to_string()))?;

    let candidates = list_candidates(host, api, &project, &branch, &subject).await?;
    log::debug!("{} candidate(s) in {full_name}", candidates.len());

    let (files, skipped) = host
        .download_all(candidates, |candidate| {
            fetch_file(host, api, &project, &branch, candidate)
        })
        .await;

    Ok(Imported {
        branch,
        files,
        skipped,
    })
}

/// Walk the paginated tree listing until it is exhausted or the cap is reached.
async fn list_candidates(
    host: &HostClient<'_>,
    api: &str,
    project: &str,
    branch: &str,
    subject: &str,
) -> Result<Vec<Candidate>> {
    let cap = host.config.limits.gitlab_cap;
    let mut candidates = Vec::new();
    let mut page = Some("1".to_string());

    while let Some(current) = page {
        set_spinner_msg(
            host.spinner,
            f!("Listing files (page {current}, {} found)...", candidates.len()),
        );

        let url = f!(
            "{api}/projects/{project}/repository/tree?ref={}&recursive=true&per_page=100&page={current}",
            urlencoding::encode(branch)
        );
        let response = host.get(&url, subject).await?;
        page = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let entries: Vec<GitLabTreeEntry> = response
            .json()
            .await
            .map_err(|e| CoreError::ProviderError(f!("{subject}: unexpected response: {e}")))?;

        candidates.extend(select_gitlab_candidates(&entries));
        if candidates.len() >= cap {
            candidates.truncate(cap);
            break;
        }
    }

    Ok(candidates)
}

async fn fetch_file(
    host: &HostClient<'_>,
    api: &str,
    project: &str,
    branch: &str,
    candidate: Candidate,
) -> Result<String> {
    let url = f!(
        "{api}/projects/{project}/repository/files/{}?ref={}",
        urlencoding::encode(&candidate.path),
        urlencoding::encode(branch)
    );
    let file: EncodedFile = host.get_json(&url, &candidate.path).await?;
    if let Some(size) = file.size {
        ensure_size(size)?;
    }
    decode_encoded_file(&file).map_err(|e| eyre!(e))
}
