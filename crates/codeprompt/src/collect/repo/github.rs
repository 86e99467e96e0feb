use super::{encode_path, HostClient, Imported};
use crate::prelude::*;
use codeprompt_core::repo::{
    select_github_candidates, Candidate, GitHubRepo, GitHubTree, RepoLocator,
};

/// Media type that makes the contents API return the file body itself.
/// The JSON form leaves `content` empty for files over 1 MB.
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

pub(super) async fn import(host: &HostClient<'_>, locator: &RepoLocator) -> Result<Imported> {
    let api = host.config.endpoints.github.trim_end_matches('/');
    let repo = locator.full_name();
    let subject = f!("GitHub repository {repo}");

    let metadata: GitHubRepo = host
        .get_json(&f!("{api}/repos/{repo}"), &subject)
        .await?;
    let branch = metadata.default_branch;

    set_spinner_msg(host.spinner, f!("Listing {repo}@{branch}..."));
    let tree: GitHubTree = host
        .get_json(
            &f!("{api}/repos/{repo}/git/trees/{}?recursive=1", encode_path(&branch)),
            &subject,
        )
        .await?;
    if tree.truncated {
        log::warn!("GitHub truncated the tree listing for {repo}");
    }

    let candidates = select_github_candidates(&tree, host.config.limits.github_cap);
    log::debug!("{} candidate(s) in {repo}", candidates.len());

    let (files, skipped) = host
        .download_all(candidates, |candidate| {
            fetch_file(host, api, &repo, &branch, candidate)
        })
        .await;

    Ok(Imported {
        branch,
        files,
        skipped,
    })
}

async fn fetch_file(
    host: &HostClient<'_>,
    api: &str,
    repo: &str,
    branch: &str,
    candidate: Candidate,
) -> Result<String> {
    let url = f!(
        "{api}/repos/{repo}/contents/{}?ref={}",
        encode_path(&candidate.path),
        urlencoding::encode(branch)
    );
    host.get_text(&url, Some(RAW_MEDIA_TYPE), &candidate.path).await
}
