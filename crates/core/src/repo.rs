//! Transformation functions for git hosting APIs
//!
//! URL parsing, provider detection, API response types and candidate
//! selection for GitHub, GitLab and Bitbucket. The shell performs the
//! requests; everything here is pure.

use base64::Engine;
use serde::Deserialize;

use crate::error::Error;
use crate::source::{is_blocked_path, is_within_size_limit};

/// Supported git hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    GitHub,
    GitLab,
    Bitbucket,
}

impl Provider {
    /// Map a hostname to a provider. A leading `www.` is ignored.
    pub fn from_host(host: &str) -> Result<Self, Error> {
        let host = host.to_ascii_lowercase();
        match host.strip_prefix("www.").unwrap_or(&host) {
            "github.com" => Ok(Provider::GitHub),
            "gitlab.com" => Ok(Provider::GitLab),
            "bitbucket.org" => Ok(Provider::Bitbucket),
            other => Err(Error::UnsupportedProvider(other.to_string())),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::GitHub => write!(f, "GitHub"),
            Provider::GitLab => write!(f, "GitLab"),
            Provider::Bitbucket => write!(f, "Bitbucket"),
        }
    }
}

/// A repository identified on a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocator {
    pub provider: Provider,
    /// Owner, organization or workspace. For GitLab this includes subgroups.
    pub owner: String,
    pub name: String,
}

impl RepoLocator {
    /// `owner/name`, the form every provider's API expects.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.provider, self.full_name())
    }
}

/// Parse a repository URL such as `https://github.com/owner/repo.git`.
///
/// GitHub and Bitbucket use the first two path segments (anything after them,
/// like `/tree/main/src`, is ignored). GitLab keeps every segment up to a
/// `/-/` separator so subgroup paths survive.
pub fn parse_repo_url(input: &str) -> Result<RepoLocator, Error> {
    let parsed =
        url::Url::parse(input.trim()).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| Error::InvalidUrl(format!("{input}: missing host")))?;
    let provider = Provider::from_host(host)?;

    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let segments: Vec<&str> = match provider {
        Provider::GitLab => segments.into_iter().take_while(|seg| *seg != "-").collect(),
        Provider::GitHub | Provider::Bitbucket => segments.into_iter().take(2).collect(),
    };

    if segments.len() < 2 {
        return Err(Error::InvalidUrl(format!(
            "{input}: expected at least an owner and a repository name"
        )));
    }

    let (name, owner) = segments
        .split_last()
        .ok_or_else(|| Error::InvalidUrl(input.to_string()))?;
    let name = name.strip_suffix(".git").unwrap_or(name);
    if name.is_empty() {
        return Err(Error::InvalidUrl(format!("{input}: empty repository name")));
    }

    Ok(RepoLocator {
        provider,
        owner: owner.join("/"),
        name: name.to_string(),
    })
}

// =============================================================================
// API Response Types (Deserialization)
// =============================================================================

/// `GET /repos/{owner}/{repo}` on GitHub.
#[derive(Debug, Deserialize, Clone)]
pub struct GitHubRepo {
    pub default_branch: String,
}

/// `GET /repos/{owner}/{repo}/git/trees/{ref}?recursive=1` on GitHub.
#[derive(Debug, Deserialize, Clone)]
pub struct GitHubTree {
    pub tree: Vec<GitHubTreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GitHubTreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String, // blob, tree, commit
    #[serde(default)]
    pub size: Option<u64>,
}

/// `GET /projects/{id}` on GitLab.
#[derive(Debug, Deserialize, Clone)]
pub struct GitLabProject {
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// One entry of `GET /projects/{id}/repository/tree` on GitLab.
#[derive(Debug, Deserialize, Clone)]
pub struct GitLabTreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String, // blob, tree
}

/// `GET /repos/.../contents/{path}` on GitHub and
/// `GET /projects/{id}/repository/files/{path}` on GitLab share this shape.
#[derive(Debug, Deserialize, Clone)]
pub struct EncodedFile {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// `GET /repositories/{workspace}/{repo}` on Bitbucket.
#[derive(Debug, Deserialize, Clone)]
pub struct BitbucketRepo {
    #[serde(default)]
    pub mainbranch: Option<BitbucketBranch>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BitbucketBranch {
    pub name: String,
}

/// Paginated `GET /repositories/{w}/{r}/src/{ref}/{path}/` on Bitbucket.
#[derive(Debug, Deserialize, Clone)]
pub struct BitbucketSrcPage {
    pub values: Vec<BitbucketSrcEntry>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BitbucketSrcEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String, // commit_file, commit_directory
    #[serde(default)]
    pub size: Option<u64>,
}

// =============================================================================
// Output Domain Types
// =============================================================================

/// A file chosen for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    /// Size reported by the listing, when the provider reports one.
    pub size: Option<u64>,
}

// =============================================================================
// Pure Transformation Functions
// =============================================================================

/// Whether a listed file may be downloaded: not blocked and not oversized.
pub fn is_eligible(path: &str, size: Option<u64>) -> bool {
    !is_blocked_path(path) && size.map_or(true, is_within_size_limit)
}

/// Pick up to `cap` eligible blobs from a recursive GitHub tree, in tree order.
pub fn select_github_candidates(tree: &GitHubTree, cap: usize) -> Vec<Candidate> {
    tree.tree
        .iter()
        .filter(|entry| entry.entry_type == "blob" && !is_blocked_path(&entry.path))
        .take(cap)
        .map(|entry| Candidate {
            path: entry.path.clone(),
            size: entry.size,
        })
        .collect()
}

/// Pick eligible blobs from one page of a GitLab tree listing.
pub fn select_gitlab_candidates(entries: &[GitLabTreeEntry]) -> Vec<Candidate> {
    entries
        .iter()
        .filter(|entry| entry.entry_type == "blob" && !is_blocked_path(&entry.path))
        .map(|entry| Candidate {
            path: entry.path.clone(),
            size: None,
        })
        .collect()
}

/// Split a Bitbucket listing page into eligible files and subdirectories.
pub fn partition_bitbucket_page(page: &BitbucketSrcPage) -> (Vec<Candidate>, Vec<String>) {
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    for entry in &page.values {
        match entry.entry_type.as_str() {
            "commit_directory" => dirs.push(entry.path.clone()),
            "commit_file" if !is_blocked_path(&entry.path) => files.push(Candidate {
                path: entry.path.clone(),
                size: entry.size,
            }),
            _ => {}
        }
    }

    (files, dirs)
}

/// Decode a base64 payload (line breaks allowed) as UTF-8 text.
pub fn decode_base64_content(encoded: &str) -> Result<String, String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| format!("invalid base64: {e}"))?;
    String::from_utf8(bytes).map_err(|_| "content is not valid UTF-8".to_string())
}

/// Extract the text of a GitLab files API response, decoding base64 when flagged.
pub fn decode_encoded_file(file: &EncodedFile) -> Result<String, String> {
    match file.encoding.as_deref() {
        Some("base64") => decode_base64_content(&file.content),
        Some("text") | Some("utf-8") | None => Ok(file.content.clone()),
        Some(other) => Err(format!("unsupported encoding: {other}")),
    }
}

/// Human readable progress line for file downloads.
pub fn progress_message(index: usize, total: usize, path: &str) -> String {
    format!("Downloading {}/{}: {}", index + 1, total, path)
}

/// Route a URL through an optional proxy prefix.
pub fn proxied_url(proxy: Option<&str>, target: &str) -> String {
    match proxy {
        Some(prefix) if !prefix.is_empty() => {
            format!("{prefix}{}", urlencoding::encode(target))
        }
        _ => target.to_string(),
    }
}
