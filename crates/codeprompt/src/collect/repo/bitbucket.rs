use super::{encode_path, HostClient, Imported};
use crate::prelude::*;
use codeprompt_core::repo::{
    partition_bitbucket_page, proxied_url, BitbucketRepo, BitbucketSrcPage, Candidate, RepoLocator,
};
use codeprompt_core::Error as CoreError;

pub(super) async fn import(host: &HostClient<'_>, locator: &RepoLocator) -> Result<Imported> {
    let api = host.config.endpoints.bitbucket.trim_end_matches('/');
    let repo = locator.full_name();
    let subject = f!("Bitbucket repository {repo}");

    let metadata: BitbucketRepo = host
        .get_json(&f!("{api}/repositories/{repo}"), &subject)
        .await?;
    let branch = metadata
        .mainbranch
        .map(|b| b.name)
        .ok_or_else(|| CoreError::EmptyImport(locator.to_string()))?;

    let src = f!("{api}/repositories/{repo}/src/{}", urlencoding::encode(&branch));
    let candidates = crawl(host, &src, &subject).await?;
    log::debug!("{} candidate(s) in {repo}", candidates.len());

    let (files, skipped) = host
        .download_all(candidates, |candidate| fetch_file(host, &src, candidate))
        .await;

    Ok(Imported {
        branch,
        files,
        skipped,
    })
}

/// Depth-first walk of the source listing, bounded by depth and candidate count.
///
/// Files of a directory come before the files of its subdirectories, and
/// subdirectories are visited in listing order.
async fn crawl(host: &HostClient<'_>, src: &str, subject: &str) -> Result<Vec<Candidate>> {
    let cap = host.config.limits.bitbucket_cap;
    let max_depth = host.config.limits.bitbucket_max_depth;
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut stack: Vec<(String, usize)> = vec![(String::new(), 0)];

    while let Some((dir, depth)) = stack.pop() {
        set_spinner_msg(
            host.spinner,
            f!("Listing /{dir} ({} found)...", candidates.len()),
        );

        let mut subdirs = Vec::new();
        let mut next = Some(if dir.is_empty() {
            f!("{src}/?pagelen=100")
        } else {
            f!("{src}/{}/?pagelen=100", encode_path(&dir))
        });

        while let Some(url) = next {
            let page: BitbucketSrcPage = host.get_json(&url, subject).await?;
            let (files, dirs) = partition_bitbucket_page(&page);
            candidates.extend(files);
            subdirs.extend(dirs);
            if candidates.len() >= cap {
                candidates.truncate(cap);
                return Ok(candidates);
            }
            next = page.next;
        }

        if depth < max_depth {
            stack.extend(subdirs.into_iter().rev().map(|d| (d, depth + 1)));
        } else if !subdirs.is_empty() {
            log::debug!("Not descending below /{dir}: depth limit reached");
        }
    }

    Ok(candidates)
}

/// Raw file content, routed through the proxy when one is configured.
async fn fetch_file(host: &HostClient<'_>, src: &str, candidate: Candidate) -> Result<String> {
    let target = f!("{src}/{}", encode_path(&candidate.path));
    let url = proxied_url(host.config.endpoints.proxy.as_deref(), &target);

    host.get_text(&url, None, &candidate.path).await
}

#[cfg(test)]
mod tests {
    use super::super::{import_repository_data, tests::mock_config};
    use codeprompt_core::source::SourceFile;
    use codeprompt_core::Error as CoreError;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_repo(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/repositories/ws/demo"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"mainbranch": {"name": "main"}})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_crawls_depth_first_and_follows_next() {
        let server = MockServer::start().await;
        mount_repo(&server).await;
        let next = format!("{}/repositories/ws/demo/src/main/?pagelen=100&page=2", server.uri());
        Mock::given(method("GET"))
            .and(path("/repositories/ws/demo/src/main/"))
            .and(wiremock::matchers::query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [{"path": "setup.py", "type": "commit_file", "size": 5}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/demo/src/main/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    {"path": "README.md", "type": "commit_file", "size": 4},
                    {"path": "pkg", "type": "commit_directory"},
                    {"path": "archive.zip", "type": "commit_file", "size": 10}
                ],
                "next": next
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/demo/src/main/pkg/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [{"path": "pkg/app.py", "type": "commit_file", "size": 3}]
            })))
            .mount(&server)
            .await;
        for (file, body) in [("README.md", "# hi"), ("setup.py", "setup"), ("pkg/app.py", "app")] {
            Mock::given(method("GET"))
                .and(path(format!("/repositories/ws/demo/src/main/{file}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(body))
                .mount(&server)
                .await;
        }

        let config = mock_config(&server.uri());
        let output = import_repository_data("https://bitbucket.org/ws/demo/src/main/", &config, None)
            .await
            .unwrap();

        assert_eq!(output.branch, "main");
        assert_eq!(
            output.files,
            vec![
                SourceFile::new("README.md", "# hi"),
                SourceFile::new("setup.py", "setup"),
                SourceFile::new("pkg/app.py", "app"),
            ]
        );
    }

    #[tokio::test]
    async fn test_depth_limit() {
        let server = MockServer::start().await;
        mount_repo(&server).await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/demo/src/main/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "values": [
                    {"path": "top.rs", "type": "commit_file", "size": 1},
                    {"path": "deep", "type": "commit_directory"}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/demo/src/main/deep/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"values": []})))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/demo/src/main/top.rs"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x"))
            .mount(&server)
            .await;

        let mut config = mock_config(&server.uri());
        config.limits.bitbucket_max_depth = 0;
        let output = import_repository_data("https://bitbucket.org/ws/demo", &config, None)
            .await
            .unwrap();
        assert_eq!(output.files, vec![SourceFile::new("top.rs", "x")]);
    }

    #[tokio::test]
    async fn test_missing_main_branch_is_empty_import() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/ws/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let config = mock_config(&server.uri());
        let err = import_repository_data("https://bitbucket.org/ws/empty", &config, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::EmptyImport(_))
        ));
    }
}
