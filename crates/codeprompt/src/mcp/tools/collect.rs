use crate::config::Settings;
use crate::prelude::eprintln;
use serde::Deserialize;

use super::{execution_error, json_result, parse_arguments, JsonRpcError};

pub async fn handle_import_repository(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct ImportRepositoryArgs {
        url: String,
    }

    let args: ImportRepositoryArgs = parse_arguments(arguments)?;

    if global.verbose {
        eprintln!("Calling import_repository: url={}", args.url);
    }

    let settings = Settings::load(global).map_err(execution_error)?;
    let output = crate::collect::import_repository_data(&args.url, &settings.config, None)
        .await
        .map_err(execution_error)?;

    json_result(&output)
}

pub async fn handle_fetch_urls(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct FetchUrlsArgs {
        urls: Vec<String>,
    }

    let args: FetchUrlsArgs = parse_arguments(arguments)?;

    if global.verbose {
        eprintln!("Calling fetch_urls: {} url(s)", args.urls.len());
    }

    let settings = Settings::load(global).map_err(execution_error)?;
    let output =
        crate::collect::fetch_urls_data(&args.urls, settings.config.endpoints.proxy.as_deref())
            .await
            .map_err(execution_error)?;

    json_result(&output)
}
