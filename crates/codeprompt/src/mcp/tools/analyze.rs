use crate::analyze::{analyze_data, ground_data};
use crate::config::Settings;
use crate::gemini::GeminiClient;
use crate::prelude::eprintln;
use codeprompt_core::analysis::AnalysisResult;
use codeprompt_core::source::{build_blob, SourceFile};
use serde::{Deserialize, Serialize};

use super::{execution_error, json_result, parse_arguments, JsonRpcError};

#[derive(Debug, Serialize)]
struct AnalyzeCodeOutput {
    analysis: AnalysisResult,
    /// The delimited blob that was analyzed, ready for `format_prompt`.
    code: String,
}

pub async fn handle_analyze_code(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct AnalyzeCodeArgs {
        files: Option<Vec<SourceFile>>,
        code: Option<String>,
        #[serde(default)]
        deep: bool,
        #[serde(default)]
        ground: bool,
    }

    let args: AnalyzeCodeArgs = parse_arguments(arguments)?;
    let files = input_files(args.files, args.code)?;

    if global.verbose {
        eprintln!(
            "Calling analyze_code: {} file(s), deep={}, ground={}",
            files.len(),
            args.deep,
            args.ground
        );
    }

    let settings = Settings::load(global).map_err(execution_error)?;
    let client = GeminiClient::from_settings(&settings).map_err(execution_error)?;

    let code = build_blob(&files);
    let mut analysis = analyze_data(&client, &settings.config, &code, args.deep)
        .await
        .map_err(execution_error)?;

    if args.ground {
        analysis.grounding_links =
            Some(ground_data(&client, &settings.config, &analysis.dependencies).await);
    }

    json_result(&AnalyzeCodeOutput { analysis, code })
}

/// Files to analyze: the `files` list, else `code` as a single pasted file.
fn input_files(
    files: Option<Vec<SourceFile>>,
    code: Option<String>,
) -> Result<Vec<SourceFile>, JsonRpcError> {
    let files = match (files, code) {
        (Some(files), _) if !files.is_empty() => files,
        (_, Some(code)) if !code.trim().is_empty() => {
            vec![SourceFile::new("pasted_code.txt", code)]
        }
        _ => Vec::new(),
    };

    if files.is_empty() {
        return Err(JsonRpcError::new(
            JsonRpcError::INVALID_PARAMS,
            "Invalid arguments: provide a non-empty `files` list or `code`",
        ));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tests::global;

    #[test]
    fn test_input_files() {
        let files = input_files(None, Some("print(1)".to_string())).unwrap();
        assert_eq!(files, vec![SourceFile::new("pasted_code.txt", "print(1)")]);

        let given = vec![SourceFile::new("a.rs", "fn a() {}")];
        assert_eq!(
            input_files(Some(given.clone()), Some("ignored".to_string())).unwrap(),
            given
        );

        let err = input_files(Some(vec![]), None).unwrap_err();
        assert_eq!(err.code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unreadable_config_is_execution_error() {
        let mut global = global();
        global.config = Some(std::path::PathBuf::from("/nonexistent/codeprompt.toml"));
        let err = handle_analyze_code(Some(serde_json::json!({"code": "x"})), &global)
            .await
            .unwrap_err();
        assert_eq!(err.code, JsonRpcError::INTERNAL_ERROR);
    }
}
