use crate::prelude::eprintln;
use codeprompt_core::analysis::AnalysisResult;
use codeprompt_core::style::{render, PromptStyle};
use serde::{Deserialize, Serialize};

use super::{json_result, parse_arguments, JsonRpcError};

#[derive(Debug, Serialize)]
struct FormatPromptOutput {
    style: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StyleInfo {
    name: &'static str,
    description: &'static str,
    supports_references: bool,
}

pub async fn handle_format_prompt(
    arguments: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    #[derive(Deserialize)]
    struct FormatPromptArgs {
        analysis: AnalysisResult,
        code: String,
        #[serde(default)]
        task: String,
        style: Option<String>,
    }

    let args: FormatPromptArgs = parse_arguments(arguments)?;
    let style: PromptStyle = match args.style.as_deref() {
        Some(name) => name.parse().map_err(|e| {
            JsonRpcError::new(JsonRpcError::INVALID_PARAMS, format!("Invalid arguments: {e}"))
        })?,
        None => PromptStyle::default(),
    };

    if global.verbose {
        eprintln!("Calling format_prompt: style={style}");
    }

    let prompt = render(style, &args.analysis, &args.code, &args.task);
    json_result(&FormatPromptOutput {
        style: style.name().to_string(),
        prompt,
    })
}

pub async fn handle_list_styles(
    _arguments: Option<serde_json::Value>,
    _global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    let styles: Vec<StyleInfo> = PromptStyle::ALL
        .into_iter()
        .map(|style| StyleInfo {
            name: style.name(),
            description: style.description(),
            supports_references: style.supports_references(),
        })
        .collect();

    json_result(&styles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tests::global;

    fn text_of(value: &serde_json::Value) -> serde_json::Value {
        serde_json::from_str(value["content"][0]["text"].as_str().unwrap()).unwrap()
    }

    fn analysis_json() -> serde_json::Value {
        serde_json::json!({
            "role": "Python Developer",
            "languageFramework": "Python",
            "mainObjective": "Print one",
            "technicalPurpose": "Demo.",
            "keyFeatures": ["Printing"],
            "structureClasses": [],
            "structureFunctions": [],
            "dependencies": []
        })
    }

    #[tokio::test]
    async fn test_format_prompt() {
        let value = handle_format_prompt(
            Some(serde_json::json!({
                "analysis": analysis_json(),
                "code": "print(1)",
                "style": "concise"
            })),
            &global(),
        )
        .await
        .unwrap();

        let output = text_of(&value);
        assert_eq!(output["style"], "concise");
        let prompt = output["prompt"].as_str().unwrap();
        assert!(prompt.contains("Python"));
        assert!(prompt.contains("print(1)"));
    }

    #[tokio::test]
    async fn test_format_prompt_rejects_unknown_style() {
        let err = handle_format_prompt(
            Some(serde_json::json!({
                "analysis": analysis_json(),
                "code": "x",
                "style": "shakespeare"
            })),
            &global(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_list_styles() {
        let value = handle_list_styles(None, &global()).await.unwrap();
        let styles = text_of(&value);
        let styles = styles.as_array().unwrap();
        assert_eq!(styles.len(), 8);
        assert_eq!(styles[0]["name"], "technical");
        assert_eq!(styles[0]["supportsReferences"], true);
    }
}
