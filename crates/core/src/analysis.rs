//! Structured code analysis
//!
//! The analysis schema sent to the model, the prompts for analysis and
//! grounding, and the pure functions that turn model output into an
//! [`AnalysisResult`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::Error;
use crate::gemini::{
    GenerateContentRequest, GenerateContentResponse, GenerationConfig, ThinkingConfig, Tool,
};

/// Only the first few dependencies are sent for grounding.
pub const MAX_GROUNDED_DEPENDENCIES: usize = 5;

const ANALYSIS_SYSTEM: &str = "\
You are a senior software architect. You receive the full source of a project, \
with every file framed by a `--- FILE: <path> (<n> bytes) ---` header. \
Describe the project precisely and concisely so another AI assistant could continue working on it.

Rules:
- role: the expert persona best suited to work on this code (e.g. \"Senior Rust Engineer\").
- languageFramework: main language plus notable frameworks.
- mainObjective: one sentence on what the project does for its users.
- technicalPurpose: two or three sentences on how it works internally.
- keyFeatures: short phrases, most important first.
- structureClasses / structureFunctions: names of the main types and functions.
- dependencies: external libraries or services the code relies on.
- Answer with JSON only.";

/// Web citation attached to an analysis by the grounding step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingLink {
    pub title: String,
    pub url: String,
}

/// Structured description of a code base produced by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub role: String,
    pub language_framework: String,
    pub main_objective: String,
    pub technical_purpose: String,
    pub key_features: Vec<String>,
    pub structure_classes: Vec<String>,
    pub structure_functions: Vec<String>,
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_links: Option<Vec<GroundingLink>>,
}

impl AnalysisResult {
    /// Grounding links, or an empty slice when grounding never ran.
    pub fn links(&self) -> &[GroundingLink] {
        self.grounding_links.as_deref().unwrap_or(&[])
    }
}

/// JSON schema the model must follow: 8 required fields, 4 string arrays.
pub fn analysis_schema() -> serde_json::Value {
    let string_array = serde_json::json!({ "type": "ARRAY", "items": { "type": "STRING" } });
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "role": { "type": "STRING" },
            "languageFramework": { "type": "STRING" },
            "mainObjective": { "type": "STRING" },
            "technicalPurpose": { "type": "STRING" },
            "keyFeatures": string_array,
            "structureClasses": string_array,
            "structureFunctions": string_array,
            "dependencies": string_array
        },
        "required": [
            "role",
            "languageFramework",
            "mainObjective",
            "technicalPurpose",
            "keyFeatures",
            "structureClasses",
            "structureFunctions",
            "dependencies"
        ],
        "propertyOrdering": [
            "role",
            "languageFramework",
            "mainObjective",
            "technicalPurpose",
            "keyFeatures",
            "structureClasses",
            "structureFunctions",
            "dependencies"
        ]
    })
}

/// Build the analysis request for an already truncated blob.
pub fn build_analysis_request(blob: &str, thinking_budget: i32) -> GenerateContentRequest {
    GenerateContentRequest::user_text(format!("Analyze this code base:\n\n{blob}"))
        .with_system(ANALYSIS_SYSTEM)
        .with_config(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(analysis_schema()),
            thinking_config: Some(ThinkingConfig { thinking_budget }),
            ..GenerationConfig::default()
        })
}

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n(.*?)\n?```$").expect("valid fence regex")
});

/// Remove a surrounding markdown fence (```json ... ```), if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    match CODE_FENCE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parse raw model output into an [`AnalysisResult`].
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, Error> {
    let text = strip_code_fence(raw);
    if text.is_empty() {
        return Err(Error::EmptyResponse);
    }

    let mut result: AnalysisResult =
        serde_json::from_str(text).map_err(|e| Error::InvalidModelOutput(e.to_string()))?;
    // Grounding is attached separately, never taken from the model's answer.
    result.grounding_links = None;
    Ok(result)
}

/// Build the grounding request for the first [`MAX_GROUNDED_DEPENDENCIES`] dependencies.
///
/// Returns `None` when there is nothing to ground.
pub fn build_grounding_request(dependencies: &[String]) -> Option<GenerateContentRequest> {
    let selected: Vec<&str> = dependencies
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .take(MAX_GROUNDED_DEPENDENCIES)
        .collect();

    if selected.is_empty() {
        return None;
    }

    let prompt = format!(
        "Find the official documentation or homepage for each of these software dependencies: {}. \
         Give one short sentence per dependency.",
        selected.join(", ")
    );

    Some(GenerateContentRequest::user_text(prompt).with_tool(Tool::google_search()))
}

/// Collect `{title, url}` pairs from a grounded response, deduplicated by URL.
pub fn extract_grounding_links(response: &GenerateContentResponse) -> Vec<GroundingLink> {
    let mut links: Vec<GroundingLink> = Vec::new();

    let chunks = response
        .candidates
        .iter()
        .filter_map(|c| c.grounding_metadata.as_ref())
        .flat_map(|m| m.grounding_chunks.iter())
        .filter_map(|chunk| chunk.web.as_ref());

    for web in chunks {
        let Some(url) = web.uri.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
            continue;
        };
        if links.iter().any(|l| l.url == url) {
            continue;
        }
        let title = web
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(url);
        links.push(GroundingLink {
            title: title.to_string(),
            url: url.to_string(),
        });
    }

    links
}
