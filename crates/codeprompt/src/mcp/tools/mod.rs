mod analyze;
mod collect;
mod prompt;

use serde::{Deserialize, Serialize};

// Re-export types needed by tool handlers
pub use super::{JsonRpcError, Tool};

// MCP Protocol types for tools
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
pub struct ToolsCapability {}

#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ToolsList {
    pub tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

pub fn handle_initialize() -> Result<serde_json::Value, JsonRpcError> {
    let result = InitializeResult {
        protocol_version: "2024-11-05".to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {}),
        },
        server_info: ServerInfo {
            name: "codeprompt".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    serde_json::to_value(result).map_err(internal_error)
}

pub fn handle_tools_list() -> Result<serde_json::Value, JsonRpcError> {
    let tools = vec![
        Tool {
            name: "import_repository".to_string(),
            description: "Import source files from a public GitHub, GitLab or Bitbucket repository. Resolves the default branch, lists the tree, skips binary, lockfile and oversized (>5 MiB) files and downloads the rest. Returns the repository, branch, files (path and content) and the skipped entries.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "Repository URL, e.g. 'https://github.com/owner/repo'"
                    }
                },
                "required": ["url"]
            }),
        },
        Tool {
            name: "fetch_urls".to_string(),
            description: "Fetch raw text files from URLs concurrently. Returns every file that could be fetched and one error message per failed URL. Fails only when no URL could be fetched.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "urls": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Raw file URLs"
                    }
                },
                "required": ["urls"]
            }),
        },
        Tool {
            name: "analyze_code".to_string(),
            description: "Analyze source code with Gemini and return a structured description: role, language/framework, main objective, technical purpose, key features, classes, functions and dependencies. Optionally looks up documentation links for the first dependencies. Requires GEMINI_API_KEY.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "files": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "path": {"type": "string"},
                                "content": {"type": "string"}
                            },
                            "required": ["path", "content"]
                        },
                        "description": "Files to analyze (e.g. the output of import_repository)"
                    },
                    "code": {
                        "type": "string",
                        "description": "A single pasted snippet, used when files is not given"
                    },
                    "deep": {
                        "type": "boolean",
                        "description": "Use the deeper reasoning model (default: false)"
                    },
                    "ground": {
                        "type": "boolean",
                        "description": "Attach documentation links for dependencies (default: false)"
                    }
                },
                "required": []
            }),
        },
        Tool {
            name: "format_prompt".to_string(),
            description: "Render an analysis, the code and an optional task as a ready-to-use prompt for an AI coding assistant in the requested style. Pure formatting, no model call.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "analysis": {
                        "type": "object",
                        "description": "Analysis as returned by analyze_code"
                    },
                    "code": {
                        "type": "string",
                        "description": "Code to embed, usually the blob returned by analyze_code"
                    },
                    "task": {
                        "type": "string",
                        "description": "What the assistant should do (optional)"
                    },
                    "style": {
                        "type": "string",
                        "description": "Prompt style (default: technical)",
                        "enum": ["technical", "compact", "concise", "popular", "friendly", "descriptive", "blueprint", "noir"]
                    }
                },
                "required": ["analysis", "code"]
            }),
        },
        Tool {
            name: "list_styles".to_string(),
            description: "List the available prompt styles with a short description and whether they include reference links.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
    ];

    let result = ToolsList { tools };

    serde_json::to_value(result).map_err(internal_error)
}

pub async fn handle_tools_call(
    params: Option<serde_json::Value>,
    global: &crate::Global,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params.unwrap_or(serde_json::Value::Null))
        .map_err(|e| {
            JsonRpcError::new(JsonRpcError::INVALID_PARAMS, format!("Invalid params: {e}"))
        })?;

    match params.name.as_str() {
        "import_repository" => collect::handle_import_repository(params.arguments, global).await,
        "fetch_urls" => collect::handle_fetch_urls(params.arguments, global).await,
        "analyze_code" => analyze::handle_analyze_code(params.arguments, global).await,
        "format_prompt" => prompt::handle_format_prompt(params.arguments, global).await,
        "list_styles" => prompt::handle_list_styles(params.arguments, global).await,
        _ => Err(JsonRpcError::new(
            JsonRpcError::INVALID_PARAMS,
            format!("Unknown tool: {}", params.name),
        )),
    }
}

/// Deserialize tool arguments, treating a missing object as empty.
fn parse_arguments<T: serde::de::DeserializeOwned>(
    arguments: Option<serde_json::Value>,
) -> Result<T, JsonRpcError> {
    let value = match arguments {
        None | Some(serde_json::Value::Null) => serde_json::json!({}),
        Some(value) => value,
    };
    serde_json::from_value(value).map_err(|e| {
        JsonRpcError::new(JsonRpcError::INVALID_PARAMS, format!("Invalid arguments: {e}"))
    })
}

fn execution_error(e: impl std::fmt::Display) -> JsonRpcError {
    JsonRpcError::new(
        JsonRpcError::INTERNAL_ERROR,
        format!("Tool execution error: {e}"),
    )
}

fn internal_error(e: impl std::fmt::Display) -> JsonRpcError {
    JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, format!("Internal error: {e}"))
}

/// Wrap a serializable value as pretty JSON text content.
fn json_result<T: Serialize>(value: &T) -> Result<serde_json::Value, JsonRpcError> {
    let json_string = serde_json::to_string_pretty(value).map_err(|e| {
        JsonRpcError::new(
            JsonRpcError::INTERNAL_ERROR,
            format!("Serialization error: {e}"),
        )
    })?;

    let result = CallToolResult {
        content: vec![Content::Text { text: json_string }],
        is_error: None,
    };

    serde_json::to_value(result).map_err(internal_error)
}
