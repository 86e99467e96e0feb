//! Model Context Protocol server.
//!
//! Exposes the importer, the analysis requester and the prompt formatter as
//! stateless tools: every call carries its own inputs and the persisted
//! session is never read or written.

mod cli;
mod sse;
mod stdio;
mod tools;

pub use cli::App;

use crate::prelude::*;
use serde::{Deserialize, Serialize};

// JSON-RPC 2.0 types
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<serde_json::Value>,
    method: String,
    params: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i32 = -32700;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl JsonRpcResponse {
    /// `ok`, or the error code and message.
    pub fn outcome(&self) -> String {
        match &self.error {
            Some(error) => f!("error {}: {}", error.code, error.message),
            None => "ok".to_string(),
        }
    }
}

// MCP Protocol types
#[derive(Debug, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    match app.command {
        cli::Commands::Stdio => stdio::run_stdio(global).await,
        cli::Commands::Sse(options) => sse::run_sse(options, global).await,
    }
}

/// Method, tool name and id of a raw message, for transport logs.
pub fn describe_request(raw: &str) -> String {
    let Ok(request) = serde_json::from_str::<JsonRpcRequest>(raw) else {
        return "unparsable message".to_string();
    };

    let id = request
        .id
        .as_ref()
        .map_or_else(|| "none".to_string(), |id| id.to_string());
    let tool = request
        .params
        .as_ref()
        .and_then(|params| params.get("name"))
        .and_then(|name| name.as_str());

    match tool {
        Some(tool) if request.method == "tools/call" => f!("tools/call {tool} (id {id})"),
        _ => f!("{} (id {id})", request.method),
    }
}

pub async fn handle_request(request_str: &str, global: &crate::Global) -> JsonRpcResponse {
    let request: JsonRpcRequest = match serde_json::from_str(request_str) {
        Ok(req) => req,
        Err(e) => {
            return JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: None,
                result: None,
                error: Some(JsonRpcError::new(
                    JsonRpcError::PARSE_ERROR,
                    f!("Parse error: {e}"),
                )),
            };
        }
    };

    log::debug!("MCP request: {}", request.method);

    let result = match request.method.as_str() {
        "initialize" => tools::handle_initialize(),
        "tools/list" => tools::handle_tools_list(),
        "tools/call" => tools::handle_tools_call(request.params, global).await,
        method => Err(JsonRpcError::new(
            JsonRpcError::METHOD_NOT_FOUND,
            f!("Method not found: {method}"),
        )),
    };

    match result {
        Ok(value) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result: Some(value),
            error: None,
        },
        Err(error) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result: None,
            error: Some(error),
        },
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn global() -> crate::Global {
        crate::Global {
            api_key: None,
            config: None,
            session: None,
            proxy: None,
            verbose: false,
        }
    }

    async fn call(request: serde_json::Value) -> serde_json::Value {
        let response = handle_request(&request.to_string(), &global()).await;
        serde_json::to_value(response).unwrap()
    }

    #[test]
    fn test_describe_request() {
        let call = serde_json::json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": {"name": "format_prompt", "arguments": {}}
        });
        assert_eq!(
            describe_request(&call.to_string()),
            "tools/call format_prompt (id 4)"
        );
        assert_eq!(
            describe_request(r#"{"jsonrpc": "2.0", "method": "initialize"}"#),
            "initialize (id none)"
        );
        assert_eq!(describe_request("{oops"), "unparsable message");
    }

    #[tokio::test]
    async fn test_response_outcome() {
        let ok = handle_request(
            r#"{"jsonrpc": "2.0", "id": 1, "method": "tools/list"}"#,
            &global(),
        )
        .await;
        assert_eq!(ok.outcome(), "ok");

        let failed = handle_request(r#"{"jsonrpc": "2.0", "id": 1, "method": "x"}"#, &global()).await;
        assert_eq!(failed.outcome(), "error -32601: Method not found: x");
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = handle_request("{not json", &global()).await;
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["error"]["code"], -32700);
        assert!(value["id"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let value = call(serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": "nope"})).await;
        assert_eq!(value["id"], 7);
        assert_eq!(value["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_initialize() {
        let value =
            call(serde_json::json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"})).await;
        assert_eq!(value["result"]["serverInfo"]["name"], "codeprompt");
        assert!(value["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list() {
        let value =
            call(serde_json::json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let names: Vec<&str> = value["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "import_repository",
                "fetch_urls",
                "analyze_code",
                "format_prompt",
                "list_styles"
            ]
        );
    }
}
