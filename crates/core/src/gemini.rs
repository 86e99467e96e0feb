//! Gemini REST API wire types
//!
//! Request and response bodies for `generateContent`, Imagen `predict`,
//! Veo `predictLongRunning` and long-running operation polling, plus the pure
//! helpers that build requests and read responses.

use serde::{Deserialize, Serialize};

use crate::error::Error;

// =============================================================================
// generateContent
// =============================================================================

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
    /// Set on parts that carry the model's reasoning rather than its answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    pub thinking_budget: i32,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub google_search: serde_json::Value,
}

impl Tool {
    pub fn google_search() -> Self {
        Self {
            google_search: serde_json::json!({}),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebSource>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GenerateContentRequest {
    /// A single user turn with plain text.
    pub fn user_text(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.into()),
                    ..Part::default()
                }],
            }],
            system_instruction: None,
            generation_config: None,
            tools: Vec::new(),
        }
    }

    pub fn with_system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(Content {
            role: None,
            parts: vec![Part {
                text: Some(instruction.into()),
                ..Part::default()
            }],
        });
        self
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }
}

impl GenerateContentResponse {
    /// Concatenated answer text of the first candidate, skipping thought parts.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| p.thought != Some(true))
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    /// Why the response carries no content: a blocked prompt, or candidates that
    /// stopped for a reason other than `STOP` without producing any part.
    pub fn blocked_reason(&self) -> Option<String> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_deref())
        {
            return Some(format!("prompt blocked: {reason}"));
        }

        let has_parts = self
            .candidates
            .iter()
            .any(|c| c.content.as_ref().is_some_and(|content| !content.parts.is_empty()));
        if has_parts {
            return None;
        }

        self.candidates
            .iter()
            .filter_map(|c| c.finish_reason.as_deref())
            .find(|reason| *reason != "STOP")
            .map(|reason| format!("generation stopped: {reason}"))
    }

    /// First inline binary payload of the first candidate.
    pub fn inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|p| p.inline_data.as_ref()))
    }
}

// =============================================================================
// Imagen predict
// =============================================================================

#[derive(Debug, Serialize, Clone)]
pub struct PredictRequest {
    pub instances: Vec<PromptInstance>,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Clone)]
pub struct PromptInstance {
    pub prompt: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PredictResponse {
    #[serde(default)]
    pub predictions: Vec<ImagePrediction>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImagePrediction {
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl PredictRequest {
    pub fn image(prompt: impl Into<String>) -> Self {
        Self {
            instances: vec![PromptInstance {
                prompt: prompt.into(),
            }],
            parameters: serde_json::json!({
                "sampleCount": 1,
                "aspectRatio": "1:1",
                "outputOptions": { "mimeType": "image/png" }
            }),
        }
    }

    pub fn video(prompt: impl Into<String>) -> Self {
        Self {
            instances: vec![PromptInstance {
                prompt: prompt.into(),
            }],
            parameters: serde_json::json!({
                "aspectRatio": "16:9",
                "sampleCount": 1
            }),
        }
    }
}

// =============================================================================
// Long-running operations (Veo)
// =============================================================================

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<OperationResponse>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OperationError {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GeneratedSample {
    #[serde(default)]
    pub video: Option<VideoRef>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VideoRef {
    #[serde(default)]
    pub uri: Option<String>,
}

/// What a poll of a video operation tells the caller to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not finished, poll again after the interval.
    Pending,
    /// Finished with a downloadable URI (credential not yet attached).
    Ready(String),
}

/// Interpret one snapshot of a video generation operation.
pub fn interpret_operation(operation: &Operation) -> Result<PollOutcome, Error> {
    if !operation.done {
        return Ok(PollOutcome::Pending);
    }

    if let Some(error) = &operation.error {
        return Err(Error::ProviderError(format!(
            "video generation failed: {}",
            error.message
        )));
    }

    operation
        .response
        .as_ref()
        .and_then(|r| r.generate_video_response.as_ref())
        .and_then(|r| r.generated_samples.first())
        .and_then(|s| s.video.as_ref())
        .and_then(|v| v.uri.clone())
        .map(PollOutcome::Ready)
        .ok_or_else(|| {
            Error::ProviderError("video generation finished without a video URI".to_string())
        })
}

/// Attach the API key to a media URI as the `key` query parameter.
pub fn with_api_key(uri: &str, api_key: &str) -> String {
    let separator = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{separator}key={}", urlencoding::encode(api_key))
}

/// The same URI with the value of any `key` query parameter masked, for display.
pub fn redact_api_key(uri: &str) -> String {
    let Some((base, query)) = uri.split_once('?') else {
        return uri.to_string();
    };
    let query: Vec<&str> = query
        .split('&')
        .map(|param| if param.starts_with("key=") { "key=***" } else { param })
        .collect();
    format!("{base}?{}", query.join("&"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_uses_camel_case() {
        let request = GenerateContentRequest::user_text("hello")
            .with_system("be terse")
            .with_config(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                thinking_config: Some(ThinkingConfig { thinking_budget: 0 }),
                ..GenerationConfig::default()
            })
            .with_tool(Tool::google_search());

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "be terse");
        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            value["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            0
        );
        assert!(value["generationConfig"]
            .get("responseModalities")
            .is_none());
        assert_eq!(value["tools"][0]["googleSearch"], serde_json::json!({}));
    }

    #[test]
    fn test_request_without_tools_omits_field() {
        let value = serde_json::to_value(GenerateContentRequest::user_text("x")).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_text_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[
                {"text":"thinking...","thought":true},
                {"text":"Hello "},
                {"text":"world"}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text(), "Hello world");
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(response.text(), "");
        assert!(response.inline_data().is_none());
    }

    #[test]
    fn test_response_inline_data() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"audio/L16;codec=pcm;rate=24000","data":"AAA="}}]}}]}"#,
        )
        .unwrap();
        let data = response.inline_data().unwrap();
        assert_eq!(data.mime_type, "audio/L16;codec=pcm;rate=24000");
        assert_eq!(data.data, "AAA=");
    }

    #[test]
    fn test_operation_pending() {
        let op: Operation = serde_json::from_str(r#"{"name":"models/veo/operations/1"}"#).unwrap();
        assert_eq!(interpret_operation(&op).unwrap(), PollOutcome::Pending);
    }

    #[test]
    fn test_operation_done_with_uri() {
        let op: Operation = serde_json::from_str(
            r#"{"name":"op","done":true,"response":{"generateVideoResponse":{"generatedSamples":[{"video":{"uri":"https://files.example/v.mp4?alt=media"}}]}}}"#,
        )
        .unwrap();
        assert_eq!(
            interpret_operation(&op).unwrap(),
            PollOutcome::Ready("https://files.example/v.mp4?alt=media".to_string())
        );
    }

    #[test]
    fn test_operation_done_with_error() {
        let op: Operation = serde_json::from_str(
            r#"{"name":"op","done":true,"error":{"code":3,"message":"prompt rejected"}}"#,
        )
        .unwrap();
        assert!(matches!(
            interpret_operation(&op),
            Err(Error::ProviderError(msg)) if msg.contains("prompt rejected")
        ));
    }

    #[test]
    fn test_operation_done_without_uri() {
        let op: Operation = serde_json::from_str(r#"{"name":"op","done":true,"response":{}}"#).unwrap();
        assert!(interpret_operation(&op).is_err());
    }

    #[test]
    fn test_blocked_reason() {
        let blocked: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}}))
                .unwrap();
        assert_eq!(
            blocked.blocked_reason().as_deref(),
            Some("prompt blocked: SAFETY")
        );

        let stopped: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "RECITATION"}]
        }))
        .unwrap();
        assert_eq!(
            stopped.blocked_reason().as_deref(),
            Some("generation stopped: RECITATION")
        );

        let answered: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": "hi"}]},
                "finishReason": "MAX_TOKENS"
            }]
        }))
        .unwrap();
        assert!(answered.blocked_reason().is_none());

        let empty_stop: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "STOP"}]
        }))
        .unwrap();
        assert!(empty_stop.blocked_reason().is_none());
    }

    #[test]
    fn test_with_api_key() {
        assert_eq!(
            with_api_key("https://x/v.mp4", "k1"),
            "https://x/v.mp4?key=k1"
        );
        assert_eq!(
            with_api_key("https://x/v.mp4?alt=media", "k 2"),
            "https://x/v.mp4?alt=media&key=k%202"
        );
    }

    #[test]
    fn test_redact_api_key() {
        assert_eq!(
            redact_api_key("https://x/v.mp4?alt=media&key=secret"),
            "https://x/v.mp4?alt=media&key=***"
        );
        assert_eq!(redact_api_key("https://x/v.mp4?key=s"), "https://x/v.mp4?key=***");
        assert_eq!(redact_api_key("https://x/v.mp4?monkey=1"), "https://x/v.mp4?monkey=1");
        assert_eq!(redact_api_key("https://x/v.mp4"), "https://x/v.mp4");
    }
}
