//! Prompt refinement requests

use crate::analysis::strip_code_fence;
use crate::error::Error;
use crate::gemini::GenerateContentRequest;

const REFINE_SYSTEM: &str = "\
You are an expert prompt engineer. You receive a prompt written for an AI coding \
assistant and feedback from its author. Revise the prompt according to the feedback.

Rules:
- Return ONLY the revised prompt text. No preamble, no explanations, no markdown fence around it.
- Keep any source code block from the original prompt intact unless the feedback asks otherwise.
- Preserve the original structure where the feedback does not require changes.";

/// Build the refinement request for the currently displayed prompt.
pub fn build_refine_request(current_prompt: &str, instructions: &str) -> GenerateContentRequest {
    GenerateContentRequest::user_text(format!(
        "<prompt>\n{current_prompt}\n</prompt>\n\n<feedback>\n{instructions}\n</feedback>"
    ))
    .with_system(REFINE_SYSTEM)
}

/// Clean the model's answer; an empty answer is an error.
pub fn parse_refined(raw: &str) -> Result<String, Error> {
    let text = strip_code_fence(raw);
    if text.is_empty() {
        return Err(Error::EmptyResponse);
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refine_request_contains_both_inputs() {
        let request = build_refine_request("Original prompt", "Make it shorter");
        let value = serde_json::to_value(&request).unwrap();
        let text = value["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.contains("<prompt>\nOriginal prompt\n</prompt>"));
        assert!(text.contains("<feedback>\nMake it shorter\n</feedback>"));
        assert!(value["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Return ONLY the revised prompt"));
    }

    #[test]
    fn test_parse_refined() {
        assert_eq!(parse_refined("  New prompt \n").unwrap(), "New prompt");
        assert_eq!(parse_refined("```\nNew prompt\n```").unwrap(), "New prompt");
        assert_eq!(parse_refined(""), Err(Error::EmptyResponse));
    }
}
