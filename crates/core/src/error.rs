//! Error taxonomy shared by the functional core and the shell.

/// Errors produced while collecting sources, talking to the model provider,
/// or manipulating the session.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid repository URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported provider: {0}. Supported hosts: github.com, gitlab.com, bitbucket.org")]
    UnsupportedProvider(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited by {0}. Anonymous API limits apply, try again later")]
    RateLimited(String),

    #[error("No eligible files could be retrieved from {0}")]
    EmptyImport(String),

    #[error("The model returned an empty response")]
    EmptyResponse,

    #[error("The model output does not match the analysis schema: {0}")]
    InvalidModelOutput(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Authentication with the model provider failed, check GEMINI_API_KEY: {0}")]
    AuthenticationFailed(String),

    #[error("The {0} for this context has already been generated")]
    MediaAlreadyGenerated(String),

    #[error("No analysis has been run yet")]
    NoCurrentContext,

    #[error("Context not found: {0}")]
    ContextNotFound(String),

    #[error("Analysis ticket {ticket} is stale, a newer analysis (ticket {latest}) was started")]
    StaleCompletion { ticket: u64, latest: u64 },

    #[error("Invalid style: {0}. Run `codeprompt styles` for the list")]
    InvalidStyle(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

/// Classify a non-success HTTP status returned by a git hosting API.
///
/// `subject` names what was being requested and ends up in the message.
pub fn classify_host_status(status: u16, subject: &str, body: &str) -> Error {
    match status {
        404 => Error::NotFound(subject.to_string()),
        403 | 429 => Error::RateLimited(subject.to_string()),
        _ => Error::ProviderError(format!("{subject} [HTTP {status}]: {}", body.trim())),
    }
}

/// Classify a non-success HTTP status returned by the model provider.
pub fn classify_model_status(status: u16, body: &str) -> Error {
    let message = extract_upstream_message(body);
    if status == 401 || status == 403 || body.contains("API_KEY_INVALID") {
        Error::AuthenticationFailed(message)
    } else {
        Error::ProviderError(format!("HTTP {status}: {message}"))
    }
}

/// Pull `error.message` out of a Google-style error body, falling back to the raw body.
fn extract_upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
