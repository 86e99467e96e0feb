/// Failures that only exist in the shell: environment, filesystem and persistence.
#[derive(thiserror::Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error("GEMINI_API_KEY environment variable not set (API_KEY is also accepted)")]
    MissingApiKey,

    #[error("Failed to read config file {path}: {message}")]
    ConfigRead { path: String, message: String },

    #[error("Session store error at {path}: {message}")]
    SessionStore { path: String, message: String },

    #[error("No files collected yet. Run `codeprompt collect` first")]
    NoFiles,

    /// Transport failure outside the git hosts and the model provider.
    #[error("Network error: {0}")]
    Network(String),
}
