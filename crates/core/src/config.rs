//! Configuration model
//!
//! Pure configuration types with defaults. The shell reads the TOML file and
//! applies environment/CLI overrides; this module only parses and validates.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Complete configuration. Every section and key is optional in the TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub models: ModelsConfig,
    pub limits: LimitsConfig,
    pub endpoints: EndpointsConfig,
}

/// Model names and reasoning budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub fast: String,
    pub deep: String,
    pub fast_thinking_budget: i32,
    pub deep_thinking_budget: i32,
    pub image: String,
    pub speech: String,
    pub voice: String,
    pub video: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            fast: "gemini-2.5-flash".to_string(),
            deep: "gemini-2.5-pro".to_string(),
            fast_thinking_budget: 0,
            deep_thinking_budget: 32768,
            image: "imagen-4.0-generate-001".to_string(),
            speech: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
            video: "veo-2.0-generate-001".to_string(),
        }
    }
}

/// Size caps, throttling and polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_blob_chars: usize,
    pub request_delay_ms: u64,
    pub video_poll_interval_secs: u64,
    pub github_cap: usize,
    pub gitlab_cap: usize,
    pub bitbucket_cap: usize,
    pub bitbucket_max_depth: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_blob_chars: 500_000,
            request_delay_ms: 50,
            video_poll_interval_secs: 5,
            github_cap: 100,
            gitlab_cap: 60,
            bitbucket_cap: 40,
            bitbucket_max_depth: 4,
        }
    }
}

/// Base URLs for every remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub gemini: String,
    pub github: String,
    pub gitlab: String,
    pub bitbucket: String,
    /// Prefix prepended to percent-encoded target URLs for raw fetches.
    pub proxy: Option<String>,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            gemini: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            github: "https://api.github.com".to_string(),
            gitlab: "https://gitlab.com/api/v4".to_string(),
            bitbucket: "https://api.bitbucket.org/2.0".to_string(),
            proxy: None,
        }
    }
}

impl Config {
    /// Parse a TOML document, filling missing keys with defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(input).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the importer or poller misbehave.
    pub fn validate(&self) -> Result<(), Error> {
        if self.limits.max_blob_chars == 0 {
            return Err(Error::Config(
                "limits.max_blob_chars must be greater than zero".to_string(),
            ));
        }
        if self.limits.video_poll_interval_secs == 0 {
            return Err(Error::Config(
                "limits.video_poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        for (name, cap) in [
            ("github_cap", self.limits.github_cap),
            ("gitlab_cap", self.limits.gitlab_cap),
            ("bitbucket_cap", self.limits.bitbucket_cap),
        ] {
            if cap == 0 {
                return Err(Error::Config(format!(
                    "limits.{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }

    /// Model name and thinking budget for an analysis run.
    pub fn model_profile(&self, deep: bool) -> (&str, i32) {
        if deep {
            (&self.models.deep, self.models.deep_thinking_budget)
        } else {
            (&self.models.fast, self.models.fast_thinking_budget)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml_str(
            r#"
[limits]
request_delay_ms = 0
github_cap = 10

[endpoints]
proxy = "https://proxy.example/?url="
"#,
        )
        .unwrap();

        assert_eq!(config.limits.request_delay_ms, 0);
        assert_eq!(config.limits.github_cap, 10);
        assert_eq!(config.limits.gitlab_cap, 60);
        assert_eq!(
            config.endpoints.proxy.as_deref(),
            Some("https://proxy.example/?url=")
        );
        assert_eq!(config.models, ModelsConfig::default());
    }

    #[test]
    fn test_zero_cap_rejected() {
        let err = Config::from_toml_str("[limits]\nbitbucket_cap = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("bitbucket_cap")));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            Config::from_toml_str("[limits\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_model_profile() {
        let config = Config::default();
        assert_eq!(config.model_profile(false), ("gemini-2.5-flash", 0));
        assert_eq!(config.model_profile(true), ("gemini-2.5-pro", 32768));
    }
}
