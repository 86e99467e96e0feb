use crate::prelude::{eprintln, *};
use codeprompt_core::config::Config;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything a command needs from configuration and the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    api_key: Option<String>,
}

impl Settings {
    /// Resolve defaults, the TOML file and the CLI/environment overrides.
    pub fn load(global: &crate::Global) -> Result<Self> {
        let mut config = load_config(global.config.as_deref())?;

        if let Some(proxy) = &global.proxy {
            config.endpoints.proxy = Some(proxy.clone());
        }

        let api_key = global
            .api_key
            .clone()
            .or_else(|| std::env::var("API_KEY").ok())
            .filter(|key| !key.trim().is_empty());

        if global.verbose {
            eprintln!("Gemini endpoint: {}", config.endpoints.gemini);
        }

        Ok(Self { config, api_key })
    }

    pub fn from_parts(config: Config, api_key: Option<String>) -> Self {
        Self { config, api_key }
    }

    /// The API key, or the configuration error every AI-backed command reports first.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::MissingApiKey.into())
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|dir| dir.join("codeprompt").join("config.toml"))
}

/// Read the configuration file.
///
/// An explicit path must exist; the default location is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };

    log::debug!("Loading configuration from {}", path.display());

    let contents = fs::read_to_string(&path).map_err(|e| Error::ConfigRead {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(Config::from_toml_str(&contents)?)
}
