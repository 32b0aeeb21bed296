//! Relay configuration loader.
//!
//! Reads `sera.toml` (or the path given on the command line) into
//! [`RelayConfig`], then layers environment overrides on top. A missing file
//! yields defaults; a file that exists but does not parse is an error, so a
//! typo never silently reverts the relay to defaults.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use sera_core::assistant::prompt::default_persona;
use sera_types::config::{PersonaConfig, RelayConfig};

/// Environment variables holding the upstream API key, in priority order.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GENERATIVE_API_KEY"];

/// Errors loading or resolving configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Load configuration from `path`.
pub async fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(RelayConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    toml::from_str::<RelayConfig>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `HOST`, `PORT` and `GEMINI_MODEL` from the process environment.
pub fn apply_env_overrides(config: &mut RelayConfig) -> Result<(), ConfigError> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides read through `lookup`. Blank values are ignored.
pub fn apply_overrides_from<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(host) = get("HOST") {
        config.server.host = host;
    }
    if let Some(port) = get("PORT") {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                value: port.clone(),
            })?;
    }
    if let Some(model) = get("GEMINI_MODEL") {
        config.upstream.model = model;
    }
    Ok(())
}

/// Upstream API key from the process environment.
pub fn resolve_api_key() -> Option<SecretString> {
    resolve_api_key_from(|key| std::env::var(key).ok())
}

/// First non-blank value among [`API_KEY_VARS`].
pub fn resolve_api_key_from<F>(lookup: F) -> Option<SecretString>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .copied()
        .filter_map(|key| lookup(key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .map(SecretString::from)
}

/// Persona text: inline `instructions`, else the `instructions_path` file,
/// else the built-in persona.
pub async fn resolve_persona(config: &PersonaConfig) -> Result<String, ConfigError> {
    if let Some(text) = config.instructions.as_ref().filter(|t| !t.trim().is_empty()) {
        return Ok(text.clone());
    }
    if let Some(path) = &config.instructions_path {
        return tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            });
    }
    Ok(default_persona(&config.name))
}
