//! Bot configuration: a small TOML file plus environment overrides.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

const ENV_API_BASE: &str = "ROOMCTL_API_BASE";
const ENV_SESSION_TOKEN: &str = "ROOMCTL_SESSION_TOKEN";

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub api_base: String,
    #[serde(default)]
    pub session_token: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Loads configuration from `path` if it exists, then applies environment
/// overrides. The API base and session token are required one way or the
/// other.
pub fn load_config(path: &Path) -> Result<BotConfig> {
    let mut config = if path.is_file() {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?
    } else {
        BotConfig {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            ..BotConfig::default()
        }
    };

    if let Ok(api_base) = std::env::var(ENV_API_BASE) {
        if !api_base.trim().is_empty() {
            config.api_base = api_base;
        }
    }
    if let Ok(session_token) = std::env::var(ENV_SESSION_TOKEN) {
        if !session_token.trim().is_empty() {
            config.session_token = session_token;
        }
    }

    if config.api_base.trim().is_empty() {
        bail!(
            "no api base configured, set api_base in {} or {ENV_API_BASE}",
            path.display()
        );
    }
    if config.session_token.trim().is_empty() {
        bail!(
            "no session token configured, set session_token in {} or {ENV_SESSION_TOKEN}",
            path.display()
        );
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn unit_config_parses_toml_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "api_base = \"https://pod.example.com\"\nsession_token = \"abc123\""
        )
        .expect("write");
        let config = load_config(file.path()).expect("load");
        assert_eq!(config.api_base, "https://pod.example.com");
        assert_eq!(config.session_token, "abc123");
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn unit_config_honors_timeout_override() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "api_base = \"https://pod.example.com\"\nsession_token = \"abc123\"\nrequest_timeout_ms = 5000"
        )
        .expect("write");
        let config = load_config(file.path()).expect("load");
        assert_eq!(config.request_timeout_ms, 5_000);
    }

    #[test]
    fn unit_missing_session_token_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "api_base = \"https://pod.example.com\"").expect("write");
        // Only valid while the override env var is unset, which holds in CI.
        if std::env::var(ENV_SESSION_TOKEN).is_err() {
            let error = load_config(file.path()).expect_err("must fail");
            assert!(error.to_string().contains("session token"));
        }
    }
}
