// hook-relay-config/src/config.rs
// ============================================================================
// Module: Hook Relay Configuration
// Description: Configuration loading and validation for Hook Relay.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and value
//! limits. Secrets may be supplied through environment variables instead of
//! the file; the environment always wins. Missing or invalid configuration
//! fails closed. An absent webhook secret or verification token selects
//! accept-all mode on the corresponding transport, which is a deliberately
//! permissive default for local development and is surfaced as a security
//! audit event at startup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "hook-relay.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "HOOK_RELAY_CONFIG";
/// Environment variable overriding the code-hosting webhook secret.
pub const GITHUB_SECRET_ENV_VAR: &str = "HOOK_RELAY_GITHUB_SECRET";
/// Environment variable overriding the document-workspace verification token.
pub const NOTION_TOKEN_ENV_VAR: &str = "HOOK_RELAY_NOTION_TOKEN";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a webhook secret or verification token.
pub(crate) const MAX_SECRET_LENGTH: usize = 256;
/// Maximum length of an endpoint path.
pub(crate) const MAX_ENDPOINT_PATH_LENGTH: usize = 256;
/// Default maximum request body size in bytes.
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Minimum allowed request body limit in bytes.
pub(crate) const MIN_MAX_BODY_BYTES: usize = 1024;
/// Maximum allowed request body limit in bytes.
pub(crate) const MAX_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
/// Default code-hosting transport bind address.
const DEFAULT_GITHUB_BIND: &str = "127.0.0.1:3002";
/// Default code-hosting endpoint path.
const DEFAULT_GITHUB_PATH: &str = "/github/webhook";
/// Default document-workspace transport bind address.
const DEFAULT_NOTION_BIND: &str = "127.0.0.1:3001";
/// Default document-workspace endpoint path.
const DEFAULT_NOTION_PATH: &str = "/notion/webhook";
/// Default upstream service base URL.
const DEFAULT_UPSTREAM_BASE_URL: &str = "http://localhost:3000";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Hook Relay configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookRelayConfig {
    /// Code-hosting webhook transport configuration.
    #[serde(default)]
    pub github: GithubTransportConfig,
    /// Document-workspace webhook transport configuration.
    #[serde(default)]
    pub notion: NotionTransportConfig,
    /// Shared server limits.
    #[serde(default)]
    pub server: ServerLimitsConfig,
    /// Upstream collaborator configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Code-hosting webhook transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GithubTransportConfig {
    /// Socket address the transport binds to.
    #[serde(default = "default_github_bind")]
    pub bind: String,
    /// Endpoint path accepting webhook deliveries.
    #[serde(default = "default_github_path")]
    pub path: String,
    /// Shared HMAC secret; absent selects accept-all mode.
    #[serde(default)]
    pub secret: Option<String>,
}

impl Default for GithubTransportConfig {
    fn default() -> Self {
        Self {
            bind: default_github_bind(),
            path: default_github_path(),
            secret: None,
        }
    }
}

/// Document-workspace webhook transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotionTransportConfig {
    /// Socket address the transport binds to.
    #[serde(default = "default_notion_bind")]
    pub bind: String,
    /// Endpoint path accepting webhook deliveries.
    #[serde(default = "default_notion_path")]
    pub path: String,
    /// Shared verification token; absent selects accept-all mode.
    #[serde(default)]
    pub verification_token: Option<String>,
}

impl Default for NotionTransportConfig {
    fn default() -> Self {
        Self {
            bind: default_notion_bind(),
            path: default_notion_path(),
            verification_token: None,
        }
    }
}

/// Shared server limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerLimitsConfig {
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerLimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Upstream collaborator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Base URL of the companion search/indexing service.
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
        }
    }
}

/// Default code-hosting bind address.
fn default_github_bind() -> String {
    DEFAULT_GITHUB_BIND.to_string()
}

/// Default code-hosting endpoint path.
fn default_github_path() -> String {
    DEFAULT_GITHUB_PATH.to_string()
}

/// Default document-workspace bind address.
fn default_notion_bind() -> String {
    DEFAULT_NOTION_BIND.to_string()
}

/// Default document-workspace endpoint path.
fn default_notion_path() -> String {
    DEFAULT_NOTION_PATH.to_string()
}

/// Default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default upstream base URL.
fn default_upstream_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl HookRelayConfig {
    /// Loads configuration from the default path or the path override
    /// environment variable, applying secret overrides from the environment.
    ///
    /// A missing file yields the built-in defaults (both transports in
    /// accept-all mode).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            env::var(CONFIG_ENV_VAR).map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_NAME), PathBuf::from);
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Loads configuration from an explicit path, applying secret overrides
    /// from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let metadata = fs::metadata(path).map_err(|err| ConfigError::Read(err.to_string()))?;
        let actual_bytes = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if actual_bytes > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::TooLarge {
                max_bytes: MAX_CONFIG_FILE_SIZE,
                actual_bytes,
            });
        }
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Read(err.to_string()))?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML string and validates it. No
    /// environment overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Applies secret overrides read from the environment.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = env::var(GITHUB_SECRET_ENV_VAR) {
            self.github.secret = Some(secret);
        }
        if let Ok(token) = env::var(NOTION_TOKEN_ENV_VAR) {
            self.notion.verification_token = Some(token);
        }
    }

    /// Applies explicit secret overrides; an override always wins over the
    /// file value.
    pub fn apply_secret_overrides(
        &mut self,
        github_secret: Option<String>,
        notion_token: Option<String>,
    ) {
        if let Some(secret) = github_secret {
            self.github.secret = Some(secret);
        }
        if let Some(token) = notion_token {
            self.notion.verification_token = Some(token);
        }
    }

    /// Validates the configuration, failing closed on any violated limit.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_bind("github.bind", &self.github.bind)?;
        validate_bind("notion.bind", &self.notion.bind)?;
        validate_endpoint_path("github.path", &self.github.path)?;
        validate_endpoint_path("notion.path", &self.notion.path)?;
        validate_secret("github.secret", self.github.secret.as_deref())?;
        validate_secret("notion.verification_token", self.notion.verification_token.as_deref())?;
        if self.server.max_body_bytes < MIN_MAX_BODY_BYTES
            || self.server.max_body_bytes > MAX_MAX_BODY_BYTES
        {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must be within {MIN_MAX_BODY_BYTES}..={MAX_MAX_BODY_BYTES}"
            )));
        }
        validate_base_url("upstream.base_url", &self.upstream.base_url)?;
        Ok(())
    }
}

/// Validates a socket bind address.
fn validate_bind(field: &str, bind: &str) -> Result<(), ConfigError> {
    bind.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| ConfigError::Invalid(format!("{field} is not a valid socket address")))
}

/// Validates an endpoint path.
fn validate_endpoint_path(field: &str, path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::Invalid(format!("{field} must start with '/'")));
    }
    if path.len() > MAX_ENDPOINT_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds {MAX_ENDPOINT_PATH_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validates an optional secret value.
fn validate_secret(field: &str, secret: Option<&str>) -> Result<(), ConfigError> {
    let Some(secret) = secret else {
        return Ok(());
    };
    if secret.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must not be empty when set")));
    }
    if secret.len() > MAX_SECRET_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds {MAX_SECRET_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validates the upstream base URL.
fn validate_base_url(field: &str, base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|_| ConfigError::Invalid(format!("{field} is not a valid URL")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => {
            Err(ConfigError::Invalid(format!("{field} has unsupported scheme: {scheme}")))
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file read failed.
    #[error("config read failed: {0}")]
    Read(String),
    /// Config file exceeds the size limit.
    #[error("config file too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum accepted size in bytes.
        max_bytes: usize,
        /// Observed size in bytes.
        actual_bytes: usize,
    },
    /// Config file parse failed.
    #[error("config parse failed: {0}")]
    Parse(String),
    /// Config violates a validation rule.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions."
    )]

    use super::ConfigError;
    use super::HookRelayConfig;

    #[test]
    fn defaults_select_accept_all_mode() {
        let config = HookRelayConfig::from_toml_str("").unwrap();
        assert_eq!(config.github.bind, "127.0.0.1:3002");
        assert_eq!(config.github.path, "/github/webhook");
        assert!(config.github.secret.is_none());
        assert_eq!(config.notion.bind, "127.0.0.1:3001");
        assert_eq!(config.notion.path, "/notion/webhook");
        assert!(config.notion.verification_token.is_none());
        assert_eq!(config.server.max_body_bytes, 1024 * 1024);
        assert_eq!(config.upstream.base_url, "http://localhost:3000");
    }

    #[test]
    fn full_config_parses() {
        let raw = r#"
            [github]
            bind = "0.0.0.0:8082"
            path = "/hooks/code"
            secret = "s3cret"

            [notion]
            bind = "0.0.0.0:8081"
            path = "/hooks/docs"
            verification_token = "tok"

            [server]
            max_body_bytes = 65536

            [upstream]
            base_url = "https://search.internal:8443"
        "#;
        let config = HookRelayConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.github.secret.as_deref(), Some("s3cret"));
        assert_eq!(config.notion.verification_token.as_deref(), Some("tok"));
        assert_eq!(config.server.max_body_bytes, 65_536);
    }

    #[test]
    fn unknown_fields_fail_closed() {
        let raw = r#"
            [github]
            secrt = "typo"
        "#;
        assert!(matches!(HookRelayConfig::from_toml_str(raw), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let raw = r#"
            [github]
            bind = "not-an-address"
        "#;
        assert!(matches!(HookRelayConfig::from_toml_str(raw), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn path_must_start_with_slash() {
        let raw = r#"
            [notion]
            path = "notion/webhook"
        "#;
        assert!(matches!(HookRelayConfig::from_toml_str(raw), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let raw = r#"
            [github]
            secret = ""
        "#;
        assert!(matches!(HookRelayConfig::from_toml_str(raw), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn oversized_secret_is_rejected() {
        let secret = "a".repeat(257);
        let raw = format!("[github]\nsecret = \"{secret}\"\n");
        assert!(matches!(HookRelayConfig::from_toml_str(&raw), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn body_limit_bounds_are_enforced() {
        let raw = r#"
            [server]
            max_body_bytes = 16
        "#;
        assert!(matches!(HookRelayConfig::from_toml_str(raw), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn upstream_scheme_is_restricted() {
        let raw = r#"
            [upstream]
            base_url = "ftp://search.internal"
        "#;
        assert!(matches!(HookRelayConfig::from_toml_str(raw), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn explicit_overrides_win_over_file_values() {
        let raw = r#"
            [github]
            secret = "file-secret"
        "#;
        let mut config = HookRelayConfig::from_toml_str(raw).unwrap();
        config.apply_secret_overrides(Some("env-secret".to_string()), Some("env-token".to_string()));
        assert_eq!(config.github.secret.as_deref(), Some("env-secret"));
        assert_eq!(config.notion.verification_token.as_deref(), Some("env-token"));
    }
}
