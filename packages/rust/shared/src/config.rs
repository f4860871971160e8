//! Application configuration for Leadline.
//!
//! User config lives at `~/.leadline/leadline.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets never live in the file: it only names the environment variables
//! that hold them, and the runtime settings structs resolve those once.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LeadlineError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leadline.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leadline";

// ---------------------------------------------------------------------------
// Config structs (matching leadline.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP function and storage settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Pipedrive CRM settings.
    #[serde(default)]
    pub pipedrive: PipedriveConfig,

    /// Stakeholder email notifications.
    #[serde(default)]
    pub notifications: NotificationsConfig,

    /// Generated application documents.
    #[serde(default)]
    pub document: DocumentConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP function binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Path to the libSQL database holding applications and the submission log.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            db_path: default_db_path(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8787".into()
}
fn default_db_path() -> String {
    "var/leadline.db".into()
}

/// `[pipedrive]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipedriveConfig {
    /// API root, including the version segment.
    #[serde(default = "default_pipedrive_url")]
    pub base_url: String,

    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_pipedrive_token_env")]
    pub api_token_env: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Lead label ids keyed by `submission_type`.
    #[serde(default)]
    pub lead_labels: BTreeMap<String, Vec<String>>,
}

impl Default for PipedriveConfig {
    fn default() -> Self {
        Self {
            base_url: default_pipedrive_url(),
            api_token_env: default_pipedrive_token_env(),
            timeout_secs: default_timeout_secs(),
            lead_labels: BTreeMap::new(),
        }
    }
}

fn default_pipedrive_url() -> String {
    "https://api.pipedrive.com/v1".into()
}
fn default_pipedrive_token_env() -> String {
    "PIPEDRIVE_API_TOKEN".into()
}
fn default_timeout_secs() -> u64 {
    15
}

/// `[notifications]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Whether stakeholder emails are sent at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Resend API root.
    #[serde(default = "default_resend_url")]
    pub base_url: String,

    /// Name of the env var holding the Resend API key.
    #[serde(default = "default_resend_key_env")]
    pub api_key_env: String,

    /// Sender address.
    #[serde(default = "default_from")]
    pub from: String,

    /// Fixed stakeholder recipient.
    #[serde(default = "default_to")]
    pub to: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_resend_url(),
            api_key_env: default_resend_key_env(),
            from: default_from(),
            to: default_to(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_resend_url() -> String {
    "https://api.resend.com".into()
}
fn default_resend_key_env() -> String {
    "RESEND_API_KEY".into()
}
fn default_from() -> String {
    "Website Forms <forms@example.com>".into()
}
fn default_to() -> String {
    "advisor@example.com".into()
}

/// `[document]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Leading filename segment, e.g. `LifeInsurance`.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Middle filename segment naming the record type.
    #[serde(default = "default_entity_type")]
    pub entity_type: String,

    /// Firm name printed in the header band.
    #[serde(default = "default_firm_name")]
    pub firm_name: String,

    /// Contact line stamped bottom-center on every page.
    #[serde(default = "default_footer_contact")]
    pub footer_contact: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            file_prefix: default_file_prefix(),
            entity_type: default_entity_type(),
            firm_name: default_firm_name(),
            footer_contact: default_footer_contact(),
        }
    }
}

fn default_file_prefix() -> String {
    "LifeInsurance".into()
}
fn default_entity_type() -> String {
    "Application".into()
}
fn default_firm_name() -> String {
    "Financial Advisory Group".into()
}
fn default_footer_contact() -> String {
    "Questions? Call (555) 010-4200 | advisor@example.com".into()
}

// ---------------------------------------------------------------------------
// Runtime settings (resolved from config + environment)
// ---------------------------------------------------------------------------

/// Resolved Pipedrive connection settings, injected into the CRM client.
#[derive(Debug, Clone)]
pub struct CrmSettings {
    /// API root without a trailing slash.
    pub base_url: Url,
    /// The API token, sent as the `api_token` query parameter.
    pub api_token: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Lead label ids keyed by `submission_type`.
    pub lead_labels: BTreeMap<String, Vec<String>>,
}

impl CrmSettings {
    /// Build settings directly, bypassing config and environment (tests, embedding).
    pub fn new(base_url: &str, api_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_token: api_token.into(),
            timeout: Duration::from_secs(default_timeout_secs()),
            lead_labels: BTreeMap::new(),
        })
    }

    /// Resolve settings from the config file section and the named env var.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let section = &config.pipedrive;
        Ok(Self {
            base_url: parse_base_url(&section.base_url)?,
            api_token: read_secret(&section.api_token_env, "Pipedrive API token")?,
            timeout: Duration::from_secs(section.timeout_secs),
            lead_labels: section.lead_labels.clone(),
        })
    }
}

/// Resolved Resend settings. `None` from [`EmailSettings::from_config`] means disabled.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub base_url: Url,
    pub api_key: String,
    pub from: String,
    pub to: String,
}

impl EmailSettings {
    /// Build settings directly, bypassing config and environment.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
        })
    }

    /// Resolve settings, or `None` when notifications are switched off.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>> {
        let section = &config.notifications;
        if !section.enabled {
            return Ok(None);
        }
        Ok(Some(Self {
            base_url: parse_base_url(&section.base_url)?,
            api_key: read_secret(&section.api_key_env, "Resend API key")?,
            from: section.from.clone(),
            to: section.to.clone(),
        }))
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim_end_matches('/');
    Url::parse(trimmed)
        .map_err(|e| LeadlineError::config(format!("invalid base URL '{raw}': {e}")))
}

fn read_secret(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(LeadlineError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leadline/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| LeadlineError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leadline/leadline.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LeadlineError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LeadlineError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeadlineError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeadlineError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeadlineError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("PIPEDRIVE_API_TOKEN"));
        assert!(toml_str.contains("RESEND_API_KEY"));
        assert!(toml_str.contains("file_prefix"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let toml_str = r#"
[pipedrive]
timeout_secs = 5

[pipedrive.lead_labels]
living_trust_landing = ["b3f2c0de-0000-4000-8000-000000000001"]

[notifications]
enabled = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.pipedrive.timeout_secs, 5);
        assert_eq!(config.pipedrive.base_url, "https://api.pipedrive.com/v1");
        assert_eq!(config.pipedrive.lead_labels["living_trust_landing"].len(), 1);
        assert!(!config.notifications.enabled);
        assert_eq!(config.document.entity_type, "Application");
    }

    #[test]
    fn missing_token_env_is_a_config_error() {
        let mut config = AppConfig::default();
        config.pipedrive.api_token_env = "LEADLINE_TEST_NONEXISTENT_TOKEN_12345".into();
        let err = CrmSettings::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("LEADLINE_TEST_NONEXISTENT_TOKEN_12345"));
    }

    #[test]
    fn disabled_notifications_resolve_to_none() {
        let mut config = AppConfig::default();
        config.notifications.enabled = false;
        config.notifications.api_key_env = "LEADLINE_TEST_NONEXISTENT_KEY_12345".into();
        let settings = EmailSettings::from_config(&config).expect("disabled is not an error");
        assert!(settings.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let settings = CrmSettings::new("http://localhost:9000/v1/", "t").unwrap();
        assert_eq!(settings.base_url.as_str(), "http://localhost:9000/v1");
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(CrmSettings::new("not a url", "t").is_err());
    }
}
