//! Configuration for the ticketing bridge.
//!
//! Built once at process start: defaults, then the TOML file, then
//! environment variables. The resulting `SuporteConfig` is passed by
//! reference into every constructor; nothing reads the environment later.

use crate::backend::CredentialProvider;
use crate::classifier::MatchPolicy;
use crate::taxonomy::TaxonomyError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/suporte/config.toml";

/// Environment variable naming an alternative config file
pub const CONFIG_ENV: &str = "SUPORTE_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("No backend credentials: set a user token or a username and password")]
    MissingCredentials,

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the daemon listens on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_body")]
    pub max_body_bytes: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_max_body() -> usize {
    64 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body(),
        }
    }
}

/// Ticketing backend connection
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// REST root, e.g. `http://helpdesk.local/apirest.php`
    #[serde(default)]
    pub base_url: String,

    /// Static application-identifying token sent on every call
    #[serde(default)]
    pub app_token: String,

    /// Long-lived user token (preferred when set)
    #[serde(default)]
    pub user_token: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Per-call timeout in seconds
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

fn default_backend_timeout() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            app_token: String::new(),
            user_token: None,
            username: None,
            password: None,
            timeout_secs: default_backend_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the single credential method used for `initSession`.
    ///
    /// A user token wins over a username/password pair.
    pub fn credentials(&self) -> Result<CredentialProvider, ConfigError> {
        if let Some(token) = non_blank(&self.user_token) {
            if non_blank(&self.username).is_some() {
                debug!("Both user token and username configured, using user token");
            }
            return Ok(CredentialProvider::UserToken {
                token: token.to_string(),
            });
        }

        match (non_blank(&self.username), non_blank(&self.password)) {
            (Some(username), Some(password)) => Ok(CredentialProvider::BasicAuth {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("app_token", &crate::backend::mask_secret(&self.app_token))
            .field("user_token", &self.user_token.as_ref().map(|_| "***"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Voice-assistant webhook settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Bearer key the assistant must present; webhook is refused when unset
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Downstream spreadsheet logger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// A1 range rows are appended to
    #[serde(default = "default_sheets_range")]
    pub range: String,

    /// OAuth access token, obtained outside the bridge
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_sheets_api_base")]
    pub api_base: String,

    #[serde(default = "default_sheets_timeout")]
    pub timeout_secs: u64,
}

fn default_sheets_range() -> String {
    "Sheet1!A:D".to_string()
}

fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com".to_string()
}

fn default_sheets_timeout() -> u64 {
    10
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            spreadsheet_id: None,
            range: default_sheets_range(),
            access_token: None,
            api_base: default_sheets_api_base(),
            timeout_secs: default_sheets_timeout(),
        }
    }
}

/// Classifier settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub policy: MatchPolicy,

    /// External taxonomy file; the built-in taxonomy is used when unset
    #[serde(default)]
    pub taxonomy_path: Option<PathBuf>,
}

/// Complete bridge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuporteConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub assistant: AssistantConfig,

    #[serde(default)]
    pub sheets: SheetsConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl SuporteConfig {
    /// Load configuration for a process.
    ///
    /// File resolution: explicit path, then `$SUPORTE_CONFIG`, then
    /// `/etc/suporte/config.toml` when it exists. Environment variables are
    /// applied on top and the result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::load_unchecked(path)?;
        config.validate()?;
        Ok(config)
    }

    /// `load` without validation, for commands that never reach the backend
    pub fn load_unchecked(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(|| {
                let default = PathBuf::from(CONFIG_PATH);
                default.exists().then_some(default)
            });

        let mut config = match file {
            Some(file) => {
                info!("Loading config from {}", file.display());
                Self::from_file(&file)?
            }
            None => {
                info!("No config file found, using defaults and environment");
                Self::default()
            }
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment-style overrides through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GLPI_URL") {
            self.backend.base_url = v;
        }
        if let Some(v) = get("GLPI_APP_TOKEN") {
            self.backend.app_token = v;
        }
        if let Some(v) = get("GLPI_USER_TOKEN") {
            self.backend.user_token = Some(v);
        }
        if let Some(v) = get("GLPI_USER") {
            self.backend.username = Some(v);
        }
        if let Some(v) = get("GLPI_PASSWORD") {
            self.backend.password = Some(v);
        }
        if let Some(v) = get("VAPI_API_KEY") {
            self.assistant.api_key = Some(v);
        }
        if let Some(v) = get("GOOGLE_SHEET_ID") {
            self.sheets.spreadsheet_id = Some(v);
            self.sheets.enabled = true;
        }
        if let Some(v) = get("GOOGLE_SHEETS_ACCESS_TOKEN") {
            self.sheets.access_token = Some(v);
        }
        if let Some(v) = get("SUPORTE_BIND") {
            self.server.bind = v;
        }
    }

    /// Check the settings every process needs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("backend.base_url (GLPI_URL)"));
        }
        if !self.backend.base_url.starts_with("http://")
            && !self.backend.base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid {
                field: "backend.base_url",
                reason: format!("'{}' is not an http(s) URL", self.backend.base_url),
            });
        }
        if self.backend.app_token.trim().is_empty() {
            return Err(ConfigError::Missing("backend.app_token (GLPI_APP_TOKEN)"));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "backend.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        self.backend.credentials()?;

        if self.sheets.enabled {
            if non_blank(&self.sheets.spreadsheet_id).is_none() {
                return Err(ConfigError::Missing("sheets.spreadsheet_id (GOOGLE_SHEET_ID)"));
            }
            if non_blank(&self.sheets.access_token).is_none() {
                return Err(ConfigError::Missing(
                    "sheets.access_token (GOOGLE_SHEETS_ACCESS_TOKEN)",
                ));
            }
        }

        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn minimal() -> SuporteConfig {
        SuporteConfig::from_toml_str(
            r#"
[backend]
base_url = "http://helpdesk.local/apirest.php"
app_token = "app-token-123"
user_token = "user-token-456"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = SuporteConfig::default();
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.backend.timeout_secs, 10);
        assert_eq!(config.classifier.policy, MatchPolicy::All);
        assert!(!config.sheets.enabled);
        assert_eq!(config.sheets.range, "Sheet1!A:D");
    }

    #[test]
    fn test_minimal_config_validates() {
        let config = minimal();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.backend.credentials().unwrap(),
            CredentialProvider::UserToken { .. }
        ));
    }

    #[test]
    fn test_missing_app_token() {
        let mut config = minimal();
        config.backend.app_token = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = minimal();
        config.backend.user_token = None;
        config.backend.username = Some("glpi".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn test_user_token_wins_over_password() {
        let mut config = minimal();
        config.backend.username = Some("glpi".to_string());
        config.backend.password = Some("secret".to_string());
        assert!(matches!(
            config.backend.credentials().unwrap(),
            CredentialProvider::UserToken { .. }
        ));

        config.backend.user_token = None;
        assert!(matches!(
            config.backend.credentials().unwrap(),
            CredentialProvider::BasicAuth { .. }
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GLPI_URL", "https://glpi.example/apirest.php"),
            ("GLPI_APP_TOKEN", "from-env"),
            ("VAPI_API_KEY", "vapi-key"),
            ("GOOGLE_SHEET_ID", "sheet-1"),
            ("GLPI_USER", ""),
        ]
        .into_iter()
        .collect();

        let mut config = minimal();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.backend.base_url, "https://glpi.example/apirest.php");
        assert_eq!(config.backend.app_token, "from-env");
        assert_eq!(config.assistant.api_key.as_deref(), Some("vapi-key"));
        assert!(config.sheets.enabled);
        // blank values never override
        assert!(config.backend.username.is_none());
    }

    #[test]
    fn test_enabled_sheets_requires_token() {
        let mut config = minimal();
        config.sheets.enabled = true;
        config.sheets.spreadsheet_id = Some("sheet".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));

        config.sheets.access_token = Some("ya29.token".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut config = minimal();
        config.backend.base_url = "ftp://helpdesk".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "backend.base_url", .. })
        ));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let mut config = minimal();
        config.backend.password = Some("hunter2".to_string());
        let rendered = format!("{:?}", config.backend);
        assert!(!rendered.contains("user-token-456"));
        assert!(!rendered.contains("hunter2"));
    }
}
