//! Configuration system for jobprov.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/jobprov/config.toml` and/or `.jobprov/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Top-level configuration for provenance capture and reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvenanceConfig {
    /// Public base URL of the portal; activity and output URIs hang off it.
    pub server_url: String,
    /// PROMS registry endpoint that receives reports.
    pub registry_url: String,
    /// Key under which a job's activity graph is stored.
    pub activity_file_name: String,
    /// Label of the service entity that identifies this portal.
    pub service_title: String,
    /// Identifier of the storage service backed by `storage_root`.
    pub storage_id: String,
    /// Root directory for the local storage backend.
    pub storage_root: PathBuf,
    /// Root directory where files are staged before upload.
    pub staging_root: PathBuf,
    pub http: HttpConfig,
    pub identity: IdentityConfig,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        let data_dir = directories::ProjectDirs::from("org", "jobprov", "jobprov")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".jobprov"));
        Self {
            server_url: "http://localhost:8080".to_string(),
            registry_url: "http://localhost:5000/id/report/".to_string(),
            activity_file_name: "activity.ttl".to_string(),
            service_title: "Job portal".to_string(),
            storage_id: "local".to_string(),
            storage_root: data_dir.join("storage"),
            staging_root: data_dir.join("staging"),
            http: HttpConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}

impl ProvenanceConfig {
    /// Check that both endpoints are absolute URLs and required names are set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url("server_url", &self.server_url)?;
        self.registry()?;
        if self.activity_file_name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "activity_file_name".into(),
            });
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                message: "http.timeout_secs must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// The registry endpoint as a parsed URL.
    pub fn registry(&self) -> Result<Url, ConfigError> {
        parse_url("registry_url", &self.registry_url)
    }
}

fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::Invalid {
        message: format!("{field} '{value}' is not a valid URL: {e}"),
    })
}

/// HTTP client settings for registry submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Static user-to-profile-link table for the built-in identity resolver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub links: HashMap<String, String>,
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `JOBPROV_`)
/// 3. Workspace-local config (`.jobprov/config.toml`)
/// 4. User config (`~/.config/jobprov/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ProvenanceConfig>,
) -> Result<ProvenanceConfig, Box<figment::Error>> {
    figment(workspace, overrides).extract().map_err(Box::new)
}

/// Load configuration with an explicit config file layered above the
/// workspace file.
pub fn load_config_file(
    workspace: Option<&Path>,
    file: &Path,
) -> Result<ProvenanceConfig, Box<figment::Error>> {
    figment(workspace, None)
        .merge(Toml::file(file))
        .merge(Env::prefixed("JOBPROV_").split("__"))
        .extract()
        .map_err(Box::new)
}

fn figment(workspace: Option<&Path>, overrides: Option<&ProvenanceConfig>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(ProvenanceConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("org", "jobprov", "jobprov") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".jobprov").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (JOBPROV_SERVER_URL, JOBPROV_HTTP__TIMEOUT_SECS, etc.)
    figment = figment.merge(Env::prefixed("JOBPROV_").split("__"));

    // Explicit overrides
    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment
}
