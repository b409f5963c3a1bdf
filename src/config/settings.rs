//! Configuration settings management
//!
//! This module handles loading configuration from multiple sources,
//! validation, and persistence.

use crate::config::environment::AzureEnvironment;
use crate::error::{AzsitesError, Result};
use crate::website::models::DatabaseServerType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Options for the request/response logging transport
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpLogConfig {
    pub enabled: bool,
    pub max_body_len: usize,
}

impl Default for HttpLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_body_len: 4096,
        }
    }
}

/// A connection string entry as written in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStringSetting {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: DatabaseServerType,
}

/// Names and settings of the site the sample creates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub resource_group: String,
    pub app_service_plan: String,
    pub site_name: String,
    pub location: String,
    pub sku_name: String,
    pub sku_tier: String,
    pub php_version: String,
    pub app_settings: BTreeMap<String, String>,
    pub connection_strings: BTreeMap<String, ConnectionStringSetting>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        let mut app_settings = BTreeMap::new();
        app_settings.insert("MyFirstKey".to_string(), "My first value".to_string());
        app_settings.insert("MySecondKey".to_string(), "My second value".to_string());

        let mut connection_strings = BTreeMap::new();
        connection_strings.insert(
            "MyFirstConnString".to_string(),
            ConnectionStringSetting {
                value: "My SQL conn string".to_string(),
                kind: DatabaseServerType::SQLAzure,
            },
        );
        connection_strings.insert(
            "MySecondConnString".to_string(),
            ConnectionStringSetting {
                value: "My custom conn string".to_string(),
                kind: DatabaseServerType::Custom,
            },
        );

        Self {
            resource_group: "MyResourceGroup".to_string(),
            app_service_plan: "MyAppServicePlan".to_string(),
            // Site names are globally unique; most users will need to change this
            site_name: "SampleSiteFromAPI".to_string(),
            location: "West US".to_string(),
            sku_name: "F1".to_string(),
            sku_tier: "Free".to_string(),
            php_version: "5.6".to_string(),
            app_settings,
            connection_strings,
        }
    }
}

/// Certificate to upload and bind to the site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSettings {
    pub name: String,
    pub pfx_path: PathBuf,
    pub password: String,
    pub host_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    pub no_color: bool,
    pub environment: AzureEnvironment,
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub http_log: HttpLogConfig,
    pub site: SiteSettings,
    pub certificate: Option<CertificateSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            no_color: false,
            environment: AzureEnvironment::default(),
            subscription_id: String::new(),
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            http_log: HttpLogConfig::default(),
            site: SiteSettings::default(),
            certificate: None,
        }
    }
}

/// True for unset values and for the bracketed placeholders written by `config init`
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value.starts_with('[')
        || (value.starts_with('<') && value.ends_with('>'))
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with placeholder credentials, as written by `config init`
    pub fn template() -> Self {
        Self {
            subscription_id: "[your subscription id]".to_string(),
            tenant_id: "[your tenant id]".to_string(),
            client_id: "[your client id]".to_string(),
            client_secret: "[your client secret]".to_string(),
            ..Self::default()
        }
    }

    /// Reject unset or placeholder service-principal settings
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("subscription_id", "AZURE_SUBSCRIPTION_ID", &self.subscription_id),
            ("tenant_id", "AZURE_TENANT_ID", &self.tenant_id),
            ("client_id", "AZURE_CLIENT_ID", &self.client_id),
            ("client_secret", "AZURE_CLIENT_SECRET", &self.client_secret),
        ];

        for (key, env_var, value) in required {
            if is_placeholder(value) {
                return Err(AzsitesError::config(format!(
                    "You need to set '{}' in the configuration file (or {}) to run this sample",
                    key, env_var
                )));
            }
        }

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        // Use XDG Base Directory specification on Linux and macOS
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            use std::env;
            let config_dir = if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME") {
                PathBuf::from(xdg_config_home)
            } else {
                let home_dir = env::var("HOME")
                    .map_err(|_| AzsitesError::config("HOME environment variable not set"))?;
                PathBuf::from(home_dir).join(".config")
            };
            Ok(config_dir.join("azsites").join("azsites.toml"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let config_dir = dirs::config_dir()
                .ok_or_else(|| AzsitesError::config("Unable to determine config directory"))?;
            Ok(config_dir.join("azsites").join("azsites.toml"))
        }
    }

    /// Key/value view of the configuration with the client secret masked
    pub fn summary_pairs(&self) -> Vec<(&'static str, String)> {
        let secret = if self.client_secret.is_empty() {
            "(unset)".to_string()
        } else if is_placeholder(&self.client_secret) {
            self.client_secret.clone()
        } else {
            "********".to_string()
        };

        let mut pairs = vec![
            ("Environment", self.environment.to_string()),
            ("Subscription ID", self.subscription_id.clone()),
            ("Tenant ID", self.tenant_id.clone()),
            ("Client ID", self.client_id.clone()),
            ("Client Secret", secret),
            ("Resource Group", self.site.resource_group.clone()),
            ("App Service Plan", self.site.app_service_plan.clone()),
            ("Site", self.site.site_name.clone()),
            ("Location", self.site.location.clone()),
            (
                "SKU",
                format!("{} ({})", self.site.sku_name, self.site.sku_tier),
            ),
            ("HTTP Logging", self.http_log.enabled.to_string()),
        ];

        if let Some(cert) = &self.certificate {
            pairs.push(("Certificate", cert.name.clone()));
            pairs.push(("Certificate File", cert.pfx_path.display().to_string()));
            pairs.push(("Host Name", cert.host_name.clone()));
        }

        pairs
    }
}

/// Load configuration from multiple sources with priority order:
/// 1. Command-line flags (applied by the CLI afterwards)
/// 2. Environment variables, read through `lookup`
/// 3. Configuration file at `path` (or the default location)
/// 4. Default values
///
/// A missing default file yields defaults. A missing explicit `path` is an
/// error unless `require_explicit_file` is false, which lets `config init`
/// create it. Validation is left to the caller.
pub async fn load_config_from<F>(
    path: Option<&Path>,
    require_explicit_file: bool,
    lookup: F,
) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = Config::default();

    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::get_config_path()?,
    };
    if config_path.exists() {
        config = load_from_file(&config_path).await?;
    } else if path.is_some() && require_explicit_file {
        return Err(AzsitesError::config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    apply_env_overrides(&mut config, lookup)?;

    Ok(config)
}

async fn load_from_file(path: &Path) -> Result<Config> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_config(&contents)
}

/// Parse TOML, falling back to JSON
pub fn parse_config(contents: &str) -> Result<Config> {
    match toml::from_str::<Config>(contents) {
        Ok(config) => Ok(config),
        Err(toml_err) => serde_json::from_str::<Config>(contents).map_err(|_| {
            AzsitesError::config(format!("Invalid configuration file: {}", toml_err))
        }),
    }
}

/// Apply environment overrides using `lookup` to read variables
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("DEBUG") {
        config.debug = value.to_lowercase() == "true" || value == "1";
    }

    if lookup("NO_COLOR").is_some() {
        config.no_color = true;
    }

    if let Some(value) = lookup("AZURE_ENVIRONMENT") {
        config.environment = value.parse()?;
    }

    if let Some(value) = lookup("AZURE_SUBSCRIPTION_ID") {
        config.subscription_id = value;
    }

    if let Some(value) = lookup("AZURE_TENANT_ID") {
        config.tenant_id = value;
    }

    if let Some(value) = lookup("AZURE_CLIENT_ID") {
        config.client_id = value;
    }

    if let Some(value) = lookup("AZURE_CLIENT_SECRET") {
        config.client_secret = value;
    }

    Ok(())
}

pub async fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| AzsitesError::serialization(e.to_string()))?;

    tokio::fs::write(path, contents).await?;

    Ok(())
}

/// Write a configuration template with placeholder credentials.
///
/// An existing file is left alone unless `force` is set. Returns whether a
/// file was written.
pub async fn init_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }

    save_config(&Config::template(), path).await?;

    Ok(true)
}
