//! App Service (Microsoft.Web) data models
//!
//! Wire names follow the ARM JSON schema (camelCase). Objects that are read,
//! modified and written back keep unrecognised properties in `extra` so a
//! round trip does not drop server-side settings.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Pricing tier of a hosting plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkuDescription {
    pub name: String,
    pub tier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
}

impl SkuDescription {
    pub fn new<N: Into<String>, T: Into<String>>(name: N, tier: T) -> Self {
        Self {
            name: name.into(),
            tier: tier.into(),
            capacity: None,
        }
    }
}

/// App Service plan ("server farm")
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerFarm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<SkuDescription>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl ServerFarm {
    pub fn new<S: Into<String>>(location: S, sku: SkuDescription) -> Self {
        Self {
            location: location.into(),
            sku: Some(sku),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SslState {
    Disabled,
    SniEnabled,
    IpBasedEnabled,
}

/// TLS binding state of one host name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNameSslState {
    pub name: String,
    pub ssl_state: SslState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_farm_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name_ssl_states: Option<Vec<HostNameSslState>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Web app
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: SiteProperties,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
}

impl Site {
    /// Create payload for a site hosted on the plan `server_farm_id`
    pub fn new<L: Into<String>, F: Into<String>>(location: L, server_farm_id: F) -> Self {
        Self {
            location: location.into(),
            properties: SiteProperties {
                server_farm_id: Some(server_farm_id.into()),
                ..SiteProperties::default()
            },
            ..Self::default()
        }
    }

    pub fn has_host_name(&self, host_name: &str) -> bool {
        self.properties
            .host_names
            .iter()
            .any(|h| h.eq_ignore_ascii_case(host_name))
    }

    pub fn ssl_state_for(&self, host_name: &str) -> Option<&HostNameSslState> {
        self.properties
            .host_name_ssl_states
            .as_ref()
            .and_then(|states| states.iter().find(|s| s.name.eq_ignore_ascii_case(host_name)))
    }

    /// Add `host_name` with an SNI binding to `thumbprint`.
    ///
    /// Host names and SSL states are compared case-insensitively and only
    /// added when absent. Returns whether the site changed.
    pub fn bind_certificate(&mut self, host_name: &str, thumbprint: &str) -> bool {
        let mut changed = false;

        if !self.has_host_name(host_name) {
            self.properties.host_names.push(host_name.to_string());
            changed = true;
        }

        if self.ssl_state_for(host_name).is_none() {
            self.properties
                .host_name_ssl_states
                .get_or_insert_with(Vec::new)
                .push(HostNameSslState {
                    name: host_name.to_string(),
                    ssl_state: SslState::SniEnabled,
                    thumbprint: Some(thumbprint.to_string()),
                    to_update: Some(true),
                    virtual_ip: None,
                    host_type: None,
                });
            changed = true;
        }

        changed
    }
}

/// Web configuration of a site (`config/web`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: SiteConfigProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfigProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub php_version: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SiteConfig {
    pub fn with_php_version<L: Into<String>, V: Into<String>>(location: L, php_version: V) -> Self {
        Self {
            location: Some(location.into()),
            properties: SiteConfigProperties {
                php_version: Some(php_version.into()),
                extra: Map::new(),
            },
        }
    }
}

/// Application settings (`config/appsettings`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringDictionary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseServerType {
    MySql,
    SQLServer,
    SQLAzure,
    Custom,
    NotificationHub,
    ServiceBus,
    EventHub,
    ApiHub,
    DocDb,
    RedisCache,
    PostgreSQL,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnStringValueTypePair {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: DatabaseServerType,
}

/// Connection strings (`config/connectionstrings`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStringDictionary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, ConnStringValueTypePair>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizableString {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localized_value: Option<String>,
}

/// One usage quota of a site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsmUsageQuota {
    #[serde(default)]
    pub name: LocalizableString,
    #[serde(default)]
    pub current_value: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_reset_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PublishingProfileFormat {
    FileZilla3,
    #[default]
    WebDeploy,
    Ftp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CsmPublishingProfileOptions {
    pub format: PublishingProfileFormat,
}

/// Uploaded TLS certificate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub properties: CertificateProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pfx_blob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_names: Vec<String>,
}

impl Certificate {
    /// Upload payload from a base64 PFX blob
    pub fn from_pfx<L, B, P>(location: L, pfx_blob: B, password: P) -> Self
    where
        L: Into<String>,
        B: Into<String>,
        P: Into<String>,
    {
        Self {
            location: location.into(),
            properties: CertificateProperties {
                pfx_blob: Some(pfx_blob.into()),
                password: Some(password.into()),
                ..CertificateProperties::default()
            },
            ..Self::default()
        }
    }

    pub fn thumbprint(&self) -> Option<&str> {
        self.properties.thumbprint.as_deref()
    }
}
