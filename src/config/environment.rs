//! Azure cloud environment endpoints
//!
//! Each sovereign cloud exposes its own Resource Manager endpoint, Active
//! Directory authority and management resource identifier.

use crate::error::{AzsitesError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AzureEnvironment {
    #[default]
    AzureCloud,
    AzureChinaCloud,
    AzureUSGovernment,
}

impl AzureEnvironment {
    /// Base URL of the Resource Manager API
    pub fn resource_manager(&self) -> &'static str {
        match self {
            Self::AzureCloud => "https://management.azure.com/",
            Self::AzureChinaCloud => "https://management.chinacloudapi.cn/",
            Self::AzureUSGovernment => "https://management.usgovcloudapi.net/",
        }
    }

    /// Active Directory authority host used for token requests
    pub fn active_directory(&self) -> &'static str {
        match self {
            Self::AzureCloud => "https://login.microsoftonline.com/",
            Self::AzureChinaCloud => "https://login.chinacloudapi.cn/",
            Self::AzureUSGovernment => "https://login.microsoftonline.us/",
        }
    }

    /// Resource identifier tokens for the management API are issued against
    pub fn management_resource_id(&self) -> &'static str {
        match self {
            Self::AzureCloud => "https://management.core.windows.net/",
            Self::AzureChinaCloud => "https://management.core.chinacloudapi.cn/",
            Self::AzureUSGovernment => "https://management.core.usgovcloudapi.net/",
        }
    }

    /// OAuth2 v2 scope for the management resource
    pub fn management_scope(&self) -> String {
        format!("{}.default", self.management_resource_id())
    }

    pub fn resource_manager_url(&self) -> Result<Url> {
        Ok(Url::parse(self.resource_manager())?)
    }

    pub fn authority_url(&self) -> Result<Url> {
        Ok(Url::parse(self.active_directory())?)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AzureCloud => "AzureCloud",
            Self::AzureChinaCloud => "AzureChinaCloud",
            Self::AzureUSGovernment => "AzureUSGovernment",
        }
    }
}

impl fmt::Display for AzureEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AzureEnvironment {
    type Err = AzsitesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "azurecloud" | "public" | "azurepubliccloud" => Ok(Self::AzureCloud),
            "azurechinacloud" | "china" => Ok(Self::AzureChinaCloud),
            "azureusgovernment" | "usgov" | "azureusgovernmentcloud" => {
                Ok(Self::AzureUSGovernment)
            }
            _ => Err(AzsitesError::config(format!(
                "Unknown Azure environment '{}'. Expected AzureCloud, AzureChinaCloud or AzureUSGovernment",
                s
            ))),
        }
    }
}
