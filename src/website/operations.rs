//! App Service operations implementation
//!
//! This module covers the Microsoft.Web calls the sample makes: hosting
//! plans, sites and their configuration, usage quotas, publishing profiles,
//! restarts and certificates.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use super::models::{
    Certificate, ConnectionStringDictionary, CsmPublishingProfileOptions, CsmUsageQuota,
    ServerFarm, Site, SiteConfig, StringDictionary,
};
use crate::arm::{ArmClient, Page};
use crate::error::{AzsitesError, Result};

const API_VERSION: &str = "2022-03-01";
const PROVIDER: &str = "Microsoft.Web";

/// Trait for web site operations
#[async_trait]
pub trait WebSiteOperations: Send + Sync {
    /// List sites in a resource group (first page)
    async fn list_sites(&self, resource_group: &str) -> Result<Page<Site>>;

    /// Get a site
    async fn get_site(&self, resource_group: &str, site_name: &str) -> Result<Site>;

    /// Create a site, or update an existing one
    async fn create_or_update_site(
        &self,
        resource_group: &str,
        site_name: &str,
        site: &Site,
    ) -> Result<Site>;

    /// Get an App Service plan
    async fn get_server_farm(&self, resource_group: &str, plan_name: &str) -> Result<ServerFarm>;

    /// Create an App Service plan, or update an existing one
    async fn create_or_update_server_farm(
        &self,
        resource_group: &str,
        plan_name: &str,
        farm: &ServerFarm,
    ) -> Result<ServerFarm>;

    /// Replace the web configuration of a site
    async fn create_or_update_site_config(
        &self,
        resource_group: &str,
        site_name: &str,
        config: &SiteConfig,
    ) -> Result<SiteConfig>;

    /// Replace the application settings of a site
    async fn update_app_settings(
        &self,
        resource_group: &str,
        site_name: &str,
        settings: &StringDictionary,
    ) -> Result<StringDictionary>;

    /// Replace the connection strings of a site
    async fn update_connection_strings(
        &self,
        resource_group: &str,
        site_name: &str,
        strings: &ConnectionStringDictionary,
    ) -> Result<ConnectionStringDictionary>;

    /// Usage quotas of a site
    async fn get_site_usages(
        &self,
        resource_group: &str,
        site_name: &str,
    ) -> Result<Page<CsmUsageQuota>>;

    /// Publishing profile XML document of a site
    async fn get_publishing_profile_xml(
        &self,
        resource_group: &str,
        site_name: &str,
        options: &CsmPublishingProfileOptions,
    ) -> Result<String>;

    /// Restart a site
    async fn restart_site(
        &self,
        resource_group: &str,
        site_name: &str,
        soft_restart: bool,
    ) -> Result<()>;

    /// Upload a certificate, or update an existing one
    async fn create_or_update_certificate(
        &self,
        resource_group: &str,
        certificate_name: &str,
        certificate: &Certificate,
    ) -> Result<Certificate>;

    /// Get a certificate
    async fn get_certificate(
        &self,
        resource_group: &str,
        certificate_name: &str,
    ) -> Result<Certificate>;
}

/// Web site operations over the ARM REST API
pub struct AzureWebSiteOperations {
    client: Arc<ArmClient>,
}

impl AzureWebSiteOperations {
    pub fn new(client: Arc<ArmClient>) -> Self {
        Self { client }
    }

    /// URL of a Microsoft.Web resource inside `resource_group`
    fn web_url(&self, resource_group: &str, tail: &[&str], query: &[(&str, &str)]) -> Result<Url> {
        let mut segments = vec!["resourceGroups", resource_group, "providers", PROVIDER];
        segments.extend_from_slice(tail);
        self.client.subscription_url(&segments, API_VERSION, query)
    }
}

/// Map a 404 from ARM to a named not-found error
fn not_found_as(kind: &str, name: &str) -> impl FnOnce(AzsitesError) -> AzsitesError {
    let kind = kind.to_string();
    let name = name.to_string();
    move |err| {
        if err.status() == Some(404) {
            AzsitesError::not_found(kind, name)
        } else {
            err
        }
    }
}

#[async_trait]
impl WebSiteOperations for AzureWebSiteOperations {
    async fn list_sites(&self, resource_group: &str) -> Result<Page<Site>> {
        let url = self.web_url(resource_group, &["sites"], &[])?;
        self.client.get_json(url).await
    }

    async fn get_site(&self, resource_group: &str, site_name: &str) -> Result<Site> {
        let url = self.web_url(resource_group, &["sites", site_name], &[])?;
        self.client
            .get_json(url)
            .await
            .map_err(not_found_as("Site", site_name))
    }

    async fn create_or_update_site(
        &self,
        resource_group: &str,
        site_name: &str,
        site: &Site,
    ) -> Result<Site> {
        info!("Creating or updating site '{}' in '{}'", site_name, resource_group);
        let url = self.web_url(resource_group, &["sites", site_name], &[])?;
        self.client.put_json(url, site).await
    }

    async fn get_server_farm(&self, resource_group: &str, plan_name: &str) -> Result<ServerFarm> {
        let url = self.web_url(resource_group, &["serverfarms", plan_name], &[])?;
        self.client
            .get_json(url)
            .await
            .map_err(not_found_as("App Service plan", plan_name))
    }

    async fn create_or_update_server_farm(
        &self,
        resource_group: &str,
        plan_name: &str,
        farm: &ServerFarm,
    ) -> Result<ServerFarm> {
        info!(
            "Creating or updating App Service plan '{}' in '{}'",
            plan_name, resource_group
        );
        let url = self.web_url(resource_group, &["serverfarms", plan_name], &[])?;
        match self.client.put_json_accepted(url, farm).await? {
            Some(created) => Ok(created),
            None => {
                debug!("Plan '{}' accepted without a body, reading it back", plan_name);
                self.get_server_farm(resource_group, plan_name).await
            }
        }
    }

    async fn create_or_update_site_config(
        &self,
        resource_group: &str,
        site_name: &str,
        config: &SiteConfig,
    ) -> Result<SiteConfig> {
        let url = self.web_url(resource_group, &["sites", site_name, "config", "web"], &[])?;
        self.client.put_json(url, config).await
    }

    async fn update_app_settings(
        &self,
        resource_group: &str,
        site_name: &str,
        settings: &StringDictionary,
    ) -> Result<StringDictionary> {
        let url = self.web_url(
            resource_group,
            &["sites", site_name, "config", "appsettings"],
            &[],
        )?;
        self.client.put_json(url, settings).await
    }

    async fn update_connection_strings(
        &self,
        resource_group: &str,
        site_name: &str,
        strings: &ConnectionStringDictionary,
    ) -> Result<ConnectionStringDictionary> {
        let url = self.web_url(
            resource_group,
            &["sites", site_name, "config", "connectionstrings"],
            &[],
        )?;
        self.client.put_json(url, strings).await
    }

    async fn get_site_usages(
        &self,
        resource_group: &str,
        site_name: &str,
    ) -> Result<Page<CsmUsageQuota>> {
        let url = self.web_url(resource_group, &["sites", site_name, "usages"], &[])?;
        self.client.get_json(url).await
    }

    async fn get_publishing_profile_xml(
        &self,
        resource_group: &str,
        site_name: &str,
        options: &CsmPublishingProfileOptions,
    ) -> Result<String> {
        let url = self.web_url(resource_group, &["sites", site_name, "publishxml"], &[])?;
        self.client.post_text(url, options).await
    }

    async fn restart_site(
        &self,
        resource_group: &str,
        site_name: &str,
        soft_restart: bool,
    ) -> Result<()> {
        info!(
            "Restarting site '{}' ({} restart)",
            site_name,
            if soft_restart { "soft" } else { "full" }
        );
        let soft = if soft_restart { "true" } else { "false" };
        let url = self.web_url(
            resource_group,
            &["sites", site_name, "restart"],
            &[("softRestart", soft)],
        )?;
        self.client.post_empty(url).await
    }

    async fn create_or_update_certificate(
        &self,
        resource_group: &str,
        certificate_name: &str,
        certificate: &Certificate,
    ) -> Result<Certificate> {
        info!(
            "Uploading certificate '{}' to '{}'",
            certificate_name, resource_group
        );
        let url = self.web_url(resource_group, &["certificates", certificate_name], &[])?;
        self.client.put_json(url, certificate).await
    }

    async fn get_certificate(
        &self,
        resource_group: &str,
        certificate_name: &str,
    ) -> Result<Certificate> {
        let url = self.web_url(resource_group, &["certificates", certificate_name], &[])?;
        self.client
            .get_json(url)
            .await
            .map_err(not_found_as("Certificate", certificate_name))
    }
}
