//! The scripted management sequence
//!
//! Each step issues its calls one at a time and stops at the first error.
//! Nothing created by an earlier step is rolled back.

use base64::Engine;
use std::io::Write;
use std::path::Path;
use tracing::info;

use super::context::ManagementContext;
use crate::config::{CertificateSettings, Config, SiteSettings};
use crate::error::{AzsitesError, Result};
use crate::resource::ResourceGroup;
use crate::website::{
    Certificate, ConnStringValueTypePair, ConnectionStringDictionary, CsmPublishingProfileOptions,
    CsmUsageQuota, ServerFarm, Site, SiteConfig, SkuDescription, StringDictionary,
};

/// Print every resource group, each followed by its sites indented
pub async fn list_resource_groups_and_sites<W: Write>(
    ctx: &ManagementContext,
    out: &mut W,
) -> Result<()> {
    let groups = ctx.resource_groups.list_resource_groups().await?;
    if groups.has_more() {
        info!("More resource groups are available than the first page shows");
    }

    for group in &groups {
        writeln!(out, "{}", group.name)?;

        let sites = ctx.websites.list_sites(&group.name).await?;
        for site in &sites {
            writeln!(out, "    {}", site.name)?;
        }
    }

    Ok(())
}

/// Create or update the resource group, plan, site, site configuration,
/// app settings and connection strings described by `settings`
pub async fn provision_site(ctx: &ManagementContext, settings: &SiteSettings) -> Result<Site> {
    let rg = settings.resource_group.as_str();
    let location = settings.location.as_str();

    ctx.resource_groups
        .create_or_update_resource_group(rg, &ResourceGroup::new(location))
        .await?;

    let farm = ServerFarm::new(
        location,
        SkuDescription::new(settings.sku_name.as_str(), settings.sku_tier.as_str()),
    );
    ctx.websites
        .create_or_update_server_farm(rg, &settings.app_service_plan, &farm)
        .await?;

    let site = Site::new(location, ctx.server_farm_id(rg, &settings.app_service_plan));
    let site = ctx
        .websites
        .create_or_update_site(rg, &settings.site_name, &site)
        .await?;

    let site_config = SiteConfig::with_php_version(location, settings.php_version.as_str());
    ctx.websites
        .create_or_update_site_config(rg, &settings.site_name, &site_config)
        .await?;

    let app_settings = StringDictionary {
        location: Some(location.to_string()),
        properties: settings.app_settings.clone(),
    };
    ctx.websites
        .update_app_settings(rg, &settings.site_name, &app_settings)
        .await?;

    let connection_strings = ConnectionStringDictionary {
        location: Some(location.to_string()),
        properties: settings
            .connection_strings
            .iter()
            .map(|(name, setting)| {
                (
                    name.clone(),
                    ConnStringValueTypePair {
                        value: setting.value.clone(),
                        kind: setting.kind,
                    },
                )
            })
            .collect(),
    };
    ctx.websites
        .update_connection_strings(rg, &settings.site_name, &connection_strings)
        .await?;

    Ok(site)
}

/// One printable line per quota
pub fn format_quota(quota: &CsmUsageQuota) -> String {
    format!(
        "    {}: {} {}",
        quota.name.value, quota.current_value, quota.unit
    )
}

pub async fn print_site_quotas<W: Write>(
    ctx: &ManagementContext,
    resource_group: &str,
    site_name: &str,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Site quotas:")?;
    let quotas = ctx.websites.get_site_usages(resource_group, site_name).await?;
    for quota in &quotas {
        writeln!(out, "{}", format_quota(quota))?;
    }
    Ok(())
}

pub async fn print_publishing_profile<W: Write>(
    ctx: &ManagementContext,
    resource_group: &str,
    site_name: &str,
    out: &mut W,
) -> Result<()> {
    let profile_xml = ctx
        .websites
        .get_publishing_profile_xml(
            resource_group,
            site_name,
            &CsmPublishingProfileOptions::default(),
        )
        .await?;
    writeln!(out, "{}", profile_xml)?;
    Ok(())
}

/// Provision the site, report its quotas and publishing profile, then
/// soft-restart it
pub async fn create_site<W: Write>(
    ctx: &ManagementContext,
    settings: &SiteSettings,
    out: &mut W,
) -> Result<()> {
    provision_site(ctx, settings).await?;
    print_site_quotas(ctx, &settings.resource_group, &settings.site_name, out).await?;
    print_publishing_profile(ctx, &settings.resource_group, &settings.site_name, out).await?;
    ctx.websites
        .restart_site(&settings.resource_group, &settings.site_name, true)
        .await
}

/// Read a PFX file and return it base64-encoded
pub async fn read_pfx_blob(path: &Path) -> Result<String> {
    let pfx_bytes = tokio::fs::read(path).await.map_err(|e| {
        AzsitesError::IoError(std::io::Error::new(
            e.kind(),
            format!("Cannot read certificate file {}: {}", path.display(), e),
        ))
    })?;
    Ok(base64::engine::general_purpose::STANDARD.encode(pfx_bytes))
}

/// Upload the PFX certificate into `resource_group`
pub async fn upload_certificate(
    ctx: &ManagementContext,
    resource_group: &str,
    location: &str,
    certificate: &CertificateSettings,
) -> Result<Certificate> {
    let pfx_blob = read_pfx_blob(&certificate.pfx_path).await?;
    let payload = Certificate::from_pfx(location, pfx_blob, certificate.password.as_str());

    ctx.websites
        .create_or_update_certificate(resource_group, &certificate.name, &payload)
        .await
}

/// Add `host_name` to the site and bind the certificate to it with SNI
pub async fn bind_certificate_to_site(
    ctx: &ManagementContext,
    resource_group: &str,
    site_name: &str,
    certificate_name: &str,
    host_name: &str,
) -> Result<Site> {
    let certificate = ctx
        .websites
        .get_certificate(resource_group, certificate_name)
        .await?;
    let thumbprint = certificate
        .thumbprint()
        .ok_or_else(|| AzsitesError::not_found("Certificate thumbprint", certificate_name))?;

    let mut site = ctx.websites.get_site(resource_group, site_name).await?;
    site.bind_certificate(host_name, thumbprint);

    ctx.websites
        .create_or_update_site(resource_group, site_name, &site)
        .await
}

/// The full sample: list, create the site, then upload and bind the
/// certificate when one is configured
pub async fn run_all<W: Write>(ctx: &ManagementContext, config: &Config, out: &mut W) -> Result<()> {
    list_resource_groups_and_sites(ctx, out).await?;

    create_site(ctx, &config.site, out).await?;

    match &config.certificate {
        Some(certificate) => {
            upload_certificate(
                ctx,
                &config.site.resource_group,
                &config.site.location,
                certificate,
            )
            .await?;
            bind_certificate_to_site(
                ctx,
                &config.site.resource_group,
                &config.site.site_name,
                &certificate.name,
                &certificate.host_name,
            )
            .await?;
        }
        None => info!("No certificate configured; skipping certificate upload and binding"),
    }

    Ok(())
}
