//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! resolves command-line values over the loaded configuration and runs
//! the selected command.

use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;
use tracing::{debug, info};

use crate::auth::{acquire_credential, ClientSecretProvider};
use crate::config::{
    init_default_config, load_config_from, AzureEnvironment, CertificateSettings, Config,
    SiteSettings,
};
use crate::error::{AzsitesError, Result};
use crate::http::{HttpSend, LoggingHttpSend, ReqwestHttpSend};
use crate::scenario::{self, ManagementContext};
use crate::utils::format::{format_table, DisplayUtils};

#[derive(Parser, Debug)]
#[command(name = "azsites")]
#[command(about = "Manage Azure resource groups, App Service sites and certificates")]
#[command(version, author)]
pub struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH", env = "AZSITES_CONFIG")]
    pub config: Option<PathBuf>,

    /// Azure cloud (AzureCloud, AzureChinaCloud, AzureUSGovernment)
    #[arg(long, global = true, value_name = "ENV")]
    pub environment: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Site selection shared by the site commands
#[derive(Args, Debug, Clone, Default)]
pub struct SiteArgs {
    /// Resource group name
    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Site name
    #[arg(long, short = 's')]
    pub site: Option<String>,
}

/// Everything `create-site` can override
#[derive(Args, Debug, Clone, Default)]
pub struct CreateSiteArgs {
    #[command(flatten)]
    pub target: SiteArgs,

    /// App Service plan name
    #[arg(long)]
    pub plan: Option<String>,

    /// Azure region, e.g. "West US"
    #[arg(long, short = 'l')]
    pub location: Option<String>,

    /// Plan SKU name, e.g. F1 or B1
    #[arg(long)]
    pub sku: Option<String>,

    /// Plan SKU tier, e.g. Free or Basic
    #[arg(long)]
    pub tier: Option<String>,

    /// PHP version for the site configuration
    #[arg(long)]
    pub php_version: Option<String>,
}

/// Certificate settings for `upload-cert` and `bind-cert`
#[derive(Args, Debug, Clone, Default)]
pub struct CertArgs {
    /// Certificate resource name
    #[arg(long)]
    pub name: Option<String>,

    /// PFX file to upload
    #[arg(long, value_name = "FILE")]
    pub pfx: Option<PathBuf>,

    /// PFX password
    #[arg(long, env = "AZSITES_PFX_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Host name to bind the certificate to
    #[arg(long)]
    pub host_name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full sample: list, create a site, upload and bind the certificate
    Run {
        #[command(flatten)]
        site: CreateSiteArgs,
    },
    /// List resource groups and the sites inside each of them (alias: ls)
    #[command(alias = "ls")]
    List,
    /// Create or update the resource group, plan and site, then restart it
    CreateSite {
        #[command(flatten)]
        site: CreateSiteArgs,
    },
    /// Show the usage quotas of a site
    Quotas {
        #[command(flatten)]
        target: SiteArgs,
    },
    /// Print the WebDeploy publishing profile of a site
    PublishProfile {
        #[command(flatten)]
        target: SiteArgs,
    },
    /// Restart a site
    Restart {
        #[command(flatten)]
        target: SiteArgs,
        /// Full restart instead of a soft restart
        #[arg(long)]
        hard: bool,
    },
    /// Upload a PFX certificate
    UploadCert {
        #[command(flatten)]
        target: SiteArgs,
        #[command(flatten)]
        cert: CertArgs,
        /// Azure region of the certificate
        #[arg(long, short = 'l')]
        location: Option<String>,
    },
    /// Bind an uploaded certificate to a host name of a site
    BindCert {
        #[command(flatten)]
        target: SiteArgs,
        #[command(flatten)]
        cert: CertArgs,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a configuration file with placeholder credentials
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show the resolved configuration
    Show,
    /// Show the configuration file path
    Path,
}

impl SiteArgs {
    pub fn apply(&self, site: &mut SiteSettings) {
        if let Some(resource_group) = &self.resource_group {
            site.resource_group = resource_group.clone();
        }
        if let Some(name) = &self.site {
            site.site_name = name.clone();
        }
    }
}

impl CreateSiteArgs {
    pub fn apply(&self, site: &mut SiteSettings) {
        self.target.apply(site);

        let overrides = [
            (&self.plan, &mut site.app_service_plan),
            (&self.location, &mut site.location),
            (&self.sku, &mut site.sku_name),
            (&self.tier, &mut site.sku_tier),
            (&self.php_version, &mut site.php_version),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value.clone();
            }
        }
    }
}

impl CertArgs {
    /// Merge over the configured certificate section; a name is required
    pub fn resolve(&self, configured: Option<&CertificateSettings>) -> Result<CertificateSettings> {
        let mut cert = configured.cloned().unwrap_or(CertificateSettings {
            name: String::new(),
            pfx_path: PathBuf::new(),
            password: String::new(),
            host_name: String::new(),
        });

        if let Some(name) = &self.name {
            cert.name = name.clone();
        }
        if let Some(pfx) = &self.pfx {
            cert.pfx_path = pfx.clone();
        }
        if let Some(password) = &self.password {
            cert.password = password.clone();
        }
        if let Some(host_name) = &self.host_name {
            cert.host_name = host_name.clone();
        }

        if cert.name.trim().is_empty() {
            return Err(AzsitesError::invalid_argument(
                "Certificate name is required (--name or [certificate] name)",
            ));
        }

        Ok(cert)
    }
}

impl Cli {
    /// Load the configuration this command needs.
    ///
    /// Config commands accept a missing file and skip validation; every
    /// other command requires complete service-principal settings.
    pub async fn load_config(&self) -> Result<Config> {
        self.load_config_with_env(|key| std::env::var(key).ok()).await
    }

    pub async fn load_config_with_env<F>(&self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = self.config.as_deref();
        match self.command {
            Commands::Config { .. } => load_config_from(path, false, lookup).await,
            _ => {
                let config = load_config_from(path, true, lookup).await?;
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Default tracing filter, raised to debug by `--debug` or `debug = true`
    pub fn log_filter(&self, config: &Config) -> &'static str {
        if self.debug || config.debug {
            "azsites=debug"
        } else {
            "azsites=info"
        }
    }

    /// Apply the global flags that override configuration
    pub fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if let Some(environment) = &self.environment {
            config.environment = environment.parse::<AzureEnvironment>()?;
        }
        if self.debug {
            config.debug = true;
        }
        if self.no_color {
            config.no_color = true;
        }
        Ok(())
    }

    pub async fn execute(self, mut config: Config) -> Result<()> {
        self.apply_overrides(&mut config)?;
        let config_path = self.config;

        match self.command {
            Commands::Config { command } => {
                execute_config_command(command, config_path, &config).await
            }
            Commands::Run { site } => {
                site.apply(&mut config.site);
                execute_run(&config).await
            }
            Commands::List => execute_list(&config).await,
            Commands::CreateSite { site } => {
                site.apply(&mut config.site);
                execute_create_site(&config).await
            }
            Commands::Quotas { target } => {
                target.apply(&mut config.site);
                execute_quotas(&config).await
            }
            Commands::PublishProfile { target } => {
                target.apply(&mut config.site);
                execute_publish_profile(&config).await
            }
            Commands::Restart { target, hard } => {
                target.apply(&mut config.site);
                execute_restart(&config, hard).await
            }
            Commands::UploadCert {
                target,
                cert,
                location,
            } => {
                target.apply(&mut config.site);
                if let Some(location) = location {
                    config.site.location = location;
                }
                let cert = cert.resolve(config.certificate.as_ref())?;
                execute_upload_cert(&config, &cert).await
            }
            Commands::BindCert { target, cert } => {
                target.apply(&mut config.site);
                let cert = cert.resolve(config.certificate.as_ref())?;
                execute_bind_cert(&config, &cert).await
            }
        }
    }
}

/// Transport for management calls, wrapped in the exchange logger when enabled
pub fn build_transport(config: &Config) -> Result<Arc<dyn HttpSend>> {
    let transport: Arc<dyn HttpSend> = Arc::new(ReqwestHttpSend::with_defaults()?);
    if config.http_log.enabled {
        debug!(
            "HTTP exchange logging enabled (bodies truncated at {} bytes)",
            config.http_log.max_body_len
        );
        Ok(Arc::new(LoggingHttpSend::with_tracing(
            transport,
            config.http_log.max_body_len,
        )))
    } else {
        Ok(transport)
    }
}

/// Authenticate and build the management context for `config`
pub async fn connect(config: &Config) -> Result<ManagementContext> {
    let provider = ClientSecretProvider::from_config(config)?;
    let credential = acquire_credential(config, &provider).await?;
    info!(
        "Authenticated; token valid until {}",
        credential.expires_on()
    );

    ManagementContext::new(config.environment, credential, build_transport(config)?)
}

async fn execute_run(config: &Config) -> Result<()> {
    let display = DisplayUtils::new(config.no_color);
    let ctx = connect(config).await?;
    let mut out = std::io::stdout();

    display.print_header(&format!(
        "Running sample against '{}' in '{}'",
        config.site.site_name, config.site.resource_group
    ));
    if config.certificate.is_none() {
        display.print_info("No [certificate] section configured; certificate steps will be skipped");
    }

    scenario::run_all(&ctx, config, &mut out).await?;

    display.print_success(&format!("Site '{}' is ready", config.site.site_name));
    if let Some(cert) = &config.certificate {
        display.print_success(&format!(
            "Certificate '{}' bound to {} with SNI",
            cert.name, cert.host_name
        ));
    }
    Ok(())
}

async fn execute_list(config: &Config) -> Result<()> {
    let ctx = connect(config).await?;
    let mut out = std::io::stdout();
    scenario::list_resource_groups_and_sites(&ctx, &mut out).await?;
    out.flush()?;
    Ok(())
}

async fn execute_create_site(config: &Config) -> Result<()> {
    let display = DisplayUtils::new(config.no_color);
    let ctx = connect(config).await?;
    let mut out = std::io::stdout();

    scenario::create_site(&ctx, &config.site, &mut out).await?;
    display.print_success(&format!(
        "Site '{}' created in '{}' and restarted",
        config.site.site_name, config.site.resource_group
    ));
    Ok(())
}

#[derive(Tabled)]
struct QuotaRow {
    #[tabled(rename = "Quota")]
    name: String,
    #[tabled(rename = "Current")]
    current: i64,
    #[tabled(rename = "Limit")]
    limit: i64,
    #[tabled(rename = "Unit")]
    unit: String,
}

async fn execute_quotas(config: &Config) -> Result<()> {
    let display = DisplayUtils::new(config.no_color);
    let ctx = connect(config).await?;

    let quotas = ctx
        .websites
        .get_site_usages(&config.site.resource_group, &config.site.site_name)
        .await?;

    let rows: Vec<QuotaRow> = quotas
        .into_iter()
        .map(|q| QuotaRow {
            name: q.name.value,
            current: q.current_value,
            limit: q.limit,
            unit: q.unit,
        })
        .collect();

    display.print_header(&format!("Quotas for '{}'", config.site.site_name));
    println!("{}", format_table(&rows, config.no_color));
    Ok(())
}

async fn execute_publish_profile(config: &Config) -> Result<()> {
    let ctx = connect(config).await?;
    let mut out = std::io::stdout();
    scenario::print_publishing_profile(
        &ctx,
        &config.site.resource_group,
        &config.site.site_name,
        &mut out,
    )
    .await
}

async fn execute_restart(config: &Config, hard: bool) -> Result<()> {
    let display = DisplayUtils::new(config.no_color);
    let ctx = connect(config).await?;

    ctx.websites
        .restart_site(&config.site.resource_group, &config.site.site_name, !hard)
        .await?;
    display.print_success(&format!(
        "Restarted '{}' ({})",
        config.site.site_name,
        if hard { "full restart" } else { "soft restart" }
    ));
    Ok(())
}

async fn execute_upload_cert(config: &Config, cert: &CertificateSettings) -> Result<()> {
    if cert.pfx_path.as_os_str().is_empty() {
        return Err(AzsitesError::invalid_argument(
            "PFX file is required (--pfx or [certificate] pfx_path)",
        ));
    }

    let display = DisplayUtils::new(config.no_color);
    let ctx = connect(config).await?;

    let uploaded = scenario::upload_certificate(
        &ctx,
        &config.site.resource_group,
        &config.site.location,
        cert,
    )
    .await?;

    display.print_success(&format!("Uploaded certificate '{}'", cert.name));
    if let Some(thumbprint) = uploaded.thumbprint() {
        println!(
            "{}",
            display.format_key_value_pairs(&[("Thumbprint", thumbprint.to_string())])
        );
    }
    Ok(())
}

async fn execute_bind_cert(config: &Config, cert: &CertificateSettings) -> Result<()> {
    if cert.host_name.trim().is_empty() {
        return Err(AzsitesError::invalid_argument(
            "Host name is required (--host-name or [certificate] host_name)",
        ));
    }

    let display = DisplayUtils::new(config.no_color);
    let ctx = connect(config).await?;

    scenario::bind_certificate_to_site(
        &ctx,
        &config.site.resource_group,
        &config.site.site_name,
        &cert.name,
        &cert.host_name,
    )
    .await?;

    display.print_success(&format!(
        "Bound '{}' to {} on '{}'",
        cert.name, cert.host_name, config.site.site_name
    ));
    Ok(())
}

async fn execute_config_command(
    command: ConfigCommands,
    config_path: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let display = DisplayUtils::new(config.no_color);
    let path = match config_path {
        Some(path) => path,
        None => Config::get_config_path()?,
    };

    match command {
        ConfigCommands::Init { force } => {
            if init_default_config(&path, force).await? {
                display.print_success(&format!("Wrote {}", path.display()));
                display.print_info("Fill in the service principal settings before running");
            } else {
                display.print_warning(&format!(
                    "{} already exists; use --force to overwrite it",
                    path.display()
                ));
            }
        }
        ConfigCommands::Show => {
            display.print_header("Configuration");
            println!("{}", display.format_key_value_pairs(&config.summary_pairs()));
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
    }

    Ok(())
}
