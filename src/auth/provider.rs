//! Authentication provider trait and implementations
//!
//! This module defines the authentication provider trait and the
//! service-principal (client secret) implementation used to obtain
//! Resource Manager tokens.

use async_trait::async_trait;
use azure_core::auth::{AccessToken, TokenCredential};
use azure_identity::ClientSecretCredential;
use std::sync::Arc;
use tracing::debug;

use crate::config::{AzureEnvironment, Config};
use crate::error::{AzsitesError, Result};
use crate::utils::network::{create_http_client, NetworkConfig};

/// Trait for Azure authentication providers
#[async_trait]
pub trait AzureAuthProvider: Send + Sync {
    /// Get an access token for the specified scopes
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken>;

    /// Get the tenant ID
    async fn get_tenant_id(&self) -> Result<String>;

    /// Get the client ID (if applicable)
    async fn get_client_id(&self) -> Result<Option<String>>;
}

/// Client Secret Authentication Provider
pub struct ClientSecretProvider {
    credential: Arc<ClientSecretCredential>,
    tenant_id: String,
    client_id: String,
}

impl ClientSecretProvider {
    /// Create a provider that exchanges the client secret with the
    /// authority of `environment`
    pub fn new(
        environment: AzureEnvironment,
        tenant_id: String,
        client_id: String,
        client_secret: String,
    ) -> Result<Self> {
        let authority_url = environment.authority_url()?;
        let http_client: Arc<dyn azure_core::HttpClient> =
            Arc::new(create_http_client(&NetworkConfig::default())?);

        debug!(
            "Using authority {} for tenant {}",
            authority_url, tenant_id
        );

        let credential = Arc::new(ClientSecretCredential::new(
            http_client,
            authority_url,
            tenant_id.clone(),
            client_id.clone(),
            client_secret,
        ));

        Ok(Self {
            credential,
            tenant_id,
            client_id,
        })
    }

    /// Build a provider from the service-principal settings
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.environment,
            config.tenant_id.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        )
    }
}

#[async_trait]
impl AzureAuthProvider for ClientSecretProvider {
    async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
        let token_response = self
            .credential
            .get_token(scopes)
            .await
            .map_err(|e| AzsitesError::authentication(format!("Failed to get token: {}", e)))?;

        Ok(token_response)
    }

    async fn get_tenant_id(&self) -> Result<String> {
        Ok(self.tenant_id.clone())
    }

    async fn get_client_id(&self) -> Result<Option<String>> {
        Ok(Some(self.client_id.clone()))
    }
}
