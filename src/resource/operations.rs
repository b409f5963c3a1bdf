//! Resource group operations implementation

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::models::ResourceGroup;
use crate::arm::{ArmClient, Page};
use crate::error::Result;

const API_VERSION: &str = "2021-04-01";

/// Trait for resource group operations
#[async_trait]
pub trait ResourceGroupOperations: Send + Sync {
    /// List resource groups in the subscription (first page)
    async fn list_resource_groups(&self) -> Result<Page<ResourceGroup>>;

    /// Create a resource group, or update an existing one
    async fn create_or_update_resource_group(
        &self,
        name: &str,
        group: &ResourceGroup,
    ) -> Result<ResourceGroup>;
}

/// Resource group operations over the ARM REST API
pub struct AzureResourceGroupOperations {
    client: Arc<ArmClient>,
}

impl AzureResourceGroupOperations {
    pub fn new(client: Arc<ArmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceGroupOperations for AzureResourceGroupOperations {
    async fn list_resource_groups(&self) -> Result<Page<ResourceGroup>> {
        let url = self
            .client
            .subscription_url(&["resourcegroups"], API_VERSION, &[])?;
        self.client.get_json(url).await
    }

    async fn create_or_update_resource_group(
        &self,
        name: &str,
        group: &ResourceGroup,
    ) -> Result<ResourceGroup> {
        info!("Creating or updating resource group '{}' in {}", name, group.location);
        let url = self
            .client
            .subscription_url(&["resourcegroups", name], API_VERSION, &[])?;
        self.client.put_json(url, group).await
    }
}
