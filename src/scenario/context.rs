//! Management context
//!
//! Holds the two management clients a run works with. Both share one ARM
//! client, and therefore one credential and one transport.

use std::sync::Arc;
use url::Url;

use crate::arm::ArmClient;
use crate::auth::ManagementCredential;
use crate::config::AzureEnvironment;
use crate::error::Result;
use crate::http::HttpSend;
use crate::resource::{AzureResourceGroupOperations, ResourceGroupOperations};
use crate::website::{AzureWebSiteOperations, WebSiteOperations};

pub struct ManagementContext {
    pub resource_groups: Arc<dyn ResourceGroupOperations>,
    pub websites: Arc<dyn WebSiteOperations>,
    client: Arc<ArmClient>,
}

impl ManagementContext {
    /// Build both clients against the Resource Manager of `environment`
    pub fn new(
        environment: AzureEnvironment,
        credential: ManagementCredential,
        transport: Arc<dyn HttpSend>,
    ) -> Result<Self> {
        let client = ArmClient::new(environment, credential, transport)?;
        Ok(Self::from_client(Arc::new(client)))
    }

    /// Build both clients against an explicit endpoint
    pub fn with_base_url(
        base_url: Url,
        credential: ManagementCredential,
        transport: Arc<dyn HttpSend>,
    ) -> Self {
        Self::from_client(Arc::new(ArmClient::with_base_url(
            base_url, credential, transport,
        )))
    }

    pub fn from_client(client: Arc<ArmClient>) -> Self {
        Self {
            resource_groups: Arc::new(AzureResourceGroupOperations::new(client.clone())),
            websites: Arc::new(AzureWebSiteOperations::new(client.clone())),
            client,
        }
    }

    pub fn subscription_id(&self) -> &str {
        self.client.subscription_id()
    }

    /// ARM resource id of a hosting plan, as sites reference it
    pub fn server_farm_id(&self, resource_group: &str, plan_name: &str) -> String {
        self.client.resource_id(&[
            "resourceGroups",
            resource_group,
            "providers",
            "Microsoft.Web",
            "serverfarms",
            plan_name,
        ])
    }
}
