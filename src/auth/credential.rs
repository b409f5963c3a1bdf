//! Service-principal management credential
//!
//! A `ManagementCredential` pairs one Resource Manager bearer token with the
//! subscription it is used against. It is acquired once at startup and never
//! refreshed.

use azure_core::auth::AccessToken;
use std::fmt;
use time::OffsetDateTime;
use tracing::info;
use zeroize::Zeroizing;

use super::provider::AzureAuthProvider;
use crate::config::Config;
use crate::error::{AzsitesError, Result};

/// Bearer token plus the service-principal identity it was issued for
#[derive(Clone)]
pub struct ManagementCredential {
    subscription_id: String,
    tenant_id: String,
    client_id: String,
    client_secret: Zeroizing<String>,
    access_token: AccessToken,
}

impl ManagementCredential {
    pub fn new(
        subscription_id: String,
        tenant_id: String,
        client_id: String,
        client_secret: String,
        access_token: AccessToken,
    ) -> Self {
        Self {
            subscription_id,
            tenant_id,
            client_id,
            client_secret: Zeroizing::new(client_secret),
            access_token,
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        self.client_secret.as_str()
    }

    /// Raw bearer token
    pub fn access_token(&self) -> &str {
        self.access_token.token.secret()
    }

    pub fn expires_on(&self) -> OffsetDateTime {
        self.access_token.expires_on
    }

    pub fn is_expired(&self) -> bool {
        self.expires_on() <= OffsetDateTime::now_utc()
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token())
    }
}

impl fmt::Debug for ManagementCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagementCredential")
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("expires_on", &self.expires_on())
            .finish()
    }
}

/// Acquire a Resource Manager credential for the configured service principal.
///
/// Settings are validated before `provider` is asked for anything, so an
/// unedited configuration never reaches the network.
pub async fn acquire_credential(
    config: &Config,
    provider: &dyn AzureAuthProvider,
) -> Result<ManagementCredential> {
    config.validate()?;

    let scope = config.environment.management_scope();
    info!(
        "Acquiring management token for tenant {} ({})",
        config.tenant_id, config.environment
    );

    let token = provider.get_token(&[scope.as_str()]).await?;
    if token.token.secret().is_empty() {
        return Err(AzsitesError::authentication(
            "Identity provider returned an empty access token",
        ));
    }

    Ok(ManagementCredential::new(
        config.subscription_id.clone(),
        config.tenant_id.clone(),
        config.client_id.clone(),
        config.client_secret.clone(),
        token,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeProvider {
        token: Option<String>,
        calls: AtomicUsize,
        scopes: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn issuing(token: &str) -> Self {
            Self {
                token: Some(token.to_string()),
                calls: AtomicUsize::new(0),
                scopes: Mutex::new(Vec::new()),
            }
        }

        fn rejecting() -> Self {
            Self {
                token: None,
                calls: AtomicUsize::new(0),
                scopes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AzureAuthProvider for FakeProvider {
        async fn get_token(&self, scopes: &[&str]) -> Result<AccessToken> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.scopes
                .lock()
                .unwrap()
                .extend(scopes.iter().map(|s| s.to_string()));
            match &self.token {
                Some(token) => Ok(AccessToken::new(
                    token.clone(),
                    OffsetDateTime::now_utc() + time::Duration::hours(1),
                )),
                None => Err(AzsitesError::authentication(
                    "AADSTS7000215: Invalid client secret provided",
                )),
            }
        }

        async fn get_tenant_id(&self) -> Result<String> {
            Ok("tenant".to_string())
        }

        async fn get_client_id(&self) -> Result<Option<String>> {
            Ok(None)
        }
    }

    fn config() -> Config {
        Config {
            subscription_id: "11111111-2222-3333-4444-555555555555".to_string(),
            tenant_id: "contoso.onmicrosoft.com".to_string(),
            client_id: "client-app".to_string(),
            client_secret: "client-secret".to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_valid_settings_yield_credential() {
        let provider = FakeProvider::issuing("eyJ0eXAi.token");
        let credential = acquire_credential(&config(), &provider).await.unwrap();

        assert_eq!(
            credential.subscription_id(),
            "11111111-2222-3333-4444-555555555555"
        );
        assert!(!credential.access_token().is_empty());
        assert_eq!(credential.bearer(), "Bearer eyJ0eXAi.token");
        assert!(!credential.is_expired());
        assert_eq!(
            *provider.scopes.lock().unwrap(),
            vec!["https://management.core.windows.net/.default".to_string()]
        );
    }

    #[tokio::test]
    async fn test_placeholder_subscription_fails_before_token_request() {
        let provider = FakeProvider::issuing("token");
        let mut config = config();
        config.subscription_id = "[your subscription id]".to_string();

        let err = acquire_credential(&config, &provider).await.unwrap_err();

        assert!(matches!(err, AzsitesError::ConfigError(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unset_subscription_fails_before_token_request() {
        let provider = FakeProvider::issuing("token");
        let mut config = config();
        config.subscription_id.clear();

        assert!(acquire_credential(&config, &provider).await.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_secret_is_authentication_error() {
        let provider = FakeProvider::rejecting();
        let err = acquire_credential(&config(), &provider).await.unwrap_err();

        assert!(matches!(err, AzsitesError::AuthenticationError(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let provider = FakeProvider::issuing("");
        let err = acquire_credential(&config(), &provider).await.unwrap_err();
        assert!(matches!(err, AzsitesError::AuthenticationError(_)));
    }

    #[tokio::test]
    async fn test_scope_follows_environment() {
        let provider = FakeProvider::issuing("token");
        let mut config = config();
        config.environment = crate::config::AzureEnvironment::AzureChinaCloud;

        acquire_credential(&config, &provider).await.unwrap();
        assert_eq!(
            provider.scopes.lock().unwrap()[0],
            "https://management.core.chinacloudapi.cn/.default"
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credential = ManagementCredential::new(
            "sub".to_string(),
            "tenant".to_string(),
            "client".to_string(),
            "very-secret".to_string(),
            AccessToken::new("raw-token".to_string(), OffsetDateTime::now_utc()),
        );
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("raw-token"));
        assert!(rendered.contains("sub"));
    }
}
