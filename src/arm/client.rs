//! Azure Resource Manager REST client
//!
//! Builds authenticated requests under `/subscriptions/{id}`, sends them
//! through the configured transport and maps rejected calls to typed errors.

use bytes::Bytes;
use http::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::auth::ManagementCredential;
use crate::config::AzureEnvironment;
use crate::error::{AzsitesError, Result};
use crate::http::HttpSend;

const CLIENT_REQUEST_ID: &str = "x-ms-client-request-id";

pub struct ArmClient {
    base_url: Url,
    credential: ManagementCredential,
    transport: Arc<dyn HttpSend>,
}

impl ArmClient {
    /// Client for the Resource Manager endpoint of `environment`
    pub fn new(
        environment: AzureEnvironment,
        credential: ManagementCredential,
        transport: Arc<dyn HttpSend>,
    ) -> Result<Self> {
        Ok(Self::with_base_url(
            environment.resource_manager_url()?,
            credential,
            transport,
        ))
    }

    pub fn with_base_url(
        base_url: Url,
        credential: ManagementCredential,
        transport: Arc<dyn HttpSend>,
    ) -> Self {
        Self {
            base_url,
            credential,
            transport,
        }
    }

    pub fn subscription_id(&self) -> &str {
        self.credential.subscription_id()
    }

    /// ARM resource id for `segments` below the subscription
    pub fn resource_id(&self, segments: &[&str]) -> String {
        let mut id = format!("/subscriptions/{}", self.subscription_id());
        for segment in segments {
            id.push('/');
            id.push_str(segment);
        }
        id
    }

    /// Request URL for `segments` below the subscription, with `api-version`
    /// and any extra query pairs appended
    pub fn subscription_url(
        &self,
        segments: &[&str],
        api_version: &str,
        query: &[(&str, &str)],
    ) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                AzsitesError::invalid_argument(format!(
                    "Resource Manager URL cannot be a base: {}",
                    self.base_url
                ))
            })?;
            path.pop_if_empty()
                .push("subscriptions")
                .push(self.subscription_id())
                .extend(segments);
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("api-version", api_version);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send one authenticated request; non-success statuses become errors
    pub async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Bytes>,
    ) -> Result<http::Response<Bytes>> {
        let request_id = Uuid::new_v4().to_string();
        let mut builder = http::Request::builder()
            .method(method.clone())
            .uri(url.as_str())
            .header(header::AUTHORIZATION, self.credential.bearer())
            .header(header::ACCEPT, "application/json")
            .header(CLIENT_REQUEST_ID, request_id.as_str());
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder.body(body.unwrap_or_default())?;

        debug!("{} {} (client request id {})", method, url.path(), request_id);

        let response = self.transport.http_send(request).await?;
        if !response.status().is_success() {
            return Err(parse_azure_error(response.status(), response.body()));
        }
        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send(Method::GET, url, None).await?;
        parse_json(response.body())
    }

    pub async fn put_json<B, T>(&self, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, url, Some(to_body(body)?)).await?;
        parse_json(response.body())
    }

    /// PUT that may be accepted without a body (long-running create)
    pub async fn put_json_accepted<B, T>(&self, url: Url, body: &B) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, url, Some(to_body(body)?)).await?;
        if response.body().is_empty() {
            return Ok(None);
        }
        parse_json(response.body()).map(Some)
    }

    /// POST returning the body as text (XML documents)
    pub async fn post_text<B>(&self, url: Url, body: &B) -> Result<String>
    where
        B: Serialize + ?Sized,
    {
        let response = self.send(Method::POST, url, Some(to_body(body)?)).await?;
        String::from_utf8(response.body().to_vec())
            .map_err(|e| AzsitesError::serialization(format!("Response is not UTF-8: {}", e)))
    }

    pub async fn post_empty(&self, url: Url) -> Result<()> {
        self.send(Method::POST, url, None).await?;
        Ok(())
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(body)?))
}

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| AzsitesError::serialization(format!("Failed to parse ARM response: {}", e)))
}

/// Parse an ARM error response.
///
/// Most providers wrap failures in `{"error": {"code", "message"}}`; some
/// (Microsoft.Web among them) answer with top-level `Code`/`Message`.
pub fn parse_azure_error(status: StatusCode, body: &[u8]) -> AzsitesError {
    let text = String::from_utf8_lossy(body).into_owned();
    let (code, message) = match serde_json::from_slice::<Value>(body) {
        Ok(json) => {
            let envelope = json.get("error").unwrap_or(&json);
            let field = |lower: &str, upper: &str| {
                envelope
                    .get(lower)
                    .or_else(|| envelope.get(upper))
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            };
            (field("code", "Code"), field("message", "Message"))
        }
        Err(_) => (None, None),
    };

    let code = code.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string()
    });
    let message = message.unwrap_or(text);

    if status == StatusCode::UNAUTHORIZED {
        return AzsitesError::authentication(format!(
            "HTTP 401 ({}): {}. The access token may have expired",
            code, message
        ));
    }

    AzsitesError::azure_api(status.as_u16(), code, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use azure_core::auth::AccessToken;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    #[derive(Debug)]
    struct CapturingTransport {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<http::Request<Bytes>>>,
    }

    impl CapturingTransport {
        fn answering(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl HttpSend for CapturingTransport {
        async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
            self.seen.lock().unwrap().push(req);
            Ok(http::Response::builder()
                .status(self.status)
                .body(Bytes::from_static(self.body.as_bytes()))
                .unwrap())
        }
    }

    fn credential() -> ManagementCredential {
        ManagementCredential::new(
            "sub-123".to_string(),
            "tenant".to_string(),
            "client".to_string(),
            "secret".to_string(),
            AccessToken::new(
                "token-abc".to_string(),
                OffsetDateTime::now_utc() + time::Duration::hours(1),
            ),
        )
    }

    fn client(transport: Arc<CapturingTransport>) -> ArmClient {
        ArmClient::new(AzureEnvironment::AzureCloud, credential(), transport).unwrap()
    }

    #[test]
    fn test_subscription_url_encodes_segments() {
        let client = client(CapturingTransport::answering(200, "{}"));
        let url = client
            .subscription_url(
                &["resourcegroups", "my group"],
                "2021-04-01",
                &[("softRestart", "true")],
            )
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/sub-123/resourcegroups/my%20group?api-version=2021-04-01&softRestart=true"
        );
    }

    #[test]
    fn test_resource_id() {
        let client = client(CapturingTransport::answering(200, "{}"));
        assert_eq!(
            client.resource_id(&["resourceGroups", "rg1", "providers", "Microsoft.Web", "serverfarms", "plan"]),
            "/subscriptions/sub-123/resourceGroups/rg1/providers/Microsoft.Web/serverfarms/plan"
        );
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_token_and_request_id() {
        let transport = CapturingTransport::answering(200, r#"{"value": []}"#);
        let client = client(transport.clone());
        let url = client.subscription_url(&["resourcegroups"], "2021-04-01", &[]).unwrap();

        let _: Value = client.get_json(url).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let headers = seen[0].headers();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer token-abc");
        assert!(headers.contains_key(CLIENT_REQUEST_ID));
        assert!(!headers.contains_key(header::CONTENT_TYPE));
    }

    #[tokio::test]
    async fn test_put_sends_json_body() {
        let transport = CapturingTransport::answering(201, r#"{"name": "rg1"}"#);
        let client = client(transport.clone());
        let url = client.subscription_url(&["resourcegroups", "rg1"], "2021-04-01", &[]).unwrap();

        let created: Value = client
            .put_json(url, &serde_json::json!({"location": "West US"}))
            .await
            .unwrap();
        assert_eq!(created["name"], "rg1");

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].method(), Method::PUT);
        assert_eq!(seen[0].headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(seen[0].body().as_ref(), br#"{"location":"West US"}"#);
    }

    #[tokio::test]
    async fn test_accepted_without_body() {
        let transport = CapturingTransport::answering(202, "");
        let client = client(transport);
        let url = client.subscription_url(&["x"], "2022-03-01", &[]).unwrap();

        let result: Option<Value> = client.put_json_accepted(url, &serde_json::json!({})).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_rejected_call_becomes_api_error() {
        let transport = CapturingTransport::answering(
            409,
            r#"{"error": {"code": "Conflict", "message": "Website with given name already exists."}}"#,
        );
        let client = client(transport);
        let url = client.subscription_url(&["x"], "2022-03-01", &[]).unwrap();

        let err = client.get_json::<Value>(url).await.unwrap_err();
        match err {
            AzsitesError::AzureApiError { status, code, message } => {
                assert_eq!(status, 409);
                assert_eq!(code, "Conflict");
                assert_eq!(message, "Website with given name already exists.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_top_level_web_error() {
        let err = parse_azure_error(
            StatusCode::BAD_REQUEST,
            br#"{"Code": "BadRequest", "Message": "The parameter PhpVersion has an invalid value."}"#,
        );
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("PhpVersion"));
    }

    #[test]
    fn test_parse_non_json_error() {
        let err = parse_azure_error(StatusCode::BAD_GATEWAY, b"upstream failure");
        assert_eq!(
            err.to_string(),
            "Azure API error: HTTP 502 (Bad Gateway): upstream failure"
        );
    }

    #[test]
    fn test_unauthorized_is_authentication_error() {
        let err = parse_azure_error(
            StatusCode::UNAUTHORIZED,
            br#"{"error": {"code": "ExpiredAuthenticationToken", "message": "The access token expiry UTC time is earlier than current UTC time."}}"#,
        );
        assert!(matches!(err, AzsitesError::AuthenticationError(_)));
        assert!(err.to_string().contains("ExpiredAuthenticationToken"));
    }
}
