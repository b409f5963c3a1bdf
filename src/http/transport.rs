//! HTTP transport abstraction
//!
//! Management calls are expressed as `http::Request<Bytes>` and answered with a
//! fully buffered `http::Response<Bytes>`, which keeps transports easy to wrap
//! and to replace in tests.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::fmt::Debug;

use crate::error::Result;
use crate::utils::network::{classify_network_error, create_http_client, NetworkConfig};

/// Sends one HTTP request and returns the complete response
#[async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>>;
}

/// Network transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Transport with the default timeouts and user agent
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(create_http_client(&NetworkConfig::default())?))
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let url = req.uri().to_string();
        let req = reqwest::Request::try_from(req)?;

        let resp = self
            .client
            .execute(req)
            .await
            .map_err(|e| classify_network_error(&e, &url))?;

        let mut builder = http::Response::builder()
            .status(resp.status())
            .version(resp.version());
        if let Some(headers) = builder.headers_mut() {
            headers.extend(resp.headers().clone());
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| classify_network_error(&e, &url))?;

        Ok(builder.body(body)?)
    }
}
