//! Shared fixtures for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use azure_core::auth::AccessToken;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use url::Url;

use azsites::auth::ManagementCredential;
use azsites::error::{AzsitesError, Result};
use azsites::http::HttpSend;
use azsites::scenario::ManagementContext;

pub const SUBSCRIPTION_ID: &str = "11111111-2222-3333-4444-555555555555";
pub const TOKEN: &str = "eyJ0eXAiOiJKV1QiLCJhbGciOi.test";

/// Transport that answers from a queue and records every request
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<http::Request<Bytes>>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(self: &Arc<Self>, status: u16, body: impl Into<String>) -> Arc<Self> {
        self.responses
            .lock()
            .unwrap()
            .push_back((status, body.into()));
        self.clone()
    }

    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.method().to_string(), r.uri().path().to_string()))
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn authorization(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index].headers()[http::header::AUTHORIZATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    pub fn query(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index]
            .uri()
            .query()
            .unwrap_or_default()
            .to_string()
    }

    pub fn json_body(&self, index: usize) -> serde_json::Value {
        serde_json::from_slice(self.requests.lock().unwrap()[index].body()).unwrap()
    }
}

#[async_trait]
impl HttpSend for ScriptedTransport {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.requests.lock().unwrap().push(req);

        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AzsitesError::network("no scripted response left"))?;

        Ok(http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Bytes::from(body))
            .unwrap())
    }
}

pub fn credential() -> ManagementCredential {
    ManagementCredential::new(
        SUBSCRIPTION_ID.to_string(),
        "contoso.onmicrosoft.com".to_string(),
        "client-app".to_string(),
        "client-secret".to_string(),
        AccessToken::new(
            TOKEN.to_string(),
            OffsetDateTime::now_utc() + time::Duration::hours(1),
        ),
    )
}

pub fn context(transport: Arc<dyn HttpSend>) -> ManagementContext {
    ManagementContext::with_base_url(
        Url::parse("https://management.azure.com/").unwrap(),
        credential(),
        transport,
    )
}

pub fn path(tail: &str) -> String {
    format!("/subscriptions/{}/{}", SUBSCRIPTION_ID, tail)
}
