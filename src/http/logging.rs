//! Request/response logging transport
//!
//! `LoggingHttpSend` decorates another transport. Every request is recorded
//! once before it is forwarded and its response once after it arrives; the
//! response itself is handed back untouched. Transport failures are recorded
//! as failures and returned as-is.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::transport::HttpSend;
use crate::error::{AzsitesError, Result};

const REDACTED: &str = "<redacted>";
const REDACTED_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];
const REDACTED_BODY_KEYS: &[&str] = &[
    "password",
    "pfxBlob",
    "clientSecret",
    "userPWD",
    "publishingPassword",
];

/// Sink for observed HTTP exchanges
pub trait ExchangeLog: Debug + Send + Sync + 'static {
    fn request(&self, req: &http::Request<Bytes>);

    fn response(
        &self,
        method: &Method,
        uri: &Uri,
        resp: &http::Response<Bytes>,
        elapsed: Duration,
    );

    fn failure(&self, method: &Method, uri: &Uri, error: &AzsitesError, elapsed: Duration);
}

/// Emits exchanges as tracing events
#[derive(Debug, Clone)]
pub struct TracingExchangeLog {
    max_body_len: usize,
}

impl TracingExchangeLog {
    pub fn new(max_body_len: usize) -> Self {
        Self { max_body_len }
    }
}

impl Default for TracingExchangeLog {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl ExchangeLog for TracingExchangeLog {
    fn request(&self, req: &http::Request<Bytes>) {
        info!(
            target: "azsites::http",
            method = %req.method(),
            uri = %req.uri(),
            headers = %format_headers(req.headers()),
            body = %render_body(req.body(), self.max_body_len),
            "Request"
        );
    }

    fn response(
        &self,
        method: &Method,
        uri: &Uri,
        resp: &http::Response<Bytes>,
        elapsed: Duration,
    ) {
        info!(
            target: "azsites::http",
            method = %method,
            uri = %uri,
            status = resp.status().as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            headers = %format_headers(resp.headers()),
            body = %render_body(resp.body(), self.max_body_len),
            "Response"
        );
    }

    fn failure(&self, method: &Method, uri: &Uri, error: &AzsitesError, elapsed: Duration) {
        warn!(
            target: "azsites::http",
            method = %method,
            uri = %uri,
            elapsed_ms = elapsed.as_millis() as u64,
            error = %error,
            "Request failed"
        );
    }
}

/// Transport decorator that records every exchange
#[derive(Debug, Clone)]
pub struct LoggingHttpSend {
    inner: Arc<dyn HttpSend>,
    log: Arc<dyn ExchangeLog>,
}

impl LoggingHttpSend {
    pub fn new(inner: Arc<dyn HttpSend>, log: Arc<dyn ExchangeLog>) -> Self {
        Self { inner, log }
    }

    /// Wrap `inner` with the tracing sink
    pub fn with_tracing(inner: Arc<dyn HttpSend>, max_body_len: usize) -> Self {
        Self::new(inner, Arc::new(TracingExchangeLog::new(max_body_len)))
    }
}

#[async_trait]
impl HttpSend for LoggingHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        self.log.request(&req);
        let started = Instant::now();

        match self.inner.http_send(req).await {
            Ok(resp) => {
                self.log.response(&method, &uri, &resp, started.elapsed());
                Ok(resp)
            }
            Err(err) => {
                self.log.failure(&method, &uri, &err, started.elapsed());
                Err(err)
            }
        }
    }
}

/// Render headers as `name: value` pairs, masking credentials
pub fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            format!("{}: {}", name, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Body as lossy UTF-8 with credential values masked, cut at `max_len` bytes
pub fn render_body(body: &Bytes, max_len: usize) -> String {
    if body.is_empty() {
        return String::new();
    }

    let text = redact_body(body);
    if text.len() <= max_len {
        return text;
    }

    let mut cut = max_len;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}... ({} bytes total)", &text[..cut], body.len())
}

fn is_sensitive_key(key: &str) -> bool {
    REDACTED_BODY_KEYS
        .iter()
        .any(|sensitive| key.eq_ignore_ascii_case(sensitive))
}

/// JSON bodies have sensitive members masked; anything else (the
/// publishing-profile XML) has sensitive attributes masked
fn redact_body(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut value) => {
            redact_json(&mut value);
            value.to_string()
        }
        Err(_) => redact_attributes(&String::from_utf8_lossy(body)),
    }
}

fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, member) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *member = Value::String(REDACTED.to_string());
                } else {
                    redact_json(member);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json),
        _ => {}
    }
}

fn redact_attributes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(eq) = rest.find("=\"") {
        let value_start = eq + 2;
        let Some(value_len) = rest[value_start..].find('"') else {
            break;
        };
        let name_start = rest[..eq]
            .rfind(|c: char| c.is_whitespace() || c == '<')
            .map(|i| i + 1)
            .unwrap_or(0);

        out.push_str(&rest[..value_start]);
        if is_sensitive_key(&rest[name_start..eq]) {
            out.push_str(REDACTED);
        } else {
            out.push_str(&rest[value_start..value_start + value_len]);
        }
        out.push('"');
        rest = &rest[value_start + value_len + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingLog {
        events: Mutex<Vec<String>>,
    }

    impl RecordingLog {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ExchangeLog for RecordingLog {
        fn request(&self, req: &http::Request<Bytes>) {
            self.events
                .lock()
                .unwrap()
                .push(format!("request {} {}", req.method(), req.uri()));
        }

        fn response(
            &self,
            method: &Method,
            uri: &Uri,
            resp: &http::Response<Bytes>,
            _elapsed: Duration,
        ) {
            self.events
                .lock()
                .unwrap()
                .push(format!("response {} {} {}", method, uri, resp.status().as_u16()));
        }

        fn failure(&self, method: &Method, uri: &Uri, error: &AzsitesError, _elapsed: Duration) {
            self.events
                .lock()
                .unwrap()
                .push(format!("failure {} {} {}", method, uri, error));
        }
    }

    /// Answers every request with a fixed response, or fails when `fail` is set
    #[derive(Debug)]
    struct FixedTransport {
        fail: bool,
    }

    #[async_trait]
    impl HttpSend for FixedTransport {
        async fn http_send(&self, _req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
            if self.fail {
                return Err(AzsitesError::connection_refused("management.azure.com"));
            }
            Ok(http::Response::builder()
                .status(201)
                .header("x-ms-request-id", "abc-123")
                .header("content-type", "application/json")
                .body(Bytes::from_static(br#"{"name":"rg1"}"#))
                .unwrap())
        }
    }

    fn request() -> http::Request<Bytes> {
        http::Request::builder()
            .method(Method::PUT)
            .uri("https://management.azure.com/subscriptions/sub/resourcegroups/rg1")
            .header("authorization", "Bearer top-secret")
            .body(Bytes::from_static(br#"{"location":"West US"}"#))
            .unwrap()
    }

    #[tokio::test]
    async fn test_response_passes_through_unchanged() {
        let inner = Arc::new(FixedTransport { fail: false });
        let expected = inner.http_send(request()).await.unwrap();

        let log = Arc::new(RecordingLog::default());
        let transport = LoggingHttpSend::new(inner, log.clone());
        let actual = transport.http_send(request()).await.unwrap();

        assert_eq!(actual.status(), expected.status());
        assert_eq!(actual.headers(), expected.headers());
        assert_eq!(actual.body(), expected.body());
    }

    #[tokio::test]
    async fn test_request_then_response_logged_once_each() {
        let log = Arc::new(RecordingLog::default());
        let transport = LoggingHttpSend::new(Arc::new(FixedTransport { fail: false }), log.clone());

        transport.http_send(request()).await.unwrap();

        let uri = "https://management.azure.com/subscriptions/sub/resourcegroups/rg1";
        assert_eq!(
            log.events(),
            vec![format!("request PUT {}", uri), format!("response PUT {} 201", uri)]
        );
    }

    #[tokio::test]
    async fn test_transport_error_propagates_and_is_not_a_response() {
        let log = Arc::new(RecordingLog::default());
        let transport = LoggingHttpSend::new(Arc::new(FixedTransport { fail: true }), log.clone());

        let err = transport.http_send(request()).await.unwrap_err();
        assert!(matches!(err, AzsitesError::ConnectionRefused(ref msg) if msg == "management.azure.com"));

        let events = log.events();
        assert_eq!(events.len(), 2);
        assert!(events[0].starts_with("request PUT"));
        assert!(events[1].starts_with("failure PUT"));
        assert!(!events.iter().any(|e| e.starts_with("response")));
    }

    #[test]
    fn test_authorization_header_is_redacted() {
        let req = request();
        let rendered = format_headers(req.headers());
        assert!(rendered.contains("authorization: <redacted>"));
        assert!(!rendered.contains("top-secret"));
    }

    #[test]
    fn test_render_body_truncates() {
        let body = Bytes::from(vec![b'x'; 20]);
        assert_eq!(render_body(&body, 50), "x".repeat(20));
        assert_eq!(render_body(&body, 5), "xxxxx... (20 bytes total)");
        assert_eq!(render_body(&Bytes::new(), 5), "");
    }

    #[test]
    fn test_certificate_upload_body_is_masked() {
        let body = Bytes::from(
            serde_json::to_vec(&serde_json::json!({
                "location": "West US",
                "properties": {"pfxBlob": "MIIKYQIBAzCCCicGCSqGSIb3", "password": "pfx-pass"}
            }))
            .unwrap(),
        );

        let rendered = render_body(&body, 4096);
        assert!(!rendered.contains("pfx-pass"));
        assert!(!rendered.contains("MIIKYQIBAzCCCicGCSqGSIb3"));
        assert!(rendered.contains("West US"));

        let truncated = render_body(&body, 40);
        assert!(!truncated.contains("pfx-pass"));
        assert!(!truncated.contains("MIIKYQ"));
    }

    #[test]
    fn test_publishing_profile_password_is_masked() {
        let body = Bytes::from_static(
            br#"<publishData><publishProfile profileName="web1 - Web Deploy" userName="$web1" userPWD="hunter2" /></publishData>"#,
        );

        let rendered = render_body(&body, 4096);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains(r#"userPWD="<redacted>""#));
        assert!(rendered.contains(r#"userName="$web1""#));
        assert!(rendered.ends_with("</publishData>"));
    }

    #[test]
    fn test_nested_json_secrets_are_masked() {
        let body = Bytes::from_static(br#"{"value": [{"properties": {"clientSecret": "abc"}}]}"#);
        assert_eq!(
            render_body(&body, 4096),
            r#"{"value":[{"properties":{"clientSecret":"<redacted>"}}]}"#
        );
    }
}
