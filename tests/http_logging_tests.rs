//! The exchange logger wrapped around the management transport

mod common;

use bytes::Bytes;
use http::{Method, Uri};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use azsites::error::AzsitesError;
use azsites::http::{format_headers, ExchangeLog, LoggingHttpSend};
use azsites::resource::ResourceGroup;
use common::{context, ScriptedTransport};

#[derive(Debug, Default)]
struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl ExchangeLog for MemoryLog {
    fn request(&self, req: &http::Request<Bytes>) {
        self.lines.lock().unwrap().push(format!(
            "request {} {} [{}]",
            req.method(),
            req.uri().path(),
            format_headers(req.headers())
        ));
    }

    fn response(
        &self,
        method: &Method,
        uri: &Uri,
        resp: &http::Response<Bytes>,
        _elapsed: Duration,
    ) {
        self.lines.lock().unwrap().push(format!(
            "response {} {} {}",
            method,
            uri.path(),
            resp.status().as_u16()
        ));
    }

    fn failure(&self, method: &Method, uri: &Uri, error: &AzsitesError, _elapsed: Duration) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("failure {} {} {}", method, uri.path(), error));
    }
}

#[tokio::test]
async fn test_each_management_call_is_logged_once_in_order() {
    let inner = ScriptedTransport::new()
        .respond(201, r#"{"name": "rg1", "location": "westus"}"#)
        .respond(200, r#"{"value": [{"name": "rg1", "location": "westus"}]}"#);
    let log = Arc::new(MemoryLog::default());
    let ctx = context(Arc::new(LoggingHttpSend::new(inner.clone(), log.clone())));

    ctx.resource_groups
        .create_or_update_resource_group("rg1", &ResourceGroup::new("West US"))
        .await
        .unwrap();
    let groups = ctx.resource_groups.list_resource_groups().await.unwrap();
    assert_eq!(groups.value.len(), 1);

    let lines = log.lines.lock().unwrap();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("request PUT "));
    assert!(lines[1].starts_with("response PUT ") && lines[1].ends_with(" 201"));
    assert!(lines[2].starts_with("request GET "));
    assert!(lines[3].starts_with("response GET ") && lines[3].ends_with(" 200"));
    assert!(!lines[0].contains(common::TOKEN));
}

#[tokio::test]
async fn test_rejected_call_is_logged_as_response_not_failure() {
    let inner = ScriptedTransport::new().respond(
        403,
        r#"{"error": {"code": "AuthorizationFailed", "message": "The client does not have authorization"}}"#,
    );
    let log = Arc::new(MemoryLog::default());
    let ctx = context(Arc::new(LoggingHttpSend::new(inner, log.clone())));

    let err = ctx.resource_groups.list_resource_groups().await.unwrap_err();
    assert_eq!(err.status(), Some(403));

    let lines = log.lines.lock().unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("response GET ") && lines[1].ends_with(" 403"));
}

#[tokio::test]
async fn test_transport_failure_is_logged_as_failure() {
    // No scripted responses: the inner transport fails
    let inner = ScriptedTransport::new();
    let log = Arc::new(MemoryLog::default());
    let ctx = context(Arc::new(LoggingHttpSend::new(inner, log.clone())));

    let err = ctx.resource_groups.list_resource_groups().await.unwrap_err();
    assert!(matches!(err, AzsitesError::NetworkError(_)));

    let lines = log.lines.lock().unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("failure GET "));
}
