use crate::error::{AzsitesError, Result};
use reqwest::Client;
use std::time::Duration;

/// Configuration for HTTP client with proper timeouts
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: format!("azsites/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .build()
        .map_err(|e| AzsitesError::network(format!("Failed to create HTTP client: {}", e)))
}

/// Turn a transport-level reqwest failure into a user-facing error
pub fn classify_network_error(error: &reqwest::Error, url: &str) -> AzsitesError {
    let host = extract_host(url);

    if error.is_timeout() {
        return AzsitesError::connection_timeout(format!(
            "Request to '{}' timed out. This might be due to network issues or the endpoint being unreachable.",
            host
        ));
    }

    if error.is_connect() {
        if is_dns_resolution_error(error) {
            return AzsitesError::network(format!(
                "Unable to resolve '{}'. Please check your network and the selected Azure environment.",
                host
            ));
        }

        if error
            .to_string()
            .to_lowercase()
            .contains("connection refused")
        {
            return AzsitesError::connection_refused(format!(
                "Connection to '{}' was refused. The service may be temporarily unavailable.",
                host
            ));
        }

        return AzsitesError::network(format!(
            "Failed to connect to '{}'. Please check your network connection.",
            host
        ));
    }

    let message = error.to_string().to_lowercase();
    if message.contains("ssl") || message.contains("tls") || message.contains("certificate") {
        return AzsitesError::ssl_error(format!(
            "SSL/TLS connection error when accessing '{}': {}",
            host, error
        ));
    }

    AzsitesError::network(format!("Network error when accessing '{}': {}", host, error))
}

fn is_dns_resolution_error(error: &reqwest::Error) -> bool {
    let error_msg = error.to_string().to_lowercase();
    let dns_indicators = [
        "dns",
        "name resolution",
        "resolve",
        "lookup",
        "name or service not known",
        "nodename nor servname provided",
        "no such host",
        "host not found",
        "getaddrinfo failed",
    ];

    dns_indicators
        .iter()
        .any(|&indicator| error_msg.contains(indicator))
}

/// Host part of `url`, or the input itself when it does not parse
fn extract_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_host() {
        let url = "https://management.azure.com/subscriptions/abc/resourcegroups?api-version=2021-04-01";
        assert_eq!(extract_host(url), "management.azure.com");
        assert_eq!(extract_host("not a url"), "not a url");
    }

    #[test]
    fn test_default_network_config() {
        let config = NetworkConfig::default();
        assert!(config.user_agent.starts_with("azsites/"));
        assert!(create_http_client(&config).is_ok());
    }
}
