use thiserror::Error;

/// Main error type for azsites operations
#[derive(Debug, Error)]
pub enum AzsitesError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Azure API error: HTTP {status} ({code}): {message}")]
    AzureApiError {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{kind} not found: {name}")]
    ResourceNotFound { kind: String, name: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timed out: {0}")]
    ConnectionTimeout(String),

    #[error("Connection refused: {0}")]
    ConnectionRefused(String),

    #[error("SSL/TLS error: {0}")]
    SslError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid HTTP request: {0}")]
    HttpBuildError(#[from] http::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AzsitesError {
    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn azure_api<C: Into<String>, M: Into<String>>(status: u16, code: C, message: M) -> Self {
        Self::AzureApiError {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found<K: Into<String>, N: Into<String>>(kind: K, name: N) -> Self {
        Self::ResourceNotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::NetworkError(msg.into())
    }

    pub fn connection_timeout<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionTimeout(msg.into())
    }

    pub fn connection_refused<S: Into<String>>(msg: S) -> Self {
        Self::ConnectionRefused(msg.into())
    }

    pub fn ssl_error<S: Into<String>>(msg: S) -> Self {
        Self::SslError(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// HTTP status of a rejected ARM call, if this error came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AzureApiError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. }) || self.status() == Some(404)
    }
}

/// Result type alias for azsites operations
pub type Result<T> = std::result::Result<T, AzsitesError>;

/// Convert Azure Core errors to AzsitesError
impl From<azure_core::Error> for AzsitesError {
    fn from(error: azure_core::Error) -> Self {
        Self::AuthenticationError(error.to_string())
    }
}

/// Walk the source chain and return the innermost message.
pub fn root_cause(error: &(dyn std::error::Error + 'static)) -> String {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
