//! Error types for the Twitter/Yammer client

use compact_str::CompactString;
use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse JSON from {endpoint}: {message}")]
    JsonParse {
        endpoint: CompactString,
        message: CompactString,
        #[source]
        source: serde_json::Error,
    },

    #[error("API error (HTTP {status}): {payload}")]
    Api { status: u16, payload: ApiErrorPayload },

    #[error("Service is over capacity (HTTP {status})")]
    FailWhale { status: u16 },

    #[error("Authentication failed: {payload}")]
    Authentication { payload: ApiErrorPayload },

    #[error("Resource not found: {resource}")]
    NotFound { resource: CompactString },

    #[error("Rate limit exceeded")]
    RateLimit { reset_at: Option<i64> },

    #[error("Stream error: {0}")]
    Stream(CompactString),

    #[error("OAuth signing failed: {0}")]
    OAuth(CompactString),

    #[error("Configuration error: {0}")]
    Config(CompactString),

    #[error("Invalid configuration for {field}: {message}")]
    ConfigValidation {
        field: CompactString,
        message: CompactString,
    },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: CompactString },
}

/// Structured error body returned by the REST API.
///
/// Twitter answers failures with either `{"error": "...", "request": "..."}`
/// or `{"errors": [{"message": "...", "code": 34}]}`; both decode here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiErrorPayload {
    pub request: Option<CompactString>,
    pub message: CompactString,
    pub code: Option<i32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawErrorBody {
    Single {
        error: CompactString,
        #[serde(default)]
        request: Option<CompactString>,
    },
    List {
        errors: Vec<RawErrorEntry>,
    },
}

#[derive(Deserialize)]
struct RawErrorEntry {
    message: CompactString,
    #[serde(default)]
    code: Option<i32>,
}

impl ApiErrorPayload {
    /// Decode an error body, falling back to the raw text when it is not JSON
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<RawErrorBody>(body) {
            Ok(RawErrorBody::Single { error, request }) => {
                Self { request, message: error, code: None }
            },
            Ok(RawErrorBody::List { errors }) => {
                let first = errors.into_iter().next();
                Self {
                    request: None,
                    message: first
                        .as_ref()
                        .map(|e| e.message.clone())
                        .unwrap_or_default(),
                    code: first.and_then(|e| e.code),
                }
            },
            Err(_) => Self {
                request: None,
                message: body.trim().into(),
                code: None,
            },
        }
    }
}

impl std::fmt::Display for ApiErrorPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match (self.code, &self.request) {
            (Some(code), _) => write!(f, "{} (code {})", self.message, code),
            (None, Some(request)) => write!(f, "{} ({})", self.message, request),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl ClientError {
    pub fn json_parse(
        endpoint: impl Into<CompactString>,
        message: impl Into<CompactString>,
        source: serde_json::Error,
    ) -> Self {
        Self::JsonParse {
            endpoint: endpoint.into(),
            message: message.into(),
            source,
        }
    }

    pub fn api(status: u16, payload: ApiErrorPayload) -> Self {
        Self::Api { status, payload }
    }

    pub fn config(message: impl Into<CompactString>) -> Self {
        Self::Config(message.into())
    }

    pub fn config_validation(
        field: impl Into<CompactString>,
        message: impl Into<CompactString>,
    ) -> Self {
        Self::ConfigValidation { field: field.into(), message: message.into() }
    }

    pub fn not_found(resource: impl Into<CompactString>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    pub fn rate_limit(reset_at: Option<i64>) -> Self {
        Self::RateLimit { reset_at }
    }

    pub fn oauth(message: impl Into<CompactString>) -> Self {
        Self::OAuth(message.into())
    }

    pub fn stream(message: impl Into<CompactString>) -> Self {
        Self::Stream(message.into())
    }

    pub fn invalid_url(url: impl Into<CompactString>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// The request never produced an HTTP response
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            Self::Http(e) if e.status().is_none() && (e.is_connect() || e.is_timeout() || e.is_request())
        )
    }

    /// The service answered with an error of its own
    pub fn is_api_error(&self) -> bool {
        matches!(
            self,
            Self::Api { .. }
                | Self::Authentication { .. }
                | Self::NotFound { .. }
                | Self::RateLimit { .. }
        )
    }

    /// The service is overloaded or down
    pub fn is_fail_whale(&self) -> bool {
        matches!(self, Self::FailWhale { .. })
    }

    pub fn payload(&self) -> Option<&ApiErrorPayload> {
        match self {
            Self::Api { payload, .. } | Self::Authentication { payload } => Some(payload),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } | Self::FailWhale { status } => Some(*status),
            Self::Authentication { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}
