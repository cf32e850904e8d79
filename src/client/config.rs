//! Configuration management for the Twitter/Yammer client

use std::{path::PathBuf, time::Duration};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use super::error::{ClientError, Result};
use crate::{config::TwineConfig, id::StatusId};

/// Main configuration for the client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Which service the REST calls target
    pub service: Service,
    /// OAuth credentials; unsigned requests are sent when absent
    pub credentials: Option<Credentials>,
    /// Base URLs for each API host
    pub endpoints: Endpoints,
    /// Request configuration
    pub request: RequestConfig,
    /// Automatic retry behaviour
    pub retry: RetryPolicy,
    /// Defaults for streaming sessions
    pub stream: StreamOptions,
    /// Debug configuration
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    #[default]
    Twitter,
    Yammer,
}

/// OAuth 1.0a consumer and access token pair
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub consumer_key: CompactString,
    pub consumer_secret: CompactString,
    pub token: CompactString,
    pub token_secret: CompactString,
}

/// Base URLs for each API host
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub api_url: CompactString,
    pub search_url: CompactString,
    pub stream_url: CompactString,
    pub yammer_url: CompactString,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Number of items requested per page when a query does not say
    pub count: u32,
    /// Request timeout for REST calls
    pub timeout: Duration,
    pub user_agent: CompactString,
}

/// Fixed-count retry on network errors and fail whales
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first one; zero disables retrying
    pub max_retries: u32,
    pub on_network_error: bool,
    pub on_fail_whale: bool,
    /// Pause between attempts
    pub delay: Duration,
}

/// Streaming session options
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// Stop the session after this long; `None` runs until the server closes
    pub duration: Option<Duration>,
    /// Records buffered before each dispatch
    pub results_per_callback: usize,
}

/// Debug and logging configuration
#[derive(Debug, Clone)]
pub struct DebugConfig {
    /// Dump raw HTTP response bodies to `log_directory`
    pub log_responses: bool,
    pub log_directory: Option<PathBuf>,
}

/// Paging options shared by the timeline endpoints
#[derive(Debug, Clone, Default)]
pub struct TimelineQuery {
    /// Only return statuses newer than this id
    pub since_id: Option<StatusId>,
    /// Only return statuses older than or equal to this id
    pub max_id: Option<StatusId>,
    pub count: Option<u32>,
    pub page: Option<u32>,
    pub include_entities: bool,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        consumer_key: impl Into<CompactString>,
        consumer_secret: impl Into<CompactString>,
        token: impl Into<CompactString>,
        token_secret: impl Into<CompactString>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_url: "https://api.twitter.com/1".into(),
            search_url: "https://search.twitter.com".into(),
            stream_url: "https://stream.twitter.com/1".into(),
            yammer_url: "https://www.yammer.com/api/v1".into(),
        }
    }
}

impl Endpoints {
    /// Point every host at one base URL, for mock servers
    pub fn single(base_url: impl Into<CompactString>) -> Self {
        let base_url = base_url.into();
        Self {
            api_url: base_url.clone(),
            search_url: base_url.clone(),
            stream_url: base_url.clone(),
            yammer_url: base_url,
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            count: 20,
            timeout: Duration::from_secs(30),
            user_agent: concat!("twine/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            on_network_error: true,
            on_fail_whale: true,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Retry network errors and fail whales up to `max_retries` times
    pub fn fixed(max_retries: u32) -> Self {
        Self { max_retries, ..Default::default() }
    }

    pub fn should_retry(&self, error: &ClientError, attempt: u32) -> bool {
        attempt <= self.max_retries
            && ((self.on_network_error && error.is_network_error())
                || (self.on_fail_whale && error.is_fail_whale()))
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self { duration: None, results_per_callback: 1 }
    }
}

impl StreamOptions {
    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_results_per_callback(mut self, results_per_callback: usize) -> Self {
        self.results_per_callback = results_per_callback;
        self
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_responses: false,
            log_directory: Some(PathBuf::from("twine-logs")),
        }
    }
}

impl ClientConfig {
    /// Create a new client configuration for the given service
    pub fn new(service: Service) -> Self {
        Self {
            service,
            credentials: None,
            endpoints: Endpoints::default(),
            request: RequestConfig::default(),
            retry: RetryPolicy::default(),
            stream: StreamOptions::default(),
            debug: DebugConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let urls = [
            ("api_url", &self.endpoints.api_url),
            ("search_url", &self.endpoints.search_url),
            ("stream_url", &self.endpoints.stream_url),
            ("yammer_url", &self.endpoints.yammer_url),
        ];

        for (field, value) in urls {
            if value.is_empty() {
                return Err(ClientError::config_validation(field, "URL cannot be empty"));
            }

            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ClientError::config_validation(
                    field,
                    "URL must start with http:// or https://",
                ));
            }

            if url::Url::parse(value).is_err() {
                return Err(ClientError::config_validation(
                    field,
                    "URL is not a valid URL format",
                ));
            }
        }

        if let Some(credentials) = &self.credentials {
            let fields = [
                ("consumer_key", &credentials.consumer_key),
                ("consumer_secret", &credentials.consumer_secret),
                ("token", &credentials.token),
                ("token_secret", &credentials.token_secret),
            ];
            if let Some((field, _)) = fields.iter().find(|(_, v)| v.is_empty()) {
                return Err(ClientError::config_validation(
                    *field,
                    "OAuth credential cannot be empty",
                ));
            }
        }

        if self.request.count == 0 || self.request.count > 200 {
            return Err(ClientError::config_validation(
                "count",
                "count must be between 1 and 200",
            ));
        }

        if self.request.timeout.is_zero() {
            return Err(ClientError::config_validation(
                "timeout",
                "Timeout must be greater than zero",
            ));
        }

        if self.stream.results_per_callback == 0 {
            return Err(ClientError::config_validation(
                "results_per_callback",
                "results_per_callback must be at least 1",
            ));
        }

        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Base URL for REST calls of the configured service
    pub fn rest_url(&self) -> &str {
        match self.service {
            Service::Twitter => &self.endpoints.api_url,
            Service::Yammer => &self.endpoints.yammer_url,
        }
    }

    /// Create default timeline query with config values
    pub fn default_timeline_query(&self) -> TimelineQuery {
        TimelineQuery {
            count: Some(self.request.count),
            include_entities: false,
            ..Default::default()
        }
    }
}

impl From<TwineConfig> for ClientConfig {
    fn from(config: TwineConfig) -> Self {
        let credentials = config.credentials();
        let mut client = Self::new(config.service).with_credentials(credentials);
        client.request.count = config.count;
        client.retry.max_retries = config.retries;
        if let Some(api_url) = config.api_url {
            client.endpoints.api_url = api_url;
        }
        if let Some(stream_url) = config.stream_url {
            client.endpoints.stream_url = stream_url;
        }
        client
    }
}

impl ClientConfig {
    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set request configuration
    pub fn with_request(mut self, request: RequestConfig) -> Self {
        self.request = request;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_stream(mut self, stream: StreamOptions) -> Self {
        self.stream = stream;
        self
    }

    /// Set debug configuration
    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = debug;
        self
    }

    /// Enable debug logging of responses
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug.log_responses = enabled;
        self
    }
}

impl TimelineQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_since_id(mut self, since_id: Option<StatusId>) -> Self {
        self.since_id = since_id;
        self
    }

    pub fn with_max_id(mut self, max_id: Option<StatusId>) -> Self {
        self.max_id = max_id;
        self
    }

    /// Set per page limit
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_entities(mut self, include_entities: bool) -> Self {
        self.include_entities = include_entities;
        self
    }
}
