//! High-level Twitter service operations

use std::sync::{Arc, mpsc::Sender};

use compact_str::format_compact;
use tokio::runtime::Handle;
use tracing::{debug, error, info, instrument, warn};

use super::{
    api::TwitterApi,
    config::{ClientConfig, StreamOptions},
    error::{ClientError, Result},
    stream::{StreamHandle, StreamHandler, StreamRequest},
};
use crate::{
    dispatcher::Dispatcher,
    domain::{DeletedStatus, Status},
    event::{IntoTwineEvent, Timeline, TwineEvent},
    id::{StatusId, YammerId},
    result::TwineError::{self, GeneralError},
};

/// High-level service for Twitter and Yammer operations
///
/// Orchestrates API calls and handles event dispatching to the application
#[derive(Debug, Clone)]
pub struct TwitterService {
    api: Arc<TwitterApi>,
    sender: Sender<TwineEvent>,
    handle: Handle,
}

impl TwitterService {
    /// Create service from existing API client
    pub fn from_api(api: Arc<TwitterApi>, sender: Sender<TwineEvent>) -> Result<Self> {
        let handle = Handle::try_current().map_err(|_| {
            ClientError::config("TwitterService must be created within a Tokio runtime context")
        })?;
        Ok(Self { api, sender, handle })
    }

    /// Fetch a timeline and dispatch the statuses
    #[instrument(skip(self))]
    pub async fn fetch_timeline(&self, timeline: Timeline, since_id: Option<StatusId>) -> Result<()> {
        let query = self
            .api
            .config()
            .default_timeline_query()
            .with_since_id(since_id);

        let result = match &timeline {
            Timeline::Home => self.api.home_timeline(&query).await,
            Timeline::Mentions => self.api.mentions(&query).await,
            Timeline::User(screen_name) => self.api.user_timeline(screen_name, &query).await,
        };

        match result {
            Ok(response) => {
                debug!(
                    status_count = response.value.len(),
                    remaining = ?response.rate_limit.remaining,
                    "Successfully fetched timeline"
                );
                self.sender
                    .dispatch((timeline, response.into_value()).into_twine_event());
                Ok(())
            },
            Err(e) => self.report(e, "Failed to fetch timeline"),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_search(&self, query: &str) -> Result<()> {
        let per_page = self.api.config().request.count;

        match self.api.search(query, Some(per_page)).await {
            Ok(response) => {
                debug!(result_count = response.value.results.len(), "Successfully searched");
                self.sender.dispatch(response.into_value().into_twine_event());
                Ok(())
            },
            Err(e) => self.report(e, "Failed to search"),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_direct_messages(&self) -> Result<()> {
        let query = self.api.config().default_timeline_query();

        match self.api.direct_messages(&query).await {
            Ok(response) => {
                debug!(message_count = response.value.len(), "Successfully fetched direct messages");
                self.sender.dispatch(response.into_value().into_twine_event());
                Ok(())
            },
            Err(e) => self.report(e, "Failed to fetch direct messages"),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch_yammer_messages(&self, newer_than: Option<YammerId>) -> Result<()> {
        match self.api.yammer_messages(newer_than).await {
            Ok(response) => {
                debug!(
                    message_count = response.value.messages.len(),
                    "Successfully fetched Yammer messages"
                );
                self.sender.dispatch(response.into_value().into_twine_event());
                Ok(())
            },
            Err(e) => self.report(e, "Failed to fetch Yammer messages"),
        }
    }

    /// Post a status and dispatch the created status
    #[instrument(skip(self, text))]
    pub async fn post_status(&self, text: &str, in_reply_to: Option<StatusId>) -> Result<()> {
        if !self.api.is_configured() {
            return self.report(
                ClientError::config("Posting requires OAuth credentials"),
                "Cannot post status",
            );
        }

        info!("Posting status");

        match self.api.update_status(text, in_reply_to).await {
            Ok(response) => {
                let status = response.into_value();
                info!(status_id = %status.id, "Status posted");
                self.sender.dispatch(status.into_twine_event());
                Ok(())
            },
            Err(e) => self.report(e, "Failed to post status"),
        }
    }

    /// Start a stream whose batches arrive as [`TwineEvent::StreamStatuses`].
    /// `None` uses the configured stream options.
    pub fn start_stream(
        &self,
        request: StreamRequest,
        options: Option<StreamOptions>,
    ) -> Result<StreamHandle> {
        let options = options.unwrap_or_else(|| self.api.config().stream);
        info!(request = ?request, options = ?options, "Starting stream");
        self.api.begin_stream(
            request,
            options,
            EventForwarder { sender: self.sender.clone() },
        )
    }

    /// Update service configuration
    pub fn update_config(&self, config: ClientConfig) -> Result<()> {
        self.api.update_config(config)
    }

    /// Get current configuration
    pub fn config(&self) -> ClientConfig {
        self.api.config()
    }

    /// Get reference to the underlying API client
    pub fn api(&self) -> &Arc<TwitterApi> {
        &self.api
    }

    /// Spawn an async task to fetch a timeline
    pub fn spawn_fetch_timeline(&self, timeline: Timeline, since_id: Option<StatusId>) {
        let service = self.clone();
        self.handle.spawn(async move {
            if let Err(e) = service.fetch_timeline(timeline, since_id).await {
                warn!("Background timeline fetch failed: {}", e);
            }
        });
    }

    pub fn spawn_fetch_search(&self, query: String) {
        let service = self.clone();
        self.handle.spawn(async move {
            if let Err(e) = service.fetch_search(&query).await {
                warn!("Background search failed: {}", e);
            }
        });
    }

    pub fn spawn_fetch_direct_messages(&self) {
        let service = self.clone();
        self.handle.spawn(async move {
            if let Err(e) = service.fetch_direct_messages().await {
                warn!("Background direct message fetch failed: {}", e);
            }
        });
    }

    pub fn spawn_fetch_yammer_messages(&self, newer_than: Option<YammerId>) {
        let service = self.clone();
        self.handle.spawn(async move {
            if let Err(e) = service.fetch_yammer_messages(newer_than).await {
                warn!("Background Yammer fetch failed: {}", e);
            }
        });
    }

    /// Spawn an async task to post a status
    pub fn spawn_post_status(&self, text: String, in_reply_to: Option<StatusId>) {
        let service = self.clone();
        self.handle.spawn(async move {
            if let Err(e) = service.post_status(&text, in_reply_to).await {
                warn!("Background status post failed: {}", e);
            }
        });
    }

    /// Wait for a stream in the background and dispatch its summary
    pub fn spawn_stream_watch(&self, handle: StreamHandle) {
        let service = self.clone();
        self.handle.spawn(async move {
            match handle.wait().await {
                Ok(summary) => service.sender.dispatch(summary.into()),
                Err(e) => {
                    let _ = service.report::<()>(e, "Stream failed");
                },
            }
        });
    }

    fn report<T>(&self, e: ClientError, message: &'static str) -> Result<T> {
        error!(error = %e, "{}", message);
        self.sender.dispatch(TwineEvent::AppError(TwineError::from(&e)));
        Err(e)
    }
}

/// Forwards stream batches to the event channel
struct EventForwarder {
    sender: Sender<TwineEvent>,
}

impl StreamHandler for EventForwarder {
    fn on_statuses(&mut self, statuses: Vec<Status>) {
        if !statuses.is_empty() {
            self.sender.dispatch(TwineEvent::StreamStatuses(statuses));
        }
    }

    fn on_delete(&mut self, deleted: DeletedStatus) {
        self.sender.dispatch(TwineEvent::StreamStatusDeleted(deleted));
    }
}

// Convert ClientError to the application's TwineError type
impl From<&ClientError> for TwineError {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Http(e) => GeneralError(format_compact!("HTTP error: {e}")),
            ClientError::JsonParse { endpoint, message, .. } => {
                GeneralError(format_compact!("JSON parse error from {endpoint}: {message}"))
            },
            ClientError::Api { status, payload } => {
                GeneralError(format_compact!("HTTP {status}: {payload}"))
            },
            ClientError::FailWhale { .. } => TwineError::ServiceUnavailable,
            ClientError::Authentication { payload } => {
                TwineError::InvalidCredentials(payload.message.clone())
            },
            ClientError::NotFound { resource } => GeneralError(format_compact!("Not found: {resource}")),
            ClientError::RateLimit { reset_at } => TwineError::RateLimited { reset_at: *reset_at },
            ClientError::Stream(msg) => GeneralError(format_compact!("Stream error: {msg}")),
            ClientError::OAuth(msg) => GeneralError(format_compact!("OAuth error: {msg}")),
            ClientError::Config(msg) => GeneralError(msg.clone()),
            ClientError::ConfigValidation { field, message } => {
                TwineError::config_validation_error(field.as_str(), message.as_str())
            },
            ClientError::InvalidUrl { url } => GeneralError(format_compact!("Invalid URL: {url}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, time::Duration};

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    use super::*;
    use crate::client::{Credentials, Endpoints, Service};

    const STATUS_JSON: &str = r#"{"id":1,"text":"hi","created_at":"Wed Aug 29 17:12:58 +0000 2012"}"#;

    fn service_for(server: &MockServer, credentials: bool) -> (TwitterService, mpsc::Receiver<TwineEvent>) {
        let mut config =
            ClientConfig::new(Service::Twitter).with_endpoints(Endpoints::single(server.uri()));
        if credentials {
            config = config.with_credentials(Some(Credentials::new("ck", "cs", "tk", "ts")));
        }

        let (sender, receiver) = mpsc::channel();
        let api = Arc::new(TwitterApi::new(config).unwrap());
        (TwitterService::from_api(api, sender).unwrap(), receiver)
    }

    #[tokio::test]
    async fn test_fetch_timeline_dispatches_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/statuses/mentions.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("[{STATUS_JSON}]")))
            .mount(&server)
            .await;

        let (service, receiver) = service_for(&server, false);
        service.fetch_timeline(Timeline::Mentions, None).await.unwrap();

        match receiver.try_recv().unwrap() {
            TwineEvent::StatusesLoaded(Timeline::Mentions, statuses) => {
                assert_eq!(statuses.len(), 1)
            },
            other => panic!("unexpected event: {}", other.variant_name()),
        }
    }

    #[tokio::test]
    async fn test_failures_dispatch_app_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/statuses/home_timeline.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (service, receiver) = service_for(&server, false);
        let result = service.fetch_timeline(Timeline::Home, None).await;

        assert!(result.is_err());
        assert!(matches!(
            receiver.try_recv().unwrap(),
            TwineEvent::AppError(TwineError::ServiceUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_post_requires_credentials() {
        let server = MockServer::start().await;
        let (service, receiver) = service_for(&server, false);

        assert!(service.post_status("hello", None).await.is_err());
        assert!(matches!(receiver.try_recv().unwrap(), TwineEvent::AppError(_)));
    }

    #[tokio::test]
    async fn test_spawned_post_dispatches_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/statuses/update.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(STATUS_JSON))
            .mount(&server)
            .await;

        let (service, receiver) = service_for(&server, true);
        service.spawn_post_status("hi".into(), None);

        let event = tokio::task::spawn_blocking(move || receiver.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(event, TwineEvent::StatusPosted(status) if status.id == StatusId::new(1)));
    }

    #[tokio::test]
    async fn test_stream_events_and_summary() {
        let server = MockServer::start().await;
        let body = format!(
            "{STATUS_JSON}\r\n{}\r\n",
            r#"{"delete":{"status":{"id":9,"user_id":3}}}"#
        );
        Mock::given(method("GET"))
            .and(path("/statuses/sample.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let (service, receiver) = service_for(&server, false);
        let handle = service.start_stream(StreamRequest::sample(), None).unwrap();
        service.spawn_stream_watch(handle);

        let events = tokio::task::spawn_blocking(move || {
            let mut names = Vec::new();
            while let Ok(event) = receiver.recv_timeout(Duration::from_secs(5)) {
                let done = matches!(event, TwineEvent::StreamEnded(_));
                names.push(event.variant_name());
                if done {
                    break;
                }
            }
            names
        })
        .await
        .unwrap();

        assert_eq!(events, vec!["StreamStatuses", "StreamStatusDeleted", "StreamEnded"]);
    }

    #[test]
    fn test_client_error_conversion() {
        let error = ClientError::rate_limit(Some(10));
        assert!(matches!(
            TwineError::from(&error),
            TwineError::RateLimited { reset_at: Some(10) }
        ));

        let error = ClientError::config_validation("count", "too large");
        assert!(matches!(
            TwineError::from(&error),
            TwineError::ConfigValidationError { field, .. } if field == "count"
        ));
    }
}
