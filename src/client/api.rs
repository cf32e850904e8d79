//! Core HTTP client for the Twitter and Yammer REST APIs

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use chrono::Local;
use compact_str::format_compact;
use reqwest::{Client, RequestBuilder, Response, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::{
    config::{ClientConfig, Service, StreamOptions, TimelineQuery},
    error::{ApiErrorPayload, ClientError, Result},
    oauth::OAuthSigner,
    request::{ApiRequest, Host},
    response::{ApiResponse, CursorPage, FIRST_CURSOR, IdCursorPage, RateLimitInfo, UserCursorPage},
    stream::{StreamHandle, StreamHandler, StreamRequest, StreamSession},
};
use crate::{
    domain::{
        DirectMessage, Friendship, RateLimitStatus, SearchResults, Status, Trends, User,
        YammerMessages,
    },
    id::{StatusId, UserId, YammerId},
};

/// HTTP client for one account on Twitter or Yammer
#[derive(Debug)]
pub struct TwitterApi {
    client: RwLock<Client>,
    /// No overall timeout; streams stay open indefinitely
    stream_client: RwLock<Client>,
    config: RwLock<ClientConfig>,
}

impl TwitterApi {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let (client, stream_client) = build_clients(&config)?;

        Ok(Self {
            client: RwLock::new(client),
            stream_client: RwLock::new(stream_client),
            config: RwLock::new(config),
        })
    }

    /// Verify the configured credentials and return the authenticated user
    #[instrument(skip(self))]
    pub async fn verify_credentials(&self) -> Result<ApiResponse<User>> {
        self.twitter(&ApiRequest::get("account/verify_credentials"))
            .await
    }

    /// Statuses from the user and the accounts they follow
    #[instrument(skip(self))]
    pub async fn home_timeline(&self, query: &TimelineQuery) -> Result<ApiResponse<Vec<Status>>> {
        let request = ApiRequest::get("statuses/home_timeline").timeline(query);
        let response: ApiResponse<Vec<Status>> = self.twitter(&request).await?;
        debug!(status_count = response.value.len(), "Fetched home timeline");
        Ok(response)
    }

    #[instrument(skip(self))]
    pub async fn user_timeline(
        &self,
        screen_name: &str,
        query: &TimelineQuery,
    ) -> Result<ApiResponse<Vec<Status>>> {
        let request = ApiRequest::get("statuses/user_timeline")
            .screen_name(screen_name)
            .timeline(query);
        self.twitter(&request).await
    }

    /// Statuses mentioning the authenticated user
    #[instrument(skip(self))]
    pub async fn mentions(&self, query: &TimelineQuery) -> Result<ApiResponse<Vec<Status>>> {
        let request = ApiRequest::get("statuses/mentions").timeline(query);
        self.twitter(&request).await
    }

    #[instrument(skip(self), fields(status_id = %id))]
    pub async fn show_status(&self, id: StatusId) -> Result<ApiResponse<Status>> {
        self.twitter(&ApiRequest::get(format_compact!("statuses/show/{id}")))
            .await
    }

    /// Post a new status, optionally in reply to another
    #[instrument(skip(self, text), fields(length = text.chars().count()))]
    pub async fn update_status(
        &self,
        text: &str,
        in_reply_to: Option<StatusId>,
    ) -> Result<ApiResponse<Status>> {
        let request = ApiRequest::post("statuses/update")
            .param("status", text)
            .param_opt("in_reply_to_status_id", in_reply_to);
        self.twitter(&request).await
    }

    #[instrument(skip(self), fields(status_id = %id))]
    pub async fn destroy_status(&self, id: StatusId) -> Result<ApiResponse<Status>> {
        self.twitter(&ApiRequest::post(format_compact!("statuses/destroy/{id}")))
            .await
    }

    #[instrument(skip(self), fields(status_id = %id))]
    pub async fn retweet(&self, id: StatusId) -> Result<ApiResponse<Status>> {
        self.twitter(&ApiRequest::post(format_compact!("statuses/retweet/{id}")))
            .await
    }

    #[instrument(skip(self))]
    pub async fn show_user(&self, screen_name: &str) -> Result<ApiResponse<User>> {
        let request = ApiRequest::get("users/show").screen_name(screen_name);
        self.twitter(&request).await
    }

    /// One page of the accounts a user follows; start with [`FIRST_CURSOR`]
    #[instrument(skip(self))]
    pub async fn friends(
        &self,
        screen_name: &str,
        cursor: i64,
    ) -> Result<ApiResponse<UserCursorPage>> {
        let request = ApiRequest::get("statuses/friends")
            .screen_name(screen_name)
            .cursor(cursor);
        self.twitter(&request).await
    }

    /// One page of a user's followers; start with [`FIRST_CURSOR`]
    #[instrument(skip(self))]
    pub async fn followers(
        &self,
        screen_name: &str,
        cursor: i64,
    ) -> Result<ApiResponse<UserCursorPage>> {
        let request = ApiRequest::get("statuses/followers")
            .screen_name(screen_name)
            .cursor(cursor);
        self.twitter(&request).await
    }

    #[instrument(skip(self))]
    pub async fn friend_ids(
        &self,
        screen_name: &str,
        cursor: i64,
    ) -> Result<ApiResponse<IdCursorPage>> {
        let request = ApiRequest::get("friends/ids")
            .screen_name(screen_name)
            .cursor(cursor);
        self.twitter(&request).await
    }

    /// Walk every `friends/ids` page
    #[instrument(skip(self))]
    pub async fn all_friend_ids(&self, screen_name: &str) -> Result<Vec<UserId>> {
        let mut ids = Vec::new();
        let mut cursor = FIRST_CURSOR;

        loop {
            let page = self.friend_ids(screen_name, cursor).await?.into_value();
            let has_next = page.has_next();
            cursor = page.next_cursor();
            ids.extend(page.ids);

            if !has_next {
                break;
            }
        }

        debug!(friend_count = ids.len(), "Fetched all friend ids");
        Ok(ids)
    }

    #[instrument(skip(self))]
    pub async fn direct_messages(
        &self,
        query: &TimelineQuery,
    ) -> Result<ApiResponse<Vec<DirectMessage>>> {
        let request = ApiRequest::get("direct_messages").timeline(query);
        self.twitter(&request).await
    }

    #[instrument(skip(self, text))]
    pub async fn send_direct_message(
        &self,
        screen_name: &str,
        text: &str,
    ) -> Result<ApiResponse<DirectMessage>> {
        let request = ApiRequest::post("direct_messages/new")
            .screen_name(screen_name)
            .param("text", text);
        self.twitter(&request).await
    }

    /// Query the search host; `per_page` maps to `rpp`
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        query: &str,
        per_page: Option<u32>,
    ) -> Result<ApiResponse<SearchResults>> {
        let request = ApiRequest::get("search")
            .on(Host::Search)
            .param("q", query)
            .param_opt("rpp", per_page);
        self.twitter(&request).await
    }

    /// Trending topics for a WOEID; `1` is worldwide
    #[instrument(skip(self))]
    pub async fn trends(&self, woeid: u64) -> Result<ApiResponse<Vec<Trends>>> {
        self.twitter(&ApiRequest::get(format_compact!("trends/{woeid}")))
            .await
    }

    #[instrument(skip(self))]
    pub async fn show_friendship(
        &self,
        source_screen_name: &str,
        target_screen_name: &str,
    ) -> Result<ApiResponse<Friendship>> {
        let request = ApiRequest::get("friendships/show")
            .param("source_screen_name", source_screen_name)
            .param("target_screen_name", target_screen_name);
        self.twitter(&request).await
    }

    #[instrument(skip(self))]
    pub async fn rate_limit_status(&self) -> Result<ApiResponse<RateLimitStatus>> {
        self.twitter(&ApiRequest::get("account/rate_limit_status"))
            .await
    }

    /// Messages visible to the Yammer user, newest first
    #[instrument(skip(self))]
    pub async fn yammer_messages(
        &self,
        newer_than: Option<YammerId>,
    ) -> Result<ApiResponse<YammerMessages>> {
        let request = ApiRequest::get("messages").param_opt("newer_than", newer_than);
        self.yammer(&request).await
    }

    #[instrument(skip(self, body))]
    pub async fn yammer_post_message(
        &self,
        body: &str,
        replied_to_id: Option<YammerId>,
    ) -> Result<ApiResponse<YammerMessages>> {
        let request = ApiRequest::post("messages")
            .param("body", body)
            .param_opt("replied_to_id", replied_to_id);
        self.yammer(&request).await
    }

    /// Open a streaming session; `end` or `wait` on the handle completes it
    pub fn begin_stream<H>(
        self: &Arc<Self>,
        request: StreamRequest,
        options: StreamOptions,
        handler: H,
    ) -> Result<StreamHandle>
    where
        H: StreamHandler + Send + 'static,
    {
        require_service(&self.read_config(), Service::Twitter)?;
        StreamSession::begin(Arc::clone(self), request, options, handler)
    }

    /// Send any request and decode its JSON body, retrying per the configured policy
    pub async fn execute<T>(&self, request: &ApiRequest) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let retry = self.read_config().retry.clone();
        let mut attempt = 0;

        loop {
            match self.send_once(request).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    attempt += 1;
                    if !retry.should_retry(&e, attempt) {
                        return Err(e);
                    }

                    warn!(
                        path = request.path(),
                        attempt,
                        max_retries = retry.max_retries,
                        error = %e,
                        "Retrying request"
                    );
                    tokio::time::sleep(retry.delay).await;
                },
            }
        }
    }

    /// Connect to a streaming endpoint; the body is left unread
    #[instrument(skip(self, request), fields(path = request.path()))]
    pub async fn open_stream(&self, request: &ApiRequest) -> Result<Response> {
        let response = self.prepare(request)?.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let rate_limit = RateLimitInfo::from_headers(response.headers());
        let path = response.url().path().to_string();
        let body = response.text().await?;
        Err(error_for_status(status.as_u16(), &path, &rate_limit, &body))
    }

    /// Update configuration
    pub fn update_config(&self, config: ClientConfig) -> Result<()> {
        config.validate()?;
        let (client, stream_client) = build_clients(&config)?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = client;
        *self
            .stream_client
            .write()
            .unwrap_or_else(PoisonError::into_inner) = stream_client;

        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> ClientConfig {
        self.read_config().clone()
    }

    pub fn is_configured(&self) -> bool {
        let config = self.read_config();
        config.is_authenticated() && config.validate().is_ok()
    }

    async fn twitter<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<ApiResponse<T>> {
        require_service(&self.read_config(), Service::Twitter)?;
        self.execute(request).await
    }

    async fn yammer<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<ApiResponse<T>> {
        require_service(&self.read_config(), Service::Yammer)?;
        self.execute(request).await
    }

    async fn send_once<T>(&self, request: &ApiRequest) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.prepare(request)?.send().await?;
        self.handle_response(response).await
    }

    /// Resolve, encode and sign a request
    fn prepare(&self, request: &ApiRequest) -> Result<RequestBuilder> {
        let config = self.read_config();
        let client = match request.host() {
            Host::Stream => self.stream_client.read(),
            Host::Rest | Host::Search => self.client.read(),
        }
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

        let url = request.url(&config)?;
        debug!(method = %request.method(), url = %url, "Preparing request");

        let mut builder = client.request(request.method().clone(), url);
        if request.has_form_body() {
            builder = builder.form(request.params());
        }

        if let Some(credentials) = &config.credentials {
            let base_url = request.base_url(&config)?;
            let header = OAuthSigner::new(credentials.clone()).sign(
                request.method().as_str(),
                base_url.as_str(),
                request.params(),
            )?;
            builder = builder.header(AUTHORIZATION, header);
        }

        Ok(builder)
    }

    /// Handle HTTP response and deserialize JSON
    async fn handle_response<T>(&self, response: Response) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let url_path = response.url().path().to_string();
        let status = response.status();
        let rate_limit = RateLimitInfo::from_headers(response.headers());
        let body = response.text().await?;

        {
            let config = self.read_config();
            if config.debug.log_responses {
                self.log_response_to_file(&url_path, &body, &config);
            }
        }

        if !status.is_success() {
            return Err(error_for_status(status.as_u16(), &url_path, &rate_limit, &body));
        }

        let value = serde_json::from_str(&body).map_err(|e| {
            warn!(path = %url_path, error = %e, body_len = body.len(), "Failed to parse response");
            ClientError::json_parse(url_path.as_str(), "Failed to parse response", e)
        })?;

        Ok(ApiResponse { status: status.as_u16(), rate_limit, value })
    }

    /// Log HTTP response to file for debugging
    fn log_response_to_file(&self, path: &str, body: &str, config: &ClientConfig) {
        if let Some(log_dir) = &config.debug.log_directory {
            if !log_dir.exists()
                && let Err(e) = std::fs::create_dir_all(log_dir)
            {
                warn!("Failed to create log directory: {}", e);
                return;
            }

            let filename = format!(
                "{}_{}.json",
                Local::now().format("%Y-%m-%d_%H-%M-%S%.3f"),
                path.trim_start_matches('/').replace('/', "_")
            );

            let log_path = log_dir.join(filename);

            if let Err(e) = std::fs::write(&log_path, body) {
                warn!("Failed to write response log to {:?}: {}", log_path, e);
            } else {
                debug!("Response logged to {:?}", log_path);
            }
        }
    }

    fn read_config(&self) -> RwLockReadGuard<'_, ClientConfig> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }
}

fn build_clients(config: &ClientConfig) -> Result<(Client, Client)> {
    let client = Client::builder()
        .timeout(config.request.timeout)
        .user_agent(config.request.user_agent.as_str())
        .build()
        .map_err(ClientError::Http)?;

    let stream_client = Client::builder()
        .connect_timeout(config.request.timeout)
        .user_agent(config.request.user_agent.as_str())
        .build()
        .map_err(ClientError::Http)?;

    Ok((client, stream_client))
}

fn require_service(config: &ClientConfig, service: Service) -> Result<()> {
    if config.service == service {
        Ok(())
    } else {
        Err(ClientError::config(format_compact!(
            "Operation requires a {service:?} client, configured for {:?}",
            config.service
        )))
    }
}

/// Map a non-success response to an error
fn error_for_status(status: u16, path: &str, rate_limit: &RateLimitInfo, body: &str) -> ClientError {
    if matches!(status, 502 | 503) || is_overload_page(body) {
        return ClientError::FailWhale { status };
    }

    match status {
        401 => ClientError::Authentication { payload: ApiErrorPayload::from_body(body) },
        404 => ClientError::not_found(path),
        420 | 429 => ClientError::rate_limit(rate_limit.reset),
        // v1 answers an exhausted window with a plain 400
        400 if rate_limit.is_exhausted() => ClientError::rate_limit(rate_limit.reset),
        _ => ClientError::api(status, ApiErrorPayload::from_body(body)),
    }
}

/// The HTML "over capacity" page served in front of the API
fn is_overload_page(body: &str) -> bool {
    let body = body.trim_start();
    body.starts_with('<') && body.to_ascii_lowercase().contains("over capacity")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, header_exists, method, path, query_param},
    };

    use super::*;
    use crate::client::{Credentials, Endpoints, RetryPolicy};

    const STATUS_JSON: &str = r#"{
        "id": 1001,
        "text": "first",
        "created_at": "Wed Aug 29 17:12:58 +0000 2012",
        "user": {"id": 7, "screen_name": "alice"}
    }"#;

    fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig::new(Service::Twitter).with_endpoints(Endpoints::single(server.uri()))
    }

    fn signed_config_for(server: &MockServer) -> ClientConfig {
        config_for(server).with_credentials(Some(Credentials::new("ck", "cs", "tk", "ts")))
    }

    #[tokio::test]
    async fn test_home_timeline_sends_paging_and_reads_rate_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/statuses/home_timeline.json"))
            .and(query_param("count", "5"))
            .and(query_param("since_id", "1000"))
            .and(header_exists("authorization"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-ratelimit-remaining", "149")
                    .set_body_string(format!("[{STATUS_JSON}]")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let api = TwitterApi::new(signed_config_for(&server)).unwrap();
        let query = TimelineQuery::new()
            .with_count(5)
            .with_since_id(Some(StatusId::new(1000)));
        let response = api.home_timeline(&query).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.rate_limit.remaining, Some(149));
        assert_eq!(response.value.len(), 1);
        assert_eq!(response.value[0].id, StatusId::new(1001));
    }

    #[tokio::test]
    async fn test_update_status_posts_form() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/statuses/update.json"))
            .and(body_string_contains("status=hello+world"))
            .and(body_string_contains("in_reply_to_status_id=77"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_string(STATUS_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let api = TwitterApi::new(signed_config_for(&server)).unwrap();
        let status = api
            .update_status("hello world", Some(StatusId::new(77)))
            .await
            .unwrap()
            .into_value();

        assert_eq!(status.screen_name(), Some("alice"));
    }

    #[tokio::test]
    async fn test_service_unavailable_is_fail_whale() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/account/verify_credentials.json"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&server)
            .await;

        let api = TwitterApi::new(config_for(&server)).unwrap();
        let error = api.verify_credentials().await.unwrap_err();

        assert!(error.is_fail_whale());
        assert!(!error.is_api_error());
        assert!(!error.is_network_error());
    }

    #[tokio::test]
    async fn test_overload_page_is_fail_whale() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/statuses/mentions.json"))
            .respond_with(ResponseTemplate::new(500).set_body_string(
                "<html><head><title>Twitter / Over capacity</title></head></html>",
            ))
            .mount(&server)
            .await;

        let api = TwitterApi::new(config_for(&server)).unwrap();
        let error = api.mentions(&TimelineQuery::new()).await.unwrap_err();

        assert!(matches!(error, ClientError::FailWhale { status: 500 }));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_fail_whale() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/statuses/show/1001.json"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/statuses/show/1001.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(STATUS_JSON))
            .expect(1)
            .mount(&server)
            .await;

        let retry = RetryPolicy { delay: Duration::from_millis(10), ..RetryPolicy::fixed(2) };
        let api = TwitterApi::new(config_for(&server).with_retry(retry)).unwrap();
        let status = api.show_status(StatusId::new(1001)).await.unwrap().into_value();

        assert_eq!(status.text, "first");
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_retries() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/account/rate_limit_status.json"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let retry = RetryPolicy { delay: Duration::from_millis(1), ..RetryPolicy::fixed(2) };
        let api = TwitterApi::new(config_for(&server).with_retry(retry)).unwrap();

        assert!(api.rate_limit_status().await.unwrap_err().is_fail_whale());
    }

    #[tokio::test]
    async fn test_unauthorized_carries_payload() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/account/verify_credentials.json"))
            .respond_with(ResponseTemplate::new(401).set_body_string(
                r#"{"error":"Could not authenticate you.","request":"/1/account/verify_credentials.json"}"#,
            ))
            .mount(&server)
            .await;

        let api = TwitterApi::new(config_for(&server)).unwrap();
        let error = api.verify_credentials().await.unwrap_err();

        assert!(error.is_api_error());
        assert_eq!(
            error.payload().map(|p| p.message.as_str()),
            Some("Could not authenticate you.")
        );
    }

    #[tokio::test]
    async fn test_exhausted_window_is_rate_limit() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/show.json"))
            .respond_with(
                ResponseTemplate::new(400)
                    .insert_header("x-ratelimit-remaining", "0")
                    .insert_header("x-ratelimit-reset", "1277485629")
                    .set_body_string(r#"{"error":"Rate limit exceeded."}"#),
            )
            .mount(&server)
            .await;

        let api = TwitterApi::new(config_for(&server)).unwrap();
        let error = api.show_user("alice").await.unwrap_err();

        assert!(matches!(error, ClientError::RateLimit { reset_at: Some(1_277_485_629) }));
    }

    #[tokio::test]
    async fn test_missing_resource_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/statuses/show/404.json"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                r#"{"errors":[{"message":"Sorry, that page does not exist","code":34}]}"#,
            ))
            .mount(&server)
            .await;

        let api = TwitterApi::new(config_for(&server)).unwrap();
        let error = api.show_status(StatusId::new(404)).await.unwrap_err();

        assert!(matches!(error, ClientError::NotFound { .. }));
        assert_eq!(error.status(), Some(404));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/users/show.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":"))
            .mount(&server)
            .await;

        let api = TwitterApi::new(config_for(&server)).unwrap();
        let error = api.show_user("alice").await.unwrap_err();

        assert!(matches!(error, ClientError::JsonParse { .. }));
    }

    #[tokio::test]
    async fn test_all_friend_ids_follows_cursors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/friends/ids.json"))
            .and(query_param("cursor", "-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"ids":[1,2],"next_cursor":1305102810874389703,"previous_cursor":0}"#,
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/friends/ids.json"))
            .and(query_param("cursor", "1305102810874389703"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"ids":[3],"next_cursor":0,"previous_cursor":-1305101990888327757}"#,
            ))
            .mount(&server)
            .await;

        let api = TwitterApi::new(config_for(&server)).unwrap();
        let ids = api.all_friend_ids("alice").await.unwrap();

        assert_eq!(ids, vec![UserId::new(1), UserId::new(2), UserId::new(3)]);
    }

    #[tokio::test]
    async fn test_search_uses_search_host() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search.json"))
            .and(query_param("q", "#rustlang"))
            .and(query_param("rpp", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"results":[{"id":5,"text":"crabs","created_at":"Tue, 06 Sep 2011 18:31:45 +0000","from_user":"ferris"}],"query":"%23rustlang","page":1}"#,
            ))
            .mount(&server)
            .await;

        let api = TwitterApi::new(config_for(&server)).unwrap();
        let results = api.search("#rustlang", Some(10)).await.unwrap().into_value();

        assert_eq!(results.results.len(), 1);
        assert_eq!(results.results[0].from_user, "ferris");
    }

    #[tokio::test]
    async fn test_yammer_messages_on_yammer_service() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/messages.json"))
            .and(query_param("newer_than", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"messages":[{"id":11,"sender_id":42,"created_at":"2012/03/06 21:44:36 +0000","body":{"plain":"hi"}}],"references":[]}"#,
            ))
            .mount(&server)
            .await;

        let config = ClientConfig::new(Service::Yammer).with_endpoints(Endpoints::single(server.uri()));
        let api = TwitterApi::new(config).unwrap();
        let listing = api
            .yammer_messages(Some(YammerId::new(10)))
            .await
            .unwrap()
            .into_value();

        assert_eq!(listing.messages.len(), 1);
        assert_eq!(listing.messages[0].body.plain, "hi");
    }

    #[tokio::test]
    async fn test_operations_check_service() {
        let server = MockServer::start().await;
        let api = TwitterApi::new(config_for(&server)).unwrap();

        assert!(matches!(
            api.yammer_messages(None).await,
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ClientConfig::new(Service::Twitter)
            .with_endpoints(Endpoints::single("not a url"));
        assert!(TwitterApi::new(config).is_err());
    }

    #[test]
    fn test_update_config_swaps_configuration() {
        let api = TwitterApi::new(ClientConfig::new(Service::Twitter)).unwrap();
        assert!(!api.is_configured());

        let updated = ClientConfig::new(Service::Twitter)
            .with_credentials(Some(Credentials::new("ck", "cs", "tk", "ts")));
        api.update_config(updated).unwrap();

        assert!(api.is_configured());
        assert!(api.config().is_authenticated());
    }
}
