//! Twitter and Yammer client modules
//!
//! Request description, OAuth signing, transport and streaming are kept in
//! separate components; [`TwitterService`] ties them to the event channel.

pub mod api;
pub mod config;
pub mod error;
pub mod oauth;
pub mod request;
pub mod response;
pub mod service;
pub mod stream;

// Re-export main types for convenience
pub use api::TwitterApi;
pub use config::{
    ClientConfig, Credentials, DebugConfig, Endpoints, RequestConfig, RetryPolicy, Service,
    StreamOptions, TimelineQuery,
};
pub use error::{ApiErrorPayload, ClientError, Result};
pub use oauth::OAuthSigner;
pub use request::{ApiRequest, Host};
pub use response::{ApiResponse, CursorPage, FIRST_CURSOR, IdCursorPage, RateLimitInfo, UserCursorPage};
pub use service::TwitterService;
pub use stream::{
    BoundingBox, DispatchStats, FilterParameters, FilterParametersBuilder, StreamDispatcher,
    StreamEnd, StreamHandle, StreamHandler, StreamRecord, StreamRequest, StreamSession,
    StreamSummary,
};
