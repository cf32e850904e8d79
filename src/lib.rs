//! Client for the Twitter and Yammer REST and Streaming APIs

pub mod app_init;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod event;
pub mod id;
pub mod logging;
pub mod result;
