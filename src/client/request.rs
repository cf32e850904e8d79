//! Fluent request description
//!
//! An [`ApiRequest`] collects the method, target host, path and parameters of
//! one call. It knows nothing about transport; [`super::TwitterApi`] signs and
//! sends it.

use compact_str::{CompactString, ToCompactString};
use reqwest::Method;
use url::Url;

use super::{
    config::{ClientConfig, TimelineQuery},
    error::{ClientError, Result},
};
use crate::id::{StatusId, UserId};

/// API host a request is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Host {
    /// REST host of the configured service
    Rest,
    Search,
    Stream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    method: Method,
    host: Host,
    path: CompactString,
    params: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<CompactString>) -> Self {
        Self {
            method,
            host: Host::Rest,
            path: path.into(),
            params: Vec::new(),
        }
    }

    pub fn get(path: impl Into<CompactString>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<CompactString>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn on(mut self, host: Host) -> Self {
        self.host = host;
        self
    }

    /// Add a parameter; a repeated key replaces the earlier value
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn param_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    pub fn since_id(self, id: StatusId) -> Self {
        self.param("since_id", id)
    }

    pub fn max_id(self, id: StatusId) -> Self {
        self.param("max_id", id)
    }

    pub fn count(self, count: u32) -> Self {
        self.param("count", count)
    }

    pub fn page(self, page: u32) -> Self {
        self.param("page", page)
    }

    /// Cursor for paged lists; `-1` requests the first page
    pub fn cursor(self, cursor: i64) -> Self {
        self.param("cursor", cursor)
    }

    pub fn screen_name(self, screen_name: &str) -> Self {
        self.param("screen_name", screen_name)
    }

    pub fn user_id(self, user_id: UserId) -> Self {
        self.param("user_id", user_id)
    }

    pub fn include_entities(self, include: bool) -> Self {
        if include { self.param("include_entities", true) } else { self }
    }

    /// Apply paging options from a timeline query
    pub fn timeline(self, query: &TimelineQuery) -> Self {
        self.param_opt("since_id", query.since_id)
            .param_opt("max_id", query.max_id)
            .param_opt("count", query.count)
            .param_opt("page", query.page)
            .include_entities(query.include_entities)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn host(&self) -> Host {
        self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Parameters are sent in the form body rather than the query string
    pub fn has_form_body(&self) -> bool {
        self.method == Method::POST
    }

    /// URL without query string, as used in the OAuth signature base
    pub fn base_url(&self, config: &ClientConfig) -> Result<Url> {
        let base = match self.host {
            Host::Rest => config.rest_url(),
            Host::Search => config.endpoints.search_url.as_str(),
            Host::Stream => config.endpoints.stream_url.as_str(),
        };

        let path = self.path.trim_start_matches('/');
        let raw = if path.ends_with(".json") {
            format!("{}/{}", base.trim_end_matches('/'), path)
        } else {
            format!("{}/{}.json", base.trim_end_matches('/'), path)
        };

        Url::parse(&raw).map_err(|_| ClientError::invalid_url(raw.to_compact_string()))
    }

    /// Full URL; GET parameters are appended as the query string
    pub fn url(&self, config: &ClientConfig) -> Result<Url> {
        let mut url = self.base_url(config)?;
        if !self.has_form_body() && !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params.iter());
        }
        Ok(url)
    }
}
