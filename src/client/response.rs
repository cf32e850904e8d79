//! Typed responses and the metadata that travels with them

use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::{domain::User, id::UserId};

/// A successfully decoded response
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub rate_limit: RateLimitInfo,
    pub value: T,
}

impl<T> ApiResponse<T> {
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            rate_limit: self.rate_limit,
            value: f(self.value),
        }
    }
}

/// Rate limit headers; the v1 API spells them `X-RateLimit-*`, later
/// versions `X-Rate-Limit-*`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    /// Unix timestamp when the window resets
    pub reset: Option<i64>,
}

impl RateLimitInfo {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn header<T: std::str::FromStr>(headers: &HeaderMap, names: [&str; 2]) -> Option<T> {
            names.iter().find_map(|name| {
                headers
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse().ok())
            })
        }

        Self {
            limit: header(headers, ["x-ratelimit-limit", "x-rate-limit-limit"]),
            remaining: header(headers, ["x-ratelimit-remaining", "x-rate-limit-remaining"]),
            reset: header(headers, ["x-ratelimit-reset", "x-rate-limit-reset"]),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// First page of any cursored list
pub const FIRST_CURSOR: i64 = -1;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserCursorPage {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub next_cursor: i64,
    #[serde(default)]
    pub previous_cursor: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdCursorPage {
    #[serde(default)]
    pub ids: Vec<UserId>,
    #[serde(default)]
    pub next_cursor: i64,
    #[serde(default)]
    pub previous_cursor: i64,
}

pub trait CursorPage {
    fn next_cursor(&self) -> i64;

    /// A next cursor of zero marks the last page
    fn has_next(&self) -> bool {
        self.next_cursor() != 0
    }
}

impl CursorPage for UserCursorPage {
    fn next_cursor(&self) -> i64 {
        self.next_cursor
    }
}

impl CursorPage for IdCursorPage {
    fn next_cursor(&self) -> i64 {
        self.next_cursor
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn test_rate_limit_from_either_header_spelling() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("150"));
        headers.insert("x-rate-limit-remaining", HeaderValue::from_static("0"));
        headers.insert("x-ratelimit-reset", HeaderValue::from_static("1277485629"));

        let info = RateLimitInfo::from_headers(&headers);
        assert_eq!(info.limit, Some(150));
        assert_eq!(info.remaining, Some(0));
        assert_eq!(info.reset, Some(1_277_485_629));
        assert!(info.is_exhausted());
    }

    #[test]
    fn test_cursor_page_end() {
        let page: IdCursorPage =
            serde_json::from_str(r#"{"ids":[1,"2"],"next_cursor":0,"previous_cursor":-1}"#)
                .unwrap();

        assert_eq!(page.ids, vec![UserId::new(1), UserId::new(2)]);
        assert!(!page.has_next());
    }
}
