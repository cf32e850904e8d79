//! OAuth 1.0a request signing
//!
//! Produces `Authorization: OAuth ...` header values with HMAC-SHA1
//! signatures. Query parameters and form body parameters both take part in
//! the signature; the base URL is signed without its query string.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use compact_str::{CompactString, format_compact};
use hmac::{Hmac, Mac};
use itertools::Itertools;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::Rng;
use sha1::Sha1;

use super::{
    config::Credentials,
    error::{ClientError, Result},
};

/// Everything except RFC 3986 unreserved characters: ALPHA / DIGIT / "-" / "." / "_" / "~"
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Signs requests on behalf of one user
#[derive(Debug, Clone)]
pub struct OAuthSigner {
    credentials: Credentials,
}

impl OAuthSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    /// Authorization header for `method url` carrying `params`
    pub fn sign(&self, method: &str, url: &str, params: &[(String, String)]) -> Result<String> {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| ClientError::oauth(format_compact!("Failed to get timestamp: {e}")))?
            .as_secs();

        self.sign_with(method, url, params, timestamp, &generate_nonce())
    }

    /// Sign with a caller-supplied timestamp and nonce
    pub fn sign_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        timestamp: u64,
        nonce: &str,
    ) -> Result<String> {
        let mut oauth_params: Vec<(String, String)> = vec![
            ("oauth_consumer_key".into(), self.credentials.consumer_key.to_string()),
            ("oauth_nonce".into(), nonce.to_string()),
            ("oauth_signature_method".into(), "HMAC-SHA1".into()),
            ("oauth_timestamp".into(), timestamp.to_string()),
            ("oauth_token".into(), self.credentials.token.to_string()),
            ("oauth_version".into(), "1.0".into()),
        ];

        let base_string = signature_base_string(method, url, oauth_params.iter().chain(params));
        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.credentials.consumer_secret),
            percent_encode(&self.credentials.token_secret)
        );
        let signature = hmac_sha1(&signing_key, &base_string)?;

        oauth_params.push(("oauth_signature".into(), signature));

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .join(", ");

        Ok(format!("OAuth {header}"))
    }
}

/// `METHOD&encoded-url&encoded-sorted-params`
fn signature_base_string<'a>(
    method: &str,
    url: &str,
    params: impl Iterator<Item = &'a (String, String)>,
) -> String {
    let param_string = params
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .sorted()
        .map(|(k, v)| format!("{k}={v}"))
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    )
}

/// Percent-encode a string according to RFC 3986
pub fn percent_encode(s: &str) -> CompactString {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).collect()
}

fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Compute HMAC-SHA1 and return the base64-encoded digest
fn hmac_sha1(key: &str, data: &str) -> Result<String> {
    type HmacSha1 = Hmac<Sha1>;

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| ClientError::oauth(e.to_string()))?;
    mac.update(data.as_bytes());

    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documented_signer() -> OAuthSigner {
        OAuthSigner::new(Credentials::new(
            "xvz1evFS4wEEPTGEFPHBog",
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        ))
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("foo=bar&baz"), "foo%3Dbar%26baz");
        assert_eq!(percent_encode("test-value_123.txt~"), "test-value_123.txt~");
        assert_eq!(percent_encode("Ladies + Gentlemen"), "Ladies%20%2B%20Gentlemen");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn test_generate_nonce() {
        let nonce1 = generate_nonce();
        let nonce2 = generate_nonce();

        assert_ne!(nonce1, nonce2);
        assert_eq!(nonce1.len(), 32);
        assert!(nonce1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_matches_published_example() {
        let params = vec![
            ("include_entities".to_string(), "true".to_string()),
            (
                "status".to_string(),
                "Hello Ladies + Gentlemen, a signed OAuth request!".to_string(),
            ),
        ];

        let header = documented_signer()
            .sign_with(
                "POST",
                "https://api.twitter.com/1/statuses/update.json",
                &params,
                1_318_622_958,
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
            )
            .unwrap();

        assert!(header.starts_with("OAuth "));
        assert!(header.contains("oauth_signature=\"tnnArxj06cWHq44gCs1OSKk%2FjLY%3D\""));
        assert!(header.contains("oauth_timestamp=\"1318622958\""));
        assert!(!header.contains("status="));
    }

    #[test]
    fn test_signature_depends_on_params() {
        let signer = documented_signer();
        let url = "https://api.twitter.com/1/statuses/home_timeline.json";
        let a = signer
            .sign_with("GET", url, &[("count".into(), "5".into())], 1, "n")
            .unwrap();
        let b = signer
            .sign_with("GET", url, &[("count".into(), "6".into())], 1, "n")
            .unwrap();

        assert_ne!(a, b);
    }
}
