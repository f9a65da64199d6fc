//! Stage A input acquisition for URL-sourced generation (spec §4.10, §6).
//! Only hosts on the allowlist are followed, redirects are bounded, and the
//! response is checked against the same size/content-type envelope the
//! image validator would otherwise reject.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use thiserror::Error;

use skinforge_core::constants::{
    DEFAULT_FOLLOW_HOSTS, MAX_FOLLOW_REDIRECTS, MAX_IMAGE_BYTES, MIN_IMAGE_BYTES,
};

fn default_follow_hosts() -> Vec<String> {
    DEFAULT_FOLLOW_HOSTS.iter().map(|h| h.to_string()).collect()
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("host not in the follow allowlist")]
    HostNotAllowed,
    #[error("fetch request failed: {0}")]
    Request(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("expected content-type image/png, got {0:?}")]
    ContentType(Option<String>),
    #[error("content length {len} outside allowed range [{min}, {max}]")]
    Size { len: usize, min: usize, max: usize },
}

#[async_trait]
pub trait UrlFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpUrlFetcher {
    client: reqwest::Client,
    allowed_hosts: Vec<String>,
}

impl HttpUrlFetcher {
    pub fn new() -> Self {
        Self::with_follow_hosts(default_follow_hosts())
    }

    /// Same as [`Self::new`], but with a caller-supplied follow-host
    /// allowlist instead of the built-in default.
    pub fn with_follow_hosts(allowed_hosts: Vec<String>) -> Self {
        let allowed = allowed_hosts.clone();
        let client = reqwest::Client::builder()
            .redirect(Policy::custom(move |attempt| {
                if attempt.previous().len() >= MAX_FOLLOW_REDIRECTS {
                    return attempt.stop();
                }
                match attempt.url().host_str() {
                    Some(host) if allowed.iter().any(|a| a == host) => attempt.follow(),
                    _ => attempt.stop(),
                }
            }))
            .build()
            .expect("building the fetch HTTP client cannot fail with static config");
        Self {
            client,
            allowed_hosts,
        }
    }

    fn host_allowed(&self, url: &str) -> bool {
        reqwest::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .map(|host| self.allowed_hosts.iter().any(|a| *a == host))
            .unwrap_or(false)
    }
}

impl Default for HttpUrlFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlFetcher for HttpUrlFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        if !self.host_allowed(url) {
            return Err(FetchError::HostNotAllowed);
        }

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        if content_type.as_deref() != Some("image/png") {
            return Err(FetchError::ContentType(content_type));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        let len = bytes.len();
        if !(MIN_IMAGE_BYTES..=MAX_IMAGE_BYTES).contains(&len) {
            return Err(FetchError::Size {
                len,
                min: MIN_IMAGE_BYTES,
                max: MAX_IMAGE_BYTES,
            });
        }

        Ok(bytes.to_vec())
    }
}
