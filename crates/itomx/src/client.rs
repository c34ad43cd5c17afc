//! ito.mx API client.
//!
//! Async HTTP client using `reqwest`. Redirects are never followed: the
//! `Location` of a password-gated record is the next link of the chain.

use std::time::Duration;

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use tracing::debug;

use shortfs_chain::{Probe, ServiceError, ServiceFuture, ShortLinkService};

/// Public ito.mx endpoint.
pub const DEFAULT_BASE_URL: &str = "http://ito.mx";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ADD_PATH: &str = "/?module=ShortURL&file=Add&mode=API";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const ERROR_MARKER: &str = "<h3 class=\"error\">";

/// Errors from building the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL: {0}")]
    BaseUrl(String),
}

/// ito.mx API client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    prefix: String,
}

impl Client {
    /// Creates a client for the public service.
    pub fn new() -> Result<Self, Error> {
        Self::with_options(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Creates a client for a service at `base_url` (mirrors, tests).
    pub fn with_options(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let base = base_url.trim_end_matches('/');
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(Error::BaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base.to_string(),
            prefix: format!("{base}/"),
        })
    }

    /// Creates a shortened URL `code` pointing at `target`.
    async fn add(&self, target: &str, code: &str, password: &str) -> Result<String, ServiceError> {
        let body = form(&[("pass", password), ("tag", code), ("url", target)]);
        let resp = self
            .http
            .post(format!("{}{ADD_PATH}", self.base_url))
            .header(CONTENT_TYPE, FORM_URLENCODED)
            .body(body)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ServiceError::Transport(format!("HTTP {status}")));
        }

        let url_encoded = has_content_type(&resp, FORM_URLENCODED);
        let mut text = resp.text().await.map_err(transport)?;
        if url_encoded {
            text = percent_decode_str(&text).decode_utf8_lossy().into_owned();
        }

        let url = text.trim();
        if !url.starts_with(&self.prefix) {
            return Err(ServiceError::Rejected(clean_error(url)));
        }

        debug!(url, "created");
        Ok(url.to_string())
    }

    /// Unlocks `url` and returns its redirect target.
    async fn unlock(&self, url: &str, password: &str) -> Result<String, ServiceError> {
        let resp = self
            .http
            .post(url)
            .header(CONTENT_TYPE, FORM_URLENCODED)
            .body(form(&[("pass", password)]))
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if status.is_redirection() {
            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| ServiceError::Rejected(format!("redirect without Location from {url}")))?;
            let next = resp
                .url()
                .join(location)
                .map_err(|e| ServiceError::Rejected(format!("bad Location {location:?}: {e}")))?;
            return Ok(next.to_string());
        }

        if !status.is_success() {
            return Err(ServiceError::Transport(format!("HTTP {status}")));
        }

        // The password form again.
        Err(ServiceError::Rejected(format!(
            "no redirect from {url}, wrong password?"
        )))
    }

    /// Checks whether `url` is taken.
    async fn check(&self, url: &str) -> Result<Probe, ServiceError> {
        let resp = self.http.get(url).send().await.map_err(transport)?;
        let status = resp.status();

        if status.is_redirection() {
            return Ok(Probe::Exists);
        }
        if !status.is_success() {
            return Ok(Probe::Missing);
        }

        let body = resp.text().await.map_err(transport)?;
        if body.to_ascii_lowercase().contains(ERROR_MARKER) {
            Ok(Probe::Missing)
        } else {
            Ok(Probe::Exists)
        }
    }
}

impl ShortLinkService for Client {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn create<'a>(
        &'a self,
        target: &'a str,
        code: &'a str,
        password: &'a str,
    ) -> ServiceFuture<'a, String> {
        Box::pin(self.add(target, code, password))
    }

    fn resolve<'a>(&'a self, url: &'a str, password: &'a str) -> ServiceFuture<'a, String> {
        Box::pin(self.unlock(url, password))
    }

    fn probe<'a>(&'a self, url: &'a str) -> ServiceFuture<'a, Probe> {
        Box::pin(self.check(url))
    }
}

fn transport(e: reqwest::Error) -> ServiceError {
    ServiceError::Transport(e.to_string())
}

/// Encodes `pairs` as an `application/x-www-form-urlencoded` body.
fn form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", utf8_percent_encode(v, NON_ALPHANUMERIC)))
        .collect::<Vec<_>>()
        .join("&")
}

fn has_content_type(resp: &reqwest::Response, mime: &str) -> bool {
    resp.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(mime))
}

/// Turns the HTML fragment the service answers with on failure into a
/// plain message.
fn clean_error(body: &str) -> String {
    let msg = body
        .replace("<h3>", "")
        .replace("</h3>", "")
        .replace("<H3>", "")
        .replace("</H3>", "");
    let msg = msg.trim();
    if msg.is_empty() {
        "empty response".into()
    } else {
        msg.to_string()
    }
}
