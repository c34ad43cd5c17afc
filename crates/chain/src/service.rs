//! Short-link service trait.
//!
//! `ShortLinkService` is implemented by a concrete backend (see the
//! `shortfs-itomx` crate) so the chain logic stays decoupled from HTTP and
//! testable with an in-memory fake.

use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`ShortLinkService`] methods.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send + 'a>>;

/// Failure reported by a service backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Connection or HTTP-level failure. Worth retrying.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered but refused the request (code taken, wrong
    /// password, unknown code).
    #[error("rejected: {0}")]
    Rejected(String),
}

impl ServiceError {
    /// Whether this is a transient transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result of probing a short URL for existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Exists,
    Missing,
}

/// Abstract short-link redirection service.
pub trait ShortLinkService: Send + Sync {
    /// URL prefix every record URL starts with, including the trailing `/`.
    fn prefix(&self) -> &str;

    /// Creates a record `code` redirecting to `target`, gated by `password`.
    ///
    /// Returns the record's public URL as reported by the service.
    fn create<'a>(
        &'a self,
        target: &'a str,
        code: &'a str,
        password: &'a str,
    ) -> ServiceFuture<'a, String>;

    /// Unlocks `url` with `password` and returns the URL it redirects to.
    fn resolve<'a>(&'a self, url: &'a str, password: &'a str) -> ServiceFuture<'a, String>;

    /// Checks whether a record already exists at `url`.
    fn probe<'a>(&'a self, url: &'a str) -> ServiceFuture<'a, Probe>;

    /// Builds the public URL of `code` on this service.
    fn url_for(&self, code: &str) -> String {
        format!("{}{}", self.prefix(), code)
    }
}
