//! Chunk-chain storage of files inside a short-link redirection service.
//!
//! A payload is compressed (when that helps), hex-encoded and cut into tags.
//! Each tag becomes the code of a short link whose target is the previously
//! created link, and a header link carrying the file name and compression
//! flag closes the ring. Any link of the ring is enough to walk it back.
//!
//! # Pipeline
//!
//! 1. **Codec**: zlib (only if smaller) then hex
//! 2. **Chunker**: fixed-size tags, created back to front
//! 3. **Builder**: one paced, retried create call per record
//! 4. **Walker**: resolve redirects until a tag repeats, rotate, decode
//!
//! The service itself sits behind [`ShortLinkService`]; the `shortfs-itomx`
//! crate provides the HTTP implementation.

pub mod builder;
pub mod chunker;
pub mod codec;
pub mod config;
pub mod error;
pub mod nonce;
pub mod record;
pub mod retry;
pub mod service;
pub mod validation;
pub mod walker;

#[cfg(test)]
pub(crate) mod memory;

pub use builder::ChainBuilder;
pub use config::ChainConfig;
pub use error::{ChainError, Corruption};
pub use service::{Probe, ServiceError, ServiceFuture, ShortLinkService};
pub use validation::validate_file_name;
pub use walker::{ChainWalker, Download, Walk};

/// Uploads `payload` as a new chain and returns the header URL.
pub async fn upload(
    service: &dyn ShortLinkService,
    config: ChainConfig,
    file_name: &str,
    payload: &[u8],
    password: &str,
) -> Result<String, ChainError> {
    ChainBuilder::new(service, config)?
        .upload(file_name, payload, password)
        .await
}

/// Reconstructs the file stored in the chain containing `url`.
pub async fn download(
    service: &dyn ShortLinkService,
    config: ChainConfig,
    url: &str,
    password: &str,
) -> Result<Download, ChainError> {
    ChainWalker::new(service, config)?
        .download(url, password)
        .await
}
