//! Chain builder: turns a payload into a ring of short-link records.
//!
//! Records are created back to front. The first record created (the last
//! chunk) points at the header's URL, which is predicted up front; each
//! following record points at the one created before it; the header is
//! created last and points at chunk 0, closing the ring.

use tracing::{debug, info, warn};

use crate::chunker::{creation_order, split};
use crate::codec;
use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::nonce;
use crate::record::{data_code, header_code};
use crate::retry::{RetryPolicy, any_failure, transport_only};
use crate::service::{Probe, ShortLinkService};
use crate::validation::validate_file_name;

/// Uploads payloads as record chains on a [`ShortLinkService`].
pub struct ChainBuilder<'a> {
    service: &'a dyn ShortLinkService,
    config: ChainConfig,
    retry: RetryPolicy,
}

impl<'a> ChainBuilder<'a> {
    /// Creates a builder. Fails if `config` is invalid.
    pub fn new(service: &'a dyn ShortLinkService, config: ChainConfig) -> Result<Self, ChainError> {
        config.validate()?;
        let retry = RetryPolicy::from_config(&config);
        Ok(Self {
            service,
            config,
            retry,
        })
    }

    /// Uploads `payload` under `file_name` and returns the header URL.
    ///
    /// Records created before a failure are left on the service.
    pub async fn upload(
        &self,
        file_name: &str,
        payload: &[u8],
        password: &str,
    ) -> Result<String, ChainError> {
        validate_file_name(file_name).map_err(|e| ChainError::InvalidInput(e.to_string()))?;

        let encoded = codec::encode(payload);
        let chunks = split(&encoded.text, self.config.tag_size);

        let header = header_code(
            encoded.compressed,
            &nonce::generate(self.config.nonce_size),
            file_name,
        );
        let header_url = self.service.url_for(&header);

        info!(
            file = file_name,
            bytes = payload.len(),
            compressed = encoded.compressed,
            records = chunks.len() + 1,
            "uploading"
        );

        self.ensure_free(&header_url).await?;

        let total = chunks.len();
        let mut target = header_url;
        for (i, chunk) in creation_order(chunks).into_iter().enumerate() {
            target = self.create_chunk(&target, chunk, password).await?;
            debug!(url = %target, record = i + 1, total, "created");
        }

        let url = self
            .retry
            .run("create header", transport_only, |_| {
                self.service.create(&target, &header, password)
            })
            .await?;

        info!(url = %url, "upload complete");
        Ok(url)
    }

    /// Fails if a record already sits at the header URL.
    ///
    /// A transport failure here is not fatal: the header creation itself
    /// will still refuse a taken code.
    async fn ensure_free(&self, header_url: &str) -> Result<(), ChainError> {
        tokio::time::sleep(self.retry.pause).await;
        match self.service.probe(header_url).await {
            Ok(Probe::Exists) => Err(ChainError::AlreadyExists(header_url.to_string())),
            Ok(Probe::Missing) => Ok(()),
            Err(e) => {
                warn!(url = %header_url, error = %e, "existence check failed, continuing");
                Ok(())
            }
        }
    }

    /// Creates one data record, with a fresh nonce on every attempt.
    async fn create_chunk(
        &self,
        target: &str,
        chunk: &str,
        password: &str,
    ) -> Result<String, ChainError> {
        self.retry
            .run("create record", any_failure, |attempt| {
                let code = data_code(&nonce::generate(self.config.nonce_size), chunk);
                if attempt > 1 {
                    debug!(attempt, code = %code, "retrying with new nonce");
                }
                async move { self.service.create(target, &code, password).await }
            })
            .await
    }
}
