//! Chain walker: follows a ring of records back into the original payload.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::chunker::reconstruction_order;
use crate::codec;
use crate::config::ChainConfig;
use crate::error::{ChainError, Corruption};
use crate::record::{RecordCode, RecordKind, parse_url};
use crate::retry::{RetryPolicy, transport_only};
use crate::service::ShortLinkService;

/// A reconstructed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Records seen during one walk, in walk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Walk {
    pub records: Vec<RecordCode>,
    /// Position of the header record in `records`.
    pub header: Option<usize>,
}

impl Walk {
    /// Reorders the walked tags and decodes the payload.
    pub fn assemble(self) -> Result<Download, ChainError> {
        let header = self.header.ok_or(Corruption::NoHeader)?;
        let head = self.records.get(header).ok_or(Corruption::NoHeader)?;
        let compressed = matches!(head.kind, RecordKind::Header { compressed: true });
        let file_name = head.file_name()?;

        info!(parts = self.records.len() - 1, file = %file_name, "merging");

        let text: String = reconstruction_order(self.records, header)
            .iter()
            .map(|record| record.tag.as_str())
            .collect();
        let data = codec::decode(&text, compressed)?;

        Ok(Download { file_name, data })
    }
}

/// Downloads record chains from a [`ShortLinkService`].
pub struct ChainWalker<'a> {
    service: &'a dyn ShortLinkService,
    retry: RetryPolicy,
}

impl<'a> ChainWalker<'a> {
    /// Creates a walker. Fails if `config` is invalid.
    pub fn new(service: &'a dyn ShortLinkService, config: ChainConfig) -> Result<Self, ChainError> {
        config.validate()?;
        Ok(Self {
            service,
            retry: RetryPolicy::from_config(&config),
        })
    }

    /// Walks the chain containing `url` and reconstructs its file.
    pub async fn download(&self, url: &str, password: &str) -> Result<Download, ChainError> {
        self.walk(url, password).await?.assemble()
    }

    /// Follows redirects from `url` until the walk is back at its entry.
    ///
    /// Equal chunks share a tag but never a nonce, so a visit is keyed on
    /// the whole code. Stops with an error on a foreign URL, a malformed
    /// code, a second header or a cycle that skips the entry record.
    /// Resolution failures are retried per request.
    pub async fn walk(&self, url: &str, password: &str) -> Result<Walk, ChainError> {
        let prefix = self.service.prefix();
        let mut url = url.to_string();
        let mut visited = HashSet::new();
        let mut records: Vec<RecordCode> = Vec::new();
        let mut header = None;

        loop {
            let code = parse_url(&url, prefix)?;
            if !visited.insert((code.nonce.clone(), code.tag.clone())) {
                if records.first() != Some(&code) {
                    return Err(Corruption::OpenRing(url).into());
                }
                break;
            }
            if code.is_header() {
                if header.is_some() {
                    return Err(Corruption::DuplicateHeaders.into());
                }
                header = Some(records.len());
            }
            debug!(url = %url, "reading");
            records.push(code);

            let next = self
                .retry
                .run("resolve record", transport_only, |_| {
                    self.service.resolve(&url, password)
                })
                .await?;
            url = next;
        }

        if header.is_none() {
            return Err(Corruption::NoHeader.into());
        }
        Ok(Walk { records, header })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryService;
    use crate::record::{data_code, header_code};
    use crate::service::ServiceError;

    const P: &str = "http://mem.test/";

    fn fast_config() -> ChainConfig {
        ChainConfig {
            pause_ms: 0,
            max_delay_ms: 0,
            ..ChainConfig::default()
        }
    }

    /// Inserts `codes` as a ring: each one redirects to the next, the last
    /// back to the first.
    fn ring(svc: &MemoryService, codes: &[String]) {
        for (i, code) in codes.iter().enumerate() {
            let next = &codes[(i + 1) % codes.len()];
            svc.insert(code, &format!("{P}{next}"), "pw");
        }
    }

    fn plain_ring(svc: &MemoryService, chunks: &[&str]) -> Vec<String> {
        let mut codes = vec![header_code(false, "0000", "out.txt")];
        for (i, chunk) in chunks.iter().enumerate() {
            codes.push(data_code(&format!("{:04x}", i + 1), chunk));
        }
        ring(svc, &codes);
        codes
    }

    #[tokio::test]
    async fn walk_from_any_entry_point() {
        let svc = MemoryService::new();
        let text = hex::encode(b"hello chain");
        let chunks: Vec<&str> = crate::chunker::split(&text, 4);
        let codes = plain_ring(&svc, &chunks);
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        for code in &codes {
            let download = walker.download(&format!("{P}{code}"), "pw").await.unwrap();
            assert_eq!(download.file_name, "out.txt");
            assert_eq!(download.data, b"hello chain", "entered at {code}");
        }
    }

    #[tokio::test]
    async fn walk_records_header_position() {
        let svc = MemoryService::new();
        let codes = plain_ring(&svc, &["6869", "2121"]);
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let walk = walker.walk(&format!("{P}{}", codes[2]), "pw").await.unwrap();
        assert_eq!(walk.records.len(), 3);
        assert_eq!(walk.header, Some(1));
        assert_eq!(svc.resolves(), 3);
    }

    #[tokio::test]
    async fn headerless_cycle_reports_no_header() {
        let svc = MemoryService::new();
        ring(
            &svc,
            &["00aa-6161".to_string(), "00bb-6262".to_string(), "00cc-6363".to_string()],
        );
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let err = walker
            .download(&format!("{P}00aa-6161"), "pw")
            .await
            .unwrap_err();
        assert_eq!(err.corruption(), Some(&Corruption::NoHeader));
        assert_eq!(svc.resolves(), 3);
    }

    #[tokio::test]
    async fn self_loop_terminates() {
        let svc = MemoryService::new();
        svc.insert("00aa-6161", &format!("{P}00aa-6161"), "pw");
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let err = walker.walk(&format!("{P}00aa-6161"), "pw").await.unwrap_err();
        assert_eq!(err.corruption(), Some(&Corruption::NoHeader));
    }

    #[tokio::test]
    async fn two_headers_are_rejected() {
        let svc = MemoryService::new();
        ring(
            &svc,
            &[
                header_code(false, "0000", "a.txt"),
                "0001-6161".to_string(),
                header_code(true, "0002", "b.txt"),
            ],
        );
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let entry = format!("{P}{}", header_code(false, "0000", "a.txt"));
        let err = walker.download(&entry, "pw").await.unwrap_err();
        assert_eq!(err.corruption(), Some(&Corruption::DuplicateHeaders));
    }

    #[tokio::test]
    async fn foreign_url_breaks_chain() {
        let svc = MemoryService::new();
        let header = header_code(false, "0000", "a.txt");
        svc.insert(&header, "http://elsewhere.test/0001-6161", "pw");
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let err = walker.download(&format!("{P}{header}"), "pw").await.unwrap_err();
        assert!(matches!(err.corruption(), Some(Corruption::BadUrl(_))), "{err}");
    }

    #[tokio::test]
    async fn entry_url_must_match_service() {
        let svc = MemoryService::new();
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let err = walker
            .download("http://elsewhere.test/0001-6161", "pw")
            .await
            .unwrap_err();
        assert!(matches!(err.corruption(), Some(Corruption::BadUrl(_))));
        assert_eq!(svc.resolves(), 0);
    }

    #[tokio::test]
    async fn code_without_separator_breaks_chain() {
        let svc = MemoryService::new();
        let header = header_code(false, "0000", "a.txt");
        svc.insert(&header, &format!("{P}abcdef"), "pw");
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let err = walker.download(&format!("{P}{header}"), "pw").await.unwrap_err();
        assert!(matches!(
            err.corruption(),
            Some(Corruption::MissingSeparator(_))
        ));
    }

    #[tokio::test]
    async fn non_hex_tag_breaks_chain() {
        let svc = MemoryService::new();
        let header = header_code(false, "0000", "a.txt");
        svc.insert(&header, &format!("{P}0001-nothex"), "pw");
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let err = walker.download(&format!("{P}{header}"), "pw").await.unwrap_err();
        assert!(matches!(err.corruption(), Some(Corruption::NonHexTag(_))));
    }

    #[tokio::test]
    async fn always_failing_resolve_stops_at_max_tries() {
        let svc = MemoryService::new();
        let codes = plain_ring(&svc, &["6869"]);
        svc.fail_every_resolve(ServiceError::Transport("connection refused".into()));
        let config = ChainConfig {
            max_tries: 5,
            ..fast_config()
        };
        let walker = ChainWalker::new(&svc, config).unwrap();

        let err = walker
            .download(&format!("{P}{}", codes[0]), "pw")
            .await
            .unwrap_err();
        assert_eq!(svc.resolves(), 5);
        assert!(matches!(
            err,
            ChainError::RetriesExhausted {
                operation: "resolve record",
                attempts: 5,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let svc = MemoryService::new();
        let codes = plain_ring(&svc, &["6869"]);
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let err = walker
            .download(&format!("{P}{}", codes[0]), "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Rejected(_)));
        assert_eq!(svc.resolves(), 1);
    }

    #[tokio::test]
    async fn corrupt_compressed_payload_is_fatal() {
        let svc = MemoryService::new();
        // Flagged compressed, but the tags are not a zlib stream.
        let codes = vec![
            header_code(true, "0000", "a.txt"),
            data_code("0001", &hex::encode(b"not zlib")),
        ];
        ring(&svc, &codes);
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let err = walker
            .download(&format!("{P}{}", codes[0]), "pw")
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::Payload(_)), "{err}");
    }

    #[tokio::test]
    async fn equal_chunks_are_not_a_cycle() {
        let svc = MemoryService::new();
        let codes = vec![
            header_code(false, "0000", "twice.bin"),
            data_code("0001", "abcd"),
            data_code("0002", "abcd"),
            data_code("0003", "ef"),
        ];
        ring(&svc, &codes);
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        for code in &codes {
            let download = walker.download(&format!("{P}{code}"), "pw").await.unwrap();
            assert_eq!(download.data, [0xab, 0xcd, 0xab, 0xcd, 0xef], "entered at {code}");
        }
    }

    #[tokio::test]
    async fn cycle_skipping_entry_is_rejected() {
        let svc = MemoryService::new();
        let header = header_code(false, "0000", "a.txt");
        // Entry leads into a ring it is not part of.
        svc.insert("00ee-6565", &format!("{P}{header}"), "pw");
        svc.insert(&header, &format!("{P}0001-6161"), "pw");
        svc.insert("0001-6161", &format!("{P}{header}"), "pw");
        let walker = ChainWalker::new(&svc, fast_config()).unwrap();

        let err = walker.download(&format!("{P}00ee-6565"), "pw").await.unwrap_err();
        assert!(matches!(err.corruption(), Some(Corruption::OpenRing(_))), "{err}");
    }

    #[test]
    fn assemble_with_out_of_range_header() {
        let walk = Walk {
            records: Vec::new(),
            header: Some(0),
        };
        let err = walk.assemble().unwrap_err();
        assert_eq!(err.corruption(), Some(&Corruption::NoHeader));
    }

    #[test]
    fn assemble_rotates_around_header() {
        let records = ["0003-6363", "p0000-612e747874", "0001-6161", "0002-6262"]
            .iter()
            .map(|c| crate::record::parse_code(c).unwrap())
            .collect();
        let walk = Walk {
            records,
            header: Some(1),
        };
        let download = walk.assemble().unwrap();
        assert_eq!(download.file_name, "a.txt");
        assert_eq!(download.data, b"abc");
    }
}
