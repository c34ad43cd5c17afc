//! Error types for chain building and walking.

use crate::service::ServiceError;

/// Structural problems found while walking a chain.
///
/// None of these are retried: asking the service again cannot repair a
/// malformed chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Corruption {
    #[error("bad URL: {0}")]
    BadUrl(String),

    #[error("missing separator in code: {0}")]
    MissingSeparator(String),

    #[error("non-hex tag in code: {0}")]
    NonHexTag(String),

    #[error("no header found")]
    NoHeader,

    #[error("duplicate headers found")]
    DuplicateHeaders,

    #[error("chain does not return to its entry record: {0}")]
    OpenRing(String),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),
}

/// Errors produced by the chain builder and walker.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: ServiceError,
    },

    #[error("service rejected request: {0}")]
    Rejected(String),

    #[error("target already exists: {0}")]
    AlreadyExists(String),

    #[error("broken chain: {0}")]
    Corruption(#[from] Corruption),

    #[error("corrupt payload: {0}")]
    Payload(String),
}

impl ChainError {
    /// Returns the structural corruption kind, if this is one.
    pub fn corruption(&self) -> Option<&Corruption> {
        match self {
            Self::Corruption(kind) => Some(kind),
            _ => None,
        }
    }
}
