//! Record code syntax.
//!
//! Data records are named `<nonce>-<chunk>`. The header record is named
//! `<flag><nonce>-<hex file name>`, where the flag is `z` for a compressed
//! payload and `p` for a plain one. Nonces are lowercase hex, so they can
//! never start with either flag.

use crate::error::Corruption;
use crate::validation::validate_file_name;

/// Header flag for a compressed payload.
pub const FLAG_COMPRESSED: char = 'z';
/// Header flag for an uncompressed payload.
pub const FLAG_PLAIN: char = 'p';
/// Separator between nonce and tag.
pub const SEPARATOR: char = '-';

/// What a parsed code denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Data,
    Header { compressed: bool },
}

/// A parsed record code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordCode {
    pub nonce: String,
    /// Lowercase hex tag: a payload chunk or the hex file name.
    pub tag: String,
    pub kind: RecordKind,
}

impl RecordCode {
    pub fn is_header(&self) -> bool {
        matches!(self.kind, RecordKind::Header { .. })
    }

    /// Decodes the file name carried by a header tag.
    pub fn file_name(&self) -> Result<String, Corruption> {
        let bytes =
            hex::decode(&self.tag).map_err(|_| Corruption::NonHexTag(self.tag.clone()))?;
        let name = String::from_utf8(bytes)
            .map_err(|_| Corruption::InvalidFileName(format!("not UTF-8: {}", self.tag)))?;
        validate_file_name(&name)?;
        Ok(name)
    }
}

/// Builds the code of a data record.
pub fn data_code(nonce: &str, chunk: &str) -> String {
    format!("{nonce}{SEPARATOR}{chunk}")
}

/// Builds the code of a header record.
pub fn header_code(compressed: bool, nonce: &str, file_name: &str) -> String {
    let flag = if compressed {
        FLAG_COMPRESSED
    } else {
        FLAG_PLAIN
    };
    format!("{flag}{nonce}{SEPARATOR}{}", hex::encode(file_name.as_bytes()))
}

/// Parses a record URL issued by the service at `prefix`.
pub fn parse_url(url: &str, prefix: &str) -> Result<RecordCode, Corruption> {
    let code = url
        .strip_prefix(prefix)
        .ok_or_else(|| Corruption::BadUrl(url.to_string()))?;
    parse_code(code)
}

/// Parses a bare record code.
pub fn parse_code(code: &str) -> Result<RecordCode, Corruption> {
    let (nonce, tag) = match code.split_once(SEPARATOR) {
        Some((nonce, tag)) if !nonce.is_empty() => (nonce, tag),
        _ => return Err(Corruption::MissingSeparator(code.to_string())),
    };

    if !tag.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Corruption::NonHexTag(code.to_string()));
    }

    let kind = if nonce.starts_with(FLAG_COMPRESSED) {
        RecordKind::Header { compressed: true }
    } else if nonce.starts_with(FLAG_PLAIN) {
        RecordKind::Header { compressed: false }
    } else {
        RecordKind::Data
    };

    Ok(RecordCode {
        nonce: nonce.to_string(),
        tag: tag.to_ascii_lowercase(),
        kind,
    })
}
