//! Payload codec: optional zlib compression followed by hex encoding.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use crate::error::ChainError;

/// Hex text ready for chunking, plus the compression flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub text: String,
    pub compressed: bool,
}

/// Compresses `payload` if that makes it strictly smaller, then hex-encodes.
pub fn encode(payload: &[u8]) -> Encoded {
    match compress(payload) {
        Some(zipped) if zipped.len() < payload.len() => Encoded {
            text: hex::encode(zipped),
            compressed: true,
        },
        _ => Encoded {
            text: hex::encode(payload),
            compressed: false,
        },
    }
}

/// Reverses [`encode`].
pub fn decode(text: &str, compressed: bool) -> Result<Vec<u8>, ChainError> {
    let bytes = hex::decode(text).map_err(|e| ChainError::Payload(format!("bad hex: {e}")))?;
    if !compressed {
        return Ok(bytes);
    }

    inflate(&bytes)
}

fn compress(data: &[u8]) -> Option<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data).ok()?;
    encoder.finish().ok()
}

/// Inflates a complete zlib stream. A stream that ends before its trailer
/// is an error rather than a short read.
fn inflate(bytes: &[u8]) -> Result<Vec<u8>, ChainError> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(bytes.len().saturating_mul(4).max(64));

    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity().max(64));
        }
        let before_in = inflater.total_in();
        let before_out = inflater.total_out();
        let status = inflater
            .decompress_vec(&bytes[before_in as usize..], &mut out, FlushDecompress::Finish)
            .map_err(|e| ChainError::Payload(format!("decompression failed: {e}")))?;

        match status {
            Status::StreamEnd => return Ok(out),
            _ if inflater.total_in() == before_in && inflater.total_out() == before_out => {
                return Err(ChainError::Payload(
                    "decompression failed: truncated stream".into(),
                ));
            }
            _ => {}
        }
    }
}
