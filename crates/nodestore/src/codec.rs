//! Payload codec for stored nodes.
//!
//! Node payloads are opaque bytes. They are zlib-compressed and then base64
//! encoded so the `data` field of a stored document is plain text:
//!
//! ```text
//! data = base64(zlib(bytes))
//! ```
//!
//! The format is wire-visible and must stay readable by every deployed writer.

use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::STANDARD};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use thiserror::Error;

/// Errors raised while decoding a stored payload.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The stored text is not valid base64.
    #[error("invalid base64 payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    /// The decoded bytes are not a valid zlib stream.
    #[error("failed to decompress payload: {0}")]
    Decompression(#[source] std::io::Error),
}

/// Compresses and encodes raw bytes for storage.
pub fn encode_node_data(data: &[u8]) -> String {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len() / 2 + 16),
        Compression::default(),
    );
    // Writing into a Vec cannot fail.
    let compressed = encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .unwrap_or_else(|e| unreachable!("in-memory zlib compression failed: {e}"));
    STANDARD.encode(compressed)
}

/// Decodes and decompresses a stored payload.
pub fn decode_node_data(data: &str) -> Result<Vec<u8>, CodecError> {
    let compressed = STANDARD.decode(data.trim())?;
    let mut decoder = ZlibDecoder::new(compressed.as_slice());
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(CodecError::Decompression)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_json_payload() {
        let data = br#"{"a":1}"#;
        let encoded = encode_node_data(data);
        assert_eq!(decode_node_data(&encoded).unwrap(), data);
    }

    #[test]
    fn test_round_trip_empty() {
        let encoded = encode_node_data(b"");
        assert!(!encoded.is_empty());
        assert_eq!(decode_node_data(&encoded).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_round_trip_binary() {
        let data: Vec<u8> = (0..=255u8).chain([0xff, 0xfe, 0x00, 0x80]).collect();
        let encoded = encode_node_data(&data);
        assert_eq!(decode_node_data(&encoded).unwrap(), data);
    }

    #[test]
    fn test_round_trip_large_repetitive() {
        let data = b"node payload ".repeat(10_000);
        let encoded = encode_node_data(&data);
        assert!(encoded.len() < data.len() / 10);
        assert_eq!(decode_node_data(&encoded).unwrap(), data);
    }

    #[test]
    fn test_decodes_zlib_written_elsewhere() {
        // base64(zlib.compress(b"hello world"))
        let stored = "eJzLSM3JyVcozy/KSQEAGgsEXQ==";
        assert_eq!(decode_node_data(stored).unwrap(), b"hello world");
    }

    #[test]
    fn test_rejects_invalid_base64() {
        let err = decode_node_data("not base64 !!").unwrap_err();
        assert!(matches!(err, CodecError::InvalidEncoding(_)));
    }

    #[test]
    fn test_rejects_non_zlib_payload() {
        let stored = STANDARD.encode(b"plain text, not zlib");
        let err = decode_node_data(&stored).unwrap_err();
        assert!(matches!(err, CodecError::Decompression(_)));
    }
}
