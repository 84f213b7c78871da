//! Value <-> stored-envelope conversion.
//!
//! Envelope format: `[flag][crc32 LE][body]`, where the body is the bincode
//! serialization of the value, lz4-compressed when it reaches the configured
//! threshold. The tombstone ("explicitly cached absence") is the single flag
//! byte with no body, so it can never be confused with an empty payload.

use crate::errors::CodecError;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use crc32fast::Hasher as Crc32Hasher;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Body stored as-is.
pub const FLAG_RAW: u8 = 0;
/// Body is lz4 block data with a prepended uncompressed size.
pub const FLAG_COMPRESSED: u8 = 1;
/// No body: the entry is a cached "no value" marker.
pub const FLAG_TOMBSTONE: u8 = 2;

const CRC_LEN: usize = 4;

fn checksum(body: &[u8]) -> u32 {
    let mut hasher = Crc32Hasher::new();
    hasher.update(body);
    hasher.finalize()
}

/// Encode an optional value into its envelope. `None` encodes the tombstone.
///
/// Bodies of `compression_threshold` bytes or more are compressed, unless
/// compression fails to shrink them (incompressible data is stored raw and
/// flagged accordingly).
pub fn encode_value<V: Serialize>(
    value: Option<&V>,
    compression_threshold: usize,
) -> Result<Vec<u8>, CodecError> {
    let Some(value) = value else {
        return Ok(vec![FLAG_TOMBSTONE]);
    };

    let body = encode_to_vec(value, standard())?;
    let (flag, body) = if body.len() >= compression_threshold {
        let compressed =
            lz4::block::compress(&body, None, true).map_err(CodecError::Compress)?;
        if compressed.len() < body.len() {
            (FLAG_COMPRESSED, compressed)
        } else {
            (FLAG_RAW, body)
        }
    } else {
        (FLAG_RAW, body)
    };

    let mut envelope = Vec::with_capacity(1 + CRC_LEN + body.len());
    envelope.push(flag);
    envelope.extend_from_slice(&checksum(&body).to_le_bytes());
    envelope.extend_from_slice(&body);
    Ok(envelope)
}

/// Decode an envelope back into an optional value. The tombstone decodes to
/// `None`.
///
/// # Errors
/// Fails (never panics) on truncated input, unknown flags, checksum
/// mismatches, or undecodable bodies.
pub fn decode_value<V: DeserializeOwned>(bytes: &[u8]) -> Result<Option<V>, CodecError> {
    let (&flag, rest) = bytes.split_first().ok_or(CodecError::Malformed)?;

    match flag {
        FLAG_TOMBSTONE => {
            if rest.is_empty() {
                Ok(None)
            } else {
                Err(CodecError::Malformed)
            }
        }
        FLAG_RAW | FLAG_COMPRESSED => {
            if rest.len() < CRC_LEN {
                return Err(CodecError::Malformed);
            }
            let (crc_bytes, body) = rest.split_at(CRC_LEN);
            let mut crc = [0u8; CRC_LEN];
            crc.copy_from_slice(crc_bytes);
            if checksum(body) != u32::from_le_bytes(crc) {
                return Err(CodecError::ChecksumMismatch);
            }

            let plain = if flag == FLAG_COMPRESSED {
                lz4::block::decompress(body, None).map_err(CodecError::Decompress)?
            } else {
                body.to_vec()
            };
            let (value, _) = decode_from_slice::<V, _>(&plain, standard())?;
            Ok(Some(value))
        }
        other => Err(CodecError::UnknownFlag(other)),
    }
}
