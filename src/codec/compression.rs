//! Block compression framing for save containers.
//!
//! A container is `[tag][size delta][lz4 block]`. The delta is the number of
//! bytes the block grows by when decompressed, stored little-endian in 2 or 4
//! bytes as selected by bits 6-7 of the tag.

use crate::error::{Error, Result};

/// Tag for a 2-byte size delta
pub const SHORT_DELTA_TAG: u8 = 0x80;
/// Tag for a 4-byte size delta
pub const LONG_DELTA_TAG: u8 = 0xC0;
/// Payloads at or above this size use the 4-byte delta
pub const LONG_DELTA_THRESHOLD: usize = 65536;
/// LZ4 cannot expand a block by more than this factor
pub const MAX_EXPANSION: usize = 255;

/// Compress a decompressed payload into a container
pub fn compress(payload: &[u8]) -> Result<Vec<u8>> {
    let block = lz4_flex::block::compress(payload);
    let delta = payload.len().checked_sub(block.len()).ok_or_else(|| {
        Error::Compression(format!(
            "compressed block ({} bytes) is larger than payload ({} bytes)",
            block.len(),
            payload.len()
        ))
    })?;

    let mut out = Vec::with_capacity(block.len() + 5);
    if payload.len() >= LONG_DELTA_THRESHOLD {
        let delta = u32::try_from(delta)
            .map_err(|_| Error::Compression(format!("size delta {} exceeds u32", delta)))?;
        out.push(LONG_DELTA_TAG);
        out.extend_from_slice(&delta.to_le_bytes());
    } else {
        // payload is below 65536 so the delta always fits
        out.push(SHORT_DELTA_TAG);
        out.extend_from_slice(&(delta as u16).to_le_bytes());
    }
    out.extend_from_slice(&block);
    Ok(out)
}

/// Width in bytes of the size delta announced by `tag`
pub fn delta_width(tag: u8) -> Result<usize> {
    match (tag >> 6) & 3 {
        3 => Ok(4),
        2 => Ok(2),
        _ => Err(Error::InvalidCompressionTag(tag)),
    }
}

/// Unwrap a container into its decompressed payload
pub fn decompress(container: &[u8]) -> Result<Vec<u8>> {
    let (&tag, rest) = container.split_first().ok_or(Error::UnexpectedEof)?;
    let width = delta_width(tag)?;
    if rest.len() < width {
        return Err(Error::UnexpectedEof);
    }
    let (delta_bytes, block) = rest.split_at(width);
    let delta = match width {
        4 => u32::from_le_bytes([delta_bytes[0], delta_bytes[1], delta_bytes[2], delta_bytes[3]]) as usize,
        _ => u16::from_le_bytes([delta_bytes[0], delta_bytes[1]]) as usize,
    };

    if delta > block.len().saturating_mul(MAX_EXPANSION) {
        return Err(Error::Compression(format!(
            "size delta {} is impossible for a {} byte block",
            delta,
            block.len()
        )));
    }
    let result_len = block.len() + delta;
    let mut out = vec![0u8; result_len];
    let written = lz4_flex::block::decompress_into(block, &mut out)
        .map_err(|e| Error::Compression(format!("lz4 error: {}", e)))?;
    out.truncate(written);

    tracing::debug!(compressed = block.len(), decompressed = written, "decompressed save container");
    Ok(out)
}
