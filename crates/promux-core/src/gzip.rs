//! Gzip helpers (flate2) for scrape bodies and served responses.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{PromuxError, Result};

/// Gzip `data` at the default level. Empty input yields empty output.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PromuxError::Internal(format!("gzip compress failed: {e}")))?;
    encoder
        .finish()
        .map_err(|e| PromuxError::Internal(format!("gzip compress failed: {e}")))
}

/// Inflate a complete gzip stream. Empty input yields empty output.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| PromuxError::Decompress(format!("failed to read from gzip reader: {e}")))?;
    Ok(out)
}
