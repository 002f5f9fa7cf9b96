// Payload decoding for plain and gzip-compressed source files

use crate::core::constants::GZIP_MAGIC;
use crate::core::error::{BuoyError, Result};
use flate2::read::GzDecoder;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Plain,
    Gzip,
}

impl Encoding {
    pub fn detect(data: &[u8]) -> Self {
        if data.len() >= 2 && data[..2] == GZIP_MAGIC {
            Encoding::Gzip
        } else {
            Encoding::Plain
        }
    }
}

pub fn decompress(data: &[u8], encoding: Encoding) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Plain => Ok(data.to_vec()),

        Encoding::Gzip => {
            let mut decoder = GzDecoder::new(data);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| BuoyError::DecompressionFailed(format!("gzip: {}", e)))?;
            Ok(decompressed)
        }
    }
}

/// Decode a raw source payload into text, inflating it first if it is gzip.
pub fn decode_text(data: &[u8]) -> Result<String> {
    let raw = decompress(data, Encoding::detect(data))?;
    Ok(String::from_utf8(raw)?)
}
