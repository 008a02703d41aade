//! Per-frame compression applied once a session has negotiated it.
//!
//! Before negotiation, frames travel as-is. After the server has sent its
//! `NetworkSettings` reply, every frame in both directions starts with a
//! one-byte header naming how the rest of the frame is encoded:
//!
//! ```text
//! ┌──────┬──────────────────────────────┐
//! │ 0x00 │ raw-deflate compressed bytes │   payload >= threshold
//! ├──────┼──────────────────────────────┤
//! │ 0xFF │ uncompressed bytes           │   payload <  threshold
//! └──────┴──────────────────────────────┘
//! ```

use std::io::{self, Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde::{Deserialize, Serialize};

/// Payloads smaller than this many bytes are sent without compression.
pub const DEFAULT_COMPRESSION_THRESHOLD: u16 = 512;

/// Upper bound on a decompressed frame. Anything larger is rejected
/// rather than inflated into memory.
pub const MAX_DECOMPRESSED_FRAME: usize = 8 * 1024 * 1024;

const HEADER_DEFLATE: u8 = 0x00;
const HEADER_RAW: u8 = 0xFF;

/// Compression algorithms a client can be told to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompressionAlgorithm {
    /// zlib's deflate, sent without the zlib wrapper.
    Zlib,
    /// Frames carry the header byte but are never compressed.
    None,
}

/// Compression settings for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compression {
    /// The negotiated algorithm.
    pub algorithm: CompressionAlgorithm,
    /// Payloads below this size are framed raw.
    pub threshold: u16,
}

impl Compression {
    /// Deflate with the default 512-byte threshold.
    pub fn zlib() -> Self {
        Self {
            algorithm: CompressionAlgorithm::Zlib,
            threshold: DEFAULT_COMPRESSION_THRESHOLD,
        }
    }

    /// Frames an outbound payload.
    pub fn compress(&self, payload: &[u8]) -> io::Result<Vec<u8>> {
        let deflate = self.algorithm == CompressionAlgorithm::Zlib
            && payload.len() >= usize::from(self.threshold);

        if !deflate {
            let mut frame = Vec::with_capacity(payload.len() + 1);
            frame.push(HEADER_RAW);
            frame.extend_from_slice(payload);
            return Ok(frame);
        }

        let mut encoder = DeflateEncoder::new(
            vec![HEADER_DEFLATE],
            flate2::Compression::default(),
        );
        encoder.write_all(payload)?;
        encoder.finish()
    }

    /// Unframes an inbound payload.
    pub fn decompress(&self, frame: &[u8]) -> io::Result<Vec<u8>> {
        let (header, body) = frame.split_first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "empty frame")
        })?;

        match *header {
            HEADER_RAW => Ok(body.to_vec()),
            HEADER_DEFLATE => {
                let mut out = Vec::new();
                // Read one byte past the limit so an oversized frame is
                // detectable instead of silently truncated.
                DeflateDecoder::new(body)
                    .take(MAX_DECOMPRESSED_FRAME as u64 + 1)
                    .read_to_end(&mut out)?;
                if out.len() > MAX_DECOMPRESSED_FRAME {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        "decompressed frame exceeds limit",
                    ));
                }
                Ok(out)
            }
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown compression header 0x{other:02x}"),
            )),
        }
    }
}
