// src/core/verify.rs
//
// Rewind consistency check: read a stream to the end, seek back to the
// start, read it again and compare digests of both passes.

use log::{debug, warn};
use serde::Serialize;

use super::backend::{Container, FrameDecoder};
use super::session::{StreamDecoder, Timestamp};
use crate::error::{Error, Result};

/// What one linear read of a stream produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub frames: u64,
    /// Samples per channel
    pub samples: u64,
    pub first_timestamp: Option<Timestamp>,
    pub last_timestamp: Option<Timestamp>,
    /// MD5 of the interleaved output bytes
    pub digest: String,
    /// Read errors that ended the pass early
    pub errors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewindReport {
    pub first: PassSummary,
    pub second: PassSummary,
}

impl RewindReport {
    /// Both passes decoded the same bytes.
    pub fn is_consistent(&self) -> bool {
        self.first.samples == self.second.samples && self.first.digest == self.second.digest
    }
}

/// Read from the current position to the end of the stream.
///
/// Decode and conversion errors end the pass the way end of stream does and
/// are counted; an undersized `buffer` is returned as an error.
pub fn read_pass<C, D>(session: &mut StreamDecoder<C, D>, buffer: &mut [u8]) -> Result<PassSummary>
where
    C: Container,
    D: FrameDecoder,
{
    let mut digest = md5::Context::new();
    let mut summary = PassSummary {
        frames: 0,
        samples: 0,
        first_timestamp: None,
        last_timestamp: None,
        digest: String::new(),
        errors: 0,
    };

    loop {
        match session.read_frame(buffer) {
            Ok(Some(frame)) => {
                debug!("read {} @ {}", frame.samples, frame.timestamp);
                let bytes = session.output_config().bytes_for(frame.samples);
                digest.consume(&buffer[..bytes]);
                summary.frames += 1;
                summary.samples += frame.samples as u64;
                summary.first_timestamp.get_or_insert(frame.timestamp);
                summary.last_timestamp = Some(frame.timestamp);
            }
            Ok(None) => break,
            Err(e @ Error::BufferTooSmall { .. }) => return Err(e),
            Err(e) => {
                warn!("stopping read after error: {}", e);
                summary.errors += 1;
                break;
            }
        }
    }

    summary.digest = format!("{:x}", digest.compute());
    Ok(summary)
}

/// Read the whole stream, seek to sample 0, and read it again.
pub fn verify_rewind<C, D>(
    session: &mut StreamDecoder<C, D>,
    buffer: &mut [u8],
) -> Result<RewindReport>
where
    C: Container,
    D: FrameDecoder,
{
    let first = read_pass(session, buffer)?;
    session.seek(0)?;
    let second = read_pass(session, buffer)?;
    Ok(RewindReport { first, second })
}
