//! StreamDecode - frame-by-frame audio decoding with seeking
//!
//! Opens a media file, picks its best audio stream and decodes it into
//! interleaved PCM of a fixed format, one frame per call. Sessions can seek
//! back to any sample and read on; the output after a seek is identical to
//! what a linear read produced from the same frame boundary.
//!
//! ## Module Structure
//!
//! - `core` - Decode session, packet pump, sample conversion and timing
//! - `cli` - Command-line interface
//! - `config` - Session options
//! - `error` - Error types
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use streamdecode::SymphoniaStream;
//!
//! let mut session = SymphoniaStream::open("track.flac")?;
//! let config = session.output_config().clone();
//! let mut buffer = vec![0u8; config.frame_buffer_len()];
//!
//! while let Some(frame) = session.read_frame(&mut buffer)? {
//!     let bytes = config.bytes_for(frame.samples);
//!     println!("{} samples at {}", frame.samples, frame.timestamp);
//!     consume(&buffer[..bytes]);
//! }
//!
//! session.seek(0)?;
//! session.close();
//! ```
//!
//! ## Output Formats
//!
//! | Source depth       | Output         |
//! |--------------------|----------------|
//! | 16 bit             | s16 (2 bytes)  |
//! | 24/32 bit, float   | flt (4 bytes)  |
//! | anything else      | flt, with a warning |

// Decode session and supporting types
pub mod core;

// Command-line interface
pub mod cli;

// Session options
pub mod config;

pub mod error;

// Re-export commonly used types at crate root for convenience
pub use config::{FrameSizePolicy, SessionOptions, SessionOptionsBuilder};
pub use crate::core::{
    describe_streams, verify_rewind, AnyFrame, FrameRead, OpenWarning, OutputConfig,
    RewindReport, SampleFormat, SessionStats, StreamDecoder, StreamInfo, SymphoniaStream,
    Timestamp,
};
pub use error::{Error, Result};
