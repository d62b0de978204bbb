// src/error.rs
//
// Error types for session setup, frame reading and seeking.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a media backend (container reader or codec).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("malformed data: {0}")]
    Malformed(String),

    #[error("seek failed: {0}")]
    Seek(String),

    #[error("{0}")]
    Other(String),
}

/// Codec lookup/initialization failure, as reported by a backend.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("no decoder available for codec {0}")]
    NotFound(String),

    #[error("failed to open codec: {0}")]
    Open(#[source] BackendError),
}

/// Sample conversion failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("frame has {actual} channels, converter is configured for {expected}")]
    ChannelMismatch { expected: usize, actual: usize },

    #[error("output holds {capacity} bytes, frame needs {needed}")]
    OutputTooSmall { needed: usize, capacity: usize },

    #[error("invalid converter configuration: {0}")]
    InvalidSpec(String),
}

/// Errors surfaced by a decode session.
///
/// Open-time variants abort the open. Read-time variants fail only the
/// current call; the session stays usable afterwards.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not open container {}: {source}", path.display())]
    ContainerOpen {
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    #[error("could not find stream information: {0}")]
    StreamInfo(#[source] BackendError),

    #[error("no decodable audio stream found")]
    NoAudioStream,

    #[error("no decoder found for codec {0}")]
    CodecNotFound(String),

    #[error("failed to open codec: {0}")]
    CodecOpen(#[source] BackendError),

    #[error("error decoding audio frame: {0}")]
    Decode(#[source] BackendError),

    #[error("could not convert input samples: {0}")]
    Conversion(#[source] ConvertError),

    #[error("output buffer too small ({capacity} < {needed} bytes)")]
    BufferTooSmall { needed: usize, capacity: usize },

    #[error("seek to sample {sample} failed: {source}")]
    Seek {
        sample: u64,
        #[source]
        source: BackendError,
    },

    #[error("invalid session options: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConvertError> for Error {
    fn from(err: ConvertError) -> Self {
        match err {
            ConvertError::OutputTooSmall { needed, capacity } => {
                Error::BufferTooSmall { needed, capacity }
            }
            other => Error::Conversion(other),
        }
    }
}

impl From<CodecError> for Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::NotFound(codec) => Error::CodecNotFound(codec),
            CodecError::Open(source) => Error::CodecOpen(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
