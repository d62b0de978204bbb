//! Configuration for decode sessions

mod options;

pub use options::{FrameSizePolicy, SessionOptions, SessionOptionsBuilder};
