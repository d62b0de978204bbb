//! Decode session, its collaborators and the sample arithmetic behind it

pub mod backend;
pub mod convert;
pub mod format;
pub mod frame;
pub mod info;
pub mod pump;
pub mod session;
pub mod timebase;
pub mod verify;

pub use backend::{
    select_best_stream, CodecInfo, Container, DecodeInput, DecodeStep, FrameDecoder, MediaBackend,
    MediaKind, Packet, StreamInfo, SymphoniaBackend,
};
pub use convert::{ConverterSpec, Resampler};
pub use format::{determine_target_format, ChannelLayout, NativeFormat, OutputConfig, SampleFormat};
pub use frame::{DecodedFrame, FramePlanes};
pub use info::describe_streams;
pub use pump::{PumpState, SessionStats};
pub use session::{AnyFrame, FrameRead, OpenWarning, StreamDecoder, SymphoniaStream, Timestamp};
pub use timebase::{SampleClock, TimeBase};
pub use verify::{read_pass, verify_rewind, PassSummary, RewindReport};
