//! Collaborator interfaces for container demuxing and codec decoding.
//!
//! A session only talks to these traits. [`SymphoniaBackend`] is the
//! implementation used for real files; tests drive the session with
//! scripted implementations.

mod symphonia;

pub use self::symphonia::{SymphoniaBackend, SymphoniaContainer, SymphoniaFrameDecoder};

use std::path::Path;

use serde::Serialize;

use super::format::{ChannelLayout, NativeFormat};
use super::frame::DecodedFrame;
use super::timebase::TimeBase;
use crate::error::{BackendError, CodecError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
    Other,
}

/// Codec properties of a stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodecInfo {
    /// Short codec name
    pub codec: String,
    /// Whether the backend has a decoder for this codec
    pub decodable: bool,
    pub sample_rate: u32,
    pub channels: usize,
    /// Speaker layout, if the container records one
    pub channel_layout: Option<ChannelLayout>,
    /// Bit depth of the coded samples
    pub bits_per_raw_sample: Option<u32>,
    /// In-memory format of decoded frames
    pub sample_format: Option<NativeFormat>,
    pub max_frames_per_packet: Option<u64>,
    /// Frames the codec holds back before producing output
    pub delay: Option<u32>,
    pub bit_rate: Option<u64>,
}

impl CodecInfo {
    /// Width of the in-memory sample format, 0 if unknown.
    pub fn derived_bits(&self) -> u32 {
        self.sample_format.map_or(0, |f| f.bits())
    }
}

/// A stream inside a container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamInfo {
    pub index: u32,
    pub kind: MediaKind,
    pub time_base: Option<TimeBase>,
    /// Duration in time-base units
    pub duration: Option<u64>,
    pub start_time: Option<i64>,
    pub is_default: bool,
    pub codec: CodecInfo,
}

/// A compressed packet as extracted from the container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    pub stream_index: u32,
    /// Presentation timestamp in time-base units
    pub pts: Option<i64>,
    /// Duration in time-base units
    pub duration: Option<u64>,
    /// Byte offset of the packet in the container
    pub pos: Option<u64>,
    /// Decoded frames to discard from the start of the packet (encoder delay)
    pub trim_start: u32,
    /// Decoded frames to discard from the end of the packet (padding)
    pub trim_end: u32,
    pub data: Vec<u8>,
}

/// What a decode step operates on.
#[derive(Debug, Clone, Copy)]
pub enum DecodeInput<'a> {
    /// Remaining bytes of the pending packet
    Packet {
        data: &'a [u8],
        pts: Option<i64>,
        duration: Option<u64>,
        /// Frames to trim from the start; zero once part of the packet was decoded
        trim_start: u32,
        trim_end: u32,
    },
    /// End of input: emit frames still buffered inside the decoder
    Drain,
}

/// Outcome of one decode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeStep {
    /// Bytes of the input consumed; may be less than offered
    pub consumed: usize,
    /// Whether a frame was written to the scratch frame
    pub got_frame: bool,
}

pub trait Container: Send {
    /// Stream metadata, probing the input if necessary.
    fn streams(&mut self) -> Result<Vec<StreamInfo>, BackendError>;

    /// Next packet of any stream; `Ok(None)` at end of input.
    fn read_packet(&mut self) -> Result<Option<Packet>, BackendError>;

    /// Seek `stream` to the last position at or before `ts` (time-base
    /// units). Returns the timestamp landed on, if the container reports it.
    fn seek(&mut self, stream: u32, ts: i64) -> Result<Option<i64>, BackendError>;
}

pub trait FrameDecoder: Send {
    /// Decode one step into `frame`.
    fn decode(
        &mut self,
        input: DecodeInput<'_>,
        frame: &mut DecodedFrame,
    ) -> Result<DecodeStep, BackendError>;

    /// Discard all internal state, including buffered frames.
    fn flush(&mut self);
}

/// Opens containers and the decoders for their streams.
pub trait MediaBackend {
    type Container: Container;
    type Decoder: FrameDecoder;

    fn open_container(&self, path: &Path) -> Result<Self::Container, BackendError>;

    fn open_decoder(
        &self,
        container: &Self::Container,
        stream: &StreamInfo,
    ) -> Result<Self::Decoder, CodecError>;
}

/// Pick the stream to decode: decodable audio only, default-flagged
/// streams first, then bit rate, then raw PCM bandwidth.
pub fn select_best_stream(streams: &[StreamInfo]) -> Option<&StreamInfo> {
    streams
        .iter()
        .filter(|s| s.kind == MediaKind::Audio && s.codec.decodable)
        .max_by_key(|s| {
            let bits = s
                .codec
                .bits_per_raw_sample
                .unwrap_or_else(|| s.codec.derived_bits()) as u64;
            let bandwidth = s.codec.sample_rate as u64 * s.codec.channels as u64 * bits;
            // max_by_key keeps the last maximum; prefer lower indices on ties
            (
                s.is_default,
                s.codec.bit_rate.unwrap_or(0),
                bandwidth,
                std::cmp::Reverse(s.index),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(index: u32, kind: MediaKind, decodable: bool, rate: u32) -> StreamInfo {
        StreamInfo {
            index,
            kind,
            time_base: TimeBase::new(1, rate),
            duration: None,
            start_time: None,
            is_default: false,
            codec: CodecInfo {
                codec: "pcm".to_string(),
                decodable,
                sample_rate: rate,
                channels: 2,
                channel_layout: None,
                bits_per_raw_sample: Some(16),
                sample_format: None,
                max_frames_per_packet: None,
                delay: None,
                bit_rate: None,
            },
        }
    }

    #[test]
    fn test_select_skips_non_audio_and_undecodable() {
        let streams = vec![
            stream(0, MediaKind::Video, true, 90000),
            stream(1, MediaKind::Audio, false, 96000),
            stream(2, MediaKind::Audio, true, 44100),
        ];
        assert_eq!(select_best_stream(&streams).map(|s| s.index), Some(2));
    }

    #[test]
    fn test_select_prefers_default_then_quality() {
        let mut streams = vec![
            stream(0, MediaKind::Audio, true, 22050),
            stream(1, MediaKind::Audio, true, 48000),
            stream(2, MediaKind::Audio, true, 48000),
        ];
        assert_eq!(select_best_stream(&streams).map(|s| s.index), Some(1));

        streams[0].is_default = true;
        assert_eq!(select_best_stream(&streams).map(|s| s.index), Some(0));
    }

    #[test]
    fn test_select_none() {
        let streams = vec![stream(0, MediaKind::Video, true, 90000)];
        assert!(select_best_stream(&streams).is_none());
        assert!(select_best_stream(&[]).is_none());
    }
}
