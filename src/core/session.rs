// src/core/session.rs
//
// Decode session over the best audio stream of one container. The caller
// owns the session and drives it frame by frame: read, optionally seek,
// read again, close.

use std::path::Path;

use log::{debug, info, warn};
use serde::Serialize;

use super::backend::{
    select_best_stream, Container, FrameDecoder, MediaBackend, StreamInfo, SymphoniaBackend,
    SymphoniaContainer, SymphoniaFrameDecoder,
};
use super::convert::{ConverterSpec, Resampler};
use super::format::{determine_target_format, ChannelLayout, NativeFormat, OutputConfig};
use super::pump::{FramePump, PumpState, SessionStats};
use super::timebase::{SampleClock, TimeBase};
use crate::config::{FrameSizePolicy, SessionOptions};
use crate::error::{BackendError, ConvertError, Error, Result};

/// Session over a file opened through Symphonia.
pub type SymphoniaStream = StreamDecoder<SymphoniaContainer, SymphoniaFrameDecoder>;

/// Conditions noticed while opening that do not prevent decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OpenWarning {
    /// The codec buffers frames internally before producing output
    DecoderDelay { frames: u32 },
    /// No usable bit depth was found; output falls back to 32-bit float
    FallbackFormat { raw_bits: Option<u32>, derived_bits: u32 },
    /// The stream has no channel layout; the default for its count is used
    DefaultChannelLayout { channels: usize },
}

/// Position of a decoded frame in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Timestamp {
    /// Sample index of the first sample in the frame
    Samples(i64),
    /// No timing available; byte offset of the packet in the container
    ByteOffset(u64),
    Unknown,
}

impl Timestamp {
    pub fn samples(&self) -> Option<i64> {
        match self {
            Timestamp::Samples(s) => Some(*s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Samples(s) => write!(f, "{}", s),
            Timestamp::ByteOffset(pos) => write!(f, "byte {}", pos),
            Timestamp::Unknown => write!(f, "?"),
        }
    }
}

/// One audio frame delivered to the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRead {
    pub timestamp: Timestamp,
    /// Samples per channel written to the buffer
    pub samples: usize,
}

/// Result of a single decode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnyFrame {
    /// Samples per channel written to the buffer
    pub samples: usize,
    /// Whether the step produced an audio frame at all
    pub audio: bool,
}

/// Decodes one audio stream into interleaved samples of a fixed format.
///
/// A session is not shareable between threads; every call takes `&mut self`.
/// Independent sessions share nothing and can run in parallel.
pub struct StreamDecoder<C, D> {
    converter: Resampler,
    pump: FramePump<C, D>,
    stream: StreamInfo,
    streams: Vec<StreamInfo>,
    clock: SampleClock,
    output: OutputConfig,
    warnings: Vec<OpenWarning>,
    // a decoded frame that could not be delivered yet (buffer too small)
    undelivered: bool,
}

impl StreamDecoder<SymphoniaContainer, SymphoniaFrameDecoder> {
    /// Open `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, &SessionOptions::default())
    }

    pub fn open_with_options(path: impl AsRef<Path>, options: &SessionOptions) -> Result<Self> {
        options.validate()?;
        Self::open_with(&SymphoniaBackend::from_options(options), path, options)
    }
}

impl<C: Container, D: FrameDecoder> StreamDecoder<C, D> {
    /// Open `path` through `backend`.
    pub fn open_with<B>(backend: &B, path: impl AsRef<Path>, options: &SessionOptions) -> Result<Self>
    where
        B: MediaBackend<Container = C, Decoder = D>,
    {
        let path = path.as_ref();

        let mut container = backend
            .open_container(path)
            .map_err(|source| Error::ContainerOpen {
                path: path.to_path_buf(),
                source,
            })?;

        let streams = container.streams().map_err(Error::StreamInfo)?;
        if streams.is_empty() {
            return Err(Error::StreamInfo(BackendError::Malformed(
                "no streams found".to_string(),
            )));
        }

        let stream = select_best_stream(&streams)
            .cloned()
            .ok_or(Error::NoAudioStream)?;
        let decoder = backend.open_decoder(&container, &stream)?;

        let codec = &stream.codec;
        if codec.sample_rate == 0 || codec.channels == 0 {
            return Err(Error::CodecOpen(BackendError::Unsupported(format!(
                "stream {} does not specify sample rate and channel count",
                stream.index
            ))));
        }

        info!(
            "opened {}: stream {} ({}, {} Hz, {} ch)",
            path.display(),
            stream.index,
            codec.codec,
            codec.sample_rate,
            codec.channels
        );

        let mut warnings = Vec::new();
        if let Some(frames) = codec.delay.filter(|&d| d > 0) {
            warn!("codec {} introduces a decode delay of {} frames", codec.codec, frames);
            warnings.push(OpenWarning::DecoderDelay { frames });
        }

        let sample_rate = codec.sample_rate;
        let time_base = stream.time_base.unwrap_or(TimeBase {
            num: 1,
            den: sample_rate,
        });
        let clock = SampleClock::new(time_base, sample_rate);

        let mut pump = FramePump::new(container, decoder, stream.index);

        let mut native_format = codec.sample_format;
        let mut frame_size = sample_rate as usize;
        if options.frame_size == FrameSizePolicy::Probe {
            match probe_first_frame(&mut pump) {
                Some((frames, format)) => {
                    let declared = codec.max_frames_per_packet.unwrap_or(0) as usize;
                    frame_size = frames.max(declared);
                    native_format = native_format.or(format);
                }
                None => warn!("no frame to probe, using a one second frame size"),
            }
            pump.seek(0)
                .map_err(|source| Error::Seek { sample: 0, source })?;
            pump.reset_stats();
        }

        let derived_bits = native_format.map_or(0, |f| f.bits());
        let (sample_format, fallback) =
            determine_target_format(codec.bits_per_raw_sample, derived_bits);
        if fallback {
            warnings.push(OpenWarning::FallbackFormat {
                raw_bits: codec.bits_per_raw_sample,
                derived_bits,
            });
        }

        let layout = match codec.channel_layout {
            Some(layout) if layout.count() == codec.channels => layout,
            _ => {
                debug!("no channel layout recorded, using default for {} channels", codec.channels);
                warnings.push(OpenWarning::DefaultChannelLayout {
                    channels: codec.channels,
                });
                ChannelLayout::default_for(codec.channels)
            }
        };

        let converter = Resampler::new(ConverterSpec {
            in_layout: layout,
            out_layout: layout,
            in_rate: sample_rate,
            out_rate: sample_rate,
            in_format: native_format,
            out_format: sample_format,
        })
        .map_err(Error::Conversion)?;

        let total_length = stream
            .duration
            .map(|d| clock.samples_from_timebase(i64::try_from(d).unwrap_or(i64::MAX)).max(0) as u64);

        let output = OutputConfig {
            sample_rate,
            sample_size: sample_format.bytes_per_sample(),
            channels: codec.channels,
            total_length,
            frame_size,
            sample_format,
        };

        debug!(
            "output: {} Hz, {} bytes/sample, {} ch, length {:?}, frame size {}",
            output.sample_rate,
            output.sample_size,
            output.channels,
            output.total_length,
            output.frame_size
        );

        Ok(Self {
            converter,
            pump,
            stream,
            streams,
            clock,
            output,
            warnings,
            undelivered: false,
        })
    }

    pub fn output_config(&self) -> &OutputConfig {
        &self.output
    }

    /// The stream being decoded.
    pub fn stream(&self) -> &StreamInfo {
        &self.stream
    }

    /// Every stream in the container.
    pub fn streams(&self) -> &[StreamInfo] {
        &self.streams
    }

    pub fn warnings(&self) -> &[OpenWarning] {
        &self.warnings
    }

    pub fn stats(&self) -> SessionStats {
        self.pump.stats()
    }

    pub fn clock(&self) -> SampleClock {
        self.clock
    }

    /// True once the stream has been read to its end (until the next seek).
    pub fn is_exhausted(&self) -> bool {
        self.pump.state() == PumpState::Exhausted
    }

    /// Run one decode step, converting any produced frame into `out`.
    ///
    /// Returns `Ok(None)` at end of stream. `out` must hold
    /// `samples * channels * sample_size` bytes for the produced frame;
    /// otherwise [`Error::BufferTooSmall`] is returned and the frame is
    /// kept for the next call.
    pub fn read_any_frame(&mut self, out: &mut [u8]) -> Result<Option<AnyFrame>> {
        if !self.undelivered {
            match self.pump.step()? {
                None => return Ok(None),
                Some(false) => {
                    return Ok(Some(AnyFrame {
                        samples: 0,
                        audio: false,
                    }))
                }
                Some(true) => self.undelivered = true,
            }
        }

        match self.converter.convert(self.pump.frame(), out) {
            Ok(samples) => {
                self.undelivered = false;
                Ok(Some(AnyFrame {
                    samples,
                    audio: true,
                }))
            }
            Err(e @ ConvertError::OutputTooSmall { .. }) => Err(e.into()),
            Err(e) => {
                self.undelivered = false;
                self.pump.release_packet();
                Err(Error::Conversion(e))
            }
        }
    }

    /// Read the next non-empty audio frame into `out`.
    ///
    /// Returns `Ok(None)` at end of stream, and keeps doing so until the
    /// next seek.
    pub fn read_frame(&mut self, out: &mut [u8]) -> Result<Option<FrameRead>> {
        loop {
            match self.read_any_frame(out)? {
                None => return Ok(None),
                Some(AnyFrame {
                    audio: true,
                    samples,
                }) if samples > 0 => {
                    return Ok(Some(FrameRead {
                        timestamp: self.frame_timestamp(),
                        samples,
                    }))
                }
                Some(_) => continue,
            }
        }
    }

    fn frame_timestamp(&self) -> Timestamp {
        match (self.pump.last_frame_pts(), self.pump.last_frame_pos()) {
            (Some(pts), _) => Timestamp::Samples(self.clock.samples_from_timebase(pts)),
            (None, Some(pos)) => Timestamp::ByteOffset(pos),
            (None, None) => Timestamp::Unknown,
        }
    }

    /// Seek to `sample` (samples per channel from the stream start).
    ///
    /// Lands on the frame boundary at or before `sample`; the following
    /// reads return the same samples a linear read would have produced from
    /// that boundary on.
    pub fn seek(&mut self, sample: u64) -> Result<()> {
        let ts = self
            .clock
            .timebase_from_samples(i64::try_from(sample).unwrap_or(i64::MAX));
        debug!("seek to sample {} (ts {})", sample, ts);

        let landed = self
            .pump
            .seek(ts)
            .map_err(|source| Error::Seek { sample, source })?;
        self.undelivered = false;

        if let Some(landed) = landed {
            debug!(
                "seek landed at ts {} (sample {})",
                landed,
                self.clock.samples_from_timebase(landed)
            );
        }
        Ok(())
    }

    /// Release the session: pending packet, scratch frame, converter,
    /// decoder, container, in that order. Dropping the session does the same.
    pub fn close(self) {
        drop(self);
    }
}

impl<C, D> Drop for StreamDecoder<C, D> {
    fn drop(&mut self) {
        // the remaining fields drop in declaration order: converter, then the
        // pump's decoder and container
        self.pump.release_packet();
        self.pump.release_frame();

        let stats = self.pump.stats();
        info!(
            "closed stream {} after {} packets, {} frames",
            self.stream.index, stats.packets_read, stats.frames_decoded
        );
    }
}

/// Decode up to the first audio frame, returning its size and format.
fn probe_first_frame<C: Container, D: FrameDecoder>(
    pump: &mut FramePump<C, D>,
) -> Option<(usize, Option<NativeFormat>)> {
    loop {
        match pump.step() {
            Ok(Some(true)) if !pump.frame().is_empty() => {
                let frame = pump.frame();
                return Some((frame.frames(), frame.native_format()));
            }
            Ok(Some(_)) => continue,
            Ok(None) => return None,
            Err(e) => {
                warn!("frame size probe failed: {}", e);
                return None;
            }
        }
    }
}
