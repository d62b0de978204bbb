// src/core/backend/symphonia.rs
//
// Container and codec collaborators backed by Symphonia.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{
    CodecParameters, CodecType, Decoder, DecoderOptions, CODEC_TYPE_AAC, CODEC_TYPE_MP1,
    CODEC_TYPE_MP2, CODEC_TYPE_MP3, CODEC_TYPE_NULL, CODEC_TYPE_VORBIS,
};
use symphonia::core::conv::IntoSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet as SymphoniaPacket, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::{Sample, SampleFormat as SymphoniaSampleFormat};

use super::{
    CodecInfo, Container, DecodeInput, DecodeStep, FrameDecoder, MediaBackend, MediaKind, Packet,
    StreamInfo,
};
use crate::config::SessionOptions;
use crate::core::format::{ChannelLayout, NativeFormat};
use crate::core::frame::{DecodedFrame, FramePlanes};
use crate::core::timebase::TimeBase;
use crate::error::{BackendError, CodecError};

impl From<SymphoniaError> for BackendError {
    fn from(err: SymphoniaError) -> Self {
        match err {
            SymphoniaError::IoError(e) => BackendError::Io(e),
            SymphoniaError::DecodeError(msg) => BackendError::Malformed(msg.to_string()),
            SymphoniaError::SeekError(kind) => BackendError::Seek(format!("{:?}", kind)),
            SymphoniaError::Unsupported(what) => BackendError::Unsupported(what.to_string()),
            SymphoniaError::LimitError(msg) => BackendError::Other(msg.to_string()),
            SymphoniaError::ResetRequired => {
                BackendError::Other("decoder reset required".to_string())
            }
        }
    }
}

/// Opens files through Symphonia's default probe and codec registry.
#[derive(Debug, Clone, Default)]
pub struct SymphoniaBackend {
    format_hint: Option<String>,
    enable_gapless: bool,
    verify: bool,
}

impl SymphoniaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &SessionOptions) -> Self {
        Self {
            format_hint: options.format_hint.clone(),
            enable_gapless: options.enable_gapless,
            verify: options.verify_checksums,
        }
    }
}

impl MediaBackend for SymphoniaBackend {
    type Container = SymphoniaContainer;
    type Decoder = SymphoniaFrameDecoder;

    fn open_container(&self, path: &Path) -> Result<SymphoniaContainer, BackendError> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        let ext = self
            .format_hint
            .as_deref()
            .or_else(|| path.extension().and_then(|e| e.to_str()));
        if let Some(ext) = ext {
            hint.with_extension(ext);
        }

        let fmt_opts = FormatOptions {
            enable_gapless: self.enable_gapless,
            ..Default::default()
        };
        let meta_opts = MetadataOptions::default();

        let probed = symphonia::default::get_probe().format(&hint, mss, &fmt_opts, &meta_opts)?;

        Ok(SymphoniaContainer {
            reader: probed.format,
        })
    }

    fn open_decoder(
        &self,
        container: &SymphoniaContainer,
        stream: &StreamInfo,
    ) -> Result<SymphoniaFrameDecoder, CodecError> {
        let params = container
            .codec_params(stream.index)
            .ok_or_else(|| CodecError::NotFound(stream.codec.codec.clone()))?;

        let registry = symphonia::default::get_codecs();
        if params.codec == CODEC_TYPE_NULL || registry.get_codec(params.codec).is_none() {
            return Err(CodecError::NotFound(stream.codec.codec.clone()));
        }

        let dec_opts = DecoderOptions {
            verify: self.verify,
        };
        let decoder = registry
            .make(params, &dec_opts)
            .map_err(|e| CodecError::Open(e.into()))?;

        Ok(SymphoniaFrameDecoder {
            decoder,
            track_id: stream.index,
        })
    }
}

pub struct SymphoniaContainer {
    reader: Box<dyn FormatReader>,
}

impl SymphoniaContainer {
    fn codec_params(&self, track_id: u32) -> Option<&CodecParameters> {
        self.reader
            .tracks()
            .iter()
            .find(|t| t.id == track_id)
            .map(|t| &t.codec_params)
    }
}

impl Container for SymphoniaContainer {
    fn streams(&mut self) -> Result<Vec<StreamInfo>, BackendError> {
        let default_id = self.reader.default_track().map(|t| t.id);
        let streams: Vec<StreamInfo> = self
            .reader
            .tracks()
            .iter()
            .map(|track| {
                let params = &track.codec_params;
                StreamInfo {
                    index: track.id,
                    kind: track_kind(params),
                    time_base: params
                        .time_base
                        .and_then(|tb| TimeBase::new(tb.numer, tb.denom)),
                    duration: params.n_frames,
                    start_time: Some(params.start_ts as i64),
                    is_default: default_id == Some(track.id),
                    codec: codec_info(params),
                }
            })
            .collect();

        if streams.is_empty() {
            return Err(BackendError::Malformed("container has no tracks".to_string()));
        }
        Ok(streams)
    }

    fn read_packet(&mut self) -> Result<Option<Packet>, BackendError> {
        match self.reader.next_packet() {
            Ok(packet) => Ok(Some(Packet {
                stream_index: packet.track_id(),
                pts: Some(packet.ts() as i64),
                duration: Some(packet.dur()),
                pos: None,
                trim_start: packet.trim_start,
                trim_end: packet.trim_end,
                data: packet.buf().to_vec(),
            })),
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn seek(&mut self, stream: u32, ts: i64) -> Result<Option<i64>, BackendError> {
        // Accurate mode always lands at or before the requested timestamp
        let seeked = self.reader.seek(
            SeekMode::Accurate,
            SeekTo::TimeStamp {
                ts: ts.max(0) as u64,
                track_id: stream,
            },
        )?;
        Ok(Some(seeked.actual_ts as i64))
    }
}

pub struct SymphoniaFrameDecoder {
    decoder: Box<dyn Decoder>,
    track_id: u32,
}

impl FrameDecoder for SymphoniaFrameDecoder {
    fn decode(
        &mut self,
        input: DecodeInput<'_>,
        frame: &mut DecodedFrame,
    ) -> Result<DecodeStep, BackendError> {
        let (data, pts, duration, trim_start, trim_end) = match input {
            DecodeInput::Packet {
                data,
                pts,
                duration,
                trim_start,
                trim_end,
            } => (data, pts, duration, trim_start, trim_end),
            // Symphonia decoders emit one buffer per packet and hold nothing back
            DecodeInput::Drain => return Ok(DecodeStep::default()),
        };

        // gapless trimming is applied by the decoder itself
        let packet = SymphoniaPacket::new_trimmed_from_slice(
            self.track_id,
            pts.unwrap_or(0).max(0) as u64,
            duration.unwrap_or(0),
            trim_start,
            trim_end,
            data,
        );

        let decoded = self.decoder.decode(&packet)?;
        frame.set(copy_frame(&decoded));

        Ok(DecodeStep {
            consumed: data.len(),
            got_frame: !frame.is_empty(),
        })
    }

    fn flush(&mut self) {
        self.decoder.reset();
    }
}

fn codec_info(params: &CodecParameters) -> CodecInfo {
    let registry = symphonia::default::get_codecs();
    let descriptor = registry.get_codec(params.codec);
    let codec = descriptor
        .map(|d| d.short_name.to_string())
        .unwrap_or_else(|| format!("{:?}", params.codec));

    let channels = params
        .channels
        .or_else(|| params.channel_layout.map(|l| l.into_channels()));

    CodecInfo {
        codec,
        decodable: params.codec != CODEC_TYPE_NULL && descriptor.is_some(),
        sample_rate: params.sample_rate.unwrap_or(0),
        channels: channels.map_or(0, |c| c.count()),
        channel_layout: channels.map(|c| ChannelLayout(c.bits())),
        bits_per_raw_sample: params.bits_per_sample,
        sample_format: params
            .sample_format
            .map(native_format)
            .or_else(|| decoded_format(params.codec)),
        max_frames_per_packet: params.max_frames_per_packet,
        delay: params.delay,
        bit_rate: None,
    }
}

/// Symphonia only demuxes audio; a track without a codec is something else.
fn track_kind(params: &CodecParameters) -> MediaKind {
    if params.codec == CODEC_TYPE_NULL {
        MediaKind::Other
    } else {
        MediaKind::Audio
    }
}

/// Sample format of the buffers a codec's decoder produces, for codecs whose
/// parameters carry no sample format.
fn decoded_format(codec: CodecType) -> Option<NativeFormat> {
    match codec {
        CODEC_TYPE_MP1 | CODEC_TYPE_MP2 | CODEC_TYPE_MP3 | CODEC_TYPE_AAC | CODEC_TYPE_VORBIS => {
            Some(NativeFormat::F32)
        }
        _ => None,
    }
}

fn native_format(format: SymphoniaSampleFormat) -> NativeFormat {
    match format {
        SymphoniaSampleFormat::U8 | SymphoniaSampleFormat::S8 => NativeFormat::U8,
        SymphoniaSampleFormat::U16 | SymphoniaSampleFormat::S16 => NativeFormat::S16,
        SymphoniaSampleFormat::U24 | SymphoniaSampleFormat::S24 => NativeFormat::S24,
        SymphoniaSampleFormat::U32 | SymphoniaSampleFormat::S32 => NativeFormat::S32,
        SymphoniaSampleFormat::F32 => NativeFormat::F32,
        SymphoniaSampleFormat::F64 => NativeFormat::F64,
    }
}

/// Copy a decoded buffer into owned planes, widening to the nearest
/// storage type.
fn copy_frame(decoded: &AudioBufferRef<'_>) -> FramePlanes {
    match decoded {
        AudioBufferRef::U8(buf) => FramePlanes::U8(copy_planes(&**buf)),
        AudioBufferRef::S8(buf) => FramePlanes::U8(copy_planes(&**buf)),
        AudioBufferRef::U16(buf) => FramePlanes::S16(copy_planes(&**buf)),
        AudioBufferRef::S16(buf) => FramePlanes::S16(copy_planes(&**buf)),
        AudioBufferRef::U24(buf) => FramePlanes::S32(copy_planes(&**buf)),
        AudioBufferRef::S24(buf) => FramePlanes::S32(copy_planes(&**buf)),
        AudioBufferRef::U32(buf) => FramePlanes::S32(copy_planes(&**buf)),
        AudioBufferRef::S32(buf) => FramePlanes::S32(copy_planes(&**buf)),
        AudioBufferRef::F32(buf) => FramePlanes::F32(copy_planes(&**buf)),
        AudioBufferRef::F64(buf) => FramePlanes::F64(copy_planes(&**buf)),
    }
}

fn copy_planes<S, T>(buf: &AudioBuffer<S>) -> Vec<Vec<T>>
where
    S: Sample + IntoSample<T>,
{
    (0..buf.spec().channels.count())
        .map(|ch| buf.chan(ch).iter().map(|&s| s.into_sample()).collect())
        .collect()
}
