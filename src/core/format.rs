// src/core/format.rs
//
// Sample formats, channel layouts and the output format negotiation.

use serde::{Deserialize, Serialize};

/// Interleaved sample encoding produced by a session.
///
/// Every source, whatever its native width or layout, is normalized to one
/// of these two encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// 16-bit signed integer, interleaved
    S16,
    /// 32-bit IEEE float, interleaved
    F32,
}

impl SampleFormat {
    /// Bytes occupied by one sample of one channel.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleFormat::S16 => 2,
            SampleFormat::F32 => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SampleFormat::S16 => "s16",
            SampleFormat::F32 => "flt",
        }
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// In-memory sample format of decoded frames, as reported by a codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeFormat {
    U8,
    S16,
    S24,
    S32,
    F32,
    F64,
}

impl NativeFormat {
    pub fn bits(&self) -> u32 {
        match self {
            NativeFormat::U8 => 8,
            NativeFormat::S16 => 16,
            NativeFormat::S24 => 24,
            NativeFormat::S32 | NativeFormat::F32 => 32,
            NativeFormat::F64 => 64,
        }
    }
}

/// Channel layout as a speaker bitmask (WAVE_FORMAT_EXTENSIBLE bit order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelLayout(pub u32);

impl ChannelLayout {
    pub const FRONT_LEFT: u32 = 0x1;
    pub const FRONT_RIGHT: u32 = 0x2;
    pub const FRONT_CENTRE: u32 = 0x4;
    pub const LFE: u32 = 0x8;
    pub const REAR_LEFT: u32 = 0x10;
    pub const REAR_RIGHT: u32 = 0x20;
    pub const REAR_CENTRE: u32 = 0x100;
    pub const SIDE_LEFT: u32 = 0x200;
    pub const SIDE_RIGHT: u32 = 0x400;

    pub const MONO: ChannelLayout = ChannelLayout(Self::FRONT_CENTRE);
    pub const STEREO: ChannelLayout = ChannelLayout(Self::FRONT_LEFT | Self::FRONT_RIGHT);

    /// Default layout for a bare channel count.
    ///
    /// Common counts map to the conventional speaker sets; anything else
    /// takes the lowest `count` speaker positions.
    pub fn default_for(count: usize) -> Self {
        let stereo = Self::FRONT_LEFT | Self::FRONT_RIGHT;
        let bits = match count {
            0 => 0,
            1 => Self::FRONT_CENTRE,
            2 => stereo,
            3 => stereo | Self::FRONT_CENTRE,
            4 => stereo | Self::FRONT_CENTRE | Self::REAR_CENTRE,
            5 => stereo | Self::FRONT_CENTRE | Self::REAR_LEFT | Self::REAR_RIGHT,
            6 => stereo | Self::FRONT_CENTRE | Self::LFE | Self::REAR_LEFT | Self::REAR_RIGHT,
            7 => {
                stereo
                    | Self::FRONT_CENTRE
                    | Self::LFE
                    | Self::REAR_CENTRE
                    | Self::SIDE_LEFT
                    | Self::SIDE_RIGHT
            }
            8 => {
                stereo
                    | Self::FRONT_CENTRE
                    | Self::LFE
                    | Self::REAR_LEFT
                    | Self::REAR_RIGHT
                    | Self::SIDE_LEFT
                    | Self::SIDE_RIGHT
            }
            n if n >= 32 => u32::MAX,
            n => (1u32 << n) - 1,
        };
        ChannelLayout(bits)
    }

    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }
}

/// Pick the interleaved output format for a codec.
///
/// `raw_bits` is the bit depth the codec declares for its coded samples,
/// `derived_bits` the width of its in-memory sample format (0 if unknown).
/// The declared depth wins when it is decisive. Returns the format and
/// whether the fallback was taken.
pub fn determine_target_format(raw_bits: Option<u32>, derived_bits: u32) -> (SampleFormat, bool) {
    match (raw_bits.unwrap_or(0), derived_bits) {
        (16, _) => (SampleFormat::S16, false),
        (raw, _) if raw > 16 => (SampleFormat::F32, false),
        (_, 16) => (SampleFormat::S16, false),
        (_, derived) if derived > 16 => (SampleFormat::F32, false),
        (raw, derived) => {
            log::warn!(
                "unsupported sample format {}/{}, falling back to {}",
                raw,
                derived,
                SampleFormat::F32
            );
            (SampleFormat::F32, true)
        }
    }
}

/// Output properties of a session, fixed for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Sample rate in Hz (same as the source)
    pub sample_rate: u32,
    /// Bytes per sample of one channel
    pub sample_size: usize,
    /// Number of interleaved channels
    pub channels: usize,
    /// Stream length in samples per channel, if the container knows it
    pub total_length: Option<u64>,
    /// Samples per channel a read buffer should be sized for
    pub frame_size: usize,
    /// Interleaved output encoding
    pub sample_format: SampleFormat,
}

impl OutputConfig {
    /// Bytes needed to hold `samples` samples per channel.
    pub fn bytes_for(&self, samples: usize) -> usize {
        samples * self.channels * self.sample_size
    }

    /// Buffer size in bytes for one nominal frame.
    pub fn frame_buffer_len(&self) -> usize {
        self.bytes_for(self.frame_size)
    }
}
