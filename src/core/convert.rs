// src/core/convert.rs
//
// Sample format conversion from decoded planar frames into the caller's
// interleaved output buffer. Uses symphonia's sample conversions so integer
// and float sources scale the same way the decoders themselves do.

use symphonia::core::conv::IntoSample;

use super::format::{ChannelLayout, NativeFormat, SampleFormat};
use super::frame::{DecodedFrame, FramePlanes};
use crate::error::ConvertError;

/// Input and output side of a conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterSpec {
    pub in_layout: ChannelLayout,
    pub out_layout: ChannelLayout,
    pub in_rate: u32,
    pub out_rate: u32,
    /// Native format the codec announced, if any. Frames carry their own
    /// format, so this is informational.
    pub in_format: Option<NativeFormat>,
    pub out_format: SampleFormat,
}

/// Converts frames to the session's interleaved target format.
///
/// Channel layout and sample rate pass through unchanged; only the sample
/// encoding and the planar-to-interleaved layout change.
#[derive(Debug)]
pub struct Resampler {
    spec: ConverterSpec,
    channels: usize,
}

impl Resampler {
    pub fn new(spec: ConverterSpec) -> Result<Self, ConvertError> {
        if spec.in_rate == 0 || spec.in_rate != spec.out_rate {
            return Err(ConvertError::InvalidSpec(format!(
                "sample rate conversion {} -> {} is not supported",
                spec.in_rate, spec.out_rate
            )));
        }
        let channels = spec.in_layout.count();
        if channels == 0 || channels != spec.out_layout.count() {
            return Err(ConvertError::InvalidSpec(format!(
                "channel layout {:#x} -> {:#x}",
                spec.in_layout.0, spec.out_layout.0
            )));
        }
        Ok(Self { spec, channels })
    }

    pub fn spec(&self) -> &ConverterSpec {
        &self.spec
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Bytes `frame` occupies once converted.
    pub fn required_bytes(&self, frame: &DecodedFrame) -> usize {
        frame.frames() * self.channels * self.spec.out_format.bytes_per_sample()
    }

    /// Convert `frame` into `out`, returning the number of samples per
    /// channel written.
    pub fn convert(&mut self, frame: &DecodedFrame, out: &mut [u8]) -> Result<usize, ConvertError> {
        let planes = match frame.planes() {
            Some(planes) => planes,
            None => return Ok(0),
        };
        if planes.channels() != self.channels {
            return Err(ConvertError::ChannelMismatch {
                expected: self.channels,
                actual: planes.channels(),
            });
        }

        let needed = self.required_bytes(frame);
        if out.len() < needed {
            return Err(ConvertError::OutputTooSmall {
                needed,
                capacity: out.len(),
            });
        }

        let frames = frame.frames();
        let out = &mut out[..needed];
        match self.spec.out_format {
            SampleFormat::S16 => match planes {
                FramePlanes::U8(p) => interleave(p, frames, out, i16::to_ne_bytes),
                FramePlanes::S16(p) => interleave(p, frames, out, i16::to_ne_bytes),
                FramePlanes::S32(p) => interleave(p, frames, out, i16::to_ne_bytes),
                FramePlanes::F32(p) => interleave(p, frames, out, i16::to_ne_bytes),
                FramePlanes::F64(p) => interleave(p, frames, out, i16::to_ne_bytes),
            },
            SampleFormat::F32 => match planes {
                FramePlanes::U8(p) => interleave(p, frames, out, f32::to_ne_bytes),
                FramePlanes::S16(p) => interleave(p, frames, out, f32::to_ne_bytes),
                FramePlanes::S32(p) => interleave(p, frames, out, f32::to_ne_bytes),
                FramePlanes::F32(p) => interleave(p, frames, out, f32::to_ne_bytes),
                FramePlanes::F64(p) => interleave(p, frames, out, f32::to_ne_bytes),
            },
        }

        Ok(frames)
    }
}

fn interleave<S, T, const N: usize>(
    planes: &[Vec<S>],
    frames: usize,
    out: &mut [u8],
    to_bytes: fn(T) -> [u8; N],
) where
    S: Copy + IntoSample<T>,
{
    let mut slots = out.chunks_exact_mut(N);
    for i in 0..frames {
        for plane in planes {
            if let Some(slot) = slots.next() {
                slot.copy_from_slice(&to_bytes(plane[i].into_sample()));
            }
        }
    }
}
