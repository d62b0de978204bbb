// src/core/frame.rs
//
// Decoded audio in the codec's native sample type, one plane per channel.

use super::format::NativeFormat;

/// Planar sample storage. 24-bit sources are widened into `S32`.
#[derive(Debug, Clone, PartialEq)]
pub enum FramePlanes {
    U8(Vec<Vec<u8>>),
    S16(Vec<Vec<i16>>),
    S32(Vec<Vec<i32>>),
    F32(Vec<Vec<f32>>),
    F64(Vec<Vec<f64>>),
}

impl FramePlanes {
    pub fn channels(&self) -> usize {
        match self {
            FramePlanes::U8(p) => p.len(),
            FramePlanes::S16(p) => p.len(),
            FramePlanes::S32(p) => p.len(),
            FramePlanes::F32(p) => p.len(),
            FramePlanes::F64(p) => p.len(),
        }
    }

    /// Length of the shortest plane.
    fn frames(&self) -> usize {
        fn shortest<T>(planes: &[Vec<T>]) -> usize {
            planes.iter().map(Vec::len).min().unwrap_or(0)
        }
        match self {
            FramePlanes::U8(p) => shortest(p),
            FramePlanes::S16(p) => shortest(p),
            FramePlanes::S32(p) => shortest(p),
            FramePlanes::F32(p) => shortest(p),
            FramePlanes::F64(p) => shortest(p),
        }
    }

    pub fn native_format(&self) -> NativeFormat {
        match self {
            FramePlanes::U8(_) => NativeFormat::U8,
            FramePlanes::S16(_) => NativeFormat::S16,
            FramePlanes::S32(_) => NativeFormat::S32,
            FramePlanes::F32(_) => NativeFormat::F32,
            FramePlanes::F64(_) => NativeFormat::F64,
        }
    }
}

/// Scratch frame a decoder writes into. Reused across decode steps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedFrame {
    planes: Option<FramePlanes>,
    frames: usize,
}

impl DecodedFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the frame contents. Planes are truncated to a common length.
    pub fn set(&mut self, planes: FramePlanes) {
        self.frames = planes.frames();
        self.planes = Some(planes);
    }

    pub fn clear(&mut self) {
        self.planes = None;
        self.frames = 0;
    }

    pub fn planes(&self) -> Option<&FramePlanes> {
        self.planes.as_ref()
    }

    /// Samples per channel.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channels(&self) -> usize {
        self.planes.as_ref().map_or(0, FramePlanes::channels)
    }

    pub fn native_format(&self) -> Option<NativeFormat> {
        self.planes.as_ref().map(FramePlanes::native_format)
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_uses_shortest_plane() {
        let mut frame = DecodedFrame::new();
        frame.set(FramePlanes::S16(vec![vec![1, 2, 3], vec![4, 5]]));
        assert_eq!(frame.frames(), 2);
        assert_eq!(frame.channels(), 2);
        assert_eq!(frame.native_format(), Some(NativeFormat::S16));

        frame.clear();
        assert!(frame.is_empty());
        assert_eq!(frame.channels(), 0);
        assert_eq!(frame.native_format(), None);
    }
}
