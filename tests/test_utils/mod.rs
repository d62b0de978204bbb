// tests/test_utils/mod.rs
//
// Shared fixtures: generated WAV files and a scripted in-memory backend.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use streamdecode::core::{
    ChannelLayout, CodecInfo, Container, DecodeInput, DecodeStep, DecodedFrame, FrameDecoder,
    FramePlanes, MediaBackend, MediaKind, NativeFormat, Packet, StreamInfo, TimeBase,
};
use streamdecode::error::{BackendError, CodecError};

pub fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_streamdecode"))
}

pub fn run_streamdecode<P: AsRef<std::ffi::OsStr>>(file_path: P) -> Command {
    let mut cmd = Command::new(get_binary_path());
    cmd.arg(file_path);
    cmd
}

/// A file in the temp directory, removed on drop.
pub struct TempFile {
    pub path: PathBuf,
}

impl TempFile {
    pub fn new(tag: &str, extension: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "streamdecode_{}_{}.{}",
            tag,
            Uuid::new_v4(),
            extension
        ));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Deterministic test signal: distinct values per channel and position.
pub fn test_sample(frame: usize, channel: usize) -> i16 {
    (((frame * 7 + channel * 3001) % 20000) as i32 - 10000) as i16
}

/// Write a 16-bit WAV and return its interleaved samples.
pub fn write_wav_i16(tag: &str, channels: u16, sample_rate: u32, frames: usize) -> (TempFile, Vec<i16>) {
    let file = TempFile::new(tag, "wav");
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut samples = Vec::with_capacity(frames * channels as usize);
    let mut writer = hound::WavWriter::create(file.path(), spec).expect("create wav");
    for n in 0..frames {
        for ch in 0..channels as usize {
            let s = test_sample(n, ch);
            writer.write_sample(s).expect("write sample");
            samples.push(s);
        }
    }
    writer.finalize().expect("finalize wav");

    (file, samples)
}

/// Write a 24-bit WAV of the same signal scaled up by 256.
pub fn write_wav_i24(tag: &str, channels: u16, sample_rate: u32, frames: usize) -> TempFile {
    let file = TempFile::new(tag, "wav");
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 24,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(file.path(), spec).expect("create wav");
    for n in 0..frames {
        for ch in 0..channels as usize {
            writer
                .write_sample(test_sample(n, ch) as i32 * 256)
                .expect("write sample");
        }
    }
    writer.finalize().expect("finalize wav");
    file
}

/// Write an 8-bit WAV.
pub fn write_wav_i8(tag: &str, channels: u16, sample_rate: u32, frames: usize) -> TempFile {
    let file = TempFile::new(tag, "wav");
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(file.path(), spec).expect("create wav");
    for n in 0..frames {
        for ch in 0..channels as usize {
            writer
                .write_sample((test_sample(n, ch) / 256) as i8)
                .expect("write sample");
        }
    }
    writer.finalize().expect("finalize wav");
    file
}

/// Decode interleaved native-endian s16 bytes.
pub fn s16_from_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|b| i16::from_ne_bytes([b[0], b[1]]))
        .collect()
}

pub fn f32_from_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

// --- scripted backend ---

/// Byte value that makes the mock decoder fail on a chunk.
pub const CORRUPT_BYTE: u8 = 0xFF;

/// Shared record of which collaborators were dropped, in order.
pub type DropLog = Arc<Mutex<Vec<&'static str>>>;

pub fn audio_stream(index: u32, channels: usize, sample_rate: u32) -> StreamInfo {
    StreamInfo {
        index,
        kind: MediaKind::Audio,
        time_base: TimeBase::new(1, sample_rate),
        duration: None,
        start_time: Some(0),
        is_default: false,
        codec: CodecInfo {
            codec: "mock".to_string(),
            decodable: true,
            sample_rate,
            channels,
            channel_layout: Some(ChannelLayout::default_for(channels)),
            bits_per_raw_sample: Some(16),
            sample_format: Some(NativeFormat::S16),
            max_frames_per_packet: None,
            delay: None,
            bit_rate: None,
        },
    }
}

pub fn packet(stream_index: u32, pts: Option<i64>, data: Vec<u8>) -> Packet {
    Packet {
        stream_index,
        pts,
        duration: Some(data.len() as u64),
        pos: None,
        trim_start: 0,
        trim_end: 0,
        data,
    }
}

/// What the mock decoder produces for byte `b` on channel `ch`.
pub fn mock_sample(b: u8, ch: usize) -> i16 {
    b as i16 + ch as i16 * 1000
}

#[derive(Debug, Clone)]
pub struct MockBackend {
    pub streams: Vec<StreamInfo>,
    pub packets: Vec<Packet>,
    /// Most bytes the decoder consumes per call (0 stalls it)
    pub chunk: usize,
    /// Frames the decoder holds back until drained
    pub delay: usize,
    pub fail_open: bool,
    pub fail_seek: bool,
    pub drops: DropLog,
    pub seeks: Arc<Mutex<Vec<(u32, i64)>>>,
}

impl MockBackend {
    pub fn new(streams: Vec<StreamInfo>, packets: Vec<Packet>) -> Self {
        Self {
            streams,
            packets,
            chunk: usize::MAX,
            delay: 0,
            fail_open: false,
            fail_seek: false,
            drops: Arc::new(Mutex::new(Vec::new())),
            seeks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn dropped(&self) -> Vec<&'static str> {
        self.drops.lock().unwrap().clone()
    }
}

pub struct MockContainer {
    streams: Vec<StreamInfo>,
    packets: Vec<Packet>,
    cursor: usize,
    fail_seek: bool,
    drops: DropLog,
    seeks: Arc<Mutex<Vec<(u32, i64)>>>,
}

impl Container for MockContainer {
    fn streams(&mut self) -> Result<Vec<StreamInfo>, BackendError> {
        Ok(self.streams.clone())
    }

    fn read_packet(&mut self) -> Result<Option<Packet>, BackendError> {
        let packet = self.packets.get(self.cursor).cloned();
        if packet.is_some() {
            self.cursor += 1;
        }
        Ok(packet)
    }

    fn seek(&mut self, stream: u32, ts: i64) -> Result<Option<i64>, BackendError> {
        if self.fail_seek {
            return Err(BackendError::Seek("not seekable".to_string()));
        }
        self.seeks.lock().unwrap().push((stream, ts));

        // last packet of the stream starting at or before ts
        let target = self
            .packets
            .iter()
            .enumerate()
            .filter(|(_, p)| p.stream_index == stream && p.pts.is_some_and(|pts| pts <= ts))
            .last()
            .map(|(i, p)| (i, p.pts));

        match target {
            Some((i, pts)) => {
                self.cursor = i;
                Ok(pts)
            }
            None => {
                self.cursor = 0;
                Ok(Some(0))
            }
        }
    }
}

impl Drop for MockContainer {
    fn drop(&mut self) {
        self.drops.lock().unwrap().push("container");
    }
}

pub struct MockDecoder {
    channels: usize,
    chunk: usize,
    delay: usize,
    held: VecDeque<Vec<u8>>,
    drops: DropLog,
}

impl MockDecoder {
    fn emit(&self, bytes: &[u8], frame: &mut DecodedFrame) {
        let planes = (0..self.channels)
            .map(|ch| bytes.iter().map(|&b| mock_sample(b, ch)).collect())
            .collect();
        frame.set(FramePlanes::S16(planes));
    }
}

impl FrameDecoder for MockDecoder {
    fn decode(
        &mut self,
        input: DecodeInput<'_>,
        frame: &mut DecodedFrame,
    ) -> Result<DecodeStep, BackendError> {
        let (data, trim_start, trim_end) = match input {
            DecodeInput::Drain => {
                return Ok(match self.held.pop_front() {
                    Some(bytes) => {
                        self.emit(&bytes, frame);
                        DecodeStep {
                            consumed: 0,
                            got_frame: true,
                        }
                    }
                    None => DecodeStep::default(),
                });
            }
            DecodeInput::Packet {
                data,
                trim_start,
                trim_end,
                ..
            } => (data, trim_start as usize, trim_end as usize),
        };

        if self.chunk == 0 {
            return Ok(DecodeStep::default());
        }

        let take = data.len().min(self.chunk);
        let bytes = &data[..take];
        if bytes.first() == Some(&CORRUPT_BYTE) {
            return Err(BackendError::Malformed("corrupt packet".to_string()));
        }

        // one byte decodes to one frame; the end trim covers the packet's
        // last bytes whichever chunk they land in
        let end = take.min(data.len().saturating_sub(trim_end));
        let start = trim_start.min(end);
        self.held.push_back(bytes[start..end].to_vec());
        let got_frame = self.held.len() > self.delay;
        if got_frame {
            if let Some(out) = self.held.pop_front() {
                self.emit(&out, frame);
            }
        }

        Ok(DecodeStep {
            consumed: take,
            got_frame,
        })
    }

    fn flush(&mut self) {
        self.held.clear();
    }
}

impl Drop for MockDecoder {
    fn drop(&mut self) {
        self.drops.lock().unwrap().push("decoder");
    }
}

impl MediaBackend for MockBackend {
    type Container = MockContainer;
    type Decoder = MockDecoder;

    fn open_container(&self, _path: &Path) -> Result<MockContainer, BackendError> {
        if self.fail_open {
            return Err(BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such file",
            )));
        }
        Ok(MockContainer {
            streams: self.streams.clone(),
            packets: self.packets.clone(),
            cursor: 0,
            fail_seek: self.fail_seek,
            drops: self.drops.clone(),
            seeks: self.seeks.clone(),
        })
    }

    fn open_decoder(
        &self,
        _container: &MockContainer,
        stream: &StreamInfo,
    ) -> Result<MockDecoder, CodecError> {
        if stream.codec.codec == "missing" {
            return Err(CodecError::NotFound(stream.codec.codec.clone()));
        }
        Ok(MockDecoder {
            channels: stream.codec.channels,
            chunk: self.chunk,
            delay: self.delay,
            held: VecDeque::new(),
            drops: self.drops.clone(),
        })
    }
}
