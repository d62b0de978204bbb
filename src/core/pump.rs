// src/core/pump.rs
//
// Packet-to-frame pump: pulls packets from the container, feeds the decoder
// (continuing partially consumed packets), and drains buffered frames once
// the input is exhausted.

use log::{debug, warn};
use serde::Serialize;

use super::backend::{Container, DecodeInput, DecodeStep, FrameDecoder, Packet};
use super::frame::DecodedFrame;
use crate::error::{BackendError, Error, Result};

/// Pump state between decode steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PumpState {
    /// No pending bytes; the next step reads a packet
    NeedPacket,
    /// The pending packet still has undecoded bytes
    HavePacket,
    /// Input ended; decoder is being asked for buffered frames
    Draining,
    /// Input ended and the decoder is empty
    Exhausted,
}

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub packets_read: u64,
    pub packets_skipped: u64,
    pub frames_decoded: u64,
    pub decode_errors: u64,
    pub seeks: u64,
}

/// The packet currently being decoded and how far into it the decoder got.
#[derive(Debug, Default)]
pub struct PendingPacket {
    packet: Option<Packet>,
    offset: usize,
}

impl PendingPacket {
    pub fn load(&mut self, packet: Packet) {
        self.packet = Some(packet);
        self.offset = 0;
    }

    pub fn packet(&self) -> Option<&Packet> {
        self.packet.as_ref()
    }

    pub fn remaining(&self) -> usize {
        self.packet
            .as_ref()
            .map_or(0, |p| p.data.len().saturating_sub(self.offset))
    }

    /// Undecoded bytes of the packet.
    pub fn remainder(&self) -> &[u8] {
        match &self.packet {
            Some(p) => &p.data[self.offset.min(p.data.len())..],
            None => &[],
        }
    }

    /// Nothing of the packet has been decoded yet.
    pub fn at_start(&self) -> bool {
        self.offset == 0
    }

    /// Advance the cursor by `consumed`, clamped to the remaining bytes.
    /// Returns the distance actually moved.
    pub fn advance(&mut self, consumed: usize) -> usize {
        let step = consumed.min(self.remaining());
        self.offset += step;
        step
    }

    /// Drop the packet's storage.
    pub fn release(&mut self) {
        self.packet = None;
        self.offset = 0;
    }
}

/// Drives a container and decoder pair for one stream.
pub struct FramePump<C, D> {
    // field order is drop order
    pending: PendingPacket,
    frame: DecodedFrame,
    decoder: D,
    container: C,
    stream_index: u32,
    state: PumpState,
    last_frame_pts: Option<i64>,
    last_frame_pos: Option<u64>,
    stats: SessionStats,
}

impl<C: Container, D: FrameDecoder> FramePump<C, D> {
    pub fn new(container: C, decoder: D, stream_index: u32) -> Self {
        Self {
            pending: PendingPacket::default(),
            frame: DecodedFrame::new(),
            decoder,
            container,
            stream_index,
            state: PumpState::NeedPacket,
            last_frame_pts: None,
            last_frame_pos: None,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> PumpState {
        self.state
    }

    /// The most recently decoded frame.
    pub fn frame(&self) -> &DecodedFrame {
        &self.frame
    }

    /// Timestamp (time-base units) of the packet behind the last frame.
    pub fn last_frame_pts(&self) -> Option<i64> {
        self.last_frame_pts
    }

    /// Byte offset of the packet behind the last frame.
    pub fn last_frame_pos(&self) -> Option<u64> {
        self.last_frame_pos
    }

    /// Run one decode step.
    ///
    /// Returns `Ok(None)` at end of stream, `Ok(Some(true))` when a frame
    /// was decoded into [`frame`](Self::frame), `Ok(Some(false))` when the
    /// step produced nothing (skipped packet, decoder still filling up).
    pub fn step(&mut self) -> Result<Option<bool>> {
        match self.state {
            PumpState::Exhausted => return Ok(None),
            PumpState::NeedPacket => self.pull_packet(),
            PumpState::HavePacket | PumpState::Draining => {}
        }

        let draining = self.state == PumpState::Draining;
        self.frame.clear();

        let result = if draining {
            self.decoder.decode(DecodeInput::Drain, &mut self.frame)
        } else {
            self.decode_pending()
        };

        let step = match result {
            Ok(step) => step,
            Err(e) => {
                self.stats.decode_errors += 1;
                self.pending.release();
                self.state = if draining {
                    PumpState::Exhausted
                } else {
                    PumpState::NeedPacket
                };
                return Err(Error::Decode(e));
            }
        };

        if draining {
            if !step.got_frame {
                debug!("decoder drained after {} frames", self.stats.frames_decoded);
                self.state = PumpState::Exhausted;
                return Ok(None);
            }
            self.stats.frames_decoded += 1;
            self.last_frame_pts = None;
            self.last_frame_pos = None;
            debug!("drained buffered frame, {} samples", self.frame.frames());
            return Ok(Some(true));
        }

        let advanced = self.pending.advance(step.consumed);
        if advanced == 0 && !step.got_frame && self.pending.remaining() > 0 {
            warn!(
                "decoder made no progress, dropping {} bytes of packet",
                self.pending.remaining()
            );
            self.pending.release();
        }

        if step.got_frame {
            self.stats.frames_decoded += 1;
            self.last_frame_pts = self.pending.packet().and_then(|p| p.pts);
            self.last_frame_pos = self.pending.packet().and_then(|p| p.pos);
            debug!(
                "audio frame n:{} samples:{} pts:{:?}",
                self.stats.frames_decoded,
                self.frame.frames(),
                self.last_frame_pts
            );
        }

        if self.pending.remaining() == 0 {
            self.pending.release();
            self.state = PumpState::NeedPacket;
        } else {
            self.state = PumpState::HavePacket;
        }

        Ok(Some(step.got_frame))
    }

    fn pull_packet(&mut self) {
        match self.container.read_packet() {
            Ok(Some(packet)) => {
                self.stats.packets_read += 1;
                self.pending.load(packet);
                self.state = PumpState::HavePacket;
            }
            Ok(None) => {
                debug!("end of input, draining decoder");
                self.state = PumpState::Draining;
            }
            Err(e) => {
                warn!("could not read packet, treating as end of input: {}", e);
                self.state = PumpState::Draining;
            }
        }
    }

    fn decode_pending(&mut self) -> std::result::Result<DecodeStep, BackendError> {
        let (stream_index, pts, duration, trim_start, trim_end) = match self.pending.packet() {
            Some(p) => (p.stream_index, p.pts, p.duration, p.trim_start, p.trim_end),
            None => return Ok(DecodeStep::default()),
        };
        // the leading trim belongs to the first frame cut from the packet
        let trim_start = if self.pending.at_start() { trim_start } else { 0 };

        if stream_index != self.stream_index {
            self.stats.packets_skipped += 1;
            return Ok(DecodeStep {
                consumed: self.pending.remaining(),
                got_frame: false,
            });
        }

        self.decoder.decode(
            DecodeInput::Packet {
                data: self.pending.remainder(),
                pts,
                duration,
                trim_start,
                trim_end,
            },
            &mut self.frame,
        )
    }

    /// Seek the container to `ts` (time-base units, backward-biased), flush
    /// the decoder and forget the pending packet.
    ///
    /// On failure the pump is left as it was.
    pub fn seek(&mut self, ts: i64) -> std::result::Result<Option<i64>, BackendError> {
        let landed = self.container.seek(self.stream_index, ts)?;
        self.decoder.flush();
        // the flush invalidates the packet the decoder was working on
        self.pending.release();
        self.frame.clear();
        self.state = PumpState::NeedPacket;
        self.last_frame_pts = None;
        self.last_frame_pos = None;
        self.stats.seeks += 1;
        Ok(landed)
    }

    pub fn reset_stats(&mut self) {
        self.stats = SessionStats::default();
    }
}

// Teardown needs no collaborator bounds so the session's `Drop` can use it.
impl<C, D> FramePump<C, D> {
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Drop the pending packet; the next step reads a fresh one.
    pub fn release_packet(&mut self) {
        self.pending.release();
        if self.state == PumpState::HavePacket {
            self.state = PumpState::NeedPacket;
        }
    }

    pub fn release_frame(&mut self) {
        self.frame = DecodedFrame::new();
    }
}
