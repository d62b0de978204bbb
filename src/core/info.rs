// src/core/info.rs
//
// Human-readable dump of the streams in a container.

use std::fmt::Write;

use super::backend::{MediaKind, StreamInfo};

fn or_unknown<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

/// Describe every stream: codec, format, timing.
pub fn describe_streams(streams: &[StreamInfo]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} stream(s) found:", streams.len());

    for stream in streams {
        let codec = &stream.codec;
        let kind = match stream.kind {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
            MediaKind::Other => "other",
        };

        let _ = writeln!(
            out,
            "STREAM INDEX {}{}",
            stream.index,
            if stream.is_default { " (default)" } else { "" }
        );
        let _ = writeln!(out, "  type: ................ {}", kind);
        let _ = writeln!(out, "  time base: ........... {}", or_unknown(stream.time_base));
        let _ = writeln!(out, "  start time: .......... {}", or_unknown(stream.start_time));
        let _ = writeln!(out, "  duration: ............ {}", or_unknown(stream.duration));
        if let (Some(tb), Some(duration)) = (stream.time_base, stream.duration) {
            let _ = writeln!(
                out,
                "  calculated length: ... {:.3}s",
                tb.seconds(i64::try_from(duration).unwrap_or(i64::MAX))
            );
        }

        let _ = writeln!(out, "  CODEC:");
        let _ = writeln!(
            out,
            "    name: .............. {}{}",
            codec.codec,
            if codec.decodable { "" } else { " (no decoder)" }
        );
        let _ = writeln!(out, "    sample rate: ....... {}", codec.sample_rate);
        let _ = writeln!(out, "    channels: .......... {}", codec.channels);
        let _ = writeln!(
            out,
            "    channel layout: .... {}",
            or_unknown(codec.channel_layout.map(|l| format!("{:#x}", l.0)))
        );
        let _ = writeln!(out, "    raw bit depth: ..... {}", or_unknown(codec.bits_per_raw_sample));
        let _ = writeln!(
            out,
            "    sample format: ..... {}",
            or_unknown(codec.sample_format.map(|f| format!("{:?}", f)))
        );
        let _ = writeln!(out, "    frames/packet: ..... {}", or_unknown(codec.max_frames_per_packet));
        let _ = writeln!(out, "    delay: ............. {}", or_unknown(codec.delay));
        let _ = writeln!(out, "    bit rate: .......... {}", or_unknown(codec.bit_rate));
    }

    out
}
