//! Output formatting for CLI results

use colorful::Colorful;
use serde::Serialize;

use crate::core::{OpenWarning, OutputConfig, RewindReport, SessionStats};

/// Everything the CLI learned about one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<OpenWarning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewind: Option<RewindReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SessionStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streams: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(file: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            file: file.into(),
            output: None,
            warnings: Vec::new(),
            rewind: None,
            stats: None,
            streams: None,
            error: Some(error.to_string()),
        }
    }

    /// Opened, decoded, and both passes matched.
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.rewind.as_ref().is_some_and(|r| r.is_consistent())
    }
}

fn format_warning(warning: &OpenWarning) -> String {
    match warning {
        OpenWarning::DecoderDelay { frames } => {
            format!("codec delays output by {} frames", frames)
        }
        OpenWarning::FallbackFormat {
            raw_bits,
            derived_bits,
        } => format!(
            "unsupported bit depth {}/{}, decoding to float",
            raw_bits.unwrap_or(0),
            derived_bits
        ),
        OpenWarning::DefaultChannelLayout { channels } => {
            format!("no channel layout, assuming default for {} channels", channels)
        }
    }
}

/// Format one file's report for the terminal.
pub fn format_report(report: &FileReport, verbose: bool) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", report.file.clone().cyan()));

    if let Some(streams) = &report.streams {
        for line in streams.lines() {
            output.push_str(&format!("  {}\n", line));
        }
    }

    if let Some(error) = &report.error {
        output.push_str(&format!("  {}\n", format!("✗ {}", error).red()));
        return output;
    }

    if let Some(config) = &report.output {
        output.push_str(&format!(
            "  Format: {} Hz, {} ch, {} ({} bytes/sample)\n",
            config.sample_rate, config.channels, config.sample_format, config.sample_size
        ));
        match config.total_length {
            Some(length) => output.push_str(&format!(
                "  Length: {} samples ({:.2}s)\n",
                length,
                length as f64 / config.sample_rate as f64
            )),
            None => output.push_str("  Length: unknown\n"),
        }
        output.push_str(&format!("  Frame size: {} samples\n", config.frame_size));
    }

    for warning in &report.warnings {
        output.push_str(&format!("  {}\n", format!("⚠ {}", format_warning(warning)).yellow()));
    }

    if let Some(rewind) = &report.rewind {
        let status = if rewind.is_consistent() {
            "✓ CONSISTENT".green().to_string()
        } else {
            "✗ MISMATCH AFTER SEEK".red().to_string()
        };
        output.push_str(&format!("  Rewind check: {}\n", status));

        if verbose || !rewind.is_consistent() {
            for (label, pass) in [("first", &rewind.first), ("second", &rewind.second)] {
                output.push_str(&format!(
                    "    {} pass: {} frames, {} samples, md5 {}{}\n",
                    label,
                    pass.frames,
                    pass.samples,
                    pass.digest,
                    if pass.errors > 0 {
                        format!(" ({} read errors)", pass.errors)
                    } else {
                        String::new()
                    }
                ));
            }
        }
    }

    if verbose {
        if let Some(stats) = &report.stats {
            output.push_str(&format!(
                "  Packets: {} read, {} skipped; {} frames decoded; {} seeks\n",
                stats.packets_read, stats.packets_skipped, stats.frames_decoded, stats.seeks
            ));
        }
    }

    output
}

pub fn print_report(report: &FileReport, verbose: bool) {
    println!("{}", format_report(report, verbose));
}

/// Print all reports as one JSON array.
pub fn print_json(reports: &[FileReport]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(reports)?);
    Ok(())
}

/// Format a summary for multiple files
pub fn format_summary(reports: &[FileReport]) -> String {
    let passed = reports.iter().filter(|r| r.passed()).count();
    let errors = reports.iter().filter(|r| r.error.is_some()).count();
    let mismatched = reports.len() - passed - errors;

    let mut output = format!("Summary: {} file(s) decoded\n", reports.len());
    if passed > 0 {
        output.push_str(&format!("  {}\n", format!("✓ {} consistent", passed).green()));
    }
    if mismatched > 0 {
        output.push_str(&format!("  {}\n", format!("✗ {} mismatched", mismatched).red()));
    }
    if errors > 0 {
        output.push_str(&format!("  {}\n", format!("✗ {} failed", errors).red()));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PassSummary, SampleFormat};

    fn pass(digest: &str) -> PassSummary {
        PassSummary {
            frames: 2,
            samples: 2048,
            first_timestamp: None,
            last_timestamp: None,
            digest: digest.to_string(),
            errors: 0,
        }
    }

    fn report(second_digest: &str) -> FileReport {
        FileReport {
            file: "test.flac".to_string(),
            output: Some(OutputConfig {
                sample_rate: 44100,
                sample_size: 2,
                channels: 2,
                total_length: Some(44100),
                frame_size: 44100,
                sample_format: SampleFormat::S16,
            }),
            warnings: vec![OpenWarning::DecoderDelay { frames: 576 }],
            rewind: Some(RewindReport {
                first: pass("abc"),
                second: pass(second_digest),
            }),
            stats: Some(SessionStats::default()),
            streams: None,
            error: None,
        }
    }

    #[test]
    fn test_format_report() {
        let output = format_report(&report("abc"), false);
        assert!(output.contains("test.flac"));
        assert!(output.contains("44100 Hz, 2 ch, s16"));
        assert!(output.contains("CONSISTENT"));
        assert!(output.contains("576 frames"));
    }

    #[test]
    fn test_mismatch_shows_passes() {
        let output = format_report(&report("def"), false);
        assert!(output.contains("MISMATCH"));
        assert!(output.contains("md5 def"));
    }

    #[test]
    fn test_summary_counts() {
        let reports = vec![
            report("abc"),
            report("def"),
            FileReport::failed("broken.mp3", "could not open"),
        ];
        assert!(reports[0].passed());
        assert!(!reports[1].passed());
        let summary = format_summary(&reports);
        assert!(summary.contains("3 file(s)"));
        assert!(summary.contains("1 consistent"));
        assert!(summary.contains("1 mismatched"));
        assert!(summary.contains("1 failed"));
    }

    #[test]
    fn test_json_skips_empty_fields() {
        let json = serde_json::to_string(&FileReport::failed("x.wav", "boom")).unwrap();
        assert!(json.contains("\"error\":\"boom\""));
        assert!(!json.contains("rewind"));
    }
}
