//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

use crate::config::{FrameSizePolicy, SessionOptions};
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "streamdecode")]
#[command(about = "Decode audio streams frame by frame and verify seek-to-start consistency")]
pub struct Args {
    /// Input files or directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Print the stream information dump for each file
    #[arg(short, long)]
    pub info: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Size frames by decoding the first one instead of assuming one second
    #[arg(long)]
    pub probe_frame_size: bool,

    /// Session options as a JSON file
    #[arg(long, env = "STREAMDECODE_OPTIONS")]
    pub options: Option<PathBuf>,

    /// Number of files decoded in parallel (default: one per core)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Verbose output (repeat for per-frame logging)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Session options from `--options`, with command-line flags on top.
    pub fn session_options(&self) -> Result<SessionOptions> {
        let mut options = match &self.options {
            Some(path) => SessionOptions::from_json_file(path)?,
            None => SessionOptions::default(),
        };
        if self.probe_frame_size {
            options.frame_size = FrameSizePolicy::Probe;
        }
        Ok(options)
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from(["streamdecode", "-vv", "--probe-frame-size", "a.flac", "dir"])
            .unwrap();
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.log_filter(), "debug");
        assert_eq!(
            args.session_options().unwrap().frame_size,
            FrameSizePolicy::Probe
        );
    }

    #[test]
    fn test_requires_input() {
        assert!(Args::try_parse_from(["streamdecode"]).is_err());
    }

    #[test]
    fn test_default_options() {
        let args = Args::try_parse_from(["streamdecode", "a.wav"]).unwrap();
        assert_eq!(args.log_filter(), "warn");
        assert!(!args.json);
        assert_eq!(args.session_options().unwrap(), SessionOptions::default());
    }
}
