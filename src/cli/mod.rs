// src/cli/mod.rs
//
// Command-line interface module

mod args;
mod output;

pub use args::Args;
pub use output::{format_report, format_summary, print_json, print_report, FileReport};

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use colorful::Colorful;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use log::{debug, info};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::SessionOptions;
use crate::core::{describe_streams, verify_rewind, SymphoniaStream};

const AUDIO_EXTENSIONS: [&str; 9] = ["flac", "wav", "mp3", "ogg", "m4a", "aac", "aiff", "aif", "caf"];

/// Run the CLI. Returns `true` when every file decoded consistently.
pub fn run(args: &Args) -> anyhow::Result<bool> {
    let options = args.session_options()?;

    if let Some(threads) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to initialize thread pool")?;
    }

    let mut files = Vec::new();
    for input in &args.inputs {
        files.extend(collect_audio_files(input)?);
    }

    if files.is_empty() {
        if !args.json {
            println!("{}", "No audio files found!".red());
        }
        return Ok(false);
    }

    info!("decoding {} file(s)", files.len());
    if !args.json {
        println!("Found {} audio file(s)\n", files.len());
    }

    let progress = if args.json || files.len() == 1 {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64)
    };
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let reports: Vec<FileReport> = files
        .par_iter()
        .progress_with(progress.clone())
        .map(|path| process_file(path, &options, args.info))
        .collect();
    progress.finish_and_clear();

    if args.json {
        print_json(&reports)?;
    } else {
        let verbose = args.verbose > 0;
        for report in &reports {
            print_report(report, verbose);
        }
        if reports.len() > 1 {
            println!("{}", format_summary(&reports));
        }
    }

    Ok(reports.iter().all(FileReport::passed))
}

/// Open `path`, read it through, rewind, read it again, and close.
pub fn process_file(path: &Path, options: &SessionOptions, with_info: bool) -> FileReport {
    let file = path.display().to_string();

    let mut session = match SymphoniaStream::open_with_options(path, options) {
        Ok(session) => session,
        Err(e) => return FileReport::failed(file, e),
    };

    let streams = with_info.then(|| describe_streams(session.streams()));
    let output = session.output_config().clone();
    let warnings = session.warnings().to_vec();

    let mut buffer = vec![0u8; output.frame_buffer_len()];
    debug!("{}: frame buffer of {} bytes", file, buffer.len());

    let rewind = verify_rewind(&mut session, &mut buffer);
    let stats = session.stats();
    session.close();

    match rewind {
        Ok(rewind) => FileReport {
            file,
            output: Some(output),
            warnings,
            rewind: Some(rewind),
            stats: Some(stats),
            streams,
            error: None,
        },
        Err(e) => FileReport {
            streams,
            ..FileReport::failed(file, e)
        },
    }
}

fn collect_audio_files(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !path.exists() {
        bail!("input does not exist: {}", path.display());
    }

    // An explicitly named file is decoded whatever its extension.
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && is_audio_file(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("a/b/track.FLAC")));
        assert!(is_audio_file(Path::new("x.wav")));
        assert!(!is_audio_file(Path::new("cover.jpg")));
        assert!(!is_audio_file(Path::new("README")));
    }

    #[test]
    fn test_collect_missing_input() {
        assert!(collect_audio_files(Path::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn test_process_missing_file_reports_error() {
        let report = process_file(
            Path::new("/definitely/not/here.wav"),
            &SessionOptions::default(),
            false,
        );
        assert!(report.error.is_some());
        assert!(!report.passed());
    }
}
