// src/main.rs
use std::process::ExitCode;

use clap::Parser;
use colorful::Colorful;

use streamdecode::cli::{self, Args};

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .init();

    match cli::run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red(), e);
            ExitCode::from(2)
        }
    }
}
