// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lesewerk — PDF text and metadata extraction with an OCR fallback.
//
// Entry point. Initialises logging, parses the command line, and turns library
// errors into plain messages on stderr.

mod crop;
mod extract;

use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use lesewerk_core::LesewerkError;
use lesewerk_core::human_errors::humanize_error;
use tracing_subscriber::EnvFilter;

use crop::CropArgs;
use extract::ExtractArgs;

#[derive(Debug, Parser)]
#[command(author, version, about = "Read text from PDFs, with OCR for scanned pages")]
struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print metadata, embedded text, and OCR text of a PDF
    Extract(ExtractArgs),
    /// Crop a rectangle out of an image
    Crop(CropArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract(args) => extract::run(&args, &mut std::io::stdout().lock()),
        Commands::Crop(args) => crop::run(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Library errors get the human-readable message and suggestion; anything else
/// is printed with its context chain.
fn report(err: &anyhow::Error) {
    match err.chain().find_map(|cause| cause.downcast_ref::<LesewerkError>()) {
        Some(lesewerk_err) => {
            let human = humanize_error(lesewerk_err);
            eprintln!("error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            tracing::debug!(error = %err, "Command failed");
        }
        None => eprintln!("error: {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_flags_parse() {
        let cli = Cli::try_parse_from([
            "lesewerk", "-vv", "extract", "scan.pdf", "--page", "2", "--lang", "eng", "--dpi",
            "150", "--format", "png", "--no-ocr", "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Extract(args) => {
                assert_eq!(args.pdf.to_str(), Some("scan.pdf"));
                assert_eq!(args.page, Some(2));
                assert_eq!(args.lang.as_deref(), Some("eng"));
                assert_eq!(args.dpi, Some(150));
                assert!(args.no_ocr);
                assert!(args.json);
            }
            other => panic!("expected extract, got {other:?}"),
        }
    }

    #[test]
    fn negative_page_is_rejected() {
        assert!(Cli::try_parse_from(["lesewerk", "extract", "a.pdf", "--page", "-1"]).is_err());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["lesewerk", "extract", "a.pdf", "--format", "gif"]).is_err());
    }

    #[test]
    fn crop_requires_box_and_output() {
        assert!(Cli::try_parse_from(["lesewerk", "crop", "in.png"]).is_err());
        let cli = Cli::try_parse_from([
            "lesewerk", "crop", "in.png", "--box", "10,20,30,40", "--output", "out.png",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Crop(_)));
    }
}
