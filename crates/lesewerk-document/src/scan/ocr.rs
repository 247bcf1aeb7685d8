// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) for rasterized pages.
//
// The default recognizer drives the Tesseract command-line tool, which takes a
// language code per call (`eng`, `spa`, `eng+deu`, ...). Install:
// - Linux: sudo apt-get install tesseract-ocr tesseract-ocr-spa
// - Mac: brew install tesseract tesseract-lang
// - Windows: https://github.com/UB-Mannheim/tesseract/wiki
//
// With the `ocrs` feature a pure-Rust engine is available as well, see
// `scan::ocrs_backend`.

use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use image::DynamicImage;
use lesewerk_core::error::LesewerkError;
use tracing::{debug, instrument};

use crate::image::processor::ImageProcessor;

/// Recovers text from a page image.
pub trait TextRecognizer {
    /// Recognise the text in `image` using the language code `lang`.
    fn recognize(&self, image: &DynamicImage, lang: &str) -> Result<String, LesewerkError>;
}

/// Recognizer backed by the `tesseract` command-line tool.
///
/// The image is encoded as PNG and piped through stdin, so nothing besides the
/// rasterized pages is written to disk.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
    /// Page segmentation mode (`--psm`), Tesseract's default when `None`.
    page_segmentation: Option<u8>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("tesseract"),
            page_segmentation: None,
        }
    }
}

impl TesseractCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `tesseract` binary instead of the one on PATH.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Set Tesseract's page segmentation mode (0–13).
    pub fn page_segmentation(mut self, mode: u8) -> Self {
        self.page_segmentation = Some(mode);
        self
    }

    /// Whether the configured binary can be spawned.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program).arg("--version").output().is_ok()
    }

    fn command(&self, lang: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("stdin").arg("stdout").arg("-l").arg(lang);
        if let Some(mode) = self.page_segmentation {
            command.arg("--psm").arg(mode.to_string());
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl TextRecognizer for TesseractCli {
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), lang = %lang))]
    fn recognize(&self, image: &DynamicImage, lang: &str) -> Result<String, LesewerkError> {
        let png = ImageProcessor::from_dynamic(image.clone())
            .to_png_bytes()
            .map_err(|err| LesewerkError::Ocr(err.to_string()))?;

        let mut child = self.command(lang).spawn().map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                LesewerkError::Ocr(format!(
                    "{} is not installed or not in PATH",
                    self.program.display()
                ))
            } else {
                LesewerkError::Ocr(format!(
                    "{} failed to start: {}",
                    self.program.display(),
                    err
                ))
            }
        })?;

        // Tesseract may exit before reading stdin (e.g. unknown language);
        // its exit status and stderr take precedence over the write error.
        // Dropping stdin closes the pipe so tesseract sees EOF.
        let sent = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&png),
            None => Err(std::io::Error::other("stdin is not available")),
        };

        let output = child.wait_with_output().map_err(|err| {
            LesewerkError::Ocr(format!("failed waiting for tesseract: {}", err))
        })?;

        if !output.status.success() {
            return Err(LesewerkError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if let Err(err) = sent {
            return Err(LesewerkError::Ocr(if err.kind() == ErrorKind::BrokenPipe {
                "tesseract exited before reading the whole image".to_string()
            } else {
                format!("failed to send image to tesseract: {}", err)
            }));
        }

        // Tesseract ends every page with a form feed.
        let text = String::from_utf8_lossy(&output.stdout)
            .trim_end_matches(['\u{c}', '\n', ' '])
            .to_string();

        debug!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "OCR recognition complete"
        );
        Ok(text)
    }
}
