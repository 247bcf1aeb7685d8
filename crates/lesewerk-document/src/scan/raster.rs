// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization — render PDF pages to pixel images.
//
// The default backend drives poppler's `pdftoppm`. It has to be installed
// separately:
// - Linux: sudo apt-get install poppler-utils
// - Mac: brew install poppler
// - Windows: https://github.com/oschwartz10612/poppler-windows/releases/

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use lesewerk_core::error::LesewerkError;
use tracing::{debug, instrument};

/// Renders a single PDF page to an image.
pub trait PageRasterizer {
    /// Render the 1-based `page_number` of `pdf` at `dpi`.
    fn render_page(
        &self,
        pdf: &Path,
        page_number: u32,
        dpi: u32,
    ) -> Result<DynamicImage, LesewerkError>;
}

/// Rasterizer backed by the `pdftoppm` command-line tool.
///
/// Each page is rendered losslessly to PNG inside a private scratch directory
/// and decoded back into memory; the scratch directory is removed when the
/// call returns.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self {
            program: PathBuf::from("pdftoppm"),
        }
    }
}

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `pdftoppm` binary instead of the one on PATH.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether the configured binary can be spawned.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program).arg("-v").output().is_ok()
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    #[instrument(skip(self, pdf), fields(pdf = %pdf.display()))]
    fn render_page(
        &self,
        pdf: &Path,
        page_number: u32,
        dpi: u32,
    ) -> Result<DynamicImage, LesewerkError> {
        let scratch = tempfile::Builder::new()
            .prefix("lesewerk-render-")
            .tempdir()
            .map_err(|err| {
                LesewerkError::Rasterization(format!("cannot create scratch directory: {}", err))
            })?;
        let prefix = scratch.path().join("page");
        let page = page_number.to_string();

        let output = Command::new(&self.program)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page)
            .arg("-l")
            .arg(&page)
            .arg("-png")
            .arg("-singlefile")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .map_err(|err| {
                if err.kind() == ErrorKind::NotFound {
                    LesewerkError::Rasterization(format!(
                        "{} is not installed or not in PATH",
                        self.program.display()
                    ))
                } else {
                    LesewerkError::Rasterization(format!(
                        "failed to run {}: {}",
                        self.program.display(),
                        err
                    ))
                }
            })?;

        if !output.status.success() {
            return Err(LesewerkError::Rasterization(format!(
                "{} exited with {} on page {}: {}",
                self.program.display(),
                output.status,
                page_number,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let rendered = prefix.with_extension("png");
        let image = image::open(&rendered).map_err(|err| {
            LesewerkError::Rasterization(format!(
                "cannot decode rendered page {}: {}",
                page_number, err
            ))
        })?;

        debug!(width = image.width(), height = image.height(), "Page rendered");
        Ok(image)
    }
}
