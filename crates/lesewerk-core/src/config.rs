// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Extraction configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LesewerkError, Result};
use crate::types::{OcrBackend, OcrErrorPolicy, RasterFormat};

/// Default rasterization resolution.
pub const DEFAULT_DPI: u32 = 300;

/// Default Tesseract language code.
pub const DEFAULT_LANG: &str = "spa";

/// Highest resolution accepted for rasterization.
pub const MAX_DPI: u32 = 2400;

/// Settings for a read/OCR run. Every field has a default, so a JSON file only
/// needs the keys it wants to change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Rasterization resolution in dots per inch.
    pub dpi: u32,
    /// Image format for rasterized pages.
    pub format: RasterFormat,
    /// OCR language code (Tesseract naming, e.g. `eng`, `spa`, `eng+deu`).
    pub lang: String,
    /// Working directory for page images. `None` picks a unique directory
    /// under the current directory.
    pub work_dir: Option<PathBuf>,
    /// Leave page images on disk when the extractor is dropped.
    pub keep_images: bool,
    /// Behaviour when OCR fails on a single page.
    pub error_policy: OcrErrorPolicy,
    /// Text recognizer to drive.
    pub ocr_backend: OcrBackend,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            format: RasterFormat::default(),
            lang: DEFAULT_LANG.to_string(),
            work_dir: None,
            keep_images: false,
            error_policy: OcrErrorPolicy::default(),
            ocr_backend: OcrBackend::default(),
        }
    }
}

impl ExtractConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| {
            LesewerkError::Config(format!("cannot read {}: {}", path.display(), err))
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dpi == 0 || self.dpi > MAX_DPI {
            return Err(LesewerkError::Config(format!(
                "dpi must be between 1 and {MAX_DPI}, got {}",
                self.dpi
            )));
        }
        if self.lang.trim().is_empty() {
            return Err(LesewerkError::Config("OCR language must not be empty".into()));
        }
        if self
            .lang
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '+' || c == '_'))
        {
            return Err(LesewerkError::Config(format!(
                "invalid OCR language code '{}'",
                self.lang
            )));
        }
        Ok(())
    }
}
