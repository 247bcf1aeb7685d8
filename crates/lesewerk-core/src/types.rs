// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Lesewerk.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LesewerkError;

/// Key-value metadata from a PDF's Info dictionary (keys without the leading `/`).
pub type DocumentMetadata = BTreeMap<String, String>;

/// Image format used for rasterized pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    #[default]
    #[serde(alias = "JPEG", alias = "jpg")]
    Jpeg,
    #[serde(alias = "PNG")]
    Png,
    #[serde(alias = "TIFF", alias = "tif")]
    Tiff,
    #[serde(alias = "BMP")]
    Bmp,
}

impl RasterFormat {
    /// Filename extension written for pages in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
        }
    }

    /// Recognise a page file extension (case-insensitive, `jpg`/`tif` accepted).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tiff" | "tif" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

impl FromStr for RasterFormat {
    type Err = LesewerkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim()).ok_or_else(|| {
            LesewerkError::Config(format!(
                "unsupported image format '{s}' (expected JPEG, PNG, TIFF, or BMP)"
            ))
        })
    }
}

/// What the OCR loop does when a single page fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrErrorPolicy {
    /// Abort the whole run on the first failing page.
    #[default]
    FailFast,
    /// Record the failure and keep going with the next page.
    Continue,
}

/// Which text recognizer the pipeline drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// The `tesseract` command-line tool.
    #[default]
    Tesseract,
    /// The pure-Rust `ocrs` engine (requires the `ocrs` feature).
    Ocrs,
}

/// Lifecycle of a raster/OCR extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorState {
    /// Working directory established, nothing rendered yet.
    Created,
    /// Page images are on disk and ready for OCR.
    Rasterized,
    /// Working directory removed.
    CleanedUp,
}

impl fmt::Display for ExtractorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Rasterized => "rasterized",
            Self::CleanedUp => "cleaned up",
        };
        f.write_str(label)
    }
}

/// OCR text recovered from a single page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrPage {
    /// 1-based page number.
    pub page_number: u32,
    pub text: String,
}

/// A page the OCR loop could not process (only produced under
/// [`OcrErrorPolicy::Continue`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    pub page_number: u32,
    pub reason: String,
}

/// Result of an OCR pass over every rasterized page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrReport {
    /// Successfully recognised pages, ascending by page number.
    pub pages: Vec<OcrPage>,
    /// Pages that failed, ascending by page number.
    pub failures: Vec<PageFailure>,
}

impl OcrReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Render the labeled text blocks, one per recognised page:
    /// `Page <N>:\n<text>\n`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            out.push_str(&format!("Page {}:\n{}\n", page.page_number, page.text));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raster_format_parses_case_insensitively() {
        assert_eq!("JPEG".parse::<RasterFormat>().unwrap(), RasterFormat::Jpeg);
        assert_eq!("jpg".parse::<RasterFormat>().unwrap(), RasterFormat::Jpeg);
        assert_eq!("Png".parse::<RasterFormat>().unwrap(), RasterFormat::Png);
        assert_eq!("tif".parse::<RasterFormat>().unwrap(), RasterFormat::Tiff);
        assert!("webp".parse::<RasterFormat>().is_err());
    }

    #[test]
    fn raster_format_extension_is_lowercase_name() {
        assert_eq!(RasterFormat::Jpeg.extension(), "jpeg");
        assert_eq!(RasterFormat::Png.extension(), "png");
        assert_eq!(RasterFormat::Jpeg.to_string(), "JPEG");
    }

    #[test]
    fn raster_format_deserializes_uppercase_alias() {
        let format: RasterFormat = serde_json::from_str("\"PNG\"").unwrap();
        assert_eq!(format, RasterFormat::Png);
    }

    #[test]
    fn report_renders_labeled_blocks_in_order() {
        let report = OcrReport {
            pages: vec![
                OcrPage { page_number: 1, text: "alpha".into() },
                OcrPage { page_number: 2, text: "beta".into() },
            ],
            failures: Vec::new(),
        };
        assert_eq!(report.render(), "Page 1:\nalpha\nPage 2:\nbeta\n");
        assert!(report.is_complete());
    }
}
