// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Lesewerk.

use thiserror::Error;

/// Top-level error type for all Lesewerk operations.
#[derive(Debug, Error)]
pub enum LesewerkError {
    // -- Direct text extraction --
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("failed to open PDF: {0}")]
    Open(String),

    #[error("the PDF is not open; call open() first")]
    NotOpen,

    #[error("page index {index} is out of range (document has {page_count} pages)")]
    OutOfRange { index: usize, page_count: usize },

    #[error("text extraction failed: {0}")]
    Extraction(String),

    // -- Raster / OCR pipeline --
    #[error("rasterization failed: {0}")]
    Rasterization(String),

    #[error("image processing failed: {0}")]
    ImageProcessing(String),

    #[error("no page images found in {0}; call rasterize() first")]
    NotRasterized(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("cleanup failed for {path}: {reason}")]
    Cleanup { path: String, reason: String },

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LesewerkError>;
