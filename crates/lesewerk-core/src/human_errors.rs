// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every technical error is mapped to a short message with a concrete next step.

use crate::error::LesewerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user has to change something (path, flag, installed tool).
    ActionRequired,
    /// Nothing the user can do will make this input work.
    Permanent,
    /// A programming error in the caller (wrong call order).
    Usage,
}

/// A human-readable error with a plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `LesewerkError` into a `HumanError`.
pub fn humanize_error(err: &LesewerkError) -> HumanError {
    match err {
        LesewerkError::NotFound(path) => HumanError {
            message: format!("The file {path} does not exist."),
            suggestion: "Check the path and try again.".into(),
            severity: Severity::ActionRequired,
        },

        LesewerkError::Open(_) => HumanError {
            message: "This file could not be read as a PDF.".into(),
            suggestion: "The file may be damaged, encrypted, or not a PDF at all.".into(),
            severity: Severity::Permanent,
        },

        LesewerkError::NotOpen | LesewerkError::NotRasterized(_) => HumanError {
            message: "An operation was called out of order.".into(),
            suggestion: err.to_string(),
            severity: Severity::Usage,
        },

        LesewerkError::OutOfRange { page_count, .. } => HumanError {
            message: "That page does not exist.".into(),
            suggestion: if *page_count == 0 {
                "The document has no pages.".into()
            } else {
                format!("Pick a page between 0 and {}.", page_count - 1)
            },
            severity: Severity::ActionRequired,
        },

        LesewerkError::Extraction(_) => HumanError {
            message: "The embedded text could not be read.".into(),
            suggestion: "The text layer may be broken; the OCR output is usually still usable."
                .into(),
            severity: Severity::Permanent,
        },

        LesewerkError::Rasterization(detail) => {
            if detail.contains("pdftoppm") {
                HumanError {
                    message: "The page renderer is not available.".into(),
                    suggestion: "Install poppler-utils (Linux: apt-get install poppler-utils, \
                                 Mac: brew install poppler) so that `pdftoppm` is on PATH."
                        .into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "The pages could not be rendered to images.".into(),
                    suggestion: "Try a lower --dpi or a different --format.".into(),
                    severity: Severity::Permanent,
                }
            }
        }

        LesewerkError::ImageProcessing(_) => HumanError {
            message: "An image could not be decoded.".into(),
            suggestion: "Make sure the file is a JPEG, PNG, TIFF, or BMP image.".into(),
            severity: Severity::Permanent,
        },

        LesewerkError::Ocr(detail) => humanize_ocr_error(detail),

        LesewerkError::Cleanup { path, .. } => HumanError {
            message: "Temporary page images could not be removed.".into(),
            suggestion: format!("Delete {path} by hand and check its permissions."),
            severity: Severity::ActionRequired,
        },

        LesewerkError::Config(detail) => HumanError {
            message: "The configuration is invalid.".into(),
            suggestion: detail.clone(),
            severity: Severity::ActionRequired,
        },

        LesewerkError::Io(io_err) => HumanError {
            message: "A file operation failed.".into(),
            suggestion: format!("Check disk space and permissions. ({io_err})"),
            severity: Severity::ActionRequired,
        },

        LesewerkError::Serialization(_) => HumanError {
            message: "The configuration file is not valid JSON.".into(),
            suggestion: err.to_string(),
            severity: Severity::ActionRequired,
        },
    }
}

fn humanize_ocr_error(detail: &str) -> HumanError {
    if detail.contains("not installed") || detail.contains("failed to start") {
        HumanError {
            message: "Text recognition is not available.".into(),
            suggestion: "Install Tesseract (Linux: apt-get install tesseract-ocr, \
                         Mac: brew install tesseract) so that `tesseract` is on PATH."
                .into(),
            severity: Severity::ActionRequired,
        }
    } else if detail.contains("Failed loading language") || detail.contains("traineddata") {
        HumanError {
            message: "The OCR language pack is missing.".into(),
            suggestion: "Install the Tesseract data for the language (e.g. tesseract-ocr-spa) \
                         or pass a different --lang."
                .into(),
            severity: Severity::ActionRequired,
        }
    } else {
        HumanError {
            message: "Text recognition failed on a page.".into(),
            suggestion: "Try a higher --dpi, or --continue-on-error to keep the other pages."
                .into(),
            severity: Severity::Permanent,
        }
    }
}
