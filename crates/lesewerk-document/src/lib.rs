// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// lesewerk-document — Reading text out of PDF documents.
//
// Provides direct extraction from the embedded text layer (`PdfTextReader`),
// image processing for scanned pages (`ImageProcessor`), and the rasterize,
// contrast-enhance, OCR pipeline (`RasterOcrExtractor`) for documents without
// a usable text layer.

pub mod image;
pub mod pdf;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the primary structs so callers can use `lesewerk_document::PdfTextReader` etc.
pub use crate::image::processor::ImageProcessor;
pub use pdf::reader::PdfTextReader;
pub use scan::extractor::RasterOcrExtractor;
pub use scan::ocr::{TesseractCli, TextRecognizer};
pub use scan::raster::{PageRasterizer, PdftoppmRasterizer};
pub use scan::workdir::{PageImage, WorkDir};

#[cfg(feature = "ocrs")]
pub use scan::ocrs_backend::OcrsRecognizer;
