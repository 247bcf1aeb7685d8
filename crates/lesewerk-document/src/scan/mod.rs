// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline — page rasterization, working-directory bookkeeping,
// contrast enhancement, and optical character recognition (OCR).

pub mod extractor;
pub mod ocr;
pub mod raster;
pub mod workdir;

#[cfg(feature = "ocrs")]
pub mod ocrs_backend;

pub use extractor::RasterOcrExtractor;
pub use ocr::{TesseractCli, TextRecognizer};
pub use raster::{PageRasterizer, PdftoppmRasterizer};
pub use workdir::{PageImage, WorkDir};

