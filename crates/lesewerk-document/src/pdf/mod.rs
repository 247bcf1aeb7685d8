// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading the embedded text layer and Info dictionary.

pub mod reader;

pub use reader::PdfTextReader;
