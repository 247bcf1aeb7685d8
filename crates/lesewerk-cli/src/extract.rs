// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `lesewerk extract`: metadata, embedded text, and OCR text of one PDF.
//
// The embedded text layer is read first and the reader is closed before OCR
// starts. Page images are removed afterwards unless `--keep-images` is given,
// whether or not the OCR run succeeded.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use lesewerk_core::{
    DocumentMetadata, ExtractConfig, OcrBackend, OcrErrorPolicy, OcrReport, RasterFormat,
};
use lesewerk_document::{PdfTextReader, PdftoppmRasterizer, RasterOcrExtractor, TesseractCli};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// PDF document to read
    pub pdf: PathBuf,

    /// Print the embedded text of this page only (0-based)
    #[arg(long)]
    pub page: Option<usize>,

    /// OCR language code, e.g. `spa`, `eng`, `eng+deu`
    #[arg(long)]
    pub lang: Option<String>,

    /// Rasterization resolution
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Page image format: jpeg, png, tiff, or bmp
    #[arg(long)]
    pub format: Option<RasterFormat>,

    /// Directory for page images; refused if it holds anything else
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Leave the page images on disk
    #[arg(long)]
    pub keep_images: bool,

    /// Skip the rasterize and OCR pass
    #[arg(long)]
    pub no_ocr: bool,

    /// Keep going when OCR fails on a page
    #[arg(long)]
    pub continue_on_error: bool,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print one JSON object instead of plain text
    #[arg(long)]
    pub json: bool,
}

impl ExtractArgs {
    /// Defaults, then the config file, then command-line flags.
    fn resolve_config(&self) -> Result<ExtractConfig> {
        let mut config = match &self.config {
            Some(path) => ExtractConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ExtractConfig::default(),
        };

        if let Some(lang) = &self.lang {
            config.lang = lang.clone();
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(work_dir) = &self.work_dir {
            config.work_dir = Some(work_dir.clone());
        }
        if self.keep_images {
            config.keep_images = true;
        }
        if self.continue_on_error {
            config.error_policy = OcrErrorPolicy::Continue;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Everything `extract` found, in the shape printed by `--json`.
#[derive(Debug, Serialize)]
struct ExtractOutput {
    source: String,
    page_count: usize,
    metadata: DocumentMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    page: Option<usize>,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    ocr: Option<OcrReport>,
}

pub fn run(args: &ExtractArgs, out: &mut impl Write) -> Result<()> {
    let config = args.resolve_config()?;

    let mut reader = PdfTextReader::new(&args.pdf);
    reader.open()?;
    let embedded = read_embedded(&reader, args.page);
    reader.close();
    let (page_count, metadata, text) = embedded?;

    let ocr = if args.no_ocr {
        None
    } else {
        Some(run_ocr(&args.pdf, &config)?)
    };

    if let Some(report) = &ocr {
        for failure in &report.failures {
            warn!(page = failure.page_number, reason = %failure.reason, "OCR skipped a page");
        }
    }

    let output = ExtractOutput {
        source: args.pdf.display().to_string(),
        page_count,
        metadata,
        page: args.page,
        text,
        ocr,
    };

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &output)?;
        writeln!(out)?;
    } else {
        write_plain(out, &output)?;
    }
    Ok(())
}

fn read_embedded(
    reader: &PdfTextReader,
    page: Option<usize>,
) -> Result<(usize, DocumentMetadata, String)> {
    let page_count = reader.page_count()?;
    let metadata = reader.metadata()?;
    let text = match page {
        Some(index) => reader.page_text(index)?,
        None => reader.all_text()?,
    };
    Ok((page_count, metadata, text))
}

fn run_ocr(pdf: &Path, config: &ExtractConfig) -> Result<OcrReport> {
    if !PdftoppmRasterizer::new().is_available() {
        warn!("pdftoppm was not found on PATH; rasterization will fail");
    }
    if config.ocr_backend == OcrBackend::Tesseract && !TesseractCli::new().is_available() {
        warn!("tesseract was not found on PATH; OCR will fail");
    }

    let mut extractor = RasterOcrExtractor::from_config(pdf, config)?;
    let report = extractor
        .rasterize(config.dpi, config.format)
        .and_then(|_| extractor.extract_pages(&config.lang));

    if config.keep_images {
        info!(work_dir = %extractor.work_dir().path().display(), "Page images kept");
    } else if let Err(err) = extractor.cleanup() {
        // An OCR error is the more useful one to surface.
        if report.is_ok() {
            return Err(err.into());
        }
        warn!(error = %err, "Failed to remove page images");
    }

    Ok(report?)
}

fn write_plain(out: &mut impl Write, output: &ExtractOutput) -> std::io::Result<()> {
    writeln!(out, "Metadata:")?;
    for (key, value) in &output.metadata {
        writeln!(out, "  {key}: {value}")?;
    }
    writeln!(out)?;

    match output.page {
        Some(index) => writeln!(out, "Text (page {} of {}):", index + 1, output.page_count)?,
        None => writeln!(out, "Text ({} pages):", output.page_count)?,
    }
    writeln!(out, "{}", output.text)?;

    if let Some(report) = &output.ocr {
        writeln!(out)?;
        writeln!(out, "OCR:")?;
        write!(out, "{}", report.render())?;
    }
    Ok(())
}
