// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster OCR extractor — rasterize every page into a working directory,
// enhance contrast, and run OCR page by page.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use lesewerk_core::config::ExtractConfig;
use lesewerk_core::error::LesewerkError;
use lesewerk_core::{
    ExtractorState, OcrBackend, OcrErrorPolicy, OcrPage, OcrReport, PageFailure, RasterFormat,
};
use lopdf::Document;
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;
use crate::scan::ocr::{TesseractCli, TextRecognizer};
use crate::scan::raster::{PageRasterizer, PdftoppmRasterizer};
use crate::scan::workdir::{PageImage, WorkDir};

/// Contrast multiplier applied to every page before OCR.
pub const CONTRAST_FACTOR: f32 = 2.0;

/// Produces OCR text for documents whose embedded text layer is missing or
/// unreliable.
///
/// Lifecycle: [`Created`](ExtractorState::Created) →
/// [`Rasterized`](ExtractorState::Rasterized) (repeatable) →
/// [`CleanedUp`](ExtractorState::CleanedUp). OCR is only valid once pages are
/// rasterized. [`rasterize`](Self::rasterize) after cleanup recreates the
/// working directory.
///
/// The working directory is owned by this instance. If it still exists when
/// the extractor is dropped it is removed, unless
/// [`keep_images`](Self::keep_images) was requested.
pub struct RasterOcrExtractor {
    source: PathBuf,
    work_dir: WorkDir,
    state: ExtractorState,
    rasterizer: Box<dyn PageRasterizer>,
    recognizer: Box<dyn TextRecognizer>,
    error_policy: OcrErrorPolicy,
    keep_images: bool,
}

impl RasterOcrExtractor {
    // -- Construction ---------------------------------------------------------

    /// Extractor for `source` with a unique working directory under the
    /// current directory, `pdftoppm` for rendering and `tesseract` for OCR.
    pub fn new(source: impl Into<PathBuf>) -> Result<Self, LesewerkError> {
        Self::with_work_dir(source, WorkDir::unique_in_current_dir()?)
    }

    /// Extractor for `source` using an explicit working directory, which is
    /// created if absent. Page images already present in it are picked up, so
    /// a kept directory can be OCR'd again without re-rendering.
    ///
    /// Cleanup deletes the whole directory, so an existing directory holding
    /// anything besides page images is refused with [`LesewerkError::Config`].
    #[instrument(skip_all, fields(work_dir = %work_dir.path().display()))]
    pub fn with_work_dir(
        source: impl Into<PathBuf>,
        work_dir: WorkDir,
    ) -> Result<Self, LesewerkError> {
        let source = source.into();
        let foreign = work_dir.foreign_entries()?;
        if let Some(first) = foreign.first() {
            return Err(LesewerkError::Config(format!(
                "working directory {} holds {} entries besides page images, e.g. {}",
                work_dir.path().display(),
                foreign.len(),
                first.display()
            )));
        }
        work_dir.ensure()?;
        let existing = work_dir.page_images()?.len();
        let state = if existing > 0 {
            info!(existing, "Reusing rasterized pages found in working directory");
            ExtractorState::Rasterized
        } else {
            ExtractorState::Created
        };

        Ok(Self {
            source,
            work_dir,
            state,
            rasterizer: Box::new(PdftoppmRasterizer::new()),
            recognizer: Box::new(TesseractCli::new()),
            error_policy: OcrErrorPolicy::default(),
            keep_images: false,
        })
    }

    /// Extractor configured from an [`ExtractConfig`]: working directory,
    /// OCR backend, error policy, and image retention.
    pub fn from_config(
        source: impl Into<PathBuf>,
        config: &ExtractConfig,
    ) -> Result<Self, LesewerkError> {
        config.validate()?;
        let work_dir = match &config.work_dir {
            Some(path) => WorkDir::at(path),
            None => WorkDir::unique_in_current_dir()?,
        };

        let recognizer: Box<dyn TextRecognizer> = match config.ocr_backend {
            OcrBackend::Tesseract => Box::new(TesseractCli::new()),
            #[cfg(feature = "ocrs")]
            OcrBackend::Ocrs => {
                Box::new(crate::scan::ocrs_backend::OcrsRecognizer::with_defaults()?)
            }
            #[cfg(not(feature = "ocrs"))]
            OcrBackend::Ocrs => {
                return Err(LesewerkError::Config(
                    "the ocrs backend requires building with the `ocrs` feature".to_string(),
                ));
            }
        };

        let mut extractor = Self::with_work_dir(source, work_dir)?
            .with_error_policy(config.error_policy)
            .keep_images(config.keep_images);
        extractor.recognizer = recognizer;
        Ok(extractor)
    }

    /// Replace the page renderer.
    pub fn with_rasterizer(mut self, rasterizer: impl PageRasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    /// Replace the text recognizer.
    pub fn with_recognizer(mut self, recognizer: impl TextRecognizer + 'static) -> Self {
        self.recognizer = Box::new(recognizer);
        self
    }

    pub fn with_error_policy(mut self, policy: OcrErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Leave page images on disk when the extractor is dropped.
    pub fn keep_images(mut self, keep: bool) -> Self {
        self.keep_images = keep;
        self
    }

    // -- Accessors ------------------------------------------------------------

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn work_dir(&self) -> &WorkDir {
        &self.work_dir
    }

    pub fn state(&self) -> ExtractorState {
        self.state
    }

    // -- Pipeline -------------------------------------------------------------

    /// Render every page of the source document into the working directory as
    /// `page_<N>.<ext>`.
    ///
    /// Page images from earlier runs are replaced, so the directory always
    /// holds exactly one image per page of the current document.
    #[instrument(skip(self), fields(source = %self.source.display()))]
    pub fn rasterize(
        &mut self,
        dpi: u32,
        format: RasterFormat,
    ) -> Result<Vec<PageImage>, LesewerkError> {
        if dpi == 0 {
            return Err(LesewerkError::Rasterization("dpi must be positive".to_string()));
        }

        let page_count = count_pages(&self.source)?;
        info!(page_count, dpi, %format, "Rasterizing PDF");

        self.work_dir
            .ensure()
            .map_err(|err| LesewerkError::Rasterization(err.to_string()))?;
        let stale = self
            .work_dir
            .clear_pages()
            .map_err(|err| LesewerkError::Rasterization(err.to_string()))?;
        if stale > 0 {
            debug!(stale, "Removed page images from a previous run");
        }
        // Until every page is written the directory is not a complete set.
        self.state = ExtractorState::Created;

        let mut written = Vec::with_capacity(page_count as usize);
        for page_number in 1..=page_count {
            let image = self.rasterizer.render_page(&self.source, page_number, dpi)?;
            let path = self.work_dir.page_path(page_number, format);
            ImageProcessor::from_dynamic(image)
                .save_as(&path, format)
                .map_err(|err| {
                    LesewerkError::Rasterization(format!("page {}: {}", page_number, err))
                })?;
            debug!(page_number, path = %path.display(), "Page image written");
            written.push(PageImage { page_number, path });
        }

        self.state = ExtractorState::Rasterized;
        info!(pages = written.len(), "Rasterization complete");
        Ok(written)
    }

    /// Load the image at `image_path` and return a copy with contrast doubled
    /// around its mean luminance. The file on disk is not modified.
    pub fn enhance_contrast(image_path: impl AsRef<Path>) -> Result<DynamicImage, LesewerkError> {
        Ok(ImageProcessor::open(image_path)?
            .enhance_contrast(CONTRAST_FACTOR)
            .into_dynamic())
    }

    /// OCR every rasterized page in ascending page order.
    ///
    /// Under [`OcrErrorPolicy::FailFast`] the first failing page aborts the
    /// call with [`LesewerkError::Ocr`]; under
    /// [`OcrErrorPolicy::Continue`] failures are collected in the report.
    #[instrument(skip(self), fields(source = %self.source.display()))]
    pub fn extract_pages(&self, lang: &str) -> Result<OcrReport, LesewerkError> {
        let pages = self.rasterized_pages()?;
        info!(pages = pages.len(), "Running OCR");

        let mut report = OcrReport::default();
        for page in pages {
            let result = Self::enhance_contrast(&page.path)
                .and_then(|image| self.recognizer.recognize(&image, lang));

            match result {
                Ok(text) => {
                    debug!(page_number = page.page_number, chars = text.len(), "Page recognised");
                    report.pages.push(OcrPage {
                        page_number: page.page_number,
                        text,
                    });
                }
                Err(err) => {
                    let reason = failure_reason(err);
                    match self.error_policy {
                        OcrErrorPolicy::FailFast => {
                            return Err(LesewerkError::Ocr(format!(
                                "page {}: {}",
                                page.page_number, reason
                            )));
                        }
                        OcrErrorPolicy::Continue => {
                            warn!(
                                page_number = page.page_number,
                                %reason,
                                "OCR failed, continuing"
                            );
                            report.failures.push(PageFailure {
                                page_number: page.page_number,
                                reason,
                            });
                        }
                    }
                }
            }
        }

        info!(
            recognised = report.pages.len(),
            failed = report.failures.len(),
            "OCR complete"
        );
        Ok(report)
    }

    /// OCR every rasterized page and render one `Page <N>:` block per page.
    pub fn extract_text(&self, lang: &str) -> Result<String, LesewerkError> {
        Ok(self.extract_pages(lang)?.render())
    }

    /// Remove every file in the working directory and the directory itself.
    ///
    /// Calling this when the directory is already gone is a no-op.
    #[instrument(skip(self), fields(work_dir = %self.work_dir.path().display()))]
    pub fn cleanup(&mut self) -> Result<(), LesewerkError> {
        self.work_dir.remove()?;
        self.state = ExtractorState::CleanedUp;
        Ok(())
    }

    // -- Helpers --------------------------------------------------------------

    fn rasterized_pages(&self) -> Result<Vec<PageImage>, LesewerkError> {
        let not_rasterized =
            || LesewerkError::NotRasterized(self.work_dir.path().display().to_string());

        if self.state != ExtractorState::Rasterized {
            return Err(not_rasterized());
        }
        let pages = self.work_dir.page_images()?;
        if pages.is_empty() {
            return Err(not_rasterized());
        }
        Ok(pages)
    }
}

impl Drop for RasterOcrExtractor {
    fn drop(&mut self) {
        if self.keep_images || self.state == ExtractorState::CleanedUp {
            return;
        }
        if let Err(err) = self.work_dir.remove() {
            warn!(%err, "Failed to remove working directory on drop");
        }
    }
}

impl std::fmt::Debug for RasterOcrExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterOcrExtractor")
            .field("source", &self.source)
            .field("work_dir", &self.work_dir)
            .field("state", &self.state)
            .field("error_policy", &self.error_policy)
            .field("keep_images", &self.keep_images)
            .finish()
    }
}

fn count_pages(source: &Path) -> Result<u32, LesewerkError> {
    let document = Document::load(source).map_err(|err| {
        LesewerkError::Rasterization(format!("cannot load {}: {}", source.display(), err))
    })?;
    Ok(document.get_pages().len() as u32)
}

/// Message of an OCR or image error without the variant's own prefix.
fn failure_reason(err: LesewerkError) -> String {
    match err {
        LesewerkError::Ocr(detail) | LesewerkError::ImageProcessing(detail) => detail,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        BrokenRasterizer, FixturePage, MarkerRasterizer, MarkerRecognizer, write_pdf,
    };

    struct Fixture {
        // Held for its Drop.
        _root: tempfile::TempDir,
        pdf: PathBuf,
        work_dir: WorkDir,
    }

    fn fixture(page_count: usize) -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let pdf = root.path().join("scan.pdf");
        let pages = vec![FixturePage::Drawing; page_count];
        write_pdf(&pdf, &pages, None);
        let work_dir = WorkDir::unique_in(root.path());
        Fixture { _root: root, pdf, work_dir }
    }

    fn make_extractor(fixture: &Fixture, fail_on: Option<u32>) -> RasterOcrExtractor {
        RasterOcrExtractor::with_work_dir(&fixture.pdf, fixture.work_dir.clone())
            .unwrap()
            .with_rasterizer(MarkerRasterizer)
            .with_recognizer(MarkerRecognizer { fail_on })
    }

    fn file_names(work_dir: &WorkDir) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(work_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn construction_creates_working_directory() {
        let fx = fixture(1);
        let extractor = make_extractor(&fx, None);
        assert!(fx.work_dir.exists());
        assert_eq!(extractor.state(), ExtractorState::Created);
    }

    #[test]
    fn rasterize_writes_one_file_per_page() {
        let fx = fixture(3);
        let mut extractor = make_extractor(&fx, None);

        let written = extractor.rasterize(150, RasterFormat::Png).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(file_names(&fx.work_dir), ["page_1.png", "page_2.png", "page_3.png"]);
        assert_eq!(extractor.state(), ExtractorState::Rasterized);
    }

    #[test]
    fn rasterize_default_format_uses_jpeg_extension() {
        let fx = fixture(1);
        let mut extractor = make_extractor(&fx, None);
        extractor.rasterize(300, RasterFormat::default()).unwrap();
        assert_eq!(file_names(&fx.work_dir), ["page_1.jpeg"]);
    }

    #[test]
    fn rerasterizing_in_another_format_replaces_pages() {
        let fx = fixture(2);
        let mut extractor = make_extractor(&fx, None);
        extractor.rasterize(150, RasterFormat::Jpeg).unwrap();
        extractor.rasterize(150, RasterFormat::Png).unwrap();
        assert_eq!(file_names(&fx.work_dir), ["page_1.png", "page_2.png"]);
    }

    #[test]
    fn renderer_failure_is_rasterization_error() {
        let fx = fixture(1);
        let mut extractor = make_extractor(&fx, None).with_rasterizer(BrokenRasterizer);
        assert!(matches!(
            extractor.rasterize(150, RasterFormat::Png),
            Err(LesewerkError::Rasterization(_))
        ));
        assert_eq!(extractor.state(), ExtractorState::Created);
    }

    #[test]
    fn unreadable_source_is_rasterization_error() {
        let fx = fixture(1);
        std::fs::write(&fx.pdf, b"garbage").unwrap();
        let mut extractor = make_extractor(&fx, None);
        assert!(matches!(
            extractor.rasterize(150, RasterFormat::Png),
            Err(LesewerkError::Rasterization(_))
        ));
    }

    #[test]
    fn extract_before_rasterize_fails() {
        let fx = fixture(1);
        let extractor = make_extractor(&fx, None);
        assert!(matches!(
            extractor.extract_text("eng"),
            Err(LesewerkError::NotRasterized(_))
        ));
    }

    #[test]
    fn extract_text_labels_pages_in_numeric_order() {
        let fx = fixture(11);
        let mut extractor = make_extractor(&fx, None);
        extractor.rasterize(72, RasterFormat::Png).unwrap();

        let text = extractor.extract_text("eng").unwrap();
        let labels: Vec<&str> = text.lines().filter(|l| l.starts_with("Page ")).collect();
        let expected: Vec<String> = (1..=11).map(|n| format!("Page {n}:")).collect();
        assert_eq!(labels, expected);
        assert!(text.contains("Page 2:\nmarker 2 [eng]\n"));
        assert!(text.contains("Page 10:\nmarker 10 [eng]\n"));
    }

    #[test]
    fn fail_fast_aborts_on_bad_page() {
        let fx = fixture(3);
        let mut extractor = make_extractor(&fx, Some(2));
        extractor.rasterize(72, RasterFormat::Png).unwrap();

        match extractor.extract_text("eng") {
            Err(LesewerkError::Ocr(detail)) => assert!(detail.starts_with("page 2:")),
            other => panic!("expected Ocr error, got {other:?}"),
        }
    }

    #[test]
    fn continue_policy_collects_failures() {
        let fx = fixture(3);
        let mut extractor =
            make_extractor(&fx, Some(2)).with_error_policy(OcrErrorPolicy::Continue);
        extractor.rasterize(72, RasterFormat::Png).unwrap();

        let report = extractor.extract_pages("eng").unwrap();
        let recognised: Vec<u32> = report.pages.iter().map(|p| p.page_number).collect();
        assert_eq!(recognised, [1, 3]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].page_number, 2);
        assert!(!report.is_complete());
    }

    #[test]
    fn corrupt_page_image_is_ocr_error() {
        let fx = fixture(1);
        let mut extractor = make_extractor(&fx, None);
        extractor.rasterize(72, RasterFormat::Png).unwrap();
        std::fs::write(fx.work_dir.page_path(1, RasterFormat::Png), b"not a png").unwrap();

        assert!(matches!(extractor.extract_text("eng"), Err(LesewerkError::Ocr(_))));
    }

    #[test]
    fn refuses_directory_holding_other_files() {
        let fx = fixture(1);
        fx.work_dir.ensure().unwrap();
        let thesis = fx.work_dir.path().join("thesis.docx");
        std::fs::write(&thesis, b"years of work").unwrap();

        let result = RasterOcrExtractor::with_work_dir(&fx.pdf, fx.work_dir.clone());
        assert!(matches!(result, Err(LesewerkError::Config(_))));
        drop(result);
        assert!(thesis.exists());

        let config = ExtractConfig {
            work_dir: Some(fx.work_dir.path().to_path_buf()),
            ..ExtractConfig::default()
        };
        assert!(RasterOcrExtractor::from_config(&fx.pdf, &config).is_err());
        assert!(thesis.exists());
    }

    #[test]
    fn enhance_contrast_leaves_source_untouched() {
        let fx = fixture(1);
        let mut extractor = make_extractor(&fx, None);
        let written = extractor.rasterize(72, RasterFormat::Png).unwrap();
        let before = std::fs::read(&written[0].path).unwrap();

        let _ = RasterOcrExtractor::enhance_contrast(&written[0].path).unwrap();
        assert_eq!(std::fs::read(&written[0].path).unwrap(), before);
    }

    #[test]
    fn enhance_contrast_rejects_non_images() {
        let fx = fixture(1);
        let bogus = fx.work_dir.path().join("bogus.png");
        std::fs::create_dir_all(fx.work_dir.path()).unwrap();
        std::fs::write(&bogus, b"nope").unwrap();
        assert!(matches!(
            RasterOcrExtractor::enhance_contrast(&bogus),
            Err(LesewerkError::ImageProcessing(_))
        ));
    }

    #[test]
    fn cleanup_removes_directory_and_rasterize_recreates_it() {
        let fx = fixture(2);
        let mut extractor = make_extractor(&fx, None);
        extractor.rasterize(72, RasterFormat::Png).unwrap();

        extractor.cleanup().unwrap();
        assert!(!fx.work_dir.exists());
        assert_eq!(extractor.state(), ExtractorState::CleanedUp);
        assert!(matches!(
            extractor.extract_text("eng"),
            Err(LesewerkError::NotRasterized(_))
        ));
        // Idempotent.
        extractor.cleanup().unwrap();

        extractor.rasterize(72, RasterFormat::Png).unwrap();
        assert!(fx.work_dir.exists());
        assert_eq!(extractor.work_dir().page_images().unwrap().len(), 2);
    }

    #[test]
    fn drop_removes_directory_unless_kept() {
        let fx = fixture(1);
        {
            let mut extractor = make_extractor(&fx, None);
            extractor.rasterize(72, RasterFormat::Png).unwrap();
        }
        assert!(!fx.work_dir.exists());

        {
            let mut extractor = make_extractor(&fx, None).keep_images(true);
            extractor.rasterize(72, RasterFormat::Png).unwrap();
        }
        assert!(fx.work_dir.exists());

        // A kept directory is picked up as already rasterized.
        let reopened = make_extractor(&fx, None);
        assert_eq!(reopened.state(), ExtractorState::Rasterized);
        assert!(reopened.extract_text("eng").unwrap().contains("marker 1"));
    }

    #[test]
    fn from_config_honours_work_dir_and_policy() {
        let fx = fixture(1);
        let config = ExtractConfig {
            work_dir: Some(fx.work_dir.path().to_path_buf()),
            error_policy: OcrErrorPolicy::Continue,
            keep_images: true,
            ..ExtractConfig::default()
        };
        let extractor = RasterOcrExtractor::from_config(&fx.pdf, &config).unwrap();
        assert_eq!(extractor.work_dir(), &fx.work_dir);
        assert_eq!(extractor.error_policy, OcrErrorPolicy::Continue);
        assert!(extractor.keep_images);
    }

    #[test]
    #[ignore = "requires pdftoppm and tesseract (with eng data) on PATH"]
    fn renders_and_recognises_with_real_tools() {
        let root = tempfile::tempdir().unwrap();
        let pdf = root.path().join("two-pages.pdf");
        write_pdf(&pdf, &[FixturePage::Text("HELLO"), FixturePage::Text("WORLD")], None);

        let mut extractor =
            RasterOcrExtractor::with_work_dir(&pdf, WorkDir::unique_in(root.path())).unwrap();
        extractor.rasterize(300, RasterFormat::Png).unwrap();

        let report = extractor.extract_pages("eng").unwrap();
        assert_eq!(report.pages.len(), 2);
        assert!(report.pages[0].text.contains("HELLO"));
        assert!(report.pages[1].text.contains("WORLD"));
        extractor.cleanup().unwrap();
    }
}
