// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixture builders shared by the unit tests.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma};
use lesewerk_core::error::LesewerkError;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use crate::scan::ocr::TextRecognizer;
use crate::scan::raster::PageRasterizer;

/// Content of one fixture page.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FixturePage<'a> {
    /// A page with an embedded text layer.
    Text(&'a str),
    /// A page with vector drawing only, like a scan without a text layer.
    Drawing,
}

/// Write a small PDF to `path` with one page per entry in `pages`.
pub(crate) fn write_pdf(path: &Path, pages: &[FixturePage<'_>], producer: Option<&str>) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let operations = match page {
            FixturePage::Text(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
            FixturePage::Drawing => vec![
                Operation::new("re", vec![72.into(), 72.into(), 200.into(), 100.into()]),
                Operation::new("f", vec![]),
            ],
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(producer) = producer {
        let info_id = doc.add_object(dictionary! {
            "Producer" => Object::string_literal(producer),
        });
        doc.trailer.set("Info", info_id);
    }

    doc.save(path).unwrap();
}

/// Uniform gray page whose width encodes the page number (`10 + n` pixels).
pub(crate) fn page_marker_image(page_number: u32) -> DynamicImage {
    let shade = (40 + page_number * 10).min(250) as u8;
    DynamicImage::ImageLuma8(GrayImage::from_pixel(10 + page_number, 8, Luma([shade])))
}

/// Rasterizer that draws [`page_marker_image`] instead of rendering.
pub(crate) struct MarkerRasterizer;

impl PageRasterizer for MarkerRasterizer {
    fn render_page(
        &self,
        _pdf: &Path,
        page_number: u32,
        _dpi: u32,
    ) -> Result<DynamicImage, LesewerkError> {
        Ok(page_marker_image(page_number))
    }
}

/// Rasterizer that always fails, like a missing `pdftoppm`.
pub(crate) struct BrokenRasterizer;

impl PageRasterizer for BrokenRasterizer {
    fn render_page(
        &self,
        _pdf: &Path,
        page_number: u32,
        _dpi: u32,
    ) -> Result<DynamicImage, LesewerkError> {
        Err(LesewerkError::Rasterization(format!(
            "renderer unavailable for page {page_number}"
        )))
    }
}

/// Recognizer that reports which page it saw, decoded from the image width.
/// Fails on the page listed in `fail_on`.
pub(crate) struct MarkerRecognizer {
    pub fail_on: Option<u32>,
}

impl TextRecognizer for MarkerRecognizer {
    fn recognize(&self, image: &DynamicImage, lang: &str) -> Result<String, LesewerkError> {
        let page_number = image.width() - 10;
        if self.fail_on == Some(page_number) {
            return Err(LesewerkError::Ocr(format!("unreadable page {page_number}")));
        }
        Ok(format!("marker {page_number} [{lang}]"))
    }
}
