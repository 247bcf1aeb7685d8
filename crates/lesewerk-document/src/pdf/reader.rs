// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF text reader — open a document and pull text and metadata straight out of
// its embedded text layer using the `lopdf` crate. No rendering involved.

use std::path::{Path, PathBuf};

use lesewerk_core::DocumentMetadata;
use lesewerk_core::error::LesewerkError;
use lopdf::{Dictionary, Document, Object};
use tracing::{debug, info, instrument, warn};

/// Reads the embedded text layer and Info dictionary of a PDF file.
///
/// The reader is bound to a path at construction and holds no document until
/// [`open`](Self::open) succeeds. Every extraction call checks that the
/// document is open and fails with [`LesewerkError::NotOpen`] otherwise, so
/// callers can also branch on [`is_open`](Self::is_open) up front.
///
/// ```ignore
/// let mut reader = PdfTextReader::new("invoice.pdf");
/// reader.open()?;
/// let text = reader.all_text()?;
/// reader.close();
/// ```
pub struct PdfTextReader {
    /// Path the reader was constructed with.
    path: PathBuf,
    /// The parsed document while open.
    document: Option<Document>,
}

impl PdfTextReader {
    // -- Lifecycle ------------------------------------------------------------

    /// Bind a reader to `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: None,
        }
    }

    /// Parse the document. Re-opening an open reader reloads it from disk.
    ///
    /// # Errors
    ///
    /// [`LesewerkError::NotFound`] when the path is not a readable file,
    /// [`LesewerkError::Open`] when it cannot be parsed as a PDF.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn open(&mut self) -> Result<(), LesewerkError> {
        if !self.path.is_file() {
            return Err(LesewerkError::NotFound(self.path.display().to_string()));
        }
        info!("Opening PDF: {}", self.path.display());

        let document = Document::load(&self.path).map_err(|err| {
            LesewerkError::Open(format!("failed to open {}: {}", self.path.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");
        self.document = Some(document);
        Ok(())
    }

    /// Release the document. Calling this on a closed reader does nothing.
    pub fn close(&mut self) {
        if self.document.take().is_some() {
            debug!(path = %self.path.display(), "PDF closed");
        }
    }

    pub fn is_open(&self) -> bool {
        self.document.is_some()
    }

    /// The path the reader was bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the open document.
    pub fn page_count(&self) -> Result<usize, LesewerkError> {
        Ok(self.document()?.get_pages().len())
    }

    /// Text layer of the page at zero-based `index`.
    ///
    /// Pages without a text layer yield an empty string.
    #[instrument(skip(self))]
    pub fn page_text(&self, index: usize) -> Result<String, LesewerkError> {
        let document = self.document()?;
        let page_count = document.get_pages().len();
        if index >= page_count {
            return Err(LesewerkError::OutOfRange { index, page_count });
        }
        extract_page_text(document, index)
    }

    /// Text of every page in order, joined by a single line break.
    ///
    /// A failure on any page fails the whole call.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn all_text(&self) -> Result<String, LesewerkError> {
        let document = self.document()?;
        let page_count = document.get_pages().len();

        let mut pages = Vec::with_capacity(page_count);
        for index in 0..page_count {
            pages.push(extract_page_text(document, index)?);
        }

        let text = pages.join("\n");
        info!(page_count, chars = text.len(), "Extracted embedded text");
        if text.trim().is_empty() {
            warn!("PDF has no extractable text layer; OCR may be required");
        }
        Ok(text)
    }

    /// Key-value pairs from the document's Info dictionary.
    ///
    /// Returns an empty map when the document declares no metadata.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn metadata(&self) -> Result<DocumentMetadata, LesewerkError> {
        let document = self.document()?;

        let info = match document.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => document.get_dictionary(*id).map_err(|err| {
                LesewerkError::Extraction(format!("cannot resolve Info dictionary: {}", err))
            })?,
            Ok(Object::Dictionary(dict)) => dict,
            Ok(_) => {
                return Err(LesewerkError::Extraction(
                    "trailer /Info is not a dictionary".to_string(),
                ));
            }
            Err(_) => {
                debug!("PDF declares no Info dictionary");
                return Ok(DocumentMetadata::new());
            }
        };

        let metadata = collect_metadata(document, info);
        debug!(entries = metadata.len(), "Metadata read");
        Ok(metadata)
    }

    // -- Helpers --------------------------------------------------------------

    fn document(&self) -> Result<&Document, LesewerkError> {
        self.document.as_ref().ok_or(LesewerkError::NotOpen)
    }
}

/// Extract one page's text layer. `index` must already be bounds-checked.
fn extract_page_text(document: &Document, index: usize) -> Result<String, LesewerkError> {
    // lopdf pages are keyed by 1-indexed page number.
    let page_number = index as u32 + 1;
    let text = document.extract_text(&[page_number]).map_err(|err| {
        LesewerkError::Extraction(format!("failed to read page {}: {}", index, err))
    })?;

    // lopdf terminates every text object with a newline.
    Ok(text.trim_end_matches(['\n', '\r']).to_string())
}

fn collect_metadata(document: &Document, info: &Dictionary) -> DocumentMetadata {
    let mut metadata = DocumentMetadata::new();
    for (key, value) in info.iter() {
        let value = match value {
            Object::Reference(id) => match document.get_object(*id) {
                Ok(resolved) => resolved,
                Err(err) => {
                    warn!(
                        key = %String::from_utf8_lossy(key),
                        %err,
                        "Skipping unresolvable metadata entry"
                    );
                    continue;
                }
            },
            other => other,
        };
        let key = String::from_utf8_lossy(key).into_owned();
        match object_to_string(value) {
            Some(text) => {
                metadata.insert(key, text);
            }
            None => debug!(%key, "Skipping metadata entry without a text form"),
        }
    }
    metadata
}

/// Render a PDF object as text. Arrays become `[a, b]`, dictionaries
/// `<</Key value>>`, references `N G R`. Streams yield `None`.
fn object_to_string(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::Integer(value) => Some(value.to_string()),
        Object::Real(value) => Some(value.to_string()),
        Object::Boolean(value) => Some(value.to_string()),
        Object::Null => Some(String::new()),
        Object::Reference((number, generation)) => Some(format!("{number} {generation} R")),
        Object::Array(items) => {
            let items: Vec<String> = items.iter().filter_map(object_to_string).collect();
            Some(format!("[{}]", items.join(", ")))
        }
        Object::Dictionary(dict) => {
            let entries: Vec<String> = dict
                .iter()
                .filter_map(|(key, value)| {
                    let value = object_to_string(value)?;
                    Some(format!("/{} {}", String::from_utf8_lossy(key), value))
                })
                .collect();
            Some(format!("<<{}>>", entries.join(" ")))
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, otherwise
/// PDFDocEncoding (treated as Latin-1).
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units = utf16
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]));
        return char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

impl std::fmt::Debug for PdfTextReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfTextReader")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}
