// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Working directory for rasterized pages.
//
// Page images are stored as `page_<N>.<ext>` with N the 1-based page number.
// Only one extractor may use a given directory at a time: two writers would
// overwrite each other's `page_<N>` files without any detection.

use std::path::{Path, PathBuf};

use lesewerk_core::RasterFormat;
use lesewerk_core::error::LesewerkError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prefix for directories created by [`WorkDir::unique_in`].
const UNIQUE_DIR_PREFIX: &str = "lesewerk-pages-";

/// One rasterized page on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-based page number parsed from the filename.
    pub page_number: u32,
    pub path: PathBuf,
}

/// A directory holding one image per rasterized page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// Use exactly `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A fresh, randomly named directory inside `parent`.
    pub fn unique_in(parent: impl AsRef<Path>) -> Self {
        let name = format!("{}{}", UNIQUE_DIR_PREFIX, Uuid::new_v4().simple());
        Self {
            path: parent.as_ref().join(name),
        }
    }

    /// A fresh, randomly named directory inside the process's current directory.
    pub fn unique_in_current_dir() -> Result<Self, LesewerkError> {
        Ok(Self::unique_in(std::env::current_dir()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Create the directory (and parents) if absent.
    pub fn ensure(&self) -> Result<(), LesewerkError> {
        if !self.exists() {
            std::fs::create_dir_all(&self.path)?;
            debug!(path = %self.path.display(), "Working directory created");
        }
        Ok(())
    }

    /// Where page `page_number` is stored in `format`.
    pub fn page_path(&self, page_number: u32, format: RasterFormat) -> PathBuf {
        self.path
            .join(format!("page_{}.{}", page_number, format.extension()))
    }

    /// Every page image in the directory, sorted numerically by page number
    /// (`page_2` before `page_10`). A missing directory has no pages.
    pub fn page_images(&self) -> Result<Vec<PageImage>, LesewerkError> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let parsed = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_page_file_name);
            match parsed {
                Some(page_number) => pages.push(PageImage { page_number, path }),
                None => debug!(path = %path.display(), "Ignoring non-page file"),
            }
        }

        pages.sort_by(|a, b| {
            a.page_number
                .cmp(&b.page_number)
                .then_with(|| a.path.cmp(&b.path))
        });
        Ok(pages)
    }

    /// Entries that are not page images: other files and subdirectories.
    /// A missing directory has none.
    pub fn foreign_entries(&self) -> Result<Vec<PathBuf>, LesewerkError> {
        if !self.exists() {
            return Ok(Vec::new());
        }

        let mut foreign = Vec::new();
        for entry in std::fs::read_dir(&self.path)? {
            let path = entry?.path();
            let is_page = path.is_file()
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .and_then(parse_page_file_name)
                    .is_some();
            if !is_page {
                foreign.push(path);
            }
        }
        foreign.sort();
        Ok(foreign)
    }

    /// Delete every page image, keeping the directory and any other files.
    pub fn clear_pages(&self) -> Result<usize, LesewerkError> {
        let pages = self.page_images()?;
        for page in &pages {
            remove_file(&page.path)?;
        }
        Ok(pages.len())
    }

    /// Delete every file in the directory, then the directory itself.
    ///
    /// Stops at the first file that cannot be removed and names it in the
    /// error; the directory is left in place in that case. Removing a
    /// directory that does not exist is a no-op.
    pub fn remove(&self) -> Result<(), LesewerkError> {
        self.remove_with(|path| std::fs::remove_file(path))
    }

    fn remove_with(
        &self,
        mut remove_file: impl FnMut(&Path) -> std::io::Result<()>,
    ) -> Result<(), LesewerkError> {
        if !self.exists() {
            debug!(path = %self.path.display(), "Working directory already absent");
            return Ok(());
        }

        let entries = std::fs::read_dir(&self.path).map_err(|err| cleanup_error(&self.path, err))?;
        let mut removed = 0usize;
        for entry in entries {
            let entry = entry.map_err(|err| cleanup_error(&self.path, err))?;
            let path = entry.path();
            if path.is_dir() {
                warn!(path = %path.display(), "Leaving foreign subdirectory in working directory");
                continue;
            }
            remove_file(&path).map_err(|err| cleanup_error(&path, err))?;
            removed += 1;
        }

        std::fs::remove_dir(&self.path).map_err(|err| cleanup_error(&self.path, err))?;
        info!(path = %self.path.display(), removed, "Working directory removed");
        Ok(())
    }
}

/// Parse `page_<N>.<ext>` into `N` for known raster extensions.
pub fn parse_page_file_name(name: &str) -> Option<u32> {
    let (stem, ext) = name.rsplit_once('.')?;
    RasterFormat::from_extension(ext)?;
    let digits = stem.strip_prefix("page_")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&n| n > 0)
}

fn remove_file(path: &Path) -> Result<(), LesewerkError> {
    std::fs::remove_file(path).map_err(|err| cleanup_error(path, err))
}

fn cleanup_error(path: &Path, err: std::io::Error) -> LesewerkError {
    LesewerkError::Cleanup {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
