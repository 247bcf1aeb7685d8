// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, contrast enhancement, crop, and encode for page
// images. Operates on in-memory images using the `image` and `imageproc`
// crates.

use std::path::Path;

use image::{DynamicImage, ImageBuffer, ImageFormat, Luma, LumaA, Rgb, Rgba};
use imageproc::stats::histogram;
use lesewerk_core::RasterFormat;
use lesewerk_core::error::LesewerkError;
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let enhanced = ImageProcessor::open("page_1.jpeg")?
///     .enhance_contrast(2.0)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LesewerkError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            LesewerkError::ImageProcessing(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying `DynamicImage`.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the processor and return the underlying `DynamicImage`.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    /// Mean luminance of the image, rounded to the nearest integer.
    pub fn mean_luma(&self) -> u8 {
        let gray = self.image.to_luma8();
        let counts = &histogram(&gray).channels[0];

        let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
        if total == 0 {
            return 0;
        }
        let weighted: u64 = counts
            .iter()
            .enumerate()
            .map(|(value, &count)| value as u64 * u64::from(count))
            .sum();
        ((weighted as f64 / total as f64) + 0.5).floor().min(255.0) as u8
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Scale contrast by `factor` around the image's mean luminance:
    /// `out = mean + factor * (in - mean)`, clamped to the channel range.
    ///
    /// Values > 1.0 increase contrast, values < 1.0 flatten it, 1.0 is a
    /// no-op. Alpha is left untouched and grayscale stays grayscale.
    #[instrument(skip(self))]
    pub fn enhance_contrast(self, factor: f32) -> Self {
        let mean = f32::from(self.mean_luma());
        info!(factor, mean, "Enhancing contrast");

        let adjust = |channel: u8| -> u8 {
            let val = mean + factor * (f32::from(channel) - mean);
            val.clamp(0.0, 255.0) as u8
        };

        let (width, height) = (self.image.width(), self.image.height());
        let enhanced = match &self.image {
            DynamicImage::ImageLuma8(gray) => {
                DynamicImage::ImageLuma8(ImageBuffer::from_fn(width, height, |x, y| {
                    let Luma([l]) = *gray.get_pixel(x, y);
                    Luma([adjust(l)])
                }))
            }
            DynamicImage::ImageLumaA8(gray) => {
                DynamicImage::ImageLumaA8(ImageBuffer::from_fn(width, height, |x, y| {
                    let LumaA([l, a]) = *gray.get_pixel(x, y);
                    LumaA([adjust(l), a])
                }))
            }
            other if other.color().has_alpha() => {
                let rgba = other.to_rgba8();
                DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| {
                    let Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
                    Rgba([adjust(r), adjust(g), adjust(b), a])
                }))
            }
            other => {
                let rgb = other.to_rgb8();
                DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
                    let Rgb([r, g, b]) = *rgb.get_pixel(x, y);
                    Rgb([adjust(r), adjust(g), adjust(b)])
                }))
            }
        };

        Self { image: enhanced }
    }

    /// Crop the box spanned by two corner points `(x1, y1)` and `(x2, y2)`.
    ///
    /// Corners may be given in any order; the box is clamped to the image.
    #[instrument(skip(self))]
    pub fn crop_box(self, x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Self, LesewerkError> {
        let (img_w, img_h) = (self.image.width(), self.image.height());

        let left = x1.min(x2).min(img_w);
        let top = y1.min(y2).min(img_h);
        let right = x1.max(x2).min(img_w);
        let bottom = y1.max(y2).min(img_h);

        if right == left || bottom == top {
            return Err(LesewerkError::ImageProcessing(format!(
                "crop box ({x1}, {y1}) - ({x2}, {y2}) is empty within a {img_w}x{img_h} image"
            )));
        }

        info!(left, top, right, bottom, "Cropping image");
        let cropped = self.image.crop_imm(left, top, right - left, bottom - top);
        Ok(Self { image: cropped })
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, LesewerkError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| {
                LesewerkError::ImageProcessing(format!("PNG encoding failed: {}", err))
            })?;
        Ok(buffer)
    }

    /// Write the image to a file. The format is inferred from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LesewerkError> {
        let format = ImageFormat::from_path(path.as_ref()).map_err(|err| {
            LesewerkError::ImageProcessing(format!(
                "cannot infer image format for {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        self.write(path.as_ref(), format)
    }

    /// Write the image to a file in an explicit raster format.
    pub fn save_as(
        &self,
        path: impl AsRef<Path>,
        format: RasterFormat,
    ) -> Result<(), LesewerkError> {
        self.write(path.as_ref(), image_format(format))
    }

    fn write(&self, path: &Path, format: ImageFormat) -> Result<(), LesewerkError> {
        // JPEG has no alpha channel.
        let flattened;
        let image = if format == ImageFormat::Jpeg && self.image.color().has_alpha() {
            flattened = DynamicImage::ImageRgb8(self.image.to_rgb8());
            &flattened
        } else {
            &self.image
        };

        image.save_with_format(path, format).map_err(|err| {
            LesewerkError::ImageProcessing(format!(
                "failed to save image to {}: {}",
                path.display(),
                err
            ))
        })
    }
}

fn image_format(format: RasterFormat) -> ImageFormat {
    match format {
        RasterFormat::Jpeg => ImageFormat::Jpeg,
        RasterFormat::Png => ImageFormat::Png,
        RasterFormat::Tiff => ImageFormat::Tiff,
        RasterFormat::Bmp => ImageFormat::Bmp,
    }
}
