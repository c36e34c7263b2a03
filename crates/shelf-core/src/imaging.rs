//! Cover image processing
//!
//! The asset store hands every imported cover to a [`CoverProcessor`]. The
//! processor may fail for any reason (unknown format, truncated file,
//! unsupported color type); the asset store then copies the file verbatim.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, ImageFormat};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::settings::Settings;

/// Errors from the image collaborator
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Re-encodes a cover image into the asset store
pub trait CoverProcessor {
    /// Produce a processed copy of `source` at `destination`
    ///
    /// # Errors
    /// Returns an error if the image cannot be decoded or written
    fn process(
        &self,
        source: &Path,
        destination: &Path,
        settings: &Settings,
    ) -> Result<(), ProcessError>;
}

/// Shrinks covers to fit the configured bounds and re-encodes them in the
/// destination's format
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer;

impl CoverProcessor for ImageResizer {
    fn process(
        &self,
        source: &Path,
        destination: &Path,
        settings: &Settings,
    ) -> Result<(), ProcessError> {
        let img = fit_within(image::open(source)?, settings.max_width, settings.max_height);
        let format = ImageFormat::from_path(destination)?;

        let mut out = BufWriter::new(File::create(destination)?);
        match format {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut out, settings.jpeg_quality());
                // JPEG has no alpha channel
                DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
            }
            ImageFormat::Png => {
                let compression = if settings.optimize {
                    CompressionType::Best
                } else {
                    CompressionType::Default
                };
                let encoder = PngEncoder::new_with_quality(&mut out, compression, FilterType::Adaptive);
                img.write_with_encoder(encoder)?;
            }
            other => img.write_to(&mut out, other)?,
        }
        out.flush()?;

        Ok(())
    }
}

/// Copies covers byte for byte
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCopy;

impl CoverProcessor for PlainCopy {
    fn process(&self, source: &Path, destination: &Path, _: &Settings) -> Result<(), ProcessError> {
        std::fs::copy(source, destination)?;
        Ok(())
    }
}

/// Shrink `img` to fit within the bounds, keeping its aspect ratio; images
/// that already fit are never enlarged. A zero bound means unbounded.
fn fit_within(img: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let max_width = if max_width == 0 { u32::MAX } else { max_width };
    let max_height = if max_height == 0 { u32::MAX } else { max_height };

    if img.width() <= max_width && img.height() <= max_height {
        img
    } else {
        img.thumbnail(max_width.min(img.width()), max_height.min(img.height()))
    }
}
