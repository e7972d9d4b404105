//! # Image Encoding
//!
//! Compresses a [`RasterSurface`] into the byte form the PDF writer embeds.
//! The writer passes these bytes through untouched under `/DCTDecode`, so
//! every encoder must produce baseline JPEG (JFIF) data with 3 components
//! and 8 bits per component.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder as ImageJpegEncoder;
use image::{ColorType, ImageEncoder as _};
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::raster::RasterSurface;

/// Compressed image bytes plus the pixel size they decode to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// Wrap existing JPEG bytes, reading the dimensions from the stream
    /// without decoding pixels.
    pub fn from_jpeg(data: Vec<u8>) -> Result<Self> {
        if !is_jpeg(&data) {
            return Err(ExportError::invalid_input("data is not a JPEG stream"));
        }
        let reader = image::io::Reader::with_format(Cursor::new(&data), image::ImageFormat::Jpeg);
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| ExportError::invalid_input(format!("failed to read JPEG dimensions: {}", e)))?;
        Ok(Self {
            data,
            width,
            height,
        })
    }
}

fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
}

/// Compresses a raster surface. Implementations must be deterministic.
pub trait ImageEncoder {
    fn encode(&self, surface: &RasterSurface, quality: f32) -> Result<EncodedImage>;
}

/// Baseline JPEG encoder built on the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegEncoder;

/// Map a `0.0..=1.0` quality onto the encoder's `1..=100` scale.
pub fn jpeg_quality(quality: f32) -> Result<u8> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(ExportError::invalid_input(format!(
            "quality must be within 0.0..=1.0, got {}",
            quality
        )));
    }
    Ok((quality * 100.0).round().clamp(1.0, 100.0) as u8)
}

impl ImageEncoder for JpegEncoder {
    fn encode(&self, surface: &RasterSurface, quality: f32) -> Result<EncodedImage> {
        let quality = jpeg_quality(quality)?;
        let mut buf = Vec::new();
        let encoder = ImageJpegEncoder::new_with_quality(&mut buf, quality);
        encoder
            .write_image(surface.data(), surface.width(), surface.height(), ColorType::Rgb8)
            .map_err(|e| ExportError::encode(e.to_string()))?;
        debug!(bytes = buf.len(), quality, "encoded JPEG");
        Ok(EncodedImage {
            data: buf,
            width: surface.width(),
            height: surface.height(),
        })
    }
}
