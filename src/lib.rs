//! # snapdoc
//!
//! Exports an on-screen region (an invoice, a payment slip) as a downloadable
//! single-page PDF without any external document service.
//!
//! The region is captured as a picture, not as text: its resolved styles are
//! snapshotted, drawn into a pixel buffer, compressed to JPEG, and wrapped in
//! a hand-written PDF whose only page is that image.
//!
//! ## Architecture
//!
//! ```text
//! Live element tree
//!       ↓
//!   [snapshot] - Detached VisualNode tree with fully resolved styles
//!       ↓
//!   [raster]   - SVG container → RenderHost → RasterSurface (RGB)
//!       ↓
//!   [encode]   - Baseline JPEG bytes + pixel size
//!       ↓
//!   [pdf]      - Single forward pass PDF writer
//! ```
//!
//! Each stage either fully succeeds or the export aborts with one
//! [`ExportError`]. Exports share no state and can run on parallel threads.

pub mod encode;
pub mod error;
pub mod model;
pub mod pdf;
pub mod raster;
pub mod snapshot;
pub mod style;
pub mod svg;

use tracing::info;

pub use encode::{EncodedImage, ImageEncoder, JpegEncoder};
pub use error::{ExportError, Result};
pub use model::{Element, ExportOptions, Frame, Node, PageSize};
pub use pdf::{PdfWriter, FILE_EXTENSION, MIME_TYPE};
pub use raster::{RasterSurface, RenderHost, ResvgHost};
pub use snapshot::{LiveNode, VisualNode};

/// Runs the full pipeline with a chosen render host and image encoder.
pub struct Exporter<H = ResvgHost, E = JpegEncoder> {
    host: H,
    encoder: E,
    scale: f64,
}

impl Exporter {
    /// An exporter using resvg with system fonts and the JPEG encoder at scale 1.
    pub fn new() -> Self {
        Exporter {
            host: ResvgHost::with_system_fonts(),
            encoder: JpegEncoder,
            scale: 1.0,
        }
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: RenderHost, E: ImageEncoder> Exporter<H, E> {
    pub fn with_host<H2: RenderHost>(self, host: H2) -> Exporter<H2, E> {
        Exporter {
            host,
            encoder: self.encoder,
            scale: self.scale,
        }
    }

    pub fn with_encoder<E2: ImageEncoder>(self, encoder: E2) -> Exporter<H, E2> {
        Exporter {
            host: self.host,
            encoder,
            scale: self.scale,
        }
    }

    /// Device pixel ratio for rasterization. Values below 1 are treated as 1.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Export `region` as a PDF page `page_width_pt` points wide.
    pub fn export<N: LiveNode>(&self, region: &N, page_width_pt: f64, quality: f32) -> Result<Vec<u8>> {
        if !page_width_pt.is_finite() || page_width_pt <= 0.0 {
            return Err(ExportError::invalid_input(format!(
                "page width must be a positive number of points, got {}",
                page_width_pt
            )));
        }
        encode::jpeg_quality(quality)?;

        let snapshot = snapshot::capture(region)?;
        let surface = raster::rasterize(&snapshot, self.scale, &self.host)?;
        drop(snapshot);

        let encoded = self.encoder.encode(&surface, quality)?;
        let reported = (encoded.width, encoded.height);
        // The writer embeds the bytes under /DCTDecode, so they must be JPEG
        // and their header must agree with the surface.
        let image = EncodedImage::from_jpeg(encoded.data)
            .map_err(|e| ExportError::encode(format!("encoder output rejected: {}", e)))?;
        let expected = (surface.width(), surface.height());
        for (w, h) in [reported, (image.width, image.height)] {
            if (w, h) != expected {
                return Err(ExportError::encode(format!(
                    "encoder produced {}x{} for a {}x{} surface",
                    w, h, expected.0, expected.1
                )));
            }
        }
        drop(surface);

        let bytes = PdfWriter::new().write(&image, page_width_pt)?;
        info!(
            bytes = bytes.len(),
            width = image.width,
            height = image.height,
            "exported region"
        );
        Ok(bytes)
    }
}

/// Export `region` with the default host, the JPEG encoder and scale 1.
pub fn export_as_document<N: LiveNode>(region: &N, page_width_pt: f64, quality: f32) -> Result<Vec<u8>> {
    Exporter::new().export(region, page_width_pt, quality)
}

/// Export a region element using [`ExportOptions`].
pub fn export_region(region: &Element, options: &ExportOptions) -> Result<Vec<u8>> {
    Exporter::new()
        .with_scale(options.scale)
        .export(&region.live(), options.page_width_pt(), options.quality)
}
