//! # Rasterizer
//!
//! Turns a style snapshot into an RGB pixel buffer:
//!
//! ```text
//! VisualNode ──svg::build_container──> SVG bytes
//!            ──RenderHost::load──────> loaded resource   (released on drop)
//!            ──RenderHost::draw──────> RasterSurface     (ceil(w × scale) × ceil(h × scale))
//! ```
//!
//! The image decode/draw primitive is a capability ([`RenderHost`]) so the
//! same pipeline can run against the in-process resvg renderer, a headless
//! browser, or an off-process render service.

use std::sync::{Arc, OnceLock};

use resvg::tiny_skia;
use resvg::usvg;
use tracing::{debug, trace};

use crate::error::{ExportError, Result};
use crate::snapshot::VisualNode;
use crate::svg;

/// An in-memory RGB pixel buffer, 3 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterSurface {
    /// Allocate a white surface. Both dimensions must be at least 1.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ExportError::EmptySnapshot { width, height });
        }
        if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
            return Err(ExportError::render(format!(
                "surface {}x{} exceeds {} pixels per side",
                width, height, MAX_SURFACE_SIDE
            )));
        }
        let len = width as usize * height as usize * 3;
        Ok(Self {
            width,
            height,
            data: vec![255; len],
        })
    }

    /// Wrap existing RGB samples.
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 {
            return Err(ExportError::EmptySnapshot { width, height });
        }
        if data.len() != expected {
            return Err(ExportError::invalid_input(format!(
                "RGB buffer size mismatch: expected {} bytes, got {}",
                expected,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.data[i], self.data[i + 1], self.data[i + 2]])
    }
}

/// Host-provided image decode and draw primitive.
///
/// A resource returned by [`load`](RenderHost::load) is always handed back
/// through [`release`](RenderHost::release) exactly once, whatever happens
/// in between.
pub trait RenderHost {
    type Resource;

    /// Decode container bytes into a drawable resource.
    fn load(&self, container: &[u8]) -> Result<Self::Resource>;

    /// Draw the resource stretched to cover the whole surface.
    fn draw(&self, resource: &Self::Resource, surface: &mut RasterSurface) -> Result<()>;

    /// Free whatever backs the resource.
    fn release(&self, resource: Self::Resource) {
        drop(resource);
    }
}

/// Returns a loaded resource to its host when dropped.
struct LoadedResource<'h, H: RenderHost> {
    host: &'h H,
    resource: Option<H::Resource>,
}

impl<'h, H: RenderHost> LoadedResource<'h, H> {
    fn load(host: &'h H, container: &[u8]) -> Result<Self> {
        let resource = host.load(container)?;
        Ok(Self {
            host,
            resource: Some(resource),
        })
    }

    fn draw(&self, surface: &mut RasterSurface) -> Result<()> {
        match &self.resource {
            Some(resource) => self.host.draw(resource, surface),
            None => Err(ExportError::render("resource already released")),
        }
    }
}

impl<H: RenderHost> Drop for LoadedResource<'_, H> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            trace!("releasing rendered container");
            self.host.release(resource);
        }
    }
}

/// Largest surface side in pixels. JPEG cannot describe anything wider.
pub const MAX_SURFACE_SIDE: u32 = 65535;

/// Pixel size of a `width × height` region drawn at `scale`.
///
/// Scale factors below 1 (and non-finite ones) are treated as 1. A region
/// that rounds to zero in either axis is an [`ExportError::EmptySnapshot`];
/// one wider or taller than [`MAX_SURFACE_SIDE`] is a render error.
pub fn surface_size(width: f64, height: f64, scale: f64) -> Result<(u32, u32)> {
    let scale = if scale.is_finite() { scale.max(1.0) } else { 1.0 };
    let to_px = |v: f64| -> Result<u32> {
        let px = (v * scale).ceil();
        if !px.is_finite() || px > MAX_SURFACE_SIDE as f64 {
            return Err(ExportError::render(format!(
                "region dimension {} at scale {} exceeds {} pixels",
                v, scale, MAX_SURFACE_SIDE
            )));
        }
        Ok(px.max(0.0) as u32)
    };
    let (w, h) = (to_px(width)?, to_px(height)?);
    if w == 0 || h == 0 {
        return Err(ExportError::EmptySnapshot {
            width: w,
            height: h,
        });
    }
    Ok((w, h))
}

/// Rasterize a snapshot at `scale` device pixels per CSS px.
pub fn rasterize<H: RenderHost>(snapshot: &VisualNode, scale: f64, host: &H) -> Result<RasterSurface> {
    let (width, height) = surface_size(snapshot.frame.width, snapshot.frame.height, scale)?;

    let resource = {
        let container = svg::build_container(snapshot)?;
        debug!(bytes = container.len(), "built SVG container");
        LoadedResource::load(host, &container)?
    };

    let mut surface = RasterSurface::new(width, height)?;
    resource.draw(&mut surface)?;
    debug!(width, height, "rasterized snapshot");
    Ok(surface)
}

/// In-process renderer backed by resvg.
pub struct ResvgHost {
    options: usvg::Options<'static>,
}

impl ResvgHost {
    /// A renderer with no fonts; text runs are skipped.
    pub fn new() -> Self {
        Self {
            options: usvg::Options::default(),
        }
    }

    /// A renderer using the system fonts, loaded once per process.
    pub fn with_system_fonts() -> Self {
        static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
        let fontdb = FONTS.get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            debug!(faces = db.len(), "loaded system fonts");
            Arc::new(db)
        });
        Self {
            options: usvg::Options {
                fontdb: Arc::clone(fontdb),
                ..usvg::Options::default()
            },
        }
    }
}

impl Default for ResvgHost {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderHost for ResvgHost {
    type Resource = usvg::Tree;

    fn load(&self, container: &[u8]) -> Result<usvg::Tree> {
        usvg::Tree::from_data(container, &self.options)
            .map_err(|e| ExportError::render(format!("failed to load SVG container: {}", e)))
    }

    fn draw(&self, tree: &usvg::Tree, surface: &mut RasterSurface) -> Result<()> {
        let mut pixmap = tiny_skia::Pixmap::new(surface.width(), surface.height())
            .ok_or_else(|| ExportError::render("unable to allocate pixel buffer"))?;
        pixmap.fill(tiny_skia::Color::WHITE);

        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            surface.width() as f32 / size.width(),
            surface.height() as f32 / size.height(),
        );
        resvg::render(tree, transform, &mut pixmap.as_mut());

        // The pixmap is opaque after the white fill, so premultiplied == straight.
        for (dst, src) in surface.data_mut().chunks_exact_mut(3).zip(pixmap.pixels()) {
            let c = src.demultiply();
            dst.copy_from_slice(&[c.red(), c.green(), c.blue()]);
        }
        Ok(())
    }
}
