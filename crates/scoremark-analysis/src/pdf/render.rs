// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rasterizer — renders a score-report page to a pixel buffer using the
// pdfium library. Page geometry is expressed in PDF points (1/72 inch) and
// scaled to pixels by DPI/72.

use std::path::Path;

use image::DynamicImage;
use pdfium_render::prelude::*;
use scoremark_core::error::ScoremarkError;
use tracing::{debug, info, instrument};

/// PDF points per inch.
const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Default render resolution. High enough that a single indicator mark spans
/// tens of pixels and survives morphological cleanup.
pub const DEFAULT_DPI: u32 = 350;

/// Default page index analyzed when the caller does not specify one.
pub const DEFAULT_PAGE_INDEX: u16 = 0;

/// A single document page rendered to pixels.
///
/// Owned exclusively by the analysis call that produced it and discarded
/// after use.
pub struct RasterPage {
    /// Zero-based index of the source page.
    pub page_index: u16,
    /// The rendered pixel buffer.
    pub image: DynamicImage,
}

impl RasterPage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Renders score-report documents to raster pages.
///
/// Wraps a pdfium binding; construction fails with
/// [`ScoremarkError::Render`] when no pdfium library can be bound, and every
/// rendering problem (unreadable document, out-of-range page index) is
/// likewise fatal to the call — the caller falls back to a different
/// analysis path, rendering is never retried here.
pub struct PdfRasterizer {
    pdfium: Pdfium,
}

impl PdfRasterizer {
    /// Bind to the pdfium library (alongside the executable first, then the
    /// system library path).
    pub fn new() -> Result<Self, ScoremarkError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| {
                ScoremarkError::Render(format!("failed to bind pdfium library: {}", err))
            })?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Render one page of a PDF file at the given resolution.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display(), page_index, dpi))]
    pub fn render_file(
        &self,
        path: impl AsRef<Path>,
        page_index: u16,
        dpi: u32,
    ) -> Result<RasterPage, ScoremarkError> {
        let path = path.as_ref();
        let document = self.pdfium.load_pdf_from_file(path, None).map_err(|err| {
            ScoremarkError::Render(format!("failed to open {}: {}", path.display(), err))
        })?;
        self.render_page(&document, page_index, dpi)
    }

    /// Render one page from in-memory PDF bytes at the given resolution.
    #[instrument(skip(self, data), fields(bytes_len = data.len(), page_index, dpi))]
    pub fn render_bytes(
        &self,
        data: &[u8],
        page_index: u16,
        dpi: u32,
    ) -> Result<RasterPage, ScoremarkError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(data, None)
            .map_err(|err| {
                ScoremarkError::Render(format!("failed to load PDF from memory: {}", err))
            })?;
        self.render_page(&document, page_index, dpi)
    }

    /// Number of pages in a PDF file.
    pub fn page_count(&self, path: impl AsRef<Path>) -> Result<u16, ScoremarkError> {
        let path = path.as_ref();
        let document = self.pdfium.load_pdf_from_file(path, None).map_err(|err| {
            ScoremarkError::Render(format!("failed to open {}: {}", path.display(), err))
        })?;
        Ok(document.pages().len())
    }

    fn render_page(
        &self,
        document: &PdfDocument<'_>,
        page_index: u16,
        dpi: u32,
    ) -> Result<RasterPage, ScoremarkError> {
        let page_total = document.pages().len();
        if page_index >= page_total {
            return Err(ScoremarkError::Render(format!(
                "page {} out of range (document has {} pages)",
                page_index, page_total
            )));
        }

        let page = document.pages().get(page_index).map_err(|err| {
            ScoremarkError::Render(format!("failed to load page {}: {}", page_index, err))
        })?;

        let (target_width, target_height) =
            target_dimensions(page.width().value, page.height().value, dpi);
        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_target_height(target_height);

        let bitmap = page.render_with_config(&render_config).map_err(|err| {
            ScoremarkError::Render(format!("failed to render page {}: {}", page_index, err))
        })?;
        let image = bitmap.as_image();

        info!(
            page_index,
            width = image.width(),
            height = image.height(),
            "Page rendered"
        );
        debug!(dpi, target_width, target_height, "Render geometry");

        Ok(RasterPage { page_index, image })
    }
}

/// Pixel dimensions of a page rendered at `dpi`, scaling points by DPI/72.
/// Degenerate page geometry still yields at least one pixel per axis.
fn target_dimensions(width_pts: f32, height_pts: f32, dpi: u32) -> (i32, i32) {
    let scale = dpi as f32 / PDF_POINTS_PER_INCH;
    let width = ((width_pts * scale) as i32).max(1);
    let height = ((height_pts * scale) as i32).max(1);
    (width, height)
}
