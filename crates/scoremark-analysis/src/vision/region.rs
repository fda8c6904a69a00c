// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Region extractor — crops the rendered page to the indicator panel and
// splits it into the two section halves.

use image::{DynamicImage, GrayImage, Luma};
use scoremark_core::config::CropFractions;
use tracing::{debug, instrument, warn};

/// The indicator panel split at its horizontal midpoint.
///
/// The left half carries the Reading & Writing domain strips, the right
/// half the Math strips.
pub struct PanelHalves {
    pub left: DynamicImage,
    pub right: DynamicImage,
}

/// Crop `page` to the indicator panel described by fractional bounds.
///
/// Bounds are normalized first (clamped into `[0, 1]`, inverted pairs
/// swapped), then scaled to pixel coordinates, so the crop rectangle is
/// always valid. A zero-area rectangle degrades to a 1×1 placeholder
/// instead of failing.
#[instrument(skip(page, crop), fields(width = page.width(), height = page.height()))]
pub fn extract_panel(page: &DynamicImage, crop: CropFractions) -> DynamicImage {
    let crop = crop.normalized();
    let (width, height) = (page.width(), page.height());

    let x1 = (crop.x1 * width as f64).round() as u32;
    let x2 = ((crop.x2 * width as f64).round() as u32).min(width);
    let y1 = (crop.y1 * height as f64).round() as u32;
    let y2 = ((crop.y2 * height as f64).round() as u32).min(height);

    if x2 <= x1 || y2 <= y1 {
        warn!(x1, x2, y1, y2, "Panel crop has zero area; using placeholder");
        return placeholder();
    }

    debug!(x1, y1, crop_width = x2 - x1, crop_height = y2 - y1, "Panel cropped");
    page.crop_imm(x1, y1, x2 - x1, y2 - y1)
}

/// Split the panel at its horizontal midpoint into section halves.
///
/// A panel too narrow to split degrades to placeholder halves.
pub fn split_halves(panel: &DynamicImage) -> PanelHalves {
    let (width, height) = (panel.width(), panel.height());
    let mid = width / 2;

    if mid == 0 || height == 0 {
        warn!(width, height, "Panel too small to split; using placeholders");
        return PanelHalves {
            left: placeholder(),
            right: placeholder(),
        };
    }

    PanelHalves {
        left: panel.crop_imm(0, 0, mid, height),
        right: panel.crop_imm(mid, 0, width - mid, height),
    }
}

/// Minimal all-white stand-in for a degenerate region.
fn placeholder() -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([255u8])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_page(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([255u8])))
    }

    #[test]
    fn crop_uses_fractional_bounds() {
        let page = white_page(1000, 500);
        let crop = CropFractions {
            x1: 0.1,
            x2: 0.9,
            y1: 0.2,
            y2: 0.8,
        };

        let panel = extract_panel(&page, crop);
        assert_eq!(panel.width(), 800);
        assert_eq!(panel.height(), 300);
    }

    #[test]
    fn out_of_range_bounds_do_not_panic() {
        let page = white_page(400, 300);
        let crop = CropFractions {
            x1: 1.2,
            x2: -0.3,
            y1: 0.0,
            y2: 1.0,
        };

        // x bounds normalize to the full width.
        let panel = extract_panel(&page, crop);
        assert_eq!(panel.width(), 400);
        assert_eq!(panel.height(), 300);
    }

    #[test]
    fn zero_area_crop_degrades_to_placeholder() {
        let page = white_page(400, 300);
        let crop = CropFractions {
            x1: 0.5,
            x2: 0.5,
            y1: 0.1,
            y2: 0.9,
        };

        let panel = extract_panel(&page, crop);
        assert_eq!((panel.width(), panel.height()), (1, 1));
    }

    #[test]
    fn split_halves_covers_full_width() {
        let panel = white_page(901, 300);
        let halves = split_halves(&panel);
        assert_eq!(halves.left.width(), 450);
        assert_eq!(halves.right.width(), 451);
        assert_eq!(halves.left.height(), 300);
        assert_eq!(halves.right.height(), 300);
    }

    #[test]
    fn one_pixel_panel_degrades_to_placeholders() {
        let panel = white_page(1, 1);
        let halves = split_halves(&panel);
        assert_eq!((halves.left.width(), halves.left.height()), (1, 1));
        assert_eq!((halves.right.width(), halves.right.height()), (1, 1));
    }
}
