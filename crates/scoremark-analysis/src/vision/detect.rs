// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Box detector — binarizes a canonical-scale panel half and extracts
// candidate indicator marks from the external contours of the cleaned mask.

use image::{DynamicImage, GrayImage, imageops::FilterType};
use imageproc::contours::{Contour, find_contours};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{erode, open};
use scoremark_core::config::{DetectionParams, ThresholdMode};
use tracing::{debug, instrument};

/// Width every half-panel is normalized to before detection and recognition,
/// so geometric constants hold across source resolutions.
pub const CANONICAL_WIDTH: u32 = 900;

// Geometric acceptance bounds for a candidate mark, at canonical scale.
const MIN_AREA: u32 = 30;
const MAX_AREA: u32 = 7000;
const MIN_ASPECT: f32 = 0.3;
const MAX_ASPECT: f32 = 7.0;
/// A mark never spans more than this share of the panel height.
const MAX_HEIGHT_FRACTION: f32 = 0.18;

/// A candidate indicator mark, in canonical-scale pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl MarkBox {
    pub fn area(&self) -> u32 {
        self.w * self.h
    }

    pub fn aspect(&self) -> f32 {
        self.w as f32 / self.h as f32
    }

    /// Vertical center, the coordinate rows cluster on.
    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.h as f32 / 2.0
    }
}

/// Scale a half-panel to the canonical width, preserving aspect ratio.
pub fn to_canonical(half: &DynamicImage) -> DynamicImage {
    let (width, height) = (half.width(), half.height());
    if width == 0 || height == 0 || width == CANONICAL_WIDTH {
        return half.clone();
    }
    let target_height =
        ((height as f64 * CANONICAL_WIDTH as f64 / width as f64).round() as u32).max(1);
    half.resize_exact(CANONICAL_WIDTH, target_height, FilterType::Lanczos3)
}

/// Detect candidate indicator marks in a canonical-scale grayscale half.
///
/// Binarizes with an inverse threshold (marks are dark on a light
/// background), cleans the mask with one opening pass plus the configured
/// erosion passes, then keeps the bounding rectangle of every outermost
/// contour that satisfies the area/aspect/height bounds. Results are sorted
/// top-to-bottom, then left-to-right, which fixes the ordering for every
/// downstream stage. Degenerate input yields an empty list, never an error.
#[instrument(skip(gray, params), fields(width = gray.width(), height = gray.height()))]
pub fn detect_boxes(gray: &GrayImage, params: &DetectionParams) -> Vec<MarkBox> {
    if gray.width() < 2 || gray.height() < 2 {
        debug!("Degenerate panel half; no marks");
        return Vec::new();
    }

    let mask = binarize(gray, params.threshold);
    let mask = morph_clean(&mask, params.kernel_size, params.erosion_iterations);

    let max_height = (gray.height() as f32 * MAX_HEIGHT_FRACTION) as u32;

    let mut boxes: Vec<MarkBox> = find_contours::<i32>(&mask)
        .iter()
        .filter(|contour| contour.parent.is_none())
        .filter_map(bounding_box)
        .filter(|candidate| accepts(candidate, max_height))
        .collect();

    boxes.sort_unstable_by_key(|b| (b.y, b.x));
    debug!(count = boxes.len(), "Candidate marks detected");
    boxes
}

/// Inverse-binary threshold: mark (dark) pixels become mask foreground.
fn binarize(gray: &GrayImage, mode: ThresholdMode) -> GrayImage {
    let cutoff = match mode {
        ThresholdMode::Automatic => otsu_level(gray),
        ThresholdMode::Fixed(value) => value,
    };
    threshold(gray, cutoff, ThresholdType::BinaryInverted)
}

/// One opening pass, then the configured number of erosion passes, with a
/// square structuring element of side `kernel_size` (an L∞ ball of radius
/// `kernel_size / 2`; even sizes round down to the next odd element).
fn morph_clean(mask: &GrayImage, kernel_size: u32, erosion_iterations: u32) -> GrayImage {
    let radius = (kernel_size / 2).min(u8::MAX as u32) as u8;
    let mut cleaned = open(mask, Norm::LInf, radius);
    for _ in 0..erosion_iterations {
        cleaned = erode(&cleaned, Norm::LInf, radius);
    }
    cleaned
}

/// Axis-aligned bounding rectangle of a contour's points.
fn bounding_box(contour: &Contour<i32>) -> Option<MarkBox> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for point in &contour.points[1..] {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    Some(MarkBox {
        x: min_x as u32,
        y: min_y as u32,
        w: (max_x - min_x + 1) as u32,
        h: (max_y - min_y + 1) as u32,
    })
}

fn accepts(candidate: &MarkBox, max_height: u32) -> bool {
    let area = candidate.area();
    let aspect = candidate.aspect();
    (MIN_AREA..=MAX_AREA).contains(&area)
        && (MIN_ASPECT..=MAX_ASPECT).contains(&aspect)
        && candidate.h <= max_height
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn white_canvas(width: u32, height: u32) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([255u8]))
    }

    fn draw_rect(canvas: &mut GrayImage, x: u32, y: u32, w: u32, h: u32, intensity: u8) {
        for py in y..y + h {
            for px in x..x + w {
                canvas.put_pixel(px, py, Luma([intensity]));
            }
        }
    }

    /// A drawn W×H solid rectangle survives the default 3×3 opening and one
    /// erosion pass as a (W−2)×(H−2) mark shifted by one pixel.
    #[test]
    fn solid_marks_are_detected_in_reading_order() {
        let mut canvas = white_canvas(900, 400);
        draw_rect(&mut canvas, 200, 100, 20, 12, 40);
        draw_rect(&mut canvas, 100, 100, 20, 12, 40);
        draw_rect(&mut canvas, 100, 200, 20, 12, 40);

        let boxes = detect_boxes(&canvas, &DetectionParams::default());
        assert_eq!(
            boxes,
            vec![
                MarkBox { x: 101, y: 101, w: 18, h: 10 },
                MarkBox { x: 201, y: 101, w: 18, h: 10 },
                MarkBox { x: 101, y: 201, w: 18, h: 10 },
            ]
        );
    }

    #[test]
    fn detection_is_deterministic() {
        let mut canvas = white_canvas(900, 400);
        for col in 0..14 {
            draw_rect(&mut canvas, 60 + col * 30, 150, 20, 12, 40);
        }

        let params = DetectionParams::default();
        let first = detect_boxes(&canvas, &params);
        let second = detect_boxes(&canvas, &params);
        assert_eq!(first.len(), 14);
        assert_eq!(first, second);
    }

    #[test]
    fn every_detected_box_satisfies_the_filter_invariants() {
        let mut canvas = white_canvas(900, 400);
        draw_rect(&mut canvas, 50, 40, 20, 12, 40);
        draw_rect(&mut canvas, 120, 40, 36, 18, 40);
        draw_rect(&mut canvas, 300, 120, 14, 30, 40);

        let max_height = (400.0 * MAX_HEIGHT_FRACTION) as u32;
        for mark in detect_boxes(&canvas, &DetectionParams::default()) {
            assert!((MIN_AREA..=MAX_AREA).contains(&mark.area()), "area {}", mark.area());
            assert!(
                (MIN_ASPECT..=MAX_ASPECT).contains(&mark.aspect()),
                "aspect {}",
                mark.aspect()
            );
            assert!(mark.h <= max_height, "height {}", mark.h);
        }
    }

    #[test]
    fn blank_panel_yields_no_boxes() {
        let canvas = white_canvas(900, 400);
        assert!(detect_boxes(&canvas, &DetectionParams::default()).is_empty());
    }

    #[test]
    fn degenerate_panel_yields_no_boxes() {
        let canvas = white_canvas(1, 1);
        assert!(detect_boxes(&canvas, &DetectionParams::default()).is_empty());
    }

    /// A thin horizontal rule is rejected by the aspect bound, an oversized
    /// blob by the area bound, and a tall bar by the height bound.
    #[test]
    fn rules_blobs_and_bars_are_filtered_out() {
        let mut canvas = white_canvas(900, 400);
        draw_rect(&mut canvas, 50, 20, 202, 6, 40); // aspect 200/4 = 50
        draw_rect(&mut canvas, 300, 100, 102, 102, 40); // area 100 * 100
        draw_rect(&mut canvas, 600, 150, 62, 102, 40); // height 100 > 72
        draw_rect(&mut canvas, 50, 350, 20, 12, 40); // the one legitimate mark

        let boxes = detect_boxes(&canvas, &DetectionParams::default());
        assert_eq!(boxes, vec![MarkBox { x: 51, y: 351, w: 18, h: 10 }]);
    }

    #[test]
    fn fixed_threshold_mode_is_honored() {
        let mut canvas = white_canvas(900, 200);
        draw_rect(&mut canvas, 100, 80, 20, 12, 200);

        let fixed = DetectionParams {
            threshold: ThresholdMode::Fixed(230),
            ..DetectionParams::default()
        };
        let boxes = detect_boxes(&canvas, &fixed);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0], MarkBox { x: 101, y: 81, w: 18, h: 10 });
    }

    #[test]
    fn canonical_scaling_preserves_aspect() {
        let half = DynamicImage::ImageLuma8(white_canvas(450, 300));
        let canonical = to_canonical(&half);
        assert_eq!(canonical.width(), CANONICAL_WIDTH);
        assert_eq!(canonical.height(), 600);

        // Already-canonical input passes through unchanged.
        let half = DynamicImage::ImageLuma8(white_canvas(900, 123));
        let canonical = to_canonical(&half);
        assert_eq!((canonical.width(), canonical.height()), (900, 123));
    }
}
