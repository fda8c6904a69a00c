// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fill classifier — decides filled vs empty from mean pixel intensity.

use image::GrayImage;

use crate::vision::detect::MarkBox;

/// Marks with a mean intensity below this value count as filled.
///
/// Assumes indicator marks render as dark ink on a light background. A
/// tunable constant, not derived per document.
pub const FILL_THRESHOLD: f32 = 140.0;

/// Mean grayscale intensity of the pixels under `mark`.
///
/// The rectangle is intersected with the image; an empty intersection reads
/// as white, so an out-of-bounds mark classifies as empty.
pub fn mean_intensity(gray: &GrayImage, mark: &MarkBox) -> f32 {
    let x1 = mark.x.min(gray.width());
    let y1 = mark.y.min(gray.height());
    let x2 = (mark.x.saturating_add(mark.w)).min(gray.width());
    let y2 = (mark.y.saturating_add(mark.h)).min(gray.height());

    let mut sum: u64 = 0;
    let mut count: u64 = 0;
    for y in y1..y2 {
        for x in x1..x2 {
            sum += gray.get_pixel(x, y).0[0] as u64;
            count += 1;
        }
    }

    if count == 0 {
        return 255.0;
    }
    (sum as f64 / count as f64) as f32
}

/// Whether `mark` is a filled indicator.
pub fn is_filled(gray: &GrayImage, mark: &MarkBox) -> bool {
    mean_intensity(gray, mark) < FILL_THRESHOLD
}

/// Count of filled marks in one row's box list.
pub fn count_filled(gray: &GrayImage, boxes: &[MarkBox]) -> u32 {
    boxes.iter().filter(|mark| is_filled(gray, mark)).count() as u32
}
