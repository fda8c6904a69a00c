// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Row grouper — clusters detected marks into horizontal rows by
// vertical-center proximity.

use tracing::debug;

use crate::vision::detect::MarkBox;

/// Vertical-center tolerance for two marks to share a row, in canonical
/// pixels (panel halves are 900 px wide).
pub const ROW_TOLERANCE: f32 = 14.0;

/// A horizontal cluster of marks belonging to one domain's indicator strip.
///
/// Carries a running center-y, recomputed as the mean vertical center of
/// the members each time a mark is added. Appending is expressed as
/// immutable accumulation ([`MarkRow::with_box`] builds a new row) so the
/// clustering pass has no shared mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkRow {
    boxes: Vec<MarkBox>,
    center_y: f32,
}

impl MarkRow {
    /// Start a row from its first mark.
    fn seed(first: MarkBox) -> Self {
        Self {
            center_y: first.center_y(),
            boxes: vec![first],
        }
    }

    /// A new row with `mark` appended and the running center recomputed as
    /// the mean vertical center of all members.
    fn with_box(&self, mark: MarkBox) -> Self {
        let mut boxes = self.boxes.clone();
        boxes.push(mark);
        let center_y = boxes.iter().map(MarkBox::center_y).sum::<f32>() / boxes.len() as f32;
        Self { boxes, center_y }
    }

    pub fn center_y(&self) -> f32 {
        self.center_y
    }

    pub fn boxes(&self) -> &[MarkBox] {
        &self.boxes
    }

    pub fn into_boxes(self) -> Vec<MarkBox> {
        self.boxes
    }
}

/// Greedy single-pass clustering over marks in detector order.
///
/// Each mark joins the closest row whose running center lies within
/// [`ROW_TOLERANCE`] (an exact tie goes to the earlier row), or starts a new
/// row. Afterwards the members of each row are ordered left-to-right and the
/// rows themselves top-to-bottom. Deterministic for a fixed mark ordering.
pub fn group_rows(boxes: &[MarkBox]) -> Vec<MarkRow> {
    let mut rows: Vec<MarkRow> = boxes.iter().fold(Vec::new(), |mut rows, &mark| {
        let center = mark.center_y();
        let nearest = rows
            .iter()
            .enumerate()
            .map(|(index, row)| (index, (row.center_y - center).abs()))
            .filter(|(_, distance)| *distance <= ROW_TOLERANCE)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match nearest {
            Some((index, _)) => rows[index] = rows[index].with_box(mark),
            None => rows.push(MarkRow::seed(mark)),
        }
        rows
    });

    for row in &mut rows {
        row.boxes.sort_unstable_by_key(|b| b.x);
    }
    rows.sort_by(|a, b| {
        a.center_y
            .partial_cmp(&b.center_y)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!(rows = rows.len(), "Marks clustered into rows");
    rows
}
