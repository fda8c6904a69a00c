// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — rasterization of score-report pages via pdfium.

pub mod render;

pub use render::{PdfRasterizer, RasterPage};
