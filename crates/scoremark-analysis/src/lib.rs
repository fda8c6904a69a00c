// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scoremark-analysis — Indicator-mark analysis pipeline for Scoremark.
//
// Renders a score-report page to pixels, locates the indicator panel,
// detects per-domain mark strips with classical thresholding/morphology,
// anchors rows to domain labels via OCR, classifies each mark's fill state,
// and ranks domains by deficit.

pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod vision;

// Re-export the primary types so callers can use `scoremark_analysis::ReportAnalyzer` etc.
pub use ocr::recognize::{OcrToken, TextRecognizer};
pub use pdf::render::{PdfRasterizer, RasterPage};
pub use pipeline::ReportAnalyzer;

#[cfg(feature = "ocr")]
pub use ocr::engine::{OcrModelConfig, OcrsRecognizer};
