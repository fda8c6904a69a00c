// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR module — the text-recognition seam, domain-label matching, and the
// ocrs-backed engine (behind the "ocr" feature).

pub mod labels;
pub mod recognize;

#[cfg(feature = "ocr")]
pub mod engine;

pub use recognize::{OcrToken, TextRecognizer};

#[cfg(feature = "ocr")]
pub use engine::{OcrModelConfig, OcrsRecognizer};
