// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-recognition seam. Recognition is best-effort throughout the
// pipeline: an absent or erroring recognizer degrades to an empty token
// stream, never to a surfaced error.

use image::DynamicImage;
use scoremark_core::error::ScoremarkError;

/// A single recognized word, in canonical-scale pixel coordinates.
///
/// Produced per recognition call and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    pub text: String,
    /// Recognition confidence in `[0, 1]`.
    pub confidence: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Produces an ordered word-token stream from a canonical-scale panel image.
///
/// Implementations report engine failures as
/// [`ScoremarkError::Recognition`]; the pipeline downgrades those to an
/// empty stream and falls back to declared-order row assignment.
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<OcrToken>, ScoremarkError>;
}
