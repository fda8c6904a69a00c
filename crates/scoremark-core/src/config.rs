// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection parameters for the indicator-mark pipeline.
//
// Parameters are constructed once at pipeline entry and passed down by
// argument — there is no process-wide cache. The optional parameter file is
// a flat JSON object; any missing key, a missing file, or a malformed file
// silently falls back to the documented defaults (a warning is logged, the
// pipeline never fails over configuration).

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Result, ScoremarkError};

/// How the box detector binarizes a grayscale panel image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMode {
    /// Automatic global (Otsu) threshold.
    Automatic,
    /// Fixed intensity cutoff, clamped to `0..=255` at load time.
    Fixed(u8),
}

/// Fallback cutoff when the file selects fixed mode without a value.
const DEFAULT_FIXED_THRESHOLD: u8 = 180;

const DEFAULT_KERNEL_SIZE: u32 = 3;
const DEFAULT_EROSION_ITERATIONS: u32 = 1;

/// Fractional bounds of the indicator panel on the rendered page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropFractions {
    pub x1: f64,
    pub x2: f64,
    pub y1: f64,
    pub y2: f64,
}

impl CropFractions {
    /// Clamp each bound into `[0, 1]` and order the pairs so that
    /// `x1 <= x2` and `y1 <= y2`. Inverted or out-of-range input always
    /// yields a valid (possibly zero-area) rectangle.
    pub fn normalized(self) -> Self {
        let clamp = |v: f64| v.clamp(0.0, 1.0);
        let (x1, x2) = (clamp(self.x1), clamp(self.x2));
        let (y1, y2) = (clamp(self.y1), clamp(self.y2));
        Self {
            x1: x1.min(x2),
            x2: x1.max(x2),
            y1: y1.min(y2),
            y2: y1.max(y2),
        }
    }
}

/// Location of the knowledge & skills panel on a standard score report.
const DEFAULT_CROP: CropFractions = CropFractions {
    x1: 0.04,
    x2: 0.96,
    y1: 0.39,
    y2: 0.78,
};

/// Tunable parameters for the detection stages.
///
/// Immutable for the duration of one analysis call.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionParams {
    pub threshold: ThresholdMode,
    /// Side length of the square structuring element, in pixels.
    pub kernel_size: u32,
    /// Number of erosion passes applied after the opening pass.
    pub erosion_iterations: u32,
    pub crop: CropFractions,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            threshold: ThresholdMode::Automatic,
            kernel_size: DEFAULT_KERNEL_SIZE,
            erosion_iterations: DEFAULT_EROSION_ITERATIONS,
            crop: DEFAULT_CROP,
        }
    }
}

/// Flat key/value shape of the optional parameter file. Every key is
/// optional; unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
struct RawParams {
    threshold_mode: Option<String>,
    threshold_value: Option<i64>,
    kernel_size: Option<i64>,
    erosion_iterations: Option<i64>,
    crop_x1: Option<f64>,
    crop_x2: Option<f64>,
    crop_y1: Option<f64>,
    crop_y2: Option<f64>,
}

impl DetectionParams {
    /// Load parameters from an optional JSON file.
    ///
    /// Never fails: a missing or malformed file yields the defaults, and any
    /// key absent from the file keeps its default value.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(params) => {
                debug!(path = %path.display(), ?params, "Detection parameters loaded");
                params
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "Parameter file rejected; using defaults");
                Self::default()
            }
        }
    }

    /// Fallible variant of [`DetectionParams::load`] for callers that want
    /// to see why a file was rejected.
    pub fn try_load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let raw: RawParams = serde_json::from_str(&text)
            .map_err(|err| ScoremarkError::Config(err.to_string()))?;
        Ok(Self::from_raw(raw))
    }

    /// Merge raw file values over the defaults, clamping each field into its
    /// valid range.
    fn from_raw(raw: RawParams) -> Self {
        let defaults = Self::default();

        let threshold = match raw.threshold_mode.as_deref() {
            Some("fixed") => {
                let value = raw
                    .threshold_value
                    .map(|v| v.clamp(0, 255) as u8)
                    .unwrap_or(DEFAULT_FIXED_THRESHOLD);
                ThresholdMode::Fixed(value)
            }
            Some("automatic") | None => defaults.threshold,
            Some(other) => {
                warn!(mode = other, "Unknown threshold mode; using automatic");
                ThresholdMode::Automatic
            }
        };

        let kernel_size = raw
            .kernel_size
            .map(|v| v.clamp(1, 99) as u32)
            .unwrap_or(defaults.kernel_size);
        let erosion_iterations = raw
            .erosion_iterations
            .map(|v| v.clamp(0, 64) as u32)
            .unwrap_or(defaults.erosion_iterations);

        let crop = CropFractions {
            x1: raw.crop_x1.unwrap_or(defaults.crop.x1),
            x2: raw.crop_x2.unwrap_or(defaults.crop.x2),
            y1: raw.crop_y1.unwrap_or(defaults.crop.y1),
            y2: raw.crop_y2.unwrap_or(defaults.crop.y2),
        }
        .normalized();

        Self {
            threshold,
            kernel_size,
            erosion_iterations,
            crop,
        }
    }
}
