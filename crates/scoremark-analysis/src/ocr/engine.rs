// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ocrs-backed word recognizer, compiled only under the `ocr` feature.
//
// The engine needs two `rten` model files: `text-detection.rten` (locates
// text regions) and `text-recognition.rten` (decodes characters). Running
// the `ocrs-cli` tool once downloads both into the cache directory:
//
// ```sh
// cargo install ocrs-cli
// ocrs some-image.png  # models land in ~/.cache/ocrs/
// ```

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use scoremark_core::error::ScoremarkError;
use tracing::{debug, info, instrument};

use crate::ocr::recognize::{OcrToken, TextRecognizer};

const DETECTION_MODEL: &str = "text-detection.rten";
const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// Model cache directory per the XDG Base Directory spec:
/// `$XDG_CACHE_HOME/ocrs`, or `~/.cache/ocrs` when unset.
fn default_model_dir() -> PathBuf {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .map(|cache| cache.join("ocrs"))
        // No usable environment — fall back to the working directory.
        .unwrap_or_else(|| PathBuf::from("ocrs-models"))
}

/// Locations of the two model files an [`OcrsRecognizer`] loads.
#[derive(Debug, Clone)]
pub struct OcrModelConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrModelConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrModelConfig {
    /// Point both model paths into `dir`, which is expected to hold the
    /// well-known `text-detection.rten` / `text-recognition.rten` names.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL),
            recognition_model_path: dir.join(RECOGNITION_MODEL),
        }
    }

    /// Use two explicit model files.
    pub fn from_paths(
        detection_model: impl Into<PathBuf>,
        recognition_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detection_model_path: detection_model.into(),
            recognition_model_path: recognition_model.into(),
        }
    }

    /// Check that both model files exist before attempting the (slow) load.
    pub fn validate(&self) -> Result<(), ScoremarkError> {
        for (kind, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(ScoremarkError::Recognition(format!(
                    "{} model missing at {}; run `ocrs-cli` once to download the models",
                    kind,
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Whether both model files are present in the default cache location.
pub fn models_available() -> bool {
    let config = OcrModelConfig::default();
    config.detection_model_path.exists() && config.recognition_model_path.exists()
}

/// The default model directory, for diagnostics.
pub fn model_directory() -> PathBuf {
    default_model_dir()
}

fn load_model(kind: &str, path: &Path) -> Result<Model, ScoremarkError> {
    info!(path = %path.display(), "Loading OCR {kind} model");
    Model::load_file(path).map_err(|err| {
        ScoremarkError::Recognition(format!(
            "failed to load {} model from {}: {}",
            kind,
            path.display(),
            err
        ))
    })
}

/// Word-level text recognizer backed by the `ocrs` engine.
///
/// Model loading dominates construction cost; build the recognizer once and
/// reuse it across analysis calls. `ocrs` and `rten` must be compiled in
/// release mode — debug builds are 10-100x slower.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load the models named by `config` and initialise the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ScoremarkError::Recognition`] for missing or corrupt model
    /// files. The pipeline treats that as recognition being unavailable, not
    /// as a failed analysis.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrModelConfig) -> Result<Self, ScoremarkError> {
        config.validate()?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(load_model("detection", &config.detection_model_path)?),
            recognition_model: Some(load_model("recognition", &config.recognition_model_path)?),
            ..Default::default()
        })
        .map_err(|err| {
            ScoremarkError::Recognition(format!("failed to initialise OCR engine: {}", err))
        })?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Load models from the default cache directory.
    pub fn with_defaults() -> Result<Self, ScoremarkError> {
        Self::new(OcrModelConfig::default())
    }
}

impl TextRecognizer for OcrsRecognizer {
    /// Recognize word tokens with their bounding boxes.
    ///
    /// The engine exposes no per-word confidence, so every token reports
    /// 1.0; best-mean-confidence label selection then reduces to
    /// earliest-occurrence for this backend.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn recognize(&self, image: &DynamicImage) -> Result<Vec<OcrToken>, ScoremarkError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            ScoremarkError::Recognition(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = self.engine.prepare_input(source).map_err(|err| {
            ScoremarkError::Recognition(format!("OCR preprocessing failed: {}", err))
        })?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| ScoremarkError::Recognition(format!("word detection failed: {}", err)))?;
        debug!(word_count = word_rects.len(), "Words detected");

        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| {
                ScoremarkError::Recognition(format!("line recognition failed: {}", err))
            })?;

        let mut tokens = Vec::new();
        for line in lines.iter().flatten() {
            for word in line.words() {
                let text = word.to_string();
                if text.trim().is_empty() {
                    continue;
                }
                let rect = word.rotated_rect().bounding_rect();
                tokens.push(OcrToken {
                    text,
                    confidence: 1.0,
                    x: rect.left(),
                    y: rect.top(),
                    width: rect.width(),
                    height: rect.height(),
                });
            }
        }

        debug!(token_count = tokens.len(), "Recognition complete");
        Ok(tokens)
    }
}
