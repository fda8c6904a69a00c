// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scoremark.

use thiserror::Error;

/// Top-level error type for all Scoremark operations.
///
/// Only [`ScoremarkError::Render`] is ever surfaced by an analysis call:
/// recognition failures degrade to fallback row assignment, parameter-file
/// problems degrade to defaults, and degenerate geometry degrades to empty
/// results.
#[derive(Debug, Error)]
pub enum ScoremarkError {
    // -- Rendering errors --
    #[error("document rendering failed: {0}")]
    Render(String),

    // -- Recognition errors --
    #[error("text recognition failed: {0}")]
    Recognition(String),

    // -- Configuration errors --
    #[error("parameter file rejected: {0}")]
    Config(String),

    // -- I/O / serialization --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScoremarkError>;
