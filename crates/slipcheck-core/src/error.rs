// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Slipcheck.

use thiserror::Error;

/// Top-level error type for all Slipcheck operations.
#[derive(Debug, Error)]
pub enum SlipcheckError {
    // -- Extractor errors --
    #[error("image could not be decoded: {0}")]
    UnreadableImage(String),

    #[error("recompression failed: {0}")]
    RecompressionFailed(String),

    #[error("text recognition engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("text recognition failed: {0}")]
    TextRecognition(String),

    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    // -- Report errors --
    #[error("report could not be written: {0}")]
    ReportWriteFailed(String),

    // -- Upload / storage --
    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SlipcheckError {
    /// Whether this failure aborts the rest of the analysis pipeline.
    ///
    /// A failed recompression pass only removes one signal; everything else
    /// short-circuits the run and produces an `Error` verdict.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::RecompressionFailed(_))
    }

    /// Name of the stage that raised the error, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnreadableImage(_) => "edge-density",
            Self::RecompressionFailed(_) => "recompression",
            Self::EngineUnavailable(_) | Self::TextRecognition(_) => "text-recognition",
            Self::MetadataUnavailable(_) => "metadata",
            Self::ReportWriteFailed(_) => "report",
            Self::InvalidUpload(_) | Self::Storage(_) | Self::Io(_) => "storage",
            Self::Database(_) => "ledger",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SlipcheckError>;
