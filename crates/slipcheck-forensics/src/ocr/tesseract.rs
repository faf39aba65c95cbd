// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tesseract backend — drives the external `tesseract` executable.
//
// The image is written to a temporary PNG and recognised with
// `tesseract <png> stdout -l <lang>`. The temporary file is removed when
// recognition returns.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use image::{DynamicImage, ImageFormat};
use slipcheck_core::error::SlipcheckError;
use tracing::{debug, info, instrument};

use super::TextRecognizer;

/// Text recognizer backed by a Tesseract installation.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    /// Executable name (looked up on `PATH`) or absolute path.
    binary: PathBuf,
    /// Tesseract language code, e.g. `eng`.
    language: String,
}

impl TesseractRecognizer {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    fn spawn_error(&self, err: std::io::Error) -> SlipcheckError {
        let reason = if err.kind() == ErrorKind::NotFound {
            format!("{} not found", self.binary.display())
        } else {
            format!("cannot run {}: {}", self.binary.display(), err)
        };
        SlipcheckError::EngineUnavailable(reason)
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn backend(&self) -> &'static str {
        "tesseract"
    }

    #[instrument(skip_all, fields(width = image.width(), height = image.height(), lang = %self.language))]
    fn recognize(&self, image: &DynamicImage) -> Result<String, SlipcheckError> {
        info!("Starting OCR text recognition");

        let input = tempfile::Builder::new()
            .prefix("slipcheck-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|err| {
                SlipcheckError::TextRecognition(format!("cannot create OCR input file: {}", err))
            })?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|err| {
                SlipcheckError::TextRecognition(format!("cannot write OCR input: {}", err))
            })?;

        let output = Command::new(&self.binary)
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .map_err(|err| self.spawn_error(err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            // Missing traineddata means the engine itself is not usable.
            if stderr.contains("Failed loading language") || stderr.contains("Could not initialize") {
                return Err(SlipcheckError::EngineUnavailable(stderr));
            }
            return Err(SlipcheckError::TextRecognition(format!(
                "tesseract exited with {}: {}",
                output.status, stderr
            )));
        }

        let text = clean_output(&String::from_utf8_lossy(&output.stdout));
        debug!(
            line_count = text.lines().count(),
            char_count = text.len(),
            "OCR recognition complete"
        );
        Ok(text)
    }
}

/// Strip the trailing page separator and whitespace Tesseract appends.
fn clean_output(raw: &str) -> String {
    raw.trim_end_matches(|c: char| c == '\u{c}' || c.is_whitespace())
        .to_owned()
}
