// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition backends — the external Tesseract engine by default, the
// built-in `ocrs` engine behind the `ocr` feature.

pub mod tesseract;

#[cfg(feature = "ocr")]
pub mod ocrs_backend;

use image::DynamicImage;
use slipcheck_core::config::{OcrBackendKind, OcrSettings};
use slipcheck_core::error::SlipcheckError;
use tracing::warn;

pub use tesseract::TesseractRecognizer;

/// Optical character recognition over a whole image.
pub trait TextRecognizer {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Recognize all text in `image`.
    ///
    /// Returns an empty string when there is no text. Fails with
    /// [`SlipcheckError::EngineUnavailable`] when the engine cannot be
    /// located or initialised.
    fn recognize(&self, image: &DynamicImage) -> Result<String, SlipcheckError>;
}

/// Stand-in used when the configured engine failed to initialise.
///
/// Every call reports the original reason, so analyses still finish with an
/// `Error` verdict and whatever evidence came before the text stage.
#[derive(Debug, Clone)]
pub struct UnavailableRecognizer {
    reason: String,
}

impl UnavailableRecognizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl TextRecognizer for UnavailableRecognizer {
    fn backend(&self) -> &'static str {
        "unavailable"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<String, SlipcheckError> {
        Err(SlipcheckError::EngineUnavailable(self.reason.clone()))
    }
}

/// Build the recognizer selected in `settings`.
///
/// Initialisation failures are folded into an [`UnavailableRecognizer`].
pub fn recognizer_from_settings(settings: &OcrSettings) -> Box<dyn TextRecognizer> {
    match settings.backend {
        OcrBackendKind::Tesseract => Box::new(TesseractRecognizer::new(
            settings.tesseract_binary.clone(),
            settings.language.clone(),
        )),
        OcrBackendKind::Ocrs => ocrs_recognizer(settings),
    }
}

#[cfg(feature = "ocr")]
fn ocrs_recognizer(settings: &OcrSettings) -> Box<dyn TextRecognizer> {
    let config = match &settings.model_dir {
        Some(dir) => ocrs_backend::OcrConfig::from_dir(dir),
        None => ocrs_backend::OcrConfig::default(),
    };
    match ocrs_backend::OcrsRecognizer::new(config) {
        Ok(engine) => Box::new(engine),
        Err(err) => {
            warn!("ocrs engine unavailable: {err}");
            Box::new(UnavailableRecognizer::new(err.to_string()))
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn ocrs_recognizer(_settings: &OcrSettings) -> Box<dyn TextRecognizer> {
    warn!("ocrs backend requested but slipcheck was built without the `ocr` feature");
    Box::new(UnavailableRecognizer::new(
        "built without the `ocr` feature",
    ))
}
