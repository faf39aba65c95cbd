// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Embedded text — full-image OCR through a pluggable `TextRecognizer`.

use std::path::Path;

use slipcheck_core::error::SlipcheckError;
use slipcheck_core::types::EvidenceBundle;
use tracing::{debug, instrument};

use super::EvidenceExtractor;
use crate::image::loader::ForensicImage;
use crate::ocr::TextRecognizer;

/// Runs a recognizer over the whole image, no cropping or language hints.
pub struct TextExtractor {
    recognizer: Box<dyn TextRecognizer>,
}

impl TextExtractor {
    pub fn new(recognizer: Box<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }
}

impl EvidenceExtractor for TextExtractor {
    fn stage(&self) -> &'static str {
        "text-recognition"
    }

    #[instrument(skip_all, fields(path = %path.display(), backend = self.recognizer.backend()))]
    fn extract(&self, path: &Path, evidence: &mut EvidenceBundle) -> Result<(), SlipcheckError> {
        let image = ForensicImage::open(path)?;
        let text = self.recognizer.recognize(image.as_dynamic())?;
        debug!(char_count = text.chars().count(), "Text recognized");
        evidence.recognized_text = Some(text);
        Ok(())
    }
}
