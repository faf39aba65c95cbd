// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analysis pipeline — runs the extractors in order, then classifies.
//
// A fatal extractor error stops the run and produces an `Error` verdict that
// still carries the evidence gathered so far. A failed recompression pass
// only leaves the map out.

use std::path::Path;

use slipcheck_core::config::AppConfig;
use slipcheck_core::error::SlipcheckError;
use slipcheck_core::human_errors::humanize_error;
use slipcheck_core::types::{AnalysisId, AnalysisReport, EvidenceBundle, Verdict};
use tracing::{error, info, instrument, warn};

use crate::classify::Classifier;
use crate::ocr::TextRecognizer;
use crate::signals::{
    EdgeDensityExtractor, EvidenceExtractor, MetadataExtractor, RecompressionExtractor,
    TextExtractor,
};

pub struct Pipeline {
    extractors: Vec<Box<dyn EvidenceExtractor>>,
    classifier: Classifier,
}

impl Pipeline {
    /// An empty pipeline; add stages with [`Pipeline::with_extractor`].
    pub fn new(classifier: Classifier) -> Self {
        Self {
            extractors: Vec::new(),
            classifier,
        }
    }

    pub fn with_extractor(mut self, extractor: impl EvidenceExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// Edge density, recompression, metadata and text, configured from `config`.
    ///
    /// Metadata runs before text recognition so that an unavailable engine
    /// still leaves the file's attributes in the `Error` response.
    pub fn standard(config: &AppConfig, recognizer: Box<dyn TextRecognizer>) -> Self {
        Self::new(Classifier::new(config.policy.clone()))
            .with_extractor(EdgeDensityExtractor::default())
            .with_extractor(RecompressionExtractor::new(
                config.recompression_quality,
                config.scratch_dir.clone(),
            ))
            .with_extractor(MetadataExtractor)
            .with_extractor(TextExtractor::new(recognizer))
    }

    /// Stage names in execution order.
    pub fn stages(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.stage()).collect()
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Analyse the image at `path`. Never fails; problems become an `Error`
    /// verdict with a message.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn analyze(&self, path: &Path) -> AnalysisReport {
        let id = AnalysisId::new();
        let mut evidence = EvidenceBundle::default();

        for extractor in &self.extractors {
            let stage = extractor.stage();
            match extractor.extract(path, &mut evidence) {
                Ok(()) => {}
                Err(err) if !err.is_fatal() => {
                    warn!(stage, file = %path.display(), "Signal skipped: {err}");
                }
                Err(err) => {
                    error!(stage, file = %path.display(), "Analysis aborted: {err}");
                    return Self::failed(id, &err, evidence);
                }
            }
        }

        let (Some(edge_density), Some(text)) =
            (evidence.edge_density, evidence.recognized_text.as_deref())
        else {
            error!(file = %path.display(), "Required signals missing after all stages");
            return AnalysisReport {
                id,
                verdict: Verdict::Error,
                rule: None,
                message: Some("Edge density and recognized text are both required.".to_owned()),
                evidence,
            };
        };

        let decision = self.classifier.decide(edge_density, text);
        info!(%id, verdict = %decision.verdict, rule = %decision.rule, "Analysis complete");
        AnalysisReport {
            id,
            verdict: decision.verdict,
            rule: Some(decision.rule.label()),
            message: None,
            evidence,
        }
    }

    fn failed(id: AnalysisId, err: &SlipcheckError, evidence: EvidenceBundle) -> AnalysisReport {
        AnalysisReport {
            id,
            verdict: Verdict::Error,
            rule: None,
            message: Some(humanize_error(err).to_string()),
            evidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::UnavailableRecognizer;
    use crate::signals::metadata::DERIVED_KEYS;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};

    struct FixedText(&'static str);

    impl TextRecognizer for FixedText {
        fn backend(&self) -> &'static str {
            "fixed"
        }

        fn recognize(&self, _image: &DynamicImage) -> Result<String, SlipcheckError> {
            Ok(self.0.to_owned())
        }
    }

    /// Extractor that always fails with the given error.
    struct Failing(fn() -> SlipcheckError);

    impl EvidenceExtractor for Failing {
        fn stage(&self) -> &'static str {
            "failing"
        }

        fn extract(&self, _path: &Path, _evidence: &mut EvidenceBundle) -> Result<(), SlipcheckError> {
            Err((self.0)())
        }
    }

    fn flat_png(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("flat.png");
        DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([200u8])))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    fn pipeline(text: &'static str) -> Pipeline {
        Pipeline::standard(&AppConfig::default(), Box::new(FixedText(text)))
    }

    #[test]
    fn standard_stage_order() {
        assert_eq!(
            pipeline("").stages(),
            vec!["edge-density", "recompression", "metadata", "text-recognition"]
        );
    }

    #[test]
    fn clean_confirmation_is_real() {
        let dir = tempfile::tempdir().unwrap();
        let path = flat_png(dir.path());

        let report = pipeline("Transaction Successful\nRs 500").analyze(&path);
        assert_eq!(report.verdict, Verdict::Real);
        assert_eq!(report.rule.as_deref(), Some("success-marker"));
        assert!(report.message.is_none());
        assert_eq!(report.evidence.edge_density, Some(0));
        assert!(report.evidence.recompression_map.is_some());
        for key in DERIVED_KEYS {
            assert!(report.evidence.metadata.contains_key(key));
        }
    }

    #[test]
    fn suspicious_text_is_fake() {
        let dir = tempfile::tempdir().unwrap();
        let path = flat_png(dir.path());

        let report = pipeline("Transaction Successful - Edited").analyze(&path);
        assert_eq!(report.verdict, Verdict::Fake);
        assert_eq!(report.rule.as_deref(), Some("suspicious-term:Edited"));
    }

    #[test]
    fn missing_engine_keeps_partial_evidence() {
        let dir = tempfile::tempdir().unwrap();
        let path = flat_png(dir.path());

        let report = Pipeline::standard(
            &AppConfig::default(),
            Box::new(UnavailableRecognizer::new("tesseract not found")),
        )
        .analyze(&path);
        assert_eq!(report.verdict, Verdict::Error);
        assert!(report.rule.is_none());
        assert!(report.message.is_some());
        assert_eq!(report.evidence.edge_density, Some(0));
        assert!(report.evidence.recompression_map.is_some());
        assert!(report.evidence.recognized_text.is_none());
        for key in DERIVED_KEYS {
            assert!(report.evidence.metadata.contains_key(key), "missing {key}");
        }
        assert_eq!(report.evidence.metadata["File Name"], "flat.png");
    }

    #[test]
    fn unreadable_image_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let report = pipeline("Transaction Successful").analyze(&path);
        assert_eq!(report.verdict, Verdict::Error);
        assert!(report.evidence.edge_density.is_none());
    }

    #[test]
    fn non_fatal_failure_does_not_stop_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = flat_png(dir.path());

        let report = Pipeline::new(Classifier::default())
            .with_extractor(EdgeDensityExtractor::default())
            .with_extractor(Failing(|| SlipcheckError::RecompressionFailed("disk full".into())))
            .with_extractor(TextExtractor::new(Box::new(FixedText("Transaction Successful"))))
            .analyze(&path);
        assert_eq!(report.verdict, Verdict::Real);
        assert!(report.evidence.recompression_map.is_none());
    }

    #[test]
    fn fatal_failure_stops_later_stages() {
        let dir = tempfile::tempdir().unwrap();
        let path = flat_png(dir.path());

        let report = Pipeline::new(Classifier::default())
            .with_extractor(Failing(|| SlipcheckError::MetadataUnavailable("gone".into())))
            .with_extractor(EdgeDensityExtractor::default())
            .analyze(&path);
        assert_eq!(report.verdict, Verdict::Error);
        assert!(report.evidence.edge_density.is_none());
    }

    #[test]
    fn missing_required_signal_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = flat_png(dir.path());

        let report = Pipeline::new(Classifier::default())
            .with_extractor(EdgeDensityExtractor::default())
            .analyze(&path);
        assert_eq!(report.verdict, Verdict::Error);
        assert_eq!(report.evidence.edge_density, Some(0));
    }
}
