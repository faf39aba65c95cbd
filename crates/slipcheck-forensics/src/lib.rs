// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// slipcheck-forensics — Forensic analysis of payment confirmation screenshots.
//
// Four independent evidence extractors (edge density, error-level
// recompression map, embedded text, metadata), a deterministic classifier
// that fuses edge density and text into a verdict, the pipeline that runs
// them in order, and the paginated PDF report builder.

pub mod classify;
pub mod image;
pub mod ocr;
pub mod pipeline;
pub mod report;
pub mod signals;

// Re-export the primary structs so callers can use `slipcheck_forensics::Pipeline` etc.
pub use classify::{Classifier, Decision, DecisionRule, classify};
pub use crate::image::loader::ForensicImage;
pub use ocr::{TextRecognizer, TesseractRecognizer, UnavailableRecognizer};
pub use pipeline::Pipeline;
pub use report::{ReportArtifact, ReportBuilder};
pub use signals::EvidenceExtractor;

#[cfg(feature = "ocr")]
pub use ocr::ocrs_backend::OcrsRecognizer;
