// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Evidence extractors — each one reads the upload on its own and fills in one
// part of the `EvidenceBundle`.

pub mod edge;
pub mod metadata;
pub mod recompression;
pub mod text;

use std::path::Path;

use slipcheck_core::error::SlipcheckError;
use slipcheck_core::types::EvidenceBundle;

pub use edge::EdgeDensityExtractor;
pub use metadata::MetadataExtractor;
pub use recompression::RecompressionExtractor;
pub use text::TextExtractor;

/// One independent forensic signal.
///
/// Implementations hold configuration only; all per-image state lives inside
/// `extract`, which loads the image from `path` itself.
pub trait EvidenceExtractor {
    /// Stage name used in logs and error context.
    fn stage(&self) -> &'static str;

    /// Analyse the image at `path` and record the result in `evidence`.
    ///
    /// On error `evidence` is left as it was; the caller decides from
    /// [`SlipcheckError::is_fatal`] whether the run continues.
    fn extract(&self, path: &Path, evidence: &mut EvidenceBundle) -> Result<(), SlipcheckError>;
}
