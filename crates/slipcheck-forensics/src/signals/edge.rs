// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge density — sum of a Canny edge map over the grayscale image.

use std::path::Path;

use image::DynamicImage;
use imageproc::edges::canny;
use slipcheck_core::error::SlipcheckError;
use slipcheck_core::types::EvidenceBundle;
use tracing::{debug, instrument};

use super::EvidenceExtractor;
use crate::image::loader::ForensicImage;

/// Lower hysteresis threshold on the 0-255 gradient scale.
pub const CANNY_LOW_THRESHOLD: f32 = 50.0;

/// Upper hysteresis threshold on the 0-255 gradient scale.
pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;

/// Sum of all edge-map intensities for `image` at the standard thresholds.
///
/// Every edge pixel contributes 255, so the result is 255 times the number
/// of edge pixels. A flat image has no gradient and scores 0.
pub fn edge_density(image: &DynamicImage) -> u64 {
    edge_density_with_thresholds(image, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD)
}

/// [`edge_density`] with explicit hysteresis thresholds.
pub fn edge_density_with_thresholds(image: &DynamicImage, low: f32, high: f32) -> u64 {
    let gray = image.to_luma8();
    let edges = canny(&gray, low, high);
    edges.pixels().map(|p| u64::from(p.0[0])).sum()
}

/// Extractor wrapper around [`edge_density`].
#[derive(Debug, Clone)]
pub struct EdgeDensityExtractor {
    low: f32,
    high: f32,
}

impl Default for EdgeDensityExtractor {
    fn default() -> Self {
        Self {
            low: CANNY_LOW_THRESHOLD,
            high: CANNY_HIGH_THRESHOLD,
        }
    }
}

impl EvidenceExtractor for EdgeDensityExtractor {
    fn stage(&self) -> &'static str {
        "edge-density"
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn extract(&self, path: &Path, evidence: &mut EvidenceBundle) -> Result<(), SlipcheckError> {
        let image = ForensicImage::open(path)?;
        let density = edge_density_with_thresholds(image.as_dynamic(), self.low, self.high);
        debug!(edge_density = density, "Edge density computed");
        evidence.edge_density = Some(density);
        Ok(())
    }
}
