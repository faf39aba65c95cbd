// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Slipcheck screenshot analyser.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnalysisId(pub Uuid);

impl AnalysisId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of classifying one screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Evidence matches an unedited confirmation screen.
    Real,
    /// Evidence is suspicious or ambiguous.
    Fake,
    /// A fatal extractor failure stopped the analysis.
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "Real",
            Self::Fake => "Fake",
            Self::Error => "Error",
        }
    }

    /// Parse the serialized form back (used when reading the ledger).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Real" => Some(Self::Real),
            "Fake" => Some(Self::Fake),
            "Error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag name → value, in insertion order.
///
/// Embedded tags are inserted first and derived file attributes after them;
/// inserting an existing key replaces the value but keeps its position.
pub type MetadataMap = IndexMap<String, String>;

/// Normalized error-level map: absolute per-channel difference between an
/// image and its recompressed copy, stretched so the largest difference
/// lands on 255.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecompressionMap {
    pub width: u32,
    pub height: u32,
    /// Largest raw channel difference before scaling.
    pub max_difference: u8,
    /// Multiplier applied to every channel (1.0 when `max_difference` is 0).
    pub scale: f32,
    /// Interleaved RGB8 samples, `width * height * 3` long.
    #[serde(skip)]
    pub pixels: Vec<u8>,
}

impl RecompressionMap {
    /// Stretch raw differences into a map. `raw` must be RGB8 interleaved.
    pub fn from_raw_differences(width: u32, height: u32, raw: Vec<u8>) -> Self {
        let max_difference = raw.iter().copied().max().unwrap_or(0);
        let scale = if max_difference == 0 {
            1.0
        } else {
            255.0 / f32::from(max_difference)
        };
        let pixels = raw
            .into_iter()
            .map(|v| (f32::from(v) * scale).round().min(255.0) as u8)
            .collect();
        Self {
            width,
            height,
            max_difference,
            scale,
            pixels,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGB sample at `(x, y)`, or `None` outside the map or when the samples
    /// were not carried along (they are skipped by serde).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize * self.width as usize) + x as usize) * 3;
        match self.pixels.get(idx..idx + 3)? {
            &[r, g, b] => Some([r, g, b]),
            _ => None,
        }
    }
}

/// Everything the extractors gathered for one image.
///
/// Signals are optional so that a run aborted by a fatal failure can still
/// carry what it collected before stopping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub edge_density: Option<u64>,
    pub recompression_map: Option<RecompressionMap>,
    pub recognized_text: Option<String>,
    pub metadata: MetadataMap,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: AnalysisId,
    pub verdict: Verdict,
    /// Which classification rule fired (absent for `Error`).
    pub rule: Option<String>,
    /// Explanation attached to an `Error` verdict.
    pub message: Option<String>,
    pub evidence: EvidenceBundle,
}

/// JSON contract returned to whoever submitted the upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub result: Verdict,
    pub metadata: MetadataMap,
    /// Missing when the report could not be written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Page sizes the report builder can lay out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    Letter,
}

impl PaperSize {
    /// Dimensions in PostScript points (width, height).
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            Self::A4 => (595.0, 842.0),
            Self::Letter => (612.0, 792.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&Verdict::Real).unwrap(), "\"Real\"");
        assert_eq!(serde_json::to_string(&Verdict::Error).unwrap(), "\"Error\"");
        assert_eq!(Verdict::parse("Fake"), Some(Verdict::Fake));
        assert_eq!(Verdict::parse("fake"), None);
    }

    #[test]
    fn flat_differences_keep_unit_scale() {
        let map = RecompressionMap::from_raw_differences(2, 2, vec![0; 12]);
        assert_eq!(map.max_difference, 0);
        assert_eq!(map.scale, 1.0);
        assert!(map.pixels.iter().all(|&v| v == 0));
    }

    #[test]
    fn largest_difference_maps_to_255() {
        let map = RecompressionMap::from_raw_differences(1, 2, vec![0, 5, 10, 1, 2, 3]);
        assert_eq!(map.max_difference, 10);
        assert_eq!(map.pixel(0, 0), Some([0, 128, 255]));
        assert_eq!(map.pixel(0, 1), Some([26, 51, 77]));
        assert_eq!(map.pixel(1, 0), None);
    }

    #[test]
    fn deserialized_map_has_no_samples() {
        let map = RecompressionMap::from_raw_differences(2, 2, vec![1; 12]);
        let json = serde_json::to_string(&map).unwrap();
        let restored: RecompressionMap = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.dimensions(), (2, 2));
        assert_eq!(restored.max_difference, 1);
        assert!(restored.pixels.is_empty());
        assert_eq!(restored.pixel(0, 0), None);
        assert_eq!(restored.pixel(1, 1), None);
    }

    #[test]
    fn metadata_overwrite_keeps_position() {
        let mut meta = MetadataMap::new();
        meta.insert("Software".into(), "Canva".into());
        meta.insert("Image Format".into(), "PNG".into());
        meta.insert("Software".into(), "GIMP".into());
        let keys: Vec<_> = meta.keys().cloned().collect();
        assert_eq!(keys, vec!["Software", "Image Format"]);
        assert_eq!(meta["Software"], "GIMP");
    }

    #[test]
    fn upload_response_omits_missing_report_url() {
        let response = UploadResponse {
            filename: "a.png".into(),
            result: Verdict::Fake,
            metadata: MetadataMap::new(),
            report_url: None,
            message: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("report_url").is_none());
        assert_eq!(json["result"], "Fake");
    }
}
