// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlipcheckError};
use crate::types::{PaperSize, Verdict};

/// Terms whose presence in recognized text marks a screenshot as edited.
pub const DEFAULT_SUSPICIOUS_TERMS: [&str; 4] = ["Edited", "Fake", "Photoshop", "Canva"];

/// Text an authentic confirmation screen is expected to show.
pub const DEFAULT_SUCCESS_MARKER: &str = "Transaction Successful";

/// Edge density above which an image is always treated as manipulated.
pub const DEFAULT_FAKE_EDGE_DENSITY: u64 = 900_000;

/// Edge density a `Real` verdict must stay strictly below.
pub const DEFAULT_REAL_EDGE_DENSITY_CEILING: u64 = 400_000;

/// Verdict for evidence that matches neither rule (default-deny).
pub const AMBIGUOUS_VERDICT: Verdict = Verdict::Fake;

/// Default JPEG quality for the error-level recompression pass.
pub const DEFAULT_RECOMPRESSION_QUALITY: u8 = 90;

/// Rule parameters for the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationPolicy {
    /// Case-sensitive substrings that force a `Fake` verdict.
    pub suspicious_terms: Vec<String>,
    /// Substring required for a `Real` verdict.
    pub success_marker: String,
    /// `edge_density` strictly above this forces `Fake`.
    pub fake_edge_density: u64,
    /// `edge_density` must be strictly below this for `Real`.
    pub real_edge_density_ceiling: u64,
    /// Verdict when no rule matches.
    pub ambiguous_verdict: Verdict,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            suspicious_terms: DEFAULT_SUSPICIOUS_TERMS
                .iter()
                .map(|t| (*t).to_owned())
                .collect(),
            success_marker: DEFAULT_SUCCESS_MARKER.to_owned(),
            fake_edge_density: DEFAULT_FAKE_EDGE_DENSITY,
            real_edge_density_ceiling: DEFAULT_REAL_EDGE_DENSITY_CEILING,
            ambiguous_verdict: AMBIGUOUS_VERDICT,
        }
    }
}

/// Which text recognition engine to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackendKind {
    /// External `tesseract` executable.
    Tesseract,
    /// Built-in `ocrs` engine (requires the `ocr` feature).
    Ocrs,
}

/// Text recognition settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub backend: OcrBackendKind,
    /// Executable name or path for the Tesseract backend.
    pub tesseract_binary: PathBuf,
    /// Tesseract language code.
    pub language: String,
    /// Directory holding the `ocrs` models; the ocrs cache dir when unset.
    pub model_dir: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::Tesseract,
            tesseract_binary: PathBuf::from("tesseract"),
            language: "eng".to_owned(),
            model_dir: None,
        }
    }
}

/// Persistent application settings.
///
/// Relative paths are resolved against the data directory by
/// [`AppConfig::resolve_paths`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Append-only area for uploaded originals.
    pub upload_dir: PathBuf,
    /// Append-only area for generated reports.
    pub reports_dir: PathBuf,
    /// Where recompression scratch files go (system temp dir when unset).
    pub scratch_dir: Option<PathBuf>,
    /// SQLite analysis ledger.
    pub ledger_path: PathBuf,
    /// Prefix for the `report_url` field of upload responses.
    pub report_base_url: String,
    /// JPEG quality used for error-level analysis (1-100).
    pub recompression_quality: u8,
    /// Persist the normalized error-level map next to each report.
    pub keep_recompression_image: bool,
    /// Page size of generated reports.
    pub report_paper_size: PaperSize,
    pub ocr: OcrSettings,
    pub policy: ClassificationPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            reports_dir: PathBuf::from("reports"),
            scratch_dir: None,
            ledger_path: PathBuf::from("ledger.db"),
            report_base_url: "http://127.0.0.1:5000/download_report".to_owned(),
            recompression_quality: DEFAULT_RECOMPRESSION_QUALITY,
            keep_recompression_image: false,
            report_paper_size: PaperSize::Letter,
            ocr: OcrSettings::default(),
            policy: ClassificationPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file.
    ///
    /// A missing file yields the defaults; a file that exists but does not
    /// parse is a [`SlipcheckError::Config`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_str(&data).map_err(|err| {
            SlipcheckError::Config(format!("{}: {}", path.display(), err))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.recompression_quality) {
            return Err(SlipcheckError::Config(format!(
                "recompression_quality must be 1-100, got {}",
                self.recompression_quality
            )));
        }
        if self.policy.success_marker.is_empty() {
            return Err(SlipcheckError::Config(
                "policy.success_marker must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Anchor relative storage paths under `data_dir`.
    pub fn resolve_paths(mut self, data_dir: &Path) -> Self {
        let anchor = |p: PathBuf| if p.is_relative() { data_dir.join(p) } else { p };
        self.upload_dir = anchor(self.upload_dir);
        self.reports_dir = anchor(self.reports_dir);
        self.ledger_path = anchor(self.ledger_path);
        self.scratch_dir = self.scratch_dir.map(anchor);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_documented_thresholds() {
        let policy = ClassificationPolicy::default();
        assert_eq!(policy.suspicious_terms, vec!["Edited", "Fake", "Photoshop", "Canva"]);
        assert_eq!(policy.fake_edge_density, 900_000);
        assert_eq!(policy.real_edge_density_ceiling, 400_000);
        assert_eq!(policy.ambiguous_verdict, Verdict::Fake);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "recompression_quality": 75, "ocr": { "language": "deu" } }"#)
                .unwrap();
        assert_eq!(config.recompression_quality, 75);
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.ocr.backend, OcrBackendKind::Tesseract);
        assert_eq!(config.policy, ClassificationPolicy::default());
    }

    #[test]
    fn resolve_paths_keeps_absolute_entries() {
        let mut config = AppConfig::default();
        config.reports_dir = PathBuf::from("/srv/reports");
        let config = config.resolve_paths(Path::new("/data"));
        assert_eq!(config.upload_dir, PathBuf::from("/data/uploads"));
        assert_eq!(config.reports_dir, PathBuf::from("/srv/reports"));
        assert_eq!(config.ledger_path, PathBuf::from("/data/ledger.db"));
    }

    #[test]
    fn out_of_range_quality_is_rejected() {
        let mut config = AppConfig::default();
        config.recompression_quality = 0;
        assert!(matches!(config.validate(), Err(SlipcheckError::Config(_))));
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = AppConfig::load("/nonexistent/slipcheck.json").unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
