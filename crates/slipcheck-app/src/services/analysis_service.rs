// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Analysis service — one call per upload: store the original, run the
// pipeline, write the report, append a ledger row and build the response.
//
// Only storing the upload can fail the call. Report and ledger problems are
// logged and reflected in the response; the verdict is always returned.

use std::path::{Path, PathBuf};

use slipcheck_core::AppConfig;
use slipcheck_core::error::{Result, SlipcheckError};
use slipcheck_core::human_errors::humanize_error;
use slipcheck_core::types::{AnalysisReport, UploadResponse};
use slipcheck_forensics::ocr::recognizer_from_settings;
use slipcheck_forensics::signals::recompression::save_recompression_image;
use slipcheck_forensics::{Pipeline, ReportBuilder, TextRecognizer};
use slipcheck_store::{
    AnalysisLedger, EvidenceStore, LedgerEntry, NewLedgerEntry, StoredUpload, content_digest,
    hash_bytes, report_url,
};
use tracing::{error, info, instrument, warn};

use super::data_dir::CONFIG_FILE;

/// Suffix of the error-level image written next to a report.
pub const RECOMPRESSION_SIDECAR_SUFFIX: &str = "_ela.png";

pub struct AnalysisService {
    config: AppConfig,
    store: EvidenceStore,
    /// `None` when the ledger database could not be opened.
    ledger: Option<AnalysisLedger>,
    pipeline: Pipeline,
    reports: ReportBuilder,
}

impl AnalysisService {
    /// Load settings and open every subsystem under `data_dir`.
    ///
    /// `config_path` defaults to `slipcheck.json` in the data directory; a
    /// missing file means defaults.
    pub fn init(data_dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join(CONFIG_FILE));
        let config = AppConfig::load(&config_path)?.resolve_paths(data_dir);
        info!(
            data_dir = %data_dir.display(),
            config = %config_path.display(),
            "initialising analysis service"
        );
        let recognizer = recognizer_from_settings(&config.ocr);
        Self::with_recognizer(config, recognizer)
    }

    /// Open subsystems from an already resolved `config`.
    pub fn with_recognizer(config: AppConfig, recognizer: Box<dyn TextRecognizer>) -> Result<Self> {
        let store = EvidenceStore::open(&config.upload_dir, &config.reports_dir)?;
        let ledger = match AnalysisLedger::open(&config.ledger_path) {
            Ok(ledger) => Some(ledger),
            Err(e) => {
                warn!("analysis ledger unavailable: {e}");
                None
            }
        };
        let pipeline = Pipeline::standard(&config, recognizer);
        let reports = ReportBuilder::new(config.report_paper_size);
        Ok(Self {
            config,
            store,
            ledger,
            pipeline,
            reports,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Copy `source` into the upload area and analyse it.
    ///
    /// `display_name` is what the report shows as the file name; it defaults
    /// to the source file's own name.
    #[instrument(skip_all, fields(source = %source.display(), display_name = ?display_name))]
    pub fn submit(&self, source: &Path, display_name: Option<&str>) -> Result<UploadResponse> {
        let display_name = match display_name {
            Some(name) => name.to_owned(),
            None => source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        let stored = self.store.import_upload(source, &display_name)?;
        Ok(self.analyze_stored(&stored))
    }

    /// Analyse an upload that is already in the upload area.
    #[instrument(skip_all, fields(upload = %stored.path.display()))]
    pub fn analyze_stored(&self, stored: &StoredUpload) -> UploadResponse {
        let report = self.pipeline.analyze(&stored.path);

        if self.config.keep_recompression_image {
            self.save_recompression_sidecar(stored, &report);
        }

        let mut message = report.message.clone();
        let destination = self.store.report_path(&stored.name);
        let report_name = match self.reports.build(
            &destination,
            &stored.original_filename,
            report.verdict,
            &report.evidence.metadata,
        ) {
            Ok(artifact) => Some(artifact.name),
            Err(e) => {
                error!(error = %e, "report generation failed");
                let note = humanize_error(&e).message;
                message = Some(match message {
                    Some(existing) => format!("{existing} {note}"),
                    None => note,
                });
                None
            }
        };

        self.record(stored, &report, report_name.as_deref());

        info!(
            upload = %stored.name.file_name(),
            verdict = %report.verdict,
            report = report_name.as_deref().unwrap_or("-"),
            "upload analysed"
        );
        UploadResponse {
            filename: stored.name.file_name(),
            result: report.verdict,
            metadata: report.evidence.metadata,
            report_url: report_name
                .as_deref()
                .map(|name| report_url(&self.config.report_base_url, name)),
            message,
        }
    }

    /// Most recent ledger rows, newest first.
    pub fn recent(&self, limit: u32) -> Result<Vec<LedgerEntry>> {
        self.ledger()?.recent(limit)
    }

    /// Ledger rows for uploads with this content digest.
    pub fn history_for_digest(&self, digest: &str) -> Result<Vec<LedgerEntry>> {
        self.ledger()?.for_digest(digest)
    }

    /// Path of a previously written report, for download.
    pub fn resolve_report(&self, report_name: &str) -> Result<PathBuf> {
        self.store.resolve_report(report_name)
    }

    fn ledger(&self) -> Result<&AnalysisLedger> {
        self.ledger
            .as_ref()
            .ok_or_else(|| SlipcheckError::Database("analysis ledger is not available".into()))
    }

    fn save_recompression_sidecar(&self, stored: &StoredUpload, report: &AnalysisReport) {
        let Some(map) = report.evidence.recompression_map.as_ref() else {
            return;
        };
        let path = self
            .store
            .report_sidecar_path(&stored.name, RECOMPRESSION_SIDECAR_SUFFIX);
        match save_recompression_image(map, &path) {
            Ok(()) => info!(file = %path.display(), "error-level image saved"),
            Err(e) => warn!(error = %e, "error-level image not saved"),
        }
    }

    fn record(&self, stored: &StoredUpload, report: &AnalysisReport, report_name: Option<&str>) {
        let Some(ledger) = self.ledger.as_ref() else {
            return;
        };
        let (digest, sha256) = match std::fs::read(&stored.path) {
            Ok(data) => (content_digest(&data), hash_bytes(&data)),
            Err(e) => {
                warn!(error = %e, "cannot re-read upload for ledger digests");
                ("UNKNOWN".to_owned(), "UNKNOWN".to_owned())
            }
        };
        let analysis_id = report.id.to_string();
        let upload_name = stored.name.file_name();
        let entry = NewLedgerEntry {
            analysis_id: &analysis_id,
            upload_name: &upload_name,
            content_digest: &digest,
            sha256: &sha256,
            verdict: report.verdict,
            rule: report.rule.as_deref(),
            report_name,
            details: report.message.as_deref(),
        };
        if let Err(e) = ledger.record(&entry) {
            error!(error = %e, "failed to record ledger entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, ImageFormat, Luma};
    use slipcheck_core::types::Verdict;
    use slipcheck_forensics::UnavailableRecognizer;

    struct FixedText(&'static str);

    impl TextRecognizer for FixedText {
        fn backend(&self) -> &'static str {
            "fixed"
        }

        fn recognize(&self, _image: &DynamicImage) -> Result<String> {
            Ok(self.0.to_owned())
        }
    }

    fn service(data_dir: &Path, text: &'static str, keep_ela: bool) -> AnalysisService {
        let config = AppConfig {
            keep_recompression_image: keep_ela,
            ..AppConfig::default()
        }
        .resolve_paths(data_dir);
        AnalysisService::with_recognizer(config, Box::new(FixedText(text))).unwrap()
    }

    fn screenshot(dir: &Path) -> PathBuf {
        let path = dir.join("Screenshot 2026-03-01.PNG");
        DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 60, Luma([230u8])))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    fn report_name(response: &UploadResponse) -> String {
        let url = response.report_url.as_deref().unwrap();
        url.rsplit('/').next().unwrap().to_owned()
    }

    #[test]
    fn submit_produces_real_verdict_report_and_ledger_row() {
        let data = tempfile::tempdir().unwrap();
        let input = tempfile::tempdir().unwrap();
        let service = service(data.path(), "Transaction Successful", false);

        let response = service
            .submit(&screenshot(input.path()), Some("payment.png"))
            .unwrap();
        assert_eq!(response.result, Verdict::Real);
        assert!(response.message.is_none());
        assert!(response.filename.ends_with(".png"));
        assert!(
            response
                .report_url
                .as_deref()
                .unwrap()
                .starts_with("http://127.0.0.1:5000/download_report/")
        );
        assert_eq!(response.metadata["File Name"], response.filename);

        let report = service.resolve_report(&report_name(&response)).unwrap();
        assert!(report.is_file());

        let rows = service.recent(10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].verdict, Verdict::Real);
        assert_eq!(rows[0].rule.as_deref(), Some("success-marker"));
        assert_eq!(rows[0].upload_name, response.filename);
        assert_eq!(rows[0].content_digest, response.metadata["File Hash (MD5)"]);
    }

    #[test]
    fn same_image_twice_gets_distinct_names() {
        let data = tempfile::tempdir().unwrap();
        let input = tempfile::tempdir().unwrap();
        let service = service(data.path(), "", false);
        let source = screenshot(input.path());

        let first = service.submit(&source, None).unwrap();
        let second = service.submit(&source, None).unwrap();
        assert_ne!(first.filename, second.filename);
        assert_ne!(report_name(&first), report_name(&second));

        let digest = &first.metadata["File Hash (MD5)"];
        assert_eq!(service.history_for_digest(digest).unwrap().len(), 2);
    }

    #[test]
    fn missing_engine_is_error_with_report() {
        let data = tempfile::tempdir().unwrap();
        let input = tempfile::tempdir().unwrap();
        let config = AppConfig::default().resolve_paths(data.path());
        let service = AnalysisService::with_recognizer(
            config,
            Box::new(UnavailableRecognizer::new("tesseract not found")),
        )
        .unwrap();

        let response = service.submit(&screenshot(input.path()), None).unwrap();
        assert_eq!(response.result, Verdict::Error);
        assert!(response.message.is_some());
        assert!(response.report_url.is_some());
        assert!(response.metadata.contains_key("Image Size"));
        let rows = service.recent(1).unwrap();
        assert_eq!(rows[0].verdict, Verdict::Error);
        assert!(rows[0].details.is_some());
    }

    #[test]
    fn report_failure_keeps_verdict_and_drops_url() {
        let data = tempfile::tempdir().unwrap();
        let input = tempfile::tempdir().unwrap();
        let service = service(data.path(), "Transaction Successful", false);
        std::fs::remove_dir_all(&service.config().reports_dir).unwrap();

        let response = service.submit(&screenshot(input.path()), None).unwrap();
        assert_eq!(response.result, Verdict::Real);
        assert!(response.report_url.is_none());
        assert!(response.message.is_some());
        assert!(service.recent(1).unwrap()[0].report_name.is_none());
    }

    #[test]
    fn recompression_sidecar_is_kept_when_configured() {
        let data = tempfile::tempdir().unwrap();
        let input = tempfile::tempdir().unwrap();
        let service = service(data.path(), "", true);

        let response = service.submit(&screenshot(input.path()), None).unwrap();
        let stem = response.filename.trim_end_matches(".png");
        let sidecar = service
            .config()
            .reports_dir
            .join(format!("{stem}{RECOMPRESSION_SIDECAR_SUFFIX}"));
        assert!(sidecar.is_file());
    }

    #[test]
    fn unreadable_source_is_invalid_upload() {
        let data = tempfile::tempdir().unwrap();
        let service = service(data.path(), "", false);
        let err = service
            .submit(Path::new("/nonexistent/slip.png"), None)
            .unwrap_err();
        assert!(matches!(err, SlipcheckError::InvalidUpload(_)));
        assert_eq!(service.recent(10).unwrap().len(), 0);
    }

    #[test]
    fn init_reads_config_from_data_dir() {
        let data = tempfile::tempdir().unwrap();
        std::fs::write(
            data.path().join(CONFIG_FILE),
            r#"{ "report_base_url": "https://reports.example/dl/" }"#,
        )
        .unwrap();
        let service = AnalysisService::init(data.path(), None).unwrap();
        assert_eq!(service.config().report_base_url, "https://reports.example/dl/");
        assert_eq!(service.config().upload_dir, data.path().join("uploads"));
    }
}
