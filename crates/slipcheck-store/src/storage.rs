// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Append-only storage areas — uploaded originals and generated reports.
//
// Every upload gets a fresh `{timestamp}_{suffix}{ext}` name so that
// concurrent requests never share a file. Files are created with
// `create_new` and are never overwritten or deleted here.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use slipcheck_core::error::SlipcheckError;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Length of the random part of a generated name.
const SUFFIX_LEN: usize = 6;

/// How many fresh names to try before giving up on a collision.
const MAX_NAME_ATTEMPTS: usize = 4;

/// Generated identity shared by an upload and its report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredName {
    /// `YYYYmmddHHMMSS_xxxxxx`
    pub stem: String,
    /// Lowercased extension of the submitted file including the dot, or "".
    pub extension: String,
}

impl StoredName {
    /// Build a new name from the current local time and a random suffix.
    pub fn generate(original_filename: &str) -> Self {
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(SUFFIX_LEN)
            .collect();
        Self::at(Local::now(), &suffix, original_filename)
    }

    /// Build a name from explicit parts.
    pub fn at(timestamp: DateTime<Local>, suffix: &str, original_filename: &str) -> Self {
        let extension = Path::new(original_filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        Self {
            stem: format!("{}_{}", timestamp.format("%Y%m%d%H%M%S"), suffix),
            extension,
        }
    }

    /// File name of the stored upload.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.stem, self.extension)
    }

    /// File name of the report generated for this upload.
    pub fn report_name(&self) -> String {
        format!("{}.pdf", self.stem)
    }
}

/// An upload persisted in the upload area.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub name: StoredName,
    pub path: PathBuf,
    /// Display name the submitter chose.
    pub original_filename: String,
}

/// The two append-only areas a deployment writes to.
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    upload_dir: PathBuf,
    reports_dir: PathBuf,
}

impl EvidenceStore {
    /// Open (and create if needed) both storage areas.
    #[instrument(skip_all, fields(
        uploads = %upload_dir.as_ref().display(),
        reports = %reports_dir.as_ref().display(),
    ))]
    pub fn open(
        upload_dir: impl AsRef<Path>,
        reports_dir: impl AsRef<Path>,
    ) -> Result<Self, SlipcheckError> {
        let upload_dir = upload_dir.as_ref().to_path_buf();
        let reports_dir = reports_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&upload_dir).map_err(|err| {
            SlipcheckError::Storage(format!("cannot create {}: {}", upload_dir.display(), err))
        })?;
        std::fs::create_dir_all(&reports_dir).map_err(|err| {
            SlipcheckError::Storage(format!("cannot create {}: {}", reports_dir.display(), err))
        })?;
        debug!("evidence store opened");
        Ok(Self {
            upload_dir,
            reports_dir,
        })
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Persist uploaded bytes under a freshly generated name.
    #[instrument(skip(self, data), fields(data_len = data.len()))]
    pub fn store_upload(
        &self,
        data: &[u8],
        original_filename: &str,
    ) -> Result<StoredUpload, SlipcheckError> {
        if original_filename.trim().is_empty() {
            return Err(SlipcheckError::InvalidUpload("no file selected".into()));
        }
        if data.is_empty() {
            return Err(SlipcheckError::InvalidUpload(format!(
                "{original_filename} is empty"
            )));
        }

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = StoredName::generate(original_filename);
            let path = self.upload_dir.join(name.file_name());
            match write_new(&path, data) {
                Ok(()) => {
                    info!(file = %path.display(), "upload stored");
                    return Ok(StoredUpload {
                        name,
                        path,
                        original_filename: original_filename.to_owned(),
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(file = %path.display(), "generated name already taken");
                }
                Err(err) => {
                    return Err(SlipcheckError::Storage(format!(
                        "failed to save {}: {}",
                        path.display(),
                        err
                    )));
                }
            }
        }
        Err(SlipcheckError::Storage(
            "could not find a free upload name".into(),
        ))
    }

    /// Copy an existing file into the upload area.
    pub fn import_upload(
        &self,
        source: impl AsRef<Path>,
        original_filename: &str,
    ) -> Result<StoredUpload, SlipcheckError> {
        let data = std::fs::read(source.as_ref()).map_err(|err| {
            SlipcheckError::InvalidUpload(format!(
                "cannot read {}: {}",
                source.as_ref().display(),
                err
            ))
        })?;
        self.store_upload(&data, original_filename)
    }

    /// Where the report for `name` belongs.
    pub fn report_path(&self, name: &StoredName) -> PathBuf {
        self.reports_dir.join(name.report_name())
    }

    /// Where an auxiliary artifact (e.g. the ELA image) for `name` belongs.
    pub fn report_sidecar_path(&self, name: &StoredName, suffix: &str) -> PathBuf {
        self.reports_dir.join(format!("{}{}", name.stem, suffix))
    }

    /// Look up a stored report by its file name for download.
    pub fn resolve_report(&self, report_name: &str) -> Result<PathBuf, SlipcheckError> {
        if report_name.is_empty()
            || report_name.contains('/')
            || report_name.contains('\\')
            || report_name.contains("..")
        {
            return Err(SlipcheckError::Storage(format!(
                "invalid report name {report_name:?}"
            )));
        }
        let path = self.reports_dir.join(report_name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(SlipcheckError::Storage(format!(
                "report not found: {report_name}"
            )))
        }
    }
}

/// Download URL for a report, as returned to the submitter.
pub fn report_url(base_url: &str, report_name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), report_name)
}

fn write_new(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_store() -> (tempfile::TempDir, EvidenceStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = EvidenceStore::open(dir.path().join("uploads"), dir.path().join("reports"))
            .expect("open store");
        (dir, store)
    }

    #[test]
    fn name_follows_timestamp_suffix_scheme() {
        let ts = Local.with_ymd_and_hms(2025, 3, 9, 14, 5, 7).unwrap();
        let name = StoredName::at(ts, "a1b2c3", "Receipt.JPG");
        assert_eq!(name.file_name(), "20250309140507_a1b2c3.jpg");
        assert_eq!(name.report_name(), "20250309140507_a1b2c3.pdf");
    }

    #[test]
    fn name_without_extension() {
        let ts = Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let name = StoredName::at(ts, "zzzzzz", "screenshot");
        assert_eq!(name.file_name(), "20250101000000_zzzzzz");
    }

    #[test]
    fn generated_suffix_is_lowercase_alphanumeric() {
        let name = StoredName::generate("x.png");
        let suffix = name.stem.split('_').nth(1).unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn store_upload_writes_bytes() {
        let (_dir, store) = make_store();
        let stored = store.store_upload(b"\x89PNG fake", "pay.png").unwrap();
        assert!(stored.path.starts_with(store.upload_dir()));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"\x89PNG fake");
        assert_eq!(stored.original_filename, "pay.png");
    }

    #[test]
    fn two_uploads_never_collide() {
        let (_dir, store) = make_store();
        let a = store.store_upload(b"one", "same.png").unwrap();
        let b = store.store_upload(b"two", "same.png").unwrap();
        assert_ne!(a.path, b.path);
        assert_eq!(std::fs::read(&a.path).unwrap(), b"one");
    }

    #[test]
    fn empty_filename_is_rejected() {
        let (_dir, store) = make_store();
        let err = store.store_upload(b"data", "  ").unwrap_err();
        assert!(matches!(err, SlipcheckError::InvalidUpload(_)));
    }

    #[test]
    fn resolve_report_rejects_traversal_and_missing() {
        let (_dir, store) = make_store();
        assert!(store.resolve_report("../ledger.db").is_err());
        assert!(store.resolve_report("nope.pdf").is_err());

        std::fs::write(store.reports_dir().join("r.pdf"), b"%PDF").unwrap();
        assert!(store.resolve_report("r.pdf").is_ok());
    }

    #[test]
    fn report_url_joins_cleanly() {
        assert_eq!(
            report_url("http://127.0.0.1:5000/download_report/", "a.pdf"),
            "http://127.0.0.1:5000/download_report/a.pdf"
        );
    }
}
