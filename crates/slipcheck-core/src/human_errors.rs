// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for whoever submitted the screenshot.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The message travels with an `Error` verdict in the upload response.

use crate::error::SlipcheckError;

/// Severity of an error from the submitter's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Server-side problem; submitting again later may work.
    Transient,
    /// The submitter has to change something (different file, config fix).
    ActionRequired,
    /// This file will never analyse successfully.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the submitter should try.
    pub suggestion: String,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `SlipcheckError` into a `HumanError`.
pub fn humanize_error(err: &SlipcheckError) -> HumanError {
    match err {
        SlipcheckError::UnreadableImage(detail) => HumanError {
            message: "We couldn't open this image.".into(),
            suggestion: format!(
                "Upload the original screenshot as PNG or JPEG. ({detail})"
            ),
            severity: Severity::Permanent,
        },

        SlipcheckError::RecompressionFailed(detail) => HumanError {
            message: "Compression analysis was skipped for this image.".into(),
            suggestion: format!("The verdict was reached without it. ({detail})"),
            severity: Severity::Permanent,
        },

        SlipcheckError::EngineUnavailable(detail) => HumanError {
            message: "Text recognition is not available on this server.".into(),
            suggestion: format!(
                "Ask the operator to install Tesseract or the OCR models. ({detail})"
            ),
            severity: Severity::ActionRequired,
        },

        SlipcheckError::TextRecognition(detail) => HumanError {
            message: "We couldn't read the text in this screenshot.".into(),
            suggestion: format!("Try again in a moment. ({detail})"),
            severity: Severity::Transient,
        },

        SlipcheckError::MetadataUnavailable(detail) => HumanError {
            message: "The uploaded file disappeared before it could be checked.".into(),
            suggestion: format!("Upload the screenshot again. ({detail})"),
            severity: Severity::Transient,
        },

        SlipcheckError::ReportWriteFailed(detail) => HumanError {
            message: "The verdict is ready but the PDF report could not be saved.".into(),
            suggestion: format!("Check free disk space and permissions. ({detail})"),
            severity: Severity::Transient,
        },

        SlipcheckError::InvalidUpload(detail) => HumanError {
            message: "This upload can't be analysed.".into(),
            suggestion: format!("Choose an image file and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        SlipcheckError::Storage(detail) => HumanError {
            message: "The file could not be stored.".into(),
            suggestion: format!("Try again in a moment. ({detail})"),
            severity: Severity::Transient,
        },

        SlipcheckError::Database(detail) => HumanError {
            message: "The analysis history could not be updated.".into(),
            suggestion: format!("The verdict itself is unaffected. ({detail})"),
            severity: Severity::Transient,
        },

        SlipcheckError::Config(detail) => HumanError {
            message: "Slipcheck is misconfigured.".into(),
            suggestion: format!("Fix the configuration file and restart. ({detail})"),
            severity: Severity::ActionRequired,
        },

        SlipcheckError::Io(err) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: format!("Check permissions and free disk space. ({err})"),
            severity: Severity::Transient,
        },

        SlipcheckError::Serialization(err) => HumanError {
            message: "Something went wrong preparing the result.".into(),
            suggestion: format!("Please report this problem. ({err})"),
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_image_is_permanent() {
        let human = humanize_error(&SlipcheckError::UnreadableImage("bad header".into()));
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.suggestion.contains("bad header"));
    }

    #[test]
    fn missing_engine_is_action_required() {
        let human = humanize_error(&SlipcheckError::EngineUnavailable("no tesseract".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn vanished_file_is_transient() {
        let human = humanize_error(&SlipcheckError::MetadataUnavailable("gone".into()));
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.to_string().starts_with("The uploaded file disappeared"));
    }
}
