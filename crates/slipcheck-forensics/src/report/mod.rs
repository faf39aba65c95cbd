// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report module — page layout and PDF rendering of analysis findings.

pub mod layout;
pub mod writer;

pub use layout::{PageGeometry, ReportPage, layout};
pub use writer::{DEFAULT_REPORT_TITLE, ReportArtifact, ReportBuilder};
