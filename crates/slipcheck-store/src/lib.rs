// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! slipcheck-store — Durable side of a screenshot analysis.
//!
//! Content digests that fingerprint the exact uploaded byte stream, the two
//! append-only storage areas (uploaded originals and generated reports), and
//! an append-only SQLite ledger with one row per analysis.

pub mod integrity;
pub mod ledger;
pub mod storage;

// PUBLIC API: Re-export the store primitives
pub use integrity::{content_digest, hash_bytes};
pub use ledger::{AnalysisLedger, LedgerEntry, NewLedgerEntry};
pub use storage::{EvidenceStore, StoredName, StoredUpload, report_url};
