// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decoding plus the format and color-mode tags the evidence
// metadata reports.

pub mod loader;

pub use loader::ForensicImage;
