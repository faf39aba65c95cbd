// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content integrity — digests over raw file bytes.
//
// The content digest (MD5, 128-bit) is what appears in the evidence metadata.
// SHA-256 is kept alongside it in the ledger as a collision-resistant key.

use sha2::{Digest, Sha256};

/// Compute the 128-bit content digest of `data` as a lowercase hex string.
///
/// Covers the raw byte stream, not decoded pixels, so any byte-level edit
/// changes the value even when the picture looks identical.
pub fn content_digest(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// Compute the SHA-256 hash of `data` and return it as a lowercase hex string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}
