// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error-level analysis — re-encode the screenshot as JPEG, decode it again,
// and map the per-channel difference against the original.
//
// Regions pasted in after the last compression pass lack the quantisation
// pattern of their surroundings and recompress with a larger difference.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use slipcheck_core::config::DEFAULT_RECOMPRESSION_QUALITY;
use slipcheck_core::error::SlipcheckError;
use slipcheck_core::types::{EvidenceBundle, RecompressionMap};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use super::EvidenceExtractor;
use crate::image::loader::ForensicImage;

/// Compute the normalized error-level map of `image`.
///
/// The recompressed copy goes to a scratch file in `scratch_dir` (the system
/// temp dir when `None`) that is removed when this function returns,
/// whether it succeeds or not.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn recompression_map(
    image: &DynamicImage,
    quality: u8,
    scratch_dir: Option<&Path>,
) -> Result<RecompressionMap, SlipcheckError> {
    let original = image.to_rgb8();
    let (width, height) = original.dimensions();

    let mut scratch = create_scratch(scratch_dir)?;
    {
        let mut writer = BufWriter::new(scratch.as_file_mut());
        let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
        original.write_with_encoder(encoder).map_err(|err| {
            SlipcheckError::RecompressionFailed(format!("JPEG encoding failed: {}", err))
        })?;
        writer.flush().map_err(|err| {
            SlipcheckError::RecompressionFailed(format!("scratch write failed: {}", err))
        })?;
    }
    debug!(scratch = %scratch.path().display(), quality, "Recompressed copy written");

    let mut reader = ImageReader::open(scratch.path()).map_err(|err| {
        SlipcheckError::RecompressionFailed(format!("scratch reopen failed: {}", err))
    })?;
    reader.set_format(ImageFormat::Jpeg);
    let recompressed = reader
        .decode()
        .map_err(|err| {
            SlipcheckError::RecompressionFailed(format!("JPEG decoding failed: {}", err))
        })?
        .to_rgb8();

    if recompressed.dimensions() != (width, height) {
        return Err(SlipcheckError::RecompressionFailed(format!(
            "recompressed copy is {:?}, original is {:?}",
            recompressed.dimensions(),
            (width, height)
        )));
    }

    let raw: Vec<u8> = original
        .as_raw()
        .iter()
        .zip(recompressed.as_raw())
        .map(|(a, b)| a.abs_diff(*b))
        .collect();

    let map = RecompressionMap::from_raw_differences(width, height, raw);
    debug!(
        max_difference = map.max_difference,
        scale = map.scale,
        "Error-level map computed"
    );
    Ok(map)
}

/// Render a map as an RGB image for human review.
pub fn recompression_image(map: &RecompressionMap) -> Option<RgbImage> {
    RgbImage::from_raw(map.width, map.height, map.pixels.clone())
}

/// Write the map as a PNG.
pub fn save_recompression_image(
    map: &RecompressionMap,
    path: impl AsRef<Path>,
) -> Result<(), SlipcheckError> {
    let image = recompression_image(map).ok_or_else(|| {
        SlipcheckError::RecompressionFailed("map buffer does not match its dimensions".into())
    })?;
    image
        .save_with_format(path.as_ref(), ImageFormat::Png)
        .map_err(|err| {
            SlipcheckError::RecompressionFailed(format!(
                "failed to save {}: {}",
                path.as_ref().display(),
                err
            ))
        })
}

fn create_scratch(scratch_dir: Option<&Path>) -> Result<NamedTempFile, SlipcheckError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("slipcheck-ela-").suffix(".jpg");
    let scratch = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    };
    scratch.map_err(|err| {
        SlipcheckError::RecompressionFailed(format!("cannot create scratch file: {}", err))
    })
}

/// Extractor wrapper around [`recompression_map`].
#[derive(Debug, Clone)]
pub struct RecompressionExtractor {
    quality: u8,
    scratch_dir: Option<PathBuf>,
}

impl RecompressionExtractor {
    pub fn new(quality: u8, scratch_dir: Option<PathBuf>) -> Self {
        Self {
            quality,
            scratch_dir,
        }
    }
}

impl Default for RecompressionExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_RECOMPRESSION_QUALITY, None)
    }
}

impl EvidenceExtractor for RecompressionExtractor {
    fn stage(&self) -> &'static str {
        "recompression"
    }

    #[instrument(skip_all, fields(path = %path.display(), quality = self.quality))]
    fn extract(&self, path: &Path, evidence: &mut EvidenceBundle) -> Result<(), SlipcheckError> {
        // Decode problems are reported by the fatal stages; here they only
        // mean the signal is missing.
        let image = ForensicImage::open(path)
            .map_err(|err| SlipcheckError::RecompressionFailed(err.to_string()))?;
        let map = recompression_map(image.as_dynamic(), self.quality, self.scratch_dir.as_deref())?;
        evidence.recompression_map = Some(map);
        Ok(())
    }
}
