// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metadata — embedded EXIF tags plus file attributes derived from the upload.
//
// Embedded tags go in first, derived attributes after them, so on a name
// collision the derived value wins.

use std::io::Cursor;
use std::path::Path;

use chrono::{DateTime, Local};
use exif::{Field, In, Reader, Value};
use image::{ImageDecoder, ImageReader};
use slipcheck_core::error::SlipcheckError;
use slipcheck_core::types::{EvidenceBundle, MetadataMap};
use slipcheck_store::integrity::content_digest;
use tracing::{debug, instrument};

use super::EvidenceExtractor;
use crate::image::loader::{color_mode, format_tag, is_palette_png};

pub const FILE_NAME_KEY: &str = "File Name";
pub const FILE_SIZE_KEY: &str = "File Size (Bytes)";
pub const LAST_MODIFIED_KEY: &str = "Last Modified";
pub const CONTENT_DIGEST_KEY: &str = "File Hash (MD5)";
pub const IMAGE_FORMAT_KEY: &str = "Image Format";
pub const IMAGE_MODE_KEY: &str = "Image Mode";
pub const IMAGE_SIZE_KEY: &str = "Image Size";

/// Keys every metadata map carries, in the order they are written.
pub const DERIVED_KEYS: [&str; 7] = [
    FILE_NAME_KEY,
    FILE_SIZE_KEY,
    LAST_MODIFIED_KEY,
    CONTENT_DIGEST_KEY,
    IMAGE_FORMAT_KEY,
    IMAGE_MODE_KEY,
    IMAGE_SIZE_KEY,
];

/// Placeholder for attributes that could not be determined from the header.
const UNKNOWN: &str = "UNKNOWN";

/// Read the metadata of the file at `path`.
///
/// Only a failure to read the file at all is an error
/// ([`SlipcheckError::MetadataUnavailable`]); missing tags or an undecodable
/// header just leave less to report.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn extract_metadata(path: impl AsRef<Path>) -> Result<MetadataMap, SlipcheckError> {
    let path = path.as_ref();
    let unavailable = |err: std::io::Error| {
        SlipcheckError::MetadataUnavailable(format!("{}: {}", path.display(), err))
    };
    let data = std::fs::read(path).map_err(unavailable)?;
    let attributes = std::fs::metadata(path).map_err(unavailable)?;

    let mut metadata = embedded_tags(&data);
    debug!(embedded = metadata.len(), "Embedded tags read");

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let modified = attributes
        .modified()
        .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| UNKNOWN.to_owned());
    let header = read_header(&data);

    metadata.insert(FILE_NAME_KEY.to_owned(), file_name);
    metadata.insert(FILE_SIZE_KEY.to_owned(), attributes.len().to_string());
    metadata.insert(LAST_MODIFIED_KEY.to_owned(), modified);
    metadata.insert(CONTENT_DIGEST_KEY.to_owned(), content_digest(&data));
    metadata.insert(IMAGE_FORMAT_KEY.to_owned(), header.format);
    metadata.insert(IMAGE_MODE_KEY.to_owned(), header.mode);
    metadata.insert(IMAGE_SIZE_KEY.to_owned(), header.size);

    debug!(entries = metadata.len(), "Metadata extracted");
    Ok(metadata)
}

/// Primary-image EXIF fields keyed by tag name.
///
/// Tags the EXIF table does not know are keyed by their numeric id.
pub fn embedded_tags(data: &[u8]) -> MetadataMap {
    let mut tags = MetadataMap::new();
    let exif = match Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(err) => {
            debug!("no embedded tags: {err}");
            return tags;
        }
    };

    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        tags.insert(tag_name(field), field_value(field));
    }
    tags
}

fn tag_name(field: &Field) -> String {
    match field.tag.description() {
        Some(_) => field.tag.to_string(),
        None => field.tag.number().to_string(),
    }
}

fn field_value(field: &Field) -> String {
    if let Value::Ascii(ref parts) = field.value {
        return parts
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string())
            .collect::<Vec<_>>()
            .join(", ");
    }
    field.display_value().to_string()
}

struct HeaderInfo {
    format: String,
    mode: String,
    size: String,
}

/// Format, color mode and `WxH` from the image header without decoding pixels.
fn read_header(data: &[u8]) -> HeaderInfo {
    let mut info = HeaderInfo {
        format: UNKNOWN.to_owned(),
        mode: UNKNOWN.to_owned(),
        size: UNKNOWN.to_owned(),
    };
    let reader = match ImageReader::new(Cursor::new(data)).with_guessed_format() {
        Ok(reader) => reader,
        Err(_) => return info,
    };
    if let Some(format) = reader.format() {
        info.format = format_tag(format);
    }
    if let Ok(decoder) = reader.into_decoder() {
        let (width, height) = decoder.dimensions();
        info.mode = color_mode(decoder.color_type()).to_owned();
        info.size = format!("{width}x{height}");
    }
    if is_palette_png(data) {
        info.mode = "P".to_owned();
    }
    info
}

/// Extractor wrapper around [`extract_metadata`].
#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor;

impl EvidenceExtractor for MetadataExtractor {
    fn stage(&self) -> &'static str {
        "metadata"
    }

    fn extract(&self, path: &Path, evidence: &mut EvidenceBundle) -> Result<(), SlipcheckError> {
        let metadata = extract_metadata(path)?;
        // Keys already present in the bundle are replaced in place.
        evidence.metadata.extend(metadata);
        Ok(())
    }
}
