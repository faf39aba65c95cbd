// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image loader — decodes a submitted screenshot with the `image` crate and
// names container formats and color modes the way the evidence metadata
// reports them.

use std::path::Path;

use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use slipcheck_core::error::SlipcheckError;
use tracing::{info, instrument};

/// PNG file signature.
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// IHDR color type of an indexed-color PNG.
const PNG_COLOR_TYPE_PALETTE: u8 = 3;

/// A decoded, read-only screenshot.
///
/// Each extractor opens its own `ForensicImage` from the upload path instead
/// of sharing one, so no extractor can observe another's conversions.
pub struct ForensicImage {
    image: DynamicImage,
}

impl ForensicImage {
    /// Decode an image from a file path.
    ///
    /// The format is sniffed from the content, not the extension.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SlipcheckError> {
        let path = path.as_ref();
        let reader = ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|err| {
                SlipcheckError::UnreadableImage(format!(
                    "failed to open {}: {}",
                    path.display(),
                    err
                ))
            })?;
        let format = reader.format();
        let image = reader.decode().map_err(|err| {
            SlipcheckError::UnreadableImage(format!(
                "failed to decode {}: {}",
                path.display(),
                err
            ))
        })?;
        info!(
            width = image.width(),
            height = image.height(),
            format = ?format,
            "Image loaded"
        );
        Ok(Self { image })
    }

    /// Borrow the decoded pixels.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }
}

/// Upper-case name of a container format.
pub fn format_tag(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_owned(),
        ImageFormat::Png => "PNG".to_owned(),
        ImageFormat::Gif => "GIF".to_owned(),
        ImageFormat::WebP => "WEBP".to_owned(),
        ImageFormat::Tiff => "TIFF".to_owned(),
        ImageFormat::Bmp => "BMP".to_owned(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

/// Short color-mode label (`L`, `RGB`, `RGBA`, ...).
///
/// Decoders expand indexed color, so a palette image arrives here as RGB or
/// RGBA; see [`is_palette_png`] for recovering `P` from the file header.
pub fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F32",
        ColorType::Rgba32F => "RGBA;F32",
        _ => "UNKNOWN",
    }
}

/// Whether `data` is a PNG whose IHDR declares indexed color.
pub fn is_palette_png(data: &[u8]) -> bool {
    data.len() > 25
        && data[..8] == PNG_SIGNATURE
        && &data[12..16] == b"IHDR"
        && data[25] == PNG_COLOR_TYPE_PALETTE
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn png_saved_as_jpg_still_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("looks-like.jpg");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 3, Rgb([1, 2, 3])));
        std::fs::write(&path, png_bytes(&img)).unwrap();

        let loaded = ForensicImage::open(&path).unwrap();
        assert_eq!(loaded.as_dynamic().width(), 4);
        assert_eq!(color_mode(loaded.as_dynamic().color()), "RGB");
    }

    #[test]
    fn gray_image_reports_l_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([9])));
        std::fs::write(&path, png_bytes(&img)).unwrap();
        let loaded = ForensicImage::open(&path).unwrap();
        assert_eq!(color_mode(loaded.as_dynamic().color()), "L");
    }

    #[test]
    fn garbage_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let err = ForensicImage::open(&path).err().unwrap();
        assert!(matches!(err, SlipcheckError::UnreadableImage(_)));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let err = ForensicImage::open("/nonexistent/shot.png").err().unwrap();
        assert!(matches!(err, SlipcheckError::UnreadableImage(_)));
    }

    #[test]
    fn format_tags_are_upper_case() {
        assert_eq!(format_tag(ImageFormat::Jpeg), "JPEG");
        assert_eq!(format_tag(ImageFormat::WebP), "WEBP");
        assert_eq!(format_tag(ImageFormat::Ico), "ICO");
    }

    #[test]
    fn palette_color_type_is_read_from_ihdr() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let mut data = png_bytes(&img);
        assert!(!is_palette_png(&data));
        data[25] = PNG_COLOR_TYPE_PALETTE;
        assert!(is_palette_png(&data));
        assert!(!is_palette_png(b"GIF89a"));
    }
}
