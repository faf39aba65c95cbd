// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report layout — positions every line before anything is rendered, so
// pagination can be checked without parsing a PDF.
//
// Each page gets a header band (title, then file name and verdict on page 1
// or a page number on later pages) followed by a fixed budget of body lines.

use slipcheck_core::types::{MetadataMap, PaperSize, Verdict};

/// Vertical positions, measured in points from the bottom edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Left edge of every line.
    pub left: f32,
    pub title_y: f32,
    /// First header line under the title.
    pub header_y: f32,
    /// Second header line (page 1 only).
    pub second_header_y: f32,
    /// Baseline of the first body line.
    pub body_top: f32,
    pub line_pitch: f32,
    /// No body line is placed below this baseline.
    pub bottom_margin: f32,
}

impl PageGeometry {
    /// Geometry anchored to the top of `paper`. On Letter the title sits at
    /// y=750 and the body starts at y=690.
    pub fn for_paper(paper: PaperSize) -> Self {
        let (width, height) = paper.dimensions_pt();
        Self {
            width,
            height,
            left: 100.0,
            title_y: height - 42.0,
            header_y: height - 62.0,
            second_header_y: height - 82.0,
            body_top: height - 102.0,
            line_pitch: 20.0,
            bottom_margin: 60.0,
        }
    }

    /// Body lines that fit between `body_top` and `bottom_margin`.
    pub fn lines_per_page(&self) -> usize {
        if self.body_top < self.bottom_margin || self.line_pitch <= 0.0 {
            return 0;
        }
        ((self.body_top - self.bottom_margin) / self.line_pitch).floor() as usize + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    /// Bold 14 pt.
    Title,
    /// Regular 12 pt.
    Text,
}

impl LineStyle {
    pub fn font_size(&self) -> f32 {
        match self {
            Self::Title => 14.0,
            Self::Text => 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub style: LineStyle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportPage {
    /// 1-based.
    pub number: usize,
    pub lines: Vec<ReportLine>,
}

impl ReportPage {
    /// Lines below the header band.
    pub fn body(&self, geometry: &PageGeometry) -> impl Iterator<Item = &ReportLine> {
        let body_top = geometry.body_top;
        self.lines.iter().filter(move |line| line.y <= body_top)
    }
}

/// Lay out a report: header band on every page, one `key: value` body line
/// per metadata entry in map order. An empty map still yields one page.
pub fn layout(
    geometry: &PageGeometry,
    title: &str,
    source_filename: &str,
    verdict: Verdict,
    metadata: &MetadataMap,
) -> Vec<ReportPage> {
    let body: Vec<String> = metadata
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();
    let budget = geometry.lines_per_page().max(1);

    let mut chunks: Vec<&[String]> = body.chunks(budget).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let number = index + 1;
            let mut lines = vec![line(geometry, title, geometry.title_y, LineStyle::Title)];
            if number == 1 {
                lines.push(line(
                    geometry,
                    &format!("File Name: {source_filename}"),
                    geometry.header_y,
                    LineStyle::Text,
                ));
                lines.push(line(
                    geometry,
                    &format!("Result: {verdict}"),
                    geometry.second_header_y,
                    LineStyle::Text,
                ));
            } else {
                lines.push(line(
                    geometry,
                    &format!("Page {number}"),
                    geometry.header_y,
                    LineStyle::Text,
                ));
            }
            for (row, text) in chunk.iter().enumerate() {
                let y = geometry.body_top - row as f32 * geometry.line_pitch;
                lines.push(line(geometry, text, y, LineStyle::Text));
            }
            ReportPage { number, lines }
        })
        .collect()
}

fn line(geometry: &PageGeometry, text: &str, y: f32, style: LineStyle) -> ReportLine {
    ReportLine {
        text: text.to_owned(),
        x: geometry.left,
        y,
        style,
    }
}
