// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF report writer — renders a laid-out report with `printpdf` 0.8.
//
// printpdf 0.8 builds pages from `Vec<Op>` operation lists; built-in
// Helvetica fonts are used so no font files are embedded.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use slipcheck_core::error::SlipcheckError;
use slipcheck_core::types::{MetadataMap, PaperSize, Verdict};
use tracing::{debug, error, info, instrument};

use super::layout::{LineStyle, PageGeometry, ReportPage, layout};

pub const DEFAULT_REPORT_TITLE: &str = "Fake Transaction Detection Report";

/// What was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    /// File name of the report inside its directory.
    pub name: String,
    pub path: PathBuf,
    pub pages: usize,
}

/// Builds paginated analysis reports.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    paper_size: PaperSize,
    title: String,
}

impl ReportBuilder {
    pub fn new(paper_size: PaperSize) -> Self {
        Self {
            paper_size,
            title: DEFAULT_REPORT_TITLE.to_owned(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::for_paper(self.paper_size)
    }

    /// Lay out and render the report to PDF bytes. Returns the bytes and the
    /// page count.
    #[instrument(skip(self, metadata), fields(entries = metadata.len()))]
    pub fn render(
        &self,
        source_filename: &str,
        verdict: Verdict,
        metadata: &MetadataMap,
    ) -> (Vec<u8>, usize) {
        let geometry = self.geometry();
        let pages = layout(&geometry, &self.title, source_filename, verdict, metadata);
        let page_count = pages.len();

        let page_w = pt_to_mm(geometry.width);
        let page_h = pt_to_mm(geometry.height);
        let pdf_pages: Vec<PdfPage> = pages
            .iter()
            .map(|page| PdfPage::new(page_w, page_h, page_ops(page)))
            .collect();

        let mut doc = PdfDocument::new(&self.title);
        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(pages = page_count, bytes = bytes.len(), "Report rendered");
        (bytes, page_count)
    }

    /// Render the report and write it to `destination`.
    ///
    /// The file must not exist yet; reports are never overwritten. Any
    /// write failure is [`SlipcheckError::ReportWriteFailed`].
    #[instrument(skip(self, metadata), fields(destination = %destination.display()))]
    pub fn build(
        &self,
        destination: &Path,
        source_filename: &str,
        verdict: Verdict,
        metadata: &MetadataMap,
    ) -> Result<ReportArtifact, SlipcheckError> {
        let (bytes, pages) = self.render(source_filename, verdict, metadata);

        let write_failed = |err: std::io::Error| {
            error!("Report write failed: {err}");
            SlipcheckError::ReportWriteFailed(format!("{}: {}", destination.display(), err))
        };
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(destination)
            .map_err(write_failed)?;
        file.write_all(&bytes).map_err(write_failed)?;
        file.sync_all().map_err(write_failed)?;

        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(name = %name, pages, "Wrote report");
        Ok(ReportArtifact {
            name,
            path: destination.to_path_buf(),
            pages,
        })
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new(PaperSize::Letter)
    }
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

fn page_ops(page: &ReportPage) -> Vec<Op> {
    let mut ops = Vec::with_capacity(page.lines.len() * 5);
    for line in &page.lines {
        let font = match line.style {
            LineStyle::Title => BuiltinFont::HelveticaBold,
            LineStyle::Text => BuiltinFont::Helvetica,
        };
        ops.push(Op::StartTextSection);
        ops.push(Op::SetTextCursor {
            pos: Point {
                x: Pt(line.x),
                y: Pt(line.y),
            },
        });
        ops.push(Op::SetFontSizeBuiltinFont {
            size: Pt(line.style.font_size()),
            font,
        });
        ops.push(Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(line.text.clone())],
            font,
        });
        ops.push(Op::EndTextSection);
    }
    ops
}
