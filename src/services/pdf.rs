//! PDF rendering for export documents
//!
//! Writes PDF 1.4 directly: one content stream per page, the built-in
//! Helvetica fonts, no external font files. Long tables paginate and repeat
//! the header row on every page.

use crate::model::export::{ColumnWidth, ExportDocument, Rgb};
use anyhow::{bail, Result};

const TITLE_FONT_SIZE: f64 = 18.0;
const TITLE_MARGIN_BOTTOM: f64 = 10.0;
const HEADER_FONT_SIZE: f64 = 10.0;
const BODY_FONT_SIZE: f64 = 9.0;
const CELL_PADDING: f64 = 4.0;
const LINE_SPACING: f64 = 1.2;

/// Render an export document to PDF bytes
pub fn render_pdf(doc: &ExportDocument) -> Result<Vec<u8>> {
    if doc.column_count() == 0 {
        bail!("document has no columns to render");
    }

    let widths = resolve_widths(doc);
    let table_width: f64 = widths.iter().sum();
    let (_, page_height) = doc.page.size();
    let left = doc.page.margins[0];
    let top = page_height - doc.page.margins[1];
    let bottom = doc.page.margins[3];

    let mut pages: Vec<String> = Vec::new();
    let mut remaining = doc.body_rows.iter().enumerate().peekable();
    let mut first_page = true;

    loop {
        let mut content = String::new();
        let mut y = top;

        if first_page {
            y -= TITLE_FONT_SIZE;
            content.push_str(&text_op("F1", TITLE_FONT_SIZE, left, y, &doc.title));
            y -= TITLE_MARGIN_BOTTOM + TITLE_FONT_SIZE * 0.2;
        }
        let table_top = y;

        // Header row
        let header_cells: Vec<Vec<String>> = doc
            .header_row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| wrap_text(&cell.text, width - CELL_PADDING * 2.0, HEADER_FONT_SIZE, cell.bold))
            .collect();
        let header_height = doc
            .header_row
            .iter()
            .zip(&header_cells)
            .map(|(cell, lines)| cell.margin_top + block_height(lines.len(), HEADER_FONT_SIZE) + CELL_PADDING)
            .fold(doc.layout.row_height(0), f64::max);

        fill_row(&mut content, doc.layout.fill_color(0), left, y, table_width, header_height);
        let mut x = left;
        for ((cell, lines), width) in doc.header_row.iter().zip(&header_cells).zip(&widths) {
            let font = if cell.bold { "F1" } else { "F2" };
            let first_baseline = y - cell.margin_top - HEADER_FONT_SIZE;
            push_lines(&mut content, font, HEADER_FONT_SIZE, x + CELL_PADDING, first_baseline, lines);
            x += width;
        }
        let mut row_bottoms = vec![y, y - header_height];
        y -= header_height;

        // Body rows that fit on this page
        let mut rows_on_page = 0;
        while let Some((index, row)) = remaining.peek() {
            let cells: Vec<Vec<String>> = widths
                .iter()
                .enumerate()
                .map(|(col, width)| {
                    let cell = row.get(col).map(String::as_str).unwrap_or("");
                    wrap_text(cell, width - CELL_PADDING * 2.0, BODY_FONT_SIZE, false)
                })
                .collect();
            let line_count = cells.iter().map(Vec::len).max().unwrap_or(1);
            let row_height = body_row_height(doc.layout.row_height(doc.layout.header_rows), line_count);

            if y - row_height < bottom && rows_on_page > 0 {
                break;
            }
            let table_row = doc.layout.header_rows + index;
            fill_row(&mut content, doc.layout.fill_color(table_row), left, y, table_width, row_height);

            // Text block centred vertically in the row
            let block = block_height(line_count, BODY_FONT_SIZE);
            let first_baseline = y - (row_height - block) / 2.0 - BODY_FONT_SIZE;
            let mut x = left;
            for (lines, width) in cells.iter().zip(&widths) {
                push_lines(&mut content, "F2", BODY_FONT_SIZE, x + CELL_PADDING, first_baseline, lines);
                x += width;
            }
            y -= row_height;
            row_bottoms.push(y);
            rows_on_page += 1;
            remaining.next();
        }

        draw_grid_lines(&mut content, doc, left, table_width, table_top, &row_bottoms, &widths);
        pages.push(content);
        first_page = false;

        if remaining.peek().is_none() {
            break;
        }
    }

    let (page_width, page_height) = doc.page.size();
    Ok(PdfBuilder::new(page_width, page_height).build(&doc.title, &pages))
}

/// Column widths in points
fn resolve_widths(doc: &ExportDocument) -> Vec<f64> {
    let usable = doc.page.usable_width();

    let natural: Vec<f64> = (0..doc.column_count())
        .map(|col| {
            let header = text_width(&doc.header_row[col].text, HEADER_FONT_SIZE, true);
            let body = doc
                .body_rows
                .iter()
                .filter_map(|r| r.get(col))
                .map(|c| text_width(c, BODY_FONT_SIZE, false))
                .fold(0.0_f64, f64::max);
            header.max(body) + CELL_PADDING * 2.0
        })
        .collect();

    let mut widths: Vec<f64> = doc
        .column_widths
        .iter()
        .zip(&natural)
        .map(|(spec, natural)| match spec {
            ColumnWidth::Percent(pct) => usable * pct / 100.0,
            ColumnWidth::Auto => *natural,
        })
        .collect();

    // Missing width specs behave like Auto
    widths.extend(natural.iter().skip(widths.len()));

    let total: f64 = widths.iter().sum();
    if total > usable {
        let scale = usable / total;
        for w in &mut widths {
            *w *= scale;
        }
    }
    widths
}

/// Approximate Helvetica advance width
fn text_width(text: &str, size: f64, bold: bool) -> f64 {
    let factor = if bold { 0.56 } else { 0.52 };
    text.chars().count() as f64 * size * factor
}

/// Height taken by `lines` lines of text
fn block_height(lines: usize, size: f64) -> f64 {
    lines.max(1) as f64 * size * LINE_SPACING
}

/// Body rows keep their layout height until the text needs more
fn body_row_height(min_height: f64, lines: usize) -> f64 {
    min_height.max(block_height(lines, BODY_FONT_SIZE) + CELL_PADDING)
}

fn push_lines(content: &mut String, font: &str, size: f64, x: f64, first_baseline: f64, lines: &[String]) {
    for (i, line) in lines.iter().enumerate() {
        let baseline = first_baseline - i as f64 * size * LINE_SPACING;
        content.push_str(&text_op(font, size, x, baseline, line));
    }
}

/// Break text into lines no wider than `max_width`
///
/// Splits at whitespace; a word wider than the column is split between
/// characters. Always returns at least one line.
fn wrap_text(text: &str, max_width: f64, size: f64, bold: bool) -> Vec<String> {
    let fits = |candidate: &str| text_width(candidate, size, bold) <= max_width;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if fits(&candidate) {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if !fits(&current) && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn fill_row(content: &mut String, color: Rgb, x: f64, top: f64, width: f64, height: f64) {
    content.push_str(&format!("{} rg\n", color.pdf_operands()));
    content.push_str(&format!(
        "{:.2} {:.2} {:.2} {:.2} re f\n",
        x,
        top - height,
        width,
        height
    ));
}

fn text_op(font: &str, size: f64, x: f64, y: f64, text: &str) -> String {
    format!(
        "{} rg\nBT\n/{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
        Rgb::BLACK.pdf_operands(),
        font,
        size,
        x,
        y,
        pdf_escape(text)
    )
}

fn draw_grid_lines(
    content: &mut String,
    doc: &ExportDocument,
    left: f64,
    table_width: f64,
    table_top: f64,
    row_bottoms: &[f64],
    widths: &[f64],
) {
    let layout = &doc.layout;
    let line_count = row_bottoms.len() - 1;

    // Horizontal: page-local top and bottom edges are outer lines
    for (index, y) in row_bottoms.iter().enumerate() {
        let color = layout.h_line_color(index, line_count);
        let width = layout.h_line_width(index, line_count);
        content.push_str(&format!("{} RG\n{:.2} w\n", color.pdf_operands(), width));
        content.push_str(&format!(
            "{:.2} {:.2} m {:.2} {:.2} l S\n",
            left,
            y,
            left + table_width,
            y
        ));
    }

    let table_bottom = row_bottoms.last().copied().unwrap_or(table_top);
    let mut x = left;
    for index in 0..=widths.len() {
        let width = layout.v_line_width(index, widths.len());
        if width > 0.0 {
            let color = layout.v_line_color(index, widths.len());
            content.push_str(&format!("{} RG\n{:.2} w\n", color.pdf_operands(), width));
            content.push_str(&format!(
                "{:.2} {:.2} m {:.2} {:.2} l S\n",
                x, table_top, x, table_bottom
            ));
        }
        if let Some(w) = widths.get(index) {
            x += w;
        }
    }
}

/// Escape a string for a PDF literal; Latin-1 goes out as octal, the rest as `?`
fn pdf_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

/// Minimal multi-page PDF file builder
struct PdfBuilder {
    width: f64,
    height: f64,
}

impl PdfBuilder {
    fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Build the complete file. Objects: 1 catalog, 2 pages, 3-4 fonts,
    /// 5 info, then a page/content pair per page.
    fn build(&self, title: &str, pages: &[String]) -> Vec<u8> {
        let mut pdf = String::new();
        let mut offsets: Vec<usize> = Vec::new();

        pdf.push_str("%PDF-1.4\n");

        offsets.push(pdf.len());
        pdf.push_str("1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        let kids: Vec<String> = (0..pages.len())
            .map(|i| format!("{} 0 R", 6 + i * 2))
            .collect();
        offsets.push(pdf.len());
        pdf.push_str(&format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            pages.len()
        ));

        offsets.push(pdf.len());
        pdf.push_str(
            "3 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>\nendobj\n",
        );

        offsets.push(pdf.len());
        pdf.push_str(
            "4 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>\nendobj\n",
        );

        offsets.push(pdf.len());
        pdf.push_str(&format!(
            "5 0 obj\n<< /Title ({}) /Producer (lwai-tui) >>\nendobj\n",
            pdf_escape(title)
        ));

        for (i, stream) in pages.iter().enumerate() {
            let page_obj = 6 + i * 2;
            let content_obj = page_obj + 1;

            offsets.push(pdf.len());
            pdf.push_str(&format!(
                "{page_obj} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.0} {:.0}] \
                 /Contents {content_obj} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> >>\nendobj\n",
                self.width, self.height
            ));

            offsets.push(pdf.len());
            pdf.push_str(&format!(
                "{content_obj} 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n",
                stream.len(),
                stream
            ));
        }

        let xref_offset = pdf.len();
        let num_objects = offsets.len() + 1;
        pdf.push_str(&format!("xref\n0 {num_objects}\n"));
        pdf.push_str("0000000000 65535 f \n");
        for offset in &offsets {
            pdf.push_str(&format!("{:010} 00000 n \n", offset));
        }

        pdf.push_str(&format!(
            "trailer\n<< /Size {num_objects} /Root 1 0 R /Info 5 0 R >>\n"
        ));
        pdf.push_str(&format!("startxref\n{xref_offset}\n%%EOF\n"));

        pdf.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::export::{HeaderCell, PageSetup, TableLayout, EXPORT_TITLE};

    fn document(rows: usize, widths: Vec<ColumnWidth>) -> ExportDocument {
        ExportDocument {
            title: EXPORT_TITLE.to_string(),
            header_row: vec![HeaderCell::new("Client Name"), HeaderCell::new("Total (USD)")],
            body_rows: (0..rows)
                .map(|i| vec![format!("Client {}", i), format!("{}", i * 1000)])
                .collect(),
            column_widths: widths,
            layout: TableLayout::default(),
            page: PageSetup::default(),
        }
    }

    fn page_count(bytes: &[u8]) -> usize {
        String::from_utf8_lossy(bytes).matches("/Type /Page ").count()
    }

    #[test]
    fn test_render_basic_pdf() {
        let bytes = render_pdf(&document(2, vec![ColumnWidth::Auto; 2])).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(text.trim_end().ends_with("%%EOF"));
        assert!(text.contains("(LW AI Data Table) Tj"));
        assert!(text.contains("(Client 1) Tj"));
        assert!(text.contains("Total \\(USD\\)"));
        assert!(text.contains("/MediaBox [0 0 842 595]"));
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn test_render_paginates_long_tables() {
        let bytes = render_pdf(&document(120, vec![ColumnWidth::Percent(50.0); 2])).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        let pages = page_count(&bytes);

        assert!(pages > 1);
        // Header repeated on each page
        assert_eq!(text.matches("(Client Name) Tj").count(), pages);
        assert!(text.contains("(Client 119) Tj"));
    }

    #[test]
    fn test_render_empty_body() {
        let bytes = render_pdf(&document(0, vec![ColumnWidth::Auto; 2])).unwrap();
        assert_eq!(page_count(&bytes), 1);
    }

    #[test]
    fn test_render_rejects_document_without_columns() {
        let mut doc = document(0, vec![]);
        doc.header_row.clear();
        assert!(render_pdf(&doc).is_err());
    }

    #[test]
    fn test_percent_widths_share_page() {
        let doc = document(1, vec![ColumnWidth::Percent(50.0); 2]);
        let widths = resolve_widths(&doc);
        assert_eq!(widths, vec![411.0, 411.0]);
    }

    #[test]
    fn test_auto_widths_scale_down_when_too_wide() {
        let mut doc = document(1, vec![ColumnWidth::Auto; 2]);
        doc.body_rows[0][0] = "x".repeat(500);
        let widths = resolve_widths(&doc);
        let total: f64 = widths.iter().sum();
        assert!(total <= doc.page.usable_width() + 0.001);
    }

    #[test]
    fn test_wrap_text_keeps_every_word() {
        let text = "1234 Longview Boulevard, Springfield, IL 62704";
        let lines = wrap_text(text, 60.0, BODY_FONT_SIZE, false);

        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), text);
        assert!(lines.iter().all(|l| text_width(l, BODY_FONT_SIZE, false) <= 60.0));
        assert_eq!(wrap_text("short", 500.0, 10.0, false), vec!["short"]);
        assert_eq!(wrap_text("", 500.0, 10.0, false), vec![""]);
    }

    #[test]
    fn test_wrap_text_splits_long_words() {
        let word = "x".repeat(40);
        let lines = wrap_text(&word, 30.0, 10.0, false);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn test_long_cells_wrap_instead_of_truncating() {
        let address = "1234 Longview Boulevard, Springfield, IL 62704";
        let doc = ExportDocument {
            title: EXPORT_TITLE.to_string(),
            header_row: (0..8).map(|i| HeaderCell::new(format!("Column {}", i))).collect(),
            body_rows: vec![(0..8).map(|_| address.to_string()).collect()],
            column_widths: vec![ColumnWidth::Percent(12.5); 8],
            layout: TableLayout::default(),
            page: PageSetup::default(),
        };
        let bytes = render_pdf(&doc).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(!text.contains("...) Tj"));
        let widths = resolve_widths(&doc);
        for line in wrap_text(address, widths[0] - CELL_PADDING * 2.0, BODY_FONT_SIZE, false) {
            assert!(text.contains(&format!("({}) Tj", line)), "missing {line}");
        }
    }

    #[test]
    fn test_wrapped_rows_grow_and_still_paginate() {
        assert_eq!(body_row_height(15.0, 1), 15.0);
        assert!(body_row_height(15.0, 4) > 40.0);

        let mut doc = document(60, vec![ColumnWidth::Percent(5.0), ColumnWidth::Percent(95.0)]);
        for row in &mut doc.body_rows {
            row[0] = "several words that need wrapping".to_string();
        }
        let tall = page_count(&render_pdf(&doc).unwrap());
        let short = page_count(&render_pdf(&document(60, vec![ColumnWidth::Percent(5.0), ColumnWidth::Percent(95.0)])).unwrap());
        assert!(tall > short);
    }

    #[test]
    fn test_pdf_escape() {
        assert_eq!(pdf_escape("hello"), "hello");
        assert_eq!(pdf_escape("(test)"), "\\(test\\)");
        assert_eq!(pdf_escape("a\\b"), "a\\\\b");
        assert_eq!(pdf_escape("café"), "caf\\351");
        assert_eq!(pdf_escape("→"), "?");
    }
}
