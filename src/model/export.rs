//! Export document model
//!
//! A fixed, print-ready layout of the grid: header row, body rows, column
//! widths, and the table styling rules. Built on demand when the user exports
//! and dropped once the document has been produced.

/// Title printed above the table
pub const EXPORT_TITLE: &str = "LW AI Data Table";

/// File name used for downloads and the email side channel
pub const PDF_FILE_NAME: &str = "lw-ai-data-table.pdf";

/// File name used for CSV downloads
pub const CSV_FILE_NAME: &str = "lw-ai-data-table.csv";

/// RGB colour used by the document layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);

    /// PDF colour operands in the 0..1 range
    pub fn pdf_operands(&self) -> String {
        format!(
            "{:.3} {:.3} {:.3}",
            self.0 as f64 / 255.0,
            self.1 as f64 / 255.0,
            self.2 as f64 / 255.0
        )
    }
}

pub const HEADER_ROW_COLOR: Rgb = Rgb(0xf8, 0xf8, 0xf8);
pub const EVEN_ROW_COLOR: Rgb = Rgb(0xfc, 0xfc, 0xfc);
pub const ODD_ROW_COLOR: Rgb = Rgb::WHITE;
pub const INNER_BORDER_COLOR: Rgb = Rgb(0xdd, 0xe2, 0xeb);
pub const OUTER_BORDER_COLOR: Rgb = Rgb(0xba, 0xbf, 0xc7);

/// Width specification for one column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    /// Share of the usable page width, in percent
    Percent(f64),
    /// Sized from the column content
    Auto,
}

/// A header cell: bold text with a fixed top margin
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub text: String,
    pub bold: bool,
    pub margin_top: f64,
}

impl HeaderCell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            margin_top: 12.0,
        }
    }
}

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Page geometry in PDF points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub orientation: Orientation,
    /// left, top, right, bottom
    pub margins: [f64; 4],
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            orientation: Orientation::Landscape,
            margins: [10.0, 10.0, 10.0, 10.0],
        }
    }
}

impl PageSetup {
    /// Page width and height for A4 in the configured orientation
    pub fn size(&self) -> (f64, f64) {
        match self.orientation {
            Orientation::Portrait => (595.0, 842.0),
            Orientation::Landscape => (842.0, 595.0),
        }
    }

    pub fn usable_width(&self) -> f64 {
        self.size().0 - self.margins[0] - self.margins[2]
    }
}

/// Table styling rules, indexed like a table body that includes the header row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableLayout {
    pub header_rows: usize,
    pub header_height: f64,
    pub row_height: f64,
    pub outer_line_width: f64,
    pub inner_line_width: f64,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            header_rows: 1,
            header_height: 40.0,
            row_height: 15.0,
            outer_line_width: 1.0,
            inner_line_width: 0.5,
        }
    }
}

impl TableLayout {
    /// Background of a table row; header rows first, then alternating tints
    pub fn fill_color(&self, row_index: usize) -> Rgb {
        if row_index < self.header_rows {
            HEADER_ROW_COLOR
        } else if row_index % 2 == 0 {
            EVEN_ROW_COLOR
        } else {
            ODD_ROW_COLOR
        }
    }

    fn is_outer(line_index: usize, count: usize) -> bool {
        line_index == 0 || line_index == count
    }

    /// Horizontal line `line_index` of a table with `row_count` rows
    pub fn h_line_color(&self, line_index: usize, row_count: usize) -> Rgb {
        if Self::is_outer(line_index, row_count) {
            OUTER_BORDER_COLOR
        } else {
            INNER_BORDER_COLOR
        }
    }

    pub fn h_line_width(&self, line_index: usize, row_count: usize) -> f64 {
        if Self::is_outer(line_index, row_count) {
            self.outer_line_width
        } else {
            self.inner_line_width
        }
    }

    /// Vertical lines are drawn on the outer edges only
    pub fn v_line_width(&self, line_index: usize, column_count: usize) -> f64 {
        if Self::is_outer(line_index, column_count) {
            self.outer_line_width
        } else {
            0.0
        }
    }

    pub fn v_line_color(&self, line_index: usize, column_count: usize) -> Rgb {
        if Self::is_outer(line_index, column_count) {
            OUTER_BORDER_COLOR
        } else {
            INNER_BORDER_COLOR
        }
    }

    pub fn row_height(&self, row_index: usize) -> f64 {
        if row_index < self.header_rows {
            self.header_height
        } else {
            self.row_height
        }
    }
}

/// A complete export document
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub title: String,
    pub header_row: Vec<HeaderCell>,
    pub body_rows: Vec<Vec<String>>,
    pub column_widths: Vec<ColumnWidth>,
    pub layout: TableLayout,
    pub page: PageSetup,
}

impl ExportDocument {
    pub fn column_count(&self) -> usize {
        self.header_row.len()
    }

    /// Rows in the table body including the header row
    pub fn table_row_count(&self) -> usize {
        self.layout.header_rows + self.body_rows.len()
    }

    pub fn header_texts(&self) -> Vec<&str> {
        self.header_row.iter().map(|h| h.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_color_alternates() {
        let layout = TableLayout::default();
        assert_eq!(layout.fill_color(0), HEADER_ROW_COLOR);
        assert_eq!(layout.fill_color(1), ODD_ROW_COLOR);
        assert_eq!(layout.fill_color(2), EVEN_ROW_COLOR);
        assert_eq!(layout.fill_color(3), ODD_ROW_COLOR);
    }

    #[test]
    fn test_border_rules() {
        let layout = TableLayout::default();
        // 3 rows -> lines 0..=3
        assert_eq!(layout.h_line_color(0, 3), OUTER_BORDER_COLOR);
        assert_eq!(layout.h_line_color(1, 3), INNER_BORDER_COLOR);
        assert_eq!(layout.h_line_color(3, 3), OUTER_BORDER_COLOR);
        assert!(layout.h_line_width(1, 3) < layout.h_line_width(0, 3));

        assert_eq!(layout.v_line_width(0, 2), 1.0);
        assert_eq!(layout.v_line_width(1, 2), 0.0);
        assert_eq!(layout.v_line_width(2, 2), 1.0);
        assert_eq!(layout.v_line_color(2, 2), OUTER_BORDER_COLOR);
    }

    #[test]
    fn test_page_setup_landscape() {
        let page = PageSetup::default();
        assert_eq!(page.size(), (842.0, 595.0));
        assert_eq!(page.usable_width(), 822.0);
    }

    #[test]
    fn test_rgb_operands() {
        assert_eq!(Rgb::WHITE.pdf_operands(), "1.000 1.000 1.000");
        assert_eq!(Rgb::BLACK.pdf_operands(), "0.000 0.000 0.000");
    }
}
