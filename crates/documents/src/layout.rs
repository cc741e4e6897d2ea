//! Page model for a rendered invoice.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of the
//! page. A row's `top` is the y of its upper edge.

use invoicer_core::{format_amount, format_quantity};
use invoicer_invoicing::Invoice;

use crate::metrics::{fit_text, text_width, Font};
use crate::RenderError;

/// Points per millimetre.
pub const MM: f32 = 72.0 / 25.4;

/// Column labels, in table order.
pub const COLUMN_LABELS: [&str; 6] = ["#", "Description", "HSN", "Qty", "Rate", "Amount"];

/// Share of the usable width given to each column.
const COLUMN_WEIGHTS: [f32; 6] = [0.08, 0.32, 0.14, 0.12, 0.16, 0.18];

pub const TITLE_FONT_SIZE: f32 = 18.0;
const TITLE_LEADING: f32 = 22.0;
pub const BODY_FONT_SIZE: f32 = 10.0;
const BODY_LEADING: f32 = 12.0;
const SPACER: f32 = 12.0;
pub const ROW_HEIGHT: f32 = 18.0;
pub const CELL_PADDING_X: f32 = 6.0;
pub const CELL_PADDING_BOTTOM: f32 = 5.0;
const EPSILON: f32 = 0.01;

/// Physical page geometry in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSpec {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageSpec {
    /// A4 portrait with 20 mm margins on every side.
    pub fn a4() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin_left: 20.0 * MM,
            margin_right: 20.0 * MM,
            margin_top: 20.0 * MM,
            margin_bottom: 20.0 * MM,
        }
    }

    pub fn usable_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn usable_height(&self) -> f32 {
        self.height - self.margin_top - self.margin_bottom
    }

    fn content_top(&self) -> f32 {
        self.height - self.margin_top
    }
}

impl Default for PageSpec {
    fn default() -> Self {
        Self::a4()
    }
}

/// One table column's horizontal extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub x: f32,
    pub width: f32,
}

/// A free-standing line of text (title block).
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font: Font,
    pub size: f32,
    pub x: f32,
    pub baseline: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    /// Column labels; shaded, repeated on every page.
    Header,
    Item,
    /// Grand total summary row.
    Total,
}

/// A table row placed on a page. Cell text is already clipped to its column.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRow {
    pub kind: RowKind,
    pub cells: [String; 6],
    pub top: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub lines: Vec<TextLine>,
    pub rows: Vec<PlacedRow>,
}

impl PageLayout {
    pub fn header_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.kind == RowKind::Header).count()
    }
}

/// Full document layout, ready for encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub page: PageSpec,
    pub columns: [Column; 6],
    pub row_height: f32,
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    pub fn table_width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }

    /// Item rows across all pages, in order.
    pub fn item_rows(&self) -> impl Iterator<Item = &PlacedRow> {
        self.pages
            .iter()
            .flat_map(|p| p.rows.iter())
            .filter(|r| r.kind == RowKind::Item)
    }
}

/// Table body: one row per line item, then the total row.
pub fn body_rows(invoice: &Invoice) -> Vec<(RowKind, [String; 6])> {
    let mut rows = Vec::with_capacity(invoice.line_items().len() + 1);

    for (idx, item) in invoice.line_items().iter().enumerate() {
        rows.push((
            RowKind::Item,
            [
                (idx + 1).to_string(),
                item.description().to_string(),
                item.hsn_code().to_string(),
                format_quantity(item.quantity()),
                format_quantity(item.unit_rate()),
                format_amount(item.amount()),
            ],
        ));
    }

    rows.push((
        RowKind::Total,
        [
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            "Total".to_string(),
            format_amount(invoice.grand_total()),
        ],
    ));
    rows
}

fn columns(page: &PageSpec) -> [Column; 6] {
    let usable = page.usable_width();
    let mut x = page.margin_left;
    COLUMN_WEIGHTS.map(|weight| {
        let column = Column {
            x,
            width: usable * weight,
        };
        x += column.width;
        column
    })
}

fn title_block(invoice: &Invoice, page: &PageSpec) -> (Vec<TextLine>, f32) {
    let mut cursor = page.content_top();
    let mut lines = Vec::with_capacity(3);

    let title = fit_text(
        invoice.company_name(),
        Font::Bold,
        TITLE_FONT_SIZE,
        page.usable_width(),
    );
    let title_width = text_width(&title, Font::Bold, TITLE_FONT_SIZE);
    lines.push(TextLine {
        x: page.margin_left + (page.usable_width() - title_width) / 2.0,
        baseline: cursor - TITLE_FONT_SIZE,
        text: title,
        font: Font::Bold,
        size: TITLE_FONT_SIZE,
    });
    cursor -= TITLE_LEADING;

    for text in [
        format!("Invoice No: {}", invoice.invoice_number()),
        format!("Date: {}", invoice.invoice_date()),
    ] {
        lines.push(TextLine {
            text: fit_text(&text, Font::Regular, BODY_FONT_SIZE, page.usable_width()),
            font: Font::Regular,
            size: BODY_FONT_SIZE,
            x: page.margin_left,
            baseline: cursor - BODY_FONT_SIZE,
        });
        cursor -= BODY_LEADING;
    }

    (lines, cursor - SPACER)
}

fn check_geometry(page: &PageSpec, table_top: f32) -> Result<(), RenderError> {
    let values = [
        page.width,
        page.height,
        page.margin_left,
        page.margin_right,
        page.margin_top,
        page.margin_bottom,
    ];
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(RenderError::PageTooSmall(
            "page dimensions must be finite and non-negative".to_string(),
        ));
    }
    if page.usable_width() <= 2.0 * CELL_PADDING_X {
        return Err(RenderError::PageTooSmall(format!(
            "usable width {:.2}pt leaves no room for table cells",
            page.usable_width()
        )));
    }
    // Header row plus one body row must fit under the title block.
    if table_top - 2.0 * ROW_HEIGHT < page.margin_bottom - EPSILON {
        return Err(RenderError::PageTooSmall(format!(
            "usable height {:.2}pt cannot hold the title block and two table rows",
            page.usable_height()
        )));
    }
    Ok(())
}

fn place_row(kind: RowKind, cells: &[String; 6], columns: &[Column; 6], top: f32) -> PlacedRow {
    let mut fitted: [String; 6] = Default::default();
    for (i, cell) in cells.iter().enumerate() {
        fitted[i] = fit_text(
            cell,
            Font::Regular,
            BODY_FONT_SIZE,
            columns[i].width - 2.0 * CELL_PADDING_X,
        );
    }
    PlacedRow {
        kind,
        cells: fitted,
        top,
    }
}

/// Lay out `invoice` on pages of the given geometry.
///
/// The title block goes on the first page only. Every page's table starts with
/// the header row; body rows (items, then the total) fill each page down to
/// the bottom margin.
pub fn layout(invoice: &Invoice, page: PageSpec) -> Result<DocumentLayout, RenderError> {
    let (title_lines, table_top) = title_block(invoice, &page);
    check_geometry(&page, table_top)?;

    let columns = columns(&page);
    let header = COLUMN_LABELS.map(str::to_string);
    let mut body = body_rows(invoice).into_iter().peekable();

    let mut pages = Vec::new();
    let mut current = PageLayout {
        lines: title_lines,
        rows: Vec::new(),
    };
    let mut cursor = table_top;

    loop {
        current
            .rows
            .push(place_row(RowKind::Header, &header, &columns, cursor));
        cursor -= ROW_HEIGHT;

        while body.peek().is_some() && cursor - ROW_HEIGHT >= page.margin_bottom - EPSILON {
            if let Some((kind, cells)) = body.next() {
                current.rows.push(place_row(kind, &cells, &columns, cursor));
                cursor -= ROW_HEIGHT;
            }
        }

        pages.push(current);
        if body.peek().is_none() {
            break;
        }
        current = PageLayout::default();
        cursor = page.content_top();
    }

    Ok(DocumentLayout {
        page,
        columns,
        row_height: ROW_HEIGHT,
        pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoicer_invoicing::{assemble, InvoiceHeader, RawLineItem};

    fn invoice_with(raw: Vec<RawLineItem>) -> Invoice {
        assemble(InvoiceHeader::new("Acme", "INV-7", "2024-01-31"), &raw)
            .unwrap()
            .invoice
    }

    fn many(lines: usize) -> Invoice {
        invoice_with(
            (1..=lines)
                .map(|i| RawLineItem::new(format!("Line {i}"), "", "1", "1.10"))
                .collect(),
        )
    }

    #[test]
    fn single_page_table_contents() {
        let invoice = invoice_with(vec![
            RawLineItem::new("Widget", "1234", "2", "50.00"),
            RawLineItem::new("Bolt", "", "-1", "10"),
        ]);
        let layout = layout(&invoice, PageSpec::a4()).unwrap();

        assert_eq!(layout.pages.len(), 1);
        let page = &layout.pages[0];
        assert_eq!(page.lines[0].text, "Acme");
        assert_eq!(page.lines[1].text, "Invoice No: INV-7");
        assert_eq!(page.lines[2].text, "Date: 2024-01-31");

        let cells: Vec<&[String; 6]> = page.rows.iter().map(|r| &r.cells).collect();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], &COLUMN_LABELS.map(str::to_string));
        assert_eq!(
            cells[1],
            &["1", "Widget", "1234", "2", "50", "100.00"].map(str::to_string)
        );
        assert_eq!(
            cells[2],
            &["", "", "", "", "Total", "100.00"].map(str::to_string)
        );
        assert_eq!(page.rows[2].kind, RowKind::Total);
    }

    #[test]
    fn header_repeats_on_every_page() {
        let layout = layout(&many(120), PageSpec::a4()).unwrap();
        assert!(layout.pages.len() > 2);

        for page in &layout.pages {
            assert_eq!(page.rows[0].kind, RowKind::Header);
            assert_eq!(page.rows[0].cells, COLUMN_LABELS.map(str::to_string));
            assert_eq!(page.header_rows(), 1);
            assert!(page.rows.len() >= 2);
        }
        // Title block only on the first page.
        assert_eq!(layout.pages[0].lines.len(), 3);
        assert!(layout.pages[1..].iter().all(|p| p.lines.is_empty()));
    }

    #[test]
    fn indices_are_sequential_across_pages() {
        let layout = layout(&many(120), PageSpec::a4()).unwrap();
        let indices: Vec<String> = layout.item_rows().map(|r| r.cells[0].clone()).collect();
        let expected: Vec<String> = (1..=120).map(|i| i.to_string()).collect();
        assert_eq!(indices, expected);

        let last_page = layout.pages.last().unwrap();
        let total = last_page.rows.last().unwrap();
        assert_eq!(total.kind, RowKind::Total);
        assert_eq!(total.cells[5], "132.00");
    }

    #[test]
    fn rows_stay_inside_margins() {
        let page = PageSpec::a4();
        let layout = layout(&many(200), page).unwrap();
        for p in &layout.pages {
            for row in &p.rows {
                assert!(row.top <= page.height - page.margin_top + EPSILON);
                assert!(row.top - ROW_HEIGHT >= page.margin_bottom - EPSILON);
            }
        }
    }

    #[test]
    fn columns_span_the_usable_width() {
        let page = PageSpec::a4();
        let layout = layout(&many(1), page).unwrap();
        assert!((layout.table_width() - page.usable_width()).abs() < 0.01);
        assert!((layout.columns[0].x - page.margin_left).abs() < 0.01);
    }

    #[test]
    fn long_descriptions_are_clipped() {
        let invoice = invoice_with(vec![RawLineItem::new("x".repeat(400), "", "1", "1")]);
        let layout = layout(&invoice, PageSpec::a4()).unwrap();
        let item = layout.item_rows().next().unwrap();
        assert!(item.cells[1].ends_with("..."));
        assert!(item.cells[1].len() < 400);
    }

    #[test]
    fn page_too_short_is_rejected() {
        let page = PageSpec {
            height: 150.0,
            ..PageSpec::a4()
        };
        assert!(matches!(
            layout(&many(1), page),
            Err(RenderError::PageTooSmall(_))
        ));
    }

    #[test]
    fn zero_width_is_rejected() {
        let page = PageSpec {
            width: 0.0,
            margin_left: 0.0,
            margin_right: 0.0,
            ..PageSpec::a4()
        };
        assert!(matches!(
            layout(&many(1), page),
            Err(RenderError::PageTooSmall(_))
        ));
    }
}
