//! PDF encoding of a [`DocumentLayout`].
//!
//! Drawing order per page: header shading, cell grid, then text. Fonts are the
//! standard Type1 Helvetica faces with WinAnsi encoding, so nothing is embedded.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::layout::{
    DocumentLayout, PageLayout, RowKind, BODY_FONT_SIZE, CELL_PADDING_BOTTOM, CELL_PADDING_X,
};
use crate::metrics::Font;
use crate::RenderError;

const PDF_VERSION: &str = "1.4";
const GRID_LINE_WIDTH: f32 = 0.5;
const HEADER_GREY: f32 = 0.827;

/// Encode a laid-out document as PDF bytes.
pub fn encode(layout: &DocumentLayout) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for font in [Font::Regular, Font::Bold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());
    for page in &layout.pages {
        let content = Content {
            operations: page_operations(layout, page),
        };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Encode(format!("content stream: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                layout.page.width.into(),
                layout.page.height.into(),
            ],
        }),
    );

    let catalog_id: ObjectId = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RenderError::Encode(format!("serialize: {e}")))?;
    Ok(bytes)
}

fn page_operations(layout: &DocumentLayout, page: &PageLayout) -> Vec<Operation> {
    let mut ops = Vec::new();
    let row_height = layout.row_height;
    let table_x = layout.columns[0].x;
    let table_width = layout.table_width();

    // Header shading.
    ops.push(set_fill_grey(HEADER_GREY));
    for row in page.rows.iter().filter(|r| r.kind == RowKind::Header) {
        ops.push(Operation::new(
            "re",
            vec![
                table_x.into(),
                (row.top - row_height).into(),
                table_width.into(),
                row_height.into(),
            ],
        ));
        ops.push(Operation::new("f", vec![]));
    }

    // Cell grid.
    ops.push(Operation::new("w", vec![GRID_LINE_WIDTH.into()]));
    ops.push(Operation::new("RG", vec![0.into(), 0.into(), 0.into()]));
    for row in &page.rows {
        for column in &layout.columns {
            ops.push(Operation::new(
                "re",
                vec![
                    column.x.into(),
                    (row.top - row_height).into(),
                    column.width.into(),
                    row_height.into(),
                ],
            ));
        }
    }
    if !page.rows.is_empty() {
        ops.push(Operation::new("S", vec![]));
    }

    ops.push(set_fill_grey(0.0));
    for line in &page.lines {
        push_text(&mut ops, &line.text, line.font, line.size, line.x, line.baseline);
    }
    for row in &page.rows {
        let baseline = row.top - row_height + CELL_PADDING_BOTTOM;
        for (cell, column) in row.cells.iter().zip(layout.columns.iter()) {
            if cell.is_empty() {
                continue;
            }
            push_text(
                &mut ops,
                cell,
                Font::Regular,
                BODY_FONT_SIZE,
                column.x + CELL_PADDING_X,
                baseline,
            );
        }
    }

    ops
}

fn set_fill_grey(level: f32) -> Operation {
    Operation::new("rg", vec![level.into(), level.into(), level.into()])
}

fn push_text(ops: &mut Vec<Operation>, text: &str, font: Font, size: f32, x: f32, y: f32) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![font.resource_name().into(), size.into()],
    ));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Map text onto WinAnsi bytes. Latin-1 printable characters pass through;
/// control characters become spaces and everything else becomes `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            0x00..=0x1F | 0x7F => b' ',
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout, PageSpec, COLUMN_LABELS};
    use invoicer_invoicing::{assemble, Invoice, InvoiceHeader, RawLineItem};

    fn invoice(lines: usize) -> Invoice {
        let raw: Vec<RawLineItem> = (1..=lines)
            .map(|i| RawLineItem::new(format!("Part {i}"), "7318", "4", "2.25"))
            .collect();
        assemble(InvoiceHeader::new("Acme", "INV-9", ""), &raw)
            .unwrap()
            .invoice
    }

    fn page_strings(doc: &Document, page_id: ObjectId) -> Vec<Vec<u8>> {
        let content = doc.get_page_content(page_id).unwrap();
        Content::decode(&content)
            .unwrap()
            .operations
            .into_iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn page_count_matches_layout() {
        let laid_out = layout(&invoice(150), PageSpec::a4()).unwrap();
        let bytes = encode(&laid_out).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), laid_out.pages.len());
    }

    #[test]
    fn every_page_carries_the_header_labels() {
        let laid_out = layout(&invoice(150), PageSpec::a4()).unwrap();
        let doc = Document::load_mem(&encode(&laid_out).unwrap()).unwrap();

        for (_, page_id) in doc.get_pages() {
            let strings = page_strings(&doc, page_id);
            for label in COLUMN_LABELS {
                let hits = strings.iter().filter(|s| s.as_slice() == label.as_bytes()).count();
                assert_eq!(hits, 1, "label {label} on page {page_id:?}");
            }
        }
    }

    #[test]
    fn last_page_ends_with_total() {
        let laid_out = layout(&invoice(3), PageSpec::a4()).unwrap();
        let doc = Document::load_mem(&encode(&laid_out).unwrap()).unwrap();
        let pages = doc.get_pages();
        let (_, last) = pages.iter().next_back().unwrap();
        let strings = page_strings(&doc, *last);

        let n = strings.len();
        assert_eq!(strings[n - 2], b"Total".to_vec());
        assert_eq!(strings[n - 1], b"27.00".to_vec());
    }

    #[test]
    fn win_ansi_replaces_unmappable_characters() {
        assert_eq!(win_ansi("Caf\u{e9}"), b"Caf\xe9".to_vec());
        assert_eq!(win_ansi("\u{20b9}5"), b"?5".to_vec());
        assert_eq!(win_ansi("a\tb"), b"a b".to_vec());
    }
}
