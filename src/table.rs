//! Table Renderer - Fixed 4-Column Price Tables

use crate::builder::{Alignment, CellStyle, DocumentBuilder, RunStyle, TableSpec};
use crate::reference::{PriceRow, COLUMN_WIDTHS_CM, HEADER_SHADING, TABLE_HEADERS};

/// Geometry and styling shared by every price table.
pub fn price_table_spec() -> TableSpec {
    TableSpec {
        widths_cm: COLUMN_WIDTHS_CM.to_vec(),
        alignments: vec![Alignment::Left, Alignment::Left, Alignment::Center, Alignment::Center],
        header: CellStyle {
            run: RunStyle::bold().size(11.0),
            space_before_pt: 2.0,
            space_after_pt: 2.0,
            shading: Some(HEADER_SHADING.to_string()),
        },
        body: CellStyle {
            run: RunStyle::plain().size(10.5),
            space_before_pt: 1.0,
            space_after_pt: 1.0,
            shading: None,
        },
        repeat_header: true,
    }
}

/// Emit one header row plus one row per reference entry.
pub fn render_price_table<B: DocumentBuilder + ?Sized>(builder: &mut B, rows: &[PriceRow]) {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.cells().iter().map(|cell| cell.to_string()).collect())
        .collect();
    builder.add_table(&TABLE_HEADERS, cells, price_table_spec());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Document;
    use crate::reference::{FURNISHED_PRICE_ROWS, PRICE_ROWS};

    #[test]
    fn test_standard_table_rows() {
        let mut doc = Document::default();
        render_price_table(&mut doc, &PRICE_ROWS);
        let table = doc.tables().next().unwrap();
        assert_eq!(table.row_count(), 25);
        assert_eq!(table.header, TABLE_HEADERS.to_vec());
        assert_eq!(table.rows[12][1], "Destape Desagües y Sifón");
    }

    #[test]
    fn test_furnished_table_rows() {
        let mut doc = Document::default();
        render_price_table(&mut doc, &FURNISHED_PRICE_ROWS);
        assert_eq!(doc.tables().next().unwrap().row_count(), 15);
    }

    #[test]
    fn test_spec_is_content_independent() {
        let mut doc = Document::default();
        render_price_table(&mut doc, &PRICE_ROWS[..1]);
        render_price_table(&mut doc, &FURNISHED_PRICE_ROWS);
        let specs: Vec<_> = doc.tables().map(|t| t.spec.clone()).collect();
        assert_eq!(specs[0], specs[1]);
        assert_eq!(specs[0].header.shading.as_deref(), Some("E6E6E6"));
        assert!(specs[0].header.run.bold);
        assert_eq!(specs[0].body.run.size_pt, Some(10.5));
        assert!(specs[0].repeat_header);
    }
}
