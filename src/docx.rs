//! DOCX Backend - WordprocessingML Packaging
//!
//! Serializes a finished [`Document`] into an OOXML package held in memory.
//! Entries carry a fixed timestamp so identical documents produce identical
//! bytes.

use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::builder::{Alignment, Block, CellStyle, Document, Paragraph, ParagraphFormat, Run, RunStyle, Table};
use crate::layout::PageLayout;

const NS_DECLS: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#,
);

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Relationship id of the styles part; media ids follow it.
const STYLES_REL: usize = 1;

fn pt_to_twips(pt: f32) -> i64 {
    (pt * 20.0).round() as i64
}

fn cm_to_twips(cm: f32) -> i64 {
    (cm as f64 * 360_000.0 / 635.0).round() as i64
}

fn cm_to_emu(cm: f32) -> i64 {
    (cm as f64 * 360_000.0).round() as i64
}

fn half_points(pt: f32) -> i64 {
    (pt * 2.0).round() as i64
}

fn media_rel_id(media: usize) -> String {
    format!("rId{}", STYLES_REL + 1 + media)
}

fn media_name(media: usize, extension: &str) -> String {
    format!("image{}.{}", media + 1, extension)
}

fn jc(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
    }
}

fn paragraph_properties(format: &ParagraphFormat) -> String {
    let mut out = String::new();
    if format.page_break_before {
        out.push_str("<w:pageBreakBefore/>");
    }
    if let Some(border) = &format.bottom_border {
        out.push_str(&format!(
            r#"<w:pBdr><w:bottom w:val="single" w:sz="{}" w:space="{}" w:color="{}"/></w:pBdr>"#,
            border.size,
            border.space,
            escape(&border.color)
        ));
    }

    let mut spacing = String::new();
    if let Some(before) = format.space_before_pt {
        spacing.push_str(&format!(r#" w:before="{}""#, pt_to_twips(before)));
    }
    if let Some(after) = format.space_after_pt {
        spacing.push_str(&format!(r#" w:after="{}""#, pt_to_twips(after)));
    }
    if let Some(multiple) = format.line_spacing {
        spacing.push_str(&format!(r#" w:line="{}" w:lineRule="auto""#, (multiple * 240.0).round() as i64));
    }
    if !spacing.is_empty() {
        out.push_str(&format!("<w:spacing{}/>", spacing));
    }

    if format.left_indent_cm.is_some() || format.first_line_indent_cm.is_some() {
        let mut ind = String::new();
        if let Some(left) = format.left_indent_cm {
            ind.push_str(&format!(r#" w:left="{}""#, cm_to_twips(left)));
        }
        match format.first_line_indent_cm {
            Some(first) if first < 0.0 => ind.push_str(&format!(r#" w:hanging="{}""#, cm_to_twips(-first))),
            Some(first) => ind.push_str(&format!(r#" w:firstLine="{}""#, cm_to_twips(first))),
            None => {}
        }
        out.push_str(&format!("<w:ind{}/>", ind));
    }

    if let Some(alignment) = format.alignment {
        out.push_str(&format!(r#"<w:jc w:val="{}"/>"#, jc(alignment)));
    }

    if out.is_empty() {
        out
    } else {
        format!("<w:pPr>{}</w:pPr>", out)
    }
}

fn run_properties(style: &RunStyle) -> String {
    let mut out = String::new();
    if style.bold {
        out.push_str("<w:b/><w:bCs/>");
    }
    if style.italic {
        out.push_str("<w:i/><w:iCs/>");
    }
    if let Some(size) = style.size_pt {
        let hp = half_points(size);
        out.push_str(&format!(r#"<w:sz w:val="{hp}"/><w:szCs w:val="{hp}"/>"#));
    }
    if out.is_empty() {
        out
    } else {
        format!("<w:rPr>{}</w:rPr>", out)
    }
}

fn text_run(text: &str, style: &RunStyle) -> String {
    format!(
        r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        run_properties(style),
        escape(text)
    )
}

/// `drawing` numbers each picture in the body; several drawings may share one media part.
fn image_run(document: &Document, drawing: usize, media: usize, width_cm: f32, height_cm: f32) -> String {
    let extension = document
        .media
        .get(media)
        .map(|m| m.extension.as_str())
        .unwrap_or("png");
    let (cx, cy) = (cm_to_emu(width_cm), cm_to_emu(height_cm));
    let id = drawing;
    let name = media_name(media, extension);
    let rel = media_rel_id(media);
    format!(
        concat!(
            r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        ),
        cx = cx,
        cy = cy,
        id = id,
        name = name,
        rel = rel,
    )
}

fn paragraph_xml(document: &Document, paragraph: &Paragraph, drawings: &mut usize) -> String {
    let mut out = String::from("<w:p>");
    out.push_str(&paragraph_properties(&paragraph.format));
    for run in &paragraph.runs {
        match run {
            Run::Text { text, style } => out.push_str(&text_run(text, style)),
            Run::Image { media, width_cm, height_cm } => {
                *drawings += 1;
                out.push_str(&image_run(document, *drawings, *media, *width_cm, *height_cm))
            }
        }
    }
    out.push_str("</w:p>");
    out
}

fn cell_xml(text: &str, width_cm: f32, alignment: Alignment, style: &CellStyle) -> String {
    let shading = style
        .shading
        .as_deref()
        .map(|fill| format!(r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#, escape(fill)))
        .unwrap_or_default();
    let format = ParagraphFormat::new()
        .space_before(style.space_before_pt)
        .space_after(style.space_after_pt)
        .align(alignment);
    format!(
        r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/>{}<w:vAlign w:val="center"/></w:tcPr><w:p>{}{}</w:p></w:tc>"#,
        cm_to_twips(width_cm),
        shading,
        paragraph_properties(&format),
        text_run(text, &style.run)
    )
}

fn row_xml<S: AsRef<str>>(table: &Table, cells: &[S], style: &CellStyle, header: bool) -> String {
    let mut out = String::from("<w:tr>");
    if header && table.spec.repeat_header {
        out.push_str("<w:trPr><w:tblHeader/></w:trPr>");
    }
    for (idx, cell) in cells.iter().enumerate() {
        let width = table.spec.widths_cm.get(idx).copied().unwrap_or(2.0);
        let alignment = table.spec.alignments.get(idx).copied().unwrap_or_default();
        out.push_str(&cell_xml(cell.as_ref(), width, alignment, style));
    }
    out.push_str("</w:tr>");
    out
}

fn table_xml(table: &Table) -> String {
    let total: i64 = table.spec.widths_cm.iter().map(|w| cm_to_twips(*w)).sum();
    let mut out = format!(
        concat!(
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="{}" w:type="dxa"/>"#,
            r#"<w:jc w:val="center"/><w:tblLayout w:type="fixed"/>"#,
            r#"<w:tblLook w:val="04A0" w:firstRow="1" w:lastRow="0" w:firstColumn="1" w:lastColumn="0" w:noHBand="0" w:noVBand="1"/>"#,
            r#"</w:tblPr><w:tblGrid>"#,
        ),
        total
    );
    for width in &table.spec.widths_cm {
        out.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, cm_to_twips(*width)));
    }
    out.push_str("</w:tblGrid>");
    out.push_str(&row_xml(table, &table.header, &table.spec.header, true));
    for row in &table.rows {
        out.push_str(&row_xml(table, row, &table.spec.body, false));
    }
    out.push_str("</w:tbl>");
    out
}

fn section_xml(layout: &PageLayout) -> String {
    format!(
        concat!(
            r#"<w:sectPr><w:pgSz w:w="{}" w:h="{}"/>"#,
            r#"<w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="{}" w:footer="{}" w:gutter="0"/>"#,
            r#"</w:sectPr>"#,
        ),
        cm_to_twips(layout.page_width_cm),
        cm_to_twips(layout.page_height_cm),
        cm_to_twips(layout.margins.top_cm),
        cm_to_twips(layout.margins.right_cm),
        cm_to_twips(layout.margins.bottom_cm),
        cm_to_twips(layout.margins.left_cm),
        cm_to_twips(layout.header_distance_cm),
        cm_to_twips(layout.footer_distance_cm),
    )
}

/// `word/document.xml`
pub fn document_xml(document: &Document) -> String {
    let mut out = format!("{}<w:document {}><w:body>", XML_HEADER, NS_DECLS);
    let mut drawings = 0;
    for block in &document.blocks {
        match block {
            Block::Paragraph(p) => out.push_str(&paragraph_xml(document, p, &mut drawings)),
            Block::Table(t) => out.push_str(&table_xml(t)),
        }
    }
    // A body may not end on a table.
    if matches!(document.blocks.last(), Some(Block::Table(_))) {
        out.push_str("<w:p/>");
    }
    out.push_str(&section_xml(&document.layout));
    out.push_str("</w:body></w:document>");
    out
}

/// `word/styles.xml`: default font plus the grid table style.
pub fn styles_xml(layout: &PageLayout) -> String {
    let font = escape(&layout.font_name);
    let size = half_points(layout.font_size_pt);
    let border = |side: &str| format!(r#"<w:{side} w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#);
    let borders: String = ["top", "left", "bottom", "right", "insideH", "insideV"]
        .iter()
        .map(|side| border(side))
        .collect();
    format!(
        concat!(
            "{header}",
            r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:docDefaults><w:rPrDefault><w:rPr>"#,
            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:eastAsia="{font}" w:cs="{font}"/>"#,
            r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/><w:lang w:val="es-CL"/>"#,
            r#"</w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults>"#,
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/>"#,
            r#"<w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:eastAsia="{font}" w:cs="{font}"/><w:sz w:val="{size}"/></w:rPr></w:style>"#,
            r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/>"#,
            r#"<w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar>"#,
            r#"<w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/>"#,
            r#"</w:tblCellMar></w:tblPr></w:style>"#,
            r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:basedOn w:val="TableNormal"/>"#,
            r#"<w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr>"#,
            r#"<w:tblPr><w:tblBorders>{borders}</w:tblBorders></w:tblPr></w:style>"#,
            r#"</w:styles>"#,
        ),
        header = XML_HEADER,
        font = font,
        size = size,
        borders = borders,
    )
}

fn content_types_xml(document: &Document) -> String {
    let mut extensions: Vec<&str> = document.media.iter().map(|m| m.extension.as_str()).collect();
    extensions.sort_unstable();
    extensions.dedup();
    let defaults: String = extensions
        .iter()
        .map(|ext| {
            let content_type = document
                .media
                .iter()
                .find(|m| m.extension == *ext)
                .map(|m| m.content_type())
                .unwrap_or("image/png");
            format!(r#"<Default Extension="{}" ContentType="{}"/>"#, ext, content_type)
        })
        .collect();
    format!(
        concat!(
            "{}",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            "{}",
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
            r#"</Types>"#,
        ),
        XML_HEADER, defaults
    )
}

fn package_rels_xml() -> String {
    format!(
        concat!(
            "{}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
            r#"</Relationships>"#,
        ),
        XML_HEADER
    )
}

fn document_rels_xml(document: &Document) -> String {
    let mut out = format!(
        concat!(
            "{}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        ),
        XML_HEADER, STYLES_REL
    );
    for (idx, media) in document.media.iter().enumerate() {
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{}"/>"#,
            media_rel_id(idx),
            media_name(idx, &media.extension)
        ));
    }
    out.push_str("</Relationships>");
    out
}

/// Build the complete `.docx` package in memory.
pub fn package(document: &Document) -> ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opt = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let parts: Vec<(&str, Vec<u8>)> = vec![
        ("[Content_Types].xml", content_types_xml(document).into_bytes()),
        ("_rels/.rels", package_rels_xml().into_bytes()),
        ("word/document.xml", document_xml(document).into_bytes()),
        ("word/styles.xml", styles_xml(&document.layout).into_bytes()),
        ("word/_rels/document.xml.rels", document_rels_xml(document).into_bytes()),
    ];
    for (name, bytes) in parts {
        zip.start_file(name, opt)?;
        zip.write_all(&bytes)?;
    }

    for (idx, media) in document.media.iter().enumerate() {
        zip.start_file(format!("word/media/{}", media_name(idx, &media.extension)), opt)?;
        zip.write_all(&media.bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{DocumentBuilder, ImageAsset};
    use crate::table::render_price_table;
    use crate::reference::PRICE_ROWS;
    use std::io::Read;

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(cm_to_twips(2.5), 1417);
        assert_eq!(cm_to_twips(1.0), 567);
        assert_eq!(pt_to_twips(6.0), 120);
        assert_eq!(half_points(10.5), 21);
        assert_eq!(cm_to_emu(6.4), 2_304_000);
    }

    #[test]
    fn test_paragraph_properties() {
        let format = ParagraphFormat::new()
            .page_break_before(true)
            .space_before(12.0)
            .space_after(6.0)
            .line_spacing(1.15)
            .indent(0.6, -0.2)
            .align(Alignment::Center);
        assert_eq!(
            paragraph_properties(&format),
            r#"<w:pPr><w:pageBreakBefore/><w:spacing w:before="240" w:after="120" w:line="276" w:lineRule="auto"/><w:ind w:left="340" w:hanging="113"/><w:jc w:val="center"/></w:pPr>"#
        );
        assert_eq!(paragraph_properties(&ParagraphFormat::new()), "");
    }

    #[test]
    fn test_text_is_escaped() {
        let xml = text_run("A & B <[[X.Y]]>", &RunStyle::bold().size(12.0));
        assert!(xml.contains("A &amp; B &lt;[[X.Y]]&gt;"));
        assert!(xml.contains(r#"<w:b/>"#));
        assert!(xml.contains(r#"<w:sz w:val="24"/>"#));
    }

    #[test]
    fn test_table_xml_header_and_shading() {
        let mut doc = Document::default();
        render_price_table(&mut doc, &PRICE_ROWS);
        let xml = document_xml(&doc);
        assert_eq!(xml.matches("<w:tr>").count(), 25);
        assert_eq!(xml.matches("<w:tblHeader/>").count(), 1);
        assert_eq!(xml.matches(r#"w:fill="E6E6E6""#).count(), 4);
        assert!(xml.contains(r#"<w:gridCol w:w="1531"/>"#));
        assert!(xml.contains("</w:tbl><w:p/><w:sectPr>"));
    }

    #[test]
    fn test_package_parts_and_media() {
        let mut doc = Document::default();
        doc.add_paragraph(ParagraphFormat::new());
        doc.add_image(
            &ImageAsset { bytes: vec![9, 9, 9], extension: "png".into(), width_px: 4, height_px: 1 },
            6.4,
        );
        let bytes = package(&doc).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<_> = archive.file_names().map(|n| n.to_string()).collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/styles.xml",
            "word/_rels/document.xml.rels",
            "word/media/image1.png",
        ] {
            assert!(names.iter().any(|n| n == part), "missing {}", part);
        }
        assert!(read_part(&bytes, "[Content_Types].xml").contains(r#"Extension="png" ContentType="image/png""#));
        assert!(read_part(&bytes, "word/_rels/document.xml.rels").contains(r#"Id="rId2""#));
        assert!(read_part(&bytes, "word/document.xml").contains(r#"r:embed="rId2""#));
    }

    #[test]
    fn test_shared_image_single_part_unique_drawings() {
        let logo = ImageAsset { bytes: vec![5; 1000], extension: "png".into(), width_px: 4, height_px: 1 };
        let mut doc = Document::default();
        for _ in 0..5 {
            doc.add_paragraph(ParagraphFormat::new());
            doc.add_image(&logo, 6.4);
        }
        let bytes = package(&doc).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let media: Vec<_> = archive.file_names().filter(|n| n.starts_with("word/media/")).collect();
        assert_eq!(media, vec!["word/media/image1.png"]);

        let xml = read_part(&bytes, "word/document.xml");
        assert_eq!(xml.matches(r#"r:embed="rId2""#).count(), 5);
        for id in 1..=5 {
            assert!(xml.contains(&format!(r#"<wp:docPr id="{}""#, id)));
        }
    }

    #[test]
    fn test_package_is_deterministic() {
        let mut doc = Document::default();
        doc.add_paragraph(ParagraphFormat::new());
        doc.add_run("CONTRATO", RunStyle::bold());
        assert_eq!(package(&doc).unwrap(), package(&doc).unwrap());
    }

    #[test]
    fn test_styles_use_layout_font() {
        let xml = styles_xml(&PageLayout::default());
        assert!(xml.contains(r#"w:eastAsia="Times New Roman""#));
        assert!(xml.contains(r#"<w:sz w:val="22"/>"#));
        assert!(xml.contains(r#"w:styleId="TableGrid""#));
    }

    #[test]
    fn test_section_margins() {
        let xml = section_xml(&PageLayout::default());
        assert!(xml.contains(r#"w:top="1417""#));
        assert!(xml.contains(r#"w:header="567""#));
    }
}
