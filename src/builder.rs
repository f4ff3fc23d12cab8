//! Document Builder - Backend-Neutral Rich Document Surface
//!
//! The assembler only talks to [`DocumentBuilder`]. [`Document`] is the
//! in-memory implementation; the `docx` module serializes it.

use crate::layout::PageLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    Left,
    Center,
}

/// A ruled line under a paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderLine {
    /// Eighths of a point
    pub size: u32,
    /// Points between text and line
    pub space: u32,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParagraphFormat {
    pub alignment: Option<Alignment>,
    pub space_before_pt: Option<f32>,
    pub space_after_pt: Option<f32>,
    pub line_spacing: Option<f32>,
    pub left_indent_cm: Option<f32>,
    pub first_line_indent_cm: Option<f32>,
    pub page_break_before: bool,
    pub bottom_border: Option<BorderLine>,
}

impl ParagraphFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn space_before(mut self, pt: f32) -> Self {
        self.space_before_pt = Some(pt);
        self
    }

    pub fn space_after(mut self, pt: f32) -> Self {
        self.space_after_pt = Some(pt);
        self
    }

    pub fn line_spacing(mut self, multiple: f32) -> Self {
        self.line_spacing = Some(multiple);
        self
    }

    /// Hanging indent: text at `left_cm`, first line shifted by `first_line_cm`.
    pub fn indent(mut self, left_cm: f32, first_line_cm: f32) -> Self {
        self.left_indent_cm = Some(left_cm);
        self.first_line_indent_cm = Some(first_line_cm);
        self
    }

    pub fn page_break_before(mut self, on: bool) -> Self {
        self.page_break_before = on;
        self
    }

    pub fn bottom_border(mut self, border: BorderLine) -> Self {
        self.bottom_border = Some(border);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub size_pt: Option<f32>,
}

impl RunStyle {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        Self { bold: true, ..Self::default() }
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn size(mut self, pt: f32) -> Self {
        self.size_pt = Some(pt);
        self
    }
}

/// Raster image bytes plus the pixel size needed to keep its aspect ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset {
    pub bytes: Vec<u8>,
    /// File extension without the dot ("png", "jpeg")
    pub extension: String,
    pub width_px: u32,
    pub height_px: u32,
}

impl ImageAsset {
    pub fn content_type(&self) -> &'static str {
        match self.extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            _ => "image/png",
        }
    }

    /// Height in centimeters when scaled to `width_cm`.
    pub fn height_for_width(&self, width_cm: f32) -> f32 {
        if self.width_px == 0 {
            return 0.0;
        }
        width_cm * self.height_px as f32 / self.width_px as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Run {
    Text { text: String, style: RunStyle },
    Image { media: usize, width_cm: f32, height_cm: f32 },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub format: ParagraphFormat,
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Concatenated text of all text runs.
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .filter_map(|run| match run {
                Run::Text { text, .. } => Some(text.as_str()),
                Run::Image { .. } => None,
            })
            .collect()
    }

    /// No images and no visible text.
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|run| match run {
            Run::Text { text, .. } => text.trim().is_empty(),
            Run::Image { .. } => false,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellStyle {
    pub run: RunStyle,
    pub space_before_pt: f32,
    pub space_after_pt: f32,
    pub shading: Option<String>,
}

/// Fixed table geometry and styling, independent of row content.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSpec {
    pub widths_cm: Vec<f32>,
    pub alignments: Vec<Alignment>,
    pub header: CellStyle,
    pub body: CellStyle,
    pub repeat_header: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub spec: TableSpec,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Data rows plus the header row.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl Block {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        }
    }
}

/// Capability interface for a rich-document backend.
pub trait DocumentBuilder {
    fn set_layout(&mut self, layout: PageLayout);

    /// Start a new paragraph; later runs attach to it.
    fn add_paragraph(&mut self, format: ParagraphFormat);

    fn add_run(&mut self, text: &str, style: RunStyle);

    fn add_image(&mut self, image: &ImageAsset, width_cm: f32);

    fn add_table(&mut self, header: &[&str], rows: Vec<Vec<String>>, spec: TableSpec);

    /// The next paragraph starts on a new page.
    fn add_page_break(&mut self);
}

/// Ordered block sequence built in memory.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub layout: PageLayout,
    pub blocks: Vec<Block>,
    pub media: Vec<ImageAsset>,
    pending_page_break: bool,
}

impl Document {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(Block::as_table)
    }

    /// Drop a leading blank paragraph. Returns whether one was removed.
    pub fn finalize(&mut self) -> bool {
        let leading_blank = matches!(self.blocks.first(), Some(Block::Paragraph(p)) if p.is_blank());
        if leading_blank {
            self.blocks.remove(0);
        }
        leading_blank
    }

    fn current_paragraph(&mut self) -> &mut Paragraph {
        if !matches!(self.blocks.last(), Some(Block::Paragraph(_))) {
            self.add_paragraph(ParagraphFormat::default());
        }
        match self.blocks.last_mut() {
            Some(Block::Paragraph(p)) => p,
            _ => unreachable!("a paragraph was just pushed"),
        }
    }
}

impl DocumentBuilder for Document {
    fn set_layout(&mut self, layout: PageLayout) {
        self.layout = layout;
    }

    fn add_paragraph(&mut self, mut format: ParagraphFormat) {
        if std::mem::take(&mut self.pending_page_break) {
            format.page_break_before = true;
        }
        self.blocks.push(Block::Paragraph(Paragraph { format, runs: vec![] }));
    }

    fn add_run(&mut self, text: &str, style: RunStyle) {
        self.current_paragraph().runs.push(Run::Text { text: text.to_string(), style });
    }

    fn add_image(&mut self, image: &ImageAsset, width_cm: f32) {
        let media = match self.media.iter().position(|m| m.bytes == image.bytes) {
            Some(existing) => existing,
            None => {
                self.media.push(image.clone());
                self.media.len() - 1
            }
        };
        let height_cm = image.height_for_width(width_cm);
        self.current_paragraph().runs.push(Run::Image { media, width_cm, height_cm });
    }

    fn add_table(&mut self, header: &[&str], rows: Vec<Vec<String>>, spec: TableSpec) {
        self.blocks.push(Block::Table(Table {
            spec,
            header: header.iter().map(|h| h.to_string()).collect(),
            rows,
        }));
    }

    fn add_page_break(&mut self) {
        self.pending_page_break = true;
    }
}
