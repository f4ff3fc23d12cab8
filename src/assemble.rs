//! Document Assembler - Cursor-Driven Line Consumption
//!
//! Walks the source once, front to back. State lives in [`AssemblyState`]
//! and is owned by a single walk; nothing is global.

use serde::Serialize;
use tracing::debug;

use crate::banner::compose_banner;
use crate::builder::{Document, DocumentBuilder, ImageAsset, RunStyle};
use crate::classify::{ClassifiedLine, Classifier, LineKind};
use crate::layout::PageLayout;
use crate::reference::{FURNISHED_PRICE_ROWS, FURNISHED_TABLE_TITLE, PRICE_ROWS, PRICE_TABLE_TITLE};
use crate::table::render_price_table;

/// Mutable state of one assembly pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyState {
    /// Index of the next unconsumed source line
    pub cursor: usize,
    /// Declaration headings emitted so far
    pub declaration_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    pub lines: usize,
    pub classified: usize,
    pub blocks: usize,
    pub paragraphs: usize,
    pub tables: usize,
    pub declarations: usize,
    pub leading_blank_removed: bool,
}

/// Result of assembling a template.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub document: Document,
    pub lines: Vec<ClassifiedLine>,
    pub state: AssemblyState,
    pub stats: AssemblyStats,
}

pub struct Assembler {
    classifier: Classifier,
    logo: Option<ImageAsset>,
}

impl Assembler {
    pub fn new(logo: Option<ImageAsset>) -> Self {
        Self {
            classifier: Classifier::new(),
            logo,
        }
    }

    /// Classify without rendering.
    pub fn classify_all(&self, lines: &[String]) -> Vec<ClassifiedLine> {
        let mut out = vec![];
        self.walk(lines, |line| out.push(line));
        out
    }

    /// Apply `layout` to `builder`, then render every line into it.
    pub fn assemble_into<B: DocumentBuilder + ?Sized>(
        &self,
        lines: &[String],
        layout: PageLayout,
        builder: &mut B,
    ) -> (AssemblyState, Vec<ClassifiedLine>) {
        builder.set_layout(layout);
        let mut classified = vec![];
        let state = self.walk(lines, |line| {
            self.emit(builder, &line);
            classified.push(line);
        });
        (state, classified)
    }

    /// Assemble into an in-memory document and finalize it.
    pub fn assemble(&self, lines: &[String], layout: PageLayout) -> Assembly {
        let mut document = Document::default();
        let (state, classified) = self.assemble_into(lines, layout, &mut document);
        let leading_blank_removed = document.finalize();

        let stats = AssemblyStats {
            lines: lines.len(),
            classified: classified.len(),
            blocks: document.blocks.len(),
            paragraphs: document.paragraphs().count(),
            tables: document.tables().count(),
            declarations: state.declaration_count,
            leading_blank_removed,
        };

        Assembly {
            document,
            lines: classified,
            state,
            stats,
        }
    }

    fn walk(&self, lines: &[String], mut visit: impl FnMut(ClassifiedLine)) -> AssemblyState {
        let mut state = AssemblyState::default();
        while let Some(line) = self.classifier.classify(lines, state.cursor, &state) {
            debug!(index = line.index, rule = line.rule, consumed = line.consumed, "classified line");

            if matches!(line.kind, LineKind::DeclarationHeading { .. }) {
                state.declaration_count += 1;
            }
            state.cursor += line.consumed;
            visit(line);
        }
        state
    }

    fn emit<B: DocumentBuilder + ?Sized>(&self, builder: &mut B, line: &ClassifiedLine) {
        let style = line.kind.style();
        match &line.kind {
            LineKind::Blank => builder.add_paragraph(style.paragraph),
            LineKind::DeclarationHeading { page_break_before } => {
                compose_banner(builder, *page_break_before, self.logo.as_ref());
                builder.add_paragraph(style.paragraph);
                builder.add_run(&line.text, style.run);
            }
            LineKind::PriceTableMarker => {
                builder.add_paragraph(style.paragraph);
                builder.add_run(PRICE_TABLE_TITLE, style.run);
                render_price_table(builder, &PRICE_ROWS);
            }
            LineKind::FurnishedTableMarker => {
                builder.add_paragraph(style.paragraph);
                builder.add_run(FURNISHED_TABLE_TITLE, style.run);
                render_price_table(builder, &FURNISHED_PRICE_ROWS);
            }
            LineKind::AccountField { label_end } => {
                let (label, rest) = line.text.split_at(*label_end);
                builder.add_paragraph(style.paragraph);
                builder.add_run(label, RunStyle::bold());
                builder.add_run(rest, style.run);
            }
            _ => {
                builder.add_paragraph(style.paragraph);
                builder.add_run(&line.text, style.run);
            }
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(None)
    }
}
