//! Line Classifier - Priority-Ordered Rule Table
//!
//! Each rule inspects one normalized line (plus a read-only view of the raw
//! lines after it) and either claims it or passes. The first rule that
//! claims a line wins; unclaimed lines are plain paragraphs, so every line
//! gets exactly one kind.
//!
//! Rule order:
//! 1. Blank
//! 2. Declaration heading (`DECLARACION DE `, starts a banner page)
//! 3. Price table marker (may swallow the legacy first row line)
//! 4. Furnished table marker (swallows its `- ` applicability lines)
//! 5. Centered token
//! 6. Section heading (PRIMERO ... DECIMO)
//! 7. Signature line (25+ underscores)
//! 8. Declaration sub-heading
//! 9. Lettered item `a)`
//! 10. Bullet item `- `
//! 11. Account field label
//! 12. Plain paragraph (fallback)

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::assemble::AssemblyState;
use crate::builder::{Alignment, ParagraphFormat, RunStyle};
use crate::normalize::normalize_spanish_text;

static SECTION_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(PRIMERO|SEGUNDO|TERCERO|CUARTO|QUINTO|SEXTO|SEPTIMO|OCTAVO|NOVENO|DECIMO(\s+\w+)?)")
        .expect("section heading pattern")
});

static DECLARATION_SUBHEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DECLARACION DE ").expect("declaration pattern"));

static LETTERED_ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]\)").expect("lettered item pattern"));

pub const DECLARATION_PREFIX: &str = "DECLARACION DE ";
pub const PRICE_TABLE_MARKER: &str = "Tabla referencial de precios unitarios de reparaciones (UF + IVA):";
pub const PRICE_TABLE_FIRST_ROW: &str = "Aseo General Basico";
pub const FURNISHED_TABLE_MARKER: &str = "Los siguientes items aplican solo a departamentos amoblados";
pub const SIGNATURE_RULE: &str = "_________________________";

pub const CONTRACT_TITLE: &str = "CONTRATO DE ARRENDAMIENTO";
pub const CONNECTOR: &str = "CON";
pub const PARTY_PLACEHOLDERS: [&str; 2] = ["[[ARRENDADORA.RAZON_SOCIAL]]", "[[ARRENDATARIO.NOMBRE]]"];

pub const ACCOUNT_LABELS: [&str; 6] = [
    "Titular:",
    "RUT:",
    "Banco:",
    "Tipo de cuenta:",
    "Numero de cuenta:",
    "Correo de pago:",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CenteredToken {
    Title,
    Connector,
    Placeholder,
}

/// Structural role of one source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineKind {
    Blank,
    DeclarationHeading { page_break_before: bool },
    PriceTableMarker,
    FurnishedTableMarker,
    CenteredToken { token: CenteredToken },
    SectionHeading,
    SignatureLine,
    DeclarationSubHeading,
    LetteredItem,
    BulletItem,
    /// Byte offset just past the label's colon.
    AccountField { label_end: usize },
    PlainParagraph,
}

/// Paragraph and run styling derived from a kind.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStyle {
    pub paragraph: ParagraphFormat,
    pub run: RunStyle,
}

fn body_format() -> ParagraphFormat {
    ParagraphFormat::new().line_spacing(1.15).space_after(6.0)
}

fn table_title_format() -> ParagraphFormat {
    ParagraphFormat::new().space_before(8.0).space_after(4.0)
}

impl LineKind {
    pub fn style(&self) -> BlockStyle {
        let (paragraph, run) = match self {
            LineKind::Blank => (ParagraphFormat::new().space_after(8.0), RunStyle::plain()),
            LineKind::DeclarationHeading { .. } => (
                ParagraphFormat::new().space_after(10.0).align(Alignment::Center),
                RunStyle::bold().size(14.0),
            ),
            LineKind::PriceTableMarker | LineKind::FurnishedTableMarker => {
                (table_title_format(), RunStyle::bold())
            }
            LineKind::CenteredToken { token } => {
                let base = body_format().align(Alignment::Center);
                match token {
                    CenteredToken::Title => (base.space_after(14.0), RunStyle::bold().size(16.0)),
                    CenteredToken::Connector => (base, RunStyle::bold().size(12.0).italic()),
                    CenteredToken::Placeholder => (base, RunStyle::bold().size(13.0)),
                }
            }
            LineKind::SectionHeading => (
                body_format().space_before(12.0).space_after(6.0),
                RunStyle::bold().size(12.0),
            ),
            LineKind::SignatureLine => (
                body_format().align(Alignment::Center).space_before(12.0).space_after(2.0),
                RunStyle::bold(),
            ),
            LineKind::DeclarationSubHeading => (
                body_format().space_before(10.0).space_after(6.0).align(Alignment::Center),
                RunStyle::bold().size(12.0),
            ),
            LineKind::LetteredItem => (body_format().indent(0.6, -0.2), RunStyle::plain()),
            LineKind::BulletItem => (body_format().indent(0.8, -0.2), RunStyle::plain()),
            LineKind::AccountField { .. } | LineKind::PlainParagraph => (body_format(), RunStyle::plain()),
        };
        BlockStyle { paragraph, run }
    }
}

/// What a rule sees for the line under the cursor.
pub struct LineContext<'a> {
    /// Normalized text of the current line
    pub line: &'a str,
    /// Raw lines after the current one
    pub following: &'a [String],
    pub state: &'a AssemblyState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub kind: LineKind,
    /// Source lines consumed, including the current one
    pub consumed: usize,
}

impl RuleMatch {
    fn single(kind: LineKind) -> Self {
        Self { kind, consumed: 1 }
    }
}

/// A classification rule - claims a line or passes
pub trait LineRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch>;
}

/// Classified source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedLine {
    pub index: usize,
    pub text: String,
    #[serde(flatten)]
    pub kind: LineKind,
    pub consumed: usize,
    pub rule: &'static str,
}

// --- Concrete Rules ---

pub struct BlankRule;

impl LineRule for BlankRule {
    fn name(&self) -> &'static str { "blank" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        ctx.line.trim().is_empty().then(|| RuleMatch::single(LineKind::Blank))
    }
}

pub struct DeclarationHeadingRule;

impl LineRule for DeclarationHeadingRule {
    fn name(&self) -> &'static str { "declaration_heading" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        ctx.line.starts_with(DECLARATION_PREFIX).then(|| {
            RuleMatch::single(LineKind::DeclarationHeading {
                page_break_before: ctx.state.declaration_count > 0,
            })
        })
    }
}

pub struct PriceTableRule;

impl LineRule for PriceTableRule {
    fn name(&self) -> &'static str { "price_table" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        if ctx.line != PRICE_TABLE_MARKER {
            return None;
        }
        let swallows_first_row = ctx
            .following
            .first()
            .map_or(false, |next| next.contains(PRICE_TABLE_FIRST_ROW));
        Some(RuleMatch {
            kind: LineKind::PriceTableMarker,
            consumed: if swallows_first_row { 2 } else { 1 },
        })
    }
}

pub struct FurnishedTableRule;

impl LineRule for FurnishedTableRule {
    fn name(&self) -> &'static str { "furnished_table" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        if !ctx.line.starts_with(FURNISHED_TABLE_MARKER) {
            return None;
        }
        let bullets = ctx
            .following
            .iter()
            .take_while(|line| line.trim_start().starts_with("- "))
            .count();
        Some(RuleMatch {
            kind: LineKind::FurnishedTableMarker,
            consumed: 1 + bullets,
        })
    }
}

pub struct CenteredTokenRule;

impl LineRule for CenteredTokenRule {
    fn name(&self) -> &'static str { "centered_token" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        let token = match ctx.line {
            CONTRACT_TITLE => CenteredToken::Title,
            CONNECTOR => CenteredToken::Connector,
            line if PARTY_PLACEHOLDERS.contains(&line) => CenteredToken::Placeholder,
            _ => return None,
        };
        Some(RuleMatch::single(LineKind::CenteredToken { token }))
    }
}

pub struct SectionHeadingRule;

impl LineRule for SectionHeadingRule {
    fn name(&self) -> &'static str { "section_heading" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        SECTION_HEADING_RE
            .is_match(ctx.line)
            .then(|| RuleMatch::single(LineKind::SectionHeading))
    }
}

pub struct SignatureLineRule;

impl LineRule for SignatureLineRule {
    fn name(&self) -> &'static str { "signature_line" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        ctx.line
            .starts_with(SIGNATURE_RULE)
            .then(|| RuleMatch::single(LineKind::SignatureLine))
    }
}

/// Shadowed by [`DeclarationHeadingRule`] in the standard order; kept so a
/// reordered table still renders body declarations as centered headings.
pub struct DeclarationSubHeadingRule;

impl LineRule for DeclarationSubHeadingRule {
    fn name(&self) -> &'static str { "declaration_subheading" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        DECLARATION_SUBHEADING_RE
            .is_match(ctx.line)
            .then(|| RuleMatch::single(LineKind::DeclarationSubHeading))
    }
}

pub struct LetteredItemRule;

impl LineRule for LetteredItemRule {
    fn name(&self) -> &'static str { "lettered_item" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        LETTERED_ITEM_RE
            .is_match(ctx.line)
            .then(|| RuleMatch::single(LineKind::LetteredItem))
    }
}

pub struct BulletItemRule;

impl LineRule for BulletItemRule {
    fn name(&self) -> &'static str { "bullet_item" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        ctx.line
            .starts_with("- ")
            .then(|| RuleMatch::single(LineKind::BulletItem))
    }
}

pub struct AccountFieldRule;

impl LineRule for AccountFieldRule {
    fn name(&self) -> &'static str { "account_field" }

    fn classify(&self, ctx: &LineContext<'_>) -> Option<RuleMatch> {
        if !ACCOUNT_LABELS.iter().any(|label| ctx.line.starts_with(label)) {
            return None;
        }
        let colon = ctx.line.find(':')?;
        Some(RuleMatch::single(LineKind::AccountField { label_end: colon + 1 }))
    }
}

/// Classifier runs the rule table in priority order
pub struct Classifier {
    rules: Vec<Box<dyn LineRule>>,
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(BlankRule),
                Box::new(DeclarationHeadingRule),
                Box::new(PriceTableRule),
                Box::new(FurnishedTableRule),
                Box::new(CenteredTokenRule),
                Box::new(SectionHeadingRule),
                Box::new(SignatureLineRule),
                Box::new(DeclarationSubHeadingRule),
                Box::new(LetteredItemRule),
                Box::new(BulletItemRule),
                Box::new(AccountFieldRule),
            ],
        }
    }

    /// Build from an explicit rule order.
    pub fn with_rules(rules: Vec<Box<dyn LineRule>>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Classify `lines[index]`, or `None` past the end of the source.
    pub fn classify(&self, lines: &[String], index: usize, state: &AssemblyState) -> Option<ClassifiedLine> {
        let (current, following) = lines.get(index..)?.split_first()?;
        let text = normalize_spanish_text(current);
        let ctx = LineContext {
            line: &text,
            following,
            state,
        };

        let (rule, matched) = self
            .rules
            .iter()
            .find_map(|rule| rule.classify(&ctx).map(|m| (rule.name(), m)))
            .unwrap_or(("plain_paragraph", RuleMatch::single(LineKind::PlainParagraph)));

        Some(ClassifiedLine {
            index,
            text,
            kind: matched.kind,
            consumed: matched.consumed,
            rule,
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}
