//! Template Lint - Rule/Policy Separation
//!
//! Rules produce structured violations against the template source.
//! The profile's failure mode decides whether they block a build.
//! Placeholder tokens are inventoried here, never substituted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classify::{CONTRACT_TITLE, PRICE_TABLE_FIRST_ROW, PRICE_TABLE_MARKER};
use crate::normalize::normalize_spanish_text;
use crate::profile::{BuildProfile, FailureMode, LintConfig};

/// Anything between double brackets.
static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[([^\[\]]*)\]\]").expect("placeholder pattern"));

/// `NAMESPACE.FIELD`, optionally nested.
static PLACEHOLDER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*(\.[A-Z0-9_]+)+$").expect("placeholder name pattern"));

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LintViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    /// 1-based source line
    pub line: Option<usize>,
    pub actual: Option<String>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LintReport {
    pub valid: bool,
    pub violations: Vec<LintViolation>,
    pub profile_id: String,
    pub template_version: String,
    pub placeholders: Vec<String>,
}

impl LintReport {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    /// One line per violation, for error messages.
    pub fn summary(&self) -> String {
        self.violations
            .iter()
            .map(|v| match v.line {
                Some(line) => format!("{} (line {}): {}", v.rule, line, v.message),
                None => format!("{}: {}", v.rule, v.message),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Distinct well-formed placeholder names in first-seen order.
pub fn extract_placeholders(lines: &[String]) -> Vec<String> {
    let mut found: Vec<String> = vec![];
    for line in lines {
        for cap in PLACEHOLDER_RE.captures_iter(line) {
            let name = &cap[1];
            if PLACEHOLDER_NAME_RE.is_match(name) && !found.iter().any(|f| f == name) {
                found.push(name.to_string());
            }
        }
    }
    found
}

/// Lint rule trait - produces violations
pub trait LintRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, lines: &[String], config: &LintConfig) -> Vec<LintViolation>;
}

fn violation(
    rule: &dyn LintRule,
    severity: ViolationSeverity,
    message: impl Into<String>,
    line: Option<usize>,
    actual: Option<String>,
    remediation: &str,
) -> LintViolation {
    LintViolation {
        rule: rule.name().to_string(),
        severity,
        message: message.into(),
        line,
        actual,
        remediation: vec![remediation.to_string()],
    }
}

// --- Concrete Rules ---

pub struct EmptyTemplateRule;

impl LintRule for EmptyTemplateRule {
    fn name(&self) -> &'static str { "empty_template" }

    fn check(&self, lines: &[String], config: &LintConfig) -> Vec<LintViolation> {
        if lines.iter().all(|l| l.trim().is_empty()) {
            let severity = if config.reject_empty {
                ViolationSeverity::Error
            } else {
                ViolationSeverity::Warning
            };
            vec![violation(
                self,
                severity,
                "Template has no content",
                None,
                None,
                "Check the template source path",
            )]
        } else {
            vec![]
        }
    }
}

pub struct ContractTitleRule;

impl LintRule for ContractTitleRule {
    fn name(&self) -> &'static str { "contract_title" }

    fn check(&self, lines: &[String], config: &LintConfig) -> Vec<LintViolation> {
        if !config.require_title || lines.iter().all(|l| l.trim().is_empty()) {
            return vec![];
        }
        if lines.iter().any(|l| normalize_spanish_text(l) == CONTRACT_TITLE) {
            return vec![];
        }
        vec![violation(
            self,
            ViolationSeverity::Warning,
            "Contract title line not found",
            None,
            None,
            &format!("Add a line reading exactly \"{}\"", CONTRACT_TITLE),
        )]
    }
}

pub struct PlaceholderSyntaxRule;

impl LintRule for PlaceholderSyntaxRule {
    fn name(&self) -> &'static str { "placeholder_syntax" }

    fn check(&self, lines: &[String], _config: &LintConfig) -> Vec<LintViolation> {
        let mut violations = vec![];
        for (idx, line) in lines.iter().enumerate() {
            if line.matches("[[").count() != line.matches("]]").count() {
                violations.push(violation(
                    self,
                    ViolationSeverity::Warning,
                    "Unbalanced placeholder brackets",
                    Some(idx + 1),
                    Some(line.trim().to_string()),
                    "Close every [[ with ]]",
                ));
            }
            for cap in PLACEHOLDER_RE.captures_iter(line) {
                let name = &cap[1];
                if !PLACEHOLDER_NAME_RE.is_match(name) {
                    violations.push(violation(
                        self,
                        ViolationSeverity::Warning,
                        "Malformed placeholder token",
                        Some(idx + 1),
                        Some(cap[0].to_string()),
                        "Use [[NAMESPACE.FIELD]] in upper case",
                    ));
                }
            }
        }
        violations
    }
}

pub struct PlaceholderCatalogRule;

impl LintRule for PlaceholderCatalogRule {
    fn name(&self) -> &'static str { "placeholder_catalog" }

    fn check(&self, lines: &[String], config: &LintConfig) -> Vec<LintViolation> {
        if config.allowed_placeholders.is_empty() {
            return vec![];
        }
        extract_placeholders(lines)
            .into_iter()
            .filter(|name| !config.allowed_placeholders.contains(name))
            .map(|name| {
                violation(
                    self,
                    ViolationSeverity::Warning,
                    "Placeholder not in catalog",
                    None,
                    Some(name),
                    "Add the field to the placeholder catalog or fix the token",
                )
            })
            .collect()
    }
}

pub struct PriceTableFollowerRule;

impl LintRule for PriceTableFollowerRule {
    fn name(&self) -> &'static str { "price_table_follower" }

    fn check(&self, lines: &[String], _config: &LintConfig) -> Vec<LintViolation> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| normalize_spanish_text(line) == PRICE_TABLE_MARKER)
            .filter(|(idx, _)| {
                !lines
                    .get(idx + 1)
                    .map_or(false, |next| next.contains(PRICE_TABLE_FIRST_ROW))
            })
            .map(|(idx, _)| {
                violation(
                    self,
                    ViolationSeverity::Info,
                    "Price table marker without its legacy first-row line; only the marker is consumed",
                    Some(idx + 1),
                    None,
                    "The rendered table is unaffected",
                )
            })
            .collect()
    }
}

/// Linter orchestrates rules and applies policy
pub struct Linter {
    rules: Vec<Box<dyn LintRule>>,
}

impl Linter {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(EmptyTemplateRule),
                Box::new(ContractTitleRule),
                Box::new(PlaceholderSyntaxRule),
                Box::new(PlaceholderCatalogRule),
                Box::new(PriceTableFollowerRule),
            ],
        }
    }

    pub fn lint(&self, lines: &[String], profile: &BuildProfile) -> LintReport {
        let violations: Vec<LintViolation> = self
            .rules
            .iter()
            .flat_map(|rule| rule.check(lines, &profile.lint))
            .collect();

        let has_errors = violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        let valid = match profile.lint.failure_mode {
            FailureMode::Block => !has_errors,
            FailureMode::Warn | FailureMode::Log => true,
        };

        LintReport {
            valid,
            violations,
            profile_id: profile.id.clone(),
            template_version: profile.template_version.clone(),
            placeholders: extract_placeholders(lines),
        }
    }
}

impl Default for Linter {
    fn default() -> Self {
        Self::new()
    }
}
