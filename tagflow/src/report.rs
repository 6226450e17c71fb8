#![forbid(unsafe_code)]

use std::fmt;

use miette::{Diagnostic, LabeledSpan, NamedSource};
use serde::Serialize;

use tagflow_core::{AnalysisUnit, Finding, UnitReport};
use tagflow_model::Span;

use crate::config::{ResolvedConfig, Severity};

pub const SCHEMA: &str = "tagflow.findings.v1";

#[derive(Debug, Clone, Serialize)]
pub struct SpanRange {
    pub offset: usize,
    pub len: usize,
}

impl From<Span> for SpanRange {
    fn from(s: Span) -> Self {
        Self {
            offset: s.offset(),
            len: s.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FindingsReport {
    pub schema: &'static str,
    pub inputs: Vec<String>,
    pub ok: bool,
    pub errors: usize,
    pub warnings: usize,
    pub units: Vec<UnitEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitEntry {
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub findings: Vec<FindingEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub slot_errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FindingEntry {
    pub issue: &'static str,
    pub severity: Severity,
    pub class: &'static str,
    pub message: String,
    pub span: SpanRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SpanRange>,
}

/// A checked unit paired with the input it came from.
pub struct Checked {
    pub unit: AnalysisUnit,
    pub report: UnitReport,
}

impl FindingsReport {
    pub fn build(inputs: Vec<String>, checked: &[Checked], config: &ResolvedConfig) -> Self {
        let mut errors = 0;
        let mut warnings = 0;
        let mut units = Vec::with_capacity(checked.len());

        for c in checked {
            let mut findings = Vec::new();
            for f in &c.report.findings {
                let severity = config.severity(f.issue);
                match severity {
                    Severity::Error => errors += 1,
                    Severity::Warning => warnings += 1,
                    Severity::Ignore => continue,
                }
                findings.push(FindingEntry {
                    issue: f.issue.id(),
                    severity,
                    class: f.violation.class(),
                    message: f.message.clone(),
                    span: f.span.into(),
                    slot: f.slot.as_ref().map(|s| s.to_string()),
                    secondary: f.secondary.map(Into::into),
                });
            }
            units.push(UnitEntry {
                unit: c.report.unit.clone(),
                path: c.unit.path.clone(),
                findings,
                slot_errors: c.report.slot_errors.iter().map(|e| e.to_string()).collect(),
            });
        }

        Self {
            schema: SCHEMA,
            inputs,
            ok: errors == 0,
            errors,
            warnings,
            units,
        }
    }

    pub fn to_json(&self) -> miette::Result<String> {
        use miette::IntoDiagnostic;
        serde_json::to_string_pretty(self).into_diagnostic()
    }
}

/// A finding with the driver's severity attached, for rendering through miette.
#[derive(Debug, Clone)]
pub struct Policed {
    pub finding: Finding,
    pub severity: Severity,
}

impl fmt::Display for Policed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.finding, f)
    }
}

impl std::error::Error for Policed {}

impl Diagnostic for Policed {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.finding.code()
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning | Severity::Ignore => miette::Severity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.finding.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.finding.labels()
    }
}

/// Renders every non-ignored finding. Units that ship their source get snippets;
/// the rest get one line per finding.
pub fn render_human(checked: &[Checked], config: &ResolvedConfig) -> String {
    let mut out = String::new();
    for c in checked {
        let name = c.unit.path.clone().unwrap_or_else(|| c.unit.name.clone());
        for e in &c.report.slot_errors {
            out.push_str(&format!("{name}: warning: {e}\n"));
        }
        for f in &c.report.findings {
            let severity = config.severity(f.issue);
            if severity == Severity::Ignore {
                continue;
            }
            match &c.unit.source {
                Some(src) => {
                    let report = miette::Report::new(Policed {
                        finding: f.clone(),
                        severity,
                    })
                    .with_source_code(NamedSource::new(&name, src.clone()));
                    out.push_str(&format!("{report:?}\n"));
                }
                None => {
                    let level = match severity {
                        Severity::Error => "error",
                        _ => "warning",
                    };
                    out.push_str(&format!(
                        "{name}@{}: {level}: {} [{}]\n",
                        f.span.offset(),
                        f.message,
                        f.issue
                    ));
                }
            }
        }
    }
    out
}
