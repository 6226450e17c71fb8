#![forbid(unsafe_code)]
#![allow(unused_assignments)]

//! JSON feed of pre-resolved slots and bound use sites.
//!
//! Expression ids identify expressions within a unit; an id that appears more
//! than once must describe the same expression.

use std::fs;
use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use tagflow_core::{AnalysisUnit, ArithOp, CompareOp, FlowKind, UseSite};
use tagflow_model::{
    ArgBinding, DeclId, Expr, ExprId, ExprKind, LiteralValue, NumericType, Slot, SlotId, SlotKind,
    Span, TagKind,
};

#[derive(Debug, Error, Diagnostic)]
pub enum FeedError {
    #[error("feed error: failed to read {path}")]
    #[diagnostic(code(tagflow::feed::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("feed error: {path} is not a valid feed: {message}")]
    #[diagnostic(code(tagflow::feed::parse))]
    Parse {
        path: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct SpanDto {
    pub offset: usize,
    pub len: usize,
}

impl From<SpanDto> for Span {
    fn from(s: SpanDto) -> Self {
        tagflow_model::span(s.offset, s.len)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeedDocument {
    units: Vec<UnitDto>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitDto {
    name: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    slots: Vec<SlotDto>,
    #[serde(default)]
    sites: Vec<SiteDto>,
}

#[derive(Debug, Deserialize)]
struct SlotRefDto {
    owner: String,
    slot: SlotKind,
}

impl From<SlotRefDto> for SlotId {
    fn from(r: SlotRefDto) -> Self {
        SlotId {
            owner: DeclId(r.owner),
            kind: r.slot,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SlotDto {
    owner: String,
    slot: SlotKind,
    #[serde(default)]
    tags: Vec<TagKind>,
    #[serde(default)]
    value_type: Option<NumericType>,
    #[serde(default)]
    declared_at: Option<SpanDto>,
    #[serde(default)]
    inherited: bool,
}

#[derive(Debug, Deserialize)]
struct ExprDto {
    id: u32,
    span: SpanDto,
    #[serde(default)]
    text: Option<String>,
    #[serde(flatten)]
    kind: ExprKindDto,
}

#[derive(Debug, Deserialize)]
struct ArgDto {
    index: usize,
    expr: ExprDto,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ExprKindDto {
    Literal {
        value: LiteralValue,
    },
    SlotRef {
        target: SlotRefDto,
    },
    Call {
        callee: String,
        #[serde(default)]
        args: Vec<ArgDto>,
        #[serde(default)]
        returns: Option<SlotRefDto>,
    },
    Conditional {
        branches: Vec<ExprDto>,
    },
    Chained {
        definition: Box<ExprDto>,
    },
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FlowKindDto {
    Argument,
    Assignment,
    Return,
}

#[derive(Clone, Copy, Debug, Deserialize)]
enum CompareOpDto {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

#[derive(Clone, Copy, Debug, Deserialize)]
enum ArithOpDto {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "site", rename_all = "snake_case")]
enum SiteDto {
    Call {
        expr: ExprDto,
    },
    Flow {
        expr: ExprDto,
        target: SlotRefDto,
        kind: FlowKindDto,
    },
    Compare {
        op: CompareOpDto,
        lhs: ExprDto,
        rhs: ExprDto,
        span: SpanDto,
    },
    Arithmetic {
        op: ArithOpDto,
        operands: Vec<ExprDto>,
        result: NumericType,
        span: SpanDto,
    },
}

impl From<ExprDto> for Expr {
    fn from(dto: ExprDto) -> Self {
        let kind = match dto.kind {
            ExprKindDto::Literal { value } => ExprKind::Literal(value),
            ExprKindDto::SlotRef { target } => ExprKind::SlotRef(target.into()),
            ExprKindDto::Call {
                callee,
                args,
                returns,
            } => ExprKind::Call {
                callee: DeclId(callee),
                args: args
                    .into_iter()
                    .map(|a| ArgBinding {
                        index: a.index,
                        expr: a.expr.into(),
                    })
                    .collect(),
                return_slot: returns.map(Into::into),
            },
            ExprKindDto::Conditional { branches } => {
                ExprKind::Conditional(branches.into_iter().map(Into::into).collect())
            }
            ExprKindDto::Chained { definition } => {
                ExprKind::ChainedRef(Box::new((*definition).into()))
            }
        };
        Expr {
            id: ExprId(dto.id),
            span: dto.span.into(),
            text: dto.text,
            kind,
        }
    }
}

impl From<SlotDto> for Slot {
    fn from(dto: SlotDto) -> Self {
        Slot {
            id: SlotId {
                owner: DeclId(dto.owner),
                kind: dto.slot,
            },
            required: dto.tags.into_iter().collect(),
            value_type: dto.value_type,
            span: dto.declared_at.map(Into::into),
            inherited: dto.inherited,
        }
    }
}

impl From<SiteDto> for UseSite {
    fn from(dto: SiteDto) -> Self {
        match dto {
            SiteDto::Call { expr } => UseSite::Call(expr.into()),
            SiteDto::Flow { expr, target, kind } => UseSite::Flow {
                expr: expr.into(),
                target: target.into(),
                kind: match kind {
                    FlowKindDto::Argument => FlowKind::Argument,
                    FlowKindDto::Assignment => FlowKind::Assignment,
                    FlowKindDto::Return => FlowKind::Return,
                },
            },
            SiteDto::Compare { op, lhs, rhs, span } => UseSite::Compare {
                op: match op {
                    CompareOpDto::Lt => CompareOp::Lt,
                    CompareOpDto::Le => CompareOp::Le,
                    CompareOpDto::Gt => CompareOp::Gt,
                    CompareOpDto::Ge => CompareOp::Ge,
                    CompareOpDto::Eq => CompareOp::Eq,
                    CompareOpDto::Ne => CompareOp::Ne,
                },
                lhs: lhs.into(),
                rhs: rhs.into(),
                span: span.into(),
            },
            SiteDto::Arithmetic {
                op,
                operands,
                result,
                span,
            } => UseSite::Arithmetic {
                op: match op {
                    ArithOpDto::Add => ArithOp::Add,
                    ArithOpDto::Sub => ArithOp::Sub,
                    ArithOpDto::Mul => ArithOp::Mul,
                    ArithOpDto::Div => ArithOp::Div,
                    ArithOpDto::Rem => ArithOp::Rem,
                    ArithOpDto::Shl => ArithOp::Shl,
                    ArithOpDto::Shr => ArithOp::Shr,
                    ArithOpDto::BitAnd => ArithOp::BitAnd,
                    ArithOpDto::BitOr => ArithOp::BitOr,
                    ArithOpDto::BitXor => ArithOp::BitXor,
                },
                operands: operands.into_iter().map(Into::into).collect(),
                result,
                span: span.into(),
            },
        }
    }
}

impl From<UnitDto> for AnalysisUnit {
    fn from(dto: UnitDto) -> Self {
        AnalysisUnit {
            name: dto.name,
            path: dto.path,
            source: dto.source,
            slots: dto.slots.into_iter().map(Into::into).collect(),
            sites: dto.sites.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parses a feed document; `path` only names the input in errors.
pub fn parse_feed(path: &str, raw: &str) -> Result<Vec<AnalysisUnit>, FeedError> {
    let doc: FeedDocument = serde_json::from_str(raw).map_err(|e| FeedError::Parse {
        path: path.to_string(),
        message: e.to_string(),
        span: offset_of(raw, e.line(), e.column()).map(|o| SourceSpan::new(o.into(), 0)),
        src: NamedSource::new(path, raw.to_string()),
    })?;
    debug!(path, units = doc.units.len(), "feed parsed");
    Ok(doc.units.into_iter().map(Into::into).collect())
}

pub fn load_feed(path: &Path) -> Result<Vec<AnalysisUnit>, FeedError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| FeedError::Io {
        path: display.clone(),
        source,
    })?;
    parse_feed(&display, &raw)
}

/// Byte offset of a 1-based line/column position, as serde_json reports it.
fn offset_of(raw: &str, line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let line_start: usize = raw
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    Some((line_start + column.saturating_sub(1)).min(raw.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagflow_model::ResourceType;

    const FEED: &str = r#"{
      "units": [{
        "name": "Labels.java",
        "slots": [
          {"owner": "setLabels", "slot": {"kind": "Parameter", "index": 0},
           "tags": [{"kind": "ResourceType", "value": "string"}]},
          {"owner": "getSize", "slot": {"kind": "Return"},
           "tags": [{"kind": "IntRange", "value": {"from": 3}}], "declared_at": {"offset": 4, "len": 2},
           "inherited": true}
        ],
        "sites": [
          {"site": "call", "expr": {"id": 1, "span": {"offset": 10, "len": 14}, "kind": "call",
            "callee": "setLabels",
            "args": [{"index": 0, "expr": {"id": 2, "span": {"offset": 20, "len": 3}, "kind": "literal", "value": 2.5}}]}},
          {"site": "compare", "op": "<=", "span": {"offset": 30, "len": 6},
            "lhs": {"id": 3, "span": {"offset": 30, "len": 1}, "kind": "slot_ref",
                    "target": {"owner": "R.drawable.icon", "slot": {"kind": "Field"}}},
            "rhs": {"id": 4, "span": {"offset": 35, "len": 1}, "kind": "literal", "value": 7}}
        ]
      }]
    }"#;

    #[test]
    fn parses_slots_and_sites() {
        let units = parse_feed("labels.json", FEED).expect("feed");
        assert_eq!(units.len(), 1);
        let unit = &units[0];
        assert_eq!(unit.slots.len(), 2);
        assert!(unit.slots[0]
            .required
            .has_resource_type(ResourceType::String));
        assert_eq!(unit.slots[1].id.kind, SlotKind::Return);
        assert!(unit.slots[1].inherited);
        assert!(matches!(
            unit.slots[1].required.range(),
            Some(TagKind::IntRange { from: 3, to: i64::MAX, .. })
        ));

        let UseSite::Call(call) = &unit.sites[0] else {
            panic!("expected call site");
        };
        let ExprKind::Call { args, .. } = &call.kind else {
            panic!("expected call expression");
        };
        assert_eq!(args[0].expr.literal(), Some(&LiteralValue::Float(2.5)));
        assert!(matches!(
            &unit.sites[1],
            UseSite::Compare { op: CompareOp::Le, .. }
        ));
    }

    #[test]
    fn parse_errors_point_into_the_document() {
        let raw = "{\n  \"units\": [\n    {\"nam\": 1}\n  ]\n}";
        let err = parse_feed("broken.json", raw).expect_err("invalid feed");
        let FeedError::Parse { span, message, .. } = err else {
            panic!("expected parse error");
        };
        assert!(message.contains("nam"), "{message}");
        let offset = span.expect("span").offset();
        assert!(offset > raw.find('[').unwrap_or(0));
    }

    #[test]
    fn offsets_count_whole_lines() {
        assert_eq!(offset_of("ab\ncd", 2, 2), Some(4));
        assert_eq!(offset_of("ab", 0, 1), None);
    }
}
