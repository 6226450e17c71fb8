#![forbid(unsafe_code)]

use crate::slot::{DeclId, SlotId};
use crate::tag::LiteralValue;
use crate::Span;

/// Frontend-assigned expression identity; the memoization key within one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

/// A node of the already-bound expression graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub id: ExprId,
    pub span: Span,
    /// Source rendering, quoted by messages that suggest a rewrite.
    pub text: Option<String>,
    pub kind: ExprKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArgBinding {
    pub index: usize,
    pub expr: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(LiteralValue),
    SlotRef(SlotId),
    Call {
        callee: DeclId,
        args: Vec<ArgBinding>,
        return_slot: Option<SlotId>,
    },
    Conditional(Vec<Expr>),
    /// A local or field, pointing at its unique reaching definition.
    ChainedRef(Box<Expr>),
}

impl Expr {
    pub fn new(id: ExprId, span: Span, kind: ExprKind) -> Self {
        Self {
            id,
            span,
            text: None,
            kind,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn source_text(&self) -> &str {
        self.text.as_deref().unwrap_or("...")
    }

    pub fn literal(&self) -> Option<&LiteralValue> {
        match &self.kind {
            ExprKind::Literal(v) => Some(v),
            _ => None,
        }
    }
}

/// Hands out fresh `ExprId`s for programmatically built graphs.
#[derive(Debug, Default)]
pub struct ExprBuilder {
    next: u32,
    cursor: usize,
}

impl ExprBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh(&mut self, kind: ExprKind, len: usize) -> Expr {
        let id = ExprId(self.next);
        self.next += 1;
        let span = crate::span(self.cursor, len);
        self.cursor += len + 1;
        Expr::new(id, span, kind)
    }

    pub fn int(&mut self, value: i64) -> Expr {
        let text = value.to_string();
        self.fresh(ExprKind::Literal(LiteralValue::Int(value)), text.len())
            .with_text(text)
    }

    pub fn float(&mut self, value: f64) -> Expr {
        let text = crate::tag::format_float(value);
        self.fresh(ExprKind::Literal(LiteralValue::Float(value)), text.len())
            .with_text(text)
    }

    pub fn literal(&mut self, value: LiteralValue) -> Expr {
        let text = value.display();
        self.fresh(ExprKind::Literal(value), text.len()).with_text(text)
    }

    pub fn slot_ref(&mut self, slot: SlotId) -> Expr {
        let text = slot.owner.to_string();
        self.fresh(ExprKind::SlotRef(slot), text.len()).with_text(text)
    }

    pub fn call(
        &mut self,
        callee: impl Into<String>,
        args: Vec<Expr>,
        return_slot: Option<SlotId>,
    ) -> Expr {
        let callee = DeclId::new(callee);
        let text = format!("{callee}(..)");
        let args = args
            .into_iter()
            .enumerate()
            .map(|(index, expr)| ArgBinding { index, expr })
            .collect();
        self.fresh(
            ExprKind::Call {
                callee,
                args,
                return_slot,
            },
            text.len(),
        )
        .with_text(text)
    }

    pub fn conditional(&mut self, branches: Vec<Expr>) -> Expr {
        self.fresh(ExprKind::Conditional(branches), 1)
    }

    pub fn chained(&mut self, name: impl Into<String>, definition: Expr) -> Expr {
        let text = name.into();
        self.fresh(ExprKind::ChainedRef(Box::new(definition)), text.len())
            .with_text(text)
    }
}
