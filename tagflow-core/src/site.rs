#![forbid(unsafe_code)]

use tagflow_model::{Expr, NumericType, Slot, SlotId, Span};

/// How a value reaches the slot it is checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowKind {
    Argument,
    Assignment,
    Return,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn is_ordinal(&self) -> bool {
        matches!(self, CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
}

/// One place where a value meets a contract.
#[derive(Clone, Debug, PartialEq)]
pub enum UseSite {
    /// Each argument is checked against the callee's parameter slot.
    Call(Expr),
    Flow {
        expr: Expr,
        target: SlotId,
        kind: FlowKind,
    },
    Compare {
        op: CompareOp,
        lhs: Expr,
        rhs: Expr,
        span: Span,
    },
    Arithmetic {
        op: ArithOp,
        operands: Vec<Expr>,
        result: NumericType,
        span: Span,
    },
}

/// Everything the checker needs for one unit, supplied before checking starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisUnit {
    pub name: String,
    pub path: Option<String>,
    /// Source text the spans point into, when the frontend ships it.
    pub source: Option<String>,
    pub slots: Vec<Slot>,
    pub sites: Vec<UseSite>,
}

impl AnalysisUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn with_site(mut self, site: UseSite) -> Self {
        self.sites.push(site);
        self
    }
}
