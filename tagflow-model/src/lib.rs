#![forbid(unsafe_code)]

//! Tag vocabulary, annotated declaration sites and the bound expression graph
//! the checker consumes.

use miette::SourceSpan;

mod error;
mod expr;
mod registry;
mod slot;
mod tag;

pub use error::SlotError;
pub use expr::{ArgBinding, Expr, ExprBuilder, ExprId, ExprKind};
pub use registry::SlotRegistry;
pub use slot::{DeclId, NumericType, Slot, SlotId, SlotKind};
pub use tag::{
    format_float, DimensionUnit, IntDefMember, LiteralValue, ResourceType, TagDomain, TagKind,
    TagSet,
};

pub type Span = SourceSpan;

pub fn span(start: usize, len: usize) -> Span {
    SourceSpan::new(start.into(), len)
}
