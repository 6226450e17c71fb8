#![forbid(unsafe_code)]

use std::fmt;

use serde::Deserialize;

use crate::tag::TagSet;
use crate::Span;

/// Identifier of an owning declaration (method, field, property), as the frontend names it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct DeclId(pub String);

impl DeclId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(tag = "kind", content = "index")]
pub enum SlotKind {
    Parameter(usize),
    Return,
    Field,
    PropertyGetter,
    PropertySetter,
}

/// A declaration site: the owner plus which part of it carries the contract.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId {
    pub owner: DeclId,
    pub kind: SlotKind,
}

impl SlotId {
    pub fn new(owner: impl Into<String>, kind: SlotKind) -> Self {
        Self {
            owner: DeclId::new(owner),
            kind,
        }
    }

    pub fn parameter(owner: impl Into<String>, index: usize) -> Self {
        Self::new(owner, SlotKind::Parameter(index))
    }

    pub fn returns(owner: impl Into<String>) -> Self {
        Self::new(owner, SlotKind::Return)
    }

    pub fn field(owner: impl Into<String>) -> Self {
        Self::new(owner, SlotKind::Field)
    }

    pub fn display(&self) -> String {
        match self.kind {
            SlotKind::Parameter(i) => format!("parameter #{i} of {}", self.owner),
            SlotKind::Return => format!("return value of {}", self.owner),
            SlotKind::Field => format!("field {}", self.owner),
            SlotKind::PropertyGetter => format!("getter of {}", self.owner),
            SlotKind::PropertySetter => format!("setter of {}", self.owner),
        }
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// Plain numeric type of a declaration or operator result.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericType {
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl NumericType {
    pub fn display(&self) -> &'static str {
        match self {
            NumericType::Byte => "byte",
            NumericType::Short => "short",
            NumericType::Char => "char",
            NumericType::Int => "int",
            NumericType::Long => "long",
            NumericType::Float => "float",
            NumericType::Double => "double",
        }
    }

    /// Half floats live in 16 bits; anything past that widens them.
    pub fn widens_half_float(&self) -> bool {
        matches!(
            self,
            NumericType::Int | NumericType::Long | NumericType::Float | NumericType::Double
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub id: SlotId,
    pub required: TagSet,
    pub value_type: Option<NumericType>,
    /// Where the contract is declared.
    pub span: Option<Span>,
    /// The contract was inherited from an overridden declaration.
    pub inherited: bool,
}

impl Slot {
    pub fn new(id: SlotId, required: TagSet) -> Self {
        Self {
            id,
            required,
            value_type: None,
            span: None,
            inherited: false,
        }
    }

    pub fn with_value_type(mut self, ty: NumericType) -> Self {
        self.value_type = Some(ty);
        self
    }

    pub fn declared_at(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_display_names_owner_and_position() {
        assert_eq!(
            SlotId::parameter("setLabels", 0).display(),
            "parameter #0 of setLabels"
        );
        assert_eq!(SlotId::returns("getIcon").to_string(), "return value of getIcon");
    }

    #[test]
    fn only_wide_types_widen() {
        assert!(NumericType::Int.widens_half_float());
        assert!(NumericType::Double.widens_half_float());
        assert!(!NumericType::Short.widens_half_float());
        assert!(!NumericType::Byte.widens_half_float());
    }
}
