#![forbid(unsafe_code)]

use tagflow_model::{DimensionUnit, NumericType, ResourceType};

use crate::issue::Issue;

/// Whether a size constraint measures a string's length or anything else's size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SizeNoun {
    Size,
    Length,
}

impl SizeNoun {
    pub fn display(&self) -> &'static str {
        match self {
            SizeNoun::Size => "size",
            SizeNoun::Length => "length",
        }
    }
}

/// A rejection's message class and its parameters.
///
/// The class is chosen from the required/actual pair; every class renders its
/// own wording through [`Violation::message`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Violation {
    /// The value carries resource categories, none of which the slot accepts.
    ResourceTypeMismatch {
        expected: Vec<ResourceType>,
        actual: Vec<ResourceType>,
    },
    /// An `@AnyRes` slot got something that is not a resource id at all.
    ResourceExpected,
    ResourceIdAsColor {
        expression: String,
    },
    ColorAsResourceId,
    DimensionAsResourceId {
        actual: DimensionUnit,
    },
    ResourceIdAsDimension {
        expected: DimensionUnit,
        expression: String,
    },
    DimensionUnitMismatch {
        expected: DimensionUnit,
        actual: DimensionUnit,
    },
    OrdinalComparison {
        annotation: String,
    },
    HalfFloatExpected {
        actual: &'static str,
    },
    HalfFloatWidened {
        to: NumericType,
    },
    /// `actual` is absent for array elements, whose position is not reported.
    OutOfRange {
        requirement: String,
        actual: Option<String>,
    },
    RangeNotContained {
        requirement: String,
        origin: String,
        escape: String,
    },
    SizeMismatch {
        noun: SizeNoun,
        requirement: String,
        actual: i64,
    },
    SizeNotMultiple {
        noun: SizeNoun,
        multiple: i64,
        actual: i64,
    },
    NotMember {
        members: Vec<String>,
        flag: bool,
        /// Rendered range violation when the slot also accepts a range.
        range: Option<String>,
        /// Members of the source's own group that the slot does not accept.
        could_be: Vec<String>,
    },
}

impl Violation {
    pub fn issue(&self) -> Issue {
        match self {
            Violation::ResourceIdAsColor { .. } => Issue::ResourceAsColor,
            Violation::HalfFloatExpected { .. } | Violation::HalfFloatWidened { .. } => {
                Issue::HalfFloat
            }
            Violation::OutOfRange { .. }
            | Violation::RangeNotContained { .. }
            | Violation::SizeMismatch { .. }
            | Violation::SizeNotMultiple { .. } => Issue::Range,
            Violation::NotMember { .. } => Issue::WrongConstant,
            Violation::ResourceTypeMismatch { .. }
            | Violation::ResourceExpected
            | Violation::ColorAsResourceId
            | Violation::DimensionAsResourceId { .. }
            | Violation::ResourceIdAsDimension { .. }
            | Violation::DimensionUnitMismatch { .. }
            | Violation::OrdinalComparison { .. } => Issue::ResourceType,
        }
    }

    /// Stable kebab-case name of the message class.
    pub fn class(&self) -> &'static str {
        match self {
            Violation::ResourceTypeMismatch { .. } => "resource-type-mismatch",
            Violation::ResourceExpected => "resource-expected",
            Violation::ResourceIdAsColor { .. } => "resource-id-as-color",
            Violation::ColorAsResourceId => "color-as-resource-id",
            Violation::DimensionAsResourceId { .. } => "dimension-as-resource-id",
            Violation::ResourceIdAsDimension { .. } => "resource-id-as-dimension",
            Violation::DimensionUnitMismatch { .. } => "dimension-unit-mismatch",
            Violation::OrdinalComparison { .. } => "ordinal-comparison",
            Violation::HalfFloatExpected { .. } => "half-float-expected",
            Violation::HalfFloatWidened { .. } => "half-float-widened",
            Violation::OutOfRange { .. } => "out-of-range",
            Violation::RangeNotContained { .. } => "range-not-contained",
            Violation::SizeMismatch { .. } => "size-mismatch",
            Violation::SizeNotMultiple { .. } => "size-not-multiple",
            Violation::NotMember { .. } => "not-member",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Violation::ResourceTypeMismatch { expected, .. } => {
                let names = expected.iter().map(|t| t.name()).collect::<Vec<_>>();
                format!("Expected resource of type {}", names.join(" or "))
            }
            Violation::ResourceExpected => {
                "Expected resource identifier (`R`.type.`name`)".to_string()
            }
            Violation::ResourceIdAsColor { expression } => format!(
                "Should pass resolved color instead of resource id here: \
                 `getResources().getColor({expression})`"
            ),
            Violation::ColorAsResourceId => {
                "Expected a color resource id (`R.color.`) but received an RGB integer".to_string()
            }
            Violation::DimensionAsResourceId { actual } => format!(
                "Expected a dimension resource id (`R.dimen.`) but received {}",
                actual.description()
            ),
            Violation::ResourceIdAsDimension {
                expected,
                expression,
            } => {
                let size = match expected {
                    DimensionUnit::Dp => "density-independent (dp) pixel size",
                    DimensionUnit::Sp => "scale-independent (sp) pixel size",
                    DimensionUnit::Px | DimensionUnit::Unknown => "pixel size",
                };
                format!(
                    "Should pass resolved {size} instead of resource id here: \
                     `getResources().getDimension*({expression})`"
                )
            }
            Violation::DimensionUnitMismatch { expected, actual } => format!(
                "Mismatched @Dimension units here; expected {} but received {}",
                expected.description(),
                actual.description()
            ),
            Violation::OrdinalComparison { annotation } => format!(
                "Comparing resource types (`@{annotation}`) other than equality is dangerous \
                 and usually wrong;  some resource types set top bit which turns the value \
                 negative"
            ),
            Violation::HalfFloatExpected { actual } => {
                format!("Expected a half float here, not a {actual}")
            }
            Violation::HalfFloatWidened { to } => {
                format!("Half-float type in expression widened to {}", to.display())
            }
            Violation::OutOfRange {
                requirement,
                actual,
            } => match actual {
                Some(was) => format!("Value must be {requirement} (was {was})"),
                None => format!("Value must be {requirement}"),
            },
            Violation::RangeNotContained {
                requirement,
                origin,
                escape,
            } => format!("Value must be {requirement} but {origin} can be {escape}"),
            Violation::SizeMismatch {
                noun,
                requirement,
                actual,
            } => format!("Expected {} {requirement} (was {actual})", noun.display()),
            Violation::SizeNotMultiple {
                noun,
                multiple,
                actual,
            } => {
                // Neighbours outside i64 are left out.
                let rem = actual
                    .checked_rem_euclid(*multiple)
                    .filter(|_| *multiple > 0);
                let lower = rem.and_then(|r| actual.checked_sub(r));
                let upper = rem.and_then(|r| actual.checked_add(multiple - r));
                let should_be = match (lower, upper) {
                    (Some(lower), Some(upper)) => format!(" and should be either {lower} or {upper}"),
                    (Some(n), None) | (None, Some(n)) => format!(" and should be {n}"),
                    (None, None) => String::new(),
                };
                format!(
                    "Expected {} to be a multiple of {multiple} (was {actual}{should_be})",
                    noun.display()
                )
            }
            Violation::NotMember {
                members,
                flag,
                range,
                could_be,
            } => {
                let mut msg = if *flag {
                    "Must be one or more of: ".to_string()
                } else {
                    "Must be one of: ".to_string()
                };
                msg.push_str(&members.join(", "));
                if let Some(range) = range {
                    msg.push_str(" or ");
                    msg.push_str(&lowercase_first(range));
                }
                if !could_be.is_empty() {
                    msg.push_str(", but could be ");
                    msg.push_str(&could_be.join(", "));
                }
                msg
            }
        }
    }
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
