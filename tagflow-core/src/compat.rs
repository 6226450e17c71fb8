#![forbid(unsafe_code)]

//! Decides whether a value may flow into a slot, leaf by leaf.

use std::cmp::Ordering;

use tagflow_model::{
    format_float, DimensionUnit, Expr, IntDefMember, LiteralValue, NumericType, ResourceType,
    Slot, Span, TagKind, TagSet,
};
use tracing::debug;

use crate::resolve::{Provenance, Resolver};
use crate::site::{CompareOp, FlowKind};
use crate::unit::CheckOptions;
use crate::violation::{SizeNoun, Violation};

/// A refused leaf, before it is turned into a finding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    pub span: Span,
    pub violation: Violation,
}

impl Rejection {
    fn at(leaf: &Expr, violation: Violation) -> Self {
        Self {
            span: leaf.span,
            violation,
        }
    }
}

/// Checks every contributing leaf of `expr` against `slot`.
///
/// Branches of a conditional are checked on their own and located at the
/// branch, so one bad branch yields exactly one rejection.
pub fn check_slot(
    resolver: &mut Resolver<'_>,
    expr: &Expr,
    slot: &Slot,
    flow: FlowKind,
    options: &CheckOptions,
) -> Vec<Rejection> {
    let mut out = Vec::new();
    for leaf in resolver.leaves(expr) {
        let provenance = resolver.resolve(leaf);
        for violation in check_leaf(leaf, &provenance, &slot.required, flow, options) {
            debug!(slot = %slot.id, class = violation.class(), "leaf rejected");
            out.push(Rejection::at(leaf, violation));
        }
        if let Some(to) = slot.value_type {
            if !slot.required.contains(&TagKind::HalfFloat) {
                if let Some(violation) = widened(&provenance, to) {
                    out.push(Rejection::at(leaf, violation));
                }
            }
        }
    }
    out
}

/// Resource ids are not ordinally meaningful; `==`/`!=` are always fine.
pub fn check_comparison(
    resolver: &mut Resolver<'_>,
    op: CompareOp,
    lhs: &Expr,
    rhs: &Expr,
    span: Span,
) -> Option<Rejection> {
    if !op.is_ordinal() {
        return None;
    }
    for operand in [lhs, rhs] {
        for leaf in resolver.leaves(operand) {
            let tags = resolver.resolve_tags(leaf);
            let annotation = tags.iter().find_map(|t| match t {
                TagKind::ResourceType(ty) => Some(ty.annotation().to_string()),
                TagKind::AnyRes => Some("AnyRes".to_string()),
                _ => None,
            });
            if let Some(annotation) = annotation {
                debug!(op = op.symbol(), %annotation, "ordinal comparison of resource ids");
                return Some(Rejection {
                    span,
                    violation: Violation::OrdinalComparison { annotation },
                });
            }
        }
    }
    None
}

/// Half floats used as operands of an operation wider than a short.
pub fn check_arithmetic(
    resolver: &mut Resolver<'_>,
    operands: &[Expr],
    result: NumericType,
) -> Vec<Rejection> {
    let mut out = Vec::new();
    for operand in operands {
        for leaf in resolver.leaves(operand) {
            let provenance = resolver.resolve(leaf);
            if let Some(violation) = widened(&provenance, result) {
                out.push(Rejection::at(leaf, violation));
            }
        }
    }
    out
}

fn widened(provenance: &Provenance, to: NumericType) -> Option<Violation> {
    (provenance.tags.contains(&TagKind::HalfFloat) && to.widens_half_float())
        .then_some(Violation::HalfFloatWidened { to })
}

/// Every independent contract family of `required` is consulted in turn.
pub fn check_leaf(
    leaf: &Expr,
    provenance: &Provenance,
    required: &TagSet,
    flow: FlowKind,
    options: &CheckOptions,
) -> Vec<Violation> {
    if provenance.is_unknown() || required.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    if required.has_resource_id() {
        out.extend(check_resource(provenance, required, flow, options));
    }
    if required.contains(&TagKind::ColorInt) && provenance.tags.has_resource_id() {
        out.push(Violation::ResourceIdAsColor {
            expression: leaf.source_text().to_string(),
        });
    }
    if let Some(unit) = required.dimension_unit() {
        out.extend(check_dimension(leaf, provenance, unit));
    }
    if required.contains(&TagKind::HalfFloat) {
        out.extend(check_half_float(provenance));
    }
    match (required.int_def(), required.range()) {
        (Some(def), range) => out.extend(check_int_def(provenance, def, range)),
        (None, Some(range)) => out.extend(check_range(leaf, provenance, range, options)),
        (None, None) => {}
    }
    if let Some(size) = required.size() {
        out.extend(check_size(provenance, size));
    }
    out
}

fn check_resource(
    provenance: &Provenance,
    required: &TagSet,
    flow: FlowKind,
    options: &CheckOptions,
) -> Option<Violation> {
    if provenance.sentinel {
        return None;
    }
    let expected: Vec<ResourceType> = required.resource_types().collect();
    if flow == FlowKind::Assignment
        && !required.has_any_res()
        && expected == [ResourceType::Styleable]
    {
        return None;
    }

    let tags = &provenance.tags;
    let actual: Vec<ResourceType> = tags.resource_types().collect();
    let color_int = tags.contains(&TagKind::ColorInt);
    let dimension = tags.dimension_unit();

    let raw_literal = matches!(provenance.constant, Some(LiteralValue::Int(_)));
    if actual.is_empty() && !tags.has_any_res() && !color_int && dimension.is_none() && !raw_literal
    {
        return None;
    }

    if tags.has_any_res() || (required.has_any_res() && !actual.is_empty()) {
        return None;
    }
    if actual.iter().any(|t| expected.contains(t)) {
        return None;
    }
    if options.color_promotion
        && expected.contains(&ResourceType::Drawable)
        && actual
            .iter()
            .any(|t| matches!(t, ResourceType::Color | ResourceType::Mipmap))
    {
        return None;
    }

    let violation = if expected.is_empty() {
        Violation::ResourceExpected
    } else if actual.is_empty() && color_int && expected.contains(&ResourceType::Color) {
        Violation::ColorAsResourceId
    } else if let Some(unit) =
        dimension.filter(|_| actual.is_empty() && expected.contains(&ResourceType::Dimen))
    {
        Violation::DimensionAsResourceId { actual: unit }
    } else {
        Violation::ResourceTypeMismatch { expected, actual }
    };
    Some(violation)
}

fn check_dimension(leaf: &Expr, provenance: &Provenance, expected: DimensionUnit) -> Option<Violation> {
    let tags = &provenance.tags;
    if tags.has_resource_type(ResourceType::Dimen) {
        return Some(Violation::ResourceIdAsDimension {
            expected,
            expression: leaf.source_text().to_string(),
        });
    }
    let actual = tags.dimension_unit()?;
    (!expected.compatible_with(actual))
        .then_some(Violation::DimensionUnitMismatch { expected, actual })
}

fn check_half_float(provenance: &Provenance) -> Option<Violation> {
    let tags = &provenance.tags;
    let actual = match tags.dimension_unit() {
        Some(DimensionUnit::Px | DimensionUnit::Unknown) => "dimension",
        Some(DimensionUnit::Sp) => "sp dimension",
        Some(DimensionUnit::Dp) => "dp dimension",
        None if tags.contains(&TagKind::ColorInt) => "color",
        None if tags.has_resource_id() => "resource id",
        None => return None,
    };
    Some(Violation::HalfFloatExpected { actual })
}

fn check_range(
    leaf: &Expr,
    provenance: &Provenance,
    range: &TagKind,
    options: &CheckOptions,
) -> Option<Violation> {
    let bounds = Bounds::of(range)?;
    match &provenance.constant {
        Some(LiteralValue::Array(items)) => {
            let escapes = items
                .iter()
                .filter_map(Point::of)
                .any(|x| !bounds.contains(&x));
            escapes.then(|| Violation::OutOfRange {
                requirement: bounds.describe(),
                actual: None,
            })
        }
        Some(constant) => out_of_range(&bounds, constant),
        None if options.range_subsumption => {
            let actual = Bounds::of(provenance.tags.range()?)?;
            let escape = bounds.escape(&actual)?;
            let origin = provenance
                .origin
                .clone()
                .unwrap_or_else(|| leaf.source_text().to_string());
            Some(Violation::RangeNotContained {
                requirement: bounds.describe(),
                origin,
                escape,
            })
        }
        None => None,
    }
}

fn out_of_range(bounds: &Bounds, constant: &LiteralValue) -> Option<Violation> {
    let x = Point::of(constant)?;
    let requirement = bounds.violated(&x)?;
    Some(Violation::OutOfRange {
        requirement,
        actual: Some(constant.display()),
    })
}

fn check_size(provenance: &Provenance, size: &TagKind) -> Option<Violation> {
    let TagKind::Size {
        exact,
        min,
        max,
        multiple,
    } = size
    else {
        return None;
    };
    let (noun, actual) = match provenance.constant.as_ref()? {
        LiteralValue::Str(s) => (SizeNoun::Length, s.chars().count() as i64),
        LiteralValue::Array(items) => (SizeNoun::Size, items.len() as i64),
        LiteralValue::Int(n) => (SizeNoun::Size, *n),
        LiteralValue::Float(_) => return None,
    };
    let mismatch = |requirement: String| {
        Some(Violation::SizeMismatch {
            noun,
            requirement,
            actual,
        })
    };

    if let Some(exact) = *exact {
        if actual != exact {
            return mismatch(exact.to_string());
        }
    }
    if let Some(min) = *min {
        if actual < min {
            return mismatch(format!("≥ {min}"));
        }
    }
    if let Some(max) = *max {
        if actual > max {
            return mismatch(format!("≤ {max}"));
        }
    }
    match *multiple {
        Some(multiple) if multiple > 0 && actual % multiple != 0 => {
            Some(Violation::SizeNotMultiple {
                noun,
                multiple,
                actual,
            })
        }
        _ => None,
    }
}

fn check_int_def(provenance: &Provenance, def: &TagKind, range: Option<&TagKind>) -> Option<Violation> {
    let TagKind::IntDef {
        name,
        members,
        flag,
        open,
    } = def
    else {
        return None;
    };
    if *open {
        return None;
    }
    let all: Vec<&IntDefMember> = members.iter().collect();

    if let Some(constant) = &provenance.constant {
        if accepts_constant(constant, members, *flag)? {
            return None;
        }
        let range = match range.and_then(Bounds::of) {
            Some(bounds) => match out_of_range(&bounds, constant) {
                Some(v) => Some(v.message()),
                None if Point::of(constant).is_some() => return None,
                None => None,
            },
            None => None,
        };
        return Some(Violation::NotMember {
            members: member_names(&all),
            flag: *flag,
            range,
            could_be: Vec::new(),
        });
    }

    let TagKind::IntDef {
        name: actual_name,
        members: actual_members,
        ..
    } = provenance.tags.int_def()?
    else {
        return None;
    };
    if actual_name == name {
        return None;
    }
    let unmatched: Vec<&IntDefMember> = actual_members
        .iter()
        .filter(|m| !members.iter().any(|r| r.value == m.value))
        .collect();
    if unmatched.is_empty() {
        return None;
    }
    Some(Violation::NotMember {
        members: member_names(&all),
        flag: *flag,
        range: None,
        could_be: member_names(&unmatched),
    })
}

fn member_names(list: &[&IntDefMember]) -> Vec<String> {
    list.iter().map(|m| m.name.clone()).collect()
}

/// `None` for constants membership says nothing about (floats, arrays).
fn accepts_constant(constant: &LiteralValue, members: &[IntDefMember], flag: bool) -> Option<bool> {
    match constant {
        LiteralValue::Int(v) => {
            if members.iter().any(|m| m.value.as_int() == Some(*v)) {
                return Some(true);
            }
            if !flag {
                return Some(false);
            }
            if *v == 0 || *v == -1 {
                return Some(true);
            }
            let mask = members
                .iter()
                .filter_map(|m| m.value.as_int())
                .fold(0i64, |acc, bits| acc | bits);
            Some(v & !mask == 0)
        }
        LiteralValue::Str(_) => Some(members.iter().any(|m| &m.value == constant)),
        LiteralValue::Float(_) | LiteralValue::Array(_) => None,
    }
}

#[derive(Clone, Debug)]
struct Bound {
    value: f64,
    /// Exact value of an integer bound; `value` is only its approximation.
    exact: Option<i64>,
    text: String,
    inclusive: bool,
}

impl Bound {
    fn int(v: i64, inclusive: bool) -> Self {
        Self {
            value: v as f64,
            exact: Some(v),
            text: v.to_string(),
            inclusive,
        }
    }

    fn float(v: f64, inclusive: bool) -> Self {
        Self {
            value: v,
            exact: None,
            text: format_float(v),
            inclusive,
        }
    }

    /// How `x` orders against this bound. Integers against integer bounds compare exactly.
    fn order(&self, x: &Point) -> Option<Ordering> {
        match (x, self.exact) {
            (Point::Int(n), Some(b)) => Some(n.cmp(&b)),
            (Point::Int(n), None) => (*n as f64).partial_cmp(&self.value),
            (Point::Float(f), _) => f.partial_cmp(&self.value),
        }
    }

    fn inclusive_lower(&self) -> i64 {
        let v = self.exact.unwrap_or(self.value as i64);
        if self.inclusive { v } else { v.saturating_add(1) }
    }

    fn inclusive_upper(&self) -> i64 {
        let v = self.exact.unwrap_or(self.value as i64);
        if self.inclusive { v } else { v.saturating_sub(1) }
    }
}

/// A numeric constant being range-checked.
#[derive(Clone, Copy, Debug)]
enum Point {
    Int(i64),
    Float(f64),
}

impl Point {
    fn of(constant: &LiteralValue) -> Option<Self> {
        match constant {
            LiteralValue::Int(n) => Some(Point::Int(*n)),
            LiteralValue::Float(f) => Some(Point::Float(*f)),
            _ => None,
        }
    }
}

/// A range normalized across its integer and floating forms; `None` ends are unbounded.
#[derive(Clone, Debug)]
struct Bounds {
    lower: Option<Bound>,
    upper: Option<Bound>,
    integral: bool,
}

impl Bounds {
    fn of(tag: &TagKind) -> Option<Self> {
        match *tag {
            TagKind::IntRange {
                from,
                to,
                from_inclusive,
                to_inclusive,
            } => Some(Self {
                lower: (from != i64::MIN).then(|| Bound::int(from, from_inclusive)),
                upper: (to != i64::MAX).then(|| Bound::int(to, to_inclusive)),
                integral: true,
            }),
            TagKind::FloatRange {
                from,
                to,
                from_inclusive,
                to_inclusive,
            } => Some(Self {
                lower: from.is_finite().then(|| Bound::float(from, from_inclusive)),
                upper: to.is_finite().then(|| Bound::float(to, to_inclusive)),
                integral: false,
            }),
            _ => None,
        }
    }

    fn above_lower(&self, x: &Point) -> bool {
        self.lower.as_ref().is_none_or(|b| match b.order(x) {
            Some(Ordering::Greater) => true,
            Some(Ordering::Equal) => b.inclusive,
            _ => false,
        })
    }

    fn below_upper(&self, x: &Point) -> bool {
        self.upper.as_ref().is_none_or(|b| match b.order(x) {
            Some(Ordering::Less) => true,
            Some(Ordering::Equal) => b.inclusive,
            _ => false,
        })
    }

    fn contains(&self, x: &Point) -> bool {
        self.above_lower(x) && self.below_upper(x)
    }

    fn describe_lower(b: &Bound) -> String {
        format!("{} {}", if b.inclusive { "≥" } else { ">" }, b.text)
    }

    fn describe_upper(b: &Bound) -> String {
        format!("{} {}", if b.inclusive { "≤" } else { "<" }, b.text)
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self
            .lower
            .iter()
            .map(Self::describe_lower)
            .chain(self.upper.iter().map(Self::describe_upper))
            .collect();
        parts.join(" and ")
    }

    /// The single bound `x` falls outside of.
    fn violated(&self, x: &Point) -> Option<String> {
        if !self.above_lower(x) {
            return self.lower.as_ref().map(Self::describe_lower);
        }
        if !self.below_upper(x) {
            return self.upper.as_ref().map(Self::describe_upper);
        }
        None
    }

    /// How a value of range `actual` can leave `self`, if it can.
    fn escape(&self, actual: &Bounds) -> Option<String> {
        let integral = self.integral && actual.integral;
        if let Some(req) = &self.lower {
            match &actual.lower {
                None => return Some(format!("< {}", req.text)),
                Some(a) if lower_escapes(a, req, integral) => {
                    return Some(if a.inclusive || integral {
                        lowest_text(a, integral)
                    } else {
                        format!("> {}", a.text)
                    });
                }
                Some(_) => {}
            }
        }
        if let Some(req) = &self.upper {
            match &actual.upper {
                None => return Some(format!("> {}", req.text)),
                Some(a) if upper_escapes(a, req, integral) => {
                    return Some(if a.inclusive || integral {
                        highest_text(a, integral)
                    } else {
                        format!("< {}", a.text)
                    });
                }
                Some(_) => {}
            }
        }
        None
    }
}

fn lower_escapes(actual: &Bound, required: &Bound, integral: bool) -> bool {
    if integral {
        return actual.inclusive_lower() < required.inclusive_lower();
    }
    actual.value < required.value
        || (actual.value == required.value && actual.inclusive && !required.inclusive)
}

fn upper_escapes(actual: &Bound, required: &Bound, integral: bool) -> bool {
    if integral {
        return actual.inclusive_upper() > required.inclusive_upper();
    }
    actual.value > required.value
        || (actual.value == required.value && actual.inclusive && !required.inclusive)
}

fn lowest_text(b: &Bound, integral: bool) -> String {
    if integral && !b.inclusive {
        b.inclusive_lower().to_string()
    } else {
        b.text.clone()
    }
}

fn highest_text(b: &Bound, integral: bool) -> String {
    if integral && !b.inclusive {
        b.inclusive_upper().to_string()
    } else {
        b.text.clone()
    }
}
