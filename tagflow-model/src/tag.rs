#![forbid(unsafe_code)]

use serde::Deserialize;

/// Categories of resource identifiers a slot can demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Animator,
    Anim,
    Array,
    Attr,
    Bool,
    Color,
    Dimen,
    Drawable,
    Font,
    Fraction,
    Id,
    Integer,
    Interpolator,
    Layout,
    Menu,
    Mipmap,
    Navigation,
    Plurals,
    Raw,
    String,
    Style,
    Styleable,
    Transition,
    Xml,
}

impl ResourceType {
    pub const ALL: [ResourceType; 24] = [
        ResourceType::Animator,
        ResourceType::Anim,
        ResourceType::Array,
        ResourceType::Attr,
        ResourceType::Bool,
        ResourceType::Color,
        ResourceType::Dimen,
        ResourceType::Drawable,
        ResourceType::Font,
        ResourceType::Fraction,
        ResourceType::Id,
        ResourceType::Integer,
        ResourceType::Interpolator,
        ResourceType::Layout,
        ResourceType::Menu,
        ResourceType::Mipmap,
        ResourceType::Navigation,
        ResourceType::Plurals,
        ResourceType::Raw,
        ResourceType::String,
        ResourceType::Style,
        ResourceType::Styleable,
        ResourceType::Transition,
        ResourceType::Xml,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::Animator => "animator",
            ResourceType::Anim => "anim",
            ResourceType::Array => "array",
            ResourceType::Attr => "attr",
            ResourceType::Bool => "bool",
            ResourceType::Color => "color",
            ResourceType::Dimen => "dimen",
            ResourceType::Drawable => "drawable",
            ResourceType::Font => "font",
            ResourceType::Fraction => "fraction",
            ResourceType::Id => "id",
            ResourceType::Integer => "integer",
            ResourceType::Interpolator => "interpolator",
            ResourceType::Layout => "layout",
            ResourceType::Menu => "menu",
            ResourceType::Mipmap => "mipmap",
            ResourceType::Navigation => "navigation",
            ResourceType::Plurals => "plurals",
            ResourceType::Raw => "raw",
            ResourceType::String => "string",
            ResourceType::Style => "style",
            ResourceType::Styleable => "styleable",
            ResourceType::Transition => "transition",
            ResourceType::Xml => "xml",
        }
    }

    /// Name of the declaration annotation carrying this category, e.g. `DrawableRes`.
    pub fn annotation(&self) -> &'static str {
        match self {
            ResourceType::Animator => "AnimatorRes",
            ResourceType::Anim => "AnimRes",
            ResourceType::Array => "ArrayRes",
            ResourceType::Attr => "AttrRes",
            ResourceType::Bool => "BoolRes",
            ResourceType::Color => "ColorRes",
            ResourceType::Dimen => "DimenRes",
            ResourceType::Drawable => "DrawableRes",
            ResourceType::Font => "FontRes",
            ResourceType::Fraction => "FractionRes",
            ResourceType::Id => "IdRes",
            ResourceType::Integer => "IntegerRes",
            ResourceType::Interpolator => "InterpolatorRes",
            ResourceType::Layout => "LayoutRes",
            ResourceType::Menu => "MenuRes",
            ResourceType::Mipmap => "MipmapRes",
            ResourceType::Navigation => "NavigationRes",
            ResourceType::Plurals => "PluralsRes",
            ResourceType::Raw => "RawRes",
            ResourceType::String => "StringRes",
            ResourceType::Style => "StyleRes",
            ResourceType::Styleable => "StyleableRes",
            ResourceType::Transition => "TransitionRes",
            ResourceType::Xml => "XmlRes",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DimensionUnit {
    Px,
    Dp,
    Sp,
    Unknown,
}

impl DimensionUnit {
    pub fn display(&self) -> &'static str {
        match self {
            DimensionUnit::Px => "px",
            DimensionUnit::Dp => "dp",
            DimensionUnit::Sp => "sp",
            DimensionUnit::Unknown => "unknown",
        }
    }

    /// How a value carrying this unit reads in mismatch messages.
    pub fn description(&self) -> &'static str {
        match self {
            DimensionUnit::Px => "a pixel integer",
            DimensionUnit::Dp => "density-independent (dp) integer",
            DimensionUnit::Sp => "a scale-independent (sp) integer",
            DimensionUnit::Unknown => "a dimension integer",
        }
    }

    /// `Unknown` is compatible with every unit.
    pub fn compatible_with(&self, other: DimensionUnit) -> bool {
        *self == DimensionUnit::Unknown || other == DimensionUnit::Unknown || *self == other
    }
}

/// One named constant of a closed enumeration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct IntDefMember {
    pub name: String,
    pub value: LiteralValue,
}

/// A constant value pre-evaluated by the frontend.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<LiteralValue>),
}

impl LiteralValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            LiteralValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// `0` and `-1` conventionally mean "no resource".
    pub fn is_sentinel(&self) -> bool {
        matches!(self, LiteralValue::Int(0) | LiteralValue::Int(-1))
    }

    pub fn display(&self) -> String {
        match self {
            LiteralValue::Int(n) => n.to_string(),
            LiteralValue::Float(f) => format_float(*f),
            LiteralValue::Str(s) => format!("\"{s}\""),
            LiteralValue::Array(items) => {
                let items_s = items
                    .iter()
                    .map(|v| v.display())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{items_s}}}")
            }
        }
    }
}

/// Floats always keep a fractional part so `5.0` never reads as `5`.
pub fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

fn unbounded_min() -> i64 {
    i64::MIN
}

fn unbounded_max() -> i64 {
    i64::MAX
}

fn neg_infinity() -> f64 {
    f64::NEG_INFINITY
}

fn infinity() -> f64 {
    f64::INFINITY
}

fn inclusive() -> bool {
    true
}

/// The closed vocabulary of declaration contracts.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum TagKind {
    ResourceType(ResourceType),
    AnyRes,
    ColorInt,
    Dimension(DimensionUnit),
    IntRange {
        #[serde(default = "unbounded_min")]
        from: i64,
        #[serde(default = "unbounded_max")]
        to: i64,
        #[serde(default = "inclusive")]
        from_inclusive: bool,
        #[serde(default = "inclusive")]
        to_inclusive: bool,
    },
    FloatRange {
        #[serde(default = "neg_infinity")]
        from: f64,
        #[serde(default = "infinity")]
        to: f64,
        #[serde(default = "inclusive")]
        from_inclusive: bool,
        #[serde(default = "inclusive")]
        to_inclusive: bool,
    },
    Size {
        #[serde(default)]
        exact: Option<i64>,
        #[serde(default)]
        min: Option<i64>,
        #[serde(default)]
        max: Option<i64>,
        #[serde(default)]
        multiple: Option<i64>,
    },
    IntDef {
        name: String,
        members: Vec<IntDefMember>,
        #[serde(default)]
        flag: bool,
        #[serde(default)]
        open: bool,
    },
    HalfFloat,
}

/// Which half of the registration precondition a tag falls in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagDomain {
    Resource,
    Numeric,
    Neutral,
}

impl TagKind {
    /// `Px` is spelled as a pixel dimension.
    #[allow(non_upper_case_globals)]
    pub const Px: TagKind = TagKind::Dimension(DimensionUnit::Px);

    pub fn int_range(from: i64, to: i64) -> Self {
        TagKind::IntRange {
            from,
            to,
            from_inclusive: true,
            to_inclusive: true,
        }
    }

    pub fn float_range(from: f64, to: f64) -> Self {
        TagKind::FloatRange {
            from,
            to,
            from_inclusive: true,
            to_inclusive: true,
        }
    }

    pub fn domain(&self) -> TagDomain {
        match self {
            TagKind::ResourceType(_) | TagKind::AnyRes => TagDomain::Resource,
            TagKind::ColorInt
            | TagKind::Dimension(_)
            | TagKind::IntRange { .. }
            | TagKind::FloatRange { .. }
            | TagKind::Size { .. }
            | TagKind::HalfFloat => TagDomain::Numeric,
            TagKind::IntDef { .. } => TagDomain::Neutral,
        }
    }

    pub fn is_resource_id(&self) -> bool {
        self.domain() == TagDomain::Resource
    }

    pub fn display(&self) -> String {
        match self {
            TagKind::ResourceType(t) => format!("@{}", t.annotation()),
            TagKind::AnyRes => "@AnyRes".to_string(),
            TagKind::ColorInt => "@ColorInt".to_string(),
            TagKind::Dimension(DimensionUnit::Px) => "@Px".to_string(),
            TagKind::Dimension(unit) => format!("@Dimension(unit={})", unit.display().to_uppercase()),
            TagKind::IntRange { from, to, .. } => format!("@IntRange(from={from}, to={to})"),
            TagKind::FloatRange { from, to, .. } => {
                format!("@FloatRange(from={}, to={})", format_float(*from), format_float(*to))
            }
            TagKind::Size { .. } => "@Size".to_string(),
            TagKind::IntDef { name, .. } => format!("@{name}"),
            TagKind::HalfFloat => "@HalfFloat".to_string(),
        }
    }
}

/// An insertion-ordered set of tags.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagSet {
    tags: Vec<TagKind>,
}

impl TagSet {
    pub fn new() -> Self {
        Self { tags: Vec::new() }
    }

    pub fn insert(&mut self, tag: TagKind) -> bool {
        if self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn contains(&self, tag: &TagKind) -> bool {
        self.tags.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TagKind> {
        self.tags.iter()
    }

    pub fn resource_types(&self) -> impl Iterator<Item = ResourceType> + '_ {
        self.tags.iter().filter_map(|t| match t {
            TagKind::ResourceType(r) => Some(*r),
            _ => None,
        })
    }

    pub fn has_resource_type(&self, ty: ResourceType) -> bool {
        self.contains(&TagKind::ResourceType(ty))
    }

    pub fn has_any_res(&self) -> bool {
        self.contains(&TagKind::AnyRes)
    }

    pub fn has_resource_id(&self) -> bool {
        self.tags.iter().any(TagKind::is_resource_id)
    }

    pub fn dimension_unit(&self) -> Option<DimensionUnit> {
        self.tags.iter().find_map(|t| match t {
            TagKind::Dimension(u) => Some(*u),
            _ => None,
        })
    }

    pub fn int_def(&self) -> Option<&TagKind> {
        self.tags.iter().find(|t| matches!(t, TagKind::IntDef { .. }))
    }

    pub fn range(&self) -> Option<&TagKind> {
        self.tags
            .iter()
            .find(|t| matches!(t, TagKind::IntRange { .. } | TagKind::FloatRange { .. }))
    }

    pub fn size(&self) -> Option<&TagKind> {
        self.tags.iter().find(|t| matches!(t, TagKind::Size { .. }))
    }
}

impl FromIterator<TagKind> for TagSet {
    fn from_iter<I: IntoIterator<Item = TagKind>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = &'a TagKind;
    type IntoIter = std::slice::Iter<'a, TagKind>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}
