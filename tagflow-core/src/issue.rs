#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

/// Rule a finding belongs to. Drivers key severity policy on these ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Issue {
    ResourceType,
    ResourceAsColor,
    HalfFloat,
    Range,
    WrongConstant,
}

impl Issue {
    pub const ALL: [Issue; 5] = [
        Issue::ResourceType,
        Issue::ResourceAsColor,
        Issue::HalfFloat,
        Issue::Range,
        Issue::WrongConstant,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Issue::ResourceType => "ResourceType",
            Issue::ResourceAsColor => "ResourceAsColor",
            Issue::HalfFloat => "HalfFloat",
            Issue::Range => "Range",
            Issue::WrongConstant => "WrongConstant",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Issue::ResourceType => "Wrong Resource Type",
            Issue::ResourceAsColor => "Should pass resolved color instead of resource id",
            Issue::HalfFloat => "Incorrect Half Float",
            Issue::Range => "Outside Range",
            Issue::WrongConstant => "Incorrect constant",
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            Issue::ResourceType => {
                "Resource identifiers are plain integers, so nothing stops a string id from \
                 reaching a parameter that expects a drawable id. Declarations annotated with \
                 a resource category only accept ids of that category. Identifiers must also \
                 never be compared ordinally: some categories set the top bit, which makes \
                 the value negative."
            }
            Issue::ResourceAsColor => {
                "Parameters that take a packed ARGB color cannot be fed a color resource id. \
                 Resolve the id to a color first (for example through \
                 `getResources().getColor(id)`)."
            }
            Issue::HalfFloat => {
                "Half-precision floats are stored in 16-bit integers. Passing a dimension, \
                 color or resource id where a half float is expected is a mistake, and so is \
                 using a half float in arithmetic wider than a short, which silently treats \
                 the bit pattern as an ordinary number."
            }
            Issue::Range => {
                "Some declarations only accept a bounded range of values, or arrays and \
                 strings of a particular size. Constants outside those bounds, and values \
                 whose own declared range escapes them, are flagged."
            }
            Issue::WrongConstant => {
                "Declarations typed with an enumerated constant group only accept members \
                 of that group (or bitwise combinations of them, for flag groups)."
            }
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Issue {
    type Err = String;

    /// Case-insensitive, so `resourcetype` and `ResourceType` both parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Issue::ALL
            .into_iter()
            .find(|i| i.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known = Issue::ALL.map(|i| i.id()).join(", ");
                format!("unknown issue `{s}` (known: {known})")
            })
    }
}
