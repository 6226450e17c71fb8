#![forbid(unsafe_code)]

//! Contract checking over a unit's bound expression graph: provenance
//! resolution, slot compatibility and findings.

pub mod compat;
mod finding;
mod issue;
pub mod resolve;
mod site;
mod unit;
mod violation;

pub use compat::Rejection;
pub use finding::Finding;
pub use issue::Issue;
pub use resolve::{Provenance, Resolver, DEFAULT_MAX_CHAIN_DEPTH};
pub use site::{AnalysisUnit, ArithOp, CompareOp, FlowKind, UseSite};
pub use unit::{check_unit, CheckOptions, UnitChecker, UnitReport};
pub use violation::{SizeNoun, Violation};
