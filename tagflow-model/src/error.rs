#![forbid(unsafe_code)]
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use crate::slot::SlotId;

/// Slot feed errors. These point at frontend bugs, never at the analyzed program.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum SlotError {
    #[error("slot error: {slot} mixes {resource} with {numeric}; treating it as unconstrained")]
    #[diagnostic(
        code(tagflow::slot::mixed_domains),
        help("resource-id and numeric contracts cannot apply to the same declaration")
    )]
    MixedDomains {
        slot: SlotId,
        resource: String,
        numeric: String,
    },

    #[error("slot error: {slot} registered twice; keeping the first contract")]
    #[diagnostic(code(tagflow::slot::duplicate))]
    Duplicate { slot: SlotId },
}

impl SlotError {
    pub fn slot(&self) -> &SlotId {
        match self {
            SlotError::MixedDomains { slot, .. } | SlotError::Duplicate { slot } => slot,
        }
    }
}
