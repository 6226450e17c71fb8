#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::fmt;

use miette::{Diagnostic, LabeledSpan};
use tagflow_model::{Slot, SlotId, Span};

use crate::compat::Rejection;
use crate::issue::Issue;
use crate::violation::Violation;

/// A rejected flow, located at the contributing leaf.
///
/// Carries no severity; that is the driver's policy per issue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    pub issue: Issue,
    pub violation: Violation,
    pub message: String,
    pub span: Span,
    pub slot: Option<SlotId>,
    /// The slot's own declaration, when its contract was inherited.
    pub secondary: Option<Span>,
}

impl Finding {
    pub fn new(violation: Violation, span: Span) -> Self {
        Self {
            issue: violation.issue(),
            message: violation.message(),
            violation,
            span,
            slot: None,
            secondary: None,
        }
    }

    pub fn from_rejection(rejection: Rejection, slot: Option<&Slot>) -> Self {
        let mut finding = Self::new(rejection.violation, rejection.span);
        if let Some(slot) = slot {
            finding.slot = Some(slot.id.clone());
            if slot.inherited {
                finding.secondary = slot.span;
            }
        }
        finding
    }

    fn sort_key(&self) -> (usize, usize, Issue, &str) {
        (
            self.span.offset(),
            self.span.len(),
            self.issue,
            self.message.as_str(),
        )
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Finding {}

impl Diagnostic for Finding {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("tagflow::{}", self.issue.id())))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.slot
            .as_ref()
            .map(|slot| Box::new(format!("required by {slot}")) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let primary = LabeledSpan::new_primary_with_span(
            Some(self.violation.class().to_string()),
            self.span,
        );
        let secondary = self
            .secondary
            .map(|span| LabeledSpan::new_with_span(Some("contract declared here".into()), span));
        Some(Box::new(std::iter::once(primary).chain(secondary)))
    }
}

impl PartialOrd for Finding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Finding {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.violation.cmp(&other.violation))
            .then_with(|| self.slot.cmp(&other.slot))
            .then_with(|| {
                let a = self.secondary.map(|s| (s.offset(), s.len()));
                let b = other.secondary.map(|s| (s.offset(), s.len()));
                a.cmp(&b)
            })
    }
}
