#![forbid(unsafe_code)]

use tagflow_model::{Expr, ExprKind, SlotError, SlotId, SlotKind, SlotRegistry};
use tracing::{debug, instrument};

use crate::compat::{self, Rejection};
use crate::finding::Finding;
use crate::resolve::{Resolver, DEFAULT_MAX_CHAIN_DEPTH};
use crate::site::{AnalysisUnit, FlowKind, UseSite};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckOptions {
    pub max_chain_depth: usize,
    /// Reject sources whose own declared range escapes the required one.
    pub range_subsumption: bool,
    /// Let drawable slots accept color and mipmap resources.
    pub color_promotion: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            range_subsumption: true,
            color_promotion: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub unit: String,
    /// Sorted by location, duplicates removed.
    pub findings: Vec<Finding>,
    pub slot_errors: Vec<SlotError>,
}

/// Walks the use sites of one unit; owns the unit's resolver and its memo.
pub struct UnitChecker<'u> {
    resolver: Resolver<'u>,
    options: &'u CheckOptions,
    findings: Vec<Finding>,
}

impl<'u> UnitChecker<'u> {
    pub fn new(registry: &'u SlotRegistry, options: &'u CheckOptions) -> Self {
        Self {
            resolver: Resolver::new(registry).with_max_chain_depth(options.max_chain_depth),
            options,
            findings: Vec::new(),
        }
    }

    pub fn check_site(&mut self, site: &UseSite) {
        match site {
            UseSite::Call(expr) => self.visit(expr),
            UseSite::Flow { expr, target, kind } => {
                self.check_flow(expr, target, *kind);
                self.visit(expr);
            }
            UseSite::Compare { op, lhs, rhs, span } => {
                if let Some(rejection) =
                    compat::check_comparison(&mut self.resolver, *op, lhs, rhs, *span)
                {
                    self.push(rejection, None);
                }
                self.visit(lhs);
                self.visit(rhs);
            }
            UseSite::Arithmetic {
                operands, result, ..
            } => {
                for rejection in compat::check_arithmetic(&mut self.resolver, operands, *result) {
                    self.push(rejection, None);
                }
                for operand in operands {
                    self.visit(operand);
                }
            }
        }
    }

    /// Checks `expr` flowing into `target`; unregistered targets accept anything.
    pub fn check_flow(&mut self, expr: &Expr, target: &SlotId, kind: FlowKind) {
        let registry = self.resolver.registry();
        let Some(slot) = registry.slot(target) else {
            return;
        };
        let rejections = compat::check_slot(&mut self.resolver, expr, slot, kind, self.options);
        for rejection in rejections {
            self.push(rejection, Some(target));
        }
    }

    /// Checks the calls nested in `expr`. Chained definitions are use sites of
    /// their own and are not followed.
    fn visit(&mut self, expr: &Expr) {
        let mut stack = vec![expr];
        while let Some(e) = stack.pop() {
            match &e.kind {
                ExprKind::Call { callee, args, .. } => {
                    for arg in args {
                        let target = SlotId {
                            owner: callee.clone(),
                            kind: SlotKind::Parameter(arg.index),
                        };
                        self.check_flow(&arg.expr, &target, FlowKind::Argument);
                    }
                    stack.extend(args.iter().rev().map(|a| &a.expr));
                }
                ExprKind::Conditional(branches) => stack.extend(branches.iter().rev()),
                ExprKind::Literal(_) | ExprKind::SlotRef(_) | ExprKind::ChainedRef(_) => {}
            }
        }
    }

    fn push(&mut self, rejection: Rejection, target: Option<&SlotId>) {
        let slot = target.and_then(|id| self.resolver.registry().slot(id));
        self.findings.push(Finding::from_rejection(rejection, slot));
    }

    pub fn finish(self) -> Vec<Finding> {
        let mut findings = self.findings;
        findings.sort();
        findings.dedup();
        findings
    }
}

/// Checks one unit from scratch; nothing survives the call but the report.
#[instrument(skip_all, fields(unit = %unit.name, sites = unit.sites.len()))]
pub fn check_unit(unit: &AnalysisUnit, options: &CheckOptions) -> UnitReport {
    let mut registry = SlotRegistry::new();
    let slot_errors = registry.register_all(unit.slots.iter().cloned());

    let mut checker = UnitChecker::new(&registry, options);
    for site in &unit.sites {
        checker.check_site(site);
    }
    let findings = checker.finish();
    debug!(findings = findings.len(), slot_errors = slot_errors.len(), "unit checked");

    UnitReport {
        unit: unit.name.clone(),
        findings,
        slot_errors,
    }
}
