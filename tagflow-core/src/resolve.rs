#![forbid(unsafe_code)]

use std::collections::HashMap;

use tagflow_model::{Expr, ExprId, ExprKind, LiteralValue, SlotRegistry, TagSet};
use tracing::{trace, warn};

pub const DEFAULT_MAX_CHAIN_DEPTH: usize = 64;

/// What is provably true of an expression's value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Provenance {
    pub tags: TagSet,
    /// Pre-evaluated constant, forwarded to bounds and membership checks.
    pub constant: Option<LiteralValue>,
    /// Literal `0` or `-1`.
    pub sentinel: bool,
    /// Declaration the tags were read from.
    pub origin: Option<String>,
}

impl Provenance {
    fn constant(value: &LiteralValue) -> Self {
        Self {
            tags: TagSet::new(),
            constant: Some(value.clone()),
            sentinel: value.is_sentinel(),
            origin: None,
        }
    }

    fn tagged(tags: TagSet, origin: String) -> Self {
        Self {
            tags,
            constant: None,
            sentinel: false,
            origin: Some(origin),
        }
    }

    /// Nothing is known; never a source of rejection.
    pub fn is_unknown(&self) -> bool {
        self.tags.is_empty() && self.constant.is_none()
    }
}

/// Computes provenance over one unit's bound graph, memoized by expression identity.
pub struct Resolver<'u> {
    registry: &'u SlotRegistry,
    max_chain_depth: usize,
    memo: HashMap<ExprId, Provenance>,
}

impl<'u> Resolver<'u> {
    pub fn new(registry: &'u SlotRegistry) -> Self {
        Self {
            registry,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            memo: HashMap::new(),
        }
    }

    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth;
        self
    }

    pub fn registry(&self) -> &'u SlotRegistry {
        self.registry
    }

    pub fn cached(&self) -> usize {
        self.memo.len()
    }

    pub fn resolve_tags(&mut self, expr: &Expr) -> TagSet {
        self.resolve(expr).tags
    }

    pub fn resolve(&mut self, expr: &Expr) -> Provenance {
        if let Some(hit) = self.memo.get(&expr.id) {
            return hit.clone();
        }

        let provenance = match &expr.kind {
            ExprKind::ChainedRef(_) => match self.chain_end(expr) {
                Some(end) => self.resolve(end),
                None => {
                    warn!(
                        expr = expr.id.0,
                        cap = self.max_chain_depth,
                        "definition chain exceeds depth cap; treating as unconstrained"
                    );
                    Provenance::default()
                }
            },
            _ => self.compute(expr),
        };

        trace!(expr = expr.id.0, tags = provenance.tags.len(), "resolved");
        self.memo.insert(expr.id, provenance.clone());
        provenance
    }

    fn compute(&self, expr: &Expr) -> Provenance {
        match &expr.kind {
            ExprKind::Literal(value) => Provenance::constant(value),
            ExprKind::SlotRef(slot) => match self.registry.lookup(slot) {
                Some(tags) => Provenance::tagged(tags.clone(), slot.owner.to_string()),
                None => Provenance::default(),
            },
            // One hop: only the callee's declared return contract, never its body.
            ExprKind::Call {
                callee,
                return_slot,
                ..
            } => match return_slot.as_ref().and_then(|s| self.registry.lookup(s)) {
                Some(tags) => Provenance::tagged(tags.clone(), format!("`{callee}`")),
                None => Provenance::default(),
            },
            ExprKind::Conditional(_) | ExprKind::ChainedRef(_) => Provenance::default(),
        }
    }

    /// Follows single-definition links to the defining expression.
    ///
    /// Returns `None` when the chain is longer than the depth cap.
    pub fn chain_end<'e>(&self, expr: &'e Expr) -> Option<&'e Expr> {
        let mut cur = expr;
        let mut depth = 0usize;
        while let ExprKind::ChainedRef(def) = &cur.kind {
            depth += 1;
            if depth > self.max_chain_depth {
                return None;
            }
            cur = def;
        }
        Some(cur)
    }

    /// Contributing leaves of a use-site expression, in source order.
    ///
    /// Conditional branches are returned separately, never merged; a chain whose
    /// definition is a conditional is flattened the same way.
    pub fn leaves<'e>(&self, expr: &'e Expr) -> Vec<&'e Expr> {
        let mut out = Vec::new();
        let mut stack = vec![expr];
        while let Some(e) = stack.pop() {
            let end = self.chain_end(e).unwrap_or(e);
            match &end.kind {
                ExprKind::Conditional(branches) => stack.extend(branches.iter().rev()),
                _ => out.push(e),
            }
        }
        out
    }
}
