//! Accumulates resolver output for one hierarchy into a single expression.

use crate::domain::builder::UnionBuilder;
use crate::domain::expr::{DescFlag, Expr};
use crate::domain::metadata::Member;

/// Four independent unions combined by [`AxisExpression::get_expression`].
///
/// `roots` and `drills` may overlap freely; `exclude` must never contain a
/// member that is meant to be shown.
#[derive(Debug, Default, Clone)]
pub struct AxisExpression {
    roots: UnionBuilder,
    drills: UnionBuilder,
    undrills: UnionBuilder,
    exclude: UnionBuilder,
}

impl AxisExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(&mut self, node: Expr) {
        self.roots.add(node);
    }

    pub fn include_member(&mut self, member: &Member) {
        self.roots.add_member(member);
    }

    /// Members whose subtree is pulled in by recursive drill-down.
    pub fn drill(&mut self, node: Expr) {
        self.drills.add(node);
    }

    /// Members collapsed back out: everything strictly below them is removed.
    pub fn undrill(&mut self, member: &Member) {
        self.undrills.add_member(member);
    }

    pub fn exclude(&mut self, node: Expr) {
        self.exclude.add(node);
    }

    pub fn exclude_member(&mut self, member: &Member) {
        self.exclude.add_member(member);
    }

    /// Members collapsed so far.
    pub fn undrilled(&self) -> &[Member] {
        self.undrills.members()
    }

    /// True when nothing is included; the expression is then `{}`.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn get_expression(&self) -> Expr {
        let Some(roots) = self.roots.get_union_node() else {
            return Expr::empty_set();
        };
        let base = match self.drills.get_union_node() {
            Some(drills) => Expr::drilldown_member(roots, drills),
            None => roots,
        };
        let exclude = self.exclude.get_union_node();
        let subtrahend = match self.undrills.get_union_node() {
            Some(undrills) => {
                let below = Expr::descendants(undrills, 0, DescFlag::After);
                Some(match exclude {
                    Some(exclude) => Expr::union(below, exclude),
                    None => below,
                })
            }
            None => exclude,
        };
        match subtrahend {
            Some(subtrahend) => Expr::except(base, subtrahend),
            None => base,
        }
    }
}
