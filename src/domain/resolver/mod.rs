//! Resolution of a selection tree plus drill state into an axis expression.
//!
//! Two strategies exist. The driller serves hierarchies that start out
//! collapsed, where recorded positions are drills; the expander serves
//! hierarchies that start out expanded, where recorded positions are
//! undrills.

mod driller;
mod expander;
mod region;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::axis::AxisExpression;
use crate::domain::expr::Expr;
use crate::domain::metadata::{Level, Member};
use crate::domain::selection::SelectionTree;

/// Resolution strategy for one hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    /// Collapsed by default; positions are drills.
    #[default]
    #[serde(rename = "collapsed")]
    Driller,
    /// Expanded by default; positions are undrills.
    #[serde(rename = "expanded")]
    Expander,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Driller => write!(f, "collapsed"),
            Resolution::Expander => write!(f, "expanded"),
        }
    }
}

impl Resolution {
    /// Walk `tree` and produce the axis expression for one hierarchy.
    ///
    /// Positions that match are taken out of `pool`.
    #[instrument(level = "debug", skip(tree, levels, pool), fields(pool = pool.len()))]
    pub fn execute(
        &self,
        tree: &SelectionTree,
        levels: &[Level],
        pool: &mut DrillPool,
    ) -> AxisExpression {
        match self {
            Resolution::Driller => driller::resolve(tree, levels, pool),
            Resolution::Expander => expander::resolve(tree, levels, pool),
        }
    }

    /// Whether `member` is part of the set the compiled expression denotes.
    pub fn is_visible(&self, tree: &SelectionTree, positions: &[Member], member: &Member) -> bool {
        if !tree.is_included(member) {
            return false;
        }
        let mut included_ancestors = member.ancestors().filter(|a| tree.is_included(a));
        match self {
            Resolution::Driller => included_ancestors.all(|a| positions.contains(a)),
            Resolution::Expander => !included_ancestors.any(|a| positions.contains(a)),
        }
    }
}

/// Drilled (or undrilled) members not yet matched by a resolver.
#[derive(Debug, Clone, Default)]
pub struct DrillPool {
    members: Vec<Member>,
}

impl DrillPool {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    /// Remove `member` from the pool, reporting whether it was there.
    pub fn take(&mut self, member: &Member) -> bool {
        match self.members.iter().position(|m| m == member) {
            Some(pos) => {
                self.members.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Remove and return every member matching `predicate`, in pool order.
    pub fn take_where<F>(&mut self, mut predicate: F) -> Vec<Member>
    where
        F: FnMut(&Member) -> bool,
    {
        let (taken, kept): (Vec<Member>, Vec<Member>) =
            self.members.drain(..).partition(|m| predicate(m));
        self.members = kept;
        taken
    }

    pub fn remaining(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// One hierarchy placed on an axis.
#[derive(Debug, Clone, Copy)]
pub struct AxisDimension<'a> {
    pub selection: &'a SelectionTree,
    pub levels: &'a [Level],
    pub resolution: Resolution,
}

impl<'a> AxisDimension<'a> {
    pub fn new(selection: &'a SelectionTree, levels: &'a [Level], resolution: Resolution) -> Self {
        Self {
            selection,
            levels,
            resolution,
        }
    }

    /// Resolve against `positions`.
    pub fn resolve(&self, positions: &[Member]) -> AxisExpression {
        let mut pool = DrillPool::new(positions.to_vec());
        self.resolution.execute(self.selection, self.levels, &mut pool)
    }

    /// The expression without any drill state.
    pub fn full_expression(&self) -> Expr {
        self.resolve(&[]).get_expression()
    }

    pub fn is_visible(&self, positions: &[Member], member: &Member) -> bool {
        self.resolution.is_visible(self.selection, positions, member)
    }
}
