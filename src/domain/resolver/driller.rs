//! Resolution for hierarchies that start out collapsed.
//!
//! A member is shown when it is included and every included ancestor is
//! drilled. Drilling a shown member reveals the nearest included members
//! below it, skipping excluded members and excluded levels.

use generational_arena::Index;
use tracing::{debug, trace};

use crate::domain::axis::AxisExpression;
use crate::domain::expr::{DescFlag, Expr};
use crate::domain::member_set::{
    ChildrenMemberSet, CollectionMemberSet, DescendantsSet, LevelMemberSet, MemberSet,
    RootChildren,
};
use crate::domain::metadata::Level;
use crate::domain::resolver::region::Region;
use crate::domain::resolver::DrillPool;
use crate::domain::selection::SelectionTree;

pub(super) fn resolve(tree: &SelectionTree, levels: &[Level], pool: &mut DrillPool) -> AxisExpression {
    let mut driller = Driller {
        tree,
        levels,
        pool,
        expression: AxisExpression::new(),
    };
    driller.visit_root();
    debug!(unmatched = driller.pool.len(), "driller done");
    driller.expression
}

struct Driller<'a, 'p> {
    tree: &'a SelectionTree,
    levels: &'a [Level],
    pool: &'p mut DrillPool,
    expression: AxisExpression,
}

impl<'a, 'p> Driller<'a, 'p> {
    fn visit_root(&mut self) {
        let root = self.tree.root();
        let region = Region::new(self.tree, self.levels, root);
        let overrides = region.overrides();

        if let Some((first, level)) = region.next_included_level(0) {
            let mut frontier: Box<dyn MemberSet> = if first == 0 {
                Box::new(RootChildren::new(level))
            } else {
                Box::new(LevelMemberSet::new(level))
            };
            for member in &overrides {
                frontier.remove(member);
            }
            self.expression.include(frontier.to_expression());
            self.drill_region(&region, frontier.as_ref(), first);
        }

        for &child in self.tree.children(root) {
            self.visit(child, true, false);
        }
    }

    /// `revealed`: every included ancestor is drilled.
    /// `in_base`: the member is already produced by an ancestor's drill-down.
    fn visit(&mut self, idx: Index, revealed: bool, in_base: bool) {
        let Some(member) = self.tree.member(idx).cloned() else {
            return;
        };
        let level_sign = self
            .levels
            .get(member.depth())
            .and_then(|l| self.tree.level_sign(l));
        let included = self.tree.member_sign(idx).with_level(level_sign).is_include();
        let shown = revealed && included;
        let drilled = shown && self.pool.take(&member);
        trace!(%member, included, shown, drilled, "visit");

        match (shown, in_base) {
            (true, false) => self.expression.include_member(&member),
            (false, true) => self.expression.exclude_member(&member),
            _ => {}
        }

        let open = if included { drilled } else { revealed };
        if !open {
            return;
        }

        let region = Region::new(self.tree, self.levels, idx);
        let overrides = region.overrides();
        let mut children_in_base = false;

        if let Some((first, level)) = region.next_included_level(region.children_depth()) {
            let frontier: Box<dyn MemberSet> = if first == region.children_depth() {
                let mut children = ChildrenMemberSet::new(&member);
                for o in &overrides {
                    children.remove(o);
                }
                if drilled {
                    self.expression.drill(Expr::member(&member));
                    children_in_base = true;
                } else {
                    self.expression.include(children.to_expression());
                }
                Box::new(children)
            } else {
                let mut descendants = DescendantsSet::new(&member, level);
                for o in &overrides {
                    descendants.remove(o);
                }
                self.expression.include(descendants.to_expression());
                Box::new(descendants)
            };
            self.drill_region(&region, frontier.as_ref(), first);
        }

        for &child in self.tree.children(idx) {
            self.visit(child, true, children_in_base);
        }
    }

    /// Follow drills through the members of a region, level by level.
    fn drill_region(&mut self, region: &Region<'_>, frontier: &dyn MemberSet, first: usize) {
        let mut depth = first;
        let mut taken = self
            .pool
            .take_where(|p| p.depth() == depth && frontier.contains(p));

        while !taken.is_empty() {
            let Some(next) = region.next_included(depth + 1) else {
                break;
            };
            let roots = CollectionMemberSet::new(taken);
            if next == depth + 1 {
                self.expression.drill(roots.to_expression());
            } else {
                trace!(from = depth, to = next, "jump over excluded levels");
                self.expression.include(Expr::descendants(
                    roots.to_expression(),
                    next - depth,
                    DescFlag::SelfOnly,
                ));
            }
            taken = self
                .pool
                .take_where(|p| p.depth() == next && roots.contains_ancestor_of(p));
            depth = next;
        }
    }
}
