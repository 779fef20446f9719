//! Resolution for hierarchies that start out expanded.
//!
//! A member is shown when it is included and no included ancestor is
//! undrilled. The walk emits only the difference between what a node
//! wants and what its ancestors already emitted: broad `Children` and
//! `Descendants` sets on the include side, exact sets on the exclude side.
//! Level-wide overrides are emitted once, after the walk, with the members
//! handled by more specific overrides cut out.

use std::collections::BTreeMap;

use generational_arena::Index;
use tracing::{debug, trace};

use crate::domain::axis::AxisExpression;
use crate::domain::expr::{DescFlag, Expr};
use crate::domain::member_set::{
    CollectionMemberSet, DescendantsSet, GrandchildrenSet, InverseMemberSet, LevelMemberSet,
    MemberSet,
};
use crate::domain::metadata::{Level, Member};
use crate::domain::resolver::region::Region;
use crate::domain::resolver::DrillPool;
use crate::domain::selection::{Operator, Sign, SelectionTree};

pub(super) fn resolve(tree: &SelectionTree, levels: &[Level], pool: &mut DrillPool) -> AxisExpression {
    let mut expander = Expander {
        tree,
        levels,
        pool,
        expression: AxisExpression::new(),
        level_exclusions: BTreeMap::new(),
    };
    let ambient = Ambient {
        member: Sign::Exclude,
        children: Sign::Exclude,
        deeper: Sign::Exclude,
    };
    expander.visit(tree.root(), ambient);
    expander.emit_level_sets();
    debug!(unmatched = expander.pool.len(), "expander done");
    expander.expression
}

/// What ancestors already put into the expression for a node's member,
/// its children and its deeper descendants.
#[derive(Debug, Clone, Copy)]
struct Ambient {
    member: Sign,
    children: Sign,
    deeper: Sign,
}

struct Expander<'a, 'p> {
    tree: &'a SelectionTree,
    levels: &'a [Level],
    pool: &'p mut DrillPool,
    expression: AxisExpression,
    /// Per level depth: members whose level-wide sign is decided by a more
    /// specific override, cut out of the level set.
    level_exclusions: BTreeMap<usize, Vec<Member>>,
}

impl<'a, 'p> Expander<'a, 'p> {
    fn level_sign(&self, depth: usize) -> Option<Sign> {
        self.levels.get(depth).and_then(|l| self.tree.level_sign(l))
    }

    fn visit(&mut self, idx: Index, ambient: Ambient) {
        let region = Region::new(self.tree, self.levels, idx);
        let member = self.tree.member(idx).cloned();
        let mut include_member = false;

        if let Some(member) = &member {
            let depth = member.depth();
            let level_sign = self.level_sign(depth);
            let state = self.tree.state(idx);
            let explicit_member = state.sign(Operator::Member).is_some();
            let explicit_parent = self
                .tree
                .get_node(idx)
                .and_then(|n| n.parent())
                .is_some_and(|p| self.tree.state(p).sign(Operator::Children).is_some());
            let final_sign = self.tree.member_sign(idx).with_level(level_sign);

            if level_sign.is_some() && explicit_member {
                self.level_exclusions.entry(depth).or_default().push(member.clone());
            }
            if region.has_explicit_children() && self.level_sign(depth + 1).is_some() {
                self.level_exclusions
                    .entry(depth + 1)
                    .or_default()
                    .push(member.clone());
            }

            // Members decided by a level set need nothing here.
            let decided_by_level = level_sign.is_some() && !explicit_member && !explicit_parent;
            if !decided_by_level && final_sign != ambient.member {
                match final_sign {
                    Sign::Include => include_member = true,
                    Sign::Exclude => self.expression.exclude_member(member),
                }
            }

            if final_sign.is_include() && self.pool.take(member) {
                trace!(%member, "undrilled");
                if include_member {
                    self.expression.include_member(member);
                }
                self.expression.undrill(member);
                return;
            }
        }

        let children_depth = region.children_depth();
        let overrides = region.overrides();
        let mut include_children = false;
        let mut include_deeper = false;

        if children_depth < self.levels.len() {
            let children_target = if region.has_explicit_children() {
                Some(region.sign_at(children_depth))
            } else if self.level_sign(children_depth).is_some() {
                None
            } else {
                Some(region.sign_at(children_depth))
            };
            match (children_target, ambient.children, &member) {
                (Some(Sign::Include), Sign::Exclude, _) => include_children = true,
                (Some(Sign::Exclude), Sign::Include, Some(m)) => {
                    let others = InverseMemberSet::new(m, CollectionMemberSet::new(overrides.clone()));
                    self.expression.exclude(others.to_expression());
                }
                _ => {}
            }

            let deeper_target = self.tree.descendants_default(idx).sign;
            let unsigned_deeper: Vec<usize> = (children_depth + 1..self.levels.len())
                .filter(|&d| self.level_sign(d).is_none())
                .collect();
            if !unsigned_deeper.is_empty() && deeper_target != ambient.deeper {
                if let Some(m) = &member {
                    match deeper_target {
                        Sign::Include => include_deeper = true,
                        Sign::Exclude => self.exclude_deeper(m, &overrides, &unsigned_deeper),
                    }
                }
            }
        }

        if let Some(m) = &member {
            self.emit_includes(m, include_member, include_children, include_deeper);
        }

        self.undrill_region(&region);

        for &child in self.tree.children(idx) {
            let child_ambient = Ambient {
                member: if include_children {
                    Sign::Include
                } else {
                    ambient.children
                },
                children: if include_deeper {
                    Sign::Include
                } else {
                    ambient.deeper
                },
                deeper: if include_deeper {
                    Sign::Include
                } else {
                    ambient.deeper
                },
            };
            self.visit(child, child_ambient);
        }
    }

    /// Merge the include parts of one node into as few sets as possible.
    fn emit_includes(&mut self, member: &Member, this: bool, children: bool, deeper: bool) {
        match (this, children, deeper) {
            (true, true, true) => self.expression.include(Expr::descendants(
                Expr::member(member),
                0,
                DescFlag::SelfAndAfter,
            )),
            (this, true, true) => {
                if this {
                    self.expression.include_member(member);
                }
                self.expression.include(Expr::descendants(
                    Expr::member(member),
                    1,
                    DescFlag::SelfAndAfter,
                ));
            }
            (this, children, deeper) => {
                if this {
                    self.expression.include_member(member);
                }
                if children {
                    self.expression.include(Expr::children(member));
                }
                if deeper {
                    self.expression.include(Expr::descendants(
                        Expr::member(member),
                        2,
                        DescFlag::SelfAndAfter,
                    ));
                }
            }
        }
    }

    /// Exclude the deeper region members exactly, skipping level-signed levels.
    fn exclude_deeper(&mut self, member: &Member, overrides: &[Member], unsigned: &[usize]) {
        let all_unsigned = unsigned.len() + member.depth() + 2 == self.levels.len();
        if all_unsigned && overrides.is_empty() {
            self.expression.exclude(Expr::descendants(
                Expr::member(member),
                2,
                DescFlag::SelfAndAfter,
            ));
            return;
        }
        if all_unsigned {
            let grandchildren = GrandchildrenSet::new(member, overrides);
            self.expression.exclude(Expr::descendants(
                grandchildren.to_expression(),
                0,
                DescFlag::SelfAndAfter,
            ));
            return;
        }
        for &depth in unsigned {
            if let Some(level) = self.levels.get(depth) {
                let mut set = DescendantsSet::new(member, level);
                for o in overrides {
                    set.remove(o);
                }
                self.expression.exclude(set.to_expression());
            }
        }
    }

    /// Collapse pooled members of the region that are included.
    fn undrill_region(&mut self, region: &Region<'_>) {
        let mut candidates = self
            .pool
            .take_where(|p| region.owns(p) && region.sign_at(p.depth()).is_include());
        candidates.sort_by_key(|m| m.depth());
        let mut collapsed = CollectionMemberSet::default();
        for candidate in candidates {
            if candidate.ancestors().any(|a| collapsed.contains(a)) {
                continue;
            }
            collapsed.add(&candidate);
        }
        for member in collapsed.members() {
            self.expression.undrill(member);
        }
    }

    fn emit_level_sets(&mut self) {
        for (depth, level) in self.levels.iter().enumerate() {
            let Some(sign) = self.tree.level_sign(level) else {
                continue;
            };
            let mut set = LevelMemberSet::new(level);
            for member in self.level_exclusions.get(&depth).into_iter().flatten() {
                set.remove(member);
            }
            trace!(level = %level, %sign, "level set");
            match sign {
                Sign::Include => self.expression.include(set.to_expression()),
                Sign::Exclude => self.expression.exclude(set.to_expression()),
            }
        }
    }
}
