//! Signs of the members below a node that have no override node themselves.
//!
//! Such members depend only on their level: the children level takes the
//! node's `Children` sign, deeper levels take the node's descendants
//! default, and level-wide overrides win over anything not explicit.

use generational_arena::Index;

use crate::domain::metadata::{Level, Member};
use crate::domain::selection::{Operator, Sign, SelectionTree};

pub(crate) struct Region<'a> {
    tree: &'a SelectionTree,
    levels: &'a [Level],
    node: Index,
    children_depth: usize,
}

impl<'a> Region<'a> {
    pub(crate) fn new(tree: &'a SelectionTree, levels: &'a [Level], node: Index) -> Self {
        let children_depth = tree.member(node).map_or(0, |m| m.depth() + 1);
        Self {
            tree,
            levels,
            node,
            children_depth,
        }
    }

    pub(crate) fn children_depth(&self) -> usize {
        self.children_depth
    }

    pub(crate) fn level(&self, depth: usize) -> Option<&'a Level> {
        self.levels.get(depth)
    }

    pub(crate) fn level_sign(&self, depth: usize) -> Option<Sign> {
        self.level(depth).and_then(|l| self.tree.level_sign(l))
    }

    pub(crate) fn has_explicit_children(&self) -> bool {
        self.tree
            .state(self.node)
            .sign(Operator::Children)
            .is_some()
    }

    /// Final sign of region members at `depth`.
    pub(crate) fn sign_at(&self, depth: usize) -> Sign {
        let resolved = if depth == self.children_depth {
            self.tree.children_sign(self.node)
        } else {
            self.tree.descendants_default(self.node)
        };
        resolved.with_level(self.level_sign(depth))
    }

    /// First depth at or below `from` whose region members are included.
    pub(crate) fn next_included(&self, from: usize) -> Option<usize> {
        (from..self.levels.len()).find(|&d| self.sign_at(d).is_include())
    }

    /// Like `next_included`, together with the level at that depth.
    pub(crate) fn next_included_level(&self, from: usize) -> Option<(usize, &'a Level)> {
        let depth = self.next_included(from)?;
        self.level(depth).map(|level| (depth, level))
    }

    /// Members of the overriding children of the node.
    pub(crate) fn overrides(&self) -> Vec<Member> {
        self.tree
            .children(self.node)
            .iter()
            .filter_map(|&c| self.tree.member(c).cloned())
            .collect()
    }

    /// Whether `member` lies below the node and outside every override subtree.
    pub(crate) fn owns(&self, member: &Member) -> bool {
        if member.depth() < self.children_depth {
            return false;
        }
        let below = match self.tree.member(self.node) {
            Some(m) => m.is_ancestor_of(member),
            None => true,
        };
        below
            && member
                .ancestor_at_depth(self.children_depth)
                .is_some_and(|top| self.tree.get_overriding_child(self.node, top).is_none())
    }
}
