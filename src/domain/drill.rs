//! Drill trie: which positions of an axis are drilled.
//!
//! Edges are members, one trie level per hierarchy on the axis. A position
//! `(m0, .., mn)` is drilled when the edge path `m0 .. m(n-1)` exists and the
//! node at its end lists `mn` as drilled.

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, trace};

use crate::domain::builder::{CrossJoinBuilder, UnionBuilder};
use crate::domain::expr::{Expr, Syntax};
use crate::domain::metadata::Member;
use crate::domain::resolver::AxisDimension;

#[derive(Debug)]
struct DrillNode {
    member: Option<Member>,
    parent: Option<Index>,
    children: Vec<Index>,
    drilled: Vec<Member>,
}

impl DrillNode {
    fn new(member: Option<Member>, parent: Option<Index>) -> Self {
        Self {
            member,
            parent,
            children: Vec::new(),
            drilled: Vec::new(),
        }
    }
}

/// Callbacks for [`DrillTree::visit`].
pub trait DrillVisitor {
    /// Called once per node with the edge path leading to it.
    fn visit(&mut self, path: &[Member], drilled: &[Member]);

    /// Whether to descend into the child reached by `child`.
    fn descend(&mut self, path: &[Member], child: &Member) -> bool {
        let _ = (path, child);
        true
    }
}

#[derive(Debug)]
pub struct DrillTree {
    arena: Arena<DrillNode>,
    root: Index,
}

impl Default for DrillTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DrillTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(DrillNode::new(None, None));
        Self { arena, root }
    }

    fn child(&self, parent: Index, member: &Member) -> Option<Index> {
        self.arena[parent]
            .children
            .iter()
            .copied()
            .find(|&c| self.arena[c].member.as_ref() == Some(member))
    }

    fn walk(&self, prefix: &[Member]) -> Option<Index> {
        prefix
            .iter()
            .try_fold(self.root, |current, member| self.child(current, member))
    }

    fn walk_or_create(&mut self, prefix: &[Member]) -> Index {
        let mut current = self.root;
        for member in prefix {
            current = match self.child(current, member) {
                Some(child) => child,
                None => {
                    let child = self
                        .arena
                        .insert(DrillNode::new(Some(member.clone()), Some(current)));
                    self.arena[current].children.push(child);
                    child
                }
            };
        }
        current
    }

    /// Mark `position` as drilled. Empty positions are ignored.
    #[instrument(level = "debug", skip(self))]
    pub fn add(&mut self, position: &[Member]) {
        let Some((last, prefix)) = position.split_last() else {
            return;
        };
        let node = self.walk_or_create(prefix);
        let drilled = &mut self.arena[node].drilled;
        if !drilled.contains(last) {
            drilled.push(last.clone());
        }
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, position: &[Member]) {
        let Some((last, prefix)) = position.split_last() else {
            return;
        };
        if let Some(node) = self.walk(prefix) {
            self.arena[node].drilled.retain(|m| m != last);
        }
    }

    pub fn is_drilled(&self, position: &[Member]) -> bool {
        let Some((last, prefix)) = position.split_last() else {
            return false;
        };
        self.walk(prefix)
            .is_some_and(|node| self.arena[node].drilled.contains(last))
    }

    /// Members drilled at the end of `prefix`, empty if the path does not exist.
    pub fn drilled_at(&self, prefix: &[Member]) -> &[Member] {
        self.walk(prefix)
            .map(|node| self.arena[node].drilled.as_slice())
            .unwrap_or(&[])
    }

    /// Drop all positions longer than `depth`.
    #[instrument(level = "debug", skip(self))]
    pub fn prune(&mut self, depth: usize) {
        let mut stack = vec![(self.root, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            if d == depth {
                let children = std::mem::take(&mut self.arena[idx].children);
                self.arena[idx].drilled.clear();
                for child in children {
                    self.remove_subtree(child);
                }
            } else {
                for &child in &self.arena[idx].children {
                    stack.push((child, d + 1));
                }
            }
        }
    }

    /// Forget the drilled members at exactly `depth`, keeping the trie structure.
    #[instrument(level = "debug", skip(self))]
    pub fn clear_level(&mut self, depth: usize) {
        let mut stack = vec![(self.root, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            if d == depth {
                self.arena[idx].drilled.clear();
            } else {
                for &child in &self.arena[idx].children {
                    stack.push((child, d + 1));
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.prune(0);
    }

    fn remove_subtree(&mut self, idx: Index) {
        if let Some(node) = self.arena.remove(idx) {
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }

    /// Pre-order traversal; the visitor decides which children to enter.
    pub fn visit<V: DrillVisitor>(&self, visitor: &mut V) {
        let mut path = Vec::new();
        self.visit_node(self.root, &mut path, visitor);
    }

    fn visit_node<V: DrillVisitor>(&self, idx: Index, path: &mut Vec<Member>, visitor: &mut V) {
        let node = &self.arena[idx];
        visitor.visit(path, &node.drilled);
        for &child in &node.children {
            let Some(member) = self.arena[child].member.as_ref() else {
                continue;
            };
            if visitor.descend(path, member) {
                path.push(member.clone());
                self.visit_node(child, path, visitor);
                path.pop();
            }
        }
    }

    /// Every recorded position, in trie order.
    pub fn positions(&self) -> Vec<Vec<Member>> {
        struct Collect(Vec<Vec<Member>>);
        impl DrillVisitor for Collect {
            fn visit(&mut self, path: &[Member], drilled: &[Member]) {
                for member in drilled {
                    let mut position = path.to_vec();
                    position.push(member.clone());
                    self.0.push(position);
                }
            }
        }
        let mut collect = Collect(Vec::new());
        self.visit(&mut collect);
        collect.0
    }

    /// Recorded positions whose members are all currently shown on the axis.
    pub fn visible_positions(&self, dimensions: &[AxisDimension<'_>]) -> Vec<Vec<Member>> {
        struct Visible<'d, 'a> {
            tree: &'d DrillTree,
            dimensions: &'d [AxisDimension<'a>],
            found: Vec<Vec<Member>>,
        }
        impl DrillVisitor for Visible<'_, '_> {
            fn visit(&mut self, path: &[Member], drilled: &[Member]) {
                let Some(dimension) = self.dimensions.get(path.len()) else {
                    return;
                };
                let context = self.tree.drilled_at(path);
                for member in drilled {
                    if dimension.is_visible(context, member) {
                        let mut position = path.to_vec();
                        position.push(member.clone());
                        self.found.push(position);
                    }
                }
            }

            fn descend(&mut self, path: &[Member], child: &Member) -> bool {
                self.dimensions
                    .get(path.len())
                    .is_some_and(|d| d.is_visible(self.tree.drilled_at(path), child))
            }
        }
        let mut visible = Visible {
            tree: self,
            dimensions,
            found: Vec::new(),
        };
        self.visit(&mut visible);
        visible.found
    }

    /// Compile the whole axis: one hierarchy per trie level.
    ///
    /// Members with a drilled sub-position become prefixes of their own
    /// terms; the rest of each level is crossed with the undrilled
    /// expressions of the following hierarchies.
    #[instrument(level = "debug", skip_all, fields(dimensions = dimensions.len()))]
    pub fn compile_axis_expression(&self, dimensions: &[AxisDimension<'_>]) -> Expr {
        if dimensions.is_empty() {
            return Expr::empty_set();
        }
        let full: Vec<Expr> = dimensions.iter().map(|d| d.full_expression()).collect();
        let mut union = UnionBuilder::new();
        self.compile_node(self.root, dimensions, &full, &CrossJoinBuilder::new(), &mut union);
        let expression = union.to_expr();
        debug!(%expression, "compiled axis");
        if expression.is_syntax(Syntax::Tuple) {
            Expr::brace_set(vec![expression])
        } else {
            expression
        }
    }

    fn compile_node(
        &self,
        idx: Index,
        dimensions: &[AxisDimension<'_>],
        full: &[Expr],
        prefix: &CrossJoinBuilder,
        union: &mut UnionBuilder,
    ) {
        let depth = prefix_depth(&self.arena, idx);
        let Some(dimension) = dimensions.get(depth) else {
            return;
        };
        let node = &self.arena[idx];
        let mut axis = dimension.resolve(&node.drilled);
        if axis.is_empty() {
            trace!(depth, "nothing selected");
            return;
        }

        let mut expanded = Vec::new();
        if depth + 1 < dimensions.len() {
            for &child in &node.children {
                let Some(member) = self.arena[child].member.as_ref() else {
                    continue;
                };
                if self.has_drills(child) && dimension.is_visible(&node.drilled, member) {
                    axis.exclude_member(member);
                    expanded.push((child, member.clone()));
                }
            }
        }

        let rest = &full[depth + 1..];
        if !rest.iter().any(Expr::is_empty_set) {
            let mut term = prefix.clone();
            term.join(axis.get_expression());
            for expression in rest {
                term.join(expression.clone());
            }
            if let Some(term) = term.into_expression() {
                union.add(term);
            }
        }

        for (child, member) in expanded {
            let mut next = prefix.clone();
            next.join(Expr::members([&member]));
            self.compile_node(child, dimensions, full, &next, union);
        }
    }
}

impl DrillTree {
    /// Whether the subtree below `idx` records any drilled position.
    fn has_drills(&self, idx: Index) -> bool {
        let node = &self.arena[idx];
        !node.drilled.is_empty() || node.children.iter().any(|&c| self.has_drills(c))
    }
}

fn prefix_depth(arena: &Arena<DrillNode>, idx: Index) -> usize {
    let mut depth = 0;
    let mut current = arena[idx].parent;
    while let Some(parent) = current {
        depth += 1;
        current = arena[parent].parent;
    }
    depth
}
