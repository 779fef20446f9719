//! Sparse override tree over a hierarchy.
//!
//! Nodes live in a generational arena; every node stores its parent index
//! and the ordered indices of its overriding children. The root is a
//! pseudo-node without a member whose descendants default to exclude.

use std::fmt;

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::{debug, instrument, trace};

use crate::domain::metadata::{Level, Member};
use crate::domain::selection::state::{MemberSelectionState, Operator, Sign};

/// What a selection action applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionTarget {
    Member(Member),
    /// Every member of a level
    Level(Level),
}

/// One selection action: `sign` applied with `operator` to `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub sign: Sign,
    pub operator: Operator,
    pub target: SelectionTarget,
}

impl Selection {
    pub fn member(sign: Sign, operator: Operator, member: &Member) -> Self {
        Self {
            sign,
            operator,
            target: SelectionTarget::Member(member.clone()),
        }
    }

    pub fn include(operator: Operator, member: &Member) -> Self {
        Self::member(Sign::Include, operator, member)
    }

    pub fn exclude(operator: Operator, member: &Member) -> Self {
        Self::member(Sign::Exclude, operator, member)
    }

    pub fn level(sign: Sign, level: &Level) -> Self {
        Self {
            sign,
            operator: Operator::Member,
            target: SelectionTarget::Level(level.clone()),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            SelectionTarget::Member(m) => write!(f, "{} {} {}", self.sign, self.operator, m),
            SelectionTarget::Level(l) => write!(f, "{} level {}", self.sign, l),
        }
    }
}

/// Where a resolved sign came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignSource {
    /// A `Member` sign on the node or a `Children` sign on its parent
    Explicit,
    /// A `Descendants` sign on the node or one of its ancestors
    Descendants,
    /// Nothing recorded below the pseudo-root
    Root,
}

/// A sign together with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSign {
    pub sign: Sign,
    pub source: SignSource,
}

impl ResolvedSign {
    fn new(sign: Sign, source: SignSource) -> Self {
        Self { sign, source }
    }

    /// Apply a level-wide override, which beats everything but explicit signs.
    pub fn with_level(self, level_sign: Option<Sign>) -> Sign {
        match (self.source, level_sign) {
            (SignSource::Explicit, _) | (_, None) => self.sign,
            (_, Some(sign)) => sign,
        }
    }
}

/// Level-wide override with the sequence number of the action that set it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelOverride {
    pub level: Level,
    pub sign: Sign,
    pub sequence: u64,
}

/// A node of the override tree.
#[derive(Debug)]
pub struct SelectionNode {
    member: Option<Member>,
    state: MemberSelectionState,
    parent: Option<Index>,
    children: Vec<Index>,
    sequence: u64,
}

impl SelectionNode {
    /// `None` for the pseudo-root.
    pub fn member(&self) -> Option<&Member> {
        self.member.as_ref()
    }

    pub fn state(&self) -> &MemberSelectionState {
        &self.state
    }

    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    /// Overriding children in insertion order.
    pub fn children(&self) -> &[Index] {
        &self.children
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Smallest list of actions reproducing this node's state.
    pub fn list_selections(&self) -> Vec<Selection> {
        let Some(member) = &self.member else {
            return Vec::new();
        };
        let mut selections = Vec::new();
        if let Some(sign) = self.state.descendants_sign() {
            selections.push(Selection::member(sign, Operator::Descendants, member));
        }
        match (
            self.state.sign(Operator::Member),
            self.state.sign(Operator::Children),
        ) {
            (Some(m), Some(c)) if m == c => {
                selections.push(Selection::member(m, Operator::MemberAndChildren, member));
            }
            (m, c) => {
                if let Some(sign) = m {
                    selections.push(Selection::member(sign, Operator::Member, member));
                }
                if let Some(sign) = c {
                    selections.push(Selection::member(sign, Operator::Children, member));
                }
            }
        }
        selections
    }
}

/// Hierarchical override structure for one hierarchy.
#[derive(Debug)]
pub struct SelectionTree {
    arena: Arena<SelectionNode>,
    root: Index,
    levels: Vec<LevelOverride>,
    next_sequence: u64,
}

impl Default for SelectionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionTree {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(SelectionNode {
            member: None,
            state: MemberSelectionState::with_descendants(Sign::Exclude),
            parent: None,
            children: Vec::new(),
            sequence: 0,
        });
        Self {
            arena,
            root,
            levels: Vec::new(),
            next_sequence: 1,
        }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get_node(&self, idx: Index) -> Option<&SelectionNode> {
        self.arena.get(idx)
    }

    fn node(&self, idx: Index) -> &SelectionNode {
        &self.arena[idx]
    }

    /// Member of node `idx`, `None` for the pseudo-root.
    ///
    /// # Panics
    ///
    /// Panics if `idx` no longer names a node, e.g. after [`clear`](Self::clear).
    pub fn member(&self, idx: Index) -> Option<&Member> {
        self.node(idx).member()
    }

    /// Override children of node `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` no longer names a node, e.g. after [`clear`](Self::clear).
    pub fn children(&self, idx: Index) -> &[Index] {
        self.node(idx).children()
    }

    /// Local selection state of node `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` no longer names a node, e.g. after [`clear`](Self::clear).
    pub fn state(&self, idx: Index) -> &MemberSelectionState {
        self.node(idx).state()
    }

    pub fn level_overrides(&self) -> &[LevelOverride] {
        &self.levels
    }

    pub fn level_sign(&self, level: &Level) -> Option<Sign> {
        self.levels
            .iter()
            .find(|o| &o.level == level)
            .map(|o| o.sign)
    }

    /// True when nothing has been selected since creation or the last `clear`.
    pub fn is_void(&self) -> bool {
        self.node(self.root).children.is_empty() && self.levels.is_empty()
    }

    fn bump_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Apply one selection action.
    #[instrument(level = "debug", skip(self), fields(action = %action))]
    pub fn apply_basic(&mut self, action: &Selection) {
        match &action.target {
            SelectionTarget::Level(level) => {
                let sequence = self.bump_sequence();
                self.levels.retain(|o| &o.level != level);
                self.levels.push(LevelOverride {
                    level: level.clone(),
                    sign: action.sign,
                    sequence,
                });
            }
            SelectionTarget::Member(member) => {
                let idx = self.find_or_create(member);
                match action.operator {
                    Operator::MemberAndChildren => {
                        self.apply_to_node(idx, action.sign, Operator::Member);
                        self.apply_to_node(idx, action.sign, Operator::Children);
                    }
                    op => self.apply_to_node(idx, action.sign, op),
                }
            }
        }
    }

    fn apply_to_node(&mut self, idx: Index, sign: Sign, op: Operator) {
        let parent = self.node(idx).parent;
        let inherited = match op {
            Operator::Member => parent.and_then(|p| {
                self.node(p)
                    .state
                    .sign(Operator::Children)
                    .or_else(|| self.default_sign(p))
            }),
            _ => parent.and_then(|p| self.default_sign(p)),
        };
        self.arena[idx].state.apply(sign, op, inherited);
    }

    /// Deepest existing node on the path to `member`; never creates nodes.
    pub fn find(&self, member: &Member) -> Index {
        let mut current = self.root;
        for segment in member.path_from_root() {
            match self.get_overriding_child(current, &segment) {
                Some(child) => current = child,
                None => break,
            }
        }
        current
    }

    /// Node for exactly `member`, if it exists.
    pub fn find_exact(&self, member: &Member) -> Option<Index> {
        let idx = self.find(member);
        (self.node(idx).member.as_ref() == Some(member)).then_some(idx)
    }

    fn find_or_create(&mut self, member: &Member) -> Index {
        let mut current = self.root;
        for segment in member.path_from_root() {
            current = match self.get_overriding_child(current, &segment) {
                Some(child) => child,
                None => self.create_overriding_child(current, &segment),
            };
        }
        current
    }

    pub fn get_overriding_child(&self, parent: Index, member: &Member) -> Option<Index> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).member.as_ref() == Some(member))
    }

    pub fn create_overriding_child(&mut self, parent: Index, member: &Member) -> Index {
        let sequence = self.bump_sequence();
        let child = self.arena.insert(SelectionNode {
            member: Some(member.clone()),
            state: MemberSelectionState::new(),
            parent: Some(parent),
            children: Vec::new(),
            sequence,
        });
        self.arena[parent].children.push(child);
        trace!(member = %member, sequence, "created override node");
        child
    }

    /// Nearest `Descendants` sign on `idx` or its ancestors, pseudo-root included.
    pub fn default_sign(&self, idx: Index) -> Option<Sign> {
        let mut current = Some(idx);
        while let Some(i) = current {
            let node = self.node(i);
            if let Some(sign) = node.state.descendants_sign() {
                return Some(sign);
            }
            current = node.parent;
        }
        None
    }

    /// Like `default_sign`, but reports whether it came from a real node.
    fn resolved_default(&self, idx: Index) -> ResolvedSign {
        let mut current = Some(idx);
        while let Some(i) = current {
            let node = self.node(i);
            if let Some(sign) = node.state.descendants_sign() {
                let source = if node.member.is_some() {
                    SignSource::Descendants
                } else {
                    SignSource::Root
                };
                return ResolvedSign::new(sign, source);
            }
            current = node.parent;
        }
        ResolvedSign::new(Sign::Exclude, SignSource::Root)
    }

    /// Effective sign of `op` on node `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` no longer names a node, e.g. after [`clear`](Self::clear).
    pub fn effective_sign(&self, idx: Index, op: Operator) -> Option<Sign> {
        let node = self.node(idx);
        let parent_default = node.parent.and_then(|p| self.default_sign(p));
        let fallback = match op {
            Operator::Member => node
                .parent
                .and_then(|p| self.node(p).state.sign(Operator::Children))
                .or(parent_default),
            _ => parent_default,
        };
        node.state.effective_sign(op, fallback)
    }

    /// Resolved sign of the member of node `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` no longer names a node, e.g. after [`clear`](Self::clear).
    pub fn member_sign(&self, idx: Index) -> ResolvedSign {
        let node = self.node(idx);
        if let Some(sign) = node.state.sign(Operator::Member) {
            return ResolvedSign::new(sign, SignSource::Explicit);
        }
        if let Some(sign) = node.state.descendants_sign() {
            let source = if node.member.is_some() {
                SignSource::Descendants
            } else {
                SignSource::Root
            };
            return ResolvedSign::new(sign, source);
        }
        match node.parent {
            Some(p) => match self.node(p).state.sign(Operator::Children) {
                Some(sign) => ResolvedSign::new(sign, SignSource::Explicit),
                None => self.resolved_default(p),
            },
            None => ResolvedSign::new(Sign::Exclude, SignSource::Root),
        }
    }

    /// Resolved sign shared by the children of node `idx` that have no node.
    pub fn children_sign(&self, idx: Index) -> ResolvedSign {
        match self.node(idx).state.sign(Operator::Children) {
            Some(sign) => ResolvedSign::new(sign, SignSource::Explicit),
            None => self.resolved_default(idx),
        }
    }

    /// Resolved sign shared by the deeper descendants of node `idx` that have no node.
    pub fn descendants_default(&self, idx: Index) -> ResolvedSign {
        self.resolved_default(idx)
    }

    /// Resolved sign of an arbitrary member, ignoring level overrides.
    pub fn resolve(&self, member: &Member) -> ResolvedSign {
        let idx = self.find(member);
        if self.node(idx).member.as_ref() == Some(member) {
            return self.member_sign(idx);
        }
        let is_child = match (self.node(idx).member.as_ref(), member.parent()) {
            (Some(node_member), Some(parent)) => node_member == parent,
            (None, None) => true,
            _ => false,
        };
        if is_child {
            self.children_sign(idx)
        } else {
            self.resolved_default(idx)
        }
    }

    /// Final inclusion of `member`, level overrides applied.
    pub fn is_included(&self, member: &Member) -> bool {
        self.resolve(member)
            .with_level(self.level_sign(member.level()))
            .is_include()
    }

    /// Node indices in pre-order, pseudo-root first.
    pub fn preorder(&self) -> Vec<Index> {
        let mut order = Vec::new();
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            for &child in self.node(idx).children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }

    /// Smallest action list reproducing the whole tree, in sequence order.
    pub fn list_selections(&self) -> Vec<Selection> {
        let mut entries: Vec<(u64, Selection)> = Vec::new();
        for idx in self.preorder() {
            let node = self.node(idx);
            for selection in node.list_selections() {
                entries.push((node.sequence, selection));
            }
        }
        for o in &self.levels {
            entries.push((o.sequence, Selection::level(o.sign, &o.level)));
        }
        entries.sort_by_key(|(sequence, _)| *sequence);
        entries.into_iter().map(|(_, s)| s).collect()
    }

    /// Reset to the initial void state.
    #[instrument(level = "debug", skip(self))]
    pub fn clear(&mut self) {
        let children = std::mem::take(&mut self.arena[self.root].children);
        for child in children {
            self.remove_subtree(child);
        }
        self.arena[self.root].state = MemberSelectionState::with_descendants(Sign::Exclude);
        self.levels.clear();
        self.next_sequence = 1;
        debug!("selection tree cleared");
    }

    fn remove_subtree(&mut self, idx: Index) {
        if let Some(mut node) = self.arena.remove(idx) {
            node.parent = None;
            for child in node.children {
                self.remove_subtree(child);
            }
        }
    }

    /// Number of override nodes, pseudo-root excluded.
    pub fn len(&self) -> usize {
        self.arena.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn to_tree_string(&self) -> Tree<String> {
        fn label(tree: &SelectionTree, idx: Index) -> String {
            let node = tree.node(idx);
            let name = node
                .member
                .as_ref()
                .map(|m| m.name().to_string())
                .unwrap_or_else(|| "(root)".to_string());
            let ops: Vec<String> = [Operator::Member, Operator::Children, Operator::Descendants]
                .iter()
                .filter_map(|&op| node.state.sign(op).map(|s| format!("{} {}", s, op)))
                .collect();
            if ops.is_empty() {
                name
            } else {
                format!("{} [{}]", name, ops.join(", "))
            }
        }

        fn build(tree: &SelectionTree, idx: Index) -> Tree<String> {
            let leaves: Vec<Tree<String>> = tree
                .node(idx)
                .children
                .iter()
                .map(|&c| build(tree, c))
                .collect();
            Tree::new(label(tree, idx)).with_leaves(leaves)
        }

        build(self, self.root)
    }
}
