//! Lazily described member sets.
//!
//! None of these enumerate the hierarchy. They answer containment questions
//! from member structure alone and render themselves as set expressions.

use std::fmt;

use crate::domain::expr::{DescFlag, Expr};
use crate::domain::metadata::{Level, Member};

/// A set of members described by structure rather than enumeration.
pub trait MemberSet: fmt::Debug {
    fn contains(&self, member: &Member) -> bool;

    /// True if `member` or one of its ancestors is in the set.
    fn contains_ancestor_of(&self, member: &Member) -> bool {
        self.contains(member) || member.ancestors().any(|a| self.contains(a))
    }

    fn to_expression(&self) -> Expr;

    /// Take `member` out of the set.
    ///
    /// # Panics
    /// Sets without an exclusion list do not support removal.
    fn remove(&mut self, member: &Member) {
        panic!("{:?} does not support removing {}", self, member);
    }
}

fn is_self_or_ancestor(candidate: &Member, member: &Member) -> bool {
    candidate == member || candidate.is_ancestor_of(member)
}

fn push_unique(list: &mut Vec<Member>, member: &Member) {
    if !list.contains(member) {
        list.push(member.clone());
    }
}

/// Children of `parent` minus an exclusion list.
#[derive(Debug, Clone)]
pub struct ChildrenMemberSet {
    parent: Member,
    excluded: Vec<Member>,
}

impl ChildrenMemberSet {
    pub fn new(parent: &Member) -> Self {
        Self {
            parent: parent.clone(),
            excluded: Vec::new(),
        }
    }

    pub fn parent(&self) -> &Member {
        &self.parent
    }
}

impl MemberSet for ChildrenMemberSet {
    fn contains(&self, member: &Member) -> bool {
        member.parent() == Some(&self.parent) && !self.excluded.contains(member)
    }

    fn to_expression(&self) -> Expr {
        let children = Expr::children(&self.parent);
        if self.excluded.is_empty() {
            children
        } else {
            Expr::except(children, Expr::members(&self.excluded))
        }
    }

    fn remove(&mut self, member: &Member) {
        push_unique(&mut self.excluded, member);
    }
}

/// Children of `parent` that are not in `inner`.
#[derive(Debug, Clone)]
pub struct InverseMemberSet {
    parent: Member,
    inner: CollectionMemberSet,
}

impl InverseMemberSet {
    pub fn new(parent: &Member, inner: CollectionMemberSet) -> Self {
        Self {
            parent: parent.clone(),
            inner,
        }
    }
}

impl MemberSet for InverseMemberSet {
    fn contains(&self, member: &Member) -> bool {
        member.parent() == Some(&self.parent) && !self.inner.contains(member)
    }

    fn to_expression(&self) -> Expr {
        let children = Expr::children(&self.parent);
        if self.inner.is_empty() {
            children
        } else {
            Expr::except(children, self.inner.to_expression())
        }
    }

    fn remove(&mut self, member: &Member) {
        self.inner.add(member);
    }
}

/// Grandchildren of `parent`, skipping the subtrees of excluded children.
#[derive(Debug, Clone)]
pub struct GrandchildrenSet {
    children: ChildrenMemberSet,
}

impl GrandchildrenSet {
    pub fn new(parent: &Member, excluded_children: &[Member]) -> Self {
        let mut children = ChildrenMemberSet::new(parent);
        for child in excluded_children {
            children.remove(child);
        }
        Self { children }
    }
}

impl MemberSet for GrandchildrenSet {
    fn contains(&self, member: &Member) -> bool {
        member.parent().is_some_and(|p| self.children.contains(p))
    }

    fn to_expression(&self) -> Expr {
        if self.children.excluded.is_empty() {
            Expr::descendants(Expr::member(self.children.parent()), 2, DescFlag::SelfOnly)
        } else {
            Expr::descendants(self.children.to_expression(), 1, DescFlag::SelfOnly)
        }
    }
}

/// Members of `level` below `root`, minus the subtrees of excluded members.
#[derive(Debug, Clone)]
pub struct DescendantsSet {
    root: Member,
    level: Level,
    excluded: Vec<Member>,
}

impl DescendantsSet {
    pub fn new(root: &Member, level: &Level) -> Self {
        Self {
            root: root.clone(),
            level: level.clone(),
            excluded: Vec::new(),
        }
    }
}

impl MemberSet for DescendantsSet {
    fn contains(&self, member: &Member) -> bool {
        member.depth() == self.level.depth()
            && is_self_or_ancestor(&self.root, member)
            && !self.excluded.iter().any(|e| is_self_or_ancestor(e, member))
    }

    fn to_expression(&self) -> Expr {
        let all = Expr::descendants_at(Expr::member(&self.root), &self.level);
        if self.excluded.is_empty() {
            all
        } else {
            Expr::except(
                all,
                Expr::descendants_at(Expr::members(&self.excluded), &self.level),
            )
        }
    }

    fn remove(&mut self, member: &Member) {
        push_unique(&mut self.excluded, member);
    }
}

/// Every member of `level`, minus the subtrees of excluded members.
#[derive(Debug, Clone)]
pub struct LevelMemberSet {
    level: Level,
    excluded: Vec<Member>,
}

impl LevelMemberSet {
    pub fn new(level: &Level) -> Self {
        Self {
            level: level.clone(),
            excluded: Vec::new(),
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }
}

impl MemberSet for LevelMemberSet {
    fn contains(&self, member: &Member) -> bool {
        member.level() == &self.level
            && !self.excluded.iter().any(|e| is_self_or_ancestor(e, member))
    }

    fn to_expression(&self) -> Expr {
        let all = Expr::level_members(&self.level);
        if self.excluded.is_empty() {
            all
        } else {
            Expr::except(
                all,
                Expr::descendants_at(Expr::members(&self.excluded), &self.level),
            )
        }
    }

    fn remove(&mut self, member: &Member) {
        push_unique(&mut self.excluded, member);
    }
}

/// Root members of a hierarchy, the children of its synthetic root.
#[derive(Debug, Clone)]
pub struct RootChildren {
    level: Level,
    excluded: Vec<Member>,
}

impl RootChildren {
    /// `level` is the first level of the hierarchy.
    pub fn new(level: &Level) -> Self {
        Self {
            level: level.clone(),
            excluded: Vec::new(),
        }
    }
}

impl MemberSet for RootChildren {
    fn contains(&self, member: &Member) -> bool {
        member.parent().is_none()
            && member.level() == &self.level
            && !self.excluded.contains(member)
    }

    fn to_expression(&self) -> Expr {
        let roots = Expr::level_members(&self.level);
        if self.excluded.is_empty() {
            roots
        } else {
            Expr::except(roots, Expr::members(&self.excluded))
        }
    }

    fn remove(&mut self, member: &Member) {
        push_unique(&mut self.excluded, member);
    }
}

/// An explicit list of members.
#[derive(Debug, Clone, Default)]
pub struct CollectionMemberSet {
    members: Vec<Member>,
}

impl CollectionMemberSet {
    pub fn new(members: Vec<Member>) -> Self {
        Self { members }
    }

    pub fn add(&mut self, member: &Member) {
        push_unique(&mut self.members, member);
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl MemberSet for CollectionMemberSet {
    fn contains(&self, member: &Member) -> bool {
        self.members.contains(member)
    }

    fn to_expression(&self) -> Expr {
        Expr::members(&self.members)
    }

    fn remove(&mut self, member: &Member) {
        self.members.retain(|m| m != member);
    }
}
