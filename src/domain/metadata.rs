//! Read-only hierarchy metadata: members, levels and hierarchies.
//!
//! Members and levels are cheap reference-counted handles. Identity is the
//! unique name, so handles can be used as map and set keys.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};

#[derive(Debug)]
struct LevelData {
    name: String,
    unique_name: String,
    hierarchy: String,
    depth: usize,
}

/// A level of a hierarchy, identified by its depth in the ordered level list.
#[derive(Clone)]
pub struct Level(Arc<LevelData>);

impl Level {
    fn new(hierarchy: &str, name: &str, depth: usize) -> Self {
        Self(Arc::new(LevelData {
            name: name.to_string(),
            unique_name: format!("[{}].[{}]", hierarchy, name),
            hierarchy: hierarchy.to_string(),
            depth,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn unique_name(&self) -> &str {
        &self.0.unique_name
    }

    /// Name of the owning hierarchy.
    pub fn hierarchy(&self) -> &str {
        &self.0.hierarchy
    }

    pub fn depth(&self) -> usize {
        self.0.depth
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        self.0.unique_name == other.0.unique_name
    }
}

impl Eq for Level {}

impl Hash for Level {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.unique_name.hash(state);
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level({})", self.0.unique_name)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.unique_name)
    }
}

#[derive(Debug)]
struct MemberData {
    name: String,
    unique_name: String,
    path: String,
    parent: Option<Member>,
    level: Level,
    depth: usize,
}

/// A member of a hierarchy with a weak structural link to its parent.
#[derive(Clone)]
pub struct Member(Arc<MemberData>);

impl Member {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn unique_name(&self) -> &str {
        &self.0.unique_name
    }

    /// Slash separated path from the hierarchy root, e.g. `All/2024/Q1`.
    pub fn path(&self) -> &str {
        &self.0.path
    }

    pub fn parent(&self) -> Option<&Member> {
        self.0.parent.as_ref()
    }

    pub fn level(&self) -> &Level {
        &self.0.level
    }

    /// Number of ancestors.
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    pub fn hierarchy(&self) -> &str {
        self.0.level.hierarchy()
    }

    /// Proper ancestors, nearest first.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Ancestor chain from the hierarchy root down to and including `self`.
    pub fn path_from_root(&self) -> Vec<Member> {
        let mut path: Vec<Member> = self.ancestors().cloned().collect();
        path.reverse();
        path.push(self.clone());
        path
    }

    /// True if `self` is a proper ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Member) -> bool {
        self.depth() < other.depth() && other.ancestors().any(|a| a == self)
    }

    /// The ancestor-or-self of `self` at `depth`, if `depth` is not deeper than `self`.
    pub fn ancestor_at_depth(&self, depth: usize) -> Option<&Member> {
        if depth > self.depth() {
            return None;
        }
        let mut current = self;
        while current.depth() > depth {
            current = current.parent()?;
        }
        Some(current)
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.unique_name == other.0.unique_name
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.unique_name.hash(state);
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Member({})", self.0.unique_name)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.unique_name)
    }
}

pub struct Ancestors<'a> {
    next: Option<&'a Member>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Member;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

/// An immutable hierarchy: ordered levels plus the member graph.
#[derive(Debug)]
pub struct Hierarchy {
    name: String,
    levels: Vec<Level>,
    members: Vec<Member>,
    by_path: HashMap<String, usize>,
    children: HashMap<String, Vec<Member>>,
}

impl Hierarchy {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unique_name(&self) -> String {
        format!("[{}]", self.name)
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, depth: usize) -> Option<&Level> {
        self.levels.get(depth)
    }

    pub fn level_by_name(&self, name: &str) -> DomainResult<&Level> {
        self.levels
            .iter()
            .find(|l| l.name() == name)
            .ok_or_else(|| DomainError::UnknownLevel {
                hierarchy: self.name.clone(),
                level: name.to_string(),
            })
    }

    /// Members without a parent, in insertion order.
    pub fn roots(&self) -> Vec<Member> {
        self.members
            .iter()
            .filter(|m| m.parent().is_none())
            .cloned()
            .collect()
    }

    /// All members in insertion order (parents always precede children).
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn children(&self, member: &Member) -> &[Member] {
        self.children
            .get(member.unique_name())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look a member up by its slash separated path.
    pub fn member(&self, path: &str) -> DomainResult<Member> {
        self.by_path
            .get(path.trim_matches('/'))
            .map(|&idx| self.members[idx].clone())
            .ok_or_else(|| DomainError::UnknownMember {
                hierarchy: self.name.clone(),
                path: path.to_string(),
            })
    }
}

/// Builds a [`Hierarchy`] level by level and member by member.
#[derive(Debug)]
pub struct HierarchyBuilder {
    name: String,
    levels: Vec<Level>,
    members: Vec<Member>,
    by_path: HashMap<String, usize>,
}

impl HierarchyBuilder {
    pub fn new<I, S>(name: &str, level_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let levels = level_names
            .into_iter()
            .enumerate()
            .map(|(depth, level)| Level::new(name, level.as_ref(), depth))
            .collect();
        Self {
            name: name.to_string(),
            levels,
            members: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Add a member below `parent` (or as a root member). Names must be
    /// non-empty and free of `/`.
    #[instrument(level = "trace", skip(self, parent))]
    pub fn add(&mut self, parent: Option<&Member>, name: &str) -> DomainResult<Member> {
        if let Some(p) = parent.filter(|p| p.hierarchy() != self.name) {
            return Err(DomainError::ForeignMember {
                member: p.unique_name().to_string(),
                hierarchy: self.name.clone(),
            });
        }
        if name.is_empty() || name.contains('/') {
            return Err(DomainError::InvalidMemberName {
                hierarchy: self.name.clone(),
                name: name.to_string(),
            });
        }
        let depth = parent.map(|p| p.depth() + 1).unwrap_or(0);
        let level = self
            .levels
            .get(depth)
            .cloned()
            .ok_or_else(|| DomainError::LevelOutOfRange {
                hierarchy: self.name.clone(),
                depth,
            })?;
        let path = match parent {
            Some(p) => format!("{}/{}", p.path(), name),
            None => name.to_string(),
        };
        if self.by_path.contains_key(&path) {
            return Err(DomainError::DuplicateMember(path));
        }
        let unique_name = match parent {
            Some(p) => format!("{}.[{}]", p.unique_name(), name),
            None => format!("[{}].[{}]", self.name, name),
        };
        let member = Member(Arc::new(MemberData {
            name: name.to_string(),
            unique_name,
            path: path.clone(),
            parent: parent.cloned(),
            level,
            depth,
        }));
        self.by_path.insert(path, self.members.len());
        self.members.push(member.clone());
        Ok(member)
    }

    /// Add a member by path, creating missing ancestors on the way.
    pub fn add_path(&mut self, path: &str) -> DomainResult<Member> {
        let mut parent: Option<Member> = None;
        let mut current = String::new();
        for segment in path.trim_matches('/').split('/') {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            let member = match self.by_path.get(&current) {
                Some(&idx) => self.members[idx].clone(),
                None => self.add(parent.as_ref(), segment)?,
            };
            parent = Some(member);
        }
        parent.ok_or_else(|| DomainError::UnknownMember {
            hierarchy: self.name.clone(),
            path: path.to_string(),
        })
    }

    pub fn build(self) -> Hierarchy {
        let mut children: HashMap<String, Vec<Member>> = HashMap::new();
        for member in &self.members {
            if let Some(parent) = member.parent() {
                children
                    .entry(parent.unique_name().to_string())
                    .or_default()
                    .push(member.clone());
            }
        }
        Hierarchy {
            name: self.name,
            levels: self.levels,
            members: self.members,
            by_path: self.by_path,
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time() -> Hierarchy {
        let mut builder = HierarchyBuilder::new("Time", ["(All)", "Year", "Quarter"]);
        builder.add_path("All/2024/Q1").unwrap();
        builder.add_path("All/2024/Q2").unwrap();
        builder.add_path("All/2025/Q1").unwrap();
        builder.build()
    }

    #[test]
    fn given_paths_when_building_then_ancestors_are_shared() {
        let h = time();
        let q1 = h.member("All/2024/Q1").unwrap();
        let q2 = h.member("All/2024/Q2").unwrap();
        assert_eq!(q1.parent(), q2.parent());
        assert_eq!(q1.depth(), 2);
        assert_eq!(q1.level().name(), "Quarter");
        assert_eq!(q1.unique_name(), "[Time].[All].[2024].[Q1]");
        assert_eq!(h.roots().len(), 1);
        assert_eq!(h.members().len(), 6);
    }

    #[test]
    fn given_member_when_walking_ancestors_then_nearest_first() {
        let h = time();
        let q1 = h.member("All/2025/Q1").unwrap();
        let names: Vec<&str> = q1.ancestors().map(|m| m.name()).collect();
        assert_eq!(names, vec!["2025", "All"]);
        let all = h.member("All").unwrap();
        assert!(all.is_ancestor_of(&q1));
        assert!(!q1.is_ancestor_of(&q1));
        assert_eq!(q1.ancestor_at_depth(1).map(|m| m.name()), Some("2025"));
    }

    #[test]
    fn given_too_deep_member_when_adding_then_level_out_of_range() {
        let mut builder = HierarchyBuilder::new("Time", ["(All)"]);
        let all = builder.add(None, "All").unwrap();
        let err = builder.add(Some(&all), "2024").unwrap_err();
        assert!(matches!(err, DomainError::LevelOutOfRange { depth: 1, .. }));
    }

    #[test]
    fn given_unknown_path_when_looking_up_then_error() {
        let h = time();
        assert!(matches!(
            h.member("All/1999"),
            Err(DomainError::UnknownMember { .. })
        ));
    }

    #[test]
    fn given_parent_from_other_hierarchy_when_adding_then_foreign_member() {
        let mut other = HierarchyBuilder::new("Product", ["(All)", "Family"]);
        let all = other.add(None, "All").unwrap();
        let mut builder = HierarchyBuilder::new("Time", ["(All)", "Year"]);
        assert!(matches!(
            builder.add(Some(&all), "2024"),
            Err(DomainError::ForeignMember { .. })
        ));
    }

    #[test]
    fn given_empty_or_slashed_name_when_adding_then_invalid_member_name() {
        let mut builder = HierarchyBuilder::new("Time", ["(All)", "Year"]);
        assert!(matches!(
            builder.add_path(""),
            Err(DomainError::InvalidMemberName { .. })
        ));
        assert!(matches!(
            builder.add_path("All//2024"),
            Err(DomainError::InvalidMemberName { .. })
        ));
        let all = builder.add_path("All").unwrap();
        assert!(matches!(
            builder.add(Some(&all), "20/24"),
            Err(DomainError::InvalidMemberName { name, .. }) if name == "20/24"
        ));
        assert_eq!(builder.build().members().len(), 1);
    }
}
