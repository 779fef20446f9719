//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;

use rstest::fixture;

use seldrill::domain::{
    Evaluator, Expr, Hierarchy, HierarchyBuilder, Member, Operator, Resolution, Selection,
    SelectionTree, Sign,
};

/// Four levels, uneven fan-out:
///
/// ```text
/// All
/// ├── 2024
/// │   ├── Q1 ── Jan, Feb
/// │   └── Q2 ── Apr
/// └── 2025
///     └── Q1 ── Jan
/// ```
#[fixture]
pub fn time() -> Hierarchy {
    let mut builder = HierarchyBuilder::new("Time", ["(All)", "Year", "Quarter", "Month"]);
    for path in [
        "All/2024/Q1/Jan",
        "All/2024/Q1/Feb",
        "All/2024/Q2/Apr",
        "All/2025/Q1/Jan",
    ] {
        builder.add_path(path).expect("add member");
    }
    builder.build()
}

/// Two levels: All with Food and Drink.
#[fixture]
pub fn product() -> Hierarchy {
    let mut builder = HierarchyBuilder::new("Product", ["(All)", "Family"]);
    for path in ["All/Food", "All/Drink"] {
        builder.add_path(path).expect("add member");
    }
    builder.build()
}

pub fn m(hierarchy: &Hierarchy, path: &str) -> Member {
    hierarchy.member(path).expect("known member")
}

pub fn members(hierarchy: &Hierarchy, paths: &[&str]) -> Vec<Member> {
    paths.iter().map(|p| m(hierarchy, p)).collect()
}

/// Members of a single-hierarchy expression, as a set.
pub fn denoted(hierarchy: &Hierarchy, expr: &Expr) -> HashSet<Member> {
    let hierarchies = std::slice::from_ref(hierarchy);
    Evaluator::new(hierarchies)
        .members(expr)
        .expect("evaluate")
        .into_iter()
        .collect()
}

pub fn set_of(hierarchy: &Hierarchy, paths: &[&str]) -> HashSet<Member> {
    members(hierarchy, paths).into_iter().collect()
}

/// Build a selection tree from `(sign, operator, path)` member actions
/// followed by `(sign, level name)` level actions.
pub fn select(
    hierarchy: &Hierarchy,
    actions: &[(Sign, Operator, &str)],
    levels: &[(Sign, &str)],
) -> SelectionTree {
    let mut tree = SelectionTree::new();
    for &(sign, operator, path) in actions {
        tree.apply_basic(&Selection::member(sign, operator, &m(hierarchy, path)));
    }
    for &(sign, name) in levels {
        let level = hierarchy.level_by_name(name).expect("known level");
        tree.apply_basic(&Selection::level(sign, level));
    }
    tree
}

/// Members the resolution is expected to show, straight from the visibility rule.
pub fn oracle(
    hierarchy: &Hierarchy,
    tree: &SelectionTree,
    resolution: Resolution,
    positions: &[Member],
) -> HashSet<Member> {
    hierarchy
        .members()
        .iter()
        .filter(|member| resolution.is_visible(tree, positions, member))
        .cloned()
        .collect()
}
