//! Expanded hierarchies: recorded positions are undrills.

mod common;

use rstest::rstest;

use common::{denoted, m, members, oracle, select, set_of, time};
use seldrill::domain::{
    AxisDimension, DrillPool, Hierarchy, Operator, Resolution, SelectionTree, Sign,
};
use seldrill::util::testing;

use Operator::{Children, Descendants, Member};
use Sign::{Exclude, Include};

fn compile(hierarchy: &Hierarchy, tree: &SelectionTree, undrills: &[&str]) -> String {
    let positions = members(hierarchy, undrills);
    AxisDimension::new(tree, hierarchy.levels(), Resolution::Expander)
        .resolve(&positions)
        .get_expression()
        .to_string()
}

#[rstest]
fn given_empty_selection_when_resolving_then_empty_set(time: Hierarchy) {
    testing::init_test_setup();

    assert_eq!(compile(&time, &SelectionTree::new(), &[]), "{}");
}

#[rstest]
fn given_everything_included_when_resolving_then_single_descendants_call(time: Hierarchy) {
    testing::init_test_setup();
    let tree = select(&time, &[(Include, Descendants, "All")], &[]);

    assert_eq!(
        compile(&time, &tree, &[]),
        "Descendants([Time].[All], 0, SELF_AND_AFTER)"
    );
}

#[rstest]
fn given_root_and_years_excluded_when_undrilling_quarter_then_deeper_levels_minus_collapsed(
    time: Hierarchy,
) {
    testing::init_test_setup();
    let tree = select(
        &time,
        &[
            (Include, Descendants, "All"),
            (Exclude, Member, "All"),
            (Exclude, Children, "All"),
            (Include, Member, "All/2024/Q1"),
        ],
        &[],
    );

    assert_eq!(
        compile(&time, &tree, &["All/2024/Q1"]),
        "Except(Descendants([Time].[All], 2, SELF_AND_AFTER), \
         Descendants({[Time].[All].[2024].[Q1]}, 0, AFTER))"
    );
}

#[rstest]
fn given_level_excluded_when_resolving_then_level_set_subtracted(time: Hierarchy) {
    testing::init_test_setup();
    let tree = select(
        &time,
        &[(Include, Descendants, "All")],
        &[(Exclude, "Quarter")],
    );

    assert_eq!(
        compile(&time, &tree, &[]),
        "Except(Descendants([Time].[All], 0, SELF_AND_AFTER), [Time].[Quarter].Members)"
    );
}

#[rstest]
fn given_undrill_of_excluded_member_when_resolving_then_left_in_pool(time: Hierarchy) {
    testing::init_test_setup();
    let tree = select(
        &time,
        &[(Include, Descendants, "All"), (Exclude, Member, "All/2024")],
        &[],
    );
    let year = m(&time, "All/2024");
    let mut pool = DrillPool::new(vec![year.clone()]);

    let axis = Resolution::Expander.execute(&tree, time.levels(), &mut pool);

    assert_eq!(pool.remaining(), &[year]);
    assert!(axis.undrilled().is_empty());
}

#[rstest]
fn given_nested_undrills_in_one_region_when_resolving_then_outermost_kept(time: Hierarchy) {
    testing::init_test_setup();
    let tree = select(&time, &[(Include, Descendants, "All")], &[]);
    let mut pool = DrillPool::new(members(&time, &["All/2024/Q1", "All/2024"]));

    let axis = Resolution::Expander.execute(&tree, time.levels(), &mut pool);

    assert_eq!(axis.undrilled(), members(&time, &["All/2024"]).as_slice());
    assert!(pool.is_empty());
}

#[rstest]
#[case::everything(
    &[(Include, Descendants, "All")], &[], &[],
    &["All", "All/2024", "All/2024/Q1", "All/2024/Q1/Jan", "All/2024/Q1/Feb",
      "All/2024/Q2", "All/2024/Q2/Apr", "All/2025", "All/2025/Q1", "All/2025/Q1/Jan"]
)]
#[case::year_collapsed(
    &[(Include, Descendants, "All")], &[], &["All/2024"],
    &["All", "All/2024", "All/2025", "All/2025/Q1", "All/2025/Q1/Jan"]
)]
#[case::nested_collapse(
    &[(Include, Descendants, "All")], &[], &["All/2024", "All/2024/Q1"],
    &["All", "All/2024", "All/2025", "All/2025/Q1", "All/2025/Q1/Jan"]
)]
#[case::excluded_subtree_with_member_back_in(
    &[(Include, Descendants, "All"), (Exclude, Descendants, "All/2024"),
      (Include, Member, "All/2024/Q2")],
    &[], &[],
    &["All", "All/2024/Q2", "All/2025", "All/2025/Q1", "All/2025/Q1/Jan"]
)]
#[case::excluded_level(
    &[(Include, Descendants, "All")], &[(Exclude, "Quarter")], &["All/2025"],
    &["All", "All/2024", "All/2024/Q1/Jan", "All/2024/Q1/Feb", "All/2024/Q2/Apr", "All/2025"]
)]
#[case::included_level_collapsed(
    &[], &[(Include, "Quarter")], &["All/2024/Q1"],
    &["All/2024/Q1", "All/2024/Q2", "All/2025/Q1"]
)]
#[case::explicit_member_cut_from_level(
    &[(Include, Descendants, "All"), (Exclude, Member, "All/2025")], &[(Include, "Year")], &[],
    &["All", "All/2024", "All/2024/Q1", "All/2024/Q1/Jan", "All/2024/Q1/Feb",
      "All/2024/Q2", "All/2024/Q2/Apr", "All/2025/Q1", "All/2025/Q1/Jan"]
)]
#[case::children_only(
    &[(Include, Children, "All")], &[], &["All/2025"],
    &["All/2024", "All/2025"]
)]
#[case::excluded_member_undrilled(
    &[(Include, Descendants, "All"), (Exclude, Member, "All/2024")], &[], &["All/2024"],
    &["All", "All/2024/Q1", "All/2024/Q1/Jan", "All/2024/Q1/Feb",
      "All/2024/Q2", "All/2024/Q2/Apr", "All/2025", "All/2025/Q1", "All/2025/Q1/Jan"]
)]
fn given_selection_and_undrills_when_resolving_then_denotes_visible_members(
    time: Hierarchy,
    #[case] actions: &[(Sign, Operator, &str)],
    #[case] levels: &[(Sign, &str)],
    #[case] undrills: &[&str],
    #[case] expected: &[&str],
) {
    testing::init_test_setup();
    let tree = select(&time, actions, levels);
    let positions = members(&time, undrills);

    let expression = AxisDimension::new(&tree, time.levels(), Resolution::Expander)
        .resolve(&positions)
        .get_expression();

    let shown = denoted(&time, &expression);
    assert_eq!(shown, set_of(&time, expected), "{}", expression);
    assert_eq!(
        shown,
        oracle(&time, &tree, Resolution::Expander, &positions),
        "{}",
        expression
    );
}
