//! Drill trie bookkeeping and whole-axis compilation.

mod common;

use std::collections::HashSet;

use rstest::rstest;

use common::{m, members, product, time};
use seldrill::domain::{
    AxisDimension, DrillTree, DrillVisitor, Evaluator, Hierarchy, Member, Operator, Resolution,
    Selection, SelectionTree,
};
use seldrill::util::testing;

fn include_all(hierarchy: &Hierarchy) -> SelectionTree {
    let mut tree = SelectionTree::new();
    tree.apply_basic(&Selection::include(
        Operator::Descendants,
        &m(hierarchy, "All"),
    ));
    tree
}

#[rstest]
#[case(&["All"][..], &[][..])]
#[case(&["All/2024"][..], &["All/Food"][..])]
#[case(&["All/2025/Q1"][..], &["All"][..])]
fn given_position_when_added_then_drilled_until_removed(
    time: Hierarchy,
    product: Hierarchy,
    #[case] time_paths: &[&str],
    #[case] product_paths: &[&str],
) {
    testing::init_test_setup();
    let mut position = members(&time, time_paths);
    position.extend(members(&product, product_paths));
    let mut drills = DrillTree::new();

    drills.add(&position);
    assert!(drills.is_drilled(&position));
    assert_eq!(drills.positions(), vec![position.clone()]);

    drills.remove(&position);
    assert!(!drills.is_drilled(&position));
    assert!(drills.positions().is_empty());
}

#[rstest]
fn given_positions_of_several_lengths_when_pruning_then_only_short_ones_remain(
    time: Hierarchy,
    product: Hierarchy,
) {
    testing::init_test_setup();
    let all = m(&time, "All");
    let year = m(&time, "All/2024");
    let food = m(&product, "All/Food");
    let mut drills = DrillTree::new();
    drills.add(&[all.clone()]);
    drills.add(&[year.clone()]);
    drills.add(&[year.clone(), food.clone()]);
    drills.add(&[all.clone(), m(&product, "All")]);

    drills.prune(1);

    assert_eq!(drills.positions(), vec![vec![all.clone()], vec![year.clone()]]);
    assert!(!drills.is_drilled(&[year, food]));
}

#[rstest]
fn given_positions_when_clearing_then_nothing_drilled(time: Hierarchy) {
    testing::init_test_setup();
    let mut drills = DrillTree::new();
    drills.add(&members(&time, &["All"]));
    drills.add(&members(&time, &["All/2024"]));

    drills.clear();

    assert!(drills.positions().is_empty());
    assert!(drills.drilled_at(&[]).is_empty());
}

#[rstest]
fn given_visitor_refusing_a_branch_when_visiting_then_branch_skipped(
    time: Hierarchy,
    product: Hierarchy,
) {
    struct Paths {
        skip: Member,
        seen: Vec<Vec<Member>>,
    }
    impl DrillVisitor for Paths {
        fn visit(&mut self, path: &[Member], _drilled: &[Member]) {
            self.seen.push(path.to_vec());
        }

        fn descend(&mut self, _path: &[Member], child: &Member) -> bool {
            child != &self.skip
        }
    }

    testing::init_test_setup();
    let y2024 = m(&time, "All/2024");
    let y2025 = m(&time, "All/2025");
    let family = m(&product, "All");
    let mut drills = DrillTree::new();
    drills.add(&[y2024.clone(), family.clone()]);
    drills.add(&[y2025.clone(), family]);
    let mut visitor = Paths {
        skip: y2025,
        seen: Vec::new(),
    };

    drills.visit(&mut visitor);

    assert_eq!(visitor.seen, vec![vec![], vec![y2024]]);
}

#[rstest]
fn given_one_collapsed_dimension_when_compiling_then_drilldown_of_root(time: Hierarchy) {
    testing::init_test_setup();
    let selection = include_all(&time);
    let dimensions = [AxisDimension::new(
        &selection,
        time.levels(),
        Resolution::Driller,
    )];
    let mut drills = DrillTree::new();

    let collapsed = drills.compile_axis_expression(&dimensions);
    drills.add(&[m(&time, "All")]);
    let drilled = drills.compile_axis_expression(&dimensions);

    assert_eq!(collapsed.to_string(), "{[Time].[All]}");
    assert_eq!(
        drilled.to_string(),
        "DrilldownMember({[Time].[All]}, {[Time].[All]}, RECURSIVE)"
    );
}

#[rstest]
fn given_empty_selection_when_compiling_then_empty_set(time: Hierarchy) {
    testing::init_test_setup();
    let selection = SelectionTree::new();
    let dimensions = [AxisDimension::new(
        &selection,
        time.levels(),
        Resolution::Driller,
    )];

    let expression = DrillTree::new().compile_axis_expression(&dimensions);

    assert!(expression.is_empty_set());
}

#[rstest]
fn given_two_dimensions_with_nested_drill_when_compiling_then_prefix_term_added(
    time: Hierarchy,
    product: Hierarchy,
) {
    testing::init_test_setup();
    let time_selection = include_all(&time);
    let product_selection = include_all(&product);
    let dimensions = [
        AxisDimension::new(&time_selection, time.levels(), Resolution::Driller),
        AxisDimension::new(&product_selection, product.levels(), Resolution::Driller),
    ];
    let mut drills = DrillTree::new();
    drills.add(&[m(&time, "All")]);
    drills.add(&[m(&time, "All/2024"), m(&product, "All")]);

    let expression = drills.compile_axis_expression(&dimensions);

    assert_eq!(
        expression.to_string(),
        "Union(CrossJoin(Except(DrilldownMember({[Time].[All]}, {[Time].[All]}, RECURSIVE), \
         {[Time].[All].[2024]}), {[Product].[All]}), \
         CrossJoin({[Time].[All].[2024]}, \
         DrilldownMember({[Product].[All]}, {[Product].[All]}, RECURSIVE)))"
    );

    let hierarchies = [time, product];
    let tuples: HashSet<Vec<Member>> = Evaluator::new(&hierarchies)
        .evaluate(&expression)
        .expect("evaluate")
        .into_iter()
        .collect();
    let (time, product) = (&hierarchies[0], &hierarchies[1]);
    let expected: HashSet<Vec<Member>> = [
        ("All", "All"),
        ("All/2025", "All"),
        ("All/2024", "All"),
        ("All/2024", "All/Food"),
        ("All/2024", "All/Drink"),
    ]
    .into_iter()
    .map(|(t, p)| vec![m(time, t), m(product, p)])
    .collect();
    assert_eq!(tuples, expected);
}

#[rstest]
fn given_nested_drill_below_hidden_member_when_compiling_then_ignored(
    time: Hierarchy,
    product: Hierarchy,
) {
    testing::init_test_setup();
    let time_selection = include_all(&time);
    let product_selection = include_all(&product);
    let dimensions = [
        AxisDimension::new(&time_selection, time.levels(), Resolution::Driller),
        AxisDimension::new(&product_selection, product.levels(), Resolution::Driller),
    ];
    let mut drills = DrillTree::new();
    drills.add(&[m(&time, "All/2024"), m(&product, "All")]);

    let expression = drills.compile_axis_expression(&dimensions);

    assert_eq!(
        expression.to_string(),
        "{([Time].[All], [Product].[All])}"
    );
    assert!(drills.visible_positions(&dimensions).is_empty());
}

#[rstest]
fn given_recorded_positions_when_listing_visible_then_hidden_ones_skipped(time: Hierarchy) {
    testing::init_test_setup();
    let selection = include_all(&time);
    let dimensions = [AxisDimension::new(
        &selection,
        time.levels(),
        Resolution::Driller,
    )];
    let all = m(&time, "All");
    let year = m(&time, "All/2024");
    let quarter = m(&time, "All/2025/Q1");
    let mut drills = DrillTree::new();
    drills.add(&[all.clone()]);
    drills.add(&[year.clone()]);
    drills.add(&[quarter]);

    let visible = drills.visible_positions(&dimensions);

    assert_eq!(visible, vec![vec![all], vec![year]]);
}
