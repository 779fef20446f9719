//! Session files: loading, replay and compilation end to end.

use std::fs;
use std::path::PathBuf;

use rstest::rstest;
use tempfile::TempDir;

use seldrill::application::{ApplicationError, Session};
use seldrill::domain::{DomainError, Operator, Resolution, Sign};
use seldrill::util::testing;

const TWO_HIERARCHIES: &str = r#"
[[hierarchy]]
name = "Time"
levels = ["(All)", "Year", "Quarter"]
members = ["All/2024/Q1", "All/2024/Q2", "All/2025/Q1"]

[[hierarchy]]
name = "Product"
levels = ["(All)", "Family"]
members = ["All/Food", "All/Drink"]

[[selection]]
hierarchy = "Time"
sign = "include"
operator = "descendants"
member = "All"

[[selection]]
hierarchy = "Product"
sign = "include"
operator = "descendants"
member = "All"

[[drill]]
position = ["All"]

[[drill]]
position = ["All/2024", "All"]
"#;

fn write_session(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("session.toml");
    fs::write(&path, content).expect("write session");
    path
}

#[rstest]
fn given_two_hierarchy_session_when_compiling_then_nested_drill_crossjoined() {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");
    let path = write_session(&dir, TWO_HIERARCHIES);

    let session = Session::load(&path, Resolution::Driller).expect("load session");

    assert_eq!(
        session.compile().to_string(),
        "Union(CrossJoin(Except(DrilldownMember({[Time].[All]}, {[Time].[All]}, RECURSIVE), \
         {[Time].[All].[2024]}), {[Product].[All]}), \
         CrossJoin({[Time].[All].[2024]}, \
         DrilldownMember({[Product].[All]}, {[Product].[All]}, RECURSIVE)))"
    );
    assert_eq!(session.evaluate().expect("evaluate").len(), 5);
    assert_eq!(session.visible_positions().len(), 2);
}

#[rstest]
fn given_expanded_default_mode_when_loading_then_hierarchies_use_it() {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");
    let path = write_session(&dir, TWO_HIERARCHIES);

    let session = Session::load(&path, Resolution::Expander).expect("load session");

    assert!(session
        .dimensions()
        .iter()
        .all(|d| d.resolution == Resolution::Expander));
}

#[rstest]
fn given_mode_in_file_when_loading_then_overrides_default() {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");
    let content = r#"
[[hierarchy]]
name = "Time"
levels = ["(All)", "Year"]
members = ["All/2024", "All/2025"]
mode = "expanded"

[[selection]]
hierarchy = "Time"
sign = "include"
operator = "descendants"
member = "All"

[[drill]]
position = ["All/2024"]
"#;
    let path = write_session(&dir, content);

    let session = Session::load(&path, Resolution::Driller).expect("load session");

    assert_eq!(session.dimensions()[0].resolution, Resolution::Expander);
    assert_eq!(
        session.compile().to_string(),
        "Except(Union({[Time].[All]}, [Time].[All].Children), \
         Descendants({[Time].[All].[2024]}, 0, AFTER))"
    );
}

#[rstest]
fn given_redundant_history_when_listing_selections_then_minimal() {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");
    let content = r#"
[[hierarchy]]
name = "Time"
levels = ["(All)", "Year"]
members = ["All/2024", "All/2025"]

[[selection]]
hierarchy = "Time"
sign = "include"
operator = "descendants"
member = "All"

[[selection]]
hierarchy = "Time"
sign = "include"
member = "All/2024"

[[selection]]
hierarchy = "Time"
sign = "exclude"
level = "Year"
"#;
    let path = write_session(&dir, content);

    let session = Session::load(&path, Resolution::Driller).expect("load session");
    let selections = session.selections();

    let (hierarchy, actions) = &selections[0];
    assert_eq!(hierarchy.name(), "Time");
    assert_eq!(actions.len(), 2);
    assert_eq!(actions[0].operator, Operator::Descendants);
    assert_eq!(actions[1].sign, Sign::Exclude);
}

#[rstest]
fn given_session_when_selecting_programmatically_then_compile_reflects_change() {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");
    let path = write_session(&dir, TWO_HIERARCHIES);
    let mut session = Session::load(&path, Resolution::Driller).expect("load session");
    let position = session
        .position(&["All/2024".to_string(), "All".to_string()])
        .expect("position");

    session.drills_mut().remove(&position);

    assert_eq!(
        session.compile().to_string(),
        "CrossJoin(DrilldownMember({[Time].[All]}, {[Time].[All]}, RECURSIVE), {[Product].[All]})"
    );
    assert!(session.selection_mut("Nope").is_err());
}

#[rstest]
fn given_missing_file_when_loading_then_read_error() {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");

    let result = Session::load(&dir.path().join("absent.toml"), Resolution::Driller);

    assert!(matches!(result, Err(ApplicationError::SessionRead { .. })));
}

#[rstest]
#[case::bad_toml("[[hierarchy]\nname = ")]
#[case::bad_sign(
    "[[hierarchy]]\nname = \"T\"\nlevels = [\"L\"]\n\
     [[selection]]\nhierarchy = \"T\"\nsign = \"maybe\"\nmember = \"A\"\n"
)]
fn given_malformed_file_when_loading_then_parse_error(#[case] content: &str) {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");
    let path = write_session(&dir, content);

    let result = Session::load(&path, Resolution::Driller);

    assert!(matches!(result, Err(ApplicationError::SessionParse { .. })));
}

#[rstest]
fn given_unknown_member_when_loading_then_domain_error() {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");
    let content = r#"
[[hierarchy]]
name = "Time"
levels = ["(All)", "Year"]
members = ["All/2024"]

[[selection]]
hierarchy = "Time"
sign = "include"
member = "All/1999"
"#;
    let path = write_session(&dir, content);

    let result = Session::load(&path, Resolution::Driller);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::UnknownMember { .. }))
    ));
}

#[rstest]
fn given_duplicate_hierarchy_names_when_loading_then_domain_error() {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");
    let content = r#"
[[hierarchy]]
name = "Time"
levels = ["(All)", "Year"]
members = ["All/2024"]

[[hierarchy]]
name = "Time"
levels = ["(All)", "Year"]
members = ["All/2030"]

[[selection]]
hierarchy = "Time"
sign = "include"
operator = "descendants"
member = "All"
"#;
    let path = write_session(&dir, content);

    let result = Session::load(&path, Resolution::Driller);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::DuplicateHierarchy(name))) if name == "Time"
    ));
}

#[rstest]
fn given_selection_with_member_and_level_when_loading_then_invalid_selection() {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");
    let content = r#"
[[hierarchy]]
name = "Time"
levels = ["(All)", "Year"]
members = ["All/2024"]

[[selection]]
hierarchy = "Time"
sign = "include"
member = "All"
level = "Year"
"#;
    let path = write_session(&dir, content);

    let result = Session::load(&path, Resolution::Driller);

    assert!(matches!(
        result,
        Err(ApplicationError::InvalidSelection { index: 0, .. })
    ));
}

#[rstest]
fn given_position_longer_than_axis_when_loading_then_malformed_position() {
    testing::init_test_setup();
    let dir = TempDir::new().expect("temp dir");
    let content = r#"
[[hierarchy]]
name = "Time"
levels = ["(All)", "Year"]
members = ["All/2024"]

[[drill]]
position = ["All", "All/2024"]
"#;
    let path = write_session(&dir, content);

    let result = Session::load(&path, Resolution::Driller);

    assert!(matches!(
        result,
        Err(ApplicationError::Domain(DomainError::MalformedPosition { .. }))
    ));
}
