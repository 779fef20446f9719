//! Domain layer: metadata, selection and drill state, and their resolution
//! into query expressions.
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod axis;
pub mod builder;
pub mod drill;
pub mod error;
pub mod eval;
pub mod expr;
pub mod member_set;
pub mod metadata;
pub mod resolver;
pub mod selection;

pub use axis::AxisExpression;
pub use builder::{CrossJoinBuilder, UnionBuilder};
pub use drill::{DrillTree, DrillVisitor};
pub use error::{DomainError, DomainResult};
pub use eval::{Evaluator, Tuple};
pub use expr::{Call, DescFlag, Expr, Syntax};
pub use member_set::{
    ChildrenMemberSet, CollectionMemberSet, DescendantsSet, GrandchildrenSet, InverseMemberSet,
    LevelMemberSet, MemberSet, RootChildren,
};
pub use metadata::{Hierarchy, HierarchyBuilder, Level, Member};
pub use resolver::{AxisDimension, DrillPool, Resolution};
pub use selection::{
    LevelOverride, MemberSelectionState, Operator, ResolvedSign, Selection, SelectionTarget,
    SelectionTree, Sign, SignSource,
};
