//! Selection state: the per-node sign lattice and the override tree.

pub mod state;
pub mod tree;

pub use state::{MemberSelectionState, Operator, Sign};
pub use tree::{
    LevelOverride, ResolvedSign, Selection, SelectionNode, SelectionTarget, SelectionTree,
    SignSource,
};
