//! Selection and drill resolution for hierarchical dimensions.
//!
//! A [`domain::SelectionTree`] records include/exclude actions on members,
//! their children, their descendants and whole levels. A
//! [`domain::DrillTree`] records which axis positions are drilled. Both
//! compile into one set expression per axis via the resolution strategies
//! in [`domain::resolver`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;

pub use application::{ApplicationError, ApplicationResult, Session};
pub use config::Settings;
pub use domain::{
    AxisDimension, AxisExpression, DomainError, DrillTree, Expr, Hierarchy, HierarchyBuilder,
    Member, Operator, Resolution, Selection, SelectionTree, Sign,
};
