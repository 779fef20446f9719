//! Application layer: session files and use cases
//!
//! This layer reads session files and drives the domain layer.

pub mod error;
pub mod session;

pub use error::{ApplicationError, ApplicationResult};
pub use session::{Dimension, DrillSpec, HierarchySpec, SelectionSpec, Session, SessionFile};
