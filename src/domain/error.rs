//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent lookups or inputs that do not match the
/// hierarchy metadata. The resolution algorithms themselves never fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unknown hierarchy: {0}")]
    UnknownHierarchy(String),

    #[error("duplicate hierarchy: {0}")]
    DuplicateHierarchy(String),

    #[error("invalid member name '{name}' in hierarchy {hierarchy}")]
    InvalidMemberName { hierarchy: String, name: String },

    #[error("unknown member '{path}' in hierarchy {hierarchy}")]
    UnknownMember { hierarchy: String, path: String },

    #[error("unknown level '{level}' in hierarchy {hierarchy}")]
    UnknownLevel { hierarchy: String, level: String },

    #[error("hierarchy {hierarchy} has no level at depth {depth}")]
    LevelOutOfRange { hierarchy: String, depth: usize },

    #[error("duplicate member: {0}")]
    DuplicateMember(String),

    #[error("member {member} does not belong to hierarchy {hierarchy}")]
    ForeignMember { member: String, hierarchy: String },

    #[error("malformed drill position: {message}")]
    MalformedPosition { message: String },

    #[error("cannot evaluate expression: {message}")]
    Evaluation { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
