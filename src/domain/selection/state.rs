//! Per-node include/exclude bookkeeping.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Include or exclude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Include,
    Exclude,
}

impl Sign {
    pub fn opposite(self) -> Self {
        match self {
            Sign::Include => Sign::Exclude,
            Sign::Exclude => Sign::Include,
        }
    }

    pub fn is_include(self) -> bool {
        self == Sign::Include
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Include => write!(f, "include"),
            Sign::Exclude => write!(f, "exclude"),
        }
    }
}

/// Granularity of a selection action.
///
/// `Ancestors` and `Siblings` are accepted but have no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Member,
    Children,
    /// Member and children with one action
    MemberAndChildren,
    Descendants,
    Ancestors,
    Siblings,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Member => "member",
            Operator::Children => "children",
            Operator::MemberAndChildren => "member_and_children",
            Operator::Descendants => "descendants",
            Operator::Ancestors => "ancestors",
            Operator::Siblings => "siblings",
        };
        write!(f, "{}", name)
    }
}

/// Signs recorded on one selection node.
///
/// At most one sign is recorded per operator. A recorded `Descendants` sign
/// is the default for `Member` and `Children`; those two are only stored
/// when they differ from that default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberSelectionState {
    include: BTreeSet<Operator>,
    exclude: BTreeSet<Operator>,
}

impl MemberSelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a node whose descendants default to `sign`.
    pub fn with_descendants(sign: Sign) -> Self {
        let mut state = Self::new();
        state.apply(sign, Operator::Descendants, None);
        state
    }

    fn set_mut(&mut self, sign: Sign) -> &mut BTreeSet<Operator> {
        match sign {
            Sign::Include => &mut self.include,
            Sign::Exclude => &mut self.exclude,
        }
    }

    /// Record `sign` for `op`.
    ///
    /// `inherited` is the sign `op` resolves to when nothing is recorded on
    /// this node (see [`Self::effective_sign`]).
    pub fn apply(&mut self, sign: Sign, op: Operator, inherited: Option<Sign>) {
        match op {
            Operator::Descendants => {
                self.include.clear();
                self.exclude.clear();
                self.set_mut(sign).insert(Operator::Descendants);
            }
            Operator::Member | Operator::Children => {
                let default = self.descendants_sign().or(inherited);
                self.include.remove(&op);
                self.exclude.remove(&op);
                if default != Some(sign) {
                    self.set_mut(sign).insert(op);
                } else {
                    trace!(%op, %sign, "redundant with default, not recorded");
                }
            }
            Operator::MemberAndChildren => {
                self.apply(sign, Operator::Member, inherited);
                self.apply(sign, Operator::Children, inherited);
            }
            Operator::Ancestors | Operator::Siblings => {
                trace!(%op, "operator has no effect");
            }
        }
    }

    /// Explicitly recorded sign for `op`, without any fallback.
    pub fn sign(&self, op: Operator) -> Option<Sign> {
        if self.include.contains(&op) {
            Some(Sign::Include)
        } else if self.exclude.contains(&op) {
            Some(Sign::Exclude)
        } else {
            None
        }
    }

    pub fn descendants_sign(&self) -> Option<Sign> {
        self.sign(Operator::Descendants)
    }

    /// Sign for `op` on this node.
    ///
    /// `Member` and `Children` fall back to the local `Descendants` sign,
    /// then to `fallback`.
    pub fn effective_sign(&self, op: Operator, fallback: Option<Sign>) -> Option<Sign> {
        match op {
            Operator::Member | Operator::Children => self
                .sign(op)
                .or_else(|| self.descendants_sign())
                .or(fallback),
            Operator::Descendants => self.descendants_sign().or(fallback),
            _ => fallback,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    pub fn clear(&mut self) {
        self.include.clear();
        self.exclude.clear();
    }
}
