//! Normalizing builders for union and crossjoin expressions.

use tracing::trace;

use crate::domain::expr::{Call, Expr, Syntax};
use crate::domain::metadata::Member;

/// Collects set expressions into one union.
///
/// Member references and brace sets of members are merged into a single
/// brace set; everything else is folded with binary `Union` calls.
/// Duplicates are not removed.
#[derive(Debug, Default, Clone)]
pub struct UnionBuilder {
    members: Vec<Member>,
    others: Vec<Expr>,
}

impl UnionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Expr) {
        match node {
            Expr::Member(m) => self.members.push(m),
            Expr::Call(call) if call.syntax == Syntax::BraceSet && is_member_list(&call) => {
                self.members.extend(call.args.into_iter().filter_map(|arg| match arg {
                    Expr::Member(m) => Some(m),
                    _ => None,
                }));
            }
            other => self.others.push(other),
        }
    }

    pub fn add_member(&mut self, member: &Member) {
        self.members.push(member.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.others.is_empty()
    }

    /// Members merged so far.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// The union expression, `None` if nothing was added.
    pub fn get_union_node(&self) -> Option<Expr> {
        let braces = (!self.members.is_empty()).then(|| Expr::members(&self.members));
        let opaque = self
            .others
            .iter()
            .cloned()
            .reduce(|acc, next| Expr::union(acc, next));
        match (braces, opaque) {
            (Some(b), Some(o)) => Some(Expr::union(b, o)),
            (Some(b), None) => Some(b),
            (None, Some(o)) => Some(o),
            (None, None) => None,
        }
    }

    /// The union expression, or the empty set literal.
    pub fn to_expr(&self) -> Expr {
        self.get_union_node().unwrap_or_else(Expr::empty_set)
    }
}

fn is_member_list(call: &Call) -> bool {
    call.args.iter().all(|arg| matches!(arg, Expr::Member(_)))
}

/// Joins expressions left to right, preferring tuples over `CrossJoin` calls.
#[derive(Debug, Default, Clone)]
pub struct CrossJoinBuilder {
    current: Option<Expr>,
}

enum Shape {
    Single(Member),
    Tuple(Vec<Expr>),
    Other,
}

fn shape(node: &Expr) -> Shape {
    match node {
        Expr::Member(m) => Shape::Single(m.clone()),
        Expr::Call(call) => match call.syntax {
            Syntax::BraceSet if call.args.len() == 1 => match &call.args[0] {
                Expr::Member(m) => Shape::Single(m.clone()),
                _ => Shape::Other,
            },
            Syntax::Tuple => Shape::Tuple(call.args.clone()),
            _ => Shape::Other,
        },
        _ => Shape::Other,
    }
}

impl CrossJoinBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, node: Expr) {
        self.current = Some(match self.current.take() {
            None => node,
            Some(current) => Self::combine(current, node),
        });
    }

    pub fn join_member(&mut self, member: &Member) {
        self.join(Expr::member(member));
    }

    fn combine(left: Expr, right: Expr) -> Expr {
        match (shape(&left), shape(&right)) {
            (Shape::Single(a), Shape::Single(b)) => Expr::tuple(vec![Expr::Member(a), Expr::Member(b)]),
            (Shape::Tuple(mut args), Shape::Single(b)) => {
                args.push(Expr::Member(b));
                Expr::tuple(args)
            }
            (Shape::Single(a), Shape::Tuple(args)) => {
                let mut joined = vec![Expr::Member(a)];
                joined.extend(args);
                Expr::tuple(joined)
            }
            (Shape::Tuple(mut args), Shape::Tuple(more)) => {
                args.extend(more);
                Expr::tuple(args)
            }
            _ => {
                trace!("crossjoin fallback");
                Expr::crossjoin(left, right)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn get_expression(&self) -> Option<Expr> {
        self.current.clone()
    }

    pub fn into_expression(self) -> Option<Expr> {
        self.current
    }
}
