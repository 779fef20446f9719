//! Evaluates an expression tree against in-memory hierarchies.
//!
//! Used for diagnostics and tests: the result is the set of tuples the
//! expression denotes, with one member per hierarchy in each tuple.

use std::collections::HashSet;

use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::expr::{Call, Expr, Syntax};
use crate::domain::metadata::{Hierarchy, Level, Member};

pub type Tuple = Vec<Member>;

/// Evaluates expressions over a fixed set of hierarchies.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    hierarchies: &'a [Hierarchy],
}

fn unsupported(message: impl Into<String>) -> DomainError {
    DomainError::Evaluation {
        message: message.into(),
    }
}

/// Appends tuples not seen before, keeping first-seen order.
#[derive(Default)]
struct TupleSet {
    tuples: Vec<Tuple>,
    seen: HashSet<Tuple>,
}

impl TupleSet {
    fn push(&mut self, tuple: Tuple) {
        if self.seen.insert(tuple.clone()) {
            self.tuples.push(tuple);
        }
    }

    fn extend(&mut self, tuples: impl IntoIterator<Item = Tuple>) {
        for tuple in tuples {
            self.push(tuple);
        }
    }
}

impl<'a> Evaluator<'a> {
    pub fn new(hierarchies: &'a [Hierarchy]) -> Self {
        Self { hierarchies }
    }

    fn hierarchy(&self, name: &str) -> DomainResult<&'a Hierarchy> {
        self.hierarchies
            .iter()
            .find(|h| h.name() == name)
            .ok_or_else(|| DomainError::UnknownHierarchy(name.to_string()))
    }

    /// Tuples denoted by `expr`, without duplicates.
    #[instrument(level = "trace", skip(self, expr), fields(expr = %expr))]
    pub fn evaluate(&self, expr: &Expr) -> DomainResult<Vec<Tuple>> {
        match expr {
            Expr::Member(m) => Ok(vec![vec![m.clone()]]),
            Expr::Level(l) => Err(unsupported(format!("bare level {}", l))),
            Expr::Number(n) => Err(unsupported(format!("bare number {}", n))),
            Expr::Symbol(s) => Err(unsupported(format!("bare symbol {}", s))),
            Expr::Call(call) => self.evaluate_call(call),
        }
    }

    /// Members denoted by a single-hierarchy expression.
    pub fn members(&self, expr: &Expr) -> DomainResult<Vec<Member>> {
        self.evaluate(expr)?
            .into_iter()
            .map(|tuple| single(&tuple).cloned())
            .collect()
    }

    fn evaluate_call(&self, call: &Call) -> DomainResult<Vec<Tuple>> {
        match call.syntax {
            Syntax::BraceSet => {
                let mut set = TupleSet::default();
                for arg in &call.args {
                    set.extend(self.evaluate(arg)?);
                }
                Ok(set.tuples)
            }
            Syntax::Tuple => {
                let mut tuple = Vec::new();
                for arg in &call.args {
                    match self.evaluate(arg)?.as_slice() {
                        [one] => tuple.extend(one.iter().cloned()),
                        _ => return Err(unsupported("tuple element is not a single tuple")),
                    }
                }
                Ok(vec![tuple])
            }
            Syntax::Property => self.evaluate_property(call),
            Syntax::Function => self.evaluate_function(call),
        }
    }

    fn evaluate_property(&self, call: &Call) -> DomainResult<Vec<Tuple>> {
        match (call.name.as_str(), call.args.first()) {
            ("Members", Some(Expr::Level(level))) => Ok(self
                .level_members(level)?
                .into_iter()
                .map(|m| vec![m])
                .collect()),
            ("Children", Some(target)) => {
                let mut set = TupleSet::default();
                for member in self.members(target)? {
                    let hierarchy = self.hierarchy(member.hierarchy())?;
                    set.extend(hierarchy.children(&member).iter().map(|c| vec![c.clone()]));
                }
                Ok(set.tuples)
            }
            (name, _) => Err(unsupported(format!("property {}", name))),
        }
    }

    fn evaluate_function(&self, call: &Call) -> DomainResult<Vec<Tuple>> {
        match (call.name.as_str(), call.args.as_slice()) {
            ("Union", [left, right]) => {
                let mut set = TupleSet::default();
                set.extend(self.evaluate(left)?);
                set.extend(self.evaluate(right)?);
                Ok(set.tuples)
            }
            ("Except", [left, right]) => {
                let removed: HashSet<Tuple> = self.evaluate(right)?.into_iter().collect();
                Ok(self
                    .evaluate(left)?
                    .into_iter()
                    .filter(|t| !removed.contains(t))
                    .collect())
            }
            ("CrossJoin", [left, right]) => {
                let right = self.evaluate(right)?;
                let mut set = TupleSet::default();
                for l in self.evaluate(left)? {
                    for r in &right {
                        let mut tuple = l.clone();
                        tuple.extend(r.iter().cloned());
                        set.push(tuple);
                    }
                }
                Ok(set.tuples)
            }
            ("Descendants", [set, Expr::Level(level)]) => {
                self.descendants(set, |_, member| member.depth() == level.depth())
            }
            ("Descendants", [set, Expr::Number(distance), Expr::Symbol(flag)]) => {
                let distance = usize::try_from(*distance)
                    .map_err(|_| unsupported(format!("negative distance {}", distance)))?;
                let accept: fn(usize, usize) -> bool = match flag.as_str() {
                    "SELF" => |d, k| d == k,
                    "AFTER" => |d, k| d > k,
                    "SELF_AND_AFTER" => |d, k| d >= k,
                    other => return Err(unsupported(format!("descendants flag {}", other))),
                };
                self.descendants(set, move |d, _| accept(d, distance))
            }
            ("DrilldownMember", [set, drills, Expr::Symbol(flag)]) if flag == "RECURSIVE" => {
                let drills: HashSet<Member> = self.members(drills)?.into_iter().collect();
                let mut out = TupleSet::default();
                for member in self.members(set)? {
                    self.drill_down(&member, &drills, &mut out)?;
                }
                Ok(out.tuples)
            }
            (name, args) => Err(unsupported(format!("{} with {} arguments", name, args.len()))),
        }
    }

    /// Descendants-or-self of each member in `set`, filtered by distance.
    fn descendants<F>(&self, set: &Expr, accept: F) -> DomainResult<Vec<Tuple>>
    where
        F: Fn(usize, &Member) -> bool,
    {
        let mut out = TupleSet::default();
        for root in self.members(set)? {
            let hierarchy = self.hierarchy(root.hierarchy())?;
            for member in hierarchy.members() {
                let below = member == &root || root.is_ancestor_of(member);
                if below && accept(member.depth() - root.depth(), member) {
                    out.push(vec![member.clone()]);
                }
            }
        }
        Ok(out.tuples)
    }

    fn drill_down(&self, member: &Member, drills: &HashSet<Member>, out: &mut TupleSet) -> DomainResult<()> {
        out.push(vec![member.clone()]);
        if drills.contains(member) {
            let hierarchy = self.hierarchy(member.hierarchy())?;
            for child in hierarchy.children(member) {
                self.drill_down(child, drills, out)?;
            }
        }
        Ok(())
    }

    fn level_members(&self, level: &Level) -> DomainResult<Vec<Member>> {
        let hierarchy = self.hierarchy(level.hierarchy())?;
        Ok(hierarchy
            .members()
            .iter()
            .filter(|m| m.level() == level)
            .cloned()
            .collect())
    }
}

fn single(tuple: &[Member]) -> DomainResult<&Member> {
    match tuple {
        [member] => Ok(member),
        _ => Err(unsupported(format!("expected a member, found a {}-tuple", tuple.len()))),
    }
}
