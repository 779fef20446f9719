//! Query-expression tree handed to the statement layer.
//!
//! The tree is a closed set of node kinds. Call nodes carry a [`Syntax`] tag
//! which decides how the statement layer renders them; `Display` gives an
//! MDX-like debug rendering.

use std::fmt;

use itertools::Itertools;

use crate::domain::metadata::{Level, Member};

/// How a call node is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// `Name(arg, ...)`
    Function,
    /// `arg.Name`
    Property,
    /// `{arg, ...}`
    BraceSet,
    /// `(arg, ...)`
    Tuple,
}

/// A call node: operator name, syntax and ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: String,
    pub syntax: Syntax,
    pub args: Vec<Expr>,
}

/// Nodes of the query-expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Member reference
    Member(Member),
    /// Level reference, used as the scope argument of `Descendants` and by `.Members`
    Level(Level),
    /// Numeric argument (distances)
    Number(i64),
    /// Flag argument such as `RECURSIVE` or `SELF_AND_AFTER`
    Symbol(String),
    /// Function, property, brace-set or tuple
    Call(Call),
}

/// Flags accepted by `Descendants`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescFlag {
    SelfOnly,
    After,
    SelfAndAfter,
}

impl DescFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescFlag::SelfOnly => "SELF",
            DescFlag::After => "AFTER",
            DescFlag::SelfAndAfter => "SELF_AND_AFTER",
        }
    }
}

impl Expr {
    pub fn call(name: &str, syntax: Syntax, args: Vec<Expr>) -> Self {
        Expr::Call(Call {
            name: name.to_string(),
            syntax,
            args,
        })
    }

    pub fn function(name: &str, args: Vec<Expr>) -> Self {
        Self::call(name, Syntax::Function, args)
    }

    pub fn property(target: Expr, name: &str) -> Self {
        Self::call(name, Syntax::Property, vec![target])
    }

    pub fn brace_set(args: Vec<Expr>) -> Self {
        Self::call("{}", Syntax::BraceSet, args)
    }

    pub fn tuple(args: Vec<Expr>) -> Self {
        Self::call("()", Syntax::Tuple, args)
    }

    /// The empty set literal `{}`.
    pub fn empty_set() -> Self {
        Self::brace_set(Vec::new())
    }

    pub fn member(member: &Member) -> Self {
        Expr::Member(member.clone())
    }

    /// Brace set of member references.
    pub fn members<'a, I>(members: I) -> Self
    where
        I: IntoIterator<Item = &'a Member>,
    {
        Self::brace_set(members.into_iter().map(Expr::member).collect())
    }

    /// `member.Children`
    pub fn children(member: &Member) -> Self {
        Self::property(Expr::member(member), "Children")
    }

    /// `level.Members`
    pub fn level_members(level: &Level) -> Self {
        Self::property(Expr::Level(level.clone()), "Members")
    }

    /// `Descendants(set, distance, flag)`
    pub fn descendants(set: Expr, distance: usize, flag: DescFlag) -> Self {
        Self::function(
            "Descendants",
            vec![
                set,
                Expr::Number(distance as i64),
                Expr::Symbol(flag.as_str().to_string()),
            ],
        )
    }

    /// `Descendants(set, level)`: members of `level` below `set`.
    pub fn descendants_at(set: Expr, level: &Level) -> Self {
        Self::function("Descendants", vec![set, Expr::Level(level.clone())])
    }

    pub fn except(base: Expr, subtrahend: Expr) -> Self {
        Self::function("Except", vec![base, subtrahend])
    }

    pub fn union(left: Expr, right: Expr) -> Self {
        Self::function("Union", vec![left, right])
    }

    pub fn crossjoin(left: Expr, right: Expr) -> Self {
        Self::function("CrossJoin", vec![left, right])
    }

    /// `DrilldownMember(set, drills, RECURSIVE)`
    pub fn drilldown_member(set: Expr, drills: Expr) -> Self {
        Self::function(
            "DrilldownMember",
            vec![set, drills, Expr::Symbol("RECURSIVE".to_string())],
        )
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn is_syntax(&self, syntax: Syntax) -> bool {
        matches!(self, Expr::Call(call) if call.syntax == syntax)
    }

    /// True for `{}`.
    pub fn is_empty_set(&self) -> bool {
        matches!(self, Expr::Call(call) if call.syntax == Syntax::BraceSet && call.args.is_empty())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Member(m) => write!(f, "{}", m),
            Expr::Level(l) => write!(f, "{}", l),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Symbol(s) => write!(f, "{}", s),
            Expr::Call(call) => match call.syntax {
                Syntax::Function => write!(f, "{}({})", call.name, call.args.iter().join(", ")),
                Syntax::Property => match call.args.first() {
                    Some(target) => write!(f, "{}.{}", target, call.name),
                    None => write!(f, "{}", call.name),
                },
                Syntax::BraceSet => write!(f, "{{{}}}", call.args.iter().join(", ")),
                Syntax::Tuple => write!(f, "({})", call.args.iter().join(", ")),
            },
        }
    }
}
