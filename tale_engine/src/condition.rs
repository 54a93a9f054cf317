//! The condition expression language.
//!
//! Choice visibility and impact application are gated by short expressions
//! such as `courage >= 30`, `door == open` or just `met_keeper`. Parsing is a
//! single scan over the [`OPERATORS`] table; evaluation reads the store.
//!
//! [`evaluate`] is total: a malformed expression is logged and evaluates to
//! `false`, so broken content fails closed (choice hidden, impact skipped).

use std::fmt;

use log::warn;
use thiserror::Error;

use crate::store::VariableStore;

/// Comparison operators, in the order they are searched for.
///
/// Two-character tokens come before their one-character prefixes so that
/// `a >= 1` is never read as `a > (= 1)`.
pub const OPERATORS: [(&str, Operator); 6] = [
    (">=", Operator::GreaterOrEqual),
    ("<=", Operator::LessOrEqual),
    (">", Operator::Greater),
    ("<", Operator::Less),
    ("==", Operator::Equal),
    ("!=", Operator::NotEqual),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
    Equal,
    NotEqual,
}

impl Operator {
    pub fn token(self) -> &'static str {
        match self {
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::Equal => "==",
            Self::NotEqual => "!=",
        }
    }

    /// Apply the operator to two integers.
    pub fn compare(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Self::GreaterOrEqual => lhs >= rhs,
            Self::LessOrEqual => lhs <= rhs,
            Self::Greater => lhs > rhs,
            Self::Less => lhs < rhs,
            Self::Equal => lhs == rhs,
            Self::NotEqual => lhs != rhs,
        }
    }

    fn is_ordering(self) -> bool {
        !matches!(self, Self::Equal | Self::NotEqual)
    }
}

/// Right-hand side of a comparison, typed by how it parses.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Bool(bool),
    Int(i32),
    Text(String),
}

impl Operand {
    /// Literal typing used by `==` / `!=`: bool first, then int, then text.
    fn from_literal(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("true") {
            Self::Bool(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Self::Bool(false)
        } else if let Ok(n) = raw.parse::<i32>() {
            Self::Int(n)
        } else {
            Self::Text(raw.to_string())
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("missing variable name before '{0}'")]
    MissingLhs(&'static str),
    #[error("missing value after '{0}'")]
    MissingRhs(&'static str),
    #[error("'{op}' needs an integer, found '{found}'")]
    NotAnInteger { op: &'static str, found: String },
}

/// A parsed condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Blank expression; always true.
    Always,
    /// Anything without an operator: the whole expression names a bool variable.
    Flag(String),
    Compare { key: String, op: Operator, rhs: Operand },
}

impl Condition {
    /// Parse an expression. Leading and trailing whitespace is ignored.
    ///
    /// # Errors
    /// - on a comparison with an empty side
    /// - on an ordering comparison whose right side is not an integer
    pub fn parse(expression: &str) -> Result<Self, ConditionError> {
        let expr = expression.trim();
        if expr.is_empty() {
            return Ok(Self::Always);
        }

        let Some((pos, token, op)) = OPERATORS
            .iter()
            .find_map(|(token, op)| expr.find(token).map(|pos| (pos, *token, *op)))
        else {
            return Ok(Self::Flag(expr.to_string()));
        };

        let key = expr[..pos].trim();
        let raw = expr[pos + token.len()..].trim();
        if key.is_empty() {
            return Err(ConditionError::MissingLhs(token));
        }
        if raw.is_empty() {
            return Err(ConditionError::MissingRhs(token));
        }

        let rhs = if op.is_ordering() {
            let n = raw.parse::<i32>().map_err(|_| ConditionError::NotAnInteger {
                op: token,
                found: raw.to_string(),
            })?;
            Operand::Int(n)
        } else {
            Operand::from_literal(raw)
        };

        Ok(Self::Compare {
            key: key.to_string(),
            op,
            rhs,
        })
    }

    /// Evaluate against the current store contents.
    pub fn eval(&self, store: &VariableStore) -> bool {
        match self {
            Self::Always => true,
            Self::Flag(name) => store.get_bool(name),
            Self::Compare { key, op, rhs } => match (op, rhs) {
                (Operator::Equal, rhs) => equals(store, key, rhs),
                (Operator::NotEqual, rhs) => !equals(store, key, rhs),
                (op, Operand::Int(n)) => op.compare(store.get_int(key), *n),
                // ordering operators always carry an integer after parsing
                _ => false,
            },
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => Ok(()),
            Self::Flag(name) => write!(f, "{name}"),
            Self::Compare { key, op, rhs } => write!(f, "{key} {} {rhs}", op.token()),
        }
    }
}

fn equals(store: &VariableStore, key: &str, rhs: &Operand) -> bool {
    match rhs {
        Operand::Bool(b) => store.get_bool(key) == *b,
        Operand::Int(n) => store.get_int(key) == *n,
        Operand::Text(s) => store.get_string(key).eq_ignore_ascii_case(s),
    }
}

/// Evaluate `expression` against `store`, failing closed on malformed input.
pub fn evaluate(expression: &str, store: &VariableStore) -> bool {
    match Condition::parse(expression) {
        Ok(cond) => cond.eval(store),
        Err(e) => {
            warn!("condition \"{expression}\" could not be evaluated: {e}");
            false
        },
    }
}

/// Evaluate an optional condition, where `None` means "always".
pub fn evaluate_opt(expression: Option<&str>, store: &VariableStore) -> bool {
    expression.is_none_or(|expr| evaluate(expr, store))
}
