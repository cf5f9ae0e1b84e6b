//! Abstract syntax tree for filter expressions.
//!
//! Pure data: a closed set of node variants, each exclusively owning its
//! children. The tree is transient; it is consumed by the validation and
//! lowering passes and dropped when compilation returns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A literal operand value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    /// Integer constant.
    Int(i64),
    /// Exact-match string, escapes resolved.
    Str(String),
    /// Glob pattern. `\*` and `\\` escapes are kept verbatim until the
    /// pattern is normalized or encoded.
    Glob(String),
}

/// Binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Logical AND (`&&`)
    And,
    /// Logical OR (`||`)
    Or,
    /// Equality (`==`)
    Eq,
    /// Inequality (`!=`)
    Ne,
    /// Greater than (`>`)
    Gt,
    /// Greater than or equal (`>=`)
    Ge,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Le,
}

impl BinaryOp {
    /// Whether this operator compares two operands (as opposed to
    /// combining two boolean subexpressions).
    pub fn is_comparison(self) -> bool {
        !matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Whether this operator imposes an ordering. Ordering is undefined
    /// for string and glob operands.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le
        )
    }

    /// Source-text spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
        }
    }
}

/// Unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical NOT (`!`)
    Not,
}

/// Filter expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A literal operand.
    Literal(Literal),
    /// A named event-context field, resolved during lowering.
    Field(String),
    /// A unary operation.
    Unary {
        /// The operator to apply
        op: UnaryOp,
        /// The operand
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator to apply
        op: BinaryOp,
        /// The left operand
        left: Box<Expr>,
        /// The right operand
        right: Box<Expr>,
    },
}

/// Re-apply source escapes to a string literal for rendering.
fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '*' => out.push_str("\\*"),
            other => out.push(other),
        }
    }
    out
}

/// Re-apply quote escapes to a glob pattern (pattern escapes are
/// already verbatim).
fn escape_glob(p: &str) -> String {
    p.replace('"', "\\\"")
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Str(s) => write!(f, "\"{}\"", escape_str(s)),
            Literal::Glob(p) => write!(f, "\"{}\"", escape_glob(p)),
        }
    }
}

/// Canonical textual rendering.
///
/// Every binary node is parenthesized, so re-parsing the rendering
/// reproduces the tree exactly.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Field(name) => write!(f, "{}", name),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => write!(f, "!{}", operand),
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_comparison() {
        let expr = Expr::Binary {
            op: BinaryOp::Ge,
            left: Box::new(Expr::Field("int_loglevel".into())),
            right: Box::new(Expr::Literal(Literal::Int(5))),
        };
        assert_eq!(expr.to_string(), "(int_loglevel >= 5)");
    }

    #[test]
    fn renders_string_with_escapes() {
        let lit = Literal::Str("a*b".into());
        assert_eq!(lit.to_string(), "\"a\\*b\"");
    }

    #[test]
    fn renders_nested_logic() {
        let cmp = |name: &str, v: i64| Expr::Binary {
            op: BinaryOp::Eq,
            left: Box::new(Expr::Field(name.into())),
            right: Box::new(Expr::Literal(Literal::Int(v))),
        };
        let expr = Expr::Binary {
            op: BinaryOp::And,
            left: Box::new(cmp("a", 1)),
            right: Box::new(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(cmp("b", 2)),
            }),
        };
        assert_eq!(expr.to_string(), "((a == 1) && !(b == 2))");
    }
}
