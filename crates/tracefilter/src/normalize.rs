//! Glob normalization.
//!
//! Canonicalizes every validated glob pattern in place:
//!
//! - consecutive unescaped `*` runs collapse to a single `*`
//! - a pattern left without any unescaped wildcard is demoted to a
//!   plain string literal, letting the evaluator use exact match
//!   instead of pattern match (a pure optimization)
//!
//! The pass is total over a validated tree and idempotent.

use crate::ast::{Expr, Literal};

/// Normalize all glob literals in the tree.
pub fn normalize(expr: &mut Expr) {
    match expr {
        Expr::Literal(lit) => {
            if let Literal::Glob(pattern) = lit {
                *lit = normalize_glob(pattern);
            }
        }
        Expr::Field(_) => {}
        Expr::Unary { operand, .. } => normalize(operand),
        Expr::Binary { left, right, .. } => {
            normalize(left);
            normalize(right);
        }
    }
}

/// Canonicalize one pattern, demoting it when no wildcard remains.
fn normalize_glob(pattern: &str) -> Literal {
    let mut canonical = String::with_capacity(pattern.len());
    let mut unescaped = String::with_capacity(pattern.len());
    let mut wildcard = false;
    let mut last_was_star = false;

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                // Validated patterns only escape '*' and '\'.
                if let Some(esc) = chars.next() {
                    canonical.push('\\');
                    canonical.push(esc);
                    unescaped.push(esc);
                }
                last_was_star = false;
            }
            '*' => {
                if !last_was_star {
                    canonical.push('*');
                }
                wildcard = true;
                last_was_star = true;
            }
            other => {
                canonical.push(other);
                unescaped.push(other);
                last_was_star = false;
            }
        }
    }

    if wildcard {
        Literal::Glob(canonical)
    } else {
        Literal::Str(unescaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob(pattern: &str) -> Expr {
        Expr::Literal(Literal::Glob(pattern.into()))
    }

    #[test]
    fn collapses_wildcard_runs() {
        let mut expr = glob("app.***events**");
        normalize(&mut expr);
        assert_eq!(expr, Expr::Literal(Literal::Glob("app.*events*".into())));
    }

    #[test]
    fn escaped_star_does_not_join_a_run() {
        let mut expr = glob(r"a*\**b");
        normalize(&mut expr);
        assert_eq!(expr, Expr::Literal(Literal::Glob(r"a*\**b".into())));
    }

    #[test]
    fn demotes_wildcard_free_pattern_to_string() {
        let mut expr = glob(r"lit\*eral");
        normalize(&mut expr);
        assert_eq!(expr, Expr::Literal(Literal::Str("lit*eral".into())));
    }

    #[test]
    fn is_idempotent() {
        let mut once = glob(r"a**b\\c***");
        normalize(&mut once);
        let mut twice = once.clone();
        normalize(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn recurses_into_binary_nodes() {
        let mut expr = Expr::Binary {
            op: crate::ast::BinaryOp::Eq,
            left: Box::new(Expr::Field("logger_name".into())),
            right: Box::new(glob("a**")),
        };
        normalize(&mut expr);
        match expr {
            Expr::Binary { right, .. } => {
                assert_eq!(*right, Expr::Literal(Literal::Glob("a*".into())));
            }
            _ => unreachable!(),
        }
    }
}
