//! Evaluates a WHERE expression tree against a single row.
//!
//! Operands must agree on their runtime type: `=` and `!=` work on ints,
//! strings and booleans, the orderings on ints only, `and`/`or` on booleans
//! only.  Mismatches and non-boolean predicates are query errors, not
//! panics.

use crate::ast::{Constant, Expr, Op};
use crate::field_value::FieldValue;
use crate::typed_row::Row;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("operator {op} not defined for {left} and {right}")]
    TypeMismatch {
        op: Op,
        left: &'static str,
        right: &'static str,
    },
    #[error("predicate evaluated to {0}, expected a boolean")]
    NonBooleanPredicate(&'static str),
    #[error("unknown column {0} in predicate")]
    UnknownColumn(String),
}

/// Evaluates `expr` against `row`; the result must be a boolean.
pub fn eval_predicate(expr: &Expr, row: &Row) -> Result<bool, Error> {
    match eval(expr, row)? {
        FieldValue::Bool(b) => Ok(b),
        v => Err(Error::NonBooleanPredicate(v.type_name())),
    }
}

fn eval(expr: &Expr, row: &Row) -> Result<FieldValue, Error> {
    match expr {
        Expr::Literal(c) => Ok(match c {
            Constant::Int(i) => FieldValue::Int(*i),
            Constant::Str(s) => FieldValue::Text(s.clone()),
            Constant::Bool(b) => FieldValue::Bool(*b),
        }),
        Expr::Column(name) => row
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownColumn(name.clone())),
        Expr::Infix { op, left, right } => {
            let left = eval(left, row)?;
            let right = eval(right, row)?;
            apply(*op, &left, &right)
        }
    }
}

fn apply(op: Op, left: &FieldValue, right: &FieldValue) -> Result<FieldValue, Error> {
    use FieldValue::*;
    let mismatch = || Error::TypeMismatch {
        op,
        left: left.type_name(),
        right: right.type_name(),
    };
    let result = match op {
        Op::Eq | Op::Neq => {
            let equal = match (left, right) {
                (Int(a), Int(b)) => a == b,
                (Text(a), Text(b)) => a == b,
                (Bool(a), Bool(b)) => a == b,
                _ => return Err(mismatch()),
            };
            if op == Op::Eq {
                equal
            } else {
                !equal
            }
        }
        Op::Lt | Op::Le | Op::Gt | Op::Ge => match (left, right) {
            (Int(a), Int(b)) => match op {
                Op::Lt => a < b,
                Op::Le => a <= b,
                Op::Gt => a > b,
                Op::Ge => a >= b,
                _ => unreachable!(),
            },
            _ => return Err(mismatch()),
        },
        Op::And | Op::Or => match (left, right) {
            (Bool(a), Bool(b)) => {
                if op == Op::And {
                    *a && *b
                } else {
                    *a || *b
                }
            }
            _ => return Err(mismatch()),
        },
    };
    Ok(Bool(result))
}
