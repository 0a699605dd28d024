//! Tree-walk evaluation of compiled expressions against a data context.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use regex::Regex;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::context::{DataContext, ExprFunction};
use crate::resolver;
use crate::value::Value;

/// Runtime errors raised during evaluation.
///
/// Property resolution never raises (missing paths are undefined); errors
/// come from unknown functions, bad `~=` operands, and failures returned by
/// caller-supplied accessors and functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A call to a name that is neither a supplied function nor a builtin
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// The right operand of `~=` did not compile as a regex
    #[error("invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    /// The right operand of `~=` was not a string
    #[error("the '~=' pattern must be a string, found {found}")]
    NonStringPattern { found: &'static str },

    /// A builtin or caller-supplied function reported an error
    #[error("function '{name}': {message}")]
    Function { name: String, message: String },

    /// A caller-supplied accessor or function failed
    #[error("{0}")]
    Failure(String),
}

impl EvalError {
    /// General-purpose failure for accessor and function implementations.
    pub fn failure(message: impl Into<String>) -> Self {
        EvalError::Failure(message.into())
    }
}

/// A compiled expression, evaluated against one [`DataContext`] at a time.
///
/// The evaluator is immutable and shareable: the same instance may be
/// evaluated concurrently against many contexts. Per-evaluation state
/// (memoized resolutions) lives in the context, not here.
pub struct Evaluator {
    expr: Arc<Expr>,
    functions: Arc<HashMap<String, Arc<dyn ExprFunction>>>,
}

impl Evaluator {
    pub(crate) fn new(expr: Arc<Expr>, functions: HashMap<String, Arc<dyn ExprFunction>>) -> Self {
        Evaluator {
            expr,
            functions: Arc::new(functions),
        }
    }

    /// The expression tree this evaluator runs.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate against a data context.
    pub async fn eval(&self, ctx: &DataContext) -> Result<Value, EvalError> {
        self.eval_expr(&self.expr, ctx).await
    }

    fn eval_expr<'a>(
        &'a self,
        expr: &'a Expr,
        ctx: &'a DataContext,
    ) -> BoxFuture<'a, Result<Value, EvalError>> {
        async move {
            match expr {
                Expr::Number(n) => Ok(Value::Number(*n)),
                Expr::String(s) => Ok(Value::String(s.clone())),

                Expr::Array(elements) => {
                    let mut values = Vec::with_capacity(elements.len());
                    for element in elements {
                        values.push(self.eval_expr(element, ctx).await?);
                    }
                    Ok(Value::Array(values))
                }

                Expr::Property(path) => resolver::resolve_property(ctx, path).await,

                Expr::Call { name, args } => {
                    let mut values = Vec::with_capacity(args.len());
                    for arg in args {
                        values.push(self.eval_expr(arg, ctx).await?);
                    }
                    resolver::resolve_call(ctx, &self.functions, name, values).await
                }

                Expr::Unary { op, operand } => {
                    let value = self.eval_expr(operand, ctx).await?;
                    Ok(match op {
                        UnaryOp::Not => bool_value(!value.is_truthy()),
                        UnaryOp::Negate => Value::Number(-value.as_number()),
                    })
                }

                // 'and'/'or' short-circuit and yield the deciding operand
                // unconverted, so `obj or fallback` keeps the object.
                Expr::BinaryOp {
                    op: BinOp::And,
                    left,
                    right,
                } => {
                    let left = self.eval_expr(left, ctx).await?;
                    if !left.is_truthy() {
                        return Ok(left);
                    }
                    self.eval_expr(right, ctx).await
                }
                Expr::BinaryOp {
                    op: BinOp::Or,
                    left,
                    right,
                } => {
                    let left = self.eval_expr(left, ctx).await?;
                    if left.is_truthy() {
                        return Ok(left);
                    }
                    self.eval_expr(right, ctx).await
                }

                Expr::BinaryOp { op, left, right } => {
                    let left = self.eval_expr(left, ctx).await?;
                    let right = self.eval_expr(right, ctx).await?;
                    apply_binop(*op, &left, &right)
                }

                // Only the selected branch is evaluated.
                Expr::Ternary {
                    condition,
                    then,
                    otherwise,
                } => {
                    let condition = self.eval_expr(condition, ctx).await?;
                    if condition.is_truthy() {
                        self.eval_expr(then, ctx).await
                    } else {
                        self.eval_expr(otherwise, ctx).await
                    }
                }
            }
        }
        .boxed()
    }
}

fn bool_value(b: bool) -> Value {
    Value::Number(if b { 1.0 } else { 0.0 })
}

fn apply_binop(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add | BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Modulo => Ok(
            Value::Number(decimal_arith(op, left.as_number(), right.as_number())),
        ),
        BinOp::Power => Ok(Value::Number(left.as_number().powf(right.as_number()))),

        BinOp::Equal => Ok(bool_value(left == right)),
        BinOp::NotEqual => Ok(bool_value(left != right)),
        BinOp::LessThan => Ok(bool_value(left.as_number() < right.as_number())),
        BinOp::GreaterThan => Ok(bool_value(left.as_number() > right.as_number())),
        BinOp::LessEqual => Ok(bool_value(left.as_number() <= right.as_number())),
        BinOp::GreaterEqual => Ok(bool_value(left.as_number() >= right.as_number())),

        BinOp::Matches => {
            let Value::String(pattern) = right else {
                return Err(EvalError::NonStringPattern {
                    found: right.type_name(),
                });
            };
            let regex = Regex::new(pattern).map_err(|e| EvalError::InvalidRegex {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            Ok(bool_value(regex.is_match(&left.coerce_string())))
        }

        BinOp::In => Ok(bool_value(membership(left, right, false))),
        BinOp::NotIn => Ok(bool_value(!membership(left, right, false))),
        BinOp::InLoose => Ok(bool_value(membership(left, right, true))),
        BinOp::NotInLoose => Ok(bool_value(!membership(left, right, true))),

        BinOp::And | BinOp::Or => unreachable!("short-circuit ops handled in eval_expr"),
    }
}

/// Membership for `in` and its variants. A scalar right side acts as a
/// one-element set; an array left side is a subset test, so `(1, 2) in 1`
/// is false while `1 in 1` is true.
fn membership(left: &Value, right: &Value, loose: bool) -> bool {
    let eq = |a: &Value, b: &Value| if loose { a.loose_eq(b) } else { a == b };

    match (left, right) {
        (Value::Array(needles), Value::Array(haystack)) => needles
            .iter()
            .all(|needle| haystack.iter().any(|v| eq(needle, v))),
        (needle, Value::Array(haystack)) => haystack.iter().any(|v| eq(needle, v)),
        (Value::Array(needles), single) => needles.iter().all(|needle| eq(needle, single)),
        (needle, single) => eq(needle, single),
    }
}

/// Arithmetic through a fixed-point decimal round-trip, so base-10 inputs
/// combine without binary-float artifacts (`1.4 * 1.1` is exactly 1.54).
/// Falls back to plain f64 when an operand or result does not fit the
/// decimal range, and for division or modulo by zero (infinity/NaN).
fn decimal_arith(op: BinOp, a: f64, b: f64) -> f64 {
    if matches!(op, BinOp::Divide | BinOp::Modulo) && b == 0.0 {
        return float_arith(op, a, b);
    }

    if let (Some(da), Some(db)) = (Decimal::from_f64(a), Decimal::from_f64(b)) {
        let result = match op {
            BinOp::Add => da.checked_add(db),
            BinOp::Subtract => da.checked_sub(db),
            BinOp::Multiply => da.checked_mul(db),
            BinOp::Divide => da.checked_div(db),
            BinOp::Modulo => da.checked_rem(db),
            _ => None,
        };
        if let Some(n) = result.and_then(|d| d.to_f64()) {
            return n;
        }
    }

    float_arith(op, a, b)
}

fn float_arith(op: BinOp, a: f64, b: f64) -> f64 {
    match op {
        BinOp::Add => a + b,
        BinOp::Subtract => a - b,
        BinOp::Multiply => a * b,
        BinOp::Divide => a / b,
        BinOp::Modulo => a % b,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_round_trip() {
        assert_eq!(decimal_arith(BinOp::Multiply, 1.4, 1.1), 1.54);
        assert_eq!(decimal_arith(BinOp::Add, 0.1, 0.2), 0.3);
        assert_eq!(decimal_arith(BinOp::Modulo, 97.0, 10.0), 7.0);
    }

    #[test]
    fn division_by_zero_is_float() {
        assert_eq!(decimal_arith(BinOp::Divide, 1.0, 0.0), f64::INFINITY);
        assert!(decimal_arith(BinOp::Modulo, 1.0, 0.0).is_nan());
    }

    #[test]
    fn subset_membership() {
        let one = Value::Number(1.0);
        let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert!(membership(&one, &one, false));
        assert!(!membership(&arr, &one, false));
        assert!(membership(&one, &arr, false));
        assert!(membership(&arr, &arr, false));
        assert!(membership(
            &Value::Number(1.0),
            &Value::Array(vec![Value::Number(6.0), Value::String("1".into())]),
            true
        ));
    }
}
