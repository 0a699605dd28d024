//! Builtin functions available to every expression.
//!
//! Builtins take evaluated [`Value`] arguments and never touch the data
//! context; a caller-supplied function with the same name overrides the
//! builtin for that evaluator.

use crate::evaluator::EvalError;
use crate::value::Value;

pub(crate) type BuiltinFn = fn(&[Value]) -> Result<Value, EvalError>;

pub(crate) fn lookup(name: &str) -> Option<BuiltinFn> {
    let f: BuiltinFn = match name {
        "abs" => abs,
        "ceil" => ceil,
        "floor" => floor,
        "round" => round,
        "sqrt" => sqrt,
        "random" => random,
        "min" => min,
        "max" => max,
        "length" => length,
        "lower" => lower,
        "substr" => substr,
        "union" => union,
        "intersection" => intersection,
        "difference" => difference,
        "unique" => unique,
        _ => return None,
    };
    Some(f)
}

fn arity_error(name: &str, expected: &str, got: usize) -> EvalError {
    EvalError::Function {
        name: name.to_string(),
        message: format!("expects {expected}, got {got} argument(s)"),
    }
}

fn single_number(name: &str, args: &[Value]) -> Result<f64, EvalError> {
    match args {
        [v] => Ok(v.as_number()),
        _ => Err(arity_error(name, "one argument", args.len())),
    }
}

fn abs(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Number(single_number("abs", args)?.abs()))
}

fn ceil(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Number(single_number("ceil", args)?.ceil()))
}

fn floor(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Number(single_number("floor", args)?.floor()))
}

/// Rounds halfway cases toward positive infinity: `round(-2.5)` is -2.
fn round(args: &[Value]) -> Result<Value, EvalError> {
    let n = single_number("round", args)?;
    Ok(Value::Number((n + 0.5).floor()))
}

fn sqrt(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Number(single_number("sqrt", args)?.sqrt()))
}

/// Uniform in [0, 1). Memoized like every call, so within one context the
/// same `random()` occurrence yields a stable value until the cache is reset.
fn random(_args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::Number(rand::random::<f64>()))
}

fn min(args: &[Value]) -> Result<Value, EvalError> {
    extremum("min", args, f64::min)
}

fn max(args: &[Value]) -> Result<Value, EvalError> {
    extremum("max", args, f64::max)
}

fn extremum(name: &str, args: &[Value], pick: fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    let mut numbers = args.iter().map(Value::as_number);
    let first = numbers
        .next()
        .ok_or_else(|| arity_error(name, "at least one argument", 0))?;
    Ok(Value::Number(numbers.fold(first, pick)))
}

/// Element count for arrays, character count for strings, 0 otherwise.
fn length(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [Value::Array(arr)] => Ok(Value::Number(arr.len() as f64)),
        [Value::String(s)] => Ok(Value::Number(s.chars().count() as f64)),
        [_] => Ok(Value::Number(0.0)),
        _ => Err(arity_error("length", "one argument", args.len())),
    }
}

fn lower(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [v] => Ok(Value::String(v.coerce_string().to_lowercase())),
        _ => Err(arity_error("lower", "one argument", args.len())),
    }
}

/// `substr(s, start[, end])`, character-indexed, indices clamped to the
/// string; a start past the end yields the empty string.
fn substr(args: &[Value]) -> Result<Value, EvalError> {
    let (s, start, end) = match args {
        [s, start] => (s.coerce_string(), start.as_number(), None),
        [s, start, end] => (s.coerce_string(), start.as_number(), Some(end.as_number())),
        _ => Err(arity_error("substr", "two or three arguments", args.len()))?,
    };

    let chars: Vec<char> = s.chars().collect();
    let clamp = |n: f64| -> usize {
        if n.is_nan() || n < 0.0 {
            0
        } else {
            (n as usize).min(chars.len())
        }
    };
    let start = clamp(start);
    let end = end.map_or(chars.len(), clamp);
    if start >= end {
        return Ok(Value::String(String::new()));
    }
    Ok(Value::String(chars[start..end].iter().collect()))
}

/// Interpret an argument as a collection: arrays contribute their elements,
/// undefined and null contribute nothing, a scalar contributes itself.
fn members(v: &Value) -> Vec<Value> {
    match v {
        Value::Array(arr) => arr.clone(),
        Value::Undefined | Value::Null => vec![],
        other => vec![other.clone()],
    }
}

fn push_unique(out: &mut Vec<Value>, v: Value) {
    if !out.contains(&v) {
        out.push(v);
    }
}

/// All distinct members of all arguments, first-occurrence order.
fn union(args: &[Value]) -> Result<Value, EvalError> {
    let mut out = vec![];
    for arg in args {
        for member in members(arg) {
            push_unique(&mut out, member);
        }
    }
    Ok(Value::Array(out))
}

/// Distinct members of the first argument present in every other argument.
fn intersection(args: &[Value]) -> Result<Value, EvalError> {
    let Some((first, rest)) = args.split_first() else {
        return Ok(Value::Array(vec![]));
    };
    let rest: Vec<Vec<Value>> = rest.iter().map(members).collect();

    let mut out = vec![];
    for member in members(first) {
        if rest.iter().all(|set| set.contains(&member)) {
            push_unique(&mut out, member);
        }
    }
    Ok(Value::Array(out))
}

/// Distinct members of the first argument absent from every other argument.
fn difference(args: &[Value]) -> Result<Value, EvalError> {
    let Some((first, rest)) = args.split_first() else {
        return Ok(Value::Array(vec![]));
    };
    let rest: Vec<Vec<Value>> = rest.iter().map(members).collect();

    let mut out = vec![];
    for member in members(first) {
        if rest.iter().all(|set| !set.contains(&member)) {
            push_unique(&mut out, member);
        }
    }
    Ok(Value::Array(out))
}

fn unique(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [v] => {
            let mut out = vec![];
            for member in members(v) {
                push_unique(&mut out, member);
            }
            Ok(Value::Array(out))
        }
        _ => Err(arity_error("unique", "one argument", args.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[f64]) -> Value {
        Value::Array(values.iter().map(|n| Value::Number(*n)).collect())
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round(&[Value::Number(4.5)]), Ok(Value::Number(5.0)));
        assert_eq!(round(&[Value::Number(-2.5)]), Ok(Value::Number(-2.0)));
        assert_eq!(round(&[Value::Number(4.2)]), Ok(Value::Number(4.0)));
    }

    #[test]
    fn set_functions() {
        let u = union(&[nums(&[1.0, 2.0]), Value::Number(2.0), nums(&[3.0])]).unwrap();
        assert_eq!(u, nums(&[1.0, 2.0, 3.0]));

        let i = intersection(&[
            nums(&[1.0]),
            nums(&[1.0, 2.0]),
            Value::Number(1.0),
            nums(&[3.0, 4.0, 1.0]),
        ])
        .unwrap();
        assert_eq!(i, nums(&[1.0]));

        let d = difference(&[nums(&[1.0, 2.0, 3.0]), nums(&[2.0])]).unwrap();
        assert_eq!(d, nums(&[1.0, 3.0]));

        let q = unique(&[nums(&[1.0, 1.0, 1.0])]).unwrap();
        assert_eq!(q, nums(&[1.0]));
    }

    #[test]
    fn substr_clamps() {
        let s = Value::String("hello".into());
        assert_eq!(
            substr(&[s.clone(), Value::Number(1.0), Value::Number(3.0)]),
            Ok(Value::String("el".into()))
        );
        assert_eq!(
            substr(&[s.clone(), Value::Number(3.0)]),
            Ok(Value::String("lo".into()))
        );
        assert_eq!(
            substr(&[s, Value::Number(9.0), Value::Number(12.0)]),
            Ok(Value::String(String::new()))
        );
    }
}
