use std::collections::HashMap;

/// A runtime value in the sieve filter language.
///
/// Expressions themselves only produce numbers, strings, arrays, and the
/// numeric booleans 0/1, but data contexts carry arbitrary JSON-like data,
/// so booleans, nulls, and objects can flow in through property resolution.
///
/// # Undefined
///
/// `Undefined` is the result of resolving a property path the context does
/// not define. It is falsy and never an error, which keeps optional fields
/// cheap (`missing.sub or 1` evaluates to 1 without raising).
///
/// # Examples
///
/// ```
/// use sieve_lang::Value;
///
/// let n = Value::Number(42.0);
/// let s = Value::String("hello".to_string());
/// let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
/// assert!(n.is_truthy());
/// assert!(!Value::Undefined.is_truthy());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unresolved/missing value (distinct from null)
    Undefined,

    /// Present-but-null datum from the data context
    Null,

    /// Boolean from the data context (the language itself produces 0/1)
    Bool(bool),

    /// Double-precision number
    Number(f64),

    /// UTF-8 string
    String(String),

    /// Array of values
    Array(Vec<Value>),

    /// Object from the data context; lookup is restricted to its own keys
    Object(HashMap<String, Value>),
}

impl Value {
    /// Check if the value is truthy (for conditions and short-circuiting).
    ///
    /// Undefined, null, false, zero, empty strings, and empty arrays are
    /// falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Undefined | Null => false,
            Bool(b) => *b,
            Number(n) => *n != 0.0,
            String(s) => !s.is_empty(),
            Array(arr) => !arr.is_empty(),
            Object(_) => true,
        }
    }

    /// Coerce to a number for arithmetic.
    ///
    /// Numbers pass through, booleans become 0/1, numeric strings parse,
    /// everything else coerces to 0.
    pub fn as_number(&self) -> f64 {
        self.try_number().unwrap_or(0.0)
    }

    /// Numeric interpretation, if one exists.
    pub fn try_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Coerce to a string (for `~=` and string builtins).
    pub fn coerce_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Loose equality used by `in~` / `not in~`.
    ///
    /// Strict equality, or numeric equality after coercion when the sides
    /// differ in type (so `"1"` matches `1`). Two strings only ever
    /// compare strictly: `"1"` does not match `"01"`.
    pub fn loose_eq(&self, other: &Value) -> bool {
        if self == other {
            return true;
        }
        if matches!((self, other), (Value::String(_), Value::String(_))) {
            return false;
        }
        match (self.try_number(), other.try_number()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Convert to a `serde_json::Value` (undefined maps to null).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(Value::String("x".into()).is_truthy());
        assert!(Value::Object(HashMap::new()).is_truthy());
    }

    #[test]
    fn loose_equality() {
        assert!(Value::String("1".into()).loose_eq(&Value::Number(1.0)));
        assert!(Value::Number(1.0).loose_eq(&Value::Bool(true)));
        assert!(!Value::String("x".into()).loose_eq(&Value::Number(0.0)));
        assert!(!Value::Undefined.loose_eq(&Value::Number(0.0)));
        // string-to-string comparison stays strict
        assert!(!Value::String("1".into()).loose_eq(&Value::String("01".into())));
    }
}
