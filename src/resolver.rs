//! Resolution of property paths and function calls against a data context,
//! memoized per context.
//!
//! Every resolution is keyed by `(kind, key)` and stored as a shared future
//! in the context's cache, so within and across evaluations of one context
//! the underlying accessor or function runs at most once per key until the
//! cache is reset. Concurrent evaluations against the same context awaiting
//! the same key share the in-flight future instead of re-invoking it.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::context::{ContextEntry, DataContext, ExprFunction, FnCtx};
use crate::evaluator::EvalError;
use crate::stdlib;
use crate::value::Value;

/// A memoized resolution: settled or in flight, shared between waiters.
pub(crate) type SharedResolution = Shared<BoxFuture<'static, Result<Value, EvalError>>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum CacheKey {
    /// Property path segments. Keyed by the segment vector, not a joined
    /// string: quoted identifiers may contain dots, so `'a.b'` and `a.b`
    /// are distinct paths and must not share a cache entry.
    Property(Vec<String>),
    /// Function name plus canonically encoded argument values
    Call(String, String),
}

/// Resolve a property path. A path the context does not define yields
/// `Value::Undefined`, never an error.
///
/// Returns a boxed future because resolution is mutually recursive with
/// [`fetch_path`].
pub(crate) fn resolve_property<'a>(
    ctx: &'a DataContext,
    path: &'a [String],
) -> BoxFuture<'a, Result<Value, EvalError>> {
    async move {
        let key = CacheKey::Property(path.to_vec());
        let shared = ctx.memoized(key, || {
            let ctx = ctx.clone();
            let path = path.to_vec();
            async move { fetch_path(ctx, path).await }.boxed().shared()
        });
        shared.await
    }
    .boxed()
}

/// Resolve a function call: caller-supplied functions first, then builtins.
/// An unregistered name is a runtime error (functions may be supplied only
/// at call time, so this is never a compile-time check).
pub(crate) async fn resolve_call(
    ctx: &DataContext,
    functions: &HashMap<String, Arc<dyn ExprFunction>>,
    name: &str,
    args: Vec<Value>,
) -> Result<Value, EvalError> {
    let key = CacheKey::Call(name.to_string(), encode_args(&args));

    if let Some(function) = functions.get(name) {
        let shared = ctx.memoized(key, || {
            let function = Arc::clone(function);
            let ctx = ctx.clone();
            async move {
                let fn_ctx = FnCtx::new(ctx);
                function.call(&fn_ctx, args).await
            }
            .boxed()
            .shared()
        });
        return shared.await;
    }

    if let Some(builtin) = stdlib::lookup(name) {
        let shared = ctx.memoized(key, || async move { builtin(&args) }.boxed().shared());
        return shared.await;
    }

    Err(EvalError::UnknownFunction(name.to_string()))
}

/// Canonical encoding of evaluated argument values for call cache keys.
fn encode_args(args: &[Value]) -> String {
    serde_json::Value::Array(args.iter().map(Value::to_json).collect()).to_string()
}

async fn fetch_path(ctx: DataContext, path: Vec<String>) -> Result<Value, EvalError> {
    enum Root {
        Missing,
        Ready(Value),
        Fetch(Arc<dyn crate::context::Accessor>),
        ViaRootKey,
    }

    // Clone out of the context before awaiting anything.
    let step = match ctx.entry(&path[0]) {
        None => Root::Missing,
        Some(ContextEntry::Value(v)) => Root::Ready(v.clone()),
        Some(ContextEntry::Accessor(a)) => {
            if path.len() == 1 {
                Root::Fetch(Arc::clone(a))
            } else {
                Root::ViaRootKey
            }
        }
    };

    let root = match step {
        Root::Missing => return Ok(Value::Undefined),
        Root::Ready(v) => v,
        Root::Fetch(accessor) => accessor.fetch().await?,
        // Sub-paths below an accessor memoize the fetch under the root's
        // own key, so the side effect happens at most once however many
        // distinct sub-paths are referenced.
        Root::ViaRootKey => resolve_property(&ctx, &path[..1]).await?,
    };

    Ok(walk_segments(root, &path[1..]))
}

/// Walk path segments over resolved data, own keys only. `length` on an
/// array or string resolves to its element/character count.
fn walk_segments(mut current: Value, segments: &[String]) -> Value {
    for segment in segments {
        current = match current {
            Value::Object(mut map) => map.remove(segment.as_str()).unwrap_or(Value::Undefined),
            Value::Array(arr) if segment == "length" => Value::Number(arr.len() as f64),
            Value::String(s) if segment == "length" => {
                Value::Number(s.chars().count() as f64)
            }
            _ => Value::Undefined,
        };
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_own_keys_only() {
        let nested = Value::Object(
            [("num".to_string(), Value::Number(6.0))].into_iter().collect(),
        );
        let walked = walk_segments(nested.clone(), &["num".to_string()]);
        assert_eq!(walked, Value::Number(6.0));

        let missing = walk_segments(nested, &["other".to_string()]);
        assert_eq!(missing, Value::Undefined);
    }

    #[test]
    fn length_segments() {
        let arr = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(
            walk_segments(arr, &["length".to_string()]),
            Value::Number(2.0)
        );
        assert_eq!(
            walk_segments(Value::String("héllo".into()), &["length".to_string()]),
            Value::Number(5.0)
        );
        assert_eq!(
            walk_segments(Value::Number(5.0), &["length".to_string()]),
            Value::Undefined
        );
    }
}
