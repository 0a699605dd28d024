use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::evaluator::EvalError;
use crate::resolver::{CacheKey, SharedResolution};
use crate::value::Value;

/// An asynchronous leaf value in a data context.
///
/// Accessors are invoked lazily the first time a property path reaches them
/// and the settled result is memoized in the context's resolution cache, so
/// an impure or expensive accessor runs at most once per context until
/// [`DataContext::reset_resolution_cache`] is called.
#[async_trait]
pub trait Accessor: Send + Sync {
    async fn fetch(&self) -> Result<Value, EvalError>;
}

/// A caller-supplied function callable from expressions.
///
/// Functions may be synchronous or genuinely asynchronous; the evaluator
/// awaits either uniformly. A function with the same name as a builtin
/// overrides the builtin. The [`FnCtx`] handle lets the implementation
/// resolve property paths against the current data context, the same way
/// the evaluator itself does.
///
/// For plain synchronous functions, see [`sync_fn`].
#[async_trait]
pub trait ExprFunction: Send + Sync {
    async fn call(&self, ctx: &FnCtx, args: Vec<Value>) -> Result<Value, EvalError>;
}

/// Capability handed to caller-supplied functions: property resolution
/// against the data context of the current evaluation.
pub struct FnCtx {
    ctx: DataContext,
}

impl FnCtx {
    pub(crate) fn new(ctx: DataContext) -> Self {
        FnCtx { ctx }
    }

    /// Resolve a dotted property path, memoized like any other resolution.
    pub async fn resolve(&self, path: &str) -> Result<Value, EvalError> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        crate::resolver::resolve_property(&self.ctx, &segments).await
    }
}

/// Wrap a synchronous closure as an [`ExprFunction`].
///
/// # Examples
///
/// ```
/// use sieve_lang::{sync_fn, Value};
///
/// let add = sync_fn(|args| {
///     Ok(Value::Number(args.iter().map(Value::as_number).sum()))
/// });
/// ```
pub fn sync_fn<F>(f: F) -> Arc<dyn ExprFunction>
where
    F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
{
    struct SyncFn<F>(F);

    #[async_trait]
    impl<F> ExprFunction for SyncFn<F>
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync,
    {
        async fn call(&self, _ctx: &FnCtx, args: Vec<Value>) -> Result<Value, EvalError> {
            (self.0)(&args)
        }
    }

    Arc::new(SyncFn(f))
}

/// A root entry of a data context: plain data or a lazy accessor.
pub enum ContextEntry {
    Value(Value),
    Accessor(Arc<dyn Accessor>),
}

struct ContextInner {
    entries: HashMap<String, ContextEntry>,
    cache: Mutex<HashMap<CacheKey, SharedResolution>>,
}

/// The caller-owned data an expression is evaluated against.
///
/// A context maps root names to data (or to lazy [`Accessor`]s). Lookups
/// below a root walk the own keys of nested objects only; there is no
/// inherited or shared state an expression could reach. The core never
/// mutates a context.
///
/// Cloning is cheap (shared handle). The resolution cache is addressed by
/// this shared identity: clones of one context share one cache, and
/// independent contexts never share cache entries.
///
/// # Examples
///
/// ```
/// use sieve_lang::DataContext;
/// use serde_json::json;
///
/// let ctx = DataContext::from(json!({ "category": "meal", "obj": { "num": 6 } }));
/// ```
#[derive(Clone, Default)]
pub struct DataContext {
    inner: Arc<ContextInner>,
}

impl Default for ContextInner {
    fn default() -> Self {
        ContextInner {
            entries: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl DataContext {
    /// An empty context: every property path resolves to undefined.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> DataContextBuilder {
        DataContextBuilder {
            entries: HashMap::new(),
        }
    }

    /// Clear this context's memoized resolutions.
    ///
    /// The next evaluation re-invokes accessors and functions as if the
    /// context were fresh. Other contexts are unaffected; safe to call
    /// between evaluations at any time. Note the cache is shared by every
    /// compiled expression evaluated against this context, so resetting
    /// also discards results memoized by other evaluators.
    pub fn reset_resolution_cache(&self) {
        let mut cache = self
            .inner
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.clear();
    }

    pub(crate) fn entry(&self, name: &str) -> Option<&ContextEntry> {
        self.inner.entries.get(name)
    }

    /// Look up or install the shared resolution future for `key`.
    ///
    /// The future is created under the lock so concurrent callers on the
    /// same key always await the same in-flight resolution, but it is
    /// awaited outside it.
    pub(crate) fn memoized<F>(&self, key: CacheKey, make: F) -> SharedResolution
    where
        F: FnOnce() -> SharedResolution,
    {
        let mut cache = self
            .inner
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.entry(key).or_insert_with(make).clone()
    }
}

/// Clear the memoized resolutions of one context. Free-function alias for
/// [`DataContext::reset_resolution_cache`].
pub fn reset_resolution_cache(ctx: &DataContext) {
    ctx.reset_resolution_cache();
}

impl From<serde_json::Value> for DataContext {
    /// Build a context from a JSON object; each top-level key becomes a
    /// root entry. Non-object values produce an empty context.
    fn from(v: serde_json::Value) -> Self {
        let mut builder = DataContext::builder();
        if let serde_json::Value::Object(map) = v {
            for (k, v) in map {
                builder = builder.value(k, Value::from(v));
            }
        }
        builder.build()
    }
}

pub struct DataContextBuilder {
    entries: HashMap<String, ContextEntry>,
}

impl DataContextBuilder {
    /// Add a plain data entry under a root name.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries
            .insert(name.into(), ContextEntry::Value(value.into()));
        self
    }

    /// Add a lazy accessor under a root name.
    pub fn accessor(mut self, name: impl Into<String>, accessor: Arc<dyn Accessor>) -> Self {
        self.entries
            .insert(name.into(), ContextEntry::Accessor(accessor));
        self
    }

    pub fn build(self) -> DataContext {
        DataContext {
            inner: Arc::new(ContextInner {
                entries: self.entries,
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }
}
