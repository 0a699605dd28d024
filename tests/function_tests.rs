use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use sieve_lang::{
    compile, sync_fn, Accessor, CompileOptions, DataContext, EvalError, Expr, ExprFunction, FnCtx,
    Value,
};

fn num(n: f64) -> Value {
    Value::Number(n)
}

/// Accessor that counts its invocations and returns the running count.
struct Counter(AtomicU32);

#[async_trait]
impl Accessor for Counter {
    async fn fetch(&self) -> Result<Value, EvalError> {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(num(n as f64))
    }
}

struct Failing;

#[async_trait]
impl Accessor for Failing {
    async fn fetch(&self) -> Result<Value, EvalError> {
        Err(EvalError::failure("backend unavailable"))
    }
}

#[tokio::test]
async fn custom_functions_with_mixed_arguments() {
    let options = CompileOptions::new().sync_function("add", |args| {
        Ok(num(args.iter().map(Value::as_number).sum()))
    });
    let filter = compile("add('1', \"3\", 5) == nine", options).expect("compiles");

    let ctx = DataContext::from(json!({ "nine": 9, "1": 1 }));
    assert_eq!(filter.eval(&ctx).await, Ok(num(1.0)));
}

#[tokio::test]
async fn async_functions_are_awaited() {
    struct Delayed;

    #[async_trait]
    impl ExprFunction for Delayed {
        async fn call(&self, _ctx: &FnCtx, args: Vec<Value>) -> Result<Value, EvalError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(args.into_iter().next().unwrap_or(Value::Undefined))
        }
    }

    let options = CompileOptions::new().function("delayed", Arc::new(Delayed));
    let filter = compile("delayed(42) == 42", options).expect("compiles");
    assert_eq!(filter.eval(&DataContext::new()).await, Ok(num(1.0)));
}

#[tokio::test]
async fn functions_can_resolve_context_properties() {
    struct SelfProp;

    #[async_trait]
    impl ExprFunction for SelfProp {
        async fn call(&self, ctx: &FnCtx, args: Vec<Value>) -> Result<Value, EvalError> {
            ctx.resolve(&args[0].coerce_string()).await
        }
    }

    let options = CompileOptions::new().function("selfProp", Arc::new(SelfProp));
    let filter = compile("selfProp(\"foo\")", options).expect("compiles");

    let ctx = DataContext::from(json!({ "foo": "bar" }));
    assert_eq!(filter.eval(&ctx).await, Ok(Value::String("bar".into())));
}

#[tokio::test]
async fn builtins_can_be_overridden() {
    let options = CompileOptions::new().sync_function("floor", |_| Ok(num(42.0)));
    let filter = compile("floor(1.9)", options).expect("compiles");
    assert_eq!(filter.eval(&DataContext::new()).await, Ok(num(42.0)));
}

#[tokio::test]
async fn accessors_run_at_most_once_per_context() {
    let counter = Arc::new(Counter(AtomicU32::new(0)));
    let ctx = DataContext::builder()
        .accessor("counted", counter.clone())
        .build();

    let filter = compile("counted + counted", CompileOptions::new()).expect("compiles");
    assert_eq!(filter.eval(&ctx).await, Ok(num(2.0)));
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);

    // memoized across evaluations of the same context
    assert_eq!(filter.eval(&ctx).await, Ok(num(2.0)));
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);

    // and across evaluators sharing the context
    let other = compile("counted * 10", CompileOptions::new()).expect("compiles");
    assert_eq!(other.eval(&ctx).await, Ok(num(10.0)));
    assert_eq!(counter.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_evaluations_share_one_in_flight_resolution() {
    /// Counts invocations, then holds the resolution open long enough for
    /// a second evaluation to reach the same key while it is in flight.
    struct Slow(AtomicU32);

    #[async_trait]
    impl Accessor for Slow {
        async fn fetch(&self) -> Result<Value, EvalError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(num(7.0))
        }
    }

    let slow = Arc::new(Slow(AtomicU32::new(0)));
    let ctx = DataContext::builder().accessor("slow", slow.clone()).build();

    let filter = compile("slow", CompileOptions::new()).expect("compiles");
    let (a, b) = tokio::join!(filter.eval(&ctx), filter.eval(&ctx));

    assert_eq!(a, Ok(num(7.0)));
    assert_eq!(b, Ok(num(7.0)));
    assert_eq!(slow.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn resetting_the_cache_reruns_accessors() {
    let counter = Arc::new(Counter(AtomicU32::new(0)));
    let ctx = DataContext::builder()
        .accessor("counted", counter.clone())
        .build();

    let filter = compile("counted", CompileOptions::new()).expect("compiles");
    assert_eq!(filter.eval(&ctx).await, Ok(num(1.0)));
    assert_eq!(filter.eval(&ctx).await, Ok(num(1.0)));

    ctx.reset_resolution_cache();
    assert_eq!(filter.eval(&ctx).await, Ok(num(2.0)));
    assert_eq!(counter.0.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn separate_contexts_do_not_share_caches() {
    let counter = Arc::new(Counter(AtomicU32::new(0)));
    let a = DataContext::builder()
        .accessor("counted", counter.clone())
        .build();
    let b = DataContext::builder()
        .accessor("counted", counter.clone())
        .build();

    let filter = compile("counted", CompileOptions::new()).expect("compiles");
    assert_eq!(filter.eval(&a).await, Ok(num(1.0)));
    assert_eq!(filter.eval(&b).await, Ok(num(2.0)));
    assert_eq!(filter.eval(&a).await, Ok(num(1.0)));
}

#[tokio::test]
async fn function_calls_are_memoized_per_arguments() {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = calls.clone();
    let options = CompileOptions::new().sync_function("track", move |args| {
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(num(args[0].as_number() * 2.0))
    });

    let ctx = DataContext::new();
    let filter = compile("track(3) + track(3) + track(4)", options).expect("compiles");
    assert_eq!(filter.eval(&ctx).await, Ok(num(20.0)));
    // track(3) once, track(4) once
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn short_circuiting_skips_accessors() {
    let counter = Arc::new(Counter(AtomicU32::new(0)));
    let ctx = DataContext::builder()
        .accessor("counted", counter.clone())
        .build();

    let filter = compile("0 and counted", CompileOptions::new()).expect("compiles");
    assert_eq!(filter.eval(&ctx).await, Ok(num(0.0)));
    assert_eq!(counter.0.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn accessor_failures_propagate() {
    let ctx = DataContext::builder()
        .accessor("flaky", Arc::new(Failing))
        .build();

    let filter = compile("flaky == 1", CompileOptions::new()).expect("compiles");
    assert_eq!(
        filter.eval(&ctx).await,
        Err(EvalError::failure("backend unavailable"))
    );

    // the failure itself is memoized until the cache is reset
    assert_eq!(
        filter.eval(&ctx).await,
        Err(EvalError::failure("backend unavailable"))
    );
}

#[tokio::test]
async fn function_errors_propagate() {
    let options = CompileOptions::new().function(
        "boom",
        sync_fn(|_| Err(EvalError::failure("exploded"))),
    );
    let filter = compile("boom()", options).expect("compiles");
    assert_eq!(
        filter.eval(&DataContext::new()).await,
        Err(EvalError::failure("exploded"))
    );
}

#[tokio::test]
async fn parse_hook_fires_once_per_compile() {
    let fired = Arc::new(AtomicU32::new(0));
    let seen = fired.clone();
    let options = CompileOptions::new().on_parse(move |expr| {
        assert!(matches!(expr, Expr::BinaryOp { .. }));
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let filter = compile("1 + 2", options).expect("compiles");
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // evaluation does not re-fire the hook
    let ctx = DataContext::new();
    assert_eq!(filter.eval(&ctx).await, Ok(num(3.0)));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
