//! Expressions are confined to the data they are given: lookups walk own
//! keys only, nothing turns a string into code, and names that would be
//! dangerous in a host language are just ordinary (undefined) properties.

use serde_json::json;
use sieve_lang::{compile, CompileOptions, DataContext, EvalError, Value};

async fn eval(src: &str, ctx: &DataContext) -> Result<Value, EvalError> {
    compile(src, CompileOptions::new())
        .expect("compiles")
        .eval(ctx)
        .await
}

#[tokio::test]
async fn host_object_names_are_plain_properties() {
    let ctx = DataContext::from(json!({ "n": 1 }));

    assert_eq!(eval("toString", &ctx).await, Ok(Value::Undefined));
    assert_eq!(
        eval("constructor.constructor.name", &ctx).await,
        Ok(Value::Undefined)
    );
    assert_eq!(eval("__proto__", &ctx).await, Ok(Value::Undefined));
}

#[tokio::test]
async fn lookup_is_restricted_to_own_keys() {
    let ctx = DataContext::from(json!({ "obj": { "num": 6 } }));

    assert_eq!(eval("obj.num", &ctx).await, Ok(Value::Number(6.0)));
    assert_eq!(eval("obj.toString", &ctx).await, Ok(Value::Undefined));
    assert_eq!(eval("obj.constructor", &ctx).await, Ok(Value::Undefined));
}

#[tokio::test]
async fn unknown_functions_fail_without_side_effects() {
    let ctx = DataContext::new();

    assert_eq!(
        eval("replace(\"a\", \"b\")", &ctx).await,
        Err(EvalError::UnknownFunction("replace".into()))
    );
    assert_eq!(
        eval("eval(\"1 + 1\")", &ctx).await,
        Err(EvalError::UnknownFunction("eval".into()))
    );
}

#[tokio::test]
async fn missing_paths_soft_fail() {
    let ctx = DataContext::new();

    assert_eq!(eval("missing", &ctx).await, Ok(Value::Undefined));
    assert_eq!(eval("missing.sub.subsub", &ctx).await, Ok(Value::Undefined));
    assert_eq!(eval("missing.sub or 1", &ctx).await, Ok(Value::Number(1.0)));
    assert_eq!(eval("not missing", &ctx).await, Ok(Value::Number(1.0)));
}

#[tokio::test]
async fn calling_into_a_property_chain_is_a_syntax_error() {
    // 'constructor.constructor("...")' cannot even be expressed: calls are
    // bare names, never the result of a property walk
    assert!(compile(
        "constructor.constructor(\"return 1\")(\"\")",
        CompileOptions::new()
    )
    .is_err());
}
