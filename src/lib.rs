//! An embeddable filter expression language for evaluating untrusted
//! expressions against caller-supplied data.
//!
//! Expressions are compiled once and evaluated many times, each run against
//! its own [`DataContext`]. Evaluation is asynchronous: context properties
//! may be lazy [`Accessor`]s and caller-supplied functions may await, and
//! every resolution is memoized per context until its cache is reset.
//!
//! Expressions can only read the data they are given: property lookup walks
//! the own keys of the context, undefined paths soft-fail to a falsy value,
//! and nothing in the language converts a string into code.
//!
//! # Quick start
//!
//! ```
//! use sieve_lang::{compile, CompileOptions, DataContext, Value};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let filter = compile("transactions <= 5 and abs(profit) > 20.5", CompileOptions::new())?;
//!
//! let ctx = DataContext::from(json!({ "transactions": 3, "profit": -141.0 }));
//! assert_eq!(filter.eval(&ctx).await?, Value::Number(1.0));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

pub mod ast;
pub mod context;
pub mod evaluator;
pub mod lexer;
pub mod parser;
mod resolver;
mod stdlib;
pub mod value;

pub use ast::{BinOp, Expr, Token, UnaryOp};
pub use context::{
    reset_resolution_cache, sync_fn, Accessor, DataContext, DataContextBuilder, ExprFunction,
    FnCtx,
};
pub use evaluator::{EvalError, Evaluator};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser};
pub use value::Value;

/// Errors produced while compiling expression source text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CompileError {
    /// Source position (character offset) of the offending input.
    pub fn position(&self) -> usize {
        match self {
            CompileError::Lex(e) => e.position(),
            CompileError::Parse(e) => e.position(),
        }
    }
}

/// Per-compilation options: caller-supplied functions and parse hooks.
#[derive(Default)]
pub struct CompileOptions {
    functions: HashMap<String, Arc<dyn ExprFunction>>,
    on_parse: Option<Box<dyn Fn(&Expr) + Send + Sync>>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function callable from the expression. A function with a
    /// builtin's name overrides the builtin.
    pub fn function(mut self, name: impl Into<String>, f: Arc<dyn ExprFunction>) -> Self {
        self.functions.insert(name.into(), f);
        self
    }

    /// Register a synchronous closure as a function (see [`sync_fn`]).
    pub fn sync_function<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.function(name, sync_fn(f))
    }

    /// Observe the expression tree after a successful parse, before any
    /// evaluation.
    pub fn on_parse<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Expr) + Send + Sync + 'static,
    {
        self.on_parse = Some(Box::new(hook));
        self
    }
}

/// Compile expression source into a reusable [`Evaluator`].
///
/// Compilation reads only the source text; which data the expression will
/// run against is decided per [`Evaluator::eval`] call. Syntax problems are
/// reported here with a source position; unknown functions are runtime
/// errors, since functions are bound by name at call time.
pub fn compile(source: &str, options: CompileOptions) -> Result<Evaluator, CompileError> {
    let mut parser = Parser::new(Lexer::new(source))?;
    let expr = parser.parse()?;

    if let Some(hook) = &options.on_parse {
        hook(&expr);
    }

    Ok(Evaluator::new(Arc::new(expr), options.functions))
}
