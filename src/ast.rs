//! # Sieve Filter Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for the sieve filter
//! language, a small expression language for boolean/arithmetic/set filters
//! evaluated against caller-supplied data.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, paths, calls, operations)
//! - **[operators]** - Unary and binary operators
//!
//! ## Quick Start
//!
//! ```text
//! transactions <= 5 and abs(profit) > 20.5
//! ```
//!
//! This filter matches records with at most five transactions and an absolute
//! profit above 20.5.
//!
//! ## Core Concepts
//!
//! ### One expression, many evaluations
//!
//! An expression is parsed once into an immutable tree and then evaluated any
//! number of times against different data contexts. No node carries
//! evaluation-time state.
//!
//! ### Property paths
//!
//! Identifiers are dotted paths into the data context:
//!
//! ```text
//! order.total > 100
//! 'weird key!'.value == 1
//! ```
//!
//! Segments are bare identifiers or single-quoted identifiers (any character
//! except the quote). A missing path resolves to the undefined value rather
//! than raising.
//!
//! ### Booleans are numbers
//!
//! Comparisons, `not`, and membership tests produce the numeric booleans
//! `0` and `1`. The logical operators `and`/`or` short-circuit and return the
//! deciding operand's value unconverted.
//!
//! ## Examples
//!
//! ### Membership and set algebra
//!
//! ```text
//! category in ("meal", "dessert")
//! (1, 2) in union([1], [2, 3])
//! ```
//!
//! ### Fuzzy membership (loose equality)
//!
//! ```text
//! 1 in~ userIds
//! ```
//!
//! ### Ternary selection
//!
//! ```text
//! score > threshold ? "pass" : "fail"
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::Expr;
pub use operators::{BinOp, UnaryOp};
pub use tokens::Token;
