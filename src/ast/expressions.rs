use crate::ast::{BinOp, UnaryOp};

/// Abstract Syntax Tree node representing a parsed expression.
///
/// The tree is immutable once produced: it is compiled once and evaluated
/// many times against different data contexts.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    /// Literal number
    ///
    /// # Example
    /// ```text
    /// 42.5
    /// ```
    Number(f64),

    /// String literal
    ///
    /// # Example
    /// ```text
    /// "hello"
    /// ```
    String(String),

    /// Array literal
    ///
    /// Elements are full expressions, so nested literals and computed
    /// elements are legal.
    ///
    /// # Examples
    /// ```text
    /// (1, 2, 3)
    /// [[1, 2], [6 + 3]]
    /// ```
    Array(Vec<Expr>),

    // References
    /// Dotted property path into the data context
    ///
    /// Each segment is a bare identifier or a single-quoted identifier.
    /// A path that does not resolve yields the undefined value.
    ///
    /// # Examples
    /// ```text
    /// category
    /// obj.more.cowbell
    /// 'hello-world-foo'
    /// ```
    Property(Vec<String>),

    /// Function call
    ///
    /// The callee is looked up at evaluation time, caller-supplied
    /// functions first, then builtins; an unregistered name is a runtime
    /// error, never a compile-time one.
    ///
    /// # Example
    /// ```text
    /// max(a, b, 20)
    /// ```
    Call { name: String, args: Vec<Expr> },

    // Operations
    /// Prefix operation (`not`, unary minus)
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation (arithmetic, comparison, logical, membership)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Ternary selection
    ///
    /// Only the selected branch is evaluated.
    ///
    /// # Example
    /// ```text
    /// 1 < 2 ? 3 : 4
    /// ```
    Ternary {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}
