/// Binary operators.
///
/// Logical operators short-circuit and are value-preserving; comparison and
/// membership operators always produce the numeric booleans 0/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,

    /// Regular-expression match (`~=`); the right operand is the pattern
    Matches,

    // Logical
    And,
    Or,

    // Membership
    /// `in` - member/subset test with strict equality
    In,
    /// `not in`
    NotIn,
    /// `in~` - member/subset test with loose (coercive) equality
    InLoose,
    /// `not in~`
    NotInLoose,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `not` - logical negation, yields 0 or 1
    Not,
    /// Unary minus, numeric negation
    Negate,
}
