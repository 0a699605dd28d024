use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer or floating-point number
    ///
    /// All numbers are double-precision floats.
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// ```
    Number(f64),

    /// String literal enclosed in double quotes
    ///
    /// Supports `\n`, `\t`, `\r`, `\\`, `\"` and `\uXXXX` escapes.
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// "line\nbreak"
    /// ```
    String(String),

    // Identifiers
    /// Bare identifier or property-path segment
    ///
    /// Must start with a letter, underscore, or `$`, followed by letters,
    /// digits, underscores, or `$`.
    ///
    /// # Examples
    /// ```text
    /// category
    /// obj
    /// $_
    /// ```
    Identifier(String),

    /// Single-quoted identifier
    ///
    /// Any character except the single quote is allowed, so keys with
    /// spaces or symbols can still be addressed.
    ///
    /// # Examples
    /// ```text
    /// 'hello-world-foo'
    /// 'order+goo*and#stuff'
    /// ```
    QuotedIdentifier(String),

    // Keywords
    /// Logical AND (word, not symbol)
    And,

    /// Logical OR (word, not symbol)
    Or,

    /// Logical negation, also combines with `in` for `not in`
    Not,

    /// Membership test (strict equality)
    In,

    /// Fuzzy membership test (`in~`, loose equality)
    InLoose,

    // Comparison
    /// Equality operator
    EqEq,

    /// Inequality operator
    NotEq,

    /// Less than
    Lt,

    /// Greater than
    Gt,

    /// Less than or equal
    LtEq,

    /// Greater than or equal
    GtEq,

    /// Regular-expression match (`~=`)
    Match,

    // Arithmetic
    /// Addition
    Plus,

    /// Subtraction or unary minus
    Minus,

    /// Multiplication
    Star,

    /// Division
    Slash,

    /// Modulo
    Percent,

    /// Exponentiation (right-associative)
    Caret,

    // Delimiters
    /// Left parenthesis for grouping, call arguments, or array literals
    LParen,

    /// Right parenthesis
    RParen,

    /// Left bracket for array literals
    LBracket,

    /// Right bracket
    RBracket,

    /// Comma separating arguments or array elements
    Comma,

    /// Ternary condition marker
    Question,

    /// Ternary branch separator
    Colon,

    /// Dot for property-path chaining
    Dot,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(n) => write!(f, "number {}", n),
            Token::String(s) => write!(f, "string {:?}", s),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::QuotedIdentifier(name) => write!(f, "identifier '{}'", name),
            Token::And => write!(f, "'and'"),
            Token::Or => write!(f, "'or'"),
            Token::Not => write!(f, "'not'"),
            Token::In => write!(f, "'in'"),
            Token::InLoose => write!(f, "'in~'"),
            Token::EqEq => write!(f, "'=='"),
            Token::NotEq => write!(f, "'!='"),
            Token::Lt => write!(f, "'<'"),
            Token::Gt => write!(f, "'>'"),
            Token::LtEq => write!(f, "'<='"),
            Token::GtEq => write!(f, "'>='"),
            Token::Match => write!(f, "'~='"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Percent => write!(f, "'%'"),
            Token::Caret => write!(f, "'^'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Comma => write!(f, "','"),
            Token::Question => write!(f, "'?'"),
            Token::Colon => write!(f, "':'"),
            Token::Dot => write!(f, "'.'"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
