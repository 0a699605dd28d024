use std::mem;

use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Token, UnaryOp},
    lexer::Lexer,
    CompileError,
};

/// Syntax error produced while parsing a token stream.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expected {expected}, found {found} at position {position}")]
pub struct ParseError {
    pub position: usize,
    pub expected: String,
    pub found: String,
}

impl ParseError {
    /// Source position (character offset) of the offending token.
    pub fn position(&self) -> usize {
        self.position
    }
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_pos: usize,
    peeked: Option<(Token, usize)>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, CompileError> {
        let current_token = lexer.next_token()?;
        let current_pos = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            current_pos,
            peeked: None,
        })
    }

    fn advance(&mut self) -> Result<(), CompileError> {
        match self.peeked.take() {
            Some((token, pos)) => {
                self.current_token = token;
                self.current_pos = pos;
            }
            None => {
                self.current_token = self.lexer.next_token()?;
                self.current_pos = self.lexer.token_start();
            }
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token, CompileError> {
        if self.peeked.is_none() {
            let token = self.lexer.next_token()?;
            self.peeked = Some((token, self.lexer.token_start()));
        }
        Ok(&self.peeked.as_ref().unwrap().0)
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn expect(&mut self, expected: &Token) -> Result<(), CompileError> {
        if !self.check(expected) {
            return Err(self.unexpected(&expected.to_string()));
        }
        self.advance()
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        ParseError {
            position: self.current_pos,
            expected: expected.to_string(),
            found: self.current_token.to_string(),
        }
        .into()
    }

    /// Parse a complete expression; trailing input is an error.
    pub fn parse(&mut self) -> Result<Expr, CompileError> {
        let expr = self.parse_expression()?;
        if !self.check(&Token::Eof) {
            return Err(self.unexpected("end of input"));
        }
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, CompileError> {
        self.parse_ternary()
    }

    /// `cond ? then : else`, right-associative.
    fn parse_ternary(&mut self) -> Result<Expr, CompileError> {
        let condition = self.parse_or()?;

        if self.check(&Token::Question) {
            self.advance()?;
            let then = self.parse_expression()?;
            self.expect(&Token::Colon)?;
            let otherwise = self.parse_expression()?;

            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Ok(condition)
    }

    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.advance()?;
            let right = self.parse_and()?;

            left = Expr::BinaryOp {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_not()?;

        while self.check(&Token::And) {
            self.advance()?;
            let right = self.parse_not()?;

            left = Expr::BinaryOp {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, CompileError> {
        if self.check(&Token::Not) {
            self.advance()?;
            let operand = self.parse_not()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    /// Comparison and membership; non-chaining (`1 < 2 < 3` is a syntax
    /// error at the trailing `<`).
    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        let left = self.parse_additive()?;

        // 'not' in infix position can only mean 'not in' / 'not in~'
        let op = if self.check(&Token::Not) {
            match self.peek()? {
                Token::In => Some(BinOp::NotIn),
                Token::InLoose => Some(BinOp::NotInLoose),
                _ => return Err(self.unexpected("'in' or 'in~' after 'not'")),
            }
        } else {
            match &self.current_token {
                Token::EqEq => Some(BinOp::Equal),
                Token::NotEq => Some(BinOp::NotEqual),
                Token::Lt => Some(BinOp::LessThan),
                Token::Gt => Some(BinOp::GreaterThan),
                Token::LtEq => Some(BinOp::LessEqual),
                Token::GtEq => Some(BinOp::GreaterEqual),
                Token::Match => Some(BinOp::Matches),
                Token::In => Some(BinOp::In),
                Token::InLoose => Some(BinOp::InLoose),
                _ => None,
            }
        };

        if let Some(op) = op {
            self.advance()?;
            if op == BinOp::NotIn || op == BinOp::NotInLoose {
                self.advance()?; // consume the 'in' / 'in~' after 'not'
            }
            let right = self.parse_additive()?;

            return Ok(Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_power()?;

        loop {
            let op = match &self.current_token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                Token::Percent => BinOp::Modulo,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_power()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// `^` is right-associative: `2 ^ 3 ^ 2` is `2 ^ (3 ^ 2)`.
    fn parse_power(&mut self) -> Result<Expr, CompileError> {
        let base = self.parse_unary()?;

        if self.check(&Token::Caret) {
            self.advance()?;
            let exponent = self.parse_power()?;

            return Ok(Expr::BinaryOp {
                op: BinOp::Power,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        if self.check(&Token::Minus) {
            self.advance()?;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Negate,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    /// Property chains: `a.b.'c d'`. Only identifier paths chain; dotting
    /// into a call result or literal is a syntax error.
    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.parse_primary()?;

        while self.check(&Token::Dot) {
            self.advance()?;

            let segment = match mem::replace(&mut self.current_token, Token::Eof) {
                Token::Identifier(name) | Token::QuotedIdentifier(name) => {
                    self.advance()?;
                    name
                }
                token => {
                    self.current_token = token;
                    return Err(self.unexpected("identifier after '.'"));
                }
            };

            match &mut expr {
                Expr::Property(path) => path.push(segment),
                _ => return Err(self.unexpected("property path before '.'")),
            }
        }
        Ok(expr)
    }

    /// Primary expressions: literals, identifiers, calls, parenthesized
    /// expressions, and array literals.
    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Number(n) => {
                self.advance()?;
                Ok(Expr::Number(n))
            }
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::String(s))
            }
            Token::QuotedIdentifier(name) => {
                self.advance()?;
                Ok(Expr::Property(vec![name]))
            }
            Token::Identifier(name) => {
                self.advance()?;

                // A bare identifier immediately followed by '(' is a call
                if self.check(&Token::LParen) {
                    self.advance()?;
                    let args = self.parse_args()?;
                    return Ok(Expr::Call { name, args });
                }
                Ok(Expr::Property(vec![name]))
            }
            // '(' is grouping without a comma, an array literal with one
            Token::LParen => {
                self.advance()?;
                let first = self.parse_expression()?;

                if self.check(&Token::Comma) {
                    let mut elements = vec![first];
                    while self.check(&Token::Comma) {
                        self.advance()?;
                        elements.push(self.parse_expression()?);
                    }
                    self.expect(&Token::RParen)?;
                    return Ok(Expr::Array(elements));
                }

                self.expect(&Token::RParen)?;
                Ok(first)
            }
            Token::LBracket => {
                self.advance()?;
                let mut elements = vec![];

                while !self.check(&Token::RBracket) {
                    elements.push(self.parse_expression()?);

                    if !self.check(&Token::RBracket) {
                        self.expect(&Token::Comma)?;
                    }
                }

                self.expect(&Token::RBracket)?;
                Ok(Expr::Array(elements))
            }
            token => {
                self.current_token = token;
                Err(self.unexpected("an expression"))
            }
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, CompileError> {
        let mut args = vec![];

        if self.check(&Token::RParen) {
            self.advance()?;
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);

            if self.check(&Token::Comma) {
                self.advance()?;
            } else {
                break;
            }
        }

        self.expect(&Token::RParen)?;
        Ok(args)
    }
}
