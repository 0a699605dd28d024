use thiserror::Error;

use crate::ast::Token;

/// Errors produced while tokenizing expression source text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A character that starts no token
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar { position: usize, ch: char },

    /// An identifier that begins with a digit (`0hey`, `123.456hey`)
    #[error("identifiers may not start with a digit (position {position})")]
    NumericIdentifier { position: usize },

    /// A string or quoted identifier with no closing quote
    #[error("unterminated literal starting at position {position}")]
    Unterminated { position: usize },

    /// A malformed `\uXXXX` escape
    #[error("invalid unicode escape at position {position}")]
    InvalidEscape { position: usize },
}

impl LexError {
    /// Source position (character offset) of the offending input.
    pub fn position(&self) -> usize {
        match self {
            LexError::UnexpectedChar { position, .. }
            | LexError::NumericIdentifier { position }
            | LexError::Unterminated { position }
            | LexError::InvalidEscape { position } => *position,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
    // The segment after a '.' may start with a digit ($_.0$$), which is
    // otherwise a malformed number.
    after_dot: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
            after_dot: false,
        }
    }

    /// Start position (character offset) of the most recent token.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn is_ident_start(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
    }

    fn is_ident_char(ch: char) -> bool {
        ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if Self::is_ident_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    /// Path segment following a '.'; digit-leading segments like `0$$` are
    /// legal here, purely numeric ones are not.
    fn read_dot_segment(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let segment = self.read_identifier();
        if segment.chars().all(|c| c.is_ascii_digit()) {
            return Err(LexError::NumericIdentifier { position: start });
        }
        Ok(Token::Identifier(segment))
    }

    fn read_quoted_identifier(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        self.advance(); // consume opening quote

        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch == '\'' {
                self.advance();
                return Ok(Token::QuotedIdentifier(result));
            }
            result.push(ch);
            self.advance();
        }

        Err(LexError::Unterminated { position: start })
    }

    fn read_string(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        self.advance(); // consume opening quote

        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(Token::String(result));
                }
                '\\' => {
                    self.advance(); // consume backslash
                    match self.current_char() {
                        Some('n') => {
                            result.push('\n');
                            self.advance();
                        }
                        Some('t') => {
                            result.push('\t');
                            self.advance();
                        }
                        Some('r') => {
                            result.push('\r');
                            self.advance();
                        }
                        Some('u') => {
                            self.advance();
                            let c = self.read_unicode_escape()?;
                            result.push(c);
                        }
                        // Unknown escapes pass the character through
                        Some(other) => {
                            result.push(other);
                            self.advance();
                        }
                        None => return Err(LexError::Unterminated { position: start }),
                    }
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::Unterminated { position: start })
    }

    /// Four hex digits after `\u`. Surrogate pairs written as two
    /// consecutive escapes combine into one scalar; a lone surrogate cannot
    /// be stored in UTF-8 and becomes U+FFFD.
    fn read_unicode_escape(&mut self) -> Result<char, LexError> {
        let first = self.read_hex4()?;
        if (0xD800..=0xDBFF).contains(&first) {
            if self.current_char() == Some('\\') && self.peek_char(1) == Some('u') {
                let save = self.position;
                self.advance();
                self.advance();
                let second = self.read_hex4()?;
                if (0xDC00..=0xDFFF).contains(&second) {
                    let combined = 0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00);
                    return Ok(char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                self.position = save;
            }
            return Ok(char::REPLACEMENT_CHARACTER);
        }
        Ok(char::from_u32(first).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn read_hex4(&mut self) -> Result<u32, LexError> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = self
                .current_char()
                .and_then(|c| c.to_digit(16))
                .ok_or(LexError::InvalidEscape {
                    position: self.position,
                })?;
            value = value * 16 + digit;
            self.advance();
        }
        Ok(value)
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let start = self.position;
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // "0hey" and "123.456hey" are not numbers followed by identifiers
        if self.current_char().is_some_and(Self::is_ident_start) {
            return Err(LexError::NumericIdentifier { position: start });
        }

        match number.parse::<f64>() {
            Ok(n) => Ok(Token::Number(n)),
            Err(_) => Err(LexError::NumericIdentifier { position: start }),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.token_start = self.position;

        let after_dot = self.after_dot;
        self.after_dot = false;

        match self.current_char() {
            None => Ok(Token::Eof),
            Some(ch) if after_dot && Self::is_ident_char(ch) => self.read_dot_segment(),
            Some('.') => {
                self.advance();
                self.after_dot = true;
                Ok(Token::Dot)
            }
            Some(',') => {
                self.advance();
                Ok(Token::Comma)
            }
            Some('+') => {
                self.advance();
                Ok(Token::Plus)
            }
            Some('-') => {
                self.advance();
                Ok(Token::Minus)
            }
            Some('*') => {
                self.advance();
                Ok(Token::Star)
            }
            Some('/') => {
                self.advance();
                Ok(Token::Slash)
            }
            Some('%') => {
                self.advance();
                Ok(Token::Percent)
            }
            Some('^') => {
                self.advance();
                Ok(Token::Caret)
            }
            Some('?') => {
                self.advance();
                Ok(Token::Question)
            }
            Some(':') => {
                self.advance();
                Ok(Token::Colon)
            }
            Some('~') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::Match)
                } else {
                    Err(LexError::UnexpectedChar {
                        position: self.position,
                        ch: '~',
                    })
                }
            }
            Some('=') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::EqEq)
                } else {
                    Err(LexError::UnexpectedChar {
                        position: self.position,
                        ch: '=',
                    })
                }
            }
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::NotEq)
                } else {
                    Err(LexError::UnexpectedChar {
                        position: self.position,
                        ch: '!',
                    })
                }
            }
            Some('>') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::GtEq)
                } else {
                    self.advance();
                    Ok(Token::Gt)
                }
            }
            Some('<') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Ok(Token::LtEq)
                } else {
                    self.advance();
                    Ok(Token::Lt)
                }
            }
            Some('(') => {
                self.advance();
                Ok(Token::LParen)
            }
            Some(')') => {
                self.advance();
                Ok(Token::RParen)
            }
            Some('[') => {
                self.advance();
                Ok(Token::LBracket)
            }
            Some(']') => {
                self.advance();
                Ok(Token::RBracket)
            }
            Some('"') => self.read_string(),
            Some('\'') => self.read_quoted_identifier(),
            Some(ch) if Self::is_ident_start(ch) => {
                let ident = self.read_identifier();

                match ident.as_str() {
                    "and" => Ok(Token::And),
                    "or" => Ok(Token::Or),
                    "not" => Ok(Token::Not),
                    "in" => {
                        if self.current_char() == Some('~') {
                            self.advance();
                            Ok(Token::InLoose)
                        } else {
                            Ok(Token::In)
                        }
                    }
                    _ => Ok(Token::Identifier(ident)),
                }
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number(),
            Some(ch) => Err(LexError::UnexpectedChar {
                position: self.position,
                ch,
            }),
        }
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and or not in in~");
    assert_eq!(lexer.next_token().unwrap(), Token::And);
    assert_eq!(lexer.next_token().unwrap(), Token::Or);
    assert_eq!(lexer.next_token().unwrap(), Token::Not);
    assert_eq!(lexer.next_token().unwrap(), Token::In);
    assert_eq!(lexer.next_token().unwrap(), Token::InLoose);
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}

#[test]
fn test_dotted_path() {
    let mut lexer = Lexer::new("$_.0$$");
    assert_eq!(
        lexer.next_token().unwrap(),
        Token::Identifier("$_".to_string())
    );
    assert_eq!(lexer.next_token().unwrap(), Token::Dot);
    assert_eq!(
        lexer.next_token().unwrap(),
        Token::Identifier("0$$".to_string())
    );
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}
