//! SQL Lexer (Tokenizer)
//!
//! This module converts SQL strings into a stream of tokens. Every token
//! carries the byte offset it started at, which parser errors report.

use super::token::Token;
use crate::error::{Error, Result};

/// SQL Lexer
pub struct Lexer {
    /// Input characters with their byte offsets
    input: Vec<(usize, char)>,
    /// Current position in `input`
    position: usize,
    /// Byte length of the source, used as the offset of EOF
    len: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        Self {
            input: input.char_indices().collect(),
            position: 0,
            len: input.len(),
        }
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> Result<Vec<(Token, usize)>> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let done = token.0 == Token::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(tokens)
    }

    /// Get the next token and its starting byte offset
    fn next_token(&mut self) -> Result<(Token, usize)> {
        loop {
            self.skip_whitespace();
            if !self.at_line_comment() {
                break;
            }
            while !self.is_at_end() && self.current_char() != '\n' {
                self.advance();
            }
        }

        if self.is_at_end() {
            return Ok((Token::Eof, self.len));
        }

        let offset = self.current_offset();
        let ch = self.current_char();

        if let Some(token) = Self::single_char_token(ch) {
            self.advance();
            return Ok((token, offset));
        }

        let token = match ch {
            '<' => {
                self.advance();
                match self.current_char_opt() {
                    Some('=') => {
                        self.advance();
                        Token::Lte
                    }
                    Some('>') => {
                        self.advance();
                        Token::Neq
                    }
                    _ => Token::Lt,
                }
            }
            '>' => {
                self.advance();
                if self.current_char_opt() == Some('=') {
                    self.advance();
                    Token::Gte
                } else {
                    Token::Gt
                }
            }
            '!' => {
                self.advance();
                if self.current_char_opt() == Some('=') {
                    self.advance();
                    Token::Neq
                } else {
                    return Err(Error::UnexpectedCharacter('!', offset));
                }
            }
            '-' => {
                // comments were consumed above, so '-' only starts a
                // negative number literal
                self.advance();
                if self.current_char_opt().is_some_and(|c| c.is_ascii_digit()) {
                    match self.read_number(offset)? {
                        Token::IntegerLiteral(n) => Token::IntegerLiteral(-n),
                        Token::FloatLiteral(n) => Token::FloatLiteral(-n),
                        token => token,
                    }
                } else {
                    return Err(Error::UnexpectedCharacter('-', offset));
                }
            }
            '\'' => self.read_string(offset)?,
            c if c.is_ascii_digit() => self.read_number(offset)?,
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c => return Err(Error::UnexpectedCharacter(c, offset)),
        };

        Ok((token, offset))
    }

    fn single_char_token(ch: char) -> Option<Token> {
        match ch {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            ';' => Some(Token::Semicolon),
            '.' => Some(Token::Dot),
            '*' => Some(Token::Asterisk),
            '=' => Some(Token::Eq),
            _ => None,
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.position].1
    }

    fn current_char_opt(&self) -> Option<char> {
        self.input.get(self.position).map(|&(_, c)| c)
    }

    fn current_offset(&self) -> usize {
        self.input
            .get(self.position)
            .map_or(self.len, |&(offset, _)| offset)
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).map(|&(_, c)| c)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn at_line_comment(&self) -> bool {
        !self.is_at_end() && self.current_char() == '-' && self.peek_char() == Some('-')
    }

    /// Read a string literal; '' escapes an embedded quote
    fn read_string(&mut self, start: usize) -> Result<Token> {
        self.advance(); // opening quote

        let mut value = String::new();
        while !self.is_at_end() {
            let ch = self.current_char();
            if ch == '\'' {
                if self.peek_char() == Some('\'') {
                    value.push('\'');
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // closing quote
                    return Ok(Token::StringLiteral(value));
                }
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Err(Error::UnterminatedString(start))
    }

    /// Read a number (integer, or float when a fraction follows)
    fn read_number(&mut self, start: usize) -> Result<Token> {
        let mut value = String::new();
        let mut is_float = false;

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '.' && !is_float {
                // a digit must follow, otherwise the dot is an operator
                if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    is_float = true;
                    value.push(ch);
                    self.advance();
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        if is_float {
            value
                .parse::<f64>()
                .map(Token::FloatLiteral)
                .map_err(|_| Error::InvalidNumber(start))
        } else {
            value
                .parse::<i64>()
                .map(Token::IntegerLiteral)
                .map_err(|_| Error::InvalidNumber(start))
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut value = String::new();
        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::from_keyword(&value).unwrap_or(Token::Identifier(value))
    }
}
