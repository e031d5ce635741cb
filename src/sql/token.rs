//! SQL Token definitions
//!
//! This module defines all tokens that can appear in SQL statements.

use std::fmt;

/// SQL Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // ========== Keywords ==========
    // DDL
    Create,
    Table,
    Drop,

    // DML
    Select,
    Insert,
    Update,
    Delete,
    Into,
    Values,
    Set,
    From,
    Where,

    // Clauses
    And,
    Or,
    Not,
    As,
    On,
    Join,
    Inner,

    // Ordering
    Order,
    By,
    Asc,
    Desc,
    Limit,

    // Constraints
    Primary,
    Key,
    Unique,
    Null,

    // Data Types
    Integer,
    Text,
    Float,
    Boolean,

    // Boolean Literals
    True,
    False,

    // ========== Literals ==========
    /// Integer literal
    IntegerLiteral(i64),
    /// Float literal
    FloatLiteral(f64),
    /// String literal (single-quoted)
    StringLiteral(String),
    /// Identifier (table name, column name, etc.)
    Identifier(String),

    // ========== Operators ==========
    /// =
    Eq,
    /// <> or !=
    Neq,
    /// <
    Lt,
    /// >
    Gt,
    /// <=
    Lte,
    /// >=
    Gte,
    /// *
    Asterisk,

    // ========== Delimiters ==========
    /// (
    LParen,
    /// )
    RParen,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,

    // ========== Special ==========
    /// End of input
    Eof,
}

/// Keyword spellings and their tokens
const KEYWORDS: &[(&str, Token)] = &[
    ("CREATE", Token::Create),
    ("TABLE", Token::Table),
    ("DROP", Token::Drop),
    ("SELECT", Token::Select),
    ("INSERT", Token::Insert),
    ("UPDATE", Token::Update),
    ("DELETE", Token::Delete),
    ("INTO", Token::Into),
    ("VALUES", Token::Values),
    ("SET", Token::Set),
    ("FROM", Token::From),
    ("WHERE", Token::Where),
    ("AND", Token::And),
    ("OR", Token::Or),
    ("NOT", Token::Not),
    ("AS", Token::As),
    ("ON", Token::On),
    ("JOIN", Token::Join),
    ("INNER", Token::Inner),
    ("ORDER", Token::Order),
    ("BY", Token::By),
    ("ASC", Token::Asc),
    ("DESC", Token::Desc),
    ("LIMIT", Token::Limit),
    ("PRIMARY", Token::Primary),
    ("KEY", Token::Key),
    ("UNIQUE", Token::Unique),
    ("NULL", Token::Null),
    ("INTEGER", Token::Integer),
    ("TEXT", Token::Text),
    ("FLOAT", Token::Float),
    ("BOOLEAN", Token::Boolean),
    ("TRUE", Token::True),
    ("FALSE", Token::False),
];

impl Token {
    /// Try to parse a keyword from a string (case-insensitive)
    pub fn from_keyword(s: &str) -> Option<Token> {
        let upper = s.to_uppercase();
        KEYWORDS
            .iter()
            .find(|(spelling, _)| *spelling == upper)
            .map(|(_, token)| token.clone())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntegerLiteral(n) => write!(f, "{}", n),
            Token::FloatLiteral(n) => write!(f, "{}", n),
            Token::StringLiteral(s) => write!(f, "'{}'", s),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "<>"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Lte => write!(f, "<="),
            Token::Gte => write!(f, ">="),
            Token::Asterisk => write!(f, "*"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Dot => write!(f, "."),
            Token::Eof => write!(f, "end of input"),
            keyword => {
                let spelling = KEYWORDS
                    .iter()
                    .find(|(_, token)| token == keyword)
                    .map_or("?", |(spelling, _)| *spelling);
                write!(f, "{}", spelling)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_parsing() {
        assert_eq!(Token::from_keyword("SELECT"), Some(Token::Select));
        assert_eq!(Token::from_keyword("select"), Some(Token::Select));
        assert_eq!(Token::from_keyword("SeLeCt"), Some(Token::Select));
        assert_eq!(Token::from_keyword("unknown"), None);
    }

    #[test]
    fn test_every_keyword_displays_its_spelling() {
        for (spelling, token) in KEYWORDS {
            assert_eq!(token.to_string(), *spelling);
        }
        assert_eq!(Token::Lte.to_string(), "<=");
    }
}
