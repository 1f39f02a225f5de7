use std::fmt;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum TokenType {
    // Keywords
    Def,
    If,
    Elif,
    Else,
    For,
    In,
    While,
    Break,
    Continue,
    Pass,
    Return,
    And,
    Or,
    Not,
    True,
    False,
    None,
    Import,
    From,
    As,

    // Identifiers and literals
    Identifier(String),
    String(String),
    Integer(i64),
    Float(f64),

    // Operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    EqualEqual,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Assignment
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    DoubleStarAssign,
    SlashAssign,
    DoubleSlashAssign,
    PercentAssign,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Colon,
    Comma,
    Dot,
    Arrow,

    // Layout
    Newline,
    Indent,
    Dedent,

    // Other
    Eof,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub line: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} '{}'", self.token_type, self.lexeme)
    }
}
