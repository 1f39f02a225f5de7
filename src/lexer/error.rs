use thiserror::Error;

#[derive(Error, Debug)]
#[error("Lexer error on line {line}: {message}")]
pub struct LexerError {
    pub message: String,
    pub line: usize,
}
