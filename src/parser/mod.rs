//! Main parser module that orchestrates the parsing process
//!
//! This module provides the main entry point for parsing tokens into an AST.
//! Statement and expression grammar live in their own submodules as further
//! `impl Parser` blocks.

use crate::ast::*;
use crate::lexer::{Token, TokenType};


mod expressions;
mod statements;

/// Error type for parsing failures
#[derive(Debug)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,
    /// Line number where the error occurred
    pub line: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error on line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Main entry point for parsing tokens into an AST
///
/// # Arguments
/// * `tokens` - Slice of tokens to parse, terminated by `Eof`
///
/// # Returns
/// * `Result<Module, ParseError>` - Parsed module or error
pub fn parse(tokens: &[Token]) -> Result<Module, ParseError> {
    let mut parser = Parser::new(tokens);
    let items = parser.parse_module()?;
    Ok(Module { items })
}

/// Main parser struct that coordinates the parsing process
pub struct Parser<'a> {
    /// Reference to the tokens being parsed
    tokens: &'a [Token],
    /// Current position in the token stream
    current: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses the entire module into top-level items
    pub fn parse_module(&mut self) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();

        while !self.is_at_end() {
            if self.match_token(&TokenType::Newline) {
                continue;
            }
            if self.check(&TokenType::Indent) {
                return Err(self.error_here("Unexpected indent"));
            }
            items.push(self.item()?);
        }

        Ok(items)
    }

    fn item(&mut self) -> Result<Item, ParseError> {
        if self.match_token(&TokenType::Def) {
            return Ok(Item::Function(self.function_definition()?));
        }

        if self.match_token(&TokenType::Import) {
            let module = self.dotted_name()?;
            if self.match_token(&TokenType::As) {
                self.identifier("Expected alias name after 'as'")?;
            }
            self.end_of_statement()?;
            return Ok(Item::Import { module });
        }

        if self.match_token(&TokenType::From) {
            let module = self.dotted_name()?;
            self.consume(&TokenType::Import, "Expected 'import' after module name")?;
            // Imported names are irrelevant to the pipeline; skip to end of line.
            while !self.check(&TokenType::Newline) && !self.is_at_end() {
                self.advance();
            }
            self.end_of_statement()?;
            return Ok(Item::Import { module });
        }

        Ok(Item::Statement(self.statement()?))
    }

    fn function_definition(&mut self) -> Result<FunctionDef, ParseError> {
        let line = self.previous().line;
        let name = self.identifier("Expected function name")?;
        self.consume(&TokenType::LeftParen, "Expected '(' after function name")?;

        let mut parameters = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                parameters.push(self.identifier("Expected parameter name")?);
                // Annotations and defaults are accepted and ignored.
                if self.match_token(&TokenType::Colon) {
                    self.expression()?;
                }
                if self.match_token(&TokenType::Assign) {
                    self.expression()?;
                }
                if !self.match_token(&TokenType::Comma) || self.check(&TokenType::RightParen) {
                    break;
                }
            }
        }
        self.consume(&TokenType::RightParen, "Expected ')' after parameters")?;

        if self.match_token(&TokenType::Arrow) {
            self.expression()?;
        }

        self.consume(&TokenType::Colon, "Expected ':' after function signature")?;
        let body = self.suite()?;

        Ok(FunctionDef {
            name,
            parameters,
            body,
            line,
        })
    }

    fn dotted_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.identifier("Expected module name")?;
        while self.match_token(&TokenType::Dot) {
            name.push('.');
            name.push_str(&self.identifier("Expected module name after '.'")?);
        }
        Ok(name)
    }

    fn identifier(&mut self, message: &str) -> Result<String, ParseError> {
        if let TokenType::Identifier(name) = &self.peek().token_type {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error_here(message))
        }
    }

    fn end_of_statement(&mut self) -> Result<(), ParseError> {
        if self.is_at_end() {
            return Ok(());
        }
        self.consume(&TokenType::Newline, "Expected end of line after statement")?;
        Ok(())
    }

    fn error_here(&self, message: &str) -> ParseError {
        ParseError {
            message: message.to_string(),
            line: self.peek().line,
        }
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            return true;
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }
        std::mem::discriminant(&self.peek().token_type) == std::mem::discriminant(token_type)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || matches!(self.peek().token_type, TokenType::Eof)
    }

    fn peek(&self) -> &Token {
        let index = self.current.min(self.tokens.len().saturating_sub(1));
        &self.tokens[index]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: &TokenType, message: &str) -> Result<&Token, ParseError> {
        if self.check(token_type) {
            return Ok(self.advance());
        }

        Err(self.error_here(message))
    }
}
