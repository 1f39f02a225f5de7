//! Statement parsing module
//!
//! Compound statements (`if`/`elif`/`else`, `while`, `for`) take a suite,
//! which is either an indented block or a single simple statement on the
//! header line.

use super::{ParseError, Parser};
use crate::ast::*;
use crate::lexer::TokenType;

impl<'a> Parser<'a> {
    pub(super) fn suite(&mut self) -> Result<Vec<Statement>, ParseError> {
        if !self.match_token(&TokenType::Newline) {
            return Ok(vec![self.simple_statement()?]);
        }

        self.consume(&TokenType::Indent, "Expected an indented block")?;

        let mut statements = Vec::new();
        while !self.check(&TokenType::Dedent) && !self.is_at_end() {
            if self.match_token(&TokenType::Newline) {
                continue;
            }
            statements.push(self.statement()?);
        }

        self.consume(&TokenType::Dedent, "Expected end of indented block")?;
        Ok(statements)
    }

    pub(super) fn statement(&mut self) -> Result<Statement, ParseError> {
        if self.match_token(&TokenType::If) {
            return self.if_statement();
        }

        if self.match_token(&TokenType::While) {
            return self.while_statement();
        }

        if self.match_token(&TokenType::For) {
            return self.for_statement();
        }

        if self.check(&TokenType::Def) {
            return Err(self.error_here("Nested function definitions are not supported"));
        }

        if self.check(&TokenType::Indent) {
            return Err(self.error_here("Unexpected indent"));
        }

        self.simple_statement()
    }

    /// Parses `if` after the keyword. An `elif` chain becomes a single nested
    /// `If` in the alternative branch.
    fn if_statement(&mut self) -> Result<Statement, ParseError> {
        let test = self.expression()?;
        self.consume(&TokenType::Colon, "Expected ':' after if condition")?;
        let body = self.suite()?;

        let orelse = if self.match_token(&TokenType::Elif) {
            vec![self.if_statement()?]
        } else if self.match_token(&TokenType::Else) {
            self.consume(&TokenType::Colon, "Expected ':' after 'else'")?;
            self.suite()?
        } else {
            Vec::new()
        };

        Ok(Statement::If { test, body, orelse })
    }

    fn while_statement(&mut self) -> Result<Statement, ParseError> {
        let test = self.expression()?;
        self.consume(&TokenType::Colon, "Expected ':' after while condition")?;
        let body = self.suite()?;

        if self.check(&TokenType::Else) {
            return Err(self.error_here("'else' clauses on loops are not supported"));
        }

        Ok(Statement::While { test, body })
    }

    fn for_statement(&mut self) -> Result<Statement, ParseError> {
        let target = self.identifier("Expected loop variable name after 'for'")?;
        self.consume(&TokenType::In, "Expected 'in' after loop variable")?;
        let iter = self.expression()?;
        self.consume(&TokenType::Colon, "Expected ':' after for clause")?;
        let body = self.suite()?;

        if self.check(&TokenType::Else) {
            return Err(self.error_here("'else' clauses on loops are not supported"));
        }

        Ok(Statement::For { target, iter, body })
    }

    fn simple_statement(&mut self) -> Result<Statement, ParseError> {
        let statement = self.small_statement()?;
        self.end_of_statement()?;
        Ok(statement)
    }

    fn small_statement(&mut self) -> Result<Statement, ParseError> {
        if self.match_token(&TokenType::Break) {
            return Ok(Statement::Break);
        }

        if self.match_token(&TokenType::Continue) {
            return Ok(Statement::Continue);
        }

        if self.match_token(&TokenType::Pass) {
            return Ok(Statement::Pass);
        }

        if self.match_token(&TokenType::Return) {
            let value = if self.check(&TokenType::Newline) || self.is_at_end() {
                None
            } else {
                Some(self.expression()?)
            };
            return Ok(Statement::Return { value });
        }

        let expr = self.expression()?;

        if self.match_token(&TokenType::Assign) {
            let line = self.previous().line;
            let target = Self::assignment_target(expr, line)?;
            let value = self.expression()?;
            if self.check(&TokenType::Assign) {
                return Err(self.error_here("Chained assignment is not supported"));
            }
            return Ok(Statement::Assign { target, value });
        }

        if let Some(operator) = self.augmented_operator() {
            let line = self.previous().line;
            let target = Self::assignment_target(expr, line)?;
            let value = self.expression()?;
            return Ok(Statement::AugAssign {
                target,
                operator,
                value,
            });
        }

        Ok(Statement::Expression(expr))
    }

    fn assignment_target(expr: Expr, line: usize) -> Result<Expr, ParseError> {
        match expr {
            Expr::Name(_) | Expr::Subscript { .. } => Ok(expr),
            _ => Err(ParseError {
                message: "Invalid assignment target".to_string(),
                line,
            }),
        }
    }

    fn augmented_operator(&mut self) -> Option<BinaryOperator> {
        let operator = match self.peek().token_type {
            TokenType::PlusAssign => BinaryOperator::Add,
            TokenType::MinusAssign => BinaryOperator::Sub,
            TokenType::StarAssign => BinaryOperator::Mul,
            TokenType::SlashAssign => BinaryOperator::Div,
            TokenType::DoubleSlashAssign => BinaryOperator::FloorDiv,
            TokenType::PercentAssign => BinaryOperator::Mod,
            TokenType::DoubleStarAssign => BinaryOperator::Pow,
            _ => return None,
        };
        self.advance();
        Some(operator)
    }
}
