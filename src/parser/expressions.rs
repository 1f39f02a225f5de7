//! Expression parsing module
//!
//! Precedence climbing from lowest to highest:
//! `or`, `and`, `not`, comparisons, `+ -`, `* / // %`, unary `- +`, `**`,
//! then calls, subscripts and method calls on atoms.

use super::{ParseError, Parser};
use crate::ast::*;
use crate::lexer::TokenType;

impl<'a> Parser<'a> {
    pub(super) fn expression(&mut self) -> Result<Expr, ParseError> {
        self.or()
    }

    fn or(&mut self) -> Result<Expr, ParseError> {
        let first = self.and()?;
        if !self.check(&TokenType::Or) {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.match_token(&TokenType::Or) {
            values.push(self.and()?);
        }

        Ok(Expr::BoolOp {
            operator: BoolOperator::Or,
            values,
        })
    }

    fn and(&mut self) -> Result<Expr, ParseError> {
        let first = self.not()?;
        if !self.check(&TokenType::And) {
            return Ok(first);
        }

        let mut values = vec![first];
        while self.match_token(&TokenType::And) {
            values.push(self.not()?);
        }

        Ok(Expr::BoolOp {
            operator: BoolOperator::And,
            values,
        })
    }

    fn not(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenType::Not) {
            let operand = self.not()?;
            return Ok(Expr::Unary {
                operator: UnaryOperator::Not,
                operand: Box::new(operand),
            });
        }

        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.term()?;

        let mut operators = Vec::new();
        let mut comparators = Vec::new();
        while let Some(operator) = self.compare_operator() {
            operators.push(operator);
            comparators.push(self.term()?);
        }

        if operators.is_empty() {
            return Ok(left);
        }

        Ok(Expr::Compare {
            left: Box::new(left),
            operators,
            comparators,
        })
    }

    fn compare_operator(&mut self) -> Option<CompareOperator> {
        let operator = match self.peek().token_type {
            TokenType::Less => CompareOperator::Less,
            TokenType::LessEqual => CompareOperator::LessEqual,
            TokenType::Greater => CompareOperator::Greater,
            TokenType::GreaterEqual => CompareOperator::GreaterEqual,
            TokenType::EqualEqual => CompareOperator::Equal,
            TokenType::NotEqual => CompareOperator::NotEqual,
            _ => return None,
        };
        self.advance();
        Some(operator)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;

        loop {
            let operator = if self.match_token(&TokenType::Plus) {
                BinaryOperator::Add
            } else if self.match_token(&TokenType::Minus) {
                BinaryOperator::Sub
            } else {
                break;
            };
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;

        loop {
            let operator = if self.match_token(&TokenType::Star) {
                BinaryOperator::Mul
            } else if self.match_token(&TokenType::Slash) {
                BinaryOperator::Div
            } else if self.match_token(&TokenType::DoubleSlash) {
                BinaryOperator::FloorDiv
            } else if self.match_token(&TokenType::Percent) {
                BinaryOperator::Mod
            } else {
                break;
            };
            let right = self.unary()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.match_token(&TokenType::Minus) {
            let operand = self.unary()?;
            // Fold negative numeric literals so `-1` stays a constant.
            return Ok(match operand {
                Expr::Literal(Literal::Integer(value)) => Expr::Literal(Literal::Integer(-value)),
                Expr::Literal(Literal::Float(value)) => Expr::Literal(Literal::Float(-value)),
                operand => Expr::Unary {
                    operator: UnaryOperator::Negate,
                    operand: Box::new(operand),
                },
            });
        }

        if self.match_token(&TokenType::Plus) {
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                operator: UnaryOperator::Plus,
                operand: Box::new(operand),
            });
        }

        self.power()
    }

    /// `**` binds tighter than unary minus on its left and is right-associative.
    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.call()?;

        if self.match_token(&TokenType::DoubleStar) {
            let exponent = self.unary()?;
            return Ok(Expr::Binary {
                left: Box::new(base),
                operator: BinaryOperator::Pow,
                right: Box::new(exponent),
            });
        }

        Ok(base)
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_token(&TokenType::LeftParen) {
                let arguments = self.arguments()?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    arguments,
                };
            } else if self.match_token(&TokenType::LeftBracket) {
                let index = self.expression()?;
                if self.check(&TokenType::Colon) {
                    return Err(self.error_here("Slices are not supported"));
                }
                self.consume(&TokenType::RightBracket, "Expected ']' after index expression")?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.match_token(&TokenType::Dot) {
                let method = self.identifier("Expected method name after '.'")?;
                self.consume(&TokenType::LeftParen, "Expected '(' after method name")?;
                let arguments = self.arguments()?;
                expr = Expr::MethodCall {
                    receiver: Box::new(expr),
                    method,
                    arguments,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut arguments = Vec::new();

        if !self.check(&TokenType::RightParen) {
            loop {
                arguments.push(self.expression()?);
                if self.check(&TokenType::Assign) {
                    return Err(self.error_here("Keyword arguments are not supported"));
                }
                if !self.match_token(&TokenType::Comma) || self.check(&TokenType::RightParen) {
                    break;
                }
            }
        }

        self.consume(&TokenType::RightParen, "Expected ')' after arguments")?;
        Ok(arguments)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match token.token_type {
            TokenType::Integer(value) => {
                self.advance();
                Ok(Expr::Literal(Literal::Integer(value)))
            }
            TokenType::Float(value) => {
                self.advance();
                Ok(Expr::Literal(Literal::Float(value)))
            }
            TokenType::String(value) => {
                self.advance();
                // Adjacent string literals concatenate.
                let mut value = value;
                while let TokenType::String(next) = &self.peek().token_type {
                    value.push_str(next);
                    self.advance();
                }
                Ok(Expr::Literal(Literal::String(value)))
            }
            TokenType::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenType::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenType::None => {
                self.advance();
                Ok(Expr::Literal(Literal::None))
            }
            TokenType::Identifier(name) => {
                self.advance();
                Ok(Expr::Name(name))
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                if self.check(&TokenType::Comma) {
                    return Err(self.error_here("Tuples are not supported"));
                }
                self.consume(&TokenType::RightParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            TokenType::LeftBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenType::RightBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if self.check(&TokenType::For) {
                            return Err(self.error_here("List comprehensions are not supported"));
                        }
                        if !self.match_token(&TokenType::Comma) || self.check(&TokenType::RightBracket) {
                            break;
                        }
                    }
                }
                self.consume(&TokenType::RightBracket, "Expected ']' after list elements")?;
                Ok(Expr::List { elements })
            }
            other => Err(ParseError {
                message: format!("Expected expression, got {:?}", other),
                line: token.line,
            }),
        }
    }
}
