use super::error::LexerError;
use super::token::{Token, TokenType};

const TAB_WIDTH: usize = 8;

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    indents: Vec<usize>,
    // Open brackets; newlines inside them join lines.
    nesting: usize,
    at_line_start: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            indents: vec![0],
            nesting: 0,
            at_line_start: true,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            if self.at_line_start && self.nesting == 0 {
                self.indentation()?;
                continue;
            }

            // Skip whitespace before setting start
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }

            self.start = self.current;
            self.scan_token()?;
        }

        if self.nesting > 0 {
            return Err(LexerError {
                message: "Unexpected end of input inside brackets".to_string(),
                line: self.line,
            });
        }

        self.start = self.current;
        let needs_newline = self
            .tokens
            .last()
            .is_some_and(|token| !matches!(token.token_type, TokenType::Newline | TokenType::Dedent));
        if needs_newline {
            self.add_token(TokenType::Newline);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.add_token(TokenType::Dedent);
        }

        self.tokens.push(Token {
            token_type: TokenType::Eof,
            lexeme: "".to_string(),
            line: self.line,
        });

        Ok(self.tokens.clone())
    }

    /// Measures the leading whitespace of a logical line and emits the
    /// matching `Indent` / `Dedent` tokens. Blank and comment-only lines
    /// are consumed without affecting the indentation stack.
    fn indentation(&mut self) -> Result<(), LexerError> {
        let mut column = 0;
        while !self.is_at_end() {
            match self.peek() {
                ' ' => column += 1,
                '\t' => column = (column / TAB_WIDTH + 1) * TAB_WIDTH,
                '\x0c' => column = 0,
                _ => break,
            }
            self.advance();
        }

        match self.peek() {
            '\0' if self.is_at_end() => return Ok(()),
            '#' => {
                self.skip_comment();
                return Ok(());
            }
            '\r' | '\n' => {
                self.match_char('\r');
                if self.match_char('\n') {
                    self.line += 1;
                }
                return Ok(());
            }
            _ => {}
        }

        self.at_line_start = false;
        self.start = self.current;
        let top = *self.indents.last().unwrap_or(&0);
        if column > top {
            self.indents.push(column);
            self.add_token(TokenType::Indent);
        } else if column < top {
            while column < *self.indents.last().unwrap_or(&0) {
                self.indents.pop();
                self.add_token(TokenType::Dedent);
            }
            if column != *self.indents.last().unwrap_or(&0) {
                return Err(LexerError {
                    message: "Unindent does not match any outer indentation level".to_string(),
                    line: self.line,
                });
            }
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\r' | '\t' | '\x0c' => {
                    self.advance();
                }
                '\n' if self.nesting > 0 => {
                    self.line += 1;
                    self.advance();
                }
                '\\' if self.peek_next() == '\n' => {
                    // Explicit line joining
                    self.advance();
                    self.advance();
                    self.line += 1;
                }
                _ => break,
            }
        }
    }

    fn skip_comment(&mut self) {
        // A comment goes until the end of the line
        while self.peek() != '\n' && !self.is_at_end() {
            self.advance();
        }
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c = self.advance();
        match c {
            '\n' => {
                self.add_token(TokenType::Newline);
                self.line += 1;
                self.at_line_start = true;
            }
            '#' => self.skip_comment(),
            '(' => self.open(TokenType::LeftParen),
            ')' => self.close(TokenType::RightParen)?,
            '[' => self.open(TokenType::LeftBracket),
            ']' => self.close(TokenType::RightBracket)?,
            ':' => self.add_token(TokenType::Colon),
            ',' => self.add_token(TokenType::Comma),
            '.' => {
                if self.peek().is_ascii_digit() {
                    self.number()?;
                } else {
                    self.add_token(TokenType::Dot);
                }
            }
            '+' => {
                let token_type = if self.match_char('=') {
                    TokenType::PlusAssign
                } else {
                    TokenType::Plus
                };
                self.add_token(token_type);
            }
            '-' => {
                let token_type = if self.match_char('=') {
                    TokenType::MinusAssign
                } else if self.match_char('>') {
                    TokenType::Arrow
                } else {
                    TokenType::Minus
                };
                self.add_token(token_type);
            }
            '*' => {
                let token_type = if self.match_char('*') {
                    if self.match_char('=') {
                        TokenType::DoubleStarAssign
                    } else {
                        TokenType::DoubleStar
                    }
                } else if self.match_char('=') {
                    TokenType::StarAssign
                } else {
                    TokenType::Star
                };
                self.add_token(token_type);
            }
            '/' => {
                let token_type = if self.match_char('/') {
                    if self.match_char('=') {
                        TokenType::DoubleSlashAssign
                    } else {
                        TokenType::DoubleSlash
                    }
                } else if self.match_char('=') {
                    TokenType::SlashAssign
                } else {
                    TokenType::Slash
                };
                self.add_token(token_type);
            }
            '%' => {
                let token_type = if self.match_char('=') {
                    TokenType::PercentAssign
                } else {
                    TokenType::Percent
                };
                self.add_token(token_type);
            }
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Assign
                };
                self.add_token(token_type);
            }
            '!' => {
                if self.match_char('=') {
                    self.add_token(TokenType::NotEqual);
                } else {
                    return Err(LexerError {
                        message: "Unexpected character: !".to_string(),
                        line: self.line,
                    });
                }
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '"' | '\'' => self.string(c)?,
            '0'..='9' => self.number()?,
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            _ => {
                return Err(LexerError {
                    message: format!("Unexpected character: {}", c),
                    line: self.line,
                });
            }
        }

        Ok(())
    }

    fn open(&mut self, token_type: TokenType) {
        self.nesting += 1;
        self.add_token(token_type);
    }

    fn close(&mut self, token_type: TokenType) -> Result<(), LexerError> {
        if self.nesting == 0 {
            return Err(LexerError {
                message: format!("Unmatched '{}'", &self.source[self.start..self.current]),
                line: self.line,
            });
        }
        self.nesting -= 1;
        self.add_token(token_type);
        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.source[self.start..self.current].to_string();
        let token_type = match text.as_str() {
            "def" => TokenType::Def,
            "if" => TokenType::If,
            "elif" => TokenType::Elif,
            "else" => TokenType::Else,
            "for" => TokenType::For,
            "in" => TokenType::In,
            "while" => TokenType::While,
            "break" => TokenType::Break,
            "continue" => TokenType::Continue,
            "pass" => TokenType::Pass,
            "return" => TokenType::Return,
            "and" => TokenType::And,
            "or" => TokenType::Or,
            "not" => TokenType::Not,
            "True" => TokenType::True,
            "False" => TokenType::False,
            "None" => TokenType::None,
            "import" => TokenType::Import,
            "from" => TokenType::From,
            "as" => TokenType::As,
            _ => TokenType::Identifier(text.clone()),
        };

        self.add_token(token_type);
    }

    fn number(&mut self) -> Result<(), LexerError> {
        let mut is_float = self.source[self.start..self.current].starts_with('.');

        while self.peek().is_ascii_digit() || self.peek() == '_' {
            self.advance();
        }

        if !is_float && self.peek() == '.' && !self.peek_next().is_alphabetic() {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() || self.peek() == '_' {
                self.advance();
            }
        }

        if self.peek() == 'e' || self.peek() == 'E' {
            let next = self.peek_next();
            if next.is_ascii_digit() || next == '+' || next == '-' {
                is_float = true;
                self.advance(); // consume 'e'
                if self.peek() == '+' || self.peek() == '-' {
                    self.advance();
                }
                while self.peek().is_ascii_digit() {
                    self.advance();
                }
            }
        }

        let text: String = self.source[self.start..self.current]
            .chars()
            .filter(|c| *c != '_')
            .collect();

        if is_float {
            match text.parse::<f64>() {
                Ok(value) => self.add_token(TokenType::Float(value)),
                Err(_) => {
                    return Err(LexerError {
                        message: format!("Failed to parse float literal '{}'", text),
                        line: self.line,
                    })
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.add_token(TokenType::Integer(value)),
                Err(_) => {
                    return Err(LexerError {
                        message: format!("Integer literal '{}' does not fit in 64 bits", text),
                        line: self.line,
                    })
                }
            }
        }

        Ok(())
    }

    fn string(&mut self, quote: char) -> Result<(), LexerError> {
        let triple = self.peek() == quote && self.peek_next() == quote;
        if triple {
            self.advance();
            self.advance();
        }

        let mut value = String::new();
        loop {
            if self.is_at_end() {
                return Err(LexerError {
                    message: "Unterminated string".to_string(),
                    line: self.line,
                });
            }

            let c = self.peek();
            if c == quote {
                if !triple {
                    break;
                }
                if self.source[self.current..].starts_with(&quote.to_string().repeat(3)) {
                    self.advance();
                    self.advance();
                    break;
                }
            }

            if c == '\n' && !triple {
                return Err(LexerError {
                    message: "Unterminated string".to_string(),
                    line: self.line,
                });
            }

            if c == '\\' {
                self.advance(); // consume '\\'
                if self.is_at_end() {
                    return Err(LexerError {
                        message: "Unterminated string.".to_string(),
                        line: self.line,
                    });
                }
                let next_char = self.advance();
                match next_char {
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    '0' => value.push('\0'),
                    '\\' => value.push('\\'),
                    '\'' => value.push('\''),
                    '"' => value.push('"'),
                    '\n' => self.line += 1,
                    other => {
                        value.push('\\');
                        value.push(other);
                    }
                }
            } else {
                if c == '\n' {
                    self.line += 1;
                }
                self.advance();
                value.push(c);
            }
        }

        // The closing quote.
        self.advance();

        self.add_token(TokenType::String(value));

        Ok(())
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }

        self.advance();
        true
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        if !self.is_at_end() {
            // Move by the byte length of the character
            self.current += ch.len_utf8();
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn add_token(&mut self, token_type: TokenType) {
        let lexeme = self.source[self.start..self.current].to_string();
        self.tokens.push(Token {
            token_type,
            lexeme,
            line: self.line,
        });
    }
}
