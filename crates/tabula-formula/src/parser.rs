//! Formula tokenizer and parser
//!
//! A recursive descent parser for formulas with proper operator precedence.
//! Tokens keep their source text (whitespace included) so a formula can be
//! written back out exactly as typed, with only its references replaced.

use crate::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use lazy_regex::regex;
use tabula_core::ErrorKind;

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorKind),

    // Identifiers and references
    /// Index into the formula's dependency list, assigned once all tokens are known
    Reference(usize),
    Identifier(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Ampersand,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Comma,
    Semicolon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    Whitespace,

    // End of input
    Eof,
}

/// A token and the exact text it was scanned from
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// Split a formula body (without the leading `=`) into tokens
pub fn tokenize(input: &str) -> FormulaResult<Vec<Token>> {
    let mut scanner = Scanner { input, pos: 0 };
    let mut tokens = Vec::new();
    while !scanner.is_at_end() {
        let start = scanner.pos;
        let kind = scanner.scan_token()?;
        tokens.push(Token {
            kind,
            text: input[start..scanner.pos].to_string(),
        });
    }
    Ok(tokens)
}

/// Length of the reference starting at the beginning of `input`, if any
///
/// Accepts `A1`, `$A$1:B2`, `B:D`, `3:5`, `A2:A`, `B3:5`, optionally
/// prefixed by `Sheet!` or `'Quoted sheet'!`.
fn reference_len(input: &str) -> Option<usize> {
    let found: regex::Match = regex!(
        r"^(?:(?:'(?:[^']|'')+'|[A-Za-z_][A-Za-z0-9_.]*)!)?(?:\$?[A-Za-z]{1,3}\$?[0-9]+(?::(?:\$?[A-Za-z]{1,3}\$?[0-9]+|\$?[A-Za-z]{1,3}|\$?[0-9]+))?|\$?[A-Za-z]{1,3}:\$?[A-Za-z]{1,3}|\$?[0-9]+:\$?[0-9]+)"
    )
    .find(input)?;

    let continues = input[found.end()..].chars().next().map_or(false, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '(' | '!' | '$' | ':')
    });
    (!continues).then_some(found.end())
}

struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn scan_token(&mut self) -> FormulaResult<TokenKind> {
        let Some(c) = self.peek_char() else {
            return Ok(TokenKind::Eof);
        };

        if c.is_whitespace() {
            while self.peek_char().map_or(false, char::is_whitespace) {
                self.advance();
            }
            return Ok(TokenKind::Whitespace);
        }

        // Single-character tokens
        let single = match c {
            '+' => Some(TokenKind::Plus),
            '-' => Some(TokenKind::Minus),
            '*' => Some(TokenKind::Star),
            '/' => Some(TokenKind::Slash),
            '^' => Some(TokenKind::Caret),
            '%' => Some(TokenKind::Percent),
            '&' => Some(TokenKind::Ampersand),
            '=' => Some(TokenKind::Equal),
            ',' => Some(TokenKind::Comma),
            ';' => Some(TokenKind::Semicolon),
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            '{' => Some(TokenKind::LeftBrace),
            '}' => Some(TokenKind::RightBrace),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return Ok(kind);
        }

        // Two-character operators
        if c == '<' {
            self.advance();
            return Ok(match self.peek_char() {
                Some('=') => {
                    self.advance();
                    TokenKind::LessEqual
                }
                Some('>') => {
                    self.advance();
                    TokenKind::NotEqual
                }
                _ => TokenKind::LessThan,
            });
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(TokenKind::GreaterEqual);
            }
            return Ok(TokenKind::GreaterThan);
        }

        if c == '"' {
            return self.scan_string();
        }

        if c == '#' {
            return self.scan_error();
        }

        // References are tried before numbers and names: `3:5` and `A1` are
        // both valid starts of other tokens
        if c.is_ascii_alphanumeric() || matches!(c, '$' | '\'' | '_') {
            if let Some(len) = reference_len(&self.input[self.pos..]) {
                self.pos += len;
                return Ok(TokenKind::Reference(0));
            }
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_identifier());
        }

        Err(FormulaError::Parse(format!(
            "Unexpected character '{}' at position {}",
            c, self.pos
        )))
    }

    fn scan_string(&mut self) -> FormulaResult<TokenKind> {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        loop {
            match self.peek_char() {
                Some('"') if self.peek_char_at(1) == Some('"') => {
                    s.push('"');
                    self.advance();
                    self.advance();
                }
                Some('"') => {
                    self.advance();
                    return Ok(TokenKind::Text(s));
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
                None => return Err(FormulaError::Parse("Unterminated string".into())),
            }
        }
    }

    fn scan_number(&mut self) -> FormulaResult<TokenKind> {
        let start = self.pos;

        // Integer part
        while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
            self.advance();
        }

        // Decimal part
        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        // Exponent part
        if self.peek_char().map_or(false, |c| c == 'e' || c == 'E')
            && self
                .peek_char_at(1)
                .map_or(false, |c| c.is_ascii_digit() || c == '+' || c == '-')
        {
            self.advance();
            if self.peek_char().map_or(false, |c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        num_str
            .parse()
            .map(TokenKind::Number)
            .map_err(|_| FormulaError::Parse(format!("Invalid number '{}'", num_str)))
    }

    fn scan_error(&mut self) -> FormulaResult<TokenKind> {
        let start = self.pos;
        self.advance();
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || matches!(c, '!' | '/' | '?' | '_'))
        {
            self.advance();
        }
        let text = &self.input[start..self.pos];
        ErrorKind::from_code(text)
            .map(TokenKind::Error)
            .ok_or_else(|| FormulaError::Parse(format!("Unknown error literal '{}'", text)))
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .peek_char()
            .map_or(false, |c| c.is_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }
        let text = &self.input[start..self.pos];

        // TRUE( and FALSE( are function calls
        let upper = text.to_uppercase();
        let call = self.next_non_space() == Some('(');
        match upper.as_str() {
            "TRUE" if !call => TokenKind::Boolean(true),
            "FALSE" if !call => TokenKind::Boolean(false),
            _ => TokenKind::Identifier(text.to_string()),
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn next_non_space(&self) -> Option<char> {
        self.input[self.pos..].chars().find(|c| !c.is_whitespace())
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}

/// Parse a token stream into an AST
pub fn parse(tokens: &[Token]) -> FormulaResult<Expr> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expression()?;

    if !matches!(parser.current(), TokenKind::Eof) {
        return Err(FormulaError::Parse(format!(
            "Unexpected token after expression: {:?}",
            parser.current()
        )));
    }

    Ok(expr)
}

/// Formula parser
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn current(&mut self) -> &'t TokenKind {
        while self
            .tokens
            .get(self.pos)
            .map_or(false, |t| t.kind == TokenKind::Whitespace)
        {
            self.pos += 1;
        }
        self.tokens
            .get(self.pos)
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn consume(&mut self) -> &'t TokenKind {
        let token = self.current();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &TokenKind) -> FormulaResult<()> {
        let current = self.current();
        if current == expected {
            self.consume();
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected, current
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Concatenation: &
    // 3. Addition/Subtraction: +, -
    // 4. Multiplication/Division: *, /
    // 5. Exponentiation: ^
    // 6. Unary: -, +, postfix %
    // 7. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<Expr> {
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_concatenation()?;

        loop {
            let op = match self.current() {
                TokenKind::Equal => BinaryOperator::Equal,
                TokenKind::NotEqual => BinaryOperator::NotEqual,
                TokenKind::LessThan => BinaryOperator::LessThan,
                TokenKind::LessEqual => BinaryOperator::LessEqual,
                TokenKind::GreaterThan => BinaryOperator::GreaterThan,
                TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume();
            let right = self.parse_concatenation()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_concatenation(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_additive()?;

        while matches!(self.current(), TokenKind::Ampersand) {
            self.consume();
            let right = self.parse_additive()?;
            left = binary(BinaryOperator::Concat, left, right);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current() {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current() {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume();
            let right = self.parse_exponent()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<Expr> {
        let left = self.parse_unary()?;

        if matches!(self.current(), TokenKind::Caret) {
            self.consume();
            let right = self.parse_exponent()?; // Right associative
            return Ok(binary(BinaryOperator::Power, left, right));
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        let prefix = match self.current() {
            TokenKind::Minus => Some(UnaryOperator::Negate),
            TokenKind::Plus => Some(UnaryOperator::Plus),
            _ => None,
        };
        if let Some(op) = prefix {
            self.consume();
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        // Parse primary, then check for postfix percent
        let mut expr = self.parse_primary()?;

        while matches!(self.current(), TokenKind::Percent) {
            self.consume();
            expr = Expr::Unary {
                op: UnaryOperator::Percent,
                operand: Box::new(expr),
            };
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        match self.current() {
            TokenKind::Number(n) => {
                self.consume();
                Ok(Expr::Number(*n))
            }

            TokenKind::Text(s) => {
                self.consume();
                Ok(Expr::Text(s.clone()))
            }

            TokenKind::Boolean(b) => {
                self.consume();
                Ok(Expr::Boolean(*b))
            }

            TokenKind::Error(e) => {
                self.consume();
                Ok(Expr::Error(*e))
            }

            TokenKind::Reference(index) => {
                self.consume();
                Ok(Expr::Reference(*index))
            }

            TokenKind::LeftParen => {
                self.consume();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }

            TokenKind::LeftBrace => self.parse_array(),

            TokenKind::Identifier(name) => {
                self.consume();
                if matches!(self.current(), TokenKind::LeftParen) {
                    self.parse_function_call(name)
                } else {
                    Ok(Expr::Name(name.clone()))
                }
            }

            other => Err(FormulaError::Parse(format!("Unexpected token: {:?}", other))),
        }
    }

    fn parse_array(&mut self) -> FormulaResult<Expr> {
        self.expect(&TokenKind::LeftBrace)?;

        let mut rows = Vec::new();
        let mut current_row = vec![self.parse_expression()?];

        loop {
            match self.current() {
                TokenKind::Comma => {
                    self.consume();
                    current_row.push(self.parse_expression()?);
                }
                TokenKind::Semicolon => {
                    self.consume();
                    rows.push(std::mem::take(&mut current_row));
                    current_row.push(self.parse_expression()?);
                }
                TokenKind::RightBrace => break,
                _ => {
                    return Err(FormulaError::Parse(
                        "Expected ',' ';' or '}' in array".into(),
                    ))
                }
            }
        }
        rows.push(current_row);

        if rows.iter().any(|row| row.len() != rows[0].len()) {
            return Err(FormulaError::Parse("Array rows must have the same length".into()));
        }

        self.expect(&TokenKind::RightBrace)?;
        Ok(Expr::Array(rows))
    }

    fn parse_function_call(&mut self, name: &str) -> FormulaResult<Expr> {
        self.expect(&TokenKind::LeftParen)?;

        let mut args = Vec::new();

        if !matches!(self.current(), TokenKind::RightParen) {
            args.push(self.parse_expression()?);

            while matches!(self.current(), TokenKind::Comma) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&TokenKind::RightParen)?;

        Ok(Expr::Function {
            name: name.to_uppercase(),
            args,
        })
    }
}

fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
