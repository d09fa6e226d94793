use super::token::{Keyword, Punct, Token, TokenKind};
use crate::error::{Diagnostic, Error};

/// Scanner for C source text
///
/// Works on raw bytes; every problem is recorded rather than returned, so a
/// single scan reports all lexical errors in the file.
pub struct Scanner {
    /// Module name used in diagnostics
    module: String,
    /// Source bytes
    source: Vec<u8>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Byte offset where the current line starts
    line_start: usize,
    /// Line on which the current token started
    start_line: usize,
    /// Column on which the current token started
    start_column: usize,
    /// Lexical errors
    diagnostics: Vec<Diagnostic>,
    /// Non-fatal findings (skipped control characters)
    warnings: Vec<Diagnostic>,
}

impl Scanner {
    /// Creates a new scanner over `source` for the module `module`
    pub fn new(module: &str, source: &[u8]) -> Self {
        Scanner {
            module: module.to_string(),
            source: source.to_vec(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            line_start: 0,
            start_line: 1,
            start_column: 1,
            diagnostics: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Scans all tokens from source code; the last token is always `Eof`
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column();
            self.scan_token();
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column(),
        ));

        tracing::debug!(
            module = %self.module,
            tokens = self.tokens.len(),
            errors = self.diagnostics.len(),
            "scan finished"
        );

        self.tokens.clone()
    }

    /// Lexical errors recorded by the last scan
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Warnings recorded by the last scan
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            b' ' | b'\t' => {}

            b'\n' => self.end_line(),
            b'\r' => {
                // CR+LF counts as one line break
                self.match_byte(b'\n');
                self.end_line();
            }

            b'/' => {
                if self.match_byte(b'*') {
                    self.skip_block_comment();
                } else if self.match_byte(b'/') {
                    self.skip_line_comment();
                } else {
                    self.add_token(TokenKind::Punct(Punct::Slash));
                }
            }

            b'+' => {
                if self.match_byte(b'+') {
                    self.add_token(TokenKind::Punct(Punct::Increment));
                } else {
                    self.add_token(TokenKind::Punct(Punct::Plus));
                }
            }
            b'-' => {
                if self.match_byte(b'-') {
                    self.add_token(TokenKind::Punct(Punct::Decrement));
                } else {
                    self.add_token(TokenKind::Punct(Punct::Minus));
                }
            }

            b'"' => {
                self.add_token(TokenKind::Punct(Punct::DoubleQuote));
                self.scan_string();
            }

            c if c.is_ascii_digit() => self.scan_number(c),

            c if c.is_ascii_alphabetic() || c == b'_' => self.scan_word(),

            0x01..=0x08 | 0x0b..=0x0c | 0x0e..=0x1f | 0x7f => {
                let message = format!("skipped control character 0x{:02x}", c);
                tracing::warn!(
                    module = %self.module,
                    line = self.start_line,
                    column = self.start_column,
                    "{}",
                    message
                );
                self.warnings.push(Diagnostic::warning(
                    &self.module,
                    self.start_line,
                    self.start_column,
                    message,
                ));
            }

            c => match Punct::from_byte(c) {
                Some(punct) => self.add_token(TokenKind::Punct(punct)),
                None => {
                    let shown = if c.is_ascii_graphic() {
                        format!("'{}'", c as char)
                    } else {
                        format!("0x{:02x}", c)
                    };
                    self.error(format!("unexpected character {}", shown));
                }
            },
        }
    }

    fn end_line(&mut self) {
        self.tokens.push(Token::new(
            TokenKind::LineTerminator,
            "\n".to_string(),
            self.start_line,
            self.start_column,
        ));
        self.line += 1;
        self.line_start = self.current;
    }

    fn skip_block_comment(&mut self) {
        loop {
            if self.is_at_end() {
                self.error("unterminated block comment: missing `*/`".to_string());
                return;
            }
            match self.advance() {
                b'*' if self.match_byte(b'/') => return,
                b'\n' => self.new_line_in_comment(),
                b'\r' => {
                    self.match_byte(b'\n');
                    self.new_line_in_comment();
                }
                _ => {}
            }
        }
    }

    fn new_line_in_comment(&mut self) {
        self.line += 1;
        self.line_start = self.current;
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != b'\n' && self.peek() != b'\r' {
            self.advance();
        }
    }

    /// Body and closing quote of a string literal opened just before.
    ///
    /// Without a closing `"` on the same line the body is rescanned as
    /// ordinary tokens and the parser reports the missing quote.
    fn scan_string(&mut self) {
        let body_start = self.current;
        let body_column = self.column();

        loop {
            match self.peek() {
                b'"' if !self.is_at_end() => break,
                b'\\' if !self.is_at_end() => {
                    self.advance();
                    if !self.is_at_end() && !matches!(self.peek(), b'\n' | b'\r') {
                        self.advance();
                    }
                }
                b'\n' | b'\r' => {
                    self.current = body_start;
                    return;
                }
                _ if self.is_at_end() => {
                    self.current = body_start;
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }

        self.start = body_start;
        self.start_column = body_column;
        self.add_token(TokenKind::StringText);

        self.start = self.current;
        self.start_column = self.column();
        self.advance();
        self.add_token(TokenKind::Punct(Punct::DoubleQuote));
    }

    fn scan_number(&mut self, first: u8) {
        if first == b'0' && matches!(self.peek(), b'x' | b'X') {
            self.advance();
            while self.peek().is_ascii_hexdigit() {
                self.advance();
            }
            self.add_token(TokenKind::Hex);
            return;
        }

        while self.peek().is_ascii_digit() {
            self.advance();
        }
        self.add_token(TokenKind::Integer);
    }

    fn scan_word(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }

        let text = self.lexeme();
        let kind = match Keyword::lookup(&text) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Word,
        };
        self.add_token(kind);
    }

    fn error(&mut self, message: String) {
        let err = Error::LexError {
            line: self.start_line,
            col: self.start_column,
            message,
        };
        if let Some(diag) = err.to_diagnostic(&self.module) {
            self.diagnostics.push(diag);
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn column(&self) -> usize {
        self.current - self.line_start + 1
    }

    fn advance(&mut self) -> u8 {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() {
            b'\0'
        } else {
            self.source[self.current]
        }
    }

    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn lexeme(&self) -> String {
        String::from_utf8_lossy(&self.source[self.start..self.current]).into_owned()
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = self.lexeme();
        self.tokens
            .push(Token::new(kind, lexeme, self.start_line, self.start_column));
    }
}
