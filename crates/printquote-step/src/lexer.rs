//! Part 21 (STEP physical file format) lexer.
//!
//! Tokenizes STEP files according to ISO 10303-21:
//! - Keywords, including user-defined `!NAME` keywords
//! - Entity references (`#123`)
//! - Strings (`'it''s'`) and binary literals (`"0FF"`)
//! - Reals (`1.5E-10`, `0.`, `-3.`) and integers
//! - Enumerations (`.T.`, `.UNSPECIFIED.`)
//! - Punctuation and `/* */` comments

use crate::error::{Result, StepError};

/// A token in a STEP file.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Keyword or identifier, uppercased (e.g., `CARTESIAN_POINT`).
    Keyword(String),
    /// Entity reference (`#123` becomes `EntityRef(123)`).
    EntityRef(u64),
    /// String literal (contents without quotes).
    String(String),
    /// Binary literal (hex digits without quotes).
    Binary(String),
    /// Real number.
    Real(f64),
    /// Integer number.
    Integer(i64),
    /// Enumeration (`.TRUE.` becomes `Enum("TRUE")`).
    Enum(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `=`
    Equals,
    /// `*` (derived value marker).
    Asterisk,
    /// `$` (null value marker).
    Dollar,
}

/// Position in the source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub col: usize,
}

/// A token with the position where it starts.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    /// The token.
    pub token: Token,
    /// Start position.
    pub pos: Position,
}

/// Lexer for Part 21 STEP files.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer, skipping a leading UTF-8 byte order mark.
    pub fn new(input: &'a [u8]) -> Self {
        let input = input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input);
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenize the entire input.
    pub fn tokenize(self) -> Result<Vec<SpannedToken>> {
        self.collect()
    }

    fn here(&self) -> Position {
        Position {
            line: self.line,
            col: self.col,
        }
    }

    fn error(&self, at: Position, message: impl Into<String>) -> StepError {
        StepError::lexer(at.line, at.col, message)
    }

    fn next_token(&mut self) -> Result<Option<SpannedToken>> {
        self.skip_whitespace_and_comments()?;

        let Some(ch) = self.peek() else {
            return Ok(None);
        };
        let start = self.here();

        let token = match ch {
            b'(' => self.single(Token::LParen),
            b')' => self.single(Token::RParen),
            b',' => self.single(Token::Comma),
            b';' => self.single(Token::Semicolon),
            b'=' => self.single(Token::Equals),
            b'*' => self.single(Token::Asterisk),
            b'$' => self.single(Token::Dollar),
            b'#' => self.read_entity_ref(start)?,
            b'\'' => self.read_string(start)?,
            b'"' => self.read_binary(start)?,
            b'.' => self.read_enum(start)?,
            b'-' | b'+' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number(start)?
            }
            b'0'..=b'9' => self.read_number(start)?,
            b'A'..=b'Z' | b'a'..=b'z' | b'_' | b'!' => self.read_keyword(),
            other => {
                return Err(self.error(
                    start,
                    format!("unexpected character: '{}'", other as char),
                ))
            }
        };

        Ok(Some(SpannedToken { token, pos: start }))
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
        let input = self.input;
        &input[start..self.pos]
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            self.take_while(|c| c.is_ascii_whitespace());

            if self.peek() == Some(b'/') && self.peek_at(1) == Some(b'*') {
                let start = self.here();
                self.advance();
                self.advance();
                loop {
                    match self.peek() {
                        None => return Err(self.error(start, "unterminated comment")),
                        Some(b'*') if self.peek_at(1) == Some(b'/') => {
                            self.advance();
                            self.advance();
                            break;
                        }
                        Some(_) => {
                            self.advance();
                        }
                    }
                }
                continue;
            }

            return Ok(());
        }
    }

    fn read_entity_ref(&mut self, start: Position) -> Result<Token> {
        self.advance();
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Err(self.error(start, "expected digits after '#'"));
        }
        let text = String::from_utf8_lossy(digits);
        text.parse()
            .map(Token::EntityRef)
            .map_err(|_| self.error(start, format!("invalid entity ID: {text}")))
    }

    fn read_string(&mut self, start: Position) -> Result<Token> {
        self.advance();
        let mut content = Vec::new();
        loop {
            match self.advance() {
                None => return Err(self.error(start, "unterminated string")),
                Some(b'\'') if self.peek() == Some(b'\'') => {
                    self.advance();
                    content.push(b'\'');
                }
                Some(b'\'') => break,
                Some(ch) => content.push(ch),
            }
        }
        Ok(Token::String(String::from_utf8_lossy(&content).into_owned()))
    }

    fn read_binary(&mut self, start: Position) -> Result<Token> {
        self.advance();
        let digits = self.take_while(|c| c.is_ascii_hexdigit());
        let digits = String::from_utf8_lossy(digits).into_owned();
        if self.advance() != Some(b'"') {
            return Err(self.error(start, "unterminated binary literal"));
        }
        Ok(Token::Binary(digits))
    }

    fn read_enum(&mut self, start: Position) -> Result<Token> {
        self.advance();
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_');
        if name.is_empty() {
            return Err(self.error(start, "empty enumeration"));
        }
        let name = String::from_utf8_lossy(name).to_uppercase();
        match self.advance() {
            Some(b'.') => Ok(Token::Enum(name)),
            Some(other) => Err(self.error(
                start,
                format!("invalid character in enumeration: '{}'", other as char),
            )),
            None => Err(self.error(start, "unterminated enumeration")),
        }
    }

    fn read_number(&mut self, start: Position) -> Result<Token> {
        let begin = self.pos;
        let mut is_real = false;

        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.advance();
        }
        self.take_while(|c| c.is_ascii_digit());

        // A dot after the integer digits always belongs to the number:
        // Part 21 writes reals such as `0.` and `10.` without fraction digits.
        if self.peek() == Some(b'.') {
            is_real = true;
            self.advance();
            self.take_while(|c| c.is_ascii_digit());
        }

        if matches!(self.peek(), Some(b'E' | b'e')) {
            is_real = true;
            self.advance();
            if matches!(self.peek(), Some(b'-' | b'+')) {
                self.advance();
            }
            self.take_while(|c| c.is_ascii_digit());
        }

        let text = String::from_utf8_lossy(&self.input[begin..self.pos]).into_owned();
        if is_real {
            text.parse()
                .map(Token::Real)
                .map_err(|_| self.error(start, format!("invalid real number: {text}")))
        } else {
            text.parse()
                .map(Token::Integer)
                .map_err(|_| self.error(start, format!("invalid integer: {text}")))
        }
    }

    fn read_keyword(&mut self) -> Token {
        let begin = self.pos;
        if self.peek() == Some(b'!') {
            self.advance();
        }
        // Hyphens appear in ISO-10303-21 and END-ISO-10303-21.
        self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'-');
        let name = String::from_utf8_lossy(&self.input[begin..self.pos]).to_uppercase();
        Token::Keyword(name)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<SpannedToken>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        Lexer::new(input.as_bytes())
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|st| st.token)
            .collect()
    }

    #[test]
    fn test_entity_ref() {
        assert_eq!(tokenize("#123"), vec![Token::EntityRef(123)]);
        assert!(Lexer::new(b"#x").tokenize().is_err());
    }

    #[test]
    fn test_string_with_escaped_quote() {
        assert_eq!(tokenize("'it''s'"), vec![Token::String("it's".into())]);
        assert_eq!(tokenize("''"), vec![Token::String(String::new())]);
    }

    #[test]
    fn test_binary_literal() {
        assert_eq!(tokenize("\"0FF\""), vec![Token::Binary("0FF".into())]);
    }

    #[test]
    fn test_enum() {
        assert_eq!(tokenize(".T."), vec![Token::Enum("T".into())]);
        assert_eq!(tokenize(".milli."), vec![Token::Enum("MILLI".into())]);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokenize("42"), vec![Token::Integer(42)]);
        assert_eq!(tokenize("-7"), vec![Token::Integer(-7)]);
        assert_eq!(tokenize("3.25"), vec![Token::Real(3.25)]);
        assert_eq!(tokenize("-1.5E-10"), vec![Token::Real(-1.5e-10)]);
        assert_eq!(tokenize("2.0E3"), vec![Token::Real(2000.0)]);
    }

    #[test]
    fn test_reals_without_fraction_digits() {
        assert_eq!(
            tokenize("(0.,-10.,1.E2)"),
            vec![
                Token::LParen,
                Token::Real(0.0),
                Token::Comma,
                Token::Real(-10.0),
                Token::Comma,
                Token::Real(100.0),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(tokenize("data"), vec![Token::Keyword("DATA".into())]);
        assert_eq!(
            tokenize("END-ISO-10303-21"),
            vec![Token::Keyword("END-ISO-10303-21".into())]
        );
        assert_eq!(tokenize("!VENDOR_X"), vec![Token::Keyword("!VENDOR_X".into())]);
    }

    #[test]
    fn test_comments_and_bom() {
        assert_eq!(tokenize("\u{FEFF}/* c */ #1 /* d */ #2"), vec![
            Token::EntityRef(1),
            Token::EntityRef(2)
        ]);
        assert!(Lexer::new(b"/* open").tokenize().is_err());
    }

    #[test]
    fn test_error_position() {
        let err = Lexer::new(b"#1 = X(\n  @);").tokenize().unwrap_err();
        match err {
            StepError::Lexer { line, col, .. } => {
                assert_eq!(line, 2);
                assert_eq!(col, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_complete_entity() {
        let tokens = tokenize("#1 = CARTESIAN_POINT('', (0., 1.5E-2, -3.0));");
        assert_eq!(
            tokens,
            vec![
                Token::EntityRef(1),
                Token::Equals,
                Token::Keyword("CARTESIAN_POINT".into()),
                Token::LParen,
                Token::String("".into()),
                Token::Comma,
                Token::LParen,
                Token::Real(0.0),
                Token::Comma,
                Token::Real(0.015),
                Token::Comma,
                Token::Real(-3.0),
                Token::RParen,
                Token::RParen,
                Token::Semicolon,
            ]
        );
    }
}
