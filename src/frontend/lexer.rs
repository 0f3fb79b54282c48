//! Lexer for the BASIC dialect
//!
//! Converts source code into a stream of tokens. Identifiers are read as a
//! whole span before the keyword table is consulted, so a name like `FORMAT`
//! never splits into `FOR` + `MAT`.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Result, Span};

/// The lexer state
pub struct Lexer {
    /// Source code as chars
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Create a span from start to current position
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    /// Create a token with the current span
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    /// Skip blanks. Line terminators are significant and stay.
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Read an identifier, keyword or REM comment
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_uppercase() || c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();

        if text == "REM" {
            return self.read_comment();
        }

        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));
        self.make_token(kind)
    }

    /// Consume the rest of the line after `REM`
    fn read_comment(&mut self) -> Token {
        let body_start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }

        let text: String = self.source[body_start..self.pos].iter().collect();
        self.make_token(TokenKind::Rem(text.trim().to_string()))
    }

    /// Read an unsigned decimal integer literal
    fn read_number(&mut self) -> Result<Token> {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();
        match text.parse::<u32>() {
            Ok(value) if value <= i32::MAX as u32 => Ok(self.make_token(TokenKind::IntLit(value))),
            _ => Err(Error::IntegerOverflow {
                text,
                span: self.make_span(),
            }),
        }
    }

    /// Read a double-quoted string literal. No escape sequences.
    fn read_string(&mut self) -> Result<Token> {
        self.advance(); // consume opening quote

        let mut value = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\n') | None => {
                    return Err(Error::UnterminatedString { offset: self.start });
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        Ok(self.make_token(TokenKind::StringLit(value)))
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.start = self.pos;

        if self.is_at_end() {
            return Ok(Token::eof(self.make_span()));
        }

        let c = self.source[self.pos];

        if c.is_ascii_uppercase() {
            return Ok(self.read_identifier());
        }

        if c.is_ascii_digit() {
            return self.read_number();
        }

        if c == '"' {
            return self.read_string();
        }

        self.advance();

        // Operators and punctuation
        let kind = match c {
            '<' => match self.peek() {
                Some('>') => {
                    self.advance();
                    TokenKind::Ne
                }
                Some('=') => {
                    self.advance();
                    TokenKind::Le
                }
                _ => TokenKind::Lt,
            },
            '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '=' => TokenKind::Eq,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '\n' => TokenKind::Newline,
            _ => {
                return Err(Error::UnexpectedChar {
                    ch: c,
                    offset: self.start,
                })
            }
        };

        Ok(self.make_token(kind))
    }

    /// Tokenize the entire source and return all tokens, ending with `Eof`
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        log::debug!("tokenized {} chars into {} tokens", self.source.len(), tokens.len());
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_line() {
        let tokens = kinds("10 LET A = 5");

        assert!(matches!(tokens[0], TokenKind::IntLit(10)));
        assert!(matches!(tokens[1], TokenKind::Let));
        assert!(matches!(tokens[2], TokenKind::Ident(ref s) if s == "A"));
        assert!(matches!(tokens[3], TokenKind::Eq));
        assert!(matches!(tokens[4], TokenKind::IntLit(5)));
        assert!(matches!(tokens[5], TokenKind::Eof));
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_multi_char_operators() {
        let tokens = kinds("<> <= >= < > =");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Ne,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Eq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings() {
        let tokens = kinds(r#"PRINT "Hello, World""#);
        assert!(matches!(tokens[1], TokenKind::StringLit(ref s) if s == "Hello, World"));
    }

    #[test]
    fn test_keywords() {
        let tokens = kinds("IF THEN ELSE FOR TO STEP NEXT GOTO GOSUB RETURN END INPUT");

        assert!(matches!(tokens[0], TokenKind::If));
        assert!(matches!(tokens[1], TokenKind::Then));
        assert!(matches!(tokens[2], TokenKind::Else));
        assert!(matches!(tokens[3], TokenKind::For));
        assert!(matches!(tokens[4], TokenKind::To));
        assert!(matches!(tokens[5], TokenKind::Step));
        assert!(matches!(tokens[6], TokenKind::Next));
        assert!(matches!(tokens[7], TokenKind::Goto));
        assert!(matches!(tokens[8], TokenKind::Gosub));
        assert!(matches!(tokens[9], TokenKind::Return));
        assert!(matches!(tokens[10], TokenKind::End));
        assert!(matches!(tokens[11], TokenKind::Input));
    }

    #[test]
    fn test_keyword_prefix_stays_identifier() {
        let tokens = kinds("FORMAT TOTAL ENDX IFFY");

        assert!(matches!(tokens[0], TokenKind::Ident(ref s) if s == "FORMAT"));
        assert!(matches!(tokens[1], TokenKind::Ident(ref s) if s == "TOTAL"));
        assert!(matches!(tokens[2], TokenKind::Ident(ref s) if s == "ENDX"));
        assert!(matches!(tokens[3], TokenKind::Ident(ref s) if s == "IFFY"));
    }

    #[test]
    fn test_rem_keeps_trailing_text() {
        let tokens = kinds("70 REM This is a comment\n80 END");

        assert!(matches!(tokens[1], TokenKind::Rem(ref s) if s == "This is a comment"));
        assert!(matches!(tokens[2], TokenKind::Newline));
        assert!(matches!(tokens[3], TokenKind::IntLit(80)));
    }

    #[test]
    fn test_rem_at_end_of_input() {
        let tokens = kinds("10 REM");
        assert_eq!(
            tokens,
            vec![TokenKind::IntLit(10), TokenKind::Rem(String::new()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_newlines_and_carriage_returns() {
        let tokens = kinds("10 END\r\n20 END\n");
        assert_eq!(
            tokens,
            vec![
                TokenKind::IntLit(10),
                TokenKind::End,
                TokenKind::Newline,
                TokenKind::IntLit(20),
                TokenKind::End,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unexpected_char() {
        let err = Lexer::new("10 LET A = 5 # 2").tokenize().unwrap_err();
        assert_eq!(err, Error::UnexpectedChar { ch: '#', offset: 13 });
    }

    #[test]
    fn test_lowercase_is_rejected() {
        let err = Lexer::new("10 print A").tokenize().unwrap_err();
        assert_eq!(err, Error::UnexpectedChar { ch: 'p', offset: 3 });
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("10 PRINT \"oops\n20 END").tokenize().unwrap_err();
        assert_eq!(err, Error::UnterminatedString { offset: 9 });
    }

    #[test]
    fn test_integer_overflow() {
        let err = Lexer::new("10 LET A = 99999999999").tokenize().unwrap_err();
        assert!(matches!(err, Error::IntegerOverflow { ref text, .. } if text == "99999999999"));
    }

    #[test]
    fn test_spans() {
        let tokens = Lexer::new("10 GOTO 200").tokenize().unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 2));
        assert_eq!(tokens[1].span, Span::new(3, 7));
        assert_eq!(tokens[2].span, Span::new(8, 11));
        assert_eq!(tokens[3].span, Span::new(11, 11));
    }
}
