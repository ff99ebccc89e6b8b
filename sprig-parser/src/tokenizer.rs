// sprig-parser - Tokenizer
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Tokenizer for Sprig source text.
//!
//! The tokenizer is deliberately shallow: it splits text into special
//! characters, strings and "any" runs, and records where each token starts.
//! Deciding whether an any-run is a number, keyword or symbol is the
//! reader's job.

use std::fmt;
use std::sync::Arc;

use crate::error::{ReadError, Result};
use crate::meta::SourcePos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Whitespace and commas. Only produced when trivia is kept.
    Whitespace,
    /// A `;` comment up to the end of the line. Only produced when trivia is kept.
    Comment,
    /// One of `( ) [ ] { } ^ ' ` ~ @` or the pair `~@`.
    Special,
    /// A `"..."` string; the lexeme includes the quotes and raw escapes.
    String,
    /// A `"""..."""` block string; the lexeme includes the quotes.
    StringBlock,
    /// A run of non-delimiter characters: numbers, symbols, keywords, chars.
    Any,
    /// An unterminated string, only produced in tolerant mode.
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: SourcePos,
}

impl Token {
    /// True for a special token with exactly this text.
    pub fn is_special(&self, text: &str) -> bool {
        self.kind == TokenKind::Special && self.lexeme == text
    }

    /// Byte offset one past the end of the token.
    pub fn end_offset(&self) -> usize {
        self.pos.offset + self.lexeme.len()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexeme)
    }
}

fn is_whitespace(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn is_special(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '[' | ']' | '{' | '}' | '^' | '\'' | '`' | '~' | '@'
    )
}

fn is_delimiter(c: char) -> bool {
    is_whitespace(c) || is_special(c) || c == '"' || c == ';'
}

/// Splits source text into [`Token`]s.
pub struct Tokenizer<'a> {
    src: &'a str,
    file: Arc<str>,
    offset: usize,
    line: u32,
    column: u32,
    tolerant: bool,
    keep_trivia: bool,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str, file: &str) -> Self {
        Tokenizer {
            src,
            file: Arc::from(file),
            offset: 0,
            line: 1,
            column: 1,
            tolerant: false,
            keep_trivia: false,
            finished: false,
        }
    }

    /// Return a partial token stream instead of failing on unterminated
    /// strings.
    #[must_use]
    pub fn tolerant(mut self, tolerant: bool) -> Self {
        self.tolerant = tolerant;
        self
    }

    /// Emit whitespace and comment tokens as well.
    #[must_use]
    pub fn keep_trivia(mut self, keep: bool) -> Self {
        self.keep_trivia = keep;
        self
    }

    /// Collect all remaining tokens.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            if self.finished {
                return Ok(None);
            }
            let Some(c) = self.peek() else {
                self.finished = true;
                return Ok(None);
            };
            let start = self.here();
            let token = if is_whitespace(c) {
                self.take_while(is_whitespace);
                self.trivia(TokenKind::Whitespace, start)
            } else if c == ';' {
                self.take_while(|c| c != '\n');
                self.trivia(TokenKind::Comment, start)
            } else if c == '~' && self.peek_at(1) == Some('@') {
                self.bump();
                self.bump();
                Some(self.token(TokenKind::Special, start))
            } else if is_special(c) {
                self.bump();
                Some(self.token(TokenKind::Special, start))
            } else if c == '"' {
                Some(self.read_string(start)?)
            } else {
                self.read_any();
                Some(self.token(TokenKind::Any, start))
            };
            if token.is_some() {
                return Ok(token);
            }
        }
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.offset..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    fn here(&self) -> SourcePos {
        SourcePos::new(Arc::clone(&self.file), self.line, self.column, self.offset)
    }

    fn token(&self, kind: TokenKind, start: SourcePos) -> Token {
        Token {
            kind,
            lexeme: self.src[start.offset..self.offset].to_string(),
            pos: start,
        }
    }

    fn trivia(&self, kind: TokenKind, start: SourcePos) -> Option<Token> {
        self.keep_trivia.then(|| self.token(kind, start))
    }

    fn read_any(&mut self) {
        // `#\(` and friends: the character after `#\` is always part of the run.
        if self.src[self.offset..].starts_with("#\\") {
            self.bump();
            self.bump();
            self.bump();
        }
        self.take_while(|c| !is_delimiter(c));
    }

    fn read_string(&mut self, start: SourcePos) -> Result<Token> {
        if self.src[self.offset..].starts_with("\"\"\"") {
            for _ in 0..3 {
                self.bump();
            }
            loop {
                if self.src[self.offset..].starts_with("\"\"\"") {
                    for _ in 0..3 {
                        self.bump();
                    }
                    return Ok(self.token(TokenKind::StringBlock, start));
                }
                if self.bump().is_none() {
                    return self.unterminated(start, "unterminated block string");
                }
            }
        }

        self.bump();
        loop {
            match self.bump() {
                Some('"') => return Ok(self.token(TokenKind::String, start)),
                Some('\\') => {
                    if self.bump().is_none() {
                        return self.unterminated(start, "unterminated string");
                    }
                }
                Some(_) => {}
                None => return self.unterminated(start, "unterminated string"),
            }
        }
    }

    fn unterminated(&mut self, start: SourcePos, message: &str) -> Result<Token> {
        if self.tolerant {
            self.finished = true;
            tracing::trace!(line = start.line, column = start.column, "{message}, keeping partial token");
            Ok(self.token(TokenKind::Incomplete, start))
        } else {
            Err(ReadError::lex(message, start))
        }
    }
}

/// Tokenize `src` strictly, skipping whitespace and comments.
pub fn tokenize(src: &str, file: &str) -> Result<Vec<Token>> {
    Tokenizer::new(src, file).tokenize()
}

/// Tokenize `src` without failing. An unterminated string ends the stream
/// with an [`TokenKind::Incomplete`] token.
pub fn tokenize_tolerant(src: &str, file: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(src, file).tolerant(true);
    let mut tokens = Vec::new();
    while let Ok(Some(token)) = tokenizer.next_token() {
        tokens.push(token);
    }
    tokens
}

/// Decode the escapes of a string or block-string lexeme, quotes included.
pub fn unescape(token: &Token) -> Result<String> {
    let raw = match token.kind {
        TokenKind::StringBlock => token
            .lexeme
            .get(3..token.lexeme.len().saturating_sub(3))
            .unwrap_or(""),
        _ => token
            .lexeme
            .get(1..token.lexeme.len().saturating_sub(1))
            .unwrap_or(""),
    };
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let ch = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        ReadError::lex(format!("invalid unicode escape \\u{hex}"), token.pos.clone())
                    })?;
                out.push(ch);
            }
            Some(other) => {
                return Err(ReadError::lex(
                    format!("invalid escape sequence \\{other}"),
                    token.pos.clone(),
                ));
            }
            None => {
                return Err(ReadError::lex("dangling escape", token.pos.clone()));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadErrorKind;

    fn lexemes(src: &str) -> Vec<String> {
        tokenize(src, "test")
            .unwrap()
            .into_iter()
            .map(|t| t.lexeme)
            .collect()
    }

    #[test]
    fn test_specials_and_runs() {
        assert_eq!(
            lexemes("(foo [1 2] {:a b})"),
            vec!["(", "foo", "[", "1", "2", "]", "{", ":a", "b", "}", ")"]
        );
    }

    #[test]
    fn test_commas_and_comments_are_skipped() {
        assert_eq!(lexemes("1, 2 ; three\n4"), vec!["1", "2", "4"]);
    }

    #[test]
    fn test_unquote_splice_pair() {
        assert_eq!(lexemes("~@xs ~x"), vec!["~@", "xs", "~", "x"]);
    }

    #[test]
    fn test_reader_prefixes() {
        assert_eq!(lexemes("'a `b @c ^:k d"), vec!["'", "a", "`", "b", "@", "c", "^", ":k", "d"]);
    }

    #[test]
    fn test_dispatch_runs_stop_at_specials() {
        assert_eq!(lexemes("#{1} #(inc %)"), vec!["#", "{", "1", "}", "#", "(", "inc", "%", ")"]);
    }

    #[test]
    fn test_char_literal_may_be_special() {
        assert_eq!(lexemes("#\\( #\\space"), vec!["#\\(", "#\\space"]);
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("a\n  bc", "f.sprig").unwrap();
        assert_eq!(tokens[1].pos.line, 2);
        assert_eq!(tokens[1].pos.column, 3);
        assert_eq!(tokens[1].pos.offset, 4);
        assert_eq!(&*tokens[1].pos.file, "f.sprig");
        assert_eq!(tokens[1].end_offset(), 6);
    }

    #[test]
    fn test_string_with_escaped_quote() {
        let tokens = tokenize(r#""a\"b" c"#, "test").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(unescape(&tokens[0]).unwrap(), "a\"b");
        assert_eq!(tokens[1].lexeme, "c");
    }

    #[test]
    fn test_string_delimits_any_run() {
        assert_eq!(lexemes(r#"abc"def""#), vec!["abc", "\"def\""]);
    }

    #[test]
    fn test_block_string_keeps_inner_quotes() {
        let tokens = tokenize(r#""""say "hi" now""" x"#, "test").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringBlock);
        assert_eq!(unescape(&tokens[0]).unwrap(), r#"say "hi" now"#);
        assert_eq!(tokens[1].lexeme, "x");
    }

    #[test]
    fn test_escapes() {
        let tokens = tokenize(r#""\n\t\r\\A""#, "test").unwrap();
        assert_eq!(unescape(&tokens[0]).unwrap(), "\n\t\r\\A");
    }

    #[test]
    fn test_bad_escape_is_lex_error() {
        let tokens = tokenize(r#""\q""#, "test").unwrap();
        let err = unescape(&tokens[0]).unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::Lex);
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = tokenize("(print \"abc", "test").unwrap_err();
        assert_eq!(err.kind, ReadErrorKind::Lex);
        assert_eq!(err.pos.unwrap().column, 8);
    }

    #[test]
    fn test_tolerant_mode_returns_partial_stream() {
        let tokens = tokenize_tolerant("(print \"abc", "test");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[2].kind, TokenKind::Incomplete);
        assert_eq!(tokens[2].lexeme, "\"abc");
    }

    #[test]
    fn test_keep_trivia() {
        let tokens = Tokenizer::new("a ; c\nb", "test")
            .keep_trivia(true)
            .tokenize()
            .unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Any,
                TokenKind::Whitespace,
                TokenKind::Comment,
                TokenKind::Whitespace,
                TokenKind::Any
            ]
        );
    }
}
