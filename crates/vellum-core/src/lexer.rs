//! Character-level JSON lexer, written as an explicit finite-state machine.
//!
//! The lexer turns a character stream into primitive tokens: punctuation,
//! number text, decoded strings, and the `true`/`false`/`null` keywords.
//! Each call to [`Lexer::next_token`] runs the machine from [`State::Start`]
//! until a token is finalized; no valid transition for the current character
//! produces a [`JsonError::Lex`] carrying the offending character and its
//! 1-based position.
//!
//! Two non-standard extensions are supported and enabled by default:
//!
//! - single-quoted strings (`'text'`), normalized to ordinary strings on read
//! - `//` line comments and `/* */` block comments, skipped like whitespace
//!
//! Number and string boundaries are detected one character late, so the
//! underlying source supports push-back of exactly one character.

use crate::error::{JsonError, Result};

/// One lexical unit. Tokens that carry a payload hold the decoded lexeme:
/// `Number` keeps the raw digit text for the reader to tag, `Str` holds the
/// fully unescaped string contents.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Colon,
    Comma,
    Number(String),
    Str(String),
    True,
    False,
    Null,
    EndOfInput,
}

/// Lexer configuration. Both extensions default to enabled, matching the
/// wire format the engine historically accepted.
#[derive(Debug, Clone, Copy)]
pub struct LexerConfig {
    /// Treat `//` and `/* */` comments as insignificant whitespace.
    pub allow_comments: bool,
    /// Accept `'` as an alternate string delimiter.
    pub allow_single_quoted_strings: bool,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            allow_comments: true,
            allow_single_quoted_strings: true,
        }
    }
}

/// Machine states. Literal keywords run a one-character-at-a-time
/// sub-machine (`Literal` tracks the expected remainder); string states
/// remember which quote character opened them.
#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    Start,
    NumberSign,
    NumberZero,
    NumberInt,
    NumberFractionStart,
    NumberFraction,
    NumberExpMark,
    NumberExpSign,
    NumberExpDigits,
    Literal(LiteralKind, u8),
    StringBody(char),
    StringEscape(char),
    StringUnicode(char),
    CommentSlash,
    LineComment,
    BlockComment,
    BlockCommentStar,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LiteralKind {
    True,
    False,
    Null,
}

impl LiteralKind {
    fn text(self) -> &'static str {
        match self {
            LiteralKind::True => "true",
            LiteralKind::False => "false",
            LiteralKind::Null => "null",
        }
    }

    fn token(self) -> Token {
        match self {
            LiteralKind::True => Token::True,
            LiteralKind::False => Token::False,
            LiteralKind::Null => Token::Null,
        }
    }
}

/// Character source with single-character push-back and position tracking.
struct CharSource<'a> {
    chars: std::str::Chars<'a>,
    pushed: Option<char>,
    /// Position of the next character to be read (1-based).
    line: usize,
    column: usize,
    /// Position of the most recently read character, restored on push-back.
    mark: (usize, usize),
}

impl<'a> CharSource<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars(),
            pushed: None,
            line: 1,
            column: 1,
            mark: (1, 1),
        }
    }

    fn next(&mut self) -> Option<char> {
        let ch = self.pushed.take().or_else(|| self.chars.next())?;
        self.mark = (self.line, self.column);
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn push_back(&mut self, ch: char) {
        self.pushed = Some(ch);
        (self.line, self.column) = self.mark;
    }
}

/// The finite-state-machine tokenizer.
pub struct Lexer<'a> {
    source: CharSource<'a>,
    config: LexerConfig,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, LexerConfig::default())
    }

    pub fn with_config(input: &'a str, config: LexerConfig) -> Self {
        Self {
            source: CharSource::new(input),
            config,
        }
    }

    /// Position of the most recently consumed character, for error reports.
    pub fn position(&self) -> (usize, usize) {
        self.source.mark
    }

    fn error_at_mark(&self, message: String) -> JsonError {
        let (line, column) = self.source.mark;
        JsonError::Lex {
            line,
            column,
            message,
        }
    }

    fn invalid(&self, ch: char, context: &str) -> JsonError {
        self.error_at_mark(format!("unexpected character {ch:?} {context}"))
    }

    fn unexpected_end(&self, context: &str) -> JsonError {
        let (line, column) = (self.source.line, self.source.column);
        JsonError::Lex {
            line,
            column,
            message: format!("unexpected end of input {context}"),
        }
    }

    /// Run the machine until the next token is produced.
    ///
    /// Returns [`Token::EndOfInput`] once the source is exhausted; further
    /// calls keep returning it.
    pub fn next_token(&mut self) -> Result<Token> {
        let mut state = State::Start;
        let mut buf = String::new();
        // Accumulator for \uXXXX escapes and a pending UTF-16 high surrogate
        // awaiting its low half.
        let mut hex_digits = 0u8;
        let mut hex_acc = 0u32;
        let mut pending_surrogate: Option<u16> = None;

        loop {
            let ch = self.source.next();
            match state {
                State::Start => match ch {
                    None => return Ok(Token::EndOfInput),
                    Some(' ' | '\t' | '\n' | '\r' | '\x0c') => {}
                    Some('{') => return Ok(Token::BeginObject),
                    Some('}') => return Ok(Token::EndObject),
                    Some('[') => return Ok(Token::BeginArray),
                    Some(']') => return Ok(Token::EndArray),
                    Some(':') => return Ok(Token::Colon),
                    Some(',') => return Ok(Token::Comma),
                    Some('"') => state = State::StringBody('"'),
                    Some('\'') if self.config.allow_single_quoted_strings => {
                        state = State::StringBody('\'');
                    }
                    Some('/') if self.config.allow_comments => state = State::CommentSlash,
                    Some('-') => {
                        buf.push('-');
                        state = State::NumberSign;
                    }
                    Some('0') => {
                        buf.push('0');
                        state = State::NumberZero;
                    }
                    Some(c @ '1'..='9') => {
                        buf.push(c);
                        state = State::NumberInt;
                    }
                    Some('t') => state = State::Literal(LiteralKind::True, 1),
                    Some('f') => state = State::Literal(LiteralKind::False, 1),
                    Some('n') => state = State::Literal(LiteralKind::Null, 1),
                    Some(c) => return Err(self.invalid(c, "at start of token")),
                },

                State::NumberSign => match ch {
                    Some('0') => {
                        buf.push('0');
                        state = State::NumberZero;
                    }
                    Some(c @ '1'..='9') => {
                        buf.push(c);
                        state = State::NumberInt;
                    }
                    Some(c) => return Err(self.invalid(c, "after `-` in number")),
                    None => return Err(self.unexpected_end("after `-` in number")),
                },

                State::NumberZero => match ch {
                    Some('.') => {
                        buf.push('.');
                        state = State::NumberFractionStart;
                    }
                    Some(c @ ('e' | 'E')) => {
                        buf.push(c);
                        state = State::NumberExpMark;
                    }
                    Some(c @ '0'..='9') => {
                        return Err(self.invalid(c, "after leading zero"));
                    }
                    other => return self.finish_number(buf, other),
                },

                State::NumberInt => match ch {
                    Some(c @ '0'..='9') => buf.push(c),
                    Some('.') => {
                        buf.push('.');
                        state = State::NumberFractionStart;
                    }
                    Some(c @ ('e' | 'E')) => {
                        buf.push(c);
                        state = State::NumberExpMark;
                    }
                    other => return self.finish_number(buf, other),
                },

                State::NumberFractionStart => match ch {
                    Some(c @ '0'..='9') => {
                        buf.push(c);
                        state = State::NumberFraction;
                    }
                    Some(c) => return Err(self.invalid(c, "after decimal point")),
                    None => return Err(self.unexpected_end("after decimal point")),
                },

                State::NumberFraction => match ch {
                    Some(c @ '0'..='9') => buf.push(c),
                    Some(c @ ('e' | 'E')) => {
                        buf.push(c);
                        state = State::NumberExpMark;
                    }
                    other => return self.finish_number(buf, other),
                },

                State::NumberExpMark => match ch {
                    Some(c @ ('+' | '-')) => {
                        buf.push(c);
                        state = State::NumberExpSign;
                    }
                    Some(c @ '0'..='9') => {
                        buf.push(c);
                        state = State::NumberExpDigits;
                    }
                    Some(c) => return Err(self.invalid(c, "in exponent")),
                    None => return Err(self.unexpected_end("in exponent")),
                },

                State::NumberExpSign => match ch {
                    Some(c @ '0'..='9') => {
                        buf.push(c);
                        state = State::NumberExpDigits;
                    }
                    Some(c) => return Err(self.invalid(c, "in exponent")),
                    None => return Err(self.unexpected_end("in exponent")),
                },

                State::NumberExpDigits => match ch {
                    Some(c @ '0'..='9') => buf.push(c),
                    other => return self.finish_number(buf, other),
                },

                State::Literal(kind, consumed) => {
                    let text = kind.text();
                    let expected = text.as_bytes()[consumed as usize] as char;
                    match ch {
                        Some(c) if c == expected => {
                            if consumed as usize + 1 == text.len() {
                                return Ok(kind.token());
                            }
                            state = State::Literal(kind, consumed + 1);
                        }
                        Some(c) => {
                            return Err(self.invalid(c, &format!("in literal `{text}`")));
                        }
                        None => return Err(self.unexpected_end(&format!("in literal `{text}`"))),
                    }
                }

                State::StringBody(quote) => match ch {
                    Some(c) if c == quote => {
                        if pending_surrogate.is_some() {
                            return Err(self.error_at_mark(
                                "unpaired UTF-16 surrogate in string".to_string(),
                            ));
                        }
                        return Ok(Token::Str(buf));
                    }
                    Some('\\') => state = State::StringEscape(quote),
                    Some(c) => {
                        if pending_surrogate.is_some() {
                            return Err(self.error_at_mark(
                                "unpaired UTF-16 surrogate in string".to_string(),
                            ));
                        }
                        buf.push(c);
                    }
                    None => return Err(self.unexpected_end("inside string")),
                },

                State::StringEscape(quote) => match ch {
                    Some(c @ ('"' | '\'' | '\\' | '/')) => {
                        if pending_surrogate.is_some() {
                            return Err(self.error_at_mark(
                                "unpaired UTF-16 surrogate in string".to_string(),
                            ));
                        }
                        buf.push(c);
                        state = State::StringBody(quote);
                    }
                    Some('n') | Some('t') | Some('r') | Some('b') | Some('f') => {
                        if pending_surrogate.is_some() {
                            return Err(self.error_at_mark(
                                "unpaired UTF-16 surrogate in string".to_string(),
                            ));
                        }
                        buf.push(match ch {
                            Some('n') => '\n',
                            Some('t') => '\t',
                            Some('r') => '\r',
                            Some('b') => '\x08',
                            _ => '\x0c',
                        });
                        state = State::StringBody(quote);
                    }
                    Some('u') => {
                        hex_digits = 0;
                        hex_acc = 0;
                        state = State::StringUnicode(quote);
                    }
                    Some(c) => return Err(self.invalid(c, "in escape sequence")),
                    None => return Err(self.unexpected_end("in escape sequence")),
                },

                State::StringUnicode(quote) => {
                    let digit = match ch {
                        Some(c @ '0'..='9') => c as u32 - '0' as u32,
                        Some(c @ 'a'..='f') => c as u32 - 'a' as u32 + 10,
                        Some(c @ 'A'..='F') => c as u32 - 'A' as u32 + 10,
                        Some(c) => return Err(self.invalid(c, "in unicode escape")),
                        None => return Err(self.unexpected_end("in unicode escape")),
                    };
                    hex_acc = (hex_acc << 4) | digit;
                    hex_digits += 1;
                    if hex_digits == 4 {
                        let unit = hex_acc as u16;
                        match pending_surrogate.take() {
                            Some(high) => {
                                if !(0xDC00..=0xDFFF).contains(&unit) {
                                    return Err(self.error_at_mark(
                                        "unpaired UTF-16 surrogate in string".to_string(),
                                    ));
                                }
                                let combined = 0x10000
                                    + (((high as u32) - 0xD800) << 10)
                                    + (unit as u32 - 0xDC00);
                                match char::from_u32(combined) {
                                    Some(c) => buf.push(c),
                                    None => {
                                        return Err(self.error_at_mark(format!(
                                            "invalid unicode escape U+{combined:X}"
                                        )));
                                    }
                                }
                            }
                            None if (0xD800..=0xDBFF).contains(&unit) => {
                                pending_surrogate = Some(unit);
                            }
                            None if (0xDC00..=0xDFFF).contains(&unit) => {
                                return Err(self.error_at_mark(
                                    "unpaired UTF-16 surrogate in string".to_string(),
                                ));
                            }
                            None => match char::from_u32(unit as u32) {
                                Some(c) => buf.push(c),
                                None => {
                                    return Err(self
                                        .error_at_mark(format!("invalid unicode escape {unit:#x}")));
                                }
                            },
                        }
                        state = State::StringBody(quote);
                    }
                }

                State::CommentSlash => match ch {
                    Some('/') => state = State::LineComment,
                    Some('*') => state = State::BlockComment,
                    Some(c) => return Err(self.invalid(c, "after `/`")),
                    None => return Err(self.unexpected_end("after `/`")),
                },

                State::LineComment => match ch {
                    Some('\n') | None => state = State::Start,
                    Some(_) => {}
                },

                State::BlockComment => match ch {
                    Some('*') => state = State::BlockCommentStar,
                    Some(_) => {}
                    None => return Err(self.unexpected_end("inside block comment")),
                },

                State::BlockCommentStar => match ch {
                    Some('/') => state = State::Start,
                    Some('*') => {}
                    Some(_) => state = State::BlockComment,
                    None => return Err(self.unexpected_end("inside block comment")),
                },
            }
        }
    }

    /// Finalize an accumulated number. The boundary character that ended it
    /// must be re-readable as the next token, so it is pushed back.
    fn finish_number(&mut self, buf: String, boundary: Option<char>) -> Result<Token> {
        match boundary {
            None => Ok(Token::Number(buf)),
            Some(c @ (' ' | '\t' | '\n' | '\r' | '\x0c' | ',' | ']' | '}')) => {
                self.source.push_back(c);
                Ok(Token::Number(buf))
            }
            Some(c) => Err(self.invalid(c, "in number")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Result<Vec<Token>> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token()?;
            if token == Token::EndOfInput {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    #[test]
    fn punctuation() {
        let tokens = lex("{}[],:").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::BeginObject,
                Token::EndObject,
                Token::BeginArray,
                Token::EndArray,
                Token::Comma,
                Token::Colon,
            ]
        );
    }

    #[test]
    fn literals() {
        assert_eq!(
            lex("true false null").unwrap(),
            vec![Token::True, Token::False, Token::Null]
        );
    }

    #[test]
    fn leading_zero_rejected() {
        assert!(lex("007").is_err());
    }

    #[test]
    fn number_boundary_pushback() {
        let tokens = lex("[1,22]").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::BeginArray,
                Token::Number("1".to_string()),
                Token::Comma,
                Token::Number("22".to_string()),
                Token::EndArray,
            ]
        );
    }

    #[test]
    fn surrogate_pair_combines() {
        let tokens = lex(r#""\ud83d\ude00""#).unwrap();
        assert_eq!(tokens, vec![Token::Str("\u{1f600}".to_string())]);
    }

    #[test]
    fn non_ascii_copied_verbatim() {
        let tokens = lex("\"caf\u{e9}\"").unwrap();
        assert_eq!(tokens, vec![Token::Str("café".to_string())]);
    }

    #[test]
    fn unpaired_surrogate_rejected() {
        assert!(lex(r#""\ud83d""#).is_err());
        assert!(lex(r#""\ud83dx""#).is_err());
        assert!(lex(r#""\ude00""#).is_err());
    }

    #[test]
    fn error_carries_position() {
        let err = lex("{\n  @").unwrap_err();
        match err {
            JsonError::Lex { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 3);
            }
            other => panic!("expected lex error, got {other:?}"),
        }
    }
}
