//! Token-level JSON reader.
//!
//! [`JsonReader`] drives the [`Lexer`] and turns its primitive tokens into
//! structural ones: object/array begin and end, property names, and tagged
//! scalar values. It enforces the JSON grammar (colon after every property
//! name, commas between entries, matched begin/end pairs, no trailing
//! commas) and bounds container nesting, so downstream consumers never see
//! an ill-formed token sequence.
//!
//! The reader has no lookahead beyond the single token it is producing.
//! Callers that need to discard a value, such as an unknown object member
//! under tolerant decoding, use [`JsonReader::skip_value`], which consumes
//! matching begin/end pairs with one shared routine.

use crate::error::{JsonError, Result};
use crate::lexer::{Lexer, LexerConfig, Token};

/// Default bound on open containers during a single read.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// A structural token. Numbers arrive pre-tagged: integral values that fit
/// `i32` are `Int`, wider integral values are `Long`, anything with a
/// fraction or exponent (or beyond `i64`) is `Double`.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonToken {
    ObjectStart,
    PropertyName(String),
    ObjectEnd,
    ArrayStart,
    ArrayEnd,
    Int(i32),
    Long(i64),
    Double(f64),
    Str(String),
    Bool(bool),
    Null,
    /// The root value has been fully read and the input is exhausted.
    EndOfDocument,
}

impl JsonToken {
    /// Short name for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            JsonToken::ObjectStart => "object start",
            JsonToken::PropertyName(_) => "property name",
            JsonToken::ObjectEnd => "object end",
            JsonToken::ArrayStart => "array start",
            JsonToken::ArrayEnd => "array end",
            JsonToken::Int(_) => "int",
            JsonToken::Long(_) => "long",
            JsonToken::Double(_) => "double",
            JsonToken::Str(_) => "string",
            JsonToken::Bool(_) => "boolean",
            JsonToken::Null => "null",
            JsonToken::EndOfDocument => "end of document",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    /// `pending_value` is set between a property name and its value.
    Object { entries: usize, pending_value: bool },
    Array { items: usize },
}

/// Structural reader over a JSON text.
pub struct JsonReader<'a> {
    lexer: Lexer<'a>,
    frames: Vec<Frame>,
    root_done: bool,
    max_depth: usize,
}

impl<'a> JsonReader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, LexerConfig::default(), DEFAULT_MAX_DEPTH)
    }

    pub fn with_config(input: &'a str, lexer: LexerConfig, max_depth: usize) -> Self {
        Self {
            lexer: Lexer::with_config(input, lexer),
            frames: Vec::new(),
            root_done: false,
            max_depth,
        }
    }

    /// Count of currently open containers.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Produce the next structural token.
    pub fn read(&mut self) -> Result<JsonToken> {
        match self.frames.last().copied() {
            None if self.root_done => match self.lexer.next_token()? {
                Token::EndOfInput => Ok(JsonToken::EndOfDocument),
                other => Err(self.structural_here(format!(
                    "trailing content after the root value: {other:?}"
                ))),
            },
            None => {
                let token = self.require_token("a value")?;
                let out = self.begin_value(token)?;
                self.note_root_done();
                Ok(out)
            }
            Some(Frame::Object {
                entries,
                pending_value,
            }) => {
                if pending_value {
                    let token = self.require_token("a property value")?;
                    let out = self.begin_value(token)?;
                    self.note_root_done();
                    return Ok(out);
                }
                // Expecting a property name, or the end of the object.
                let mut token = self.require_token("a property name or `}`")?;
                if entries > 0 {
                    match token {
                        Token::Comma => {
                            token = self.require_token("a property name")?;
                            if token == Token::EndObject {
                                return Err(self.structural_here(
                                    "expected a property name after `,`, found `}`".to_string(),
                                ));
                            }
                        }
                        Token::EndObject => {}
                        other => {
                            return Err(self.structural_here(format!(
                                "expected `,` or `}}` in object, found {other:?}"
                            )));
                        }
                    }
                }
                match token {
                    Token::EndObject => {
                        self.frames.pop();
                        self.finish_value();
                        self.note_root_done();
                        Ok(JsonToken::ObjectEnd)
                    }
                    Token::Str(name) => {
                        match self.require_token("`:` after property name")? {
                            Token::Colon => {}
                            other => {
                                return Err(self.structural_here(format!(
                                    "expected `:` after property name, found {other:?}"
                                )));
                            }
                        }
                        if let Some(Frame::Object {
                            entries,
                            pending_value,
                        }) = self.frames.last_mut()
                        {
                            *entries += 1;
                            *pending_value = true;
                        }
                        Ok(JsonToken::PropertyName(name))
                    }
                    other => Err(self.structural_here(format!(
                        "expected a property name, found {other:?}"
                    ))),
                }
            }
            Some(Frame::Array { items }) => {
                let mut token = self.require_token("a value or `]`")?;
                if items > 0 {
                    match token {
                        Token::Comma => {
                            token = self.require_token("a value")?;
                            if token == Token::EndArray {
                                return Err(self.structural_here(
                                    "expected a value after `,`, found `]`".to_string(),
                                ));
                            }
                        }
                        Token::EndArray => {}
                        other => {
                            return Err(self.structural_here(format!(
                                "expected `,` or `]` in array, found {other:?}"
                            )));
                        }
                    }
                }
                if token == Token::EndArray {
                    self.frames.pop();
                    self.finish_value();
                    self.note_root_done();
                    return Ok(JsonToken::ArrayEnd);
                }
                let out = self.begin_value(token)?;
                self.note_root_done();
                Ok(out)
            }
        }
    }

    /// Consume and discard one whole value, matching begin/end pairs.
    pub fn skip_value(&mut self) -> Result<()> {
        let mut open = 0usize;
        loop {
            match self.read()? {
                JsonToken::ObjectStart | JsonToken::ArrayStart => open += 1,
                JsonToken::ObjectEnd | JsonToken::ArrayEnd => {
                    // A container end can only be reached through a start we
                    // counted; `skip_value` always begins at value position.
                    open = open.saturating_sub(1);
                    if open == 0 {
                        return Ok(());
                    }
                }
                JsonToken::PropertyName(_) => {}
                JsonToken::EndOfDocument => {
                    return Err(structural(
                        "unexpected end of document while skipping a value".to_string(),
                    ));
                }
                _ => {
                    if open == 0 {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Require the document to be fully consumed.
    pub fn expect_end(&mut self) -> Result<()> {
        match self.read()? {
            JsonToken::EndOfDocument => Ok(()),
            other => Err(structural(format!(
                "expected end of document, found {}",
                other.describe()
            ))),
        }
    }

    fn require_token(&mut self, expected: &str) -> Result<Token> {
        match self.lexer.next_token()? {
            Token::EndOfInput => Err(self.structural_here(format!(
                "unexpected end of input, expected {expected}"
            ))),
            token => Ok(token),
        }
    }

    /// A structural error stamped with the lexer's current position.
    fn structural_here(&self, message: String) -> JsonError {
        let (line, column) = self.lexer.position();
        JsonError::Structural {
            message: format!("{message} at line {line}, column {column}"),
        }
    }

    /// Interpret a lexer token in value position, pushing a frame for
    /// containers and tagging scalars.
    fn begin_value(&mut self, token: Token) -> Result<JsonToken> {
        match token {
            Token::BeginObject => {
                self.push_frame(Frame::Object {
                    entries: 0,
                    pending_value: false,
                })?;
                Ok(JsonToken::ObjectStart)
            }
            Token::BeginArray => {
                self.push_frame(Frame::Array { items: 0 })?;
                Ok(JsonToken::ArrayStart)
            }
            Token::Str(s) => {
                self.finish_value();
                Ok(JsonToken::Str(s))
            }
            Token::Number(text) => {
                self.finish_value();
                tag_number(&text)
            }
            Token::True => {
                self.finish_value();
                Ok(JsonToken::Bool(true))
            }
            Token::False => {
                self.finish_value();
                Ok(JsonToken::Bool(false))
            }
            Token::Null => {
                self.finish_value();
                Ok(JsonToken::Null)
            }
            other => Err(self.structural_here(format!("expected a value, found {other:?}"))),
        }
    }

    fn push_frame(&mut self, frame: Frame) -> Result<()> {
        if self.frames.len() >= self.max_depth {
            return Err(JsonError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Record that a value finished in the enclosing container: clears the
    /// object's pending-value flag or bumps the array's item count. Called
    /// for scalars and for container ends (after the pop).
    fn finish_value(&mut self) {
        match self.frames.last_mut() {
            Some(Frame::Object { pending_value, .. }) => *pending_value = false,
            Some(Frame::Array { items }) => *items += 1,
            None => {}
        }
    }

    fn note_root_done(&mut self) {
        if self.frames.is_empty() {
            self.root_done = true;
        }
    }
}

fn structural(message: String) -> JsonError {
    JsonError::Structural { message }
}

/// Tag a validated number lexeme: `Int` when it fits `i32`, `Long` when it
/// fits `i64`, `Double` for fractions, exponents, and anything wider.
fn tag_number(text: &str) -> Result<JsonToken> {
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(n) = text.parse::<i64>() {
            return Ok(match i32::try_from(n) {
                Ok(small) => JsonToken::Int(small),
                Err(_) => JsonToken::Long(n),
            });
        }
    }
    match text.parse::<f64>() {
        Ok(f) => Ok(JsonToken::Double(f)),
        Err(_) => Err(structural(format!("unreadable number literal `{text}`"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> Result<Vec<JsonToken>> {
        let mut reader = JsonReader::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = reader.read()?;
            if token == JsonToken::EndOfDocument {
                return Ok(tokens);
            }
            tokens.push(token);
        }
    }

    #[test]
    fn object_sequence() {
        let tokens = read_all(r#"{"a": 1, "b": [true, null]}"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                JsonToken::ObjectStart,
                JsonToken::PropertyName("a".to_string()),
                JsonToken::Int(1),
                JsonToken::PropertyName("b".to_string()),
                JsonToken::ArrayStart,
                JsonToken::Bool(true),
                JsonToken::Null,
                JsonToken::ArrayEnd,
                JsonToken::ObjectEnd,
            ]
        );
    }

    #[test]
    fn numeric_tagging() {
        assert_eq!(read_all("42").unwrap(), vec![JsonToken::Int(42)]);
        assert_eq!(
            read_all("9999999999").unwrap(),
            vec![JsonToken::Long(9_999_999_999)]
        );
        assert_eq!(read_all("3.14").unwrap(), vec![JsonToken::Double(3.14)]);
        assert_eq!(read_all("1e10").unwrap(), vec![JsonToken::Double(1e10)]);
    }

    #[test]
    fn trailing_comma_rejected() {
        assert!(read_all("[1, 2,]").is_err());
        assert!(read_all(r#"{"a": 1,}"#).is_err());
        assert!(read_all("[[1,], 2]").is_err());
        assert!(read_all(r#"{"a": [1, 2,]}"#).is_err());
        // A comma alone never closes the container.
        assert!(read_all("[1,,2]").is_err());
    }

    #[test]
    fn structural_errors_carry_position() {
        let err = read_all("[1 true]").unwrap_err();
        match err {
            JsonError::Structural { message } => {
                assert!(message.contains("at line 1, column"), "{message}");
            }
            other => panic!("expected a structural error, got {other}"),
        }
    }

    #[test]
    fn depth_tracks_open_containers() {
        let mut reader = JsonReader::new(r#"{"a": [[1]]}"#);
        assert_eq!(reader.depth(), 0);
        assert_eq!(reader.read().unwrap(), JsonToken::ObjectStart);
        assert_eq!(reader.depth(), 1);
        assert_eq!(
            reader.read().unwrap(),
            JsonToken::PropertyName("a".to_string())
        );
        assert_eq!(reader.read().unwrap(), JsonToken::ArrayStart);
        assert_eq!(reader.read().unwrap(), JsonToken::ArrayStart);
        assert_eq!(reader.depth(), 3);
        assert_eq!(reader.read().unwrap(), JsonToken::Int(1));
        assert_eq!(reader.read().unwrap(), JsonToken::ArrayEnd);
        assert_eq!(reader.read().unwrap(), JsonToken::ArrayEnd);
        assert_eq!(reader.read().unwrap(), JsonToken::ObjectEnd);
        assert_eq!(reader.depth(), 0);
        reader.expect_end().unwrap();
    }

    #[test]
    fn missing_colon_rejected() {
        assert!(read_all(r#"{"a" 1}"#).is_err());
    }

    #[test]
    fn trailing_content_rejected() {
        assert!(read_all("null extra").is_err());
    }

    #[test]
    fn depth_guard() {
        let deep = "[".repeat(101) + &"]".repeat(101);
        let err = read_all(&deep).unwrap_err();
        assert!(matches!(err, JsonError::DepthExceeded { limit: 100 }));
    }

    #[test]
    fn skip_value_consumes_whole_subtree() {
        let mut reader = JsonReader::new(r#"{"a": {"x": [1, 2, {"y": 3}]}, "b": 2}"#);
        assert_eq!(reader.read().unwrap(), JsonToken::ObjectStart);
        assert_eq!(
            reader.read().unwrap(),
            JsonToken::PropertyName("a".to_string())
        );
        reader.skip_value().unwrap();
        assert_eq!(
            reader.read().unwrap(),
            JsonToken::PropertyName("b".to_string())
        );
        assert_eq!(reader.read().unwrap(), JsonToken::Int(2));
        assert_eq!(reader.read().unwrap(), JsonToken::ObjectEnd);
        reader.expect_end().unwrap();
    }
}
