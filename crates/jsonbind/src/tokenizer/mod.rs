//! Push tokenizer for JSON text.
//!
//! Input arrives as byte chunks through [`Tokenizer::feed`]; tokens are handed
//! to a [`TokenSink`] as soon as they are complete. Chunk boundaries may fall
//! anywhere, including inside a number, an escape sequence, or a multi-byte
//! character. Strings are accumulated as bytes and validated as UTF-8 once the
//! closing quote arrives; everything outside strings is ASCII.
//!
//! The tokenizer enforces the grammar (matched brackets, key/value
//! alternation, commas) so that sinks never see a malformed token sequence.
//! After the first syntax error it stays failed.
//!
//! ```ignore
//! let mut tokenizer = Tokenizer::new(ReadOptions::default());
//! let mut tokens = Vec::new();
//! tokenizer.feed(br#"{"a": [1, tr"#, &mut tokens)?;
//! tokenizer.feed(b"ue]}", &mut tokens)?;
//! tokenizer.finish(&mut tokens)?;
//! ```
#![allow(clippy::enum_glob_use)]

mod escape_buffer;
mod literal_buffer;


use alloc::{
    format,
    string::{String, ToString},
    vec::Vec,
};

use escape_buffer::{Escape, UnicodeEscapeBuffer};
use literal_buffer::PendingLiteral;

use crate::{error::SyntaxError, options::ReadOptions};

/// A primitive JSON event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Null,
    Bool(bool),
    /// Raw number text, exactly as written.
    Number(&'a str),
    String(&'a str),
    Key(&'a str),
    ObjectBegin,
    ObjectEnd,
    ArrayBegin,
    ArrayEnd,
}

/// Receiver of tokens.
pub(crate) trait TokenSink {
    fn token(&mut self, token: Token<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Array,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    BeforePropertyName { first: bool },
    AfterPropertyName,
    BeforePropertyValue,
    BeforeArrayValue { first: bool },
    AfterPropertyValue,
    AfterArrayValue,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Default,
    Literal,
    Sign,
    Zero,
    DecimalInteger,
    DecimalPoint,
    DecimalFraction,
    DecimalExponent,
    DecimalExponentSign,
    DecimalExponentInteger,
    String,
    StringEscape,
    StringEscapeUnicode,
}

/// Whether the byte just examined was used up or must be looked at again in
/// the new state (numbers only end when a delimiter shows up).
enum Step {
    Consumed,
    Retry,
}

#[derive(Debug)]
pub(crate) struct Tokenizer {
    options: ReadOptions,

    parse_state: ParseState,
    lex_state: LexState,
    frames: Vec<Container>,

    line: usize,
    column: usize,

    /// String bytes, validated as UTF-8 when the string closes.
    buffer: Vec<u8>,
    number: String,
    string_is_key: bool,
    unicode_escape_buffer: UnicodeEscapeBuffer,
    literal: Option<PendingLiteral>,

    failed: Option<SyntaxError>,
}

impl Tokenizer {
    pub(crate) fn new(options: ReadOptions) -> Self {
        Self {
            options,
            parse_state: ParseState::Start,
            lex_state: LexState::Default,
            frames: Vec::with_capacity(16),
            line: 1,
            column: 1,
            buffer: Vec::new(),
            number: String::new(),
            string_is_key: false,
            unicode_escape_buffer: UnicodeEscapeBuffer::new(),
            literal: None,
            failed: None,
        }
    }

    /// Forgets all input seen so far, including a previous failure.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.options);
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn feed<S: TokenSink>(&mut self, input: &[u8], sink: &mut S) -> Result<(), SyntaxError> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }

        let mut index = 0;
        while index < input.len() {
            let byte = input[index];
            match self.step(byte, &input[index..], sink) {
                Ok(Step::Consumed) => {
                    self.advance(byte);
                    index += 1;
                }
                Ok(Step::Retry) => {}
                Err(err) => return Err(self.fail(err)),
            }
        }
        Ok(())
    }

    /// Signals end of input: flushes a trailing number and checks that a
    /// complete document was seen.
    pub(crate) fn finish<S: TokenSink>(&mut self, sink: &mut S) -> Result<(), SyntaxError> {
        use LexState::*;

        if let Some(err) = &self.failed {
            return Err(err.clone());
        }

        match self.lex_state {
            Default => {}
            Zero | DecimalInteger | DecimalFraction | DecimalExponentInteger => {
                self.emit_number(sink);
            }
            _ => return Err(self.fail(self.unexpected_end())),
        }

        if self.parse_state == ParseState::End {
            Ok(())
        } else {
            Err(self.fail(self.unexpected_end()))
        }
    }

    fn advance(&mut self, byte: u8) {
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if byte & 0xC0 != 0x80 {
            // UTF-8 continuation bytes do not start a new column.
            self.column += 1;
        }
    }

    #[allow(clippy::too_many_lines)]
    fn step<S: TokenSink>(&mut self, byte: u8, rest: &[u8], sink: &mut S) -> Result<Step, SyntaxError> {
        use LexState::*;

        match self.lex_state {
            Default => self.step_structure(byte, rest, sink),

            // -------------------------- LITERALS -----------------------------
            Literal => match self.literal.as_mut().map(|literal| literal.step(byte)) {
                Some(literal_buffer::Step::NeedMore) => Ok(Step::Consumed),
                Some(literal_buffer::Step::Done(token)) => {
                    self.literal = None;
                    sink.token(token);
                    self.lex_state = Default;
                    self.value_done();
                    Ok(Step::Consumed)
                }
                Some(literal_buffer::Step::Reject) | None => Err(self.invalid_byte(rest)),
            },

            // -------------------------- NUMBERS -----------------------------
            Sign => match byte {
                b'0' => self.push_number(byte, Zero),
                b'1'..=b'9' => self.push_number(byte, DecimalInteger),
                _ => Err(self.invalid_byte(rest)),
            },

            Zero => match byte {
                b'.' => self.push_number(byte, DecimalPoint),
                b'e' | b'E' => self.push_number(byte, DecimalExponent),
                _ => {
                    self.emit_number(sink);
                    Ok(Step::Retry)
                }
            },

            DecimalInteger => match byte {
                b'0'..=b'9' => self.push_number(byte, DecimalInteger),
                b'.' => self.push_number(byte, DecimalPoint),
                b'e' | b'E' => self.push_number(byte, DecimalExponent),
                _ => {
                    self.emit_number(sink);
                    Ok(Step::Retry)
                }
            },

            DecimalPoint => match byte {
                b'0'..=b'9' => self.push_number(byte, DecimalFraction),
                _ => Err(self.invalid_byte(rest)),
            },

            DecimalFraction => match byte {
                b'0'..=b'9' => self.push_number(byte, DecimalFraction),
                b'e' | b'E' => self.push_number(byte, DecimalExponent),
                _ => {
                    self.emit_number(sink);
                    Ok(Step::Retry)
                }
            },

            DecimalExponent => match byte {
                b'+' | b'-' => self.push_number(byte, DecimalExponentSign),
                b'0'..=b'9' => self.push_number(byte, DecimalExponentInteger),
                _ => Err(self.invalid_byte(rest)),
            },

            DecimalExponentSign => match byte {
                b'0'..=b'9' => self.push_number(byte, DecimalExponentInteger),
                _ => Err(self.invalid_byte(rest)),
            },

            DecimalExponentInteger => match byte {
                b'0'..=b'9' => self.push_number(byte, DecimalExponentInteger),
                _ => {
                    self.emit_number(sink);
                    Ok(Step::Retry)
                }
            },

            // -------------------------- STRING -----------------------------
            String => match byte {
                _ if self.unicode_escape_buffer.awaiting_low_surrogate() && byte != b'\\' => {
                    Err(self.syntax_error("unpaired surrogate in unicode escape sequence"))
                }
                b'\\' => {
                    self.lex_state = StringEscape;
                    Ok(Step::Consumed)
                }
                b'"' => {
                    self.emit_string(sink)?;
                    Ok(Step::Consumed)
                }
                // JSON allows 0x20 .. 0x10FFFF unescaped.
                0x00..=0x1F => Err(self.invalid_byte(rest)),
                _ => {
                    self.buffer.push(byte);
                    Ok(Step::Consumed)
                }
            },

            StringEscape => {
                if self.unicode_escape_buffer.awaiting_low_surrogate() && byte != b'u' {
                    return Err(self.syntax_error("unpaired surrogate in unicode escape sequence"));
                }
                let unescaped = match byte {
                    b'"' | b'\\' | b'/' => byte,
                    b'b' => 0x08,
                    b'f' => 0x0C,
                    b'n' => b'\n',
                    b'r' => b'\r',
                    b't' => b'\t',
                    b'u' => {
                        self.unicode_escape_buffer.begin();
                        self.lex_state = StringEscapeUnicode;
                        return Ok(Step::Consumed);
                    }
                    _ => return Err(self.invalid_byte(rest)),
                };
                self.buffer.push(unescaped);
                self.lex_state = String;
                Ok(Step::Consumed)
            }

            StringEscapeUnicode => match self.unicode_escape_buffer.feed(byte) {
                Ok(Escape::NeedMore) => Ok(Step::Consumed),
                Ok(Escape::AwaitLowSurrogate) => {
                    self.lex_state = String;
                    Ok(Step::Consumed)
                }
                Ok(Escape::Char(ch)) => {
                    let mut encoded = [0u8; 4];
                    self.buffer
                        .extend_from_slice(ch.encode_utf8(&mut encoded).as_bytes());
                    self.lex_state = String;
                    Ok(Step::Consumed)
                }
                Err(err) => Err(self.syntax_error(err.message())),
            },
        }
    }

    /// Between tokens: whitespace, punctuation, and the start of values.
    fn step_structure<S: TokenSink>(&mut self, byte: u8, rest: &[u8], sink: &mut S) -> Result<Step, SyntaxError> {
        if matches!(byte, b' ' | b'\t' | b'\n' | b'\r') {
            return Ok(Step::Consumed);
        }

        match self.parse_state {
            ParseState::Start | ParseState::BeforePropertyValue => self.begin_value(byte, rest, sink),

            ParseState::BeforeArrayValue { first } => {
                if first && byte == b']' {
                    self.close(Container::Array, sink);
                    Ok(Step::Consumed)
                } else {
                    self.begin_value(byte, rest, sink)
                }
            }

            ParseState::BeforePropertyName { first } => match byte {
                b'}' if first => {
                    self.close(Container::Object, sink);
                    Ok(Step::Consumed)
                }
                b'"' => {
                    self.begin_string(true);
                    Ok(Step::Consumed)
                }
                _ => Err(self.invalid_byte(rest)),
            },

            ParseState::AfterPropertyName => match byte {
                b':' => {
                    self.parse_state = ParseState::BeforePropertyValue;
                    Ok(Step::Consumed)
                }
                _ => Err(self.invalid_byte(rest)),
            },

            ParseState::AfterPropertyValue => match byte {
                b',' => {
                    self.parse_state = ParseState::BeforePropertyName { first: false };
                    Ok(Step::Consumed)
                }
                b'}' => {
                    self.close(Container::Object, sink);
                    Ok(Step::Consumed)
                }
                _ => Err(self.invalid_byte(rest)),
            },

            ParseState::AfterArrayValue => match byte {
                b',' => {
                    self.parse_state = ParseState::BeforeArrayValue { first: false };
                    Ok(Step::Consumed)
                }
                b']' => {
                    self.close(Container::Array, sink);
                    Ok(Step::Consumed)
                }
                _ => Err(self.invalid_byte(rest)),
            },

            ParseState::End if self.options.allow_multiple_json_values => {
                self.parse_state = ParseState::Start;
                Ok(Step::Retry)
            }
            ParseState::End => Err(self.syntax_error(&format!(
                "trailing character '{}' after top-level value",
                format_char(decode_char(rest))
            ))),
        }
    }

    fn begin_value<S: TokenSink>(&mut self, byte: u8, rest: &[u8], sink: &mut S) -> Result<Step, SyntaxError> {
        match byte {
            b'{' => self.open(Container::Object, sink)?,
            b'[' => self.open(Container::Array, sink)?,
            b'"' => self.begin_string(false),
            b't' | b'f' | b'n' => {
                self.literal = PendingLiteral::after(byte);
                self.lex_state = LexState::Literal;
            }
            b'-' => {
                self.number.clear();
                return self.push_number(byte, LexState::Sign);
            }
            b'0' => {
                self.number.clear();
                return self.push_number(byte, LexState::Zero);
            }
            b'1'..=b'9' => {
                self.number.clear();
                return self.push_number(byte, LexState::DecimalInteger);
            }
            _ => return Err(self.invalid_byte(rest)),
        }
        Ok(Step::Consumed)
    }

    fn begin_string(&mut self, key: bool) {
        self.buffer.clear();
        self.unicode_escape_buffer.reset();
        self.string_is_key = key;
        self.lex_state = LexState::String;
    }

    fn push_number(&mut self, byte: u8, next: LexState) -> Result<Step, SyntaxError> {
        self.number.push(char::from(byte));
        self.lex_state = next;
        Ok(Step::Consumed)
    }

    fn emit_number<S: TokenSink>(&mut self, sink: &mut S) {
        sink.token(Token::Number(&self.number));
        self.number.clear();
        self.lex_state = LexState::Default;
        self.value_done();
    }

    fn emit_string<S: TokenSink>(&mut self, sink: &mut S) -> Result<(), SyntaxError> {
        let Ok(text) = core::str::from_utf8(&self.buffer) else {
            return Err(self.syntax_error("invalid UTF-8 in string"));
        };
        self.lex_state = LexState::Default;
        if self.string_is_key {
            sink.token(Token::Key(text));
            self.parse_state = ParseState::AfterPropertyName;
        } else {
            sink.token(Token::String(text));
            self.value_done();
        }
        self.buffer.clear();
        Ok(())
    }

    fn open<S: TokenSink>(&mut self, container: Container, sink: &mut S) -> Result<(), SyntaxError> {
        if let Some(max) = self.options.max_depth {
            if self.frames.len() >= max {
                return Err(self.syntax_error(&format!("maximum nesting depth {max} exceeded")));
            }
        }
        self.frames.push(container);
        match container {
            Container::Object => {
                sink.token(Token::ObjectBegin);
                self.parse_state = ParseState::BeforePropertyName { first: true };
            }
            Container::Array => {
                sink.token(Token::ArrayBegin);
                self.parse_state = ParseState::BeforeArrayValue { first: true };
            }
        }
        Ok(())
    }

    fn close<S: TokenSink>(&mut self, container: Container, sink: &mut S) {
        let popped = self.frames.pop();
        debug_assert_eq!(popped, Some(container), "close token does not match open frame");
        sink.token(match container {
            Container::Object => Token::ObjectEnd,
            Container::Array => Token::ArrayEnd,
        });
        self.value_done();
    }

    fn value_done(&mut self) {
        self.parse_state = match self.frames.last() {
            None => ParseState::End,
            Some(Container::Array) => ParseState::AfterArrayValue,
            Some(Container::Object) => ParseState::AfterPropertyValue,
        };
    }

    // ------------------------------------------------------------------------------------------------
    // Errors
    // ------------------------------------------------------------------------------------------------

    fn fail(&mut self, err: SyntaxError) -> SyntaxError {
        log::debug!("syntax error: {err}");
        self.failed = Some(err.clone());
        err
    }

    fn invalid_byte(&self, rest: &[u8]) -> SyntaxError {
        self.syntax_error(&format!("invalid character '{}'", format_char(decode_char(rest))))
    }

    fn unexpected_end(&self) -> SyntaxError {
        self.syntax_error("unexpected end of input")
    }

    fn syntax_error(&self, message: &str) -> SyntaxError {
        SyntaxError {
            message: message.to_string(),
            line: self.line,
            column: self.column,
        }
    }
}

/// The character starting at the head of `rest`, as far as it can be decoded.
fn decode_char(rest: &[u8]) -> char {
    bstr::decode_utf8(rest).0.unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn format_char(c: char) -> String {
    match c {
        '"' => "\\\"".into(),
        '\\' => "\\\\".into(),
        '\n' => "\\n".into(),
        '\r' => "\\r".into(),
        '\t' => "\\t".into(),
        c if c.is_control() => format!("\\u{:04X}", c as u32),
        c => c.to_string(),
    }
}

/// Collects tokens as owned strings; handy for tests.
#[cfg(test)]
impl TokenSink for Vec<alloc::string::String> {
    fn token(&mut self, token: Token<'_>) {
        self.push(match token {
            Token::Null => "null".into(),
            Token::Bool(value) => format!("bool {value}"),
            Token::Number(text) => format!("number {text}"),
            Token::String(text) => format!("string {text:?}"),
            Token::Key(text) => format!("key {text:?}"),
            Token::ObjectBegin => "{".into(),
            Token::ObjectEnd => "}".into(),
            Token::ArrayBegin => "[".into(),
            Token::ArrayEnd => "]".into(),
        });
    }
}
