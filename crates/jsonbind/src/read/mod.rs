//! Declarative, push-driven reading.
//!
//! A [`Read`] owns the tokenizer and a stack of live contexts. Each token is
//! routed to the innermost context, which matches it against the handlers the
//! caller registered and calls the one that fits. Handlers for nested
//! containers receive the fresh [`ReadObject`] or [`ReadArray`] and register
//! their own handlers on it before its contents arrive.
//!
//! ```
//! use std::cell::RefCell;
//!
//! use jsonbind::Read;
//!
//! let names = &RefCell::new(Vec::new());
//! let mut read = Read::new();
//! read.object(move |root| {
//!     root.array("people", move |people| {
//!         people.object(move |person| {
//!             person.string("name", move |name| {
//!                 names.borrow_mut().push(name);
//!                 Ok(())
//!             });
//!             Ok(())
//!         });
//!         Ok(())
//!     });
//!     Ok(())
//! });
//!
//! read.parse(r#"{"people": [{"name": "utf8:Ada"}, {"name": "utf8:Grace", "age": 85}]}"#)
//!     .unwrap();
//! assert_eq!(*names.borrow(), ["Ada", "Grace"]);
//! ```

mod array;
mod object;
mod slot;

#[cfg(test)]
mod tests;

use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};

pub use array::ReadArray;
pub use object::ReadObject;

use crate::{
    error::{ParseError, SchemaError},
    options::ReadOptions,
    tag::decode_tagged,
    tokenizer::{Token, TokenSink, Tokenizer},
};

/// What every handler returns. An error stops the parse.
pub type ReadResult = Result<(), SchemaError>;

#[cfg(feature = "std")]
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// The operations shared by array and object contexts.
pub(crate) trait Nestable<'h> {
    fn on_null(&mut self) -> ReadResult;
    fn on_bool(&mut self, value: bool) -> ReadResult;
    fn on_number(&mut self, text: &str) -> ReadResult;
    fn on_string(&mut self, tagged: crate::tag::Tagged) -> ReadResult;
    fn on_key(&mut self, key: &str) -> ReadResult;
    /// Offers a freshly opened object; the context registers handlers on it
    /// or leaves it empty.
    fn on_object(&mut self, object: &mut ReadObject<'h>) -> ReadResult;
    fn on_array(&mut self, array: &mut ReadArray<'h>) -> ReadResult;
    /// The closing bracket was read.
    fn on_close(&mut self) -> ReadResult;
    fn kind(&self) -> &'static str;
}

enum Frame<'h> {
    Array(ReadArray<'h>),
    Object(ReadObject<'h>),
}

impl<'h> Frame<'h> {
    fn nestable(&mut self) -> &mut dyn Nestable<'h> {
        match self {
            Frame::Array(array) => array,
            Frame::Object(object) => object,
        }
    }
}

/// The driver's view of its own state while the tokenizer is borrowed.
struct ContextStack<'a, 'h> {
    root: &'a mut ReadArray<'h>,
    stack: &'a mut Vec<Frame<'h>>,
    error: &'a mut Option<SchemaError>,
}

impl<'h> ContextStack<'_, 'h> {
    fn top(&mut self) -> &mut dyn Nestable<'h> {
        match self.stack.last_mut() {
            Some(frame) => frame.nestable(),
            None => &mut *self.root,
        }
    }

    fn push(&mut self, mut frame: Frame<'h>) {
        log::trace!(
            "push {} context at depth {}",
            frame.nestable().kind(),
            self.stack.len() + 1
        );
        self.stack.push(frame);
    }

    fn pop(&mut self) -> ReadResult {
        let Some(mut frame) = self.stack.pop() else {
            unreachable!("close token with no open context");
        };
        let context = frame.nestable();
        log::trace!("pop {} context at depth {}", context.kind(), self.stack.len() + 1);
        context.on_close()
    }

    fn dispatch(&mut self, token: Token<'_>) -> ReadResult {
        match token {
            Token::Null => self.top().on_null(),
            Token::Bool(value) => self.top().on_bool(value),
            Token::Number(text) => self.top().on_number(text),
            Token::String(wire) => {
                let tagged = decode_tagged(wire)?;
                self.top().on_string(tagged)
            }
            Token::Key(key) => self.top().on_key(key),
            Token::ObjectBegin => {
                let mut object = ReadObject::new();
                self.top().on_object(&mut object)?;
                self.push(Frame::Object(object));
                Ok(())
            }
            Token::ArrayBegin => {
                let mut array = ReadArray::new();
                self.top().on_array(&mut array)?;
                self.push(Frame::Array(array));
                Ok(())
            }
            Token::ObjectEnd | Token::ArrayEnd => self.pop(),
        }
    }
}

impl TokenSink for ContextStack<'_, '_> {
    fn token(&mut self, token: Token<'_>) {
        // The first schema error stops dispatch; the tokenizer still runs to
        // surface any syntax error after it.
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.dispatch(token) {
            log::debug!("schema error at depth {}: {err}", self.stack.len());
            *self.error = Some(err);
        }
    }
}

/// A parse session: the top-level context plus the machinery that feeds it.
///
/// `Read` dereferences to the top-level [`ReadArray`], which stands for the
/// whole document as a one-element array: register the handler for the
/// document's root value on it directly.
///
/// Handlers borrow from the environment for `'h`; they cannot reach the
/// `Read` itself, so a parse cannot be re-entered from inside a handler.
pub struct Read<'h> {
    root: ReadArray<'h>,
    stack: Vec<Frame<'h>>,
    tokenizer: Tokenizer,
    error: Option<SchemaError>,
}

impl<'h> Read<'h> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ReadOptions::default())
    }

    #[must_use]
    pub fn with_options(options: ReadOptions) -> Self {
        Self {
            root: ReadArray::new(),
            stack: Vec::new(),
            tokenizer: Tokenizer::new(options),
            error: None,
        }
    }

    /// Discards any partially read document. Top-level handlers stay
    /// registered.
    pub fn reset(&mut self) {
        self.tokenizer.reset();
        self.stack.clear();
        self.error = None;
    }

    /// The schema error that stopped dispatch, if any.
    ///
    /// [`feed`](Self::feed) only fails on syntax errors, so callers pushing a
    /// long stream can check this to stop early.
    #[must_use]
    pub fn schema_error(&self) -> Option<&SchemaError> {
        self.error.as_ref()
    }

    /// Pushes the next chunk of input. Chunks may split the input anywhere.
    ///
    /// # Errors
    ///
    /// Returns the syntax error, preceded by any schema error already
    /// recorded, once the input is known to be malformed.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Result<(), ParseError> {
        let mut sink = ContextStack {
            root: &mut self.root,
            stack: &mut self.stack,
            error: &mut self.error,
        };
        match self.tokenizer.feed(chunk.as_ref(), &mut sink) {
            Ok(()) => Ok(()),
            Err(syntax) => Err(self.compose(Some(syntax))),
        }
    }

    /// Marks the end of input and reports the outcome of the whole document.
    ///
    /// On success the top-level finalizer, if any, runs.
    ///
    /// # Errors
    ///
    /// Returns the first schema error, the syntax error, or both.
    pub fn finish(&mut self) -> Result<(), ParseError> {
        let mut sink = ContextStack {
            root: &mut self.root,
            stack: &mut self.stack,
            error: &mut self.error,
        };
        let syntax = self.tokenizer.finish(&mut sink).err();
        if syntax.is_none() && self.error.is_none() {
            debug_assert!(self.stack.is_empty(), "document ended with open contexts");
            if let Err(err) = self.root.on_close() {
                log::debug!("schema error in top-level finalizer: {err}");
                self.error = Some(err);
            }
        }
        match ParseError::compose(self.error.clone(), syntax) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Parses one complete document held in memory.
    ///
    /// # Errors
    ///
    /// See [`finish`](Self::finish).
    pub fn parse(&mut self, input: impl AsRef<[u8]>) -> Result<(), ParseError> {
        self.reset();
        self.feed(input)?;
        self.finish()
    }

    /// Parses a document streamed from `reader`.
    ///
    /// # Errors
    ///
    /// Fails as [`finish`](Self::finish) does, or with [`ParseError::Io`] if
    /// reading fails.
    #[cfg(feature = "std")]
    pub fn parse_reader<R: std::io::Read>(&mut self, mut reader: R) -> Result<(), ParseError> {
        self.reset();
        let mut buf = alloc::vec![0u8; READ_CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(ParseError::Io(err)),
            };
            self.feed(&buf[..n])?;
        }
        self.finish()
    }

    /// Parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Fails with [`ParseError::Open`] if the file cannot be opened, and
    /// otherwise as [`parse_reader`](Self::parse_reader) does.
    #[cfg(feature = "std")]
    pub fn parse_path(&mut self, path: impl AsRef<std::path::Path>) -> Result<(), ParseError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ParseError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_reader(file)
    }

    fn compose(&self, syntax: Option<crate::error::SyntaxError>) -> ParseError {
        match ParseError::compose(self.error.clone(), syntax) {
            Some(err) => err,
            None => unreachable!("compose called without an error"),
        }
    }
}

impl Default for Read<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h> Deref for Read<'h> {
    type Target = ReadArray<'h>;

    fn deref(&self) -> &Self::Target {
        &self.root
    }
}

impl DerefMut for Read<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.root
    }
}

impl core::fmt::Debug for Read<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Read")
            .field("root", &self.root)
            .field("depth", &self.tokenizer.depth())
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
