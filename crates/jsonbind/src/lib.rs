//! Declarative, streaming JSON binding.
//!
//! Reading is push-driven: register handlers for the values you expect on a
//! [`Read`], then feed it input. Each value is handed to the matching handler
//! as soon as it is complete; nothing is buffered into a document tree.
//! Handlers for containers register further handlers on the nested
//! [`ReadObject`] or [`ReadArray`] they receive, so the schema unfolds along
//! with the document.
//!
//! Writing mirrors this with scopes: [`Write::object`] opens an object that
//! is closed when the returned [`WriteObject`] is dropped.
//!
//! Two conventions sit on top of plain JSON:
//!
//! - Every string is tagged: `utf8:` text or `alpha16:` binary (see
//!   [`encode_text`] and [`encode_binary`]).
//! - A polymorphic value is the array `["utf8:<tag>", {...}]`, whose object is
//!   read with handlers chosen by the tag.
//!
//! ```
//! use std::cell::RefCell;
//!
//! use jsonbind::{Read, SchemaError, Write};
//!
//! let mut write = Write::new();
//! {
//!     let mut shapes = write.array();
//!     shapes.polymorph("circle").float("r", 2.0);
//!     shapes.polymorph("square").uint("side", 3);
//! }
//! let text = write.dump();
//!
//! let shapes = &RefCell::new(Vec::new());
//! let mut read = Read::new();
//! read.array(move |list| {
//!     list.polymorph(move |tag, shape| {
//!         match tag.as_str() {
//!             "circle" => shape.float("r", move |r| {
//!                 shapes.borrow_mut().push(format!("circle {r}"));
//!                 Ok(())
//!             }),
//!             "square" => shape.uint("side", move |side| {
//!                 shapes.borrow_mut().push(format!("square {side}"));
//!                 Ok(())
//!             }),
//!             other => return Err(SchemaError::custom(format_args!("unknown shape {other}"))),
//!         }
//!         Ok(())
//!     });
//!     Ok(())
//! });
//! read.parse(&text).unwrap();
//!
//! assert_eq!(*shapes.borrow(), ["circle 2", "square 3"]);
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod error;
mod options;
mod read;
mod tag;
mod tokenizer;
mod write;


pub use error::{ElementKind, NumberKind, ParseError, SchemaError, SyntaxError, TagError};
pub use options::{ReadOptions, WriteOptions};
pub use read::{Read, ReadArray, ReadObject, ReadResult};
pub use tag::{BINARY_PREFIX, TEXT_PREFIX, Tagged, decode_tagged, encode_binary, encode_text};
pub use write::{Write, WriteArray, WriteObject, WritePolymorph};
