use alloc::{boxed::Box, rc::Rc, string::String, vec::Vec};
use core::{cell::RefCell, fmt};

use super::{
    Nestable, ReadObject, ReadResult,
    slot::{Finalizer, PolymorphHandler, Slot},
};
use crate::{
    error::{ElementKind, SchemaError},
    tag::Tagged,
};

/// Handlers for the elements of one JSON array.
///
/// An array binds a single handler that every element must match. Elements of
/// any other kind are schema errors.
///
/// ```
/// use std::cell::Cell;
///
/// use jsonbind::Read;
///
/// let total = &Cell::new(0);
/// let mut read = Read::new();
/// read.array(move |numbers| {
///     numbers.int(move |n| {
///         total.set(total.get() + n);
///         Ok(())
///     });
///     Ok(())
/// });
/// read.parse("[1, 2, 3]").unwrap();
/// assert_eq!(total.get(), 6);
/// ```
#[derive(Default)]
pub struct ReadArray<'h> {
    slot: Option<Slot<'h>>,
    finalizer: Option<Finalizer<'h>>,
    discard: bool,
}

impl<'h> ReadArray<'h> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Accept anything up to the matching `]` without dispatching it.
    pub(crate) fn discard() -> Self {
        Self {
            discard: true,
            ..Self::default()
        }
    }

    pub(crate) fn set(&mut self, slot: Slot<'h>) {
        if let Some(existing) = &self.slot {
            panic!(
                "array context already has a handler ({}); cannot also register {}",
                existing.kind_name(),
                slot.kind_name()
            );
        }
        self.slot = Some(slot);
    }

    /// Elements are booleans.
    ///
    /// # Panics
    ///
    /// Panics if a handler is already registered; so do all the other
    /// registration methods.
    pub fn bool(&mut self, handler: impl FnMut(bool) -> ReadResult + 'h) {
        self.set(Slot::Bool(Box::new(handler)));
    }

    /// Elements are numbers that fit an `i64`.
    pub fn int(&mut self, handler: impl FnMut(i64) -> ReadResult + 'h) {
        self.set(Slot::Int(Box::new(handler)));
    }

    /// Elements are numbers that fit a `u64`.
    pub fn uint(&mut self, handler: impl FnMut(u64) -> ReadResult + 'h) {
        self.set(Slot::UInt(Box::new(handler)));
    }

    pub fn float(&mut self, handler: impl FnMut(f64) -> ReadResult + 'h) {
        self.set(Slot::Float(Box::new(handler)));
    }

    /// Elements are `utf8:` strings; the handler receives the text without
    /// its tag.
    pub fn string(&mut self, handler: impl FnMut(String) -> ReadResult + 'h) {
        self.set(Slot::String(Box::new(handler)));
    }

    /// Elements are `alpha16:` strings; the handler receives decoded bytes.
    pub fn binary(&mut self, handler: impl FnMut(Vec<u8>) -> ReadResult + 'h) {
        self.set(Slot::Binary(Box::new(handler)));
    }

    /// Elements are objects. The handler registers field handlers on each one
    /// before its first key is read.
    pub fn object(&mut self, handler: impl FnMut(&mut ReadObject<'h>) -> ReadResult + 'h) {
        self.set(Slot::Object(Box::new(handler)));
    }

    pub fn array(&mut self, handler: impl FnMut(&mut ReadArray<'h>) -> ReadResult + 'h) {
        self.set(Slot::Array(Box::new(handler)));
    }

    /// Elements are polymorphic values, `["utf8:<tag>", {...}]`.
    ///
    /// The handler is called once per element with the tag and the element's
    /// object, and registers the field handlers that tag calls for.
    pub fn polymorph(&mut self, handler: impl FnMut(String, &mut ReadObject<'h>) -> ReadResult + 'h) {
        let handler: PolymorphHandler<'h> = Rc::new(RefCell::new(handler));
        self.set(Slot::Polymorph(handler));
    }

    /// Runs when the closing `]` is read.
    ///
    /// # Panics
    ///
    /// Panics if a finalizer is already registered.
    pub fn finally(&mut self, finalizer: impl FnMut() -> ReadResult + 'h) {
        assert!(self.finalizer.is_none(), "array context already has a finalizer");
        self.finalizer = Some(Box::new(finalizer));
    }

    fn slot(&mut self) -> Option<&mut Slot<'h>> {
        self.slot.as_mut()
    }
}

impl<'h> Nestable<'h> for ReadArray<'h> {
    fn on_null(&mut self) -> ReadResult {
        Ok(())
    }

    fn on_bool(&mut self, value: bool) -> ReadResult {
        if self.discard {
            return Ok(());
        }
        self.slot()
            .and_then(|slot| slot.deliver_bool(value))
            .unwrap_or(Err(SchemaError::NoHandler(ElementKind::Bool)))
    }

    fn on_number(&mut self, text: &str) -> ReadResult {
        if self.discard {
            return Ok(());
        }
        self.slot()
            .and_then(|slot| slot.deliver_number(text))
            .unwrap_or(Err(SchemaError::NoNumericHandler))
    }

    fn on_string(&mut self, tagged: Tagged) -> ReadResult {
        if self.discard {
            return Ok(());
        }
        let kind = match tagged {
            Tagged::Text(_) => ElementKind::String,
            Tagged::Binary(_) => ElementKind::Binary,
        };
        self.slot()
            .and_then(|slot| slot.deliver_tagged(tagged))
            .unwrap_or(Err(SchemaError::NoHandler(kind)))
    }

    fn on_key(&mut self, _key: &str) -> ReadResult {
        Err(SchemaError::KeyInArray)
    }

    fn on_object(&mut self, object: &mut ReadObject<'h>) -> ReadResult {
        if self.discard {
            return Ok(());
        }
        self.slot()
            .and_then(|slot| slot.deliver_object(object))
            .unwrap_or(Err(SchemaError::NoHandler(ElementKind::Object)))
    }

    fn on_array(&mut self, array: &mut ReadArray<'h>) -> ReadResult {
        if self.discard {
            *array = ReadArray::discard();
            return Ok(());
        }
        self.slot()
            .and_then(|slot| slot.deliver_array(array))
            .unwrap_or(Err(SchemaError::NoHandler(ElementKind::Array)))
    }

    fn on_close(&mut self) -> ReadResult {
        if let Some(slot) = &self.slot {
            slot.check_complete()?;
        }
        match &mut self.finalizer {
            Some(finalizer) => finalizer(),
            None => Ok(()),
        }
    }

    fn kind(&self) -> &'static str {
        if self.discard { "discarded array" } else { "array" }
    }
}

impl fmt::Debug for ReadArray<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadArray")
            .field("handler", &self.slot.as_ref().map(Slot::kind_name))
            .field("finally", &self.finalizer.is_some())
            .field("discard", &self.discard)
            .finish()
    }
}
