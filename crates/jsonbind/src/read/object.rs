use alloc::{
    boxed::Box,
    collections::{BTreeMap, btree_map::Entry},
    rc::Rc,
    string::{String, ToString},
    vec::Vec,
};
use core::{cell::RefCell, fmt};

use super::{
    Nestable, ReadArray, ReadResult,
    slot::{Finalizer, PolymorphHandler, Slot},
};
use crate::{error::SchemaError, tag::Tagged};

/// Handlers for the fields of one JSON object.
///
/// Fields are bound by key. Keys without a handler, and values of a different
/// kind than the handler for their key expects, are skipped.
#[derive(Default)]
pub struct ReadObject<'h> {
    slots: BTreeMap<String, Slot<'h>>,
    last_key: Option<String>,
    finalizer: Option<Finalizer<'h>>,
}

impl<'h> ReadObject<'h> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn set(&mut self, key: impl Into<String>, slot: Slot<'h>) {
        match self.slots.entry(key.into()) {
            Entry::Occupied(existing) => panic!(
                "object context key '{}' already has a handler ({})",
                existing.key(),
                existing.get().kind_name()
            ),
            Entry::Vacant(vacant) => {
                vacant.insert(slot);
            }
        }
    }

    /// # Panics
    ///
    /// Panics if `key` already has a handler; so do all the other
    /// registration methods.
    pub fn bool(&mut self, key: impl Into<String>, handler: impl FnMut(bool) -> ReadResult + 'h) {
        self.set(key, Slot::Bool(Box::new(handler)));
    }

    pub fn int(&mut self, key: impl Into<String>, handler: impl FnMut(i64) -> ReadResult + 'h) {
        self.set(key, Slot::Int(Box::new(handler)));
    }

    pub fn uint(&mut self, key: impl Into<String>, handler: impl FnMut(u64) -> ReadResult + 'h) {
        self.set(key, Slot::UInt(Box::new(handler)));
    }

    pub fn float(&mut self, key: impl Into<String>, handler: impl FnMut(f64) -> ReadResult + 'h) {
        self.set(key, Slot::Float(Box::new(handler)));
    }

    pub fn string(&mut self, key: impl Into<String>, handler: impl FnMut(String) -> ReadResult + 'h) {
        self.set(key, Slot::String(Box::new(handler)));
    }

    pub fn binary(&mut self, key: impl Into<String>, handler: impl FnMut(Vec<u8>) -> ReadResult + 'h) {
        self.set(key, Slot::Binary(Box::new(handler)));
    }

    pub fn object(
        &mut self,
        key: impl Into<String>,
        handler: impl FnMut(&mut ReadObject<'h>) -> ReadResult + 'h,
    ) {
        self.set(key, Slot::Object(Box::new(handler)));
    }

    pub fn array(
        &mut self,
        key: impl Into<String>,
        handler: impl FnMut(&mut ReadArray<'h>) -> ReadResult + 'h,
    ) {
        self.set(key, Slot::Array(Box::new(handler)));
    }

    /// The field holds a polymorphic value, `["utf8:<tag>", {...}]`; see
    /// [`ReadArray::polymorph`].
    pub fn polymorph(
        &mut self,
        key: impl Into<String>,
        handler: impl FnMut(String, &mut ReadObject<'h>) -> ReadResult + 'h,
    ) {
        let handler: PolymorphHandler<'h> = Rc::new(RefCell::new(handler));
        self.set(key, Slot::Polymorph(handler));
    }

    /// Runs when the closing `}` is read.
    ///
    /// # Panics
    ///
    /// Panics if a finalizer is already registered.
    pub fn finally(&mut self, finalizer: impl FnMut() -> ReadResult + 'h) {
        assert!(self.finalizer.is_none(), "object context already has a finalizer");
        self.finalizer = Some(Box::new(finalizer));
    }

    /// The slot bound to the pending key, consuming the key.
    fn take_slot(&mut self) -> Result<Option<&mut Slot<'h>>, SchemaError> {
        let key = self.last_key.take().ok_or(SchemaError::ValueWithoutKey)?;
        Ok(self.slots.get_mut(&key))
    }
}

impl<'h> Nestable<'h> for ReadObject<'h> {
    fn on_null(&mut self) -> ReadResult {
        self.last_key = None;
        Ok(())
    }

    fn on_bool(&mut self, value: bool) -> ReadResult {
        self.take_slot()?
            .and_then(|slot| slot.deliver_bool(value))
            .unwrap_or(Ok(()))
    }

    fn on_number(&mut self, text: &str) -> ReadResult {
        self.take_slot()?
            .and_then(|slot| slot.deliver_number(text))
            .unwrap_or(Ok(()))
    }

    fn on_string(&mut self, tagged: Tagged) -> ReadResult {
        self.take_slot()?
            .and_then(|slot| slot.deliver_tagged(tagged))
            .unwrap_or(Ok(()))
    }

    fn on_key(&mut self, key: &str) -> ReadResult {
        self.last_key = Some(key.to_string());
        Ok(())
    }

    fn on_object(&mut self, object: &mut ReadObject<'h>) -> ReadResult {
        self.take_slot()?
            .and_then(|slot| slot.deliver_object(object))
            .unwrap_or(Ok(()))
    }

    fn on_array(&mut self, array: &mut ReadArray<'h>) -> ReadResult {
        match self.take_slot()?.and_then(|slot| slot.deliver_array(array)) {
            Some(result) => result,
            None => {
                *array = ReadArray::discard();
                Ok(())
            }
        }
    }

    fn on_close(&mut self) -> ReadResult {
        match &mut self.finalizer {
            Some(finalizer) => finalizer(),
            None => Ok(()),
        }
    }

    fn kind(&self) -> &'static str {
        "object"
    }
}

impl fmt::Debug for ReadObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadObject")
            .field(
                "handlers",
                &self
                    .slots
                    .iter()
                    .map(|(key, slot)| (key.as_str(), slot.kind_name()))
                    .collect::<Vec<_>>(),
            )
            .field("last_key", &self.last_key)
            .field("finally", &self.finalizer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn unknown_keys_and_mismatched_kinds_are_ignored() {
        let names = RefCell::new(Vec::new());
        let mut object = ReadObject::new();
        object.string("name", |name| {
            names.borrow_mut().push(name);
            Ok(())
        });

        object.on_key("age").unwrap();
        assert_eq!(object.on_number("42"), Ok(()));

        object.on_key("name").unwrap();
        assert_eq!(object.on_number("42"), Ok(()));

        object.on_key("name").unwrap();
        assert_eq!(object.on_string(Tagged::Binary(vec![7])), Ok(()));

        object.on_key("name").unwrap();
        assert_eq!(object.on_string(Tagged::Text("ada".into())), Ok(()));

        drop(object);
        assert_eq!(names.into_inner(), vec!["ada"]);
    }

    #[test]
    fn every_value_needs_a_key() {
        let mut object = ReadObject::new();
        assert_eq!(object.on_bool(true), Err(SchemaError::ValueWithoutKey));

        object.on_key("a").unwrap();
        assert_eq!(object.on_bool(true), Ok(()));
        assert_eq!(object.on_bool(true), Err(SchemaError::ValueWithoutKey));

        object.on_key("a").unwrap();
        assert_eq!(object.on_null(), Ok(()));
        assert_eq!(
            object.on_object(&mut ReadObject::new()),
            Err(SchemaError::ValueWithoutKey)
        );
    }

    #[test]
    fn registered_number_must_convert() {
        let mut object = ReadObject::new();
        object.int("n", |_| Ok(()));
        object.on_key("n").unwrap();
        assert_eq!(
            object.on_number("0.5"),
            Err(SchemaError::InvalidNumber {
                kind: crate::NumberKind::Int,
                text: "0.5".into()
            })
        );
    }

    #[test]
    fn unbound_arrays_are_discarded() {
        let mut object = ReadObject::new();
        object.bool("flag", |_| Ok(()));

        object.on_key("other").unwrap();
        let mut array = ReadArray::new();
        assert_eq!(object.on_array(&mut array), Ok(()));
        assert_eq!(array.on_number("1"), Ok(()));

        object.on_key("flag").unwrap();
        let mut array = ReadArray::new();
        assert_eq!(object.on_array(&mut array), Ok(()));
        assert_eq!(array.kind(), "discarded array");
    }

    #[test]
    #[should_panic(expected = "object context key 'id' already has a handler (int)")]
    fn duplicate_key_panics() {
        let mut object = ReadObject::new();
        object.int("id", |_| Ok(()));
        object.string("id", |_| Ok(()));
    }
}
