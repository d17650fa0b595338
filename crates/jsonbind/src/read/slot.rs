//! The handler registered for an array's elements or an object's key, and the
//! matching of incoming values against it.
//!
//! Every `deliver_*` method returns `None` when the slot holds a handler of a
//! different kind. Array contexts turn that into an error; object contexts
//! ignore it.

use alloc::{boxed::Box, rc::Rc, string::String, vec::Vec};
use core::cell::RefCell;

use super::{ReadArray, ReadObject, ReadResult};
use crate::{
    error::{NumberKind, SchemaError},
    tag::Tagged,
};

pub(crate) type Handler<'h, T> = Box<dyn FnMut(T) -> ReadResult + 'h>;
pub(crate) type ObjectHandler<'h> = Box<dyn FnMut(&mut ReadObject<'h>) -> ReadResult + 'h>;
pub(crate) type ArrayHandler<'h> = Box<dyn FnMut(&mut ReadArray<'h>) -> ReadResult + 'h>;
pub(crate) type Finalizer<'h> = Box<dyn FnMut() -> ReadResult + 'h>;

/// Shared between the slot it was registered on and every carrier array that
/// slot starts.
pub(crate) type PolymorphHandler<'h> =
    Rc<RefCell<dyn FnMut(String, &mut ReadObject<'h>) -> ReadResult + 'h>>;

/// Integers beyond this magnitude are not exactly representable as `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

pub(crate) enum Slot<'h> {
    Bool(Handler<'h, bool>),
    Int(Handler<'h, i64>),
    UInt(Handler<'h, u64>),
    Float(Handler<'h, f64>),
    String(Handler<'h, String>),
    Binary(Handler<'h, Vec<u8>>),
    Object(ObjectHandler<'h>),
    Array(ArrayHandler<'h>),
    Polymorph(PolymorphHandler<'h>),
    /// The carrier array of a polymorphic value, between `[` and `]`.
    PolymorphBody {
        tag: Option<String>,
        delivered: bool,
        handler: PolymorphHandler<'h>,
    },
}

impl<'h> Slot<'h> {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Slot::Bool(_) => "bool",
            Slot::Int(_) => "int",
            Slot::UInt(_) => "uint",
            Slot::Float(_) => "float",
            Slot::String(_) => "string",
            Slot::Binary(_) => "binary",
            Slot::Object(_) => "object",
            Slot::Array(_) => "array",
            Slot::Polymorph(_) => "polymorph",
            Slot::PolymorphBody { .. } => "polymorph body",
        }
    }

    pub(crate) fn deliver_bool(&mut self, value: bool) -> Option<ReadResult> {
        match self {
            Slot::Bool(handler) => Some(handler(value)),
            _ => None,
        }
    }

    pub(crate) fn deliver_number(&mut self, text: &str) -> Option<ReadResult> {
        Some(match self {
            Slot::Int(handler) => parse_int(text).and_then(|value| handler(value)),
            Slot::UInt(handler) => parse_uint(text).and_then(|value| handler(value)),
            Slot::Float(handler) => parse_float(text).and_then(|value| handler(value)),
            _ => return None,
        })
    }

    pub(crate) fn deliver_tagged(&mut self, tagged: Tagged) -> Option<ReadResult> {
        match (self, tagged) {
            (Slot::String(handler), Tagged::Text(text)) => Some(handler(text)),
            (Slot::Binary(handler), Tagged::Binary(bytes)) => Some(handler(bytes)),
            // An empty tag counts as no tag at all.
            (Slot::PolymorphBody { tag, .. }, Tagged::Text(text)) => Some(if tag.is_some() {
                Err(SchemaError::PolymorphMultipleTypes)
            } else {
                *tag = (!text.is_empty()).then_some(text);
                Ok(())
            }),
            _ => None,
        }
    }

    pub(crate) fn deliver_object(&mut self, object: &mut ReadObject<'h>) -> Option<ReadResult> {
        match self {
            Slot::Object(handler) => Some(handler(object)),
            Slot::PolymorphBody {
                tag,
                delivered,
                handler,
            } => Some(match tag.take() {
                None => Err(SchemaError::PolymorphWithoutType),
                Some(tag) => {
                    *delivered = true;
                    (*handler.borrow_mut())(tag, object)
                }
            }),
            _ => None,
        }
    }

    pub(crate) fn deliver_array(&mut self, array: &mut ReadArray<'h>) -> Option<ReadResult> {
        match self {
            Slot::Array(handler) => Some(handler(array)),
            Slot::Polymorph(handler) => {
                array.set(Slot::PolymorphBody {
                    tag: None,
                    delivered: false,
                    handler: Rc::clone(handler),
                });
                Some(Ok(()))
            }
            _ => None,
        }
    }

    /// Checks a carrier array at its closing bracket.
    pub(crate) fn check_complete(&self) -> ReadResult {
        match self {
            Slot::PolymorphBody { tag, delivered, .. } if !*delivered || tag.is_some() => {
                Err(SchemaError::PolymorphWithoutObject)
            }
            _ => Ok(()),
        }
    }
}

fn invalid(kind: NumberKind, text: &str) -> SchemaError {
    SchemaError::InvalidNumber {
        kind,
        text: text.into(),
    }
}

fn has_fraction_or_exponent(text: &str) -> bool {
    text.bytes().any(|b| matches!(b, b'.' | b'e' | b'E'))
}

/// Number text in fraction or exponent form that names an exact integer.
fn integral_float(text: &str) -> Option<f64> {
    if !has_fraction_or_exponent(text) {
        return None;
    }
    let value: f64 = text.parse().ok()?;
    (value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER).then_some(value)
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn parse_int(text: &str) -> Result<i64, SchemaError> {
    text.parse()
        .ok()
        .or_else(|| integral_float(text).map(|value| value as i64))
        .ok_or_else(|| invalid(NumberKind::Int, text))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn parse_uint(text: &str) -> Result<u64, SchemaError> {
    if text == "-0" {
        return Ok(0);
    }
    text.parse()
        .ok()
        .or_else(|| {
            integral_float(text)
                .filter(|value| *value >= 0.0)
                .map(|value| value as u64)
        })
        .ok_or_else(|| invalid(NumberKind::UInt, text))
}

pub(crate) fn parse_float(text: &str) -> Result<f64, SchemaError> {
    text.parse().map_err(|_| invalid(NumberKind::Float, text))
}
