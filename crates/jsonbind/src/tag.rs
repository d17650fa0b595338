//! Tagged wire strings.
//!
//! Every string on the wire says what it decodes to. Text is written as
//! `utf8:<text>`; binary is written as `alpha16:<symbols>`, two symbols per
//! byte, high nibble first, each nibble mapped onto `'a'..='p'`.
//!
//! ```
//! use jsonbind::{Tagged, decode_tagged, encode_binary, encode_text};
//!
//! assert_eq!(encode_text("hi"), "utf8:hi");
//! assert_eq!(encode_binary(&[0x1f]), "alpha16:bp");
//! assert_eq!(decode_tagged("alpha16:bp"), Ok(Tagged::Binary(vec![0x1f])));
//! ```
use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use crate::error::TagError;

/// Prefix of tagged UTF-8 text.
pub const TEXT_PREFIX: &str = "utf8:";
/// Prefix of tagged binary data.
pub const BINARY_PREFIX: &str = "alpha16:";

const ALPHABET_START: u8 = b'a';

/// A decoded wire string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tagged {
    Text(String),
    Binary(Vec<u8>),
}

/// Tags `text` for the wire.
#[must_use]
pub fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(TEXT_PREFIX.len() + text.len());
    out.push_str(TEXT_PREFIX);
    out.push_str(text);
    out
}

/// Tags `bytes` for the wire.
#[must_use]
pub fn encode_binary(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(BINARY_PREFIX.len() + bytes.len() * 2);
    out.push_str(BINARY_PREFIX);
    for byte in bytes {
        out.push(char::from(ALPHABET_START + (byte >> 4)));
        out.push(char::from(ALPHABET_START + (byte & 0x0f)));
    }
    out
}

/// Strips the tag from a wire string and decodes the payload.
///
/// # Errors
///
/// Fails when the prefix is neither [`TEXT_PREFIX`] nor [`BINARY_PREFIX`], or
/// when a binary payload has odd length or a symbol outside `'a'..='p'`.
pub fn decode_tagged(wire: &str) -> Result<Tagged, TagError> {
    if let Some(text) = wire.strip_prefix(TEXT_PREFIX) {
        return Ok(Tagged::Text(text.to_string()));
    }
    if let Some(payload) = wire.strip_prefix(BINARY_PREFIX) {
        return decode_binary(payload, wire).map(Tagged::Binary);
    }
    Err(TagError::UnknownPrefix(wire.to_string()))
}

fn decode_binary(payload: &str, wire: &str) -> Result<Vec<u8>, TagError> {
    let symbols = payload.as_bytes();
    if symbols.len() % 2 != 0 {
        return Err(TagError::OddLength {
            len: symbols.len(),
            text: wire.to_string(),
        });
    }

    let mut out = Vec::with_capacity(symbols.len() / 2);
    for (index, pair) in symbols.chunks_exact(2).enumerate() {
        let high = nibble(pair[0]).ok_or_else(|| invalid_symbol(symbols, index * 2, wire))?;
        let low = nibble(pair[1]).ok_or_else(|| invalid_symbol(symbols, index * 2 + 1, wire))?;
        out.push((high << 4) | low);
    }
    Ok(out)
}

fn nibble(symbol: u8) -> Option<u8> {
    match symbol {
        b'a'..=b'p' => Some(symbol - ALPHABET_START),
        _ => None,
    }
}

fn invalid_symbol(symbols: &[u8], at: usize, wire: &str) -> TagError {
    // `at` may point into the middle of a multi-byte character.
    let (symbol, _) = bstr::decode_utf8(&symbols[at..]);
    TagError::InvalidSymbol {
        symbol: symbol.unwrap_or(char::REPLACEMENT_CHARACTER),
        text: wire.to_string(),
    }
}
