//! Decoding of `\uXXXX` escapes, including UTF-16 surrogate pairs.
//!
//! Hex digits are accumulated into a code unit as they arrive. A high
//! surrogate is held until the following escape supplies its low half; any
//! other continuation is an error.

/// What the tokenizer should do after a hex digit was fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Escape {
    /// Fewer than four digits so far.
    NeedMore,
    /// A high surrogate was decoded; the next thing in the string must be a
    /// `\u` escape carrying the low surrogate.
    AwaitLowSurrogate,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EscapeError {
    NotHex,
    UnpairedSurrogate,
}

impl EscapeError {
    pub(crate) fn message(self) -> &'static str {
        match self {
            EscapeError::NotHex => "invalid unicode escape sequence",
            EscapeError::UnpairedSurrogate => "unpaired surrogate in unicode escape sequence",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct UnicodeEscapeBuffer {
    acc: u32,
    len: u8,
    high: Option<u32>,
}

impl UnicodeEscapeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new `\u` escape, keeping any pending high surrogate.
    pub fn begin(&mut self) {
        self.acc = 0;
        self.len = 0;
    }

    /// Forgets everything, including a pending high surrogate.
    pub fn reset(&mut self) {
        self.begin();
        self.high = None;
    }

    pub fn awaiting_low_surrogate(&self) -> bool {
        self.high.is_some()
    }

    pub fn feed(&mut self, byte: u8) -> Result<Escape, EscapeError> {
        let digit = char::from(byte).to_digit(16).ok_or(EscapeError::NotHex)?;
        self.acc = (self.acc << 4) | digit;
        self.len += 1;
        if self.len < 4 {
            return Ok(Escape::NeedMore);
        }

        let unit = self.acc;
        self.begin();
        match (self.high.take(), unit) {
            (Some(high), 0xDC00..=0xDFFF) => {
                let code = 0x1_0000 + ((high - 0xD800) << 10) + (unit - 0xDC00);
                char::from_u32(code)
                    .map(Escape::Char)
                    .ok_or(EscapeError::UnpairedSurrogate)
            }
            (Some(_), _) | (None, 0xDC00..=0xDFFF) => Err(EscapeError::UnpairedSurrogate),
            (None, 0xD800..=0xDBFF) => {
                self.high = Some(unit);
                Ok(Escape::AwaitLowSurrogate)
            }
            (None, _) => char::from_u32(unit)
                .map(Escape::Char)
                .ok_or(EscapeError::UnpairedSurrogate),
        }
    }
}
