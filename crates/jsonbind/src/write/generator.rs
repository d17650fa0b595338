//! Streaming JSON text generator.
//!
//! Accepts primitive writes (keys, scalars, container opens and closes) and
//! appends their text to an internal buffer. Misuse, such as a value in an
//! object without a key or a mismatched close, is a programming error and
//! panics.

use alloc::{string::String, vec::Vec};

use crate::options::WriteOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Array,
    Object,
}

#[derive(Debug)]
struct Frame {
    container: Container,
    entries: usize,
}

#[derive(Debug)]
pub(crate) struct Generator {
    options: WriteOptions,
    out: String,
    frames: Vec<Frame>,
    key_written: bool,
    documents: usize,
}

impl Generator {
    pub(crate) fn new(options: WriteOptions) -> Self {
        Self {
            options,
            out: String::new(),
            frames: Vec::new(),
            key_written: false,
            documents: 0,
        }
    }

    /// Number of open containers.
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Hands out the text written so far and starts a fresh buffer.
    pub(crate) fn take(&mut self) -> String {
        assert!(self.frames.is_empty(), "dump with {} open containers", self.frames.len());
        self.documents = 0;
        core::mem::take(&mut self.out)
    }

    pub(crate) fn key(&mut self, key: &str) {
        let beautify = self.options.beautify;
        let Some(frame) = self.frames.last_mut() else {
            panic!("key '{key}' written outside of an object");
        };
        assert!(
            frame.container == Container::Object,
            "key '{key}' written inside an array"
        );
        assert!(!self.key_written, "key '{key}' written where a value was expected");
        if frame.entries > 0 {
            self.out.push(',');
        }
        frame.entries += 1;
        if beautify {
            self.newline();
        }
        self.push_string(key);
        self.out.push(':');
        if beautify {
            self.out.push(' ');
        }
        self.key_written = true;
    }

    pub(crate) fn bool(&mut self, value: bool) {
        self.begin_value();
        self.out.push_str(if value { "true" } else { "false" });
        self.end_value();
    }

    pub(crate) fn int(&mut self, value: i64) {
        self.begin_value();
        self.out.push_str(itoa::Buffer::new().format(value));
        self.end_value();
    }

    pub(crate) fn uint(&mut self, value: u64) {
        self.begin_value();
        self.out.push_str(itoa::Buffer::new().format(value));
        self.end_value();
    }

    /// # Panics
    ///
    /// JSON has no representation for NaN or the infinities.
    pub(crate) fn float(&mut self, value: f64) {
        assert!(value.is_finite(), "cannot write non-finite float {value}");
        self.begin_value();
        self.out.push_str(ryu::Buffer::new().format_finite(value));
        self.end_value();
    }

    pub(crate) fn string(&mut self, value: &str) {
        self.begin_value();
        self.push_string(value);
        self.end_value();
    }

    pub(crate) fn open(&mut self, container: Container) {
        self.begin_value();
        self.out.push(match container {
            Container::Array => '[',
            Container::Object => '{',
        });
        self.frames.push(Frame {
            container,
            entries: 0,
        });
    }

    pub(crate) fn close(&mut self, container: Container) {
        let Some(frame) = self.frames.pop() else {
            panic!("close of {container:?} with no open container");
        };
        assert_eq!(frame.container, container, "containers closed out of order");
        assert!(!self.key_written, "object closed after a key with no value");
        if frame.entries > 0 && self.options.beautify {
            self.newline();
        }
        self.out.push(match container {
            Container::Array => ']',
            Container::Object => '}',
        });
        self.end_value();
    }

    fn begin_value(&mut self) {
        match self.frames.last_mut() {
            None => {
                if self.documents > 0 && !self.options.beautify {
                    self.out.push('\n');
                }
            }
            Some(frame) => match frame.container {
                Container::Object => {
                    assert!(self.key_written, "object value written without a key");
                    self.key_written = false;
                }
                Container::Array => {
                    if frame.entries > 0 {
                        self.out.push(',');
                    }
                    frame.entries += 1;
                    if self.options.beautify {
                        self.newline();
                    }
                }
            },
        }
    }

    fn end_value(&mut self) {
        if self.frames.is_empty() {
            self.documents += 1;
            if self.options.beautify {
                self.out.push('\n');
            }
            log::trace!("document {} complete, {} bytes buffered", self.documents, self.out.len());
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.frames.len() {
            self.out.push_str(&self.options.indent);
        }
    }

    fn push_string(&mut self, value: &str) {
        self.out.push('"');
        for c in value.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                // Line separators break pre-2019 JSON parsers embedded in JavaScript.
                '\u{2028}' | '\u{2029}' => self.push_unicode_escape(c),
                c if c.is_ascii_control() => self.push_unicode_escape(c),
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    /// `\uXXXX` with upper-case hex; only called for characters in the BMP.
    fn push_unicode_escape(&mut self, c: char) {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        let code = u32::from(c);
        self.out.push_str("\\u");
        for shift in [12, 8, 4, 0] {
            self.out.push(char::from(HEX[((code >> shift) & 0xF) as usize]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact() -> Generator {
        Generator::new(WriteOptions::compact())
    }

    #[test]
    fn compact_nesting() {
        let mut g = compact();
        g.open(Container::Object);
        g.key("a");
        g.open(Container::Array);
        g.int(-1);
        g.uint(u64::MAX);
        g.float(0.5);
        g.bool(false);
        g.close(Container::Array);
        g.key("b");
        g.open(Container::Object);
        g.close(Container::Object);
        g.close(Container::Object);
        assert_eq!(g.take(), r#"{"a":[-1,18446744073709551615,0.5,false],"b":{}}"#);
    }

    #[test]
    fn pretty_nesting() {
        let mut g = Generator::new(WriteOptions::default());
        g.open(Container::Object);
        g.key("a");
        g.open(Container::Array);
        g.int(1);
        g.open(Container::Array);
        g.close(Container::Array);
        g.close(Container::Array);
        g.key("b");
        g.string("x");
        g.close(Container::Object);
        assert_eq!(
            g.take(),
            "{\n    \"a\": [\n        1,\n        []\n    ],\n    \"b\": \"x\"\n}\n"
        );
    }

    #[test]
    fn escapes() {
        let mut g = compact();
        g.string("q\"b\\n\nt\tc\u{1}\u{7f}l\u{2028}é");
        assert_eq!(g.take(), r#""q\"b\\n\nt\tc\u0001\u007Fl\u2028é""#);
    }

    #[test]
    fn unicode_escapes_use_four_hex_digits() {
        let mut g = compact();
        g.string("\u{0}\u{1f}\u{2029}");
        assert_eq!(g.take(), r#""\u0000\u001F\u2029""#);
    }

    #[test]
    fn documents_are_separated() {
        let mut g = compact();
        g.int(1);
        g.bool(true);
        assert_eq!(g.take(), "1\ntrue");
        g.int(2);
        assert_eq!(g.take(), "2");

        let mut g = Generator::new(WriteOptions::default());
        g.int(1);
        g.int(2);
        assert_eq!(g.take(), "1\n2\n");
    }

    #[test]
    fn floats_use_shortest_representation() {
        let mut g = compact();
        g.open(Container::Array);
        g.float(1.0);
        g.float(-0.1);
        g.float(1e21);
        g.close(Container::Array);
        assert_eq!(g.take(), "[1.0,-0.1,1e21]");
    }

    #[test]
    #[should_panic(expected = "non-finite")]
    fn nan_panics() {
        compact().float(f64::NAN);
    }

    #[test]
    #[should_panic(expected = "object value written without a key")]
    fn keyless_value_panics() {
        let mut g = compact();
        g.open(Container::Object);
        g.int(1);
    }

    #[test]
    #[should_panic(expected = "containers closed out of order")]
    fn mismatched_close_panics() {
        let mut g = compact();
        g.open(Container::Array);
        g.close(Container::Object);
    }

    #[test]
    #[should_panic(expected = "dump with 1 open containers")]
    fn take_with_open_container_panics() {
        let mut g = compact();
        g.open(Container::Array);
        g.take();
    }
}
