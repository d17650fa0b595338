//! Scoped writing.
//!
//! Each scope opens its container when created and closes it when dropped.
//! All scopes of one [`Write`] share its generator, and must be used in stack
//! order: a scope cannot be written to while a scope it opened is still
//! alive.
//!
//! ```
//! use jsonbind::{Write, WriteOptions};
//!
//! let mut write = Write::with_options(WriteOptions::compact());
//! {
//!     let mut root = write.object();
//!     root.string("name", "box");
//!     let mut shape = root.polymorph("shape", "circle");
//!     shape.float("r", 1.5);
//! }
//! assert_eq!(
//!     write.dump(),
//!     r#"{"name":"utf8:box","shape":["utf8:circle",{"r":1.5}]}"#
//! );
//! ```

mod generator;

use alloc::{rc::Rc, string::String};
use core::{
    cell::{RefCell, RefMut},
    fmt,
    ops::{Deref, DerefMut},
};

use generator::{Container, Generator};

use crate::{
    options::WriteOptions,
    tag::{encode_binary, encode_text},
};

type Shared = Rc<RefCell<Generator>>;

/// Owns the output buffer. Start a document with [`object`](Self::object) or
/// [`array`](Self::array) and collect the text with [`dump`](Self::dump).
pub struct Write {
    generator: Shared,
}

impl Write {
    /// A writer producing indented output.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(WriteOptions::default())
    }

    #[must_use]
    pub fn with_options(options: WriteOptions) -> Self {
        Self {
            generator: Rc::new(RefCell::new(Generator::new(options))),
        }
    }

    /// Starts a top-level object.
    pub fn object(&mut self) -> WriteObject {
        WriteObject::open(&self.generator)
    }

    /// Starts a top-level array.
    pub fn array(&mut self) -> WriteArray {
        WriteArray::open(&self.generator)
    }

    /// Returns everything written since the last dump and clears the buffer,
    /// so the writer can go on to the next document.
    ///
    /// # Panics
    ///
    /// Panics if a scope is still open.
    pub fn dump(&mut self) -> String {
        self.generator.borrow_mut().take()
    }

    /// Drains the buffer into `sink`.
    ///
    /// # Errors
    ///
    /// Propagates write errors from `sink`.
    #[cfg(feature = "std")]
    pub fn dump_into<W: std::io::Write>(&mut self, mut sink: W) -> std::io::Result<()> {
        sink.write_all(self.dump().as_bytes())?;
        sink.flush()
    }

    /// Drains the buffer into the file at `path`, replacing its contents.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created or written.
    #[cfg(feature = "std")]
    pub fn dump_to_path(&mut self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.dump_into(std::io::BufWriter::new(file))
    }
}

impl Default for Write {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Write {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Write")
            .field("depth", &self.generator.borrow().depth())
            .finish_non_exhaustive()
    }
}

/// The generator, after checking that `depth` is the innermost open scope.
fn generator_at(generator: &Shared, depth: usize) -> RefMut<'_, Generator> {
    let generator = generator.borrow_mut();
    assert_eq!(
        generator.depth(),
        depth,
        "write scope used while a nested scope is still open"
    );
    generator
}

/// Closes the scope's container unless the thread is already unwinding from a
/// panic, in which case the output is abandoned.
fn close(generator: &Shared, depth: usize, container: Container) {
    #[cfg(feature = "std")]
    if std::thread::panicking() {
        return;
    }
    generator_at(generator, depth).close(container);
}

/// An open JSON array.
pub struct WriteArray {
    generator: Shared,
    depth: usize,
}

impl WriteArray {
    fn open(generator: &Shared) -> Self {
        let mut gen_ref = generator.borrow_mut();
        gen_ref.open(Container::Array);
        let depth = gen_ref.depth();
        drop(gen_ref);
        Self {
            generator: Rc::clone(generator),
            depth,
        }
    }

    fn generator(&self) -> RefMut<'_, Generator> {
        generator_at(&self.generator, self.depth)
    }

    pub fn bool(&mut self, value: bool) {
        self.generator().bool(value);
    }

    pub fn int(&mut self, value: i64) {
        self.generator().int(value);
    }

    pub fn uint(&mut self, value: u64) {
        self.generator().uint(value);
    }

    /// # Panics
    ///
    /// Panics if `value` is NaN or infinite.
    pub fn float(&mut self, value: f64) {
        self.generator().float(value);
    }

    /// Appends `value` as a `utf8:` string.
    pub fn string(&mut self, value: &str) {
        self.generator().string(&encode_text(value));
    }

    /// Appends `value` as an `alpha16:` string.
    pub fn binary(&mut self, value: &[u8]) {
        self.generator().string(&encode_binary(value));
    }

    pub fn object(&mut self) -> WriteObject {
        drop(self.generator());
        WriteObject::open(&self.generator)
    }

    pub fn array(&mut self) -> WriteArray {
        drop(self.generator());
        WriteArray::open(&self.generator)
    }

    /// Appends a polymorphic value, `["utf8:<tag>", {...}]`, and returns its
    /// object.
    pub fn polymorph(&mut self, tag: &str) -> WritePolymorph {
        drop(self.generator());
        WritePolymorph::open(&self.generator, tag)
    }
}

impl Drop for WriteArray {
    fn drop(&mut self) {
        close(&self.generator, self.depth, Container::Array);
    }
}

impl fmt::Debug for WriteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteArray").field("depth", &self.depth).finish()
    }
}

/// An open JSON object. Every value is written under the key passed with it.
pub struct WriteObject {
    generator: Shared,
    depth: usize,
}

impl WriteObject {
    fn open(generator: &Shared) -> Self {
        let mut gen_ref = generator.borrow_mut();
        gen_ref.open(Container::Object);
        let depth = gen_ref.depth();
        drop(gen_ref);
        Self {
            generator: Rc::clone(generator),
            depth,
        }
    }

    fn keyed(&mut self, key: &str) -> RefMut<'_, Generator> {
        let mut generator = generator_at(&self.generator, self.depth);
        generator.key(key);
        generator
    }

    pub fn bool(&mut self, key: &str, value: bool) {
        self.keyed(key).bool(value);
    }

    pub fn int(&mut self, key: &str, value: i64) {
        self.keyed(key).int(value);
    }

    pub fn uint(&mut self, key: &str, value: u64) {
        self.keyed(key).uint(value);
    }

    /// # Panics
    ///
    /// Panics if `value` is NaN or infinite.
    pub fn float(&mut self, key: &str, value: f64) {
        self.keyed(key).float(value);
    }

    pub fn string(&mut self, key: &str, value: &str) {
        self.keyed(key).string(&encode_text(value));
    }

    pub fn binary(&mut self, key: &str, value: &[u8]) {
        self.keyed(key).string(&encode_binary(value));
    }

    pub fn object(&mut self, key: &str) -> WriteObject {
        drop(self.keyed(key));
        WriteObject::open(&self.generator)
    }

    pub fn array(&mut self, key: &str) -> WriteArray {
        drop(self.keyed(key));
        WriteArray::open(&self.generator)
    }

    pub fn polymorph(&mut self, key: &str, tag: &str) -> WritePolymorph {
        drop(self.keyed(key));
        WritePolymorph::open(&self.generator, tag)
    }
}

impl Drop for WriteObject {
    fn drop(&mut self) {
        close(&self.generator, self.depth, Container::Object);
    }
}

impl fmt::Debug for WriteObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteObject").field("depth", &self.depth).finish()
    }
}

/// The object of a polymorphic value.
///
/// Behaves as a [`WriteObject`]; dropping it closes both the object and the
/// enclosing `[tag, {...}]` array.
#[derive(Debug)]
pub struct WritePolymorph {
    // Field order is drop order: the object closes before its carrier.
    object: WriteObject,
    _carrier: WriteArray,
}

impl WritePolymorph {
    fn open(generator: &Shared, tag: &str) -> Self {
        let mut carrier = WriteArray::open(generator);
        carrier.string(tag);
        let object = carrier.object();
        Self {
            object,
            _carrier: carrier,
        }
    }
}

impl Deref for WritePolymorph {
    type Target = WriteObject;

    fn deref(&self) -> &WriteObject {
        &self.object
    }
}

impl DerefMut for WritePolymorph {
    fn deref_mut(&mut self) -> &mut WriteObject {
        &mut self.object
    }
}
