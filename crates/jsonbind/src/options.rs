use alloc::string::{String, ToString};

/// Configuration for [`Read`](crate::Read).
///
/// # Examples
///
/// ```rust
/// use jsonbind::{Read, ReadOptions};
///
/// let read = Read::with_options(ReadOptions {
///     allow_multiple_json_values: true,
///     ..Default::default()
/// });
/// ```
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Whether to accept several whitespace-separated JSON values in one
    /// input.
    ///
    /// Each value is delivered to the top-level handler in turn, as if the
    /// input were the elements of one array.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_multiple_json_values: bool,

    /// Deepest container nesting accepted before the input is rejected as a
    /// syntax error.
    ///
    /// # Default
    ///
    /// `None` (unlimited)
    pub max_depth: Option<usize>,
}

/// Configuration for [`Write`](crate::Write).
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Pretty-print output: one entry per line, `": "` after keys and a
    /// newline after every top-level value.
    ///
    /// # Default
    ///
    /// `true`
    pub beautify: bool,

    /// Indentation unit used when `beautify` is set.
    ///
    /// # Default
    ///
    /// Four spaces.
    pub indent: String,
}

impl WriteOptions {
    /// Output with no insignificant whitespace. Consecutive top-level values
    /// in one buffer are separated by a newline.
    #[must_use]
    pub fn compact() -> Self {
        Self {
            beautify: false,
            ..Self::default()
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            beautify: true,
            indent: "    ".to_string(),
        }
    }
}
