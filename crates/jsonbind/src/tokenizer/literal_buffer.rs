//! Byte-at-a-time matching of `null`, `true` and `false`.

use super::Token;

pub(super) enum Step {
    NeedMore,
    Done(Token<'static>),
    Reject,
}

/// The unmatched tail of the literal being read and the token it produces.
#[derive(Debug, Clone, Copy)]
pub(super) struct PendingLiteral {
    rest: &'static [u8],
    token: Token<'static>,
}

impl PendingLiteral {
    /// Starts after the first byte, which the caller has already matched.
    pub(super) fn after(first: u8) -> Option<Self> {
        let (rest, token): (&'static [u8], _) = match first {
            b'n' => (b"ull", Token::Null),
            b't' => (b"rue", Token::Bool(true)),
            b'f' => (b"alse", Token::Bool(false)),
            _ => return None,
        };
        Some(Self { rest, token })
    }

    pub(super) fn step(&mut self, byte: u8) -> Step {
        match self.rest.split_first() {
            Some((&expected, [])) if expected == byte => Step::Done(self.token),
            Some((&expected, rest)) if expected == byte => {
                self.rest = rest;
                Step::NeedMore
            }
            _ => Step::Reject,
        }
    }
}
