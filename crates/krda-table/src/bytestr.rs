//! Case-insensitive byte-string views.
//!
//! A [`ByteStr`] borrows the payload of a length-prefixed string slot
//! directly from the shared buffer; nothing is copied. Comparisons fold
//! ASCII letters only ('A'..'Z' to 'a'..'z'); bytes >= 0x80 compare
//! verbatim. Views must not be retained across a row-cursor move.

use std::sync::atomic::{AtomicU8, Ordering};

#[inline]
fn fold(b: u8) -> u8 {
    b.to_ascii_lowercase()
}

#[derive(Clone, Copy)]
pub struct ByteStr<'a> {
    bytes: &'a [AtomicU8],
}

impl<'a> ByteStr<'a> {
    pub fn new(bytes: &'a [AtomicU8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn byte(&self, i: usize) -> u8 {
        self.bytes[i].load(Ordering::Relaxed)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        (0..self.len()).map(|i| self.byte(i)).collect()
    }

    /// Byte-wise case-insensitive equality against a plain byte slice.
    pub fn eq_fold(&self, other: &[u8]) -> bool {
        self.len() == other.len()
            && (0..self.len()).all(|i| fold(self.byte(i)) == fold(other[i]))
    }

    /// Naive case-insensitive substring search. The empty needle matches.
    pub fn contains_fold(&self, needle: &[u8]) -> bool {
        if needle.len() > self.len() {
            return false;
        }
        (0..=self.len() - needle.len()).any(|start| {
            (0..needle.len()).all(|i| fold(self.byte(start + i)) == fold(needle[i]))
        })
    }
}

impl std::fmt::Debug for ByteStr<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteStr({:?})", String::from_utf8_lossy(&self.to_vec()))
    }
}
