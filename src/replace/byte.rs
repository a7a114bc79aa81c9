use std::borrow::Cow;
use std::io::Write;

use super::core::{WriteError, write_counted};

/// Translation chunk for streaming to a sink: 32KB keeps the scratch buffer
/// in L1/L2 while amortizing write() calls.
const CHUNK: usize = 32 * 1024;

/// Build a 256-bit (32-byte) membership set for O(1) byte lookup.
#[inline]
fn build_member_set(bytes: impl Iterator<Item = u8>) -> [u8; 32] {
    let mut set = [0u8; 32];
    for b in bytes {
        set[b as usize >> 3] |= 1 << (b & 7);
    }
    set
}

#[inline(always)]
fn is_member(set: &[u8; 32], b: u8) -> bool {
    set[b as usize >> 3] & (1 << (b & 7)) != 0
}

/// Replacer for tables where every pattern and every replacement is one byte.
///
/// Output length always equals input length, so replacement is a plain
/// 256-entry table lookup with no positional state.
#[derive(Clone, Debug)]
pub struct ByteReplacer {
    table: [u8; 256],
    /// Bytes that were declared as a pattern, including identity pairs.
    olds: [u8; 32],
}

impl ByteReplacer {
    /// Every pair must be one byte to one byte.
    pub(crate) fn new(pairs: &[(&[u8], &[u8])]) -> Self {
        let mut table: [u8; 256] = std::array::from_fn(|i| i as u8);
        // Reverse order so the first declaration of a byte wins.
        for &(old, new) in pairs.iter().rev() {
            table[old[0] as usize] = new[0];
        }
        let olds = build_member_set(pairs.iter().map(|&(old, _)| old[0]));
        Self { table, olds }
    }

    /// Indexing a `[u8; 256]` with a `u8` never needs a bounds check.
    #[inline(always)]
    fn translate_inplace(&self, data: &mut [u8]) {
        for b in data.iter_mut() {
            *b = self.table[*b as usize];
        }
    }

    #[inline(always)]
    fn translate_to(&self, src: &[u8], dst: &mut [u8]) {
        debug_assert!(dst.len() >= src.len());
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = self.table[s as usize];
        }
    }

    /// Position of the first byte the table would change.
    #[inline]
    fn first_change(&self, s: &[u8]) -> Option<usize> {
        s.iter().position(|&b| self.table[b as usize] != b)
    }

    pub fn has_match(&self, s: &[u8]) -> bool {
        s.iter().any(|&b| is_member(&self.olds, b))
    }

    /// Translates the buffer in place and returns it.
    pub fn replace(&self, mut buf: Vec<u8>) -> Vec<u8> {
        if let Some(start) = self.first_change(&buf) {
            self.translate_inplace(&mut buf[start..]);
        }
        buf
    }

    pub fn replace_bytes<'a>(&self, s: &'a [u8]) -> Cow<'a, [u8]> {
        let Some(start) = self.first_change(s) else {
            return Cow::Borrowed(s);
        };
        let mut out = vec![0u8; s.len()];
        out[..start].copy_from_slice(&s[..start]);
        self.translate_to(&s[start..], &mut out[start..]);
        Cow::Owned(out)
    }

    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W, s: &[u8]) -> Result<usize, WriteError> {
        let mut buf = vec![0u8; CHUNK.min(s.len())];
        let mut written = 0;
        for chunk in s.chunks(CHUNK) {
            let out = &mut buf[..chunk.len()];
            self.translate_to(chunk, out);
            if let Err(source) = write_counted(&mut *w, out, &mut written) {
                return Err(WriteError { written, source });
            }
        }
        Ok(written)
    }
}
