use std::borrow::Cow;
use std::io::{self, Write};

use super::byte::ByteReplacer;
use super::generic::GenericReplacer;

/// Errors from building a [`Replacer`] out of a flat argument list.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReplaceError {
    #[error("odd argument count: {0} (expected OLD NEW pairs)")]
    OddArgumentCount(usize),
}

/// A sink write failed partway through.
///
/// `written` counts bytes the sink accepted before the failure; they are not
/// retracted. `source` is the sink's own error, untouched.
#[derive(Debug, thiserror::Error)]
#[error("write failed after {written} bytes: {source}")]
pub struct WriteError {
    pub written: usize,
    #[source]
    pub source: io::Error,
}

impl From<WriteError> for io::Error {
    fn from(e: WriteError) -> Self {
        e.source
    }
}

/// Write all of `buf`, adding each accepted byte to `written` as it goes,
/// so the count stays exact when a later write fails.
pub(crate) fn write_counted<W: Write + ?Sized>(
    w: &mut W,
    mut buf: &[u8],
    written: &mut usize,
) -> io::Result<()> {
    while !buf.is_empty() {
        match w.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "failed to write whole buffer",
                ));
            }
            Ok(n) => {
                *written += n;
                buf = &buf[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Replaces a list of byte strings with replacements, all in one pass.
///
/// Patterns are tried in declaration order at each position: when several
/// match at the same place, the one listed first wins regardless of length.
/// Matches never overlap and replacement text is never rescanned.
///
/// A `Replacer` is immutable after construction and can be shared freely
/// across threads.
#[derive(Clone, Debug)]
pub enum Replacer {
    /// Every pattern and replacement is a single byte.
    Byte(ByteReplacer),
    Generic(GenericReplacer),
}

impl Replacer {
    /// Build from a flat `[old0, new0, old1, new1, ...]` list.
    ///
    /// # Panics
    ///
    /// Panics if the list has an odd number of elements. Use
    /// [`Replacer::try_new`] when the list comes from untrusted input.
    pub fn new<S: AsRef<[u8]>>(oldnew: &[S]) -> Self {
        match Self::try_new(oldnew) {
            Ok(r) => r,
            Err(e) => panic!("Replacer::new: {e}"),
        }
    }

    pub fn try_new<S: AsRef<[u8]>>(oldnew: &[S]) -> Result<Self, ReplaceError> {
        if oldnew.len() % 2 == 1 {
            return Err(ReplaceError::OddArgumentCount(oldnew.len()));
        }
        Ok(Self::from_pairs(
            oldnew.chunks_exact(2).map(|p| (p[0].as_ref(), p[1].as_ref())),
        ))
    }

    /// Build from `(old, new)` pairs in priority order.
    pub fn from_pairs<I, O, N>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (O, N)>,
        O: AsRef<[u8]>,
        N: AsRef<[u8]>,
    {
        let owned: Vec<(O, N)> = pairs.into_iter().collect();
        let pairs: Vec<(&[u8], &[u8])> = owned
            .iter()
            .map(|(o, n)| (o.as_ref(), n.as_ref()))
            .collect();

        if pairs.iter().all(|(o, n)| o.len() == 1 && n.len() == 1) {
            Replacer::Byte(ByteReplacer::new(&pairs))
        } else {
            Replacer::Generic(GenericReplacer::new(&pairs))
        }
    }

    /// Whether the single-byte table was selected.
    pub fn is_byte_table(&self) -> bool {
        matches!(self, Replacer::Byte(_))
    }

    /// Whether any pattern occurs in `s`.
    pub fn has_match(&self, s: &[u8]) -> bool {
        match self {
            Replacer::Byte(r) => r.has_match(s),
            Replacer::Generic(r) => r.has_match(s),
        }
    }

    /// Apply all replacements to `buf`. The storage is reused when possible:
    /// single-byte tables translate in place, and a buffer with no matches is
    /// returned as is.
    pub fn replace(&self, buf: Vec<u8>) -> Vec<u8> {
        match self {
            Replacer::Byte(r) => r.replace(buf),
            Replacer::Generic(r) => r.replace(buf),
        }
    }

    /// Like [`Replacer::replace`] but borrows `s` when nothing changes.
    pub fn replace_bytes<'a>(&self, s: &'a [u8]) -> Cow<'a, [u8]> {
        match self {
            Replacer::Byte(r) => r.replace_bytes(s),
            Replacer::Generic(r) => r.replace_bytes(s),
        }
    }

    /// Write `s` with all replacements applied to `w` and return the number
    /// of bytes written. Output is written as it is produced; on a sink error
    /// the scan stops and the error reports how much was already written.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W, s: &[u8]) -> Result<usize, WriteError> {
        match self {
            Replacer::Byte(r) => r.write_to(w, s),
            Replacer::Generic(r) => r.write_to(w, s),
        }
    }
}
