use std::borrow::Cow;
use std::convert::Infallible;
use std::io::Write;

use super::core::{WriteError, write_counted};
use super::trie::Trie;

/// How the scanner jumps to the next position where a match can begin.
#[derive(Clone, Debug)]
enum Skip {
    /// The empty pattern matches everywhere; every position needs a lookup.
    Off,
    /// No pattern can ever match.
    Never,
    One(u8),
    Two(u8, u8),
    Three(u8, u8, u8),
    /// Too many start bytes for memchr; test each byte against the trie root.
    Table,
}

/// Multi-pattern replacer backed by a prefix trie.
///
/// Scans left to right. At each position the highest-priority pattern that
/// matches there is replaced and the scan resumes after it; replacement text
/// is never rescanned.
#[derive(Clone, Debug)]
pub struct GenericReplacer {
    trie: Trie,
    skip: Skip,
}

impl GenericReplacer {
    pub(crate) fn new(pairs: &[(&[u8], &[u8])]) -> Self {
        let trie = Trie::build(pairs);
        let skip = if trie.root_is_endpoint() {
            Skip::Off
        } else {
            match trie.start_bytes()[..] {
                [] => Skip::Never,
                [a] => Skip::One(a),
                [a, b] => Skip::Two(a, b),
                [a, b, c] => Skip::Three(a, b, c),
                _ => Skip::Table,
            }
        };
        Self { trie, skip }
    }

    /// First position at or after `from` where some pattern starts.
    #[inline]
    fn next_candidate(&self, s: &[u8], from: usize) -> Option<usize> {
        let rest = &s[from..];
        let offset = match self.skip {
            Skip::Off => Some(0),
            Skip::Never => None,
            Skip::One(a) => memchr::memchr(a, rest),
            Skip::Two(a, b) => memchr::memchr2(a, b, rest),
            Skip::Three(a, b, c) => memchr::memchr3(a, b, c, rest),
            Skip::Table => rest.iter().position(|&b| self.trie.can_start(b)),
        };
        offset.map(|o| from + o)
    }

    /// Core scan loop. Calls `emit` with consecutive output pieces (literal
    /// runs and replacements) and returns whether any pattern matched.
    fn scan<E>(
        &self,
        s: &[u8],
        mut emit: impl FnMut(&[u8]) -> Result<(), E>,
    ) -> Result<bool, E> {
        let mut matched = false;
        let mut last = 0;
        let mut i = 0;
        // Set after an empty match so the next lookup at the same position
        // must consume input.
        let mut prev_empty = false;

        while i <= s.len() {
            if i < s.len() {
                match self.next_candidate(s, i) {
                    Some(j) => i = j,
                    None => break,
                }
            }

            if let Some(m) = self.trie.lookup(&s[i..], prev_empty) {
                prev_empty = m.len == 0;
                matched = true;
                if last < i {
                    emit(&s[last..i])?;
                }
                if !m.replacement.is_empty() {
                    emit(m.replacement)?;
                }
                i += m.len;
                last = i;
                continue;
            }
            prev_empty = false;
            i += 1;
        }

        if last < s.len() {
            emit(&s[last..])?;
        }
        Ok(matched)
    }

    /// Output length and whether anything matched.
    fn measure(&self, s: &[u8]) -> (usize, bool) {
        let mut len = 0;
        let Ok(matched) = self.scan::<Infallible>(s, |piece| {
            len += piece.len();
            Ok(())
        });
        (len, matched)
    }

    fn fill(&self, s: &[u8], out_len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(out_len);
        let Ok(_) = self.scan::<Infallible>(s, |piece| {
            out.extend_from_slice(piece);
            Ok(())
        });
        debug_assert_eq!(out.len(), out_len);
        out
    }

    /// Whether any pattern occurs in `s`.
    pub fn has_match(&self, s: &[u8]) -> bool {
        let mut i = 0;
        while i <= s.len() {
            if i < s.len() {
                match self.next_candidate(s, i) {
                    Some(j) => i = j,
                    None => return false,
                }
            }
            if self.trie.lookup(&s[i..], false).is_some() {
                return true;
            }
            i += 1;
        }
        false
    }

    /// Replaces into a new buffer sized exactly for the output. When nothing
    /// matches the input buffer itself is handed back.
    pub fn replace(&self, buf: Vec<u8>) -> Vec<u8> {
        let (out_len, matched) = self.measure(&buf);
        if !matched {
            return buf;
        }
        self.fill(&buf, out_len)
    }

    pub fn replace_bytes<'a>(&self, s: &'a [u8]) -> Cow<'a, [u8]> {
        let (out_len, matched) = self.measure(s);
        if !matched {
            return Cow::Borrowed(s);
        }
        Cow::Owned(self.fill(s, out_len))
    }

    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W, s: &[u8]) -> Result<usize, WriteError> {
        let mut written = 0;
        let result = self.scan(s, |piece| write_counted(&mut *w, piece, &mut written));
        match result {
            Ok(_) => Ok(written),
            Err(source) => Err(WriteError { written, source }),
        }
    }
}
