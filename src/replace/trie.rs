use std::mem;

/// Maps every byte value to a dense table index.
///
/// Bytes that occur anywhere in a pattern get an index in `0..len()`; every
/// other byte maps to `len()`, which never addresses a table slot.
#[derive(Clone, Debug)]
pub(crate) struct ByteClasses {
    map: [u16; 256],
    len: usize,
}

impl ByteClasses {
    fn from_patterns<'a>(patterns: impl Iterator<Item = &'a [u8]>) -> Self {
        let mut used = [false; 256];
        for pattern in patterns {
            for &b in pattern {
                used[b as usize] = true;
            }
        }

        let len = used.iter().filter(|&&u| u).count();
        let mut map = [len as u16; 256];
        let mut next = 0u16;
        for (b, _) in used.iter().enumerate().filter(|(_, u)| **u) {
            map[b] = next;
            next += 1;
        }
        Self { map, len }
    }

    #[inline(always)]
    pub(crate) fn class(&self, b: u8) -> usize {
        self.map[b as usize] as usize
    }

    /// Number of distinct pattern bytes, which is also the sentinel class.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

type Table = Box<[Option<Box<Node>>]>;

#[derive(Clone, Debug, Default)]
enum Edges {
    #[default]
    Empty,
    /// Bytes consumed as a unit before reaching `next`.
    Chain { prefix: Box<[u8]>, next: Box<Node> },
    /// One slot per byte class.
    Table(Table),
}

#[derive(Clone, Debug, Default)]
struct Node {
    /// 0 when no pattern ends here; otherwise the rank of the pattern that does.
    priority: usize,
    replacement: Box<[u8]>,
    edges: Edges,
}

fn empty_table(len: usize) -> Table {
    (0..len).map(|_| None).collect()
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

impl Node {
    fn chain(prefix: &[u8], next: Box<Node>) -> Self {
        Node {
            priority: 0,
            replacement: Box::default(),
            edges: Edges::Chain {
                prefix: prefix.into(),
                next,
            },
        }
    }

    /// Marks this node as the end of a pattern. The first claim sticks.
    fn claim(&mut self, replacement: &[u8], priority: usize) {
        if self.priority == 0 {
            self.priority = priority;
            self.replacement = replacement.into();
        }
    }

    fn insert(&mut self, key: &[u8], replacement: &[u8], priority: usize, classes: &ByteClasses) {
        let Some(&first) = key.first() else {
            self.claim(replacement, priority);
            return;
        };

        self.edges = match mem::take(&mut self.edges) {
            Edges::Empty => {
                let mut next = Box::<Node>::default();
                next.claim(replacement, priority);
                Edges::Chain {
                    prefix: key.into(),
                    next,
                }
            }
            Edges::Table(mut table) => {
                table[classes.class(first)]
                    .get_or_insert_with(Box::default)
                    .insert(&key[1..], replacement, priority, classes);
                Edges::Table(table)
            }
            Edges::Chain { prefix, mut next } => {
                let n = common_prefix_len(&prefix, key);
                if n == prefix.len() {
                    next.insert(&key[n..], replacement, priority, classes);
                    Edges::Chain { prefix, next }
                } else if n == 0 {
                    // Diverges on the first byte: fan out here.
                    let rest = if prefix.len() == 1 {
                        next
                    } else {
                        Box::new(Node::chain(&prefix[1..], next))
                    };
                    let mut branch = Box::<Node>::default();
                    branch.insert(&key[1..], replacement, priority, classes);

                    let mut table = empty_table(classes.len());
                    table[classes.class(prefix[0])] = Some(rest);
                    table[classes.class(first)] = Some(branch);
                    Edges::Table(table)
                } else {
                    // Keep the shared part as this chain, hang the rest below it.
                    let mut tail = Box::new(Node::chain(&prefix[n..], next));
                    tail.insert(&key[n..], replacement, priority, classes);
                    Edges::Chain {
                        prefix: prefix[..n].into(),
                        next: tail,
                    }
                }
            }
        };
    }
}

/// Best match found at one scan position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Match<'t> {
    pub(crate) replacement: &'t [u8],
    /// Input bytes consumed; 0 for the empty pattern.
    pub(crate) len: usize,
}

/// Prefix trie over all patterns of a replacer. Immutable once built.
#[derive(Clone, Debug)]
pub(crate) struct Trie {
    root: Node,
    classes: ByteClasses,
}

impl Trie {
    /// Builds the trie. Earlier pairs outrank later ones.
    pub(crate) fn build(pairs: &[(&[u8], &[u8])]) -> Self {
        let classes = ByteClasses::from_patterns(pairs.iter().map(|&(old, _)| old));
        let mut root = Node {
            edges: Edges::Table(empty_table(classes.len())),
            ..Node::default()
        };

        let total = pairs.len();
        for (index, &(old, new)) in pairs.iter().enumerate() {
            root.insert(old, new, total - index, &classes);
        }
        Self { root, classes }
    }

    /// True when the empty pattern was declared, so every position matches.
    #[inline]
    pub(crate) fn root_is_endpoint(&self) -> bool {
        self.root.priority != 0
    }

    /// Whether some pattern starts with `b`.
    #[inline(always)]
    pub(crate) fn can_start(&self, b: u8) -> bool {
        match &self.root.edges {
            Edges::Table(table) => matches!(table.get(self.classes.class(b)), Some(Some(_))),
            _ => false,
        }
    }

    /// All bytes that begin at least one pattern, ascending.
    pub(crate) fn start_bytes(&self) -> Vec<u8> {
        (0..=255u8).filter(|&b| self.can_start(b)).collect()
    }

    /// Finds the highest-priority pattern that is a prefix of `input`.
    ///
    /// With `ignore_root` set, the empty pattern is not considered; the scanner
    /// sets it right after accepting an empty match at the same position.
    pub(crate) fn lookup<'t>(&'t self, mut input: &[u8], ignore_root: bool) -> Option<Match<'t>> {
        let mut best = None;
        let mut best_priority = 0;
        let mut node = &self.root;
        let mut consumed = 0;
        let mut at_root = true;

        loop {
            if node.priority > best_priority && !(ignore_root && at_root) {
                best_priority = node.priority;
                best = Some(Match {
                    replacement: &node.replacement,
                    len: consumed,
                });
            }
            at_root = false;

            let Some(&b) = input.first() else {
                break;
            };
            match &node.edges {
                Edges::Table(table) => match table.get(self.classes.class(b)) {
                    Some(Some(child)) => {
                        node = &**child;
                        input = &input[1..];
                        consumed += 1;
                    }
                    _ => break,
                },
                Edges::Chain { prefix, next } if input.starts_with(prefix) => {
                    node = &**next;
                    input = &input[prefix.len()..];
                    consumed += prefix.len();
                }
                _ => break,
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(pairs: &[(&str, &str)]) -> Trie {
        let pairs: Vec<(&[u8], &[u8])> = pairs
            .iter()
            .map(|&(o, n)| (o.as_bytes(), n.as_bytes()))
            .collect();
        Trie::build(&pairs)
    }

    fn found(t: &Trie, input: &str) -> Option<(String, usize)> {
        t.lookup(input.as_bytes(), false).map(|m| {
            (
                String::from_utf8(m.replacement.to_vec()).unwrap(),
                m.len,
            )
        })
    }

    #[test]
    fn test_classes_cover_every_pattern_byte() {
        let c = ByteClasses::from_patterns([&b"ba"[..], &b"cz"[..]].into_iter());
        assert_eq!(c.len(), 4);
        assert_eq!(c.class(b'a'), 0);
        assert_eq!(c.class(b'b'), 1);
        assert_eq!(c.class(b'c'), 2);
        assert_eq!(c.class(b'z'), 3);
        assert_eq!(c.class(b'q'), 4);
    }

    #[test]
    fn test_classes_all_bytes() {
        let all: Vec<u8> = (0..=255).collect();
        let c = ByteClasses::from_patterns(std::iter::once(&all[..]));
        assert_eq!(c.len(), 256);
        assert_eq!(c.class(255), 255);
    }

    #[test]
    fn test_start_bytes() {
        let t = trie(&[("abc", "1"), ("xbc", "2"), ("b", "3")]);
        assert_eq!(t.start_bytes(), b"abx".to_vec());
        assert!(!t.can_start(b'c'));
        assert!(!t.can_start(b'q'));
    }

    #[test]
    fn test_chain_split_shorter_key() {
        let t = trie(&[("abcd", "long"), ("ab", "short")]);
        assert_eq!(found(&t, "abcd"), Some(("long".into(), 4)));
        assert_eq!(found(&t, "abc"), Some(("short".into(), 2)));
        assert_eq!(found(&t, "a"), None);
    }

    #[test]
    fn test_chain_extended_by_longer_key() {
        let t = trie(&[("ab", "short"), ("abcd", "long")]);
        // "ab" was declared first, so it wins even when "abcd" also matches.
        assert_eq!(found(&t, "abcd"), Some(("short".into(), 2)));
        assert_eq!(found(&t, "abx"), Some(("short".into(), 2)));
    }

    #[test]
    fn test_chain_diverges_midway() {
        let t = trie(&[("abcx", "1"), ("abcy", "2"), ("abz", "3")]);
        assert_eq!(found(&t, "abcx"), Some(("1".into(), 4)));
        assert_eq!(found(&t, "abcy"), Some(("2".into(), 4)));
        assert_eq!(found(&t, "abz"), Some(("3".into(), 3)));
        assert_eq!(found(&t, "abc"), None);
    }

    #[test]
    fn test_chain_diverges_on_first_byte() {
        // Both keys hang under root slot 'a'; the child chain "bc" must fan out.
        let t = trie(&[("abc", "1"), ("axc", "2"), ("ab", "3")]);
        assert_eq!(found(&t, "abc"), Some(("1".into(), 3)));
        assert_eq!(found(&t, "axc"), Some(("2".into(), 3)));
        assert_eq!(found(&t, "abq"), Some(("3".into(), 2)));
    }

    #[test]
    fn test_single_byte_chain_diverges() {
        let t = trie(&[("ab", "1"), ("ac", "2")]);
        assert_eq!(found(&t, "ab"), Some(("1".into(), 2)));
        assert_eq!(found(&t, "ac"), Some(("2".into(), 2)));
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let t = trie(&[("ab", "first"), ("ab", "second")]);
        assert_eq!(found(&t, "ab"), Some(("first".into(), 2)));
    }

    #[test]
    fn test_empty_pattern_claims_root() {
        let t = trie(&[("", "E"), ("a", "A")]);
        assert!(t.root_is_endpoint());
        assert_eq!(found(&t, "a"), Some(("E".into(), 0)));
        let m = t.lookup(b"a", true).unwrap();
        assert_eq!((m.replacement, m.len), (&b"A"[..], 1));
        assert_eq!(t.lookup(b"", true), None);
    }

    #[test]
    fn test_no_patterns() {
        let t = trie(&[]);
        assert!(!t.root_is_endpoint());
        assert!(t.start_bytes().is_empty());
        assert_eq!(found(&t, "abc"), None);
    }
}
