mod byte;
mod core;
mod escape;
mod generic;
mod trie;


pub use self::byte::ByteReplacer;
pub use self::core::{ReplaceError, Replacer, WriteError};
pub use self::escape::unescape;
pub use self::generic::GenericReplacer;
