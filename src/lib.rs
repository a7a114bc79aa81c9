//! Simultaneous multi-pattern byte replacement.
//!
//! ```
//! use freplace_rs::replace::Replacer;
//!
//! let r = Replacer::new(&["<", "&lt;", ">", "&gt;", "&", "&amp;"]);
//! assert_eq!(r.replace(b"a<b && c>d".to_vec()), b"a&lt;b &amp;&amp; c&gt;d");
//! ```

pub mod common;
pub mod replace;

pub use replace::{ReplaceError, Replacer, WriteError};
