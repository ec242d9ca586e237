//! Comment-preserving document engine.
//!
//! [`parse`] turns bytes into a [`Node`] tree, [`expand_dotted_keys`] and
//! [`merge_duplicate_keys`] edit the tree in place, and [`serialize`]
//! writes it back in canonical form. Every call works on its own tree and
//! touches no shared state, so documents can be processed concurrently.

mod emit;
mod expand;
mod merge;
mod node;
mod parse;
mod scalar;

pub use emit::serialize;
pub use expand::expand_dotted_keys;
pub use merge::merge_duplicate_keys;
pub use node::{Node, NodeKind, Style};
pub use parse::{comments, parse};
