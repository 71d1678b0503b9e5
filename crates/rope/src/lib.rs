//! Persistent rope over the four-base `I C F P` alphabet.
//!
//! The rope stores packed [`Cell`]s (base plus source address and escape
//! level) in shared, immutable leaves. Edits produce new ropes in
//! O(log n) while old versions stay valid.
//!
//! # Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`base`] | [`Base`], packed [`Cell`], input parsing |
//! | [`rope`] | [`Rope`] handle: slice, splice, append, concat, iteration |
//! | [`cursor`] | [`Cursor`] with a leaf finger for sequential reads |
//! | [`search`] | Boyer-Moore [`Needle`] probing through a cursor |
//!
//! Tree nodes keep the AVL shape after every join and respect the floor
//! `len ≥ fib(depth − 2) · LEAF_SIZE`, so depth stays logarithmic.

pub mod base;
pub mod cursor;
mod node;
pub mod rope;
pub mod search;

pub use base::{parse_bases, Base, Cell, ParseBaseError, MAX_LEVEL, SYNTHETIC_LEVEL};
pub use cursor::Cursor;
pub use node::LEAF_SIZE;
pub use rope::{Cells, Rope};
pub use search::Needle;
