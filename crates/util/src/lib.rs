//! endo-util - test helpers shared by the endo crates.
//!
//! [`Fuzzer`] produces reproducible random DNA text and ropes assembled from
//! randomly sized fragments, which exercise rope joins and cursor moves
//! across many leaf boundaries.

pub mod fuzzer;

pub use fuzzer::Fuzzer;
