//! Interpreter for Endo DNA, a self-rewriting program over `I C F P`.
//!
//! Each iteration decodes a pattern and a template from the front of the
//! DNA, matches the pattern against the rest, and splices the expanded
//! template in place of everything it consumed. Seven-base RNA
//! instructions are emitted along the way for a downstream renderer.
//!
//! # Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`nat`] | `P`-terminated binary numbers |
//! | [`escape`] | `protect` quoting and literal-run decoding |
//! | [`items`] | [`PatternItem`] and [`TemplateItem`] |
//! | [`parser`] | opcode decoder producing items and RNA |
//! | [`matcher`] | pattern matching with capture groups |
//! | [`rewrite`] | template expansion and splice-back |
//! | [`machine`] | [`iterate`], [`Machine`] and [`execute`] |
//! | [`config`] | [`EngineConfig`] loaded from TOML |
//! | [`input`] | DNA files, plain or gzip-compressed |
//! | [`coverage`] | per-base source usage and the annotated listing |
//!
//! ```
//! use endo_dna::{execute, iterate, SpliceStrategy};
//! use endo_rope::Rope;
//!
//! let dna: Rope = "IIPIPICPIICICIIFICCIFPPIICCFPC".parse().unwrap();
//! let step = iterate(&dna, SpliceStrategy::Collapse);
//! assert_eq!(step.dna.unwrap().to_string(), "PICFC");
//!
//! let run = execute(dna);
//! assert_eq!(run.iterations, 1);
//! assert!(run.rna.is_empty());
//! ```

pub mod config;
pub mod coverage;
pub mod error;
pub mod escape;
pub mod input;
pub mod items;
pub mod machine;
pub mod matcher;
pub mod nat;
pub mod parser;
pub mod rewrite;
pub mod rna;

pub use config::{ConfigError, EngineConfig, SpliceStrategy};
pub use coverage::{Coverage, Stat, Usage};
pub use error::Error;
pub use escape::{protect, unescape, MAX_PROTECT_LEVEL};
pub use input::{load_dna, read_dna};
pub use items::{Items, PatternItem, TemplateItem};
pub use machine::{execute, iterate, Execution, Iteration, Machine, RunSummary};
pub use matcher::{match_pattern, Match};
pub use parser::{parse_pattern, parse_template, ParseError, Parser};
pub use rewrite::{expand, replace, splice, RewriteError, Splice};
pub use rna::Rna;
