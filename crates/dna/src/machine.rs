//! The rewrite loop.
//!
//! One iteration parses a pattern and a template from the front of the DNA,
//! matches the pattern against what follows, and writes the expanded
//! template back. The program ends when a parse runs out of DNA, and halts
//! early when a template cannot be expanded.

use endo_rope::Rope;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, SpliceStrategy};
use crate::coverage::Coverage;
use crate::items::{Items, PatternItem, TemplateItem};
use crate::matcher::match_pattern;
use crate::parser::{ParseError, Parser};
use crate::rewrite::{splice, RewriteError};
use crate::rna::Rna;

/// Outcome of one rewrite step.
#[derive(Debug, Clone)]
pub struct Iteration {
    /// RNA emitted while parsing, in order.
    pub rna: Vec<Rna>,
    /// DNA for the next step, or `None` when the program has finished.
    pub dna: Option<Rope>,
    /// Whether the pattern matched. A failed match still yields DNA.
    pub matched: bool,
    /// Set when the match could not be rewritten; `dna` is then `None`.
    pub error: Option<RewriteError>,
}

type Program = (Vec<PatternItem>, Vec<TemplateItem>, usize);

fn parse(
    dna: &Rope,
    rna: &mut Vec<Rna>,
    coverage: Option<&mut Coverage>,
) -> Result<Program, ParseError> {
    let mut cursor = dna.cursor();
    let mut parser = Parser::new(&mut cursor, rna);
    if let Some(coverage) = coverage {
        parser = parser.with_coverage(coverage);
    }
    let pattern = parser.pattern()?;
    let template = parser.template()?;
    Ok((pattern, template, cursor.index()))
}

/// Performs one rewrite step on `dna`.
pub fn iterate(dna: &Rope, strategy: SpliceStrategy) -> Iteration {
    run_iteration(dna, strategy, None)
}

fn run_iteration(
    dna: &Rope,
    strategy: SpliceStrategy,
    mut coverage: Option<&mut Coverage>,
) -> Iteration {
    let mut rna = Vec::new();
    let (pattern, template, start) = match parse(dna, &mut rna, coverage.as_deref_mut()) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(%err, emitted = rna.len(), "program finished");
            return Iteration {
                rna,
                dna: None,
                matched: false,
                error: None,
            };
        }
    };
    debug!(
        pattern = %Items(&pattern),
        template = %Items(&template),
        at = start,
        "parsed"
    );

    let mut cursor = dna.cursor();
    cursor.seek(start);
    let (next, matched) = match match_pattern(&mut cursor, &pattern) {
        Some(m) => {
            debug!(start = m.start, end = m.end, groups = m.groups.len(), "matched");
            match splice(dna, &m, &template, strategy) {
                Ok(done) => {
                    if let Some(coverage) = coverage {
                        for &seam in &done.seams {
                            coverage.record_splice(&done.dna, seam);
                        }
                    }
                    (done.dna, true)
                }
                Err(err) => {
                    warn!(%err, template = %Items(&template), "rewrite failed, halting");
                    return Iteration {
                        rna,
                        dna: None,
                        matched: true,
                        error: Some(err),
                    };
                }
            }
        }
        None => {
            debug!("no match");
            cursor.seek(start);
            (cursor.suffix(), false)
        }
    };
    Iteration {
        rna,
        dna: Some(next),
        matched,
        error: None,
    }
}

/// Totals for a [`Machine::run`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub emitted: u64,
    /// `false` when the run stopped at the iteration limit.
    pub finished: bool,
}

/// A DNA program being executed step by step.
#[derive(Debug, Clone)]
pub struct Machine {
    dna: Rope,
    config: EngineConfig,
    iterations: u64,
    emitted: u64,
    finished: bool,
    error: Option<RewriteError>,
    coverage: Option<Coverage>,
}

impl Machine {
    /// Coverage is collected when `config.coverage` is set.
    pub fn new(dna: Rope, config: EngineConfig) -> Machine {
        let coverage = config.coverage.then(Coverage::new);
        Machine {
            dna,
            config,
            iterations: 0,
            emitted: 0,
            finished: false,
            error: None,
            coverage,
        }
    }

    /// Starts from `prefix` followed by `dna`.
    pub fn with_prefix(prefix: &Rope, dna: &Rope, config: EngineConfig) -> Machine {
        Machine::new(prefix.append(dna), config)
    }

    pub fn dna(&self) -> &Rope {
        &self.dna
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Completed rewrites, counting ones whose match failed.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// True once a parse ran out of DNA or a rewrite failed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Why the program halted, if a rewrite failed.
    pub fn error(&self) -> Option<&RewriteError> {
        self.error.as_ref()
    }

    pub fn coverage(&self) -> Option<&Coverage> {
        self.coverage.as_ref()
    }

    pub fn limit_reached(&self) -> bool {
        self.config.max_iterations.is_some_and(|max| self.iterations >= max)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            iterations: self.iterations,
            emitted: self.emitted,
            finished: self.finished,
        }
    }

    /// Runs one iteration and returns the RNA it emitted.
    ///
    /// Does nothing once the program has finished.
    pub fn step(&mut self) -> Vec<Rna> {
        if self.finished {
            return Vec::new();
        }
        if let Some(coverage) = self.coverage.as_mut() {
            coverage.begin_iteration(self.iterations + 1);
        }
        let Iteration { rna, dna, error, .. } =
            run_iteration(&self.dna, self.config.splice, self.coverage.as_mut());
        self.emitted += rna.len() as u64;
        self.error = error;
        match dna {
            Some(dna) => {
                self.dna = dna;
                self.iterations += 1;
                let interval = self.config.progress_interval;
                if interval > 0 && self.iterations % interval == 0 {
                    info!(
                        iterations = self.iterations,
                        emitted = self.emitted,
                        len = self.dna.len(),
                        depth = self.dna.depth(),
                        "progress"
                    );
                }
            }
            None => self.finished = true,
        }
        rna
    }

    /// Steps until the program finishes or the iteration limit is hit,
    /// passing every emitted RNA to `sink` in order.
    pub fn run<F: FnMut(Rna)>(&mut self, mut sink: F) -> RunSummary {
        while !self.finished && !self.limit_reached() {
            for rna in self.step() {
                sink(rna);
            }
        }
        let summary = self.summary();
        info!(
            iterations = summary.iterations,
            emitted = summary.emitted,
            finished = summary.finished,
            "run stopped"
        );
        summary
    }
}

/// Everything a finished program produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub rna: Vec<Rna>,
    pub iterations: u64,
}

/// Runs `dna` to completion with default settings.
pub fn execute(dna: Rope) -> Execution {
    let mut rna = Vec::new();
    let summary = Machine::new(dna, EngineConfig::default()).run(|r| rna.push(r));
    Execution {
        rna,
        iterations: summary.iterations,
    }
}
