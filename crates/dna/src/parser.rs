//! Single-pass decoder for one pattern and one template.
//!
//! Each item starts with an opcode of one to three bases:
//!
//! | Opcode | Pattern | Template |
//! |--------|---------|----------|
//! | `C` `F` `P` `IC` | literal run | literal run |
//! | `IF` | search (one extra base is skipped) | reference: nat level, nat group |
//! | `IP` | skip: nat count | reference: nat level, nat group |
//! | `IIP` | open group | length: nat group |
//! | `IIC` `IIF` | close group, or end of pattern at depth 0 | end of template |
//! | `III` | emit the next seven bases as RNA | same |
//!
//! Running out of bases anywhere is a [`ParseError`], which ends the program.
//!
//! A parser given a [`Coverage`] also credits every consumed cell with
//! what it was read as.

use endo_rope::{Base, Cell, Cursor, Rope};
use thiserror::Error;
use tracing::trace;

use crate::coverage::{Coverage, Usage};
use crate::escape;
use crate::items::{PatternItem, TemplateItem};
use crate::nat;
use crate::rna::Rna;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("DNA exhausted while reading {context} at index {index}")]
    Exhausted { context: &'static str, index: usize },
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opcode {
    /// `C`, `F`, `P` or `IC`: the run starts at the opcode itself.
    Literal,
    /// `IF`
    IF,
    /// `IP`
    IP,
    /// `IIP`
    IIP,
    /// `IIC` or `IIF`
    Close,
    /// `III`
    III,
}

impl Opcode {
    fn width(self) -> usize {
        match self {
            Opcode::Literal => 0,
            Opcode::IF | Opcode::IP => 2,
            Opcode::IIP | Opcode::Close | Opcode::III => 3,
        }
    }
}

/// Reads items from a cursor, appending any emitted RNA to `rna`.
pub struct Parser<'c, 'a> {
    cursor: &'c mut Cursor<'a>,
    rna: &'c mut Vec<Rna>,
    coverage: Option<&'c mut Coverage>,
}

impl<'c, 'a> Parser<'c, 'a> {
    pub fn new(cursor: &'c mut Cursor<'a>, rna: &'c mut Vec<Rna>) -> Self {
        Parser {
            cursor,
            rna,
            coverage: None,
        }
    }

    /// Records cell usage into `coverage` while parsing.
    pub fn with_coverage(mut self, coverage: &'c mut Coverage) -> Self {
        self.coverage = Some(coverage);
        self
    }

    /// Credits the cell at `index` with `usage`.
    fn note(&mut self, index: usize, usage: Usage) {
        if let Some(coverage) = self.coverage.as_deref_mut() {
            if let Some(cell) = self.cursor.at(index) {
                coverage.record(cell, usage);
            }
        }
    }

    fn note_cells(&mut self, cells: &[Cell], usage: fn(Base) -> Usage) {
        if let Some(coverage) = self.coverage.as_deref_mut() {
            for &cell in cells {
                coverage.record(cell, usage(cell.base()));
            }
        }
    }

    fn exhausted(&self, context: &'static str) -> ParseError {
        ParseError::Exhausted {
            context,
            index: self.cursor.index(),
        }
    }

    fn base_at(&mut self, index: usize) -> Option<Base> {
        self.cursor.at(index).map(|c| c.base())
    }

    fn opcode(&mut self) -> Result<Opcode, ParseError> {
        let index = self.cursor.index();
        let op = match self.base_at(index) {
            Some(Base::C | Base::F | Base::P) => Some(Opcode::Literal),
            Some(Base::I) => match self.base_at(index + 1) {
                Some(Base::C) => Some(Opcode::Literal),
                Some(Base::F) => Some(Opcode::IF),
                Some(Base::P) => Some(Opcode::IP),
                Some(Base::I) => match self.base_at(index + 2) {
                    Some(Base::P) => Some(Opcode::IIP),
                    Some(Base::C | Base::F) => Some(Opcode::Close),
                    Some(Base::I) => Some(Opcode::III),
                    None => None,
                },
                None => None,
            },
            None => None,
        };
        op.ok_or_else(|| self.exhausted("opcode"))
    }

    /// Consumes a literal run starting at the cursor.
    ///
    /// Each decoded base is credited to the first raw cell it came from.
    fn literal(&mut self, usage: Option<fn(Base) -> Usage>) -> Rope {
        let start = self.cursor.index();
        loop {
            match self.cursor.peek().map(|c| c.base()) {
                Some(Base::I) => {
                    if self.cursor.peek2().map(|c| c.base()) != Some(Base::C) {
                        break;
                    }
                    self.cursor.advance(2);
                }
                Some(_) => self.cursor.advance(1),
                None => break,
            }
        }
        let raw = self.cursor.rope().slice(start, self.cursor.index()).to_cells();
        let decoded = escape::unescape(&raw);
        if let (Some(usage), Some(coverage)) = (usage, self.coverage.as_deref_mut()) {
            let mut cells = raw.iter();
            for cell in &decoded {
                // every `I` in a run is the head of an `IC` pair
                let Some(&first) = cells.next() else {
                    break;
                };
                if first.base() == Base::I {
                    cells.next();
                }
                coverage.record(first, usage(cell.base()));
            }
        }
        Rope::from_cells(decoded)
    }

    fn nat(&mut self, context: &'static str) -> Result<usize, ParseError> {
        let start = self.cursor.index();
        let n = match nat::decode(self.cursor) {
            Some(n) => n,
            None => return Err(self.exhausted(context)),
        };
        if self.coverage.is_some() {
            let digits = self.cursor.rope().slice(start, self.cursor.index()).to_cells();
            self.note_cells(&digits, Usage::nat);
        }
        Ok(n)
    }

    /// Reads the seven bases after an `III` at `at`.
    fn emit(&mut self, at: usize) -> Result<(), ParseError> {
        let rna = self
            .cursor
            .slice(Rna::LEN)
            .and_then(|bases| Rna::from_rope(&bases))
            .ok_or_else(|| self.exhausted("RNA"))?;
        trace!(%rna, "emit");
        self.note(at, Usage::Rna);
        self.note_cells(rna.cells(), Usage::RnaBase);
        self.rna.push(rna);
        Ok(())
    }

    /// Parses a pattern up to and including its closing opcode.
    pub fn pattern(&mut self) -> Result<Vec<PatternItem>, ParseError> {
        let mut items = Vec::new();
        let mut depth = 0usize;
        loop {
            let at = self.cursor.index();
            let op = self.opcode()?;
            self.cursor.advance(op.width());
            let item = match op {
                Opcode::Literal => PatternItem::Bases(self.literal(Some(Usage::PatternBase))),
                Opcode::IF => {
                    if self.cursor.next().is_none() {
                        return Err(self.exhausted("search"));
                    }
                    self.note(at, Usage::Search);
                    PatternItem::Search(self.literal(Some(Usage::SearchBase)))
                }
                Opcode::IP => {
                    self.note(at, Usage::Skip);
                    PatternItem::Skip(self.nat("skip count")?)
                }
                Opcode::IIP => {
                    self.note(at, Usage::Open);
                    depth += 1;
                    PatternItem::Open
                }
                Opcode::Close if depth == 0 => {
                    self.note(at, Usage::PatternEnd);
                    return Ok(items);
                }
                Opcode::Close => {
                    self.note(at, Usage::Close);
                    depth -= 1;
                    PatternItem::Close
                }
                Opcode::III => {
                    self.emit(at)?;
                    continue;
                }
            };
            trace!(%item, "pattern item");
            items.push(item);
        }
    }

    /// Parses a template up to and including its terminator.
    pub fn template(&mut self) -> Result<Vec<TemplateItem>, ParseError> {
        let mut items = Vec::new();
        loop {
            let at = self.cursor.index();
            let op = self.opcode()?;
            self.cursor.advance(op.width());
            let item = match op {
                Opcode::Literal => TemplateItem::Bases(self.literal(None)),
                Opcode::IF | Opcode::IP => {
                    self.note(at, Usage::Ref);
                    let level = self.nat("reference level")?;
                    let group = self.nat("reference group")?;
                    TemplateItem::Ref { group, level }
                }
                Opcode::IIP => {
                    self.note(at, Usage::Len);
                    TemplateItem::Len(self.nat("length group")?)
                }
                Opcode::Close => {
                    self.note(at, Usage::TemplateEnd);
                    return Ok(items);
                }
                Opcode::III => {
                    self.emit(at)?;
                    continue;
                }
            };
            trace!(%item, "template item");
            items.push(item);
        }
    }
}

/// Parses one pattern from `cursor`.
pub fn parse_pattern(
    cursor: &mut Cursor<'_>,
    rna: &mut Vec<Rna>,
) -> Result<Vec<PatternItem>, ParseError> {
    Parser::new(cursor, rna).pattern()
}

/// Parses one template from `cursor`.
pub fn parse_template(
    cursor: &mut Cursor<'_>,
    rna: &mut Vec<Rna>,
) -> Result<Vec<TemplateItem>, ParseError> {
    Parser::new(cursor, rna).template()
}
