//! Source coverage: which input bases were read as which kind of code.
//!
//! Cells keep the address and escape level they were read from, so every
//! parse step can credit the bases it consumed back to the source. Entries
//! are keyed by `(address, level)`; synthesized cells are never recorded.
//! Splices mark the cells on either side of each seam, which shows where
//! the program cuts and pastes its own text.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{self, Write};

use endo_rope::{Base, Cell, Rope};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::items::{PatternItem, TemplateItem};

/// Source bases per line of [`Coverage::write_listing`] output.
const LISTING_WIDTH: usize = 50;

/// What a base was last read as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Usage {
    /// A base of a pattern literal run, after decoding.
    PatternBase(Base),
    /// Opcode of a pattern skip.
    Skip,
    /// Opcode of a pattern search.
    Search,
    SearchBase(Base),
    Open,
    Close,
    PatternEnd,
    /// Opcode of a template length.
    Len,
    /// Opcode of a template reference.
    Ref,
    TemplateEnd,
    /// A digit of a number: `true` for a one bit.
    Digit(bool),
    /// The `P` closing a number.
    NatEnd,
    /// Opcode of an emit.
    Rna,
    RnaBase(Base),
}

impl Usage {
    /// Usage of a cell read as part of a number.
    pub fn nat(base: Base) -> Usage {
        match base {
            Base::P => Usage::NatEnd,
            Base::C => Usage::Digit(true),
            Base::I | Base::F => Usage::Digit(false),
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Usage::PatternBase(base) => write!(f, "pattern {base}"),
            Usage::Skip => f.write_str("skip"),
            Usage::Search => f.write_str("search"),
            Usage::SearchBase(base) => write!(f, "search {base}"),
            Usage::Open => f.write_str("open"),
            Usage::Close => f.write_str("close"),
            Usage::PatternEnd => f.write_str("end of pattern"),
            Usage::Len => f.write_str("length"),
            Usage::Ref => f.write_str("reference"),
            Usage::TemplateEnd => f.write_str("end of template"),
            Usage::Digit(bit) => write!(f, "digit {}", u8::from(*bit)),
            Usage::NatEnd => f.write_str("end of number"),
            Usage::Rna => f.write_str("rna"),
            Usage::RnaBase(base) => write!(f, "rna {base}"),
        }
    }
}

impl Serialize for Usage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Counters for one `(address, level)`.
///
/// `first` and `last` are 1-based iteration numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub usage: Option<Usage>,
    /// Whether the cell ever sat next to a splice seam.
    pub splice: bool,
    pub count: u64,
    pub first: u64,
    pub last: u64,
}

impl Stat {
    fn record(&mut self, iteration: u64, usage: Usage) {
        if self.count == 0 {
            self.first = iteration;
        }
        self.usage = Some(usage);
        self.last = iteration;
        self.count += 1;
    }
}

#[derive(Serialize)]
struct Entry<'a> {
    addr: u32,
    level: i8,
    #[serde(flatten)]
    stat: &'a Stat,
}

/// Per-cell usage collected over a run.
#[derive(Debug, Clone, Default)]
pub struct Coverage {
    stats: BTreeMap<(u32, i8), Stat>,
    iteration: u64,
}

impl Coverage {
    pub fn new() -> Coverage {
        Coverage::default()
    }

    /// Sets the iteration number credited by later records.
    pub fn begin_iteration(&mut self, iteration: u64) {
        self.iteration = iteration;
    }

    pub fn record(&mut self, cell: Cell, usage: Usage) {
        if cell.is_synthetic() {
            return;
        }
        self.stats
            .entry((cell.addr(), cell.level()))
            .or_default()
            .record(self.iteration, usage);
    }

    /// Marks the cells on both sides of offset `pos` of `dna` as a seam.
    ///
    /// Offsets at either end of `dna` have only one side and are ignored.
    pub fn record_splice(&mut self, dna: &Rope, pos: usize) {
        if pos == 0 || pos >= dna.len() {
            return;
        }
        for cell in [dna.at(pos - 1), dna.at(pos)] {
            if !cell.is_synthetic() {
                self.stats
                    .entry((cell.addr(), cell.level()))
                    .or_default()
                    .splice = true;
            }
        }
    }

    pub fn get(&self, addr: u32, level: i8) -> Option<&Stat> {
        self.stats.get(&(addr, level))
    }

    /// Entries in address order, then level order.
    pub fn iter(&self) -> impl Iterator<Item = ((u32, i8), &Stat)> + '_ {
        self.stats.iter().map(|(&key, stat)| (key, stat))
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    fn usage(&self, addr: u32, level: i8) -> Option<Usage> {
        self.stats.get(&(addr, level)).and_then(|s| s.usage)
    }

    /// Reads back a number whose first digit sits at `addr`.
    ///
    /// Returns the value, the entries it spans and the address after it.
    fn number(&self, addr: u32, level: i8) -> Option<(usize, Vec<(u32, i8)>, u32)> {
        let mut value = 0usize;
        let mut used = Vec::new();
        let mut at = addr;
        let mut bit = 0u32;
        loop {
            used.push((at, level));
            match self.usage(at, level)? {
                Usage::NatEnd => return Some((value, used, at + 1)),
                Usage::Digit(true) if bit < usize::BITS => value |= 1 << bit,
                Usage::Digit(true) => value = usize::MAX,
                Usage::Digit(false) => {}
                _ => return None,
            }
            bit = bit.saturating_add(1);
            at += 1;
        }
    }

    /// Collects the bases of a run starting at `addr`, stepping over short
    /// gaps such as the one an escaped `IC` leaves behind.
    fn run(
        &self,
        addr: u32,
        level: i8,
        seen: &mut Vec<(u32, i8)>,
        pick: fn(Usage) -> Option<Base>,
    ) -> String {
        let mut text = String::new();
        let mut gap = 0;
        let mut at = addr;
        loop {
            match self.usage(at, level).and_then(pick) {
                Some(base) => {
                    gap = 0;
                    seen.push((at, level));
                    text.push(base.to_char());
                }
                None if gap < 2 && self.usage(at, level).is_none() => gap += 1,
                None => break,
            }
            at += 1;
        }
        text
    }

    /// Renders the code that starts at `(addr, level)`.
    ///
    /// Also returns every entry the description covers, so a listing can
    /// skip the continuation entries.
    pub fn describe(&self, addr: u32, level: i8) -> (String, Vec<(u32, i8)>) {
        let mut seen = vec![(addr, level)];
        let Some(usage) = self.usage(addr, level) else {
            return (String::new(), seen);
        };
        let text = match usage {
            Usage::PatternBase(base) => {
                let rest = self.run(addr + 1, level, &mut seen, |u| match u {
                    Usage::PatternBase(b) => Some(b),
                    _ => None,
                });
                format!("{base}{rest}")
            }
            Usage::Skip => match self.number(addr + 2, level) {
                Some((n, used, _)) => {
                    seen.extend(used);
                    PatternItem::Skip(n).to_string()
                }
                None => usage.to_string(),
            },
            Usage::Search => {
                let needle = self.run(addr + 3, level, &mut seen, |u| match u {
                    Usage::SearchBase(b) => Some(b),
                    _ => None,
                });
                format!("?<{needle}>")
            }
            Usage::Open => PatternItem::Open.to_string(),
            Usage::Close => PatternItem::Close.to_string(),
            Usage::Len => match self.number(addr + 3, level) {
                Some((n, used, _)) => {
                    seen.extend(used);
                    TemplateItem::Len(n).to_string()
                }
                None => usage.to_string(),
            },
            Usage::Ref => {
                let quoted = self.number(addr + 2, level).and_then(|(lvl, used, next)| {
                    let (group, more, _) = self.number(next, level)?;
                    Some((lvl, group, used, more))
                });
                match quoted {
                    Some((lvl, group, used, more)) => {
                        seen.extend(used);
                        seen.extend(more);
                        TemplateItem::Ref { group, level: lvl }.to_string()
                    }
                    None => usage.to_string(),
                }
            }
            Usage::Digit(_) | Usage::NatEnd => match self.number(addr, level) {
                Some((n, used, _)) => {
                    seen.extend(used);
                    n.to_string()
                }
                None => "number".to_string(),
            },
            Usage::Rna => {
                let bases = self.run(addr + 3, level, &mut seen, |u| match u {
                    Usage::RnaBase(b) => Some(b),
                    _ => None,
                });
                format!("rna {bases}")
            }
            Usage::PatternEnd | Usage::TemplateEnd | Usage::SearchBase(_) | Usage::RnaBase(_) => {
                usage.to_string()
            }
        };
        (text, seen)
    }

    /// Writes `source` in numbered lines, interleaved with a description
    /// of every covered address and a `--- levels ---` marker at seams.
    pub fn write_listing<W: Write>(&self, source: &Rope, out: &mut W) -> io::Result<()> {
        let mut described = BTreeSet::new();
        let mut pending = String::new();
        let mut start = 0;
        for (index, cell) in source.iter().enumerate() {
            let addr = cell.addr();
            let here = || self.stats.range((addr, i8::MIN)..=(addr, i8::MAX));
            let seams: Vec<String> = here()
                .filter(|(_, stat)| stat.splice)
                .map(|(&(_, level), _)| level.to_string())
                .collect();
            if !seams.is_empty() {
                flush(out, start, &mut pending)?;
                writeln!(out, "--- {} ---", seams.join(", "))?;
            } else if pending.len() >= LISTING_WIDTH {
                flush(out, start, &mut pending)?;
            }
            for (&(addr, level), stat) in here() {
                if stat.usage.is_none() || described.contains(&(addr, level)) {
                    continue;
                }
                let (text, used) = self.describe(addr, level);
                described.extend(used);
                writeln!(
                    out,
                    "{addr:08}@{level} [{}..{} #{}] {text}",
                    stat.first, stat.last, stat.count
                )?;
            }
            if pending.is_empty() {
                start = index;
            }
            pending.push(cell.base().to_char());
        }
        flush(out, start, &mut pending)
    }
}

fn flush<W: Write>(out: &mut W, start: usize, pending: &mut String) -> io::Result<()> {
    if !pending.is_empty() {
        writeln!(out, "{start:08} {pending}")?;
        pending.clear();
    }
    Ok(())
}

impl Serialize for Coverage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.stats.len()))?;
        for (&(addr, level), stat) in &self.stats {
            seq.serialize_element(&Entry { addr, level, stat })?;
        }
        seq.end()
    }
}
