//! Bases and packed symbol cells.
//!
//! A [`Cell`] packs one base together with the provenance metadata the
//! interpreter carries through every rewrite:
//!
//! | Bits  | Field   | Notes |
//! |-------|---------|-------|
//! | 0–1   | base    | ordinal `I=0, C=1, F=2, P=3` |
//! | 2–25  | address | source position in the input, truncated to 24 bits |
//! | 26–31 | level   | signed escape level, `-32` marks synthesized cells |

use std::fmt;

use thiserror::Error;

/// One symbol of the four-letter alphabet.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Base {
    I = 0,
    C = 1,
    F = 2,
    P = 3,
}

impl Base {
    pub const ALL: [Base; 4] = [Base::I, Base::C, Base::F, Base::P];

    /// Base for the low two bits of `bits`.
    #[inline]
    pub fn from_u2(bits: u8) -> Base {
        Self::ALL[(bits & 3) as usize]
    }

    #[inline]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_char(ch: char) -> Option<Base> {
        match ch {
            'I' => Some(Base::I),
            'C' => Some(Base::C),
            'F' => Some(Base::F),
            'P' => Some(Base::P),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Base::I => 'I',
            Base::C => 'C',
            Base::F => 'F',
            Base::P => 'P',
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Level carried by cells that were synthesized rather than copied.
pub const SYNTHETIC_LEVEL: i8 = -32;
/// Largest representable escape level; it also saturates downward as `-31`.
pub const MAX_LEVEL: i8 = 31;

const BASE_MASK: u32 = 0b11;
const ADDR_SHIFT: u32 = 2;
const ADDR_MASK: u32 = 0x00ff_ffff << ADDR_SHIFT;
const LEVEL_SHIFT: u32 = 26;

/// A base plus provenance, packed into 32 bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell(u32);

impl Cell {
    pub fn new(base: Base, addr: u32, level: i8) -> Cell {
        debug_assert!(level >= SYNTHETIC_LEVEL && level <= MAX_LEVEL);
        let level = ((level as i32) << LEVEL_SHIFT) as u32;
        Cell(base as u32 | ((addr << ADDR_SHIFT) & ADDR_MASK) | level)
    }

    /// A level-0 cell read from input position `addr`.
    pub fn source(base: Base, addr: usize) -> Cell {
        Cell::new(base, addr as u32, 0)
    }

    pub fn synthetic(base: Base) -> Cell {
        Cell::new(base, 0, SYNTHETIC_LEVEL)
    }

    #[inline]
    pub fn base(self) -> Base {
        Base::from_u2(self.0 as u8)
    }

    #[inline]
    pub fn ordinal(self) -> u8 {
        (self.0 & BASE_MASK) as u8
    }

    #[inline]
    pub fn addr(self) -> u32 {
        (self.0 & ADDR_MASK) >> ADDR_SHIFT
    }

    #[inline]
    pub fn level(self) -> i8 {
        ((self.0 as i32) >> LEVEL_SHIFT) as i8
    }

    pub fn is_synthetic(self) -> bool {
        self.level() == SYNTHETIC_LEVEL
    }

    /// Level after protecting this cell `by` times.
    ///
    /// Synthesized cells and cells saturated at `-31` keep their level.
    pub fn escaped(self, by: usize) -> i8 {
        let level = self.level();
        if level <= -MAX_LEVEL {
            return level;
        }
        let by = i64::try_from(by).unwrap_or(i64::MAX);
        (level as i64).saturating_add(by).min(MAX_LEVEL as i64) as i8
    }

    /// One decode step of a literal run: `C→I`, `F→C`, `P→F`, `I→P`.
    pub fn unescaped(self) -> Cell {
        let base = Base::from_u2(self.ordinal() + 3);
        let level = self.level();
        let level = if level > -MAX_LEVEL && level < MAX_LEVEL {
            (level - 1).max(-MAX_LEVEL)
        } else {
            level
        };
        Cell::new(base, self.addr(), level)
    }
}

impl From<Base> for Cell {
    fn from(base: Base) -> Cell {
        Cell::synthetic(base)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base())
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            write!(f, "{}@*", self.base())
        } else {
            write!(f, "{}@{}\\{}", self.base(), self.addr(), self.level())
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseBaseError {
    #[error("invalid base {ch:?} at byte offset {offset}")]
    InvalidBase { ch: char, offset: usize },
}

/// Reads DNA text into source cells, skipping whitespace.
///
/// Addresses count bases, not bytes, so line breaks in the input do not
/// shift provenance.
pub fn parse_bases(text: &str) -> Result<Vec<Cell>, ParseBaseError> {
    let mut cells = Vec::with_capacity(text.len());
    for (offset, ch) in text.char_indices() {
        if ch.is_ascii_whitespace() {
            continue;
        }
        let base = Base::from_char(ch).ok_or(ParseBaseError::InvalidBase { ch, offset })?;
        cells.push(Cell::source(base, cells.len()));
    }
    Ok(cells)
}
