//! Quoting of DNA for insertion into templates, and the matching decode
//! used by literal runs.
//!
//! Protecting a base once maps `I→C`, `C→F`, `F→P`, `P→IC`. Protecting at
//! level `L` applies that map `L` times. Since every step only depends on
//! `ordinal + steps`, the expansion for a base at level `L` is entry
//! `ordinal + L` of a single table.

use std::cell::RefCell;

use endo_rope::{Base, Cell, Rope};

/// Deepest protection [`protect`] accepts.
///
/// Expansions grow by about 1.2x per level; at this level one base quotes
/// to at most 18 884 bases.
pub const MAX_PROTECT_LEVEL: usize = 48;

/// Lazily extended expansion table.
///
/// ```
/// use endo_dna::escape::EscapeTable;
/// use endo_rope::Base;
///
/// let mut table = EscapeTable::new();
/// let text: String = table.expansion(Base::P, 2).iter().map(|b| b.to_char()).collect();
/// assert_eq!(text, "CF");
/// ```
#[derive(Debug, Clone)]
pub struct EscapeTable {
    entries: Vec<Vec<Base>>,
}

impl Default for EscapeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl EscapeTable {
    pub fn new() -> EscapeTable {
        let mut entries: Vec<Vec<Base>> = Base::ALL.iter().map(|&b| vec![b]).collect();
        entries.push(vec![Base::I, Base::C]);
        EscapeTable { entries }
    }

    /// Grows the table to cover entry `index`.
    fn reserve(&mut self, index: usize) {
        while self.entries.len() <= index {
            let prev = &self.entries[self.entries.len() - 1];
            let next: Vec<Base> = prev
                .iter()
                .flat_map(|&b| self.entries[b.ordinal() as usize + 1].iter().copied())
                .collect();
            self.entries.push(next);
        }
    }

    /// Bases produced by protecting `base` at `level`.
    ///
    /// # Panics
    ///
    /// If `level` exceeds [`MAX_PROTECT_LEVEL`].
    pub fn expansion(&mut self, base: Base, level: usize) -> &[Base] {
        assert!(level <= MAX_PROTECT_LEVEL, "protection level {level} too deep");
        let index = base.ordinal() as usize + level;
        self.reserve(index);
        &self.entries[index]
    }
}

thread_local! {
    static TABLE: RefCell<EscapeTable> = RefCell::new(EscapeTable::new());
}

/// Quotes `dna` at `level`.
///
/// Every produced cell keeps the address of the cell it came from, and its
/// level is raised by `level` (saturating).
///
/// # Panics
///
/// If `level` exceeds [`MAX_PROTECT_LEVEL`] and `dna` is not empty.
pub fn protect(dna: &Rope, level: usize) -> Rope {
    if level == 0 || dna.is_empty() {
        return dna.clone();
    }
    assert!(level <= MAX_PROTECT_LEVEL, "protection level {level} too deep");
    TABLE.with(|table| {
        let mut table = table.borrow_mut();
        table.reserve(level + 3);
        let mut out = Vec::with_capacity(dna.len());
        for cell in dna.iter() {
            let escaped = cell.escaped(level);
            out.extend(
                table
                    .expansion(cell.base(), level)
                    .iter()
                    .map(|&b| Cell::new(b, cell.addr(), escaped)),
            );
        }
        Rope::from_cells(out)
    })
}

/// Decodes a literal run: `IC` becomes `P`, every other base steps down.
///
/// A trailing `I` with no `C` after it decodes on its own.
pub fn unescape(raw: &[Cell]) -> Vec<Cell> {
    let mut out = Vec::with_capacity(raw.len());
    let mut cells = raw.iter().peekable();
    while let Some(&cell) = cells.next() {
        if cell.base() == Base::I {
            cells.next_if(|next| next.base() == Base::C);
        }
        out.push(cell.unescaped());
    }
    out
}
