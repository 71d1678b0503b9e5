use std::fmt;

use endo_rope::{Base, Cell, Rope};
use serde::{Serialize, Serializer};

/// A seven-base instruction emitted for the downstream renderer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rna([Cell; Rna::LEN]);

impl Rna {
    pub const LEN: usize = 7;

    /// First seven cells of `rope`, if it has that many.
    pub fn from_rope(rope: &Rope) -> Option<Rna> {
        let mut cells = [Cell::synthetic(Base::I); Rna::LEN];
        let mut iter = rope.iter();
        for slot in cells.iter_mut() {
            *slot = iter.next()?;
        }
        Some(Rna(cells))
    }

    pub fn cells(&self) -> &[Cell; Rna::LEN] {
        &self.0
    }

    pub fn bases(&self) -> [Base; Rna::LEN] {
        self.0.map(Cell::base)
    }
}

impl fmt::Display for Rna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in &self.0 {
            write!(f, "{}", cell.base())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Rna {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rna({self})")
    }
}

impl Serialize for Rna {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
