//! Natural-number codec: little-endian bits terminated by `P`.
//!
//! `C` is a one bit, `I` and `F` are zero bits.

use endo_rope::{Base, Cell, Cursor, Rope};

/// Reads one number, consuming its terminator.
///
/// Returns `None` when the rope ends before a `P`. Values wider than
/// `usize` saturate at `usize::MAX`.
pub fn decode(cursor: &mut Cursor<'_>) -> Option<usize> {
    let mut value = 0usize;
    let mut bit = 0u32;
    loop {
        match cursor.next()?.base() {
            Base::P => return Some(value),
            Base::C if bit < usize::BITS => value |= 1 << bit,
            Base::C => value = usize::MAX,
            Base::I | Base::F => {}
        }
        bit = bit.saturating_add(1);
    }
}

/// Encodes `n` as synthesized cells.
pub fn encode(n: usize) -> Rope {
    let mut cells = Vec::with_capacity((usize::BITS - n.leading_zeros()) as usize + 1);
    let mut n = n;
    while n > 0 {
        let base = if n & 1 == 1 { Base::C } else { Base::I };
        cells.push(Cell::synthetic(base));
        n >>= 1;
    }
    cells.push(Cell::synthetic(Base::P));
    Rope::from_cells(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_str(s: &str) -> (Option<usize>, usize) {
        let rope: Rope = s.parse().unwrap();
        let mut cursor = rope.cursor();
        let value = decode(&mut cursor);
        (value, cursor.index())
    }

    #[test]
    fn decodes_little_endian() {
        assert_eq!(decode_str("P"), (Some(0), 1));
        assert_eq!(decode_str("CP"), (Some(1), 2));
        assert_eq!(decode_str("ICP"), (Some(2), 3));
        assert_eq!(decode_str("FCPIII"), (Some(2), 3));
        assert_eq!(decode_str("IICP"), (Some(4), 4));
        assert_eq!(decode_str("CCCP"), (Some(7), 4));
    }

    #[test]
    fn missing_terminator_fails() {
        assert_eq!(decode_str("CCIC").0, None);
        assert_eq!(decode_str("").0, None);
    }

    #[test]
    fn overlong_numbers_saturate() {
        let text = format!("{}P", "C".repeat(80));
        assert_eq!(decode_str(&text), (Some(usize::MAX), 81));
        let zeros = format!("{}P", "I".repeat(200));
        assert_eq!(decode_str(&zeros).0, Some(0));
    }

    #[test]
    fn encodes_synthetic_cells() {
        let rope = encode(6);
        assert_eq!(rope.to_string(), "ICCP");
        assert!(rope.iter().all(|c| c.is_synthetic()));
        assert_eq!(encode(0).to_string(), "P");
    }

    #[test]
    fn round_trips() {
        for n in [0, 1, 2, 7, 255, 1 << 20, usize::MAX] {
            let rope = encode(n);
            let mut cursor = rope.cursor();
            assert_eq!(decode(&mut cursor), Some(n));
            assert!(cursor.at_end());
        }
    }
}
