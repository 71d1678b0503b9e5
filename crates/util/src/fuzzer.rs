use std::cell::RefCell;

use endo_rope::{Base, Cell, Rope};
use rand::{rngs::OsRng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// A fuzzer for generating random DNA test data.
///
/// Uses the xoshiro256** PRNG for reproducible random sequences when seeded.
///
/// # Examples
///
/// ```
/// use endo_util::Fuzzer;
///
/// let fuzzer = Fuzzer::from_u64(7);
/// let text = fuzzer.dna(100);
/// assert_eq!(text.len(), 100);
///
/// let rope = fuzzer.fragmented(&text, 9);
/// assert_eq!(rope.to_string(), text);
/// ```
pub struct Fuzzer {
    /// The seed used to initialize the PRNG.
    pub seed: [u8; 32],
    rng: RefCell<Xoshiro256StarStar>,
}

impl Fuzzer {
    /// Create a new fuzzer with an optional seed.
    ///
    /// If no seed is provided, a random seed is drawn from `OsRng`.
    pub fn new(seed: Option<[u8; 32]>) -> Self {
        let seed = seed.unwrap_or_else(|| {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            bytes
        });
        Self {
            seed,
            rng: RefCell::new(Xoshiro256StarStar::from_seed(seed)),
        }
    }

    /// Create a fuzzer whose seed is the little-endian `seed` repeated.
    pub fn from_u64(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        for chunk in bytes.chunks_mut(8) {
            chunk.copy_from_slice(&seed.to_le_bytes());
        }
        Self::new(Some(bytes))
    }

    /// Random integer in `[min, max]` (inclusive).
    pub fn random_int(&self, min: usize, max: usize) -> usize {
        self.rng.borrow_mut().gen_range(min..=max)
    }

    /// Random boolean with the given probability of being true.
    pub fn random_bool(&self, probability: f64) -> bool {
        self.rng.borrow_mut().gen_bool(probability)
    }

    /// Pick a random element from a non-empty slice.
    pub fn pick<'a, T>(&self, elements: &'a [T]) -> &'a T {
        let idx = self.rng.borrow_mut().gen_range(0..elements.len());
        &elements[idx]
    }

    pub fn base(&self) -> Base {
        *self.pick(&Base::ALL)
    }

    /// Random DNA text of exactly `len` bases.
    pub fn dna(&self, len: usize) -> String {
        (0..len).map(|_| self.base().to_char()).collect()
    }

    /// Random DNA text where `I` appears with probability `i_weight`.
    ///
    /// Programs rich in `I` parse into more opcodes and fewer literals.
    pub fn dna_weighted(&self, len: usize, i_weight: f64) -> String {
        (0..len)
            .map(|_| {
                if self.random_bool(i_weight) {
                    'I'
                } else {
                    *self.pick(&['C', 'F', 'P'])
                }
            })
            .collect()
    }

    /// Rope for `text` built by appending pieces of 1..=`max_piece` bases.
    ///
    /// Addresses still count from the start of `text`.
    ///
    /// # Panics
    ///
    /// Panics if `text` holds anything but `I`, `C`, `F`, `P`.
    pub fn fragmented(&self, text: &str, max_piece: usize) -> Rope {
        let cells: Vec<Cell> = text
            .chars()
            .enumerate()
            .map(|(i, ch)| match Base::from_char(ch) {
                Some(base) => Cell::source(base, i),
                None => panic!("not a base: {ch:?}"),
            })
            .collect();
        let mut rope = Rope::new();
        let mut at = 0;
        while at < cells.len() {
            let end = (at + self.random_int(1, max_piece.max(1))).min(cells.len());
            rope = rope.append(&Rope::from_cells(cells[at..end].to_vec()));
            at = end;
        }
        rope
    }
}
