//! Boyer-Moore substring search over a rope cursor.

use crate::cursor::Cursor;
use crate::rope::Rope;

/// A preprocessed search needle.
///
/// The haystack is read through a [`Cursor`], so consecutive reads in
/// the same leaf cost a slice lookup.
#[derive(Debug, Clone)]
pub struct Needle {
    ordinals: Vec<u8>,
    /// Shift keyed by the mismatched haystack base.
    bad_char: [usize; 4],
    /// Shift keyed by how many needle bases matched before the mismatch.
    good_suffix: Vec<usize>,
}

impl Needle {
    pub fn new(needle: &Rope) -> Needle {
        Needle::from_ordinals(needle.iter().map(|c| c.ordinal()).collect())
    }

    fn from_ordinals(ordinals: Vec<u8>) -> Needle {
        let bad_char = bad_char_table(&ordinals);
        let good_suffix = good_suffix_table(&ordinals);
        Needle {
            ordinals,
            bad_char,
            good_suffix,
        }
    }

    pub fn len(&self) -> usize {
        self.ordinals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordinals.is_empty()
    }

    /// First match position at or after `start`. The cursor position is not
    /// moved; only its finger is.
    pub fn find_in(&self, haystack: &mut Cursor<'_>, start: usize) -> Option<usize> {
        let len = self.ordinals.len();
        let total = haystack.len();
        if len == 0 {
            return (start <= total).then_some(start);
        }
        let mut i = start.checked_add(len - 1)?;
        while i < total {
            let mut j = len - 1;
            loop {
                let c = haystack.at(i)?.ordinal();
                if self.ordinals[j] == c {
                    if j == 0 {
                        return Some(i);
                    }
                    i -= 1;
                    j -= 1;
                    continue;
                }
                i += self.good_suffix[len - 1 - j].max(self.bad_char[c as usize]);
                break;
            }
        }
        None
    }
}

fn bad_char_table(needle: &[u8]) -> [usize; 4] {
    let len = needle.len();
    let mut table = [len; 4];
    for (i, &b) in needle.iter().enumerate().take(len.saturating_sub(1)) {
        table[b as usize] = len - 1 - i;
    }
    table
}

fn good_suffix_table(needle: &[u8]) -> Vec<usize> {
    let len = needle.len();
    let mut table = vec![0; len];
    let mut last_prefix = len;
    for i in (1..=len).rev() {
        if needle[i..] == needle[..len - i] {
            last_prefix = i;
        }
        table[len - i] = last_prefix - i + len;
    }
    for i in 0..len.saturating_sub(1) {
        let suffix = needle[..=i]
            .iter()
            .rev()
            .zip(needle.iter().rev())
            .take_while(|(a, b)| a == b)
            .count();
        table[suffix] = len - 1 - i + suffix;
    }
    table
}
