use std::ops::Range;

use endo_rope::{Cursor, Needle};

use crate::items::PatternItem;

/// A successful match: the matched span and the captured groups, numbered
/// in the order they close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    pub groups: Vec<Range<usize>>,
}

impl Match {
    pub fn group(&self, index: usize) -> Option<Range<usize>> {
        self.groups.get(index).cloned()
    }
}

/// Runs `pattern` against the rope from the cursor position.
///
/// Literal bases compare by base only; provenance is ignored.
///
/// # Panics
///
/// Panics on a group close with no open group. The parser never produces
/// such a pattern.
pub fn match_pattern(cursor: &mut Cursor<'_>, pattern: &[PatternItem]) -> Option<Match> {
    let start = cursor.index();
    let mut opens = Vec::new();
    let mut groups = Vec::new();
    for item in pattern {
        match item {
            PatternItem::Bases(bases) => {
                for expected in bases.bases() {
                    if cursor.next()?.base() != expected {
                        return None;
                    }
                }
            }
            PatternItem::Skip(n) => {
                if *n > cursor.remaining() {
                    return None;
                }
                cursor.advance(*n);
            }
            PatternItem::Search(needle) => {
                let needle = Needle::new(needle);
                let from = cursor.index();
                let at = needle.find_in(cursor, from)?;
                cursor.seek(at + needle.len());
            }
            PatternItem::Open => opens.push(cursor.index()),
            PatternItem::Close => match opens.pop() {
                Some(open) => groups.push(open..cursor.index()),
                None => unreachable!("group close without open"),
            },
        }
    }
    Some(Match {
        start,
        end: cursor.index(),
        groups,
    })
}
