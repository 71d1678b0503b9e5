//! Sequential reader over a [`Rope`] with a cached leaf finger.

use crate::base::Cell;
use crate::node::{Concat, Node};
use crate::rope::Rope;

#[derive(Clone, Copy)]
struct Frame<'a> {
    node: &'a Concat,
    start: usize,
}

impl<'a> Frame<'a> {
    fn covers(&self, index: usize) -> bool {
        index >= self.start && index < self.start + self.node.len
    }

    fn child_for(&self, index: usize) -> (&'a Node, usize) {
        let mid = self.start + self.node.left.len();
        if index < mid {
            (&*self.node.left, self.start)
        } else {
            (&*self.node.right, mid)
        }
    }
}

/// A position in a rope plus the path from the root to the leaf holding it.
///
/// Reads inside the current leaf are plain slice lookups. Moving to another
/// leaf climbs only as far as the nearest ancestor covering the target.
///
/// ```
/// use endo_rope::{Base, Rope};
///
/// let dna: Rope = "ICFP".parse().unwrap();
/// let mut cursor = dna.cursor();
/// assert_eq!(cursor.next().map(|c| c.base()), Some(Base::I));
/// assert_eq!(cursor.peek2().map(|c| c.base()), Some(Base::F));
/// assert_eq!(cursor.suffix().to_string(), "CFP");
/// ```
#[derive(Clone)]
pub struct Cursor<'a> {
    rope: &'a Rope,
    path: Vec<Frame<'a>>,
    leaf: &'a [Cell],
    leaf_start: usize,
    index: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(rope: &'a Rope) -> Cursor<'a> {
        Cursor {
            rope,
            path: Vec::new(),
            leaf: &[],
            leaf_start: 0,
            index: 0,
        }
    }

    pub fn rope(&self) -> &'a Rope {
        self.rope
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rope.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.is_empty()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.index)
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.index >= self.len()
    }

    /// Moves to `index`, clamped to the rope length.
    pub fn seek(&mut self, index: usize) {
        self.index = index.min(self.len());
    }

    pub fn skip(&mut self, delta: isize) {
        self.seek(self.index.saturating_add_signed(delta));
    }

    pub fn advance(&mut self, count: usize) {
        self.seek(self.index.saturating_add(count));
    }

    /// Points the finger at the leaf holding `index`.
    fn locate(&mut self, index: usize) -> bool {
        if index >= self.leaf_start && index - self.leaf_start < self.leaf.len() {
            return true;
        }
        if index >= self.len() {
            return false;
        }
        while self.path.last().is_some_and(|frame| !frame.covers(index)) {
            self.path.pop();
        }
        let (mut node, mut start) = match self.path.last() {
            Some(frame) => frame.child_for(index),
            None => match self.rope.root() {
                Some(root) => (&**root, 0),
                None => return false,
            },
        };
        loop {
            match node {
                Node::Leaf(leaf) => {
                    self.leaf = leaf.cells();
                    self.leaf_start = start;
                    return true;
                }
                Node::Concat(concat) => {
                    let frame = Frame { node: concat, start };
                    self.path.push(frame);
                    (node, start) = frame.child_for(index);
                }
            }
        }
    }

    /// Cell at absolute `index`, leaving the cursor position alone.
    pub fn at(&mut self, index: usize) -> Option<Cell> {
        if self.locate(index) {
            Some(self.leaf[index - self.leaf_start])
        } else {
            None
        }
    }

    pub fn peek(&mut self) -> Option<Cell> {
        self.at(self.index)
    }

    pub fn peek2(&mut self) -> Option<Cell> {
        self.at(self.index.checked_add(1)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Cell> {
        let cell = self.at(self.index)?;
        self.index += 1;
        Some(cell)
    }

    pub fn prev(&mut self) -> Option<Cell> {
        let index = self.index.checked_sub(1)?;
        self.index = index;
        self.at(index)
    }

    /// Moves just past the next occurrence of `needle`.
    ///
    /// Leaves the position unchanged and returns `false` when there is none.
    pub fn find(&mut self, needle: &Rope) -> bool {
        let needle = crate::search::Needle::new(needle);
        let from = self.index;
        match needle.find_in(self, from) {
            Some(at) => {
                self.seek(at + needle.len());
                true
            }
            None => false,
        }
    }

    /// Takes the next `count` cells, or `None` without moving if fewer remain.
    pub fn slice(&mut self, count: usize) -> Option<Rope> {
        if self.remaining() < count {
            return None;
        }
        let out = self.rope.slice(self.index, self.index + count);
        self.index += count;
        Some(out)
    }

    /// Everything from the current position to the end.
    pub fn suffix(&self) -> Rope {
        self.rope.slice(self.index, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Base;

    /// `text` split into ropes of `piece` cells, joined back together.
    fn fragmented(text: &str, piece: usize) -> Rope {
        text.as_bytes()
            .chunks(piece)
            .map(|chunk| std::str::from_utf8(chunk).unwrap().parse::<Rope>().unwrap())
            .fold(Rope::new(), |acc, r| acc.append(&r))
    }

    fn text(n: usize) -> String {
        (0..n).map(|i| "ICFP".as_bytes()[(i ^ (i >> 3)) % 4] as char).collect()
    }

    fn ch(cell: Option<Cell>) -> Option<char> {
        cell.map(|c| c.base().to_char())
    }

    #[test]
    fn empty_rope_cursor() {
        let rope = Rope::new();
        let mut cursor = rope.cursor();
        assert!(cursor.at_end());
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.prev(), None);
        assert!(cursor.suffix().is_empty());
    }

    #[test]
    fn next_walks_across_leaves() {
        let source = text(3000);
        let rope = fragmented(&source, 7);
        let mut cursor = rope.cursor();
        let read: String = std::iter::from_fn(|| cursor.next())
            .map(|c| c.base().to_char())
            .collect();
        assert_eq!(read, source);
        assert!(cursor.at_end());
    }

    #[test]
    fn prev_walks_back_across_leaves() {
        let source = text(2000);
        let rope = fragmented(&source, 5);
        let mut cursor = rope.cursor();
        cursor.seek(rope.len());
        let mut read: Vec<char> = std::iter::from_fn(|| cursor.prev())
            .map(|c| c.base().to_char())
            .collect();
        read.reverse();
        assert_eq!(read.into_iter().collect::<String>(), source);
        assert_eq!(cursor.index(), 0);
    }

    #[test]
    fn seek_matches_random_access() {
        let source = text(5000);
        let bytes = source.as_bytes();
        let rope = fragmented(&source, 13);
        let mut cursor = rope.cursor();
        for i in (0..5000).step_by(97).chain((0..5000).rev().step_by(211)) {
            cursor.seek(i);
            assert_eq!(ch(cursor.peek()), Some(bytes[i] as char), "at {i}");
            assert_eq!(ch(cursor.peek2()), bytes.get(i + 1).map(|&b| b as char));
        }
        cursor.seek(10_000);
        assert_eq!(cursor.index(), 5000);
    }

    #[test]
    fn peek2_crosses_leaf_boundary() {
        let rope = fragmented("ICFPICFP", 1);
        let mut cursor = rope.cursor();
        for i in 0..7 {
            cursor.seek(i);
            assert_eq!(cursor.peek2(), Some(rope.at(i + 1)));
        }
        cursor.seek(7);
        assert_eq!(cursor.peek2(), None);
    }

    #[test]
    fn skip_moves_both_ways() {
        let rope: Rope = "ICFPICFP".parse().unwrap();
        let mut cursor = rope.cursor();
        cursor.skip(5);
        assert_eq!(cursor.index(), 5);
        cursor.skip(-3);
        assert_eq!(cursor.index(), 2);
        cursor.skip(-10);
        assert_eq!(cursor.index(), 0);
        cursor.skip(100);
        assert_eq!(cursor.index(), 8);
    }

    #[test]
    fn find_moves_past_match() {
        let rope = fragmented("ICFPIICFCPFIICICFC", 2);
        let needle: Rope = "IIC".parse().unwrap();
        let mut cursor = rope.cursor();
        assert!(cursor.find(&needle));
        assert_eq!(cursor.index(), 7);
        assert!(cursor.find(&needle));
        assert_eq!(cursor.index(), 14);
        assert!(!cursor.find(&needle));
        assert_eq!(cursor.index(), 14);
    }

    #[test]
    fn slice_takes_exact_counts() {
        let rope: Rope = "ICFPICFP".parse().unwrap();
        let mut cursor = rope.cursor();
        cursor.seek(2);
        assert_eq!(cursor.slice(3).map(|r| r.to_string()), Some("FPI".to_string()));
        assert_eq!(cursor.index(), 5);
        assert_eq!(cursor.slice(4), None);
        assert_eq!(cursor.index(), 5);
        assert_eq!(cursor.slice(3).map(|r| r.to_string()), Some("CFP".to_string()));
        assert_eq!(cursor.slice(0), Some(Rope::new()));
    }

    #[test]
    fn at_does_not_move() {
        let rope = fragmented(&text(1200), 50);
        let mut cursor = rope.cursor();
        cursor.seek(3);
        assert_eq!(cursor.at(1100), Some(rope.at(1100)));
        assert_eq!(cursor.at(1200), None);
        assert_eq!(cursor.index(), 3);
        assert_eq!(cursor.next().map(Cell::base), Some(rope.at(3).base()));
        assert_eq!(rope.at(0).base(), Base::I);
    }
}
