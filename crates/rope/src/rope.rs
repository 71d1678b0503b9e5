use std::fmt;
use std::iter::FromIterator;
use std::rc::Rc;
use std::str::FromStr;

use crate::base::{parse_bases, Base, Cell, ParseBaseError};
use crate::cursor::Cursor;
use crate::node::{self, Node};
use crate::search::Needle;

/// A persistent sequence of [`Cell`]s.
///
/// Cloning is O(1); every edit returns a new rope that shares the untouched
/// parts of the old one.
///
/// # Example
///
/// ```
/// use endo_rope::Rope;
///
/// let dna: Rope = "ICFPICFP".parse().unwrap();
/// let edited = dna.splice(2, 2, &"PP".parse().unwrap());
/// assert_eq!(edited.to_string(), "ICPPICFP");
/// assert_eq!(dna.to_string(), "ICFPICFP");
/// ```
#[derive(Clone, Default)]
pub struct Rope {
    root: Option<Rc<Node>>,
}

impl Rope {
    pub fn new() -> Rope {
        Rope { root: None }
    }

    fn from_root(root: Option<Rc<Node>>) -> Rope {
        Rope { root }
    }

    /// Builds a balanced rope whose leaves are views over `cells`.
    pub fn from_cells(cells: Vec<Cell>) -> Rope {
        let len = cells.len();
        let buf: Rc<[Cell]> = cells.into();
        Rope::from_root(node::build(&buf, 0, len))
    }

    /// Builds a rope of synthesized cells.
    pub fn from_bases<I: IntoIterator<Item = Base>>(bases: I) -> Rope {
        bases.into_iter().map(Cell::synthetic).collect()
    }

    pub(crate) fn root(&self) -> Option<&Rc<Node>> {
        self.root.as_ref()
    }

    pub fn len(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.len())
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn depth(&self) -> u32 {
        self.root.as_ref().map_or(0, |n| n.depth())
    }

    /// Cell at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn at(&self, index: usize) -> Cell {
        match self.get(index) {
            Some(cell) => cell,
            None => panic!("index {index} out of range for rope of length {}", self.len()),
        }
    }

    pub fn get(&self, index: usize) -> Option<Cell> {
        let mut node = self.root.as_deref()?;
        let mut index = index;
        if index >= node.len() {
            return None;
        }
        loop {
            match node {
                Node::Leaf(leaf) => return leaf.cells().get(index).copied(),
                Node::Concat(c) => {
                    let mid = c.left.len();
                    if index < mid {
                        node = &*c.left;
                    } else {
                        index -= mid;
                        node = &*c.right;
                    }
                }
            }
        }
    }

    /// Cells in `[start, end)`; both bounds are clamped to the length.
    pub fn slice(&self, start: usize, end: usize) -> Rope {
        match &self.root {
            Some(root) => Rope::from_root(node::slice(root, start, end)),
            None => Rope::new(),
        }
    }

    /// Replaces `len` cells at `start` with `insert`. Bounds are clamped.
    pub fn splice(&self, start: usize, len: usize, insert: &Rope) -> Rope {
        let total = self.len();
        let start = start.min(total);
        let end = start.saturating_add(len).min(total);
        let head = self.slice(0, start);
        let tail = self.slice(end, total);
        head.append(insert).append(&tail)
    }

    /// Concatenation of `self` and `right`.
    pub fn append(&self, right: &Rope) -> Rope {
        Rope::from_root(node::join_opt(self.root.clone(), right.root.clone()))
    }

    /// Concatenates many ropes, regrouping them by Fibonacci slot.
    pub fn concat<I: IntoIterator<Item = Rope>>(pieces: I) -> Rope {
        Rope::from_root(node::rebalance(pieces.into_iter().filter_map(|r| r.root)))
    }

    /// Rebuilds any part of the tree that falls below the length floor.
    pub fn rebalanced(&self) -> Rope {
        Rope::from_root(node::rebalance(self.root.clone()))
    }

    /// Whether every node satisfies `len >= fib(depth - 2) * LEAF_SIZE`.
    pub fn is_balanced(&self) -> bool {
        self.root.as_deref().map_or(true, node::is_balanced)
    }

    /// Position of the first occurrence of `needle` at or after `start`.
    pub fn find(&self, needle: &Rope, start: usize) -> Option<usize> {
        let needle = Needle::new(needle);
        needle.find_in(&mut self.cursor(), start)
    }

    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    pub fn iter(&self) -> Cells<'_> {
        Cells {
            stack: self.root.as_deref().into_iter().collect(),
            leaf: [].iter(),
            remaining: self.len(),
        }
    }

    pub fn bases(&self) -> impl Iterator<Item = Base> + '_ {
        self.iter().map(Cell::base)
    }

    pub fn to_cells(&self) -> Vec<Cell> {
        let mut out = Vec::with_capacity(self.len());
        if let Some(root) = &self.root {
            node::collect_into(root, &mut out);
        }
        out
    }
}

/// Iterator over the cells of a rope, walking leaves left to right.
pub struct Cells<'a> {
    stack: Vec<&'a Node>,
    leaf: std::slice::Iter<'a, Cell>,
    remaining: usize,
}

impl Iterator for Cells<'_> {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        loop {
            if let Some(cell) = self.leaf.next() {
                self.remaining -= 1;
                return Some(*cell);
            }
            match self.stack.pop()? {
                Node::Leaf(leaf) => self.leaf = leaf.cells().iter(),
                Node::Concat(c) => {
                    self.stack.push(&c.right);
                    self.stack.push(&c.left);
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Cells<'_> {}

impl<'a> IntoIterator for &'a Rope {
    type Item = Cell;
    type IntoIter = Cells<'a>;

    fn into_iter(self) -> Cells<'a> {
        self.iter()
    }
}

impl FromIterator<Cell> for Rope {
    fn from_iter<T: IntoIterator<Item = Cell>>(iter: T) -> Rope {
        Rope::from_cells(iter.into_iter().collect())
    }
}

impl FromIterator<Base> for Rope {
    fn from_iter<T: IntoIterator<Item = Base>>(iter: T) -> Rope {
        Rope::from_bases(iter)
    }
}

impl From<Vec<Cell>> for Rope {
    fn from(cells: Vec<Cell>) -> Rope {
        Rope::from_cells(cells)
    }
}

impl FromStr for Rope {
    type Err = ParseBaseError;

    fn from_str(s: &str) -> Result<Rope, ParseBaseError> {
        parse_bases(s).map(Rope::from_cells)
    }
}

impl PartialEq for Rope {
    fn eq(&self, other: &Rope) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for Rope {}

impl fmt::Display for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for base in self.bases() {
            write!(f, "{base}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Rope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 64;
        let head: String = self.bases().take(PREVIEW).map(Base::to_char).collect();
        if self.len() > PREVIEW {
            write!(f, "Rope({head}… len={})", self.len())
        } else {
            write!(f, "Rope({head})")
        }
    }
}
