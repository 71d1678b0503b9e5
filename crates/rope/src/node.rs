//! Tree nodes and the structural algorithms behind [`Rope`](crate::Rope).
//!
//! Nodes are immutable and shared through `Rc`; every operation builds new
//! spine nodes and reuses untouched subtrees.

use std::rc::Rc;

use crate::base::Cell;

/// Target leaf length. Joins shorter than this are flattened into one leaf.
pub const LEAF_SIZE: usize = 512;

#[derive(Debug)]
pub(crate) enum Node {
    Leaf(Leaf),
    Concat(Concat),
}

/// A window into a shared cell buffer.
#[derive(Debug)]
pub(crate) struct Leaf {
    buf: Rc<[Cell]>,
    start: usize,
    end: usize,
}

impl Leaf {
    #[inline]
    pub(crate) fn cells(&self) -> &[Cell] {
        &self.buf[self.start..self.end]
    }
}

#[derive(Debug)]
pub(crate) struct Concat {
    pub(crate) left: Rc<Node>,
    pub(crate) right: Rc<Node>,
    pub(crate) len: usize,
    pub(crate) depth: u32,
}

impl Node {
    #[inline]
    pub(crate) fn len(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.end - leaf.start,
            Node::Concat(concat) => concat.len,
        }
    }

    #[inline]
    pub(crate) fn depth(&self) -> u32 {
        match self {
            Node::Leaf(_) => 0,
            Node::Concat(concat) => concat.depth,
        }
    }
}

fn leaf(buf: Rc<[Cell]>, start: usize, end: usize) -> Rc<Node> {
    debug_assert!(start < end && end <= buf.len());
    Rc::new(Node::Leaf(Leaf { buf, start, end }))
}

/// Joins two nodes without any balancing.
pub(crate) fn concat_raw(left: Rc<Node>, right: Rc<Node>) -> Rc<Node> {
    let len = left.len() + right.len();
    let depth = left.depth().max(right.depth()) + 1;
    Rc::new(Node::Concat(Concat { left, right, len, depth }))
}

fn children(node: &Rc<Node>) -> (Rc<Node>, Rc<Node>) {
    match &**node {
        Node::Concat(c) => (c.left.clone(), c.right.clone()),
        Node::Leaf(_) => unreachable!("rotation reached a leaf"),
    }
}

/// Builds a balanced tree of leaf views over `buf[start..end]`.
pub(crate) fn build(buf: &Rc<[Cell]>, start: usize, end: usize) -> Option<Rc<Node>> {
    if start >= end {
        return None;
    }
    if end - start <= LEAF_SIZE {
        return Some(leaf(buf.clone(), start, end));
    }
    let mid = start + (end - start) / 2;
    let left = build(buf, start, mid)?;
    let right = build(buf, mid, end)?;
    Some(concat_raw(left, right))
}

pub(crate) fn collect_into(node: &Node, out: &mut Vec<Cell>) {
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        match node {
            Node::Leaf(leaf) => out.extend_from_slice(leaf.cells()),
            Node::Concat(c) => {
                stack.push(&c.right);
                stack.push(&c.left);
            }
        }
    }
}

fn flatten(left: &Node, right: &Node) -> Rc<Node> {
    let mut cells = Vec::with_capacity(left.len() + right.len());
    collect_into(left, &mut cells);
    collect_into(right, &mut cells);
    let end = cells.len();
    leaf(cells.into(), 0, end)
}

/// Concatenates two non-empty trees, rotating until the child depths differ
/// by at most one.
pub(crate) fn join(left: Rc<Node>, right: Rc<Node>) -> Rc<Node> {
    if left.len() + right.len() < LEAF_SIZE {
        return flatten(&left, &right);
    }
    let (mut left, mut right) = (left, right);
    loop {
        let (dl, dr) = (left.depth(), right.depth());
        if dl.abs_diff(dr) <= 1 {
            break;
        }
        if dl > dr {
            let (ll, lr) = children(&left);
            if lr.depth() > ll.depth() {
                let (lrl, lrr) = children(&lr);
                left = join(ll, lrl);
                right = join(lrr, right);
            } else {
                left = ll;
                right = join(lr, right);
            }
        } else {
            let (rl, rr) = children(&right);
            if rl.depth() > rr.depth() {
                let (rll, rlr) = children(&rl);
                left = join(left, rll);
                right = join(rlr, rr);
            } else {
                left = join(left, rl);
                right = rr;
            }
        }
    }
    concat_raw(left, right)
}

pub(crate) fn join_opt(left: Option<Rc<Node>>, right: Option<Rc<Node>>) -> Option<Rc<Node>> {
    match (left, right) {
        (Some(l), Some(r)) => Some(join(l, r)),
        (l, None) => l,
        (None, r) => r,
    }
}

/// Sub-tree covering `[start, end)` of `node`, clamped to its length.
pub(crate) fn slice(node: &Rc<Node>, start: usize, end: usize) -> Option<Rc<Node>> {
    let len = node.len();
    let end = end.min(len);
    if start >= end {
        return None;
    }
    if start == 0 && end == len {
        return Some(node.clone());
    }
    match &**node {
        Node::Leaf(l) => Some(leaf(l.buf.clone(), l.start + start, l.start + end)),
        Node::Concat(c) => {
            let mid = c.left.len();
            if end <= mid {
                slice(&c.left, start, end)
            } else if start >= mid {
                slice(&c.right, start - mid, end - mid)
            } else {
                join_opt(slice(&c.left, start, mid), slice(&c.right, 0, end - mid))
            }
        }
    }
}

// ── Fibonacci balance ────────────────────────────────────────────────────

/// `1, 2, 3, 5, 8, …`
pub(crate) fn fib(i: u32) -> usize {
    let (mut a, mut b) = (1usize, 2usize);
    for _ in 0..i {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}

/// Smallest length a node of `depth` may have.
pub(crate) fn min_len(depth: u32) -> usize {
    if depth < 2 {
        0
    } else {
        fib(depth - 2).saturating_mul(LEAF_SIZE)
    }
}

fn slot(len: usize) -> u32 {
    let mut i = 0;
    while len >= fib(i).saturating_mul(LEAF_SIZE) {
        i += 1;
    }
    i
}

fn within_floor(node: &Node) -> bool {
    node.len() >= min_len(node.depth())
}

/// Regroups `pieces` (left to right) so that the result respects the
/// Fibonacci floor. Pieces whose root already respects it are kept whole.
pub(crate) fn rebalance<I>(pieces: I) -> Option<Rc<Node>>
where
    I: IntoIterator<Item = Rc<Node>>,
{
    let mut seq: Vec<(u32, Rc<Node>)> = Vec::new();
    let mut pending: Vec<Rc<Node>> = Vec::new();
    for piece in pieces {
        pending.push(piece);
        while let Some(node) = pending.pop() {
            if let (Node::Concat(c), false) = (&*node, within_floor(&node)) {
                pending.push(c.right.clone());
                pending.push(c.left.clone());
                continue;
            }
            let mut node = node;
            let mut s = slot(node.len());
            while seq.last().is_some_and(|(top, _)| *top <= s) {
                if let Some((_, prev)) = seq.pop() {
                    node = join(prev, node);
                    s = slot(node.len());
                }
            }
            seq.push((s, node));
        }
    }
    let (_, mut acc) = seq.pop()?;
    while let Some((_, prev)) = seq.pop() {
        acc = join(prev, acc);
    }
    Some(acc)
}

/// Checks bookkeeping and the Fibonacci floor on every node.
pub(crate) fn is_balanced(node: &Node) -> bool {
    match node {
        Node::Leaf(leaf) => !leaf.cells().is_empty(),
        Node::Concat(c) => {
            c.left.len() > 0
                && c.right.len() > 0
                && c.len == c.left.len() + c.right.len()
                && c.depth == c.left.depth().max(c.right.depth()) + 1
                && within_floor(node)
                && is_balanced(&c.left)
                && is_balanced(&c.right)
        }
    }
}
