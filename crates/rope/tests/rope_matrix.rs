//! Property tests for rope structure, cursor reads and search.

use endo_rope::{Base, Cell, Rope, LEAF_SIZE};
use proptest::prelude::*;

fn dna(max: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('I'), Just('C'), Just('F'), Just('P')], 0..max)
        .prop_map(|chars| chars.into_iter().collect())
}

/// Rope for `text` assembled from pieces of the given sizes.
fn assemble(text: &str, cuts: &[usize]) -> Rope {
    let mut pieces = Vec::new();
    let mut at = 0;
    for &cut in cuts {
        if at >= text.len() {
            break;
        }
        let end = (at + cut.max(1)).min(text.len());
        pieces.push(text[at..end].parse::<Rope>().unwrap());
        at = end;
    }
    if at < text.len() {
        pieces.push(text[at..].parse::<Rope>().unwrap());
    }
    pieces.iter().fold(Rope::new(), |acc, piece| acc.append(piece))
}

fn naive_find(haystack: &str, needle: &str, start: usize) -> Option<usize> {
    if start > haystack.len() {
        return None;
    }
    haystack[start..].find(needle).map(|i| i + start)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn round_trips_text(text in dna(3000), cuts in proptest::collection::vec(1usize..400, 0..40)) {
        let rope = assemble(&text, &cuts);
        prop_assert_eq!(rope.len(), text.len());
        prop_assert_eq!(rope.to_string(), text);
        prop_assert!(rope.is_balanced());
    }

    #[test]
    fn slice_matches_substring(text in dna(2500), a in 0usize..2600, b in 0usize..2600) {
        let rope: Rope = text.parse().unwrap();
        let (start, end) = (a.min(b), a.max(b));
        let expected = if start >= text.len() { "" } else { &text[start..end.min(text.len())] };
        let slice = rope.slice(start, end);
        prop_assert_eq!(slice.to_string(), expected);
        prop_assert!(slice.is_balanced());
    }

    #[test]
    fn splice_with_own_slice_is_identity(
        text in dna(2500),
        start in 0usize..2500,
        len in 0usize..800,
    ) {
        let rope: Rope = text.parse().unwrap();
        let start = start.min(text.len());
        let same = rope.splice(start, len, &rope.slice(start, start + len));
        prop_assert_eq!(&same, &rope);
        prop_assert!(same.is_balanced());
    }

    #[test]
    fn splice_matches_string_edit(
        text in dna(2000),
        insert in dna(700),
        start in 0usize..2000,
        len in 0usize..700,
    ) {
        let rope: Rope = text.parse().unwrap();
        let spliced = rope.splice(start, len, &insert.parse().unwrap());
        let start = start.min(text.len());
        let end = (start + len).min(text.len());
        let expected = format!("{}{}{}", &text[..start], insert, &text[end..]);
        prop_assert_eq!(spliced.to_string(), expected);
        prop_assert!(spliced.is_balanced());
    }

    #[test]
    fn concat_keeps_order_and_balance(parts in proptest::collection::vec(dna(300), 0..60)) {
        let rope = Rope::concat(parts.iter().map(|p| p.parse::<Rope>().unwrap()));
        prop_assert_eq!(rope.to_string(), parts.concat());
        prop_assert!(rope.is_balanced());
    }

    #[test]
    fn cursor_agrees_with_get(
        text in dna(3000),
        cuts in proptest::collection::vec(1usize..200, 0..50),
        seeks in proptest::collection::vec(0usize..3100, 1..60),
    ) {
        let rope = assemble(&text, &cuts);
        let mut cursor = rope.cursor();
        for index in seeks {
            cursor.seek(index);
            let expected = rope.get(index);
            prop_assert_eq!(cursor.peek(), expected);
            prop_assert_eq!(cursor.peek2(), rope.get(index + 1));
            prop_assert_eq!(cursor.index(), index.min(text.len()));
        }
    }

    #[test]
    fn find_agrees_with_naive(
        text in dna(1500),
        needle in dna(12),
        start in 0usize..1600,
        cuts in proptest::collection::vec(1usize..100, 0..30),
    ) {
        let hay = assemble(&text, &cuts);
        let found = hay.find(&needle.parse().unwrap(), start);
        prop_assert_eq!(found, naive_find(&text, &needle, start));
    }
}

#[test]
fn find_in_long_repetitive_haystack() {
    let mut text = "IC".repeat(LEAF_SIZE * 4);
    text.push_str("ICCF");
    text.push_str(&"IC".repeat(100));
    let rope = assemble(&text, &[LEAF_SIZE - 3; 20]);
    let needle: Rope = "ICICCF".parse().unwrap();
    assert_eq!(rope.find(&needle, 0), Some(LEAF_SIZE * 8 - 2));
    assert_eq!(rope.find(&needle, LEAF_SIZE * 8), None);
}

#[test]
fn long_append_chain_stays_shallow() {
    let piece: Rope = "ICFP".repeat(25).parse().unwrap();
    let mut rope = Rope::new();
    for _ in 0..2000 {
        rope = rope.append(&piece);
    }
    assert_eq!(rope.len(), 200_000);
    assert!(rope.is_balanced());
    assert!(rope.depth() < 20, "depth {}", rope.depth());
}

#[test]
fn provenance_survives_edits() {
    let rope: Rope = "ICFPICFPICFP".parse().unwrap();
    let edited = rope.splice(4, 4, &Rope::from_bases([Base::P, Base::P]));
    let cells: Vec<Cell> = edited.iter().collect();
    assert_eq!(cells.len(), 10);
    assert_eq!(cells[3].addr(), 3);
    assert!(cells[4].is_synthetic());
    assert!(cells[5].is_synthetic());
    assert_eq!(cells[6].addr(), 8);
}
