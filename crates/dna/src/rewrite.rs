//! Template expansion and write-back of a successful match.

use std::ops::Range;

use endo_rope::Rope;
use thiserror::Error;

use crate::config::SpliceStrategy;
use crate::escape::{protect, MAX_PROTECT_LEVEL};
use crate::items::TemplateItem;
use crate::matcher::Match;
use crate::nat;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("group {group} quoted at level {level}, limit is {}", MAX_PROTECT_LEVEL)]
    ProtectionTooDeep { group: usize, level: usize },
}

/// Expands template items against the captured groups of `dna`.
///
/// A missing group expands to nothing for a reference and to `P` (zero)
/// for a length. Quoting a non-empty group deeper than
/// [`MAX_PROTECT_LEVEL`] is an error.
pub fn expand(
    dna: &Rope,
    items: &[TemplateItem],
    groups: &[Range<usize>],
) -> Result<Rope, RewriteError> {
    let mut pieces = Vec::with_capacity(items.len());
    for item in items {
        let piece = match item {
            TemplateItem::Bases(bases) => bases.clone(),
            TemplateItem::Len(group) => {
                nat::encode(groups.get(*group).map_or(0, |g| g.len()))
            }
            TemplateItem::Ref { group, level } => match groups.get(*group) {
                Some(g) if g.is_empty() => Rope::new(),
                Some(_) if *level > MAX_PROTECT_LEVEL => {
                    return Err(RewriteError::ProtectionTooDeep {
                        group: *group,
                        level: *level,
                    });
                }
                Some(g) => protect(&dna.slice(g.start, g.end), *level),
                None => Rope::new(),
            },
        };
        pieces.push(piece);
    }
    Ok(Rope::concat(pieces))
}

/// Index of the unprotected reference with the widest group, earliest first.
fn widest_plain_ref(
    template: &[TemplateItem],
    groups: &[Range<usize>],
) -> Option<(usize, Range<usize>)> {
    let mut best: Option<(usize, Range<usize>)> = None;
    for (index, item) in template.iter().enumerate() {
        let TemplateItem::Ref { group, level: 0 } = item else {
            continue;
        };
        let Some(span) = groups.get(*group) else {
            continue;
        };
        if best.as_ref().map_or(true, |(_, b)| span.len() > b.len()) {
            best = Some((index, span.clone()));
        }
    }
    best
}

/// DNA after a rewrite, with the offsets where new text meets old.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub dna: Rope,
    /// Offsets into `dna` of every boundary between inserted and kept
    /// cells, ascending. May include `0` and `dna.len()`.
    pub seams: Vec<usize>,
}

/// Replaces `[0, m.end)` of `dna` with the expanded template.
pub fn splice(
    dna: &Rope,
    m: &Match,
    template: &[TemplateItem],
    strategy: SpliceStrategy,
) -> Result<Splice, RewriteError> {
    let kept = match strategy {
        SpliceStrategy::Collapse => widest_plain_ref(template, &m.groups),
        SpliceStrategy::Full => None,
    };
    match kept {
        Some((index, span)) => {
            let before = expand(dna, &template[..index], &m.groups)?;
            let after = expand(dna, &template[index + 1..], &m.groups)?;
            let group_end = before.len() + span.len();
            let seams = vec![before.len(), group_end, group_end + after.len()];
            let dna = dna
                .splice(span.end, m.end - span.end, &after)
                .splice(0, span.start, &before);
            Ok(Splice { dna, seams })
        }
        None => {
            let insert = expand(dna, template, &m.groups)?;
            let seams = vec![insert.len()];
            Ok(Splice {
                dna: dna.splice(0, m.end, &insert),
                seams,
            })
        }
    }
}

/// The DNA after replacing `[0, m.end)` with the expanded template.
pub fn replace(
    dna: &Rope,
    m: &Match,
    template: &[TemplateItem],
    strategy: SpliceStrategy,
) -> Result<Rope, RewriteError> {
    splice(dna, m, template, strategy).map(|s| s.dna)
}
