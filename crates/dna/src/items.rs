use std::fmt;

use endo_rope::Rope;

/// One element of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternItem {
    /// Bases that must appear next, compared by base only.
    Bases(Rope),
    /// Skip exactly this many bases.
    Skip(usize),
    /// Move past the next occurrence of the needle.
    Search(Rope),
    Open,
    Close,
}

/// One element of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateItem {
    Bases(Rope),
    /// Length of a group, as a nat.
    Len(usize),
    /// Contents of a group, protected `level` times.
    Ref { group: usize, level: usize },
}

impl fmt::Display for PatternItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternItem::Bases(bases) => write!(f, "{bases}"),
            PatternItem::Skip(n) => write!(f, "!{n}"),
            PatternItem::Search(needle) => write!(f, "?<{needle}>"),
            PatternItem::Open => f.write_str("("),
            PatternItem::Close => f.write_str(")"),
        }
    }
}

impl fmt::Display for TemplateItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateItem::Bases(bases) => write!(f, "{bases}"),
            TemplateItem::Len(group) => write!(f, "|{group}|"),
            TemplateItem::Ref { group, level } if *level < 5 => {
                write!(f, "${}{group}", "\\".repeat(*level))
            }
            TemplateItem::Ref { group, level } => write!(f, "${level}\\{group}"),
        }
    }
}

/// Space-separated rendering of a pattern or template, for logs.
pub struct Items<'a, T>(pub &'a [T]);

impl<T: fmt::Display> fmt::Display for Items<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}
