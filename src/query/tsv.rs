//! Decoding of SPARQL tab-separated result sets.
//!
//! Row 1 is the header and is discarded. IRI cells arrive as `<...>`, literal
//! cells as `"..."` with an optional `^^<datatype>` or `@lang` suffix. Empty
//! cells are unbound variables.

/// One decoded result cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// An IRI, angle brackets removed.
    Iri(String),
    /// A literal's lexical form, quotes removed and escapes resolved.
    Literal(String),
    /// A bare token (number, boolean, blank node).
    Plain(String),
    /// Unbound variable.
    Unbound,
}

impl Cell {
    /// Parses a single raw TSV cell.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Unbound;
        }
        if let Some(inner) = raw.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
            return Self::Iri(inner.to_string());
        }
        if let Some(rest) = raw.strip_prefix('"')
            && let Some(end) = closing_quote(rest)
        {
            return Self::Literal(unescape(&rest[..end]));
        }
        Self::Plain(raw.to_string())
    }

    /// The cell's value regardless of kind; `None` when unbound.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Iri(v) | Self::Literal(v) | Self::Plain(v) => Some(v),
            Self::Unbound => None,
        }
    }

    /// The value if non-empty.
    #[must_use]
    pub fn non_empty(&self) -> Option<&str> {
        self.value().filter(|v| !v.is_empty())
    }
}

static UNBOUND: Cell = Cell::Unbound;

/// One result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsvRow {
    cells: Vec<Cell>,
}

impl TsvRow {
    /// Cell at `index`, or `Unbound` past the end of the row.
    #[must_use]
    pub fn get(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&UNBOUND)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Parses a tab-separated result set into rows, dropping the header and blank lines.
#[must_use]
pub fn parse_tsv(body: &str) -> Vec<TsvRow> {
    body.lines()
        .skip(1)
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(|line| TsvRow {
            cells: line.split('\t').map(Cell::parse).collect(),
        })
        .collect()
}

/// Byte offset of the first unescaped `"` in `s`.
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
