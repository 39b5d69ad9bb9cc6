use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, trace};

use crate::grammar::Grammar;
use crate::rules::Symbol;
use crate::table::Table;

/// Recognition chart: for every span, the set of non-terminals that derive
/// exactly the words in that span.
#[derive(Debug, Clone)]
pub struct Chart<'g> {
  grammar: &'g Grammar,
  table: Table<BTreeSet<Symbol>>,
}

impl<'g> Chart<'g> {
  /// Number of words the chart was filled for
  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  /// Non-terminals deriving words `i..j`. Panics if the span isn't `0 <= i < j <= len`.
  pub fn cell(&self, i: usize, j: usize) -> &BTreeSet<Symbol> {
    self.table.get(i, j)
  }

  /// Names of the non-terminals in cell `i..j`, sorted by name
  pub fn names_at(&self, i: usize, j: usize) -> Vec<&'g str> {
    let mut names = self
      .cell(i, j)
      .iter()
      .map(|s| self.grammar.name(*s))
      .collect::<Vec<_>>();
    names.sort_unstable();
    names
  }

  /// Whether `symbol` derives the whole sentence. Always false for an empty sentence.
  pub fn derives(&self, symbol: Symbol) -> bool {
    !self.is_empty() && self.cell(0, self.len()).contains(&symbol)
  }

  /// Whether the grammar's start symbol derives the whole sentence
  pub fn accepts(&self) -> bool {
    self.derives(self.grammar.start())
  }
}

impl fmt::Display for Chart<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for len in 1..=self.len() {
      writeln!(f, "Length {}:", len)?;
      for (i, j) in self.table.spans_of_len(len) {
        write!(f, "  {}..{}:", i, j)?;
        for name in self.names_at(i, j) {
          write!(f, " {}", name)?;
        }
        writeln!(f)?;
      }
    }
    Ok(())
  }
}

/// Fills a recognition chart for `input` bottom-up, by increasing span length.
pub fn recognize<'g>(g: &'g Grammar, input: &[&str]) -> Chart<'g> {
  let n = input.len();
  let mut table: Table<BTreeSet<Symbol>> = Table::new(n);

  for (i, word) in input.iter().enumerate() {
    let cell = g.lexical(word).iter().map(|(p, _)| *p).collect::<BTreeSet<_>>();
    if cell.is_empty() {
      debug!(word, position = i, "no lexical rule for word");
    }
    table.set(i, i + 1, cell);
  }

  for len in 2..=n {
    for (i, j) in table.spans_of_len(len) {
      let mut cell = BTreeSet::new();
      for k in (i + 1)..j {
        let left = table.get(i, k);
        let right = table.get(k, j);
        for &b in left.iter() {
          for &c in right.iter() {
            cell.extend(g.binary(b, c).iter().map(|(p, _)| *p));
          }
        }
      }
      trace!(i, j, size = cell.len(), "filled cell");
      table.set(i, j, cell);
    }
  }

  Chart { grammar: g, table }
}
