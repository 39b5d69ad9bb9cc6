use std::collections::BTreeMap;
use std::fmt;

use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::grammar::Grammar;
use crate::rules::Symbol;
use crate::syntree::{Constituent, SynTree, Word};
use crate::table::Table;

/// Totally ordered probability, so scores can be compared without NaN surprises
pub type Prob = OrderedFloat<f64>;

/// How the best score for a (span, non-terminal) pair was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpointer {
  /// `X -> word`, only on spans of length 1
  Lexical,
  /// `X -> left right`, with `left` over `i..split` and `right` over `split..j`
  Binary {
    split: usize,
    left: Symbol,
    right: Symbol,
  },
}

/// Returned when a non-terminal has no derivation over a span
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("no derivation of {symbol} over {}..{}", .span.0, .span.1)]
pub struct NoDerivation {
  pub symbol: String,
  pub span: (usize, usize),
}

/// Viterbi chart: for every span, the best probability of each non-terminal
/// deriving it, plus a parallel table of backpointers to rebuild that derivation.
#[derive(Debug, Clone)]
pub struct ViterbiChart<'g> {
  grammar: &'g Grammar,
  words: Vec<String>,
  scores: Table<BTreeMap<Symbol, Prob>>,
  back: Table<BTreeMap<Symbol, Backpointer>>,
}

impl<'g> ViterbiChart<'g> {
  pub fn len(&self) -> usize {
    self.words.len()
  }

  pub fn is_empty(&self) -> bool {
    self.words.is_empty()
  }

  pub fn grammar(&self) -> &'g Grammar {
    self.grammar
  }

  pub fn words(&self) -> &[String] {
    &self.words
  }

  pub fn cell(&self, i: usize, j: usize) -> &BTreeMap<Symbol, Prob> {
    self.scores.get(i, j)
  }

  pub fn score(&self, i: usize, j: usize, symbol: Symbol) -> Option<f64> {
    self.cell(i, j).get(&symbol).map(|p| p.into_inner())
  }

  pub fn backpointer(&self, i: usize, j: usize, symbol: Symbol) -> Option<Backpointer> {
    self.back.get(i, j).get(&symbol).copied()
  }

  /// Best probability of `symbol` deriving the whole sentence
  pub fn probability(&self, symbol: Symbol) -> Option<f64> {
    if self.is_empty() {
      None
    } else {
      self.score(0, self.len(), symbol)
    }
  }

  /// Best probability of the start symbol deriving the whole sentence.
  /// `None` means the sentence isn't in the language.
  pub fn best_probability(&self) -> Option<f64> {
    self.probability(self.grammar.start())
  }

  /// Rebuilds the best derivation of `root` over `span` from the backpointers.
  /// Panics if `span` is outside the chart.
  pub fn extract(
    &self,
    root: Symbol,
    span: (usize, usize),
  ) -> Result<SynTree<String, String>, NoDerivation> {
    let (i, j) = span;
    let ptr = self.backpointer(i, j, root).ok_or_else(|| NoDerivation {
      symbol: self
        .grammar
        .get_name(root)
        .map_or_else(|| format!("#{}", root.0), str::to_string),
      span,
    })?;
    let name = self.grammar.name(root);

    let cons = Constituent {
      value: name.to_string(),
      span,
    };
    match ptr {
      Backpointer::Lexical => {
        let word = Word {
          value: self.words[i].clone(),
          span,
        };
        Ok(SynTree::Branch(cons, vec![SynTree::Leaf(word)]))
      }
      Backpointer::Binary { split, left, right } => {
        let left = self.extract(left, (i, split))?;
        let right = self.extract(right, (split, j))?;
        Ok(SynTree::Branch(cons, vec![left, right]))
      }
    }
  }

  /// Best derivation of the start symbol over the whole sentence
  pub fn best_tree(&self) -> Result<SynTree<String, String>, NoDerivation> {
    let start = self.grammar.start();
    if self.is_empty() {
      return Err(NoDerivation {
        symbol: self.grammar.name(start).to_string(),
        span: (0, 0),
      });
    }
    self.extract(start, (0, self.len()))
  }
}

impl fmt::Display for ViterbiChart<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for len in 1..=self.len() {
      writeln!(f, "Length {}:", len)?;
      for (i, j) in self.scores.spans_of_len(len) {
        write!(f, "  {}..{}:", i, j)?;
        let ptrs = self.back.get(i, j);
        for (symbol, prob) in self.cell(i, j) {
          write!(f, " {}={}", self.grammar.name(*symbol), prob)?;
          if let Some(Backpointer::Binary { split, left, right }) = ptrs.get(symbol) {
            write!(
              f,
              "<{} {} {}>",
              split,
              self.grammar.name(*left),
              self.grammar.name(*right)
            )?;
          }
        }
        writeln!(f)?;
      }
    }
    Ok(())
  }
}

/// Fills a Viterbi chart for `input`.
///
/// Candidates for a span are tried with the split point ascending, then the
/// left and right children by ascending symbol id, then parents in rule order.
/// A candidate replaces the stored entry only if its score is strictly greater,
/// so on ties the first candidate in that order wins. A zero score (from
/// underflow) is still a derivation: it's recorded if nothing better exists and
/// never stops the enumeration.
pub fn best_parse<'g>(g: &'g Grammar, input: &[&str]) -> ViterbiChart<'g> {
  let n = input.len();
  let mut scores: Table<BTreeMap<Symbol, Prob>> = Table::new(n);
  let mut back: Table<BTreeMap<Symbol, Backpointer>> = Table::new(n);

  for (i, word) in input.iter().enumerate() {
    let mut cell = BTreeMap::new();
    let mut ptrs = BTreeMap::new();
    // (parent, word) pairs are unique in a grammar, so there's nothing to compare
    for &(parent, p) in g.lexical(word) {
      cell.insert(parent, OrderedFloat(p));
      ptrs.insert(parent, Backpointer::Lexical);
    }
    if cell.is_empty() {
      debug!(word, position = i, "no lexical rule for word");
    }
    scores.set(i, i + 1, cell);
    back.set(i, i + 1, ptrs);
  }

  for len in 2..=n {
    for (i, j) in scores.spans_of_len(len) {
      let mut cell: BTreeMap<Symbol, Prob> = BTreeMap::new();
      let mut ptrs: BTreeMap<Symbol, Backpointer> = BTreeMap::new();

      for k in (i + 1)..j {
        let left = scores.get(i, k);
        let right = scores.get(k, j);
        for (&b, &prob_b) in left.iter() {
          for (&c, &prob_c) in right.iter() {
            for &(parent, p) in g.binary(b, c) {
              let score = OrderedFloat(p) * prob_b * prob_c;
              if cell.get(&parent).is_none_or(|best| score > *best) {
                cell.insert(parent, score);
                ptrs.insert(
                  parent,
                  Backpointer::Binary {
                    split: k,
                    left: b,
                    right: c,
                  },
                );
              }
            }
          }
        }
      }

      trace!(i, j, size = cell.len(), "filled cell");
      scores.set(i, j, cell);
      back.set(i, j, ptrs);
    }
  }

  ViterbiChart {
    grammar: g,
    words: input.iter().map(|w| w.to_string()).collect(),
    scores,
    back,
  }
}
