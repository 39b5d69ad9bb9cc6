use std::fmt;

/// Interned non-terminal. Ids are dense and handed out in order of first
/// appearance in the rule list, which also fixes chart iteration order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub u32);

impl Symbol {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Production {
  Terminal(String),
  Nonterminal(String),
}

impl Production {
  pub fn symbol_str(&self) -> &str {
    match self {
      Self::Terminal(s) => s,
      Self::Nonterminal(s) => s,
    }
  }

  pub fn is_nonterminal(&self) -> bool {
    matches!(self, Self::Nonterminal(_))
  }
}

/// Whether a terminal can be written back without quotes and still read as a
/// terminal by the grammar parser.
fn is_bare_terminal(s: &str) -> bool {
  let mut chars = s.chars();
  match chars.next() {
    Some(c) if !c.is_uppercase() && (c.is_ascii_alphanumeric() || c == '-' || c == '_') => {
      chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
    _ => false,
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Terminal(s) if is_bare_terminal(s) => write!(f, "{}", s),
      Self::Terminal(s) => write!(f, "\"{}\"", s),
      Self::Nonterminal(s) => write!(f, "{}", s),
    }
  }
}

/// A rule as written, before the grammar checks its shape and interns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
  pub symbol: String,
  pub productions: Vec<Production>,
  pub prob: Option<f64>,
}

impl Rule {
  pub fn new(symbol: impl Into<String>, productions: Vec<Production>) -> Self {
    Self {
      symbol: symbol.into(),
      productions,
      prob: None,
    }
  }

  /// `symbol -> word`
  pub fn lexical(symbol: impl Into<String>, word: impl Into<String>) -> Self {
    Self::new(symbol, vec![Production::Terminal(word.into())])
  }

  /// `symbol -> left right`
  pub fn binary(
    symbol: impl Into<String>,
    left: impl Into<String>,
    right: impl Into<String>,
  ) -> Self {
    Self::new(
      symbol,
      vec![
        Production::Nonterminal(left.into()),
        Production::Nonterminal(right.into()),
      ],
    )
  }

  pub fn with_prob(mut self, prob: f64) -> Self {
    self.prob = Some(prob);
    self
  }
}

impl fmt::Display for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.symbol)?;
    for p in self.productions.iter() {
      write!(f, " {}", p)?;
    }
    if let Some(prob) = self.prob {
      write!(f, " [{}]", prob)?;
    }
    Ok(())
  }
}

/// `parent -> word`, after validation
#[derive(Debug, Clone, PartialEq)]
pub struct LexicalRule {
  pub parent: Symbol,
  pub word: String,
  pub prob: Option<f64>,
}

/// `parent -> left right`, after validation
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryRule {
  pub parent: Symbol,
  pub left: Symbol,
  pub right: Symbol,
  pub prob: Option<f64>,
}
