use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::rules::{BinaryRule, LexicalRule, Production, Rule, Symbol};

/// Problems with a grammar. All of these are raised while the grammar is built
/// or loaded, never while parsing a sentence.
#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
  #[error("syntax error: {0}")]
  Syntax(String),

  #[error("empty ruleset")]
  Empty,

  #[error("rule `{rule}` is neither `X -> word` nor `X -> Y Z`")]
  Arity { rule: String },

  #[error("rule `{rule}` has probability {prob}, expected a finite value in (0, 1]")]
  Probability { rule: String, prob: f64 },

  #[error("rule `{rule}` has no probability, but other rules in the grammar do")]
  MixedWeights { rule: String },

  #[error("unknown start symbol {0}")]
  UnknownStart(String),

  #[error("couldn't read grammar from {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// A grammar restricted to lexical (`X -> word`) and binary (`X -> Y Z`) rules.
///
/// Immutable once built. Either every rule carries a probability or none does;
/// in the second case every rule weighs 1.0.
///
/// If the same parent and right-hand side are defined twice, the last
/// definition wins: its probability replaces the earlier one, but the rule keeps
/// the position of its first definition. This happens here, while the grammar
/// is built, so the parsers never compare scores between two versions of a rule.
#[derive(Debug, Clone)]
pub struct Grammar {
  start: Symbol,
  weighted: bool,
  names: Vec<String>,
  ids: HashMap<String, Symbol>,
  rules: Vec<Rule>,
  by_word: HashMap<String, Vec<(Symbol, f64)>>,
  by_children: HashMap<(Symbol, Symbol), Vec<(Symbol, f64)>>,
}

impl fmt::Display for Grammar {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "//** start: {}", self.name(self.start))?;
    for rule in self.rules.iter() {
      writeln!(f, "{};", rule)?;
    }
    Ok(())
  }
}

/// Key used to spot redefinitions of a rule
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RuleKey {
  Lexical(Symbol, String),
  Binary(Symbol, Symbol, Symbol),
}

fn check_prob(rule: &Rule, weighted: bool) -> Result<(), GrammarError> {
  match rule.prob {
    None if weighted => Err(GrammarError::MixedWeights {
      rule: rule.to_string(),
    }),
    Some(prob) if !(prob.is_finite() && prob > 0.0 && prob <= 1.0) => {
      Err(GrammarError::Probability {
        rule: rule.to_string(),
        prob,
      })
    }
    _ => Ok(()),
  }
}

impl Grammar {
  /// Builds a grammar from rules. The first rule's symbol is the start symbol.
  pub fn new(rules: Vec<Rule>) -> Result<Self, GrammarError> {
    if rules.is_empty() {
      return Err(GrammarError::Empty);
    }

    let weighted = rules.iter().any(|r| r.prob.is_some());
    let mut names: Vec<String> = Vec::new();
    let mut ids: HashMap<String, Symbol> = HashMap::new();
    let mut intern = |name: &str| -> Symbol {
      *ids.entry(name.to_string()).or_insert_with(|| {
        names.push(name.to_string());
        Symbol(names.len() as u32 - 1)
      })
    };

    let mut kept: Vec<(RuleKey, Rule)> = Vec::with_capacity(rules.len());
    let mut seen: HashMap<RuleKey, usize> = HashMap::new();

    for rule in rules {
      check_prob(&rule, weighted)?;
      if rule.symbol.is_empty() {
        return Err(GrammarError::Arity {
          rule: rule.to_string(),
        });
      }

      let parent = intern(&rule.symbol);
      let key = match rule.productions.as_slice() {
        [Production::Terminal(word)] => RuleKey::Lexical(parent, word.clone()),
        [Production::Nonterminal(left), Production::Nonterminal(right)] => {
          RuleKey::Binary(parent, intern(left), intern(right))
        }
        _ => {
          return Err(GrammarError::Arity {
            rule: rule.to_string(),
          });
        }
      };

      if let Some(&idx) = seen.get(&key) {
        let earlier = &kept[idx].1;
        warn!(%earlier, later = %rule, "rule redefined, keeping the later definition");
        kept[idx].1 = rule;
      } else {
        seen.insert(key.clone(), kept.len());
        kept.push((key, rule));
      }
    }

    let mut by_word: HashMap<String, Vec<(Symbol, f64)>> = HashMap::new();
    let mut by_children: HashMap<(Symbol, Symbol), Vec<(Symbol, f64)>> = HashMap::new();
    for (key, rule) in kept.iter() {
      let weight = rule.prob.unwrap_or(1.0);
      match key {
        RuleKey::Lexical(parent, word) => {
          by_word
            .entry(word.clone())
            .or_default()
            .push((*parent, weight));
        }
        RuleKey::Binary(parent, left, right) => {
          by_children
            .entry((*left, *right))
            .or_default()
            .push((*parent, weight));
        }
      }
    }

    let rules = kept.into_iter().map(|(_, rule)| rule).collect::<Vec<_>>();
    debug!(
      rules = rules.len(),
      symbols = names.len(),
      weighted,
      "built grammar"
    );

    Ok(Self {
      start: Symbol(0),
      weighted,
      names,
      ids,
      rules,
      by_word,
      by_children,
    })
  }

  /// Loads a grammar in the text format accepted by `str::parse`.
  pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|source| GrammarError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    src.parse()
  }

  /// Returns the same grammar with a different start symbol.
  pub fn with_start(mut self, name: &str) -> Result<Self, GrammarError> {
    self.start = self
      .symbol(name)
      .ok_or_else(|| GrammarError::UnknownStart(name.to_string()))?;
    Ok(self)
  }

  pub fn start(&self) -> Symbol {
    self.start
  }

  pub fn is_weighted(&self) -> bool {
    self.weighted
  }

  pub fn rules(&self) -> &[Rule] {
    &self.rules
  }

  pub fn symbol(&self, name: &str) -> Option<Symbol> {
    self.ids.get(name).copied()
  }

  pub fn name(&self, symbol: Symbol) -> &str {
    &self.names[symbol.index()]
  }

  /// Like `name`, but `None` for an id this grammar never handed out
  pub fn get_name(&self, symbol: Symbol) -> Option<&str> {
    self.names.get(symbol.index()).map(|s| s.as_str())
  }

  /// Number of distinct non-terminals
  pub fn symbol_count(&self) -> usize {
    self.names.len()
  }

  /// Parents with a lexical rule for `word`, in rule order, with their weights
  pub fn lexical(&self, word: &str) -> &[(Symbol, f64)] {
    self.by_word.get(word).map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Parents of `left right`, in rule order, with their weights
  pub fn binary(&self, left: Symbol, right: Symbol) -> &[(Symbol, f64)] {
    self
      .by_children
      .get(&(left, right))
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// The lexical rules left after deduplication, in rule order
  pub fn lexical_rules(&self) -> impl Iterator<Item = LexicalRule> + '_ {
    self.rules.iter().filter_map(|r| match r.productions.as_slice() {
      [Production::Terminal(word)] => Some(LexicalRule {
        parent: self.ids[&r.symbol],
        word: word.clone(),
        prob: r.prob,
      }),
      _ => None,
    })
  }

  /// The binary rules left after deduplication, in rule order
  pub fn binary_rules(&self) -> impl Iterator<Item = BinaryRule> + '_ {
    self.rules.iter().filter_map(|r| match r.productions.as_slice() {
      [Production::Nonterminal(left), Production::Nonterminal(right)] => Some(BinaryRule {
        parent: self.ids[&r.symbol],
        left: self.ids[left],
        right: self.ids[right],
        prob: r.prob,
      }),
      _ => None,
    })
  }

  pub fn has_lexical_rule(&self, parent: Symbol, word: &str) -> bool {
    self.lexical(word).iter().any(|(p, _)| *p == parent)
  }

  pub fn has_binary_rule(&self, parent: Symbol, left: Symbol, right: Symbol) -> bool {
    self.binary(left, right).iter().any(|(p, _)| *p == parent)
  }
}
