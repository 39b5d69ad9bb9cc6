//! CYK recognition and Viterbi parsing for grammars made of lexical
//! (`X -> word`) and binary (`X -> Y Z`) rules.
//!
//! ```
//! use cykparse::Grammar;
//!
//! let g: Grammar = r#"
//!   S -> NP VP [1.0];
//!   NP -> Det N [1.0];
//!   VP -> V NP [1.0];
//!   Det -> the [1.0];
//!   N -> dog [0.5] | cat [0.5];
//!   V -> saw [1.0];
//! "#.parse()?;
//!
//! let words = cykparse::utils::tokenize("the dog saw the cat");
//! assert!(g.accepts(&words));
//!
//! let chart = g.best_parse(&words);
//! assert_eq!(chart.best_probability(), Some(0.25));
//! assert_eq!(
//!   chart.best_tree()?.to_bracketed(),
//!   "(S (NP (Det the) (N dog)) (VP (V saw) (NP (Det the) (N cat))))"
//! );
//! # Ok::<(), cykparse::Err>(())
//! ```

#[macro_use]
extern crate lazy_static;

pub mod cyk;
pub mod grammar;
pub mod parse_grammar;
pub mod rules;
pub mod syntree;
pub mod table;
pub mod utils;
pub mod viterbi;

pub use crate::cyk::Chart;
pub use crate::grammar::{Grammar, GrammarError};
pub use crate::rules::{Production, Rule, Symbol};
pub use crate::syntree::{Constituent, SynTree, Word};
pub use crate::utils::Err;
pub use crate::viterbi::{Backpointer, NoDerivation, ViterbiChart};

impl Grammar {
  /// Fills a recognition chart for `input`
  pub fn recognize(&self, input: &[&str]) -> Chart<'_> {
    cyk::recognize(self, input)
  }

  /// Whether the start symbol derives `input`
  pub fn accepts(&self, input: &[&str]) -> bool {
    self.recognize(input).accepts()
  }

  /// Fills a Viterbi chart for `input`
  pub fn best_parse(&self, input: &[&str]) -> ViterbiChart<'_> {
    viterbi::best_parse(self, input)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::{BTreeSet, HashSet};

  use super::*;

  const TOY: &str = r#"
    S -> A B [0.6] | B C [0.4];
    A -> B A [0.3] | a [0.7];
    B -> C C [0.2] | b [0.8];
    C -> A B [0.9] | a [0.1];
  "#;

  fn toy() -> Grammar {
    TOY.parse().unwrap()
  }

  /// Every sentence over `alphabet` with 1 to `max_len` words
  fn all_sentences(alphabet: &[&'static str], max_len: usize) -> Vec<Vec<&'static str>> {
    let mut out = Vec::new();
    let mut layer: Vec<Vec<&'static str>> = vec![Vec::new()];
    for _ in 0..max_len {
      layer = layer
        .into_iter()
        .flat_map(|prefix| {
          alphabet.iter().map(move |w| {
            let mut s = prefix.clone();
            s.push(*w);
            s
          })
        })
        .collect();
      out.extend(layer.iter().cloned());
    }
    out
  }

  /// Every sentence of at most `max_len` words the start symbol derives, found by
  /// expanding the leftmost non-terminal of sentential forms. Each symbol yields
  /// at least one word, so forms longer than `max_len` are dropped.
  fn generate(g: &Grammar, max_len: usize) -> HashSet<Vec<String>> {
    let mut out = HashSet::new();
    let mut stack = vec![vec![Production::Nonterminal(g.name(g.start()).to_string())]];
    while let Some(form) = stack.pop() {
      match form.iter().position(|p| p.is_nonterminal()) {
        None => {
          out.insert(form.iter().map(|p| p.symbol_str().to_string()).collect());
        }
        Some(idx) => {
          let name = form[idx].symbol_str();
          for rule in g.rules().iter().filter(|r| r.symbol == name) {
            let mut next = form[..idx].to_vec();
            next.extend(rule.productions.iter().cloned());
            next.extend(form[idx + 1..].iter().cloned());
            if next.len() <= max_len {
              stack.push(next);
            }
          }
        }
      }
    }
    out
  }

  /// Best score of any derivation of `symbol` over `words`, trying every tree
  fn brute_best(g: &Grammar, symbol: Symbol, words: &[&str]) -> Option<f64> {
    if words.len() == 1 {
      return g
        .lexical(words[0])
        .iter()
        .find(|(p, _)| *p == symbol)
        .map(|(_, w)| *w);
    }
    let mut best: Option<f64> = None;
    for k in 1..words.len() {
      for rule in g.rules().iter().filter(|r| r.symbol == g.name(symbol)) {
        if let [Production::Nonterminal(l), Production::Nonterminal(r)] = rule.productions.as_slice()
        {
          let l = g.symbol(l).unwrap();
          let r = g.symbol(r).unwrap();
          if let (Some(pl), Some(pr)) = (
            brute_best(g, l, &words[..k]),
            brute_best(g, r, &words[k..]),
          ) {
            let score = rule.prob.unwrap_or(1.0) * pl * pr;
            best = Some(best.map_or(score, |b: f64| b.max(score)));
          }
        }
      }
    }
    best
  }

  /// Checks a tree only uses grammar rules and spells out `words`
  fn assert_sound(g: &Grammar, tree: &SynTree<String, String>, words: &[&str]) {
    let (cons, children) = tree.get_branch().expect("root is a branch");
    let parent = g.symbol(&cons.value).unwrap();
    match children.as_slice() {
      [SynTree::Leaf(w)] => {
        assert_eq!(w.span, cons.span);
        assert_eq!(w.value, words[w.span.0]);
        assert!(g.has_lexical_rule(parent, &w.value));
      }
      [left, right] => {
        let (lc, _) = left.get_branch().unwrap();
        let (rc, _) = right.get_branch().unwrap();
        assert_eq!(lc.span.0, cons.span.0);
        assert_eq!(lc.span.1, rc.span.0);
        assert_eq!(rc.span.1, cons.span.1);
        let l = g.symbol(&lc.value).unwrap();
        let r = g.symbol(&rc.value).unwrap();
        assert!(g.has_binary_rule(parent, l, r), "{} -> {} {}", cons.value, lc.value, rc.value);
        assert_sound(g, left, words);
        assert_sound(g, right, words);
      }
      other => panic!("unexpected children {:?}", other),
    }
  }

  #[test]
  fn test_recognizer_matches_generated_language() {
    let g = toy();
    let language = generate(&g, 6);
    assert!(language.contains(&vec!["a".to_string(), "b".to_string()]));

    for sentence in all_sentences(&["a", "b"], 6) {
      let owned = sentence.iter().map(|w| w.to_string()).collect::<Vec<_>>();
      assert_eq!(
        g.accepts(&sentence),
        language.contains(&owned),
        "{:?}",
        sentence
      );
    }
  }

  #[test]
  fn test_every_entry_is_sound() {
    let g = toy();
    for sentence in all_sentences(&["a", "b"], 5) {
      let chart = g.best_parse(&sentence);
      let n = sentence.len();
      for i in 0..n {
        for j in (i + 1)..=n {
          for &symbol in chart.cell(i, j).keys() {
            let tree = chart.extract(symbol, (i, j)).unwrap();
            assert_eq!(tree.span(), (i, j));
            assert_eq!(tree.words(), sentence[i..j].to_vec());
            assert_sound(&g, &tree, &sentence);
          }
        }
      }
    }
  }

  #[test]
  fn test_viterbi_scores_are_optimal() {
    let g = toy();
    for sentence in all_sentences(&["a", "b"], 5) {
      let chart = g.best_parse(&sentence);
      for name in ["S", "A", "B", "C"] {
        let symbol = g.symbol(name).unwrap();
        match (chart.probability(symbol), brute_best(&g, symbol, &sentence)) {
          (None, None) => {}
          (Some(got), Some(want)) => {
            assert!(
              (got - want).abs() <= 1e-12 * want,
              "{} over {:?}: {} != {}",
              name,
              sentence,
              got,
              want
            );
          }
          (got, want) => panic!("{} over {:?}: {:?} != {:?}", name, sentence, got, want),
        }
      }
    }
  }

  #[test]
  fn test_best_tree_score_is_rule_product() {
    let g = toy();
    let sentence = ["b", "a", "a", "b", "a"];
    let chart = g.best_parse(&sentence);
    let tree = chart.best_tree().unwrap();
    assert_sound(&g, &tree, &sentence);

    fn product(g: &Grammar, tree: &SynTree<String, String>) -> f64 {
      let (cons, children) = tree.get_branch().unwrap();
      let rule = g
        .rules()
        .iter()
        .find(|r| {
          r.symbol == cons.value
            && r.productions.len() == children.len()
            && r
              .productions
              .iter()
              .zip(children.iter())
              .all(|(p, c)| match c {
                SynTree::Leaf(w) => p.symbol_str() == w.value,
                SynTree::Branch(cc, _) => p.symbol_str() == cc.value,
              })
        })
        .unwrap();
      children
        .iter()
        .filter(|c| c.is_branch())
        .fold(rule.prob.unwrap(), |acc, c| acc * product(g, c))
    }

    let best = chart.best_probability().unwrap();
    assert!((product(&g, &tree) - best).abs() <= 1e-12 * best);
  }

  #[test]
  fn test_runs_are_identical() {
    let g = toy();
    let sentence = ["b", "a", "a", "b", "a", "b", "a"];
    let first = g.best_parse(&sentence);
    let second = g.best_parse(&sentence);
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.best_tree(), second.best_tree());
    assert_eq!(
      g.recognize(&sentence).to_string(),
      g.recognize(&sentence).to_string()
    );
  }

  #[test]
  fn test_shared_grammar_across_threads() {
    let g = toy();
    let sentences = all_sentences(&["a", "b"], 4);
    let expected = sentences
      .iter()
      .map(|s| g.best_parse(s).best_probability())
      .collect::<Vec<_>>();

    let results = std::thread::scope(|scope| {
      let handles = sentences
        .chunks(5)
        .map(|chunk| {
          let g = &g;
          scope.spawn(move || {
            chunk
              .iter()
              .map(|s| g.best_parse(s).best_probability())
              .collect::<Vec<_>>()
          })
        })
        .collect::<Vec<_>>();
      handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect::<Vec<_>>()
    });

    assert_eq!(results, expected);
  }

  #[test]
  fn test_accepted_set_for_short_sentences() {
    let g = toy();
    let accepted = all_sentences(&["a", "b"], 3)
      .into_iter()
      .filter(|s| g.accepts(s))
      .map(|s| s.join(" "))
      .collect::<BTreeSet<_>>();
    assert_eq!(
      accepted,
      ["a b", "b a", "a a a", "b a b"]
        .into_iter()
        .map(String::from)
        .collect()
    );
  }
}
