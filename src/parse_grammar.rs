// Simple recursive-descent parsing of grammar files

use regex::Regex;
use std::str::FromStr;

use crate::grammar::{Grammar, GrammarError};
use crate::rules::{Production, Rule};

impl FromStr for Grammar {
  type Err = GrammarError;

  /// Parses a grammar from a string. The start symbol is the first rule's
  /// symbol, unless the source begins with a `//** start: X` header like the
  /// one `Display` writes.
  ///
  /// ```
  /// let g: cykparse::Grammar = r#"
  ///   // a rule per parent, alternatives separated by |
  ///   S -> NP VP [1.0];
  ///   NP -> "Mary" [0.5] | john [0.5];
  ///   VP -> sleeps [1.0];
  /// "#.parse().unwrap();
  /// assert!(g.is_weighted());
  /// assert_eq!(g.rules().len(), 4);
  /// ```
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let rules = parse_rules(s)?;
    let g = Grammar::new(rules)?;
    match parse_start_header(s) {
      Some(start) => g.with_start(start),
      None => Ok(g),
    }
  }
}

type Infallible<'a, T> = (T, &'a str);
type ParseResult<'a, T> = Result<(T, &'a str), GrammarError>;

fn syntax(msg: String) -> GrammarError {
  GrammarError::Syntax(msg)
}

/// Shortens the rest of the input for error messages
fn context(s: &str) -> &str {
  let line = s.lines().next().unwrap_or("");
  match line.char_indices().nth(40) {
    Some((idx, _)) => &line[..idx],
    None => line,
  }
}

/// helper macro for initializing a regex with lazy_static!
macro_rules! regex_static {
  ($name:ident, $pattern:expr) => {
    lazy_static! {
      static ref $name: Regex = Regex::new($pattern).unwrap();
    }
  };
}

/// Try to consume a regex, returning None if it doesn't match
fn optional_re<'a>(re: &'static Regex, s: &'a str) -> Infallible<'a, Option<&'a str>> {
  match re.find(s) {
    Some(m) if m.start() == 0 => {
      let (_, rest) = s.split_at(m.end());
      (Some(m.as_str()), rest)
    }
    _ => (None, s),
  }
}

/// Try to consume a regex, failing if it doesn't match
fn needed_re<'a>(re: &'static Regex, what: &str, s: &'a str) -> ParseResult<'a, &'a str> {
  if let (Some(c), rest) = optional_re(re, s) {
    Ok((c, rest))
  } else {
    Err(syntax(format!("expected {} at `{}`", what, context(s))))
  }
}

/// Try to consume a char, returning None if it doesn't match
fn optional_char(c: char, s: &str) -> Infallible<'_, Option<char>> {
  match s.strip_prefix(c) {
    Some(rest) => (Some(c), rest),
    None => (None, s),
  }
}

/// Try to consume a char, failing if it doesn't match
fn needed_char(c: char, s: &str) -> ParseResult<'_, char> {
  if let (Some(c), rest) = optional_char(c, s) {
    Ok((c, rest))
  } else {
    Err(syntax(format!("expected `{}` at `{}`", c, context(s))))
  }
}

/// Skips whitespace and // comments, if there are any
fn skip_whitespace(s: &str) -> &str {
  regex_static!(WHITESPACE_OR_COMMENT, r"^(\s+|//[^\n]*)*");
  optional_re(&WHITESPACE_OR_COMMENT, s).1
}

/// The symbol named by a leading `//** start: X` line, if there is one
fn parse_start_header(s: &str) -> Option<&str> {
  regex_static!(START_HEADER, r"^\s*//\*\*\s*start:\s*([a-zA-Z0-9\-_]+)");
  START_HEADER
    .captures(s)
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str())
}

/// Tries to parse a name made of letters, numbers, - and _
fn parse_name(s: &str) -> ParseResult<'_, &str> {
  regex_static!(NAME, r"^[a-zA-Z0-9\-_]+");
  needed_re(&NAME, "a name", s)
}

/// A bare name starting with an uppercase letter is a non-terminal, anything
/// else is a terminal. Quoted names are always terminals.
fn parse_production(s: &str) -> ParseResult<'_, Production> {
  regex_static!(QUOTED, r#"^"[^"\n]+""#);

  if let (Some(quoted), rest) = optional_re(&QUOTED, s) {
    let word = &quoted[1..quoted.len() - 1];
    return Ok((Production::Terminal(word.to_string()), rest));
  }

  let (name, s) = parse_name(s)?;
  if name.starts_with(char::is_uppercase) {
    Ok((Production::Nonterminal(name.to_string()), s))
  } else {
    Ok((Production::Terminal(name.to_string()), s))
  }
}

/// Rule parent, which can't be a terminal
fn parse_symbol(s: &str) -> ParseResult<'_, String> {
  let (prod, rest) = parse_production(s)?;
  match prod {
    Production::Nonterminal(name) => Ok((name, rest)),
    Production::Terminal(w) => Err(syntax(format!(
      "expected a non-terminal, got terminal `{}` at `{}`",
      w,
      context(s)
    ))),
  }
}

/// A bracketed probability: `[0.25]`
fn parse_prob(s: &str) -> ParseResult<'_, f64> {
  regex_static!(NUMBER, r"^[0-9.]+([eE][-+]?[0-9]+)?");

  let (_, s) = needed_char('[', s)?;
  let s = skip_whitespace(s);
  let (number, s) = needed_re(&NUMBER, "a probability", s)?;
  let prob = number
    .parse::<f64>()
    .map_err(|e| syntax(format!("bad probability `{}`: {}", number, e)))?;
  let s = skip_whitespace(s);
  let (_, s) = needed_char(']', s)?;
  Ok((prob, s))
}

/// One alternative of a rule: productions up to `|` or `;`, with an optional
/// trailing probability
fn parse_alternative<'a>(symbol: &str, s: &'a str) -> ParseResult<'a, Rule> {
  let mut productions = Vec::new();
  let mut prob = None;
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      return Err(syntax(format!("unterminated rule for {}", symbol)));
    }
    if rem.starts_with(';') || rem.starts_with('|') {
      break;
    }
    if rem.starts_with('[') {
      let (p, s) = parse_prob(rem)?;
      prob = Some(p);
      rem = skip_whitespace(s);
      break;
    }
    let (prod, s) = parse_production(rem)?;
    productions.push(prod);
    rem = s;
  }

  if productions.is_empty() {
    return Err(syntax(format!(
      "empty alternative for {} at `{}`",
      symbol,
      context(rem)
    )));
  }

  Ok((
    Rule {
      symbol: symbol.to_string(),
      productions,
      prob,
    },
    rem,
  ))
}

/// Symbol, arrow, alternatives, terminated by `;`
fn parse_rule(s: &str) -> ParseResult<'_, Vec<Rule>> {
  regex_static!(ARROW, "^->");

  let (symbol, s) = parse_symbol(s)?;
  let s = skip_whitespace(s);
  let (_, s) = needed_re(&ARROW, "`->`", s)?;

  let mut rules = Vec::new();
  let mut rem = s;
  loop {
    let (rule, s) = parse_alternative(&symbol, rem)?;
    rules.push(rule);
    if let (Some(_), s) = optional_char('|', s) {
      rem = s;
      continue;
    }
    let (_, s) = needed_char(';', s)?;
    return Ok((rules, s));
  }
}

/// Parses every rule in the source, in order
pub fn parse_rules(s: &str) -> Result<Vec<Rule>, GrammarError> {
  let mut rules = Vec::new();
  let mut rem = s;
  loop {
    rem = skip_whitespace(rem);
    if rem.is_empty() {
      return Ok(rules);
    }
    let (mut rule, s) = parse_rule(rem)?;
    rules.append(&mut rule);
    rem = s;
  }
}
