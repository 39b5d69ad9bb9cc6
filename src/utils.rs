use std::error::Error;

/// Boxed static error type
pub type Err = Box<dyn Error + 'static>;

/// Splits a raw sentence into words. Whitespace and ASCII punctuation both act
/// as separators and never show up in the output.
///
/// ```
/// assert_eq!(
///   cykparse::utils::tokenize("the dog, they said, barked!"),
///   vec!["the", "dog", "they", "said", "barked"],
/// );
/// ```
pub fn tokenize(sentence: &str) -> Vec<&str> {
  sentence
    .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
    .filter(|w| !w.is_empty())
    .collect()
}

#[test]
fn test_tokenize_edges() {
  assert!(tokenize("").is_empty());
  assert!(tokenize("  ... !? ").is_empty());
  assert_eq!(tokenize("b a a b a"), vec!["b", "a", "a", "b", "a"]);
  assert_eq!(tokenize("don't\tstop"), vec!["don", "t", "stop"]);
  // non-ascii punctuation is kept as part of the word
  assert_eq!(tokenize("naïve «word»"), vec!["naïve", "«word»"]);
}
