/// Strictly triangular storage for one value per span `(i, j)`, `0 <= i < j <= n`.
///
/// Cells start out unfilled and are written exactly once. Touching a span
/// outside the triangle, reading a cell before it's written, or writing it twice
/// are all bugs in the caller and panic.
#[derive(Debug, Clone, PartialEq)]
pub struct Table<T> {
  n: usize,
  cells: Vec<Option<T>>,
}

impl<T> Table<T> {
  /// Table for a sentence of `n` words
  pub fn new(n: usize) -> Self {
    let mut cells = Vec::new();
    cells.resize_with(n * (n + 1) / 2, || None);
    Self { n, cells }
  }

  /// Sentence length this table was made for
  pub fn len(&self) -> usize {
    self.n
  }

  pub fn is_empty(&self) -> bool {
    self.n == 0
  }

  /// Rows are laid out by start position: row `i` holds spans `(i, i+1)..=(i, n)`
  fn offset(&self, i: usize, j: usize) -> usize {
    assert!(
      i < j && j <= self.n,
      "span {}..{} is outside the table for {} words",
      i,
      j,
      self.n
    );
    i * self.n - i * (i.saturating_sub(1)) / 2 + (j - i - 1)
  }

  pub fn is_filled(&self, i: usize, j: usize) -> bool {
    self.cells[self.offset(i, j)].is_some()
  }

  pub fn get(&self, i: usize, j: usize) -> &T {
    let idx = self.offset(i, j);
    self.cells[idx]
      .as_ref()
      .unwrap_or_else(|| panic!("read of unfilled cell {}..{}", i, j))
  }

  pub fn set(&mut self, i: usize, j: usize, value: T) {
    let idx = self.offset(i, j);
    assert!(self.cells[idx].is_none(), "cell {}..{} written twice", i, j);
    self.cells[idx] = Some(value);
  }

  /// All spans of a given length, left to right
  pub fn spans_of_len(&self, len: usize) -> impl Iterator<Item = (usize, usize)> + use<T> {
    let n = self.n;
    let count = if len == 0 || len > n { 0 } else { n - len + 1 };
    (0..count).map(move |i| (i, i + len))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_offsets_cover_triangle() {
    let n = 5;
    let mut t: Table<(usize, usize)> = Table::new(n);
    for len in 1..=n {
      for (i, j) in t.spans_of_len(len).collect::<Vec<_>>() {
        t.set(i, j, (i, j));
      }
    }
    for i in 0..n {
      for j in i + 1..=n {
        assert_eq!(*t.get(i, j), (i, j));
      }
    }
    assert!(t.cells.iter().all(Option::is_some));
  }

  #[test]
  fn test_spans_of_len() {
    let t: Table<()> = Table::new(3);
    assert_eq!(t.spans_of_len(2).collect::<Vec<_>>(), vec![(0, 2), (1, 3)]);
    assert_eq!(t.spans_of_len(3).collect::<Vec<_>>(), vec![(0, 3)]);
    assert_eq!(t.spans_of_len(4).count(), 0);
    assert_eq!(t.spans_of_len(0).count(), 0);
  }

  #[test]
  fn test_empty_table() {
    let t: Table<()> = Table::new(0);
    assert!(t.is_empty());
    assert_eq!(t.spans_of_len(1).count(), 0);
  }

  #[test]
  #[should_panic(expected = "unfilled")]
  fn test_read_unfilled() {
    let t: Table<u8> = Table::new(3);
    t.get(0, 2);
  }

  #[test]
  #[should_panic(expected = "written twice")]
  fn test_double_write() {
    let mut t: Table<u8> = Table::new(3);
    t.set(0, 1, 1);
    t.set(0, 1, 2);
  }

  #[test]
  #[should_panic(expected = "outside the table")]
  fn test_inverted_span() {
    let t: Table<u8> = Table::new(3);
    t.get(2, 2);
  }

  #[test]
  #[should_panic(expected = "outside the table")]
  fn test_span_past_end() {
    let t: Table<u8> = Table::new(3);
    t.get(1, 4);
  }
}
