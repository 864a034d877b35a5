use std::fmt;

/// 1-based source position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
  pub line: usize,
  pub column: usize,
}

impl Pos {
  pub fn new(line: usize, column: usize) -> Self {
    Self { line, column }
  }
}

/// A syntax or semantic problem found in declaration text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub pos: Pos,
  pub message: String,
}

impl Diagnostic {
  pub fn new(pos: Pos, message: impl Into<String>) -> Self {
    Self {
      pos,
      message: message.into(),
    }
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "({},{}): {}", self.pos.line, self.pos.column, self.message)
  }
}
