//! Tokenizer for declaration files
//!
//! Produces a flat token list. Comments are trivia, except that the last
//! `/** ... */` block before a token is attached to it so declarations keep
//! their documentation through a rewrite. License banners and triple-slash
//! directives at the top of the file are collected by [`file_header`].

use super::diagnostic::{Diagnostic, Pos};

const PUNCTUATORS: &[&str] = &[
  "...", "=>", "{", "}", "(", ")", "[", "]", "<", ">", ";", ",", ".", "?", ":", "=", "|", "&", "!", "+", "-", "*",
  "/", "%", "~", "^", "@",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
  Ident(String),
  /// `raw` keeps the quotes exactly as written
  Str { raw: String, value: String },
  Number(String),
  Template(String),
  Punct(&'static str),
  Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub pos: Pos,
  /// Byte offsets, used to tell `>>` from `> >`
  pub start: usize,
  pub end: usize,
  pub newline_before: bool,
  pub doc: Option<String>,
}

impl Token {
  pub fn is_punct(&self, p: &str) -> bool {
    matches!(self.kind, TokenKind::Punct(q) if q == p)
  }

  pub fn is_ident(&self, name: &str) -> bool {
    matches!(&self.kind, TokenKind::Ident(n) if n == name)
  }

  pub fn ident(&self) -> Option<&str> {
    match &self.kind {
      TokenKind::Ident(n) => Some(n),
      _ => None,
    }
  }
}

/// Leading `/*! ... */` banners and `/// <...>` directives, verbatim
///
/// Scanning stops at the first token; other leading comments are skipped.
pub fn file_header(src: &str) -> Vec<String> {
  let mut header = Vec::new();
  let mut rest = src;
  loop {
    rest = rest.trim_start();
    if rest.starts_with("//") {
      let end = rest.find('\n').unwrap_or(rest.len());
      let line = rest[..end].trim_end();
      if line.starts_with("/// <") {
        header.push(line.to_string());
      }
      rest = &rest[end..];
    } else if rest.starts_with("/*") {
      let Some(len) = rest[2..].find("*/") else {
        break;
      };
      let end = 2 + len + 2;
      if rest.starts_with("/*!") {
        header.push(rest[..end].to_string());
      }
      rest = &rest[end..];
    } else {
      break;
    }
  }
  header
}

struct Lexer<'s> {
  src: &'s str,
  offset: usize,
  line: usize,
  column: usize,
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, Diagnostic> {
  let mut lexer = Lexer {
    src,
    offset: 0,
    line: 1,
    column: 1,
  };
  let mut tokens = Vec::new();

  loop {
    let (newline_before, doc) = lexer.skip_trivia()?;
    let pos = lexer.pos();
    let start = lexer.offset;
    let kind = match lexer.peek() {
      None => TokenKind::Eof,
      Some(c) => lexer.token(c)?,
    };
    let done = kind == TokenKind::Eof;
    tokens.push(Token {
      kind,
      pos,
      start,
      end: lexer.offset,
      newline_before,
      doc,
    });
    if done {
      return Ok(tokens);
    }
  }
}

impl<'s> Lexer<'s> {
  fn pos(&self) -> Pos {
    Pos::new(self.line, self.column)
  }

  fn peek(&self) -> Option<char> {
    self.src[self.offset..].chars().next()
  }

  fn peek_nth(&self, n: usize) -> Option<char> {
    self.src[self.offset..].chars().nth(n)
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.peek()?;
    self.offset += c.len_utf8();
    if c == '\n' {
      self.line += 1;
      self.column = 1;
    } else {
      self.column += 1;
    }
    Some(c)
  }

  fn rest(&self) -> &'s str {
    &self.src[self.offset..]
  }

  /// Skip whitespace and comments, reporting whether a newline was crossed
  /// and the last doc comment seen
  fn skip_trivia(&mut self) -> Result<(bool, Option<String>), Diagnostic> {
    let mut newline = false;
    let mut doc = None;
    loop {
      match self.peek() {
        Some(c) if c.is_whitespace() => {
          if c == '\n' {
            newline = true;
          }
          self.bump();
        }
        Some('/') if self.peek_nth(1) == Some('/') => {
          while let Some(c) = self.peek() {
            if c == '\n' {
              break;
            }
            self.bump();
          }
        }
        Some('/') if self.peek_nth(1) == Some('*') => {
          let pos = self.pos();
          let start = self.offset;
          let Some(len) = self.rest()[2..].find("*/") else {
            return Err(Diagnostic::new(pos, "'*/' expected."));
          };
          let end = start + 2 + len + 2;
          while self.offset < end {
            if self.bump() == Some('\n') {
              newline = true;
            }
          }
          let text = &self.src[start..end];
          if text.starts_with("/**") && text != "/**/" {
            doc = Some(text.to_string());
          }
        }
        _ => return Ok((newline, doc)),
      }
    }
  }

  fn token(&mut self, c: char) -> Result<TokenKind, Diagnostic> {
    if c == '"' || c == '\'' {
      return self.string(c);
    }
    if c == '`' {
      return self.template();
    }
    if c.is_ascii_digit() || (c == '.' && self.peek_nth(1).is_some_and(|d| d.is_ascii_digit())) {
      return Ok(self.number());
    }
    if c == '#' || is_ident_start(c) {
      let start = self.offset;
      self.bump();
      while self.peek().is_some_and(is_ident_part) {
        self.bump();
      }
      let text = &self.src[start..self.offset];
      if text == "#" {
        return Err(Diagnostic::new(self.pos(), "Invalid character."));
      }
      return Ok(TokenKind::Ident(text.to_string()));
    }
    for p in PUNCTUATORS {
      if self.rest().starts_with(p) {
        for _ in 0..p.len() {
          self.bump();
        }
        return Ok(TokenKind::Punct(p));
      }
    }
    Err(Diagnostic::new(self.pos(), "Invalid character."))
  }

  fn string(&mut self, quote: char) -> Result<TokenKind, Diagnostic> {
    let pos = self.pos();
    let start = self.offset;
    let mut value = String::new();
    self.bump();
    loop {
      match self.bump() {
        None | Some('\n') => return Err(Diagnostic::new(pos, "Unterminated string literal.")),
        Some('\\') => match self.bump() {
          Some('n') => value.push('\n'),
          Some('t') => value.push('\t'),
          Some('r') => value.push('\r'),
          Some('0') => value.push('\0'),
          Some(other) => value.push(other),
          None => return Err(Diagnostic::new(pos, "Unterminated string literal.")),
        },
        Some(c) if c == quote => break,
        Some(c) => value.push(c),
      }
    }
    Ok(TokenKind::Str {
      raw: self.src[start..self.offset].to_string(),
      value,
    })
  }

  fn template(&mut self) -> Result<TokenKind, Diagnostic> {
    let pos = self.pos();
    let start = self.offset;
    self.bump();
    let mut depth = 0usize;
    loop {
      match self.bump() {
        None => return Err(Diagnostic::new(pos, "Unterminated template literal.")),
        Some('\\') => {
          self.bump();
        }
        Some('$') if depth == 0 && self.peek() == Some('{') => {
          self.bump();
          depth = 1;
        }
        Some('{') if depth > 0 => depth += 1,
        Some('}') if depth > 0 => depth -= 1,
        Some('`') if depth == 0 => break,
        Some(_) => {}
      }
    }
    Ok(TokenKind::Template(self.src[start..self.offset].to_string()))
  }

  fn number(&mut self) -> TokenKind {
    let start = self.offset;
    if self.rest().starts_with("0x") || self.rest().starts_with("0X") || self.rest().starts_with("0b") || self.rest().starts_with("0o") {
      self.bump();
      self.bump();
      while self.peek().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
        self.bump();
      }
    } else {
      while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '_' || c == '.') {
        self.bump();
      }
      if matches!(self.peek(), Some('e' | 'E')) {
        self.bump();
        if matches!(self.peek(), Some('+' | '-')) {
          self.bump();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
          self.bump();
        }
      }
    }
    if self.peek() == Some('n') {
      self.bump();
    }
    TokenKind::Number(self.src[start..self.offset].to_string())
  }
}

fn is_ident_start(c: char) -> bool {
  c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
  c == '_' || c == '$' || c.is_alphanumeric()
}
