//! Recursive-descent parser for ambient declaration files
//!
//! Errors are collected per statement: after a failure the parser skips to
//! the next statement boundary and keeps going, so one pass reports every
//! broken top-level statement rather than only the first.

use super::ast::*;
use super::diagnostic::Diagnostic;
use super::lexer::{Token, TokenKind, file_header, tokenize};

type PResult<T> = Result<T, Diagnostic>;

const KEYWORD_TYPES: &[&str] = &[
  "any", "unknown", "never", "void", "string", "number", "boolean", "bigint", "symbol", "object", "undefined", "this",
  "intrinsic",
];

const CLASS_MEMBER_MODIFIERS: &[&str] = &[
  "public", "private", "protected", "static", "readonly", "abstract", "declare", "override", "accessor",
];

const PARAM_MODIFIERS: &[&str] = &["public", "private", "protected", "readonly", "override"];

/// Parse declaration text into a [`SourceFile`], or every syntax diagnostic found
pub fn parse(src: &str) -> Result<SourceFile, Vec<Diagnostic>> {
  let tokens = tokenize(src).map_err(|d| vec![d])?;
  let mut parser = Parser {
    tokens,
    idx: 0,
    diagnostics: Vec::new(),
    in_conditional_extends: false,
  };
  let statements = parser.statements(false);
  if parser.diagnostics.is_empty() {
    Ok(SourceFile {
      header: file_header(src),
      statements,
    })
  } else {
    Err(parser.diagnostics)
  }
}

struct Parser {
  tokens: Vec<Token>,
  idx: usize,
  diagnostics: Vec<Diagnostic>,
  /// Inside the `extends` clause of a conditional type, where `infer X extends Y` is legal
  in_conditional_extends: bool,
}

impl Parser {
  // --------------------------------------------------------------------------
  // Token cursor
  // --------------------------------------------------------------------------

  fn tok(&self) -> &Token {
    &self.tokens[self.idx]
  }

  fn peek(&self, n: usize) -> &Token {
    let i = (self.idx + n).min(self.tokens.len() - 1);
    &self.tokens[i]
  }

  fn at(&self, p: &str) -> bool {
    self.tok().is_punct(p)
  }

  fn at_ident(&self, name: &str) -> bool {
    self.tok().is_ident(name)
  }

  fn at_eof(&self) -> bool {
    self.tok().kind == TokenKind::Eof
  }

  fn advance(&mut self) -> Token {
    let t = self.tok().clone();
    if !self.at_eof() {
      self.idx += 1;
    }
    t
  }

  fn eat(&mut self, p: &str) -> bool {
    if self.at(p) {
      self.advance();
      true
    } else {
      false
    }
  }

  fn eat_ident(&mut self, name: &str) -> bool {
    if self.at_ident(name) {
      self.advance();
      true
    } else {
      false
    }
  }

  fn error<T>(&self, message: impl Into<String>) -> PResult<T> {
    Err(Diagnostic::new(self.tok().pos, message))
  }

  fn expect(&mut self, p: &str) -> PResult<Token> {
    if self.at(p) {
      Ok(self.advance())
    } else {
      self.error(format!("'{}' expected.", p))
    }
  }

  fn expect_keyword(&mut self, name: &str) -> PResult<()> {
    if self.eat_ident(name) {
      Ok(())
    } else {
      self.error(format!("'{}' expected.", name))
    }
  }

  fn ident(&mut self) -> PResult<String> {
    match self.tok().ident() {
      Some(name) => {
        let name = name.to_string();
        self.advance();
        Ok(name)
      }
      None => self.error("Identifier expected."),
    }
  }

  fn string_literal(&mut self) -> PResult<StrLit> {
    match &self.tok().kind {
      TokenKind::Str { raw, value } => {
        let lit = StrLit {
          raw: raw.clone(),
          value: value.clone(),
        };
        self.advance();
        Ok(lit)
      }
      _ => self.error("String literal expected."),
    }
  }

  fn semicolon(&mut self) -> PResult<()> {
    if self.eat(";") || self.at("}") || self.at_eof() || self.tok().newline_before {
      Ok(())
    } else {
      self.error("';' expected.")
    }
  }

  fn adjacent(&self, a: usize, b: usize) -> bool {
    self.peek(a).end == self.peek(b).start
  }

  // --------------------------------------------------------------------------
  // Statements
  // --------------------------------------------------------------------------

  fn statements(&mut self, in_block: bool) -> Vec<Statement> {
    let mut out = Vec::new();
    loop {
      if self.at_eof() {
        if in_block {
          self.diagnostics.push(Diagnostic::new(self.tok().pos, "'}' expected."));
        }
        break;
      }
      if in_block && self.at("}") {
        break;
      }
      match self.statement() {
        Ok(Some(stmt)) => out.push(stmt),
        Ok(None) => {}
        Err(diagnostic) => {
          self.diagnostics.push(diagnostic);
          self.synchronize();
        }
      }
    }
    out
  }

  fn synchronize(&mut self) {
    let start = self.idx;
    let mut depth = 0usize;
    while !self.at_eof() {
      if self.at("}") {
        if depth == 0 {
          if self.idx == start {
            self.advance();
          }
          return;
        }
        depth -= 1;
        self.advance();
        if depth == 0 {
          self.eat(";");
          return;
        }
        continue;
      }
      if self.at("{") {
        depth += 1;
      } else if self.at(";") && depth == 0 {
        self.advance();
        return;
      }
      self.advance();
    }
  }

  fn statement(&mut self) -> PResult<Option<Statement>> {
    let doc = self.tok().doc.clone();
    let pos = self.tok().pos;

    if self.eat(";") {
      return Ok(None);
    }

    let mut modifiers = Modifiers::default();
    if self.at_ident("export") {
      if let Some(kind) = self.export_form()? {
        return Ok(Some(Statement {
          doc,
          pos,
          modifiers,
          kind,
        }));
      }
    }

    self.modifiers(&mut modifiers);
    let kind = self.declaration()?;
    Ok(Some(Statement {
      doc,
      pos,
      modifiers,
      kind,
    }))
  }

  /// Export statements that are not modifiers on a declaration
  fn export_form(&mut self) -> PResult<Option<StatementKind>> {
    let next = self.peek(1).clone();
    if next.is_punct("=") {
      self.advance();
      self.advance();
      let expr = self.expr()?;
      self.semicolon()?;
      return Ok(Some(StatementKind::ExportAssignment { expr, is_equals: true }));
    }
    if next.is_punct("{") || (next.is_ident("type") && self.peek(2).is_punct("{")) {
      self.advance();
      let type_only = self.eat_ident("type");
      let specifiers = self.specifiers()?;
      let from = if self.eat_ident("from") {
        Some(self.string_literal()?)
      } else {
        None
      };
      self.semicolon()?;
      return Ok(Some(StatementKind::ExportNamed(ExportNamedDecl {
        type_only,
        specifiers,
        from,
      })));
    }
    if next.is_punct("*") {
      self.advance();
      self.advance();
      let alias = if self.eat_ident("as") { Some(self.ident()?) } else { None };
      self.expect_keyword("from")?;
      let from = self.string_literal()?;
      self.semicolon()?;
      return Ok(Some(StatementKind::ExportStar { alias, from }));
    }
    if next.is_ident("as") && self.peek(2).is_ident("namespace") {
      self.advance();
      self.advance();
      self.advance();
      let name = self.ident()?;
      self.semicolon()?;
      return Ok(Some(StatementKind::ExportAsNamespace(name)));
    }
    if next.is_ident("default") && !is_declaration_start(self.peek(2)) {
      self.advance();
      self.advance();
      let expr = self.expr()?;
      self.semicolon()?;
      return Ok(Some(StatementKind::ExportAssignment { expr, is_equals: false }));
    }
    Ok(None)
  }

  fn modifiers(&mut self, m: &mut Modifiers) {
    loop {
      let next = self.peek(1);
      let next_is_word = next.ident().is_some();
      match self.tok().ident() {
        Some("export") if next_is_word => m.export = true,
        Some("default") if m.export && next_is_word => m.default = true,
        Some("declare") if next_is_word && !next.newline_before => m.declare = true,
        Some("abstract") if next.is_ident("class") => m.abstract_ = true,
        Some("const") if next.is_ident("enum") => m.const_ = true,
        _ => return,
      }
      self.advance();
    }
  }

  fn declaration(&mut self) -> PResult<StatementKind> {
    let keyword = self.tok().ident().map(str::to_string);
    match keyword.as_deref() {
      Some("namespace") | Some("module") => self.module_decl(),
      Some("global") if self.peek(1).is_punct("{") => {
        self.advance();
        let body = self.block()?;
        Ok(StatementKind::Module(ModuleDecl {
          keyword: ModuleKeyword::Global,
          name: ModuleName::Global,
          body: Some(body),
        }))
      }
      Some("interface") => self.interface_decl(),
      Some("type") if self.peek(1).ident().is_some() => self.type_alias_decl(),
      Some("enum") => self.enum_decl(),
      Some("class") => self.class_decl(),
      Some("function") => self.function_decl(),
      Some("var") | Some("let") | Some("const") => self.variable_statement(),
      Some("import") => self.import_decl(),
      _ => self.error("Declaration or statement expected."),
    }
  }

  fn block(&mut self) -> PResult<Vec<Statement>> {
    self.expect("{")?;
    let body = self.statements(true);
    self.expect("}")?;
    Ok(body)
  }

  fn module_decl(&mut self) -> PResult<StatementKind> {
    let keyword = if self.advance().is_ident("namespace") {
      ModuleKeyword::Namespace
    } else {
      ModuleKeyword::Module
    };

    let name = if keyword == ModuleKeyword::Module && matches!(self.tok().kind, TokenKind::Str { .. }) {
      ModuleName::Literal(self.string_literal()?)
    } else {
      let mut path = vec![self.ident()?];
      while self.eat(".") {
        path.push(self.ident()?);
      }
      ModuleName::Path(path)
    };

    let body = if self.at("{") {
      Some(self.block()?)
    } else {
      if !matches!(name, ModuleName::Literal(_)) {
        return self.error("'{' expected.");
      }
      self.semicolon()?;
      None
    };

    Ok(StatementKind::Module(ModuleDecl { keyword, name, body }))
  }

  fn interface_decl(&mut self) -> PResult<StatementKind> {
    self.advance();
    let name = self.ident()?;
    let type_params = self.type_params()?;
    let mut extends = Vec::new();
    if self.eat_ident("extends") {
      loop {
        extends.push(self.type_ref()?);
        if !self.eat(",") {
          break;
        }
      }
    }
    let members = self.members(false)?;
    Ok(StatementKind::Interface(InterfaceDecl {
      name,
      type_params,
      extends,
      members,
    }))
  }

  fn type_alias_decl(&mut self) -> PResult<StatementKind> {
    self.advance();
    let name = self.ident()?;
    let type_params = self.type_params()?;
    self.expect("=")?;
    let ty = self.parse_type()?;
    self.semicolon()?;
    Ok(StatementKind::TypeAlias(TypeAliasDecl { name, type_params, ty }))
  }

  fn enum_decl(&mut self) -> PResult<StatementKind> {
    self.advance();
    let name = self.ident()?;
    self.expect("{")?;
    let mut members = Vec::new();
    while !self.at("}") {
      let doc = self.tok().doc.clone();
      let pos = self.tok().pos;
      let member_name = self.property_name()?;
      let init = if self.eat("=") { Some(self.expr()?) } else { None };
      members.push(EnumMember {
        doc,
        pos,
        name: member_name,
        init,
      });
      if !self.eat(",") {
        break;
      }
    }
    self.expect("}")?;
    Ok(StatementKind::Enum(EnumDecl { name, members }))
  }

  fn class_decl(&mut self) -> PResult<StatementKind> {
    self.advance();
    let name = match self.tok().ident() {
      Some(n) if n != "extends" && n != "implements" => Some(self.ident()?),
      _ => None,
    };
    let type_params = self.type_params()?;
    let extends = if self.eat_ident("extends") {
      Some(self.type_ref()?)
    } else {
      None
    };
    let mut implements = Vec::new();
    if self.eat_ident("implements") {
      loop {
        implements.push(self.type_ref()?);
        if !self.eat(",") {
          break;
        }
      }
    }
    let members = self.members(true)?;
    Ok(StatementKind::Class(ClassDecl {
      name,
      type_params,
      extends,
      implements,
      members,
    }))
  }

  fn function_decl(&mut self) -> PResult<StatementKind> {
    self.advance();
    let name = self.ident()?;
    let sig = self.signature()?;
    if self.at("{") {
      return self.error("An implementation cannot be declared in ambient contexts.");
    }
    self.semicolon()?;
    Ok(StatementKind::Function(FunctionDecl { name, sig }))
  }

  fn variable_statement(&mut self) -> PResult<StatementKind> {
    let kind = match self.advance().ident() {
      Some("var") => VarKind::Var,
      Some("let") => VarKind::Let,
      _ => VarKind::Const,
    };
    let mut decls = Vec::new();
    loop {
      let pos = self.tok().pos;
      let name = self.ident()?;
      let ty = if self.eat(":") { Some(self.parse_type()?) } else { None };
      let init = if self.eat("=") { Some(self.expr()?) } else { None };
      decls.push(VarDecl { pos, name, ty, init });
      if !self.eat(",") {
        break;
      }
    }
    self.semicolon()?;
    Ok(StatementKind::Variable(VariableStatement { kind, decls }))
  }

  fn import_decl(&mut self) -> PResult<StatementKind> {
    self.advance();

    if matches!(self.tok().kind, TokenKind::Str { .. }) {
      let from = self.string_literal()?;
      self.semicolon()?;
      return Ok(StatementKind::Import(ImportDecl {
        type_only: false,
        default: None,
        namespace: None,
        named: None,
        from,
      }));
    }

    if self.tok().ident().is_some() && self.peek(1).is_punct("=") {
      let name = self.ident()?;
      self.advance();
      let target = if self.at_ident("require") && self.peek(1).is_punct("(") {
        self.advance();
        self.advance();
        let module = self.string_literal()?;
        self.expect(")")?;
        ImportTarget::Require(module)
      } else {
        ImportTarget::Entity(self.entity_name()?)
      };
      self.semicolon()?;
      return Ok(StatementKind::ImportEquals { name, target });
    }

    let type_only = self.at_ident("type") && (self.peek(1).ident().is_some_and(|n| n != "from") || self.peek(1).is_punct("{") || self.peek(1).is_punct("*"));
    if type_only {
      self.advance();
    }

    let mut default = None;
    if self.tok().ident().is_some() && !self.at_ident("from") {
      default = Some(self.ident()?);
      self.eat(",");
    }

    let mut namespace = None;
    let mut named = None;
    if self.eat("*") {
      self.expect_keyword("as")?;
      namespace = Some(self.ident()?);
    } else if self.at("{") {
      named = Some(self.specifiers()?);
    }

    self.expect_keyword("from")?;
    let from = self.string_literal()?;
    self.semicolon()?;
    Ok(StatementKind::Import(ImportDecl {
      type_only,
      default,
      namespace,
      named,
      from,
    }))
  }

  fn specifiers(&mut self) -> PResult<Vec<Specifier>> {
    self.expect("{")?;
    let mut out = Vec::new();
    while !self.at("}") {
      let next = self.peek(1);
      let type_only = self.at_ident("type") && next.ident().is_some_and(|n| n != "as");
      if type_only {
        self.advance();
      }
      let name = self.ident()?;
      let alias = if self.eat_ident("as") { Some(self.ident()?) } else { None };
      out.push(Specifier { type_only, name, alias });
      if !self.eat(",") {
        break;
      }
    }
    self.expect("}")?;
    Ok(out)
  }

  // --------------------------------------------------------------------------
  // Signatures and members
  // --------------------------------------------------------------------------

  fn type_params(&mut self) -> PResult<Vec<TypeParam>> {
    let mut out = Vec::new();
    if !self.eat("<") {
      return Ok(out);
    }
    loop {
      let mut modifiers = Vec::new();
      while matches!(self.tok().ident(), Some("in" | "out" | "const")) && self.peek(1).ident().is_some() {
        modifiers.push(self.ident()?);
      }
      let name = self.ident()?;
      let constraint = if self.eat_ident("extends") {
        Some(self.parse_type()?)
      } else {
        None
      };
      let default = if self.eat("=") { Some(self.parse_type()?) } else { None };
      out.push(TypeParam {
        modifiers,
        name,
        constraint,
        default,
      });
      if !self.eat(",") {
        break;
      }
    }
    self.expect(">")?;
    Ok(out)
  }

  fn signature(&mut self) -> PResult<Signature> {
    let type_params = self.type_params()?;
    let params = self.params()?;
    let ret = if self.eat(":") { Some(self.return_type()?) } else { None };
    Ok(Signature {
      type_params,
      params,
      ret,
    })
  }

  fn params(&mut self) -> PResult<Vec<Param>> {
    self.expect("(")?;
    let mut out = Vec::new();
    while !self.at(")") {
      out.push(self.param()?);
      if !self.eat(",") {
        break;
      }
    }
    self.expect(")")?;
    Ok(out)
  }

  fn param(&mut self) -> PResult<Param> {
    let mut modifiers = Vec::new();
    while let Some(m) = self.tok().ident() {
      let next = self.peek(1);
      let followed_by_name = next.ident().is_some() || next.is_punct("{") || next.is_punct("[") || next.is_punct("...");
      if PARAM_MODIFIERS.contains(&m) && followed_by_name {
        modifiers.push(self.ident()?);
      } else {
        break;
      }
    }
    let rest = self.eat("...");
    let name = if self.at("{") || self.at("[") {
      ParamName::Pattern(self.binding_pattern()?)
    } else {
      ParamName::Ident(self.ident()?)
    };
    let optional = self.eat("?");
    let ty = if self.eat(":") { Some(self.parse_type()?) } else { None };
    if self.at("=") {
      return self.error("A parameter initializer is only allowed in a function or constructor implementation.");
    }
    Ok(Param {
      modifiers,
      rest,
      name,
      optional,
      ty,
    })
  }

  /// Collect a destructuring pattern as normalized text
  fn binding_pattern(&mut self) -> PResult<String> {
    let mut depth = 0usize;
    let mut text = String::new();
    loop {
      let t = self.advance();
      match &t.kind {
        TokenKind::Punct(p @ ("{" | "[")) => {
          depth += 1;
          text.push_str(p);
          if *p == "{" {
            text.push(' ');
          }
        }
        TokenKind::Punct(p @ ("}" | "]")) => {
          depth = depth.saturating_sub(1);
          let trimmed = text.trim_end().len();
          text.truncate(trimmed);
          if *p == "}" {
            text.push(' ');
          }
          text.push_str(p);
        }
        TokenKind::Punct(p @ ("," | ":")) => {
          text.push_str(p);
          text.push(' ');
        }
        TokenKind::Punct(p) => text.push_str(p),
        TokenKind::Ident(n) | TokenKind::Number(n) | TokenKind::Template(n) => text.push_str(n),
        TokenKind::Str { raw, .. } => text.push_str(raw),
        TokenKind::Eof => return Err(Diagnostic::new(t.pos, "'}' expected.")),
      }
      if depth == 0 {
        return Ok(text.trim_end().to_string());
      }
    }
  }

  fn members(&mut self, in_class: bool) -> PResult<Vec<Member>> {
    self.expect("{")?;
    let mut out = Vec::new();
    loop {
      if self.at("}") {
        break;
      }
      if self.eat(";") || self.eat(",") {
        continue;
      }
      if self.at_eof() {
        return self.error("'}' expected.");
      }
      out.push(self.member(in_class)?);
      if !(self.eat(";") || self.eat(",")) && !self.at("}") && !self.tok().newline_before {
        return self.error("';' expected.");
      }
    }
    self.expect("}")?;
    Ok(out)
  }

  fn member(&mut self, in_class: bool) -> PResult<Member> {
    let doc = self.tok().doc.clone();
    let pos = self.tok().pos;
    let mut modifiers = Vec::new();
    while let Some(m) = self.tok().ident() {
      let allowed = if in_class {
        CLASS_MEMBER_MODIFIERS.contains(&m)
      } else {
        m == "readonly"
      };
      if allowed && starts_member_name(self.peek(1)) {
        modifiers.push(self.ident()?);
      } else {
        break;
      }
    }

    let kind = self.member_kind(in_class)?;
    Ok(Member {
      doc,
      pos,
      modifiers,
      kind,
    })
  }

  fn member_kind(&mut self, in_class: bool) -> PResult<MemberKind> {
    if self.at("(") || self.at("<") {
      return Ok(MemberKind::Call(self.signature()?));
    }
    if !in_class && self.at_ident("new") && (self.peek(1).is_punct("(") || self.peek(1).is_punct("<")) {
      self.advance();
      return Ok(MemberKind::Construct(self.signature()?));
    }
    if in_class && self.at_ident("constructor") && self.peek(1).is_punct("(") {
      self.advance();
      return Ok(MemberKind::Constructor(self.params()?));
    }
    if self.at("[") && self.peek(1).ident().is_some() && self.peek(2).is_punct(":") {
      self.advance();
      let param = self.ident()?;
      self.expect(":")?;
      let key = self.parse_type()?;
      self.expect("]")?;
      self.expect(":")?;
      let ty = self.parse_type()?;
      return Ok(MemberKind::Index { param, key, ty });
    }
    if (self.at_ident("get") || self.at_ident("set")) && starts_member_name(self.peek(1)) {
      let is_get = self.advance().is_ident("get");
      let name = self.property_name()?;
      let mut params = self.params()?;
      let ret = if self.eat(":") { Some(self.parse_type()?) } else { None };
      if is_get {
        return Ok(MemberKind::Get { name, ret });
      }
      if params.is_empty() {
        return self.error("A 'set' accessor must have exactly one parameter.");
      }
      return Ok(MemberKind::Set {
        name,
        param: params.remove(0),
      });
    }

    let name = self.property_name()?;
    let optional = self.eat("?");
    if !optional {
      self.eat("!");
    }
    if self.at("(") || self.at("<") {
      let sig = self.signature()?;
      return Ok(MemberKind::Method { name, optional, sig });
    }
    let ty = if self.eat(":") { Some(self.parse_type()?) } else { None };
    let init = if self.eat("=") { Some(self.expr()?) } else { None };
    Ok(MemberKind::Property {
      name,
      optional,
      ty,
      init,
    })
  }

  fn property_name(&mut self) -> PResult<PropertyName> {
    let t = self.tok().clone();
    match t.kind {
      TokenKind::Ident(name) => {
        self.advance();
        Ok(PropertyName::Ident(name))
      }
      TokenKind::Str { raw, value } => {
        self.advance();
        Ok(PropertyName::Str(StrLit { raw, value }))
      }
      TokenKind::Number(n) => {
        self.advance();
        Ok(PropertyName::Num(n))
      }
      TokenKind::Punct("[") => {
        self.advance();
        let expr = self.expr()?;
        self.expect("]")?;
        Ok(PropertyName::Computed(expr))
      }
      _ => self.error("Property or signature expected."),
    }
  }

  // --------------------------------------------------------------------------
  // Types
  // --------------------------------------------------------------------------

  fn entity_name(&mut self) -> PResult<EntityName> {
    let pos = self.tok().pos;
    let mut segments = vec![self.ident()?];
    while self.at(".") && self.peek(1).ident().is_some() {
      self.advance();
      segments.push(self.ident()?);
    }
    Ok(EntityName { pos, segments })
  }

  fn type_ref(&mut self) -> PResult<TypeRef> {
    let name = self.entity_name()?;
    let args = self.type_args()?;
    Ok(TypeRef { name, args })
  }

  fn type_args(&mut self) -> PResult<Vec<Type>> {
    let mut args = Vec::new();
    if !self.at("<") || self.tok().newline_before {
      return Ok(args);
    }
    self.advance();
    loop {
      args.push(self.parse_type()?);
      if !self.eat(",") {
        break;
      }
    }
    self.expect(">")?;
    Ok(args)
  }

  fn parse_type(&mut self) -> PResult<Type> {
    let saved = std::mem::replace(&mut self.in_conditional_extends, false);
    let result = self.type_(true);
    self.in_conditional_extends = saved;
    result
  }

  fn return_type(&mut self) -> PResult<Type> {
    if self.at_ident("asserts") && self.peek(1).ident().is_some() && !self.peek(1).newline_before {
      self.advance();
      let param = self.ident()?;
      let ty = if self.eat_ident("is") {
        Some(Box::new(self.parse_type()?))
      } else {
        None
      };
      return Ok(Type::Predicate {
        asserts: true,
        param,
        ty,
      });
    }
    if self.tok().ident().is_some() && self.peek(1).is_ident("is") && !self.peek(1).newline_before {
      let param = self.ident()?;
      self.advance();
      let ty = self.parse_type()?;
      return Ok(Type::Predicate {
        asserts: false,
        param,
        ty: Some(Box::new(ty)),
      });
    }
    self.parse_type()
  }

  fn type_(&mut self, allow_conditional: bool) -> PResult<Type> {
    if self.is_start_of_function_type() {
      return self.function_type(false, false);
    }
    if self.at_ident("new") && (self.peek(1).is_punct("(") || self.peek(1).is_punct("<")) {
      return self.function_type(true, false);
    }
    if self.at_ident("abstract") && self.peek(1).is_ident("new") {
      self.advance();
      return self.function_type(true, true);
    }

    let check = self.union_type()?;
    if allow_conditional && self.at_ident("extends") && !self.tok().newline_before {
      self.advance();
      let saved = std::mem::replace(&mut self.in_conditional_extends, true);
      let extends = self.type_(false);
      self.in_conditional_extends = saved;
      let extends = extends?;
      self.expect("?")?;
      let true_ty = self.parse_type()?;
      self.expect(":")?;
      let false_ty = self.parse_type()?;
      return Ok(Type::Conditional {
        check: Box::new(check),
        extends: Box::new(extends),
        true_ty: Box::new(true_ty),
        false_ty: Box::new(false_ty),
      });
    }
    Ok(check)
  }

  fn is_start_of_function_type(&self) -> bool {
    if self.at("<") {
      return true;
    }
    if !self.at("(") {
      return false;
    }
    let t1 = self.peek(1);
    if t1.is_punct(")") || t1.is_punct("...") {
      return true;
    }
    let Some(i) = self.skip_param_start(1) else {
      return false;
    };
    let t = self.peek(i);
    if t.is_punct(":") || t.is_punct(",") || t.is_punct("?") || t.is_punct("=") {
      return true;
    }
    t.is_punct(")") && self.peek(i + 1).is_punct("=>")
  }

  fn skip_param_start(&self, i: usize) -> Option<usize> {
    let t = self.peek(i);
    if let Some(name) = t.ident() {
      if PARAM_MODIFIERS.contains(&name) && self.peek(i + 1).ident().is_some() {
        return Some(i + 2);
      }
      return Some(i + 1);
    }
    if t.is_punct("{") || t.is_punct("[") {
      let mut depth = 0usize;
      let mut j = i;
      loop {
        let tj = self.peek(j);
        if tj.kind == TokenKind::Eof {
          return None;
        }
        if tj.is_punct("{") || tj.is_punct("[") {
          depth += 1;
        } else if tj.is_punct("}") || tj.is_punct("]") {
          depth -= 1;
          if depth == 0 {
            return Some(j + 1);
          }
        }
        j += 1;
      }
    }
    None
  }

  fn function_type(&mut self, is_constructor: bool, is_abstract: bool) -> PResult<Type> {
    if is_constructor {
      self.expect_keyword("new")?;
    }
    let type_params = self.type_params()?;
    let params = self.params()?;
    self.expect("=>")?;
    let ret = self.return_type()?;
    Ok(Type::Function {
      is_constructor,
      is_abstract,
      sig: Box::new(Signature {
        type_params,
        params,
        ret: Some(ret),
      }),
    })
  }

  fn union_type(&mut self) -> PResult<Type> {
    self.eat("|");
    let first = self.intersection_type()?;
    if !self.at("|") {
      return Ok(first);
    }
    let mut types = vec![first];
    while self.eat("|") {
      types.push(self.intersection_type()?);
    }
    Ok(Type::Union(types))
  }

  fn intersection_type(&mut self) -> PResult<Type> {
    self.eat("&");
    let first = self.type_operator()?;
    if !self.at("&") {
      return Ok(first);
    }
    let mut types = vec![first];
    while self.eat("&") {
      types.push(self.type_operator()?);
    }
    Ok(Type::Intersection(types))
  }

  fn type_operator(&mut self) -> PResult<Type> {
    if matches!(self.tok().ident(), Some("keyof" | "unique" | "readonly")) && starts_type(self.peek(1)) {
      let op = self.ident()?;
      let ty = self.type_operator()?;
      return Ok(Type::Operator { op, ty: Box::new(ty) });
    }
    if self.at_ident("infer") && self.peek(1).ident().is_some() {
      self.advance();
      let name = self.ident()?;
      let constraint = self.infer_constraint();
      return Ok(Type::Infer { name, constraint });
    }
    self.postfix_type()
  }

  /// Optional `extends C` after `infer X`
  ///
  /// Directly inside a conditional's `extends` clause the constraint always
  /// binds. Elsewhere a following `?` means the `extends` starts a conditional
  /// type instead, so the cursor is rewound.
  fn infer_constraint(&mut self) -> Option<Box<Type>> {
    if !self.at_ident("extends") {
      return None;
    }
    let start = self.idx;
    self.advance();
    let saved = std::mem::replace(&mut self.in_conditional_extends, true);
    let constraint = self.type_(false);
    self.in_conditional_extends = saved;

    match constraint {
      Ok(ty) if saved || !self.at("?") => Some(Box::new(ty)),
      _ => {
        self.idx = start;
        None
      }
    }
  }

  fn postfix_type(&mut self) -> PResult<Type> {
    let mut ty = self.primary_type()?;
    while self.at("[") && !self.tok().newline_before {
      self.advance();
      if self.eat("]") {
        ty = Type::Array(Box::new(ty));
      } else {
        let index = self.parse_type()?;
        self.expect("]")?;
        ty = Type::IndexedAccess {
          object: Box::new(ty),
          index: Box::new(index),
        };
      }
    }
    Ok(ty)
  }

  fn primary_type(&mut self) -> PResult<Type> {
    let t = self.tok().clone();
    match t.kind {
      TokenKind::Punct("(") => {
        self.advance();
        let inner = self.parse_type()?;
        self.expect(")")?;
        Ok(Type::Paren(Box::new(inner)))
      }
      TokenKind::Punct("{") => {
        if self.is_mapped_type_start() {
          self.mapped_type()
        } else {
          Ok(Type::TypeLiteral(self.members(false)?))
        }
      }
      TokenKind::Punct("[") => self.tuple_type(),
      TokenKind::Punct("-") => {
        self.advance();
        match self.tok().kind.clone() {
          TokenKind::Number(n) => {
            self.advance();
            Ok(Type::Negative(n))
          }
          _ => self.error("Numeric literal expected."),
        }
      }
      TokenKind::Str { raw, value } => {
        self.advance();
        Ok(Type::Literal(Literal::Str(StrLit { raw, value })))
      }
      TokenKind::Number(n) => {
        self.advance();
        Ok(Type::Literal(Literal::Num(n)))
      }
      TokenKind::Template(raw) => {
        self.advance();
        Ok(Type::Literal(Literal::Template(raw)))
      }
      TokenKind::Ident(name) => match name.as_str() {
        "typeof" => {
          self.advance();
          if self.at_ident("import") {
            return self.import_type(true);
          }
          let name = self.entity_name()?;
          let args = self.type_args()?;
          Ok(Type::Query { name, args })
        }
        "import" if self.peek(1).is_punct("(") => self.import_type(false),
        "true" => {
          self.advance();
          Ok(Type::Literal(Literal::True))
        }
        "false" => {
          self.advance();
          Ok(Type::Literal(Literal::False))
        }
        "null" => {
          self.advance();
          Ok(Type::Literal(Literal::Null))
        }
        kw if KEYWORD_TYPES.contains(&kw) && !self.peek(1).is_punct(".") => {
          self.advance();
          Ok(Type::Keyword(name.clone()))
        }
        _ => Ok(Type::Reference(self.type_ref()?)),
      },
      _ => self.error("Type expected."),
    }
  }

  fn import_type(&mut self, is_typeof: bool) -> PResult<Type> {
    self.expect_keyword("import")?;
    self.expect("(")?;
    let module = self.string_literal()?;
    self.expect(")")?;
    let mut qualifier = Vec::new();
    while self.eat(".") {
      qualifier.push(self.ident()?);
    }
    let args = self.type_args()?;
    Ok(Type::Import {
      is_typeof,
      module,
      qualifier: if qualifier.is_empty() { None } else { Some(qualifier) },
      args,
    })
  }

  fn is_mapped_type_start(&self) -> bool {
    let mut i = 1;
    if self.peek(i).is_punct("+") || self.peek(i).is_punct("-") {
      i += 1;
    }
    if self.peek(i).is_ident("readonly") {
      i += 1;
    }
    self.peek(i).is_punct("[") && self.peek(i + 1).ident().is_some() && self.peek(i + 2).is_ident("in")
  }

  fn mapped_type(&mut self) -> PResult<Type> {
    self.expect("{")?;
    let readonly = if self.at("+") || self.at("-") {
      let op = if self.advance().is_punct("+") { "+" } else { "-" };
      self.expect_keyword("readonly")?;
      Some(op.to_string())
    } else if self.eat_ident("readonly") {
      Some(String::new())
    } else {
      None
    };
    self.expect("[")?;
    let param = self.ident()?;
    self.expect_keyword("in")?;
    let constraint = self.parse_type()?;
    let name_type = if self.eat_ident("as") {
      Some(Box::new(self.parse_type()?))
    } else {
      None
    };
    self.expect("]")?;
    let optional = if self.at("+") || self.at("-") {
      let op = if self.advance().is_punct("+") { "+" } else { "-" };
      self.expect("?")?;
      Some(op.to_string())
    } else if self.eat("?") {
      Some(String::new())
    } else {
      None
    };
    let ty = if self.eat(":") {
      Some(Box::new(self.parse_type()?))
    } else {
      None
    };
    if !self.eat(";") {
      self.eat(",");
    }
    self.expect("}")?;
    Ok(Type::Mapped {
      readonly,
      param,
      constraint: Box::new(constraint),
      name_type,
      optional,
      ty,
    })
  }

  fn tuple_type(&mut self) -> PResult<Type> {
    self.expect("[")?;
    let mut elements = Vec::new();
    while !self.at("]") {
      let rest = self.eat("...");
      let named = self.tok().ident().is_some()
        && (self.peek(1).is_punct(":") || (self.peek(1).is_punct("?") && self.peek(2).is_punct(":")));
      let element = if named {
        let name = self.ident()?;
        let optional = self.eat("?");
        self.expect(":")?;
        let ty = self.parse_type()?;
        TupleElement {
          name: Some(name),
          rest,
          optional,
          ty,
        }
      } else {
        let ty = self.parse_type()?;
        let optional = self.eat("?");
        TupleElement {
          name: None,
          rest,
          optional,
          ty,
        }
      };
      elements.push(element);
      if !self.eat(",") {
        break;
      }
    }
    self.expect("]")?;
    Ok(Type::Tuple(elements))
  }

  // --------------------------------------------------------------------------
  // Expressions (initializers and export assignments only)
  // --------------------------------------------------------------------------

  fn expr(&mut self) -> PResult<Expr> {
    self.binary(1)
  }

  fn binary_op(&self) -> Option<(&'static str, usize, u8)> {
    if self.at("<") && self.peek(1).is_punct("<") && self.adjacent(0, 1) {
      return Some(("<<", 2, 4));
    }
    if self.at(">") && self.peek(1).is_punct(">") && self.adjacent(0, 1) {
      if self.peek(2).is_punct(">") && self.adjacent(1, 2) {
        return Some((">>>", 3, 4));
      }
      return Some((">>", 2, 4));
    }
    let TokenKind::Punct(p) = self.tok().kind else {
      return None;
    };
    let prec = match p {
      "|" => 1,
      "^" => 2,
      "&" => 3,
      "+" | "-" => 5,
      "*" | "/" | "%" => 6,
      _ => return None,
    };
    Some((p, 1, prec))
  }

  fn binary(&mut self, min_prec: u8) -> PResult<Expr> {
    let mut left = self.unary()?;
    while let Some((op, width, prec)) = self.binary_op() {
      if prec < min_prec {
        break;
      }
      for _ in 0..width {
        self.advance();
      }
      let right = self.binary(prec + 1)?;
      left = Expr::Binary {
        op: op.to_string(),
        left: Box::new(left),
        right: Box::new(right),
      };
    }
    Ok(left)
  }

  fn unary(&mut self) -> PResult<Expr> {
    for op in ["-", "+", "~", "!"] {
      if self.eat(op) {
        let expr = self.unary()?;
        return Ok(Expr::Unary {
          op: op.to_string(),
          expr: Box::new(expr),
        });
      }
    }
    self.primary_expr()
  }

  fn primary_expr(&mut self) -> PResult<Expr> {
    let t = self.tok().clone();
    let mut expr = match t.kind {
      TokenKind::Number(n) => {
        self.advance();
        Expr::Literal(Literal::Num(n))
      }
      TokenKind::Str { raw, value } => {
        self.advance();
        Expr::Literal(Literal::Str(StrLit { raw, value }))
      }
      TokenKind::Template(raw) => {
        self.advance();
        Expr::Literal(Literal::Template(raw))
      }
      TokenKind::Punct("(") => {
        self.advance();
        let inner = self.expr()?;
        self.expect(")")?;
        Expr::Paren(Box::new(inner))
      }
      TokenKind::Ident(ref name) if name == "true" => {
        self.advance();
        Expr::Literal(Literal::True)
      }
      TokenKind::Ident(ref name) if name == "false" => {
        self.advance();
        Expr::Literal(Literal::False)
      }
      TokenKind::Ident(ref name) if name == "null" => {
        self.advance();
        Expr::Literal(Literal::Null)
      }
      TokenKind::Ident(_) => Expr::Name(self.entity_name()?),
      _ => return self.error("Expression expected."),
    };
    while self.at("[") {
      self.advance();
      let index = self.expr()?;
      self.expect("]")?;
      expr = Expr::Element {
        object: Box::new(expr),
        index: Box::new(index),
      };
    }
    Ok(expr)
  }
}

fn is_declaration_start(t: &Token) -> bool {
  matches!(
    t.ident(),
    Some("class" | "function" | "interface" | "abstract" | "enum" | "namespace" | "const" | "declare")
  )
}

fn starts_member_name(t: &Token) -> bool {
  matches!(
    t.kind,
    TokenKind::Ident(_) | TokenKind::Str { .. } | TokenKind::Number(_) | TokenKind::Punct("[")
  )
}

fn starts_type(t: &Token) -> bool {
  matches!(
    t.kind,
    TokenKind::Ident(_)
      | TokenKind::Str { .. }
      | TokenKind::Number(_)
      | TokenKind::Template(_)
      | TokenKind::Punct("(" | "[" | "{" | "<" | "-")
  )
}
