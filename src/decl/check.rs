//! Semantic checks for declaration text
//!
//! Binding runs first over the whole file so forward references and merged
//! declarations (repeated namespaces, interfaces, same-name module blocks)
//! resolve the way a compiler would see them. The check pass then walks every
//! type and initializer with a lexical scope chain.

use std::collections::{HashMap, HashSet};

use super::ast::*;
use super::builtins;
use super::diagnostic::{Diagnostic, Pos};

pub const TYPE: u8 = 1;
pub const VALUE: u8 = 2;
pub const NAMESPACE: u8 = 4;
const ANY: u8 = TYPE | VALUE | NAMESPACE;

const GLOBAL: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymKind {
  Interface,
  TypeAlias,
  Class,
  Enum,
  Function,
  Var,
  BlockVar,
  Namespace,
  Alias,
  EnumMember,
}

impl SymKind {
  fn spaces(self) -> u8 {
    match self {
      SymKind::Interface | SymKind::TypeAlias => TYPE,
      SymKind::Class | SymKind::EnumMember => TYPE | VALUE,
      SymKind::Enum => ANY,
      SymKind::Function | SymKind::Var | SymKind::BlockVar => VALUE,
      SymKind::Namespace => NAMESPACE | VALUE,
      SymKind::Alias => ANY,
    }
  }
}

fn can_merge(a: SymKind, b: SymKind) -> bool {
  use SymKind::*;
  match (a, b) {
    (Alias, _) | (_, Alias) => false,
    (Namespace, BlockVar) | (BlockVar, Namespace) => false,
    (Namespace, _) | (_, Namespace) => true,
    (Interface, Interface) | (Interface, Class) | (Class, Interface) => true,
    (Function, Function) | (Enum, Enum) | (Var, Var) => true,
    _ => a.spaces() & b.spaces() == 0,
  }
}

#[derive(Debug, Default)]
struct Symbol {
  kinds: Vec<SymKind>,
  /// Exports of a namespace or members of an enum
  members: Option<usize>,
}

impl Symbol {
  fn spaces(&self) -> u8 {
    self.kinds.iter().fold(0, |acc, k| acc | k.spaces())
  }

  /// Values whose properties are not tracked
  fn is_opaque_value(&self) -> bool {
    self.kinds.iter().any(|k| {
      matches!(
        k,
        SymKind::Class | SymKind::Function | SymKind::Var | SymKind::BlockVar | SymKind::Alias
      )
    })
  }
}

#[derive(Debug, Default)]
struct Table {
  symbols: HashMap<String, Symbol>,
}

enum Frame {
  Table(usize),
  Locals(HashMap<String, u8>),
}

type SymbolKey = (usize, String);

#[derive(Debug, Clone)]
struct Found {
  members: Option<usize>,
  opaque: bool,
  key: Option<SymbolKey>,
}

struct Checker {
  tables: Vec<Table>,
  /// `declare module "name"` blocks, merged by name
  modules: HashMap<String, usize>,
  frames: Vec<Frame>,
  bases: HashMap<SymbolKey, Vec<SymbolKey>>,
  heritage: Vec<(SymbolKey, Pos)>,
  diagnostics: Vec<Diagnostic>,
}

/// Check a parsed file against the ES2018 standard library
pub fn check(file: &SourceFile) -> Vec<Diagnostic> {
  let mut checker = Checker {
    tables: vec![Table::default()],
    modules: HashMap::new(),
    frames: vec![Frame::Table(GLOBAL)],
    bases: HashMap::new(),
    heritage: Vec::new(),
    diagnostics: Vec::new(),
  };
  checker.bind(&file.statements, GLOBAL);
  checker.check_statements(&file.statements, true);
  checker.check_base_cycles();
  checker.diagnostics.sort_by_key(|d| (d.pos.line, d.pos.column));
  checker.diagnostics.dedup();
  checker.diagnostics
}

impl Checker {
  fn error(&mut self, pos: Pos, message: impl Into<String>) {
    self.diagnostics.push(Diagnostic::new(pos, message));
  }

  // --------------------------------------------------------------------------
  // Binding
  // --------------------------------------------------------------------------

  fn declare(&mut self, table: usize, name: &str, kind: SymKind, pos: Pos) {
    let sym = self.tables[table].symbols.entry(name.to_string()).or_default();
    if sym.kinds.iter().any(|&k| !can_merge(k, kind)) {
      self.diagnostics.push(Diagnostic::new(pos, format!("Duplicate identifier '{}'.", name)));
      return;
    }
    sym.kinds.push(kind);
  }

  fn member_table(&mut self, table: usize, name: &str) -> usize {
    if let Some(id) = self.tables[table].symbols.get(name).and_then(|s| s.members) {
      return id;
    }
    let id = self.tables.len();
    self.tables.push(Table::default());
    self.tables[table].symbols.entry(name.to_string()).or_default().members = Some(id);
    id
  }

  fn module_table(&mut self, name: &str) -> usize {
    if let Some(&id) = self.modules.get(name) {
      return id;
    }
    let id = self.tables.len();
    self.tables.push(Table::default());
    self.modules.insert(name.to_string(), id);
    id
  }

  fn bind(&mut self, stmts: &[Statement], table: usize) {
    for stmt in stmts {
      let pos = stmt.pos;
      match &stmt.kind {
        StatementKind::Module(m) => {
          let target = match &m.name {
            ModuleName::Path(path) => {
              let mut t = table;
              for seg in path {
                self.declare(t, seg, SymKind::Namespace, pos);
                t = self.member_table(t, seg);
              }
              t
            }
            ModuleName::Literal(lit) => self.module_table(&lit.value),
            ModuleName::Global => GLOBAL,
          };
          if let Some(body) = &m.body {
            self.bind(body, target);
          }
        }
        StatementKind::Interface(d) => self.declare(table, &d.name, SymKind::Interface, pos),
        StatementKind::TypeAlias(d) => self.declare(table, &d.name, SymKind::TypeAlias, pos),
        StatementKind::Enum(d) => {
          self.declare(table, &d.name, SymKind::Enum, pos);
          let members = self.member_table(table, &d.name);
          for member in &d.members {
            if let Some(name) = static_name(&member.name) {
              self.declare(members, &name, SymKind::EnumMember, member.pos);
            }
          }
        }
        StatementKind::Class(d) => {
          if let Some(name) = &d.name {
            self.declare(table, name, SymKind::Class, pos);
          }
        }
        StatementKind::Function(d) => self.declare(table, &d.name, SymKind::Function, pos),
        StatementKind::Variable(v) => {
          let kind = if v.kind == VarKind::Var {
            SymKind::Var
          } else {
            SymKind::BlockVar
          };
          for decl in &v.decls {
            self.declare(table, &decl.name, kind, decl.pos);
          }
        }
        StatementKind::ImportEquals { name, .. } => self.declare(table, name, SymKind::Alias, pos),
        StatementKind::Import(d) => {
          let named = d.named.iter().flatten().map(|s| s.alias.as_ref().unwrap_or(&s.name));
          let locals: Vec<String> = d.default.iter().chain(d.namespace.iter()).chain(named).cloned().collect();
          for name in locals {
            self.declare(table, &name, SymKind::Alias, pos);
          }
        }
        _ => {}
      }
    }
  }

  // --------------------------------------------------------------------------
  // Resolution
  // --------------------------------------------------------------------------

  fn current_table(&self) -> usize {
    self
      .frames
      .iter()
      .rev()
      .find_map(|f| match f {
        Frame::Table(t) => Some(*t),
        Frame::Locals(_) => None,
      })
      .unwrap_or(GLOBAL)
  }

  fn lookup(&self, name: &str, want: u8) -> Option<Found> {
    for frame in self.frames.iter().rev() {
      match frame {
        Frame::Locals(locals) => {
          if locals.get(name).is_some_and(|spaces| spaces & want != 0) {
            return Some(Found {
              members: None,
              opaque: true,
              key: None,
            });
          }
        }
        Frame::Table(t) => {
          if let Some(sym) = self.tables[*t].symbols.get(name) {
            if sym.spaces() & want != 0 {
              return Some(Found {
                members: sym.members,
                opaque: sym.is_opaque_value(),
                key: Some((*t, name.to_string())),
              });
            }
          }
        }
      }
    }
    builtins::lookup(name).filter(|spaces| spaces & want != 0).map(|_| Found {
      members: None,
      opaque: true,
      key: None,
    })
  }

  /// Resolve a possibly qualified name in the requested meaning, reporting
  /// the first segment that fails
  fn resolve(&mut self, name: &EntityName, want: u8) -> Option<Found> {
    let first = name.first();
    if first == "this" {
      return None;
    }

    if !name.is_qualified() {
      if let Some(found) = self.lookup(first, want) {
        return Some(found);
      }
      if want == TYPE && self.lookup(first, NAMESPACE).is_some() {
        self.error(name.pos, format!("Cannot use namespace '{}' as a type.", first));
      } else {
        self.error(name.pos, format!("Cannot find name '{}'.", first));
      }
      return None;
    }

    let in_value = want & VALUE != 0;
    let head_want = if in_value { VALUE | NAMESPACE } else { NAMESPACE };
    let Some(mut found) = self.lookup(first, head_want) else {
      let message = if in_value {
        format!("Cannot find name '{}'.", first)
      } else {
        format!("Cannot find namespace '{}'.", first)
      };
      self.error(name.pos, message);
      return None;
    };

    let last = name.segments.len() - 1;
    let mut path = first.to_string();
    for (i, seg) in name.segments.iter().enumerate().skip(1) {
      let Some(table) = found.members else {
        return Some(found);
      };
      if in_value && found.opaque {
        return Some(found);
      }
      let space = if i == last { want } else { NAMESPACE | (want & VALUE) };
      let next = self.tables[table].symbols.get(seg).filter(|s| s.spaces() & space != 0).map(|s| Found {
        members: s.members,
        opaque: s.is_opaque_value(),
        key: Some((table, seg.clone())),
      });
      match next {
        Some(n) => found = n,
        None => {
          let message = if in_value {
            format!("Property '{}' does not exist on type 'typeof {}'.", seg, path)
          } else {
            format!("Namespace '{}' has no exported member '{}'.", path, seg)
          };
          self.error(name.pos, message);
          return None;
        }
      }
      path.push('.');
      path.push_str(seg);
    }
    Some(found)
  }

  // --------------------------------------------------------------------------
  // Statements
  // --------------------------------------------------------------------------

  fn check_statements(&mut self, stmts: &[Statement], top_level: bool) {
    for stmt in stmts {
      self.check_statement(stmt, top_level);
    }
  }

  fn check_statement(&mut self, stmt: &Statement, top_level: bool) {
    let pos = stmt.pos;
    if top_level && requires_declare(&stmt.kind) && !stmt.modifiers.declare && !stmt.modifiers.export {
      self.error(
        pos,
        "Top-level declarations in .d.ts files must start with either a 'declare' or 'export' modifier.",
      );
    }

    match &stmt.kind {
      StatementKind::Module(m) => {
        let Some(body) = &m.body else {
          return;
        };
        let depth = self.frames.len();
        match &m.name {
          ModuleName::Path(path) => {
            let mut table = self.current_table();
            for seg in path {
              let Some(next) = self.tables[table].symbols.get(seg).and_then(|s| s.members) else {
                break;
              };
              table = next;
              self.frames.push(Frame::Table(table));
            }
            if self.frames.len() - depth == path.len() {
              self.check_statements(body, false);
            }
          }
          ModuleName::Literal(lit) => {
            if !top_level {
              self.error(pos, "Ambient modules cannot be nested in other modules or namespaces.");
            }
            if let Some(&table) = self.modules.get(&lit.value) {
              self.frames.push(Frame::Table(table));
              self.check_statements(body, false);
            }
          }
          ModuleName::Global => self.check_statements(body, false),
        }
        self.frames.truncate(depth);
      }
      StatementKind::Interface(d) => {
        self.push_type_params(&d.type_params);
        for base in &d.extends {
          self.check_heritage(&d.name, base, TYPE, pos);
        }
        self.check_members(&d.members, false);
        self.frames.pop();
      }
      StatementKind::TypeAlias(d) => {
        self.push_type_params(&d.type_params);
        self.check_type(&d.ty);
        self.frames.pop();
      }
      StatementKind::Enum(d) => {
        let names = d
          .members
          .iter()
          .filter_map(|m| static_name(&m.name))
          .map(|n| (n, VALUE))
          .collect();
        self.frames.push(Frame::Locals(names));
        for member in &d.members {
          if let Some(init) = &member.init {
            self.check_expr(init);
          }
        }
        self.frames.pop();
      }
      StatementKind::Class(d) => {
        self.push_type_params(&d.type_params);
        if let Some(base) = &d.extends {
          match &d.name {
            Some(name) => self.check_heritage(name, base, TYPE | VALUE, pos),
            None => self.check_type_ref(base, TYPE | VALUE),
          }
        }
        for r in &d.implements {
          self.check_type_ref(r, TYPE);
        }
        self.check_members(&d.members, true);
        self.frames.pop();
      }
      StatementKind::Function(d) => self.check_signature(&d.sig),
      StatementKind::Variable(v) => {
        for decl in &v.decls {
          if let Some(ty) = &decl.ty {
            self.check_type(ty);
          }
          let Some(init) = &decl.init else {
            continue;
          };
          if v.kind != VarKind::Const {
            self.error(decl.pos, "Initializers are not allowed in ambient contexts.");
          } else if !is_const_literal(init) {
            self.error(
              decl.pos,
              "A 'const' initializer in an ambient context must be a string or numeric literal or literal enum reference.",
            );
          } else {
            self.check_expr(init);
          }
        }
      }
      StatementKind::ExportAssignment { expr, .. } => {
        if let Expr::Name(name) = expr {
          self.resolve(name, ANY);
        } else {
          self.check_expr(expr);
        }
      }
      StatementKind::ImportEquals {
        target: ImportTarget::Entity(name),
        ..
      } => {
        self.resolve(name, ANY);
      }
      StatementKind::ExportNamed(d) if d.from.is_none() => {
        for spec in &d.specifiers {
          if self.lookup(&spec.name, ANY).is_none() {
            self.error(pos, format!("Cannot find name '{}'.", spec.name));
          }
        }
      }
      _ => {}
    }
  }

  fn check_heritage(&mut self, own: &str, base: &TypeRef, want: u8, pos: Pos) {
    let found = self.resolve(&base.name, want);
    for arg in &base.args {
      self.check_type(arg);
    }
    if let Some(Found { key: Some(key), .. }) = found {
      let own_key = (self.current_table(), own.to_string());
      self.bases.entry(own_key.clone()).or_default().push(key);
      self.heritage.push((own_key, pos));
    }
  }

  fn check_base_cycles(&mut self) {
    let heritage = std::mem::take(&mut self.heritage);
    let mut reported = HashSet::new();
    for (key, pos) in heritage {
      if reported.contains(&key) || !self.reaches(&key, &key) {
        continue;
      }
      self.error(pos, format!("Type '{}' recursively references itself as a base type.", key.1));
      reported.insert(key);
    }
  }

  fn reaches(&self, from: &SymbolKey, target: &SymbolKey) -> bool {
    let mut stack: Vec<&SymbolKey> = self.bases.get(from).map(|v| v.iter().collect()).unwrap_or_default();
    let mut seen = HashSet::new();
    while let Some(key) = stack.pop() {
      if key == target {
        return true;
      }
      if !seen.insert(key) {
        continue;
      }
      if let Some(next) = self.bases.get(key) {
        stack.extend(next.iter());
      }
    }
    false
  }

  // --------------------------------------------------------------------------
  // Members, signatures and types
  // --------------------------------------------------------------------------

  fn push_type_params(&mut self, tps: &[TypeParam]) {
    let names = tps.iter().map(|tp| (tp.name.clone(), TYPE)).collect();
    self.frames.push(Frame::Locals(names));
    for tp in tps {
      if let Some(c) = &tp.constraint {
        self.check_type(c);
      }
      if let Some(d) = &tp.default {
        self.check_type(d);
      }
    }
  }

  fn check_members(&mut self, members: &[Member], in_class: bool) {
    for member in members {
      match &member.kind {
        MemberKind::Property { name, ty, init, .. } => {
          self.check_property_name(name);
          if let Some(ty) = ty {
            self.check_type(ty);
          }
          if let Some(init) = init {
            let readonly = member.modifiers.iter().any(|m| m == "readonly");
            if !in_class {
              self.error(member.pos, "An interface property cannot have an initializer.");
            } else if !(readonly && is_const_literal(init)) {
              self.error(member.pos, "Initializers are not allowed in ambient contexts.");
            }
          }
        }
        MemberKind::Method { name, sig, .. } => {
          self.check_property_name(name);
          self.check_signature(sig);
        }
        MemberKind::Call(sig) | MemberKind::Construct(sig) => self.check_signature(sig),
        MemberKind::Constructor(params) => self.check_params(params),
        MemberKind::Index { key, ty, .. } => {
          self.check_type(key);
          self.check_type(ty);
        }
        MemberKind::Get { name, ret } => {
          self.check_property_name(name);
          if let Some(ret) = ret {
            self.check_type(ret);
          }
        }
        MemberKind::Set { name, param } => {
          self.check_property_name(name);
          self.check_params(std::slice::from_ref(param));
        }
      }
    }
  }

  fn check_property_name(&mut self, name: &PropertyName) {
    if let PropertyName::Computed(e) = name {
      self.check_expr(e);
    }
  }

  fn check_params(&mut self, params: &[Param]) {
    for p in params {
      if let Some(ty) = &p.ty {
        self.check_type(ty);
      }
    }
  }

  fn check_signature(&mut self, sig: &Signature) {
    self.push_type_params(&sig.type_params);
    self.check_params(&sig.params);
    let names = sig
      .params
      .iter()
      .filter_map(|p| match &p.name {
        ParamName::Ident(n) => Some((n.clone(), VALUE)),
        ParamName::Pattern(_) => None,
      })
      .collect();
    self.frames.push(Frame::Locals(names));
    if let Some(ret) = &sig.ret {
      self.check_type(ret);
    }
    self.frames.pop();
    self.frames.pop();
  }

  fn check_type_ref(&mut self, r: &TypeRef, want: u8) {
    self.resolve(&r.name, want);
    for arg in &r.args {
      self.check_type(arg);
    }
  }

  fn check_type(&mut self, ty: &Type) {
    match ty {
      Type::Keyword(_) | Type::Literal(_) | Type::Negative(_) => {}
      Type::Reference(r) => self.check_type_ref(r, TYPE),
      Type::Query { name, args } => {
        self.resolve(name, VALUE);
        for arg in args {
          self.check_type(arg);
        }
      }
      Type::Import { args, .. } => {
        for arg in args {
          self.check_type(arg);
        }
      }
      Type::Array(inner) | Type::Paren(inner) | Type::Operator { ty: inner, .. } => self.check_type(inner),
      Type::Tuple(elements) => {
        for e in elements {
          self.check_type(&e.ty);
        }
      }
      Type::Union(types) | Type::Intersection(types) => {
        for t in types {
          self.check_type(t);
        }
      }
      Type::Function { sig, .. } => self.check_signature(sig),
      Type::TypeLiteral(members) => self.check_members(members, false),
      Type::Mapped {
        param,
        constraint,
        name_type,
        ty: value,
        ..
      } => {
        self.check_type(constraint);
        self.frames.push(Frame::Locals(HashMap::from([(param.clone(), TYPE)])));
        if let Some(n) = name_type {
          self.check_type(n);
        }
        if let Some(value) = value {
          self.check_type(value);
        }
        self.frames.pop();
      }
      Type::IndexedAccess { object, index } => {
        self.check_type(object);
        self.check_type(index);
      }
      Type::Conditional {
        check,
        extends,
        true_ty,
        false_ty,
      } => {
        self.check_type(check);
        let mut infers = Vec::new();
        collect_infers(extends, &mut infers);
        self.frames.push(Frame::Locals(infers.into_iter().map(|n| (n, TYPE)).collect()));
        self.check_type(extends);
        self.check_type(true_ty);
        self.frames.pop();
        self.check_type(false_ty);
      }
      Type::Infer { constraint, .. } => {
        if let Some(c) = constraint {
          self.check_type(c);
        }
      }
      Type::Predicate { ty: inner, .. } => {
        if let Some(inner) = inner {
          self.check_type(inner);
        }
      }
    }
  }

  fn check_expr(&mut self, expr: &Expr) {
    match expr {
      Expr::Name(name) => {
        self.resolve(name, VALUE);
      }
      Expr::Literal(_) => {}
      Expr::Unary { expr, .. } | Expr::Paren(expr) => self.check_expr(expr),
      Expr::Binary { left, right, .. } => {
        self.check_expr(left);
        self.check_expr(right);
      }
      Expr::Element { object, index } => {
        self.check_expr(object);
        self.check_expr(index);
      }
    }
  }
}

fn static_name(name: &PropertyName) -> Option<String> {
  match name {
    PropertyName::Ident(n) | PropertyName::Num(n) => Some(n.clone()),
    PropertyName::Str(s) => Some(s.value.clone()),
    PropertyName::Computed(_) => None,
  }
}

fn requires_declare(kind: &StatementKind) -> bool {
  match kind {
    StatementKind::Module(m) => m.keyword != ModuleKeyword::Global,
    StatementKind::Enum(_) | StatementKind::Class(_) | StatementKind::Function(_) | StatementKind::Variable(_) => true,
    _ => false,
  }
}

fn is_const_literal(expr: &Expr) -> bool {
  match expr {
    Expr::Literal(Literal::Str(_) | Literal::Num(_)) => true,
    Expr::Literal(Literal::Template(raw)) => !raw.contains("${"),
    Expr::Unary { op, expr } if op == "-" => matches!(**expr, Expr::Literal(Literal::Num(_))),
    Expr::Name(_) => true,
    _ => false,
  }
}

/// Names introduced by `infer` in the extends clause of a conditional type
fn collect_infers(ty: &Type, out: &mut Vec<String>) {
  match ty {
    Type::Infer { name, constraint } => {
      out.push(name.clone());
      if let Some(c) = constraint {
        collect_infers(c, out);
      }
    }
    Type::Reference(TypeRef { args, .. }) | Type::Query { args, .. } | Type::Import { args, .. } => {
      for arg in args {
        collect_infers(arg, out);
      }
    }
    Type::Array(inner) | Type::Paren(inner) | Type::Operator { ty: inner, .. } => collect_infers(inner, out),
    Type::Tuple(elements) => {
      for e in elements {
        collect_infers(&e.ty, out);
      }
    }
    Type::Union(types) | Type::Intersection(types) => {
      for t in types {
        collect_infers(t, out);
      }
    }
    Type::Function { sig, .. } => {
      for p in &sig.params {
        if let Some(t) = &p.ty {
          collect_infers(t, out);
        }
      }
      if let Some(ret) = &sig.ret {
        collect_infers(ret, out);
      }
    }
    Type::TypeLiteral(members) => {
      for m in members {
        if let MemberKind::Property { ty: Some(t), .. } = &m.kind {
          collect_infers(t, out);
        }
      }
    }
    Type::IndexedAccess { object, index } => {
      collect_infers(object, out);
      collect_infers(index, out);
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::decl::parser::parse;

  fn messages(src: &str) -> Vec<String> {
    check(&parse(src).unwrap()).into_iter().map(|d| d.message).collect()
  }

  #[test]
  fn test_clean_module_passes() {
    let src = r#"
declare module "typescript" {
    interface Node { kind: SyntaxKind; parent?: Node; flags: NodeFlags; }
    interface Node { pos: number; }
    enum SyntaxKind { Unknown = 0, Identifier = 1, Last = Identifier }
    const enum NodeFlags { None = 0, Let = 1 << 0, Const = 1 << 1, BlockScoped = Let | Const }
    function forEachChild<T>(node: Node, cb: (n: Node) => T | undefined): T | undefined;
    namespace forEachChild { const depth: number; }
    type Visitor = (node: Node) => VisitResult<Node>;
    type VisitResult<T extends Node> = T | readonly T[] | undefined;
    type Kinds = { [K in SyntaxKind]: K };
    type Unwrap<T> = T extends Promise<infer U> ? U : T;
    type IdKind = SyntaxKind.Identifier;
    namespace server.protocol { interface Request { seq: number; arguments: Partial<Node>; } }
    class Program implements Iterable<Node> {
        private constructor();
        [Symbol.iterator](): Iterator<Node>;
        static readonly version = "1.0";
    }
    const versionMajorMinor = "5.0";
    function isNode(x: unknown): x is Node;
    function typeOfArg(a: string): typeof a;
}
"#;
    assert_eq!(messages(src), Vec::<String>::new());
  }

  #[test]
  fn test_same_name_module_blocks_merge() {
    let src = "declare module \"typescript\" {\n    const b: A;\n}\ndeclare module \"typescript\" {\n    type A = number;\n}\n";
    assert!(messages(src).is_empty());
  }

  #[test]
  fn test_unresolved_names() {
    assert_eq!(messages("declare const a: Missing;"), vec!["Cannot find name 'Missing'."]);
    assert_eq!(messages("declare const a: ns.Missing;"), vec!["Cannot find namespace 'ns'."]);
    assert_eq!(
      messages("declare namespace ns { interface A {} }\ndeclare const a: ns.B;"),
      vec!["Namespace 'ns' has no exported member 'B'."]
    );
    assert_eq!(
      messages("declare namespace N { interface A {} }\ntype X = N;"),
      vec!["Cannot use namespace 'N' as a type."]
    );
    assert_eq!(messages("type V = R;"), vec!["Cannot find name 'R'."]);
  }

  #[test]
  fn test_duplicate_identifiers() {
    assert_eq!(
      messages("type A = string;\ntype A = number;"),
      vec!["Duplicate identifier 'A'."]
    );
    assert_eq!(
      messages("declare class C {}\ndeclare function C(): void;"),
      vec!["Duplicate identifier 'C'."]
    );
    assert!(messages("interface I {}\ndeclare var I: any;\ndeclare function f(): void;\ndeclare namespace f {}").is_empty());
  }

  #[test]
  fn test_recursive_base_type() {
    assert_eq!(
      messages("declare namespace a { interface X extends X {} }"),
      vec!["Type 'X' recursively references itself as a base type."]
    );
    assert_eq!(
      messages("interface A extends B {}\ninterface B extends A {}").len(),
      2
    );
  }

  #[test]
  fn test_ambient_context_rules() {
    assert_eq!(
      messages("function f(): void;"),
      vec!["Top-level declarations in .d.ts files must start with either a 'declare' or 'export' modifier."]
    );
    assert_eq!(
      messages("declare let x = 1;"),
      vec!["Initializers are not allowed in ambient contexts."]
    );
    assert_eq!(
      messages("declare const y = true;"),
      vec!["A 'const' initializer in an ambient context must be a string or numeric literal or literal enum reference."]
    );
    assert!(messages("declare const z = -1;\ninterface I {}\ntype T = I;").is_empty());
  }

  #[test]
  fn test_nested_ambient_module_rejected() {
    assert_eq!(
      messages("declare namespace a { module \"b\" {} }"),
      vec!["Ambient modules cannot be nested in other modules or namespaces."]
    );
  }
}
