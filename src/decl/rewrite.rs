//! Rewrite passes over the declaration AST
//!
//! The passes run in order:
//! 1. the ambient namespace named after the source project becomes a
//!    `declare module "<package>"` block (dotted namespaces keep their tail);
//! 2. qualified references through that namespace lose the qualifier;
//! 3. configured internal declarations and ambient globals are pruned and
//!    `const enum` is relaxed to `enum`.

use super::TransformOptions;
use super::ast::*;

/// Mutable visitor over the declaration AST. Override the hooks you need and
/// call the matching `walk_*` function to keep descending.
pub trait VisitMut {
  fn visit_statements(&mut self, stmts: &mut Vec<Statement>) {
    for stmt in stmts {
      self.visit_statement(stmt);
    }
  }

  fn visit_statement(&mut self, stmt: &mut Statement) {
    walk_statement(self, stmt);
  }

  fn visit_member(&mut self, member: &mut Member) {
    walk_member(self, member);
  }

  fn visit_type(&mut self, ty: &mut Type) {
    walk_type(self, ty);
  }

  fn visit_expr(&mut self, expr: &mut Expr) {
    walk_expr(self, expr);
  }

  fn visit_entity_name(&mut self, _name: &mut EntityName) {}
}

pub fn walk_statement<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Statement) {
  match &mut stmt.kind {
    StatementKind::Module(m) => {
      if let Some(body) = &mut m.body {
        v.visit_statements(body);
      }
    }
    StatementKind::Interface(d) => {
      walk_type_params(v, &mut d.type_params);
      for base in &mut d.extends {
        walk_type_ref(v, base);
      }
      for member in &mut d.members {
        v.visit_member(member);
      }
    }
    StatementKind::TypeAlias(d) => {
      walk_type_params(v, &mut d.type_params);
      v.visit_type(&mut d.ty);
    }
    StatementKind::Enum(d) => {
      for member in &mut d.members {
        if let PropertyName::Computed(e) = &mut member.name {
          v.visit_expr(e);
        }
        if let Some(init) = &mut member.init {
          v.visit_expr(init);
        }
      }
    }
    StatementKind::Class(d) => {
      walk_type_params(v, &mut d.type_params);
      if let Some(base) = &mut d.extends {
        walk_type_ref(v, base);
      }
      for r in &mut d.implements {
        walk_type_ref(v, r);
      }
      for member in &mut d.members {
        v.visit_member(member);
      }
    }
    StatementKind::Function(d) => walk_signature(v, &mut d.sig),
    StatementKind::Variable(s) => {
      for decl in &mut s.decls {
        if let Some(ty) = &mut decl.ty {
          v.visit_type(ty);
        }
        if let Some(init) = &mut decl.init {
          v.visit_expr(init);
        }
      }
    }
    StatementKind::ExportAssignment { expr, .. } => v.visit_expr(expr),
    StatementKind::ImportEquals {
      target: ImportTarget::Entity(name),
      ..
    } => v.visit_entity_name(name),
    _ => {}
  }
}

pub fn walk_member<V: VisitMut + ?Sized>(v: &mut V, member: &mut Member) {
  match &mut member.kind {
    MemberKind::Property { name, ty, init, .. } => {
      walk_property_name(v, name);
      if let Some(ty) = ty {
        v.visit_type(ty);
      }
      if let Some(init) = init {
        v.visit_expr(init);
      }
    }
    MemberKind::Method { name, sig, .. } => {
      walk_property_name(v, name);
      walk_signature(v, sig);
    }
    MemberKind::Call(sig) | MemberKind::Construct(sig) => walk_signature(v, sig),
    MemberKind::Constructor(params) => walk_params(v, params),
    MemberKind::Index { key, ty, .. } => {
      v.visit_type(key);
      v.visit_type(ty);
    }
    MemberKind::Get { name, ret } => {
      walk_property_name(v, name);
      if let Some(ret) = ret {
        v.visit_type(ret);
      }
    }
    MemberKind::Set { name, param } => {
      walk_property_name(v, name);
      if let Some(ty) = &mut param.ty {
        v.visit_type(ty);
      }
    }
  }
}

fn walk_property_name<V: VisitMut + ?Sized>(v: &mut V, name: &mut PropertyName) {
  if let PropertyName::Computed(e) = name {
    v.visit_expr(e);
  }
}

fn walk_type_params<V: VisitMut + ?Sized>(v: &mut V, tps: &mut [TypeParam]) {
  for tp in tps {
    if let Some(c) = &mut tp.constraint {
      v.visit_type(c);
    }
    if let Some(d) = &mut tp.default {
      v.visit_type(d);
    }
  }
}

fn walk_params<V: VisitMut + ?Sized>(v: &mut V, params: &mut [Param]) {
  for p in params {
    if let Some(ty) = &mut p.ty {
      v.visit_type(ty);
    }
  }
}

pub fn walk_signature<V: VisitMut + ?Sized>(v: &mut V, sig: &mut Signature) {
  walk_type_params(v, &mut sig.type_params);
  walk_params(v, &mut sig.params);
  if let Some(ret) = &mut sig.ret {
    v.visit_type(ret);
  }
}

pub fn walk_type_ref<V: VisitMut + ?Sized>(v: &mut V, r: &mut TypeRef) {
  v.visit_entity_name(&mut r.name);
  for arg in &mut r.args {
    v.visit_type(arg);
  }
}

pub fn walk_type<V: VisitMut + ?Sized>(v: &mut V, ty: &mut Type) {
  match ty {
    Type::Keyword(_) | Type::Literal(_) | Type::Negative(_) => {}
    Type::Reference(r) => walk_type_ref(v, r),
    Type::Query { name, args } => {
      v.visit_entity_name(name);
      for arg in args {
        v.visit_type(arg);
      }
    }
    Type::Import { args, .. } => {
      for arg in args {
        v.visit_type(arg);
      }
    }
    Type::Array(inner) | Type::Paren(inner) => v.visit_type(inner),
    Type::Operator { ty: inner, .. } => v.visit_type(inner),
    Type::Tuple(elements) => {
      for e in elements {
        v.visit_type(&mut e.ty);
      }
    }
    Type::Union(types) | Type::Intersection(types) => {
      for t in types {
        v.visit_type(t);
      }
    }
    Type::Function { sig, .. } => walk_signature(v, sig),
    Type::TypeLiteral(members) => {
      for m in members {
        v.visit_member(m);
      }
    }
    Type::Mapped {
      constraint,
      name_type,
      ty: value,
      ..
    } => {
      v.visit_type(constraint);
      if let Some(n) = name_type {
        v.visit_type(n);
      }
      if let Some(value) = value {
        v.visit_type(value);
      }
    }
    Type::IndexedAccess { object, index } => {
      v.visit_type(object);
      v.visit_type(index);
    }
    Type::Conditional {
      check,
      extends,
      true_ty,
      false_ty,
    } => {
      v.visit_type(check);
      v.visit_type(extends);
      v.visit_type(true_ty);
      v.visit_type(false_ty);
    }
    Type::Infer { constraint, .. } => {
      if let Some(c) = constraint {
        v.visit_type(c);
      }
    }
    Type::Predicate { ty: inner, .. } => {
      if let Some(inner) = inner {
        v.visit_type(inner);
      }
    }
  }
}

pub fn walk_expr<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
  match expr {
    Expr::Name(name) => v.visit_entity_name(name),
    Expr::Literal(_) => {}
    Expr::Unary { expr, .. } | Expr::Paren(expr) => v.visit_expr(expr),
    Expr::Binary { left, right, .. } => {
      v.visit_expr(left);
      v.visit_expr(right);
    }
    Expr::Element { object, index } => {
      v.visit_expr(object);
      v.visit_expr(index);
    }
  }
}

// ----------------------------------------------------------------------------
// Passes
// ----------------------------------------------------------------------------

/// Apply every pass to a parsed file
pub fn apply(file: &mut SourceFile, opts: &TransformOptions) {
  let statements = std::mem::take(&mut file.statements);
  file.statements = restructure_scope(statements, opts);
  prune(&mut file.statements, opts, true);
}

/// Turn `declare namespace <scope>[.rest]` blocks into module blocks and
/// drop the trailing `export = <scope>;`
fn restructure_scope(statements: Vec<Statement>, opts: &TransformOptions) -> Vec<Statement> {
  let scope = opts.scope_name.as_str();
  let mut out = Vec::with_capacity(statements.len());

  for stmt in statements {
    match stmt.kind {
      StatementKind::Module(ModuleDecl {
        keyword: ModuleKeyword::Namespace,
        name: ModuleName::Path(path),
        body: Some(body),
      }) if path[0] == scope => {
        let mut body = flatten_scope(body, scope);
        if path.len() > 1 {
          body = vec![Statement {
            doc: None,
            pos: stmt.pos,
            modifiers: Modifiers::default(),
            kind: StatementKind::Module(ModuleDecl {
              keyword: ModuleKeyword::Namespace,
              name: ModuleName::Path(path[1..].to_vec()),
              body: Some(body),
            }),
          }];
        }

        let mut stripper = QualifierStripper { scope };
        stripper.visit_statements(&mut body);

        out.push(Statement {
          doc: stmt.doc,
          pos: stmt.pos,
          modifiers: stmt.modifiers,
          kind: StatementKind::Module(ModuleDecl {
            keyword: ModuleKeyword::Module,
            name: ModuleName::Literal(StrLit::quoted(&opts.package_name)),
            body: Some(body),
          }),
        });
      }
      StatementKind::ExportAssignment {
        expr: Expr::Name(ref name),
        is_equals: true,
      } if name.segments.len() == 1 && name.first() == scope => {}
      kind => out.push(Statement { kind, ..stmt }),
    }
  }

  out
}

/// Splice a directly nested `namespace <scope> { ... }` into its parent
fn flatten_scope(body: Vec<Statement>, scope: &str) -> Vec<Statement> {
  let mut out = Vec::with_capacity(body.len());
  for stmt in body {
    if !is_scope_namespace(&stmt, scope) {
      out.push(stmt);
      continue;
    }
    if let StatementKind::Module(ModuleDecl { body: Some(inner), .. }) = stmt.kind {
      out.extend(inner);
    }
  }
  out
}

fn is_scope_namespace(stmt: &Statement, scope: &str) -> bool {
  match &stmt.kind {
    StatementKind::Module(m) => {
      m.keyword == ModuleKeyword::Namespace && m.body.is_some() && m.path().is_some_and(|p| p.len() == 1 && p[0] == scope)
    }
    _ => false,
  }
}

/// Rewrites `scope.A.B` to `A.B`
struct QualifierStripper<'a> {
  scope: &'a str,
}

impl QualifierStripper<'_> {
  fn is_self_reference(&self, base: &TypeRef, own_name: &str) -> bool {
    base.name.segments.len() == 2 && base.name.segments[0] == self.scope && base.name.segments[1] == own_name
  }
}

impl VisitMut for QualifierStripper<'_> {
  fn visit_statement(&mut self, stmt: &mut Statement) {
    match &mut stmt.kind {
      StatementKind::Interface(d) => {
        let own = d.name.clone();
        d.extends.retain(|base| !self.is_self_reference(base, &own));
      }
      StatementKind::Class(d) => {
        let self_base = match (&d.name, &d.extends) {
          (Some(own), Some(base)) => self.is_self_reference(base, own),
          _ => false,
        };
        if self_base {
          d.extends = None;
        }
      }
      _ => {}
    }
    walk_statement(self, stmt);
  }

  fn visit_entity_name(&mut self, name: &mut EntityName) {
    if name.is_qualified() && name.first() == self.scope {
      name.segments.remove(0);
    }
  }
}

/// Remove configured declarations and relax `const enum`
fn prune(stmts: &mut Vec<Statement>, opts: &TransformOptions, top_level: bool) {
  stmts.retain_mut(|stmt| match &mut stmt.kind {
    StatementKind::TypeAlias(d) => !opts.strip_declarations.contains(&d.name),
    StatementKind::Variable(v) => {
      v.decls.retain(|d| {
        !opts.strip_declarations.contains(&d.name) && !(top_level && opts.strip_globals.contains(&d.name))
      });
      !v.decls.is_empty()
    }
    StatementKind::Enum(_) => {
      stmt.modifiers.const_ = false;
      true
    }
    StatementKind::Module(m) => {
      if let Some(body) = &mut m.body {
        prune(body, opts, false);
      }
      true
    }
    _ => true,
  });
}
