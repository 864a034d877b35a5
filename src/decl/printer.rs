//! Canonical printer for the declaration AST
//!
//! Output uses four-space indentation and one statement per line. Printing is
//! stable: parsing printed text and printing it again yields the same text.

use super::ast::*;

const INDENT: &str = "    ";

/// Print a whole file
pub fn print(file: &SourceFile) -> String {
  let mut out = String::new();
  for line in &file.header {
    out.push_str(line);
    out.push('\n');
  }
  statements(&mut out, &file.statements, 0);
  out
}

fn pad(level: usize) -> String {
  INDENT.repeat(level)
}

fn statements(out: &mut String, stmts: &[Statement], level: usize) {
  for stmt in stmts {
    statement(out, stmt, level);
  }
}

fn doc(out: &mut String, doc: &Option<String>, level: usize) {
  let Some(doc) = doc else {
    return;
  };
  for (i, line) in doc.lines().enumerate() {
    let line = line.trim();
    out.push_str(&pad(level));
    if i > 0 && line.starts_with('*') {
      out.push(' ');
    }
    out.push_str(line);
    out.push('\n');
  }
}

fn modifiers(m: &Modifiers) -> String {
  let mut s = String::new();
  for (on, word) in [
    (m.export, "export "),
    (m.default, "default "),
    (m.declare, "declare "),
    (m.abstract_, "abstract "),
    (m.const_, "const "),
  ] {
    if on {
      s.push_str(word);
    }
  }
  s
}

fn statement(out: &mut String, stmt: &Statement, level: usize) {
  doc(out, &stmt.doc, level);
  let prefix = format!("{}{}", pad(level), modifiers(&stmt.modifiers));
  match &stmt.kind {
    StatementKind::Module(m) => {
      let head = match (&m.keyword, &m.name) {
        (_, ModuleName::Global) => "global".to_string(),
        (ModuleKeyword::Namespace, ModuleName::Path(p)) => format!("namespace {}", p.join(".")),
        (_, ModuleName::Path(p)) => format!("module {}", p.join(".")),
        (_, ModuleName::Literal(lit)) => format!("module {}", lit.raw),
      };
      match &m.body {
        None => out.push_str(&format!("{}{};\n", prefix, head)),
        Some(body) if body.is_empty() => out.push_str(&format!("{}{} {{ }}\n", prefix, head)),
        Some(body) => {
          out.push_str(&format!("{}{} {{\n", prefix, head));
          statements(out, body, level + 1);
          out.push_str(&format!("{}}}\n", pad(level)));
        }
      }
    }
    StatementKind::Interface(d) => {
      let mut head = format!("interface {}{}", d.name, type_params(&d.type_params, level));
      if !d.extends.is_empty() {
        let list: Vec<String> = d.extends.iter().map(|t| type_ref(t, level)).collect();
        head.push_str(&format!(" extends {}", list.join(", ")));
      }
      out.push_str(&format!("{}{} {}\n", prefix, head, members_block(&d.members, level)));
    }
    StatementKind::TypeAlias(d) => {
      out.push_str(&format!(
        "{}type {}{} = {};\n",
        prefix,
        d.name,
        type_params(&d.type_params, level),
        ty(&d.ty, level)
      ));
    }
    StatementKind::Enum(d) => {
      if d.members.is_empty() {
        out.push_str(&format!("{}enum {} {{ }}\n", prefix, d.name));
        return;
      }
      out.push_str(&format!("{}enum {} {{\n", prefix, d.name));
      let last = d.members.len() - 1;
      for (i, member) in d.members.iter().enumerate() {
        doc(out, &member.doc, level + 1);
        out.push_str(&pad(level + 1));
        out.push_str(&property_name(&member.name));
        if let Some(init) = &member.init {
          out.push_str(&format!(" = {}", expr(init)));
        }
        if i != last {
          out.push(',');
        }
        out.push('\n');
      }
      out.push_str(&format!("{}}}\n", pad(level)));
    }
    StatementKind::Class(d) => {
      let mut head = "class".to_string();
      if let Some(name) = &d.name {
        head.push(' ');
        head.push_str(name);
      }
      head.push_str(&type_params(&d.type_params, level));
      if let Some(base) = &d.extends {
        head.push_str(&format!(" extends {}", type_ref(base, level)));
      }
      if !d.implements.is_empty() {
        let list: Vec<String> = d.implements.iter().map(|t| type_ref(t, level)).collect();
        head.push_str(&format!(" implements {}", list.join(", ")));
      }
      out.push_str(&format!("{}{} {}\n", prefix, head, members_block(&d.members, level)));
    }
    StatementKind::Function(d) => {
      out.push_str(&format!("{}function {}{};\n", prefix, d.name, signature(&d.sig, level, false)));
    }
    StatementKind::Variable(v) => {
      let decls: Vec<String> = v
        .decls
        .iter()
        .map(|d| {
          let mut s = d.name.clone();
          if let Some(t) = &d.ty {
            s.push_str(&format!(": {}", ty(t, level)));
          }
          if let Some(init) = &d.init {
            s.push_str(&format!(" = {}", expr(init)));
          }
          s
        })
        .collect();
      out.push_str(&format!("{}{} {};\n", prefix, v.kind.keyword(), decls.join(", ")));
    }
    StatementKind::ExportAssignment { expr: e, is_equals } => {
      let form = if *is_equals { "export =" } else { "export default" };
      out.push_str(&format!("{}{} {};\n", prefix, form, expr(e)));
    }
    StatementKind::ImportEquals { name, target } => {
      let target = match target {
        ImportTarget::Require(lit) => format!("require({})", lit.raw),
        ImportTarget::Entity(e) => e.dotted(),
      };
      out.push_str(&format!("{}import {} = {};\n", prefix, name, target));
    }
    StatementKind::Import(d) => {
      let mut clause = Vec::new();
      if let Some(default) = &d.default {
        clause.push(default.clone());
      }
      if let Some(ns) = &d.namespace {
        clause.push(format!("* as {}", ns));
      }
      if let Some(named) = &d.named {
        clause.push(specifiers(named));
      }
      let type_kw = if d.type_only { "type " } else { "" };
      if clause.is_empty() {
        out.push_str(&format!("{}import {};\n", prefix, d.from.raw));
      } else {
        out.push_str(&format!("{}import {}{} from {};\n", prefix, type_kw, clause.join(", "), d.from.raw));
      }
    }
    StatementKind::ExportNamed(d) => {
      let type_kw = if d.type_only { "type " } else { "" };
      let from = d.from.as_ref().map(|f| format!(" from {}", f.raw)).unwrap_or_default();
      out.push_str(&format!("{}export {}{}{};\n", prefix, type_kw, specifiers(&d.specifiers), from));
    }
    StatementKind::ExportStar { alias, from } => {
      let alias = alias.as_ref().map(|a| format!(" as {}", a)).unwrap_or_default();
      out.push_str(&format!("{}export *{} from {};\n", prefix, alias, from.raw));
    }
    StatementKind::ExportAsNamespace(name) => {
      out.push_str(&format!("{}export as namespace {};\n", prefix, name));
    }
    StatementKind::Empty => out.push_str(&format!("{};\n", pad(level))),
  }
}

fn specifiers(specs: &[Specifier]) -> String {
  if specs.is_empty() {
    return "{ }".to_string();
  }
  let list: Vec<String> = specs
    .iter()
    .map(|s| {
      let mut text = String::new();
      if s.type_only {
        text.push_str("type ");
      }
      text.push_str(&s.name);
      if let Some(alias) = &s.alias {
        text.push_str(&format!(" as {}", alias));
      }
      text
    })
    .collect();
  format!("{{ {} }}", list.join(", "))
}

fn members_block(members: &[Member], level: usize) -> String {
  if members.is_empty() {
    return "{ }".to_string();
  }
  let mut out = String::from("{\n");
  for m in members {
    doc(&mut out, &m.doc, level + 1);
    out.push_str(&pad(level + 1));
    out.push_str(&member(m, level + 1));
    out.push_str(";\n");
  }
  out.push_str(&pad(level));
  out.push('}');
  out
}

fn member(m: &Member, level: usize) -> String {
  let mut s = String::new();
  for modifier in &m.modifiers {
    s.push_str(modifier);
    s.push(' ');
  }
  match &m.kind {
    MemberKind::Property {
      name,
      optional,
      ty: t,
      init,
    } => {
      s.push_str(&property_name(name));
      if *optional {
        s.push('?');
      }
      if let Some(t) = t {
        s.push_str(&format!(": {}", ty(t, level)));
      }
      if let Some(init) = init {
        s.push_str(&format!(" = {}", expr(init)));
      }
    }
    MemberKind::Method { name, optional, sig } => {
      s.push_str(&property_name(name));
      if *optional {
        s.push('?');
      }
      s.push_str(&signature(sig, level, false));
    }
    MemberKind::Call(sig) => s.push_str(&signature(sig, level, false)),
    MemberKind::Construct(sig) => s.push_str(&format!("new {}", signature(sig, level, false))),
    MemberKind::Constructor(ps) => s.push_str(&format!("constructor({})", params(ps, level))),
    MemberKind::Index { param, key, ty: t } => {
      s.push_str(&format!("[{}: {}]: {}", param, ty(key, level), ty(t, level)));
    }
    MemberKind::Get { name, ret } => {
      s.push_str(&format!("get {}()", property_name(name)));
      if let Some(ret) = ret {
        s.push_str(&format!(": {}", ty(ret, level)));
      }
    }
    MemberKind::Set { name, param: p } => {
      s.push_str(&format!("set {}({})", property_name(name), param(p, level)));
    }
  }
  s
}

fn type_params(tps: &[TypeParam], level: usize) -> String {
  if tps.is_empty() {
    return String::new();
  }
  let list: Vec<String> = tps
    .iter()
    .map(|tp| {
      let mut s = String::new();
      for m in &tp.modifiers {
        s.push_str(m);
        s.push(' ');
      }
      s.push_str(&tp.name);
      if let Some(c) = &tp.constraint {
        s.push_str(&format!(" extends {}", ty(c, level)));
      }
      if let Some(d) = &tp.default {
        s.push_str(&format!(" = {}", ty(d, level)));
      }
      s
    })
    .collect();
  format!("<{}>", list.join(", "))
}

fn signature(sig: &Signature, level: usize, arrow: bool) -> String {
  let mut s = format!("{}({})", type_params(&sig.type_params, level), params(&sig.params, level));
  if let Some(ret) = &sig.ret {
    let sep = if arrow { " => " } else { ": " };
    s.push_str(sep);
    s.push_str(&ty(ret, level));
  }
  s
}

fn params(ps: &[Param], level: usize) -> String {
  ps.iter().map(|p| param(p, level)).collect::<Vec<_>>().join(", ")
}

fn param(p: &Param, level: usize) -> String {
  let mut s = String::new();
  for m in &p.modifiers {
    s.push_str(m);
    s.push(' ');
  }
  if p.rest {
    s.push_str("...");
  }
  match &p.name {
    ParamName::Ident(n) | ParamName::Pattern(n) => s.push_str(n),
  }
  if p.optional {
    s.push('?');
  }
  if let Some(t) = &p.ty {
    s.push_str(&format!(": {}", ty(t, level)));
  }
  s
}

fn type_ref(r: &TypeRef, level: usize) -> String {
  format!("{}{}", r.name.dotted(), type_args(&r.args, level))
}

fn type_args(args: &[Type], level: usize) -> String {
  if args.is_empty() {
    return String::new();
  }
  let list: Vec<String> = args.iter().map(|a| ty(a, level)).collect();
  format!("<{}>", list.join(", "))
}

fn literal(l: &Literal) -> String {
  match l {
    Literal::Str(s) => s.raw.clone(),
    Literal::Num(n) | Literal::Template(n) => n.clone(),
    Literal::True => "true".to_string(),
    Literal::False => "false".to_string(),
    Literal::Null => "null".to_string(),
  }
}

/// Render a type expression; `level` is the indentation of the enclosing line
pub fn ty(t: &Type, level: usize) -> String {
  match t {
    Type::Keyword(k) => k.clone(),
    Type::Reference(r) => type_ref(r, level),
    Type::Query { name, args } => format!("typeof {}{}", name.dotted(), type_args(args, level)),
    Type::Import {
      is_typeof,
      module,
      qualifier,
      args,
    } => {
      let mut s = String::new();
      if *is_typeof {
        s.push_str("typeof ");
      }
      s.push_str(&format!("import({})", module.raw));
      if let Some(q) = qualifier {
        s.push('.');
        s.push_str(&q.join("."));
      }
      s.push_str(&type_args(args, level));
      s
    }
    Type::Literal(l) => literal(l),
    Type::Negative(n) => format!("-{}", n),
    Type::Array(inner) => format!("{}[]", ty(inner, level)),
    Type::Tuple(elements) => {
      let list: Vec<String> = elements
        .iter()
        .map(|e| {
          let rest = if e.rest { "..." } else { "" };
          let opt = if e.optional { "?" } else { "" };
          match &e.name {
            Some(name) => format!("{}{}{}: {}", rest, name, opt, ty(&e.ty, level)),
            None => format!("{}{}{}", rest, ty(&e.ty, level), opt),
          }
        })
        .collect();
      format!("[{}]", list.join(", "))
    }
    Type::Union(types) => types.iter().map(|t| ty(t, level)).collect::<Vec<_>>().join(" | "),
    Type::Intersection(types) => types.iter().map(|t| ty(t, level)).collect::<Vec<_>>().join(" & "),
    Type::Function {
      is_constructor,
      is_abstract,
      sig,
    } => {
      let mut s = String::new();
      if *is_abstract {
        s.push_str("abstract ");
      }
      if *is_constructor {
        s.push_str("new ");
      }
      s.push_str(&signature(sig, level, true));
      s
    }
    Type::TypeLiteral(members) => members_block(members, level),
    Type::Mapped {
      readonly,
      param,
      constraint,
      name_type,
      optional,
      ty: value,
    } => {
      let mut s = String::from("{ ");
      if let Some(op) = readonly {
        s.push_str(&format!("{}readonly ", op));
      }
      s.push_str(&format!("[{} in {}", param, ty(constraint, level)));
      if let Some(n) = name_type {
        s.push_str(&format!(" as {}", ty(n, level)));
      }
      s.push(']');
      if let Some(op) = optional {
        s.push_str(&format!("{}?", op));
      }
      if let Some(v) = value {
        s.push_str(&format!(": {}", ty(v, level)));
      }
      s.push_str("; }");
      s
    }
    Type::IndexedAccess { object, index } => format!("{}[{}]", ty(object, level), ty(index, level)),
    Type::Operator { op, ty: inner } => format!("{} {}", op, ty(inner, level)),
    Type::Conditional {
      check,
      extends,
      true_ty,
      false_ty,
    } => format!(
      "{} extends {} ? {} : {}",
      ty(check, level),
      ty(extends, level),
      ty(true_ty, level),
      ty(false_ty, level)
    ),
    Type::Infer { name, constraint } => match constraint {
      Some(c) => format!("infer {} extends {}", name, ty(c, level)),
      None => format!("infer {}", name),
    },
    Type::Paren(inner) => format!("({})", ty(inner, level)),
    Type::Predicate {
      asserts,
      param,
      ty: inner,
    } => {
      let mut s = String::new();
      if *asserts {
        s.push_str("asserts ");
      }
      s.push_str(param);
      if let Some(inner) = inner {
        s.push_str(&format!(" is {}", ty(inner, level)));
      }
      s
    }
  }
}

fn property_name(name: &PropertyName) -> String {
  match name {
    PropertyName::Ident(n) | PropertyName::Num(n) => n.clone(),
    PropertyName::Str(s) => s.raw.clone(),
    PropertyName::Computed(e) => format!("[{}]", expr(e)),
  }
}

pub fn expr(e: &Expr) -> String {
  match e {
    Expr::Name(n) => n.dotted(),
    Expr::Literal(l) => literal(l),
    Expr::Unary { op, expr: inner } => format!("{}{}", op, expr(inner)),
    Expr::Binary { op, left, right } => format!("{} {} {}", expr(left), op, expr(right)),
    Expr::Paren(inner) => format!("({})", expr(inner)),
    Expr::Element { object, index } => format!("{}[{}]", expr(object), expr(index)),
  }
}
