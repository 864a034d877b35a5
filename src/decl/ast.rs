//! Generic declaration AST
//!
//! Covers what a compiler emits into an ambient declaration file: module and
//! namespace blocks, interfaces, classes, enums, type aliases, functions,
//! variables, import/export forms and the full type-expression grammar.
//! Nothing here is tied to a particular compiler's tree shape.

use super::diagnostic::Pos;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
  /// License banners and triple-slash directives, printed first
  pub header: Vec<String>,
  pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
  pub doc: Option<String>,
  pub pos: Pos,
  pub modifiers: Modifiers,
  pub kind: StatementKind,
}

/// Statement-level modifiers, printed in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
  pub export: bool,
  pub default: bool,
  pub declare: bool,
  pub abstract_: bool,
  /// `const enum`
  pub const_: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
  Module(ModuleDecl),
  Interface(InterfaceDecl),
  TypeAlias(TypeAliasDecl),
  Enum(EnumDecl),
  Class(ClassDecl),
  Function(FunctionDecl),
  Variable(VariableStatement),
  /// `export = x;` when `is_equals`, else `export default x;`
  ExportAssignment { expr: Expr, is_equals: bool },
  ImportEquals { name: String, target: ImportTarget },
  Import(ImportDecl),
  ExportNamed(ExportNamedDecl),
  ExportStar { alias: Option<String>, from: StrLit },
  ExportAsNamespace(String),
  Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKeyword {
  Namespace,
  Module,
  Global,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleName {
  /// `a.b.c`
  Path(Vec<String>),
  /// `"package"`
  Literal(StrLit),
  Global,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDecl {
  pub keyword: ModuleKeyword,
  pub name: ModuleName,
  /// `None` for the shorthand `declare module "x";`
  pub body: Option<Vec<Statement>>,
}

impl ModuleDecl {
  /// Namespace path when this is a namespace (or identifier-named module)
  pub fn path(&self) -> Option<&[String]> {
    match &self.name {
      ModuleName::Path(p) => Some(p),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
  /// `in`, `out`, `const`
  pub modifiers: Vec<String>,
  pub name: String,
  pub constraint: Option<Type>,
  pub default: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
  pub name: String,
  pub type_params: Vec<TypeParam>,
  pub extends: Vec<TypeRef>,
  pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl {
  pub name: String,
  pub type_params: Vec<TypeParam>,
  pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
  pub name: String,
  pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
  pub doc: Option<String>,
  pub pos: Pos,
  pub name: PropertyName,
  pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
  pub name: Option<String>,
  pub type_params: Vec<TypeParam>,
  pub extends: Option<TypeRef>,
  pub implements: Vec<TypeRef>,
  pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
  pub name: String,
  pub sig: Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
  Var,
  Let,
  Const,
}

impl VarKind {
  pub fn keyword(self) -> &'static str {
    match self {
      VarKind::Var => "var",
      VarKind::Let => "let",
      VarKind::Const => "const",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableStatement {
  pub kind: VarKind,
  pub decls: Vec<VarDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
  pub pos: Pos,
  pub name: String,
  pub ty: Option<Type>,
  pub init: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportTarget {
  Require(StrLit),
  Entity(EntityName),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
  pub type_only: bool,
  pub default: Option<String>,
  pub namespace: Option<String>,
  pub named: Option<Vec<Specifier>>,
  pub from: StrLit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportNamedDecl {
  pub type_only: bool,
  pub specifiers: Vec<Specifier>,
  pub from: Option<StrLit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Specifier {
  pub type_only: bool,
  pub name: String,
  pub alias: Option<String>,
}

/// Interface, class and type-literal members share one shape
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
  pub doc: Option<String>,
  pub pos: Pos,
  /// `public`, `static`, `readonly`, ... in source order
  pub modifiers: Vec<String>,
  pub kind: MemberKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKind {
  Property {
    name: PropertyName,
    optional: bool,
    ty: Option<Type>,
    init: Option<Expr>,
  },
  Method {
    name: PropertyName,
    optional: bool,
    sig: Signature,
  },
  Call(Signature),
  Construct(Signature),
  Constructor(Vec<Param>),
  Index {
    param: String,
    key: Type,
    ty: Type,
  },
  Get {
    name: PropertyName,
    ret: Option<Type>,
  },
  Set {
    name: PropertyName,
    param: Param,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyName {
  Ident(String),
  Str(StrLit),
  Num(String),
  Computed(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
  pub type_params: Vec<TypeParam>,
  pub params: Vec<Param>,
  pub ret: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
  /// Parameter properties: `public`, `readonly`, ...
  pub modifiers: Vec<String>,
  pub rest: bool,
  pub name: ParamName,
  pub optional: bool,
  pub ty: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamName {
  Ident(String),
  /// Binding pattern kept as normalized source text
  Pattern(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrLit {
  pub raw: String,
  pub value: String,
}

impl StrLit {
  /// Double-quoted literal for a plain value
  pub fn quoted(value: &str) -> Self {
    Self {
      raw: format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")),
      value: value.to_string(),
    }
  }
}

/// Dotted name such as `ts.server.Project`
#[derive(Debug, Clone, PartialEq)]
pub struct EntityName {
  pub pos: Pos,
  pub segments: Vec<String>,
}

impl EntityName {
  pub fn first(&self) -> &str {
    &self.segments[0]
  }

  pub fn is_qualified(&self) -> bool {
    self.segments.len() > 1
  }

  pub fn dotted(&self) -> String {
    self.segments.join(".")
  }
}

/// A named type with optional type arguments (heritage clauses, references)
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
  pub name: EntityName,
  pub args: Vec<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
  Str(StrLit),
  Num(String),
  Template(String),
  True,
  False,
  Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleElement {
  pub name: Option<String>,
  pub rest: bool,
  pub optional: bool,
  pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
  /// `any`, `string`, `this`, `undefined`, ...
  Keyword(String),
  Reference(TypeRef),
  /// `typeof a.b`
  Query { name: EntityName, args: Vec<Type> },
  /// `import("m").A.B<T>`, optionally preceded by `typeof`
  Import {
    is_typeof: bool,
    module: StrLit,
    qualifier: Option<Vec<String>>,
    args: Vec<Type>,
  },
  Literal(Literal),
  /// `-1`
  Negative(String),
  Array(Box<Type>),
  Tuple(Vec<TupleElement>),
  Union(Vec<Type>),
  Intersection(Vec<Type>),
  Function {
    is_constructor: bool,
    is_abstract: bool,
    sig: Box<Signature>,
  },
  TypeLiteral(Vec<Member>),
  Mapped {
    /// `""`, `"+"` or `"-"` when present
    readonly: Option<String>,
    param: String,
    constraint: Box<Type>,
    name_type: Option<Box<Type>>,
    optional: Option<String>,
    ty: Option<Box<Type>>,
  },
  IndexedAccess { object: Box<Type>, index: Box<Type> },
  /// `keyof T`, `unique symbol`, `readonly T[]`
  Operator { op: String, ty: Box<Type> },
  Conditional {
    check: Box<Type>,
    extends: Box<Type>,
    true_ty: Box<Type>,
    false_ty: Box<Type>,
  },
  Infer { name: String, constraint: Option<Box<Type>> },
  Paren(Box<Type>),
  /// `x is T`, `asserts x`, `asserts this is T`
  Predicate {
    asserts: bool,
    param: String,
    ty: Option<Box<Type>>,
  },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Name(EntityName),
  Literal(Literal),
  Unary { op: String, expr: Box<Expr> },
  Binary { op: String, left: Box<Expr>, right: Box<Expr> },
  Paren(Box<Expr>),
  Element { object: Box<Expr>, index: Box<Expr> },
}

impl Statement {
  /// The declared name, for declarations that have exactly one
  pub fn declared_name(&self) -> Option<&str> {
    match &self.kind {
      StatementKind::Interface(d) => Some(&d.name),
      StatementKind::TypeAlias(d) => Some(&d.name),
      StatementKind::Enum(d) => Some(&d.name),
      StatementKind::Class(d) => d.name.as_deref(),
      StatementKind::Function(d) => Some(&d.name),
      StatementKind::ImportEquals { name, .. } => Some(name),
      StatementKind::Module(m) => m.path().and_then(|p| p.first()).map(String::as_str),
      _ => None,
    }
  }
}
