//! Declaration transformer on realistic bundles

use crate::helpers::{BROKEN_DECLARATIONS, VALID_DECLARATIONS};
use tsei::core::error::{ExitCode, TseiError, ValidationError};
use tsei::decl::{self, DeclarationTransformer, TransformOptions};

#[test]
fn test_bundle_becomes_module_declaration() {
  let out = DeclarationTransformer::default()
    .transform("v5.0.0", VALID_DECLARATIONS)
    .unwrap();

  assert!(out.starts_with("declare module \"typescript\" {"));
  assert!(out.contains("namespace server {"));
  assert!(out.contains("root: Node;"));
  assert!(out.contains("function createNode(kind: SyntaxKind): Node;"));
  assert!(!out.contains("ts."), "{}", out);
  assert!(!out.contains("export = ts"));
  assert!(!out.contains("PerfLogger"));
  assert!(decl::validate(&out).is_empty());
}

#[test]
fn test_transform_is_deterministic_and_idempotent() {
  let transformer = DeclarationTransformer::default();
  let first = transformer.transform("v5.0.0", VALID_DECLARATIONS).unwrap();
  let second = transformer.transform("v5.0.0", VALID_DECLARATIONS).unwrap();
  assert_eq!(first, second);

  // Already-public output has nothing left to rewrite
  let again = transformer.transform("v5.0.0", &first).unwrap();
  assert_eq!(again, first);
}

#[test]
fn test_unresolved_reference_reports_diagnostics() {
  let err = DeclarationTransformer::default()
    .transform("v5.1.0", BROKEN_DECLARATIONS)
    .unwrap_err();

  assert_eq!(err.exit_code(), ExitCode::Validation);
  let TseiError::Validation(ValidationError::Diagnostics { tag, diagnostics }) = &err else {
    panic!("expected diagnostics, got {:?}", err);
  };
  assert_eq!(tag, "v5.1.0");
  assert!(diagnostics.iter().any(|d| d.message.contains("MissingKind")));
  assert!(err.to_string().starts_with("[v5.1.0] Transformed file has diagnostics errors"));
}

#[test]
fn test_unparsable_input_is_rejected_before_rewriting() {
  let err = DeclarationTransformer::default()
    .transform("v5.2.0", "declare namespace ts {\n    interface Node {\n")
    .unwrap_err();
  assert!(matches!(err, TseiError::Validation(ValidationError::Unparsable { .. })));
}

#[test]
fn test_configured_globals_are_stripped() {
  let raw = format!("{}declare var window: any;\ndeclare var module: any;\n", VALID_DECLARATIONS);
  let out = DeclarationTransformer::new(TransformOptions::default())
    .transform("v5.0.0", &raw)
    .unwrap();
  assert!(!out.contains("window"));
  assert!(!out.contains("declare var module"));
}
