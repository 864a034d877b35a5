//! `tsei transform` - run the declaration transformer on a local file

use crate::core::context::RunContext;
use crate::core::error::{ResultExt, TseiResult};
use crate::decl::DeclarationTransformer;
use std::fs;
use std::path::Path;

/// Tag used in messages when none is given
pub const LOCAL_TAG: &str = "local";

/// Transform `input`, writing to `output` or stdout
pub fn run_transform(ctx: &RunContext, input: &Path, tag: Option<&str>, output: Option<&Path>) -> TseiResult<()> {
  let raw = fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))?;

  let transformer = DeclarationTransformer::new(ctx.config.transform.clone());
  let transformed = transformer.transform(tag.unwrap_or(LOCAL_TAG), &raw)?;

  match output {
    Some(path) => {
      fs::write(path, &transformed).with_context(|| format!("Failed to write {}", path.display()))?;
      eprintln!("✅ Wrote {} ({} bytes)", path.display(), transformed.len());
    }
    None => print!("{}", transformed),
  }

  Ok(())
}
