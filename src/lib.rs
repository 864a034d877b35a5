//! tsei - build, expose, validate and publish the internal type declarations
//! of every upstream compiler release
//!
//! - [`release`]: version resolution, the retry ledger and the release pipeline
//! - [`decl`]: the declaration parser, rewriter, printer and checker
//! - [`core`]: configuration, errors, git, scratch directories, logging
//! - [`commands`]: the CLI commands built on the above

pub mod commands;
pub mod core;
pub mod decl;
pub mod release;
