//! CLI commands for tsei
//!
//! - **run**: resolve, build, transform and publish every pending tag
//! - **tags**: show the tags a run would process
//! - **status**: summarize the ledger
//! - **transform**: run the declaration transformer on a local file
//!
//! All commands accept `&RunContext` to avoid redundant config loads.

pub mod run;
pub mod status;
pub mod tags;
pub mod transform;

pub use run::run_pipeline;
pub use status::run_status;
pub use tags::run_tags;
pub use transform::run_transform;
