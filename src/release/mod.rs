//! Release pipeline for upstream compiler tags
//!
//! # Flow
//!
//! ```text
//! TagSource::list_tags ──> tags::resolve ──> for each tag (newest first):
//!     Ledger::record_attempt
//!     DeclarationBuilder::build   (scratch checkout, exposure policy applied)
//!     DeclarationTransformer::transform
//!     dist_tag::select
//!     Publisher::publish
//!     Ledger::mark_complete
//! ──> LedgerStore::save ──> RemotePush::push
//! ```
//!
//! # Ledger file
//!
//! ```json
//! {
//!   "settings": {
//!     "acceptedVersionRange": ">=4.0.0",
//!     "skipTags": ["v4.0.0-beta"],
//!     "maxAttempts": 3,
//!     "upstreamRemoteUrl": "https://github.com/microsoft/TypeScript.git"
//!   },
//!   "records": [
//!     { "tag": "v4.0.2", "resolvedVersion": "4.0.2", "attempts": 1, "complete": true, "lastAttemptTime": "2024-05-01T12:00:00Z" }
//!   ]
//! }
//! ```

pub mod builder;
pub mod dist_tag;
pub mod exposure;
pub mod ledger;
pub mod pipeline;
pub mod publisher;
pub mod store;
pub mod tags;

pub use builder::{BuildOutput, CommandBuilder};
pub use dist_tag::DistTag;
pub use exposure::ExposurePolicy;
pub use ledger::{BuildAttempt, Ledger, Settings};
pub use pipeline::{ReleasePipeline, RunSummary, TagOutcome, TagState};
pub use publisher::{NpmPublisher, PublishRequest};
pub use store::{FileLedgerStore, GitRemote, SaveOutcome};
pub use tags::{GitTagLister, VersionResolver};
