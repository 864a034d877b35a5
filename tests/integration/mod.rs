//! Integration tests for tsei

mod helpers;
mod test_cli;
mod test_ledger;
mod test_pipeline;
mod test_transform;
