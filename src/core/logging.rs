//! Tracing initialisation for the tsei binary
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `verbose`.
/// Only the first call takes effect.
pub fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
    .try_init()
    .ok();
}
