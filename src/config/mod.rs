//! Configuration for sweep runs
//!
//! Configuration comes from a single TOML file ([`SweepConfig`]) whose location
//! defaults to `~/.blip/sweep.toml` and can be overridden with `--config`.
//! Command-line flags (`--state-dir`, `--output-dir`, `--force`) take
//! precedence over file values.

mod sweep;

pub use sweep::{SweepConfig, ToolsConfig};
