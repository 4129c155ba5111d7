//! Integration test suite for blip-sweep
//!
//! End-to-end runs of the sweep pipeline against temporary source trees, with
//! `sh` scripts standing in for the external tools.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **l10n**: template reuse, merge gating and per-language failures
//! - **docs**: Mallard link graphs, credits and DocBook metadata
//! - **moduleset**: module-set resolution and dependency closures
//! - **cli**: the `blip-sweep` binary

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

// The fake external tools are `sh` scripts
#[cfg(unix)]
mod cli;
#[cfg(unix)]
mod docs;
#[cfg(unix)]
mod l10n;
mod moduleset;
