//! # craftc - Incremental C Build Driver
//!
//! craftc compiles C sources into objects, archives them into static
//! libraries and links executables, rebuilding only what is stale. Freshness
//! is decided purely from file modification times, so there is no manifest:
//! the artifacts on disk are the build state.
//!
//! ## Quick Start
//!
//! ```bash
//! craftc static-lib --cc gcc --objdir build/obj --cfiles "src/a.c src/b.c" --lib-path build/libab.a
//! craftc exe --cc gcc --objdir build/obj --cfiles "src/main.c" --lib-paths build/libab.a --exe-path build/app
//! ```
//!
//! ## Module Organization
//!
//! - [`build`] - Staleness checks and the four build targets
//! - [`config`] - Build configuration and `craftc.toml` defaults
//! - [`error`] - Error kinds reported by the build core

/// Staleness engine and parallel builders.
pub mod build;

/// Build configuration and project defaults.
pub mod config;

/// Build error kinds.
pub mod error;

pub use error::{BuildError, Result};
