// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository bootstrapping from shared templates.
//!
//! Synthboot seeds a work tree with boilerplate from a template set, runs a
//! fixup pass over the result, and then propagates a shared snippet of
//! environment variable definitions into the work tree's CI configuration
//! files.
//!
//! # Modules
//!
//! - [`config`]: layout of the `synth.toml` configuration file.
//! - [`path`]: default locations on the user's file system.
//! - [`template`]: template materialization and fixup passes.
//! - [`propagate`]: discovery of configuration files, and snippet merging.
//! - [`synth`]: the pipeline tying every step together.

pub mod config;
pub mod path;
pub mod propagate;
pub mod synth;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SynthConfig;
pub use propagate::{
    discover, discover_and_merge_all,
    merge::{default_merge, MergePolicy, MergeStrategy},
    merge_into, PropagateError,
};
pub use synth::{Synth, SynthError, SynthReport};
