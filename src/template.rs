// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Template handling.
//!
//! Before any snippet gets propagated, a work tree is seeded with boilerplate
//! from a __template set__: CI configuration, repository metadata, license
//! headers, and so on. Seeding happens in two steps:
//!
//! 1. __Materialization__ copies every template file into the work tree,
//!    skipping anything on an exclusion list. See [`materialize`].
//! 2. __Fixup__ runs once over the freshly seeded work tree to bring generated
//!    output in line with the project's own tooling. See [`fixup`].
//!
//! Both steps sit behind a trait so the pipeline in [`crate::synth`] can be
//! driven with fakes.

pub mod fixup;
pub mod materialize;

pub use fixup::{CommandFixup, Fixup, FixupError, NoFixup};
pub use materialize::{DirectoryTemplates, Materializer, TemplateError};
