// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Bootstrap pipeline.
//!
//! A __synth__ run seeds a work tree in three steps:
//!
//! 1. Materialize the template set, minus the excluded paths.
//! 2. Run the fixup pass once.
//! 3. Propagate the shared snippet, first into the common destination, then
//!    into every target file below the discovery root.
//!
//! Every step reads its settings from one [`SynthConfig`] handed over at
//! construction. Nothing is recovered: the first failing step ends the run.
//!
//! # See Also
//!
//! 1. [`SynthConfig`]
//! 2. [`template`](crate::template)
//! 3. [`propagate`](crate::propagate)

use crate::{
    config::SynthConfig,
    propagate::{propagate_all, PropagateError},
    template::{
        CommandFixup, DirectoryTemplates, Fixup, FixupError, Materializer, TemplateError,
    },
};

use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Bootstrap pipeline over a work tree.
#[derive(Debug)]
pub struct Synth<M = DirectoryTemplates, F = CommandFixup>
where
    M: Materializer,
    F: Fixup,
{
    pub(crate) config: SynthConfig,
    pub(crate) work_tree: PathBuf,
    pub(crate) materializer: M,
    pub(crate) fixup: F,
}

impl<M, F> Synth<M, F>
where
    M: Materializer,
    F: Fixup,
{
    /// Construct new bootstrap pipeline.
    pub fn new(
        config: SynthConfig,
        work_tree: impl Into<PathBuf>,
        materializer: M,
        fixup: F,
    ) -> Self {
        Self {
            config,
            work_tree: work_tree.into(),
            materializer,
            fixup,
        }
    }

    /// Configuration driving this pipeline.
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Work tree being bootstrapped.
    pub fn work_tree(&self) -> &Path {
        self.work_tree.as_path()
    }

    /// Run every step of the pipeline in order.
    ///
    /// # Errors
    ///
    /// - Return [`SynthError::Template`] if materialization fails.
    /// - Return [`SynthError::Fixup`] if fixup pass fails.
    /// - Return [`SynthError::Propagate`] if snippet propagation fails.
    #[instrument(skip(self), level = "debug")]
    pub fn run(&self) -> Result<SynthReport> {
        let templates_copied = self.materialize()?;
        self.run_fixup()?;
        let files_merged = self.propagate()?;

        Ok(SynthReport {
            templates_copied,
            files_merged,
        })
    }

    /// Copy template set into work tree.
    ///
    /// # Errors
    ///
    /// - Return [`SynthError::Template`] if materialization fails.
    #[instrument(skip(self), level = "debug")]
    pub fn materialize(&self) -> Result<usize> {
        info!("materializing templates into {:?}", self.work_tree.display());
        Ok(self
            .materializer
            .materialize(&self.work_tree, &self.config.templates.excluded_paths)?)
    }

    /// Run fixup pass over work tree.
    ///
    /// # Errors
    ///
    /// - Return [`SynthError::Fixup`] if fixup pass fails.
    #[instrument(skip(self), level = "debug")]
    pub fn run_fixup(&self) -> Result<()> {
        info!("running fixup pass over {:?}", self.work_tree.display());
        Ok(self.fixup.fixup(&self.work_tree)?)
    }

    /// Propagate shared snippet into configuration files.
    ///
    /// Merges into the common destination unconditionally, then into every
    /// discovered target file. Returns total number of files merged.
    ///
    /// # Errors
    ///
    /// - Return [`SynthError::Propagate`] if any merge fails.
    #[instrument(skip(self), level = "debug")]
    pub fn propagate(&self) -> Result<usize> {
        Ok(propagate_all(&self.work_tree, &self.config.propagate)?)
    }
}

/// Summary of a finished pipeline run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SynthReport {
    /// Number of template files written into the work tree.
    pub templates_copied: usize,

    /// Number of configuration files that received the snippet.
    pub files_merged: usize,
}

/// All possible error types of a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// Template materialization fails.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Fixup pass fails.
    #[error(transparent)]
    Fixup(#[from] FixupError),

    /// Snippet propagation fails.
    #[error(transparent)]
    Propagate(#[from] PropagateError),
}

/// Friendly result alias :3
pub type Result<T, E = SynthError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{template::NoFixup, testing::write_tree};
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::{
        cell::RefCell,
        fs::{create_dir_all, read_to_string, write},
    };

    #[derive(Default)]
    struct RecordingMaterializer {
        calls: RefCell<Vec<(PathBuf, Vec<String>)>>,
    }

    impl Materializer for RecordingMaterializer {
        fn materialize(
            &self,
            work_tree: &Path,
            excluded_paths: &[String],
        ) -> crate::template::materialize::Result<usize> {
            self.calls
                .borrow_mut()
                .push((work_tree.to_path_buf(), excluded_paths.to_vec()));
            Ok(7)
        }
    }

    struct FailingFixup;

    impl Fixup for FailingFixup {
        fn fixup(&self, _work_tree: &Path) -> crate::template::fixup::Result<()> {
            Err(FixupError::CommandFailed {
                program: "npm".into(),
                message: "stderr: nope".into(),
            })
        }
    }

    #[sealed_test]
    fn run_performs_every_step() -> anyhow::Result<()> {
        write_tree(&[
            ("repo/.kokoro/common_env_vars.cfg", "SHARED=true"),
            ("repo/.kokoro/common.cfg", "BUILD=1"),
            ("repo/.kokoro/continuous/a/common.cfg", "X=1"),
            ("repo/.kokoro/continuous/b/nested/common.cfg", "Y=2"),
        ])?;

        let synth = Synth::new(
            SynthConfig::default(),
            "repo",
            RecordingMaterializer::default(),
            NoFixup,
        );
        let report = synth.run()?;

        assert_eq!(
            report,
            SynthReport {
                templates_copied: 7,
                files_merged: 3,
            }
        );
        assert_eq!(
            *synth.materializer.calls.borrow(),
            vec![(
                PathBuf::from("repo"),
                SynthConfig::default().templates.excluded_paths
            )]
        );
        assert_eq!(
            read_to_string("repo/.kokoro/common.cfg")?,
            "BUILD=1\nSHARED=true"
        );
        assert_eq!(
            read_to_string("repo/.kokoro/continuous/a/common.cfg")?,
            "X=1\nSHARED=true"
        );
        assert_eq!(
            read_to_string("repo/.kokoro/continuous/b/nested/common.cfg")?,
            "Y=2\nSHARED=true"
        );

        Ok(())
    }

    #[sealed_test]
    fn propagate_merges_common_destination_without_discoveries() -> anyhow::Result<()> {
        create_dir_all("repo/.kokoro/continuous")?;
        write("repo/.kokoro/common_env_vars.cfg", "SHARED=true")?;

        let synth = Synth::new(
            SynthConfig::default(),
            "repo",
            RecordingMaterializer::default(),
            NoFixup,
        );
        let merged = synth.propagate()?;

        assert_eq!(merged, 1);
        assert_eq!(read_to_string("repo/.kokoro/common.cfg")?, "\nSHARED=true");
        assert!(synth.materializer.calls.borrow().is_empty());

        Ok(())
    }

    #[sealed_test]
    fn propagate_merges_common_destination_before_missing_root_fails() -> anyhow::Result<()> {
        create_dir_all("repo/.kokoro")?;
        write("repo/.kokoro/common_env_vars.cfg", "SHARED=true")?;
        write("repo/.kokoro/common.cfg", "BUILD=1")?;

        let synth = Synth::new(
            SynthConfig::default(),
            "repo",
            RecordingMaterializer::default(),
            NoFixup,
        );
        let result = synth.propagate();

        assert!(matches!(
            result,
            Err(SynthError::Propagate(PropagateError::RootNotFound { .. }))
        ));
        assert_eq!(
            read_to_string("repo/.kokoro/common.cfg")?,
            "BUILD=1\nSHARED=true"
        );

        Ok(())
    }

    #[sealed_test]
    fn run_stops_when_fixup_fails() -> anyhow::Result<()> {
        write_tree(&[
            ("repo/.kokoro/common_env_vars.cfg", "SHARED=true"),
            ("repo/.kokoro/common.cfg", "BUILD=1"),
            ("repo/.kokoro/continuous/a/common.cfg", "X=1"),
            ("repo/.kokoro/continuous/b/nested/common.cfg", "Y=2"),
        ])?;

        let synth = Synth::new(
            SynthConfig::default(),
            "repo",
            RecordingMaterializer::default(),
            FailingFixup,
        );
        let result = synth.run();

        assert!(matches!(result, Err(SynthError::Fixup(_))));
        assert_eq!(read_to_string("repo/.kokoro/common.cfg")?, "BUILD=1");

        Ok(())
    }
}
