// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Template materialization.
//!
//! Copies the files of a template set into a work tree. Templates are copied
//! verbatim, no variable substitution takes place.
//!
//! # Exclusion Patterns
//!
//! Exclusions use gitignore syntax relative to the template root. A pattern
//! that names a directory excludes everything below it, so `.kokoro` keeps the
//! entire `.kokoro/` tree of the template set out of the work tree, while
//! `.github/CODEOWNERS` only excludes that one file.

use ignore::{
    gitignore::{Gitignore, GitignoreBuilder},
    WalkBuilder,
};
use std::{
    fs::copy,
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};

/// Seed a work tree from a template set.
pub trait Materializer {
    /// Write template files into `work_tree`, skipping `excluded_paths`.
    ///
    /// Returns number of files written.
    fn materialize(&self, work_tree: &Path, excluded_paths: &[String]) -> Result<usize>;
}

/// Template set stored as a plain directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTemplates {
    source: PathBuf,
}

impl DirectoryTemplates {
    /// Construct new directory backed template set.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Path to template directory.
    pub fn source(&self) -> &Path {
        self.source.as_path()
    }

    fn exclusion_matcher(&self, excluded_paths: &[String]) -> Result<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.source);
        for pattern in excluded_paths {
            builder
                .add_line(None, pattern)
                .map_err(TemplateError::ExcludePattern)?;
        }

        builder.build().map_err(TemplateError::ExcludePattern)
    }
}

impl Materializer for DirectoryTemplates {
    #[instrument(skip(self, excluded_paths), level = "debug")]
    fn materialize(&self, work_tree: &Path, excluded_paths: &[String]) -> Result<usize> {
        if !self.source.is_dir() {
            return Err(TemplateError::SourceNotFound {
                path: self.source.clone(),
            });
        }

        let matcher = self.exclusion_matcher(excluded_paths)?;
        let walker = WalkBuilder::new(&self.source)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut copied = 0;
        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_some_and(|kind| kind.is_file()) {
                continue;
            }

            // INVARIANT: Entries of the walk always live under the template root.
            let relative = match entry.path().strip_prefix(&self.source) {
                Ok(relative) => relative,
                Err(_) => continue,
            };

            if matcher
                .matched_path_or_any_parents(relative, false)
                .is_ignore()
            {
                debug!("excluded {:?}", relative.display());
                continue;
            }

            let target = work_tree.join(relative);
            if let Some(parent) = target.parent() {
                mkdirp::mkdirp(parent).map_err(|err| TemplateError::CreateDir {
                    source: err,
                    path: parent.to_path_buf(),
                })?;
            }

            copy(entry.path(), &target).map_err(|err| TemplateError::CopyFile {
                source: err,
                from: entry.path().to_path_buf(),
                to: target.clone(),
            })?;
            debug!("copied {:?}", relative.display());
            copied += 1;
        }

        info!(
            "materialized {copied} file(s) from {:?}",
            self.source.display()
        );

        Ok(copied)
    }
}

/// Template materialization error types.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Template directory does not exist.
    #[error("template directory {:?} not found", path.display())]
    SourceNotFound { path: PathBuf },

    /// Exclusion pattern cannot be parsed.
    #[error("invalid exclusion pattern")]
    ExcludePattern(#[source] ignore::Error),

    /// Template directory cannot be traversed.
    #[error(transparent)]
    Walk(#[from] ignore::Error),

    /// Directory in work tree cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Template file cannot be copied into work tree.
    #[error("failed to copy {:?} to {:?}", from.display(), to.display())]
    CopyFile {
        #[source]
        source: std::io::Error,
        from: PathBuf,
        to: PathBuf,
    },
}

/// Friendly result alias :3
pub type Result<T, E = TemplateError> = std::result::Result<T, E>;
