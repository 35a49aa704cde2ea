// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Snippet propagation.
//!
//! Distributes a shared __snippet__, a block of environment variable
//! definitions, across a set of configuration files. The set of destinations
//! is determined by one fixed path, plus every file below a __discovery root__
//! whose base name equals a target filename.
//!
//! # Merge Semantics
//!
//! Each destination goes through a read-transform-write cycle:
//!
//! 1. Read the snippet. A missing snippet aborts before anything is written.
//! 2. Read the destination. A missing destination counts as empty content.
//! 3. Run the [`MergePolicy`] over both contents.
//! 4. Write the result to a temporary file next to the destination, and
//!    rename it over the destination.
//!
//! A destination that is a symbolic link is written through: the file the
//! link points at receives the merged content, and the link stays in place.
//!
//! The rename makes every single write atomic: readers see either the old or
//! the new content, never a half-written file. Atomicity does __not__ span a
//! batch. When [`discover_and_merge_all`] aborts midway, destinations merged
//! before the failure keep their new content.
//!
//! # See Also
//!
//! 1. [`merge`] for the available merge policies.
//! 2. [`discover`] for the traversal policy.

pub mod discover;
pub mod merge;

use crate::{config::PropagateSettings, propagate::merge::MergePolicy};

use std::{
    fs::{metadata, read_link, read_to_string, set_permissions, symlink_metadata},
    io::{Error as IoError, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

/// Merge snippet at `source` into file at `destination`.
///
/// Destination is overwritten with `merge(source, destination, path)`. An
/// absent destination is treated as empty, and gets created. Permissions of
/// an existing destination carry over to the rewritten file. A destination
/// that is a symbolic link is written through, the link itself is kept.
///
/// # Errors
///
/// - Return [`PropagateError::SourceNotFound`] if snippet does not exist.
/// - Return [`PropagateError::ReadSource`] if snippet cannot be read.
/// - Return [`PropagateError::ReadDestination`] if destination exists, but
///   cannot be read.
/// - Return [`PropagateError::DestinationDirNotFound`] if directory meant to
///   hold destination does not exist.
/// - Return [`PropagateError::WriteDestination`] if destination cannot be
///   written.
#[instrument(skip_all, level = "debug")]
pub fn merge_into(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    merge: &impl MergePolicy,
) -> Result<()> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    // INVARIANT: Snippet is read before the destination is ever touched.
    let snippet = read_to_string(source).map_err(|err| match err.kind() {
        ErrorKind::NotFound => PropagateError::SourceNotFound {
            path: source.to_path_buf(),
        },
        _ => PropagateError::ReadSource {
            source: err,
            path: source.to_path_buf(),
        },
    })?;

    let current = match read_to_string(destination) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("{:?} does not exist, treating as empty", destination.display());
            String::new()
        }
        Err(err) => {
            return Err(PropagateError::ReadDestination {
                source: err,
                path: destination.to_path_buf(),
            })
        }
    };

    let merged = merge.merge(&snippet, &current, destination);
    let target = resolve_links(destination)?;
    write_atomic(&target, merged.as_bytes())?;
    info!("merged {:?} into {:?}", source.display(), destination.display());

    Ok(())
}

/// Merge snippet at `source` into every file named `target_filename` below
/// `root`.
///
/// Aborts on first failure. Returns number of files merged.
///
/// # Errors
///
/// - Return [`PropagateError::RootNotFound`] if `root` does not exist or is
///   not a directory.
/// - Return [`PropagateError::Walk`] if `root` cannot be traversed.
/// - Return any error of [`merge_into`] for the first destination that fails.
#[instrument(skip(source, merge), level = "debug")]
pub fn discover_and_merge_all(
    root: impl AsRef<Path> + std::fmt::Debug,
    target_filename: &str,
    source: impl AsRef<Path> + std::fmt::Debug,
    merge: &impl MergePolicy,
) -> Result<usize> {
    let paths = discover(root, target_filename)?;
    for path in &paths {
        merge_into(source.as_ref(), path, merge)?;
    }

    info!(
        "merged {:?} into {} file(s) named {target_filename:?}",
        source.as_ref().display(),
        paths.len()
    );

    Ok(paths.len())
}

/// Propagate snippet of work tree according to `settings`.
///
/// Merges into the common destination first, whether or not discovery finds
/// anything, then into every discovered target file. All paths of `settings`
/// are taken relative to `work_tree`. Returns total number of files merged.
///
/// # Errors
///
/// - Return any error of [`merge_into`] or [`discover_and_merge_all`].
pub fn propagate_all(work_tree: &Path, settings: &PropagateSettings) -> Result<usize> {
    let snippet = work_tree.join(&settings.snippet_path);

    merge_into(
        &snippet,
        work_tree.join(&settings.common_destination_path),
        &settings.merge,
    )?;

    let discovered = discover_and_merge_all(
        work_tree.join(&settings.discovery_root),
        &settings.target_filename,
        &snippet,
        &settings.merge,
    )?;

    Ok(discovered + 1)
}

/// List every file named `target_filename` below `root` in walk order.
///
/// # Errors
///
/// - Return [`PropagateError::RootNotFound`] if `root` does not exist or is
///   not a directory.
/// - Return [`PropagateError::Walk`] if `root` cannot be traversed.
pub fn discover(root: impl AsRef<Path>, target_filename: &str) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(PropagateError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    Ok(discover::find_named(root, target_filename)?)
}

// Links nested deeper than this are treated as a loop.
const MAX_LINK_DEPTH: usize = 40;

fn resolve_links(destination: &Path) -> Result<PathBuf> {
    let mut resolved = destination.to_path_buf();
    for _ in 0..MAX_LINK_DEPTH {
        let is_link = symlink_metadata(&resolved).is_ok_and(|meta| meta.file_type().is_symlink());
        if !is_link {
            return Ok(resolved);
        }

        let link = read_link(&resolved).map_err(|err| PropagateError::WriteDestination {
            source: err,
            path: destination.to_path_buf(),
        })?;

        // INVARIANT: Relative link targets are relative to the link's directory.
        resolved = match resolved.parent() {
            Some(parent) => parent.join(link),
            None => link,
        };
        debug!("{:?} links to {:?}", destination.display(), resolved.display());
    }

    Err(PropagateError::WriteDestination {
        source: IoError::other("too many levels of symbolic links"),
        path: destination.to_path_buf(),
    })
}

fn write_atomic(destination: &Path, content: &[u8]) -> Result<()> {
    let parent = match destination.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => Path::new("."),
    };

    if !parent.is_dir() {
        return Err(PropagateError::DestinationDirNotFound {
            path: parent.to_path_buf(),
        });
    }

    let write_err = |err: std::io::Error| PropagateError::WriteDestination {
        source: err,
        path: destination.to_path_buf(),
    };

    let mut temp = NamedTempFile::new_in(parent).map_err(write_err)?;
    temp.write_all(content).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;

    // INVARIANT: Rewritten file keeps permissions of the file it replaces.
    if let Ok(existing) = metadata(destination) {
        set_permissions(temp.path(), existing.permissions()).map_err(write_err)?;
    }

    temp.persist(destination).map_err(|err| write_err(err.error))?;

    Ok(())
}

/// All possible error types for snippet propagation.
#[derive(Debug, thiserror::Error)]
pub enum PropagateError {
    /// Snippet does not exist.
    #[error("snippet {:?} not found", path.display())]
    SourceNotFound { path: PathBuf },

    /// Discovery root does not exist, or is not a directory.
    #[error("discovery root {:?} not found or not a directory", path.display())]
    RootNotFound { path: PathBuf },

    /// Directory meant to hold a destination does not exist.
    #[error("destination directory {:?} not found", path.display())]
    DestinationDirNotFound { path: PathBuf },

    /// Snippet cannot be read.
    #[error("failed to read snippet {:?}", path.display())]
    ReadSource {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Destination exists, but cannot be read.
    #[error("failed to read destination {:?}", path.display())]
    ReadDestination {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Destination cannot be written.
    #[error("failed to write destination {:?}", path.display())]
    WriteDestination {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Discovery root cannot be traversed.
    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

impl PropagateError {
    /// Determine if error stems from a missing file or directory.
    ///
    /// Every other error is an I/O failure on something that exists.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound { .. }
                | Self::RootNotFound { .. }
                | Self::DestinationDirNotFound { .. }
        )
    }
}

/// Friendly result alias :3
pub type Result<T, E = PropagateError> = std::result::Result<T, E>;
