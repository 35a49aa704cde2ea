// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Discovery of target files.
//!
//! Walks a directory tree and selects every regular file whose base name is
//! exactly equal to a target filename. Matching is a plain, case-sensitive
//! string comparison. There are no glob or regex semantics.
//!
//! # Traversal Policy
//!
//! - Entries are yielded sorted by file name at every depth, so that the walk
//!   order is reproducible between runs and between machines.
//! - Ignore files (`.gitignore`, `.ignore`) and hidden entries are __not__
//!   filtered out. Configuration trees such as `.kokoro/` are hidden by
//!   nature.
//! - Symbolic links are never followed, and a symbolic link is never matched
//!   itself, even if its name equals the target filename. This rules out
//!   infinite loops through symlinked directories.

use ignore::WalkBuilder;
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Find every regular file named `target_filename` below `root`.
///
/// Includes files placed directly in `root`. The returned paths are prefixed
/// by `root` and appear in walk order.
///
/// # Errors
///
/// - Return [`ignore::Error`] if any part of the tree cannot be walked.
pub fn find_named(root: &Path, target_filename: &str) -> Result<Vec<PathBuf>, ignore::Error> {
    let target = OsStr::new(target_filename);
    let mut found = Vec::new();

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walker {
        let entry = entry?;

        // INVARIANT: Only regular files can match, never directories or links.
        let is_file = entry.file_type().is_some_and(|kind| kind.is_file());
        if !is_file || entry.file_name() != target {
            continue;
        }

        debug!("discovered {:?}", entry.path().display());
        found.push(entry.into_path());
    }

    Ok(found)
}
