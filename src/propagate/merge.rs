// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Merge policies.
//!
//! A __merge policy__ combines the content of the shared snippet with the
//! current content of a destination file, producing the content that gets
//! written back. Policies are pure. They never touch the file system, which
//! keeps the walk and I/O logic of [`crate::propagate`] separate from how
//! content is combined.
//!
//! # Idempotence
//!
//! The default policy is plain concatenation. It is deterministic, but it is
//! __not__ idempotent: every application appends another copy of the snippet.
//! Callers must merge into a destination at most once per logical update, or
//! opt into [`AppendMissingMerge`].

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Combine snippet content with destination content.
pub trait MergePolicy {
    /// Produce new destination content.
    ///
    /// The destination path is informational. Policies may special case it,
    /// but are not required to look at it.
    fn merge(&self, source: &str, destination: &str, path: &Path) -> String;
}

impl<F> MergePolicy for F
where
    F: Fn(&str, &str, &Path) -> String,
{
    fn merge(&self, source: &str, destination: &str, path: &Path) -> String {
        self(source, destination, path)
    }
}

/// Default merge: destination, a newline, then source.
///
/// Destination path is ignored.
pub fn default_merge(source: &str, destination: &str, _path: &Path) -> String {
    format!("{destination}\n{source}")
}

/// Policy form of [`default_merge`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AppendMerge;

impl MergePolicy for AppendMerge {
    fn merge(&self, source: &str, destination: &str, path: &Path) -> String {
        default_merge(source, destination, path)
    }
}

/// Append only snippet lines that destination lacks.
///
/// Returns destination unchanged when every non-blank snippet line is
/// already present as a line of the destination, which makes repeated
/// application a no-op.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AppendMissingMerge;

impl MergePolicy for AppendMissingMerge {
    fn merge(&self, source: &str, destination: &str, _path: &Path) -> String {
        let present = destination.lines().collect::<Vec<_>>();
        let mut missing = Vec::new();
        for line in source.lines() {
            if line.trim().is_empty() || present.contains(&line) || missing.contains(&line) {
                continue;
            }
            missing.push(line);
        }

        if missing.is_empty() {
            return destination.to_owned();
        }

        format!("{destination}\n{}", missing.join("\n"))
    }
}

/// Merge policy selectable from configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Use [`AppendMerge`].
    #[default]
    Append,

    /// Use [`AppendMissingMerge`].
    AppendMissing,
}

impl MergePolicy for MergeStrategy {
    fn merge(&self, source: &str, destination: &str, path: &Path) -> String {
        match self {
            Self::Append => AppendMerge.merge(source, destination, path),
            Self::AppendMissing => AppendMissingMerge.merge(source, destination, path),
        }
    }
}
