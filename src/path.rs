// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for external files that need to be
//! interacted with, or managed in some way.

use std::path::{Path, PathBuf};

/// Name of the configuration file looked up at the top of a work tree.
pub const CONFIG_FILE_NAME: &str = "synth.toml";

/// Determine default absolute path to template store directory.
///
/// Uses XDG Base Directory path `$XDG_DATA_HOME/synthboot-templates` as the
/// default absolute path for a template store. Does not check if the path
/// returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
///
/// # See Also
///
/// - [XDG Base Directory](https://wiki.archlinux.org/title/XDG_Base_Directory)
pub fn default_template_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|path| path.join("synthboot-templates"))
        .ok_or(NoWayHome)
}

/// Determine path to configuration file of a work tree.
pub fn config_file_in(work_tree: impl AsRef<Path>) -> PathBuf {
    work_tree.as_ref().join(CONFIG_FILE_NAME)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::data_dir`](https://docs.rs/dirs/latest/dirs/fn.data_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's data directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
