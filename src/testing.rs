// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Fixture helpers shared by unit tests.

use std::{
    fs::{create_dir_all, write},
    path::Path,
};

/// Write each `(path, content)` pair, creating missing parent directories.
pub(crate) fn write_tree(files: &[(&str, &str)]) -> anyhow::Result<()> {
    for (path, content) in files {
        if let Some(parent) = Path::new(path).parent() {
            create_dir_all(parent)?;
        }
        write(path, content)?;
    }

    Ok(())
}

/// Create empty file at `path`, creating missing parent directories.
pub(crate) fn touch(path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    write(path, "")?;

    Ok(())
}
