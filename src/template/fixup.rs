// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Post-materialization fixups.
//!
//! Generated boilerplate rarely matches a project's formatting and lint rules
//! out of the box. A fixup pass runs once over the work tree right after
//! templates are materialized. What it does is up to the project, this module
//! only knows how to run a list of commands in order.

use indicatif::{ProgressBar, ProgressStyle};
use std::{
    ffi::OsStr,
    path::Path,
    process::Command,
    time::Duration,
};
use tracing::{debug, info, instrument};

/// Post-process a freshly seeded work tree.
pub trait Fixup {
    /// Run fixup pass over `work_tree`.
    fn fixup(&self, work_tree: &Path) -> Result<()>;
}

impl<T> Fixup for Box<T>
where
    T: Fixup + ?Sized,
{
    fn fixup(&self, work_tree: &Path) -> Result<()> {
        (**self).fixup(work_tree)
    }
}

/// Fixup that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFixup;

impl Fixup for NoFixup {
    fn fixup(&self, _work_tree: &Path) -> Result<()> {
        debug!("skipping fixup pass");
        Ok(())
    }
}

/// Fixup that runs a list of commands in the work tree.
///
/// Each command is an argument vector whose first element names the program.
/// Commands run in order, and the first failure stops the pass.
#[derive(Clone)]
pub struct CommandFixup {
    commands: Vec<Vec<String>>,
    bar: ProgressBar,
}

impl std::fmt::Debug for CommandFixup {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("CommandFixup")
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

impl CommandFixup {
    /// Construct new command fixup with hidden progress.
    pub fn new(commands: impl IntoIterator<Item = Vec<String>>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
            bar: ProgressBar::hidden(),
        }
    }

    /// Show a spinner on given progress bar while commands run.
    ///
    /// # Errors
    ///
    /// - Return [`FixupError::IndicatifStyleTemplate`] if spinner style cannot
    ///   be set.
    pub fn with_progress_bar(mut self, bar: ProgressBar) -> Result<Self> {
        let style = ProgressStyle::with_template("{elapsed_precise:.green}  {spinner}  {msg}")?;
        bar.set_style(style);
        self.bar = bar;
        Ok(self)
    }

    /// Commands run by this fixup.
    pub fn commands(&self) -> &[Vec<String>] {
        self.commands.as_slice()
    }
}

impl Fixup for CommandFixup {
    #[instrument(skip(self), level = "debug")]
    fn fixup(&self, work_tree: &Path) -> Result<()> {
        self.bar.enable_steady_tick(Duration::from_millis(100));

        for argv in &self.commands {
            // INVARIANT: Empty argument vectors name no program, skip them.
            let Some((program, args)) = argv.split_first() else {
                continue;
            };

            let line = argv.join(" ");
            self.bar.set_message(line.clone());
            let output = match syscall_non_interactive(work_tree, program, args) {
                Ok(output) => output,
                Err(error) => {
                    self.bar.finish_and_clear();
                    return Err(error);
                }
            };

            if !output.is_empty() {
                self.bar.suspend(|| info!("{line}: {output}"));
            }
        }

        self.bar.finish_and_clear();
        info!("fixup pass finished over {:?}", work_tree.display());

        Ok(())
    }
}

fn syscall_non_interactive(
    work_tree: &Path,
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let program = cmd.as_ref().to_string_lossy().into_owned();
    let output = Command::new(cmd.as_ref())
        .args(args)
        .current_dir(work_tree)
        .output()
        .map_err(|err| FixupError::Spawn {
            source: err,
            program: program.clone(),
        })?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();
    let mut streams = Vec::new();

    if !stdout.is_empty() {
        streams.push(format!("stdout: {}", chomp(&stdout)));
    }

    if !stderr.is_empty() {
        streams.push(format!("stderr: {}", chomp(&stderr)));
    }

    // INVARIANT: Each captured stream sits on its own line.
    let message = streams.join("\n");

    if !output.status.success() {
        return Err(FixupError::CommandFailed { program, message });
    }

    Ok(message)
}

// INVARIANT: Chomp one trailing newline.
fn chomp(output: &str) -> &str {
    output
        .strip_suffix("\r\n")
        .or(output.strip_suffix('\n'))
        .unwrap_or(output)
}

/// Fixup error types.
#[derive(Debug, thiserror::Error)]
pub enum FixupError {
    /// Command cannot be spawned.
    #[error("failed to spawn {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// Command exited with failure status.
    #[error("command {program:?} failed:\n{message}")]
    CommandFailed { program: String, message: String },

    /// Style template cannot be set for progress bars.
    #[error(transparent)]
    IndicatifStyleTemplate(#[from] indicatif::style::TemplateError),
}

/// Friendly result alias :3
pub type Result<T, E = FixupError> = std::result::Result<T, E>;

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::fs::{create_dir_all, read_to_string};

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    #[sealed_test]
    fn command_fixup_runs_commands_in_order_inside_work_tree() -> anyhow::Result<()> {
        create_dir_all("repo")?;

        let fixup = CommandFixup::new([sh("echo one > log"), sh("echo two >> log")]);
        fixup.fixup(Path::new("repo"))?;

        assert_eq!(read_to_string("repo/log")?, "one\ntwo\n");

        Ok(())
    }

    #[sealed_test]
    fn command_fixup_stops_at_first_failure() -> anyhow::Result<()> {
        create_dir_all("repo")?;

        let fixup = CommandFixup::new([
            sh("echo before > log"),
            sh("echo broken >&2; exit 3"),
            sh("echo after >> log"),
        ]);
        let result = fixup.fixup(Path::new("repo"));

        match result {
            Err(FixupError::CommandFailed { program, message }) => {
                assert_eq!(program, "sh");
                assert_eq!(message, "stderr: broken");
            }
            other => panic!("expected failed command, got {other:?}"),
        }
        assert_eq!(read_to_string("repo/log")?, "before\n");

        Ok(())
    }

    #[sealed_test]
    fn command_fixup_reports_each_stream_on_own_line() -> anyhow::Result<()> {
        create_dir_all("repo")?;

        let fixup = CommandFixup::new([sh("echo out; echo err >&2; exit 1")]);
        let result = fixup.fixup(Path::new("repo"));

        match result {
            Err(FixupError::CommandFailed { message, .. }) => {
                assert_eq!(message, "stdout: out\nstderr: err");
            }
            other => panic!("expected failed command, got {other:?}"),
        }

        Ok(())
    }

    #[sealed_test]
    fn command_fixup_reports_missing_program() -> anyhow::Result<()> {
        create_dir_all("repo")?;

        let fixup = CommandFixup::new([vec!["synthboot-no-such-program".to_string()]]);
        let result = fixup.fixup(Path::new("repo"));
        assert!(matches!(result, Err(FixupError::Spawn { .. })));

        Ok(())
    }

    #[sealed_test]
    fn command_fixup_skips_empty_commands() -> anyhow::Result<()> {
        create_dir_all("repo")?;

        let fixup = CommandFixup::new([Vec::new(), sh("touch done")]);
        fixup.fixup(Path::new("repo"))?;
        assert!(Path::new("repo/done").is_file());

        Ok(())
    }

    #[test]
    fn no_fixup_does_nothing() -> anyhow::Result<()> {
        NoFixup.fixup(Path::new("/definitely/not/here"))?;
        Ok(())
    }
}
