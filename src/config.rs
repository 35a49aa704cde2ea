// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the `synth.toml` file that drives a bootstrap run to
//! simplify the process of serialization and deserialization. File I/O is left
//! to the caller to figure out.
//!
//! # General Layout
//!
//! A synth configuration is composed of three sections, one per pipeline step:
//!
//! - `[templates]` names the template directory to materialize and the paths
//!   that must never be copied out of it.
//! - `[fixup]` lists the commands to run over the work tree once templates
//!   have been materialized.
//! - `[propagate]` names the shared snippet and the configuration files that
//!   it gets merged into.
//!
//! Every section is optional. Missing fields fall back to the defaults of a
//! Node.js library repository using Kokoro for continuous integration.

use crate::propagate::merge::MergeStrategy;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Top-level synth configuration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Template materialization settings.
    pub templates: TemplateSettings,

    /// Post-processing settings.
    pub fixup: FixupSettings,

    /// Snippet propagation settings.
    pub propagate: PropagateSettings,
}

impl FromStr for SynthConfig {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: SynthConfig =
            toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on template source field.
        if let Some(source) = config.templates.source.take() {
            config.templates.source = Some(PathBuf::from(
                shellexpand::full(source.to_string_lossy().as_ref())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned(),
            ));
        }

        Ok(config)
    }
}

impl Display for SynthConfig {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Template materialization settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Directory holding the template set.
    ///
    /// Falls back to the default template store when absent.
    pub source: Option<PathBuf>,

    /// Gitignore style patterns of template paths to never copy.
    pub excluded_paths: Vec<String>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            source: None,
            excluded_paths: [
                ".github/auto-label.yaml",
                ".github/release-please.yml",
                ".github/CODEOWNERS",
                ".github/sync-repo-settings.yaml",
                ".github/workflows/ci.yaml",
                ".kokoro",
            ]
            .into_iter()
            .map(Into::into)
            .collect(),
        }
    }
}

/// Post-processing settings.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FixupSettings {
    /// Commands to run in order over the work tree, as argument vectors.
    pub commands: Vec<Vec<String>>,
}

impl Default for FixupSettings {
    fn default() -> Self {
        Self {
            commands: vec![
                vec!["npm".into(), "install".into()],
                vec!["npm".into(), "run".into(), "fix".into()],
            ],
        }
    }
}

/// Snippet propagation settings.
///
/// All paths are relative to the work tree.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PropagateSettings {
    /// Shared snippet of environment variable definitions.
    pub snippet_path: PathBuf,

    /// Configuration file that always receives the snippet.
    pub common_destination_path: PathBuf,

    /// Directory searched recursively for target files.
    pub discovery_root: PathBuf,

    /// Exact base name a discovered file must have.
    pub target_filename: String,

    /// Merge policy used for every destination.
    pub merge: MergeStrategy,
}

impl Default for PropagateSettings {
    fn default() -> Self {
        Self {
            snippet_path: PathBuf::from(".kokoro/common_env_vars.cfg"),
            common_destination_path: PathBuf::from(".kokoro/common.cfg"),
            discovery_root: PathBuf::from(".kokoro/continuous"),
            target_filename: "common.cfg".into(),
            merge: MergeStrategy::default(),
        }
    }
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[sealed_test(env = [("TEMPLATES", "/srv/templates")])]
    fn deserialize_synth_config() -> anyhow::Result<()> {
        let result: SynthConfig = r#"
            [templates]
            source = "$TEMPLATES/node-library"
            excluded_paths = [".kokoro", ".github/CODEOWNERS"]

            [fixup]
            commands = [["npm", "run", "fix"]]

            [propagate]
            snippet_path = "ci/env.cfg"
            common_destination_path = "ci/common.cfg"
            discovery_root = "ci/presubmit"
            target_filename = "build.cfg"
            merge = "append-missing"
        "#
        .parse()?;

        let expect = SynthConfig {
            templates: TemplateSettings {
                source: Some(PathBuf::from("/srv/templates/node-library")),
                excluded_paths: vec![".kokoro".into(), ".github/CODEOWNERS".into()],
            },
            fixup: FixupSettings {
                commands: vec![vec!["npm".into(), "run".into(), "fix".into()]],
            },
            propagate: PropagateSettings {
                snippet_path: PathBuf::from("ci/env.cfg"),
                common_destination_path: PathBuf::from("ci/common.cfg"),
                discovery_root: PathBuf::from("ci/presubmit"),
                target_filename: "build.cfg".into(),
                merge: MergeStrategy::AppendMissing,
            },
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn deserialize_partial_config_uses_defaults() -> anyhow::Result<()> {
        let result: SynthConfig = r#"
            [propagate]
            target_filename = "presubmit.cfg"
        "#
        .parse()?;

        let mut expect = SynthConfig::default();
        expect.propagate.target_filename = "presubmit.cfg".into();

        assert_eq!(result, expect);
        assert_eq!(result.templates.source, None);
        assert_eq!(result.propagate.merge, MergeStrategy::Append);

        Ok(())
    }

    #[test]
    fn deserialize_empty_config_is_default() -> anyhow::Result<()> {
        let result: SynthConfig = "".parse()?;
        assert_eq!(result, SynthConfig::default());

        Ok(())
    }

    #[test]
    fn deserialize_rejects_unknown_merge_strategy() {
        let result = r#"
            [propagate]
            merge = "overwrite"
        "#
        .parse::<SynthConfig>();

        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn serialize_default_config() -> anyhow::Result<()> {
        let result = SynthConfig::default().to_string();

        assert!(result.contains("[propagate]"));
        assert!(result.contains(r#"snippet_path = ".kokoro/common_env_vars.cfg""#));
        assert!(result.contains(r#"discovery_root = ".kokoro/continuous""#));
        assert!(result.contains(r#"target_filename = "common.cfg""#));
        assert!(result.contains(r#"merge = "append""#));
        assert!(!result.contains("source ="));

        // Written defaults must read back as the same defaults.
        let reparsed: SynthConfig = result.parse()?;
        assert_eq!(reparsed, SynthConfig::default());

        Ok(())
    }
}
