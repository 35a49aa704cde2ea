// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use synthboot::{
    config::SynthConfig,
    path::{config_file_in, default_template_dir},
    propagate::propagate_all,
    synth::Synth,
    template::{CommandFixup, DirectoryTemplates, Fixup, NoFixup},
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  synthboot [options] <synthboot-command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    /// Work tree to bootstrap.
    #[arg(short = 'C', long, global = true, value_name = "path")]
    pub work_tree: Option<PathBuf>,

    /// Configuration file to use instead of "<work-tree>/synth.toml".
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    fn run(self) -> Result<()> {
        let work_tree = match self.work_tree {
            Some(path) => path,
            None => std::env::current_dir().context("cannot determine current directory")?,
        };
        let config_path = self
            .config
            .unwrap_or_else(|| config_file_in(&work_tree));

        match self.command {
            Command::Init(opts) => run_init(opts, &config_path),
            Command::Run(opts) => run_run(opts, work_tree, &config_path),
            Command::Propagate => run_propagate(work_tree, &config_path),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Write default configuration file.
    #[command(override_usage = "synthboot init [options]")]
    Init(InitOptions),

    /// Materialize templates, run fixups, and propagate shared snippet.
    #[command(override_usage = "synthboot run [options]")]
    Run(RunOptions),

    /// Propagate shared snippet into configuration files only.
    #[command(override_usage = "synthboot propagate [options]")]
    Propagate,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct InitOptions {
    /// Overwrite existing configuration file.
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct RunOptions {
    /// Do not run fixup commands after materializing templates.
    #[arg(short, long)]
    pub skip_fixup: bool,
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn run_init(opts: InitOptions, config_path: &Path) -> Result<()> {
    if config_path.exists() && !opts.force {
        bail!(
            "configuration file {:?} already exists, use --force to overwrite it",
            config_path.display()
        );
    }

    write(config_path, SynthConfig::default().to_string())
        .with_context(|| format!("failed to write {:?}", config_path.display()))?;
    info!("wrote default configuration to {:?}", config_path.display());

    Ok(())
}

fn run_run(opts: RunOptions, work_tree: PathBuf, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let source = match &config.templates.source {
        Some(source) => source.clone(),
        None => default_template_dir()?,
    };
    let templates = DirectoryTemplates::new(source);

    let fixup: Box<dyn Fixup> = if opts.skip_fixup {
        Box::new(NoFixup)
    } else {
        let commands = config.fixup.commands.clone();
        Box::new(CommandFixup::new(commands).with_progress_bar(ProgressBar::new_spinner())?)
    };

    let report = Synth::new(config, work_tree, templates, fixup).run()?;
    info!(
        "copied {} template file(s), merged snippet into {} file(s)",
        report.templates_copied, report.files_merged
    );

    Ok(())
}

fn run_propagate(work_tree: PathBuf, config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let merged = propagate_all(&work_tree, &config.propagate)?;
    info!("merged snippet into {merged} file(s)");

    Ok(())
}

fn load_config(config_path: &Path) -> Result<SynthConfig> {
    if !config_path.exists() {
        warn!(
            "configuration file {:?} not found, using defaults",
            config_path.display()
        );
        return Ok(SynthConfig::default());
    }

    let data = read_to_string(config_path)
        .with_context(|| format!("failed to read {:?}", config_path.display()))?;
    let config = data
        .parse::<SynthConfig>()
        .with_context(|| format!("failed to parse {:?}", config_path.display()))?;

    Ok(config)
}
