//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--loose-giterminism`: Read the worktree as is
//! - `--policy-file <path>`: Policy document path

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gtm - Resolve werf configuration files against the head commit
#[derive(Parser, Debug)]
#[command(name = "gtm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if gtm was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read files from the project directory without comparing with the commit
    #[arg(long, global = true)]
    pub loose_giterminism: bool,

    /// Project-relative path of the giterminism policy document
    #[arg(long, global = true, value_name = "PATH")]
    pub policy_file: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved werf config
    #[command(
        name = "read-config",
        long_about = "Print the resolved werf config.\n\n\
            Without PATH, werf.yaml and then werf.yml are tried. In giterminism \
            mode the committed content is printed, and the command fails if the \
            project directory copy differs.",
        after_help = "\
EXAMPLES:
    # Resolve the default config
    gtm read-config

    # Resolve a config at a custom path
    gtm read-config deploy/werf.yaml

    # Use the project directory as is
    gtm --loose-giterminism read-config"
    )]
    ReadConfig {
        /// Config path relative to the project directory
        path: Option<String>,
    },

    /// Print a single resolved file
    #[command(
        name = "read",
        after_help = "\
EXAMPLES:
    gtm read dockerfile docker/Dockerfile
    gtm read file files/config.json
    gtm read chart-file .helm/values.yaml"
    )]
    Read {
        /// What kind of file is read; decides which allow-list applies
        #[arg(value_enum)]
        kind: ReadKind,

        /// Path relative to the project directory
        path: String,
    },

    /// List files matched by a go-template glob
    #[command(name = "glob")]
    Glob {
        /// Glob relative to the project directory
        pattern: String,
    },

    /// List werf config templates
    #[command(name = "templates")]
    Templates {
        /// Templates directory (defaults to .werf)
        dir: Option<String>,
    },

    /// List files of a helm chart
    #[command(name = "chart")]
    Chart {
        /// Chart directory (defaults to .helm)
        dir: Option<String>,
    },

    /// Check a non-file dependency against the policy
    #[command(
        name = "inspect",
        after_help = "\
EXAMPLES:
    gtm inspect custom-tags
    gtm inspect env CI_COMMIT_SHA
    gtm inspect mount-from-path ~/.cache"
    )]
    Inspect {
        #[arg(value_enum)]
        check: InspectCheck,

        /// Value for checks that need one
        value: Option<String>,
    },

    /// Print the effective policy as JSON
    #[command(name = "policy")]
    Policy,
}

/// File kinds accepted by `read`.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    /// A Dockerfile
    Dockerfile,
    /// A .dockerignore file
    Dockerignore,
    /// A file read from templates with .Files.Get
    File,
    /// A file inside a helm chart
    ChartFile,
}

/// Checks accepted by `inspect`.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectCheck {
    CustomTags,
    FromLatest,
    GitBranch,
    MountBuildDir,
    MountFromPath,
    ContextAddFile,
    Env,
}

impl InspectCheck {
    /// Whether the check needs a value argument.
    pub fn needs_value(self) -> bool {
        matches!(
            self,
            InspectCheck::MountFromPath | InspectCheck::ContextAddFile | InspectCheck::Env
        )
    }
}
