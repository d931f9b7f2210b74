//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Incremental rebuilds for a template-based static site
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: pagewatch.toml)
    #[arg(short = 'C', long, default_value = "pagewatch.toml")]
    pub config: PathBuf,

    /// subcommands (default: watch)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Watch the source and i18n directories, rebuilding affected pages on change
    Watch,

    /// Rebuild every page once
    Build,

    /// Print the pages that transitively depend on a page, in build order
    Deps {
        /// Page path, relative to the source root or absolute
        page: PathBuf,

        /// Recursion bound (default: [watch.max_depth])
        #[arg(short, long)]
        depth: Option<usize>,
    },
}

impl Cli {
    /// The subcommand to run, `watch` when none was given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Watch)
    }
}
