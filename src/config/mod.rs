//! Project configuration from `pagewatch.toml`.
//!
//! # Sections
//!
//! | Section            | Purpose                                          |
//! |--------------------|--------------------------------------------------|
//! | `[build]`          | Source/i18n layout, catalog, database            |
//! | `[build.commands]` | External commands that render pages              |
//! | `[watch]`          | Watcher backend, recursion bound, gallery page   |
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "src"
//! catalog = "i18n/fr.po"
//!
//! [build.commands]
//! regular = ["ortfomk", "build", "{page}"]
//! all = ["ortfomk", "build"]
//!
//! [watch]
//! max_depth = 10
//! ```
//!
//! A missing config file is not an error: every field has a default.

mod build;
pub mod defaults;
mod error;
mod watch;

pub use build::{BuildConfig, CommandsConfig};
pub use error::ConfigError;
pub use watch::WatchConfig;

use crate::cli::Cli;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing pagewatch.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Load the config file named by the CLI, falling back to defaults when absent.
    pub fn load(cli: &Cli) -> Result<Self> {
        let base = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = base.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.config_path = Self::normalize_path(&config_path);
        config.update_with_cli(cli);
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Source root holding the templates (absolute after loading).
    pub fn source_dir(&self) -> &Path {
        &self.build.source
    }

    /// Directory holding compiled translations (absolute after loading).
    pub fn i18n_dir(&self) -> &Path {
        &self.build.i18n
    }

    /// Catalog file of the tracked locale (absolute after loading).
    pub fn catalog_path(&self) -> &Path {
        &self.build.catalog
    }

    /// Apply CLI overrides and resolve every path against the project root.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.update_path_with_root(&root);
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(&Self::expand_tilde(root));
        self.build.root = Some(root.clone());

        self.build.source = Self::normalize_path(&root.join(&self.build.source));
        self.build.i18n = Self::normalize_path(&root.join(&self.build.i18n));
        self.build.catalog = Self::normalize_path(&root.join(&self.build.catalog));

        if let Some(database) = &self.build.database {
            let database = Self::expand_tilde(database);
            self.build.database = Some(Self::normalize_path(&root.join(database)));
        }
    }

    fn expand_tilde(path: &Path) -> PathBuf {
        match path.to_str() {
            Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
            None => path.to_path_buf(),
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before starting to watch or build.
    pub fn validate(&self) -> Result<()> {
        if self.build.template_extension.is_empty() {
            bail!(ConfigError::Validation(
                "[build.template_extension] must not be empty".into()
            ));
        }
        if self.build.translation_extension.is_empty() {
            bail!(ConfigError::Validation(
                "[build.translation_extension] must not be empty".into()
            ));
        }
        if self.watch.max_depth == 0 {
            bail!(ConfigError::Validation(
                "[watch.max_depth] must be at least 1".into()
            ));
        }
        if !self.source_dir().is_dir() {
            bail!(ConfigError::Validation(format!(
                "source directory `{}` not found",
                self.source_dir().display()
            )));
        }

        let commands = &self.build.commands;
        for (field, command) in [
            ("[build.commands.regular]", &commands.regular),
            ("[build.commands.work]", &commands.work),
            ("[build.commands.tag]", &commands.tag),
            ("[build.commands.technology]", &commands.technology),
            ("[build.commands.all]", &commands.all),
            ("[build.commands.save_catalog]", &commands.save_catalog),
        ] {
            Self::check_command_installed(field, command)?;
        }

        Ok(())
    }

    /// Check that a configured command's program can be found.
    /// Unconfigured (empty) commands are accepted.
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        let Some(cmd) = command.first() else {
            return Ok(());
        };
        which::which(cmd)
            .with_context(|| format!("{field}: `{cmd}` not found. Please install it first."))?;
        Ok(())
    }
}
