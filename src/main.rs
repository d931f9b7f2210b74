//! pagewatch - incremental rebuilds for a template-based static site.

mod cli;
mod config;
mod deps;
mod logger;
mod paths;
mod reactor;
mod site;
mod utils;
mod watch;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use deps::{RelationScanner, transitive_dependents};
use reactor::Reactor;
use site::{BuildContext, CommandBuilder, CompiledCatalogs, SiteBuilder};
use std::path::{Path, PathBuf};
use watch::watch_for_changes_blocking;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command() {
        Commands::Watch => {
            let reactor = Reactor::from_config(
                &config,
                CommandBuilder::from_config(&config),
                translations(&config),
            )?;
            watch_for_changes_blocking(&config, reactor)
        }
        Commands::Build => {
            let translations = translations(&config);
            let ctx = BuildContext::load(&translations, config.build.database.as_deref());
            CommandBuilder::from_config(&config).build_all(&ctx, config.source_dir())
        }
        Commands::Deps { page, depth } => {
            let scanner = RelationScanner::from_config(&config)?;
            let page = resolve_page(&scanner, &page)?;
            let depth = depth.unwrap_or(config.watch.max_depth);
            let dependents = transitive_dependents(&scanner, &page, depth);
            for dependent in &dependents {
                println!("{}", dependent.display());
            }
            if dependents.is_truncated() {
                log!("warn"; "list cut at depth {depth}, pass a larger --depth to see more");
            }
            log!("deps"; "{} pages depend on {}", dependents.len(), page.display());
            Ok(())
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let config = SiteConfig::load(cli)?;
    config.validate()?;
    Ok(config)
}

fn translations(config: &SiteConfig) -> CompiledCatalogs {
    CompiledCatalogs::new(config.i18n_dir(), &config.build.translation_extension)
        .with_save_command(config.get_root(), config.build.commands.save_catalog.clone())
}

/// Accept a page given relative to the source root, or any path under it.
fn resolve_page(scanner: &RelationScanner, page: &Path) -> Result<PathBuf> {
    if page.is_relative() && scanner.root().absolute(page).exists() {
        return Ok(page.to_path_buf());
    }
    let absolute = page.canonicalize().unwrap_or_else(|_| page.to_path_buf());
    Ok(scanner.root().relative(&absolute)?)
}
