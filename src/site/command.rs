//! Builder backed by external commands from `[build.commands]`.

use super::{BuildContext, PageKind, SiteBuilder};
use crate::{
    config::{CommandsConfig, SiteConfig},
    log,
    utils::command,
};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Runs one configured command per builder call.
///
/// `{page}` expands to the page path under the project root
/// (`src/work/:work.pug`), `{root}` to the source root, `{database}` to the
/// database file and `{locales}` to the loaded locales, comma-separated
/// (`de,fr`). The locale list follows catalog reloads.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    /// Project root, the working directory of every command
    root: PathBuf,
    source: PathBuf,
    commands: CommandsConfig,
}

impl CommandBuilder {
    pub fn new(root: impl Into<PathBuf>, source: impl Into<PathBuf>, commands: CommandsConfig) -> Self {
        Self {
            root: root.into(),
            source: source.into(),
            commands,
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self::new(
            config.get_root(),
            config.source_dir(),
            config.build.commands.clone(),
        )
    }

    /// Command for a page kind; kinds without their own command use `regular`.
    fn command_for(&self, kind: PageKind) -> &[String] {
        let specific = match kind {
            PageKind::Work => &self.commands.work,
            PageKind::Tag => &self.commands.tag,
            PageKind::Technology => &self.commands.technology,
            PageKind::Regular => &self.commands.regular,
        };
        if specific.is_empty() {
            &self.commands.regular
        } else {
            specific
        }
    }

    /// Page path as passed to commands: relative to the project root when possible.
    fn page_arg(&self, page: &Path) -> String {
        let absolute = self.source.join(page);
        absolute
            .strip_prefix(&self.root)
            .unwrap_or(&absolute)
            .to_string_lossy()
            .into_owned()
    }

    fn run(&self, ctx: &BuildContext, argv: &[String], page: Option<&Path>) -> Result<()> {
        let page_arg = page.map(|p| self.page_arg(p)).unwrap_or_default();
        let source = self.source.to_string_lossy();
        let database = ctx.database.path_str();
        let locales = ctx.catalog.locales().collect::<Vec<_>>().join(",");
        let argv = command::expand(
            argv,
            &[
                ("page", page_arg.as_str()),
                ("root", source.as_ref()),
                ("database", database.as_str()),
                ("locales", locales.as_str()),
            ],
        );
        command::exec(Some(&self.root), &argv)?;
        Ok(())
    }

    fn build_page(&mut self, ctx: &BuildContext, kind: PageKind, page: &Path) -> Result<()> {
        let argv = self.command_for(kind);
        if argv.is_empty() {
            log!("build"; "no command for {} pages, skipping {}", kind.name(), page.display());
            return Ok(());
        }
        self.run(ctx, argv, Some(page))
    }
}

impl SiteBuilder for CommandBuilder {
    fn build_regular_page(&mut self, ctx: &BuildContext, page: &Path) -> Result<()> {
        self.build_page(ctx, PageKind::Regular, page)
    }

    fn build_work_pages(&mut self, ctx: &BuildContext, page: &Path) -> Result<()> {
        self.build_page(ctx, PageKind::Work, page)
    }

    fn build_tag_pages(&mut self, ctx: &BuildContext, page: &Path) -> Result<()> {
        self.build_page(ctx, PageKind::Tag, page)
    }

    fn build_technology_pages(&mut self, ctx: &BuildContext, page: &Path) -> Result<()> {
        self.build_page(ctx, PageKind::Technology, page)
    }

    fn build_all(&mut self, ctx: &BuildContext, _source: &Path) -> Result<()> {
        if self.commands.all.is_empty() {
            log!("build"; "no [build.commands.all] configured, nothing to rebuild");
            return Ok(());
        }
        self.run(ctx, &self.commands.all, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Catalog, i18n::Messages};
    use std::fs;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_falls_back_to_regular() {
        let commands = CommandsConfig {
            regular: argv(&["site", "page", "{page}"]),
            work: argv(&["site", "works", "{page}"]),
            ..Default::default()
        };
        let builder = CommandBuilder::new("/site", "/site/src", commands);

        assert_eq!(builder.command_for(PageKind::Work)[1], "works");
        assert_eq!(builder.command_for(PageKind::Tag)[1], "page");
        assert_eq!(builder.command_for(PageKind::Regular)[1], "page");
    }

    #[test]
    fn test_page_arg_is_project_relative() {
        let builder = CommandBuilder::new("/site", "/site/src", CommandsConfig::default());
        assert_eq!(builder.page_arg(Path::new("work/:work.pug")), "src/work/:work.pug");
    }

    #[test]
    fn test_unconfigured_builder_skips() {
        let mut builder = CommandBuilder::new("/site", "/site/src", CommandsConfig::default());
        let ctx = BuildContext::default();
        assert!(builder.build_regular_page(&ctx, Path::new("about.pug")).is_ok());
        assert!(builder.build_all(&ctx, Path::new("/site/src")).is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn test_runs_command_in_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let commands = CommandsConfig {
            regular: argv(&["sh", "-c", "echo \"$0\" >> built.txt", "{page}"]),
            ..Default::default()
        };
        let mut builder = CommandBuilder::new(dir.path(), dir.path().join("src"), commands);
        let ctx = BuildContext::default();

        builder.build_regular_page(&ctx, Path::new("about.pug")).unwrap();
        builder.build_tag_pages(&ctx, Path::new("tag/:tag.pug")).unwrap();

        let built = fs::read_to_string(dir.path().join("built.txt")).unwrap();
        assert_eq!(built, "src/about.pug\nsrc/tag/:tag.pug\n");
    }

    #[test]
    #[cfg(unix)]
    fn test_locales_follow_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let commands = CommandsConfig {
            all: argv(&["sh", "-c", "echo \"$0\" >> locales.txt", "{locales}"]),
            ..Default::default()
        };
        let mut builder = CommandBuilder::new(dir.path(), dir.path().join("src"), commands);

        let mut catalog = Catalog::default();
        catalog.insert("fr", Messages::from([("Hello".into(), "Bonjour".into())]));
        builder.build_all(&BuildContext::default(), Path::new("src")).unwrap();
        catalog.insert("de", Messages::from([("Hello".into(), "Hallo".into())]));
        let ctx = BuildContext::new(catalog, Default::default());
        builder.build_all(&ctx, Path::new("src")).unwrap();

        let seen = fs::read_to_string(dir.path().join("locales.txt")).unwrap();
        assert_eq!(seen, "\nde,fr\n");
    }
}
