//! Reacts to source changes by rebuilding exactly the affected pages.
//!
//! # Event handling
//!
//! | Event          | File             | Action                                        |
//! |----------------|------------------|-----------------------------------------------|
//! | create / write | compiled catalog | reload translations, rebuild everything       |
//! | create / write | template         | rebuild the page, then its dependents         |
//! | remove         | template         | warn if other pages still depend on it        |
//! | rename         | gallery page     | warn and stop watching                        |
//! | rename         | template         | repoint dependents' declarations to new name  |
//! | rename         | onto a template  | same as a write to the destination            |
//!
//! Events are handled one at a time, in arrival order, by whoever owns the
//! [`Reactor`]; the build context is never shared with another thread.

use crate::{
    config::SiteConfig,
    deps::{Dependents, RelationScanner, rewrite_declaration, transitive_dependents},
    log,
    logger::session_header,
    site::{BuildContext, SiteBuilder, TranslationStore, dispatch},
};
use anyhow::Result;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::Receiver,
};

/// A filesystem change, with absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Created(PathBuf),
    Written(PathBuf),
    Removed(PathBuf),
    /// Also used for moves
    Renamed { from: PathBuf, to: PathBuf },
}

/// What the watch front-end feeds the reactor.
#[derive(Debug)]
pub enum WatchMessage {
    Change(ChangeEvent),
    Error(notify::Error),
    /// The watcher is shutting down
    Close,
}

/// A page that went away while other pages still declare it.
///
/// Nothing is rewritten for these; they are left for a human to fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orphaned {
    pub page: PathBuf,
    pub dependents: Dependents,
}

/// Whether the loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Reactor<B, T> {
    scanner: RelationScanner,
    builder: B,
    translations: T,
    ctx: BuildContext,
    catalog_path: PathBuf,
    translation_extension: String,
    max_depth: usize,
    orphaned: Vec<Orphaned>,
    stopped: bool,
}

impl<B: SiteBuilder, T: TranslationStore> Reactor<B, T> {
    pub fn new(scanner: RelationScanner, builder: B, translations: T) -> Self {
        Self {
            scanner,
            builder,
            translations,
            ctx: BuildContext::default(),
            catalog_path: crate::config::defaults::build::catalog(),
            translation_extension: crate::config::defaults::build::translation_extension(),
            max_depth: crate::config::defaults::watch::max_depth(),
            orphaned: Vec::new(),
            stopped: false,
        }
    }

    /// Reactor for a loaded config, with translations and database read once.
    pub fn from_config(config: &SiteConfig, builder: B, translations: T) -> Result<Self> {
        let scanner = RelationScanner::from_config(config)?;
        let ctx = BuildContext::load(&translations, config.build.database.as_deref());
        Ok(Self::new(scanner, builder, translations)
            .with_context(ctx)
            .with_catalog_path(config.catalog_path())
            .with_translation_extension(&config.build.translation_extension)
            .with_max_depth(config.watch.max_depth))
    }

    pub fn with_context(mut self, ctx: BuildContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn with_catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = path.into();
        self
    }

    pub fn with_translation_extension(mut self, extension: impl Into<String>) -> Self {
        self.translation_extension = extension.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[allow(unused)]
    pub fn builder(&self) -> &B {
        &self.builder
    }

    #[allow(unused)]
    pub fn translations(&self) -> &T {
        &self.translations
    }

    #[allow(unused)]
    pub fn context(&self) -> &BuildContext {
        &self.ctx
    }

    /// Every removal or move so far that left dependents behind, oldest first.
    pub fn orphaned(&self) -> &[Orphaned] {
        &self.orphaned
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Drain messages until the watcher closes or the reactor stops.
    pub fn run(&mut self, messages: Receiver<WatchMessage>) {
        for message in messages {
            match message {
                WatchMessage::Change(event) => {
                    if self.handle(event) == Flow::Stop {
                        break;
                    }
                }
                WatchMessage::Error(e) => {
                    log!("error"; "an error occurred while watching changes: {e}");
                }
                WatchMessage::Close => break,
            }
        }
    }

    /// Classify one event and act on it. Once stopped, every event is ignored.
    pub fn handle(&mut self, event: ChangeEvent) -> Flow {
        if self.stopped {
            return Flow::Stop;
        }
        match event {
            ChangeEvent::Created(path) | ChangeEvent::Written(path) => self.on_change(&path),
            ChangeEvent::Removed(path) => self.on_remove(&path),
            ChangeEvent::Renamed { from, to } => return self.on_rename(&from, &to),
        }
        Flow::Continue
    }

    fn on_change(&mut self, path: &Path) {
        if self.is_translation(path) {
            session_header("compiled translations changed: re-building everything");
            self.reload_translations();
            if let Err(e) = self.builder.build_all(&self.ctx, self.scanner.root().dir()) {
                log!("error"; "full rebuild failed: {e:#}");
            }
            return;
        }

        if !self.is_template(path) {
            return;
        }
        let Some(page) = self.page(path) else {
            return;
        };

        let dependents = transitive_dependents(&self.scanner, &page, self.max_depth);
        session_header(&format!(
            "building {} and its dependents [{}]",
            page.display(),
            dependents.display()
        ));

        for target in std::iter::once(&page).chain(&dependents) {
            self.build(target);
        }

        if let Err(e) = self.translations.save_catalog(&self.ctx, &self.catalog_path) {
            log!("i18n"; "{e:#}");
        }
    }

    fn on_remove(&mut self, path: &Path) {
        if !self.is_template(path) {
            return;
        }
        let Some(page) = self.page(path) else {
            return;
        };

        // Only the surviving declarers are read, so scanning after the
        // removal sees the same dependents as scanning before it.
        let dependents = transitive_dependents(&self.scanner, &page, self.max_depth);
        self.orphan(page, dependents, "was removed");
    }

    fn on_rename(&mut self, from: &Path, to: &Path) -> Flow {
        let old = if self.is_template(from) {
            self.page(from)
        } else {
            None
        };
        let Some(old) = old else {
            // Saved through a temp file, or moved in from outside the root
            if self.is_template(to) {
                self.on_change(to);
            }
            return Flow::Continue;
        };

        if self.scanner.is_gallery(&old) {
            log!("warn"; "{} was renamed, exiting: references to the gallery page \
                          outside the templates must be updated by hand.", old.display());
            self.stopped = true;
            return Flow::Stop;
        }

        let dependents = transitive_dependents(&self.scanner, &old, self.max_depth);
        if !self.is_template(to) {
            self.orphan(old, dependents, "is no longer a template");
            return Flow::Continue;
        }
        if dependents.is_empty() {
            return Flow::Continue;
        }
        let Some(new) = self.page(to) else {
            self.orphan(old, dependents, "moved out of the source root");
            return Flow::Continue;
        };

        session_header(&format!(
            "{} was renamed to {}: updating references in {}",
            old.display(),
            new.display(),
            dependents.display()
        ));
        for dependent in &dependents {
            let file = self.scanner.root().absolute(dependent);
            match rewrite_declaration(&file, &old, &new, self.scanner.syntax()) {
                Ok(true) => log!("deps"; "updated {}", dependent.display()),
                Ok(false) => {}
                Err(e) => log!("error"; "{e:#}"),
            }
        }
        Flow::Continue
    }

    /// Warn about, and remember, pages still declaring a page that went away.
    fn orphan(&mut self, page: PathBuf, dependents: Dependents, reason: &str) {
        if dependents.is_empty() {
            return;
        }
        log!("warn"; "files {} depended on {}, which {reason}",
             dependents.display(), page.display());
        self.orphaned.push(Orphaned { page, dependents });
    }

    fn build(&mut self, page: &Path) {
        if let Err(e) = dispatch(&mut self.builder, &self.ctx, page) {
            log!("error"; "building {} failed: {e:#}", page.display());
        }
    }

    fn reload_translations(&mut self) {
        match self.translations.load() {
            Ok(catalog) => self.ctx.catalog = catalog,
            Err(e) => log!("i18n"; "couldn't load the translation files, keeping the previous ones: {e:#}"),
        }
    }

    fn page(&self, path: &Path) -> Option<PathBuf> {
        self.scanner
            .root()
            .relative(path)
            .inspect_err(|e| log!("watch"; "ignoring change: {e}"))
            .ok()
    }

    fn is_template(&self, path: &Path) -> bool {
        self.scanner.syntax().is_template(path)
    }

    fn is_translation(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == self.translation_extension.as_str())
    }
}
