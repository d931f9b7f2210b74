//! Collaborators of the rebuild engine.
//!
//! Rendering and catalog handling live outside this crate; the reactor only
//! sees them through [`SiteBuilder`] and [`TranslationStore`]. Both receive
//! the [`BuildContext`] explicitly; there is no global build state.
//!
//! | Page kind    | Path marker    | Builder call               |
//! |--------------|----------------|----------------------------|
//! | `Work`       | `:work`        | `build_work_pages`         |
//! | `Tag`        | `:tag`         | `build_tag_pages`          |
//! | `Technology` | `:technology`  | `build_technology_pages`   |
//! | `Regular`    | (none)         | `build_regular_page`       |

pub mod command;
pub mod database;
pub mod i18n;

pub use command::CommandBuilder;
pub use database::Database;
pub use i18n::{Catalog, CompiledCatalogs};

use crate::log;
use anyhow::Result;
use std::path::Path;

/// Category of a page, picked from reserved markers in its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// One page per work in the database
    Work,
    /// One page per tag
    Tag,
    /// One page per technology
    Technology,
    /// A single page
    Regular,
}

impl PageKind {
    /// Checked in order; the first marker found in the path wins.
    const MARKERS: &'static [(&'static str, PageKind)] = &[
        (":work", PageKind::Work),
        (":tag", PageKind::Tag),
        (":technology", PageKind::Technology),
    ];

    /// Classify a page path. Always returns exactly one kind.
    pub fn classify(page: &Path) -> Self {
        let page = page.to_string_lossy();
        Self::MARKERS
            .iter()
            .find(|(marker, _)| page.contains(marker))
            .map_or(Self::Regular, |&(_, kind)| kind)
    }

    /// Get the short name for this kind (used in logs)
    pub const fn name(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Tag => "tag",
            Self::Technology => "technology",
            Self::Regular => "regular",
        }
    }
}

/// State shared by every rebuild: loaded translations and the database.
///
/// Owned by the reactor; replaced only when compiled translations change.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub catalog: Catalog,
    pub database: Database,
}

impl BuildContext {
    pub fn new(catalog: Catalog, database: Database) -> Self {
        Self { catalog, database }
    }

    /// Load translations and the database, logging failures and starting
    /// from empty data instead of giving up.
    pub fn load(translations: &impl TranslationStore, database: Option<&Path>) -> Self {
        let catalog = translations.load().unwrap_or_else(|e| {
            log!("i18n"; "couldn't load the translation files: {e:#}");
            Catalog::default()
        });
        let database = database
            .map(|path| {
                Database::open(path).unwrap_or_else(|e| {
                    log!("error"; "{e:#}");
                    Database::default()
                })
            })
            .unwrap_or_default();
        Self { catalog, database }
    }
}

/// Renders pages. Pages are root-relative paths.
pub trait SiteBuilder {
    fn build_regular_page(&mut self, ctx: &BuildContext, page: &Path) -> Result<()>;
    fn build_work_pages(&mut self, ctx: &BuildContext, page: &Path) -> Result<()>;
    fn build_tag_pages(&mut self, ctx: &BuildContext, page: &Path) -> Result<()>;
    fn build_technology_pages(&mut self, ctx: &BuildContext, page: &Path) -> Result<()>;
    /// Rebuild every page under the source root.
    fn build_all(&mut self, ctx: &BuildContext, source: &Path) -> Result<()>;
}

/// Loads compiled translations and saves the tracked locale's catalog.
pub trait TranslationStore {
    fn load(&self) -> Result<Catalog>;
    fn save_catalog(&self, ctx: &BuildContext, path: &Path) -> Result<()>;
}

/// Route a page to the builder call for its kind.
pub fn dispatch<B: SiteBuilder + ?Sized>(
    builder: &mut B,
    ctx: &BuildContext,
    page: &Path,
) -> Result<()> {
    match PageKind::classify(page) {
        PageKind::Work => builder.build_work_pages(ctx, page),
        PageKind::Tag => builder.build_tag_pages(ctx, page),
        PageKind::Technology => builder.build_technology_pages(ctx, page),
        PageKind::Regular => builder.build_regular_page(ctx, page),
    }
}
