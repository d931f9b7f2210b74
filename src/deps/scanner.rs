//! Finds the pages that declare a dependency on a given page.
//!
//! Nothing is cached: every query walks the source root and reads each
//! template, so the answer always reflects what is on disk right now.

use super::syntax::DeclarationSyntax;
use crate::{config::SiteConfig, log, paths::SourceRoot};
use anyhow::{Context, Result};
use regex::bytes::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// The gallery page and the inline marker that makes a page depend on it.
#[derive(Debug, Clone)]
pub struct GalleryRule {
    pub page: PathBuf,
    marker: Regex,
}

impl GalleryRule {
    pub fn new(page: impl Into<PathBuf>, marker: &str) -> Result<Self> {
        let marker = Regex::new(&regex::escape(marker))
            .with_context(|| format!("invalid gallery marker `{marker}`"))?;
        Ok(Self {
            page: page.into(),
            marker,
        })
    }
}

/// Scans the source root for declarers of a page.
#[derive(Debug, Clone)]
pub struct RelationScanner {
    root: SourceRoot,
    syntax: DeclarationSyntax,
    gallery: GalleryRule,
}

impl RelationScanner {
    pub fn new(root: SourceRoot, syntax: DeclarationSyntax, gallery: GalleryRule) -> Self {
        Self {
            root,
            syntax,
            gallery,
        }
    }

    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        let root = SourceRoot::new(config.source_dir());
        let syntax = DeclarationSyntax::new(root.name(), &config.build.template_extension);
        let gallery = GalleryRule::new(&config.watch.gallery, &config.watch.gallery_marker)?;
        Ok(Self::new(root, syntax, gallery))
    }

    pub fn root(&self) -> &SourceRoot {
        &self.root
    }

    pub fn syntax(&self) -> &DeclarationSyntax {
        &self.syntax
    }

    pub fn is_gallery(&self, page: &Path) -> bool {
        self.syntax.same_page(page, &self.gallery.page)
    }

    /// Root-relative paths of every template declaring a dependency on `target`,
    /// in directory-walk order (sorted by file name).
    ///
    /// Unreadable files are logged and skipped.
    pub fn find_declarers(&self, target: &Path) -> Vec<PathBuf> {
        let pattern = match self.syntax.pattern(target) {
            Ok(pattern) => pattern,
            Err(e) => {
                log!("deps"; "cannot build a pattern for {}: {e}", target.display());
                return Vec::new();
            }
        };
        let gallery = self.is_gallery(target);

        let mut declarers = Vec::new();
        for entry in WalkDir::new(self.root.dir()).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log!("deps"; "while looking for dependents of {}: {e}", target.display());
                    continue;
                }
            };
            if entry.file_type().is_dir() || !self.syntax.is_template(entry.path()) {
                continue;
            }
            let Ok(page) = self.root.relative(entry.path()) else {
                continue;
            };
            if self.syntax.same_page(&page, target) {
                continue;
            }

            let content = match fs::read(entry.path()) {
                Ok(content) => content,
                Err(e) => {
                    log!("deps"; "not checking {} for dependence on {}: {e}",
                         page.display(), target.display());
                    continue;
                }
            };

            if pattern.is_match(&content) || (gallery && self.gallery.marker.is_match(&content)) {
                declarers.push(page);
            }
        }
        declarers
    }
}
