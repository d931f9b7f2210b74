//! How a dependency declaration is spelled.
//!
//! A page declares a dependency with a line of its own:
//!
//! ```pug
//! extends layout
//! include src/partials/footer.pug
//! ```
//!
//! The target may carry the source root prefix (`src/` or a leading `/`)
//! and the template extension; both are optional. Matching is anchored to
//! whole lines and case-sensitive, over raw bytes.

use regex::bytes::Regex;
use std::path::{Component, Path};

/// Builds declaration patterns for one source root and template extension.
#[derive(Debug, Clone)]
pub struct DeclarationSyntax {
    root_prefix: String,
    extension: String,
}

impl DeclarationSyntax {
    pub fn new(root_prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            root_prefix: root_prefix.into(),
            extension: extension.into(),
        }
    }

    /// Whether a path has the template extension.
    pub fn is_template(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == self.extension.as_str())
    }

    /// Root-relative page path with `/` separators and no template extension,
    /// as it appears after `extends`.
    pub fn stem(&self, page: &Path) -> String {
        let page = if self.is_template(page) {
            page.with_extension("")
        } else {
            page.to_path_buf()
        };
        page.components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Whether two page paths name the same page, ignoring the extension.
    pub fn same_page(&self, a: &Path, b: &Path) -> bool {
        self.stem(a) == self.stem(b)
    }

    /// Pattern matching any declaration line that targets `page`.
    ///
    /// Capture groups: `keyword`, `sep`, `prefix`, `ext`, `trail`.
    pub fn pattern(&self, page: &Path) -> Result<Regex, regex::Error> {
        let prefix = if self.root_prefix.is_empty() {
            "/".to_owned()
        } else {
            format!("{}/|/", regex::escape(&self.root_prefix))
        };
        Regex::new(&format!(
            r"(?m)^(?P<keyword>extends|include)(?P<sep>[ \t]+)(?P<prefix>(?:{prefix})?){stem}(?P<ext>(?:\.{ext})?)(?P<trail>[ \t\r]*)$",
            stem = regex::escape(&self.stem(page)),
            ext = regex::escape(&self.extension),
        ))
    }
}
