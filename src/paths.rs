//! Source-root path resolution.
//!
//! Pages are identified by their path relative to the source root
//! (`src/work/:work.pug` → `work/:work.pug`). Watcher events and directory
//! walks hand us absolute paths, so everything goes through [`SourceRoot`].

use std::{
    ffi::OsString,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("`{path}` is not inside the source root `{root}`")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// The directory all page identities are relative to.
#[derive(Debug, Clone)]
pub struct SourceRoot {
    dir: PathBuf,
    /// Canonical form of `dir`, when it exists on disk
    canonical: Option<PathBuf>,
    /// Last component of `dir`, used as the root marker
    marker: Option<OsString>,
}

impl SourceRoot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let canonical = dir.canonicalize().ok().filter(|c| *c != dir);
        let marker = dir.file_name().map(OsString::from);
        Self {
            dir,
            canonical,
            marker,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Name of the root directory (`src`), as written in root-prefixed declarations.
    pub fn name(&self) -> &str {
        self.marker
            .as_deref()
            .and_then(|m| m.to_str())
            .unwrap_or_default()
    }

    /// Reduce a path under the root to its root-relative form.
    ///
    /// Tries a plain prefix strip first, then splits on the first path
    /// component equal to the root directory's name and keeps what follows:
    /// `/home/me/site/src/about.pug` → `about.pug`.
    pub fn relative(&self, path: &Path) -> Result<PathBuf, PathError> {
        let stripped = std::iter::once(&self.dir)
            .chain(self.canonical.as_ref())
            .find_map(|root| path.strip_prefix(root).ok());

        let relative = match stripped {
            Some(rest) => rest.to_path_buf(),
            None => self.split_on_marker(path).unwrap_or_default(),
        };

        if relative.as_os_str().is_empty() {
            return Err(self.outside(path));
        }
        Ok(relative)
    }

    /// Join a root-relative page back onto the root.
    pub fn absolute(&self, page: &Path) -> PathBuf {
        self.dir.join(page)
    }

    fn split_on_marker(&self, path: &Path) -> Option<PathBuf> {
        let marker = self.marker.as_deref()?;
        let mut components = path.components();
        components
            .by_ref()
            .find(|c| matches!(c, Component::Normal(name) if *name == marker))?;
        Some(components.as_path().to_path_buf())
    }

    fn outside(&self, path: &Path) -> PathError {
        PathError::OutsideRoot {
            path: path.to_path_buf(),
            root: self.dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_strips_root_prefix() {
        let root = SourceRoot::new("/site/src");
        assert_eq!(
            root.relative(Path::new("/site/src/about.pug")).unwrap(),
            PathBuf::from("about.pug")
        );
        assert_eq!(
            root.relative(Path::new("/site/src/work/:work.pug")).unwrap(),
            PathBuf::from("work/:work.pug")
        );
    }

    #[test]
    fn test_relative_splits_on_marker() {
        // Same root reached through a different mount point
        let root = SourceRoot::new("/site/src");
        assert_eq!(
            root.relative(Path::new("/mnt/backup/src/layouts/base.pug")).unwrap(),
            PathBuf::from("layouts/base.pug")
        );
        assert_eq!(
            root.relative(Path::new("src/footer.pug")).unwrap(),
            PathBuf::from("footer.pug")
        );
    }

    #[test]
    fn test_relative_marker_must_be_whole_component() {
        let root = SourceRoot::new("/site/src");
        let err = root.relative(Path::new("/site/resources/about.pug")).unwrap_err();
        assert!(matches!(err, PathError::OutsideRoot { .. }));
    }

    #[test]
    fn test_relative_outside_root() {
        let root = SourceRoot::new("/site/src");
        assert!(root.relative(Path::new("/site/i18n/fr.mo")).is_err());
        // The root itself is not a page
        assert!(root.relative(Path::new("/site/src")).is_err());
    }

    #[test]
    fn test_relative_through_canonical_root() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        let canonical = src.canonicalize().unwrap();

        let root = SourceRoot::new(src.join("..").join("src"));
        assert_eq!(
            root.relative(&canonical.join("index.pug")).unwrap(),
            PathBuf::from("index.pug")
        );
    }

    #[test]
    fn test_absolute_and_name() {
        let root = SourceRoot::new("/site/src");
        assert_eq!(root.absolute(Path::new("about.pug")), PathBuf::from("/site/src/about.pug"));
        assert_eq!(root.name(), "src");
    }
}
