//! Repoints declarations at a renamed page.

use super::syntax::DeclarationSyntax;
use anyhow::{Context, Result};
use regex::bytes::Captures;
use std::{fs, path::Path};

/// Rewrite every declaration in `file` that targets `from` so it targets `to`.
///
/// `from` and `to` are root-relative pages. The rewritten line keeps the
/// keyword, spacing, root prefix, extension and trailing whitespace of the
/// original; every other byte of the file is left untouched. The file is
/// written back only when something changed.
///
/// Returns whether the file was rewritten.
pub fn rewrite_declaration(
    file: &Path,
    from: &Path,
    to: &Path,
    syntax: &DeclarationSyntax,
) -> Result<bool> {
    let describe = || {
        format!(
            "while updating the declaration in {} from {} to {}",
            file.display(),
            from.display(),
            to.display()
        )
    };

    let pattern = syntax.pattern(from).with_context(describe)?;
    let content = fs::read(file)
        .with_context(|| format!("could not read {}", file.display()))
        .with_context(describe)?;

    if !pattern.is_match(&content) {
        return Ok(false);
    }

    let target = syntax.stem(to);
    let rewritten = pattern.replace_all(&content, |caps: &Captures| {
        let group = |name| caps.name(name).map_or(&b""[..], |m| m.as_bytes());
        [
            group("keyword"),
            group("sep"),
            group("prefix"),
            target.as_bytes(),
            group("ext"),
            group("trail"),
        ]
        .concat()
    });

    fs::write(file, &rewritten)
        .with_context(|| format!("could not write to {}", file.display()))
        .with_context(describe)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn syntax() -> DeclarationSyntax {
        DeclarationSyntax::new("src", "pug")
    }

    fn page_with(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("index.pug");
        fs::write(&file, content).unwrap();
        (dir, file)
    }

    #[test]
    fn test_rewrites_only_the_declaration_line() {
        let original = "//- home\nextends old-page\nblock content\n  p extends old-page\n";
        let (_dir, file) = page_with(original);

        let changed =
            rewrite_declaration(&file, Path::new("old-page"), Path::new("new-page"), &syntax())
                .unwrap();

        assert!(changed);
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "//- home\nextends new-page\nblock content\n  p extends old-page\n"
        );
    }

    #[test]
    fn test_keeps_prefix_and_extension_style() {
        let (_dir, file) = page_with("extends src/old-page.pug\r\ninclude old-page\n");

        rewrite_declaration(&file, Path::new("old-page.pug"), Path::new("blog/new.pug"), &syntax())
            .unwrap();

        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "extends src/blog/new.pug\r\ninclude blog/new\n"
        );
    }

    #[test]
    fn test_untouched_when_nothing_matches() {
        let (_dir, file) = page_with("extends layout\n");

        let changed =
            rewrite_declaration(&file, Path::new("old.pug"), Path::new("new.pug"), &syntax())
                .unwrap();

        assert!(!changed);
        assert_eq!(fs::read_to_string(&file).unwrap(), "extends layout\n");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = rewrite_declaration(
            &dir.path().join("gone.pug"),
            Path::new("old.pug"),
            Path::new("new.pug"),
            &syntax(),
        )
        .unwrap_err();

        assert!(format!("{err:#}").contains("could not read"));
    }
}
