//! `[build]` section configuration.
//!
//! Directory layout of the site and the commands used to render pages.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in pagewatch.toml - site layout and builder commands.
///
/// # Example
/// ```toml
/// [build]
/// source = "src"
/// i18n = "i18n"
/// catalog = "i18n/fr.po"
/// database = "database.json"
///
/// [build.commands]
/// regular = ["ortfomk", "build", "{page}"]
/// all = ["ortfomk", "build"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root. Every other path in this section is relative to it.
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Source root holding the templates. Page identities are relative to it.
    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    /// Directory holding compiled translations (`.mo`).
    #[serde(default = "defaults::build::i18n")]
    #[educe(Default = defaults::build::i18n())]
    pub i18n: PathBuf,

    /// Catalog of the tracked locale, saved after each page rebuild.
    #[serde(default = "defaults::build::catalog")]
    #[educe(Default = defaults::build::catalog())]
    pub catalog: PathBuf,

    /// Optional JSON database handed to every builder call.
    #[serde(default = "defaults::build::database")]
    #[educe(Default = defaults::build::database())]
    pub database: Option<PathBuf>,

    #[serde(default = "defaults::build::template_extension")]
    #[educe(Default = defaults::build::template_extension())]
    pub template_extension: String,

    #[serde(default = "defaults::build::translation_extension")]
    #[educe(Default = defaults::build::translation_extension())]
    pub translation_extension: String,

    #[serde(default)]
    pub commands: CommandsConfig,
}

/// `[build.commands]` - argv templates for each builder operation.
///
/// Placeholders: `{page}` (page path under the project root), `{root}`
/// (source root), `{database}` (database path), `{catalog}` (catalog path).
/// An empty list means "not configured".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandsConfig {
    #[serde(default)]
    pub regular: Vec<String>,

    #[serde(default)]
    pub work: Vec<String>,

    #[serde(default)]
    pub tag: Vec<String>,

    #[serde(default)]
    pub technology: Vec<String>,

    #[serde(default)]
    pub all: Vec<String>,

    #[serde(default)]
    pub save_catalog: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.root, None);
        assert_eq!(config.build.source, PathBuf::from("src"));
        assert_eq!(config.build.i18n, PathBuf::from("i18n"));
        assert_eq!(config.build.catalog, PathBuf::from("i18n/fr.po"));
        assert_eq!(config.build.database, None);
        assert_eq!(config.build.template_extension, "pug");
        assert_eq!(config.build.translation_extension, "mo");
        assert!(config.build.commands.regular.is_empty());
    }

    #[test]
    fn test_build_config_full() {
        let config = r#"
            [build]
            source = "pages"
            catalog = "i18n/de.po"
            database = "works.json"

            [build.commands]
            regular = ["site", "page", "{page}"]
            work = ["site", "works", "{page}", "--db", "{database}"]
            all = ["site", "all"]
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.build.source, PathBuf::from("pages"));
        assert_eq!(config.build.catalog, PathBuf::from("i18n/de.po"));
        assert_eq!(config.build.database, Some(PathBuf::from("works.json")));
        assert_eq!(config.build.commands.regular, ["site", "page", "{page}"]);
        assert_eq!(config.build.commands.work.len(), 5);
        assert!(config.build.commands.tag.is_empty());
    }

    #[test]
    fn test_unknown_command_rejection() {
        let config = r#"
            [build.commands]
            render = ["site"]
        "#;
        let result: Result<SiteConfig, _> = toml::from_str(config);
        assert!(result.is_err());
    }
}
