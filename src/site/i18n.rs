//! Compiled translation catalogs (GNU `.mo` files).
//!
//! # MO layout
//!
//! ```text
//! 0   magic        0x950412de (byte order marker)
//! 4   revision
//! 8   N            number of strings
//! 12  O            offset of the original-strings table
//! 16  T            offset of the translated-strings table
//! O   N × (length, offset)
//! T   N × (length, offset)
//! ```

use super::{BuildContext, TranslationStore};
use crate::{log, utils::command};
use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

const MAGIC: u32 = 0x9504_12de;
const HEADER_LEN: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("not a compiled catalog (magic {0:#010x})")]
    BadMagic(u32),

    #[error("catalog truncated at byte {0}")]
    Truncated(usize),
}

/// msgid → msgstr for one locale.
pub type Messages = BTreeMap<String, String>;

/// Translations of every locale found under the i18n directory.
///
/// Command builders only see the locale names; message lookups are for
/// builders running in process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    locales: BTreeMap<String, Messages>,
}

impl Catalog {
    pub fn insert(&mut self, locale: impl Into<String>, messages: Messages) {
        self.locales.entry(locale.into()).or_default().extend(messages);
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.locales.keys().map(String::as_str)
    }

    #[allow(unused)]
    pub fn translate(&self, locale: &str, msgid: &str) -> Option<&str> {
        self.locales.get(locale)?.get(msgid).map(String::as_str)
    }

    /// Total number of translated messages.
    pub fn len(&self) -> usize {
        self.locales.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a compiled catalog. The header entry (empty msgid) is dropped.
pub fn parse_mo(bytes: &[u8]) -> Result<Messages, CatalogError> {
    let reader = MoReader::new(bytes)?;
    let count = reader.u32(8)? as usize;
    let originals = reader.u32(12)? as usize;
    let translations = reader.u32(16)? as usize;

    let mut messages = Messages::new();
    for i in 0..count {
        let msgid = reader.string(originals + i * 8)?;
        if msgid.is_empty() {
            continue;
        }
        let msgstr = reader.string(translations + i * 8)?;
        messages.insert(msgid, msgstr);
    }
    Ok(messages)
}

struct MoReader<'a> {
    bytes: &'a [u8],
    little_endian: bool,
}

impl<'a> MoReader<'a> {
    fn new(bytes: &'a [u8]) -> Result<Self, CatalogError> {
        if bytes.len() < HEADER_LEN {
            return Err(CatalogError::Truncated(bytes.len()));
        }
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        let little_endian = match (u32::from_le_bytes(raw), u32::from_be_bytes(raw)) {
            (MAGIC, _) => true,
            (_, MAGIC) => false,
            (magic, _) => return Err(CatalogError::BadMagic(magic)),
        };
        Ok(Self {
            bytes,
            little_endian,
        })
    }

    fn u32(&self, at: usize) -> Result<u32, CatalogError> {
        let raw: [u8; 4] = at
            .checked_add(4)
            .and_then(|end| self.bytes.get(at..end))
            .and_then(|s| s.try_into().ok())
            .ok_or(CatalogError::Truncated(at))?;
        Ok(if self.little_endian {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        })
    }

    /// Read the string described by the (length, offset) pair at `entry`.
    fn string(&self, entry: usize) -> Result<String, CatalogError> {
        let len = self.u32(entry)? as usize;
        let offset = self.u32(entry + 4)? as usize;
        let raw = offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(CatalogError::Truncated(offset))?;
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

/// Locale named by a catalog path: `fr.mo` → `fr`,
/// `fr/LC_MESSAGES/site.mo` → `fr`.
fn locale_of(path: &Path) -> Option<String> {
    let parent = path.parent();
    let dir_name = parent.and_then(Path::file_name);
    let name = if dir_name.is_some_and(|d| d == "LC_MESSAGES") {
        parent.and_then(Path::parent).and_then(Path::file_name)
    } else {
        path.file_stem()
    };
    name.map(|n| n.to_string_lossy().into_owned())
}

/// Loads every compiled catalog under the i18n directory.
#[derive(Debug, Clone)]
pub struct CompiledCatalogs {
    dir: PathBuf,
    extension: String,
    /// Project root, working directory of the save command
    root: PathBuf,
    save_command: Vec<String>,
}

impl CompiledCatalogs {
    pub fn new(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
            root: PathBuf::from("."),
            save_command: Vec::new(),
        }
    }

    /// Run `command` (with `{catalog}` filled in) to save the catalog.
    pub fn with_save_command(mut self, root: impl Into<PathBuf>, command: Vec<String>) -> Self {
        self.root = root.into();
        self.save_command = command;
        self
    }
}

impl TranslationStore for CompiledCatalogs {
    fn load(&self) -> Result<Catalog> {
        let mut catalog = Catalog::default();
        for entry in WalkDir::new(&self.dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("while reading {}", self.dir.display()))?;
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().is_none_or(|ext| ext != self.extension.as_str())
            {
                continue;
            }

            let bytes = fs::read(path).with_context(|| format!("could not read {}", path.display()))?;
            let messages = parse_mo(&bytes).with_context(|| format!("in {}", path.display()))?;
            let locale = locale_of(path)
                .with_context(|| format!("no locale in {}", path.display()))?;
            catalog.insert(locale, messages);
        }
        Ok(catalog)
    }

    fn save_catalog(&self, ctx: &BuildContext, path: &Path) -> Result<()> {
        if self.save_command.is_empty() {
            return Ok(());
        }
        let catalog = path.to_string_lossy();
        let database = ctx.database.path_str();
        let argv = command::expand(
            &self.save_command,
            &[("catalog", catalog.as_ref()), ("database", database.as_str())],
        );
        command::exec(Some(&self.root), &argv)
            .with_context(|| format!("could not save catalog {}", path.display()))?;
        log!("i18n"; "saved {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode `(msgid, msgstr)` pairs as a little- or big-endian MO file.
    pub(crate) fn mo_bytes(pairs: &[(&str, &str)], little_endian: bool) -> Vec<u8> {
        let word = |n: usize| {
            let n = n as u32;
            if little_endian { n.to_le_bytes() } else { n.to_be_bytes() }
        };
        let n = pairs.len();
        let originals = HEADER_LEN;
        let translations = originals + n * 8;
        let mut data_offset = translations + n * 8;

        let mut tables = Vec::new();
        let mut data = Vec::new();
        for column in [0, 1] {
            for (msgid, msgstr) in pairs {
                let s = if column == 0 { msgid } else { msgstr };
                tables.extend(word(s.len()));
                tables.extend(word(data_offset));
                data.extend(s.as_bytes());
                data.push(0);
                data_offset += s.len() + 1;
            }
        }

        let mut out = Vec::new();
        out.extend(word(MAGIC as usize));
        out.extend(word(0));
        out.extend(word(n));
        out.extend(word(originals));
        out.extend(word(translations));
        out.extend(tables);
        out.extend(data);
        out
    }

    #[test]
    fn test_parse_little_endian() {
        let bytes = mo_bytes(&[("", "Language: fr\n"), ("Hello", "Bonjour"), ("Works", "Travaux")], true);
        let messages = parse_mo(&bytes).unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages["Hello"], "Bonjour");
        assert_eq!(messages["Works"], "Travaux");
    }

    #[test]
    fn test_parse_big_endian() {
        let bytes = mo_bytes(&[("Tag", "Étiquette")], false);
        assert_eq!(parse_mo(&bytes).unwrap()["Tag"], "Étiquette");
    }

    #[test]
    fn test_parse_rejects_bad_magic() {
        let mut bytes = mo_bytes(&[("a", "b")], true);
        bytes[0] = 0;
        assert!(matches!(parse_mo(&bytes), Err(CatalogError::BadMagic(_))));
        assert_eq!(parse_mo(b"msgid"), Err(CatalogError::Truncated(5)));
    }

    #[test]
    fn test_parse_rejects_out_of_bounds_strings() {
        let bytes = mo_bytes(&[("Hello", "Bonjour")], true);
        let cut = &bytes[..bytes.len() - 4];
        assert!(matches!(parse_mo(cut), Err(CatalogError::Truncated(_))));
    }

    #[test]
    fn test_locale_of() {
        assert_eq!(locale_of(Path::new("i18n/fr.mo")).as_deref(), Some("fr"));
        assert_eq!(
            locale_of(Path::new("i18n/de/LC_MESSAGES/site.mo")).as_deref(),
            Some("de")
        );
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fr.mo"), mo_bytes(&[("Hello", "Bonjour")], true)).unwrap();
        fs::write(dir.path().join("fr.po"), "msgid \"Hello\"\nmsgstr \"Bonjour\"\n").unwrap();

        let catalog = CompiledCatalogs::new(dir.path(), "mo").load().unwrap();

        assert_eq!(catalog.locales().collect::<Vec<_>>(), ["fr"]);
        assert_eq!(catalog.translate("fr", "Hello"), Some("Bonjour"));
        assert_eq!(catalog.translate("de", "Hello"), None);
    }

    #[test]
    fn test_load_fails_on_corrupt_catalog() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fr.mo"), b"not a catalog at all").unwrap();

        assert!(CompiledCatalogs::new(dir.path(), "mo").load().is_err());
    }
}
