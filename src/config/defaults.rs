//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn source() -> PathBuf {
        "src".into()
    }

    pub fn i18n() -> PathBuf {
        "i18n".into()
    }

    pub fn catalog() -> PathBuf {
        "i18n/fr.po".into()
    }

    pub fn database() -> Option<PathBuf> {
        None
    }

    pub fn template_extension() -> String {
        "pug".into()
    }

    pub fn translation_extension() -> String {
        "mo".into()
    }
}

// ============================================================================
// [watch] Section Defaults
// ============================================================================

pub mod watch {
    use std::path::PathBuf;

    /// Poll interval in milliseconds
    pub fn interval() -> u64 {
        100
    }

    pub fn max_depth() -> usize {
        10
    }

    pub fn gallery() -> PathBuf {
        "gallery.pug".into()
    }

    pub fn gallery_marker() -> String {
        "intoGallery".into()
    }
}
