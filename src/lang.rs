//! The fixed table of languages the engine can translate between.
//!
//! Mirrors the language map a translator adapter's wire contract is built
//! around: a human-readable name on one side, the ISO-639-1 short code the
//! provider APIs expect on the other.

use serde::{Deserialize, Serialize};

/// A language identified by its human name, paired with its resolved
/// ISO-639-1 code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangTag {
    pub name: String,
    pub code: String,
}

impl LangTag {
    /// Look up a language by its human name (case-insensitive). Returns
    /// `None` if the name isn't in the fixed table.
    pub fn by_name(name: &str) -> Option<Self> {
        LANGUAGES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(n, c)| LangTag {
                name: (*n).to_string(),
                code: (*c).to_string(),
            })
    }
}

impl std::fmt::Display for LangTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// The fixed (name, ISO-639-1 code) table. Order is not significant.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("English", "en"),
    ("Urdu", "ur"),
    ("Hindi", "hi"),
    ("Spanish", "es"),
    ("Japanese", "ja"),
    ("French", "fr"),
    ("German", "de"),
    ("Chinese", "zh"),
    ("Arabic", "ar"),
    ("Russian", "ru"),
    ("Portuguese", "pt"),
    ("Italian", "it"),
    ("Korean", "ko"),
    ("Turkish", "tr"),
    ("Dutch", "nl"),
];
