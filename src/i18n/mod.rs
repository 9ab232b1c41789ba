//! Language selection and key lookup for user-facing text.
//!
//! Two languages are bundled. A directory of `<code>.json` files can override
//! the bundled strings; when the requested language cannot be loaded the
//! English file is tried once, then the bundled table is used.

mod translations;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Chinese,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::English, Language::Chinese];

    pub fn code(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Chinese => "zh",
        }
    }

    /// Key of the language's own display name.
    pub fn name_key(self) -> &'static str {
        match self {
            Self::English => "language.en",
            Self::Chinese => "language.zh",
        }
    }

    /// Strict code lookup; `None` for anything that is not a supported code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Self::English),
            "zh" => Some(Self::Chinese),
            _ => None,
        }
    }

    /// Map a host locale (`zh_CN.UTF-8`, `en-US`, ...) by its prefix.
    pub fn from_locale(locale: &str) -> Self {
        if locale.trim().to_ascii_lowercase().starts_with("zh") {
            Self::Chinese
        } else {
            Self::English
        }
    }

    /// Detect the language from `LC_ALL`, `LC_MESSAGES` and `LANG`, in that order.
    pub fn detect() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|name| std::env::var(name).ok())
            .find(|value| !value.trim().is_empty())
            .map(|value| Self::from_locale(&value))
            .unwrap_or_default()
    }

    fn bundled_table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::English => translations::EN,
            Self::Chinese => translations::ZH,
        }
    }
}

pub type TranslationMap = HashMap<String, String>;

/// Resolve `key` in `table`, returning the key itself when it is absent.
pub fn translate<'a>(table: &'a TranslationMap, key: &'a str) -> &'a str {
    table.get(key).map(String::as_str).unwrap_or(key)
}

fn bundled_map(language: Language) -> TranslationMap {
    language
        .bundled_table()
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

fn read_locale_file(dir: &Path, language: Language) -> Option<TranslationMap> {
    let path = dir.join(format!("{}.json", language.code()));
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::debug!(?err, path = %path.display(), "locale file unavailable");
            return None;
        }
    };
    match serde_json::from_str::<TranslationMap>(&contents) {
        Ok(map) => Some(map),
        Err(err) => {
            tracing::warn!(?err, path = %path.display(), "failed to parse locale file");
            None
        }
    }
}

/// Load the table for `language`, consulting `locales_dir` first.
pub fn load_translations(locales_dir: Option<&Path>, language: Language) -> TranslationMap {
    let Some(dir) = locales_dir else {
        return bundled_map(language);
    };
    if let Some(map) = read_locale_file(dir, language) {
        return map;
    }
    if language != Language::English {
        tracing::warn!(
            language = language.code(),
            "falling back to English locale file"
        );
        if let Some(map) = read_locale_file(dir, Language::English) {
            return map;
        }
    }
    bundled_map(language)
}

/// Active language plus its loaded table.
#[derive(Debug, Clone)]
pub struct Localizer {
    language: Language,
    locales_dir: Option<PathBuf>,
    table: TranslationMap,
}

impl Localizer {
    pub fn new(language: Language) -> Self {
        Self::with_locales_dir(language, None)
    }

    pub fn with_locales_dir(language: Language, locales_dir: Option<PathBuf>) -> Self {
        let table = load_translations(locales_dir.as_deref(), language);
        Self {
            language,
            locales_dir,
            table,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Switch language; reloading only happens when the language actually changes.
    pub fn set_language(&mut self, language: Language) {
        if self.language == language {
            return;
        }
        tracing::info!(language = language.code(), "switching display language");
        self.language = language;
        self.table = load_translations(self.locales_dir.as_deref(), language);
    }

    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        translate(&self.table, key)
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new(Language::default())
    }
}
