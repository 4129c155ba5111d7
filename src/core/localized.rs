//! Values that are either a single string or a per-language mapping.
//!
//! Mallard and DocBook titles may appear several times with different
//! `xml:lang` attributes. Untagged occurrences belong to the default language
//! [`DEFAULT_LANGUAGE`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Language key of untranslated values.
pub const DEFAULT_LANGUAGE: &str = "C";

/// A value with an optional set of translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Localized<T> {
    /// Only the default value is known
    Single(T),
    /// Values keyed by language; the default lives under [`DEFAULT_LANGUAGE`]
    ByLanguage(BTreeMap<String, T>),
}

impl<T> Localized<T> {
    /// Builds from `(language, value)` pairs, where `None` is the default
    /// language. The first value seen for a language wins. Returns `None` when
    /// there are no entries.
    pub fn from_entries<I>(entries: I) -> Option<Self>
    where
        I: IntoIterator<Item = (Option<String>, T)>,
    {
        let mut map = BTreeMap::new();
        for (lang, value) in entries {
            let key = lang.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
            map.entry(key).or_insert(value);
        }

        if map.len() == 1 && map.contains_key(DEFAULT_LANGUAGE) {
            return map.remove(DEFAULT_LANGUAGE).map(Localized::Single);
        }
        if map.is_empty() { None } else { Some(Localized::ByLanguage(map)) }
    }

    /// The untranslated value, if one was given.
    pub fn default_value(&self) -> Option<&T> {
        match self {
            Self::Single(value) => Some(value),
            Self::ByLanguage(map) => map.get(DEFAULT_LANGUAGE),
        }
    }

    /// The value for `lang`, falling back to the default value.
    pub fn get(&self, lang: &str) -> Option<&T> {
        match self {
            Self::Single(value) => Some(value),
            Self::ByLanguage(map) => map.get(lang).or_else(|| map.get(DEFAULT_LANGUAGE)),
        }
    }

    /// Languages with an explicit value, the default included.
    pub fn languages(&self) -> Vec<&str> {
        match self {
            Self::Single(_) => vec![DEFAULT_LANGUAGE],
            Self::ByLanguage(map) => map.keys().map(String::as_str).collect(),
        }
    }
}
