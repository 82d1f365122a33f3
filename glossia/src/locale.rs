//! Locale identity, bootstrap metadata, and language negotiation
//!
//! A [`Locale`] names one fetchable variant of the localization resources:
//! a language code plus the source it is served from. `App` resources ship
//! with the application, `Extra` resources are provided at runtime (for
//! example by a language pack), and `Pseudo` locales are derived from the
//! `en-US` app resources by a string transform.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pseudo;

/// Where a locale's resources are served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleSource {
    /// Shipped with the application
    #[default]
    App,
    /// Provided at runtime (language pack)
    Extra,
    /// Synthesized from `en-US` app resources
    Pseudo,
}

impl LocaleSource {
    /// Stable name used in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Extra => "extra",
            Self::Pseudo => "pseudo",
        }
    }
}

/// One element of a locale fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    /// Language code (e.g. `"en-US"`, `"fr"`, `"fr-x-psaccent"`)
    pub code: String,
    /// Resource source this locale is fetched from
    #[serde(default)]
    pub source: LocaleSource,
    /// Resource version, where the source distinguishes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Locale {
    /// An app-sourced locale with no version.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            source: LocaleSource::App,
            version: None,
        }
    }

    /// A locale with an explicit source.
    pub fn with_source(code: impl Into<String>, source: LocaleSource) -> Self {
        Self {
            code: code.into(),
            source,
            version: None,
        }
    }

    /// The language subtag before the first `-`.
    pub fn language(&self) -> &str {
        match self.code.find('-') {
            Some(pos) => &self.code[..pos],
            None => &self.code,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Bootstrap metadata describing which languages an application ships.
///
/// Typically deserialized from the host document or an app manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    /// Language used when no requested language is available
    pub default_lang: String,
    /// Shipped languages mapped to their optional resource version
    #[serde(default)]
    pub available_langs: HashMap<String, Option<String>>,
    /// Application version, stamped onto app-sourced locales
    #[serde(default)]
    pub app_version: Option<String>,
}

/// Build a locale fallback chain from requested language codes.
///
/// Requested codes are kept in preference order when they are available
/// from the app, from `additional_langs` (runtime language packs), or as a
/// known pseudo locale; the default language is appended when not already
/// present. Each chain element is tagged with the source it will be fetched
/// from.
///
/// # Example
///
/// ```
/// use glossia::locale::{Meta, negotiate_languages};
///
/// let meta = Meta {
///     default_lang: "en-US".to_string(),
///     available_langs: [("en-US".to_string(), None), ("fr".to_string(), None)]
///         .into_iter()
///         .collect(),
///     app_version: None,
/// };
/// let chain = negotiate_languages(&meta, &Default::default(), &["fr".to_string()]);
/// assert_eq!(chain.len(), 2);
/// assert_eq!(chain[0].code, "fr");
/// assert_eq!(chain[1].code, "en-US");
/// ```
pub fn negotiate_languages(
    meta: &Meta,
    additional_langs: &HashMap<String, Option<String>>,
    requested: &[String],
) -> Vec<Locale> {
    let mut codes: Vec<&str> = Vec::new();

    for code in requested {
        let code = code.as_str();
        if codes.contains(&code) {
            continue;
        }
        let known = meta.available_langs.contains_key(code)
            || additional_langs.contains_key(code)
            || pseudo::is_pseudo(code);
        if known {
            codes.push(code);
        }
    }

    if !codes.contains(&meta.default_lang.as_str()) {
        codes.push(meta.default_lang.as_str());
    }

    codes
        .into_iter()
        .map(|code| {
            let source = if additional_langs.contains_key(code) {
                LocaleSource::Extra
            } else if pseudo::is_pseudo(code) && !meta.available_langs.contains_key(code) {
                LocaleSource::Pseudo
            } else {
                LocaleSource::App
            };
            let version = match source {
                LocaleSource::Extra => additional_langs.get(code).cloned().flatten(),
                _ => meta.app_version.clone(),
            };
            Locale {
                code: code.to_string(),
                source,
                version,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> Meta {
        Meta {
            default_lang: "en-US".to_string(),
            available_langs: [
                ("en-US".to_string(), None),
                ("fr".to_string(), None),
                ("pl".to_string(), None),
            ]
            .into_iter()
            .collect(),
            app_version: Some("2.5".to_string()),
        }
    }

    #[test]
    fn test_language_subtag() {
        assert_eq!(Locale::new("en-US").language(), "en");
        assert_eq!(Locale::new("fr").language(), "fr");
        assert_eq!(Locale::new("fr-x-psaccent").language(), "fr");
    }

    #[test]
    fn test_negotiation_prefers_requested_order() {
        let chain = negotiate_languages(
            &meta(),
            &HashMap::new(),
            &["de".to_string(), "pl".to_string(), "fr".to_string()],
        );
        let codes: Vec<&str> = chain.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, ["pl", "fr", "en-US"]);
        assert!(chain.iter().all(|l| l.source == LocaleSource::App));
        assert_eq!(chain[0].version.as_deref(), Some("2.5"));
    }

    #[test]
    fn test_negotiation_default_not_duplicated() {
        let chain = negotiate_languages(&meta(), &HashMap::new(), &["en-US".to_string()]);
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].code, "en-US");
    }

    #[test]
    fn test_negotiation_tags_extra_source() {
        let additional: HashMap<String, Option<String>> =
            [("de".to_string(), Some("1.0".to_string()))].into_iter().collect();
        let chain = negotiate_languages(&meta(), &additional, &["de".to_string()]);
        assert_eq!(chain[0].source, LocaleSource::Extra);
        assert_eq!(chain[0].version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_negotiation_tags_pseudo_source() {
        let chain = negotiate_languages(
            &meta(),
            &HashMap::new(),
            &["fr-x-psaccent".to_string()],
        );
        assert_eq!(chain[0].code, "fr-x-psaccent");
        assert_eq!(chain[0].source, LocaleSource::Pseudo);
        assert_eq!(chain[1].code, "en-US");
    }

    #[test]
    fn test_meta_from_json() {
        let json = r#"{
            "default_lang": "en-US",
            "available_langs": { "en-US": null, "fr": "2.0" },
            "app_version": "2.5"
        }"#;
        let meta: Meta = serde_json::from_str(json).unwrap();
        assert_eq!(meta.default_lang, "en-US");
        assert_eq!(
            meta.available_langs.get("fr"),
            Some(&Some("2.0".to_string()))
        );
    }

    #[test]
    fn test_locale_source_serde() {
        let locale = Locale::with_source("de", LocaleSource::Extra);
        let json = serde_json::to_string(&locale).unwrap();
        assert!(json.contains("\"extra\""));
        let back: Locale = serde_json::from_str(&json).unwrap();
        assert_eq!(back, locale);
    }
}
