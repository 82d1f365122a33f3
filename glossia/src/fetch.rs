//! Resource fetch contract
//!
//! The engine does no I/O itself. Hosts implement [`ResourceFetcher`] over
//! whatever transport serves their resources (HTTP, packaged storage, an
//! in-memory table in tests) and hand it to the environment.

use async_trait::async_trait;

use crate::error::L10nError;
use crate::locale::Locale;

/// The source syntax of a resource, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Flat, properties-like syntax (`.properties`)
    Properties,
    /// Bracketed entity syntax (everything else)
    L20n,
}

impl Syntax {
    /// Pick the parser for a resource id.
    pub fn for_resource(res_id: &str) -> Self {
        if res_id.ends_with(".properties") {
            Self::Properties
        } else {
            Self::L20n
        }
    }
}

/// Substitute the `{locale}` token in a resource id template.
pub fn resolve_path(res_id: &str, locale: &Locale) -> String {
    res_id.replace("{locale}", &locale.code)
}

/// Fetches raw resource text for one locale.
///
/// Failures must resolve to typed [`L10nError::Fetch`] values; the
/// environment caches them as terminal for that resource and locale.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetch the resource at `path` (already locale-substituted).
    async fn fetch(&self, path: &str, locale: &Locale) -> Result<String, L10nError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_from_extension() {
        assert_eq!(
            Syntax::for_resource("locales/app.{locale}.properties"),
            Syntax::Properties
        );
        assert_eq!(Syntax::for_resource("locales/app.{locale}.l20n"), Syntax::L20n);
        assert_eq!(Syntax::for_resource("locales/app"), Syntax::L20n);
    }

    #[test]
    fn test_resolve_path() {
        let locale = Locale::new("fr");
        assert_eq!(
            resolve_path("locales/app.{locale}.l20n", &locale),
            "locales/app.fr.l20n"
        );
    }
}
