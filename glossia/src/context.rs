//! Per-view formatting context
//!
//! A [`Context`] owns an ordered locale fallback chain and an ordered
//! resource-id list. Formatting walks the chain: resources for the head
//! locale are fetched in parallel, resolved keys are kept, and unresolved
//! keys carry over to the next locale. When the chain is exhausted, each
//! remaining key degrades to its own id as the displayed value and one
//! batched diagnostic lists all missing ids.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::entry::Entry;
use crate::env::Env;
use crate::error::L10nError;
use crate::events::{ErrorEvent, EventKind};
use crate::locale::Locale;
use crate::parser::Entries;
use crate::resolver::{self, FormatArgs, Resolution, Scope};

/// A formatting request: entity id plus optional arguments.
#[derive(Debug, Clone)]
pub struct FormatKey {
    /// Entity id to format
    pub id: String,
    /// Placeable arguments, if any
    pub args: Option<FormatArgs>,
}

impl FormatKey {
    /// A key with no arguments.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            args: None,
        }
    }

    /// A key with arguments.
    pub fn with_args(id: impl Into<String>, args: FormatArgs) -> Self {
        Self {
            id: id.into(),
            args: Some(args),
        }
    }
}

impl From<&str> for FormatKey {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FormatKey {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<(&str, FormatArgs)> for FormatKey {
    fn from((id, args): (&str, FormatArgs)) -> Self {
        Self::with_args(id, args)
    }
}

impl From<(String, FormatArgs)> for FormatKey {
    fn from((id, args): (String, FormatArgs)) -> Self {
        Self::with_args(id, args)
    }
}

/// A formatted entity: the value plus its formatted attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedEntity {
    /// Formatted value
    pub value: String,
    /// Formatted attributes, when the entity has any
    pub attrs: Option<HashMap<String, String>>,
}

/// Per-view coordinator resolving formatting requests across a locale
/// fallback chain.
pub struct Context {
    env: Env,
    langs: Vec<Locale>,
    res_ids: Vec<String>,
}

impl Context {
    pub(crate) fn new(env: Env, langs: Vec<Locale>, res_ids: Vec<String>) -> Self {
        Self {
            env,
            langs,
            res_ids,
        }
    }

    /// The locale fallback chain, in priority order.
    pub fn langs(&self) -> &[Locale] {
        &self.langs
    }

    /// The resource ids this context reads, in lookup order.
    pub fn res_ids(&self) -> &[String] {
        &self.res_ids
    }

    /// Format entity values.
    ///
    /// The result preserves input key order and length; keys missing from
    /// every locale resolve to their own id.
    pub async fn format_values<I>(&self, keys: I) -> Vec<String>
    where
        I: IntoIterator,
        I::Item: Into<FormatKey>,
    {
        let keys: Vec<FormatKey> = keys.into_iter().map(Into::into).collect();
        self.resolve_keys(&keys, false)
            .await
            .into_iter()
            .map(|entity| entity.value)
            .collect()
    }

    /// Format entities with their attributes.
    ///
    /// The result preserves input key order and length; keys missing from
    /// every locale resolve to `{value: id, attrs: None}`.
    pub async fn format_entities<I>(&self, keys: I) -> Vec<FormattedEntity>
    where
        I: IntoIterator,
        I::Item: Into<FormatKey>,
    {
        let keys: Vec<FormatKey> = keys.into_iter().map(Into::into).collect();
        self.resolve_keys(&keys, true).await
    }

    async fn resolve_keys(&self, keys: &[FormatKey], with_attrs: bool) -> Vec<FormattedEntity> {
        let mut resolved: Vec<Option<FormattedEntity>> = vec![None; keys.len()];
        let mut langs: &[Locale] = &self.langs;

        loop {
            let Some(lang) = langs.first() else {
                self.report_missing(keys, &mut resolved);
                break;
            };

            self.fetch_for(lang).await;
            let resources = self.env.resource_snapshot(lang, &self.res_ids);

            let mut has_unresolved = false;
            for (i, key) in keys.iter().enumerate() {
                if resolved[i].is_some() {
                    continue;
                }
                match lookup(&resources, &key.id) {
                    Some(entry) => {
                        resolved[i] =
                            Some(self.format_entity(lang, key, entry, &resources, with_attrs));
                    }
                    None => {
                        debug!(id = %key.id, locale = %lang.code, "not found, falling back");
                        has_unresolved = true;
                    }
                }
            }

            if !has_unresolved {
                break;
            }
            langs = &langs[1..];
        }

        resolved
            .into_iter()
            .zip(keys)
            .map(|(entity, key)| {
                entity.unwrap_or_else(|| FormattedEntity {
                    value: key.id.clone(),
                    attrs: None,
                })
            })
            .collect()
    }

    /// Fetch every resource for one locale in parallel.
    ///
    /// Failures are cached by the environment and surface as missing
    /// entries, not hard errors.
    async fn fetch_for(&self, lang: &Locale) {
        let fetches = self
            .res_ids
            .iter()
            .map(|res_id| self.env.get_resource(lang, res_id));
        let _ = join_all(fetches).await;
    }

    fn format_entity(
        &self,
        lang: &Locale,
        key: &FormatKey,
        entry: &Entry,
        resources: &[Arc<Entries>],
        with_attrs: bool,
    ) -> FormattedEntity {
        let formatter = self.env.formatter(lang);
        let scope = Scope {
            lang,
            args: key.args.as_ref(),
            resources,
            formatter: formatter.as_ref(),
        };

        let value = self.format_tuple(&scope, entry, &key.id, None);

        let attrs = if with_attrs {
            match entry {
                Entry::Node(node) => node.attrs.as_ref().map(|attrs| {
                    attrs
                        .iter()
                        .map(|(attr_key, attr_entry)| {
                            let formatted =
                                self.format_tuple(&scope, attr_entry, &key.id, Some(attr_key));
                            (attr_key.clone(), formatted)
                        })
                        .collect()
                }),
                Entry::Simple(_) => None,
            }
        } else {
            None
        };

        FormattedEntity { value, attrs }
    }

    /// Format one entry, reporting errors tagged with the owning entity.
    ///
    /// Hard failures degrade to the entity label as the displayed value.
    fn format_tuple(
        &self,
        scope: &Scope<'_>,
        entry: &Entry,
        id: &str,
        attr: Option<&str>,
    ) -> String {
        let label = match attr {
            Some(attr) => format!("{id}::{attr}"),
            None => id.to_string(),
        };

        let mut state = Resolution::default();
        let result = resolver::format_entry(scope, &mut state, entry);

        for error in state.errors.drain(..) {
            self.env.emit(
                ErrorEvent::new(EventKind::ResolveError, error)
                    .with_entity(label.clone())
                    .with_lang(scope.lang.clone()),
            );
        }

        match result {
            Ok(value) => value,
            Err(error) => {
                self.env.emit(
                    ErrorEvent::new(EventKind::ResolveError, error)
                        .with_entity(label.clone())
                        .with_lang(scope.lang.clone()),
                );
                label
            }
        }
    }

    /// Degrade keys the whole chain failed to resolve and report them once.
    fn report_missing(&self, keys: &[FormatKey], resolved: &mut [Option<FormattedEntity>]) {
        let mut missing: Vec<String> = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            if resolved[i].is_some() {
                continue;
            }
            if !missing.contains(&key.id) {
                missing.push(key.id.clone());
            }
            resolved[i] = Some(FormattedEntity {
                value: key.id.clone(),
                attrs: None,
            });
        }

        if missing.is_empty() {
            return;
        }
        let ids = missing.join(", ");
        self.env.emit(ErrorEvent::new(
            EventKind::NotFoundError,
            L10nError::NotFoundInAny { ids },
        ));
    }
}

/// Find an entity across resources; the first resource defining it wins.
fn lookup<'a>(resources: &'a [Arc<Entries>], id: &str) -> Option<&'a Entry> {
    resources.iter().find_map(|entries| entries.get(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ResourceFetcher;
    use crate::resolver::ArgValue;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MemoryFetcher {
        resources: HashMap<String, String>,
    }

    impl MemoryFetcher {
        fn new(resources: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(Self {
                resources: resources
                    .iter()
                    .map(|(path, body)| (path.to_string(), body.to_string()))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl ResourceFetcher for MemoryFetcher {
        async fn fetch(&self, path: &str, _locale: &Locale) -> Result<String, L10nError> {
            self.resources
                .get(path)
                .cloned()
                .ok_or_else(|| L10nError::Fetch {
                    resource: path.to_string(),
                })
        }
    }

    const RES_ID: &str = "locales/app.{locale}.properties";

    fn args(pairs: &[(&str, ArgValue)]) -> FormatArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_format_values_with_args() {
        let fetcher = MemoryFetcher::new(&[(
            "locales/app.en-US.properties",
            "greet = Hello, {{ $name }}!\n",
        )]);
        let env = Env::new(fetcher);
        let ctx = env.create_context(vec![Locale::new("en-US")], vec![RES_ID.to_string()]);

        let values = ctx
            .format_values([(
                "greet",
                args(&[("name", ArgValue::from("Ana"))]),
            )])
            .await;
        assert_eq!(values, vec!["Hello, \u{2068}Ana\u{2069}!".to_string()]);
    }

    #[tokio::test]
    async fn test_fallback_chain_resolves_from_second_locale() {
        let fetcher = MemoryFetcher::new(&[
            ("locales/app.fr.properties", "other = Autre\n"),
            ("locales/app.en-US.properties", "other = Other\nonly_en = English\n"),
        ]);
        let env = Env::new(fetcher);
        let ctx = env.create_context(
            vec![Locale::new("fr"), Locale::new("en-US")],
            vec![RES_ID.to_string()],
        );

        let notfound = Arc::new(AtomicUsize::new(0));
        let count = notfound.clone();
        env.add_event_listener(EventKind::NotFoundError, move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        });

        let values = ctx.format_values(["other", "only_en"]).await;
        assert_eq!(values, vec!["Autre".to_string(), "English".to_string()]);
        // The fallback succeeded, so no not-found diagnostic fires.
        assert_eq!(notfound.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_resource_for_head_locale_falls_back() {
        let fetcher = MemoryFetcher::new(&[(
            "locales/app.en-US.properties",
            "title = Settings\n",
        )]);
        let env = Env::new(fetcher);
        let ctx = env.create_context(
            vec![Locale::new("fr"), Locale::new("en-US")],
            vec![RES_ID.to_string()],
        );

        let values = ctx.format_values(["title"]).await;
        assert_eq!(values, vec!["Settings".to_string()]);
    }

    #[tokio::test]
    async fn test_exhausted_chain_degrades_to_id() {
        let fetcher = MemoryFetcher::new(&[(
            "locales/app.en-US.properties",
            "title = Settings\n",
        )]);
        let env = Env::new(fetcher);
        let ctx = env.create_context(vec![Locale::new("en-US")], vec![RES_ID.to_string()]);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        env.add_event_listener(EventKind::NotFoundError, move |event| {
            sink.lock().unwrap().push(event.error.clone());
        });

        let values = ctx.format_values(["missing_a", "title", "missing_b"]).await;
        assert_eq!(
            values,
            vec![
                "missing_a".to_string(),
                "Settings".to_string(),
                "missing_b".to_string()
            ]
        );

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            L10nError::NotFoundInAny {
                ids: "missing_a, missing_b".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_result_order_matches_input_order() {
        let fetcher = MemoryFetcher::new(&[
            ("locales/app.fr.properties", "b = fr-b\n"),
            ("locales/app.en-US.properties", "a = en-a\nb = en-b\nc = en-c\n"),
        ]);
        let env = Env::new(fetcher);
        let ctx = env.create_context(
            vec![Locale::new("fr"), Locale::new("en-US")],
            vec![RES_ID.to_string()],
        );

        let values = ctx.format_values(["a", "b", "c"]).await;
        assert_eq!(
            values,
            vec!["en-a".to_string(), "fr-b".to_string(), "en-c".to_string()]
        );
    }

    #[tokio::test]
    async fn test_first_resource_id_wins() {
        let fetcher = MemoryFetcher::new(&[
            ("locales/main.en-US.properties", "title = Main\n"),
            ("locales/extra.en-US.properties", "title = Extra\nonly = Only\n"),
        ]);
        let env = Env::new(fetcher);
        let ctx = env.create_context(
            vec![Locale::new("en-US")],
            vec![
                "locales/main.{locale}.properties".to_string(),
                "locales/extra.{locale}.properties".to_string(),
            ],
        );

        let values = ctx.format_values(["title", "only"]).await;
        assert_eq!(values, vec!["Main".to_string(), "Only".to_string()]);
    }

    #[tokio::test]
    async fn test_format_entities_includes_attrs() {
        let fetcher = MemoryFetcher::new(&[(
            "locales/app.en-US.properties",
            "input = Search\ninput.placeholder = Type here\n",
        )]);
        let env = Env::new(fetcher);
        let ctx = env.create_context(vec![Locale::new("en-US")], vec![RES_ID.to_string()]);

        let entities = ctx.format_entities(["input"]).await;
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].value, "Search");
        let attrs = entities[0].attrs.as_ref().unwrap();
        assert_eq!(attrs.get("placeholder").map(String::as_str), Some("Type here"));
    }

    #[tokio::test]
    async fn test_resolve_error_tagged_with_entity_and_locale() {
        let fetcher = MemoryFetcher::new(&[(
            "locales/app.en-US.properties",
            "greet = Hello, {{ name }}!\n",
        )]);
        let env = Env::new(fetcher);
        let ctx = env.create_context(vec![Locale::new("en-US")], vec![RES_ID.to_string()]);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        env.add_event_listener(EventKind::ResolveError, move |event| {
            sink.lock().unwrap().push(event.clone());
        });

        let values = ctx.format_values(["greet"]).await;
        assert_eq!(values[0], "Hello, \u{2068}{{ name }}\u{2069}!");

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].entity.as_deref(), Some("greet"));
        assert_eq!(events[0].lang.as_ref().map(|l| l.code.as_str()), Some("en-US"));
    }

    #[tokio::test]
    async fn test_cyclic_entities_degrade_and_report() {
        let fetcher = MemoryFetcher::new(&[(
            "locales/app.en-US.properties",
            "a = {{ b }}\nb = {{ a }}\n",
        )]);
        let env = Env::new(fetcher);
        let ctx = env.create_context(vec![Locale::new("en-US")], vec![RES_ID.to_string()]);

        let seen = Arc::new(AtomicUsize::new(0));
        let count = seen.clone();
        env.add_event_listener(EventKind::ResolveError, move |event| {
            if event.error == L10nError::CyclicReference {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        let values = ctx.format_values(["a"]).await;
        assert!(values[0].contains("{{ a }}"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
