//! Process-wide resource environment
//!
//! Owns the fetched-and-parsed resource cache, resource reference counts,
//! per-locale number formatters, and the diagnostic event channel. Cache
//! entries are write-once per key: the first requester's fetch populates
//! the entry and concurrent requesters await the same in-flight future.

use std::collections::HashMap;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::L10nError;
use crate::events::{ErrorEvent, EventFilter, EventKind, EventRegistry, ListenerId};
use crate::fetch::{ResourceFetcher, Syntax, resolve_path};
use crate::format::NumberFormatter;
use crate::locale::{Locale, LocaleSource};
use crate::parser::{Entries, L20nParser, PropertiesParser};
use crate::pseudo;

type FetchFuture = Shared<BoxFuture<'static, Result<Arc<Entries>, L10nError>>>;

enum ResourceState {
    /// A fetch is in flight; late arrivals await this future.
    Pending(FetchFuture),
    Ready(Arc<Entries>),
    /// Terminal fetch or transform failure, cached and never retried.
    Failed(L10nError),
}

/// Shared localization environment.
///
/// Cheap to clone; clones share the same cache, reference counts, and
/// listener registry.
#[derive(Clone)]
pub struct Env {
    fetcher: Arc<dyn ResourceFetcher>,
    cache: Arc<Mutex<HashMap<String, ResourceState>>>,
    res_refs: Arc<Mutex<HashMap<String, usize>>>,
    formatters: Arc<Mutex<HashMap<String, Arc<NumberFormatter>>>>,
    events: Arc<EventRegistry>,
}

impl Env {
    /// Create an environment around a resource fetcher.
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            cache: Arc::new(Mutex::new(HashMap::new())),
            res_refs: Arc::new(Mutex::new(HashMap::new())),
            formatters: Arc::new(Mutex::new(HashMap::new())),
            events: Arc::new(EventRegistry::default()),
        }
    }

    /// Create a formatting context and take a use count on its resources.
    pub fn create_context(&self, langs: Vec<Locale>, res_ids: Vec<String>) -> Context {
        {
            let mut refs = self.res_refs.lock();
            for res_id in &res_ids {
                *refs.entry(res_id.clone()).or_insert(0) += 1;
            }
        }
        Context::new(self.clone(), langs, res_ids)
    }

    /// Release a context's resources.
    ///
    /// When a resource id's use count reaches zero, every cache entry whose
    /// key starts with that id is purged, across all locales and sources.
    pub fn destroy_context(&self, ctx: &Context) {
        for res_id in ctx.res_ids() {
            let remaining = {
                let mut refs = self.res_refs.lock();
                match refs.get_mut(res_id) {
                    Some(count) if *count > 1 => {
                        *count -= 1;
                        *count
                    }
                    _ => {
                        refs.remove(res_id);
                        0
                    }
                }
            };
            if remaining == 0 {
                let mut cache = self.cache.lock();
                let before = cache.len();
                cache.retain(|key, _| !key.starts_with(res_id.as_str()));
                debug!(
                    resource = %res_id,
                    evicted = before - cache.len(),
                    "resource released"
                );
            }
        }
    }

    /// Subscribe to diagnostic events.
    pub fn add_event_listener(
        &self,
        filter: impl Into<EventFilter>,
        listener: impl Fn(&ErrorEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.events.add(filter.into(), listener)
    }

    /// Remove a previously registered listener.
    pub fn remove_event_listener(&self, id: ListenerId) {
        self.events.remove(id);
    }

    /// Publish a diagnostic event.
    pub(crate) fn emit(&self, event: ErrorEvent) {
        self.events.emit(&event);
    }

    /// Fetch and parse one resource for one locale, through the cache.
    pub(crate) async fn get_resource(
        &self,
        lang: &Locale,
        res_id: &str,
    ) -> Result<Arc<Entries>, L10nError> {
        let key = cache_key(res_id, lang);

        let pending = {
            let mut cache = self.cache.lock();
            match cache.get(&key) {
                Some(ResourceState::Ready(entries)) => return Ok(entries.clone()),
                Some(ResourceState::Failed(err)) => return Err(err.clone()),
                Some(ResourceState::Pending(fut)) => fut.clone(),
                None => {
                    let fut = self
                        .clone()
                        .fetch_and_parse(lang.clone(), res_id.to_string())
                        .boxed()
                        .shared();
                    cache.insert(key.clone(), ResourceState::Pending(fut.clone()));
                    fut
                }
            }
        };

        let result = pending.await;

        // Transition only a still-pending entry; an eviction that raced the
        // fetch stays evicted.
        let mut cache = self.cache.lock();
        if matches!(cache.get(&key), Some(ResourceState::Pending(_))) {
            let state = match &result {
                Ok(entries) => ResourceState::Ready(entries.clone()),
                Err(err) => ResourceState::Failed(err.clone()),
            };
            cache.insert(key, state);
        }
        result
    }

    async fn fetch_and_parse(
        self,
        lang: Locale,
        res_id: String,
    ) -> Result<Arc<Entries>, L10nError> {
        // Pseudo locales transform the real en-US app resource; they never
        // fetch a pseudo-locale file.
        let fetch_lang = if lang.source == LocaleSource::Pseudo {
            Locale {
                code: "en-US".to_string(),
                source: LocaleSource::App,
                version: lang.version.clone(),
            }
        } else {
            lang.clone()
        };

        let path = resolve_path(&res_id, &fetch_lang);
        debug!(resource = %res_id, locale = %fetch_lang.code, "fetching resource");

        let source = match self.fetcher.fetch(&path, &fetch_lang).await {
            Ok(source) => source,
            Err(err) => {
                warn!(resource = %res_id, locale = %lang.code, error = %err, "fetch failed");
                self.emit(ErrorEvent::new(EventKind::FetchError, err.clone()).with_lang(lang));
                return Err(err);
            }
        };

        let entries = self.parse(&lang, &res_id, &source);

        if lang.source == LocaleSource::Pseudo {
            match pseudo::transform_entries(&lang.code, entries) {
                Ok(entries) => Ok(Arc::new(entries)),
                Err(err) => {
                    self.emit(
                        ErrorEvent::new(EventKind::FetchError, err.clone()).with_lang(lang),
                    );
                    Err(err)
                }
            }
        } else {
            Ok(Arc::new(entries))
        }
    }

    /// Parse source text, reporting recoverable errors on the event channel.
    fn parse(&self, lang: &Locale, res_id: &str, source: &str) -> Entries {
        let env = self.clone();
        let lang = lang.clone();
        let emit = move |kind: EventKind, err: L10nError| {
            env.emit(ErrorEvent::new(kind, err).with_lang(lang.clone()));
        };
        let parsed = match Syntax::for_resource(res_id) {
            Syntax::Properties => PropertiesParser::parse(Some(&emit), source),
            Syntax::L20n => L20nParser::parse(Some(&emit), source),
        };
        parsed.unwrap_or_default()
    }

    /// Cached resources for one locale, in resource-id order.
    ///
    /// Failed and still-pending resources are skipped; for resolution they
    /// are indistinguishable from resources that lack the entity.
    pub(crate) fn resource_snapshot(
        &self,
        lang: &Locale,
        res_ids: &[String],
    ) -> Vec<Arc<Entries>> {
        let cache = self.cache.lock();
        res_ids
            .iter()
            .filter_map(|res_id| match cache.get(&cache_key(res_id, lang)) {
                Some(ResourceState::Ready(entries)) => Some(entries.clone()),
                _ => None,
            })
            .collect()
    }

    /// The cached number formatter for a locale.
    pub(crate) fn formatter(&self, lang: &Locale) -> Arc<NumberFormatter> {
        self.formatters
            .lock()
            .entry(lang.code.clone())
            .or_insert_with(|| Arc::new(NumberFormatter::for_locale(&lang.code)))
            .clone()
    }
}

fn cache_key(res_id: &str, lang: &Locale) -> String {
    format!("{}{}{}", res_id, lang.code, lang.source.as_str())
}
