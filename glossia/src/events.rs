//! Diagnostic event channel
//!
//! Fetch, parse, and resolution problems never abort formatting; they are
//! published here instead. Listeners subscribe to a single kind or to the
//! wildcard and receive every [`ErrorEvent`] the environment emits.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::L10nError;
use crate::locale::Locale;

/// The kinds of diagnostic events the engine emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An entry failed to resolve (cyclic reference, bad argument, ...)
    ResolveError,
    /// An entity id was not found in any language
    NotFoundError,
    /// A resource could not be fetched
    FetchError,
    /// A resource contained malformed source text
    ParserError,
    /// A duplicate entry, attribute, or case id was dropped
    DuplicateError,
}

impl EventKind {
    /// Channel name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveError => "resolveerror",
            Self::NotFoundError => "notfounderror",
            Self::FetchError => "fetcherror",
            Self::ParserError => "parsererror",
            Self::DuplicateError => "duplicateerror",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription target: one event kind, or every kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFilter {
    /// A single event kind
    Kind(EventKind),
    /// The `*` wildcard
    Any,
}

impl From<EventKind> for EventFilter {
    fn from(kind: EventKind) -> Self {
        Self::Kind(kind)
    }
}

/// A published diagnostic: the error plus the entity and locale it was
/// observed for, when known.
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    /// Channel the event was published on
    pub kind: EventKind,
    /// The underlying error
    pub error: L10nError,
    /// Owning entity id, with an `::attr` suffix for attribute values
    pub entity: Option<String>,
    /// Locale the error was observed for
    pub lang: Option<Locale>,
}

impl ErrorEvent {
    /// Create an event with no entity or locale context.
    pub fn new(kind: EventKind, error: L10nError) -> Self {
        Self {
            kind,
            error,
            entity: None,
            lang: None,
        }
    }

    /// Attach the owning entity id.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Attach the locale the error was observed for.
    pub fn with_lang(mut self, lang: Locale) -> Self {
        self.lang = Some(lang);
        self
    }
}

/// Token identifying a registered listener, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&ErrorEvent) + Send + Sync>;

/// Listener registry shared by an environment.
#[derive(Default)]
pub(crate) struct EventRegistry {
    listeners: RwLock<HashMap<EventFilter, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

impl EventRegistry {
    pub(crate) fn add(
        &self,
        filter: EventFilter,
        listener: impl Fn(&ErrorEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(filter)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) {
        let mut listeners = self.listeners.write();
        for registered in listeners.values_mut() {
            registered.retain(|(lid, _)| *lid != id);
        }
    }

    /// Publish an event to wildcard listeners first, then typed listeners.
    pub(crate) fn emit(&self, event: &ErrorEvent) {
        debug!(kind = %event.kind, error = %event.error, "l10n diagnostic");

        // Snapshot under the lock; listeners may re-enter the registry.
        let targets: Vec<Listener> = {
            let listeners = self.listeners.read();
            let wildcard = listeners.get(&EventFilter::Any).into_iter().flatten();
            let typed = listeners
                .get(&EventFilter::Kind(event.kind))
                .into_iter()
                .flatten();
            wildcard.chain(typed).map(|(_, l)| l.clone()).collect()
        };

        for listener in targets {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn resolve_event() -> ErrorEvent {
        ErrorEvent::new(EventKind::ResolveError, L10nError::CyclicReference)
    }

    #[test]
    fn test_typed_listener_receives_matching_kind() {
        let registry = EventRegistry::default();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        registry.add(EventFilter::Kind(EventKind::ResolveError), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        registry.emit(&resolve_event());
        registry.emit(&ErrorEvent::new(
            EventKind::FetchError,
            L10nError::Fetch {
                resource: "app.l20n".to_string(),
            },
        ));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wildcard_listener_receives_every_kind() {
        let registry = EventRegistry::default();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        registry.add(EventFilter::Any, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        registry.emit(&resolve_event());
        registry.emit(&ErrorEvent::new(
            EventKind::ParserError,
            L10nError::Parse("bad entry".to_string()),
        ));

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_removed_listener_is_silent() {
        let registry = EventRegistry::default();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let id = registry.add(EventFilter::Any, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        registry.emit(&resolve_event());
        registry.remove(id);
        registry.emit(&resolve_event());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_context_builders() {
        let event = resolve_event()
            .with_entity("greeting::title")
            .with_lang(Locale::new("fr"));
        assert_eq!(event.entity.as_deref(), Some("greeting::title"));
        assert_eq!(event.lang.map(|l| l.code), Some("fr".to_string()));
    }
}
