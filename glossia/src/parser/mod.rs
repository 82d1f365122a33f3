//! Message parsers
//!
//! Two independently-invokable parsers produce the same [`Entry`] model:
//! [`PropertiesParser`] for the flat, line-oriented syntax and
//! [`L20nParser`] for the bracketed entity syntax.
//!
//! Both accept an optional `emit` callback for non-fatal diagnostics. With
//! a callback, parsing is best-effort: a bad line or entry is reported and
//! skipped, and the rest of the resource still loads. Without one, the
//! first error is returned.

mod l20n;
mod properties;

pub use l20n::L20nParser;
pub use properties::PropertiesParser;

use std::collections::HashMap;

use crate::entry::Entry;
use crate::error::L10nError;
use crate::events::EventKind;

/// Parsed entries of one resource, keyed by entity id.
pub type Entries = HashMap<String, Entry>;

/// Diagnostic callback handed to the parsers.
pub type Emit<'a> = dyn Fn(EventKind, L10nError) + 'a;

/// Maximum number of placeables one value may contain.
pub const MAX_PLACEABLES: usize = 100;
