//! Embedded localization engine
//!
//! Turns localized entity definitions into rendered strings for view
//! attachment, with graceful degradation at every layer:
//!
//! - **Message parsing**: two source syntaxes (a flat, properties-like
//!   format and a richer bracketed format) produce one entry model
//! - **Resolution**: placeables, selector hashes, plural rules, and
//!   cyclic-reference protection
//! - **Locale fallback**: per-view contexts walk an ordered locale chain
//!   until every requested key resolves
//! - **Resource environment**: a process-wide, write-once cache with
//!   reference-counted eviction and a pseudo-locale transform layer
//! - **Diagnostics**: no error escapes the formatting API; everything
//!   degrades to displayable text plus an emitted event
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use glossia::{ArgValue, Env, FormatArgs, Locale};
//!
//! let env = Env::new(Arc::new(my_fetcher));
//! let ctx = env.create_context(
//!     vec![Locale::new("fr"), Locale::new("en-US")],
//!     vec!["locales/app.{locale}.properties".to_string()],
//! );
//!
//! let args: FormatArgs = [("name".to_string(), ArgValue::from("Ana"))]
//!     .into_iter()
//!     .collect();
//! let values = ctx.format_values([("greet", args)]).await;
//!
//! env.destroy_context(&ctx);
//! ```

pub mod context;
pub mod entry;
pub mod env;
pub mod error;
pub mod events;
pub mod fetch;
pub mod format;
pub mod locale;
pub mod parser;
pub mod plural;
pub mod pseudo;
pub mod resolver;

pub use context::{Context, FormatKey, FormattedEntity};
pub use env::Env;
pub use error::{L10nError, Result};
pub use events::{ErrorEvent, EventFilter, EventKind, ListenerId};
pub use fetch::{ResourceFetcher, Syntax};
pub use locale::{Locale, LocaleSource, Meta, negotiate_languages};
pub use plural::{PluralCategory, plural_category, plural_rule};
pub use resolver::{ArgValue, FormatArgs};

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ArgValue, Context, Env, ErrorEvent, EventFilter, EventKind, FormatArgs, FormatKey,
        FormattedEntity, L10nError, Locale, LocaleSource, ResourceFetcher, Result,
    };
}
