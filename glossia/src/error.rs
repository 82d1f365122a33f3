//! Error types for localization operations

use thiserror::Error;

use crate::events::EventKind;

/// Errors raised while fetching, parsing, or resolving localization
/// resources.
///
/// None of these escape the public formatting API: every condition degrades
/// to a displayable string and an emitted diagnostic event.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum L10nError {
    /// Malformed source text
    #[error("{0}")]
    Parse(String),

    /// Duplicate entry, attribute, or hash case id
    #[error("{0}")]
    Duplicate(String),

    /// An entry referenced itself, directly or through other entries
    #[error("cyclic reference detected")]
    CyclicReference,

    /// A hash value had neither a matching label nor a default label
    #[error("unresolvable value")]
    UnresolvableValue,

    /// A caller-supplied argument was neither a string nor a finite number
    #[error("arg must be a string or a number: {name}")]
    BadArgType {
        /// Name of the offending argument
        name: String,
    },

    /// A placeable interpolated more characters than allowed
    #[error("too many characters in placeable ({len}, max allowed is {max})")]
    PlaceableTooLong {
        /// Observed length
        len: usize,
        /// Allowed maximum
        max: usize,
    },

    /// A placeable referenced an id defined nowhere
    #[error("unknown reference: {name}")]
    UnknownReference {
        /// The unresolvable identifier
        name: String,
    },

    /// A reserved identifier was used in a placeable
    #[error("illegal id: {name}")]
    IllegalId {
        /// The rejected identifier
        name: String,
    },

    /// An entity id was missing from one locale
    #[error("\"{id}\" not found in {lang}")]
    NotFound {
        /// The entity id
        id: String,
        /// Locale code that lacked it
        lang: String,
    },

    /// Entity ids missing from every locale in the fallback chain
    #[error("\"{ids}\" not found in any language")]
    NotFoundInAny {
        /// Comma-separated list of missing ids
        ids: String,
    },

    /// A resource could not be fetched
    #[error("resource not found: {resource}")]
    Fetch {
        /// The resolved resource path
        resource: String,
    },

    /// A locale code was malformed or unknown
    #[error("invalid locale: {0}")]
    InvalidLocale(String),
}

impl L10nError {
    /// The diagnostic event kind this error is reported under.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Parse(_) | Self::InvalidLocale(_) => EventKind::ParserError,
            Self::Duplicate(_) => EventKind::DuplicateError,
            Self::CyclicReference
            | Self::UnresolvableValue
            | Self::BadArgType { .. }
            | Self::PlaceableTooLong { .. }
            | Self::UnknownReference { .. }
            | Self::IllegalId { .. } => EventKind::ResolveError,
            Self::NotFound { .. } | Self::NotFoundInAny { .. } => EventKind::NotFoundError,
            Self::Fetch { .. } => EventKind::FetchError,
        }
    }
}

/// Result type for localization operations
pub type Result<T> = std::result::Result<T, L10nError>;
