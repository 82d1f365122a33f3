//! Pseudo-locale string transforms
//!
//! Pseudo locales exercise layout and i18n-readiness without real
//! translations: their strings are derived from the `en-US` app resources
//! by a per-locale transform. `fr-x-psaccent` doubles vowels and remaps
//! letters to accented forms; `ar-x-psbidi` flips letters and wraps words
//! in right-to-left override marks.
//!
//! Placeholders (`{ ... }`), `%`-format codes, HTML entities, and tags are
//! excluded from transformation so the resolver still recognizes them.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entry::{Entry, HashValue, Node, Segment, Value};
use crate::error::L10nError;
use crate::parser::Entries;

/// Accented pseudo locale code.
pub const ACCENTED: &str = "fr-x-psaccent";
/// Bidi pseudo locale code.
pub const BIDI: &str = "ar-x-psbidi";

/// All known pseudo locale codes.
pub const PSEUDO_LOCALES: [&str; 2] = [ACCENTED, BIDI];

/// Spans protected from transformation.
static RE_EXCLUDED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[EO]?\w|\{\s*.+?\s*\}|&[#\w]+;|<\s*.+?\s*>").unwrap());

static RE_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-zA-Z]+").unwrap());

/// Maps indexed by `char as u32 - 'A' as u32`, covering `A`..=`z`.
static ACCENTED_MAP: Lazy<Vec<char>> = Lazy::new(|| {
    "ȦƁƇḒḖƑƓĦĪĴĶĿḾȠǾƤɊŘŞŦŬṼẆẊẎẐ[\\]^_`ȧƀƈḓḗƒɠħīĵķŀḿƞǿƥɋřşŧŭṽẇẋẏẑ"
        .chars()
        .collect()
});

static BIDI_MAP: Lazy<Vec<char>> = Lazy::new(|| {
    "∀ԐↃpƎɟפHIſӼ˥WNOԀÒᴚS⊥∩ɅＭXʎZ[\\]ᵥ_,ɐqɔpǝɟƃɥıɾʞʅɯuodbɹsʇnʌʍxʎz"
        .chars()
        .collect()
});

/// Whether `code` names a known pseudo locale.
pub fn is_pseudo(code: &str) -> bool {
    PSEUDO_LOCALES.contains(&code)
}

/// Transform one string for a pseudo locale.
///
/// Returns `None` for unknown codes.
pub fn transform_string(code: &str, input: &str) -> Option<String> {
    match code {
        ACCENTED => Some(apply_excluding(accent, input)),
        BIDI => Some(apply_excluding(bidi, input)),
        _ => None,
    }
}

/// Display name of a pseudo locale, run through its own transform.
pub fn display_name(code: &str) -> Option<String> {
    match code {
        ACCENTED => Some(accent("Runtime Accented")),
        BIDI => Some(bidi("Runtime Bidi")),
        _ => None,
    }
}

/// Walk parsed entries, transforming every string leaf.
///
/// Complex-string placeables and index expressions pass through untouched.
pub(crate) fn transform_entries(code: &str, entries: Entries) -> Result<Entries, L10nError> {
    let transform: fn(&str) -> String = match code {
        ACCENTED => accent,
        BIDI => bidi,
        _ => return Err(L10nError::InvalidLocale(code.to_string())),
    };
    Ok(entries
        .into_iter()
        .map(|(id, entry)| (id, walk_entry(entry, transform)))
        .collect())
}

fn walk_entry(entry: Entry, transform: fn(&str) -> String) -> Entry {
    match entry {
        Entry::Simple(s) => Entry::Simple(apply_excluding(transform, &s)),
        Entry::Node(node) => Entry::Node(Node {
            value: node.value.map(|v| walk_value(v, transform)),
            index: node.index,
            attrs: node.attrs.map(|attrs| {
                attrs
                    .into_iter()
                    .map(|(key, attr)| (key, walk_entry(attr, transform)))
                    .collect()
            }),
        }),
    }
}

fn walk_value(value: Value, transform: fn(&str) -> String) -> Value {
    match value {
        Value::Str(s) => Value::Str(apply_excluding(transform, &s)),
        Value::Complex(segments) => Value::Complex(
            segments
                .into_iter()
                .map(|segment| match segment {
                    Segment::Literal(s) => Segment::Literal(apply_excluding(transform, &s)),
                    placeable => placeable,
                })
                .collect(),
        ),
        Value::Hash(hash) => Value::Hash(HashValue {
            items: hash
                .items
                .into_iter()
                .map(|(label, v)| (label, walk_value(v, transform)))
                .collect(),
            default: hash.default,
        }),
    }
}

/// Apply `transform` to everything outside excluded spans.
fn apply_excluding(transform: fn(&str) -> String, input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for found in RE_EXCLUDED.find_iter(input) {
        out.push_str(&transform(&input[last..found.start()]));
        out.push_str(found.as_str());
        last = found.end();
    }
    out.push_str(&transform(&input[last..]));
    out
}

fn accent(input: &str) -> String {
    replace_chars(&ACCENTED_MAP, &double_vowels(input))
}

fn bidi(input: &str) -> String {
    let wrapped = RE_WORDS.replace_all(input, "\u{202E}$0\u{202C}");
    replace_chars(&BIDI_MAP, &wrapped)
}

fn double_vowels(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        out.push(c);
        if matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'A' | 'E' | 'I' | 'O' | 'U') {
            out.push(c.to_ascii_lowercase());
        }
    }
    out
}

fn replace_chars(map: &[char], input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                map.get(c as usize - 'A' as usize).copied().unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}
