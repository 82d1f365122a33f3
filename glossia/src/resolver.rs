//! Entry resolution
//!
//! Evaluates a parsed [`Entry`] against runtime arguments and a locale,
//! producing the formatted string. Placeable failures degrade to the
//! placeable's literal source text and are collected on the resolution
//! state for the caller to report; only entry-level failures (cyclic
//! references, unresolvable hashes, oversized placeables) propagate.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entry::{Entry, Expr, HashValue, Node, Segment, Value};
use crate::error::L10nError;
use crate::format::NumberFormatter;
use crate::locale::Locale;
use crate::parser::Entries;
use crate::plural::{PluralCategory, PluralRule, plural_rule};

/// Maximum number of characters a placeable may interpolate.
pub const MAX_PLACEABLE_LENGTH: usize = 2500;

/// Identifiers resolved as built-in macros.
const KNOWN_MACROS: &[&str] = &["plural"];

const FSI: char = '\u{2068}';
const PDI: char = '\u{2069}';

/// A caller-supplied argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// A string argument
    Str(String),
    /// A numeric argument
    Num(f64),
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<f64> for ArgValue {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl From<i64> for ArgValue {
    fn from(n: i64) -> Self {
        Self::Num(n as f64)
    }
}

impl From<i32> for ArgValue {
    fn from(n: i32) -> Self {
        Self::Num(f64::from(n))
    }
}

impl From<usize> for ArgValue {
    fn from(n: usize) -> Self {
        Self::Num(n as f64)
    }
}

/// Arguments for one formatting request, keyed by placeable name.
pub type FormatArgs = HashMap<String, ArgValue>;

/// Everything resolution reads from the surrounding context.
pub(crate) struct Scope<'a> {
    pub lang: &'a Locale,
    pub args: Option<&'a FormatArgs>,
    /// Parsed resources for the active locale, in resource-id order.
    pub resources: &'a [Arc<Entries>],
    pub formatter: &'a NumberFormatter,
}

/// Mutable per-call resolution state.
///
/// `chain` is the cyclic-reference guard: entry addresses currently being
/// resolved. It is entered and exited around every nested entry format,
/// including on error paths. `errors` collects non-fatal placeable
/// failures for the caller to report.
#[derive(Default)]
pub(crate) struct Resolution {
    chain: Vec<usize>,
    pub errors: Vec<L10nError>,
}

/// A value produced by identifier resolution.
enum Resolved {
    Str(String),
    Num(f64),
    Rule(PluralRule),
}

/// Format one entry to its display string.
pub(crate) fn format_entry(
    scope: &Scope<'_>,
    state: &mut Resolution,
    entry: &Entry,
) -> Result<String, L10nError> {
    match entry {
        Entry::Simple(s) => Ok(s.clone()),
        Entry::Node(node) => {
            let address = entry as *const Entry as usize;
            if state.chain.contains(&address) {
                return Err(L10nError::CyclicReference);
            }
            state.chain.push(address);
            let result = resolve_node(scope, state, node);
            state.chain.pop();
            result
        }
    }
}

fn resolve_node(
    scope: &Scope<'_>,
    state: &mut Resolution,
    node: &Node,
) -> Result<String, L10nError> {
    match &node.value {
        // Attribute-only entities have no displayable value.
        None => Ok(String::new()),
        Some(value) => resolve_value(scope, state, value, node.index.as_deref()),
    }
}

fn resolve_value(
    scope: &Scope<'_>,
    state: &mut Resolution,
    value: &Value,
    index: Option<&[Expr]>,
) -> Result<String, L10nError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        Value::Complex(segments) => interpolate(scope, state, segments),
        Value::Hash(hash) => {
            if let Some(index) = index {
                let label = resolve_selector(scope, state, hash, index)?;
                if let Some(case) = hash.items.get(&label) {
                    return resolve_value(scope, state, case, None);
                }
            }
            let default_label = hash.default.as_deref().unwrap_or("other");
            if let Some(case) = hash.items.get(default_label) {
                return resolve_value(scope, state, case, None);
            }
            Err(L10nError::UnresolvableValue)
        }
    }
}

fn interpolate(
    scope: &Scope<'_>,
    state: &mut Resolution,
    segments: &[Segment],
) -> Result<String, L10nError> {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Literal(s) => out.push_str(s),
            Segment::Placeable(expr) => out.push_str(&sub_placeable(scope, state, expr)?),
        }
    }
    Ok(out)
}

/// Resolve one placeable, degrading failures to its literal source text.
fn sub_placeable(
    scope: &Scope<'_>,
    state: &mut Resolution,
    expr: &Expr,
) -> Result<String, L10nError> {
    let Some(name) = expr.name() else {
        let source = expr.to_string();
        state.errors.push(L10nError::UnknownReference {
            name: source.clone(),
        });
        return Ok(literal_placeable(&source));
    };

    let resolved = match resolve_identifier(scope, state, name) {
        Ok(resolved) => resolved,
        Err(err) => {
            state.errors.push(err);
            return Ok(literal_placeable(name));
        }
    };

    match resolved {
        Resolved::Num(n) => Ok(scope.formatter.format(n)),
        Resolved::Str(s) => {
            let len = s.chars().count();
            if len >= MAX_PLACEABLE_LENGTH {
                return Err(L10nError::PlaceableTooLong {
                    len,
                    max: MAX_PLACEABLE_LENGTH,
                });
            }
            Ok(format!("{FSI}{s}{PDI}"))
        }
        // A macro has no string form; show the placeable source.
        Resolved::Rule(_) => Ok(literal_placeable(name)),
    }
}

fn literal_placeable(name: &str) -> String {
    format!("{FSI}{{{{ {name} }}}}{PDI}")
}

/// Resolve an identifier: macros, then caller args, then named entries.
fn resolve_identifier(
    scope: &Scope<'_>,
    state: &mut Resolution,
    id: &str,
) -> Result<Resolved, L10nError> {
    if KNOWN_MACROS.contains(&id) {
        return Ok(Resolved::Rule(plural_rule(&scope.lang.code)));
    }

    if let Some(args) = scope.args {
        if let Some(value) = args.get(id) {
            return match value {
                ArgValue::Str(s) => Ok(Resolved::Str(s.clone())),
                ArgValue::Num(n) if n.is_finite() => Ok(Resolved::Num(*n)),
                ArgValue::Num(_) => Err(L10nError::BadArgType {
                    name: id.to_string(),
                }),
            };
        }
    }

    if id == "__proto__" {
        return Err(L10nError::IllegalId {
            name: id.to_string(),
        });
    }

    for resource in scope.resources {
        if let Some(entry) = resource.get(id) {
            return format_entry(scope, state, entry).map(Resolved::Str);
        }
    }

    Err(L10nError::UnknownReference {
        name: id.to_string(),
    })
}

/// Evaluate a selector expression list against a hash.
fn resolve_selector(
    scope: &Scope<'_>,
    state: &mut Resolution,
    hash: &HashValue,
    index: &[Expr],
) -> Result<String, L10nError> {
    let Some(selector) = index.first() else {
        return Err(L10nError::UnresolvableValue);
    };

    let selector_name = match selector {
        Expr::Call(callee, _) if is_cldr_call(callee) => "plural",
        other => other.name().ok_or_else(|| L10nError::UnknownReference {
            name: other.to_string(),
        })?,
    };

    let rule = match resolve_identifier(scope, state, selector_name)? {
        // A non-macro selector is the label itself.
        Resolved::Str(label) => return Ok(label),
        Resolved::Num(n) => return Ok(n.to_string()),
        Resolved::Rule(rule) => rule,
    };

    let arg_value = match selector {
        Expr::Call(_, args) => match args.first().and_then(Expr::name) {
            Some(arg_name) => match resolve_identifier(scope, state, arg_name)? {
                Resolved::Num(n) => Some(n),
                Resolved::Str(_) | Resolved::Rule(_) => None,
            },
            None => None,
        },
        _ => None,
    };

    // Exact numeric labels win over the computed category.
    if selector_name == "plural" {
        if arg_value == Some(0.0) && hash.items.contains_key("zero") {
            return Ok("zero".to_string());
        }
        if arg_value == Some(1.0) && hash.items.contains_key("one") {
            return Ok("one".to_string());
        }
        if arg_value == Some(2.0) && hash.items.contains_key("two") {
            return Ok("two".to_string());
        }
    }

    let category = match arg_value {
        Some(n) => rule(n),
        None => PluralCategory::Other,
    };
    Ok(category.as_str().to_string())
}

/// True for the `@cldr.<anything>` callee shape of plural selectors.
fn is_cldr_call(callee: &Expr) -> bool {
    match callee {
        Expr::Prop(object, _) => object.name() == Some("cldr"),
        _ => false,
    }
}
