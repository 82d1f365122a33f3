//! Flat, properties-like message syntax
//!
//! Line-oriented: `#`-prefixed or blank lines are comments, entries are
//! `key = value`, and a trailing `\` continues a value onto the next line.
//! Dotted keys assign attributes, bracketed keys assign selector-hash
//! cases, and `{{ name }}` placeables split values into segment lists.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entry::{Entry, Expr, HashValue, Node, PropKey, Segment, Value};
use crate::error::L10nError;
use crate::events::EventKind;

use super::{Emit, Entries, MAX_PLACEABLES};

static RE_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*#|^\s*$").unwrap());
static RE_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^=\s]+)\s*=\s*(.*)$").unwrap());
static RE_MULTILINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\\]\\$").unwrap());
static RE_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\[\s*(\w+)(?:\(([^)]*)\))?\s*\]\}").unwrap());
static RE_PLACEABLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{\s*(\S*?)\s*\}\}").unwrap());

/// Parser for the flat syntax.
pub struct PropertiesParser;

impl PropertiesParser {
    /// Parse a resource.
    ///
    /// With an `emit` callback, malformed or duplicate lines are reported
    /// and skipped; without one, the first error is returned.
    pub fn parse(emit: Option<&Emit>, source: &str) -> Result<Entries, L10nError> {
        let mut entries = Entries::new();
        let lines: Vec<&str> = source.lines().filter(|line| !line.is_empty()).collect();

        let mut i = 0;
        while i < lines.len() {
            let mut line = lines[i].to_string();

            if RE_COMMENT.is_match(&line) {
                i += 1;
                continue;
            }

            while RE_MULTILINE.is_match(&line) && i + 1 < lines.len() {
                i += 1;
                line.pop();
                line.push_str(lines[i].trim());
            }

            if let Some(caps) = RE_ENTITY.captures(&line) {
                if let Err(err) = parse_entity(&caps[1], &caps[2], &mut entries) {
                    match emit {
                        Some(emit) => emit(err.kind(), err),
                        None => return Err(err),
                    }
                }
            }

            i += 1;
        }

        Ok(entries)
    }
}

fn parse_entity(id: &str, raw_value: &str, entries: &mut Entries) -> Result<(), L10nError> {
    let (name, key) = match id.find('[') {
        Some(pos) => {
            let rest = &id[pos + 1..];
            (&id[..pos], Some(rest.strip_suffix(']').unwrap_or(rest)))
        }
        None => (id, None),
    };

    let name_elements: Vec<&str> = name.split('.').collect();
    if name_elements.len() > 2 {
        return Err(L10nError::Parse(format!(
            "error in id \"{name}\": nested attributes are not supported"
        )));
    }

    let (name, attr) = match name_elements.as_slice() {
        [entity, attr] => {
            if attr.starts_with('$') {
                return Err(L10nError::Parse(
                    "attribute can't start with \"$\"".to_string(),
                ));
            }
            (*entity, Some(*attr))
        }
        _ => (name, None),
    };

    set_entity_value(name, attr, key, unescape_string(raw_value), entries)
}

fn set_entity_value(
    id: &str,
    attr: Option<&str>,
    key: Option<&str>,
    raw_value: String,
    entries: &mut Entries,
) -> Result<(), L10nError> {
    let value = if raw_value.contains("{{") {
        Value::Complex(parse_placeables(&raw_value)?)
    } else {
        Value::Str(raw_value)
    };

    if let Some(attr) = attr {
        // Promote a plain-string entry to a node keeping its value.
        let node = match entries.remove(id) {
            Some(Entry::Simple(existing)) => Node {
                value: Some(Value::Str(existing)),
                ..Node::default()
            },
            Some(Entry::Node(node)) => node,
            None => Node::default(),
        };
        let mut node = node;
        let attrs = node.attrs.get_or_insert_with(Default::default);
        let result = set_leaf(attrs, attr, key, value);
        entries.insert(id.to_string(), Entry::Node(node));
        return result;
    }

    set_leaf(entries, id, key, value)
}

/// Assign a value, attribute value, or hash case into `slots`.
fn set_leaf(
    slots: &mut Entries,
    id: &str,
    key: Option<&str>,
    value: Value,
) -> Result<(), L10nError> {
    let Some(case_key) = key else {
        match value {
            Value::Str(s) => {
                if slots.contains_key(id) {
                    return Err(L10nError::Duplicate(format!("duplicated id: {id}")));
                }
                slots.insert(id.to_string(), Entry::Simple(s));
            }
            value => match slots.get_mut(id) {
                None => {
                    slots.insert(
                        id.to_string(),
                        Entry::Node(Node {
                            value: Some(value),
                            ..Node::default()
                        }),
                    );
                }
                Some(Entry::Node(node)) => node.value = Some(value),
                // A plain string already claimed this id; keep it.
                Some(Entry::Simple(_)) => {}
            },
        }
        return Ok(());
    };

    // Bracketed key: the target becomes a selector hash. A plain-string
    // slot is an index annotation written on an earlier line.
    let node = match slots.remove(id) {
        Some(Entry::Simple(annotation)) => match parse_index(&annotation) {
            Ok(index) => Node {
                value: Some(Value::Hash(HashValue::default())),
                index: Some(index),
                ..Node::default()
            },
            Err(err) => {
                slots.insert(id.to_string(), Entry::Simple(annotation));
                return Err(err);
            }
        },
        Some(Entry::Node(mut node)) => {
            if !matches!(node.value, Some(Value::Hash(_))) {
                node.value = Some(Value::Hash(HashValue::default()));
            }
            node
        }
        None => Node {
            value: Some(Value::Hash(HashValue::default())),
            ..Node::default()
        },
    };

    let mut node = node;
    let result = match node.value {
        Some(Value::Hash(ref mut hash)) => {
            if hash.items.contains_key(case_key) {
                Err(L10nError::Duplicate(format!("duplicated id: {case_key}")))
            } else {
                hash.items.insert(case_key.to_string(), value);
                Ok(())
            }
        }
        _ => Ok(()),
    };
    slots.insert(id.to_string(), Entry::Node(node));
    result
}

/// Split a raw value containing `{{ }}` placeables into segments.
fn parse_placeables(raw: &str) -> Result<Vec<Segment>, L10nError> {
    let count = RE_PLACEABLE.find_iter(raw).count();
    if count >= MAX_PLACEABLES {
        return Err(L10nError::Parse(format!(
            "too many placeables ({count}, max allowed is {MAX_PLACEABLES})"
        )));
    }

    let mut segments = Vec::new();
    let mut last = 0;
    for caps in RE_PLACEABLE.captures_iter(raw) {
        let Some(m) = caps.get(0) else { continue };
        if m.start() > last {
            segments.push(Segment::Literal(raw[last..m.start()].to_string()));
        }
        let name = &caps[1];
        let expr = match name.strip_prefix('$') {
            Some(arg) => Expr::Var(arg.to_string()),
            None => Expr::Id(name.to_string()),
        };
        segments.push(Segment::Placeable(expr));
        last = m.end();
    }
    if last < raw.len() {
        segments.push(Segment::Literal(raw[last..].to_string()));
    }
    Ok(segments)
}

/// Parse a `{[ plural(n) ]}` or `{[ name ]}` index annotation.
fn parse_index(annotation: &str) -> Result<Vec<Expr>, L10nError> {
    let caps = RE_INDEX
        .captures(annotation)
        .ok_or_else(|| L10nError::Parse("malformed index".to_string()))?;

    match caps.get(2) {
        Some(arg) => Ok(vec![Expr::Call(
            Box::new(Expr::Prop(
                Box::new(Expr::Glob("cldr".to_string())),
                PropKey::Ident("plural".to_string()),
            )),
            vec![Expr::Id(arg.as_str().to_string())],
        )]),
        None => Ok(vec![Expr::Id(caps[1].to_string())]),
    }
}

/// Decode escape sequences in a raw value.
fn unescape_string(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('r') => {
                chars.next();
                out.push('\r');
            }
            Some('t') => {
                chars.next();
                out.push('\t');
            }
            Some('b') => {
                chars.next();
                out.push('\u{8}');
            }
            Some('f') => {
                chars.next();
                out.push('\u{c}');
            }
            Some(q @ ('"' | '\'' | '\\' | '{' | '}')) => {
                chars.next();
                out.push(q);
            }
            Some('u') => {
                chars.next();
                let mut hex = String::new();
                while hex.len() < 4 {
                    match chars.peek() {
                        Some(d) if d.is_ascii_hexdigit() => {
                            hex.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            _ => out.push('\\'),
        }
    }
    out
}
