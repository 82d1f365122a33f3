//! `data-l10n-*` attribute contract
//!
//! View glue marks translatable elements with `data-l10n-id` and an
//! optional JSON-encoded `data-l10n-args` attribute. This crate handles
//! the string side of that contract — building [`FormatKey`]s from
//! attribute values and serializing arguments back — without depending on
//! any DOM type. Attribute text may carry `&`, `<`, and `>` as HTML
//! entities; they are decoded before JSON parsing.

use glossia::{ArgValue, FormatArgs, FormatKey};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Attribute naming the entity id of a translatable element.
pub const L10N_ID_ATTR: &str = "data-l10n-id";
/// Attribute carrying JSON-encoded formatting arguments.
pub const L10N_ARGS_ATTR: &str = "data-l10n-args";

/// Errors from argument attribute handling.
#[derive(Debug, Error)]
pub enum ArgsError {
    /// The attribute was not valid JSON
    #[error("malformed l10n args: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON was not an object
    #[error("l10n args must be a JSON object")]
    NotAnObject,

    /// An argument value was neither a string nor a number
    #[error("unsupported argument value for \"{0}\"")]
    UnsupportedValue(String),
}

/// Parse a `data-l10n-args` attribute value.
///
/// `&amp;`, `&lt;`, `&gt;` (and their numeric forms) are decoded first,
/// then the text is parsed as a JSON object of string or number values.
pub fn parse_args(raw: &str) -> Result<FormatArgs, ArgsError> {
    let decoded = decode_entities(raw);
    let parsed: JsonValue = serde_json::from_str(&decoded)?;
    let JsonValue::Object(object) = parsed else {
        return Err(ArgsError::NotAnObject);
    };

    let mut args = FormatArgs::new();
    for (name, value) in object {
        let arg = match value {
            JsonValue::String(s) => ArgValue::Str(s),
            JsonValue::Number(n) => match n.as_f64() {
                Some(n) => ArgValue::Num(n),
                None => return Err(ArgsError::UnsupportedValue(name)),
            },
            _ => return Err(ArgsError::UnsupportedValue(name)),
        };
        args.insert(name, arg);
    }
    Ok(args)
}

/// Build a [`FormatKey`] from the two l10n attributes of an element.
pub fn l10n_key(id: &str, raw_args: Option<&str>) -> Result<FormatKey, ArgsError> {
    match raw_args {
        Some(raw) => Ok(FormatKey::with_args(id, parse_args(raw)?)),
        None => Ok(FormatKey::new(id)),
    }
}

/// Serialize arguments for a `data-l10n-args` attribute.
///
/// Whole numbers serialize without a fraction part.
pub fn serialize_args(args: &FormatArgs) -> String {
    let mut object = serde_json::Map::new();
    for (name, value) in args {
        let json = match value {
            ArgValue::Str(s) => JsonValue::String(s.clone()),
            ArgValue::Num(n) if n.fract() == 0.0 && n.is_finite() => {
                JsonValue::Number((*n as i64).into())
            }
            ArgValue::Num(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
        };
        object.insert(name.clone(), json);
    }
    JsonValue::Object(object).to_string()
}

/// Decode the HTML entities for `&`, `<`, and `>`.
fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match entity_at(rest) {
            Some((decoded, len)) => {
                out.push(decoded);
                rest = &rest[len..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Recognize one of the three supported entities at the start of `s`.
fn entity_at(s: &str) -> Option<(char, usize)> {
    for (name, decoded) in [("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>')] {
        if s.starts_with(name) {
            return Some((decoded, name.len()));
        }
    }

    let body = s.strip_prefix("&#")?;
    let (digits, radix) = match body.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16),
        None => (body, 10),
    };
    let end = digits.find(';')?;
    let code = u32::from_str_radix(&digits[..end], radix).ok()?;
    let decoded = char::from_u32(code)?;
    if !matches!(decoded, '&' | '<' | '>') {
        return None;
    }
    let len = s.len() - digits.len() + end + 1;
    Some((decoded, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_args() {
        let args = parse_args(r#"{"name": "Ana", "count": 3}"#).unwrap();
        assert_eq!(args.get("name"), Some(&ArgValue::Str("Ana".to_string())));
        assert_eq!(args.get("count"), Some(&ArgValue::Num(3.0)));
    }

    #[test]
    fn test_parse_args_with_entities() {
        let args = parse_args(r#"{"q": "a &amp; b &lt;c&gt;"}"#).unwrap();
        assert_eq!(args.get("q"), Some(&ArgValue::Str("a & b <c>".to_string())));
    }

    #[test]
    fn test_parse_args_with_numeric_entities() {
        let args = parse_args(r#"{"q": "&#38;&#x3C;&#62;"}"#).unwrap();
        assert_eq!(args.get("q"), Some(&ArgValue::Str("&<>".to_string())));
    }

    #[test]
    fn test_unrelated_entities_pass_through() {
        let args = parse_args(r#"{"q": "caf&eacute; &#65;"}"#).unwrap();
        assert_eq!(
            args.get("q"),
            Some(&ArgValue::Str("caf&eacute; &#65;".to_string()))
        );
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(parse_args("{not json"), Err(ArgsError::Json(_))));
        assert!(matches!(parse_args("[1, 2]"), Err(ArgsError::NotAnObject)));
    }

    #[test]
    fn test_unsupported_value_rejected() {
        let err = parse_args(r#"{"flag": true}"#).unwrap_err();
        assert!(matches!(err, ArgsError::UnsupportedValue(name) if name == "flag"));
    }

    #[test]
    fn test_l10n_key_variants() {
        let key = l10n_key("title", None).unwrap();
        assert_eq!(key.id, "title");
        assert!(key.args.is_none());

        let key = l10n_key("greet", Some(r#"{"name": "Ana"}"#)).unwrap();
        assert_eq!(key.id, "greet");
        assert_eq!(
            key.args.unwrap().get("name"),
            Some(&ArgValue::Str("Ana".to_string()))
        );
    }

    #[test]
    fn test_serialize_roundtrip() {
        let args: FormatArgs = [
            ("name".to_string(), ArgValue::from("Ana")),
            ("count".to_string(), ArgValue::from(3.0)),
        ]
        .into_iter()
        .collect();

        let serialized = serialize_args(&args);
        let back = parse_args(&serialized).unwrap();
        assert_eq!(back, args);
        assert!(serialized.contains("\"count\":3"));
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(L10N_ID_ATTR, "data-l10n-id");
        assert_eq!(L10N_ARGS_ATTR, "data-l10n-args");
    }
}
