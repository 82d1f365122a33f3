//! Bracketed entity syntax
//!
//! Entries open with `<`, an identifier, an optional `[index]` expression
//! list, then a value (quoted string or `{ ... }` hash) and/or attributes,
//! and close with `>`. Strings may embed `{{ expression }}` placeables.
//! `/* ... */` comments are skipped.
//!
//! Recovery: a malformed entry is discarded by skipping forward to the next
//! `<` or comment opener; one bad entry never aborts the whole resource.

use std::collections::HashMap;

use crate::entry::{Entry, Expr, HashValue, Node, PropKey, Segment, Value};
use crate::error::L10nError;
use crate::events::EventKind;

use super::{Emit, Entries, MAX_PLACEABLES};

/// Parser for the bracketed syntax.
pub struct L20nParser;

impl L20nParser {
    /// Parse a resource.
    ///
    /// With an `emit` callback, malformed or duplicate entries are reported
    /// and skipped; without one, the first error is returned.
    pub fn parse(emit: Option<&Emit>, source: &str) -> Result<Entries, L10nError> {
        let mut parser = Parser {
            src: source,
            bytes: source.as_bytes(),
            pos: 0,
            entries: Entries::new(),
            emit,
        };
        parser.run()?;
        Ok(parser.entries)
    }
}

struct Parser<'s, 'e> {
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
    entries: Entries,
    emit: Option<&'e Emit<'e>>,
}

impl Parser<'_, '_> {
    fn run(&mut self) -> Result<(), L10nError> {
        self.skip_ws();
        while self.pos < self.bytes.len() {
            if let Err(err) = self.entry() {
                self.skip_junk_entry();
                if self.emit.is_none() {
                    return Err(err);
                }
            }
            if self.pos < self.bytes.len() {
                self.skip_ws();
            }
        }
        Ok(())
    }

    fn cur(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    fn skip_ws(&mut self) {
        while matches!(self.cur(), b' ' | b'\n' | b'\t' | b'\r') {
            self.pos += 1;
        }
    }

    fn skip_required_ws(&mut self) -> bool {
        let start = self.pos;
        self.skip_ws();
        self.pos != start
    }

    fn entry(&mut self) -> Result<(), L10nError> {
        if self.cur() == b'<' {
            self.pos += 1;
            let id = self.identifier()?;
            let index = if self.cur() == b'[' {
                self.pos += 1;
                Some(self.item_list(b']')?)
            } else {
                None
            };
            return self.entity(id, index);
        }

        if self.src[self.pos..].starts_with("/*") {
            return self.comment();
        }

        Err(self.error("invalid entry"))
    }

    fn entity(&mut self, id: String, index: Option<Vec<Expr>>) -> Result<(), L10nError> {
        if !self.skip_required_ws() {
            return Err(self.error("expected white space"));
        }

        let ch = self.cur();
        let has_index = index.is_some();
        let value = self.value(ch, has_index, has_index)?;

        let attrs = match value {
            None => {
                if ch == b'>' {
                    return Err(self.error("expected \">\""));
                }
                Some(self.attributes()?)
            }
            Some(_) => {
                let ws = self.skip_required_ws();
                if self.cur() != b'>' {
                    if !ws {
                        return Err(self.error("expected \">\""));
                    }
                    Some(self.attributes()?)
                } else {
                    None
                }
            }
        };

        self.pos += 1;

        if self.entries.contains_key(&id) {
            return Err(self.duplicate_error(&format!("duplicate entry id \"{id}\"")));
        }

        let entry = match (value, attrs, index) {
            (Some(Value::Str(s)), None, None) => Entry::Simple(s),
            (value, attrs, index) => Entry::Node(Node {
                value,
                attrs,
                index,
            }),
        };
        self.entries.insert(id, entry);
        Ok(())
    }

    fn value(&mut self, ch: u8, index: bool, required: bool) -> Result<Option<Value>, L10nError> {
        match ch {
            b'\'' | b'"' => Ok(Some(self.string(ch)?)),
            b'{' => Ok(Some(Value::Hash(self.hash(index)?))),
            _ if required => Err(self.error("unknown value type")),
            _ => Ok(None),
        }
    }

    fn identifier(&mut self) -> Result<String, L10nError> {
        let start = self.pos;
        match self.cur() {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.pos += 1,
            _ => return Err(self.error("identifier has to start with [a-zA-Z_]")),
        }
        while matches!(self.cur(), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn string(&mut self, opchar: u8) -> Result<Value, L10nError> {
        let mut body: Vec<Segment> = Vec::new();
        let mut placeables = 0;
        let mut buf = String::new();

        self.pos += 1;
        let mut chunk_start = self.pos;

        loop {
            let Some((at, token)) = self.next_string_token(self.pos, opchar) else {
                self.pos = self.bytes.len();
                return Err(self.error("unclosed string literal"));
            };

            match token {
                StringToken::Close => {
                    self.pos = at + 1;
                    let tail = &self.src[chunk_start..at];
                    if body.is_empty() {
                        buf.push_str(tail);
                        return Ok(Value::Str(buf));
                    }
                    if !tail.is_empty() || !buf.is_empty() {
                        buf.push_str(tail);
                        body.push(Segment::Literal(std::mem::take(&mut buf)));
                    }
                    return Ok(Value::Complex(body));
                }
                StringToken::Placeable => {
                    if placeables > MAX_PLACEABLES - 1 {
                        self.pos = at;
                        return Err(self.error(&format!(
                            "too many placeables, maximum allowed is {MAX_PLACEABLES}"
                        )));
                    }
                    placeables += 1;
                    if at > chunk_start || !buf.is_empty() {
                        buf.push_str(&self.src[chunk_start..at]);
                        body.push(Segment::Literal(std::mem::take(&mut buf)));
                    }
                    self.pos = at + 2;
                    self.skip_ws();
                    let expr = self.expression()?;
                    self.skip_ws();
                    if !self.src[self.pos..].starts_with("}}") {
                        return Err(self.error("expected \"}}\""));
                    }
                    body.push(Segment::Placeable(expr));
                    self.pos += 2;
                    chunk_start = self.pos;
                }
                StringToken::Escape => {
                    self.pos = at + 1;
                    let next = self.cur();
                    if next == b'u' {
                        buf.push_str(&self.src[chunk_start..at]);
                        self.pos += 1;
                        buf.push(self.unicode_char()?);
                    } else if self.src[self.pos..].starts_with("{{") {
                        buf.push_str(&self.src[chunk_start..at]);
                        buf.push_str("{{");
                        self.pos += 2;
                    } else if let Some(decoded) = simple_escape(next) {
                        buf.push_str(&self.src[chunk_start..at]);
                        buf.push(decoded);
                        self.pos += 1;
                    } else {
                        return Err(self.error("illegal escape sequence"));
                    }
                    chunk_start = self.pos;
                }
            }
        }
    }

    /// Find the next string-terminating token at or after `from`.
    fn next_string_token(&self, from: usize, opchar: u8) -> Option<(usize, StringToken)> {
        let mut i = from;
        while i < self.bytes.len() {
            let b = self.bytes[i];
            if b == opchar {
                return Some((i, StringToken::Close));
            }
            if b == b'\\' {
                return Some((i, StringToken::Escape));
            }
            if b == b'{' && self.bytes.get(i + 1) == Some(&b'{') {
                return Some((i, StringToken::Placeable));
            }
            i += 1;
        }
        None
    }

    fn unicode_char(&mut self) -> Result<char, L10nError> {
        let start = self.pos;
        for _ in 0..4 {
            if !self.cur().is_ascii_hexdigit() {
                return Err(self.error("illegal unicode escape sequence"));
            }
            self.pos += 1;
        }
        u32::from_str_radix(&self.src[start..self.pos], 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("illegal unicode escape sequence"))
    }

    fn hash(&mut self, index: bool) -> Result<HashValue, L10nError> {
        let mut items: HashMap<String, Value> = HashMap::new();
        let mut default = None;

        self.pos += 1;
        self.skip_ws();

        loop {
            let (key, value, is_default) = self.hash_item()?;
            if is_default {
                if default.is_some() {
                    return Err(self.error("default item redefinition forbidden"));
                }
                default = Some(key.clone());
            }
            items.insert(key, value);
            self.skip_ws();

            let comma = self.cur() == b',';
            if comma {
                self.pos += 1;
                self.skip_ws();
            }
            if self.cur() == b'}' {
                self.pos += 1;
                break;
            }
            if !comma {
                return Err(self.error("expected \"}\""));
            }
        }

        if default.is_none() && !index {
            return Err(self.error("unresolvable hash value"));
        }

        Ok(HashValue { items, default })
    }

    fn hash_item(&mut self) -> Result<(String, Value, bool), L10nError> {
        let is_default = self.cur() == b'*';
        if is_default {
            self.pos += 1;
        }

        let key = self.identifier()?;
        self.skip_ws();
        if self.cur() != b':' {
            return Err(self.error("expected \":\""));
        }
        self.pos += 1;
        self.skip_ws();

        let value = self
            .value(self.cur(), false, true)?
            .ok_or_else(|| self.error("unknown value type"))?;
        Ok((key, value, is_default))
    }

    fn attributes(&mut self) -> Result<HashMap<String, Entry>, L10nError> {
        let mut attrs = HashMap::new();
        loop {
            self.attribute(&mut attrs)?;
            let ws = self.skip_required_ws();
            if self.cur() == b'>' {
                break;
            }
            if !ws {
                return Err(self.error("expected \">\""));
            }
        }
        Ok(attrs)
    }

    fn attribute(&mut self, attrs: &mut HashMap<String, Entry>) -> Result<(), L10nError> {
        let key = self.identifier()?;
        let index = if self.cur() == b'[' {
            self.pos += 1;
            self.skip_ws();
            Some(self.item_list(b']')?)
        } else {
            None
        };
        self.skip_ws();
        if self.cur() != b':' {
            return Err(self.error("expected \":\""));
        }
        self.pos += 1;
        self.skip_ws();

        let has_index = index.is_some();
        let value = self
            .value(self.cur(), has_index, true)?
            .ok_or_else(|| self.error("unknown value type"))?;

        if attrs.contains_key(&key) {
            return Err(self.duplicate_error(&format!("duplicate attribute \"{key}\"")));
        }

        let entry = match (value, index) {
            (Value::Str(s), None) => Entry::Simple(s),
            (value, index) => Entry::Node(Node {
                value: Some(value),
                index,
                attrs: None,
            }),
        };
        attrs.insert(key, entry);
        Ok(())
    }

    fn comment(&mut self) -> Result<(), L10nError> {
        self.pos += 2;
        match self.src[self.pos..].find("*/") {
            Some(offset) => {
                self.pos += offset + 2;
                Ok(())
            }
            None => {
                let err = self.error("comment without a closing tag");
                self.pos = self.bytes.len();
                Err(err)
            }
        }
    }

    fn expression(&mut self) -> Result<Expr, L10nError> {
        let mut expr = self.primary_expression()?;
        loop {
            match self.cur() {
                b'.' => {
                    self.pos += 1;
                    expr = Expr::Prop(Box::new(expr), PropKey::Ident(self.identifier()?));
                }
                b'[' => {
                    self.pos += 1;
                    self.skip_ws();
                    let computed = self.expression()?;
                    self.skip_ws();
                    if self.cur() != b']' {
                        return Err(self.error("expected \"]\""));
                    }
                    self.pos += 1;
                    expr = Expr::Prop(Box::new(expr), PropKey::Computed(Box::new(computed)));
                }
                b'(' => {
                    self.pos += 1;
                    self.skip_ws();
                    let args = self.item_list(b')')?;
                    expr = Expr::Call(Box::new(expr), args);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary_expression(&mut self) -> Result<Expr, L10nError> {
        match self.cur() {
            b'$' => {
                self.pos += 1;
                Ok(Expr::Var(self.identifier()?))
            }
            b'@' => {
                self.pos += 1;
                Ok(Expr::Glob(self.identifier()?))
            }
            _ => Ok(Expr::Id(self.identifier()?)),
        }
    }

    fn item_list(&mut self, close: u8) -> Result<Vec<Expr>, L10nError> {
        let mut items = Vec::new();
        self.skip_ws();
        if self.cur() == close {
            self.pos += 1;
            return Ok(items);
        }

        loop {
            items.push(self.expression()?);
            self.skip_ws();
            let ch = self.cur();
            if ch == b',' {
                self.pos += 1;
                self.skip_ws();
            } else if ch == close {
                self.pos += 1;
                return Ok(items);
            } else {
                return Err(self.error(&format!("expected \",\" or \"{}\"", close as char)));
            }
        }
    }

    /// Skip to the next entry or comment opener after a failed entry.
    fn skip_junk_entry(&mut self) {
        let rest = &self.src[self.pos.min(self.src.len())..];
        let next_entity = rest.find('<');
        let next_comment = rest.find("/*");
        let offset = match (next_entity, next_comment) {
            (Some(e), Some(c)) => e.min(c),
            (Some(e), None) => e,
            (None, Some(c)) => c,
            (None, None) => rest.len(),
        };
        self.pos = self.pos.min(self.src.len()) + offset;
    }

    fn error(&self, message: &str) -> L10nError {
        self.report(message, EventKind::ParserError)
    }

    fn duplicate_error(&self, message: &str) -> L10nError {
        self.report(message, EventKind::DuplicateError)
    }

    fn report(&self, message: &str, kind: EventKind) -> L10nError {
        let pos = self.pos.min(self.src.len());
        let before = &self.src[..pos];
        let open = before.rfind('<').unwrap_or(0);
        let close = before.rfind('>').map(|i| i + 1).unwrap_or(0);
        let start = open.max(close);

        let mut end = (pos + 10).min(self.src.len());
        while !self.src.is_char_boundary(end) {
            end -= 1;
        }

        let context = &self.src[start..end];
        let full = format!("{message} at pos {pos}: `{context}`");
        let err = match kind {
            EventKind::DuplicateError => L10nError::Duplicate(full),
            _ => L10nError::Parse(full),
        };
        if let Some(emit) = self.emit {
            emit(kind, err.clone());
        }
        err
    }
}

#[derive(Debug, Clone, Copy)]
enum StringToken {
    Close,
    Placeable,
    Escape,
}

/// Escape sequences shared with the flat syntax.
fn simple_escape(byte: u8) -> Option<char> {
    match byte {
        b'n' => Some('\n'),
        b'r' => Some('\r'),
        b't' => Some('\t'),
        b'b' => Some('\u{8}'),
        b'f' => Some('\u{c}'),
        b'"' => Some('"'),
        b'\'' => Some('\''),
        b'\\' => Some('\\'),
        b'{' => Some('{'),
        b'}' => Some('}'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn parse_ok(source: &str) -> Entries {
        L20nParser::parse(None, source).unwrap()
    }

    fn collect_errors(source: &str) -> (Entries, Vec<(EventKind, L10nError)>) {
        let errors = RefCell::new(Vec::new());
        let emit = |kind: EventKind, err: L10nError| errors.borrow_mut().push((kind, err));
        let entries = L20nParser::parse(Some(&emit), source).unwrap();
        (entries, errors.into_inner())
    }

    #[test]
    fn test_simple_entities() {
        let entries = parse_ok("<title \"Settings\">\n<home 'Home'>");
        assert_eq!(
            entries.get("title"),
            Some(&Entry::Simple("Settings".to_string()))
        );
        assert_eq!(entries.get("home"), Some(&Entry::Simple("Home".to_string())));
    }

    #[test]
    fn test_comments_skipped() {
        let entries = parse_ok("/* header\nspanning lines */\n<title \"Settings\">");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_string_escapes() {
        let entries = parse_ok(r#"<esc "say \"hi\" with a \\ and é">"#);
        assert_eq!(
            entries.get("esc"),
            Some(&Entry::Simple("say \"hi\" with a \\ and é".to_string()))
        );
    }

    #[test]
    fn test_control_escapes_match_flat_syntax() {
        let entries = parse_ok(r#"<esc "two\nlines\tand a \{brace\}">"#);
        assert_eq!(
            entries.get("esc"),
            Some(&Entry::Simple("two\nlines\tand a {brace}".to_string()))
        );
    }

    #[test]
    fn test_escaped_placeable_is_literal() {
        let entries = parse_ok(r#"<esc "literal \{{ name }}">"#);
        assert_eq!(
            entries.get("esc"),
            Some(&Entry::Simple("literal {{ name }}".to_string()))
        );
    }

    #[test]
    fn test_other_quote_is_content() {
        let entries = parse_ok(r#"<q "it's fine">"#);
        assert_eq!(entries.get("q"), Some(&Entry::Simple("it's fine".to_string())));
    }

    #[test]
    fn test_placeable_expressions() {
        let entries = parse_ok(r#"<greet "Hello, {{ $user }}!">"#);
        let Some(Entry::Node(node)) = entries.get("greet") else {
            panic!("expected node entry");
        };
        assert_eq!(
            node.value,
            Some(Value::Complex(vec![
                Segment::Literal("Hello, ".to_string()),
                Segment::Placeable(Expr::Var("user".to_string())),
                Segment::Literal("!".to_string()),
            ]))
        );
    }

    #[test]
    fn test_chained_expression_grammar() {
        let entries = parse_ok(r#"<x "{{ a.b(c)[d] }}">"#);
        let Some(Entry::Node(node)) = entries.get("x") else {
            panic!("expected node entry");
        };
        let Some(Value::Complex(segments)) = &node.value else {
            panic!("expected complex value");
        };
        let Segment::Placeable(expr) = &segments[0] else {
            panic!("expected placeable");
        };
        assert_eq!(expr.to_string(), "a.b(c)[d]");
    }

    #[test]
    fn test_hash_with_default() {
        let entries = parse_ok("<brand { *nominative: \"Firefox\", locative: \"Firefoxa\" }>");
        let Some(Entry::Node(node)) = entries.get("brand") else {
            panic!("expected node entry");
        };
        let Some(Value::Hash(hash)) = &node.value else {
            panic!("expected hash value");
        };
        assert_eq!(hash.default.as_deref(), Some("nominative"));
        assert_eq!(hash.items.len(), 2);
    }

    #[test]
    fn test_hash_without_default_needs_index() {
        let source = "<unread[@cldr.plural($n)] { one: \"One\", other: \"Many\" }>";
        let entries = parse_ok(source);
        let Some(Entry::Node(node)) = entries.get("unread") else {
            panic!("expected node entry");
        };
        assert!(node.index.is_some());
        let index = node.index.as_ref().unwrap();
        assert_eq!(index[0].to_string(), "@cldr.plural($n)");
    }

    #[test]
    fn test_hash_without_default_or_index_is_dropped() {
        let (entries, errors) =
            collect_errors("<bad { one: \"One\" }>\n<ok \"fine\">");
        assert!(!entries.contains_key("bad"));
        assert!(entries.contains_key("ok"));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, EventKind::ParserError);
    }

    #[test]
    fn test_double_default_rejected() {
        let err =
            L20nParser::parse(None, "<b { *one: \"1\", *two: \"2\" }>").unwrap_err();
        assert!(matches!(err, L10nError::Parse(_)));
    }

    #[test]
    fn test_attributes() {
        let entries = parse_ok("<input \"Search\" placeholder: \"Type here\" title: \"Search box\">");
        let Some(Entry::Node(node)) = entries.get("input") else {
            panic!("expected node entry");
        };
        assert_eq!(node.value, Some(Value::Str("Search".to_string())));
        let attrs = node.attrs.as_ref().unwrap();
        assert_eq!(
            attrs.get("placeholder"),
            Some(&Entry::Simple("Type here".to_string()))
        );
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_attribute_with_index() {
        let source = "<file \"File\" title[@cldr.plural($n)]: { one: \"One\", *other: \"Many\" }>";
        let entries = parse_ok(source);
        let Some(Entry::Node(node)) = entries.get("file") else {
            panic!("expected node entry");
        };
        let attrs = node.attrs.as_ref().unwrap();
        let Some(Entry::Node(attr)) = attrs.get("title") else {
            panic!("expected node attribute");
        };
        assert!(attr.index.is_some());
    }

    #[test]
    fn test_value_less_entity_with_attributes() {
        let entries = parse_ok("<only placeholder: \"Type here\">");
        let Some(Entry::Node(node)) = entries.get("only") else {
            panic!("expected node entry");
        };
        assert_eq!(node.value, None);
        assert!(node.attrs.is_some());
    }

    #[test]
    fn test_duplicate_entry_dropped_and_parsing_continues() {
        let (entries, errors) =
            collect_errors("<foo \"a\"><foo \"b\"><bar \"c\">");
        assert_eq!(entries.get("foo"), Some(&Entry::Simple("a".to_string())));
        assert_eq!(entries.get("bar"), Some(&Entry::Simple("c".to_string())));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, EventKind::DuplicateError);
    }

    #[test]
    fn test_duplicate_attribute_drops_entity() {
        let (entries, errors) =
            collect_errors("<a \"v\" t: \"1\" t: \"2\">\n<b \"w\">");
        assert!(!entries.contains_key("a"));
        assert!(entries.contains_key("b"));
        assert_eq!(errors[0].0, EventKind::DuplicateError);
    }

    #[test]
    fn test_junk_recovery() {
        let (entries, errors) = collect_errors("<1bad \"x\">\n<good \"y\">");
        assert!(entries.contains_key("good"));
        assert_eq!(entries.len(), 1);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_unclosed_string_is_fatal_without_emit() {
        let err = L20nParser::parse(None, "<a \"unterminated>").unwrap_err();
        assert!(matches!(err, L10nError::Parse(_)));
    }

    #[test]
    fn test_too_many_placeables_rejected() {
        let body: String = (0..101).map(|i| format!("{{{{ p{i} }}}}")).collect();
        let (entries, errors) = collect_errors(&format!("<spam \"{body}\">"));
        assert!(entries.is_empty());
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_error_position_context() {
        let err = L20nParser::parse(None, "<a \"v\"> junk").unwrap_err();
        let L10nError::Parse(message) = err else {
            panic!("expected parse error");
        };
        assert!(message.contains("at pos"));
    }
}
