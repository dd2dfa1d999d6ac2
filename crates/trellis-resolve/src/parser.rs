//! Attribute string parsing
//!
//! Splits `"key: value; key2: value2"` into an ordered property map. Separators
//! inside parentheses or quotes belong to the value, so `src: url(a;b)` and
//! `text: "a: b"` each stay one property.

use serde::{Deserialize, Serialize};
use std::fmt;
use trellis_core::{Result, TrellisError};
use trellis_schema::{ComponentSchema, SchemaKind, SINGLE_PROPERTY};

/// Ordered mapping of property name to raw value.
///
/// Setting an existing key replaces its value in place, so the first-seen
/// position of every key is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawAttributeMap {
    entries: Vec<(String, String)>,
}

impl RawAttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, returning the previous value if it was already present
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Override this map property-by-property with `other`
    pub fn merge_from(&mut self, other: &RawAttributeMap) {
        for (k, v) in other.iter() {
            self.insert(k, v);
        }
    }

    /// Serialize back to `key: value; key2: value2`
    pub fn to_attribute_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for RawAttributeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_attribute_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawAttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Parse a multi-property attribute string.
///
/// Empty segments (`"a: 1;; b: 2;"`) are skipped. A duplicate key is not an
/// error; the later value wins.
pub fn parse(raw: &str) -> Result<RawAttributeMap> {
    let mut map = RawAttributeMap::new();
    for segment in split_top_level(raw, ';', raw)? {
        if segment.trim().is_empty() {
            continue;
        }
        let (key, value) = split_first_top_level(segment, ':')
            .ok_or_else(|| TrellisError::malformed(raw, format!("segment '{}' has no ':'", segment.trim())))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(TrellisError::malformed(raw, "empty property name"));
        }
        map.insert(key, value.trim());
    }
    Ok(map)
}

/// Parse an attribute string according to the shape of its component.
///
/// Single-property components take the whole trimmed string as their value.
/// Without a schema (or for a lenient one) the string is read as
/// multi-property when it has a top-level `:` outside a URL scheme, and as a
/// single value otherwise.
pub fn parse_for_schema(raw: &str, schema: Option<&ComponentSchema>) -> Result<RawAttributeMap> {
    let single = match schema.map(|s| &s.kind) {
        Some(SchemaKind::Single { .. }) => true,
        Some(SchemaKind::Multiple { .. }) => false,
        Some(SchemaKind::Lenient) | None => {
            let segments = split_top_level(raw, ';', raw)?;
            !segments.iter().any(|s| has_property_separator(s)) && !raw.trim().is_empty()
        }
    };

    if single {
        // Still reject unbalanced quoting in single values.
        split_top_level(raw, ';', raw)?;
        Ok(RawAttributeMap::from_iter([(SINGLE_PROPERTY, raw.trim())]))
    } else {
        parse(raw)
    }
}

/// A top-level `:` that is not the scheme separator of a URL (`https://...`)
fn has_property_separator(segment: &str) -> bool {
    match split_first_top_level(segment, ':') {
        Some((_, rest)) => !rest.starts_with("//"),
        None => false,
    }
}

/// Scan state shared by both splitters
#[derive(Default)]
struct Scanner {
    depth: usize,
    quote: Option<char>,
}

impl Scanner {
    /// Feed one char; returns false when the char closes a paren that was never opened
    fn step(&mut self, c: char) -> bool {
        match self.quote {
            Some(q) if c == q => self.quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => self.quote = Some(c),
                '(' => self.depth += 1,
                ')' => {
                    if self.depth == 0 {
                        return false;
                    }
                    self.depth -= 1;
                }
                _ => {}
            },
        }
        true
    }

    fn at_top_level(&self) -> bool {
        self.depth == 0 && self.quote.is_none()
    }
}

fn split_top_level<'a>(s: &'a str, sep: char, original: &str) -> Result<Vec<&'a str>> {
    let mut parts = Vec::new();
    let mut scanner = Scanner::default();
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if c == sep && scanner.at_top_level() {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
            continue;
        }
        if !scanner.step(c) {
            return Err(TrellisError::malformed(original, "unmatched ')'"));
        }
    }
    if let Some(q) = scanner.quote {
        return Err(TrellisError::malformed(original, format!("unterminated {} quote", q)));
    }
    if scanner.depth > 0 {
        return Err(TrellisError::malformed(original, "unterminated '('"));
    }
    parts.push(&s[start..]);
    Ok(parts)
}

fn split_first_top_level(s: &str, sep: char) -> Option<(&str, &str)> {
    let mut scanner = Scanner::default();
    for (i, c) in s.char_indices() {
        if c == sep && scanner.at_top_level() {
            return Some((&s[..i], &s[i + c.len_utf8()..]));
        }
        scanner.step(c);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_schema::{ComponentSchema, PropertySchema, ValueType};

    #[test]
    fn test_basic_parse() {
        let map = parse("color: red; roughness: 0.5").unwrap();
        assert_eq!(map.get("color"), Some("red"));
        assert_eq!(map.get("roughness"), Some("0.5"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["color", "roughness"]);
    }

    #[test]
    fn test_value_may_contain_colons_and_spaces() {
        let map = parse("src: url(https://example.com/a;b.png); text: \"a: b; c\"; on: mouseenter").unwrap();
        assert_eq!(map.get("src"), Some("url(https://example.com/a;b.png)"));
        assert_eq!(map.get("text"), Some("\"a: b; c\""));
        assert_eq!(map.get("on"), Some("mouseenter"));
    }

    #[test]
    fn test_first_colon_splits() {
        let map = parse("href: https://aframe.io").unwrap();
        assert_eq!(map.get("href"), Some("https://aframe.io"));
    }

    #[test]
    fn test_empty_segments_skipped() {
        let map = parse(" ; size: 10;; dynamic: true; ").unwrap();
        assert_eq!(map.len(), 2);
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_key_later_wins() {
        let map = parse("color: red; side: back; color: blue").unwrap();
        assert_eq!(map.get("color"), Some("blue"));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["color", "side"]);
    }

    #[test]
    fn test_malformed_inputs() {
        for raw in [
            ": red",
            "color red",
            "src: url(a.png",
            "text: \"unterminated",
            "text: 'single",
            "value: a)",
        ] {
            let err = parse(raw).unwrap_err();
            assert!(
                matches!(err, TrellisError::MalformedAttributeString { .. }),
                "{} parsed",
                raw
            );
        }
    }

    #[test]
    fn test_round_trip() {
        for raw in [
            "color: red; roughness: 0.5",
            "src: url(a;b.png); text: 'x: y'",
            "primitive: box; width: 2",
            "property: position; to: 1 2 3; dur: 1000",
        ] {
            let map = parse(raw).unwrap();
            let again = parse(&map.to_attribute_string()).unwrap();
            assert_eq!(map, again, "{}", raw);
        }
    }

    #[test]
    fn test_merge_from_is_per_property() {
        let mut base = parse("color: red; side: back").unwrap();
        base.merge_from(&parse("color: blue; opacity: 0.5").unwrap());
        assert_eq!(base.to_attribute_string(), "color: blue; side: back; opacity: 0.5");
    }

    #[test]
    fn test_parse_for_single_schema() {
        let position = ComponentSchema::single("position", ValueType::Vector3, Some("0 0 0"));
        let map = parse_for_schema(" 1 2 3 ", Some(&position)).unwrap();
        assert_eq!(map.get(SINGLE_PROPERTY), Some("1 2 3"));
    }

    #[test]
    fn test_parse_for_multiple_schema() {
        let pool = ComponentSchema::multiple(
            "pool",
            vec![PropertySchema::new("size", ValueType::Number).with_default("0")],
        );
        let map = parse_for_schema("size: 10", Some(&pool)).unwrap();
        assert_eq!(map.get("size"), Some("10"));
        assert!(parse_for_schema("10", Some(&pool)).is_err());
    }

    #[test]
    fn test_parse_without_schema_guesses_shape() {
        let multi = parse_for_schema("speed: 2; axis: y", None).unwrap();
        assert_eq!(multi.get("axis"), Some("y"));

        let single = parse_for_schema("#enemy-template", None).unwrap();
        assert_eq!(single.get(SINGLE_PROPERTY), Some("#enemy-template"));

        assert!(parse_for_schema("", None).unwrap().is_empty());
    }

    #[test]
    fn test_url_without_schema_stays_single_value() {
        let url = parse_for_schema("https://example.com/a.png", None).unwrap();
        assert_eq!(url.len(), 1);
        assert_eq!(url.get(SINGLE_PROPERTY), Some("https://example.com/a.png"));

        let keyed = parse_for_schema("href: https://example.com; title: Home", None).unwrap();
        assert_eq!(keyed.get("href"), Some("https://example.com"));
        assert_eq!(keyed.get("title"), Some("Home"));
    }
}
