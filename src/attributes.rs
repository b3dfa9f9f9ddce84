use crate::error::{MacroError, MacroResult};
use std::fmt;

/// Marker that turns a tag into an exclusion in a tag filter.
const EXCLUDE: char = '!';

/// Ordered attribute list of a macro invocation.
///
/// Parsed from the bracketed part of `name:target[attr,key=value,...]`.
/// Order is preserved so a delegated include directive reproduces the
/// author's attributes in the order they were written. Keys the handler does
/// not recognize are kept and travel into the output node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    entries: Vec<(String, String)>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an attribute list.
    ///
    /// Bare values written before the first `key=value` pair are bound to
    /// `positional` names in order. Any other bare value is stored under its
    /// 1-based position (`"1"`, `"2"`, ...). Values may be wrapped in double or
    /// single quotes to include commas.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::Configuration`] for an empty or invalid key and for
    /// an unterminated quote.
    pub fn parse(text: &str, positional: &[&str]) -> MacroResult<Self> {
        let mut attrs = Self::new();
        let mut seen_named = false;

        for (index, item) in split_items(text)?.into_iter().enumerate() {
            match item {
                Item::Named(key, value) => {
                    if key.is_empty()
                        || !key
                            .chars()
                            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
                    {
                        return Err(MacroError::configuration(format!(
                            "invalid attribute name '{}' in [{}]",
                            key, text
                        )));
                    }
                    seen_named = true;
                    attrs.insert(key, value);
                }
                Item::Positional(value) => {
                    let name = match positional.get(index) {
                        Some(name) if !seen_named => name.to_string(),
                        _ => (index + 1).to_string(),
                    };
                    attrs.insert(name, value);
                }
            }
        }

        Ok(attrs)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of `key`, treating an empty value as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Set `key`, keeping its position if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold `tag` and `tags` into a single `tags` entry and append an exclusion
    /// for every tag in `excluded`.
    ///
    /// No `tags` entry is written when the resulting filter is empty.
    ///
    /// The exclusions are appended unconditionally, even when the author asked
    /// for one of those tags, so debug-only regions never reach the output.
    /// Returns the normalized filter string.
    pub fn normalize_tags(&mut self, excluded: &[String]) -> String {
        let mut tags: Vec<String> = Vec::new();
        let tags_pos = self
            .entries
            .iter()
            .position(|(k, _)| k == "tag" || k == "tags");

        for key in ["tag", "tags"] {
            if let Some(value) = self.remove(key) {
                tags.extend(
                    value
                        .split(';')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from),
                );
            }
        }

        tags.extend(excluded.iter().map(|tag| format!("{}{}", EXCLUDE, tag)));
        let filter = tags.join(";");
        if filter.is_empty() {
            return filter;
        }

        let entry = ("tags".to_string(), filter.clone());
        match tags_pos {
            Some(pos) => self.entries.insert(pos.min(self.entries.len()), entry),
            None => self.entries.push(entry),
        }

        filter
    }
}

impl fmt::Display for AttributeSet {
    /// Formats as `key=value,...`, quoting values that contain a comma, a quote
    /// or a closing bracket.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            if value.contains([',', '"', ']']) {
                write!(f, "{}=\"{}\"", key, value.replace('"', "\\\""))?;
            } else {
                write!(f, "{}={}", key, value)?;
            }
        }
        Ok(())
    }
}

enum Item {
    Named(String, String),
    Positional(String),
}

/// Split on commas that are not inside quotes.
fn split_items(text: &str) -> MacroResult<Vec<Item>> {
    let mut items = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut key: Option<String> = None;
        let mut current = String::new();

        loop {
            match chars.peek().copied() {
                None | Some(',') => {
                    chars.next();
                    break;
                }
                Some(quote @ ('"' | '\'')) if current.trim().is_empty() => {
                    chars.next();
                    current = read_quoted(&mut chars, quote, text)?;
                    // Only whitespace may follow a closing quote
                    while chars.peek().is_some_and(|c| *c != ',') {
                        let c = chars.next().unwrap_or(' ');
                        if !c.is_whitespace() {
                            return Err(MacroError::configuration(format!(
                                "unexpected '{}' after quoted value in [{}]",
                                c, text
                            )));
                        }
                    }
                }
                Some('=') if key.is_none() => {
                    chars.next();
                    key = Some(current.trim().to_string());
                    current.clear();
                }
                Some(c) => {
                    chars.next();
                    current.push(c);
                }
            }
        }

        let value = current.trim().to_string();
        match key {
            Some(key) => items.push(Item::Named(key, value)),
            None if value.is_empty() => {}
            None => items.push(Item::Positional(value)),
        }
    }

    Ok(items)
}

fn read_quoted(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    quote: char,
    text: &str,
) -> MacroResult<String> {
    let mut value = String::new();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&quote) => {
                chars.next();
                value.push(quote);
            }
            c if c == quote => return Ok(value),
            c => value.push(c),
        }
    }
    Err(MacroError::configuration(format!(
        "unterminated {} quote in [{}]",
        quote, text
    )))
}
