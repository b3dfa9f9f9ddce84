use crate::registry::{MacroKind, MacroRegistry};
use pulldown_cmark::{Event, Parser, Tag};
use regex::{Captures, Regex};
use std::ops::Range;

/// Bracketed attribute text. A value opening with a quote (at the start, or
/// right after `,` or `=`) runs to its closing quote and may contain `]`.
const ATTRIBUTE_TEXT: &str = concat!(
    r#"\s*(?:"(?:\\.|[^"\\\n])*"|'(?:\\.|[^'\\\n])*')?"#,
    r#"(?:[=,]\s*(?:"(?:\\.|[^"\\\n])*"|'(?:\\.|[^'\\\n])*')|[^\]\n])*"#,
);

/// A macro occurrence found in chapter markdown, before its attributes are
/// parsed.
///
/// Macros come in two shapes:
///
/// ```text
/// See link_day:7[] and grab link_input:7[].
///
/// include_source::day_07/mod.rs[tag=pt1]
/// ```
///
/// Inline macros may appear anywhere in running text. Block macros must fill
/// their whole line. Occurrences inside code blocks or inline code spans are
/// not extracted, and a backslash before the name escapes the macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInvocation {
    pub kind: MacroKind,
    pub name: String,
    pub target: String,
    /// Text between the brackets
    pub attr_text: String,
    /// Byte range of the whole occurrence, including an escaping backslash
    pub span: Range<usize>,
    /// 1-based line of the occurrence
    pub line: usize,
    /// Written as `\name:...`; to be emitted literally without the backslash
    pub escaped: bool,
}

/// Finds invocations of the macros registered in a [`MacroRegistry`].
#[derive(Debug, Clone)]
pub struct MacroScanner {
    inline: Option<Regex>,
    block: Option<Regex>,
}

impl MacroScanner {
    pub fn new(registry: &MacroRegistry) -> Self {
        Self {
            inline: build_pattern(&registry.names(MacroKind::Inline), |names| {
                format!(
                    r"(\\)?\b({}):((?:[^\s\[\]:][^\s\[\]]*)?)\[({})\]",
                    names, ATTRIBUTE_TEXT
                )
            }),
            block: build_pattern(&registry.names(MacroKind::Block), |names| {
                format!(
                    r"(?mR)^(\\)?({})::([^\s\[\]]+)\[({})\][ \t]*$",
                    names, ATTRIBUTE_TEXT
                )
            }),
        }
    }

    /// Extract every invocation in `content`, ordered by position.
    pub fn extract(&self, content: &str) -> Vec<RawInvocation> {
        let code = code_ranges(content);
        let mut found = Vec::new();

        for (kind, pattern) in [
            (MacroKind::Block, &self.block),
            (MacroKind::Inline, &self.inline),
        ] {
            let Some(pattern) = pattern else { continue };
            for caps in pattern.captures_iter(content) {
                let invocation = to_invocation(kind, &caps, content);
                if code.iter().any(|r| r.contains(&invocation.span.start)) {
                    continue;
                }
                found.push(invocation);
            }
        }

        found.sort_by_key(|inv| inv.span.start);

        // Block matches were collected first, so on overlap they win
        let mut result: Vec<RawInvocation> = Vec::with_capacity(found.len());
        for invocation in found {
            if result
                .last()
                .is_some_and(|prev| prev.span.end > invocation.span.start)
            {
                continue;
            }
            result.push(invocation);
        }
        result
    }
}

fn build_pattern(names: &[&str], template: impl Fn(&str) -> String) -> Option<Regex> {
    if names.is_empty() {
        return None;
    }
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&template(&alternation)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::error!("Cannot build macro pattern for {:?}: {}", names, e);
            None
        }
    }
}

fn to_invocation(kind: MacroKind, caps: &Captures<'_>, content: &str) -> RawInvocation {
    let whole = caps.get(0).map_or(0..0, |m| m.range());
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_string();

    RawInvocation {
        kind,
        name: group(2),
        target: group(3),
        attr_text: group(4),
        line: content[..whole.start].matches('\n').count() + 1,
        escaped: caps.get(1).is_some(),
        span: whole,
    }
}

/// Byte ranges of fenced/indented code blocks and inline code spans.
fn code_ranges(content: &str) -> Vec<Range<usize>> {
    Parser::new(content)
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
            _ => None,
        })
        .collect()
}
