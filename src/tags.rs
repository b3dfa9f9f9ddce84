//! Tag-region filtering of included source files.
//!
//! Source files mark regions with directive comments:
//!
//! ```text
//! // tag::pt1[]
//! fn pt1() {}
//! // end::pt1[]
//! ```
//!
//! A filter such as `pt1;!debugging` keeps the lines of the `pt1` region and
//! drops any `debugging` region, wherever it is nested. Directive lines are
//! never part of the output.

use crate::error::{MacroError, MacroResult};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(tag|end)::(\S+?)\[\](?:$|[ \r])").expect("tag directive regex is valid")
    })
}

/// Parsed tag filter (`part1;!debugging`, `*`, `**;!debugging`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    explicit: HashMap<String, bool>,
    order: Vec<String>,
    /// Selection of untagged lines
    base: bool,
    /// Selection of regions whose tag is not listed; `None` inherits the parent
    wildcard: Option<bool>,
}

impl TagFilter {
    /// Parse a `;`-separated filter. Entries prefixed with `!` exclude.
    pub fn parse(filter: &str) -> Self {
        let mut explicit = HashMap::new();
        let mut order = Vec::new();
        let mut all_lines: Option<bool> = None;
        let mut all_tags: Option<bool> = None;

        for entry in filter.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, selected) = match entry.strip_prefix('!') {
                Some(name) => (name, false),
                None => (entry, true),
            };
            match name {
                "**" => all_lines = Some(selected),
                "*" => all_tags = Some(selected),
                // Later entries for the same tag win
                _ => {
                    if explicit.insert(name.to_string(), selected).is_none() {
                        order.push(name.to_string());
                    }
                }
            }
        }

        let any_positive = explicit.values().any(|&s| s);
        let base = match (all_lines, all_tags) {
            (Some(lines), _) => lines,
            (None, Some(tags)) => !tags,
            (None, None) => !any_positive,
        };
        let wildcard = all_tags.or(all_lines);

        Self {
            explicit,
            order,
            base,
            wildcard,
        }
    }

    /// Tags the filter explicitly asks to include
    pub fn requested_tags(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .filter(|t| self.explicit.get(*t).copied().unwrap_or(false))
            .map(String::as_str)
    }

    fn select(&self, tag: &str, parent: bool) -> bool {
        self.explicit
            .get(tag)
            .copied()
            .or(self.wildcard)
            .unwrap_or(parent)
    }

    /// Apply the filter to `content`.
    ///
    /// `path` only labels errors and warnings.
    ///
    /// # Errors
    ///
    /// Returns [`MacroError::MissingTag`] when a requested tag never appears.
    pub fn apply(&self, content: &str, path: &Path) -> MacroResult<String> {
        let mut out: Vec<&str> = Vec::new();
        let mut stack: Vec<(&str, bool)> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for (lineno, line) in content.lines().enumerate() {
            if line.contains("::") {
                if let Some(caps) = directive_regex().captures(line) {
                    let name = caps.get(2).map_or("", |m| m.as_str());
                    let kind = caps.get(1).map_or("", |m| m.as_str());
                    if kind == "tag" {
                        let parent = stack.last().map_or(self.base, |&(_, s)| s);
                        stack.push((name, self.select(name, parent)));
                        seen.insert(name);
                    } else {
                        match stack.last() {
                            Some(&(open, _)) if open == name => {
                                stack.pop();
                            }
                            Some(&(open, _)) => log::warn!(
                                "{}:{}: mismatched end tag: expected end::{}[] but found end::{}[]",
                                path.display(),
                                lineno + 1,
                                open,
                                name
                            ),
                            None => log::warn!(
                                "{}:{}: unexpected end tag end::{}[] with no open tag",
                                path.display(),
                                lineno + 1,
                                name
                            ),
                        }
                    }
                    continue;
                }
            }

            if stack.last().map_or(self.base, |&(_, s)| s) {
                out.push(line);
            }
        }

        if let Some(&(open, _)) = stack.last() {
            log::warn!(
                "{}: tag::{}[] is never closed",
                path.display(),
                open
            );
        }

        if let Some(missing) = self.requested_tags().find(|t| !seen.contains(t)) {
            return Err(MacroError::MissingTag {
                tag: missing.to_string(),
                path: path.to_path_buf(),
            });
        }

        Ok(out.join("\n"))
    }
}

/// Strip the common leading whitespace of `content` and indent every
/// non-blank line by `indent` spaces.
pub fn reindent(content: &str, indent: usize) -> String {
    let common = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);
    let pad = " ".repeat(indent);

    content
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                let rest: String = line.chars().skip(common).collect();
                format!("{}{}", pad, rest)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "\
use std::io;
// tag::setup[]
fn read_input() {}
// end::setup[]
// tag::pt1[]
fn pt1() {
\t// tag::debugging[]
\tprintln!(\"trace\");
\t// end::debugging[]
\tlet x = 1;
}
// end::pt1[]
// tag::debugging[]
fn dump() {}
// end::debugging[]
fn main() {}";

    fn apply(filter: &str) -> String {
        TagFilter::parse(filter)
            .apply(SOURCE, Path::new("mod.rs"))
            .unwrap()
    }

    #[test]
    fn test_selects_single_region_without_debugging() {
        assert_eq!(apply("pt1;!debugging"), "fn pt1() {\n\tlet x = 1;\n}");
    }

    #[test]
    fn test_only_exclusions_keep_everything_else() {
        assert_eq!(
            apply("!debugging"),
            "use std::io;\nfn read_input() {}\nfn pt1() {\n\tlet x = 1;\n}\nfn main() {}"
        );
    }

    #[test]
    fn test_excluded_wins_over_requested() {
        // The later exclusion overrides the request, leaving only exclusions
        assert_eq!(apply("debugging;!debugging"), apply("!debugging"));
        assert!(!apply("debugging;!debugging").contains("trace"));
    }

    #[test]
    fn test_multiple_regions() {
        assert_eq!(
            apply("setup;pt1;!debugging"),
            "fn read_input() {}\nfn pt1() {\n\tlet x = 1;\n}"
        );
    }

    #[test]
    fn test_wildcards() {
        // Every tagged region, untagged lines dropped
        let tagged = apply("*;!debugging");
        assert!(tagged.contains("fn read_input"));
        assert!(!tagged.contains("use std::io"));
        assert!(!tagged.contains("trace"));

        // Every line
        let all = apply("**");
        assert!(all.contains("use std::io"));
        assert!(all.contains("trace"));
        assert!(!all.contains("tag::"));
    }

    #[test]
    fn test_missing_requested_tag_is_error() {
        let err = TagFilter::parse("pt2;!debugging")
            .apply(SOURCE, Path::new("mod.rs"))
            .unwrap_err();
        assert!(matches!(err, MacroError::MissingTag { ref tag, .. } if tag == "pt2"));
    }

    #[test]
    fn test_missing_excluded_tag_is_fine() {
        let out = TagFilter::parse("!debugging")
            .apply("fn main() {}", Path::new("main.rs"))
            .unwrap();
        assert_eq!(out, "fn main() {}");
    }

    #[test]
    fn test_directive_needs_word_boundary_and_brackets() {
        let content = "let s = \"xtag::a[]\";\n// tag::a[] trailing\nkept\n// end::a[]";
        let out = TagFilter::parse("a").apply(content, Path::new("f.rs")).unwrap();
        assert_eq!(out, "kept");
    }

    #[test]
    fn test_reindent_strips_common_prefix() {
        assert_eq!(reindent("\tfn a() {\n\t\tb();\n\n\t}", 0), "fn a() {\n\tb();\n\n}");
        assert_eq!(reindent("x\n  y", 2), "  x\n    y");
    }
}
