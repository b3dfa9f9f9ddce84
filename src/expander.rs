use crate::context::MacroContext;
use crate::error::{ExpansionError, Location};
use crate::extractor::{MacroScanner, RawInvocation};
use crate::node::Node;
use crate::registry::MacroRegistry;
use std::collections::BTreeMap;

/// Result of expanding the macros of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Document text with every macro replaced by its rendered node
    pub content: String,
    /// Link targets produced, in document order
    pub links: Vec<String>,
    /// Number of expanded invocations per macro name
    pub counts: BTreeMap<String, usize>,
}

impl Expansion {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Rewrites every registered macro in a document.
///
/// Holds no per-document state, so one expander can serve every chapter.
#[derive(Debug)]
pub struct Expander {
    registry: MacroRegistry,
    scanner: MacroScanner,
}

impl Expander {
    pub fn new(registry: MacroRegistry) -> Self {
        let scanner = MacroScanner::new(&registry);
        Self { registry, scanner }
    }

    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    /// Expand the macros in `content`.
    ///
    /// # Errors
    ///
    /// Returns every failed invocation in the document. When any invocation
    /// fails nothing is returned for the document.
    pub fn expand(
        &self,
        content: &str,
        ctx: &MacroContext,
    ) -> Result<Expansion, Vec<ExpansionError>> {
        let mut expansion = Expansion::default();
        let mut errors = Vec::new();
        let mut out = String::with_capacity(content.len());
        let mut cursor = 0;

        for raw in self.scanner.extract(content) {
            out.push_str(&content[cursor..raw.span.start]);
            cursor = raw.span.end;

            if raw.escaped {
                out.push_str(&content[raw.span.start + 1..raw.span.end]);
                continue;
            }

            match self.resolve(&raw, ctx) {
                Ok(node) => {
                    if let Some(link) = node.link() {
                        expansion.links.push(link.to_string());
                    }
                    *expansion.counts.entry(raw.name.clone()).or_insert(0) += 1;
                    out.push_str(&node.to_markdown());
                }
                Err(source) => errors.push(ExpansionError {
                    location: Location {
                        chapter: ctx.chapter_path.clone(),
                        line: raw.line,
                    },
                    macro_name: raw.name,
                    target: raw.target,
                    source,
                }),
            }
        }
        out.push_str(&content[cursor..]);

        if !errors.is_empty() {
            return Err(errors);
        }

        expansion.content = out;
        Ok(expansion)
    }

    fn resolve(
        &self,
        raw: &RawInvocation,
        ctx: &MacroContext,
    ) -> crate::error::MacroResult<Node> {
        let invocation =
            self.registry
                .parse_invocation(raw.kind, &raw.name, &raw.target, &raw.attr_text)?;
        self.registry.resolve(invocation, ctx)
    }
}
