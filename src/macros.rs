//! The built-in macros: `link_day`, `link_input` and `include_source`.

use crate::attributes::AttributeSet;
use crate::config::MacrosConfig;
use crate::context::MacroContext;
use crate::error::{MacroError, MacroResult};
use crate::includer::{SourceFs, SourceIncluder};
use crate::link::LinkBuilder;
use crate::node::{Anchor, Node};
use crate::path::PathResolver;
use crate::registry::{MacroHandler, MacroRegistry};
use std::sync::Arc;

pub const LINK_DAY: &str = "link_day";
pub const LINK_INPUT: &str = "link_input";
pub const INCLUDE_SOURCE: &str = "include_source";

impl MacroRegistry {
    /// Registry holding the three built-in macros.
    pub fn with_builtins(config: &MacrosConfig, fs: Arc<dyn SourceFs>) -> Self {
        let mut registry = Self::new();
        registry.register_inline_macro(LINK_DAY, LinkDayMacro::new(config));
        registry.register_inline_macro(LINK_INPUT, LinkInputMacro::new(config));
        registry.register_block_macro(INCLUDE_SOURCE, IncludeSourceMacro::new(config, fs));
        registry
    }
}

/// Marks a link to open in a new tab.
fn new_window() -> AttributeSet {
    let mut attrs = AttributeSet::new();
    attrs.insert("window", "^");
    attrs
}

/// Merge pass-through attributes under the macro's own ones.
fn with_passthrough(mut base: AttributeSet, extra: AttributeSet) -> AttributeSet {
    for (key, value) in extra.iter() {
        if !base.contains(key) {
            base.insert(key, value);
        }
    }
    base
}

/// `link_day:7[]` links to the problem statement of day 7.
///
/// The day comes from the `day_num` attribute (first positional), then the
/// target, then the chapter's own day.
pub struct LinkDayMacro {
    links: LinkBuilder,
}

impl LinkDayMacro {
    pub fn new(config: &MacrosConfig) -> Self {
        Self {
            links: LinkBuilder::new(config),
        }
    }
}

impl MacroHandler for LinkDayMacro {
    fn positional_attributes(&self) -> &[&'static str] {
        &["day_num"]
    }

    fn process(
        &self,
        ctx: &MacroContext,
        target: &str,
        mut attrs: AttributeSet,
    ) -> MacroResult<Node> {
        let day_num = attrs
            .remove("day_num")
            .filter(|d| !d.is_empty())
            .or_else(|| Some(target.to_string()).filter(|t| !t.is_empty()))
            .or_else(|| ctx.day_num.clone())
            .ok_or_else(|| {
                MacroError::unresolvable(target, "no day number given and the chapter has none")
            })?;

        Ok(Node::Anchor(Anchor {
            text: format!("Day {} problem description", day_num),
            target: self.links.build_problem_link(&day_num),
            icon: Some("star-half-o".to_string()),
            attributes: with_passthrough(new_window(), attrs),
        }))
    }
}

/// `link_input:3[]` links to the published input file of day 3.
///
/// The path comes from the `path` attribute, then the target, then the
/// chapter's day. The filename is the first positional (`filename`) or the
/// `name` attribute.
pub struct LinkInputMacro {
    paths: PathResolver,
    links: LinkBuilder,
}

impl LinkInputMacro {
    pub fn new(config: &MacrosConfig) -> Self {
        Self {
            paths: PathResolver::new(config),
            links: LinkBuilder::new(config),
        }
    }
}

impl MacroHandler for LinkInputMacro {
    fn positional_attributes(&self) -> &[&'static str] {
        &["filename"]
    }

    fn process(
        &self,
        ctx: &MacroContext,
        target: &str,
        mut attrs: AttributeSet,
    ) -> MacroResult<Node> {
        let identifier = attrs
            .remove("path")
            .filter(|p| !p.is_empty())
            .or_else(|| Some(target.to_string()).filter(|t| !t.is_empty()))
            .or_else(|| ctx.day_num.clone())
            .unwrap_or_default();
        let filename = attrs
            .remove("filename")
            .into_iter()
            .chain(attrs.remove("name"))
            .find(|f| !f.is_empty());

        let path = self.paths.resolve(&identifier, filename.as_deref())?;

        Ok(Node::Anchor(Anchor {
            text: "Problem input".to_string(),
            target: self.links.build_asset_link(&path),
            icon: Some("file-text-o".to_string()),
            attributes: with_passthrough(new_window(), attrs),
        }))
    }
}

/// `include_source::solve.rs[tag=part1]` includes a source file as a code block.
pub struct IncludeSourceMacro {
    includer: SourceIncluder,
}

impl IncludeSourceMacro {
    pub fn new(config: &MacrosConfig, fs: Arc<dyn SourceFs>) -> Self {
        Self {
            includer: SourceIncluder::new(config, fs),
        }
    }
}

impl MacroHandler for IncludeSourceMacro {
    fn process(
        &self,
        ctx: &MacroContext,
        target: &str,
        attrs: AttributeSet,
    ) -> MacroResult<Node> {
        self.includer
            .include(&ctx.base_dir, target, attrs)
            .map(Node::CodeBlock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::includer::DiskFs;
    use crate::node::CodeBody;
    use crate::registry::MacroKind;

    fn registry() -> MacroRegistry {
        MacroRegistry::with_builtins(&MacrosConfig::default(), Arc::new(DiskFs))
    }

    fn resolve(
        registry: &MacroRegistry,
        kind: MacroKind,
        name: &str,
        target: &str,
        attrs: &str,
        ctx: &MacroContext,
    ) -> MacroResult<Node> {
        let invocation = registry.parse_invocation(kind, name, target, attrs)?;
        registry.resolve(invocation, ctx)
    }

    fn anchor(node: Node) -> Anchor {
        match node {
            Node::Anchor(anchor) => anchor,
            other => panic!("expected anchor, got {:?}", other),
        }
    }

    #[test]
    fn test_link_day_from_target() {
        let node = resolve(
            &registry(),
            MacroKind::Inline,
            LINK_DAY,
            "7",
            "",
            &MacroContext::default(),
        )
        .unwrap();
        let anchor = anchor(node);
        assert_eq!(anchor.target, "https://adventofcode.com/2021/day/7");
        assert_eq!(anchor.text, "Day 7 problem description");
        assert!(anchor.opens_new_window());
    }

    #[test]
    fn test_link_day_positional_beats_target_and_chapter() {
        let ctx = MacroContext {
            day_num: Some("3".to_string()),
            ..MacroContext::default()
        };
        let registry = registry();

        let from_attr = anchor(
            resolve(&registry, MacroKind::Inline, LINK_DAY, "7", "12", &ctx).unwrap(),
        );
        assert_eq!(from_attr.target, "https://adventofcode.com/2021/day/12");

        let from_chapter =
            anchor(resolve(&registry, MacroKind::Inline, LINK_DAY, "", "", &ctx).unwrap());
        assert_eq!(from_chapter.target, "https://adventofcode.com/2021/day/3");
    }

    #[test]
    fn test_link_day_without_any_day_fails() {
        let err = resolve(
            &registry(),
            MacroKind::Inline,
            LINK_DAY,
            "",
            "",
            &MacroContext::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MacroError::UnresolvableReference { .. }));
    }

    #[test]
    fn test_link_input_day() {
        let node = resolve(
            &registry(),
            MacroKind::Inline,
            LINK_INPUT,
            "3",
            "",
            &MacroContext::default(),
        )
        .unwrap();
        assert_eq!(anchor(node).target, "/_attachments/src/day_03/input.txt");
    }

    #[test]
    fn test_link_input_filename_and_path() {
        let registry = registry();
        let ctx = MacroContext::default();

        let node =
            resolve(&registry, MacroKind::Inline, LINK_INPUT, "3", "test input.txt", &ctx)
                .unwrap();
        assert_eq!(
            anchor(node).target,
            "/_attachments/src/day_03/test%20input.txt"
        );

        let node = resolve(
            &registry,
            MacroKind::Inline,
            LINK_INPUT,
            "ignored",
            "path=data/#1/",
            &ctx,
        )
        .unwrap();
        assert_eq!(anchor(node).target, "/_attachments/data/%231/input.txt");

        let node =
            resolve(&registry, MacroKind::Inline, LINK_INPUT, "", "name=sample.txt", &ctx)
                .unwrap();
        assert_eq!(anchor(node).target, "/_attachments/sample.txt");

        let err = resolve(&registry, MacroKind::Inline, LINK_INPUT, "", "", &ctx).unwrap_err();
        assert!(matches!(err, MacroError::UnresolvableReference { .. }));
    }

    #[test]
    fn test_link_input_uses_chapter_day() {
        let ctx = MacroContext {
            day_num: Some("21".to_string()),
            ..MacroContext::default()
        };
        let node = resolve(&registry(), MacroKind::Inline, LINK_INPUT, "", "", &ctx).unwrap();
        assert_eq!(anchor(node).target, "/_attachments/src/day_21/input.txt");
    }

    #[test]
    fn test_unknown_attributes_pass_through() {
        let node = resolve(
            &registry(),
            MacroKind::Inline,
            LINK_DAY,
            "1",
            "role=aoc",
            &MacroContext::default(),
        )
        .unwrap();
        let anchor = anchor(node);
        assert_eq!(anchor.attributes.get("role"), Some("aoc"));
        assert_eq!(anchor.attributes.get("window"), Some("^"));
    }

    #[test]
    fn test_include_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = MacroContext {
            base_dir: dir.path().to_path_buf(),
            ..MacroContext::default()
        };
        let err = resolve(
            &registry(),
            MacroKind::Block,
            INCLUDE_SOURCE,
            "src/day_07/input.txt",
            "",
            &ctx,
        )
        .unwrap_err();
        assert!(matches!(err, MacroError::SourceNotFound { .. }));
    }

    #[test]
    fn test_include_source_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("solve.rs"),
            "// tag::part1[]\nfn part1() {}\n// end::part1[]\nfn other() {}\n",
        )
        .unwrap();
        let ctx = MacroContext {
            base_dir: dir.path().to_path_buf(),
            ..MacroContext::default()
        };

        let node = resolve(
            &registry(),
            MacroKind::Block,
            INCLUDE_SOURCE,
            "solve.rs",
            "tag=part1",
            &ctx,
        )
        .unwrap();
        match node {
            Node::CodeBlock(block) => {
                assert_eq!(block.language.as_deref(), Some("rust"));
                assert_eq!(block.attributes.get("tags"), Some("part1;!debugging"));
                assert_eq!(block.body, CodeBody::Text("fn part1() {}".to_string()));
            }
            other => panic!("expected code block, got {:?}", other),
        }
    }
}
