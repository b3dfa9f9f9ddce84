//! Name to handler mapping for inline and block macros.
//!
//! The host finds `name:target[attrs]` (inline) or a whole line
//! `name::target[attrs]` (block), and the registry dispatches it by exact
//! name to the handler registered for that shape.

use crate::attributes::AttributeSet;
use crate::context::MacroContext;
use crate::error::{MacroError, MacroResult};
use crate::node::Node;
use std::collections::HashMap;
use std::fmt;

/// Syntactic shape of a macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroKind {
    /// `name:target[attrs]` anywhere in running text
    Inline,
    /// `name::target[attrs]` alone on a line
    Block,
}

impl fmt::Display for MacroKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroKind::Inline => f.write_str("inline"),
            MacroKind::Block => f.write_str("block"),
        }
    }
}

/// One occurrence of a macro in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroInvocation {
    pub kind: MacroKind,
    pub name: String,
    pub target: String,
    pub attributes: AttributeSet,
}

/// Resolves a macro invocation into a node.
///
/// Handlers must be stateless: the same target, attributes, context and
/// file contents always give the same node.
pub trait MacroHandler: Send + Sync {
    /// Names bound to bare attribute values, in order
    fn positional_attributes(&self) -> &[&'static str] {
        &[]
    }

    fn process(
        &self,
        ctx: &MacroContext,
        target: &str,
        attrs: AttributeSet,
    ) -> MacroResult<Node>;
}

impl<F> MacroHandler for F
where
    F: Fn(&MacroContext, &str, AttributeSet) -> MacroResult<Node> + Send + Sync,
{
    fn process(
        &self,
        ctx: &MacroContext,
        target: &str,
        attrs: AttributeSet,
    ) -> MacroResult<Node> {
        self(ctx, target, attrs)
    }
}

/// Registered macro handlers, keyed by kind and exact name.
#[derive(Default)]
pub struct MacroRegistry {
    handlers: HashMap<(MacroKind, String), Box<dyn MacroHandler>>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an inline macro, replacing any handler with the same name.
    pub fn register_inline_macro(
        &mut self,
        name: impl Into<String>,
        handler: impl MacroHandler + 'static,
    ) {
        self.register(MacroKind::Inline, name.into(), Box::new(handler));
    }

    /// Register a block macro, replacing any handler with the same name.
    pub fn register_block_macro(
        &mut self,
        name: impl Into<String>,
        handler: impl MacroHandler + 'static,
    ) {
        self.register(MacroKind::Block, name.into(), Box::new(handler));
    }

    fn register(&mut self, kind: MacroKind, name: String, handler: Box<dyn MacroHandler>) {
        if self.handlers.insert((kind, name.clone()), handler).is_some() {
            log::debug!("Replaced {} macro handler '{}'", kind, name);
        }
    }

    pub fn handler(&self, kind: MacroKind, name: &str) -> Option<&dyn MacroHandler> {
        self.handlers
            .get(&(kind, name.to_string()))
            .map(|handler| handler.as_ref())
    }

    /// Whether `name` is registered as either kind
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.keys().any(|(_, n)| n == name)
    }

    /// Registered names of one kind, sorted
    pub fn names(&self, kind: MacroKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .handlers
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, n)| n.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Fail unless every name in `names` is registered.
    ///
    /// Called before any document is expanded so a misconfigured build fails
    /// once, up front, rather than per invocation.
    pub fn ensure_registered(&self, names: &[String]) -> MacroResult<()> {
        let missing: Vec<&str> = names
            .iter()
            .filter(|name| !self.contains(name))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MacroError::configuration(format!(
                "no handler registered for macro(s): {}",
                missing.join(", ")
            )))
        }
    }

    /// Drop every handler whose name is not in `names`.
    ///
    /// Text written with a dropped macro's syntax is no longer recognized and
    /// stays in the document as written.
    pub fn retain(&mut self, names: &[String]) {
        self.handlers.retain(|(kind, name), _| {
            let keep = names.contains(name);
            if !keep {
                log::debug!("Disabled {} macro '{}'", kind, name);
            }
            keep
        });
    }

    /// Build an invocation, binding bare attribute values to the handler's
    /// positional names.
    pub fn parse_invocation(
        &self,
        kind: MacroKind,
        name: &str,
        target: &str,
        attr_text: &str,
    ) -> MacroResult<MacroInvocation> {
        let handler = self.lookup(kind, name)?;
        let attributes = AttributeSet::parse(attr_text, handler.positional_attributes())?;

        Ok(MacroInvocation {
            kind,
            name: name.to_string(),
            target: target.to_string(),
            attributes,
        })
    }

    /// Dispatch an invocation to its handler.
    pub fn resolve(&self, invocation: MacroInvocation, ctx: &MacroContext) -> MacroResult<Node> {
        let handler = self.lookup(invocation.kind, &invocation.name)?;
        log::debug!(
            "Resolving {} macro {}:{}[{}]",
            invocation.kind,
            invocation.name,
            invocation.target,
            invocation.attributes
        );
        handler.process(ctx, &invocation.target, invocation.attributes)
    }

    fn lookup(&self, kind: MacroKind, name: &str) -> MacroResult<&dyn MacroHandler> {
        self.handler(kind, name).ok_or_else(|| {
            MacroError::configuration(format!("unregistered {} macro '{}'", kind, name))
        })
    }
}

impl fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("inline", &self.names(MacroKind::Inline))
            .field("block", &self.names(MacroKind::Block))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Anchor;

    struct Echo;

    impl MacroHandler for Echo {
        fn positional_attributes(&self) -> &[&'static str] {
            &["text"]
        }

        fn process(
            &self,
            _ctx: &MacroContext,
            target: &str,
            mut attrs: AttributeSet,
        ) -> MacroResult<Node> {
            Ok(Node::Anchor(Anchor {
                text: attrs.remove("text").unwrap_or_default(),
                target: target.to_string(),
                icon: None,
                attributes: attrs,
            }))
        }
    }

    #[test]
    fn test_resolve_by_exact_name_and_kind() {
        let mut registry = MacroRegistry::new();
        registry.register_inline_macro("echo", Echo);

        let invocation = registry
            .parse_invocation(MacroKind::Inline, "echo", "/x", "hello,window=^")
            .unwrap();
        let node = registry.resolve(invocation, &MacroContext::default()).unwrap();

        match node {
            Node::Anchor(anchor) => {
                assert_eq!(anchor.text, "hello");
                assert_eq!(anchor.target, "/x");
                assert_eq!(anchor.attributes.get("window"), Some("^"));
            }
            other => panic!("unexpected node {:?}", other),
        }

        assert!(registry
            .parse_invocation(MacroKind::Block, "echo", "/x", "")
            .is_err());
        assert!(registry
            .parse_invocation(MacroKind::Inline, "Echo", "/x", "")
            .is_err());
    }

    #[test]
    fn test_closure_handlers() {
        let mut registry = MacroRegistry::new();
        registry.register_block_macro(
            "fail",
            |_ctx: &MacroContext, target: &str, _attrs: AttributeSet| -> MacroResult<Node> {
                Err(MacroError::unresolvable(target, "always fails"))
            },
        );

        let invocation = MacroInvocation {
            kind: MacroKind::Block,
            name: "fail".to_string(),
            target: "t".to_string(),
            attributes: AttributeSet::new(),
        };
        assert!(matches!(
            registry.resolve(invocation, &MacroContext::default()),
            Err(MacroError::UnresolvableReference { .. })
        ));
        assert_eq!(registry.names(MacroKind::Block), vec!["fail"]);
    }

    #[test]
    fn test_unregistered_macro_is_configuration_error() {
        let registry = MacroRegistry::new();
        let invocation = MacroInvocation {
            kind: MacroKind::Inline,
            name: "link_day".to_string(),
            target: "7".to_string(),
            attributes: AttributeSet::new(),
        };
        assert!(matches!(
            registry.resolve(invocation, &MacroContext::default()),
            Err(MacroError::Configuration(_))
        ));
    }

    #[test]
    fn test_ensure_registered() {
        let mut registry = MacroRegistry::new();
        registry.register_inline_macro("echo", Echo);

        assert!(registry.ensure_registered(&["echo".to_string()]).is_ok());
        let err = registry
            .ensure_registered(&["echo".to_string(), "link_day".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("link_day"));
    }

    #[test]
    fn test_retain_disables_unlisted_macros() {
        let mut registry = MacroRegistry::new();
        registry.register_inline_macro("echo", Echo);
        registry.register_block_macro("echo", Echo);
        registry.register_inline_macro("other", Echo);

        registry.retain(&["echo".to_string()]);

        assert_eq!(registry.names(MacroKind::Inline), vec!["echo"]);
        assert_eq!(registry.names(MacroKind::Block), vec!["echo"]);
        assert!(!registry.contains("other"));
    }

    #[test]
    fn test_handlers_are_idempotent() {
        let mut registry = MacroRegistry::new();
        registry.register_inline_macro("echo", Echo);
        let ctx = MacroContext::default();

        let first = registry
            .resolve(
                registry
                    .parse_invocation(MacroKind::Inline, "echo", "/a", "x")
                    .unwrap(),
                &ctx,
            )
            .unwrap();
        let second = registry
            .resolve(
                registry
                    .parse_invocation(MacroKind::Inline, "echo", "/a", "x")
                    .unwrap(),
                &ctx,
            )
            .unwrap();
        assert_eq!(first, second);
    }
}
