use crate::attributes::AttributeSet;

/// Markup produced by a macro handler, substituted for the invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Anchor(Anchor),
    CodeBlock(CodeBlock),
}

/// A hyperlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text: String,
    pub target: String,
    /// Font Awesome icon name shown before the text
    pub icon: Option<String>,
    /// `window=^` opens the link in a new tab; other keys pass through
    pub attributes: AttributeSet,
}

/// A highlighted source listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Highlight language; `None` renders plain text
    pub language: Option<String>,
    pub body: CodeBody,
    /// Normalized macro attributes, including the `tags` filter
    pub attributes: AttributeSet,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeBody {
    /// Source text already read and filtered
    Text(String),
    /// Include directive left for the host to resolve
    Include(IncludeDirective),
}

/// Nested include directive handed back to a host that resolves includes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    pub path: String,
    pub attributes: AttributeSet,
}

impl IncludeDirective {
    /// `include::path[attrs]`
    pub fn directive(&self) -> String {
        format!("include::{}[{}]", self.path, self.attributes)
    }
}

impl Anchor {
    pub fn opens_new_window(&self) -> bool {
        self.attributes.get("window") == Some("^")
    }
}

impl Node {
    /// Render the node as chapter markdown.
    pub fn to_markdown(&self) -> String {
        match self {
            Node::Anchor(anchor) => render_anchor(anchor),
            Node::CodeBlock(block) => render_code_block(block),
        }
    }

    /// URL this node links to, if any
    pub fn link(&self) -> Option<&str> {
        match self {
            Node::Anchor(anchor) => Some(&anchor.target),
            Node::CodeBlock(_) => None,
        }
    }
}

fn render_anchor(anchor: &Anchor) -> String {
    let icon = anchor
        .icon
        .as_deref()
        .map(|icon| format!(r#"<i class="fa fa-{}"></i> "#, escape_html(icon)))
        .unwrap_or_default();

    if anchor.opens_new_window() || anchor.icon.is_some() {
        let window = if anchor.opens_new_window() {
            r#" target="_blank" rel="noopener""#
        } else {
            ""
        };
        format!(
            r#"<a href="{}"{}>{}{}</a>"#,
            escape_html(&anchor.target),
            window,
            icon,
            escape_html(&anchor.text)
        )
    } else {
        format!(
            "[{}](<{}>)",
            escape_markdown(&anchor.text),
            anchor.target
        )
    }
}

fn render_code_block(block: &CodeBlock) -> String {
    let language = block.language.as_deref().unwrap_or_default();

    match &block.body {
        CodeBody::Text(text) => {
            let fence = "`".repeat(longest_backtick_run(text).max(2) + 1);
            let mut out = format!("{}{}\n", fence, language);
            if !text.is_empty() {
                out.push_str(text);
                out.push('\n');
            }
            out.push_str(&fence);
            out
        }
        CodeBody::Include(include) => {
            let indent = block.attributes.get("indent").unwrap_or("0");
            [
                format!("[source,{},indent={}]", language, indent),
                "----".to_string(),
                include.directive(),
                "----".to_string(),
            ]
            .join("\n")
        }
    }
}

fn longest_backtick_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_markdown(s: &str) -> String {
    s.replace('[', "\\[").replace(']', "\\]")
}
