//! mdbook-aoc-macros library
//!
//! This library provides an mdBook preprocessor that expands authoring macros
//! for an advent-of-code solutions book. The primary interface is the
//! mdbook-aoc-macros binary, but the library can be used programmatically to
//! expand macros in any markdown text or to register additional macros.
//!
//! ## Public API
//!
//! The main public interface is [`AocMacrosPreprocessor`], which implements the
//! mdBook `Preprocessor` trait.
//!
//! Building blocks:
//! - [`MacroRegistry`] - name to handler mapping for inline and block macros
//! - [`Expander`] - finds and replaces registered macros in a document
//! - [`PathResolver`] and [`LinkBuilder`] - day identifiers to paths and URLs
//! - [`SourceIncluder`] - tag-filtered source inclusion
//!
//! ## Example
//!
//! ```
//! use mdbook_aoc_macros::{DiskFs, Expander, MacroContext, MacroRegistry, MacrosConfig};
//! use std::sync::Arc;
//!
//! let registry = MacroRegistry::with_builtins(&MacrosConfig::default(), Arc::new(DiskFs));
//! let expansion = Expander::new(registry)
//!     .expand("See link_input:3[].", &MacroContext::default())
//!     .unwrap();
//! assert_eq!(expansion.links, vec!["/_attachments/src/day_03/input.txt"]);
//! ```

mod attributes;
mod config;
mod context;
mod error;
mod expander;
mod extractor;
mod includer;
mod language;
mod link;
mod macros;
mod node;
mod path;
mod preprocessor;
mod registry;
mod reporting;
mod tags;

pub use attributes::AttributeSet;
pub use config::{IncludeStrategy, MacrosConfig, CONFIG_SECTION};
pub use context::MacroContext;
pub use error::{ExpansionError, Location, MacroError, MacroResult};
pub use expander::{Expander, Expansion};
pub use extractor::{MacroScanner, RawInvocation};
pub use includer::{DiskFs, SourceFs, SourceIncluder};
pub use language::{language_for_extension, LanguageTable};
pub use link::{encode_path, LinkBuilder};
pub use macros::{
    IncludeSourceMacro, LinkDayMacro, LinkInputMacro, INCLUDE_SOURCE, LINK_DAY, LINK_INPUT,
};
pub use node::{Anchor, CodeBlock, CodeBody, IncludeDirective, Node};
pub use path::{parse_day_number, PathResolver};
pub use preprocessor::AocMacrosPreprocessor;
pub use registry::{MacroHandler, MacroInvocation, MacroKind, MacroRegistry};
pub use tags::{reindent, TagFilter};
