use crate::attributes::AttributeSet;
use crate::config::{IncludeStrategy, MacrosConfig};
use crate::error::{MacroError, MacroResult};
use crate::language::LanguageTable;
use crate::node::{CodeBlock, CodeBody, IncludeDirective};
use crate::tags::{reindent, TagFilter};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Read-only file access used by source inclusion.
pub trait SourceFs: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// [`SourceFs`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskFs;

impl SourceFs for DiskFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// Turns an `include_source` target into a code block.
///
/// # Attributes
///
/// - `lang` - highlight language; otherwise detected from the extension
/// - `tag` / `tags` - `;`-separated tag filter; the excluded tags from
///   configuration are always appended as `!tag`
/// - `indent` - re-indent the listing by this many spaces after stripping the
///   common indentation
///
/// Any other attribute is kept on the block (and on the delegated directive).
#[derive(Clone)]
pub struct SourceIncluder {
    strategy: IncludeStrategy,
    excluded_tags: Vec<String>,
    default_indent: usize,
    languages: LanguageTable,
    fs: Arc<dyn SourceFs>,
}

impl SourceIncluder {
    pub fn new(config: &MacrosConfig, fs: Arc<dyn SourceFs>) -> Self {
        Self {
            strategy: config.include_strategy,
            excluded_tags: config.excluded_tags.clone(),
            default_indent: config.indent,
            languages: LanguageTable::from_config(config),
            fs,
        }
    }

    pub fn strategy(&self) -> IncludeStrategy {
        self.strategy
    }

    /// Include `target`, resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// - [`MacroError::SourceNotFound`] if the file cannot be read
    /// - [`MacroError::MissingTag`] if a requested tag is absent (direct strategy)
    /// - [`MacroError::Configuration`] for a non-numeric `indent`
    pub fn include(
        &self,
        base_dir: &Path,
        target: &str,
        mut attrs: AttributeSet,
    ) -> MacroResult<CodeBlock> {
        if target.is_empty() {
            return Err(MacroError::unresolvable(target, "include needs a file name"));
        }

        let language = attrs
            .remove("lang")
            .filter(|lang| !lang.is_empty())
            .or_else(|| self.languages.detect(target));

        let indent = match attrs.remove("indent") {
            Some(value) => value.trim().parse::<usize>().map_err(|_| {
                MacroError::configuration(format!("indent must be a number, got '{}'", value))
            })?,
            None => self.default_indent,
        };

        let filter = attrs.normalize_tags(&self.excluded_tags);
        let path = base_dir.join(target);

        // Read in both strategies so a missing file fails the build either way
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|source| MacroError::SourceNotFound {
                path: path.clone(),
                source,
            })?;

        let body = match self.strategy {
            IncludeStrategy::Direct => {
                let filtered = TagFilter::parse(&filter).apply(&content, &path)?;
                CodeBody::Text(reindent(&filtered, indent))
            }
            IncludeStrategy::Delegate => CodeBody::Include(IncludeDirective {
                path: path.to_string_lossy().into_owned(),
                attributes: attrs.clone(),
            }),
        };

        log::debug!(
            "Included {} ({:?} strategy, tags={})",
            path.display(),
            self.strategy,
            filter
        );

        attrs.insert("indent", indent.to_string());
        Ok(CodeBlock {
            language,
            body,
            attributes: attrs,
        })
    }
}
