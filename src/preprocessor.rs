use crate::config::MacrosConfig;
use crate::context::MacroContext;
use crate::error::ExpansionError;
use crate::expander::Expander;
use crate::includer::{DiskFs, SourceFs};
use crate::registry::MacroRegistry;
use crate::reporting::{print_expansion_statistics, report_expansion_errors, ExpansionStats};
use anyhow::Result;
use mdbook::book::{Book, BookItem};
use mdbook::preprocess::{Preprocessor, PreprocessorContext};
use std::sync::Arc;
use std::time::Instant;

/// An mdBook preprocessor that expands the advent-of-code authoring macros.
///
/// # Overview
///
/// Chapters may use three macros:
///
/// - `link_day:7[]` - link to the day's problem statement
/// - `link_input:7[]` - link to the day's published input file
/// - `include_source::day_07/mod.rs[tag=pt1]` - a tag-filtered source listing
///
/// Every chapter is expanded independently. Any failed macro fails the whole
/// build after all failures in the book have been reported.
///
/// # Configuration
///
/// Settings live under `[preprocessor.aoc-macros]` in `book.toml`; see
/// [`MacrosConfig`].
///
/// # Example
///
/// ```toml
/// [preprocessor.aoc-macros]
/// year = 2021
/// attachments-root = "/advent-of-code-2021/_attachments"
/// ```
pub struct AocMacrosPreprocessor {
    fs: Arc<dyn SourceFs>,
}

impl AocMacrosPreprocessor {
    pub fn new() -> Self {
        Self {
            fs: Arc::new(DiskFs),
        }
    }

    /// Preprocessor reading included sources through `fs`
    pub fn with_fs(fs: Arc<dyn SourceFs>) -> Self {
        Self { fs }
    }
}

impl Default for AocMacrosPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for AocMacrosPreprocessor {
    fn name(&self) -> &str {
        "aoc-macros"
    }

    fn run(&self, ctx: &PreprocessorContext, mut book: Book) -> Result<Book> {
        let start = Instant::now();
        let config = MacrosConfig::from_preprocessor_context(ctx)?;

        let mut registry = MacroRegistry::with_builtins(&config, Arc::clone(&self.fs));
        registry.ensure_registered(&config.macros)?;
        registry.retain(&config.macros);
        let expander = Expander::new(registry);

        let include_base = config.include_base(&ctx.root, &ctx.config.book.src);
        log::debug!("Resolving included sources against {}", include_base.display());

        let mut errors: Vec<ExpansionError> = Vec::new();
        let mut stats = ExpansionStats::default();

        book.for_each_mut(|item| {
            if let BookItem::Chapter(chapter) = item {
                if let Some(chapter_path) = &chapter.path {
                    log::debug!("Expanding macros in chapter: {}", chapter.name);

                    let macro_ctx = MacroContext::for_chapter(
                        Some(chapter_path.as_path()),
                        &include_base,
                        &config.day_dir_prefix,
                    );

                    match expander.expand(&chapter.content, &macro_ctx) {
                        Ok(expansion) => {
                            for link in &expansion.links {
                                log::debug!("  {} links to {}", chapter_path.display(), link);
                            }
                            stats.record(&expansion);
                            chapter.content = expansion.content;
                        }
                        Err(chapter_errors) => errors.extend(chapter_errors),
                    }
                }
            }
        });

        if !errors.is_empty() {
            report_expansion_errors(&errors)?;
        }

        print_expansion_statistics(&stats, start.elapsed());
        Ok(book)
    }

    fn supports_renderer(&self, renderer: &str) -> bool {
        renderer != "not-supported"
    }
}
