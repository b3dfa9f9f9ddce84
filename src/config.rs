use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Component, Path, PathBuf};

/// Name of this preprocessor's table in `book.toml`.
pub const CONFIG_SECTION: &str = "preprocessor.aoc-macros";

/// Configuration for the aoc-macros preprocessor.
///
/// This structure is deserialized from the `[preprocessor.aoc-macros]` section
/// of `book.toml`. Every key is optional.
///
/// # Example
///
/// ```toml
/// [preprocessor.aoc-macros]
/// year = 2021
/// attachments-root = "/advent-of-code-2021/_attachments"
/// include-strategy = "direct"
/// excluded-tags = ["debugging"]
///
/// [preprocessor.aoc-macros.languages]
/// py = "python"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct MacrosConfig {
    /// Event year used in problem statement links
    pub year: u16,

    /// Base URL of the problem statements, without trailing slash
    pub problem_base_url: String,

    /// URL prefix under which repository files are published (supports ${VAR})
    pub attachments_root: String,

    /// Repository directory holding the per-day directories
    pub source_root: String,

    /// Prefix of a day directory name, followed by the zero-padded day number
    pub day_dir_prefix: String,

    /// File linked when a macro names only a day or a directory
    pub default_filename: String,

    /// Directory that `include_source` targets are resolved against, relative
    /// to the book root (supports ${VAR}). Defaults to the book's `src` dir.
    pub include_root: Option<PathBuf>,

    /// How `include_source` produces its code block
    pub include_strategy: IncludeStrategy,

    /// Tags whose regions are always stripped from included source
    pub excluded_tags: Vec<String>,

    /// Indentation applied to included source unless the macro sets `indent`
    pub indent: usize,

    /// Extra file extension to language mappings (e.g. `py = "python"`)
    pub languages: HashMap<String, String>,

    /// Enabled macros. Every name must be a known macro; unlisted built-ins are
    /// left unexpanded
    pub macros: Vec<String>,
}

/// Strategy used by `include_source` to turn a file into a code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IncludeStrategy {
    /// Read the file and apply the tag filter here
    #[default]
    Direct,
    /// Emit a nested include directive for a host that resolves it itself
    Delegate,
}

impl Default for MacrosConfig {
    fn default() -> Self {
        Self {
            year: 2021,
            problem_base_url: "https://adventofcode.com".to_string(),
            attachments_root: "/_attachments".to_string(),
            source_root: "src".to_string(),
            day_dir_prefix: "day_".to_string(),
            default_filename: "input.txt".to_string(),
            include_root: None,
            include_strategy: IncludeStrategy::Direct,
            excluded_tags: vec!["debugging".to_string()],
            indent: 0,
            languages: HashMap::new(),
            macros: vec![
                "link_day".to_string(),
                "link_input".to_string(),
                "include_source".to_string(),
            ],
        }
    }
}

impl MacrosConfig {
    /// Parse configuration from mdbook PreprocessorContext and expand environment variables
    pub fn from_preprocessor_context(
        ctx: &mdbook::preprocess::PreprocessorContext,
    ) -> Result<Self> {
        let config: MacrosConfig = if let Some(config_value) = ctx.config.get(CONFIG_SECTION) {
            config_value
                .clone()
                .try_into()
                .with_context(|| format!("Failed to parse [{}]", CONFIG_SECTION))?
        } else {
            Self::default()
        };

        config.finish()
    }

    /// Expand environment variables, normalize keys and validate.
    pub fn finish(mut self) -> Result<Self> {
        self.attachments_root = expand_env_vars(&self.attachments_root);
        if let Some(root) = &self.include_root {
            self.include_root = Some(PathBuf::from(expand_env_vars(&root.to_string_lossy())));
        }

        self.languages = self
            .languages
            .into_iter()
            .map(|(ext, lang)| (ext.trim_start_matches('.').to_ascii_lowercase(), lang))
            .collect();

        self.validate()
            .with_context(|| format!("Invalid configuration in [{}]", CONFIG_SECTION))?;

        Ok(self)
    }

    /// Validate the configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.year == 0 {
            anyhow::bail!("year must be a positive number");
        }

        if !(self.problem_base_url.starts_with("https://")
            || self.problem_base_url.starts_with("http://"))
        {
            anyhow::bail!(
                "problem-base-url must be an http(s) URL: {}",
                self.problem_base_url
            );
        }

        if self.default_filename.is_empty() || self.default_filename.contains('/') {
            anyhow::bail!(
                "default-filename must be a plain file name: '{}'",
                self.default_filename
            );
        }

        if self.day_dir_prefix.contains('/') {
            anyhow::bail!(
                "day-dir-prefix cannot contain '/': {}",
                self.day_dir_prefix
            );
        }

        for tag in &self.excluded_tags {
            if tag.is_empty() || tag.contains([';', ',', '!']) {
                anyhow::bail!("excluded tag '{}' is not a plain tag name", tag);
            }
        }

        // Included files must stay inside the book's tree
        if let Some(root) = &self.include_root {
            if Path::new(root)
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                anyhow::bail!("include-root cannot contain '..': {}", root.display());
            }
        }

        for (ext, lang) in &self.languages {
            if ext.is_empty() || lang.is_empty() {
                anyhow::bail!("language mapping '{}' = '{}' has an empty side", ext, lang);
            }
        }

        Ok(())
    }

    /// Directory `include_source` targets are resolved against
    pub fn include_base(&self, book_root: &Path, book_src: &Path) -> PathBuf {
        match &self.include_root {
            Some(root) => book_root.join(root),
            None => book_root.join(book_src),
        }
    }
}

/// Expand environment variables in a string
/// Supports ${VAR_NAME} syntax
/// This function processes the string in a single pass to avoid re-processing expanded values
fn expand_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_name = String::new();
            let mut found_close = false;

            for ch in chars.by_ref() {
                if ch == '}' {
                    found_close = true;
                    break;
                }
                var_name.push(ch);
            }

            if found_close {
                match env::var(&var_name) {
                    Ok(value) => result.push_str(&value),
                    Err(_) => {
                        log::warn!(
                            "Environment variable '{}' not found, leaving unexpanded",
                            var_name
                        );
                        result.push_str("${");
                        result.push_str(&var_name);
                        result.push('}');
                    }
                }
            } else {
                result.push_str("${");
                result.push_str(&var_name);
            }
        } else {
            result.push(ch);
        }
    }

    result
}
