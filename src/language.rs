use crate::config::MacrosConfig;
use std::collections::HashMap;
use std::path::Path;

/// Get the highlight language for a file extension.
///
/// Extensions are matched without the leading dot and case-insensitively.
/// Language names are the highlight.js names mdBook's theme understands.
///
/// # Examples
///
/// ```
/// use mdbook_aoc_macros::language_for_extension;
///
/// assert_eq!(language_for_extension("rs"), Some("rust"));
/// assert_eq!(language_for_extension("jl"), Some("julia"));
/// assert_eq!(language_for_extension("txt"), None);
/// ```
///
/// # Reference
///
/// Language names based on highlight.js SUPPORTED_LANGUAGES.md:
/// https://github.com/highlightjs/highlight.js/blob/main/SUPPORTED_LANGUAGES.md
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let lang = match ext.to_ascii_lowercase().as_str() {
        // B
        "sh" | "bash" | "zsh" => "bash",

        // C
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "css" => "css",

        // G
        "go" => "go",

        // H
        "hs" => "haskell",
        "html" | "htm" => "html",

        // J
        "java" => "java",
        "jl" => "julia",
        "js" | "mjs" | "cjs" => "javascript",
        "json" => "json",

        // K
        "kt" | "kts" => "kotlin",

        // L
        "lua" => "lua",

        // M
        "md" | "markdown" => "markdown",
        "ml" | "mli" => "ocaml",

        // P
        "py" => "python",

        // R
        "rb" => "ruby",
        "rs" => "rust",

        // S
        "sql" => "sql",
        "swift" => "swift",

        // T
        "toml" => "toml",
        "ts" | "tsx" => "typescript",

        // Y
        "yaml" | "yml" => "yaml",

        // Z
        "zig" => "zig",

        // Plain text and unknown extensions get no highlighting
        _ => return None,
    };
    Some(lang)
}

/// Extension to language lookup with configured overrides.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    overrides: HashMap<String, String>,
}

impl LanguageTable {
    pub fn from_config(config: &MacrosConfig) -> Self {
        Self {
            overrides: config.languages.clone(),
        }
    }

    /// Language of the file at `path`, from configured overrides first and the
    /// built-in table second.
    pub fn detect(&self, path: &str) -> Option<String> {
        let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        self.overrides
            .get(&ext)
            .cloned()
            .or_else(|| language_for_extension(&ext).map(String::from))
    }
}
