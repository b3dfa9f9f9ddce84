use crate::path::parse_day_number;
use std::path::{Path, PathBuf};

/// Per-chapter information handed to every macro handler.
///
/// Built once per chapter and only read by handlers, so expanding two
/// chapters never shares state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroContext {
    /// Chapter path relative to the book source directory
    pub chapter_path: Option<PathBuf>,
    /// Directory that relative include targets are resolved against
    pub base_dir: PathBuf,
    /// Day number of the document, used when a macro names no day
    pub day_num: Option<String>,
}

impl MacroContext {
    /// Context for a chapter at `chapter_path` (relative to the book source).
    ///
    /// Include targets resolve against the chapter's directory below
    /// `include_base`. The day number comes from the first path component
    /// named `{day_dir_prefix}NN`, with or without an extension.
    pub fn for_chapter(
        chapter_path: Option<&Path>,
        include_base: &Path,
        day_dir_prefix: &str,
    ) -> Self {
        let base_dir = match chapter_path.and_then(Path::parent) {
            Some(parent) => include_base.join(parent),
            None => include_base.to_path_buf(),
        };
        let day_num = chapter_path.and_then(|p| day_from_path(p, day_dir_prefix));

        Self {
            chapter_path: chapter_path.map(Path::to_path_buf),
            base_dir,
            day_num,
        }
    }
}

fn day_from_path(path: &Path, prefix: &str) -> Option<String> {
    path.iter().find_map(|component| {
        let stem = Path::new(component).file_stem()?.to_str()?;
        let digits = stem.strip_prefix(prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let trimmed = digits.trim_start_matches('0');
        let canonical = if trimmed.is_empty() { "0" } else { trimmed };
        parse_day_number(canonical).map(str::to_string)
    })
}
