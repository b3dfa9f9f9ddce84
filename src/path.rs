use crate::config::MacrosConfig;
use crate::error::{MacroError, MacroResult};

/// Turns a day identifier or an explicit path into a repository-relative path.
///
/// Resolution order:
///
/// - a plain non-negative integer (`"7"`) names a day directory:
///   `src/day_07/input.txt`
/// - a path ending in `/` names a directory: the filename is appended
/// - anything else is already a complete path and is returned unchanged
///
/// The result is a filesystem path. URL encoding is [`LinkBuilder`]'s job.
///
/// [`LinkBuilder`]: crate::link::LinkBuilder
#[derive(Debug, Clone)]
pub struct PathResolver {
    source_root: String,
    day_dir_prefix: String,
    default_filename: String,
}

impl PathResolver {
    pub fn new(config: &MacrosConfig) -> Self {
        Self {
            source_root: config.source_root.trim_end_matches('/').to_string(),
            day_dir_prefix: config.day_dir_prefix.clone(),
            default_filename: config.default_filename.clone(),
        }
    }

    pub fn resolve(&self, identifier: &str, filename: Option<&str>) -> MacroResult<String> {
        let filename = filename.filter(|f| !f.is_empty());

        if let Some(day) = parse_day_number(identifier) {
            let file = filename.unwrap_or(&self.default_filename);
            let day_dir = self.day_dir(day);
            return Ok(if self.source_root.is_empty() {
                format!("{}/{}", day_dir, file)
            } else {
                format!("{}/{}/{}", self.source_root, day_dir, file)
            });
        }

        if identifier.ends_with('/') {
            let file = filename.unwrap_or(&self.default_filename);
            return Ok(format!("{}{}", identifier, file));
        }

        if !identifier.is_empty() {
            return Ok(identifier.to_string());
        }

        match filename {
            Some(file) => Ok(file.to_string()),
            None => Err(MacroError::unresolvable(
                identifier,
                "expected a day number, a directory ending in '/', or a file path",
            )),
        }
    }

    /// Directory name of a day, zero-padded to two digits
    pub fn day_dir(&self, day: &str) -> String {
        format!("{}{:0>2}", self.day_dir_prefix, day)
    }
}

/// Parses `s` as a day number only if it is its own canonical decimal form.
///
/// `"7"` parses, `"07"`, `"+7"` and `" 7"` do not. Any number of digits is
/// accepted, so the day is returned as its digit string.
pub fn parse_day_number(s: &str) -> Option<&str> {
    let canonical = !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit())
        && (s == "0" || !s.starts_with('0'));
    canonical.then_some(s)
}
