use crate::error::ExpansionError;
use crate::expander::Expansion;
use anyhow::Result;
use chrono::Local;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::time::Duration;

/// Formats a message with mdBook-style timestamp and prefix.
fn format_line(level: &str, message: &str) -> String {
    format!(
        "{} [{}] (mdbook_aoc_macros): {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        level,
        message
    )
}

/// Macro counts accumulated over the whole book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    pub chapters: usize,
    pub links: usize,
    pub counts: BTreeMap<String, usize>,
}

impl ExpansionStats {
    pub fn record(&mut self, expansion: &Expansion) {
        self.chapters += 1;
        self.links += expansion.links.len();
        for (name, count) in &expansion.counts {
            *self.counts.entry(name.clone()).or_insert(0) += count;
        }
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Format: "include_source: 2, link_day: 3"
    pub fn summary(&self) -> String {
        self.counts
            .iter()
            .map(|(name, count)| format!("{}: {}", name, count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Reports expansion errors to stderr with mdBook-style formatting.
///
/// # Errors
///
/// Returns an error after printing all failures (to stop the build).
pub fn report_expansion_errors(errors: &[ExpansionError]) -> Result<()> {
    for error in errors {
        eprintln!("{}", format_line("ERROR", "Macro expansion failed"));
        eprintln!("{}", format_line("ERROR", &format!("Location: {}", error.location)));
        eprintln!(
            "{}",
            format_line(
                "ERROR",
                &format!("Macro: {}:{}[...]", error.macro_name, error.target)
            )
        );

        let mut cause: Option<&dyn Error> = Some(&error.source);
        while let Some(err) = cause {
            for line in err.to_string().lines() {
                eprintln!("{}", format_line("ERROR", &format!("  {}", line)));
            }
            cause = err.source();
        }
        eprintln!("{}", format_line("ERROR", ""));
    }

    let failed_files: BTreeSet<String> = errors
        .iter()
        .map(|e| {
            e.location
                .chapter
                .as_ref()
                .map(|c| c.display().to_string())
                .unwrap_or_else(|| "<unnamed chapter>".to_string())
        })
        .collect();
    eprintln!(
        "{}",
        format_line("ERROR", "Failed to expand macros in the following files:")
    );
    for file in failed_files {
        eprintln!("{}", format_line("ERROR", &format!("  {}", file)));
    }

    anyhow::bail!("Macro expansion failed with {} error(s)", errors.len());
}

/// Prints expansion statistics to stderr.
pub fn print_expansion_statistics(stats: &ExpansionStats, duration: Duration) {
    if stats.total() == 0 {
        eprintln!("{}", format_line("INFO", "No macros found to expand"));
        return;
    }

    eprintln!(
        "{}",
        format_line(
            "INFO",
            &format!(
                "Expanded {} macro(s) in {} chapter(s) ({}) in {}ms",
                stats.total(),
                stats.chapters,
                stats.summary(),
                duration.as_millis()
            )
        )
    );
    log::debug!("{} link(s) registered", stats.links);
}
