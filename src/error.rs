use std::fmt;
use std::io;
use std::path::PathBuf;

/// Failure raised while resolving a single macro invocation.
///
/// Every variant aborts the build of the chapter that contains the macro.
/// There is no best-effort rendering: a broken link or a missing code sample
/// is worse than a failed build.
#[derive(Debug, thiserror::Error)]
pub enum MacroError {
    /// The macro target (or its attributes) does not name a day, a path or a file.
    #[error("cannot resolve reference `{target}`: {reason}")]
    UnresolvableReference { target: String, reason: String },

    /// The file named by an include does not exist or cannot be read.
    #[error("source file `{}` not found or unreadable", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Unknown macro name, malformed attribute list or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A tag requested by an include filter never appears in the file.
    #[error("tag `{tag}` not found in `{}`", path.display())]
    MissingTag { tag: String, path: PathBuf },
}

impl MacroError {
    pub fn unresolvable(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnresolvableReference {
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Position of a macro invocation inside the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Chapter path relative to the book source directory, if the chapter has one
    pub chapter: Option<PathBuf>,
    /// 1-based line number
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.chapter {
            Some(chapter) => write!(f, "{}:{}", chapter.display(), self.line),
            None => write!(f, "<unnamed chapter>:{}", self.line),
        }
    }
}

/// A [`MacroError`] annotated with the invocation that caused it.
#[derive(Debug, thiserror::Error)]
#[error("{location}: `{macro_name}` macro with target `{target}`: {source}")]
pub struct ExpansionError {
    pub location: Location,
    pub macro_name: String,
    pub target: String,
    #[source]
    pub source: MacroError,
}

pub type MacroResult<T> = std::result::Result<T, MacroError>;
