use crate::config::MacrosConfig;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped inside one URL path segment: everything except the
/// RFC 3986 unreserved set.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Builds the URLs that link macros point at.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    problem_base_url: String,
    year: u16,
    attachments_root: String,
}

impl LinkBuilder {
    pub fn new(config: &MacrosConfig) -> Self {
        Self {
            problem_base_url: config.problem_base_url.trim_end_matches('/').to_string(),
            year: config.year,
            attachments_root: config.attachments_root.trim_end_matches('/').to_string(),
        }
    }

    /// Link to the public problem statement of a day.
    ///
    /// The day is inserted verbatim.
    pub fn build_problem_link(&self, day_number: &str) -> String {
        format!("{}/{}/day/{}", self.problem_base_url, self.year, day_number)
    }

    /// Link to a published repository file, each segment percent-encoded.
    pub fn build_asset_link(&self, path: &str) -> String {
        let encoded = encode_path(path.trim_start_matches('/'));
        format!("{}/{}", self.attachments_root, encoded)
    }
}

/// Percent-encodes every `/`-separated segment of `path` on its own, so the
/// separators survive while special characters inside a segment are escaped.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
