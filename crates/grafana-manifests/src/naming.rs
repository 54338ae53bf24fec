//! Construct paths and the object names derived from them.
//!
//! Every builder knows its path from the chart root (`chart/grafana/dashboard`).
//! The path is the only input to `metadata.name`, so the same tree always
//! produces the same names.

use std::fmt;

use crate::error::{ManifestError, ManifestResult};

/// Maximum length of a DNS-1123 label.
pub const MAX_DNS_LABEL_LEN: usize = 63;

/// Number of hex characters of the path hash appended to generated names.
const HASH_LEN: usize = 8;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '/';

/// Location of a construct in the chart tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructPath(Vec<String>);

impl ConstructPath {
    /// Creates the path of a root construct.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains the path separator.
    pub fn root(id: &str) -> ManifestResult<Self> {
        validate_id(id)?;
        Ok(Self(vec![id.to_string()]))
    }

    /// Creates the path of a child of this construct.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains the path separator.
    pub fn child(&self, id: &str) -> ManifestResult<Self> {
        validate_id(id)?;
        let mut segments = self.0.clone();
        segments.push(id.to_string());
        Ok(Self(segments))
    }

    /// The last segment: the construct's own id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.0.last().map_or("", String::as_str)
    }

    /// All segments from the root.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Derives a DNS-1123 label from the path.
    ///
    /// Segments are lower-cased, stripped of characters outside `[a-z0-9-]`
    /// and joined with `-`. Unless `with_hash` is false or the path has a
    /// single segment, the first eight hex characters of the path's BLAKE3
    /// hash are appended so that distinct paths never collide.
    ///
    /// A path with no usable characters at all is named by its hash alone,
    /// whatever `with_hash` says, so the label is never empty.
    #[must_use]
    pub fn to_dns_label(&self, with_hash: bool) -> String {
        let readable = self
            .0
            .iter()
            .map(|segment| normalize_segment(segment))
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        if readable.is_empty() {
            return self.hash_suffix();
        }
        if !with_hash || self.0.len() < 2 {
            return truncate_label(&readable, MAX_DNS_LABEL_LEN);
        }

        let readable = truncate_label(&readable, MAX_DNS_LABEL_LEN - HASH_LEN - 1);
        format!("{readable}-{}", self.hash_suffix())
    }

    fn hash_suffix(&self) -> String {
        let hash = blake3::hash(self.to_string().as_bytes()).to_hex();
        hash.as_str()[..HASH_LEN].to_string()
    }
}

impl fmt::Display for ConstructPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        Ok(())
    }
}

fn validate_id(id: &str) -> ManifestResult<()> {
    if id.is_empty() {
        return Err(ManifestError::InvalidId("id cannot be empty".to_string()));
    }
    if id.contains(PATH_SEPARATOR) {
        return Err(ManifestError::InvalidId(format!(
            "'{id}' must not contain '{PATH_SEPARATOR}'"
        )));
    }
    Ok(())
}

fn normalize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}

// Labels must end with an alphanumeric character.
fn truncate_label(label: &str, max: usize) -> String {
    let truncated: String = label.chars().take(max).collect();
    truncated.trim_end_matches('-').to_string()
}
