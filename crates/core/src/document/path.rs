/// Blob path generation and parsing.
///
/// Blob paths follow one convention:
/// - `{owner_id}/{unix_millis}-{sanitized_filename}`
///
/// The owner prefix keeps every caller in its own namespace. Sanitising the
/// filename keeps paths free of separators and traversal segments.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validate::ValidationError;

const FALLBACK_NAME: &str = "document.pdf";

/// Longest sanitized filename kept in a path, well under common
/// filesystem name limits once the millisecond prefix is added.
const MAX_FILENAME_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobPath(String);

impl BlobPath {
    /// Build the storage path for a new upload.
    pub fn generate(owner_id: Uuid, filename: &str, now: DateTime<Utc>) -> Self {
        BlobPath(format!(
            "{owner_id}/{}-{}",
            now.timestamp_millis(),
            sanitize_filename(filename)
        ))
    }

    /// Parse an untrusted path, e.g. one taken from a URL.
    pub fn parse(path: &str) -> Result<Self, ValidationError> {
        let ok = !path.is_empty()
            && !path.starts_with('/')
            && path.split('/').all(|segment| {
                !segment.is_empty()
                    && segment != "."
                    && segment != ".."
                    && segment.chars().all(|c| c.is_ascii_alphanumeric() || "._-".contains(c))
            });
        if ok {
            Ok(BlobPath(path.to_string()))
        } else {
            Err(ValidationError::InvalidBlobPath)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace segment, i.e. the owner id for generated paths.
    pub fn namespace(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(ns, _)| ns)
    }

    /// Path segments, for joining onto a filesystem root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlobPath {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        BlobPath::parse(&value)
    }
}

impl From<BlobPath> for String {
    fn from(path: BlobPath) -> Self {
        path.0
    }
}

/// Strip every character outside `[A-Za-z0-9.-]`.
///
/// Leading dots are dropped as well so the result is never `.` or `..`.
/// Long names are cut to 200 characters, keeping a short extension.
pub fn sanitize_filename(filename: &str) -> String {
    let kept: String = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect();
    let kept = kept.trim_start_matches('.');
    if kept.is_empty() {
        return FALLBACK_NAME.to_string();
    }
    if kept.len() <= MAX_FILENAME_LEN {
        return kept.to_string();
    }

    // Only ASCII survives the filter, so byte offsets are char boundaries.
    match kept.rfind('.') {
        Some(dot) if kept.len() - dot <= 16 => {
            let ext = &kept[dot..];
            format!("{}{ext}", &kept[..MAX_FILENAME_LEN - ext.len()])
        }
        _ => kept[..MAX_FILENAME_LEN].to_string(),
    }
}
