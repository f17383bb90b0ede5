//! Snapshot metadata parsing.

use regex::Regex;
use std::sync::LazyLock;

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<timestamp>\s*([^<\s]+)\s*</timestamp>").expect("timestamp pattern is valid")
});

static BUILD_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<buildNumber>\s*([^<\s]+)\s*</buildNumber>")
        .expect("build number pattern is valid")
});

/// Timestamp and build number of the latest snapshot deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotVersion {
    pub timestamp: String,
    pub build_number: String,
}

impl SnapshotVersion {
    /// Extracts the first `timestamp` and `buildNumber` elements.
    ///
    /// Returns `None` when either is missing.
    pub fn parse(document: &str) -> Option<Self> {
        let timestamp = TIMESTAMP.captures(document)?.get(1)?.as_str().to_string();
        let build_number = BUILD_NUMBER.captures(document)?.get(1)?.as_str().to_string();
        Some(Self {
            timestamp,
            build_number,
        })
    }
}
