//! Artifact repository locations.

use crate::error::{DeployerError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use url::Url;

/// One entry of the ordered repository list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repository {
    /// Local directory laid out like a Maven repository
    Local(PathBuf),
    /// HTTP(S) base URL; always stored with a trailing slash
    Http(Url),
}

impl Repository {
    /// Parses a repository location.
    ///
    /// `http://` and `https://` prefixes denote remote repositories;
    /// anything else is treated as a local path.
    pub fn parse(source: &str) -> Result<Self> {
        let source = source.trim();
        if source.is_empty() {
            return Err(DeployerError::InvalidSettings {
                reason: "Repository location cannot be empty".to_string(),
            });
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            let with_slash = if source.ends_with('/') {
                source.to_string()
            } else {
                format!("{source}/")
            };
            return Ok(Self::Http(Url::parse(&with_slash)?));
        }

        Ok(Self::Local(PathBuf::from(source)))
    }

    /// Resolves a layout-relative path inside an HTTP repository.
    pub(crate) fn join_url(base: &Url, relative: &str) -> Result<Url> {
        Ok(base.join(relative)?)
    }
}

impl FromStr for Repository {
    type Err = DeployerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repository::Local(path) => write!(f, "{}", path.display()),
            Repository::Http(url) => write!(f, "{url}"),
        }
    }
}
