use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use reqwest::Url;

use crate::error::SourceError;

/// Where a shader source text lives.
///
/// `http://` and `https://` strings are fetched over the network, `file://`
/// URLs and everything else are treated as filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Http(Url),
    File(PathBuf),
}

impl Locator {
    pub fn parse(raw: &str) -> Result<Self, SourceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SourceError::EmptyLocator);
        }

        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|err| SourceError::InvalidUrl {
                locator: trimmed.to_string(),
                reason: err.to_string(),
            })?;
            return Ok(Locator::Http(url));
        }

        if lowered.starts_with("file://") {
            let url = Url::parse(trimmed).map_err(|err| SourceError::InvalidUrl {
                locator: trimmed.to_string(),
                reason: err.to_string(),
            })?;
            let path = url
                .to_file_path()
                .map_err(|_| SourceError::NotAFilePath(trimmed.to_string()))?;
            return Ok(Locator::File(path));
        }

        Ok(Locator::File(PathBuf::from(trimmed)))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Http(_))
    }
}

impl FromStr for Locator {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locator::parse(s)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Http(url) => write!(f, "{url}"),
            Locator::File(path) => write!(f, "{}", path.display()),
        }
    }
}
